// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-process per-tenant store
//!
//! Each tenant owns an insertion-ordered sequence. Capacity eviction is
//! FIFO over insertion order, not `created_at`, so back-dated items age
//! out by arrival. The optional TTL filters at read time only; nothing is
//! removed eagerly.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::config::InMemoryOptions;
use crate::error::MemoryResult;
use crate::store::Store;
use crate::types::{MemoryItem, QueryRequest, QueryResult};

/// In-process memory backend with per-tenant capacity and TTL
#[derive(Debug, Default)]
pub struct MemoryStore {
    items_by_tenant: RwLock<HashMap<String, Vec<MemoryItem>>>,
    max_entries: usize,
    ttl_ms: u64,
}

impl MemoryStore {
    /// Create a store from options
    pub fn new(opts: &InMemoryOptions) -> Self {
        Self {
            items_by_tenant: RwLock::new(HashMap::new()),
            max_entries: opts.max_entries,
            ttl_ms: opts.ttl_ms,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save(&self, item: &MemoryItem) -> MemoryResult<()> {
        let mut map = self.items_by_tenant.write().await;
        let list = map.entry(item.tenant.storage_key()).or_default();
        list.push(item.clone());

        // Capacity control: drop oldest insertions first.
        if self.max_entries > 0 && list.len() > self.max_entries {
            let excess = list.len() - self.max_entries;
            list.drain(..excess);
        }
        Ok(())
    }

    async fn query(&self, req: &QueryRequest) -> MemoryResult<QueryResult> {
        let map = self.items_by_tenant.read().await;
        let Some(list) = map.get(&req.tenant.storage_key()) else {
            return Ok(QueryResult::default());
        };

        let now = Utc::now();
        let mut items = Vec::new();

        // Newest insertions first so the top-k cut keeps recent items.
        for item in list.iter().rev() {
            if self.ttl_ms > 0
                && item.created_at + Duration::milliseconds(self.ttl_ms as i64) < now
            {
                continue;
            }
            if !req.matches(item, now) {
                continue;
            }
            items.push(item.clone());
            if req.top_k > 0 && items.len() >= req.top_k {
                break;
            }
        }

        Ok(QueryResult { items })
    }

    async fn close(&self) -> MemoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryKind, Tenant};

    fn store(max_entries: usize, ttl_ms: u64) -> MemoryStore {
        MemoryStore::new(&InMemoryOptions {
            enable: true,
            max_entries,
            ttl_ms,
        })
    }

    #[tokio::test]
    async fn test_save_query_basic_filters() {
        let st = store(100, 0);
        let tenant = Tenant::new("u1", "a1");
        let base = Utc::now();

        let items = [
            MemoryItem::new(tenant.clone())
                .id("1")
                .kind(MemoryKind::ShortTerm)
                .tags(vec!["t1", "t2"])
                .content("hello world")
                .created_at(base),
            MemoryItem::new(tenant.clone())
                .id("2")
                .kind(MemoryKind::LongTerm)
                .tags(vec!["t1"])
                .content("HELLO NOTE")
                .created_at(base + Duration::milliseconds(1)),
            MemoryItem::new(tenant.clone())
                .id("3")
                .kind(MemoryKind::Fact)
                .tags(vec!["t2"])
                .content("other content")
                .created_at(base + Duration::milliseconds(2)),
        ];
        for item in &items {
            st.save(item).await.unwrap();
        }

        let req = QueryRequest::for_tenant(tenant)
            .query("hello")
            .tag("t1")
            .kind(MemoryKind::ShortTerm)
            .kind(MemoryKind::LongTerm)
            .top_k(10);
        let result = st.query(&req).await.unwrap();

        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_ttl_and_capacity() {
        let st = store(2, 100);
        let tenant = Tenant::new("u2", "a2");
        let base = Utc::now();

        let old = MemoryItem::new(tenant.clone())
            .id("old")
            .content("old")
            .created_at(base - Duration::milliseconds(200));
        let n1 = MemoryItem::new(tenant.clone())
            .id("n1")
            .content("n1")
            .created_at(base);
        let n2 = MemoryItem::new(tenant.clone())
            .id("n2")
            .content("n2")
            .created_at(base + Duration::milliseconds(1));

        st.save(&old).await.unwrap();
        st.save(&n1).await.unwrap();
        st.save(&n2).await.unwrap();

        let result = st
            .query(&QueryRequest::for_tenant(tenant).top_k(10))
            .await
            .unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);
    }

    #[tokio::test]
    async fn test_top_k_order() {
        let st = store(100, 0);
        let tenant = Tenant::new("u3", "a3");
        let base = Utc::now();

        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let item = MemoryItem::new(tenant.clone())
                .id(*id)
                .content("c")
                .created_at(base + Duration::milliseconds(i as i64));
            st.save(&item).await.unwrap();
        }

        let result = st
            .query(&QueryRequest::for_tenant(tenant).top_k(3))
            .await
            .unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["e", "d", "c"]);
    }

    #[tokio::test]
    async fn test_eviction_follows_insertion_order() {
        let st = store(2, 0);
        let tenant = Tenant::new("u4", "a4");
        let base = Utc::now();

        // The newest timestamp arrives first; eviction still drops it once
        // two later insertions follow.
        let backdated = [
            MemoryItem::new(tenant.clone())
                .id("first")
                .created_at(base + Duration::seconds(60)),
            MemoryItem::new(tenant.clone()).id("second").created_at(base),
            MemoryItem::new(tenant.clone())
                .id("third")
                .created_at(base + Duration::seconds(1)),
        ];
        for item in &backdated {
            st.save(item).await.unwrap();
        }

        let result = st
            .query(&QueryRequest::for_tenant(tenant).top_k(10))
            .await
            .unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["third", "second"]);
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let st = store(100, 0);
        let ten_a = Tenant::new("uA", "aA");
        let ten_b = Tenant::new("uB", "aB");

        st.save(&MemoryItem::new(ten_a.clone()).id("A1").content("foo").created_at(Utc::now()))
            .await
            .unwrap();
        st.save(&MemoryItem::new(ten_b.clone()).id("B1").content("bar").created_at(Utc::now()))
            .await
            .unwrap();

        let ra = st
            .query(&QueryRequest::for_tenant(ten_a).top_k(10))
            .await
            .unwrap();
        assert_eq!(ra.items.len(), 1);
        assert_eq!(ra.items[0].id, "A1");

        let rb = st
            .query(&QueryRequest::for_tenant(ten_b).top_k(10))
            .await
            .unwrap();
        assert_eq!(rb.items.len(), 1);
        assert_eq!(rb.items[0].id, "B1");
    }
}
