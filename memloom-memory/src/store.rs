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

//! Storage abstractions
//!
//! `Store` is the local backend contract; implementations must isolate
//! tenants from each other. Scoring is left to external retrievers, so
//! local stores return items with `score` untouched. The manager can later
//! swap an indexed store in behind the same contract.

use async_trait::async_trait;

use crate::error::MemoryResult;
use crate::types::{MemoryItem, QueryRequest, QueryResult};

/// A local memory backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Append an item to the tenant's sequence
    async fn save(&self, item: &MemoryItem) -> MemoryResult<()>;

    /// Retrieve items newest-first, filtered by the request
    async fn query(&self, req: &QueryRequest) -> MemoryResult<QueryResult>;

    /// Release backend resources
    async fn close(&self) -> MemoryResult<()>;
}

/// External vector retrieval service (reserved)
#[async_trait]
pub trait VectorClient: Send + Sync {
    /// Semantic retrieval; implementations return scored items
    async fn query(&self, req: &QueryRequest) -> MemoryResult<QueryResult>;

    /// Optional ingestion (usually requires an embedding step)
    async fn save(&self, item: &MemoryItem) -> MemoryResult<()>;
}

/// External triple-store service (reserved)
#[async_trait]
pub trait TripleClient: Send + Sync {
    /// Retrieve matching triples for the request
    async fn query_triples(&self, req: &QueryRequest) -> MemoryResult<QueryResult>;

    /// Persist triples derived from the items
    async fn save_triples(&self, items: &[MemoryItem]) -> MemoryResult<()>;
}

/// Default vector client: empty results, writes accepted and dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVectorClient;

#[async_trait]
impl VectorClient for NoopVectorClient {
    async fn query(&self, _req: &QueryRequest) -> MemoryResult<QueryResult> {
        Ok(QueryResult::default())
    }

    async fn save(&self, _item: &MemoryItem) -> MemoryResult<()> {
        Ok(())
    }
}

/// Default triple client: empty results, writes accepted and dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTripleClient;

#[async_trait]
impl TripleClient for NoopTripleClient {
    async fn query_triples(&self, _req: &QueryRequest) -> MemoryResult<QueryResult> {
        Ok(QueryResult::default())
    }

    async fn save_triples(&self, _items: &[MemoryItem]) -> MemoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tenant;

    #[tokio::test]
    async fn test_noop_clients() {
        let req = QueryRequest::for_tenant(Tenant::new("u", "a"));
        let item = MemoryItem::new(Tenant::new("u", "a")).content("x");

        let vector = NoopVectorClient;
        assert!(vector.query(&req).await.unwrap().items.is_empty());
        vector.save(&item).await.unwrap();

        let triple = NoopTripleClient;
        assert!(triple.query_triples(&req).await.unwrap().items.is_empty());
        triple.save_triples(std::slice::from_ref(&item)).await.unwrap();
    }
}
