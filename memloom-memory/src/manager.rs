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

//! Memory manager
//!
//! The manager owns routing, the asynchronous write pipeline and the merged
//! read path:
//! - writes go to the caller-selected backends, or to every enabled backend
//!   when no explicit target is set
//! - with async writes enabled, saves are acknowledged once enqueued; a full
//!   queue degrades to a synchronous save in the caller's task, never a drop
//! - reads walk the local backends in a fixed order and concatenate their
//!   newest-first results up to the effective top-k
//! - close is idempotent and drains every task enqueued before it

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::MemoryOptions;
use crate::disk_store::DiskStore;
use crate::error::{MemoryError, MemoryResult};
use crate::memory_store::MemoryStore;
use crate::store::{NoopTripleClient, NoopVectorClient, Store, TripleClient, VectorClient};
use crate::types::{MemoryItem, QueryRequest, QueryResult, SaveOptions};

const DEFAULT_QUEUE_SIZE: usize = 1024;
const DEFAULT_WORKERS: usize = 1;
const DEFAULT_TOP_K: usize = 10;

/// Deadline for a single queued save. Queued writes are bounded by this
/// instead of the submitter's scope, so durability outlives the request
/// that acknowledged the save.
const WRITE_DEADLINE: Duration = Duration::from_secs(10);

struct SaveTask {
    item: MemoryItem,
    opts: SaveOptions,
}

/// The fixed fan-out targets: memory, then disk, then vector, then triple.
struct Backends {
    memory: Option<Arc<dyn Store>>,
    disk: Option<Arc<dyn Store>>,
    vector: Arc<dyn VectorClient>,
    vector_enabled: bool,
    triple: Arc<dyn TripleClient>,
    triple_enabled: bool,
}

impl Backends {
    /// Run the synchronous fan-out. The first error is remembered and
    /// returned, but every routed backend is still attempted.
    async fn fan_out(&self, item: &MemoryItem, opts: SaveOptions) -> MemoryResult<()> {
        let explicit = opts.is_explicit();
        let to_memory = if explicit { opts.to_memory } else { self.memory.is_some() };
        let to_disk = if explicit { opts.to_disk } else { self.disk.is_some() };
        let to_vector = if explicit { opts.to_vector } else { self.vector_enabled };
        let to_triple = if explicit { opts.to_triple } else { self.triple_enabled };

        let mut first_err: Option<MemoryError> = None;
        if to_memory {
            if let Some(store) = &self.memory {
                if let Err(e) = store.save(item).await {
                    first_err.get_or_insert(e);
                }
            }
        }
        if to_disk {
            if let Some(store) = &self.disk {
                if let Err(e) = store.save(item).await {
                    first_err.get_or_insert(e);
                }
            }
        }
        if to_vector {
            if let Err(e) = self.vector.save(item).await {
                first_err.get_or_insert(e);
            }
        }
        if to_triple {
            if let Err(e) = self.triple.save_triples(std::slice::from_ref(item)).await {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct QueueState {
    tx: Option<mpsc::Sender<SaveTask>>,
    closed: bool,
}

/// Routing, async-pipeline and lifecycle owner for the memory backends
pub struct MemoryManager {
    opts: MemoryOptions,
    backends: Arc<Backends>,
    /// Guards the sender against a concurrent close; the send path takes
    /// the lock shared, close takes it exclusive.
    queue: RwLock<QueueState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl MemoryManager {
    /// Create a manager from options, substituting noop clients for absent
    /// vector/triple integrations.
    ///
    /// Must run inside a Tokio runtime when async writes are enabled, since
    /// the write workers are spawned here.
    pub fn new(
        opts: MemoryOptions,
        vector: Option<Arc<dyn VectorClient>>,
        triple: Option<Arc<dyn TripleClient>>,
    ) -> MemoryResult<Self> {
        let memory = opts
            .in_memory
            .enable
            .then(|| Arc::new(MemoryStore::new(&opts.in_memory)) as Arc<dyn Store>);
        let disk = if opts.disk.enable {
            Some(Arc::new(DiskStore::new(opts.namespace.clone(), &opts.disk)?) as Arc<dyn Store>)
        } else {
            None
        };

        let backends = Arc::new(Backends {
            memory,
            disk,
            vector: vector.unwrap_or_else(|| Arc::new(NoopVectorClient)),
            vector_enabled: opts.vector.enable,
            triple: triple.unwrap_or_else(|| Arc::new(NoopTripleClient)),
            triple_enabled: opts.triple.enable,
        });

        let mut queue = QueueState {
            tx: None,
            closed: false,
        };
        let mut workers = Vec::new();
        if opts.async_write.enable {
            let queue_size = match opts.async_write.queue_size {
                0 => DEFAULT_QUEUE_SIZE,
                n => n,
            };
            let worker_count = match opts.async_write.workers {
                0 => DEFAULT_WORKERS,
                n => n,
            };

            let (tx, rx) = mpsc::channel(queue_size);
            let rx = Arc::new(tokio::sync::Mutex::new(rx));
            for worker_id in 0..worker_count {
                workers.push(tokio::spawn(write_worker(
                    worker_id,
                    rx.clone(),
                    backends.clone(),
                )));
            }
            queue.tx = Some(tx);
        }

        Ok(Self {
            opts,
            backends,
            queue: RwLock::new(queue),
            workers: Mutex::new(workers),
        })
    }

    /// Save a memory item.
    ///
    /// With async writes enabled the item is acknowledged once enqueued and
    /// becomes visible to queries eventually; a saturated queue falls back
    /// to a synchronous save in the caller's task.
    pub async fn save(&self, mut item: MemoryItem, opts: SaveOptions) -> MemoryResult<()> {
        if !item.tenant.is_complete() {
            return Err(MemoryError::InvalidInput(
                "tenant user_id and archive_id must be non-empty".to_string(),
            ));
        }
        if !item.has_created_at() {
            item.created_at = Utc::now();
        }

        match self.try_enqueue(SaveTask { item, opts })? {
            None => Ok(()),
            Some(task) => self.backends.fan_out(&task.item, task.opts).await,
        }
    }

    /// Attempt a non-blocking enqueue under the shared lock, so the attempt
    /// cannot race `close()` into a send on a closed queue.
    ///
    /// `Ok(None)` means the queue accepted the task; `Ok(Some)` hands the
    /// task back for synchronous execution.
    fn try_enqueue(&self, task: SaveTask) -> MemoryResult<Option<SaveTask>> {
        let queue = self.queue.read();
        if queue.closed {
            return Err(MemoryError::Closed);
        }
        let Some(tx) = queue.tx.as_ref() else {
            return Ok(Some(task));
        };
        match tx.try_send(task) {
            Ok(()) => Ok(None),
            // Saturated: degrade to the caller's task rather than drop.
            Err(TrySendError::Full(task)) | Err(TrySendError::Closed(task)) => Ok(Some(task)),
        }
    }

    /// Retrieve items for a tenant.
    ///
    /// Backends are consulted in order (memory, then disk); a failing
    /// backend contributes nothing instead of failing the call. Results
    /// keep each backend's newest-first order and are truncated to the
    /// effective top-k (default 10).
    pub async fn query(&self, req: &QueryRequest) -> MemoryResult<QueryResult> {
        if !req.tenant.is_complete() {
            return Err(MemoryError::InvalidInput(
                "tenant user_id and archive_id must be non-empty".to_string(),
            ));
        }

        let top_k = match req.top_k {
            0 => DEFAULT_TOP_K,
            n => n,
        };

        let mut merged = Vec::new();
        if let Some(store) = &self.backends.memory {
            match store.query(req).await {
                Ok(result) => merged.extend(result.items),
                Err(e) => debug!(error = %e, "memory backend query failed"),
            }
        }
        if merged.len() < top_k {
            if let Some(store) = &self.backends.disk {
                match store.query(req).await {
                    Ok(result) => merged.extend(result.items),
                    Err(e) => debug!(error = %e, "disk backend query failed"),
                }
            }
        }
        // Vector/triple retrieval stays with external retrievers; their
        // scored results would merge here.

        merged.truncate(top_k);
        Ok(QueryResult { items: merged })
    }

    /// Close the manager.
    ///
    /// Idempotent. The write queue stops accepting tasks, already-enqueued
    /// tasks drain, the workers join, then the backends close.
    pub async fn close(&self) -> MemoryResult<()> {
        let tx = {
            let mut queue = self.queue.write();
            if queue.closed {
                return Ok(());
            }
            queue.closed = true;
            queue.tx.take()
        };
        // Dropping the sender closes the channel; workers finish the backlog
        // before observing the close.
        drop(tx);

        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                debug!(error = %e, "write worker join failed");
            }
        }

        if let Some(store) = &self.backends.memory {
            let _ = store.close().await;
        }
        if let Some(store) = &self.backends.disk {
            let _ = store.close().await;
        }
        Ok(())
    }

    /// The options this manager was built with
    pub fn options(&self) -> &MemoryOptions {
        &self.opts
    }
}

async fn write_worker(
    worker_id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<SaveTask>>>,
    backends: Arc<Backends>,
) {
    debug!(worker_id, "write worker started");
    loop {
        let task = { receiver.lock().await.recv().await };
        let Some(task) = task else {
            debug!(worker_id, "write worker shutting down");
            break;
        };

        // The save was acknowledged at enqueue time; errors here can only be
        // logged.
        match timeout(WRITE_DEADLINE, backends.fan_out(&task.item, task.opts)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(worker_id, error = %e, "queued save failed"),
            Err(_) => warn!(worker_id, "queued save exceeded deadline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AsyncOptions, DiskOptions, InMemoryOptions};
    use crate::types::Tenant;
    use async_trait::async_trait;
    use tempfile::tempdir;

    fn memory_only_opts(async_enable: bool) -> MemoryOptions {
        MemoryOptions {
            in_memory: InMemoryOptions {
                enable: true,
                max_entries: 100,
                ttl_ms: 0,
            },
            disk: DiskOptions {
                enable: false,
                ..Default::default()
            },
            async_write: AsyncOptions {
                enable: async_enable,
                queue_size: 64,
                workers: 1,
            },
            ..Default::default()
        }
    }

    async fn wait_for_count(manager: &MemoryManager, tenant: &Tenant, want: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let result = manager
                .query(&QueryRequest::for_tenant(tenant.clone()).top_k(50))
                .await
                .unwrap();
            if result.items.len() >= want {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {want} items, have {}",
                result.items.len()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_save_requires_complete_tenant() {
        let manager = MemoryManager::new(memory_only_opts(false), None, None).unwrap();
        let item = MemoryItem::new(Tenant::new("", "a")).content("x");
        let err = manager.save(item, SaveOptions::default()).await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidInput(_)));
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_save_is_immediately_visible() {
        let manager = MemoryManager::new(memory_only_opts(false), None, None).unwrap();
        let tenant = Tenant::new("su", "sa");

        manager
            .save(
                MemoryItem::new(tenant.clone()).id("x").content("c"),
                SaveOptions::default(),
            )
            .await
            .unwrap();

        let result = manager
            .query(&QueryRequest::for_tenant(tenant).top_k(10))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "x");
        // created_at was stamped on the way in
        assert!(result.items[0].has_created_at());
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_async_saves_become_visible() {
        let manager = MemoryManager::new(memory_only_opts(true), None, None).unwrap();
        let tenant = Tenant::new("au", "aa");

        for i in 0..3 {
            let item = MemoryItem::new(tenant.clone())
                .id(format!("item-{i}"))
                .content("v");
            manager.save(item, SaveOptions::default()).await.unwrap();
        }

        wait_for_count(&manager, &tenant, 3).await;
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_drains_pending_saves() {
        let manager = MemoryManager::new(memory_only_opts(true), None, None).unwrap();
        let tenant = Tenant::new("cu", "ca");

        manager
            .save(
                MemoryItem::new(tenant.clone()).id("c1").content("x"),
                SaveOptions::default(),
            )
            .await
            .unwrap();
        manager.close().await.unwrap();

        let result = manager
            .query(&QueryRequest::for_tenant(tenant).top_k(10))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "c1");
    }

    #[tokio::test]
    async fn test_save_after_close_refused_and_close_idempotent() {
        let manager = MemoryManager::new(memory_only_opts(true), None, None).unwrap();
        manager.close().await.unwrap();
        manager.close().await.unwrap();

        let item = MemoryItem::new(Tenant::new("u", "a")).content("late");
        let err = manager.save(item, SaveOptions::default()).await.unwrap_err();
        assert!(matches!(err, MemoryError::Closed));
    }

    #[tokio::test]
    async fn test_explicit_routing_skips_unselected_backends() {
        let dir = tempdir().unwrap();
        let mut opts = memory_only_opts(false);
        opts.disk = DiskOptions {
            enable: true,
            root_path: dir.path().to_path_buf(),
            max_file_bytes: 0,
        };
        let manager = MemoryManager::new(opts, None, None).unwrap();
        let tenant = Tenant::new("ru", "ra");

        manager
            .save(
                MemoryItem::new(tenant.clone()).id("mem-only").content("x"),
                SaveOptions {
                    to_memory: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!dir.path().join(&manager.options().namespace).exists());

        manager
            .save(
                MemoryItem::new(tenant.clone()).id("both").content("y"),
                SaveOptions::default(),
            )
            .await
            .unwrap();
        assert!(dir.path().join(&manager.options().namespace).exists());
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_top_k_defaults_to_ten() {
        let manager = MemoryManager::new(memory_only_opts(false), None, None).unwrap();
        let tenant = Tenant::new("tu", "ta");

        for i in 0..15 {
            let item = MemoryItem::new(tenant.clone())
                .id(format!("i-{i}"))
                .content("c");
            manager.save(item, SaveOptions::default()).await.unwrap();
        }

        let result = manager
            .query(&QueryRequest::for_tenant(tenant))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 10);
        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_first_error_remembered_other_backends_attempted() {
        // Disk root is a file, so the disk save fails while the memory save
        // before it succeeds.
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut opts = memory_only_opts(false);
        opts.disk = DiskOptions {
            enable: true,
            root_path: blocker,
            max_file_bytes: 0,
        };
        let manager = MemoryManager::new(opts, None, None).unwrap();
        let tenant = Tenant::new("eu", "ea");

        let err = manager
            .save(
                MemoryItem::new(tenant.clone()).id("e1").content("x"),
                SaveOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Io(_)));

        // The memory backend ran despite the disk failure.
        let result = manager
            .query(&QueryRequest::for_tenant(tenant).top_k(10))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        manager.close().await.unwrap();
    }

    struct SlowVectorClient;

    #[async_trait]
    impl VectorClient for SlowVectorClient {
        async fn query(&self, _req: &QueryRequest) -> MemoryResult<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn save(&self, _item: &MemoryItem) -> MemoryResult<()> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_full_queue_degrades_to_sync() {
        let mut opts = memory_only_opts(true);
        opts.async_write.queue_size = 1;
        opts.vector.enable = true;
        let manager =
            MemoryManager::new(opts, Some(Arc::new(SlowVectorClient)), None).unwrap();
        let tenant = Tenant::new("fu", "fa");

        let item = |id: &str| MemoryItem::new(tenant.clone()).id(id).content("v");

        // q1 is picked up by the worker, which then stalls in the slow
        // vector save; q2 occupies the single queue slot.
        manager.save(item("q1"), SaveOptions::default()).await.unwrap();
        wait_for_count(&manager, &tenant, 1).await;
        manager.save(item("q2"), SaveOptions::default()).await.unwrap();

        // q3 finds the queue full and degrades to a synchronous save, so it
        // is visible as soon as the call returns.
        manager.save(item("q3"), SaveOptions::default()).await.unwrap();
        let result = manager
            .query(&QueryRequest::for_tenant(tenant.clone()).top_k(50))
            .await
            .unwrap();
        assert!(result.items.iter().any(|i| i.id == "q3"));

        // Close drains q2; nothing was dropped.
        manager.close().await.unwrap();
        let result = manager
            .query(&QueryRequest::for_tenant(tenant).top_k(50))
            .await
            .unwrap();
        let mut ids: Vec<_> = result.items.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn test_cross_tenant_queries_stay_empty() {
        let manager = MemoryManager::new(memory_only_opts(false), None, None).unwrap();
        let tenant = Tenant::new("iso-u", "iso-a");
        manager
            .save(
                MemoryItem::new(tenant.clone()).id("secret").content("s"),
                SaveOptions::default(),
            )
            .await
            .unwrap();

        let other = manager
            .query(&QueryRequest::for_tenant(Tenant::new("iso-u", "other")).top_k(10))
            .await
            .unwrap();
        assert!(other.items.is_empty());
        manager.close().await.unwrap();
    }
}
