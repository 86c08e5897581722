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

//! Memloom Memory System
//!
//! A multi-tenant memory subsystem for LLM agent workflows:
//! - **Tenant isolation**: every item and query is keyed by `(user_id, archive_id)`
//! - **Multiple backends**: in-process store with capacity/TTL, append-only JSONL
//!   persistence, reserved vector/triple adapters
//! - **Asynchronous writes**: bounded queue with degrade-to-sync when saturated,
//!   drained on close
//! - **Filtered retrieval**: newest-first linear scan with tag/kind/substring
//!   filters and a per-query top-k bound
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   MemoryManager                      │
//! │  validation · routing · async queue · merged reads   │
//! ├────────────┬────────────┬────────────┬───────────────┤
//! │ MemoryStore│ DiskStore  │ VectorClient│ TripleClient  │
//! │ (per-tenant│ (JSONL per │ (reserved,  │ (reserved,    │
//! │  cap + TTL)│  tenant)   │  noop)      │  noop)        │
//! └────────────┴────────────┴────────────┴───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use memloom_memory::{MemoryItem, MemoryManager, MemoryOptions, QueryRequest, Tenant};
//!
//! #[tokio::main]
//! async fn main() -> memloom_memory::MemoryResult<()> {
//!     let manager = MemoryManager::new(MemoryOptions::default(), None, None)?;
//!
//!     let tenant = Tenant::new("user-1", "archive-1");
//!     let item = MemoryItem::new(tenant.clone())
//!         .content("User prefers concise answers")
//!         .tag("style");
//!     manager.save(item, Default::default()).await?;
//!
//!     let results = manager
//!         .query(&QueryRequest::for_tenant(tenant).query("concise"))
//!         .await?;
//!     println!("{} items", results.items.len());
//!
//!     manager.close().await
//! }
//! ```

pub mod config;
pub mod disk_store;
pub mod error;
pub mod manager;
pub mod memory_store;
pub mod service;
pub mod store;
pub mod tools;
pub mod types;

// Re-exports
pub use config::{
    AsyncOptions, DiskOptions, InMemoryOptions, MemoryOptions, RetentionOptions, TripleOptions,
    VectorOptions,
};
pub use disk_store::DiskStore;
pub use error::{MemoryError, MemoryResult};
pub use manager::MemoryManager;
pub use memory_store::MemoryStore;
pub use service::{default_manager, init_default};
pub use store::{NoopTripleClient, NoopVectorClient, Store, TripleClient, VectorClient};
pub use types::{MemoryItem, MemoryKind, QueryRequest, QueryResult, SaveOptions, Tenant};
