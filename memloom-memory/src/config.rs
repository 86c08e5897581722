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

//! Memory system configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the memory manager
///
/// Defaults enable the in-process store and JSONL persistence with
/// asynchronous writes; vector and triple adapters stay off until an
/// external client is wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryOptions {
    /// In-process store
    #[serde(default)]
    pub in_memory: InMemoryOptions,

    /// JSONL persistence
    #[serde(default)]
    pub disk: DiskOptions,

    /// External vector retrieval (reserved)
    #[serde(default)]
    pub vector: VectorOptions,

    /// External triple retrieval (reserved)
    #[serde(default)]
    pub triple: TripleOptions,

    /// Asynchronous write pipeline
    #[serde(default)]
    pub async_write: AsyncOptions,

    /// Compaction/retention policy (reserved)
    #[serde(default)]
    pub retention: RetentionOptions,

    /// Prefix segment isolating disk trees
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Informational flag for service-style deployments (reserved)
    #[serde(default = "default_true")]
    pub service_mode: bool,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            in_memory: InMemoryOptions::default(),
            disk: DiskOptions::default(),
            vector: VectorOptions::default(),
            triple: TripleOptions::default(),
            async_write: AsyncOptions::default(),
            retention: RetentionOptions::default(),
            namespace: default_namespace(),
            service_mode: true,
        }
    }
}

/// In-process store options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryOptions {
    /// Enable the in-process store
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Per-tenant entry cap; 0 means unbounded
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Read-time TTL in milliseconds; 0 disables the filter
    #[serde(default)]
    pub ttl_ms: u64,
}

impl Default for InMemoryOptions {
    fn default() -> Self {
        Self {
            enable: true,
            max_entries: default_max_entries(),
            ttl_ms: 0,
        }
    }
}

/// JSONL persistence options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskOptions {
    /// Enable JSONL persistence
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Data root directory; must be non-empty when enabled
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Rotation threshold in bytes; 0 disables the check (rotation itself
    /// is a reserved hook)
    #[serde(default)]
    pub max_file_bytes: u64,
}

impl Default for DiskOptions {
    fn default() -> Self {
        Self {
            enable: true,
            root_path: default_root_path(),
            max_file_bytes: 0,
        }
    }
}

/// External vector service options (reserved)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorOptions {
    /// Route saves/queries to an external vector client
    #[serde(default)]
    pub enable: bool,

    /// Service endpoint
    #[serde(default)]
    pub endpoint: String,

    /// Service credential
    #[serde(default)]
    pub api_key: String,

    /// Target index name
    #[serde(default)]
    pub index: String,

    /// Embedding dimension
    #[serde(default)]
    pub dimension: usize,
}

/// External triple-store options (reserved)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripleOptions {
    /// Route saves/queries to an external triple client
    #[serde(default)]
    pub enable: bool,

    /// Service endpoint
    #[serde(default)]
    pub endpoint: String,

    /// Service credential
    #[serde(default)]
    pub api_key: String,

    /// Triple schema version
    #[serde(default)]
    pub schema_version: String,
}

/// Asynchronous write pipeline options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncOptions {
    /// Enable the bounded write queue
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Queue capacity; 0 means the default of 1024
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Consumer count; 0 means the default of 1
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            enable: true,
            queue_size: default_queue_size(),
            workers: default_workers(),
        }
    }
}

/// Retention policy (reserved, inert)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionOptions {
    /// Enable retention enforcement
    #[serde(default)]
    pub enable: bool,

    /// Days to keep items; 0 means forever
    #[serde(default)]
    pub max_days: u32,

    /// Per-tenant byte budget; 0 means unbounded
    #[serde(default)]
    pub max_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_max_entries() -> usize {
    2048
}

fn default_root_path() -> PathBuf {
    PathBuf::from("data/rag")
}

fn default_queue_size() -> usize {
    1024
}

fn default_workers() -> usize {
    1
}
