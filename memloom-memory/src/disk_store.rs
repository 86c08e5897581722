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

//! JSONL disk backend
//!
//! One append-only file per tenant:
//! `{root}/{namespace}/{safe(user_id)}/{safe(archive_id)}/data.jsonl`.
//! Queries read the whole file and filter in memory, which is adequate for
//! the small-to-medium per-tenant corpora this store targets. Undecodable
//! lines (e.g. a partial write from a crashed process) are skipped.

use async_trait::async_trait;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::DiskOptions;
use crate::error::{MemoryError, MemoryResult};
use crate::store::Store;
use crate::types::{MemoryItem, QueryRequest, QueryResult, Tenant};

const DATA_FILE: &str = "data.jsonl";

/// Neutralize a tenant identifier for use as a path segment.
///
/// Path separators and `..` sequences become `_`; an empty identifier maps
/// to `_`. No tenant can address a directory outside its own subtree.
fn safe_segment(raw: &str) -> String {
    let mut s = raw.trim().replace("..", "_");
    s = s.replace(['/', '\\'], "_");
    if s.is_empty() {
        s.push('_');
    }
    s
}

/// Append-only JSONL backend with per-tenant path isolation
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    namespace: String,
    max_file_bytes: u64,
}

impl DiskStore {
    /// Create a store rooted at `opts.root_path`
    pub fn new(namespace: impl Into<String>, opts: &DiskOptions) -> MemoryResult<Self> {
        if opts.root_path.as_os_str().is_empty() {
            return Err(MemoryError::InvalidInput(
                "disk root_path must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            root: opts.root_path.clone(),
            namespace: namespace.into(),
            max_file_bytes: opts.max_file_bytes,
        })
    }

    /// Tenant data file path
    pub fn tenant_path(&self, tenant: &Tenant) -> PathBuf {
        self.root
            .join(&self.namespace)
            .join(safe_segment(&tenant.user_id))
            .join(safe_segment(&tenant.archive_id))
            .join(DATA_FILE)
    }

    /// Reserved rotation/compaction hook, invoked when a tenant file grows
    /// past `max_file_bytes`.
    fn rotation_hook(&self, path: &Path, size: u64) {
        debug!(path = %path.display(), size, "tenant file exceeds rotation threshold");
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn save(&self, item: &MemoryItem) -> MemoryResult<()> {
        let path = self.tenant_path(&item.tenant);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut record = item.clone();
        if !record.has_created_at() {
            record.created_at = Utc::now();
        }

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        if self.max_file_bytes > 0 {
            if let Ok(meta) = file.metadata() {
                if meta.len() > self.max_file_bytes {
                    self.rotation_hook(&path, meta.len());
                }
            }
        }
        Ok(())
    }

    async fn query(&self, req: &QueryRequest) -> MemoryResult<QueryResult> {
        let path = self.tenant_path(&req.tenant);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(QueryResult::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut all = Vec::new();
        let mut skipped = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line?;
            match serde_json::from_str::<MemoryItem>(&line) {
                Ok(item) => all.push(item),
                // Tolerate partial trailing writes and foreign records.
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(path = %path.display(), skipped, "skipped undecodable lines");
        }

        let now = Utc::now();
        let mut items = Vec::new();
        // Last appended is newest; walk in reverse.
        for item in all.into_iter().rev() {
            if !req.matches(&item, now) {
                continue;
            }
            items.push(item);
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
