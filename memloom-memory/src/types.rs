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

//! Core memory types
//!
//! `MemoryItem` is the atomic unit of memory. Items belong to exactly one
//! `Tenant` and are retrieved newest-first through `QueryRequest` filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multi-tenant isolation key: `(user_id, archive_id)`.
///
/// Both fields must be non-empty for an item or request to be accepted.
/// No operation ever crosses tenant boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub user_id: String,
    pub archive_id: String,
}

impl Tenant {
    /// Create a tenant key
    pub fn new(user_id: impl Into<String>, archive_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            archive_id: archive_id.into(),
        }
    }

    /// Whether both identifiers are present
    pub fn is_complete(&self) -> bool {
        !self.user_id.is_empty() && !self.archive_id.is_empty()
    }

    /// Composite key used by in-process stores
    pub fn storage_key(&self) -> String {
        format!("{}::{}", self.user_id, self.archive_id)
    }
}

/// Category of a memory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Short-lived conversational memory
    ShortTerm,
    /// Stable long-term memory
    LongTerm,
    /// Factual knowledge
    Fact,
    /// Free-form note
    Note,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

fn score_is_zero(score: &f64) -> bool {
    *score == 0.0
}

/// A memory item
///
/// Items are created by a save, never updated in place, and only disappear
/// through capacity eviction (in-process store) or TTL/expiry filtering at
/// read time. The `score` field is reserved for external retrievers; local
/// backends never set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Caller-supplied opaque identifier (not deduplicated)
    #[serde(default)]
    pub id: String,
    /// Owning tenant
    pub tenant: Tenant,
    /// Free-form text body
    #[serde(default)]
    pub content: String,
    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Memory category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemoryKind>,
    /// Creation instant; auto-filled on save when unset
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    /// Optional absolute expiry; expired items are filtered at read time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
    /// Relevance score from external retrievers
    #[serde(default, skip_serializing_if = "score_is_zero")]
    pub score: f64,
}

impl MemoryItem {
    /// Create an empty item for a tenant
    ///
    /// `created_at` is left unset so the save path stamps it; use
    /// [`MemoryItem::created_at`] to back-date explicitly.
    pub fn new(tenant: Tenant) -> Self {
        Self {
            id: String::new(),
            tenant,
            content: String::new(),
            tags: Vec::new(),
            kind: None,
            created_at: DateTime::UNIX_EPOCH,
            expires_at: None,
            meta: HashMap::new(),
            score: 0.0,
        }
    }

    /// Set the identifier
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Add a single tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set all tags
    pub fn tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the category
    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the creation instant explicitly
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Set the expiry instant
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Attach a metadata entry
    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Whether the creation instant has been stamped
    pub fn has_created_at(&self) -> bool {
        self.created_at > DateTime::UNIX_EPOCH
    }

    /// Whether the item is expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }
}

/// A memory retrieval request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Tenant to search within
    pub tenant: Tenant,
    /// Case-insensitive substring matched against item content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Result cap; 0 means the caller accepts the default
    #[serde(default)]
    pub top_k: usize,
    /// Every listed tag must be present on a matching item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// A matching item must carry one of the listed kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<MemoryKind>,
}

impl QueryRequest {
    /// Create a query scoped to a tenant
    pub fn for_tenant(tenant: Tenant) -> Self {
        Self {
            tenant,
            ..Default::default()
        }
    }

    /// Set the substring filter
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the result cap
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Require a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Allow a kind
    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Whether an item passes the expiry, kind, tag and substring filters.
    ///
    /// Backend-specific filters (the in-process store's capacity TTL) are
    /// applied by the backend before this check.
    pub fn matches(&self, item: &MemoryItem, now: DateTime<Utc>) -> bool {
        if item.is_expired(now) {
            return false;
        }
        if !self.kinds.is_empty() {
            let kind_ok = item.kind.as_ref().is_some_and(|k| self.kinds.contains(k));
            if !kind_ok {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let tags_ok = self
                .tags
                .iter()
                .all(|want| item.tags.iter().any(|t| t == want));
            if !tags_ok {
                return false;
            }
        }
        if let Some(query) = &self.query {
            if !query.is_empty()
                && !item
                    .content
                    .to_lowercase()
                    .contains(&query.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Ordered retrieval result, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matching items, at most the effective top-k
    pub items: Vec<MemoryItem>,
}

/// Per-save routing switches
///
/// When any switch is set the save goes to exactly the selected backends;
/// when all are unset it goes to every backend the manager has enabled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    #[serde(default)]
    pub to_memory: bool,
    #[serde(default)]
    pub to_disk: bool,
    #[serde(default)]
    pub to_vector: bool,
    #[serde(default)]
    pub to_triple: bool,
}

impl SaveOptions {
    /// Whether the caller selected explicit targets
    pub fn is_explicit(&self) -> bool {
        self.to_memory || self.to_disk || self.to_vector || self.to_triple
    }
}
