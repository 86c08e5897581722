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

//! Tool-facing memory operations
//!
//! The contract with agent orchestrators: tool arguments never carry tenant
//! fields (an LLM must not pick its tenant); the caller injects the tenant
//! from ambient request context. Failures are serialized into the output's
//! `message` so the wrapper itself never raises.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::manager::MemoryManager;
use crate::types::{MemoryItem, MemoryKind, QueryRequest, SaveOptions, Tenant};

/// Arguments for the memory-save tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySaveArgs {
    /// Memory content
    pub content: String,
    /// Tags to attach
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Memory category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemoryKind>,
    /// Expiry in seconds from now; 0 means no expiry
    #[serde(default)]
    pub ttl_seconds: u64,
}

/// Result of the memory-save tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySaveOutput {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub message: String,
}

/// Arguments for the memory-query tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryQueryArgs {
    /// Text to search for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Result count; 0 means the default
    #[serde(default)]
    pub top_k: usize,
    /// Tag filter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Kind filter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<MemoryKind>,
}

/// Result of the memory-query tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQueryOutput {
    pub success: bool,
    pub items: Vec<MemoryItemView>,
    pub count: usize,
    pub message: String,
}

/// Simplified item view returned to the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItemView {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MemoryKind>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "score_is_zero")]
    pub score: f64,
}

fn score_is_zero(score: &f64) -> bool {
    *score == 0.0
}

impl From<MemoryItem> for MemoryItemView {
    fn from(item: MemoryItem) -> Self {
        Self {
            id: item.id,
            content: item.content,
            tags: item.tags,
            kind: item.kind,
            created_at: item.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            score: item.score,
        }
    }
}

/// Save a memory item on behalf of a tool invocation.
///
/// `tenant` comes from the ambient request context, never from tool
/// arguments. A fresh UUID is assigned as the item id.
pub async fn save_memory(
    manager: &MemoryManager,
    tenant: Tenant,
    args: MemorySaveArgs,
) -> MemorySaveOutput {
    let mut item = MemoryItem::new(tenant)
        .id(Uuid::new_v4().to_string())
        .content(args.content)
        .created_at(Utc::now());
    item.tags = args.tags;
    item.kind = args.kind;
    if args.ttl_seconds > 0 {
        item.expires_at = Some(Utc::now() + Duration::seconds(args.ttl_seconds as i64));
    }

    let id = item.id.clone();
    let opts = SaveOptions {
        to_memory: true,
        to_disk: true,
        ..Default::default()
    };
    match manager.save(item, opts).await {
        Ok(()) => MemorySaveOutput {
            success: true,
            id,
            message: "memory saved".to_string(),
        },
        Err(e) => MemorySaveOutput {
            success: false,
            id: String::new(),
            message: format!("memory save failed: {e}"),
        },
    }
}

/// Query memory on behalf of a tool invocation.
pub async fn query_memory(
    manager: &MemoryManager,
    tenant: Tenant,
    args: MemoryQueryArgs,
) -> MemoryQueryOutput {
    let req = QueryRequest {
        tenant,
        query: args.query,
        top_k: args.top_k,
        tags: args.tags,
        kinds: args.kinds,
    };

    match manager.query(&req).await {
        Ok(result) => {
            let items: Vec<MemoryItemView> =
                result.items.into_iter().map(MemoryItemView::from).collect();
            let count = items.len();
            MemoryQueryOutput {
                success: true,
                items,
                count,
                message: format!("query returned {count} items"),
            }
        }
        Err(e) => MemoryQueryOutput {
            success: false,
            items: Vec::new(),
            count: 0,
            message: format!("memory query failed: {e}"),
        },
    }
}
