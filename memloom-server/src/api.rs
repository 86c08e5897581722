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

//! Memory API endpoints
//!
//! Thin handlers over the tool-facing wrappers: the tenant comes from the
//! request headers, the body carries only the agent-visible arguments.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use memloom_memory::tools::{
    self, MemoryQueryArgs, MemoryQueryOutput, MemorySaveArgs, MemorySaveOutput,
};

use crate::tenant::TenantHeaders;
use crate::AppState;

/// Create the memory API router
pub fn memory_router() -> Router<AppState> {
    Router::new()
        .route("/save", post(save_memory))
        .route("/query", post(query_memory))
}

/// Save a memory item for the request's tenant
async fn save_memory(
    State(state): State<AppState>,
    TenantHeaders(tenant): TenantHeaders,
    Json(args): Json<MemorySaveArgs>,
) -> Json<MemorySaveOutput> {
    Json(tools::save_memory(&state.manager, tenant, args).await)
}

/// Query memory items for the request's tenant
async fn query_memory(
    State(state): State<AppState>,
    TenantHeaders(tenant): TenantHeaders,
    Json(args): Json<MemoryQueryArgs>,
) -> Json<MemoryQueryOutput> {
    Json(tools::query_memory(&state.manager, tenant, args).await)
}

/// Liveness probe; exempt from tenant extraction
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "memloom-server",
    }))
}
