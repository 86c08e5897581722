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

//! Tenant header extraction
//!
//! Tenant identity travels out-of-band in `X-User-ID` / `X-Archive-ID`
//! headers and is injected into memory operations server-side; request
//! bodies and tool arguments never carry it. When the tenant is required,
//! requests missing either header are rejected with a structured 400.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use memloom_memory::Tenant;
use serde::Serialize;
use std::collections::HashMap;

use crate::AppState;

/// Header carrying the user identifier
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the archive identifier
pub const ARCHIVE_ID_HEADER: &str = "x-archive-id";

/// Standard API error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
    pub timestamp: String,
}

impl ApiError {
    fn missing_tenant_headers(user_id: &str, archive_id: &str) -> Self {
        let mut missing = Vec::new();
        if user_id.is_empty() {
            missing.push("X-User-ID");
        }
        if archive_id.is_empty() {
            missing.push("X-Archive-ID");
        }

        let mut details = HashMap::new();
        details.insert(
            "required_headers".to_string(),
            "X-User-ID, X-Archive-ID".to_string(),
        );
        details.insert("missing_headers".to_string(), missing.join(", "));

        Self {
            code: "MISSING_TENANT_HEADERS".to_string(),
            message: "required tenant headers are missing".to_string(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Extractor yielding the request's tenant from its headers
#[derive(Debug, Clone)]
pub struct TenantHeaders(pub Tenant);

fn header_value(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[async_trait]
impl FromRequestParts<AppState> for TenantHeaders {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER);
        let archive_id = header_value(parts, ARCHIVE_ID_HEADER);

        if state.tenant_required && (user_id.is_empty() || archive_id.is_empty()) {
            tracing::warn!(
                %user_id,
                %archive_id,
                path = %parts.uri.path(),
                "rejected request with missing tenant headers"
            );
            return Err(ApiError::missing_tenant_headers(&user_id, &archive_id));
        }

        // When not required, an incomplete tenant passes through and the
        // memory manager reports it in the operation result.
        Ok(TenantHeaders(Tenant::new(user_id, archive_id)))
    }
}
