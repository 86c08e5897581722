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

//! Memloom HTTP server
//!
//! Exposes the memory subsystem over a small JSON API. Tenant identity is
//! carried in request headers and injected server-side; see
//! [`tenant::TenantHeaders`].

pub mod api;
pub mod config;
pub mod tenant;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use memloom_memory::MemoryManager;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::ServerConfig;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The process's memory manager
    pub manager: Arc<MemoryManager>,
    /// Whether tenant headers are mandatory on memory routes
    pub tenant_required: bool,
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memloom_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Memloom server");
    config.validate()?;

    let manager = Arc::new(MemoryManager::new(config.memory.clone(), None, None)?);
    tracing::info!(
        namespace = %config.memory.namespace,
        in_memory = config.memory.in_memory.enable,
        disk = config.memory.disk.enable,
        async_write = config.memory.async_write.enable,
        "memory manager ready"
    );

    let state = AppState {
        manager: manager.clone(),
        tenant_required: config.tenant.required,
    };

    // Rate limiting is left to the fronting proxy; it would slot in as a
    // layer here.
    let router = Router::new()
        .route("/api/health", get(api::health))
        .nest("/api/memory", api::memory_router())
        .with_state(state);
    let router = if config.server.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    let router = router.layer(TraceLayer::new_for_http());

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued writes before exiting.
    tracing::info!("shutting down, draining memory manager");
    manager.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
