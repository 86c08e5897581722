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

//! Process-wide default manager
//!
//! A convenience surface for call sites that cannot thread a manager
//! through their constructors (tool wrappers resolved inside an agent
//! graph). New code should prefer an explicitly injected
//! [`MemoryManager`](crate::MemoryManager).

use std::sync::{Arc, OnceLock};

use crate::config::MemoryOptions;
use crate::error::MemoryResult;
use crate::manager::MemoryManager;
use crate::store::{TripleClient, VectorClient};

static DEFAULT_MANAGER: OnceLock<Arc<MemoryManager>> = OnceLock::new();

/// Initialize the process-wide default manager.
///
/// The first successful call wins; later calls are silently ignored so a
/// server and its tools can both attempt initialization.
pub fn init_default(
    opts: MemoryOptions,
    vector: Option<Arc<dyn VectorClient>>,
    triple: Option<Arc<dyn TripleClient>>,
) -> MemoryResult<()> {
    if DEFAULT_MANAGER.get().is_some() {
        return Ok(());
    }
    let manager = Arc::new(MemoryManager::new(opts, vector, triple)?);
    // A lost race means another caller finished first; their instance wins
    // and ours winds down once its queue sender drops.
    let _ = DEFAULT_MANAGER.set(manager);
    Ok(())
}

/// Fetch the process-wide default manager, initializing it from
/// [`MemoryOptions::default`] if nothing has done so yet.
pub fn default_manager() -> Arc<MemoryManager> {
    DEFAULT_MANAGER
        .get_or_init(|| {
            Arc::new(
                MemoryManager::new(MemoryOptions::default(), None, None)
                    .expect("default memory options always construct"),
            )
        })
        .clone()
}
