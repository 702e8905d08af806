//! readiness-store: Persistence adapters and configuration.
//!
//! Implements the persistence ports from `readiness-core` in memory, with
//! JSON snapshots so state survives between process runs, and wires the
//! core services on top of a store.

pub mod config;
pub mod lock;
pub mod memory;
pub mod snapshot;

use std::sync::Arc;

use readiness_core::governor::AttemptGovernor;
use readiness_core::ledger::ProgressLedger;

pub use config::{load_config, load_config_from, ReadinessConfig};
pub use lock::StateLock;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;

/// The core services wired onto one store.
pub struct Services {
    pub store: Arc<MemoryStore>,
    pub ledger: Arc<ProgressLedger>,
    pub governor: AttemptGovernor,
}

impl Services {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let ledger = Arc::new(ProgressLedger::new(store.clone(), store.clone()));
        let governor = AttemptGovernor::new(store.clone(), store.clone(), Arc::clone(&ledger));
        Self {
            store,
            ledger,
            governor,
        }
    }
}
