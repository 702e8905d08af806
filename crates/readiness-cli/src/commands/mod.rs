pub mod alerts;
pub mod attempt;
pub mod init;
pub mod modules;
pub mod progress;
pub mod protocols;
pub mod report;
pub mod validate;

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use fd_lock::RwLockWriteGuard;

use readiness_core::model::{Learner, Role};
use readiness_core::parser::load_catalog;
use readiness_store::{
    load_config_from, MemoryStore, ReadinessConfig, Services, Snapshot, StateLock,
};

/// Who is acting. Stands in for an authenticated session.
#[derive(Args, Debug, Clone)]
pub struct Identity {
    /// Learner id
    #[arg(long)]
    pub learner: String,

    /// Role: student, teacher, admin, coordinator
    #[arg(long, default_value = "student")]
    pub role: String,

    /// Grade level (students only)
    #[arg(long)]
    pub grade: Option<String>,

    /// Institution id
    #[arg(long, default_value = "default")]
    pub institution: String,
}

impl Identity {
    pub fn learner(&self) -> Result<Learner> {
        let role = Role::parse(&self.role, self.grade.clone()).map_err(anyhow::Error::msg)?;
        Ok(Learner::new(&self.learner, &self.institution, role))
    }
}

/// Config and state lock for one command invocation.
pub struct Workspace {
    config: ReadinessConfig,
    lock: StateLock,
}

impl Workspace {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let lock = StateLock::open(&config.state_path)?;
        Ok(Self { config, lock })
    }

    /// Lock the state file and load the catalog and persisted records.
    /// The lock is held until the returned session is dropped.
    pub fn session(&mut self) -> Result<Session<'_>> {
        let Workspace { config, lock } = self;
        let guard = lock.write()?;
        let catalog = load_catalog(&config.catalog_path)
            .with_context(|| format!("failed to load catalog: {}", config.catalog_path.display()))?;
        let snapshot = Snapshot::load_json(&config.state_path)?;
        let store = Arc::new(MemoryStore::from_snapshot(catalog, snapshot));
        Ok(Session {
            config,
            services: Services::new(store),
            _guard: guard,
        })
    }
}

/// Catalog and persisted records, loaded under the state lock.
pub struct Session<'a> {
    pub config: &'a ReadinessConfig,
    pub services: Services,
    _guard: RwLockWriteGuard<'a, File>,
}

impl Session<'_> {
    pub fn store(&self) -> &MemoryStore {
        &self.services.store
    }

    /// Persist progress, attempts and retractions.
    pub fn save(&self) -> Result<()> {
        let snapshot = self.services.store.snapshot()?;
        snapshot.save_json(&self.config.state_path)
    }
}
