pub mod config;
pub mod contact;
pub mod deal;
pub mod export;
pub mod import;
pub mod level;
pub mod metrics;
pub mod oracle;

use crate::output;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use warroom_core::config::Config;
use warroom_core::notify::SystemClock;
use warroom_core::storage::FileStorage;
use warroom_core::WarRoom;

/// A loaded document plus the config it was opened with, for one command.
pub struct Session {
    pub room: WarRoom<FileStorage>,
    pub config: Config,
}

impl Session {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let config = Config::load(data_dir).context("failed to load config")?;
        let room = WarRoom::open(FileStorage::new(data_dir), &config, Arc::new(SystemClock))
            .with_context(|| format!("failed to open war room at {}", data_dir.display()))?;
        Ok(Self { room, config })
    }

    /// Surface every notification the command produced, then hand back the
    /// controller result. Scheduled notifications are shown immediately since
    /// the process is about to exit.
    pub fn finish<T>(&mut self, result: warroom_core::Result<T>) -> anyhow::Result<T> {
        let notifier = self.room.notifier_mut();
        notifier.flush();
        output::print_notifications(&notifier.active());
        Ok(result?)
    }
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}
