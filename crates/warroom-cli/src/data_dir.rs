use anyhow::Context;
use std::path::{Path, PathBuf};
use warroom_core::paths::{self, DATA_DIR_NAME};

/// Resolve the data directory.
///
/// Priority:
/// 1. `--data-dir` flag / `WARROOM_DATA_DIR` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.warroom/`
/// 3. `$HOME/.warroom`
pub fn resolve_data_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(found) = find_upward(&cwd) {
        return Ok(found);
    }

    paths::default_data_dir().context("cannot locate a data directory")
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}
