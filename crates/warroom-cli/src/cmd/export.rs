use crate::cmd::Session;
use crate::output::print_json;
use anyhow::Context;
use std::path::{Path, PathBuf};
use warroom_core::backup;

pub fn run(data_dir: &Path, out: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let dir = match out {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let path = backup::export_to(&dir, session.room.state(), chrono::Utc::now())
        .with_context(|| format!("failed to write backup into {}", dir.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": path }))?;
    } else {
        println!("Exported backup to {}", path.display());
    }
    Ok(())
}
