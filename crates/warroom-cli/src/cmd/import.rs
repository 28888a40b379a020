use crate::cmd::{runtime, Session};
use crate::output::{note_fallback, print_json};
use anyhow::Context;
use std::path::Path;
use warroom_core::backup::{self, ImportMode};
use warroom_oracle::{GeminiClient, Oracle};

/// A file that parses as a full backup is restored by id. Anything else goes
/// through the extractor and is appended under fresh ids.
pub fn run(data_dir: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut session = Session::open(data_dir)?;

    let result = match backup::parse_backup(&text) {
        Some(state) => session.room.restore_backup(state),
        None => {
            let oracle: Oracle<GeminiClient> = Oracle::from_config(&session.config.oracle)
                .context("failed to configure generator")?;
            let extracted = runtime()?.block_on(oracle.parse_bulk_import(&text));
            note_fallback(extracted.source);
            session.room.append_bulk(extracted.into_value())
        }
    };
    let report = session.finish(result).context("import failed")?;

    if json {
        print_json(&report)?;
        return Ok(());
    }
    match report.mode {
        ImportMode::Restore => println!(
            "Restored backup: {} contacts ({} new), {} deals ({} new)",
            report.contacts(),
            report.contacts_added,
            report.deals(),
            report.deals_added
        ),
        ImportMode::Append => println!(
            "Imported {} contacts and {} deals",
            report.contacts_added, report.deals_added
        ),
    }
    if report.skipped > 0 {
        println!("Skipped {} incomplete records", report.skipped);
    }
    Ok(())
}
