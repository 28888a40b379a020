use serde::Serialize;
use warroom_core::notify::{Notification, NotifyKind};
use warroom_oracle::Source;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

/// Compact currency: `$1.2M`, `$450K`, `$900`.
pub fn money(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.0}K", value / 1_000.0)
    } else {
        format!("${:.0}", value)
    }
}

pub fn percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// Notifications go to stderr so stdout stays clean for `--json`.
pub fn print_notifications(entries: &[&Notification]) {
    for n in entries {
        let tag = match n.kind {
            NotifyKind::Success => "ok",
            NotifyKind::Info => "info",
            NotifyKind::Warning => "warn",
            NotifyKind::Error => "error",
        };
        if n.detail.is_empty() {
            eprintln!("[{tag}] {}", n.title);
        } else {
            eprintln!("[{tag}] {}: {}", n.title, n.detail);
        }
    }
}

pub fn note_fallback(source: Source) {
    if source == Source::Fallback {
        eprintln!("[info] generator offline, showing fallback content");
    }
}
