use crate::cmd::Session;
use crate::output::{money, percent, print_json, print_table};
use std::path::Path;
use warroom_core::metrics;

pub fn run(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let summary = session.room.summary();

    if json {
        print_json(&summary)?;
        return Ok(());
    }

    println!("Deals:          {}", summary.deal_count);
    println!("Contacts:       {}", summary.contact_count);
    println!("Pipeline value: {}", money(summary.total_value));
    println!("Forecast:       {}", money(summary.weighted_value));
    println!("Avg probability: {}", percent(summary.average_probability));
    println!("Win rate:       {}", percent(summary.win_rate));
    if summary.revenue_target > 0.0 {
        println!(
            "Target:         {} ({} captured)",
            money(summary.revenue_target),
            percent(summary.target_progress)
        );
    }
    println!();

    let rows = summary
        .funnel
        .iter()
        .map(|(stage, value)| {
            vec![
                stage.to_string(),
                summary.stage_counts.get(stage).copied().unwrap_or(0).to_string(),
                money(*value),
            ]
        })
        .collect();
    print_table(&["STAGE", "DEALS", "VALUE"], rows);
    println!();

    let tiers: Vec<String> = summary
        .tier_counts
        .iter()
        .map(|(tier, n)| format!("T{tier}: {n}"))
        .collect();
    println!("Contacts by tier: {}", tiers.join("  "));

    let statuses: Vec<String> = metrics::status_counts(&session.room.state().contacts)
        .iter()
        .map(|(status, n)| format!("{status}: {n}"))
        .collect();
    if !statuses.is_empty() {
        println!("Contacts by status: {}", statuses.join("  "));
    }
    Ok(())
}
