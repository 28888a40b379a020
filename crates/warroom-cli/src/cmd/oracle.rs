//! Commands backed by the text generator. Each one works offline and prints
//! fallback content when no key is configured.

use crate::cmd::{runtime, Session};
use crate::output::{note_fallback, print_json, print_table};
use anyhow::Context;
use std::path::Path;
use warroom_oracle::types::Grade;
use warroom_oracle::{GeminiClient, Oracle};

fn oracle(session: &Session) -> anyhow::Result<Oracle<GeminiClient>> {
    Oracle::from_config(&session.config.oracle).context("failed to configure generator")
}

pub fn brief(data_dir: &Path, deal_id: &str, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let deal = session
        .room
        .deal(deal_id)
        .with_context(|| format!("deal '{deal_id}' not found"))?;
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(
        oracle.generate_briefing(&session.room.state().neural_core, deal),
    );

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    println!("{}", generated.value);
    Ok(())
}

pub fn outreach(data_dir: &Path, contact_id: &str, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let contact = session
        .room
        .contact(contact_id)
        .with_context(|| format!("contact '{contact_id}' not found"))?;
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(
        oracle.draft_outreach(contact, &session.room.state().neural_core),
    );

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    println!("{}", generated.value);
    Ok(())
}

pub fn signals(data_dir: &Path, companies: Vec<String>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let companies = if companies.is_empty() {
        pipeline_companies(&session)
    } else {
        companies
    };
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(oracle.fetch_market_signals(&companies));

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    let rows = generated
        .value
        .iter()
        .map(|s| {
            vec![
                s.date.clone(),
                s.company.clone(),
                s.kind.clone(),
                format!("{:.0}", s.impact_score),
                s.headline.clone(),
            ]
        })
        .collect();
    print_table(&["DATE", "COMPANY", "TYPE", "IMPACT", "HEADLINE"], rows);
    Ok(())
}

/// Distinct pipeline companies in board order.
fn pipeline_companies(session: &Session) -> Vec<String> {
    let mut seen = Vec::new();
    for deal in &session.room.state().pipeline {
        if !seen.iter().any(|c: &String| c.eq_ignore_ascii_case(&deal.company)) {
            seen.push(deal.company.clone());
        }
    }
    seen
}

pub fn velocity(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(oracle.hiring_velocity());

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    let v = &generated.value;
    println!("Velocity: {}", v.velocity);
    if !v.insight.is_empty() {
        println!("{}", v.insight);
    }
    for point in &v.trend {
        println!("  {:<6} {:>5.1}", point.month, point.score);
    }
    Ok(())
}

/// Grade a transcript and award session XP. Only live results with a
/// numeric score are appended to the session history.
pub fn score(data_dir: &Path, transcript: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(transcript)
        .with_context(|| format!("failed to read {}", transcript.display()))?;
    let mut session = Session::open(data_dir)?;
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(oracle.score_session(&text));

    let score = if generated.is_fallback() {
        None
    } else {
        numeric_score(&generated.value)
    };
    let result = session
        .room
        .record_session(score, &generated.value.summary);
    session
        .finish(result)
        .context("failed to record practice session")?;

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    let r = &generated.value;
    println!("{}", r.summary);
    println!("  conviction:  {}", r.conviction);
    println!("  clarity:     {}", r.clarity);
    println!("  STAR method: {}", r.star_method);
    if let Some(c) = r.cadence_match {
        println!("  cadence:     {c:.0}%");
    }
    if let Some(w) = r.wpm {
        println!("  pace:        {w:.0} wpm");
    }
    Ok(())
}

fn numeric_score(report: &warroom_oracle::types::DossierReport) -> Option<f64> {
    match report.conviction {
        Grade::Score(s) => Some(s),
        Grade::Letter(_) => report.cadence_match,
    }
}

pub fn diagnose(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let oracle = oracle(&session)?;
    let generated = runtime()?.block_on(oracle.diagnostics(session.room.state()));

    if json {
        return print_json(&generated);
    }
    note_fallback(generated.source);
    let d = &generated.value;
    if !d.improvements.is_empty() {
        println!("Improvements:");
        for item in &d.improvements {
            println!("  - {item}");
        }
    }
    if !d.bugs.is_empty() {
        println!("Issues:");
        for item in &d.bugs {
            println!("  - {item}");
        }
    }
    if !d.category_maturity.is_empty() {
        println!("Maturity:");
        for (name, pct) in &d.category_maturity {
            println!("  {name:<20} {pct:>3.0}%");
        }
    }
    Ok(())
}
