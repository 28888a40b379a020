//! Fixed values each capability resolves to when generation is unavailable.

use crate::types::{DossierReport, Diagnostics, Grade, HiringVelocity, MarketSignal, TrendPoint};
use warroom_core::backup::BulkImport;
use warroom_core::contact::Contact;

pub const BRIEFING: &str = "Failed to generate briefing narrative.";

pub fn outreach(contact: &Contact) -> String {
    format!(
        "Hi {name},\n\n\
         I have been following {company} closely and would value 15 minutes to compare notes \
         on where your team is headed. Happy to work around your calendar.\n\n\
         Best,",
        name = contact.name,
        company = contact.company,
    )
}

pub fn bulk_import() -> BulkImport {
    BulkImport::default()
}

pub fn dossier() -> DossierReport {
    DossierReport {
        summary: "Excellent presence, minor filler word usage.".to_string(),
        conviction: Grade::Letter("B+".to_string()),
        clarity: Grade::Letter("A".to_string()),
        star_method: Grade::Letter("Pass".to_string()),
        cadence_match: Some(85.0),
        wpm: Some(145.0),
    }
}

pub fn market_signals() -> Vec<MarketSignal> {
    let signal = |id: &str, company: &str, kind: &str, headline: &str, date: &str, impact: f64| {
        MarketSignal {
            id: id.to_string(),
            company: company.to_string(),
            kind: kind.to_string(),
            headline: headline.to_string(),
            date: date.to_string(),
            impact_score: impact,
        }
    };
    vec![
        signal("m1", "Databricks", "FUNDING", "Raises $500M Series I at $43B Valuation", "2024-03-12", 9.0),
        signal("m2", "Rippling", "HIRING", "Expanding APAC Sales Team by 200 Heads", "2024-03-10", 8.0),
        signal("m3", "Stripe", "PRODUCT", "Launches new Enterprise Crypto Rails", "2024-03-08", 7.0),
        signal("m4", "Linear", "PRODUCT", "Releases \"Insights\" for Engineering Teams", "2024-03-05", 6.0),
        signal("m5", "OpenAI", "M&A", "Acquires Rockset for Retrieval Infrastructure", "2024-03-01", 9.0),
    ]
}

pub fn hiring_velocity() -> HiringVelocity {
    const SCORES: [f64; 12] = [45.0, 48.0, 52.0, 50.0, 58.0, 62.0, 65.0, 60.0, 72.0, 78.0, 85.0, 92.0];
    HiringVelocity {
        velocity: "Surge Detected (+12%)".to_string(),
        insight: "Q4 Budget Flush driving 15% increase in Enterprise GTM roles. \
                  Fintech & AI sectors leading."
            .to_string(),
        trend: SCORES
            .iter()
            .enumerate()
            .map(|(i, score)| TrendPoint {
                month: format!("W{}", i + 1),
                score: *score,
            })
            .collect(),
    }
}

pub fn diagnostics() -> Diagnostics {
    Diagnostics {
        improvements: vec![
            "Enrich P1 deal signals".to_string(),
            "Log a next step on every open deal".to_string(),
            "Link contacts to the deals they influence".to_string(),
        ],
        bugs: vec!["Orphaned lead nodes".to_string()],
        category_maturity: [
            ("Identity Depth".to_string(), 78.0),
            ("Revenue Velocity".to_string(), 62.0),
        ]
        .into_iter()
        .collect(),
    }
}
