use crate::cmd::Session;
use crate::output::{money, print_json, print_table};
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::Path;
use warroom_core::board::{Confirmation, DeleteOutcome, MoveOutcome};
use warroom_core::deal::{Deal, DealDraft, DealPatch};
use warroom_core::types::{Priority, Stage};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum DealSubcommand {
    /// Add a deal to the pipeline
    Add {
        company: String,
        role: String,
        #[command(flatten)]
        fields: DealFields,
    },
    /// Edit fields of an existing deal (empty string clears optional text)
    Edit {
        id: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[command(flatten)]
        fields: DealFields,
    },
    /// Move a deal to another stage
    Move { id: String, stage: Stage },
    /// Delete a deal
    Rm {
        id: String,
        /// Confirm the deletion
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List deals
    List {
        /// Only deals in this stage
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// Show a single deal
    Show { id: String },
    /// Show the pipeline as stage columns
    Board,
}

#[derive(Args, Default)]
pub struct DealFields {
    /// Target, Applied, Interview, Offer or Closed
    #[arg(long)]
    stage: Option<Stage>,
    /// Win probability, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    probability: Option<u8>,
    /// Deal value in dollars
    #[arg(long)]
    value: Option<f64>,
    /// P1, P2 or P3
    #[arg(long)]
    priority: Option<Priority>,
    #[arg(long)]
    salary: Option<String>,
    #[arg(long)]
    intent: Option<String>,
    #[arg(long)]
    next_step: Option<String>,
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Linked contact id (repeatable)
    #[arg(long = "contact")]
    contacts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(data_dir: &Path, subcmd: DealSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        DealSubcommand::Add {
            company,
            role,
            fields,
        } => add(data_dir, company, role, fields, json),
        DealSubcommand::Edit {
            id,
            company,
            role,
            fields,
        } => edit(data_dir, &id, company, role, fields, json),
        DealSubcommand::Move { id, stage } => move_deal(data_dir, &id, stage, json),
        DealSubcommand::Rm { id, yes } => rm(data_dir, &id, yes, json),
        DealSubcommand::List { stage } => list(data_dir, stage, json),
        DealSubcommand::Show { id } => show(data_dir, &id, json),
        DealSubcommand::Board => board(data_dir, json),
    }
}

fn add(
    data_dir: &Path,
    company: String,
    role: String,
    fields: DealFields,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = Session::open(data_dir)?;
    let draft = DealDraft {
        stage: fields.stage,
        probability: fields.probability,
        value: fields.value,
        priority: fields.priority,
        salary: fields.salary,
        intent: fields.intent,
        next_step: fields.next_step,
        due_date: fields.due,
        notes: fields.notes,
        contacts: fields.contacts,
        ..DealDraft::new(company, role)
    };
    let result = session.room.create_deal(draft);
    let deal = session.finish(result).context("failed to add deal")?;

    if json {
        print_json(&deal)?;
    } else {
        println!("Added deal [{}]: {} / {}", deal.id, deal.company, deal.role);
    }
    Ok(())
}

fn edit(
    data_dir: &Path,
    id: &str,
    company: Option<String>,
    role: Option<String>,
    fields: DealFields,
    json: bool,
) -> anyhow::Result<()> {
    let patch = DealPatch {
        company,
        role,
        stage: fields.stage,
        probability: fields.probability,
        value: fields.value,
        priority: fields.priority,
        salary: fields.salary,
        intent: fields.intent,
        next_step: fields.next_step,
        due_date: fields.due,
        notes: fields.notes,
        contacts: (!fields.contacts.is_empty()).then_some(fields.contacts),
    };
    if patch.is_empty() {
        anyhow::bail!("nothing to change: pass at least one field flag");
    }

    let mut session = Session::open(data_dir)?;
    let result = session.room.edit_deal(id, patch);
    let deal = session
        .finish(result)
        .with_context(|| format!("failed to edit deal '{id}'"))?;

    if json {
        print_json(&deal)?;
    } else {
        println!("Updated deal [{}]", deal.id);
    }
    Ok(())
}

fn move_deal(data_dir: &Path, id: &str, stage: Stage, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(data_dir)?;
    let result = session.room.move_deal(id, stage);
    let outcome = session.finish(result).context("failed to move deal")?;

    match outcome {
        MoveOutcome::NotFound => anyhow::bail!("deal '{id}' not found"),
        MoveOutcome::Unchanged => {
            if json {
                print_json(&serde_json::json!({ "id": id, "stage": stage, "moved": false }))?;
            } else {
                println!("Deal [{id}] is already in {stage}");
            }
        }
        MoveOutcome::Moved { from, to } => {
            if json {
                print_json(
                    &serde_json::json!({ "id": id, "from": from, "stage": to, "moved": true }),
                )?;
            } else {
                println!("Moved deal [{id}]: {from} -> {to}");
            }
        }
    }
    Ok(())
}

fn rm(data_dir: &Path, id: &str, yes: bool, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(data_dir)?;
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Pending
    };
    let result = session.room.delete_deal(id, confirmation);
    match session.finish(result).context("failed to delete deal")? {
        DeleteOutcome::NeedsConfirmation => {
            anyhow::bail!("refusing to delete deal '{id}' without --yes")
        }
        DeleteOutcome::Deleted(deal) => {
            if json {
                print_json(&serde_json::json!({ "id": deal.id, "deleted": true }))?;
            } else {
                println!("Deleted deal [{}]: {}", deal.id, deal.company);
            }
        }
    }
    Ok(())
}

fn list(data_dir: &Path, stage: Option<Stage>, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let deals: Vec<&Deal> = session
        .room
        .state()
        .pipeline
        .iter()
        .filter(|d| stage.map_or(true, |s| d.stage == s))
        .collect();

    if json {
        print_json(&deals)?;
        return Ok(());
    }
    if deals.is_empty() {
        println!("No deals.");
        return Ok(());
    }
    let rows = deals
        .iter()
        .map(|d| {
            vec![
                d.id.clone(),
                d.company.clone(),
                d.role.clone(),
                d.stage.to_string(),
                d.priority.to_string(),
                format!("{}%", d.probability),
                money(d.value),
                money(d.expected_value()),
            ]
        })
        .collect();
    print_table(
        &["ID", "COMPANY", "ROLE", "STAGE", "PRI", "PROB", "VALUE", "EXPECTED"],
        rows,
    );
    Ok(())
}

fn show(data_dir: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let deal = session
        .room
        .deal(id)
        .with_context(|| format!("deal '{id}' not found"))?;

    if json {
        print_json(deal)?;
        return Ok(());
    }
    println!("{} / {}  [{}]", deal.company, deal.role, deal.id);
    println!("  stage:       {}", deal.stage);
    println!("  priority:    {}", deal.priority);
    println!("  probability: {}%", deal.probability);
    println!("  value:       {}", money(deal.value));
    println!("  expected:    {}", money(deal.expected_value()));
    let optional = [
        ("salary", &deal.salary),
        ("intent", &deal.intent),
        ("next step", &deal.next_step),
        ("due", &deal.due_date),
        ("notes", &deal.notes),
    ];
    for (label, value) in optional {
        if let Some(v) = value {
            println!("  {:<12} {v}", format!("{label}:"));
        }
    }
    for cid in &deal.contacts {
        match session.room.contact(cid) {
            Some(c) => println!("  contact:     {} ({}) [{}]", c.name, c.company, c.id),
            None => println!("  contact:     [{cid}] (missing)"),
        }
    }
    Ok(())
}

fn board(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let columns = session.room.columns();

    if json {
        print_json(&columns)?;
        return Ok(());
    }
    for col in &columns {
        println!("{} ({}, {})", col.stage, col.deals.len(), money(col.total));
        for d in &col.deals {
            println!("  [{}] {} / {}  {}  {}%", d.id, d.company, d.role, money(d.value), d.probability);
        }
    }
    Ok(())
}
