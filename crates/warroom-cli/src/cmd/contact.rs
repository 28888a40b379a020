use crate::cmd::Session;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::Path;
use warroom_core::board::{Confirmation, DeleteOutcome};
use warroom_core::contact::{ContactDraft, ContactPatch};
use warroom_core::directory::ContactFilter;
use warroom_core::types::{ContactStatus, Tier};

#[derive(Subcommand)]
pub enum ContactSubcommand {
    /// Add a contact to the directory
    Add {
        name: String,
        company: String,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Edit fields of an existing contact (empty string clears optional text)
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Delete a contact and unlink it from every deal
    Rm {
        id: String,
        /// Confirm the deletion
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Search the directory by name or company
    List {
        /// Substring of name or company
        #[arg(default_value = "")]
        query: String,
        /// ALL, a status name, or a tier (TIER1, T2, 3)
        #[arg(long, default_value = "ALL")]
        filter: ContactFilter,
    },
    /// Show a single contact
    Show { id: String },
}

#[derive(Args)]
pub struct ContactFields {
    #[arg(long)]
    role: Option<String>,
    #[arg(long, value_parser = parse_status)]
    status: Option<ContactStatus>,
    /// 1, 2 or 3
    #[arg(long)]
    tier: Option<Tier>,
    #[arg(long)]
    last_touch: Option<String>,
    #[arg(long)]
    strategy: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    linkedin: Option<String>,
}

fn parse_status(s: &str) -> Result<ContactStatus, String> {
    ContactStatus::parse(s).ok_or_else(|| {
        let known: Vec<&str> = ContactStatus::all().iter().map(|st| st.as_str()).collect();
        format!("unknown status '{s}' (expected one of {})", known.join(", "))
    })
}

pub fn run(data_dir: &Path, subcmd: ContactSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContactSubcommand::Add {
            name,
            company,
            fields,
        } => add(data_dir, name, company, fields, json),
        ContactSubcommand::Edit {
            id,
            name,
            company,
            fields,
        } => edit(data_dir, &id, name, company, fields, json),
        ContactSubcommand::Rm { id, yes } => rm(data_dir, &id, yes, json),
        ContactSubcommand::List { query, filter } => list(data_dir, &query, filter, json),
        ContactSubcommand::Show { id } => show(data_dir, &id, json),
    }
}

fn add(
    data_dir: &Path,
    name: String,
    company: String,
    fields: ContactFields,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = Session::open(data_dir)?;
    let draft = ContactDraft {
        role: fields.role,
        status: fields.status,
        tier: fields.tier,
        last_touch: fields.last_touch,
        strategy: fields.strategy,
        notes: fields.notes,
        email: fields.email,
        linkedin: fields.linkedin,
        ..ContactDraft::new(name, company)
    };
    let result = session.room.create_contact(draft);
    let contact = session.finish(result).context("failed to add contact")?;

    if json {
        print_json(&contact)?;
    } else {
        println!(
            "Added contact [{}]: {} ({})",
            contact.id, contact.name, contact.company
        );
    }
    Ok(())
}

fn edit(
    data_dir: &Path,
    id: &str,
    name: Option<String>,
    company: Option<String>,
    fields: ContactFields,
    json: bool,
) -> anyhow::Result<()> {
    let patch = ContactPatch {
        name,
        company,
        role: fields.role,
        status: fields.status,
        tier: fields.tier,
        last_touch: fields.last_touch,
        strategy: fields.strategy,
        notes: fields.notes,
        email: fields.email,
        linkedin: fields.linkedin,
    };

    let mut session = Session::open(data_dir)?;
    let result = session.room.edit_contact(id, patch);
    let contact = session
        .finish(result)
        .with_context(|| format!("failed to edit contact '{id}'"))?;

    if json {
        print_json(&contact)?;
    } else {
        println!("Updated contact [{}]", contact.id);
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
    let result = session.room.delete_contact(id, confirmation);
    match session.finish(result).context("failed to delete contact")? {
        DeleteOutcome::NeedsConfirmation => {
            anyhow::bail!("refusing to delete contact '{id}' without --yes")
        }
        DeleteOutcome::Deleted(contact) => {
            if json {
                print_json(&serde_json::json!({ "id": contact.id, "deleted": true }))?;
            } else {
                println!("Deleted contact [{}]: {}", contact.id, contact.name);
            }
        }
    }
    Ok(())
}

fn list(data_dir: &Path, query: &str, filter: ContactFilter, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let contacts = session.room.view_contacts(query, filter);

    if json {
        print_json(&contacts)?;
        return Ok(());
    }
    if contacts.is_empty() {
        println!("No contacts match.");
        return Ok(());
    }
    let rows = contacts
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.name.clone(),
                c.company.clone(),
                c.role.clone(),
                c.status.to_string(),
                format!("T{}", c.tier),
                c.last_touch.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "COMPANY", "ROLE", "STATUS", "TIER", "LAST TOUCH"],
        rows,
    );
    Ok(())
}

fn show(data_dir: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let session = Session::open(data_dir)?;
    let contact = session
        .room
        .contact(id)
        .with_context(|| format!("contact '{id}' not found"))?;

    if json {
        print_json(contact)?;
        return Ok(());
    }
    println!("{} ({})  [{}]", contact.name, contact.company, contact.id);
    if !contact.role.is_empty() {
        println!("  role:       {}", contact.role);
    }
    println!("  status:     {}", contact.status);
    println!("  tier:       {}", contact.tier);
    let optional = [
        ("last touch", &contact.last_touch),
        ("strategy", &contact.strategy),
        ("notes", &contact.notes),
        ("email", &contact.email),
        ("linkedin", &contact.linkedin),
    ];
    for (label, value) in optional {
        if let Some(v) = value {
            println!("  {:<11} {v}", format!("{label}:"));
        }
    }

    let linked: Vec<String> = session
        .room
        .state()
        .pipeline
        .iter()
        .filter(|d| d.contacts.iter().any(|c| c == &contact.id))
        .map(|d| format!("{} [{}]", d.company, d.id))
        .collect();
    if !linked.is_empty() {
        println!("  deals:      {}", linked.join(", "));
    }
    Ok(())
}
