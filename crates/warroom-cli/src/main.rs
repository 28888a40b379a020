mod cmd;
mod data_dir;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, contact::ContactSubcommand, deal::DealSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "warroom",
    about = "Pipeline board, contacts CRM and briefing generator for a one-person sales war room",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data directory (default: nearest .warroom/ upward from cwd, then ~/.warroom)
    #[arg(long, global = true, env = "WARROOM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage pipeline deals
    Deal {
        #[command(subcommand)]
        subcommand: DealSubcommand,
    },

    /// Manage the contact directory
    Contact {
        #[command(subcommand)]
        subcommand: ContactSubcommand,
    },

    /// Pipeline totals, forecast and funnel
    Metrics,

    /// Current level and XP progress
    Level,

    /// Write a full JSON backup of the document
    Export {
        /// Directory to write the backup into (default: cwd)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import a full backup, or extract records from CSV/free text
    Import { file: PathBuf },

    /// Generate an executive briefing for a deal
    Brief { deal_id: String },

    /// Draft a cold email to a contact
    Outreach { contact_id: String },

    /// Recent market events for pipeline companies
    Signals {
        /// Companies to focus on (default: companies in the pipeline)
        companies: Vec<String>,
    },

    /// Hiring velocity trend
    Velocity,

    /// Grade a practice session transcript
    Score { transcript: PathBuf },

    /// Suggestions for the health of the stored document
    Diagnose,

    /// Inspect and validate config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = data_dir::resolve_data_dir(cli.data_dir.as_deref()).and_then(|dir| {
        let json = cli.json;
        match cli.command {
            Commands::Deal { subcommand } => cmd::deal::run(&dir, subcommand, json),
            Commands::Contact { subcommand } => cmd::contact::run(&dir, subcommand, json),
            Commands::Metrics => cmd::metrics::run(&dir, json),
            Commands::Level => cmd::level::run(&dir, json),
            Commands::Export { out } => cmd::export::run(&dir, out.as_deref(), json),
            Commands::Import { file } => cmd::import::run(&dir, &file, json),
            Commands::Brief { deal_id } => cmd::oracle::brief(&dir, &deal_id, json),
            Commands::Outreach { contact_id } => cmd::oracle::outreach(&dir, &contact_id, json),
            Commands::Signals { companies } => cmd::oracle::signals(&dir, companies, json),
            Commands::Velocity => cmd::oracle::velocity(&dir, json),
            Commands::Score { transcript } => cmd::oracle::score(&dir, &transcript, json),
            Commands::Diagnose => cmd::oracle::diagnose(&dir, json),
            Commands::Config { subcommand } => cmd::config::run(&dir, subcommand, json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
