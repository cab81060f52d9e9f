use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tradeboard_core::{Language, MarketDomain};

mod commands;

#[derive(Parser)]
#[command(name = "tradeboard")]
#[command(about = "Tradeboard - session history and replay for multi-market analysis runs", long_about = None)]
struct Cli {
    /// Dashboard data file (defaults to the platform data directory)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Engine config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stored session history, newest first
    History {
        /// Only this domain (global-equity, crypto, domestic-equity)
        #[arg(long)]
        domain: Option<MarketDomain>,
    },
    /// Show the most recent finished sessions across all domains
    Recap {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every history entry of one domain
    ClearHistory {
        #[arg(long)]
        domain: MarketDomain,
    },
    /// Delete one history entry
    Dismiss {
        #[arg(long)]
        domain: MarketDomain,
        #[arg(long)]
        session: String,
    },
    /// Show or change display preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Feed a JSON-lines command script through the engine
    Replay {
        script: PathBuf,
        /// Persist the resulting history and preferences
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    SetLanguage {
        language: Language,
    },
    SetCompact {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    SetReasoningPanel {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut service = commands::open_service(cli.data_file, cli.config).await?;

    match cli.command {
        Commands::History { domain } => commands::history::show(&service, domain),
        Commands::Recap { limit } => commands::history::recap(&service, limit),
        Commands::ClearHistory { domain } => commands::history::clear(&mut service, domain).await?,
        Commands::Dismiss { domain, session } => {
            commands::history::dismiss(&mut service, domain, &session).await?
        }
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show(&service),
            PrefsAction::SetLanguage { language } => {
                service.set_language(language).await?;
                commands::prefs::show(&service);
            }
            PrefsAction::SetCompact { enabled } => {
                service.set_compact_layout(enabled).await?;
                commands::prefs::show(&service);
            }
            PrefsAction::SetReasoningPanel { enabled } => {
                service.set_show_reasoning_panel(enabled).await?;
                commands::prefs::show(&service);
            }
        },
        Commands::Replay { script, save } => commands::replay::run(&mut service, &script, save).await?,
    }

    Ok(())
}
