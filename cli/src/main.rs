//! EDGECONSENT CLI - inspect and update persisted consent preferences

mod commands;

use clap::{Parser, Subcommand};
use edgeconsent_core::ConsentConfig;
use edgeconsent_extension::{ConsentExtension, DispatchTable, Event};
use edgeconsent_state::{create_persistent_store, ConsentStateManager};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::{
    drain_notifications, merge_event, render_document, render_notification, set_consent_event,
};

#[derive(Parser)]
#[command(name = "edgeconsent")]
#[command(about = "EDGECONSENT - Persisted consent preferences")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides the configuration)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (overrides the configuration)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted consents
    Show,

    /// Set a single consent category
    Set {
        /// Category name, e.g. collect, adID, personalize
        category: String,

        /// Consent value, e.g. y or n
        value: String,
    },

    /// Merge a JSON consent document into the persisted consents
    Merge {
        /// JSON document, full or bare category map
        json: String,
    },

    /// Remove the persisted consents
    Reset,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConsentConfig::load(path)?,
        None => ConsentConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    std::fs::create_dir_all(&config.store.data_dir)?;
    let store = create_persistent_store(&config.store.data_dir, &config.store.store_name)?;
    let mut manager = ConsentStateManager::from_config(store, &config.store);

    match cli.command {
        Commands::Show => match manager.current_consents() {
            Some(consents) => println!("{}", render_document(consents)?),
            None => println!("No consents recorded"),
        },

        Commands::Set { category, value } => {
            apply_update(manager, set_consent_event(&category, &value))?;
        }

        Commands::Merge { json } => {
            apply_update(manager, merge_event(&json)?)?;
        }

        Commands::Reset => {
            let outcome = manager.clear();
            info!("Reset consents: {:?}", outcome);
            if outcome.is_durable() {
                println!("Consents removed");
            } else {
                println!("Consents cleared in memory only, the store rejected the removal");
            }
        }
    }

    Ok(())
}

fn apply_update(manager: ConsentStateManager, event: Event) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(16);
    let mut extension = ConsentExtension::new(manager);
    extension.set_notification_channel(tx);
    let extension = Arc::new(extension);

    let mut table = DispatchTable::new();
    extension.register(&mut table);
    table.dispatch(&event)?;

    for notification in drain_notifications(&mut rx) {
        println!("{}", render_notification(&notification)?);
    }

    match extension.current_consents() {
        Some(consents) => println!("{}", render_document(&consents)?),
        None => println!("No consents recorded"),
    }
    Ok(())
}
