//! hsa-assist - HSA expense assistant CLI
//!
//! Sends receipts to the classification service, shows the classified
//! draft, submits approvals and reports on the stored ledger.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hsa_assist::models::Eligibility;
use hsa_assist::review::ReceiptDraft;
use hsa_assist::services::{ClientConfig, FileAttachment, RequestClient};
use hsa_assist::summary::{summarize, LedgerFilter, SortKey, SortOrder};
use hsa_assist::workflow::Assistant;
use hsa_assist::AppState;
use hsa_common::config::{RootFolderInitializer, TomlConfig};

/// Command-line arguments for hsa-assist
#[derive(Parser, Debug)]
#[command(name = "hsa-assist", version, about = "HSA expense assistant")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Base URL of the classification service
    #[arg(short, long)]
    service_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a text message to the assistant
    Chat {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Upload receipt images or PDFs for classification
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Message sent with the files
        #[arg(short, long, default_value = "")]
        text: String,
        /// Submit the classified receipt unchanged
        #[arg(long)]
        approve: bool,
    },
    /// Show ledger items and statistics
    Summary {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Earliest purchase date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        /// Latest purchase date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// date, price, store or name
        #[arg(long, default_value = "date")]
        sort: SortKey,
        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
    },
    /// List approved receipts
    History,
    /// Delete the stored ledger and history
    Clear,
    /// Print the effective configuration
    Config,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    hsa_common::time::parse_date(value).ok_or_else(|| format!("invalid date '{}'", value))
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let default_filter = format!(
        "hsa_assist={level},hsa_common={level}",
        level = config.logging.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_tracing(&toml_config)?;

    info!("Starting hsa-assist v{}", env!("CARGO_PKG_VERSION"));

    let service_url =
        hsa_common::config::resolve_service_url(args.service_url.as_deref(), &toml_config);

    // Step 1: Resolve and create the root folder
    let root_folder =
        hsa_common::config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);

    if let Command::Config = args.command {
        let mut effective = toml_config.clone();
        effective.root_folder = Some(root_folder);
        effective.service.base_url = service_url;
        print!("{}", toml::to_string_pretty(&effective)?);
        return Ok(());
    }

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", initializer.root_folder().display());

    // Step 2: Open the database and restore the ledger
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = hsa_common::db::init_database(&db_path).await?;
    let state = AppState::load(pool).await?;

    // Step 3: Service client
    info!("Service: {}", service_url);
    let client = RequestClient::new(ClientConfig::from_toml(service_url, &toml_config))?;
    let assistant = Assistant::from_config(Arc::new(client), state.clone(), &toml_config);

    match args.command {
        Command::Chat { text } => {
            let outcome = assistant.send_message(&text.join(" "), Vec::new()).await?;
            println!("{}", outcome.reply);
            if let Some(draft) = assistant.current_draft().await {
                print_draft(&draft);
            }
        }
        Command::Upload {
            files,
            text,
            approve,
        } => {
            let mut attachments = Vec::with_capacity(files.len());
            for path in &files {
                attachments.push(FileAttachment::from_path(path).await?);
            }

            let outcome = assistant.send_message(&text, attachments).await?;
            if !outcome.reply.is_empty() {
                println!("{}", outcome.reply);
            }

            match assistant.current_draft().await {
                Some(draft) => {
                    print_draft(&draft);
                    if approve {
                        let approval = assistant.approve().await?;
                        println!(
                            "Approved {} from {}: {} eligible item(s), {} in ledger",
                            approval.record.receipt_id,
                            approval.record.store_name,
                            approval.record.eligible_item_count,
                            approval.ledger_items
                        );
                    }
                }
                None if approve => println!("No receipt was recognized; nothing to approve"),
                None => {}
            }
        }
        Command::Summary {
            store,
            search,
            from,
            to,
            sort,
            asc,
        } => {
            let filter = LedgerFilter {
                store,
                search,
                from,
                to,
                sort_by: sort,
                order: if asc {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                },
            };
            let ledger = state.ledger.read().await;
            let (stats, view) = summarize(&ledger, &filter, hsa_common::time::today());

            println!(
                "Total: {}  This month: {}  Receipts: {}  Items: {}",
                stats.total_amount.round_dp(2),
                stats.monthly_amount.round_dp(2),
                stats.receipt_count,
                stats.item_count
            );
            println!();
            for row in &view.rows {
                let date = row
                    .purchase_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<10}  {:<24}  {:<20}  {:>3}  {:>10}",
                    date,
                    row.item.name,
                    row.item.store_name,
                    row.item.quantity,
                    row.item.price.round_dp(2)
                );
            }
            println!(
                "{} item(s), total {}",
                view.rows.len(),
                view.total_cost.round_dp(2)
            );
        }
        Command::History => {
            let ledger = state.ledger.read().await;
            if ledger.history().is_empty() {
                println!("No approved receipts");
            }
            for record in ledger.history() {
                println!(
                    "{}  {:<20}  {:<12}  {:>3} item(s)  eligible {:>10}  receipt {:>10}",
                    record.purchase_date,
                    record.store_name,
                    record.payment_card,
                    record.eligible_item_count,
                    record.total_eligible_cost.round_dp(2),
                    record.receipt_total.round_dp(2)
                );
            }
        }
        Command::Clear => {
            state.clear_ledger().await?;
            println!("Ledger and history cleared");
        }
        Command::Config => {}
    }

    Ok(())
}

fn print_draft(draft: &ReceiptDraft) {
    println!();
    println!(
        "Receipt {}  {}  {}  {} ****{}",
        draft.receipt_ref(),
        draft.store_name(),
        draft.purchase_date(),
        draft.payment_label(),
        draft.last_four()
    );
    for bucket in Eligibility::ALL {
        let items = draft.items(bucket);
        if items.is_empty() {
            continue;
        }
        println!("  {}:", bucket);
        for item in items {
            println!(
                "    {:<24} {:>3} x {:>8}  {}",
                item.name,
                item.quantity,
                item.price.round_dp(2),
                item.description
            );
        }
    }
    println!("  Eligible total: {}", draft.total_eligible_cost().round_dp(2));
    if let Some(image) = draft.image_ref() {
        println!("  Image: {}", image);
    }
}
