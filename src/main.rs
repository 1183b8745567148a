use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finanzas::clock::{Clock, SystemClock};
use finanzas::config::{default_config_path, ResolvedConfig};
use finanzas::engine::Engine;
use finanzas::extract::{Extractor, OpenAiExtractor};
use finanzas::models::{NewAsset, NewAssetTransaction};
use finanzas::remote::{HttpDocumentMirror, MemoryMirror, RemoteMirror};
use finanzas::storage::JsonFileStore;

#[derive(Parser)]
#[command(name = "finanzas")]
#[command(about = "Local-first personal finance tracker")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
    /// Print stored records as JSON
    List {
        #[arg(value_enum)]
        kind: RecordKind,
    },
    /// Show the derived portfolio summary
    Portfolio,
    /// Merge remote records into the local data set
    Pull,
    /// Write all data to a JSON snapshot file
    Export {
        /// Output path, defaults to finanzas-export-<date>.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace local data from a JSON snapshot file
    Import { file: PathBuf },
    /// Record entities described in natural language
    #[command(subcommand)]
    Add(AddCommand),
}

#[derive(Subcommand)]
enum AddCommand {
    /// Extract and record an income or expense transaction
    Transaction { text: String },
    /// Extract and record an investment operation
    Investment { text: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordKind {
    Transactions,
    Assets,
    AssetTransactions,
    Bills,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    if let Command::Config = cli.command {
        println!("Config file: {}", cli.config.display());
        println!("Data directory: {}", config.data_dir.display());
        println!("Default currency: {}", config.default_currency);
        match (config.remote.enabled, &config.remote.base_url) {
            (true, Some(url)) => println!("Remote mirror: {url}"),
            _ => println!("Remote mirror: disabled"),
        }
        return Ok(());
    }

    let store = Arc::new(JsonFileStore::new(&config.data_dir));
    let mirror: Arc<dyn RemoteMirror> = match (config.remote.enabled, &config.remote.base_url) {
        (true, Some(base_url)) => {
            let mut mirror = HttpDocumentMirror::new(base_url.clone());
            if let Some(token) = &config.remote.api_token {
                mirror = mirror.with_api_token(token.clone());
            }
            mirror.probe().await;
            Arc::new(mirror)
        }
        _ => Arc::new(MemoryMirror::offline()),
    };

    let mut engine = Engine::new(store, mirror);
    engine.load().await?;

    match cli.command {
        Command::Config => unreachable!("handled before engine setup"),
        Command::List { kind } => {
            let json = match kind {
                RecordKind::Transactions => serde_json::to_string_pretty(engine.transactions())?,
                RecordKind::Assets => serde_json::to_string_pretty(engine.assets())?,
                RecordKind::AssetTransactions => {
                    serde_json::to_string_pretty(engine.asset_transactions())?
                }
                RecordKind::Bills => serde_json::to_string_pretty(engine.bills())?,
            };
            println!("{json}");
        }
        Command::Portfolio => {
            println!("{}", serde_json::to_string_pretty(engine.portfolio())?);
        }
        Command::Pull => {
            engine.pull_remote().await;
            println!(
                "{} transactions, {} assets, {} asset transactions, {} bills",
                engine.transactions().len(),
                engine.assets().len(),
                engine.asset_transactions().len(),
                engine.bills().len()
            );
        }
        Command::Export { output } => {
            let path = output.unwrap_or_else(|| {
                PathBuf::from(format!("finanzas-export-{}.json", SystemClock.today()))
            });
            let payload = engine.export_snapshot().to_json_pretty()?;
            std::fs::write(&path, payload)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        Command::Import { file } => {
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read import file: {}", file.display()))?;
            engine.import_snapshot(&payload)?;
            println!(
                "Imported: {} transactions, {} assets, {} asset transactions, {} bills",
                engine.transactions().len(),
                engine.assets().len(),
                engine.asset_transactions().len(),
                engine.bills().len()
            );
        }
        Command::Add(add) => {
            let extractor = build_extractor(&config)?;
            match add {
                AddCommand::Transaction { text } => {
                    let draft = extractor.extract_transaction(&text).await?;
                    let data =
                        draft.into_new_transaction(&config.default_currency, SystemClock.today());
                    let txn = engine.add_transaction(data);
                    println!("Recorded {} {} ({})", txn.amount, txn.currency, txn.category);
                }
                AddCommand::Investment { text } => {
                    let draft = extractor.extract_asset_transaction(&text).await?;
                    let asset_id = match engine
                        .assets()
                        .iter()
                        .find(|a| a.name.eq_ignore_ascii_case(&draft.asset_name))
                    {
                        Some(asset) => asset.id.clone(),
                        None => {
                            let asset = engine.add_asset(NewAsset {
                                name: draft.asset_name.clone(),
                                kind: draft.asset_kind,
                                symbol: None,
                                currency: draft.currency.clone(),
                                current_value: Decimal::ZERO,
                                target_allocation: None,
                                notes: None,
                            });
                            asset.id
                        }
                    };
                    let txn = engine.add_asset_transaction(NewAssetTransaction {
                        asset_id,
                        operation: draft.operation,
                        amount: draft.amount,
                        quantity: draft.quantity,
                        price: draft.price,
                        currency: draft.currency,
                        date: SystemClock.today(),
                        notes: draft.notes,
                    });
                    println!("Recorded {:?} of {} {}", txn.operation, txn.amount, txn.currency);
                }
            }
        }
    }

    engine.flush().await;
    Ok(())
}

fn build_extractor(config: &ResolvedConfig) -> Result<OpenAiExtractor> {
    let Some(api_key) = config.extractor.resolved_api_key() else {
        bail!("No OpenAI API key configured. Set [extractor] api_key or OPENAI_API_KEY.");
    };
    Ok(OpenAiExtractor::new(api_key)
        .with_model(config.extractor.model.clone())
        .with_max_tokens(config.extractor.max_tokens)
        .with_temperature(config.extractor.temperature))
}
