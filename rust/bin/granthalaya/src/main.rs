//! `granthalaya`: inventory server and offline tools.
//!
//! Usage:
//!   granthalaya [-c config.toml] serve [--listen <addr>]
//!   granthalaya code --type BOOK --name "Gita" [--sequence 101]
//!   granthalaya qr encode --kind PRODUCT GG-BK-GITA-00101
//!   granthalaya scan [--resolve] < scanner-input
//!   granthalaya migrate [--status]

mod config;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use granthalaya_blob::FileStore;
use granthalaya_core::{Module, ServiceConfig};
use granthalaya_inventory::code::{self, ProductType, ScanClassifier, ScanKind, ScannerConfig};
use granthalaya_inventory::service::InventoryService;
use granthalaya_inventory::InventoryModule;
use granthalaya_kv::RedbStore;

use config::{FileConfig, Overrides};

/// Granthalaya inventory.
#[derive(Parser, Debug)]
#[command(name = "granthalaya", about = "Granthalaya inventory server and tools")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", global = true, env = "GRANTHALAYA_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides [storage] data_dir).
    #[arg(long = "data-dir", global = true, env = "GRANTHALAYA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Listen address (overrides [server] listen).
        #[arg(long)]
        listen: Option<String>,
    },

    /// Generate a product code without touching the store.
    Code {
        /// Product type: name (BOOK) or two-letter code (BK).
        #[arg(long = "type")]
        product_type: String,
        /// Product display name.
        #[arg(long)]
        name: String,
        /// Sequence number (default 1).
        #[arg(long)]
        sequence: Option<String>,
    },

    /// Encode or decode QR label payloads.
    Qr {
        #[command(subcommand)]
        action: QrAction,
    },

    /// Read scanner lines from stdin and classify each one.
    Scan {
        /// Look each scan up in the store.
        #[arg(long)]
        resolve: bool,
    },

    /// Run the product-code backfill.
    Migrate {
        /// Only show the migration lock.
        #[arg(long)]
        status: bool,
        /// Name recorded as the migration's runner.
        #[arg(long, default_value = "cli")]
        actor: String,
    },

    /// Build and store a label sheet for the given product codes.
    Labels {
        #[arg(required = true)]
        codes: Vec<String>,
        #[arg(long, default_value = "cli")]
        actor: String,
    },
}

#[derive(Subcommand, Debug)]
enum QrAction {
    /// Wrap an identifier in a QR payload.
    Encode {
        /// PRODUCT, RACK or ORDER.
        #[arg(long, default_value = "PRODUCT")]
        kind: String,
        id: String,
    },
    /// Extract the identifier from a QR payload.
    Decode { payload: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = FileConfig::load(cli.config.as_deref())?;
    let mut overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        listen: None,
    };

    match cli.command {
        Commands::Serve { listen } => {
            overrides.listen = listen;
            let config = file_config.service_config(&overrides);
            serve(&config, &file_config.scanner).await
        }
        Commands::Code {
            product_type,
            name,
            sequence,
        } => {
            let product_type: ProductType = product_type.parse()?;
            let sequence = sequence.as_deref().map(code::parse_sequence).transpose()?;
            println!("{}", code::generate_code(product_type, &name, sequence)?);
            Ok(())
        }
        Commands::Qr { action } => {
            match action {
                QrAction::Encode { kind, id } => println!("{}", code::encode(parse_kind(&kind)?, &id)),
                QrAction::Decode { payload } => match code::decode(&payload) {
                    Some(event) => print_json(&event)?,
                    None => anyhow::bail!("payload carries no recognized identifier"),
                },
            }
            Ok(())
        }
        Commands::Scan { resolve } => {
            let svc = if resolve {
                Some(open_service(&file_config.service_config(&overrides), &file_config.scanner)?)
            } else {
                None
            };
            scan_stdin(ScanClassifier::new(file_config.scanner.clone()), svc.as_ref())
        }
        Commands::Migrate { status, actor } => {
            let svc = open_service(&file_config.service_config(&overrides), &file_config.scanner)?;
            if status {
                print_json(&svc.get_migration_status()?)
            } else {
                print_json(&svc.run_product_code_backfill(&actor)?)
            }
        }
        Commands::Labels { codes, actor } => {
            let svc = open_service(&file_config.service_config(&overrides), &file_config.scanner)?;
            print_json(&svc.create_label_sheet(&codes, Some(&actor))?)
        }
    }
}

fn parse_kind(raw: &str) -> anyhow::Result<ScanKind> {
    ScanKind::PRIORITY
        .into_iter()
        .find(|k| k.to_string().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| anyhow::anyhow!("unknown scan kind {raw:?}, expected PRODUCT, RACK or ORDER"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Open the document and blob stores and wrap them in the service.
fn open_service(config: &ServiceConfig, scanner: &ScannerConfig) -> anyhow::Result<InventoryService> {
    if let Some(data_dir) = &config.data_dir {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
    }

    let db_path = config.resolve_db_path();
    let kv = RedbStore::open(&db_path)
        .map_err(|e| anyhow::anyhow!("failed to open document store {}: {}", db_path.display(), e))?;

    let blob_dir = config.resolve_blob_dir();
    let mut blob = FileStore::open(&blob_dir)
        .map_err(|e| anyhow::anyhow!("failed to open blob store {}: {}", blob_dir.display(), e))?;
    if let Some(base_url) = &config.blob_base_url {
        blob = blob.with_base_url(base_url.as_str());
    }

    info!(db = %db_path.display(), blobs = %blob_dir.display(), "storage opened");
    Ok(InventoryService::new(Arc::new(kv), Arc::new(blob)).with_scanner(scanner.clone()))
}

async fn serve(config: &ServiceConfig, scanner: &ScannerConfig) -> anyhow::Result<()> {
    let service = open_service(config, scanner)?;
    let modules: Vec<Box<dyn Module>> = vec![Box::new(InventoryModule::new(service))];

    let mut app = axum::Router::new();
    for module in &modules {
        info!(module = module.name(), "mounting module routes");
        app = app.merge(module.routes());
    }

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("Granthalaya inventory listening on {}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}

/// Classify stdin one line at a time, the way a keyboard-wedge scanner
/// attached to a terminal delivers it.
fn scan_stdin(mut classifier: ScanClassifier, svc: Option<&InventoryService>) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(event) = classifier.feed_line(&line, Instant::now()) else {
            debug!(line = %line, "line did not form a scan");
            continue;
        };
        match svc {
            Some(svc) => match svc.resolve_scan(&event) {
                Ok(resolved) => print_json(&resolved)?,
                Err(e) => warn!(kind = %event.kind, id = %event.id, error = %e, "scan did not resolve"),
            },
            None => print_json(&event)?,
        }
    }
    Ok(())
}
