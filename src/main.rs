//! algo-composer operator CLI
//!
//! Read-only node queries plus TEAL compilation, for checking a node and a
//! configuration before wiring the library into an application.

use algo_composer::app::{AppManager, AppState, AppStateValue, DeploymentControls, TemplateParams, TemplateValue};
use algo_composer::batch::AssetManager;
use algo_composer::composer::{ComposerSettings, TransactionComposer};
use algo_composer::config::SdkConfig;
use algo_composer::metrics::SdkMetrics;
use algo_composer::node::{HttpNodeClient, NodeApi};
use algo_composer::signer::SignerRegistry;
use algo_composer::transaction::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "algo-composer.toml")]
    config: PathBuf,

    /// Node URL, overrides the configuration file
    #[arg(long, env = "ALGOD_SERVER")]
    server: Option<String>,

    /// Node API token, overrides the configuration file
    #[arg(long, env = "ALGOD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print prometheus metrics after the command
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show suggested transaction parameters
    Params,

    /// Compile a TEAL file, optionally as a template
    Compile {
        file: PathBuf,

        /// Template value as NAME=VALUE; integers stay integers, 0x.. is bytes
        #[arg(long = "var", value_parser = parse_template_var)]
        vars: Vec<(String, TemplateValue)>,

        #[arg(long)]
        updatable: Option<bool>,

        #[arg(long)]
        deletable: Option<bool>,
    },

    /// Show decoded global state of an application
    AppState { app_id: u64 },

    /// Show decoded local state of an account for an application
    LocalState { app_id: u64, address: String },

    /// Show asset parameters, and the holding of an account if given
    Asset {
        asset_id: u64,
        #[arg(long)]
        account: Option<String>,
    },

    /// Show the pending status of a transaction
    Pending { tx_id: String },
}

fn parse_template_var(raw: &str) -> Result<(String, TemplateValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let value = if let Ok(int) = value.parse::<u64>() {
        TemplateValue::Int(int)
    } else if let Some(hex_bytes) = value.strip_prefix("0x") {
        TemplateValue::Bytes(hex::decode(hex_bytes).map_err(|e| format!("invalid hex in '{raw}': {e}"))?)
    } else {
        TemplateValue::String(value.to_string())
    };
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    let mut config = load_config(&args.config)?;
    if let Some(server) = &args.server {
        config.node.url = server.clone();
    }
    if args.token.is_some() {
        config.node.token = args.token.clone();
    }
    config.validate().context("Invalid configuration")?;

    let metrics = Arc::new(SdkMetrics::new().context("Failed to register metrics")?);
    let node: Arc<dyn NodeApi> = Arc::new(
        HttpNodeClient::from_config(&config)
            .context("Failed to build node client")?
            .with_metrics(metrics.clone()),
    );
    info!(server = %config.node.url, "Node client ready");

    let output = run(args.command, node, &config, metrics.clone()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if args.print_metrics {
        print!("{}", metrics.render().context("Failed to render metrics")?);
    }
    Ok(())
}

async fn run(command: Command, node: Arc<dyn NodeApi>, config: &SdkConfig, metrics: Arc<SdkMetrics>) -> Result<Value> {
    match command {
        Command::Params => {
            let params = node.suggested_params().await.context("Failed to fetch suggested params")?;
            Ok(serde_json::to_value(&params)?)
        }
        Command::Compile {
            file,
            vars,
            updatable,
            deletable,
        } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let params: TemplateParams = vars.into_iter().collect();
            let controls = DeploymentControls { updatable, deletable };
            let manager = AppManager::new(node).with_metrics(metrics);
            let compiled = manager
                .compile_teal_template(&source, Some(&params), Some(&controls))
                .await
                .with_context(|| format!("Failed to compile {}", file.display()))?;
            Ok(json!({
                "hash": compiled.compiled_hash,
                "result": compiled.compiled,
                "size": compiled.compiled_bytes.len(),
            }))
        }
        Command::AppState { app_id } => {
            let state = AppManager::new(node)
                .get_global_state(app_id)
                .await
                .with_context(|| format!("Failed to read global state of app {app_id}"))?;
            Ok(state_to_json(&state))
        }
        Command::LocalState { app_id, address } => {
            let address: Address = address.parse().context("Invalid address")?;
            let state = AppManager::new(node)
                .get_local_state(app_id, &address)
                .await
                .with_context(|| format!("Failed to read local state of {address} for app {app_id}"))?;
            Ok(state_to_json(&state))
        }
        Command::Asset { asset_id, account } => {
            // Read-only: the composer factory is never invoked
            let factory_node = node.clone();
            let settings = ComposerSettings::from(config);
            let manager = AssetManager::new(
                node,
                Arc::new(move || {
                    TransactionComposer::new(factory_node.clone(), SignerRegistry::new())
                        .with_settings(settings.clone())
                }),
            );
            let asset = manager
                .get_by_id(asset_id)
                .await
                .with_context(|| format!("Failed to fetch asset {asset_id}"))?;
            let mut output = json!({
                "asset-id": asset.asset_id,
                "creator": asset.creator,
                "total": asset.total,
                "decimals": asset.decimals,
                "default-frozen": asset.default_frozen,
                "name": asset.asset_name,
                "unit-name": asset.unit_name,
                "url": asset.url,
            });
            if let Some(account) = account {
                let address: Address = account.parse().context("Invalid address")?;
                match manager.get_account_information(&address, asset_id).await {
                    Ok(info) => output["holding"] = serde_json::to_value(info.asset_holding)?,
                    Err(e) => {
                        warn!(account = %address, asset_id, error = %e, "No holding");
                        output["holding"] = Value::Null;
                    }
                }
            }
            Ok(output)
        }
        Command::Pending { tx_id } => {
            let pending = node
                .pending_transaction(&tx_id)
                .await
                .with_context(|| format!("Failed to fetch pending transaction {tx_id}"))?;
            Ok(serde_json::to_value(&pending)?)
        }
    }
}

fn state_to_json(state: &HashMap<String, AppState>) -> Value {
    let entries = state
        .iter()
        .map(|(key, entry)| {
            let value = match &entry.value {
                AppStateValue::Uint(uint) => json!({ "type": "uint", "value": uint }),
                AppStateValue::Bytes { display, .. } => json!({ "type": "bytes", "value": display }),
            };
            (key.clone(), value)
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(entries)
}

fn init_logging(verbose: bool, json_logs: bool) {
    let default_filter = if verbose {
        "algo_composer=debug,info"
    } else {
        "algo_composer=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

/// Load configuration from file with fallback to environment-only defaults
fn load_config(path: &std::path::Path) -> Result<SdkConfig> {
    if path.exists() {
        SdkConfig::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        SdkConfig::from_env().context("Failed to load config from environment")
    }
}
