/// PALISADE OPERATOR CLI
///
/// Three entry points for a deployment operator:
/// - `check-config`: fail-fast validation of a deployment configuration
/// - `validate`: run a batch of events through the pipeline
/// - `redteam`: run the attack catalogue and print the assessment

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use palisade_core::{LiquidationEvent, PipelineConfig, WalletProfile};
use palisade_pipeline::{
    honest_roster, CompleteValidator, StaticActivityOracle, ValidationRequest,
};
use palisade_redteam::RedTeamHarness;

#[derive(Parser)]
#[command(name = "palisade")]
#[command(about = "Layered validation for untrusted liquidation reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a deployment configuration and exit
    CheckConfig {
        /// Path to a pipeline config JSON file
        path: PathBuf,
    },

    /// Validate events from a JSON file
    Validate {
        /// JSON array of events to validate
        #[arg(long)]
        events: PathBuf,

        /// JSON array of recent events used as the anomaly window
        #[arg(long)]
        window: Option<PathBuf>,

        /// JSON array of wallet profiles, matched to events by wallet
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// JSON object mapping wallet -> active venue count
        #[arg(long)]
        venues: Option<PathBuf>,

        /// Pipeline config JSON; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the red-team catalogue against a configuration
    Redteam {
        /// Pipeline config JSON; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for reproducible scenario generation
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Also write the machine-readable report here
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => check_config(path),
        Commands::Validate {
            events,
            window,
            profiles,
            venues,
            config,
        } => validate(events, window, profiles, venues, config).await,
        Commands::Redteam { config, seed, json } => redteam(config, seed, json).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.validate().context("configuration rejected")?;
    Ok(config)
}

fn check_config(path: PathBuf) -> Result<()> {
    let config = load_config(Some(path))?;
    println!(
        "Configuration OK: quorum {}, policy {:?}, anomaly tolerance {}",
        config.consensus.quorum, config.policy.mode, config.policy.anomaly_tolerance
    );
    Ok(())
}

async fn validate(
    events_path: PathBuf,
    window_path: Option<PathBuf>,
    profiles_path: Option<PathBuf>,
    venues_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let events: Vec<LiquidationEvent> = read_json(&events_path)?;
    let window: Vec<LiquidationEvent> = match &window_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let profiles: Vec<WalletProfile> = match &profiles_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let profiles_by_wallet: HashMap<String, WalletProfile> = profiles
        .into_iter()
        .map(|profile| (profile.wallet.clone(), profile))
        .collect();

    let mut oracle = StaticActivityOracle::new();
    match &venues_path {
        Some(path) => {
            let venues: HashMap<String, u32> = read_json(path)?;
            for (wallet, count) in venues {
                oracle = oracle.with_wallet(&wallet, count);
            }
        }
        None => {
            warn!("no venue data supplied; treating every reported wallet as multi-venue");
            for event in &events {
                oracle = oracle.with_wallet(&event.wallet, 2);
            }
        }
    }

    let validator = CompleteValidator::new(config, honest_roster(), Box::new(oracle))?;
    let requests: Vec<ValidationRequest> = events
        .into_iter()
        .map(|event| {
            let profile = profiles_by_wallet.get(&event.wallet).cloned();
            ValidationRequest {
                window: window.clone(),
                profile,
                event,
            }
        })
        .collect();

    info!("validating {} event(s)", requests.len());
    let verdicts = validator.validate_batch(&requests).await;
    println!("{}", serde_json::to_string_pretty(&verdicts)?);

    let summary = CompleteValidator::summarize(&verdicts);
    eprintln!(
        "{} of {} valid | input {} | anomaly {} | consensus {} | credibility {}",
        summary.overall_valid,
        summary.total,
        summary.input_passed,
        summary.anomaly_passed,
        summary.consensus_reached,
        summary.credibility_passed
    );
    Ok(())
}

async fn redteam(config_path: Option<PathBuf>, seed: u64, json: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let harness = RedTeamHarness::new(config, seed)?;
    let report = harness.run().await?;

    println!("{}", report.render_text());
    if let Some(path) = json {
        fs::write(&path, report.to_json()?)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!("archived machine-readable report at {}", path.display());
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
