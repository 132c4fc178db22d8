//! SurgeOps command-line entry point
//!
//! Runs one pipeline operation against a sled record store and prints the
//! result as JSON.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use surge_ops::config::SurgeOpsConfig;
use surge_ops::storage::{RecordStore, SledStore};
use surge_ops::types::{
    Berth, BerthStatus, OperationalImpact, Vessel, VesselStatus, VesselUpsert, WeatherObservation,
    YardBlock, YardBlockCategory,
};
use surge_ops::SurgePipeline;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "surge-ops")]
#[command(about = "SurgeOps port surge detection and response")]
#[command(version)]
struct CliArgs {
    /// Path to a surgeops.toml (overrides SURGEOPS_CONFIG and ./surgeops.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Record store directory (overrides storage.path)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines (also SURGEOPS_LOG_JSON=true)
    #[arg(long, env = "SURGEOPS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Evaluate surge rules now; on a surge, record alert, event and plan
    Evaluate,
    /// Insert or update a vessel, then evaluate surge rules
    Vessel {
        name: String,
        /// Update this vessel id instead of matching by IMO or name
        #[arg(long)]
        id: Option<Uuid>,
        #[arg(long)]
        imo: Option<String>,
        /// Expected TEU
        #[arg(long, default_value_t = 0)]
        teu: u32,
        /// RFC 3339 arrival time; anything else is stored as no ETA
        #[arg(long, default_value = "")]
        eta: String,
        /// Waiting, Berthing, Loading or Departed; anything else is stored as no status
        #[arg(long, default_value = "")]
        status: String,
    },
    /// Rebuild the knowledge base from current records
    RebuildKb,
    /// Nearest knowledge chunks for a free-text query
    Retrieve {
        query: String,
        /// Number of chunks to return
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Generate a new action plan for a stored surge
    Plan { surge_id: Uuid },
    /// Acknowledge an alert
    Ack { alert_id: Uuid },
    /// Move TEU between yard blocks
    Move {
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        teu: i64,
    },
    /// Yard utilisation samples recorded by moves
    History,
    /// Summarise the most recent events
    Summarize,
    /// Load a small demo port (yard blocks, berths, vessels, weather)
    Seed,
}

// ============================================================================
// Setup
// ============================================================================

fn load_config(args: &CliArgs) -> Result<SurgeOpsConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = SurgeOpsConfig::load_from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.llm.apply_env_overrides();
            config
        }
        None => SurgeOpsConfig::load().context("failed to load configuration")?,
    };
    if let Some(db) = &args.db {
        config.storage.path = db.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Demo Data
// ============================================================================

const DEMO_VESSELS: [&str; 8] = [
    "Maersk Elba",
    "CMA CGM Rhone",
    "MSC Aurora",
    "Ever Gentle",
    "Hapag Lima",
    "ONE Harmony",
    "Cosco Pearl",
    "Yang Ming Unity",
];

fn seed_demo_port(store: &dyn RecordStore) -> Result<usize> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let now = Utc::now();
    let mut written = 0;

    let categories = [
        YardBlockCategory::Standard,
        YardBlockCategory::Standard,
        YardBlockCategory::Reefer,
        YardBlockCategory::Hazard,
    ];
    for (i, code) in ["A1", "A2", "B1", "B2", "C1", "C2"].iter().enumerate() {
        let capacity = 1000;
        let mut block = YardBlock::new(*code, capacity, rng.gen_range(300..=990));
        block.category = categories[i % categories.len()];
        store.save_yard_block(&block)?;
        written += 1;
    }

    let berth_states = [BerthStatus::Occupied, BerthStatus::Available, BerthStatus::Maintenance];
    for (i, code) in ["Q1", "Q2", "Q3", "Q4"].iter().enumerate() {
        store.save_berth(&Berth::new(*code, berth_states[i % berth_states.len()]))?;
        written += 1;
    }

    let statuses = [
        VesselStatus::Waiting,
        VesselStatus::Berthing,
        VesselStatus::Loading,
        VesselStatus::Departed,
    ];
    for name in DEMO_VESSELS {
        let eta = now + Duration::minutes(rng.gen_range(-12 * 60..12 * 60));
        let mut vessel = Vessel::new(name, eta, rng.gen_range(500..=3000));
        vessel.imo = Some(format!("9{:06}", rng.gen_range(0..1_000_000)));
        vessel.status = Some(statuses[rng.gen_range(0..statuses.len())]);
        store.save_vessel(&vessel)?;
        written += 1;
    }

    store.save_weather(&WeatherObservation {
        id: Uuid::new_v4(),
        location: "Port Terminal".to_string(),
        temperature: 14.5,
        wind_speed: 9.2,
        humidity: 71.0,
        condition: "Overcast".to_string(),
        operational_impact: OperationalImpact::Low,
        observed_at: now,
    })?;
    written += 1;

    Ok(written)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);
    let config = load_config(&args)?;

    info!(
        store = %config.storage.path.display(),
        llm_configured = config.llm.is_configured(),
        "SurgeOps starting"
    );

    if let Some(parent) = config.storage.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = Arc::new(
        SledStore::open(&config.storage.path)
            .with_context(|| format!("failed to open store at {}", config.storage.path.display()))?,
    );
    let pipeline = SurgePipeline::from_config(store.clone(), &config)
        .context("failed to initialise backends")?;

    match args.command {
        SubCommand::Evaluate => match pipeline.evaluate_surge(Utc::now()).await? {
            Some(surge) => {
                let plan = pipeline.latest_plan_for_surge(surge.id)?;
                print_json(&serde_json::json!({ "surge": surge, "plan": plan }))?;
            }
            None => println!("No surge detected"),
        },
        SubCommand::Vessel { name, id, imo, teu, eta, status } => {
            let request = VesselUpsert {
                vessel_id: id,
                name,
                imo,
                expected_teu: teu,
                eta,
                status,
            };
            print_json(&pipeline.upsert_vessel(&request).await?)?;
        }
        SubCommand::RebuildKb => {
            let count = pipeline.rebuild_knowledge_base().await?;
            println!("Knowledge base holds {count} chunks");
        }
        SubCommand::Retrieve { query, k } => {
            print_json(&pipeline.retrieve_similar(&query, k).await)?;
        }
        SubCommand::Plan { surge_id } => {
            print_json(&pipeline.regenerate_plan(surge_id).await?)?;
        }
        SubCommand::Ack { alert_id } => {
            print_json(&pipeline.acknowledge_alert(alert_id)?)?;
        }
        SubCommand::Move { from, to, teu } => {
            print_json(&pipeline.move_containers(&from, &to, teu)?)?;
        }
        SubCommand::History => {
            print_json(&pipeline.utilization_history(Utc::now())?)?;
        }
        SubCommand::Summarize => {
            println!("{}", pipeline.summarize_recent_events().await?);
        }
        SubCommand::Seed => {
            let written = seed_demo_port(store.as_ref())?;
            println!("Seeded {written} records");
        }
    }

    store.flush()?;
    Ok(())
}
