use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use mission_core::{MissionRegistry, TargetId};
use mission_world::load_content;
use tokio::sync::watch;

mod monitor;

use monitor::{fly_all, FlightOptions};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "mission_daemon", about = "Containment mission simulator")]
struct Cli {
    #[arg(long, default_value = "./content")]
    content_dir: PathBuf,
    /// Registry seed. Random when omitted; the chosen seed is logged.
    #[arg(long)]
    seed: Option<u64>,
    /// Override the tick quantum from constants.json. 0 runs as fast as possible.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Target ids to fly against. Defaults to every target in targets.json.
    #[arg(long = "target", value_delimiter = ',')]
    targets: Vec<u64>,
    /// Abort every mission still flying after this many milliseconds.
    #[arg(long)]
    abort_after_ms: Option<u64>,
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,
    /// Print reports as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut content = load_content(&cli.content_dir)?;
    if let Some(ms) = cli.tick_ms {
        content.constants.tick_interval_ms = ms;
    }

    let mut targets = Vec::new();
    if cli.targets.is_empty() {
        for id in content.targets.ids() {
            if let Some(record) = content.targets.get(id) {
                targets.push((id, record.name.clone()));
            }
        }
    } else {
        for raw in &cli.targets {
            let id = TargetId(*raw);
            let Some(record) = content.targets.get(id) else {
                bail!("target {id} is not in targets.json");
            };
            targets.push((id, record.name.clone()));
        }
    }

    let seed = cli.seed.unwrap_or_else(rand::random);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received, halting simulation");
            let _ = shutdown_tx.send(true);
        }
    });

    let registry = MissionRegistry::new(
        Arc::new(content.targets),
        Arc::new(content.catalog),
        content.constants,
        seed,
        shutdown_rx.clone(),
    );
    let options = FlightOptions {
        poll: Duration::from_millis(cli.poll_ms.max(1)),
        abort_after: cli.abort_after_ms.map(Duration::from_millis),
        log_page_size: u32::try_from(registry.constants().timeline_capacity).unwrap_or(u32::MAX),
    };

    tracing::info!(
        "flying {} missions with seed {}",
        targets.len(),
        registry.base_seed()
    );
    let reports = fly_all(&registry, &targets, &options, shutdown_rx).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report.render());
        }
    }
    Ok(())
}
