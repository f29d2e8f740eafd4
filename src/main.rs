//! platelife - play Conway's Game of Life on a 96-well plate
//!
//! Usage:
//!   platelife run                          → glider on the simulated workcell
//!   platelife run --pattern blinker        → built-in seed
//!   platelife run --seed seed.cells        → seed from a plaintext file
//!   platelife patterns                     → list built-in seeds
//!   platelife dump-config                  → print the default run config

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use platelife::patterns::{self, PATTERNS};
use platelife::{simulate, SnapshotSink};
use platelife_core::RunConfig;
use platelife_engine::{NullSink, ReadingSink};
use platelife_hw::SimConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "platelife",
    about = "Conway's Game of Life on a 96-well plate",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the read/step/transfer loop on the simulated workcell
    Run(RunArgs),
    /// List built-in seed patterns
    Patterns,
    /// Print the default run config as TOML
    DumpConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Run config file (TOML). Missing file means defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in seed pattern
    #[arg(short, long, conflicts_with = "seed")]
    pattern: Option<String>,

    /// Plaintext seed file of '#' and '.' rows
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Override life.max_cycles
    #[arg(long)]
    max_cycles: Option<usize>,

    /// Override life.threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Override transfer.alive_volume (uL)
    #[arg(long)]
    volume: Option<f64>,

    /// Write a snapshot of every plate reading into this directory
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Write logs to a file (in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fraction of the requested volume the simulator draws from a well
    #[arg(long, default_value_t = 1.0)]
    aspirate_efficiency: f64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let _guard = init_tracing(args.log_file.as_deref())?;
            run(args).await?;
        }
        Commands::Patterns => {
            for pattern in PATTERNS {
                println!("{:<8} {}", pattern.name, pattern.description);
            }
        }
        Commands::DumpConfig => {
            print!("{}", RunConfig::default().to_toml());
        }
    }

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platelife=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(guard)
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(max_cycles) = args.max_cycles {
        config.life.max_cycles = max_cycles;
    }
    if let Some(threshold) = args.threshold {
        config.life.threshold = threshold;
    }
    if let Some(volume) = args.volume {
        config.transfer.alive_volume = volume;
    }

    let seed = match (&args.pattern, &args.seed) {
        (_, Some(path)) => patterns::load_seed(path)
            .with_context(|| format!("failed to read seed {}", path.display()))?,
        (Some(name), None) => {
            let pattern = patterns::find(name).with_context(|| {
                let known: Vec<_> = PATTERNS.iter().map(|p| p.name).collect();
                format!("unknown pattern '{}', expected one of: {}", name, known.join(", "))
            })?;
            pattern.state()?
        }
        (None, None) => patterns::find("glider")
            .context("built-in glider pattern missing")?
            .state()?,
    };

    let sink: Arc<dyn ReadingSink> = match &args.snapshots {
        Some(dir) => Arc::new(
            SnapshotSink::new(dir)
                .with_context(|| format!("failed to create snapshot dir {}", dir.display()))?,
        ),
        None => Arc::new(NullSink),
    };

    let sim = SimConfig {
        aspirate_efficiency: args.aspirate_efficiency,
        ..SimConfig::default()
    };

    let run = simulate(config, &seed, sim, sink).await?;
    let summary = &run.summary;

    println!(
        "{} after {} cycles ({} reads)",
        summary.final_state, summary.cycles, summary.reads
    );
    for (cycle, fault) in &summary.tolerated {
        println!("  cycle {}: {} tolerated: {}", cycle, fault.command, fault.error);
    }
    println!("{}", summary.last_state.to_pattern());
    Ok(())
}
