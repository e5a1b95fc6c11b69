//! Creature Agent - Entry Point
//!
//! Runs the control loop against the in-memory world. Lines typed on stdin
//! are forwarded as commands (e.g. `agent.gotoJewel`).

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use creature_agent::command::{command_channel, CommandSender};
use creature_agent::core::config::{load_config, AgentConfig};
use creature_agent::core::error::Result;
use creature_agent::entity::leaflet::all_satisfied;
use creature_agent::simulation::{AgentEvent, TickDriver};
use creature_agent::world::SimWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Reactive foraging creature in a simulated world
#[derive(Parser, Debug)]
#[command(name = "creature-agent")]
#[command(about = "Run the creature control loop against a simulated world")]
struct Args {
    /// Agent config file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks; runs until Ctrl-C when omitted
    #[arg(long)]
    ticks: Option<u64>,

    /// World seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Output format for tick events
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so JSON events on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("creature_agent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }

    info!(seed = config.sim.seed, ticks = ?args.ticks, "creature agent starting");

    let world = Arc::new(SimWorld::new(config.sim.clone()));
    for req in world.leaflets() {
        info!(color = %req.color, required = req.required, "leaflet");
    }

    let (commands, queue) = command_channel();
    let mut driver = TickDriver::new(config, world.clone(), world.clone(), queue)?;
    forward_stdin(commands);

    let format = args.format;
    tokio::select! {
        _ = driver.run(args.ticks, |event| report(event, format)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    let leaflets = world.leaflets();
    for req in &leaflets {
        info!(
            color = %req.color,
            collected = req.collected,
            remaining = req.remaining(),
            "leaflet progress"
        );
    }
    info!(
        fuel = world.fuel(),
        ticks = driver.ticks(),
        leaflets_complete = all_satisfied(&leaflets),
        "creature agent stopped"
    );
    Ok(())
}

/// Read stdin on its own thread; a blocked read must not hold up shutdown
fn forward_stdin(commands: CommandSender) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "stopped reading commands");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !commands.send(line) {
                break;
            }
        }
    });
}

fn report(event: &AgentEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(err) => warn!(error = %err, "could not encode event"),
        },
        OutputFormat::Text => {
            if let Some(line) = describe(event) {
                println!("{}", line);
            }
        }
    }
}

fn describe(event: &AgentEvent) -> Option<String> {
    match event {
        AgentEvent::TickSkipped { tick, reason } => Some(format!("[{}] skipped: {}", tick, reason)),
        AgentEvent::CommandApplied { tick, action } => {
            Some(format!("[{}] command -> {}", tick, action))
        }
        AgentEvent::CommandRejected { tick, command } => {
            Some(format!("[{}] unknown command '{}'", tick, command))
        }
        AgentEvent::ActionPerformed {
            tick,
            action,
            target,
            ..
        } => Some(match target {
            Some(t) => format!("[{}] {} ({:.1}, {:.1})", tick, action, t.x, t.y),
            None => format!("[{}] {}", tick, action),
        }),
        AgentEvent::EffectorFailed { tick, call, error } => {
            Some(format!("[{}] {} failed: {}", tick, call, error))
        }
        AgentEvent::DetectorActivations { tick, activations } => {
            let fired: Vec<&str> = activations
                .iter()
                .filter(|(_, activation)| *activation > 0.0)
                .map(|(name, _)| name.as_str())
                .collect();
            if fired.is_empty() {
                None
            } else {
                Some(format!("[{}] detectors: {}", tick, fired.join(", ")))
            }
        }
        AgentEvent::DetectorFailed {
            tick,
            detector,
            error,
        } => Some(format!("[{}] detector {} failed: {}", tick, detector, error)),
        AgentEvent::PerceptionUpdate { .. } => None,
    }
}
