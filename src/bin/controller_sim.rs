//! 控制器仿真
//!
//! 在仿真的交换网络上运行负载感知选路控制器，输出下发命令统计。

use clap::{Parser, ValueEnum};
use sdnflow_rs::config::{ConfigError, ControllerConfig};
use sdnflow_rs::fabric::{FabricWorld, load_scenario, preset_scenario};
use sdnflow_rs::sim::{ScenarioError, ScenarioSpec, SimTime, Simulator, TopologySpec};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Line,
    Ring,
    Diamond,
}

#[derive(Debug, Parser)]
#[command(
    name = "controller-sim",
    about = "负载感知最短路径控制器仿真：在场景拓扑上运行控制器并统计下发的命令"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long, conflicts_with = "topology")]
    scenario: Option<PathBuf>,

    /// Built-in topology used when no scenario is given
    #[arg(long, value_enum, default_value_t = Preset::Diamond)]
    topology: Preset,

    /// Switch count for line/ring presets
    #[arg(long, default_value_t = 4)]
    switches: u64,

    /// Controller config JSON; overrides the scenario's `controller` section
    #[arg(long)]
    config: Option<PathBuf>,

    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 30_000)]
    until_ms: u64,

    /// Write every issued switch command as JSON
    #[arg(long)]
    commands_json: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize commands: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("controller-sim: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let mut spec = match &args.scenario {
        Some(path) => ScenarioSpec::load(path)?,
        None => {
            let topology = match args.topology {
                Preset::Line => TopologySpec::Line {
                    switches: args.switches,
                },
                Preset::Ring => TopologySpec::Ring {
                    switches: args.switches,
                },
                Preset::Diamond => TopologySpec::Diamond,
            };
            preset_scenario(topology, args.until_ms)?
        }
    };
    if let Some(path) = &args.config {
        spec.controller = Some(ControllerConfig::load(path)?);
    }

    let mut sim = Simulator::default();
    let mut world: FabricWorld = load_scenario(&mut sim, &spec)?;
    sim.run_until(SimTime::from_millis(args.until_ms), &mut world);

    let s = world.summary();
    println!(
        "done @ {}, installs={} drops={} flushes={} floods={} stats_requests={}",
        sim.now(),
        s.installs,
        s.drops,
        s.flushes,
        s.floods,
        s.stats_requests
    );
    println!(
        "packets sent={} delivered={} dropped={} packet_ins={}",
        world.stats.sent_pkts,
        world.stats.delivered_pkts,
        world.stats.dropped_pkts,
        world.stats.packet_ins
    );

    if let Some(path) = &args.commands_json {
        let json = serde_json::to_string_pretty(world.issued())?;
        fs::write(path, json).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}
