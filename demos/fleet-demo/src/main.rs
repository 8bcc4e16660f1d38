//! fleet-demo: runs the fleet engine in real time on a road graph.
//!
//! Loads a graph file (or builds a synthetic grid), starts the tick driver,
//! and plays the part of the request-handling layer: every intake interval
//! it creates a requester and dispatches waiting requesters to the nearest
//! free vehicle.  Vehicle snapshots, tick summaries and the final heatmap
//! are written as CSV.
//!
//! ```text
//! RUST_LOG=info cargo run -p fleet-demo -- --graph graph.json --duration-secs 60
//! ```

mod network;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use fleet_core::EngineConfig;
use fleet_dispatch::DEFAULT_VEHICLE_NAMES;
use fleet_output::{CsvWriter, SnapshotObserver};
use fleet_sim::{Driver, EngineBuilder};
use fleet_spatial::{RoadGraph, load_graph_json};

use network::build_grid;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "fleet-demo", about = "Real-time fleet simulation on a road graph")]
struct Args {
    /// Road graph JSON file.  A synthetic grid is used when omitted.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Engine configuration JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of vehicles in the fleet.
    #[arg(long, default_value_t = 12)]
    vehicles: usize,

    /// Wall-clock run time.
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,

    /// Milliseconds between requester intakes.
    #[arg(long, default_value_t = 2_000)]
    intake_every_ms: u64,

    /// Side length of the synthetic grid.
    #[arg(long, default_value_t = 8)]
    grid_side: usize,

    /// Directory for CSV output.
    #[arg(long, default_value = "output/fleet-demo")]
    output: PathBuf,

    /// RNG seed, overriding the configuration file.
    #[arg(long)]
    seed: Option<u64>,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Configuration.
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    // 2. Road graph.
    let graph: RoadGraph = match &args.graph {
        Some(path) => load_graph_json(path).with_context(|| format!("loading graph {}", path.display()))?,
        None => build_grid(args.grid_side),
    };
    println!("Road graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());

    // 3. Engine and fleet.
    let engine = Arc::new(EngineBuilder::new(graph, config).build()?);
    let fleet_size = engine.initialize_fleet(&DEFAULT_VEHICLE_NAMES, args.vehicles)?;
    println!("Fleet: {fleet_size} vehicles  |  Run: {} s", args.duration_secs);
    println!();

    // 4. Driver with CSV output.
    let writer = CsvWriter::new(&args.output)?;
    let handle = Driver::spawn(Arc::clone(&engine), SnapshotObserver::new(writer));

    // 5. Intake and dispatch until time is up.
    let started = Instant::now();
    let run_for = Duration::from_secs(args.duration_secs);
    let intake_every = Duration::from_millis(args.intake_every_ms.max(1));
    let mut dispatched = 0usize;
    while started.elapsed() < run_for {
        thread::sleep(intake_every);
        engine.intake();
        while let Some(d) = engine.dispatch_next()? {
            info!("{} → {} ({} nodes)", d.vehicle_name, d.requester.name, d.route.len());
            dispatched += 1;
        }
    }

    // 6. Stop, write the heatmap, report.
    let mut observer = handle.stop()?;
    observer.write_heatmap(&engine.heatmap_snapshot());
    if let Some(e) = observer.take_error() {
        eprintln!("output error: {e}");
    }

    println!("Simulation ran {} ticks in {:.1} s", observer.ticks(), started.elapsed().as_secs_f64());
    println!("  dispatched : {dispatched}");
    println!("  waiting    : {}", engine.list_queue().len());
    println!("  heatmap    : {} cells", engine.heatmap_snapshot().len());
    println!("  output     : {}", args.output.display());
    println!();

    println!("{:<10} {:<12} {:>10} {:>10} {:>8}", "Vehicle", "Phase", "Fuel", "ETA (min)", "Route");
    println!("{}", "-".repeat(54));
    for v in engine.list_vehicles() {
        println!(
            "{:<10} {:<12} {:>10.2} {:>10.2} {:>4}/{:<3}",
            v.name,
            format!("{:?}", v.phase()),
            v.fuel,
            v.eta_minutes,
            v.route_index,
            v.route.len(),
        );
    }

    Ok(())
}
