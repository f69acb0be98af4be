//! Turnout Simulator CLI
//!
//! Run the voting model through deterministic scenarios.

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use turnout_core::{CapacityMap, Neighborhood, TieBreak};
use turnout_sim::scenarios::ScenarioId;
use turnout_sim::{ScenarioResult, ScenarioRunner};

/// Turnout Deterministic Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "turnout-sim")]
#[command(about = "Simulate voter access to polling machines", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Scenario to run (baseline, single_machine, contention, blind_walker, gridlock, determinism, all)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// Grid width
    #[arg(long, default_value = "50")]
    width: usize,

    /// Grid height
    #[arg(long, default_value = "50")]
    height: usize,

    /// Initial number of voters
    #[arg(long, default_value = "500")]
    voters: usize,

    /// Vision radius of every voter
    #[arg(long, default_value = "10")]
    vision: usize,

    /// Steps to run
    #[arg(long, default_value = "200")]
    steps: u64,

    /// Capacity map file (rows = x, columns = y); machines are scattered otherwise
    #[arg(short, long)]
    capacity_map: Option<String>,

    /// Use 8-connected (Moore) neighborhoods instead of von Neumann
    #[arg(long)]
    moore: bool,

    /// Tie-break policy for equally close cells (scan, shuffled)
    #[arg(long, default_value = "scan")]
    tie_break: TieBreak,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames and metrics of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Turnout Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!(
                "Available scenarios: {}, all",
                ScenarioId::all()
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            std::process::exit(1);
        })]
    };

    let capacity_map = args.capacity_map.as_ref().map(|path| {
        CapacityMap::load(path).unwrap_or_else(|e| {
            error!("{}", e);
            std::process::exit(1);
        })
    });

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let make_runner = |seed: u64| {
        let runner = ScenarioRunner::new(seed)
            .with_grid(args.width, args.height)
            .with_voters(args.voters)
            .with_vision(args.vision)
            .with_steps(args.steps)
            .with_tie_break(args.tie_break)
            .with_neighborhood(if args.moore {
                Neighborhood::Moore
            } else {
                Neighborhood::VonNeumann
            });
        match &capacity_map {
            Some(map) => runner.with_capacity_map(map.clone()),
            None => runner,
        }
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let (result, export) = make_runner(base_seed).run_with_export(scenarios[0]);

        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {:?}", e);
            std::process::exit(1);
        }
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        if result.passed {
            info!("✓ {} (seed={}) PASSED", scenarios[0].name(), base_seed);
        } else {
            error!(
                "✗ {} FAILED: {}",
                scenarios[0].name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = make_runner(seed);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED: {}/{} disenfranchised after {} steps",
                        scenario.name(),
                        seed,
                        result.final_voters,
                        result.initial_voters,
                        result.total_steps
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
