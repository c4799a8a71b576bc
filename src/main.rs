//! Restoration simulator entry point — CLI wiring and config-driven runs.

use std::path::Path;
use std::process;

use grid_restore_sim::config::ScenarioConfig;
use grid_restore_sim::error::DataError;
use grid_restore_sim::io::export::export_csv;
use grid_restore_sim::network::NetworkModel;
use grid_restore_sim::sim::component::ComponentRegistry;
use grid_restore_sim::sim::contingency::{
    ContingencyGenerator, EnvironmentSeries, apply_contingency,
};
use grid_restore_sim::sim::crew::{CrewPool, RepairTask};
use grid_restore_sim::sim::engine::{RestorationEngine, RestorationResult};
use grid_restore_sim::sim::recovery::RecoveryTimes;
use grid_restore_sim::sim::solver::CapacityBalanceSolver;

/// Seed offset for the recovery-time RNG to avoid correlation with the
/// contingency draw.
const RECOVERY_SEED_OFFSET: u64 = 31;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    indicators_out: Option<String>,
}

fn print_help() {
    eprintln!("grid-restore-sim — post-disturbance network restoration simulator");
    eprintln!();
    eprintln!("Usage: grid-restore-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, hurricane)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --indicators-out <path>  Export indicator rows to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        indicators_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--indicators-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --indicators-out requires a path argument");
                    process::exit(1);
                }
                cli.indicators_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Draws a contingency over the study grid and runs restoration to the end.
fn run_scenario(cfg: &ScenarioConfig) -> Result<RestorationResult, DataError> {
    let seed = cfg.simulation.seed;
    let mut model = NetworkModel::study_case();
    let mut registry =
        ComponentRegistry::new(model.branch_count(), model.bus_count(), model.gen_count());

    let store = cfg.contingency.fragility_store()?;
    let series = EnvironmentSeries::broadcast(cfg.contingency.storm_profile())?;
    let mut generator = ContingencyGenerator::new(store, series, seed);
    let set = generator.generate(&model)?;
    let summary = apply_contingency(&mut model, &mut registry, &set);

    let mut recovery = RecoveryTimes::sampled(
        cfg.recovery.dataset_hr.clone(),
        seed.wrapping_add(RECOVERY_SEED_OFFSET),
    )?;
    let mut tasks = Vec::with_capacity(summary.damaged.len());
    for &comp in &summary.damaged {
        tasks.push(RepairTask {
            comp,
            duration_hr: recovery.duration_for(comp)?,
        });
    }

    let pool = CrewPool::new(cfg.crews.branch, cfg.crews.bus, cfg.crews.generator);
    let engine = RestorationEngine::new(
        model,
        registry,
        pool,
        tasks,
        CapacityBalanceSolver,
        cfg.engine_options(),
    );
    Ok(engine.run())
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline.
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Run
    let result = match run_scenario(&scenario) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Print per-iteration indicators
    for row in &result.indicators {
        println!("{row}");
    }

    // Print end-of-run report
    println!("\n{}", result.report());

    // Export CSV if requested
    if let Some(ref path) = cli.indicators_out {
        if let Err(e) = export_csv(&result.indicators, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Indicators written to {path}");
    }
}
