//! PWR plant simulator entry point — CLI wiring and episode execution.

use std::path::Path;
use std::process;

use pwr_sim::config::PlantConfig;
use pwr_sim::controllers;
use pwr_sim::io::export::export_csv;
use pwr_sim::metrics::MetricsEngine;
use pwr_sim::reporting::{RunSummary, metrics_table};
use pwr_sim::runner;
use pwr_sim::scenario;
use pwr_sim::sim::environment::PlantEnvironment;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    scenario_name: String,
    controller: String,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    list_scenarios: bool,
}

fn print_help() {
    eprintln!("pwr-sim — Pressurized-water reactor plant simulator");
    eprintln!();
    eprintln!("Usage: pwr-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load plant config from TOML file");
    eprintln!("  --scenario <name>        Scenario to run (default: baseline_steady_state)");
    eprintln!("  --controller <selector>  pid, fuzzy, or a .toml policy path (default: pid)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export step records to CSV");
    eprintln!("  --list-scenarios         Print the scenario catalog and exit");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config is given, the built-in 3000 MWth reference plant is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        scenario_name: "baseline_steady_state".to_string(),
        controller: "pid".to_string(),
        seed_override: None,
        telemetry_out: None,
        list_scenarios: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a name argument");
                    process::exit(1);
                }
                cli.scenario_name = args[i].clone();
            }
            "--controller" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --controller requires a selector argument");
                    process::exit(1);
                }
                cli.controller = args[i].clone();
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
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            "--list-scenarios" => {
                cli.list_scenarios = true;
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

fn main() {
    let cli = parse_args();

    // Load config: --config takes priority, else the reference plant
    let mut config = if let Some(ref path) = cli.config_path {
        match PlantConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        PlantConfig::pwr_3000()
    };

    if let Some(seed) = cli.seed_override {
        config.simulation.seed = seed;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if cli.list_scenarios {
        for spec in scenario::catalog(&config) {
            println!("{:<36} {}", spec.name, spec.description);
        }
        return;
    }

    let spec = match scenario::by_name(&config, &cli.scenario_name) {
        Some(spec) => spec,
        None => {
            eprintln!("error: unknown scenario \"{}\"", cli.scenario_name);
            eprintln!("hint: use --list-scenarios to see the catalog");
            process::exit(1);
        }
    };

    let mut controller = match controllers::build(&cli.controller, &config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let mut env = match PlantEnvironment::new(config.clone(), spec) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let engine = MetricsEngine::new(&config);
    let evaluation = runner::evaluate(&mut env, controller.as_mut(), &engine);

    let summary = RunSummary::from_evaluation(&cli.scenario_name, &cli.controller, &evaluation);
    println!("{summary}");
    println!();
    print!("{}", metrics_table(&evaluation.metrics));

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&evaluation.episode.records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
