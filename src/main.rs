mod auction;
mod charts;
mod error;
mod export;
mod logger;
mod market;
mod requests;
mod s_competition;
mod s_mechanisms;
mod s_strategies;
mod scenarios;
mod simulation;
mod strategies;
mod types;
mod utils;

use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};

use auction::AuctionEngine;
use error::ConfigError;
use export::{build_rows, write_json};
use logger::{sanitize_filename, ConsoleReceiver, FileReceiver, LogEvent, Logger};
use market::{MarketDynamics, MarketParams};
use requests::{BidRequestGenerator, RequestParams};
use scenarios::{get_scenario_catalog, ScenarioEntry, Verbosity};
use simulation::{SimulationConfig, SimulationRunner};
use strategies::{BidStrategy, DynamicBidStrategy, FixedBidStrategy};
use types::AuctionType;

const ALL_EVENTS: [LogEvent; 5] = [
    LogEvent::Auction,
    LogEvent::Batch,
    LogEvent::Scenario,
    LogEvent::Validation,
    LogEvent::Anomaly,
];

fn print_usage(catalog: &[ScenarioEntry]) {
    println!("Usage: rtbsim [--verbose] <command>");
    println!();
    println!("Commands:");
    println!("  all                Run every registered scenario");
    println!("  charts             Generate diagnostic histograms");
    println!("  list               List registered scenarios");
    println!("  run [options]      Run the strategy comparison with a custom config");
    println!("  <scenario>         Run one scenario by short name");
    println!();
    println!("Run options:");
    println!("  --auctions N       Number of auctions (default 10000)");
    println!("  --auction-type T   first_price, second_price or vcg");
    println!("  --competition X    Average number of competitors (default 5)");
    println!("  --volatility X     Market price volatility (default 0.3)");
    println!("  --seed N           Random seed for reproducibility");
    println!("  --export PATH      Per-auction JSON export (default simulation_results.json)");
    println!();
    println!("Scenarios:");
    for entry in catalog {
        println!("  {:<12} {}", entry.short_name, entry.description);
    }
}

/// Run one scenario, mirroring its output into logs/<short_name>.log
fn run_scenario(entry: &ScenarioEntry, verbosity: Verbosity, logger: &mut Logger) -> bool {
    let log_path = PathBuf::from("logs").join(format!("{}.log", sanitize_filename(entry.short_name)));
    let file_receiver = match FileReceiver::new(&log_path, ALL_EVENTS.to_vec()) {
        Ok(receiver) => Some(logger.add_receiver(receiver)),
        Err(e) => {
            eprintln!("Could not open {}: {}", log_path.display(), e);
            None
        }
    };

    println!("\n##### Scenario '{}' #####", entry.short_name);
    let outcome = (entry.run)(verbosity, logger);
    let ok = match outcome {
        Ok(()) => {
            println!("Scenario '{}' completed successfully.", entry.short_name);
            true
        }
        Err(e) => {
            eprintln!("Scenario '{}' failed: {}", entry.short_name, e);
            false
        }
    };

    if let Some(id) = file_receiver {
        let _ = logger.flush();
        logger.remove_receiver(id);
    }
    ok
}

/// Parse `run` command options into a validated configuration
fn parse_run_config(args: &[String]) -> Result<(SimulationConfig, PathBuf), ConfigError> {
    let mut config = SimulationConfig::default();
    let mut export_path = PathBuf::from("simulation_results.json");

    let mut i = 0;
    while i < args.len() {
        let option = args[i].as_str();
        let value = args.get(i + 1).cloned().unwrap_or_default();
        match option {
            "--auctions" => {
                config.num_auctions = value.parse().map_err(|_| ConfigError::InvalidOption {
                    option: "--auctions",
                    value: value.clone(),
                })?;
            }
            "--auction-type" => {
                config.auction_type = AuctionType::from_name(&value)
                    .ok_or_else(|| ConfigError::UnknownAuctionType(value.clone()))?;
            }
            "--competition" => {
                config.avg_competition = value.parse().map_err(|_| ConfigError::InvalidOption {
                    option: "--competition",
                    value: value.clone(),
                })?;
            }
            "--volatility" => {
                config.market_volatility =
                    value.parse().map_err(|_| ConfigError::InvalidOption {
                        option: "--volatility",
                        value: value.clone(),
                    })?;
            }
            "--seed" => {
                config.seed = Some(value.parse().map_err(|_| ConfigError::InvalidOption {
                    option: "--seed",
                    value: value.clone(),
                })?);
            }
            "--export" => {
                export_path = PathBuf::from(&value);
            }
            _ => {
                return Err(ConfigError::InvalidOption {
                    option: "run",
                    value: option.to_string(),
                });
            }
        }
        i += 2;
    }

    config.validate()?;
    Ok((config, export_path))
}

/// Run the fixed and dynamic strategies under one configuration and export
/// the per-auction rows of every strategy to one JSON file
fn run_with_config(
    config: &SimulationConfig,
    export_path: &Path,
    logger: &mut Logger,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = BidRequestGenerator::new(RequestParams::defaults());
    let requests = generator.generate(config.num_auctions, config.resolved_seed());

    println!(
        "Running {} {} auctions (avg competition {}, volatility {}, seed {})",
        config.num_auctions,
        config.auction_type.as_str(),
        config.avg_competition,
        config.market_volatility,
        config.resolved_seed()
    );

    let mut strategies: Vec<Box<dyn BidStrategy>> = vec![
        FixedBidStrategy::new(2.5),
        DynamicBidStrategy::new(1.5, 12.0, 15.0, 1.2),
    ];

    let mut all_rows = Vec::new();
    for strategy in &mut strategies {
        let market = MarketDynamics::new(MarketParams::new(
            config.avg_competition,
            config.market_volatility,
        ));
        let runner = SimulationRunner::new(AuctionEngine::new(config.auction_type, market));
        // Fresh stream per strategy so every strategy faces the same market
        let mut rng = StdRng::seed_from_u64(config.resolved_seed());

        let outcome = runner.run_batch(&requests, strategy.as_mut(), &mut rng, logger)?;
        println!("{}", outcome.stats.summary(strategy.name()));

        let name = strategy.name().to_string();
        all_rows.push((name, outcome));
    }

    let rows: Vec<_> = all_rows
        .iter()
        .flat_map(|(name, outcome)| build_rows(name, &requests, &outcome.results))
        .collect();
    write_json(export_path, &rows)?;
    println!("Exported {} rows to {}", rows.len(), export_path.display());

    Ok(())
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Filter out the --verbose flag, everything else is a command
    let mut verbosity = Verbosity::Summary;
    let mut args = Vec::new();
    for arg in raw_args.iter().skip(1) {
        if arg == "--verbose" {
            verbosity = Verbosity::Full;
            continue;
        }
        args.push(arg.clone());
    }

    let catalog = get_scenario_catalog();

    let Some(command) = args.first() else {
        print_usage(&catalog);
        return;
    };

    if command == "list" {
        for entry in &catalog {
            println!("{:<12} {}", entry.short_name, entry.description);
        }
        return;
    }

    if command == "charts" {
        match charts::generate_all_histograms() {
            Ok(()) => {
                println!("All histogram generation completed successfully.");
            }
            Err(e) => {
                eprintln!("Error generating histograms: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if command == "run" {
        let (config, export_path) = match parse_run_config(&args[1..]) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
        };
        let mut logger = Logger::new();
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Anomaly]));
        if let Err(e) = run_with_config(&config, &export_path, &mut logger) {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let console_events = if verbosity == Verbosity::Full {
        ALL_EVENTS.to_vec()
    } else {
        vec![LogEvent::Scenario, LogEvent::Validation, LogEvent::Anomaly]
    };
    let mut logger = Logger::new();
    logger.add_receiver(ConsoleReceiver::new(console_events));

    if command == "all" {
        let mut failures = 0;
        for entry in &catalog {
            if !run_scenario(entry, verbosity, &mut logger) {
                failures += 1;
            }
        }
        if failures > 0 {
            eprintln!("\n{} scenario(s) failed.", failures);
            std::process::exit(1);
        }
        println!("\nAll scenarios passed.");
        return;
    }

    match catalog.iter().find(|entry| entry.short_name == command) {
        Some(entry) => {
            if !run_scenario(entry, verbosity, &mut logger) {
                std::process::exit(1);
            }
        }
        None => {
            eprintln!("Unknown command or scenario '{}'.", command);
            print_usage(&catalog);
            std::process::exit(1);
        }
    }
}
