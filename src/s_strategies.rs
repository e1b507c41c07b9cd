use std::error::Error;
use std::path::PathBuf;

use rand::{rngs::StdRng, SeedableRng};

use crate::auction::AuctionEngine;
use crate::export::{build_rows, write_json};
use crate::logger::{sanitize_filename, LogEvent, Logger};
use crate::logln;
use crate::market::{MarketDynamics, MarketParams};
use crate::requests::{BidRequestGenerator, RequestParams};
use crate::simulation::{BatchOutcome, SimulationConfig, SimulationRunner};
use crate::scenarios::Verbosity;
use crate::strategies::{BidStrategy, DynamicBidStrategy, FixedBidStrategy};
use crate::types::BidRequest;

/// Run one strategy over the shared request stream and export its rows
fn run_strategy(
    requests: &[BidRequest],
    strategy: &mut dyn BidStrategy,
    config: &SimulationConfig,
    verbosity: Verbosity,
    logger: &mut Logger,
) -> Result<BatchOutcome, Box<dyn Error>> {
    let market = MarketDynamics::new(MarketParams::new(
        config.avg_competition,
        config.market_volatility,
    ));
    let runner = SimulationRunner::new(AuctionEngine::new(config.auction_type, market));
    // Fresh stream per strategy so every strategy faces the same market
    let mut rng = StdRng::seed_from_u64(config.resolved_seed());

    let outcome = runner.run_batch(requests, strategy, &mut rng, logger)?;

    if verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Scenario,
            "{}",
            outcome.stats.summary(strategy.name())
        );
    }

    let rows = build_rows(strategy.name(), requests, &outcome.results);
    let path = PathBuf::from("results")
        .join(format!("{}.json", sanitize_filename(strategy.name())));
    write_json(&path, &rows)?;
    if verbosity == Verbosity::Full {
        logln!(logger, LogEvent::Batch, "exported {} rows to {}", rows.len(), path.display());
    }

    Ok(outcome)
}

/// Scenario comparing a fixed-bid baseline with the value-based dynamic
/// strategy on the same seeded request stream, exporting per-auction rows
/// for both
pub fn run(verbosity: Verbosity, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    if verbosity >= Verbosity::Summary {
        logln!(logger, LogEvent::Scenario, "\n=== Strategy comparison ===");
    }

    let config = SimulationConfig {
        num_auctions: 10_000,
        ..SimulationConfig::default()
    };
    config.validate()?;

    let generator = BidRequestGenerator::new(RequestParams::defaults());
    let requests = generator.generate(config.num_auctions, config.resolved_seed());

    let mut fixed = FixedBidStrategy::new(2.5);
    let mut dynamic = DynamicBidStrategy::new(1.5, 12.0, 15.0, 1.2);

    let fixed_outcome = run_strategy(&requests, fixed.as_mut(), &config, verbosity, logger)?;
    let dynamic_outcome = run_strategy(&requests, dynamic.as_mut(), &config, verbosity, logger)?;

    let mut errors = Vec::new();

    // Check: no drops, no duplicates, order preserved for both strategies
    for (name, outcome) in [("fixed", &fixed_outcome), ("dynamic", &dynamic_outcome)] {
        if outcome.results.len() != requests.len() {
            errors.push(format!(
                "Expected {} results for '{}', got {}",
                requests.len(),
                name,
                outcome.results.len()
            ));
        }
    }
    if errors.is_empty() && verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Both strategies produced {} ordered results",
            requests.len()
        );
    }

    // Check: revenue only ever comes from converted wins
    for (name, outcome) in [("fixed", &fixed_outcome), ("dynamic", &dynamic_outcome)] {
        let violating = outcome
            .results
            .iter()
            .filter(|r| r.revenue > 0.0 && !(r.won && r.converted))
            .count();
        if violating > 0 {
            errors.push(format!(
                "Strategy '{}' has {} results with revenue but no converted win",
                name, violating
            ));
        }
    }
    if errors.is_empty() && verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Revenue occurs only on converted wins"
        );
    }

    // Check: both strategies participate in the market meaningfully
    for (name, outcome) in [("fixed", &fixed_outcome), ("dynamic", &dynamic_outcome)] {
        if outcome.stats.wins == 0 {
            errors.push(format!("Strategy '{}' never won an auction", name));
        }
    }
    if errors.is_empty() && verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Both strategies won auctions (fixed {}, dynamic {})",
            fixed_outcome.stats.wins,
            dynamic_outcome.stats.wins
        );
    }

    if errors.is_empty() {
        if verbosity >= Verbosity::Summary {
            logln!(logger, LogEvent::Validation, "\nAll validations passed!");
        }
        Ok(())
    } else {
        Err(format!("Scenario 'strategies' validation failed:\n{}", errors.join("\n")).into())
    }
}

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "strategies",
    description: "Compare a fixed-bid baseline against the value-based dynamic strategy on the same seeded request stream and export per-auction rows",
    run,
});
