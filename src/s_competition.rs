use std::error::Error;

use rand::{rngs::StdRng, SeedableRng};

use crate::auction::AuctionEngine;
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::market::{MarketDynamics, MarketParams};
use crate::requests::{BidRequestGenerator, RequestParams};
use crate::simulation::{BatchOutcome, SimulationConfig, SimulationRunner};
use crate::scenarios::Verbosity;
use crate::strategies::{BidStrategy, FixedBidStrategy};

/// Run a variant with a given average competitor count
fn run_variant(
    avg_competition: f64,
    variant_description: &str,
    verbosity: Verbosity,
    logger: &mut Logger,
) -> Result<BatchOutcome, Box<dyn Error>> {
    if verbosity >= Verbosity::Summary {
        logln!(logger, LogEvent::Scenario, "\n=== {} ===", variant_description);
    }

    let config = SimulationConfig {
        num_auctions: 20_000,
        avg_competition,
        ..SimulationConfig::default()
    };
    config.validate()?;

    let generator = BidRequestGenerator::new(RequestParams::defaults());
    let requests = generator.generate(config.num_auctions, config.resolved_seed());

    let market = MarketDynamics::new(MarketParams::new(
        config.avg_competition,
        config.market_volatility,
    ));
    let runner = SimulationRunner::new(AuctionEngine::new(config.auction_type, market));
    let mut strategy = FixedBidStrategy::new(3.0);
    let mut rng = StdRng::seed_from_u64(config.resolved_seed());

    let outcome = runner.run_batch(&requests, strategy.as_mut(), &mut rng, logger)?;

    if verbosity >= Verbosity::Summary {
        logln!(logger, LogEvent::Scenario, "{}", outcome.stats.summary(strategy.name()));
    }

    Ok(outcome)
}

/// Scenario of how market thickness moves outcomes for the same bidder:
/// a crowded market should hand the fixed bidder fewer wins, and the wins
/// it does get clear at higher second prices.
pub fn run(verbosity: Verbosity, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    let thin = run_variant(2.0, "Thin market (avg 2 competitors)", verbosity, logger)?;
    let crowded = run_variant(8.0, "Crowded market (avg 8 competitors)", verbosity, logger)?;

    if verbosity >= Verbosity::Summary {
        logln!(logger, LogEvent::Scenario, "");
    }

    let mut errors = Vec::new();

    // Check: crowded market yields fewer wins
    if crowded.stats.wins >= thin.stats.wins {
        errors.push(format!(
            "Expected fewer wins in the crowded market, got {} >= {}",
            crowded.stats.wins, thin.stats.wins
        ));
    } else if verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Crowded market yields fewer wins: {} < {}",
            crowded.stats.wins,
            thin.stats.wins
        );
    }

    // Check: crowded market clears wins at a higher average price
    let thin_avg = thin.stats.total_spend / thin.stats.wins.max(1) as f64;
    let crowded_avg = crowded.stats.total_spend / crowded.stats.wins.max(1) as f64;
    if crowded_avg <= thin_avg {
        errors.push(format!(
            "Expected higher average clearing price in the crowded market, got {:.4} <= {:.4}",
            crowded_avg, thin_avg
        ));
    } else if verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Crowded market clears higher: avg {:.4} > {:.4}",
            crowded_avg,
            thin_avg
        );
    }

    // Check: competitor counts actually reflect the configured thickness
    let thin_competitors: u64 = thin.results.iter().map(|r| r.num_competitors as u64).sum();
    let crowded_competitors: u64 = crowded
        .results
        .iter()
        .map(|r| r.num_competitors as u64)
        .sum();
    if crowded_competitors <= thin_competitors {
        errors.push(format!(
            "Expected more qualifying competitors in the crowded market, got {} <= {}",
            crowded_competitors, thin_competitors
        ));
    } else if verbosity >= Verbosity::Summary {
        logln!(
            logger,
            LogEvent::Validation,
            "✓ Crowded market has more qualifying competitors: {} > {}",
            crowded_competitors,
            thin_competitors
        );
    }

    if errors.is_empty() {
        if verbosity >= Verbosity::Summary {
            logln!(logger, LogEvent::Validation, "\nAll validations passed!");
        }
        Ok(())
    } else {
        Err(format!("Scenario 'competition' validation failed:\n{}", errors.join("\n")).into())
    }
}

// Register this scenario in the catalog
inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "competition",
    description: "Show how market thickness moves outcomes: a crowded market hands the same fixed bidder fewer wins at higher clearing prices",
    run,
});
