use rand::{rngs::StdRng, SeedableRng};

use crate::auction::AuctionEngine;
use crate::error::{ConfigError, ValidationError};
use crate::logger::{LogEvent, Logger};
use crate::logln;
use crate::strategies::{BidStrategy, RunningStats};
use crate::types::{AuctionResult, AuctionType, BidRequest};
use crate::utils::DEFAULT_SEED;
use crate::warnln;

/// Recognized simulation options.
/// Validated up front; a malformed config aborts before any auction runs.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub auction_type: AuctionType,
    pub num_auctions: usize,
    pub avg_competition: f64,
    pub market_volatility: f64,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_auctions == 0 {
            return Err(ConfigError::ZeroAuctions);
        }
        if !(self.avg_competition > 0.0) {
            return Err(ConfigError::NonPositiveCompetition(self.avg_competition));
        }
        if !(self.market_volatility >= 0.0) {
            return Err(ConfigError::NegativeVolatility(self.market_volatility));
        }
        Ok(())
    }

    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            auction_type: AuctionType::SECOND_PRICE,
            num_auctions: 10_000,
            avg_competition: 5.0,
            market_volatility: 0.3,
            seed: None,
        }
    }
}

/// One strategy's run over a batch: the ordered result sequence plus the
/// aggregate counters accumulated alongside it
pub struct BatchOutcome {
    pub results: Vec<AuctionResult>,
    pub stats: RunningStats,
}

/// Drives a strategy through a batch of requests against the auction engine.
///
/// Runs strictly sequentially in request order: adaptive strategies read the
/// cumulative RunningStats, so each decision depends on every prior auction.
/// (Independent auctions could be partitioned across workers with per-worker
/// sub-seeds, but that only applies to non-adaptive strategies.)
pub struct SimulationRunner {
    engine: AuctionEngine,
}

impl SimulationRunner {
    pub fn new(engine: AuctionEngine) -> Self {
        Self { engine }
    }

    /// Run every request through the strategy and the engine.
    ///
    /// The output order matches the input order and the lengths are equal:
    /// nothing is dropped or duplicated. A strategy returning a negative or
    /// non-finite bid is coerced to a zero bid and logged as an anomaly; an
    /// invalid bid cannot win, but it never crashes the run.
    pub fn run_batch(
        &self,
        requests: &[BidRequest],
        strategy: &mut dyn BidStrategy,
        rng: &mut StdRng,
        logger: &mut Logger,
    ) -> Result<BatchOutcome, ValidationError> {
        let mut results = Vec::with_capacity(requests.len());
        let mut stats = RunningStats::new();

        for request in requests {
            let mut bid = strategy.decide_bid(request, &stats);
            if !bid.is_finite() || bid < 0.0 {
                warnln!(
                    logger,
                    "strategy '{}' returned invalid bid {} for request {}, coercing to 0.0",
                    strategy.name(),
                    bid,
                    request.request_id
                );
                bid = 0.0;
            }

            let result = self.engine.resolve(request, bid, rng)?;
            logln!(
                logger,
                LogEvent::Auction,
                "request {} [{} {} {}]: bid {:.2} vs {} competitors -> {} price {:.2}",
                request.request_id,
                request.device.device_type.as_str(),
                request.slot.ad_format.as_str(),
                request.slot.position.as_str(),
                bid,
                result.num_competitors,
                if result.won { "won" } else { "lost" },
                result.winning_price
            );
            strategy.update(request, &result);
            stats.record(&result);
            results.push(result);
        }

        Ok(BatchOutcome { results, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketDynamics, MarketParams};
    use crate::requests::{BidRequestGenerator, RequestParams};
    use crate::strategies::{DynamicBidStrategy, FixedBidStrategy};

    fn runner(auction_type: AuctionType) -> SimulationRunner {
        let market = MarketDynamics::new(MarketParams::default());
        SimulationRunner::new(AuctionEngine::new(auction_type, market))
    }

    fn requests(count: usize, seed: u64) -> Vec<BidRequest> {
        BidRequestGenerator::new(RequestParams::defaults()).generate(count, seed)
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimulationConfig::default();
        config.validate().unwrap();

        config.num_auctions = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAuctions));

        config = SimulationConfig::default();
        config.avg_competition = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveCompetition(0.0))
        );

        config = SimulationConfig::default();
        config.market_volatility = -0.1;
        assert_eq!(config.validate(), Err(ConfigError::NegativeVolatility(-0.1)));
    }

    #[test]
    fn test_batch_preserves_count_and_order() {
        let runner = runner(AuctionType::SECOND_PRICE);
        let requests = requests(250, 5);
        let mut strategy = FixedBidStrategy::new(2.5);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = runner
            .run_batch(&requests, strategy.as_mut(), &mut rng, &mut Logger::new())
            .unwrap();

        assert_eq!(outcome.results.len(), requests.len());
        for (request, result) in requests.iter().zip(outcome.results.iter()) {
            assert_eq!(request.request_id, result.request_id);
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_results() {
        let requests = requests(1000, 42);
        let mut all_runs = Vec::new();
        for _ in 0..2 {
            let runner = runner(AuctionType::SECOND_PRICE);
            let mut strategy = DynamicBidStrategy::new(1.5, 12.0, 15.0, 1.2);
            let mut rng = StdRng::seed_from_u64(42);
            let outcome = runner
                .run_batch(&requests, strategy.as_mut(), &mut rng, &mut Logger::new())
                .unwrap();
            all_runs.push(outcome.results);
        }
        let (a, b) = (&all_runs[0], &all_runs[1]);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.won, y.won);
            assert_eq!(x.bid, y.bid);
            assert_eq!(x.winning_price, y.winning_price);
            assert_eq!(x.converted, y.converted);
            assert_eq!(x.revenue, y.revenue);
            assert_eq!(x.num_competitors, y.num_competitors);
        }
    }

    struct MisbehavingStrategy;

    impl BidStrategy for MisbehavingStrategy {
        fn name(&self) -> &str {
            "misbehaving"
        }
        fn decide_bid(&self, _request: &BidRequest, _stats: &RunningStats) -> f64 {
            -5.0
        }
    }

    #[test]
    fn test_invalid_strategy_bid_is_coerced_to_zero() {
        let runner = runner(AuctionType::SECOND_PRICE);
        let requests = requests(100, 13);
        let mut strategy = MisbehavingStrategy;
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = runner
            .run_batch(&requests, &mut strategy, &mut rng, &mut Logger::new())
            .unwrap();

        assert_eq!(outcome.results.len(), 100);
        for result in &outcome.results {
            assert_eq!(result.bid, 0.0);
            // Floors are strictly positive, so a zero bid can never win
            assert!(!result.won);
            assert_eq!(result.winning_price, 0.0);
        }
        assert_eq!(outcome.stats.wins, 0);
    }

    #[test]
    fn test_stats_match_result_sequence() {
        let runner = runner(AuctionType::FIRST_PRICE);
        let requests = requests(500, 77);
        let mut strategy = FixedBidStrategy::new(3.0);
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = runner
            .run_batch(&requests, strategy.as_mut(), &mut rng, &mut Logger::new())
            .unwrap();

        let wins = outcome.results.iter().filter(|r| r.won).count();
        let conversions = outcome.results.iter().filter(|r| r.converted).count();
        let spend: f64 = outcome.results.iter().map(|r| r.winning_price).sum();
        let revenue: f64 = outcome.results.iter().map(|r| r.revenue).sum();

        assert_eq!(outcome.stats.auctions, 500);
        assert_eq!(outcome.stats.wins, wins);
        assert_eq!(outcome.stats.conversions, conversions);
        assert!((outcome.stats.total_spend - spend).abs() < 1e-9);
        assert!((outcome.stats.total_revenue - revenue).abs() < 1e-9);
    }
}
