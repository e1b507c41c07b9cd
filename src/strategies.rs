use crate::types::{AdPosition, AuctionResult, BidRequest, DeviceType};

/// Exponential smoothing factor for the adaptive win-rate/CPA trackers
const SMOOTHING_FACTOR: f64 = 0.1;

/// Aggregate counters for one strategy's run, owned by the runner and
/// passed into every bid decision.
///
/// Keeping the adaptive state in an explicit object (instead of hidden
/// strategy fields) makes the sequential dependency of adaptive bidding
/// visible: each decision reads the cumulative stats of all prior auctions.
#[derive(Debug, Clone)]
pub struct RunningStats {
    pub auctions: usize,
    pub wins: usize,
    pub conversions: usize,
    pub total_spend: f64,
    pub total_revenue: f64,
    /// Exponentially smoothed win rate, starts at a neutral 0.5
    pub smoothed_win_rate: f64,
    /// Exponentially smoothed cost per acquisition; 0.0 until the first
    /// converted win provides a signal
    pub smoothed_cpa: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            auctions: 0,
            wins: 0,
            conversions: 0,
            total_spend: 0.0,
            total_revenue: 0.0,
            smoothed_win_rate: 0.5,
            smoothed_cpa: 0.0,
        }
    }

    /// Fold one auction result into the counters and smoothed trackers
    pub fn record(&mut self, result: &AuctionResult) {
        self.auctions += 1;
        if result.won {
            self.wins += 1;
            self.total_spend += result.winning_price;
        }
        if result.converted {
            self.conversions += 1;
        }
        self.total_revenue += result.revenue;

        self.smoothed_win_rate = (1.0 - SMOOTHING_FACTOR) * self.smoothed_win_rate
            + SMOOTHING_FACTOR * if result.won { 1.0 } else { 0.0 };

        if result.won && result.converted {
            if self.smoothed_cpa == 0.0 {
                self.smoothed_cpa = result.winning_price;
            } else {
                self.smoothed_cpa = (1.0 - SMOOTHING_FACTOR) * self.smoothed_cpa
                    + SMOOTHING_FACTOR * result.winning_price;
            }
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.auctions == 0 {
            0.0
        } else {
            self.wins as f64 / self.auctions as f64
        }
    }

    /// Cost per acquisition: spend over conversions
    pub fn cpa(&self) -> f64 {
        if self.conversions == 0 {
            0.0
        } else {
            self.total_spend / self.conversions as f64
        }
    }

    /// Return on ad spend: revenue over spend
    pub fn roas(&self) -> f64 {
        if self.total_spend == 0.0 {
            0.0
        } else {
            self.total_revenue / self.total_spend
        }
    }

    /// One-line summary used by scenario printouts
    pub fn summary(&self, name: &str) -> String {
        format!(
            "{}: auctions={} wins={} ({:.1}%) conversions={} spend={:.2} revenue={:.2} CPA={:.2} ROAS={:.2}",
            name,
            self.auctions,
            self.wins,
            self.win_rate() * 100.0,
            self.conversions,
            self.total_spend,
            self.total_revenue,
            self.cpa(),
            self.roas()
        )
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability every bidding strategy exposes: decide a bid for a request
/// given the running stats, and observe each settled result.
///
/// Any type implementing this trait is a valid strategy; concrete strategies
/// are interchangeable variants selected by configuration.
pub trait BidStrategy {
    fn name(&self) -> &str;

    /// Return a non-negative bid for the request. The runner treats a
    /// negative or non-finite return as a bid of zero (logged, never fatal).
    fn decide_bid(&self, request: &BidRequest, stats: &RunningStats) -> f64;

    /// Observe a settled auction (hook for learning strategies)
    fn update(&mut self, _request: &BidRequest, _result: &AuctionResult) {}
}

/// Baseline strategy bidding a constant amount for every request
pub struct FixedBidStrategy {
    name: String,
    bid_amount: f64,
}

impl FixedBidStrategy {
    pub fn new(bid_amount: f64) -> Box<Self> {
        Box::new(Self {
            name: format!("fixed_{:.2}", bid_amount),
            bid_amount,
        })
    }
}

impl BidStrategy for FixedBidStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide_bid(&self, _request: &BidRequest, _stats: &RunningStats) -> f64 {
        self.bid_amount
    }
}

/// Value-based strategy: bid proportional to the expected value of the
/// impression (conversion probability × estimated value × quality score),
/// nudged by the running win rate and CPA, clamped to [base_bid, max_bid]
pub struct DynamicBidStrategy {
    name: String,
    pub base_bid: f64,
    pub max_bid: f64,
    pub target_cpa: f64,
    pub aggressiveness: f64,
}

/// Auctions observed before the adaptive nudges kick in
const ADAPTIVE_WARMUP: usize = 50;

impl DynamicBidStrategy {
    pub fn new(base_bid: f64, max_bid: f64, target_cpa: f64, aggressiveness: f64) -> Box<Self> {
        Box::new(Self {
            name: "dynamic".to_string(),
            base_bid,
            max_bid,
            target_cpa,
            aggressiveness,
        })
    }

    /// Quality score in [0.3, 2.0]; 1.0 is neutral inventory
    fn quality_score(&self, request: &BidRequest) -> f64 {
        let mut score = 1.0;
        score += (request.slot.viewability_score - 0.5) * 0.4;
        if request.slot.position == AdPosition::ABOVE_FOLD {
            score += 0.3;
        }
        score += (request.user.behavior_score - 0.5) * 0.6;

        score *= match request.device.device_type {
            DeviceType::DESKTOP => 1.1,
            DeviceType::MOBILE => 1.0,
            DeviceType::TABLET => 0.95,
            DeviceType::CTV => 1.2,
        };

        score.clamp(0.3, 2.0)
    }
}

impl BidStrategy for DynamicBidStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide_bid(&self, request: &BidRequest, stats: &RunningStats) -> f64 {
        let expected_value = request.conversion_probability
            * request.estimated_value
            * self.quality_score(request);

        let mut bid = expected_value * self.aggressiveness;

        if stats.auctions > ADAPTIVE_WARMUP {
            if stats.smoothed_win_rate < 0.3 {
                // Losing too often, push harder
                bid *= 1.2;
            } else if stats.smoothed_win_rate > 0.7
                && stats.smoothed_cpa > 0.0
                && stats.smoothed_cpa < self.target_cpa * 0.8
            {
                // Winning cheaply, room to bid up
                bid *= 1.3;
            } else if stats.smoothed_cpa > self.target_cpa * 1.2 {
                // Acquisitions too expensive, back off
                bid *= 0.8;
            }
        }

        let bid = bid.clamp(self.base_bid, self.max_bid);
        (bid * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{BidRequestGenerator, RequestParams};
    use crate::types::AuctionResult;

    fn sample_request() -> BidRequest {
        BidRequestGenerator::new(RequestParams::defaults())
            .generate(1, 19)
            .remove(0)
    }

    fn won_result(price: f64, converted: bool, revenue: f64) -> AuctionResult {
        AuctionResult {
            request_id: 0,
            bid: price,
            winning_price: price,
            won: true,
            num_competitors: 3,
            converted,
            revenue,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_fixed_strategy_is_constant() {
        let strategy = FixedBidStrategy::new(2.5);
        let stats = RunningStats::new();
        let request = sample_request();
        assert_eq!(strategy.decide_bid(&request, &stats), 2.5);
        assert_eq!(strategy.name(), "fixed_2.50");
    }

    #[test]
    fn test_dynamic_bid_stays_within_bounds() {
        let strategy = DynamicBidStrategy::new(1.5, 12.0, 15.0, 1.2);
        let stats = RunningStats::new();
        let requests = BidRequestGenerator::new(RequestParams::defaults()).generate(300, 2);
        for request in &requests {
            let bid = strategy.decide_bid(request, &stats);
            assert!(bid >= 1.5 && bid <= 12.0, "bid {} out of bounds", bid);
        }
    }

    #[test]
    fn test_low_win_rate_raises_dynamic_bid() {
        let strategy = DynamicBidStrategy::new(0.0, 100.0, 15.0, 1.0);
        let request = sample_request();

        let mut cold = RunningStats::new();
        cold.auctions = ADAPTIVE_WARMUP + 1;
        cold.smoothed_win_rate = 0.1;

        let mut neutral = RunningStats::new();
        neutral.auctions = ADAPTIVE_WARMUP + 1;
        neutral.smoothed_win_rate = 0.5;

        assert!(strategy.decide_bid(&request, &cold) >= strategy.decide_bid(&request, &neutral));
    }

    #[test]
    fn test_running_stats_record() {
        let mut stats = RunningStats::new();
        stats.record(&won_result(2.0, true, 10.0));
        stats.record(&won_result(4.0, false, 0.0));
        let lost = AuctionResult {
            request_id: 2,
            bid: 1.0,
            winning_price: 0.0,
            won: false,
            num_competitors: 5,
            converted: false,
            revenue: 0.0,
            timestamp_ms: 0,
        };
        stats.record(&lost);

        assert_eq!(stats.auctions, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.total_spend, 6.0);
        assert_eq!(stats.total_revenue, 10.0);
        assert!((stats.win_rate() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.cpa(), 6.0);
        assert!((stats.roas() - 10.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoothed_cpa_initializes_from_first_conversion() {
        let mut stats = RunningStats::new();
        stats.record(&won_result(3.0, true, 12.0));
        assert_eq!(stats.smoothed_cpa, 3.0);
        stats.record(&won_result(5.0, true, 12.0));
        assert!((stats.smoothed_cpa - (0.9 * 3.0 + 0.1 * 5.0)).abs() < 1e-12);
    }
}
