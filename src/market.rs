use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal, Poisson};

use crate::types::{AdPosition, BidRequest};

/// Market-level parameters, immutable for the lifetime of a simulation run
/// so repeated runs with the same seed reproduce the same landscape
#[derive(Debug, Clone)]
pub struct MarketParams {
    /// Baseline mean of the Poisson competitor count
    pub avg_competition: f64,
    /// Spread (σ) of the log-normal competitor bid distribution
    pub volatility: f64,
}

impl MarketParams {
    pub fn new(avg_competition: f64, volatility: f64) -> Self {
        Self {
            avg_competition,
            volatility,
        }
    }
}

impl Default for MarketParams {
    fn default() -> Self {
        Self::new(5.0, 0.3)
    }
}

/// Models competitor count and the competitor bid landscape, conditioned on
/// request attributes: premium inventory draws more and higher bids
pub struct MarketDynamics {
    params: MarketParams,
}

impl MarketDynamics {
    pub fn new(params: MarketParams) -> Self {
        Self { params }
    }

    /// Sample the number of competing bidders for a request.
    ///
    /// A level pre-sampled onto the request wins over derivation. Otherwise
    /// the Poisson mean is the configured baseline scaled up by quality
    /// signals: above-fold placement, high viewability, engaged users and
    /// high estimated value all attract more demand. Zero is a legitimate
    /// outcome (a thin market, not an error).
    pub fn sample_competition(&self, request: &BidRequest, rng: &mut StdRng) -> u32 {
        if let Some(level) = request.competition_level {
            return level;
        }

        let mut mean = self.params.avg_competition;
        if request.slot.position == AdPosition::ABOVE_FOLD {
            mean *= 1.3;
        }
        if request.slot.viewability_score > 0.8 {
            mean *= 1.2;
        }
        if request.user.behavior_score > 0.7 {
            mean *= 1.4;
        }
        // Premium inventory value pulls in up to 50% more bidders
        mean *= 1.0 + (request.estimated_value / 40.0).min(0.5);

        let poisson = Poisson::new(mean).unwrap();
        Distribution::<f64>::sample(&poisson, rng) as u32
    }

    /// Sample competitor bid values for a request.
    ///
    /// Bids come from a log-normal located at the floor price plus a
    /// quality/value premium, with spread set by market volatility. This
    /// gives the right-skewed landscape observed in RTB: many low bids,
    /// few high outliers.
    ///
    /// Normalization rule: samples below the floor are discarded and do not
    /// count as competitors (a sub-floor bid cannot win), so the returned
    /// length may be less than `count`.
    pub fn sample_competitor_bids(
        &self,
        request: &BidRequest,
        count: u32,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }

        let above_fold = if request.slot.position == AdPosition::ABOVE_FOLD {
            1.0
        } else {
            0.7
        };
        let quality = request.slot.viewability_score * 0.5
            + request.user.behavior_score * 0.3
            + above_fold * 0.2;

        // Location scales with the floor and the request's estimated value
        let base_price =
            request.floor_price + quality * (1.0 + 0.08 * request.estimated_value);
        let dist = LogNormal::new(base_price.ln(), self.params.volatility).unwrap();

        let mut bids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let bid = Distribution::sample(&dist, rng);
            if bid >= request.floor_price {
                bids.push(bid);
            }
        }
        bids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{BidRequestGenerator, RequestParams};
    use rand::SeedableRng;

    fn sample_requests(count: usize) -> Vec<BidRequest> {
        BidRequestGenerator::new(RequestParams::defaults()).generate(count, 77)
    }

    #[test]
    fn test_competitor_bids_respect_floor() {
        let market = MarketDynamics::new(MarketParams::default());
        let mut rng = StdRng::seed_from_u64(5);
        for request in sample_requests(200) {
            let n = market.sample_competition(&request, &mut rng);
            let bids = market.sample_competitor_bids(&request, n, &mut rng);
            assert!(bids.len() <= n as usize);
            assert!(bids.iter().all(|&b| b >= request.floor_price));
        }
    }

    #[test]
    fn test_zero_competition_gives_no_bids() {
        let market = MarketDynamics::new(MarketParams::default());
        let mut rng = StdRng::seed_from_u64(5);
        let request = &sample_requests(1)[0];
        assert!(market.sample_competitor_bids(request, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_pre_sampled_level_is_honored() {
        let market = MarketDynamics::new(MarketParams::default());
        let mut rng = StdRng::seed_from_u64(5);
        let mut request = sample_requests(1).remove(0);
        request.competition_level = Some(7);
        assert_eq!(market.sample_competition(&request, &mut rng), 7);
    }

    #[test]
    fn test_premium_inventory_draws_more_competition() {
        let market = MarketDynamics::new(MarketParams::default());
        let mut request = sample_requests(1).remove(0);
        request.competition_level = None;

        let mut premium = request.clone();
        premium.slot.position = AdPosition::ABOVE_FOLD;
        premium.slot.viewability_score = 0.95;
        premium.user.behavior_score = 0.9;
        premium.estimated_value = 40.0;

        let mut budget = request.clone();
        budget.slot.position = AdPosition::BELOW_FOLD;
        budget.slot.viewability_score = 0.4;
        budget.user.behavior_score = 0.2;
        budget.estimated_value = 2.0;

        let mut rng = StdRng::seed_from_u64(123);
        let n = 3000;
        let premium_total: u32 = (0..n)
            .map(|_| market.sample_competition(&premium, &mut rng))
            .sum();
        let budget_total: u32 = (0..n)
            .map(|_| market.sample_competition(&budget, &mut rng))
            .sum();
        assert!(
            premium_total > budget_total,
            "premium {} should out-draw budget {}",
            premium_total,
            budget_total
        );
    }

    #[test]
    fn test_sampling_is_deterministic_per_seed() {
        let market = MarketDynamics::new(MarketParams::default());
        let request = &sample_requests(1)[0];
        let mut rng_a = StdRng::seed_from_u64(31);
        let mut rng_b = StdRng::seed_from_u64(31);
        let a = market.sample_competitor_bids(request, 10, &mut rng_a);
        let b = market.sample_competitor_bids(request, 10, &mut rng_b);
        assert_eq!(a, b);
    }
}
