use rand::{rngs::StdRng, Rng};

use crate::error::ValidationError;
use crate::market::MarketDynamics;
use crate::types::{AuctionResult, AuctionType, BidRequest};

/// Outcome of winner and price determination, before the conversion draw
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub won: bool,
    /// Price the bidder pays; 0.0 whenever the bidder lost
    pub winning_price: f64,
    /// Competitors that qualified (at or above the floor)
    pub num_competitors: u32,
}

/// Determine winner and clearing price for one auction over explicit bids.
///
/// Candidates are the bidder's bid plus the competitor bids, filtered to
/// those at or above the floor. Ties go to the bidder: a sampled tie is a
/// sampling artifact, not a meaningful ad-rank difference, so a competitor
/// must beat the bid strictly to take the impression.
///
/// Pricing:
/// - first price: the winner pays their own bid
/// - second price: the winner pays the best qualifying competitor bid,
///   floored at the floor price
/// - vcg: the winner pays the bid that would have won without them; for a
///   single slot that is exactly the second-price rule
pub fn settle(
    floor_price: f64,
    bidder_bid: f64,
    competitor_bids: &[f64],
    auction_type: AuctionType,
) -> Settlement {
    let mut best_other: Option<f64> = None;
    let mut num_competitors = 0u32;
    for &bid in competitor_bids {
        if bid >= floor_price {
            num_competitors += 1;
            best_other = Some(best_other.map_or(bid, |b: f64| b.max(bid)));
        }
    }

    let bidder_qualifies = bidder_bid >= floor_price;
    let won = bidder_qualifies && best_other.map_or(true, |b| b <= bidder_bid);

    if !won {
        return Settlement {
            won: false,
            winning_price: 0.0,
            num_competitors,
        };
    }

    let winning_price = match auction_type {
        AuctionType::FIRST_PRICE => bidder_bid,
        AuctionType::SECOND_PRICE => best_other.unwrap_or(floor_price).max(floor_price),
        // Single-slot externality: the best bid that would have won absent
        // the winner, floored. Degenerates to second price.
        AuctionType::VCG => best_other.unwrap_or(floor_price).max(floor_price),
    };

    Settlement {
        won: true,
        winning_price,
        num_competitors,
    }
}

/// Resolves single auctions: samples the competitive landscape, settles
/// winner and price under the configured mechanism, and simulates the
/// downstream conversion. Purely computational, no state across calls.
pub struct AuctionEngine {
    auction_type: AuctionType,
    market: MarketDynamics,
}

impl AuctionEngine {
    pub fn new(auction_type: AuctionType, market: MarketDynamics) -> Self {
        Self {
            auction_type,
            market,
        }
    }

    /// Bernoulli conversion draw for a won impression.
    /// Returns (converted, revenue); revenue is the request's estimated
    /// value on conversion and 0.0 otherwise.
    pub fn simulate_conversion(&self, request: &BidRequest, rng: &mut StdRng) -> (bool, f64) {
        let converted = rng.gen::<f64>() < request.conversion_probability;
        let revenue = if converted { request.estimated_value } else { 0.0 };
        (converted, revenue)
    }

    /// Resolve one auction for a validated request and bid.
    ///
    /// Fails fast on malformed inputs (negative or non-finite bid, broken
    /// request invariants). A thin market where nobody clears the floor is
    /// not an error; it settles as a no-winner result.
    pub fn resolve(
        &self,
        request: &BidRequest,
        bidder_bid: f64,
        rng: &mut StdRng,
    ) -> Result<AuctionResult, ValidationError> {
        request.validate()?;
        if !bidder_bid.is_finite() || bidder_bid < 0.0 {
            return Err(ValidationError::InvalidBid(bidder_bid));
        }

        let competition = self.market.sample_competition(request, rng);
        let competitor_bids = self.market.sample_competitor_bids(request, competition, rng);

        let settlement = settle(
            request.floor_price,
            bidder_bid,
            &competitor_bids,
            self.auction_type,
        );

        let (converted, revenue) = if settlement.won {
            self.simulate_conversion(request, rng)
        } else {
            (false, 0.0)
        };

        Ok(AuctionResult {
            request_id: request.request_id,
            bid: bidder_bid,
            winning_price: settlement.winning_price,
            won: settlement.won,
            num_competitors: settlement.num_competitors,
            converted,
            revenue,
            timestamp_ms: request.timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketParams;
    use crate::requests::{BidRequestGenerator, RequestParams};
    use rand::SeedableRng;

    fn engine(auction_type: AuctionType) -> AuctionEngine {
        AuctionEngine::new(auction_type, MarketDynamics::new(MarketParams::default()))
    }

    fn sample_request() -> BidRequest {
        BidRequestGenerator::new(RequestParams::defaults())
            .generate(1, 7)
            .remove(0)
    }

    #[test]
    fn test_second_price_pays_best_other() {
        let s = settle(1.00, 5.00, &[3.00, 1.50], AuctionType::SECOND_PRICE);
        assert!(s.won);
        assert_eq!(s.winning_price, 3.00);
        assert_eq!(s.num_competitors, 2);
    }

    #[test]
    fn test_below_floor_bid_loses_even_unopposed() {
        let s = settle(2.00, 1.00, &[], AuctionType::SECOND_PRICE);
        assert!(!s.won);
        assert_eq!(s.winning_price, 0.00);
        assert_eq!(s.num_competitors, 0);
    }

    #[test]
    fn test_first_price_pays_own_bid_exactly() {
        let s = settle(0.50, 4.20, &[2.00, 3.10], AuctionType::FIRST_PRICE);
        assert!(s.won);
        assert_eq!(s.winning_price, 4.20);
    }

    #[test]
    fn test_second_price_unopposed_pays_floor() {
        let s = settle(1.50, 6.00, &[], AuctionType::SECOND_PRICE);
        assert!(s.won);
        assert_eq!(s.winning_price, 1.50);
    }

    #[test]
    fn test_vcg_matches_second_price_for_single_slot() {
        let bids = [2.75, 4.90, 1.10];
        let vcg = settle(1.00, 5.00, &bids, AuctionType::VCG);
        let second = settle(1.00, 5.00, &bids, AuctionType::SECOND_PRICE);
        assert_eq!(vcg, second);
        assert_eq!(vcg.winning_price, 4.90);
    }

    #[test]
    fn test_tie_prefers_the_bidder() {
        let s = settle(1.00, 3.00, &[3.00], AuctionType::FIRST_PRICE);
        assert!(s.won);
        assert_eq!(s.winning_price, 3.00);
    }

    #[test]
    fn test_competitor_strictly_above_wins() {
        let s = settle(1.00, 3.00, &[3.01], AuctionType::SECOND_PRICE);
        assert!(!s.won);
        assert_eq!(s.winning_price, 0.0);
        assert_eq!(s.num_competitors, 1);
    }

    #[test]
    fn test_sub_floor_competitors_are_not_counted() {
        let s = settle(2.00, 5.00, &[0.50, 1.99, 3.00], AuctionType::SECOND_PRICE);
        assert!(s.won);
        assert_eq!(s.num_competitors, 1);
        assert_eq!(s.winning_price, 3.00);
    }

    #[test]
    fn test_negative_bid_is_rejected() {
        let request = sample_request();
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine(AuctionType::SECOND_PRICE)
            .resolve(&request, -0.5, &mut rng)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidBid(-0.5));
    }

    #[test]
    fn test_non_finite_bid_is_rejected() {
        let request = sample_request();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(engine(AuctionType::SECOND_PRICE)
            .resolve(&request, f64::NAN, &mut rng)
            .is_err());
    }

    #[test]
    fn test_malformed_request_is_rejected() {
        let mut request = sample_request();
        request.floor_price = 0.0;
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine(AuctionType::SECOND_PRICE)
            .resolve(&request, 1.0, &mut rng)
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidFloorPrice(0.0));
    }

    #[test]
    fn test_resolved_auction_invariants() {
        let e = engine(AuctionType::SECOND_PRICE);
        let requests = BidRequestGenerator::new(RequestParams::defaults()).generate(500, 21);
        let mut rng = StdRng::seed_from_u64(4);
        for request in &requests {
            let result = e.resolve(request, 2.5, &mut rng).unwrap();
            assert!(result.winning_price >= 0.0);
            if !result.won {
                assert_eq!(result.winning_price, 0.0);
                assert!(!result.converted);
            } else {
                assert!(result.winning_price <= result.bid);
                assert!(result.winning_price >= request.floor_price);
            }
            if result.revenue > 0.0 {
                assert!(result.won && result.converted);
            }
        }
    }

    #[test]
    fn test_first_price_win_pays_bid_through_engine() {
        let e = engine(AuctionType::FIRST_PRICE);
        let requests = BidRequestGenerator::new(RequestParams::defaults()).generate(300, 33);
        let mut rng = StdRng::seed_from_u64(8);
        let mut wins = 0;
        for request in &requests {
            let result = e.resolve(request, 4.20, &mut rng).unwrap();
            if result.won {
                wins += 1;
                assert_eq!(result.winning_price, 4.20);
            }
        }
        assert!(wins > 0, "expected at least one win across 300 auctions");
    }

    #[test]
    fn test_zero_conversion_probability_never_converts() {
        let e = engine(AuctionType::SECOND_PRICE);
        let mut rng = StdRng::seed_from_u64(15);
        let mut request = sample_request();
        request.conversion_probability = 0.0;
        let mut wins = 0;
        for i in 0..1000 {
            request.request_id = i;
            let result = e.resolve(&request, 50.0, &mut rng).unwrap();
            if result.won {
                wins += 1;
            }
            assert!(!result.converted);
            assert_eq!(result.revenue, 0.0);
        }
        assert!(wins > 0, "a high bid should win some of 1000 auctions");
    }
}
