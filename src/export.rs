use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::error::ExportError;
use crate::types::{AuctionResult, BidRequest};

/// Canonical per-auction export row. Field order is the external tabular
/// contract; downstream consumers depend on it, so do not reorder.
#[derive(Debug, Serialize)]
pub struct AuctionRow<'a> {
    pub request_id: u64,
    pub timestamp: u64,
    pub strategy: &'a str,
    pub bid: f64,
    pub won: bool,
    pub price: f64,
    pub converted: bool,
    pub revenue: f64,
    pub competitors: u32,
    pub device: &'static str,
    pub position: &'static str,
}

/// Join requests with their results into export rows.
/// Requests and results are matched by index; the runner guarantees the
/// sequences line up one-to-one.
pub fn build_rows<'a>(
    strategy: &'a str,
    requests: &[BidRequest],
    results: &[AuctionResult],
) -> Vec<AuctionRow<'a>> {
    requests
        .iter()
        .zip(results.iter())
        .map(|(request, result)| {
            debug_assert_eq!(request.request_id, result.request_id);
            AuctionRow {
                request_id: result.request_id,
                timestamp: result.timestamp_ms,
                strategy,
                bid: result.bid,
                won: result.won,
                price: result.winning_price,
                converted: result.converted,
                revenue: result.revenue,
                competitors: result.num_competitors,
                device: request.device.device_type.as_str(),
                position: request.slot.position.as_str(),
            }
        })
        .collect()
}

/// Write export rows as a JSON array to the given path, creating parent
/// directories if needed
pub fn write_json(path: &Path, rows: &[AuctionRow]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Logger;
    use crate::auction::AuctionEngine;
    use crate::market::{MarketDynamics, MarketParams};
    use crate::requests::{BidRequestGenerator, RequestParams};
    use crate::simulation::SimulationRunner;
    use crate::strategies::{BidStrategy, FixedBidStrategy};
    use crate::types::AuctionType;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_row_field_order_is_stable() {
        let requests = BidRequestGenerator::new(RequestParams::defaults()).generate(5, 1);
        let market = MarketDynamics::new(MarketParams::default());
        let runner = SimulationRunner::new(AuctionEngine::new(AuctionType::SECOND_PRICE, market));
        let mut strategy = FixedBidStrategy::new(2.0);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = runner
            .run_batch(&requests, strategy.as_mut(), &mut rng, &mut Logger::new())
            .unwrap();

        let rows = build_rows(strategy.name(), &requests, &outcome.results);
        assert_eq!(rows.len(), 5);

        let json = serde_json::to_string(&rows[0]).unwrap();
        let expected_order = [
            "request_id",
            "timestamp",
            "strategy",
            "bid",
            "won",
            "price",
            "converted",
            "revenue",
            "competitors",
            "device",
            "position",
        ];
        let mut last = 0;
        for key in expected_order {
            let pos = json
                .find(&format!("\"{}\"", key))
                .unwrap_or_else(|| panic!("missing key {}", key));
            assert!(pos >= last, "key {} out of order", key);
            last = pos;
        }
    }
}
