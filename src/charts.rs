use plotters::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use crate::auction::AuctionEngine;
use crate::logger::Logger;
use crate::market::{MarketDynamics, MarketParams};
use crate::requests::{BidRequestGenerator, RequestParams};
use crate::simulation::SimulationRunner;
use crate::strategies::FixedBidStrategy;
use crate::types::AuctionType;
use crate::utils::DEFAULT_SEED;

const NUM_BUCKETS: usize = 100;

/// Render a histogram of the given values to a PNG file
fn render_histogram(
    values: &[f64],
    path: &str,
    caption: &str,
    x_desc: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let min_value = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_value = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let bucket_width = (max_value - min_value) / NUM_BUCKETS as f64;
    let mut histogram = vec![0u32; NUM_BUCKETS];
    for &value in values {
        let bucket_index = ((value - min_value) / bucket_width) as usize;
        histogram[bucket_index.min(NUM_BUCKETS - 1)] += 1;
    }
    let max_count = *histogram.iter().max().unwrap_or(&1);

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 40).into_font())
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(min_value..max_value, 0u32..max_count)?;

    chart.configure_mesh().x_desc(x_desc).y_desc("Frequency").draw()?;

    for (i, &count) in histogram.iter().enumerate() {
        if count > 0 {
            let bucket_start = min_value + (i as f64 * bucket_width);
            let bucket_end = min_value + ((i + 1) as f64 * bucket_width);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(bucket_start, 0), (bucket_end, count)],
                BLUE.filled(),
            )))?;
        }
    }

    root.present()?;
    println!("Histogram saved to {} ({} samples, range {:.2}..{:.2})", path, values.len(), min_value, max_value);
    Ok(())
}

/// Histogram of the simulated competitor bid landscape: sample 10000
/// requests and collect every qualifying competitor bid
pub fn generate_competitor_bid_histogram() -> Result<(), Box<dyn std::error::Error>> {
    let generator = BidRequestGenerator::new(RequestParams::defaults());
    let market = MarketDynamics::new(MarketParams::default());
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);

    let mut bids = Vec::new();
    for request in generator.generate(10_000, DEFAULT_SEED) {
        let n = market.sample_competition(&request, &mut rng);
        bids.extend(market.sample_competitor_bids(&request, n, &mut rng));
    }

    render_histogram(
        &bids,
        "competitor_bid_histogram.png",
        "Competitor Bid Distribution",
        "Bid",
    )
}

/// Histogram of second-price clearing prices for a fixed bidder across
/// 10000 auctions
pub fn generate_clearing_price_histogram() -> Result<(), Box<dyn std::error::Error>> {
    let generator = BidRequestGenerator::new(RequestParams::defaults());
    let requests = generator.generate(10_000, DEFAULT_SEED);
    let market = MarketDynamics::new(MarketParams::default());
    let runner = SimulationRunner::new(AuctionEngine::new(AuctionType::SECOND_PRICE, market));
    let mut strategy = FixedBidStrategy::new(3.0);
    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);

    let outcome = runner.run_batch(&requests, strategy.as_mut(), &mut rng, &mut Logger::new())?;
    let prices: Vec<f64> = outcome
        .results
        .iter()
        .filter(|r| r.won)
        .map(|r| r.winning_price)
        .collect();

    render_histogram(
        &prices,
        "clearing_price_histogram.png",
        "Second-Price Clearing Prices",
        "Clearing price",
    )
}

/// Generate all diagnostic histograms
pub fn generate_all_histograms() -> Result<(), Box<dyn std::error::Error>> {
    generate_competitor_bid_histogram()?;
    generate_clearing_price_histogram()?;
    Ok(())
}
