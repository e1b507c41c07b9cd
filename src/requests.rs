use rand::distributions::WeightedIndex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Poisson};

use crate::types::{AdFormat, AdPosition, AdSlot, BidRequest, Device, DeviceType, User};
use crate::utils::lognormal_dist;

/// Object-safe wrapper for Distribution<f64> that works with StdRng
/// This is needed because Distribution<f64> cannot be made into a trait object
/// due to its generic sample method
pub trait DistributionF64 {
    fn sample(&self, rng: &mut StdRng) -> f64;
}

impl<D: Distribution<f64>> DistributionF64 for D {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        Distribution::sample(self, rng)
    }
}

/// Synthetic epoch the request timestamps start from
const TIMESTAMP_BASE_MS: u64 = 1_700_000_000_000;

/// Struct for providing distribution parameters for request generation
/// Contains pre-initialized distribution boxes
pub struct RequestParams {
    /// Floor price per impression; log-normal keeps it strictly positive
    pub floor_price_dist: Box<dyn DistributionF64>,
    /// Value realized on conversion, before the ad-format multiplier
    pub base_value_dist: Box<dyn DistributionF64>,
    /// User likelihood-to-convert signal; skewed toward low/mid scores
    pub behavior_score_dist: Box<dyn DistributionF64>,
    /// Predicted viewability; skewed high, most inventory is viewable
    pub viewability_dist: Box<dyn DistributionF64>,
    /// Baseline conversion rate before quality tilt; low-mean Beta
    pub base_conversion_dist: Box<dyn DistributionF64>,
    /// How strongly viewability/behavior quality lifts the conversion rate
    pub conversion_quality_lift: f64,
    /// Poisson mean for pre-sampling the competition level on the request.
    /// None leaves the competitor count for MarketDynamics to derive.
    pub pre_sample_competition: Option<f64>,
}

impl RequestParams {
    /// Create a new RequestParams with Distribution<f64> types
    /// The distributions will be boxed internally
    pub fn new<D1, D2, D3, D4, D5>(
        floor_price_dist: D1,
        base_value_dist: D2,
        behavior_score_dist: D3,
        viewability_dist: D4,
        base_conversion_dist: D5,
        conversion_quality_lift: f64,
        pre_sample_competition: Option<f64>,
    ) -> Self
    where
        D1: Distribution<f64> + 'static,
        D2: Distribution<f64> + 'static,
        D3: Distribution<f64> + 'static,
        D4: Distribution<f64> + 'static,
        D5: Distribution<f64> + 'static,
    {
        Self {
            floor_price_dist: Box::new(floor_price_dist),
            base_value_dist: Box::new(base_value_dist),
            behavior_score_dist: Box::new(behavior_score_dist),
            viewability_dist: Box::new(viewability_dist),
            base_conversion_dist: Box::new(base_conversion_dist),
            conversion_quality_lift,
            pre_sample_competition,
        }
    }

    /// Default traffic mix resembling open-exchange display inventory
    pub fn defaults() -> Self {
        Self::new(
            lognormal_dist(0.5, 0.25),      // floor_price_dist
            lognormal_dist(12.0, 6.0),      // base_value_dist
            Beta::new(3.0, 5.0).unwrap(),   // behavior_score_dist
            Beta::new(8.0, 2.0).unwrap(),   // viewability_dist
            Beta::new(2.0, 98.0).unwrap(),  // base_conversion_dist, mean 0.02
            0.03,                           // conversion_quality_lift
            None,                           // competition left to MarketDynamics
        )
    }
}

const OS_CHOICES: [&str; 4] = ["Windows", "MacOS", "iOS", "Android"];
const BROWSER_CHOICES: [&str; 4] = ["Chrome", "Safari", "Firefox", "Edge"];
const GEO_CHOICES: [&str; 5] = ["US", "GB", "DE", "FR", "BR"];

/// Ad formats with their slot sizes and relative value multipliers.
/// Video and CTV-adjacent formats clear meaningfully above display.
const FORMATS: [(AdFormat, &[(u32, u32)], f64); 4] = [
    (AdFormat::DISPLAY, &[(300, 250), (728, 90), (970, 250), (320, 50)], 1.0),
    (AdFormat::VIDEO, &[(640, 480), (1280, 720)], 1.8),
    (AdFormat::NATIVE, &[(600, 600)], 1.2),
    (AdFormat::AUDIO, &[(0, 0)], 0.7),
];

const DEVICES: [DeviceType; 4] = [
    DeviceType::MOBILE,
    DeviceType::DESKTOP,
    DeviceType::TABLET,
    DeviceType::CTV,
];

/// Generator for synthetic bid requests with realistic attribute distributions
pub struct BidRequestGenerator {
    params: RequestParams,
}

impl BidRequestGenerator {
    pub fn new(params: RequestParams) -> Self {
        Self { params }
    }

    /// Generate `count` bid requests from a seeded stream.
    ///
    /// The same seed yields a bit-identical sequence within a build. No
    /// promise is made across rand major versions (StdRng is not a stable
    /// portable stream), so reproducibility is per-build, not cross-language.
    pub fn generate(&self, count: usize, seed: u64) -> Vec<BidRequest> {
        let mut rng = StdRng::seed_from_u64(seed);
        // Mobile-heavy device mix
        let device_weights = WeightedIndex::new([55, 28, 10, 7]).unwrap();

        let mut requests = Vec::with_capacity(count);
        let mut timestamp_ms = TIMESTAMP_BASE_MS;

        for request_id in 0..count as u64 {
            timestamp_ms += rng.gen_range(1..=25);

            let device_type = DEVICES[device_weights.sample(&mut rng)];
            let (ad_format, sizes, value_multiplier) = FORMATS[rng.gen_range(0..FORMATS.len())];
            let (width, height) = sizes[rng.gen_range(0..sizes.len())];
            let position = if rng.gen_bool(0.6) {
                AdPosition::ABOVE_FOLD
            } else {
                AdPosition::BELOW_FOLD
            };

            let behavior_score = self.params.behavior_score_dist.sample(&mut rng);
            let viewability_score = self.params.viewability_dist.sample(&mut rng);

            // Quality signals tilt the conversion rate upward from its base
            let quality = viewability_score * 0.3 + behavior_score * 0.7;
            let conversion_probability = (self.params.base_conversion_dist.sample(&mut rng)
                + quality * self.params.conversion_quality_lift)
                .min(1.0);

            let estimated_value = self.params.base_value_dist.sample(&mut rng) * value_multiplier;
            let floor_price = self.params.floor_price_dist.sample(&mut rng);

            let competition_level = self.params.pre_sample_competition.map(|mean| {
                let poisson = Poisson::new(mean).unwrap();
                Distribution::<f64>::sample(&poisson, &mut rng) as u32
            });

            let num_segments = rng.gen_range(1..=5);
            let segments = (0..num_segments).map(|i| format!("seg_{}", i)).collect();

            requests.push(BidRequest {
                request_id,
                timestamp_ms,
                user: User {
                    user_id: rng.gen(),
                    segments,
                    behavior_score,
                },
                device: Device {
                    device_type,
                    os: OS_CHOICES[rng.gen_range(0..OS_CHOICES.len())],
                    browser: BROWSER_CHOICES[rng.gen_range(0..BROWSER_CHOICES.len())],
                    geo_country: GEO_CHOICES[rng.gen_range(0..GEO_CHOICES.len())],
                },
                slot: AdSlot {
                    ad_format,
                    width,
                    height,
                    position,
                    viewability_score,
                },
                floor_price,
                competition_level,
                conversion_probability,
                estimated_value,
            });
        }

        requests
    }
}
