use serde::Serialize;

use crate::error::ValidationError;

/// Pricing mechanism used to settle an auction
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionType {
    /// Winner pays exactly their own bid
    FIRST_PRICE,
    /// Winner pays the next-highest qualifying bid (floored at floor price)
    SECOND_PRICE,
    /// Vickrey-Clarke-Groves; for a single slot this degenerates to second price
    VCG,
}

impl AuctionType {
    /// Parse an auction type from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first_price" => Some(AuctionType::FIRST_PRICE),
            "second_price" => Some(AuctionType::SECOND_PRICE),
            "vcg" => Some(AuctionType::VCG),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionType::FIRST_PRICE => "first_price",
            AuctionType::SECOND_PRICE => "second_price",
            AuctionType::VCG => "vcg",
        }
    }
}

/// Device class an impression is served on
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    DESKTOP,
    MOBILE,
    TABLET,
    CTV,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::DESKTOP => "desktop",
            DeviceType::MOBILE => "mobile",
            DeviceType::TABLET => "tablet",
            DeviceType::CTV => "ctv",
        }
    }
}

/// Creative format of the ad slot
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdFormat {
    DISPLAY,
    VIDEO,
    NATIVE,
    AUDIO,
}

impl AdFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdFormat::DISPLAY => "display",
            AdFormat::VIDEO => "video",
            AdFormat::NATIVE => "native",
            AdFormat::AUDIO => "audio",
        }
    }
}

/// Placement of the ad slot on the page
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdPosition {
    ABOVE_FOLD,
    BELOW_FOLD,
}

impl AdPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPosition::ABOVE_FOLD => "above_fold",
            AdPosition::BELOW_FOLD => "below_fold",
        }
    }
}

/// User attributes attached to a bid request
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: u64,
    pub segments: Vec<String>,
    /// Likelihood-to-convert signal in [0, 1]
    pub behavior_score: f64,
}

/// Device attributes attached to a bid request
#[derive(Debug, Clone)]
pub struct Device {
    pub device_type: DeviceType,
    pub os: &'static str,
    pub browser: &'static str,
    pub geo_country: &'static str,
}

/// The ad slot being auctioned
#[derive(Debug, Clone)]
pub struct AdSlot {
    pub ad_format: AdFormat,
    pub width: u32,
    pub height: u32,
    pub position: AdPosition,
    /// Predicted viewability in [0, 1]
    pub viewability_score: f64,
}

/// One impression opportunity put up for auction
///
/// Immutable once generated; consumed by exactly one auction resolution.
#[derive(Debug, Clone)]
pub struct BidRequest {
    pub request_id: u64,
    pub timestamp_ms: u64,
    pub user: User,
    pub device: Device,
    pub slot: AdSlot,
    /// Minimum acceptable bid, strictly positive
    pub floor_price: f64,
    /// Pre-sampled competitor count; None means MarketDynamics derives it
    pub competition_level: Option<u32>,
    /// Probability of a post-win conversion, in [0, 1]
    pub conversion_probability: f64,
    /// Revenue realized if a conversion happens, strictly positive
    pub estimated_value: f64,
}

impl BidRequest {
    /// Check the request invariants (floor > 0, scores and probabilities in
    /// range, value > 0). Malformed requests fail fast, never get clamped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.floor_price > 0.0) || !self.floor_price.is_finite() {
            return Err(ValidationError::InvalidFloorPrice(self.floor_price));
        }
        for (field, value) in [
            ("behavior_score", self.user.behavior_score),
            ("viewability_score", self.slot.viewability_score),
            ("conversion_probability", self.conversion_probability),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ScoreOutOfRange { field, value });
            }
        }
        if !(self.estimated_value > 0.0) || !self.estimated_value.is_finite() {
            return Err(ValidationError::InvalidEstimatedValue(self.estimated_value));
        }
        Ok(())
    }
}

/// Result of one resolved auction, from the bidder's point of view
///
/// Created once by the auction engine and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionResult {
    pub request_id: u64,
    /// The bid the strategy submitted
    pub bid: f64,
    /// Price actually paid; 0.0 whenever the auction was lost
    pub winning_price: f64,
    pub won: bool,
    /// Competitors remaining after sub-floor bids were discarded
    pub num_competitors: u32,
    pub converted: bool,
    /// estimated_value on a converted win, otherwise 0.0
    pub revenue: f64,
    pub timestamp_ms: u64,
}
