use thiserror::Error;

/// Malformed inputs at the engine boundary. These always fail fast;
/// nothing is silently clamped or corrected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("bid must be finite and non-negative, got {0}")]
    InvalidBid(f64),
    #[error("floor price must be positive and finite, got {0}")]
    InvalidFloorPrice(f64),
    #[error("{field} must be within [0, 1], got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    #[error("estimated value must be positive and finite, got {0}")]
    InvalidEstimatedValue(f64),
}

/// Malformed simulation configuration. Detected before any auction runs,
/// so a bad config never leaves a partially written result sequence.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("num_auctions must be positive")]
    ZeroAuctions,
    #[error("avg_competition must be positive, got {0}")]
    NonPositiveCompetition(f64),
    #[error("market_volatility must be non-negative, got {0}")]
    NegativeVolatility(f64),
    #[error("unknown auction type '{0}' (expected first_price, second_price or vcg)")]
    UnknownAuctionType(String),
    #[error("invalid value '{value}' for option {option}")]
    InvalidOption { option: &'static str, value: String },
}

/// Failures while writing the tabular export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
