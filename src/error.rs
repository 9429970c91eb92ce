use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold {0} is outside 0..=100")]
    ThresholdPercentOutOfRange(i64),
    #[error("threshold {0} is outside 0.0..=1.0")]
    ThresholdFractionOutOfRange(f64),
    #[error("{scenario} does not accept a {change} change")]
    Unsupported {
        scenario: &'static str,
        change: &'static str,
    },
    #[error("invalid scenario document: {0}")]
    Parse(#[from] serde_json::Error),
}
