use thiserror::Error;

/// Failure taxonomy for the scan/monitor engine.
///
/// Every variant is contained at the per-instrument level: a failing ticker is
/// skipped for the cycle and retried on the next one. Nothing here may abort a
/// running scan.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data: got {got} candles, need {need}")]
    InsufficientData { got: usize, need: usize },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),
}
