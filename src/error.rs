use thiserror::Error;

/// Failures surfaced by the analysis core.
///
/// Every variant is recoverable: the threshold registry and the patient
/// store stay valid after any single failed operation, so callers can map
/// each kind to whatever response their transport needs.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The recording could not be read or turned into samples.
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Decoding worked but produced no samples.
    #[error("Audio contains no samples")]
    EmptyInput,

    /// A metric name outside the fixed set of four.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A threshold update whose bounds cannot satisfy low <= high.
    #[error("Invalid range for {metric}: low {low} must not exceed high {high}")]
    InvalidRange { metric: String, low: f64, high: f64 },

    /// A history query for a patient with nothing recorded.
    #[error("No samples found for patient {0}")]
    NotFound(String),
}

pub type HealthResult<T> = std::result::Result<T, HealthError>;
