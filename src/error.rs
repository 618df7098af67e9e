use crate::measurement::SensorKind;

pub type Result<T> = std::result::Result<T, FilterError>;

/// Failures surfaced by the filter pipeline.
///
/// Any stage returning one of these leaves the filter exactly as it was
/// before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// Covariance could not be factorised, or a stage produced NaN/inf.
    #[error("numerical instability during {stage}")]
    NumericalInstability { stage: &'static str },

    /// Innovation covariance has no inverse.
    #[error("innovation covariance for {sensor} is singular")]
    SingularCovariance { sensor: SensorKind },

    /// A predicted sigma point sits on the radar origin.
    #[error("degenerate radar geometry: predicted range {range} is too close to zero")]
    DegenerateMeasurement { range: f64 },

    #[error("timestamp {current} us is earlier than the last processed {previous} us")]
    OutOfOrderTimestamp { previous: i64, current: i64 },

    #[error("invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
