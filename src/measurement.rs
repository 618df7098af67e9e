use crate::error::{FilterError, Result};

/// Which sensor produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Laser,
    Radar,
}

impl SensorKind {
    /// Number of raw values the sensor reports.
    pub const fn dim(self) -> usize {
        match self {
            SensorKind::Laser => 2,
            SensorKind::Radar => 3,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Laser => f.write_str("laser"),
            SensorKind::Radar => f.write_str("radar"),
        }
    }
}

/// Raw sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Cartesian position fix [m].
    Laser { px: f64, py: f64 },
    /// Polar return: range [m], bearing [rad], range rate [m/s].
    Radar {
        range: f64,
        bearing: f64,
        range_rate: f64,
    },
}

impl Measurement {
    pub fn kind(&self) -> SensorKind {
        match self {
            Measurement::Laser { .. } => SensorKind::Laser,
            Measurement::Radar { .. } => SensorKind::Radar,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        match *self {
            Measurement::Laser { px, py } => vec![px, py],
            Measurement::Radar {
                range,
                bearing,
                range_rate,
            } => vec![range, bearing, range_rate],
        }
    }
}

/// A single timestamped observation handed to the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementPackage {
    /// Microseconds; must not decrease between calls.
    pub timestamp_us: i64,
    pub measurement: Measurement,
}

impl MeasurementPackage {
    pub fn laser(timestamp_us: i64, px: f64, py: f64) -> Self {
        Self {
            timestamp_us,
            measurement: Measurement::Laser { px, py },
        }
    }

    pub fn radar(timestamp_us: i64, range: f64, bearing: f64, range_rate: f64) -> Self {
        Self {
            timestamp_us,
            measurement: Measurement::Radar {
                range,
                bearing,
                range_rate,
            },
        }
    }

    /// Builds a package from an untyped value list, checking the count and
    /// that every value is finite.
    pub fn from_raw(kind: SensorKind, values: &[f64], timestamp_us: i64) -> Result<Self> {
        if values.len() != kind.dim() {
            return Err(FilterError::InvalidMeasurement(format!(
                "{kind} expects {} values, got {}",
                kind.dim(),
                values.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(FilterError::InvalidMeasurement(format!(
                "{kind} value {v} is not finite"
            )));
        }
        Ok(match kind {
            SensorKind::Laser => Self::laser(timestamp_us, values[0], values[1]),
            SensorKind::Radar => Self::radar(timestamp_us, values[0], values[1], values[2]),
        })
    }

    pub fn sensor_kind(&self) -> SensorKind {
        self.measurement.kind()
    }

    pub fn is_finite(&self) -> bool {
        self.measurement.values().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_checks_dimension() {
        let err = MeasurementPackage::from_raw(SensorKind::Radar, &[1.0, 2.0], 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidMeasurement(_)));

        let pkg = MeasurementPackage::from_raw(SensorKind::Laser, &[1.0, 2.0], 7).unwrap();
        assert_eq!(pkg, MeasurementPackage::laser(7, 1.0, 2.0));
        assert_eq!(pkg.sensor_kind(), SensorKind::Laser);
    }

    #[test]
    fn test_from_raw_rejects_nan() {
        let err =
            MeasurementPackage::from_raw(SensorKind::Radar, &[1.0, f64::NAN, 0.0], 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidMeasurement(_)));
    }
}
