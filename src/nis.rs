//! Normalized innovation squared (NIS) consistency check.
//!
//! For a well-tuned filter the NIS of an `n`-dim sensor follows a
//! chi-squared distribution with `n` degrees of freedom, so about 5% of
//! samples should exceed the 95% quantile.

use crate::SensorKind;

/// 95% chi-squared quantile, 2 degrees of freedom.
pub const CHI2_95_DF2: f64 = 5.991;
/// 95% chi-squared quantile, 3 degrees of freedom.
pub const CHI2_95_DF3: f64 = 7.815;

pub fn threshold_95(kind: SensorKind) -> f64 {
    match kind {
        SensorKind::Laser => CHI2_95_DF2,
        SensorKind::Radar => CHI2_95_DF3,
    }
}

/// `residual^T * S^-1 * residual`
pub fn nis<const M: usize>(
    residual: &na::SVector<f64, M>,
    s_inv: &na::SMatrix<f64, M, M>,
) -> f64 {
    (residual.transpose() * s_inv * residual)[0]
}

#[derive(Debug, Clone, Default)]
pub struct NisMonitor {
    laser: Vec<f64>,
    radar: Vec<f64>,
}

impl NisMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: SensorKind, value: f64) {
        match kind {
            SensorKind::Laser => self.laser.push(value),
            SensorKind::Radar => self.radar.push(value),
        }
    }

    pub fn samples(&self, kind: SensorKind) -> &[f64] {
        match kind {
            SensorKind::Laser => &self.laser,
            SensorKind::Radar => &self.radar,
        }
    }

    /// Share of samples above the 95% threshold, `None` if there are none.
    pub fn exceed_ratio(&self, kind: SensorKind) -> Option<f64> {
        let samples = self.samples(kind);
        if samples.is_empty() {
            return None;
        }
        let limit = threshold_95(kind);
        let over = samples.iter().filter(|&&v| v > limit).count();
        Some(over as f64 / samples.len() as f64)
    }

    pub fn mean(&self, kind: SensorKind) -> Option<f64> {
        let samples = self.samples(kind);
        if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<f64>() / samples.len() as f64)
        }
    }

    /// Merges another monitor's samples into this one.
    pub fn merge(mut self, other: NisMonitor) -> Self {
        self.laser.extend(other.laser);
        self.radar.extend(other.radar);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nis_value() {
        let s_inv = na::Matrix2::from_diagonal(&na::vector![1.0 / 4.0, 1.0]);
        assert_relative_eq!(nis(&na::vector![2.0, 1.0], &s_inv), 2.0);
    }

    #[test]
    fn test_exceed_ratio() {
        let mut monitor = NisMonitor::new();
        assert!(monitor.exceed_ratio(SensorKind::Laser).is_none());
        for v in [1.0, 2.0, 7.0, 0.5] {
            monitor.record(SensorKind::Laser, v);
        }
        monitor.record(SensorKind::Radar, 7.0);
        assert_relative_eq!(monitor.exceed_ratio(SensorKind::Laser).unwrap(), 0.25);
        assert_relative_eq!(monitor.exceed_ratio(SensorKind::Radar).unwrap(), 0.0);
        assert_relative_eq!(monitor.mean(SensorKind::Laser).unwrap(), 2.625);
    }

    #[test]
    fn test_merge() {
        let mut a = NisMonitor::new();
        a.record(SensorKind::Radar, 1.0);
        let mut b = NisMonitor::new();
        b.record(SensorKind::Radar, 9.0);
        let merged = a.merge(b);
        assert_eq!(merged.samples(SensorKind::Radar), &[1.0, 9.0]);
    }
}
