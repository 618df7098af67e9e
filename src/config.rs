use std::f64::consts::PI;

use crate::error::{FilterError, Result};

// センサメーカー提供の観測ノイズ (変更しないこと)
/// Laser noise std-dev, x position [m].
pub const STD_LASPX: f64 = 0.15;
/// Laser noise std-dev, y position [m].
pub const STD_LASPY: f64 = 0.15;
/// Radar noise std-dev, range [m].
pub const STD_RADR: f64 = 0.3;
/// Radar noise std-dev, bearing [rad].
pub const STD_RADPHI: f64 = 0.03;
/// Radar noise std-dev, range rate [m/s].
pub const STD_RADRD: f64 = 0.3;

/// Process noise std-dev, longitudinal acceleration [m/s^2].
pub const STD_A: f64 = 2.5;
/// Process noise std-dev, yaw acceleration [rad/s^2].
pub const STD_YAWDD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserNoise {
    pub std_px: f64,
    pub std_py: f64,
}

impl Default for LaserNoise {
    fn default() -> Self {
        Self {
            std_px: STD_LASPX,
            std_py: STD_LASPY,
        }
    }
}

impl LaserNoise {
    pub fn covariance(&self) -> na::Matrix2<f64> {
        na::Matrix2::from_diagonal(&na::vector![self.std_px.powi(2), self.std_py.powi(2)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarNoise {
    pub std_range: f64,
    pub std_bearing: f64,
    pub std_range_rate: f64,
}

impl Default for RadarNoise {
    fn default() -> Self {
        Self {
            std_range: STD_RADR,
            std_bearing: STD_RADPHI,
            std_range_rate: STD_RADRD,
        }
    }
}

impl RadarNoise {
    pub fn covariance(&self) -> na::Matrix3<f64> {
        na::Matrix3::from_diagonal(&na::vector![
            self.std_range.powi(2),
            self.std_bearing.powi(2),
            self.std_range_rate.powi(2)
        ])
    }
}

/// Prior variances for the unobserved state components at initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialUncertainty {
    pub speed_var: f64,
    pub yaw_var: f64,
    pub yaw_rate_var: f64,
}

impl InitialUncertainty {
    pub const LASER: Self = Self {
        speed_var: 1.0,
        yaw_var: (2.0 * PI) * (2.0 * PI),
        yaw_rate_var: 1.0,
    };
    // 方位の情報なし
    pub const RADAR: Self = Self {
        speed_var: 10.0,
        yaw_var: (2.0 * PI) * (2.0 * PI),
        yaw_rate_var: 0.5 * 0.5,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UkfConfig {
    pub std_a: f64,
    pub std_yawdd: f64,
    /// When false, laser measurements only initialize the filter.
    pub use_laser: bool,
    /// When false, radar measurements only initialize the filter.
    pub use_radar: bool,
    pub laser: LaserNoise,
    pub radar: RadarNoise,
    pub laser_init: InitialUncertainty,
    pub radar_init: InitialUncertainty,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            std_a: STD_A,
            std_yawdd: STD_YAWDD,
            use_laser: true,
            use_radar: false,
            laser: LaserNoise::default(),
            radar: RadarNoise::default(),
            laser_init: InitialUncertainty::LASER,
            radar_init: InitialUncertainty::RADAR,
        }
    }
}

impl UkfConfig {
    pub fn with_process_noise(mut self, std_a: f64, std_yawdd: f64) -> Self {
        self.std_a = std_a;
        self.std_yawdd = std_yawdd;
        self
    }

    pub fn with_sensors(mut self, use_laser: bool, use_radar: bool) -> Self {
        self.use_laser = use_laser;
        self.use_radar = use_radar;
        self
    }

    pub fn with_laser_noise(mut self, laser: LaserNoise) -> Self {
        self.laser = laser;
        self
    }

    pub fn with_radar_noise(mut self, radar: RadarNoise) -> Self {
        self.radar = radar;
        self
    }

    pub fn enabled(&self, kind: crate::SensorKind) -> bool {
        match kind {
            crate::SensorKind::Laser => self.use_laser,
            crate::SensorKind::Radar => self.use_radar,
        }
    }

    pub fn validate(&self) -> Result<()> {
        // 拡張共分散が正定値になるには正のプロセスノイズが必要
        for (name, v) in [("std_a", self.std_a), ("std_yawdd", self.std_yawdd)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(FilterError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {v}"
                )));
            }
        }
        let sensor = [
            ("std_laspx", self.laser.std_px),
            ("std_laspy", self.laser.std_py),
            ("std_radr", self.radar.std_range),
            ("std_radphi", self.radar.std_bearing),
            ("std_radrd", self.radar.std_range_rate),
        ];
        for (name, v) in sensor {
            if !(v.is_finite() && v >= 0.0) {
                return Err(FilterError::InvalidConfig(format!(
                    "{name} must be non-negative and finite, got {v}"
                )));
            }
        }
        for init in [self.laser_init, self.radar_init] {
            let vars = [init.speed_var, init.yaw_var, init.yaw_rate_var];
            if vars.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(FilterError::InvalidConfig(format!(
                    "initial variances must be positive, got {init:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = UkfConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.use_laser);
        assert!(!config.use_radar);
        assert_eq!(config.radar_init.yaw_rate_var, 0.25);
    }

    #[test]
    fn test_rejects_zero_process_noise() {
        let config = UkfConfig::default().with_process_noise(0.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(FilterError::InvalidConfig(_))
        ));
        let config = UkfConfig::default().with_process_noise(1.0, f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_sensor_noise() {
        let config = UkfConfig::default().with_laser_noise(LaserNoise {
            std_px: -0.1,
            std_py: 0.15,
        });
        assert!(config.validate().is_err());
    }
}
