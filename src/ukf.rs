use crate::config::{InitialUncertainty, UkfConfig};
use crate::ctrv::predict_sigma_points;
use crate::error::{FilterError, Result};
use crate::gaussian::Gaussian;
use crate::measurement::{Measurement, MeasurementPackage, SensorKind};
use crate::sigma::{augmented_sigma_points, recover, sigma_weights};
use crate::{lidar, radar, Cov, Sigma, State, Weights, N_SIGMA, N_X, YAW};

/// Filter lifecycle. `Uninitialized -> Tracking` happens once.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Uninitialized,
    Tracking { time_us: i64 },
}

/// CTRV unscented Kalman filter for one tracked object.
///
/// State is `[px, py, v, yaw, yaw_rate]`. Feed measurements in timestamp
/// order through [`process_measurement`](Self::process_measurement) and read
/// [`state`](Self::state) / [`covariance`](Self::covariance) afterwards.
///
/// Not synchronised; one instance per object and caller thread.
///
/// Prediction and the per-sensor corrections are internal steps of
/// `process_measurement` and are not callable on their own:
///
/// ```compile_fail
/// let mut ukf = ukf_fusion::UnscentedKalmanFilter::default();
/// ukf.predict(0.1).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    config: UkfConfig,
    phase: Phase,
    belief: Gaussian<N_X>,
    wm: Weights,
    sigma_pred: Sigma<N_X>,
    nis_laser: Option<f64>,
    nis_radar: Option<f64>,
}

impl Default for UnscentedKalmanFilter {
    fn default() -> Self {
        Self::build(UkfConfig::default(), Phase::Uninitialized, Gaussian::default())
    }
}

impl UnscentedKalmanFilter {
    pub fn new(config: UkfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, Phase::Uninitialized, Gaussian::default()))
    }

    /// A filter already tracking from the given prior at `time_us`.
    pub fn initialized(config: UkfConfig, prior: Gaussian<N_X>, time_us: i64) -> Result<Self> {
        config.validate()?;
        let prior = prior.finite_or("initialization")?;
        Ok(Self::build(config, Phase::Tracking { time_us }, prior))
    }

    fn build(config: UkfConfig, phase: Phase, belief: Gaussian<N_X>) -> Self {
        Self {
            config,
            phase,
            belief,
            wm: sigma_weights::<N_SIGMA>(),
            sigma_pred: Sigma::<N_X>::zeros(),
            nis_laser: None,
            nis_radar: None,
        }
    }

    // 推定した状態を返す
    pub fn state(&self) -> State {
        self.belief.mean
    }

    pub fn covariance(&self) -> Cov<N_X> {
        self.belief.cov
    }

    pub fn belief(&self) -> &Gaussian<N_X> {
        &self.belief
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.phase, Phase::Tracking { .. })
    }

    /// Timestamp of the last accepted measurement.
    pub fn time_us(&self) -> Option<i64> {
        match self.phase {
            Phase::Uninitialized => None,
            Phase::Tracking { time_us } => Some(time_us),
        }
    }

    /// Sigma points from the most recent prediction.
    pub fn predicted_sigma_points(&self) -> &Sigma<N_X> {
        &self.sigma_pred
    }

    pub fn weights(&self) -> &Weights {
        &self.wm
    }

    /// NIS of the most recent correction from `kind`.
    pub fn nis(&self, kind: SensorKind) -> Option<f64> {
        match kind {
            SensorKind::Laser => self.nis_laser,
            SensorKind::Radar => self.nis_radar,
        }
    }

    /// Runs one predict/correct cycle, or initializes on the first call.
    ///
    /// On error nothing is changed, the clock included.
    pub fn process_measurement(&mut self, package: &MeasurementPackage) -> Result<()> {
        if !package.is_finite() {
            return Err(FilterError::InvalidMeasurement(format!(
                "non-finite {} values at {} us",
                package.sensor_kind(),
                package.timestamp_us
            )));
        }

        let previous = match self.phase {
            Phase::Uninitialized => return self.initialize(package),
            Phase::Tracking { time_us } => time_us,
        };
        if package.timestamp_us < previous {
            log::warn!(
                "rejecting {} measurement at {} us, last was {} us",
                package.sensor_kind(),
                package.timestamp_us,
                previous
            );
            return Err(FilterError::OutOfOrderTimestamp {
                previous,
                current: package.timestamp_us,
            });
        }
        let dt_us = package.timestamp_us.checked_sub(previous).ok_or_else(|| {
            FilterError::InvalidMeasurement(format!(
                "time step from {previous} us to {} us overflows",
                package.timestamp_us
            ))
        })?;
        let dt = dt_us as f64 / 1e6;

        let mut next = self.clone();
        next.predict(dt)?;
        let kind = package.sensor_kind();
        if self.config.enabled(kind) {
            match package.measurement {
                Measurement::Laser { px, py } => next.update_lidar(&na::vector![px, py])?,
                Measurement::Radar {
                    range,
                    bearing,
                    range_rate,
                } => next.update_radar(&na::vector![range, bearing, range_rate])?,
            }
        } else {
            log::debug!("{kind} disabled, prediction only");
        }
        next.phase = Phase::Tracking {
            time_us: package.timestamp_us,
        };
        *self = next;
        Ok(())
    }

    /// Sets the first belief from a single measurement.
    ///
    /// A radar return closer than [`radar::MIN_RANGE`] carries no usable
    /// position variance and is rejected; the filter stays uninitialized.
    fn initialize(&mut self, package: &MeasurementPackage) -> Result<()> {
        let (px, py, p00, p11, init) = match package.measurement {
            Measurement::Radar { range, bearing, .. } => {
                if !(range >= radar::MIN_RANGE) {
                    log::warn!("radar return at {range} m cannot initialize the filter");
                    return Err(FilterError::DegenerateMeasurement { range });
                }
                let (sin, cos) = bearing.sin_cos();
                let var_r = self.config.radar.std_range.powi(2);
                let var_phi = self.config.radar.std_bearing.powi(2);
                (
                    range * cos,
                    range * sin,
                    var_r * cos * cos + range * range * sin * sin * var_phi,
                    var_r * sin * sin + range * range * cos * cos * var_phi,
                    self.config.radar_init,
                )
            }
            Measurement::Laser { px, py } => (
                px,
                py,
                self.config.laser.std_px.powi(2),
                self.config.laser.std_py.powi(2),
                self.config.laser_init,
            ),
        };
        let InitialUncertainty {
            speed_var,
            yaw_var,
            yaw_rate_var,
        } = init;

        let belief = Gaussian::new(
            na::vector![px, py, 0.0, 0.0, 0.0],
            Cov::<N_X>::from_diagonal(&na::vector![p00, p11, speed_var, yaw_var, yaw_rate_var]),
        )
        .finite_or("initialization")?;
        // 正定値でなければ以降の予測が必ず失敗する
        if belief.cov.cholesky().is_none() {
            return Err(FilterError::NumericalInstability {
                stage: "initialization",
            });
        }
        self.belief = belief;
        self.phase = Phase::Tracking {
            time_us: package.timestamp_us,
        };
        log::debug!(
            "initialized from {} at {} us: x = {:?}",
            package.sensor_kind(),
            package.timestamp_us,
            self.belief.mean.as_slice()
        );
        log::trace!("initial covariance: {:.4}", self.belief.cov);
        Ok(())
    }

    /// Propagates the belief `dt` seconds forward with the CTRV model.
    fn predict(&mut self, dt: f64) -> Result<()> {
        let aug = augmented_sigma_points(&self.belief, self.config.std_a, self.config.std_yawdd)?;
        let sigma_pred = predict_sigma_points(&aug, dt);
        let belief = recover(&sigma_pred, &self.wm, Some(YAW)).finite_or("prediction")?;

        self.sigma_pred = sigma_pred;
        self.belief = belief;
        log::debug!("predicted {dt:.3} s: x = {:?}", self.belief.mean.as_slice());
        Ok(())
    }

    /// Corrects with a laser fix `[px, py]`.
    fn update_lidar(&mut self, z: &na::Vector2<f64>) -> Result<()> {
        let c = lidar::update(&self.belief, z, &self.config.laser)?;
        self.belief = c.belief;
        self.nis_laser = Some(c.nis);
        log::debug!("laser update: nis = {:.3}", c.nis);
        Ok(())
    }

    /// Corrects with a radar return `[range, bearing, range_rate]`.
    ///
    /// Uses the sigma points of the last [`predict`](Self::predict).
    fn update_radar(&mut self, z: &na::Vector3<f64>) -> Result<()> {
        let c = radar::update(&self.belief, &self.sigma_pred, &self.wm, z, &self.config.radar)?;
        self.belief = c.belief;
        self.nis_radar = Some(c.nis);
        log::debug!("radar update: nis = {:.3}", c.nis);
        Ok(())
    }
}
