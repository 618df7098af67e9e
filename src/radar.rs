//! Sigma-point correction for radar range/bearing/range-rate returns.

use crate::config::RadarNoise;
use crate::error::{FilterError, Result};
use crate::gaussian::Gaussian;
use crate::nis::nis;
use crate::sigma::{recover, residual};
use crate::{Correction, Sigma, State, Weights, N_SIGMA, N_X, YAW};

// 観測空間の次元
pub const N_Z: usize = 3;
/// Row of the bearing in measurement space.
pub const BEARING: usize = 1;
/// Predicted ranges below this make bearing and range rate meaningless.
pub const MIN_RANGE: f64 = 1e-4;

type Measurement = na::SVector<f64, N_Z>;

/// Sigma points mapped into measurement space with their moments,
/// measurement noise already included in the covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarPrediction {
    pub sigmas: Sigma<N_Z>,
    pub z: Gaussian<N_Z>,
}

/// Maps a state to `[range, bearing, range_rate]`.
pub fn measurement_model(x: &State) -> Result<Measurement> {
    let (px, py, v, yaw) = (x[0], x[1], x[2], x[3]);
    let range = px.hypot(py);
    // NaN もここで弾く
    if !(range >= MIN_RANGE) {
        return Err(FilterError::DegenerateMeasurement { range });
    }
    Ok(na::vector![
        range,
        py.atan2(px),
        (px * yaw.cos() * v + py * yaw.sin() * v) / range
    ])
}

pub fn predict_radar_measurement(
    pred_sigmas: &Sigma<N_X>,
    weights: &Weights,
    noise: &RadarNoise,
) -> Result<RadarPrediction> {
    let mut sigmas = Sigma::<N_Z>::zeros();
    for i in 0..N_SIGMA {
        sigmas.set_column(i, &measurement_model(&pred_sigmas.column(i).into_owned())?);
    }
    let mut z = recover(&sigmas, weights, Some(BEARING));
    z.cov += noise.covariance();
    Ok(RadarPrediction { sigmas, z })
}

/// Fuses the radar return `z` into `belief`, whose predicted sigma points
/// are `pred_sigmas`.
pub fn update(
    belief: &Gaussian<N_X>,
    pred_sigmas: &Sigma<N_X>,
    weights: &Weights,
    z: &Measurement,
    noise: &RadarNoise,
) -> Result<Correction> {
    let RadarPrediction { sigmas, z: z_pred } =
        predict_radar_measurement(pred_sigmas, weights, noise)?;

    // 相互相関行列
    let mut tc = na::SMatrix::<f64, N_X, N_Z>::zeros();
    for i in 0..N_SIGMA {
        let x_diff = residual(&pred_sigmas.column(i).into_owned(), &belief.mean, Some(YAW));
        let z_diff = residual(&sigmas.column(i).into_owned(), &z_pred.mean, Some(BEARING));
        tc += weights[i] * x_diff * z_diff.transpose();
    }

    let s_inv = z_pred.cov.try_inverse().ok_or(FilterError::SingularCovariance {
        sensor: crate::SensorKind::Radar,
    })?;
    let k = tc * s_inv;
    let z_diff = residual(z, &z_pred.mean, Some(BEARING));

    let mean = belief.mean + k * z_diff;
    let cov = belief.cov - k * z_pred.cov * k.transpose();
    let belief = Gaussian::new(mean, cov)
        .symmetrized()
        .finite_or("radar update")?;
    log::trace!("radar gain: {k:.4}");

    Ok(Correction {
        belief,
        nis: nis(&z_diff, &s_inv),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctrv::predict_sigma_points;
    use crate::sigma::{augmented_sigma_points, sigma_weights};
    use crate::Cov;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn predicted() -> (Gaussian<N_X>, Sigma<N_X>, Weights) {
        let prior = Gaussian::new(
            na::vector![5.0, 0.0, 1.0, 0.0, 0.0],
            Cov::<N_X>::from_diagonal(&na::vector![0.1, 0.1, 1.0, 0.1, 0.1]),
        );
        let weights = sigma_weights::<N_SIGMA>();
        let aug = augmented_sigma_points(&prior, 2.5, 1.0).unwrap();
        let sigmas = predict_sigma_points(&aug, 0.1);
        let belief = recover(&sigmas, &weights, Some(YAW));
        (belief, sigmas, weights)
    }

    #[test]
    fn test_measurement_model() {
        let z = measurement_model(&na::vector![0.0, 2.0, 3.0, FRAC_PI_2, 0.0]).unwrap();
        assert_relative_eq!(z[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(z[1], FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(z[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_measurement_model_at_origin() {
        let err = measurement_model(&na::vector![0.0, 0.0, 1.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, FilterError::DegenerateMeasurement { range: 0.0 });
        let err = measurement_model(&na::vector![f64::NAN, 0.0, 1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, FilterError::DegenerateMeasurement { .. }));
    }

    #[test]
    fn test_prediction_includes_noise() {
        let (_, sigmas, weights) = predicted();
        let loud = RadarNoise {
            std_range: 10.0,
            std_bearing: 1.0,
            std_range_rate: 10.0,
        };
        let quiet = predict_radar_measurement(&sigmas, &weights, &RadarNoise::default()).unwrap();
        let noisy = predict_radar_measurement(&sigmas, &weights, &loud).unwrap();
        assert_relative_eq!(quiet.z.mean, noisy.z.mean, epsilon = 1e-12);
        assert_relative_eq!(
            noisy.z.cov[(0, 0)] - quiet.z.cov[(0, 0)],
            100.0 - 0.09,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_consistent_return_shrinks_covariance() {
        let (belief, sigmas, weights) = predicted();
        let z = na::vector![5.1, 0.0, 1.0];
        let c = update(&belief, &sigmas, &weights, &z, &RadarNoise::default()).unwrap();
        assert!(c.belief.cov[(0, 0)] < belief.cov[(0, 0)]);
        assert!(c.belief.cov[(2, 2)] < belief.cov[(2, 2)]);
        assert!((c.belief.mean[0] - 5.1).abs() < 0.05);
        assert!(c.nis >= 0.0);
    }

    #[test]
    fn test_huge_noise_keeps_prediction() {
        let (belief, sigmas, weights) = predicted();
        let loud = RadarNoise {
            std_range: 1e6,
            std_bearing: 1e6,
            std_range_rate: 1e6,
        };
        let z = na::vector![7.0, 0.3, -2.0];
        let c = update(&belief, &sigmas, &weights, &z, &loud).unwrap();
        assert_relative_eq!(c.belief.mean, belief.mean, epsilon = 1e-6);
    }

    #[test]
    fn test_bearing_residual_wraps() {
        // 予測方位 ≈ 0 に対し 2π ずれた観測でも同じ補正になる
        let (belief, sigmas, weights) = predicted();
        let noise = RadarNoise::default();
        let a = update(&belief, &sigmas, &weights, &na::vector![5.1, 0.01, 1.0], &noise).unwrap();
        let b = update(
            &belief,
            &sigmas,
            &weights,
            &na::vector![5.1, 0.01 + 2.0 * std::f64::consts::PI, 1.0],
            &noise,
        )
        .unwrap();
        assert_relative_eq!(a.belief.mean, b.belief.mean, epsilon = 1e-9);
    }
}
