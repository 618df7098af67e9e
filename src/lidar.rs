//! Linear Kalman correction for laser position fixes.

use crate::config::LaserNoise;
use crate::error::{FilterError, Result};
use crate::gaussian::Gaussian;
use crate::nis::nis;
use crate::{Correction, Cov, SensorKind, N_X};

/// Selects `[px, py]` from the state.
pub fn observation_matrix() -> na::SMatrix<f64, 2, N_X> {
    na::matrix![
        1.0, 0.0, 0.0, 0.0, 0.0;
        0.0, 1.0, 0.0, 0.0, 0.0;
    ]
}

/// Fuses the position fix `z` into `belief`.
pub fn update(
    belief: &Gaussian<N_X>,
    z: &na::Vector2<f64>,
    noise: &LaserNoise,
) -> Result<Correction> {
    let h = observation_matrix();
    let ht = h.transpose();

    let y = z - h * belief.mean;
    let s = h * belief.cov * ht + noise.covariance();
    let s_inv = s.try_inverse().ok_or(FilterError::SingularCovariance {
        sensor: SensorKind::Laser,
    })?;
    let k = belief.cov * ht * s_inv;

    let mean = belief.mean + k * y;
    let cov = (Cov::<N_X>::identity() - k * h) * belief.cov;
    let belief = Gaussian::new(mean, cov)
        .symmetrized()
        .finite_or("laser update")?;
    log::trace!("laser gain: {k:.4}");

    Ok(Correction {
        belief,
        nis: nis(&y, &s_inv),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn belief() -> Gaussian<N_X> {
        Gaussian::new(
            na::vector![1.0, 2.0, 0.5, 0.1, 0.0],
            Cov::<N_X>::identity() * 0.5,
        )
    }

    #[test]
    fn test_equal_confidence_splits_difference() {
        let noise = LaserNoise {
            std_px: 0.5_f64.sqrt(),
            std_py: 0.5_f64.sqrt(),
        };
        let c = update(&belief(), &na::vector![2.0, 1.0], &noise).unwrap();
        assert_relative_eq!(c.belief.mean[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(c.belief.mean[1], 1.5, epsilon = 1e-12);
        assert_relative_eq!(c.belief.cov[(0, 0)], 0.25, epsilon = 1e-12);
        // 観測されない成分は変化しない
        assert_relative_eq!(c.belief.mean[2], 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.belief.cov[(2, 2)], 0.5, epsilon = 1e-12);
        // y = [1, -1], S = I
        assert_relative_eq!(c.nis, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_huge_noise_keeps_prediction() {
        let noise = LaserNoise {
            std_px: 1e6,
            std_py: 1e6,
        };
        let c = update(&belief(), &na::vector![10.0, -10.0], &noise).unwrap();
        assert_relative_eq!(c.belief.mean, belief().mean, epsilon = 1e-9);
    }

    #[test]
    fn test_tiny_noise_follows_measurement() {
        let noise = LaserNoise {
            std_px: 1e-6,
            std_py: 1e-6,
        };
        let c = update(&belief(), &na::vector![10.0, -10.0], &noise).unwrap();
        assert_relative_eq!(c.belief.mean[0], 10.0, epsilon = 1e-6);
        assert_relative_eq!(c.belief.mean[1], -10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_singular_innovation() {
        let zero = Gaussian::new(na::SVector::<f64, N_X>::zeros(), Cov::<N_X>::zeros());
        let noise = LaserNoise {
            std_px: 0.0,
            std_py: 0.0,
        };
        assert_eq!(
            update(&zero, &na::vector![1.0, 1.0], &noise),
            Err(FilterError::SingularCovariance {
                sensor: SensorKind::Laser
            })
        );
    }
}
