use crate::State;

/// True position and cartesian velocity of the object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundTruth {
    pub px: f64,
    pub py: f64,
    pub vx: f64,
    pub vy: f64,
}

impl GroundTruth {
    pub fn as_vector(&self) -> na::Vector4<f64> {
        na::vector![self.px, self.py, self.vx, self.vy]
    }
}

/// `[px, py, vx, vy]` of a CTRV state.
pub fn cartesian(x: &State) -> na::Vector4<f64> {
    let (sin, cos) = x[3].sin_cos();
    na::vector![x[0], x[1], x[2] * cos, x[2] * sin]
}

/// Component-wise root mean squared error.
///
/// `None` if the inputs are empty or of different length.
pub fn rmse(
    estimations: &[na::Vector4<f64>],
    truths: &[na::Vector4<f64>],
) -> Option<na::Vector4<f64>> {
    if estimations.is_empty() || estimations.len() != truths.len() {
        return None;
    }
    let sum = estimations
        .iter()
        .zip(truths)
        .map(|(e, t)| (e - t).map(|d| d * d))
        .fold(na::Vector4::<f64>::zeros(), |acc, d| acc + d);
    Some((sum / estimations.len() as f64).map(f64::sqrt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_cartesian() {
        let c = cartesian(&na::vector![1.0, 2.0, 3.0, FRAC_PI_2, 0.5]);
        assert_relative_eq!(c, na::vector![1.0, 2.0, 0.0, 3.0], epsilon = 1e-12);
    }

    #[test]
    fn test_rmse() {
        let est = [na::vector![1.0, 1.0, 0.0, 0.0], na::vector![3.0, 1.0, 0.0, 2.0]];
        let truth = [na::Vector4::zeros(), na::vector![3.0, 0.0, 0.0, 0.0]];
        let r = rmse(&est, &truth).unwrap();
        assert_relative_eq!(
            r,
            na::vector![0.5_f64.sqrt(), 1.0, 0.0, 2.0_f64.sqrt()],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rmse_bad_input() {
        assert!(rmse(&[], &[]).is_none());
        assert!(rmse(&[na::Vector4::zeros()], &[]).is_none());
    }
}
