//! Constant turn rate and velocity (CTRV) motion model.

use crate::sigma::state_part;
use crate::{AugState, Sigma, State, N_AUG, N_SIGMA, N_X};

/// Below this yaw rate the straight-line limit is used.
pub const MIN_YAW_RATE: f64 = 1e-3;

/// Propagates one augmented sigma point `[px, py, v, yaw, yawd, nu_a, nu_yawdd]`
/// forward by `dt` seconds and returns the 5-dim state.
pub fn propagate(aug: &AugState, dt: f64) -> State {
    let x = state_part(aug);
    let (v, yaw, yawd) = (x[2], x[3], x[4]);
    let (nu_a, nu_yawdd) = (aug[N_X], aug[N_X + 1]);

    let (dx, dy) = if yawd.abs() > MIN_YAW_RATE {
        arc_displacement(v, yaw, yawd, dt)
    } else {
        straight_displacement(v, yaw, dt)
    };

    // ノイズの加算
    let dt2 = 0.5 * dt * dt;
    na::vector![
        x[0] + dx + dt2 * yaw.cos() * nu_a,
        x[1] + dy + dt2 * yaw.sin() * nu_a,
        v + dt * nu_a,
        yaw + yawd * dt + dt2 * nu_yawdd,
        yawd + dt * nu_yawdd
    ]
}

/// Exact position change along a circular arc.
fn arc_displacement(v: f64, yaw: f64, yawd: f64, dt: f64) -> (f64, f64) {
    let r = v / yawd;
    let yaw_end = yaw + yawd * dt;
    (r * (yaw_end.sin() - yaw.sin()), r * (yaw.cos() - yaw_end.cos()))
}

fn straight_displacement(v: f64, yaw: f64, dt: f64) -> (f64, f64) {
    (v * yaw.cos() * dt, v * yaw.sin() * dt)
}

/// Runs every augmented sigma point through the model.
pub fn predict_sigma_points(aug_sigmas: &Sigma<N_AUG>, dt: f64) -> Sigma<N_X> {
    let mut pred = Sigma::<N_X>::zeros();
    for i in 0..N_SIGMA {
        pred.set_column(i, &propagate(&aug_sigmas.column(i).into_owned(), dt));
    }
    pred
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn aug(x: [f64; 5], nu_a: f64, nu_yawdd: f64) -> AugState {
        na::vector![x[0], x[1], x[2], x[3], x[4], nu_a, nu_yawdd]
    }

    #[test]
    fn test_straight_line() {
        let x = propagate(&aug([1.0, 2.0, 3.0, 0.0, 0.0], 0.0, 0.0), 0.5);
        assert_relative_eq!(x, na::vector![2.5, 2.0, 3.0, 0.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn() {
        // 半径 1 の円を 1/4 周
        let x = propagate(&aug([0.0, 0.0, FRAC_PI_2, 0.0, FRAC_PI_2], 0.0, 0.0), 1.0);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[3], FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(x[4], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_noise_terms() {
        let x = propagate(&aug([0.0, 0.0, 0.0, 0.0, 0.0], 2.0, 1.0), 0.1);
        assert_relative_eq!(x[0], 0.5 * 0.01 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 0.2, epsilon = 1e-12);
        assert_relative_eq!(x[3], 0.5 * 0.01, epsilon = 1e-12);
        assert_relative_eq!(x[4], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_arc_converges_to_straight_line() {
        let (ax, ay) = arc_displacement(1.0, 0.3, 1e-4, 1.0);
        let (sx, sy) = straight_displacement(1.0, 0.3, 1.0);
        assert!((ax - sx).abs() < 1e-3);
        assert!((ay - sy).abs() < 1e-3);
        let (ax, ay) = arc_displacement(1.0, 0.3, 1e-7, 1.0);
        assert_relative_eq!(ax, sx, epsilon = 1e-6);
        assert_relative_eq!(ay, sy, epsilon = 1e-6);
    }

    #[test]
    fn test_predict_sigma_points_drops_noise_rows() {
        let mut aug_sigmas = Sigma::<N_AUG>::zeros();
        for i in 0..N_SIGMA {
            aug_sigmas.set_column(i, &aug([i as f64, 0.0, 1.0, 0.0, 0.0], 0.0, 0.0));
        }
        let pred = predict_sigma_points(&aug_sigmas, 1.0);
        assert_eq!(pred.nrows(), N_X);
        for i in 0..N_SIGMA {
            assert_relative_eq!(pred[(0, i)], i as f64 + 1.0, epsilon = 1e-12);
        }
    }
}
