//! Sigma-point generation and the unscented mean/covariance recovery.
//!
//! Spreading follows `lambda = 3 - n` where `n` is the dimension of the
//! distribution being sampled, giving `2n + 1` points: the mean, then `n`
//! "+spread" columns, then `n` "-spread" columns.

use crate::angle::normalize_angle;
use crate::error::{FilterError, Result};
use crate::gaussian::Gaussian;
use crate::{AugState, Cov, Sigma, State, Weights, N_AUG, N_SIGMA, N_X};

/// Spreading parameter for a distribution of dimension `n`.
pub fn lambda(n: usize) -> f64 {
    3.0 - n as f64
}

/// Weights for `M = 2n + 1` sigma points. They always sum to one.
pub fn sigma_weights<const M: usize>() -> na::SVector<f64, M> {
    let n = (M - 1) / 2;
    let lambda = lambda(n);
    let mut w = na::SVector::<f64, M>::from_element(0.5 / (lambda + n as f64));
    w[0] = lambda / (lambda + n as f64);
    w
}

/// Deterministic `2N + 1` sigma points for a Gaussian of dimension `N`.
///
/// Fails when the covariance has no Cholesky factor.
pub fn sigma_points<const N: usize, const M: usize>(
    dist: &Gaussian<N>,
) -> Result<na::SMatrix<f64, N, M>> {
    debug_assert_eq!(M, 2 * N + 1);
    let stage = "sigma point generation";
    if !dist.is_finite() {
        return Err(FilterError::NumericalInstability { stage });
    }
    let l = dist
        .cov
        .cholesky()
        .ok_or(FilterError::NumericalInstability { stage })?
        .unpack();
    let scale = (lambda(N) + N as f64).sqrt();

    let mut sigmas = na::SMatrix::<f64, N, M>::zeros();
    sigmas.set_column(0, &dist.mean);
    for i in 0..N {
        sigmas.set_column(1 + i, &(dist.mean + scale * l.column(i)));
        sigmas.set_column(1 + N + i, &(dist.mean - scale * l.column(i)));
    }
    Ok(sigmas)
}

/// Augments the state belief with the two zero-mean process noise terms.
pub fn augment(belief: &Gaussian<N_X>, std_a: f64, std_yawdd: f64) -> Gaussian<N_AUG> {
    let mut mean = AugState::zeros();
    mean.fixed_rows_mut::<N_X>(0).copy_from(&belief.mean);

    let mut cov = Cov::<N_AUG>::zeros();
    cov.fixed_view_mut::<N_X, N_X>(0, 0).copy_from(&belief.cov);
    cov[(N_X, N_X)] = std_a * std_a;
    cov[(N_X + 1, N_X + 1)] = std_yawdd * std_yawdd;

    Gaussian::new(mean, cov)
}

/// The 7x15 augmented sigma-point matrix for the current belief.
pub fn augmented_sigma_points(
    belief: &Gaussian<N_X>,
    std_a: f64,
    std_yawdd: f64,
) -> Result<Sigma<N_AUG>> {
    let sigmas = sigma_points::<N_AUG, N_SIGMA>(&augment(belief, std_a, std_yawdd))?;
    log::trace!("augmented sigma points: {sigmas:.4}");
    Ok(sigmas)
}

/// Weighted mean and covariance of a sigma-point set.
///
/// `angle_row`, if given, is normalized into `(-PI, PI]` in every
/// difference before it enters the covariance.
pub fn recover<const R: usize>(
    sigmas: &Sigma<R>,
    weights: &Weights,
    angle_row: Option<usize>,
) -> Gaussian<R> {
    let mean = sigmas * weights;
    let mut cov = Cov::<R>::zeros();
    for i in 0..N_SIGMA {
        let diff = residual(&sigmas.column(i).into_owned(), &mean, angle_row);
        cov += weights[i] * diff * diff.transpose();
    }
    Gaussian::new(mean, cov)
}

/// `a - b` with the angle component wrapped.
pub fn residual<const R: usize>(
    a: &na::SVector<f64, R>,
    b: &na::SVector<f64, R>,
    angle_row: Option<usize>,
) -> na::SVector<f64, R> {
    let mut diff = a - b;
    if let Some(row) = angle_row {
        diff[row] = normalize_angle(diff[row]);
    }
    diff
}

/// Drops the noise rows of an augmented sigma point.
pub fn state_part(aug: &AugState) -> State {
    aug.fixed_rows::<N_X>(0).into_owned()
}
