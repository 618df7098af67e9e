use crate::error::{FilterError, Result};

/// Multivariate normal belief: mean and covariance of dimension `N`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian<const N: usize> {
    pub mean: na::SVector<f64, N>,
    pub cov: na::SMatrix<f64, N, N>,
}

impl<const N: usize> Gaussian<N> {
    pub fn new(mean: na::SVector<f64, N>, cov: na::SMatrix<f64, N, N>) -> Self {
        Self { mean, cov }
    }

    pub fn is_finite(&self) -> bool {
        self.mean.iter().chain(self.cov.iter()).all(|v| v.is_finite())
    }

    /// Returns `self` unchanged if every entry is finite.
    pub fn finite_or(self, stage: &'static str) -> Result<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(FilterError::NumericalInstability { stage })
        }
    }

    // 対称性の維持
    pub fn symmetrized(mut self) -> Self {
        self.cov = (self.cov + self.cov.transpose()) / 2.0;
        self
    }
}

impl<const N: usize> Default for Gaussian<N> {
    fn default() -> Self {
        Self {
            mean: na::SVector::zeros(),
            cov: na::SMatrix::identity(),
        }
    }
}
