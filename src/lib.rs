extern crate nalgebra as na;

pub mod angle;
pub mod config;
pub mod ctrv;
pub mod error;
pub mod gaussian;
pub mod lidar;
pub mod measurement;
pub mod metrics;
pub mod nis;
pub mod packet;
pub mod radar;
pub mod record;
pub mod sigma;
pub mod simulation;
pub mod ukf;

pub use config::UkfConfig;
pub use error::{FilterError, Result};
pub use gaussian::Gaussian;
pub use measurement::{Measurement, MeasurementPackage, SensorKind};
pub use ukf::UnscentedKalmanFilter;

// 状態空間の次元
pub const N_X: usize = 5;
// 拡張状態の次元 (加速度ノイズ, ヨー角加速度ノイズ)
pub const N_AUG: usize = 7;
// シグマ点の数
pub const N_SIGMA: usize = 2 * N_AUG + 1;

/// Row of the heading in the state vector.
pub const YAW: usize = 3;

/// `[px, py, v, yaw, yaw_rate]`
pub type State = na::SVector<f64, N_X>;
pub type AugState = na::SVector<f64, N_AUG>;
pub type Cov<const N: usize> = na::SMatrix<f64, N, N>;
pub type Sigma<const R: usize> = na::SMatrix<f64, R, N_SIGMA>;
pub type Weights = na::SVector<f64, N_SIGMA>;

/// Result of fusing one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub belief: Gaussian<N_X>,
    /// Normalized innovation squared of the measurement.
    pub nis: f64,
}
