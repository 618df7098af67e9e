//! Seeded CTRV scenarios with noisy laser/radar measurements.
//!
//! The object moves noise-free along a constant turn rate and velocity path;
//! even steps produce a laser fix and odd steps a radar return.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::{LaserNoise, RadarNoise};
use crate::ctrv::propagate;
use crate::error::{FilterError, Result};
use crate::measurement::MeasurementPackage;
use crate::metrics::{cartesian, GroundTruth};
use crate::{AugState, State, N_X};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    /// True initial `[px, py, v, yaw, yaw_rate]`.
    pub initial: State,
    pub start_us: i64,
    pub dt_us: i64,
    pub steps: usize,
    pub seed: u64,
    pub laser: LaserNoise,
    pub radar: RadarNoise,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            initial: na::vector![0.6, 0.6, 5.2, 0.0, 0.3],
            start_us: 1_477_010_443_000_000,
            dt_us: 50_000,
            steps: 500,
            seed: 0,
            laser: LaserNoise::default(),
            radar: RadarNoise::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedStep {
    pub package: MeasurementPackage,
    pub truth: GroundTruth,
}

impl Scenario {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// True state at every step.
    pub fn trajectory(&self) -> Vec<State> {
        let dt = self.dt_us as f64 / 1e6;
        let mut x = self.initial;
        let mut states = Vec::with_capacity(self.steps);
        for i in 0..self.steps {
            if i > 0 {
                let mut aug = AugState::zeros();
                aug.fixed_rows_mut::<N_X>(0).copy_from(&x);
                x = propagate(&aug, dt);
            }
            states.push(x);
        }
        states
    }

    pub fn simulate(&self) -> Result<Vec<SimulatedStep>> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let normal = |std: f64| {
            Normal::new(0.0, std)
                .map_err(|e| FilterError::InvalidConfig(format!("noise {std}: {e}")))
        };
        let (n_px, n_py) = (normal(self.laser.std_px)?, normal(self.laser.std_py)?);
        let (n_r, n_phi, n_rd) = (
            normal(self.radar.std_range)?,
            normal(self.radar.std_bearing)?,
            normal(self.radar.std_range_rate)?,
        );

        let steps = self
            .trajectory()
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let t = self.start_us + i as i64 * self.dt_us;
                let c = cartesian(x);
                let truth = GroundTruth {
                    px: c[0],
                    py: c[1],
                    vx: c[2],
                    vy: c[3],
                };
                let package = if i % 2 == 0 {
                    MeasurementPackage::laser(
                        t,
                        truth.px + n_px.sample(&mut rng),
                        truth.py + n_py.sample(&mut rng),
                    )
                } else {
                    let range = truth.px.hypot(truth.py);
                    let range_rate = (truth.px * truth.vx + truth.py * truth.vy) / range;
                    MeasurementPackage::radar(
                        t,
                        range + n_r.sample(&mut rng),
                        truth.py.atan2(truth.px) + n_phi.sample(&mut rng),
                        range_rate + n_rd.sample(&mut rng),
                    )
                };
                SimulatedStep { package, truth }
            })
            .collect();
        Ok(steps)
    }
}
