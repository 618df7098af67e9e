extern crate nalgebra as na;

use anyhow::Result;
use rayon::prelude::*;
use ukf_fusion::metrics::{cartesian, rmse};
use ukf_fusion::nis::NisMonitor;
use ukf_fusion::simulation::Scenario;
use ukf_fusion::{SensorKind, UkfConfig, UnscentedKalmanFilter};

// MARK: - Constants
// 試行回数
const RUNS: u64 = 200;
const STD_A: f64 = 2.5;
const STD_YAWDD: f64 = 1.0;

struct Trial {
    rmse: na::Vector4<f64>,
    nis: NisMonitor,
}

// 使い方: monte_carlo [試行回数] [std_a] [std_yawdd]
fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    let args: Vec<String> = std::env::args().collect();
    let runs = args.get(1).map_or(Ok(RUNS), |s| s.parse())?;
    let std_a = args.get(2).map_or(Ok(STD_A), |s| s.parse())?;
    let std_yawdd = args.get(3).map_or(Ok(STD_YAWDD), |s| s.parse())?;

    let config = UkfConfig::default()
        .with_sensors(true, true)
        .with_process_noise(std_a, std_yawdd);
    config.validate()?;

    let start = std::time::Instant::now();
    let trials = (0..runs)
        .into_par_iter()
        .map(|seed| run(config, seed))
        .collect::<Result<Vec<_>>>()?;

    let mut worst = na::Vector4::<f64>::zeros();
    let mut mean = na::Vector4::<f64>::zeros();
    for t in &trials {
        worst = worst.sup(&t.rmse);
        mean += t.rmse / trials.len() as f64;
    }
    let nis = trials
        .into_iter()
        .fold(NisMonitor::new(), |acc, t| acc.merge(t.nis));

    println!("{runs} runs in {:.2} sec", start.elapsed().as_secs_f64());
    println!("std_a: {std_a}, std_yawdd: {std_yawdd}");
    println!(
        "rmse mean:  [{:.4}, {:.4}, {:.4}, {:.4}]",
        mean[0], mean[1], mean[2], mean[3]
    );
    println!(
        "rmse worst: [{:.4}, {:.4}, {:.4}, {:.4}]",
        worst[0], worst[1], worst[2], worst[3]
    );
    for kind in [SensorKind::Laser, SensorKind::Radar] {
        if let (Some(m), Some(r)) = (nis.mean(kind), nis.exceed_ratio(kind)) {
            println!("nis {kind}: mean {m:.3}, over 95% {:.1}%", r * 100.0);
        }
    }
    Ok(())
}

fn run(config: UkfConfig, seed: u64) -> Result<Trial> {
    let steps = Scenario::default().with_seed(seed).simulate()?;
    let mut ukf = UnscentedKalmanFilter::new(config)?;
    let mut nis = NisMonitor::new();
    let mut est = Vec::with_capacity(steps.len());
    let mut truth = Vec::with_capacity(steps.len());
    for step in &steps {
        ukf.process_measurement(&step.package)?;
        let kind = step.package.sensor_kind();
        if let Some(v) = ukf.nis(kind) {
            nis.record(kind, v);
        }
        est.push(cartesian(&ukf.state()));
        truth.push(step.truth.as_vector());
    }
    let rmse = rmse(&est, &truth).ok_or_else(|| anyhow::anyhow!("empty run {seed}"))?;
    Ok(Trial { rmse, nis })
}
