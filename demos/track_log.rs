extern crate nalgebra as na;

use anyhow::{Context, Result};
use std::fs::File;
use ukf_fusion::metrics::{cartesian, rmse};
use ukf_fusion::nis::NisMonitor;
use ukf_fusion::record::read_log;
use ukf_fusion::{SensorKind, UkfConfig, UnscentedKalmanFilter};

// MARK: - Constants
const INPUT: &str = "data/sample-laser-radar.txt";
const OUTPUT: &str = "logs/track_log.csv";

// 使い方: track_log [入力ログ] [出力csv] [laser|radar|both]
fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args: Vec<String> = std::env::args().collect();
    let input = args.get(1).map_or(INPUT, String::as_str);
    let output = args.get(2).map_or(OUTPUT, String::as_str);
    let (use_laser, use_radar) = match args.get(3).map(String::as_str) {
        None | Some("both") => (true, true),
        Some("laser") => (true, false),
        Some("radar") => (false, true),
        Some(other) => anyhow::bail!("unknown sensor selection {other:?}"),
    };

    let file = File::open(input).with_context(|| format!("failed to open {input}"))?;
    let entries = read_log(file)?;
    log::info!("{} measurements from {input}", entries.len());

    let config = UkfConfig::default().with_sensors(use_laser, use_radar);
    let mut ukf = UnscentedKalmanFilter::new(config)?;
    if let Some(dir) = std::path::Path::new(output).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record([
        "time", "sensor", "px", "py", "v", "yaw", "yaw_rate", "nis", "gt_px", "gt_py", "gt_vx",
        "gt_vy",
    ])?;

    let mut monitor = NisMonitor::new();
    let mut est = Vec::new();
    let mut truth = Vec::new();
    for entry in &entries {
        let kind = entry.package.sensor_kind();
        if let Err(e) = ukf.process_measurement(&entry.package) {
            log::warn!("skipped {kind} at {} us: {e}", entry.package.timestamp_us);
            continue;
        }

        let x = ukf.state();
        let nis = ukf.nis(kind);
        if let Some(v) = nis {
            monitor.record(kind, v);
        }
        if let Some(gt) = entry.truth {
            est.push(cartesian(&x));
            truth.push(gt.as_vector());
        }

        let time = chrono::DateTime::from_timestamp_micros(entry.package.timestamp_us)
            .map_or_else(|| entry.package.timestamp_us.to_string(), |t| t.to_rfc3339());
        let gt = entry.truth.map(|t| t.as_vector());
        let gt_field = |i: usize| gt.map_or_else(String::new, |g| g[i].to_string());
        wtr.write_record(&[
            time,
            kind.to_string(),
            x[0].to_string(),
            x[1].to_string(),
            x[2].to_string(),
            x[3].to_string(),
            x[4].to_string(),
            nis.map_or_else(String::new, |v| v.to_string()),
            gt_field(0),
            gt_field(1),
            gt_field(2),
            gt_field(3),
        ])?;
    }
    wtr.flush()?;

    print_summary(&monitor, rmse(&est, &truth));
    Ok(())
}

// MARK: - Print
fn print_summary(monitor: &NisMonitor, rmse: Option<na::Vector4<f64>>) {
    if let Some(r) = rmse {
        println!(
            "rmse: [px {:.4}, py {:.4}, vx {:.4}, vy {:.4}]",
            r[0], r[1], r[2], r[3]
        );
    }
    for kind in [SensorKind::Laser, SensorKind::Radar] {
        if let (Some(mean), Some(ratio)) = (monitor.mean(kind), monitor.exceed_ratio(kind)) {
            println!(
                "nis {kind}: mean {mean:.3}, over 95% {:.1}%",
                ratio * 100.0
            );
        }
    }
}
