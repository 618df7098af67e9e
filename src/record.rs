//! Tab-separated measurement logs.
//!
//! One measurement per line, sensor tag first:
//!
//! ```text
//! L	px	py	timestamp_us	[gt_px	gt_py	gt_vx	gt_vy ...]
//! R	range	bearing	range_rate	timestamp_us	[gt_px	gt_py	gt_vx	gt_vy ...]
//! ```
//!
//! Anything after the four ground-truth columns is ignored.

use std::io::Read;

use crate::error::FilterError;
use crate::measurement::{MeasurementPackage, SensorKind};
use crate::metrics::GroundTruth;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("line {line}: {source}")]
    Measurement { line: u64, source: FilterError },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    pub package: MeasurementPackage,
    pub truth: Option<GroundTruth>,
}

pub fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

/// Reads every entry of a log.
pub fn read_log<R: Read>(rdr: R) -> Result<Vec<LogEntry>, RecordError> {
    reader(rdr)
        .records()
        .map(|record| parse_record(&record?))
        .collect()
}

pub fn parse_record(record: &csv::StringRecord) -> Result<LogEntry, RecordError> {
    let line = record.position().map_or(0, |p| p.line());
    let parse_err = |message: String| RecordError::Parse { line, message };

    let kind = match record.get(0) {
        Some("L") => SensorKind::Laser,
        Some("R") => SensorKind::Radar,
        Some(tag) => return Err(parse_err(format!("unknown sensor tag {tag:?}"))),
        None => return Err(parse_err("empty record".to_string())),
    };
    let n = kind.dim();
    if record.len() < n + 2 {
        return Err(parse_err(format!(
            "{kind} record needs {} fields, got {}",
            n + 2,
            record.len()
        )));
    }

    let field = |i: usize| -> Result<f64, RecordError> {
        let s = &record[i];
        s.parse::<f64>()
            .map_err(|e| parse_err(format!("field {i} {s:?}: {e}")))
    };
    let values = (1..=n).map(&field).collect::<Result<Vec<_>, _>>()?;
    let timestamp_us = record[n + 1]
        .parse::<i64>()
        .map_err(|e| parse_err(format!("timestamp {:?}: {e}", &record[n + 1])))?;
    let package = MeasurementPackage::from_raw(kind, &values, timestamp_us)
        .map_err(|source| RecordError::Measurement { line, source })?;

    let truth = if record.len() >= n + 6 {
        Some(GroundTruth {
            px: field(n + 2)?,
            py: field(n + 3)?,
            vx: field(n + 4)?,
            vy: field(n + 5)?,
        })
    } else {
        None
    };

    Ok(LogEntry { package, truth })
}
