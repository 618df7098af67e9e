//! Fixed-layout frames for a COBS-framed serial link.
//!
//! Frames are `#[repr(C)]` plain-old-data encoded with COBS, `0x00`
//! terminated.

use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::error::{FilterError, Result};
use crate::measurement::{Measurement, MeasurementPackage, SensorKind};
use crate::UnscentedKalmanFilter;

const TAG_LASER: u32 = 0;
const TAG_RADAR: u32 = 1;

/// Measurement as sent by the sensor side. Laser frames leave `values[2]` at 0.
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct MeasurementFrame {
    pub timestamp_us: i64,
    pub sensor: u32,
    pub reserved: u32,
    pub values: [f64; 3],
}

/// Filter output: state and the diagonal of its covariance.
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct EstimateFrame {
    pub timestamp_us: i64,
    pub state: [f64; 5],
    pub variance: [f64; 5],
}

macro_rules! impl_cobs {
    ($t:ty) => {
        impl $t {
            pub const SIZE: usize = std::mem::size_of::<Self>();
            pub const BUF_SIZE: usize = Self::SIZE + 2;

            // cobsバイト列に変換
            pub fn as_cobs(&self) -> [u8; Self::BUF_SIZE] {
                let mut buf = [0u8; Self::SIZE];
                buf.copy_from_slice(self.as_bytes());
                cobs_rs::stuff(buf, 0)
            }
            // cobsバイト列から復元
            pub fn from_cobs(buf: &[u8; Self::BUF_SIZE]) -> Option<Self> {
                let (raw, _): ([u8; Self::SIZE], _) = cobs_rs::unstuff(*buf, 0);
                Self::read_from(&raw)
            }
            /// Decodes the last complete frame of a `0x00`-terminated chunk.
            pub fn from_stream(chunk: &[u8]) -> Option<Self> {
                let len = chunk.len();
                if len < Self::BUF_SIZE {
                    return None;
                }
                let buf: [u8; Self::BUF_SIZE] = chunk[len - Self::BUF_SIZE..].try_into().ok()?;
                Self::from_cobs(&buf)
            }
        }
    };
}

impl_cobs!(MeasurementFrame);
impl_cobs!(EstimateFrame);

impl From<&MeasurementPackage> for MeasurementFrame {
    fn from(p: &MeasurementPackage) -> Self {
        let (sensor, values) = match p.measurement {
            Measurement::Laser { px, py } => (TAG_LASER, [px, py, 0.0]),
            Measurement::Radar {
                range,
                bearing,
                range_rate,
            } => (TAG_RADAR, [range, bearing, range_rate]),
        };
        Self {
            timestamp_us: p.timestamp_us,
            sensor,
            reserved: 0,
            values,
        }
    }
}

impl TryFrom<MeasurementFrame> for MeasurementPackage {
    type Error = FilterError;

    fn try_from(f: MeasurementFrame) -> Result<Self> {
        let kind = match f.sensor {
            TAG_LASER => SensorKind::Laser,
            TAG_RADAR => SensorKind::Radar,
            tag => {
                return Err(FilterError::InvalidMeasurement(format!(
                    "unknown sensor tag {tag}"
                )))
            }
        };
        MeasurementPackage::from_raw(kind, &f.values[..kind.dim()], f.timestamp_us)
    }
}

impl EstimateFrame {
    /// `None` until the filter has seen its first measurement.
    pub fn from_filter(ukf: &UnscentedKalmanFilter) -> Option<Self> {
        let timestamp_us = ukf.time_us()?;
        let x = ukf.state();
        let p = ukf.covariance();
        Some(Self {
            timestamp_us,
            state: x.into(),
            variance: p.diagonal().into(),
        })
    }
}
