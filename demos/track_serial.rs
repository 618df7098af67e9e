use anyhow::Result;
use std::io::{BufRead, BufReader};
use std::time::{Duration, Instant};
use ukf_fusion::packet::{EstimateFrame, MeasurementFrame};
use ukf_fusion::{MeasurementPackage, UkfConfig, UnscentedKalmanFilter};

// MARK: - Constants
const PORT: &str = "/dev/ttyUSB0";
const BAUD_RATE: u32 = 115_200;

type Port = Box<dyn serialport::SerialPort>;

// 使い方: track_serial [ポート] [ボーレート]
fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args: Vec<String> = std::env::args().collect();
    let path = args.get(1).map_or(PORT, String::as_str);
    let baud_rate = args.get(2).map_or(Ok(BAUD_RATE), |s| s.parse())?;

    let mut port = serialport::new(path, baud_rate)
        .timeout(Duration::from_millis(10))
        .open()?;
    let mut reader = BufReader::new(port.try_clone()?);
    log::info!("listening on {path} at {baud_rate} baud");

    let mut ukf = UnscentedKalmanFilter::new(UkfConfig::default().with_sensors(true, true))?;
    let start = Instant::now();
    loop {
        // データが読み込まれるまで待機
        let Some(frame) = read(&mut reader) else {
            continue;
        };
        let package = match MeasurementPackage::try_from(frame) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("dropped frame: {e}");
                continue;
            }
        };
        if let Err(e) = ukf.process_measurement(&package) {
            log::warn!("{e}");
            continue;
        }
        if let Some(est) = EstimateFrame::from_filter(&ukf) {
            write(&mut port, &est)?;
            print_estimate(start, &package, &est);
        }
    }
}

// MARK: - UART
fn write(port: &mut Port, e: &EstimateFrame) -> Result<()> {
    let cobs = e.as_cobs();
    port.write_all(&cobs)?;
    Ok(())
}
fn read(reader: &mut BufReader<Port>) -> Option<MeasurementFrame> {
    let mut buf = Vec::new();
    reader.read_until(0x00, &mut buf).ok()?;
    MeasurementFrame::from_stream(&buf)
}

// MARK: - Print
fn print_estimate(start: Instant, package: &MeasurementPackage, e: &EstimateFrame) {
    let x = &e.state;
    print!("\x1b[36m{:5}: \x1b[m", package.sensor_kind().to_string());
    print!("t: {:5.2} ", start.elapsed().as_secs_f64());
    print!(
        "est: [{:6.2}, {:6.2}, {:5.2}, {:4.0}, {:5.2}] ",
        x[0],
        x[1],
        x[2],
        x[3].to_degrees(),
        x[4]
    );
    print!(
        "p: [{:6.3}, {:6.3}, {:6.3}, {:6.3}, {:6.3}]",
        e.variance[0], e.variance[1], e.variance[2], e.variance[3], e.variance[4]
    );
    println!();
}
