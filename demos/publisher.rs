//! Sparkplug B Edge Node Publisher Example
//!
//! Announces one edge node and one device, then publishes simulated
//! readings every 5 seconds until Ctrl+C. On shutdown the node publishes
//! NDEATH exactly once before disconnecting.
//!
//! Run against a local broker with `RUST_LOG=info cargo run --example publisher`.

use log::{info, warn};
use rand::Rng;
use sparkplug_edge::{
    DataSet, DataType, Metric, PropertySet, Publisher, PublisherConfig, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PUBLISH_INTERVAL: Duration = Duration::from_secs(5);

fn node_metrics() -> Vec<Metric> {
    let history = DataSet::new(
        ["timestamp", "value", "quality"],
        [DataType::String, DataType::Double, DataType::Int32],
    );

    let engineering = PropertySet::new()
        .with("engUnit", "Celsius")
        .with("engHigh", 100.0)
        .with("engLow", -40.0);

    vec![
        Metric::new("Node Control/Rebirth", false),
        Metric::new("Node Control/Reboot", false),
        Metric::new("Node Control/Next Server", false),
        Metric::new("Properties/Version", "v1.0.0"),
        Metric::new("Properties/Vendor", "Example Industries"),
        Metric::new("DataSet Example", history),
        Metric::new("Sensor/Temperature", 23.45).with_properties(engineering),
    ]
}

fn device_metrics() -> Vec<Metric> {
    vec![
        Metric::new("Device Control/Rebirth", false),
        Metric::new("Device Control/Reboot", false),
        Metric::new("Sensors/Temperature", 25.6),
        Metric::new("Sensors/Humidity", 60.0),
        Metric::new("Sensors/Pressure", 1013.25),
        Metric::new("Status/Battery", 85i32),
        Metric::new("Status/Connected", true),
    ]
}

fn simulated_device_data(rng: &mut impl Rng) -> Vec<Metric> {
    vec![
        Metric::new("Sensors/Temperature", 25.6 + rng.random_range(0.0..10.0)),
        Metric::new("Sensors/Humidity", 60.0 + rng.random_range(0.0..20.0)),
        Metric::new("Status/Battery", 85 - rng.random_range(0..10i32)),
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Sparkplug B Edge Node Publisher Example");
    println!("=======================================\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .expect("Error setting Ctrl-C handler");

    let config = PublisherConfig::default();
    let device_id = config
        .device_id
        .clone()
        .unwrap_or_else(|| "Device-001".to_string());

    let mut publisher = Publisher::with_mqtt(config)?;
    publisher.connect()?;
    println!("[OK] Connected to broker");

    let seq = publisher.publish_birth(node_metrics())?;
    println!("[OK] Published NBIRTH (seq: {})", seq);

    let seq = publisher.publish_device_birth(&device_id, device_metrics())?;
    println!("[OK] Published DBIRTH for {} (seq: {})", device_id, seq);

    println!("\nPublishing data every {:?}. Press Ctrl+C to exit.", PUBLISH_INTERVAL);

    let mut rng = rand::rng();
    let mut last_publish = Instant::now();
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
        if last_publish.elapsed() < PUBLISH_INTERVAL {
            continue;
        }
        last_publish = Instant::now();

        // Failed publishes are logged by the publisher; keep going
        if let Err(e) = publisher.publish_data(vec![Metric::new("Properties/Version", "v1.0.0")]) {
            warn!("NDATA skipped: {}", e);
        }
        if let Err(e) = publisher.publish_device_data(&device_id, simulated_device_data(&mut rng)) {
            warn!("DDATA skipped: {}", e);
        }
        info!("Published data (seq: {})", publisher.seq());
    }

    println!("\nShutting down...");
    match publisher.publish_death() {
        Ok(seq) => println!("[OK] Published NDEATH (seq: {})", seq),
        Err(e) => println!("[WARN] NDEATH failed: {}", e),
    }
    publisher.disconnect()?;
    println!("[OK] Disconnected");
    println!("  Total payloads: {}", publisher.counter());

    Ok(())
}
