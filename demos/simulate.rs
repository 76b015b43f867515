//! Simulated soil-moisture sensor
//!
//! Feeds a slowly drying and re-watered sensor curve into the monitor and
//! prints every outbound notification.
//!
//! Run with: cargo run --example simulate

use plant_monitor::{
    AdcConfig, ChannelNotifier, LevelConfig, MonitorConfig, Notification, PlantMonitor, Result,
    SensorConfig, WatchdogConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plant_monitor=info".into()),
        )
        .init();

    println!("Plant Monitor Simulation");
    println!("========================\n");

    let config = demo_config();
    let (notifier, mut outbound) = ChannelNotifier::channel();
    let mut monitor = PlantMonitor::new(&config, Arc::new(notifier))?;
    let snapshots = monitor.subscribe_snapshot();

    // Outbound transport stand-in
    let printer = tokio::spawn(async move {
        while let Some(notification) = outbound.recv().await {
            print_notification(&notification);
        }
    });

    let (tx, readings) = mpsc::channel(16);

    // Sensor stand-in: dries out from wet to dry, gets watered, goes silent
    let sensor = tokio::spawn(async move {
        let mut raw = 1600;
        for _ in 0..40 {
            if tx.send(raw).await.is_err() {
                return;
            }
            raw += 60;
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        for raw in [1700, 1690, 1710] {
            if tx.send(raw).await.is_err() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        println!("\nSensor goes silent...");
        tokio::time::sleep(Duration::from_secs(4)).await;
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => println!("\n\nExiting..."),
        _ = monitor.run(readings) => {}
    }
    monitor.shutdown().await;

    if let Some(snapshot) = *snapshots.borrow() {
        println!(
            "\nLast reading: {} % ({}) at {}, {} s ago",
            snapshot.value(),
            snapshot.reading.direction,
            snapshot.last_updated.format("%H:%M:%S"),
            snapshot.age().num_seconds()
        );
    }

    sensor.abort();
    drop(monitor);
    let _ = printer.await;

    Ok(())
}

fn demo_config() -> MonitorConfig {
    let level = |name: &str, start, end, notification_interval| LevelConfig {
        name: name.to_string(),
        start,
        end,
        notification_interval,
    };

    MonitorConfig {
        sensor: SensorConfig {
            adc: AdcConfig {
                raw_lower_bound: 1491,
                raw_upper_bound: 3624,
                raw_noise_margin: 90,
            },
            moving_average_len: 3,
        },
        levels: vec![
            level("low", 0, 30, 1),
            level("normal", 31, 66, 0),
            level("high", 67, 100, 2),
        ],
        watchdog: WatchdogConfig { timeout: 2 },
    }
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::LevelChanged {
            level,
            direction,
            value,
        } => println!("[level]    {} ({}) - moisture {} %", level.name, direction, value),
        Notification::Reminder { level, value } => {
            println!("[reminder] still {} - moisture {} %", level.name, value)
        }
        Notification::SensorStale { timeout } => {
            println!("[warning]  no sensor data for {:?}", timeout)
        }
    }
}
