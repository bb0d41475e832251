//! Example: Watching Energy Flows
//!
//! This example connects to Home Assistant, subscribes to the default
//! sensors and prints the derived state and active flows on every update.
//! Without arguments it runs against the built-in demo household.
//!
//! Run with: `cargo run --example watch_flows -- <HA_URL> <TOKEN>`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use solarflow_core::{
    ConnectionConfig, DashboardSession, DemoConnector, HassConnector, SensorMap, SessionConfig,
    SnapshotStream, SourceConnector, StreamOptions, TelemetryEvent,
};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let sensors = SensorMap::default();
    let args: Vec<String> = env::args().collect();

    let connector: Arc<dyn SourceConnector> = if args.len() > 2 {
        let config = ConnectionConfig::new(&args[1], &args[2]);
        config.validate()?;
        println!("Connecting to {}...", config.websocket_url()?);
        Arc::new(HassConnector::new(config, sensors.entity_ids()))
    } else {
        println!("No Home Assistant URL given, using demo data.");
        println!("Usage: {} <HA_URL> <TOKEN>", args[0]);
        Arc::new(DemoConnector::new(sensors.clone(), Duration::from_secs(1)))
    };
    println!();

    let mut stream = SnapshotStream::spawn_shared(connector, StreamOptions::default());
    let mut session = DashboardSession::new(SessionConfig {
        sensors,
        ..Default::default()
    });

    let mut shown = 0;
    while let Some(event) = stream.recv().await {
        match &event {
            TelemetryEvent::Connected { source } => println!("Connected to {source}"),
            TelemetryEvent::Disconnected { reason } => println!("Disconnected: {reason}"),
            TelemetryEvent::ReconnectScheduled { attempt, delay } => {
                println!("Reconnect attempt {attempt} in {delay:?}");
            }
            _ => {}
        }

        let Some(view) = session.handle_event(&event, OffsetDateTime::now_utc()) else {
            continue;
        };

        let state = view.state;
        println!(
            "Solar {:>5} W | House {:>5} W | Battery {:>5} W ({}%) | Grid {:>5} W | Autarky {}%",
            state.solar_power,
            state.house_consumption,
            state.battery_power,
            state.battery_level,
            state.grid_flow,
            state.self_sufficiency,
        );
        for flow in &view.flows {
            println!("    {:<14} {:>5} W", flow.id, flow.magnitude);
        }

        shown += 1;
        if shown >= 10 {
            break;
        }
    }

    stream.close();
    println!();
    println!("Done.");

    Ok(())
}
