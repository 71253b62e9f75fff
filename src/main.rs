use anyhow::{ Context, Result };
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::runtime::Runtime;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

use towersim::airport::{ self, AirportData };
use towersim::config::{ self, ConfigWatcher, SimConfig };
use towersim::phonetic;
use towersim::state::Simulation;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "towersim=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tower simulator");

    let runtime = Runtime::new().context("Failed to start the async runtime")?;

    let config = config::load_config()?;
    tracing::info!("Configuration loaded successfully");

    let airport = load_airport(&config)?;
    tracing::info!(
        "Airport {} with {} taxi nodes, {} runways, {} gates",
        airport.icao,
        airport.nodes.len(),
        airport.runways.len(),
        airport.gates.len()
    );

    let sim = Arc::new(Simulation::new(airport, config));
    let spawned = sim.spawn_initial_traffic();
    tracing::info!("{} aircraft in the initial traffic", spawned);

    runtime.block_on(run(sim))
}

fn load_airport(config: &SimConfig) -> Result<AirportData> {
    match &config.airport.data_path {
        Some(path) => airport::load_airport(path),
        None => {
            tracing::info!("No airport data configured, using the built-in sample airport");
            Ok(airport::sample_airport())
        }
    }
}

async fn run(sim: Arc<Simulation>) -> Result<()> {
    // Start config file watcher
    let config_watcher = ConfigWatcher::new(sim.clone());
    tokio::spawn(async move {
        if let Err(e) = config_watcher.watch().await {
            tracing::error!("Config watcher error: {}", e);
        }
    });

    let ticker = sim.clone();
    tokio::spawn(async move {
        tick_loop(ticker).await;
    });

    read_commands(sim).await
}

/// Fixed-rate tick driver; the time scale is re-read every tick so reloads apply immediately
async fn tick_loop(sim: Arc<Simulation>) {
    let mut tick_hz = sim.get_config().simulation.tick_hz.max(0.1);
    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick_hz));
    let mut known_alerts: HashSet<String> = HashSet::new();

    loop {
        interval.tick().await;

        let simulation = sim.get_config().simulation;
        sim.tick(simulation.time_scale / tick_hz);

        let alerts = sim.get_alerts();
        for alert in alerts.iter().filter(|alert| !known_alerts.contains(&alert.id)) {
            tracing::warn!("{} {:?} {}: {}", alert.conflict, alert.severity, alert.id, alert.message);
        }
        known_alerts = alerts.into_iter().map(|alert| alert.id).collect();

        let wanted = simulation.tick_hz.max(0.1);
        if (wanted - tick_hz).abs() > f64::EPSILON {
            tick_hz = wanted;
            interval = tokio::time::interval(Duration::from_secs_f64(1.0 / tick_hz));
            tracing::info!("Tick rate changed to {} Hz", tick_hz);
        }
    }
}

/// One command per stdin line until EOF or QUIT
async fn read_commands(sim: Arc<Simulation>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        match line.to_ascii_uppercase().as_str() {
            "" => continue,
            "QUIT" | "EXIT" => break,
            "STATUS" => print_status(&sim),
            "ALERTS" => {
                for alert in sim.get_alerts() {
                    println!("{:<8} {:<16} {:<20} {}", format!("{:?}", alert.severity), alert.conflict, alert.id, alert.message);
                }
            }
            _ => match sim.execute(line) {
                Ok(readback) => println!("{readback}"),
                Err(e) => println!("unable: {e}"),
            },
        }
    }

    tracing::info!("Command input closed, shutting down");
    Ok(())
}

fn print_status(sim: &Simulation) {
    let status = sim.get_status();
    println!(
        "tick {} | {:.0} s simulated | {} aircraft | {} alerts",
        status.tick_count, status.sim_seconds, status.aircraft_count, status.alert_count
    );
    for aircraft in sim.snapshots() {
        println!(
            "{:<8} {:<5} {:<16} {:>6.0} ft {:>4.0} kt hdg {:03.0} rwy {:<4} ({})",
            aircraft.callsign,
            aircraft.aircraft_type,
            aircraft.phase,
            aircraft.altitude,
            aircraft.speed,
            aircraft.heading,
            aircraft.assigned_runway.as_deref().or(aircraft.approach_runway.as_deref()).unwrap_or("-"),
            phonetic::heading(aircraft.heading),
        );
    }
}
