use parking_lot::{ Mutex, RwLock };
use std::collections::HashMap;
use std::sync::Arc;

use crate::aircraft::Aircraft;
use crate::airport::{ AirportData, TrafficRecord };
use crate::config::SimConfig;
use crate::handler::{ CommandError, CommandHandler };
use crate::runway::RunwayRegistry;
use crate::separation::{ SeparationAlert, SeparationMonitor };
use crate::spawn::Spawner;
use crate::taxiway::{ Router, TaxiwayGraph };
use crate::types::{ AircraftSnapshot, Phase };

/// Thread-safe simulation state shared between the tick, command and config tasks
pub struct Simulation {
    /// Live aircraft keyed by callsign
    aircraft: RwLock<HashMap<String, Aircraft>>,

    /// Alerts from the most recent tick
    alerts: RwLock<Vec<SeparationAlert>>,

    /// Configuration (hot-reloadable)
    config: RwLock<SimConfig>,

    status: RwLock<SimStatus>,

    airport: AirportData,
    runways: Arc<RunwayRegistry>,
    handler: CommandHandler,
    monitor: RwLock<SeparationMonitor>,
    spawner: Mutex<Spawner>,
}

#[derive(Debug, Clone, Default)]
pub struct SimStatus {
    pub tick_count: u64,
    pub sim_seconds: f64,
    /// Wall clock of the last tick, unix milliseconds
    pub last_tick: Option<i64>,
    pub aircraft_count: usize,
    pub alert_count: usize,
}

impl Simulation {
    pub fn new(airport: AirportData, config: SimConfig) -> Self {
        let runways = Arc::new(RunwayRegistry::new(&airport.runways));
        let router = Router::new(TaxiwayGraph::new(&airport.nodes, &airport.edges));
        let handler = CommandHandler::new(router, runways.clone(), airport.gates.clone());
        let monitor = SeparationMonitor::new(airport.reference, runways.clone(), config.separation.clone());

        Self {
            aircraft: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
            config: RwLock::new(config),
            status: RwLock::new(SimStatus::default()),
            airport,
            runways,
            handler,
            monitor: RwLock::new(monitor),
            spawner: Mutex::new(Spawner::default()),
        }
    }

    pub fn airport(&self) -> &AirportData {
        &self.airport
    }

    pub fn runways(&self) -> &RunwayRegistry {
        &self.runways
    }

    // Aircraft management

    /// Spawn the airport's initial traffic; returns how many aircraft were added
    pub fn spawn_initial_traffic(&self) -> usize {
        let records = self.airport.traffic.clone();
        records.iter().filter(|record| self.spawn(record)).count()
    }

    /// Spawn one aircraft from a traffic record; `false` for an unknown gate or a duplicate callsign
    pub fn spawn(&self, record: &TrafficRecord) -> bool {
        let Some(aircraft) = self.spawner.lock().from_record(&self.airport, record) else {
            tracing::warn!("Traffic record {:?} references an unknown gate", record);
            return false;
        };
        self.add_aircraft(aircraft)
    }

    /// Hand a fully populated aircraft to the simulation
    pub fn add_aircraft(&self, aircraft: Aircraft) -> bool {
        let mut fleet = self.aircraft.write();
        if fleet.contains_key(&aircraft.callsign) {
            tracing::warn!("Callsign {} already in use", aircraft.callsign);
            return false;
        }
        tracing::info!("{} spawned in {} at {}", aircraft.callsign, aircraft.phase(), aircraft.gate.as_deref().unwrap_or("airborne"));
        fleet.insert(aircraft.callsign.clone(), aircraft);
        self.status.write().aircraft_count = fleet.len();
        true
    }

    /// Get all aircraft (read-only copy)
    pub fn get_aircraft(&self) -> HashMap<String, Aircraft> {
        self.aircraft.read().clone()
    }

    pub fn get_aircraft_by_callsign(&self, callsign: &str) -> Option<Aircraft> {
        self.aircraft.read().get(callsign).cloned()
    }

    /// Snapshots sorted by callsign
    pub fn snapshots(&self) -> Vec<AircraftSnapshot> {
        let mut snapshots: Vec<AircraftSnapshot> = self.aircraft.read().values().map(Aircraft::snapshot).collect();
        snapshots.sort_by(|a, b| a.callsign.cmp(&b.callsign));
        snapshots
    }

    // Simulation loop

    /// Advance every aircraft once by `dt` simulated seconds against a start-of-tick snapshot
    pub fn tick(&self, dt: f64) {
        let config = self.config.read().clone();
        let mut fleet = self.aircraft.write();

        let mut callsigns: Vec<String> = fleet.keys().cloned().collect();
        callsigns.sort();
        let peers: Vec<AircraftSnapshot> = callsigns.iter().filter_map(|c| fleet.get(c)).map(Aircraft::snapshot).collect();

        for callsign in &callsigns {
            if let Some(aircraft) = fleet.get_mut(callsign) {
                aircraft.update(dt, &peers, &config);
            }
        }

        let monitor = self.monitor.read();
        let after: Vec<AircraftSnapshot> = callsigns.iter().filter_map(|c| fleet.get(c)).map(Aircraft::snapshot).collect();
        for incursion in monitor.find_runway_incursions(&after) {
            if let Some(aircraft) = fleet.get_mut(&incursion.callsign) {
                aircraft.stop_for_runway(&incursion.runway);
            }
        }

        let current: Vec<AircraftSnapshot> = callsigns.iter().filter_map(|c| fleet.get(c)).map(Aircraft::snapshot).collect();
        let alerts = monitor.check(&current);

        let dwell = config.simulation.arrived_dwell_secs;
        if dwell > 0.0 {
            fleet.retain(|callsign, aircraft| {
                let stale = aircraft.phase() == Phase::Arrived && aircraft.phase_time > dwell;
                if stale {
                    tracing::info!("{} removed after arriving at {}", callsign, aircraft.gate.as_deref().unwrap_or("the gate"));
                }
                !stale
            });
        }

        let mut status = self.status.write();
        status.tick_count += 1;
        status.sim_seconds += dt;
        status.last_tick = Some(chrono::Utc::now().timestamp_millis());
        status.aircraft_count = fleet.len();
        status.alert_count = alerts.len();
        *self.alerts.write() = alerts;
    }

    /// Execute one controller instruction
    pub fn execute(&self, raw: &str) -> Result<String, CommandError> {
        let config = self.config.read().clone();
        let mut fleet = self.aircraft.write();
        self.handler.execute(raw, &mut fleet, &config).inspect_err(|e| {
            tracing::debug!("Command \"{}\" rejected: {}", raw.trim(), e);
        })
    }

    /// Current alerts, sorted by id
    pub fn get_alerts(&self) -> Vec<SeparationAlert> {
        self.alerts.read().clone()
    }

    // Configuration management

    /// Update configuration (hot-reload)
    pub fn update_config(&self, config: SimConfig) {
        self.monitor.write().set_config(config.separation.clone());
        *self.config.write() = config;
    }

    pub fn get_config(&self) -> SimConfig {
        self.config.read().clone()
    }

    pub fn get_status(&self) -> SimStatus {
        self.status.read().clone()
    }
}
