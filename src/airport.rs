//! Static airport records and the built-in sample field.

use anyhow::{ Context, Result };
use serde::{ Deserialize, Serialize };
use std::path::Path;

use crate::geo;
use crate::runway::{ RunwayEndRecord, RunwayRecord };
use crate::taxiway::{ EdgeRecord, NodeRecord };
use crate::types::Position;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GateRecord {
    pub id: String,
    pub lat: f64,
    pub lon: f64,

    /// Nose heading of a parked aircraft
    pub heading: f64,
}

impl GateRecord {
    pub fn position(&self) -> Position {
        Position::new(self.lat, self.lon)
    }
}

/// Aircraft present when the simulation starts
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrafficRecord {
    /// Parked at a gate awaiting departure
    Departure {
        #[serde(default)]
        callsign: Option<String>,
        airline: String,
        #[serde(rename = "type")]
        aircraft_type: String,
        gate: String,
        destination: String,
    },
    /// Inbound and already airborne
    Arrival {
        #[serde(default)]
        callsign: Option<String>,
        airline: String,
        #[serde(rename = "type")]
        aircraft_type: String,
        origin: String,
        lat: f64,
        lon: f64,
        altitude: f64,
        heading: f64,
        speed: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AirportData {
    pub icao: String,

    /// Airport reference point
    pub reference: Position,

    #[serde(rename = "elevationFt")]
    pub elevation_ft: f64,

    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub runways: Vec<RunwayRecord>,
    pub gates: Vec<GateRecord>,

    #[serde(default)]
    pub traffic: Vec<TrafficRecord>,
}

impl AirportData {
    pub fn gate(&self, id: &str) -> Option<&GateRecord> {
        self.gates.iter().find(|gate| gate.id.eq_ignore_ascii_case(id))
    }
}

/// Load airport data from a JSON file
pub fn load_airport(path: impl AsRef<Path>) -> Result<AirportData> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read airport data {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Failed to parse airport data {}", path.display()))
}

/// Small two runway field used when no data file is configured
///
/// Runway 28R/10L with parallel taxiway A 400 ft south of it (A1 at the 28R end through A5),
/// exit taxiway B from the runway midpoint to A3, and runway 01/19 starting just north of A4.
/// Gates G1, G2 and G3 sit 250 ft south of A3, A2 and A5.
pub fn sample_airport() -> AirportData {
    let threshold_28r = Position::new(37.613, -122.357);
    let threshold_10l = geo::offset_ft(threshold_28r, 280.0, 10_000.0);

    let a1 = geo::offset_ft(threshold_28r, 190.0, 400.0);
    let alpha: Vec<Position> = (0..5).map(|i| geo::offset_ft(a1, 280.0, 2500.0 * f64::from(i))).collect();
    let b1 = geo::offset_ft(threshold_28r, 280.0, 5000.0);

    let threshold_01 = geo::offset_ft(alpha[3], 10.0, 200.0);
    let threshold_19 = geo::offset_ft(threshold_01, 10.0, 7000.0);

    let mut nodes: Vec<NodeRecord> = alpha
        .iter()
        .enumerate()
        .map(|(i, position)| node(&format!("A{}", i + 1), *position))
        .collect();
    nodes.push(node("B1", b1));

    let mut edges: Vec<EdgeRecord> = (1..alpha.len())
        .map(|i| edge(&format!("A{i}"), &format!("A{}", i + 1), "A"))
        .collect();
    edges.push(edge("B1", "A3", "B"));

    let gates = [("G1", 2), ("G2", 1), ("G3", 4)]
        .into_iter()
        .map(|(id, at)| {
            let position = geo::offset_ft(alpha[at], 190.0, 250.0);
            GateRecord { id: id.to_string(), lat: position.lat, lon: position.lon, heading: 190.0 }
        })
        .collect();

    let arrival_start = geo::destination(threshold_28r, 100.0, 15.0);

    AirportData {
        icao: "KSIM".to_string(),
        reference: geo::offset_ft(threshold_28r, 280.0, 5000.0),
        elevation_ft: 13.0,
        nodes,
        edges,
        runways: vec![
            runway(("28R", 280.0, threshold_28r), ("10L", 100.0, threshold_10l), 10_000.0),
            runway(("01", 10.0, threshold_01), ("19", 190.0, threshold_19), 7000.0),
        ],
        gates,
        traffic: vec![
            TrafficRecord::Departure {
                callsign: Some("UAL123".to_string()),
                airline: "UAL".to_string(),
                aircraft_type: "A320".to_string(),
                gate: "G1".to_string(),
                destination: "KLAX".to_string(),
            },
            TrafficRecord::Departure {
                callsign: None,
                airline: "DAL".to_string(),
                aircraft_type: "B738".to_string(),
                gate: "G3".to_string(),
                destination: "KSEA".to_string(),
            },
            TrafficRecord::Arrival {
                callsign: None,
                airline: "SWA".to_string(),
                aircraft_type: "B737".to_string(),
                origin: "KPHX".to_string(),
                lat: arrival_start.lat,
                lon: arrival_start.lon,
                altitude: 5000.0,
                heading: 280.0,
                speed: 220.0,
            },
        ],
    }
}

fn node(id: &str, position: Position) -> NodeRecord {
    NodeRecord { id: id.to_string(), lat: position.lat, lon: position.lon }
}

fn edge(from: &str, to: &str, taxiway: &str) -> EdgeRecord {
    EdgeRecord { from: from.to_string(), to: to.to_string(), taxiway: taxiway.to_string() }
}

fn runway(a: (&str, f64, Position), b: (&str, f64, Position), length_ft: f64) -> RunwayRecord {
    let end = |(id, heading, position): (&str, f64, Position)| RunwayEndRecord {
        id: id.to_string(),
        heading,
        lat: position.lat,
        lon: position.lon,
    };
    RunwayRecord { ends: [end(a), end(b)], length_ft }
}
