use serde::{ Deserialize, Serialize };
use std::fmt;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Flight/ground lifecycle phase of one aircraft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Parked,
    PushbackPending,
    Pushback,
    TaxiOut,
    HoldingShort,
    Lineup,
    Takeoff,
    Climbing,
    Cruise,
    Descending,
    Approach,
    Final,
    Landing,
    TaxiIn,
    Arrived,
    Holding,
}

impl Phase {
    /// Surface phases that take part in ground proximity checks and ground avoidance
    pub fn is_ground(self) -> bool {
        matches!(
            self,
            Phase::Parked
                | Phase::PushbackPending
                | Phase::Pushback
                | Phase::TaxiOut
                | Phase::HoldingShort
                | Phase::Lineup
                | Phase::TaxiIn
                | Phase::Arrived
        )
    }

    /// Phases in which the aircraft is flying away from the approach path
    pub fn is_enroute(self) -> bool {
        matches!(self, Phase::Climbing | Phase::Cruise | Phase::Descending | Phase::Holding)
    }

    pub fn is_approach(self) -> bool {
        matches!(self, Phase::Approach | Phase::Final)
    }

    pub fn is_airborne(self) -> bool {
        self.is_enroute() || self.is_approach()
    }

    /// Phases counted as occupying a runway
    pub fn occupies_runway(self) -> bool {
        matches!(self, Phase::Takeoff | Phase::Landing | Phase::Lineup | Phase::Final)
    }

    /// Phases that follow the taxi waypoint list
    pub fn is_taxiing(self) -> bool {
        matches!(self, Phase::TaxiOut | Phase::TaxiIn | Phase::Lineup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Parked => "PARKED",
            Phase::PushbackPending => "PUSHBACK_PENDING",
            Phase::Pushback => "PUSHBACK",
            Phase::TaxiOut => "TAXI_OUT",
            Phase::HoldingShort => "HOLDING_SHORT",
            Phase::Lineup => "LINEUP",
            Phase::Takeoff => "TAKEOFF",
            Phase::Climbing => "CLIMBING",
            Phase::Cruise => "CRUISE",
            Phase::Descending => "DESCENDING",
            Phase::Approach => "APPROACH",
            Phase::Final => "FINAL",
            Phase::Landing => "LANDING",
            Phase::TaxiIn => "TAXI_IN",
            Phase::Arrived => "ARRIVED",
            Phase::Holding => "HOLDING",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Forced turn direction for heading changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Left,
    Right,
    /// Shorter arc
    #[default]
    Auto,
}

/// One point of a taxi or pushback route
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaxiWaypoint {
    pub position: Position,

    /// Graph node id, or a synthetic id such as `GATE G1` when off-graph
    #[serde(rename = "nodeId")]
    pub node_id: String,
}

impl TaxiWaypoint {
    pub fn new(position: Position, node_id: impl Into<String>) -> Self {
        Self { position, node_id: node_id.into() }
    }
}

/// Circular holding pattern around a fix
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct HoldingPattern {
    pub fix: Position,

    /// Current bearing from the fix to the aircraft
    pub angle: f64,

    pub radius_nm: f64,
}

/// Localizer course copied from the runway registry when an approach is cleared
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Localizer {
    pub threshold: Position,
    pub course: f64,
}

/// Read-only view of one aircraft taken at the start of a tick
///
/// Peers, the runway registry and the separation monitor only ever see snapshots,
/// so nothing observes another aircraft's mid-tick state.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftSnapshot {
    pub callsign: String,
    pub aircraft_type: String,
    pub phase: Phase,
    pub position: Position,
    pub altitude: f64,
    pub heading: f64,
    pub speed: f64,
    pub assigned_runway: Option<String>,
    pub approach_runway: Option<String>,
    pub has_taxi_route: bool,
    pub pending_runway_crossing: Option<String>,
    pub cleared_crossings: Vec<String>,
}
