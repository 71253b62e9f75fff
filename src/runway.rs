use serde::{ Deserialize, Serialize };
use std::collections::HashMap;

use crate::geo::{ self, FEET_PER_NM };
use crate::types::{ AircraftSnapshot, Phase, Position };

/// Margin added to the runway length for the occupancy radius
pub const OCCUPANCY_MARGIN_NM: f64 = 0.15;

/// Distance from the threshold at which approach traffic counts as final traffic
pub const FINAL_TRAFFIC_NM: f64 = 3.0;

/// One runway end as supplied by the airport loader
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunwayEndRecord {
    pub id: String,
    pub heading: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Physical runway with both ends
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunwayRecord {
    pub ends: [RunwayEndRecord; 2],

    #[serde(rename = "lengthFt")]
    pub length_ft: f64,
}

/// One registered runway end
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayInfo {
    pub id: String,
    pub heading: f64,
    pub threshold: Position,
    pub length_ft: f64,

    /// Designator of the other end of the same pavement
    pub opposite: String,
}

impl RunwayInfo {
    /// Radius around the threshold within which traffic occupies this runway
    pub fn occupancy_radius_nm(&self) -> f64 {
        self.length_ft / FEET_PER_NM + OCCUPANCY_MARGIN_NM
    }

    /// Position `distance_ft` down the runway from the threshold
    pub fn along_centerline(&self, distance_ft: f64) -> Position {
        geo::offset_ft(self.threshold, self.heading, distance_ft)
    }

    /// Inside the rectangle from threshold to far end, `half_width_ft` either side of the centerline
    pub fn contains(&self, position: Position, half_width_ft: f64) -> bool {
        let far_end = self.along_centerline(self.length_ft);
        let along = geo::along_track_ft(position, self.threshold, far_end);
        let across = geo::cross_track_ft(position, self.threshold, far_end);
        (-half_width_ft..=self.length_ft + half_width_ft).contains(&along) && across.abs() <= half_width_ft
    }
}

/// Canonical runway designator: upper case with a two digit number, `9l` becomes `09L`
pub fn normalize_runway_id(id: &str) -> String {
    let id = id.trim().to_ascii_uppercase();
    let digits = id.chars().take_while(char::is_ascii_digit).count();
    if digits == 1 { format!("0{id}") } else { id }
}

/// Both ends of every runway, looked up independently
#[derive(Debug, Clone, Default)]
pub struct RunwayRegistry {
    runways: HashMap<String, RunwayInfo>,
}

impl RunwayRegistry {
    pub fn new(records: &[RunwayRecord]) -> Self {
        let mut runways = HashMap::new();
        for record in records {
            let [a, b] = &record.ends;
            for (end, other) in [(a, b), (b, a)] {
                let id = normalize_runway_id(&end.id);
                runways.insert(id.clone(), RunwayInfo {
                    id,
                    heading: end.heading,
                    threshold: Position::new(end.lat, end.lon),
                    length_ft: record.length_ft,
                    opposite: normalize_runway_id(&other.id),
                });
            }
        }
        Self { runways }
    }

    pub fn get(&self, id: &str) -> Option<&RunwayInfo> {
        self.runways.get(&normalize_runway_id(id))
    }

    /// Registered designators in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.runways.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunwayInfo> {
        self.runways.values()
    }

    /// Any aircraft taking off, landing, lined up or on final within the occupancy radius
    pub fn is_occupied(&self, id: &str, traffic: &[AircraftSnapshot]) -> bool {
        let Some(runway) = self.get(id) else {
            return false;
        };
        let radius = runway.occupancy_radius_nm();
        traffic.iter().any(|aircraft| {
            aircraft.phase.occupies_runway() && geo::distance_nm(aircraft.position, runway.threshold) <= radius
        })
    }

    /// Any aircraft on approach or final within 3 nm of the threshold
    pub fn has_final_traffic(&self, id: &str, traffic: &[AircraftSnapshot]) -> bool {
        let Some(runway) = self.get(id) else {
            return false;
        };
        traffic.iter().any(|aircraft| {
            matches!(aircraft.phase, Phase::Approach | Phase::Final)
                && geo::distance_nm(aircraft.position, runway.threshold) <= FINAL_TRAFFIC_NM
        })
    }

    /// Threshold position and heading for an aircraft cleared to line up
    pub fn lineup_position(&self, id: &str) -> Option<(Position, f64)> {
        self.get(id).map(|runway| (runway.threshold, runway.heading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Position = Position::new(37.613, -122.357);

    fn registry() -> RunwayRegistry {
        let far = geo::offset_ft(THRESHOLD, 280.0, 10_000.0);
        RunwayRegistry::new(&[RunwayRecord {
            ends: [
                RunwayEndRecord { id: "28R".into(), heading: 280.0, lat: THRESHOLD.lat, lon: THRESHOLD.lon },
                RunwayEndRecord { id: "10L".into(), heading: 100.0, lat: far.lat, lon: far.lon },
            ],
            length_ft: 10_000.0,
        }])
    }

    fn traffic(phase: Phase, position: Position) -> AircraftSnapshot {
        AircraftSnapshot {
            callsign: "TST1".into(),
            aircraft_type: "A320".into(),
            phase,
            position,
            altitude: 0.0,
            heading: 280.0,
            speed: 0.0,
            assigned_runway: None,
            approach_runway: None,
            has_taxi_route: false,
            pending_runway_crossing: None,
            cleared_crossings: Vec::new(),
        }
    }

    #[test]
    fn both_ends_resolve() {
        let registry = registry();
        assert_eq!(registry.get("28r").unwrap().opposite, "10L");
        assert_eq!(registry.get("10L").unwrap().heading, 100.0);
        assert!(registry.get("01").is_none());
        assert_eq!(registry.ids(), ["10L", "28R"]);
    }

    #[test]
    fn designators_are_zero_padded() {
        assert_eq!(normalize_runway_id("9l"), "09L");
        assert_eq!(normalize_runway_id("28R"), "28R");
    }

    #[test]
    fn occupancy_requires_an_active_phase_inside_the_radius() {
        let registry = registry();
        let on_runway = geo::offset_ft(THRESHOLD, 280.0, 4000.0);
        assert!(registry.is_occupied("28R", &[traffic(Phase::Takeoff, on_runway)]));
        assert!(registry.is_occupied("28R", &[traffic(Phase::Lineup, THRESHOLD)]));
        assert!(!registry.is_occupied("28R", &[traffic(Phase::Parked, THRESHOLD)]));

        // radius is length / 6076 + 0.15 nm
        let outside = geo::destination(THRESHOLD, 100.0, 10_000.0 / FEET_PER_NM + 0.2);
        assert!(!registry.is_occupied("28R", &[traffic(Phase::Final, outside)]));
    }

    #[test]
    fn final_traffic_within_three_miles() {
        let registry = registry();
        let short_final = geo::destination(THRESHOLD, 100.0, 2.5);
        let long_final = geo::destination(THRESHOLD, 100.0, 6.0);
        assert!(registry.has_final_traffic("28R", &[traffic(Phase::Final, short_final)]));
        assert!(!registry.has_final_traffic("28R", &[traffic(Phase::Approach, long_final)]));
        assert!(!registry.has_final_traffic("28R", &[traffic(Phase::Climbing, short_final)]));
    }

    #[test]
    fn rectangle_follows_the_centerline() {
        let runway = registry().get("28R").unwrap().clone();
        assert!(runway.contains(runway.along_centerline(5000.0), 150.0));
        assert!(runway.contains(geo::offset_ft(runway.along_centerline(5000.0), 190.0, 100.0), 150.0));
        assert!(!runway.contains(geo::offset_ft(runway.along_centerline(5000.0), 190.0, 400.0), 150.0));
        assert!(!runway.contains(runway.along_centerline(-2000.0), 150.0));
    }

    #[test]
    fn lineup_is_at_the_threshold() {
        let (position, heading) = registry().lineup_position("28R").unwrap();
        assert_eq!(position, THRESHOLD);
        assert_eq!(heading, 280.0);
    }
}
