//! Pairwise conflict detection, recomputed from scratch every tick.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::SeparationConfig;
use crate::geo::{ self, FEET_PER_NM };
use crate::performance::WakeCategory;
use crate::runway::{ RunwayInfo, RunwayRegistry, normalize_runway_id };
use crate::types::{ AircraftSnapshot, Phase, Position };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Ground,
    Approach,
    Vertical,
    RunwayIncursion,
    WakeTurbulence,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ConflictType::Ground => "ground",
            ConflictType::Approach => "approach",
            ConflictType::Vertical => "vertical",
            ConflictType::RunwayIncursion => "runway_incursion",
            ConflictType::WakeTurbulence => "wake_turbulence",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// One detected conflict between two aircraft
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparationAlert {
    /// Sorted callsign pair, `A-B`
    pub id: String,
    pub conflict: ConflictType,
    pub severity: Severity,
    /// Callsigns in the same order as the id
    pub callsigns: [String; 2],
    pub distance_nm: f64,
    pub message: String,
}

/// Taxiing aircraft about to enter a runway it was not cleared onto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunwayIncursion {
    pub callsign: String,
    pub runway: String,
}

pub struct SeparationMonitor {
    reference: Position,
    runways: Arc<RunwayRegistry>,
    config: SeparationConfig,
}

impl SeparationMonitor {
    /// `reference` is the airport reference point used to order approach traffic
    pub fn new(reference: Position, runways: Arc<RunwayRegistry>, config: SeparationConfig) -> Self {
        Self { reference, runways, config }
    }

    pub fn set_config(&mut self, config: SeparationConfig) {
        self.config = config;
    }

    /// Every conflict among `aircraft`, sorted by alert id
    pub fn check(&self, aircraft: &[AircraftSnapshot]) -> Vec<SeparationAlert> {
        let mut alerts = Vec::new();
        for (i, a) in aircraft.iter().enumerate() {
            for b in &aircraft[i + 1..] {
                let found = if a.phase.is_ground() && b.phase.is_ground() {
                    self.check_ground(a, b)
                } else if a.phase.is_approach() && b.phase.is_approach() {
                    self.check_approach(a, b)
                } else if a.phase.is_enroute() && b.phase.is_enroute() {
                    self.check_vertical(a, b)
                } else {
                    self.check_runway_conflict(a, b).or_else(|| self.check_runway_conflict(b, a))
                };
                alerts.extend(found);
            }
        }
        alerts.sort_by(|x, y| x.id.cmp(&y.id));
        alerts
    }

    fn check_ground(&self, a: &AircraftSnapshot, b: &AircraftSnapshot) -> Option<SeparationAlert> {
        if a.phase == Phase::Parked && b.phase == Phase::Parked {
            return None;
        }
        let distance_ft = geo::distance_ft(a.position, b.position);
        let severity = if distance_ft < self.config.ground_critical_ft {
            Severity::Critical
        } else if distance_ft < self.config.ground_warning_ft {
            Severity::Warning
        } else {
            return None;
        };
        Some(alert(
            a,
            b,
            ConflictType::Ground,
            severity,
            distance_ft / FEET_PER_NM,
            format!("ground proximity {distance_ft:.0} ft"),
        ))
    }

    fn check_approach(&self, a: &AircraftSnapshot, b: &AircraftSnapshot) -> Option<SeparationAlert> {
        let (lead, follower) = if geo::distance_nm(a.position, self.reference)
            <= geo::distance_nm(b.position, self.reference)
        {
            (a, b)
        } else {
            (b, a)
        };

        let lead_category = WakeCategory::for_type(&lead.aircraft_type);
        let follower_category = WakeCategory::for_type(&follower.aircraft_type);
        let required = lead_category.required_separation_nm(follower_category);
        let distance = geo::distance_nm(a.position, b.position);

        if distance < self.config.approach_critical_nm {
            return Some(alert(
                a,
                b,
                ConflictType::Approach,
                Severity::Critical,
                distance,
                format!("{} and {} on approach {distance:.1} nm apart", lead.callsign, follower.callsign),
            ));
        }
        if distance >= required {
            return None;
        }

        let (conflict, message) = if required > self.config.in_trail_minimum_nm {
            (
                ConflictType::WakeTurbulence,
                format!(
                    "{} ({follower_category}) {distance:.1} nm behind {} ({lead_category}), {required:.0} nm required",
                    follower.callsign,
                    lead.callsign
                ),
            )
        } else {
            (
                ConflictType::Approach,
                format!("{} {distance:.1} nm behind {}, {required:.0} nm required", follower.callsign, lead.callsign),
            )
        };
        Some(alert(a, b, conflict, Severity::Warning, distance, message))
    }

    fn check_vertical(&self, a: &AircraftSnapshot, b: &AircraftSnapshot) -> Option<SeparationAlert> {
        let distance = geo::distance_nm(a.position, b.position);
        if distance >= self.config.vertical_window_nm {
            return None;
        }

        let required = if a.altitude.max(b.altitude) >= self.config.vertical_transition_ft {
            self.config.vertical_minimum_ft * 2.0
        } else {
            self.config.vertical_minimum_ft
        };
        let vertical = (a.altitude - b.altitude).abs();
        let severity = if vertical < required / 2.0 {
            Severity::Critical
        } else if vertical < required {
            Severity::Warning
        } else {
            return None;
        };
        Some(alert(
            a,
            b,
            ConflictType::Vertical,
            severity,
            distance,
            format!("{vertical:.0} ft vertical at {distance:.1} nm, {required:.0} ft required"),
        ))
    }

    /// `user` rolling on a runway while `intruder` taxis across its centerline uncleared
    fn check_runway_conflict(&self, user: &AircraftSnapshot, intruder: &AircraftSnapshot) -> Option<SeparationAlert> {
        if !matches!(user.phase, Phase::Takeoff | Phase::Landing) {
            return None;
        }
        if !matches!(intruder.phase, Phase::TaxiOut | Phase::TaxiIn | Phase::HoldingShort | Phase::Pushback) {
            return None;
        }

        let id = match user.phase {
            Phase::Landing => user.approach_runway.as_ref().or(user.assigned_runway.as_ref()),
            _ => user.assigned_runway.as_ref(),
        }?;
        let runway = self.runways.get(id)?;
        if crossing_cleared(intruder, runway) || !runway.contains(intruder.position, self.config.runway_half_width_ft) {
            return None;
        }

        let distance = geo::distance_nm(user.position, intruder.position);
        Some(alert(
            user,
            intruder,
            ConflictType::RunwayIncursion,
            Severity::Critical,
            distance,
            format!("{} on runway {} while {} is using it", intruder.callsign, runway.id, user.callsign),
        ))
    }

    /// TAXI_OUT aircraft nearing a threshold they are neither assigned to nor cleared across
    pub fn find_runway_incursions(&self, aircraft: &[AircraftSnapshot]) -> Vec<RunwayIncursion> {
        let mut incursions = Vec::new();
        for a in aircraft {
            if a.phase != Phase::TaxiOut || !a.has_taxi_route || a.pending_runway_crossing.is_some() {
                continue;
            }

            let assigned: Vec<String> = [&a.assigned_runway, &a.approach_runway]
                .into_iter()
                .flatten()
                .map(|id| normalize_runway_id(id))
                .collect();

            let mut runways: Vec<&RunwayInfo> = self.runways.iter().collect();
            runways.sort_by(|x, y| x.id.cmp(&y.id));

            let hit = runways.into_iter().find(|runway| {
                let own = assigned.iter().any(|id| *id == runway.id || *id == runway.opposite);
                !own
                    && !crossing_cleared(a, runway)
                    && geo::distance_ft(a.position, runway.threshold) <= self.config.hold_short_distance_ft
            });

            if let Some(runway) = hit {
                incursions.push(RunwayIncursion { callsign: a.callsign.clone(), runway: runway.id.clone() });
            }
        }
        incursions
    }
}

fn crossing_cleared(aircraft: &AircraftSnapshot, runway: &RunwayInfo) -> bool {
    aircraft.cleared_crossings.iter().any(|id| {
        let id = normalize_runway_id(id);
        id == runway.id || id == runway.opposite
    })
}

fn alert(
    a: &AircraftSnapshot,
    b: &AircraftSnapshot,
    conflict: ConflictType,
    severity: Severity,
    distance_nm: f64,
    message: String,
) -> SeparationAlert {
    let mut callsigns = [a.callsign.clone(), b.callsign.clone()];
    callsigns.sort();
    SeparationAlert {
        id: callsigns.join("-"),
        conflict,
        severity,
        callsigns,
        distance_nm,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runway::{ RunwayEndRecord, RunwayRecord };

    const THRESHOLD: Position = Position::new(37.613, -122.357);

    fn monitor() -> SeparationMonitor {
        let far = geo::offset_ft(THRESHOLD, 280.0, 10_000.0);
        let crossing = geo::offset_ft(THRESHOLD, 100.0, 3000.0);
        let crossing_far = geo::offset_ft(crossing, 10.0, 7000.0);
        let runways = RunwayRegistry::new(&[
            RunwayRecord {
                ends: [
                    RunwayEndRecord { id: "28R".into(), heading: 280.0, lat: THRESHOLD.lat, lon: THRESHOLD.lon },
                    RunwayEndRecord { id: "10L".into(), heading: 100.0, lat: far.lat, lon: far.lon },
                ],
                length_ft: 10_000.0,
            },
            RunwayRecord {
                ends: [
                    RunwayEndRecord { id: "01".into(), heading: 10.0, lat: crossing.lat, lon: crossing.lon },
                    RunwayEndRecord { id: "19".into(), heading: 190.0, lat: crossing_far.lat, lon: crossing_far.lon },
                ],
                length_ft: 7000.0,
            },
        ]);
        SeparationMonitor::new(THRESHOLD, Arc::new(runways), SeparationConfig::default())
    }

    fn snapshot(callsign: &str, aircraft_type: &str, phase: Phase, position: Position, altitude: f64) -> AircraftSnapshot {
        AircraftSnapshot {
            callsign: callsign.into(),
            aircraft_type: aircraft_type.into(),
            phase,
            position,
            altitude,
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
    fn ground_proximity_thresholds() {
        let monitor = monitor();
        let a = snapshot("BBB2", "A320", Phase::TaxiOut, THRESHOLD, 0.0);
        let close = snapshot("AAA1", "A320", Phase::HoldingShort, geo::offset_ft(THRESHOLD, 0.0, 100.0), 0.0);
        let near = snapshot("AAA1", "A320", Phase::HoldingShort, geo::offset_ft(THRESHOLD, 0.0, 300.0), 0.0);
        let far = snapshot("AAA1", "A320", Phase::HoldingShort, geo::offset_ft(THRESHOLD, 0.0, 500.0), 0.0);

        let alerts = monitor.check(&[a.clone(), close]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "AAA1-BBB2");
        assert_eq!(alerts[0].callsigns, ["AAA1".to_string(), "BBB2".to_string()]);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].conflict, ConflictType::Ground);

        assert_eq!(monitor.check(&[a.clone(), near])[0].severity, Severity::Warning);
        assert!(monitor.check(&[a, far]).is_empty());
    }

    #[test]
    fn parked_pairs_are_ignored() {
        let monitor = monitor();
        let a = snapshot("AAA1", "A320", Phase::Parked, THRESHOLD, 0.0);
        let b = snapshot("BBB2", "A320", Phase::Parked, geo::offset_ft(THRESHOLD, 0.0, 50.0), 0.0);
        assert!(monitor.check(&[a, b]).is_empty());
    }

    #[test]
    fn heavy_leader_needs_wake_spacing() {
        let monitor = monitor();
        let lead = snapshot("HVY1", "B77W", Phase::Final, geo::destination(THRESHOLD, 100.0, 3.0), 900.0);
        let follower = snapshot("MED1", "A320", Phase::Approach, geo::destination(THRESHOLD, 100.0, 7.0), 2100.0);

        let alerts = monitor.check(&[lead.clone(), follower.clone()]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].conflict, ConflictType::WakeTurbulence);
        assert_eq!(alerts[0].severity, Severity::Warning);

        // same spacing behind a medium is fine
        let medium_lead = AircraftSnapshot { aircraft_type: "A320".into(), ..lead.clone() };
        assert!(monitor.check(&[medium_lead, follower]).is_empty());

        let tight = snapshot("MED1", "A320", Phase::Final, geo::destination(THRESHOLD, 100.0, 4.0), 1200.0);
        assert_eq!(monitor.check(&[lead, tight])[0].severity, Severity::Critical);
    }

    #[test]
    fn vertical_minimum_doubles_above_transition() {
        let monitor = monitor();
        let base = geo::destination(THRESHOLD, 0.0, 20.0);
        let a = snapshot("AAA1", "A320", Phase::Cruise, base, 10_000.0);
        let b = |altitude| {
            snapshot("BBB2", "A320", Phase::Climbing, geo::destination(base, 90.0, 2.0), altitude)
        };

        assert_eq!(monitor.check(&[a.clone(), b(10_400.0)])[0].severity, Severity::Critical);
        assert_eq!(monitor.check(&[a.clone(), b(10_800.0)])[0].severity, Severity::Warning);
        assert!(monitor.check(&[a, b(11_000.0)]).is_empty());

        let high = snapshot("AAA1", "A320", Phase::Cruise, base, 30_000.0);
        assert_eq!(monitor.check(&[high.clone(), b(31_500.0)])[0].severity, Severity::Warning);
        assert!(monitor.check(&[high, b(32_000.0)]).is_empty());
    }

    #[test]
    fn taxi_onto_active_runway_is_critical() {
        let monitor = monitor();
        let mut departure = snapshot("DEP1", "A320", Phase::Takeoff, geo::offset_ft(THRESHOLD, 280.0, 1000.0), 0.0);
        departure.assigned_runway = Some("28R".into());
        let mut taxi = snapshot("TAX1", "A320", Phase::TaxiOut, geo::offset_ft(THRESHOLD, 280.0, 5000.0), 0.0);

        let alerts = monitor.check(&[departure.clone(), taxi.clone()]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].conflict, ConflictType::RunwayIncursion);
        assert_eq!(alerts[0].severity, Severity::Critical);

        taxi.cleared_crossings = vec!["10L".into()];
        assert!(monitor.check(&[departure, taxi]).is_empty());
    }

    #[test]
    fn incursions_skip_assigned_and_cleared_runways() {
        let monitor = monitor();
        let near_01 = geo::offset_ft(geo::offset_ft(THRESHOLD, 100.0, 3000.0), 190.0, 200.0);
        let mut taxi = snapshot("TAX1", "A320", Phase::TaxiOut, near_01, 0.0);
        taxi.has_taxi_route = true;
        taxi.assigned_runway = Some("28R".into());

        assert_eq!(
            monitor.find_runway_incursions(std::slice::from_ref(&taxi)),
            vec![RunwayIncursion { callsign: "TAX1".into(), runway: "01".into() }]
        );

        let mut cleared = taxi.clone();
        cleared.cleared_crossings = vec!["19".into()];
        assert!(monitor.find_runway_incursions(&[cleared]).is_empty());

        let mut pending = taxi.clone();
        pending.pending_runway_crossing = Some("01".into());
        assert!(monitor.find_runway_incursions(&[pending]).is_empty());

        let mut assigned = taxi.clone();
        assigned.assigned_runway = Some("1".into());
        assert!(monitor.find_runway_incursions(&[assigned]).is_empty());

        let mut no_route = taxi;
        no_route.has_taxi_route = false;
        assert!(monitor.find_runway_incursions(&[no_route]).is_empty());
    }
}
