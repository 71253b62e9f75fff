//! Validating command interpreter.
//!
//! Every command is checked in full against the aircraft, the runway registry and the router
//! before anything is written, so a returned error always leaves the fleet untouched.

use ordered_float::OrderedFloat;
use std::collections::{ HashMap, HashSet };
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::aircraft::Aircraft;
use crate::airport::GateRecord;
use crate::config::SimConfig;
use crate::geo;
use crate::parser::{ self, Command, HoldShortTarget };
use crate::phonetic;
use crate::physics;
use crate::runway::{ RunwayInfo, RunwayRegistry, normalize_runway_id };
use crate::taxiway::{ Route, Router };
use crate::types::{ AircraftSnapshot, Localizer, Phase, Position, TaxiWaypoint, TurnDirection };

/// Shortest callsign prefix accepted for a partial match
const MIN_PREFIX_LEN: usize = 3;

/// Distance down the runway of the line-up point
const LINEUP_ROLL_FT: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unable to understand \"{0}\"")]
    UnknownCommand(String),

    #[error("no aircraft {0}")]
    AircraftNotFound(String),

    #[error("callsign {prefix} is ambiguous: {}", .matches.join(", "))]
    AmbiguousCallsign { prefix: String, matches: Vec<String> },

    #[error("no runway {0}")]
    RunwayNotFound(String),

    #[error("no taxiway {0}")]
    TaxiwayNotFound(String),

    #[error("no gate {0}")]
    GateNotFound(String),

    #[error("runway {0} is occupied")]
    RunwayOccupied(String),

    #[error("traffic on final for runway {0}")]
    SeparationViolation(String),

    #[error("{callsign} cannot accept {command} while {phase}")]
    PhaseIneligible { callsign: String, command: &'static str, phase: Phase },

    #[error("{knots:.0} knots exceeds the {limit:.0} knot limit")]
    AirspeedLimitExceeded { knots: f64, limit: f64 },

    #[error("crossing of runway {0} has not been cleared")]
    CrossingNotCleared(String),

    #[error("{0}")]
    InvalidClearance(String),
}

pub struct CommandHandler {
    router: Router,
    runways: Arc<RunwayRegistry>,
    gates: Vec<GateRecord>,
}

impl CommandHandler {
    pub fn new(router: Router, runways: Arc<RunwayRegistry>, gates: Vec<GateRecord>) -> Self {
        Self { router, runways, gates }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Parse and apply one controller instruction, returning the pilot read-back
    pub fn execute(
        &self,
        raw: &str,
        fleet: &mut HashMap<String, Aircraft>,
        config: &SimConfig,
    ) -> Result<String, CommandError> {
        let parsed = parser::parse_command(raw).ok_or_else(|| CommandError::UnknownCommand(raw.trim().to_string()))?;
        let key = resolve_callsign(&parsed.callsign, fleet)?;

        let traffic: Vec<AircraftSnapshot> =
            fleet.values().filter(|a| a.callsign != key).map(Aircraft::snapshot).collect();
        let aircraft = fleet.get_mut(&key).ok_or_else(|| CommandError::AircraftNotFound(key.clone()))?;

        if !eligible(&parsed.command, aircraft) {
            return Err(CommandError::PhaseIneligible {
                callsign: aircraft.callsign.clone(),
                command: parsed.command.kind(),
                phase: aircraft.phase(),
            });
        }

        let readback = self.apply(aircraft, &parsed.command, &traffic, config)?;
        info!("{}: {} accepted, \"{}\"", aircraft.callsign, parsed.command.kind(), readback);
        Ok(format!("{readback}, {}", aircraft.callsign))
    }

    fn apply(
        &self,
        aircraft: &mut Aircraft,
        command: &Command,
        traffic: &[AircraftSnapshot],
        config: &SimConfig,
    ) -> Result<String, CommandError> {
        let readback = match command {
            Command::Pushback { face } => self.pushback(aircraft, *face, config),
            Command::ClearedIfr => {
                aircraft.ifr_cleared = true;
                format!(
                    "cleared to {} as filed, squawk {}",
                    aircraft.destination,
                    phonetic::squawk(aircraft.squawk)
                )
            }
            Command::Taxi { runway, via } => self.taxi(aircraft, runway, via)?,
            Command::TaxiToGate { gate, via } => self.taxi_to_gate(aircraft, gate, via)?,
            Command::Exit { taxiway } => self.exit(aircraft, taxiway)?,
            Command::HoldShort { target: HoldShortTarget::Runway(id) } => {
                self.hold_short_runway(aircraft, id, config)?
            }
            Command::HoldShort { target: HoldShortTarget::Taxiway(id) } => self.hold_short_taxiway(aircraft, id)?,
            Command::HoldPosition => {
                aircraft.hold_short();
                "holding position".to_string()
            }
            Command::CrossRunway { runway } => self.cross_runway(aircraft, runway.as_deref())?,
            Command::ContinueTaxi => {
                if let Some(pending) = &aircraft.pending_runway_crossing {
                    return Err(CommandError::CrossingNotCleared(pending.clone()));
                }
                if aircraft.remaining_taxi_waypoints().is_empty() {
                    return Err(CommandError::InvalidClearance("no taxi route to continue".to_string()));
                }
                aircraft.resume_taxi();
                "continue taxi".to_string()
            }
            Command::LineUpAndWait { runway } => {
                let runway = self.departure_runway(aircraft, runway.as_deref())?;
                if self.runways.is_occupied(&runway.id, traffic) {
                    return Err(CommandError::RunwayOccupied(runway.id.clone()));
                }
                if !lined_up(aircraft) {
                    self.line_up(aircraft, runway);
                }
                format!("runway {}, line up and wait", phonetic::runway(&runway.id))
            }
            Command::ClearedTakeoff { runway, fly_heading } => {
                self.cleared_takeoff(aircraft, runway.as_deref(), *fly_heading, traffic, config)?
            }
            Command::CancelTakeoff => {
                if !aircraft.takeoff_clearance {
                    return Err(CommandError::InvalidClearance("no takeoff clearance to cancel".to_string()));
                }
                aircraft.takeoff_clearance = false;
                aircraft.takeoff_heading = None;
                "cancel takeoff clearance, holding".to_string()
            }
            Command::FlyHeading { heading } => {
                assign_heading(aircraft, *heading, TurnDirection::Auto);
                format!("fly heading {}", phonetic::heading(*heading))
            }
            Command::TurnHeading { heading, direction } => {
                assign_heading(aircraft, *heading, *direction);
                let side = if *direction == TurnDirection::Left { "left" } else { "right" };
                format!("turn {side} heading {}", phonetic::heading(*heading))
            }
            Command::Climb { altitude } => {
                if *altitude <= aircraft.altitude {
                    return Err(CommandError::InvalidClearance(format!(
                        "{} is below present altitude",
                        phonetic::altitude(*altitude)
                    )));
                }
                assign_altitude(aircraft, *altitude, Phase::Climbing);
                format!("climb and maintain {}", phonetic::altitude(*altitude))
            }
            Command::Descend { altitude } => {
                if *altitude >= aircraft.altitude {
                    return Err(CommandError::InvalidClearance(format!(
                        "{} is above present altitude",
                        phonetic::altitude(*altitude)
                    )));
                }
                if *altitude <= aircraft.field_elevation {
                    return Err(CommandError::InvalidClearance("altitude is below field elevation".to_string()));
                }
                assign_altitude(aircraft, *altitude, Phase::Descending);
                format!("descend and maintain {}", phonetic::altitude(*altitude))
            }
            Command::Maintain { altitude } => {
                let delta = *altitude - aircraft.altitude;
                let phase = if delta > config.flight.altitude_band_ft {
                    Phase::Climbing
                } else if delta < -config.flight.altitude_band_ft {
                    Phase::Descending
                } else {
                    Phase::Cruise
                };
                assign_altitude(aircraft, *altitude, phase);
                format!("maintain {}", phonetic::altitude(*altitude))
            }
            Command::Speed { knots } => {
                let limit = config.flight.speed_limit_kt;
                if *knots > limit && aircraft.altitude < config.flight.speed_limit_altitude_ft {
                    return Err(CommandError::AirspeedLimitExceeded { knots: *knots, limit });
                }
                let perf = aircraft.performance;
                if *knots < perf.min_speed || *knots > perf.max_speed {
                    return Err(CommandError::InvalidClearance(format!(
                        "{} is outside the {} speed range",
                        phonetic::speed(*knots),
                        aircraft.aircraft_type
                    )));
                }
                aircraft.target_speed = Some(*knots);
                format!("maintain {}", phonetic::speed(*knots))
            }
            Command::ResumeNormalSpeed => {
                aircraft.target_speed = None;
                "resume normal speed".to_string()
            }
            Command::ClearedApproach { runway } => {
                let runway = self.runway(runway)?;
                aircraft.localizer = Some(Localizer { threshold: runway.threshold, course: runway.heading });
                aircraft.approach_runway = Some(runway.id.clone());
                aircraft.ils_intercepted = false;
                aircraft.landing_clearance = false;
                aircraft.holding = None;
                aircraft.target_altitude = None;
                aircraft.transition(Phase::Approach);
                format!("cleared ILS runway {} approach", phonetic::runway(&runway.id))
            }
            Command::ClearedLand { runway } => self.cleared_land(aircraft, runway.as_deref(), traffic)?,
            Command::GoAround => {
                aircraft.go_around(&config.flight);
                let missed = aircraft.field_elevation + config.flight.missed_approach_agl_ft;
                format!("going around, climb and maintain {}", phonetic::altitude(missed))
            }
            Command::Hold => {
                if aircraft.phase().is_approach() {
                    aircraft.localizer = None;
                    aircraft.approach_runway = None;
                    aircraft.ils_intercepted = false;
                    aircraft.landing_clearance = false;
                    aircraft.target_altitude = Some(aircraft.altitude);
                }
                aircraft.enter_hold(config.flight.holding_radius_nm);
                "hold at present position, right turns".to_string()
            }
            Command::ExitHold => {
                aircraft.exit_hold();
                "leaving the hold".to_string()
            }
            Command::Squawk { code } => {
                aircraft.squawk = *code;
                format!("squawk {}", phonetic::squawk(*code))
            }
        };
        Ok(readback)
    }

    fn runway(&self, id: &str) -> Result<&RunwayInfo, CommandError> {
        self.runways.get(id).ok_or_else(|| CommandError::RunwayNotFound(normalize_runway_id(id)))
    }

    /// The named runway or the one already assigned, with no other crossing outstanding
    fn departure_runway(&self, aircraft: &Aircraft, id: Option<&str>) -> Result<&RunwayInfo, CommandError> {
        let id = id
            .or(aircraft.assigned_runway.as_deref())
            .ok_or_else(|| CommandError::InvalidClearance("no departure runway assigned".to_string()))?;
        let runway = self.runway(id)?;
        if let Some(pending) = &aircraft.pending_runway_crossing {
            if !same_runway(pending, runway) {
                return Err(CommandError::CrossingNotCleared(pending.clone()));
            }
        }
        Ok(runway)
    }

    fn check_taxiways(&self, via: &[String]) -> Result<(), CommandError> {
        match via.iter().find(|taxiway| !self.router.has_taxiway(taxiway)) {
            Some(missing) => Err(CommandError::TaxiwayNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    fn route(&self, from: Position, to: Position, via: &[String]) -> Result<Route, CommandError> {
        self.router
            .build_route(from, to, via)
            .ok_or_else(|| CommandError::InvalidClearance("no taxiway data for this airport".to_string()))
    }

    fn pushback(&self, aircraft: &mut Aircraft, face: Option<f64>, config: &SimConfig) -> String {
        let distance = config.ground.pushback_distance_ft;
        let tail = physics::normalize_heading(aircraft.heading + 180.0);
        let behind = geo::offset_ft(aircraft.position, tail, distance);

        // snap the tail point onto the graph when a node lies behind the aircraft
        let snapped = self
            .router
            .nearest_node(behind)
            .filter(|&index| {
                self.router.graph().node(index).is_some_and(|node| {
                    geo::distance_ft(behind, node.position) <= 2.0 * distance
                        && physics::heading_difference(tail, geo::bearing(aircraft.position, node.position)).abs() < 90.0
                })
            })
            .map(|index| self.router.waypoint(index));

        aircraft.pushback_waypoints = snapped.into_iter().collect();
        aircraft.pushback_waypoint_index = 0;
        aircraft.pushback_distance = 0.0;
        aircraft.pushback_target_distance = distance;
        aircraft.pushback_face_heading = face;
        aircraft.transition(Phase::PushbackPending);

        match face {
            Some(heading) => format!("push back approved, facing {}", phonetic::heading(heading)),
            None => "push back approved".to_string(),
        }
    }

    fn taxi(&self, aircraft: &mut Aircraft, runway: &str, via: &[String]) -> Result<String, CommandError> {
        if let Some(pending) = &aircraft.pending_runway_crossing {
            return Err(CommandError::CrossingNotCleared(pending.clone()));
        }
        let runway = self.runway(runway)?;
        self.check_taxiways(via)?;
        let route = self.route(aircraft.position, runway.threshold, via)?;

        aircraft.assign_taxi_route(route.waypoints, via.to_vec());
        aircraft.assigned_runway = Some(runway.id.clone());
        aircraft.departure_requested = true;
        if aircraft.phase() == Phase::HoldingShort {
            aircraft.resume_taxi();
        }
        Ok(format!("taxi to runway {}{}", phonetic::runway(&runway.id), via_phrase(via)))
    }

    fn taxi_to_gate(&self, aircraft: &mut Aircraft, gate: &str, via: &[String]) -> Result<String, CommandError> {
        let gate = self
            .gates
            .iter()
            .find(|g| g.id.eq_ignore_ascii_case(gate))
            .ok_or_else(|| CommandError::GateNotFound(gate.to_string()))?;
        self.check_taxiways(via)?;

        let mut route = self.route(aircraft.position, gate.position(), via)?;
        route.waypoints.push(TaxiWaypoint::new(gate.position(), format!("GATE {}", gate.id)));

        aircraft.assign_taxi_route(route.waypoints, via.to_vec());
        aircraft.gate = Some(gate.id.clone());
        match aircraft.phase() {
            Phase::HoldingShort => aircraft.resume_taxi(),
            Phase::Arrived => aircraft.transition(Phase::TaxiIn),
            _ => {}
        }
        Ok(format!("taxi to gate {}{}", gate.id, via_phrase(via)))
    }

    /// Leave the runway along `taxiway`, entering at the nearest node ahead
    fn exit(&self, aircraft: &mut Aircraft, taxiway: &str) -> Result<String, CommandError> {
        let graph = self.router.graph();
        let nodes = self.router.taxiway_nodes(taxiway);
        let distance = |index: usize| {
            graph.node(index).map_or(f64::INFINITY, |node| geo::distance_ft(aircraft.position, node.position))
        };
        let ahead = |index: usize| {
            graph.node(index).is_some_and(|node| {
                physics::heading_difference(aircraft.heading, geo::bearing(aircraft.position, node.position)).abs()
                    <= 90.0
            })
        };

        let entry = nodes
            .iter()
            .copied()
            .filter(|&index| ahead(index))
            .min_by_key(|&index| OrderedFloat(distance(index)))
            .or_else(|| nodes.iter().copied().min_by_key(|&index| OrderedFloat(distance(index))))
            .ok_or_else(|| CommandError::TaxiwayNotFound(taxiway.to_string()))?;

        let path = self.follow_taxiway(entry, taxiway);
        let waypoints = path.into_iter().map(|index| self.router.waypoint(index)).collect();
        aircraft.assign_taxi_route(waypoints, vec![taxiway.to_ascii_uppercase()]);
        Ok(format!("exit via {}", phonetic::taxiway(taxiway)))
    }

    /// Walk away from `entry` along nodes of `taxiway`, always to the neighbour farthest from the entry
    fn follow_taxiway(&self, entry: usize, taxiway: &str) -> Vec<usize> {
        let graph = self.router.graph();
        let taxiway = taxiway.to_ascii_uppercase();
        let Some(origin) = graph.node(entry).map(|node| node.position) else {
            return Vec::new();
        };

        let mut path = vec![entry];
        let mut visited: HashSet<usize> = HashSet::from([entry]);
        let mut current = entry;
        loop {
            let next = graph
                .neighbors(current)
                .iter()
                .map(|edge| edge.neighbor)
                .filter(|index| !visited.contains(index))
                .filter(|&index| graph.taxiways_at(index).is_some_and(|set| set.contains(&taxiway)))
                .max_by_key(|&index| {
                    OrderedFloat(graph.node(index).map_or(0.0, |node| geo::distance_ft(origin, node.position)))
                });
            let Some(next) = next else {
                break;
            };
            visited.insert(next);
            path.push(next);
            current = next;
        }
        path
    }

    fn hold_short_runway(&self, aircraft: &mut Aircraft, id: &str, config: &SimConfig) -> Result<String, CommandError> {
        let runway = self.runway(id)?;
        let half_width = config.separation.runway_half_width_ft;
        let zone = half_width + config.separation.hold_short_distance_ft;

        let start = aircraft.taxi_waypoint_index;
        let (offset, waypoint) = aircraft
            .remaining_taxi_waypoints()
            .iter()
            .enumerate()
            .find(|(_, waypoint)| runway.contains(waypoint.position, zone))
            .ok_or_else(|| {
                CommandError::InvalidClearance(format!("taxi route does not reach runway {}", runway.id))
            })?;

        // a hold point short of the pavement may still be taxied to
        let on_pavement = runway.contains(waypoint.position, half_width);
        let stop = start + offset + usize::from(!on_pavement);

        aircraft.hold_short_at = Some(stop);
        aircraft.pending_runway_crossing = Some(runway.id.clone());
        Ok(format!("hold short runway {}", phonetic::runway(&runway.id)))
    }

    fn hold_short_taxiway(&self, aircraft: &mut Aircraft, taxiway: &str) -> Result<String, CommandError> {
        if !self.router.has_taxiway(taxiway) {
            return Err(CommandError::TaxiwayNotFound(taxiway.to_string()));
        }
        let graph = self.router.graph();
        let taxiway = taxiway.to_ascii_uppercase();
        let on_taxiway = |waypoint: &TaxiWaypoint| {
            graph
                .node_index(&waypoint.node_id)
                .and_then(|index| graph.taxiways_at(index))
                .is_some_and(|set| set.contains(&taxiway))
        };

        let waypoints = &aircraft.taxi_waypoints;
        let stop = (aircraft.taxi_waypoint_index.max(1)..waypoints.len())
            .find(|&k| on_taxiway(&waypoints[k]) && !on_taxiway(&waypoints[k - 1]))
            .ok_or_else(|| CommandError::InvalidClearance(format!("taxi route does not reach taxiway {taxiway}")))?;

        aircraft.hold_short_at = Some(stop);
        Ok(format!("hold short of {}", phonetic::taxiway(&taxiway)))
    }

    fn cross_runway(&self, aircraft: &mut Aircraft, id: Option<&str>) -> Result<String, CommandError> {
        let id = id
            .map(str::to_string)
            .or_else(|| aircraft.pending_runway_crossing.clone())
            .ok_or_else(|| CommandError::InvalidClearance("no runway crossing pending".to_string()))?;
        let runway = self.runway(&id)?;

        if !aircraft.cleared_crossings.iter().any(|cleared| same_runway(cleared, runway)) {
            aircraft.cleared_crossings.push(runway.id.clone());
        }
        if aircraft.pending_runway_crossing.as_deref().is_some_and(|pending| same_runway(pending, runway)) {
            aircraft.pending_runway_crossing = None;
            aircraft.hold_short_at = None;
            if aircraft.phase() == Phase::HoldingShort {
                aircraft.resume_taxi();
            }
        }
        Ok(format!("cross runway {}", phonetic::runway(&runway.id)))
    }

    fn cleared_takeoff(
        &self,
        aircraft: &mut Aircraft,
        id: Option<&str>,
        fly_heading: Option<f64>,
        traffic: &[AircraftSnapshot],
        config: &SimConfig,
    ) -> Result<String, CommandError> {
        let runway = self.departure_runway(aircraft, id)?;
        if self.runways.is_occupied(&runway.id, traffic) {
            return Err(CommandError::RunwayOccupied(runway.id.clone()));
        }
        if self.runways.has_final_traffic(&runway.id, traffic) {
            return Err(CommandError::SeparationViolation(runway.id.clone()));
        }

        aircraft.takeoff_clearance = true;
        aircraft.takeoff_heading = Some(fly_heading.unwrap_or(runway.heading));
        aircraft.initial_climb_altitude = Some(aircraft.field_elevation + config.flight.initial_climb_ft);

        match aircraft.phase() {
            Phase::Lineup | Phase::HoldingShort if lined_up(aircraft) => {
                aircraft.departure_course = Some(runway.heading);
                aircraft.assigned_runway = Some(runway.id.clone());
                aircraft.held_from = None;
                aircraft.transition(Phase::Takeoff);
            }
            Phase::Lineup => {
                aircraft.departure_course = Some(runway.heading);
                aircraft.assigned_runway = Some(runway.id.clone());
            }
            _ => self.line_up(aircraft, runway),
        }

        let heading = fly_heading.map(|h| format!("fly heading {}, ", phonetic::heading(h))).unwrap_or_default();
        Ok(format!("runway {}, {heading}cleared for takeoff", phonetic::runway(&runway.id)))
    }

    /// Extend the remaining route onto the centreline and enter LINEUP
    fn line_up(&self, aircraft: &mut Aircraft, runway: &RunwayInfo) {
        let (threshold, course) = self.runways.lineup_position(&runway.id).unwrap_or((runway.threshold, runway.heading));
        let mut waypoints = aircraft.remaining_taxi_waypoints().to_vec();
        waypoints.push(TaxiWaypoint::new(threshold, format!("RWY {}", runway.id)));
        waypoints.push(TaxiWaypoint::new(geo::offset_ft(threshold, course, LINEUP_ROLL_FT), format!("RWY {} LINEUP", runway.id)));

        let taxiways = std::mem::take(&mut aircraft.taxi_route);
        aircraft.assign_taxi_route(waypoints, taxiways);
        aircraft.departure_course = Some(course);
        aircraft.assigned_runway = Some(runway.id.clone());
        if aircraft.pending_runway_crossing.as_deref().is_some_and(|pending| same_runway(pending, runway)) {
            aircraft.pending_runway_crossing = None;
        }
        aircraft.held_from = None;
        aircraft.transition(Phase::Lineup);
    }

    fn cleared_land(
        &self,
        aircraft: &mut Aircraft,
        id: Option<&str>,
        traffic: &[AircraftSnapshot],
    ) -> Result<String, CommandError> {
        let approach = aircraft
            .approach_runway
            .clone()
            .ok_or_else(|| CommandError::InvalidClearance("not cleared for an approach".to_string()))?;
        let runway = self.runway(id.unwrap_or(approach.as_str()))?;
        if runway.id != normalize_runway_id(&approach) {
            return Err(CommandError::InvalidClearance(format!("cleared for the runway {approach} approach")));
        }
        if self.runways.is_occupied(&runway.id, traffic) {
            return Err(CommandError::RunwayOccupied(runway.id.clone()));
        }

        aircraft.landing_clearance = true;
        Ok(format!("runway {}, cleared to land", phonetic::runway(&runway.id)))
    }
}

/// Exact, then case-insensitive, then a unique prefix of at least three characters
fn resolve_callsign(typed: &str, fleet: &HashMap<String, Aircraft>) -> Result<String, CommandError> {
    if fleet.contains_key(typed) {
        return Ok(typed.to_string());
    }
    if let Some(key) = fleet.keys().find(|key| key.eq_ignore_ascii_case(typed)) {
        return Ok(key.clone());
    }

    let typed = typed.to_ascii_uppercase();
    if typed.len() >= MIN_PREFIX_LEN {
        let mut matches: Vec<String> =
            fleet.keys().filter(|key| key.to_ascii_uppercase().starts_with(&typed)).cloned().collect();
        matches.sort();
        match matches.len() {
            0 => {}
            1 => return Ok(matches.remove(0)),
            _ => return Err(CommandError::AmbiguousCallsign { prefix: typed, matches }),
        }
    }
    Err(CommandError::AircraftNotFound(typed))
}

/// Phases in which each command can be accepted
fn eligible(command: &Command, aircraft: &Aircraft) -> bool {
    use Phase::*;

    let phase = aircraft.phase();
    match command {
        Command::Pushback { .. } => phase == Parked,
        Command::ClearedIfr => matches!(phase, Parked | PushbackPending | Pushback | TaxiOut | HoldingShort),
        Command::Taxi { .. } => match phase {
            PushbackPending | Pushback | TaxiOut => true,
            HoldingShort => aircraft.held_from != Some(TaxiIn),
            _ => false,
        },
        Command::TaxiToGate { .. } => match phase {
            Landing | TaxiIn | Arrived => true,
            HoldingShort => aircraft.held_from == Some(TaxiIn),
            _ => false,
        },
        Command::Exit { .. } => matches!(phase, Landing | TaxiIn),
        Command::HoldShort { .. } => matches!(phase, PushbackPending | Pushback | TaxiOut | TaxiIn | HoldingShort),
        Command::HoldPosition => matches!(phase, TaxiOut | TaxiIn | Lineup),
        Command::CrossRunway { .. } => matches!(phase, PushbackPending | Pushback | TaxiOut | TaxiIn | HoldingShort),
        Command::ContinueTaxi => phase == HoldingShort,
        Command::LineUpAndWait { .. } => matches!(phase, HoldingShort | TaxiOut),
        Command::ClearedTakeoff { .. } => matches!(phase, HoldingShort | Lineup | TaxiOut),
        Command::CancelTakeoff => matches!(phase, HoldingShort | Lineup | TaxiOut),
        Command::FlyHeading { .. } | Command::TurnHeading { .. } => phase == Takeoff || phase.is_enroute(),
        Command::Climb { .. } | Command::Descend { .. } | Command::Maintain { .. } => phase.is_enroute(),
        Command::Speed { .. } | Command::ResumeNormalSpeed => phase.is_airborne(),
        Command::ClearedApproach { .. } => phase.is_enroute() || phase == Approach,
        Command::ClearedLand { .. } | Command::GoAround => phase.is_approach(),
        Command::Hold => phase.is_airborne() && phase != Holding,
        Command::ExitHold => phase == Holding,
        Command::Squawk { .. } => true,
    }
}

fn same_runway(id: &str, runway: &RunwayInfo) -> bool {
    let id = normalize_runway_id(id);
    id == runway.id || id == runway.opposite
}

/// On the centreline with the line-up route used up, either still LINEUP or waiting in HOLDING_SHORT
fn lined_up(aircraft: &Aircraft) -> bool {
    let waiting = match aircraft.phase() {
        Phase::Lineup => true,
        Phase::HoldingShort => aircraft.held_from == Some(Phase::Lineup),
        _ => false,
    };
    waiting && aircraft.remaining_taxi_waypoints().is_empty()
}

fn assign_heading(aircraft: &mut Aircraft, heading: f64, direction: TurnDirection) {
    let heading = physics::normalize_heading(heading);
    match aircraft.phase() {
        Phase::Takeoff => aircraft.takeoff_heading = Some(heading),
        Phase::Holding => {
            aircraft.exit_hold();
            aircraft.target_heading = Some(heading);
        }
        _ => aircraft.target_heading = Some(heading),
    }
    aircraft.turn_direction = direction;
}

/// Set the altitude target; a holding aircraft changes level inside the hold
fn assign_altitude(aircraft: &mut Aircraft, altitude: f64, phase: Phase) {
    aircraft.target_altitude = Some(altitude);
    if aircraft.phase() != Phase::Holding {
        aircraft.transition(phase);
    }
}

fn via_phrase(via: &[String]) -> String {
    if via.is_empty() {
        return String::new();
    }
    let spoken: Vec<String> = via.iter().map(|taxiway| phonetic::taxiway(taxiway)).collect();
    format!(" via {}", spoken.join(" "))
}
