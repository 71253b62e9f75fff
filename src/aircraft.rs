//! One aircraft's mutable state and its phase state machine.
//!
//! [`Aircraft::update`] advances a single aircraft by `dt` simulated seconds. Other aircraft are
//! only visible through the read-only snapshot passed in, which is used for ground avoidance.

use tracing::{ debug, trace, warn };

use crate::config::{ FlightConfig, GroundConfig, SimConfig };
use crate::geo::{ self, FEET_PER_NM };
use crate::performance::Performance;
use crate::physics;
use crate::types::{
    AircraftSnapshot, HoldingPattern, Localizer, Phase, Position, TaxiWaypoint, TurnDirection,
};

/// Knots to feet per second
pub const KT_TO_FPS: f64 = FEET_PER_NM / 3600.0;

const HOLDING_SPEED_KT: f64 = 220.0;

/// Identity fields supplied by whoever spawns the aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub callsign: String,
    pub flight_number: String,
    pub aircraft_type: String,
    pub origin: String,
    pub destination: String,
    pub squawk: u16,
}

/// Full state of one simulated aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    pub callsign: String,
    pub flight_number: String,
    pub aircraft_type: String,
    pub origin: String,
    pub destination: String,

    pub position: Position,
    /// Feet MSL
    pub altitude: f64,
    /// Knots
    pub speed: f64,
    /// True degrees in [0, 360)
    pub heading: f64,

    pub target_altitude: Option<f64>,
    pub target_speed: Option<f64>,
    pub target_heading: Option<f64>,
    pub turn_direction: TurnDirection,

    pub taxi_waypoints: Vec<TaxiWaypoint>,
    pub taxi_waypoint_index: usize,
    /// Stop once the waypoint index reaches this value
    pub hold_short_at: Option<usize>,

    pub pushback_waypoints: Vec<TaxiWaypoint>,
    pub pushback_waypoint_index: usize,
    /// Feet travelled tail-first so far
    pub pushback_distance: f64,
    /// Straight-line pushback length when no waypoints are assigned
    pub pushback_target_distance: f64,
    /// Heading to snap to when the pushback completes
    pub pushback_face_heading: Option<f64>,
    pub pushback_origin: Position,

    pub ifr_cleared: bool,
    pub takeoff_clearance: bool,
    /// Heading assigned with the takeoff clearance
    pub takeoff_heading: Option<f64>,
    pub initial_climb_altitude: Option<f64>,
    /// Runway course followed during the takeoff roll
    pub departure_course: Option<f64>,

    pub approach_runway: Option<String>,
    pub localizer: Option<Localizer>,
    pub landing_clearance: bool,
    pub ils_intercepted: bool,

    phase: Phase,
    /// Simulated seconds spent in the current phase
    pub phase_time: f64,
    pub assigned_runway: Option<String>,
    /// Taxiway identifiers of the commanded route
    pub taxi_route: Vec<String>,
    pub departure_requested: bool,
    /// Transponder code, four octal digits
    pub squawk: u16,
    pub gate: Option<String>,
    pub pending_runway_crossing: Option<String>,
    pub cleared_crossings: Vec<String>,
    /// Taxi phase to resume after a hold short
    pub held_from: Option<Phase>,
    pub holding: Option<HoldingPattern>,

    pub field_elevation: f64,
    pub performance: Performance,
}

impl Aircraft {
    /// Aircraft parked at a gate
    pub fn parked(
        identity: Identity,
        gate: &str,
        position: Position,
        heading: f64,
        field_elevation: f64,
    ) -> Self {
        let mut aircraft = Self::base(identity, position, heading, field_elevation);
        aircraft.gate = Some(gate.to_string());
        aircraft
    }

    /// Aircraft entering the simulation in flight
    pub fn airborne(
        identity: Identity,
        position: Position,
        altitude: f64,
        heading: f64,
        speed: f64,
        field_elevation: f64,
    ) -> Self {
        let mut aircraft = Self::base(identity, position, heading, field_elevation);
        aircraft.altitude = altitude;
        aircraft.speed = speed;
        aircraft.ifr_cleared = true;
        aircraft.target_altitude = Some(altitude);
        aircraft.target_heading = Some(aircraft.heading);
        aircraft.phase = Phase::Cruise;
        aircraft
    }

    fn base(identity: Identity, position: Position, heading: f64, field_elevation: f64) -> Self {
        let performance = Performance::for_type(&identity.aircraft_type).unwrap_or_else(|| {
            warn!(
                "{}: no performance data for type {}, using default profile",
                identity.callsign,
                identity.aircraft_type
            );
            Performance::default()
        });

        Self {
            callsign: identity.callsign,
            flight_number: identity.flight_number,
            aircraft_type: identity.aircraft_type,
            origin: identity.origin,
            destination: identity.destination,
            position,
            altitude: field_elevation,
            speed: 0.0,
            heading: physics::normalize_heading(heading),
            target_altitude: None,
            target_speed: None,
            target_heading: None,
            turn_direction: TurnDirection::Auto,
            taxi_waypoints: Vec::new(),
            taxi_waypoint_index: 0,
            hold_short_at: None,
            pushback_waypoints: Vec::new(),
            pushback_waypoint_index: 0,
            pushback_distance: 0.0,
            pushback_target_distance: 0.0,
            pushback_face_heading: None,
            pushback_origin: position,
            ifr_cleared: false,
            takeoff_clearance: false,
            takeoff_heading: None,
            initial_climb_altitude: None,
            departure_course: None,
            approach_runway: None,
            localizer: None,
            landing_clearance: false,
            ils_intercepted: false,
            phase: Phase::Parked,
            phase_time: 0.0,
            assigned_runway: None,
            taxi_route: Vec::new(),
            departure_requested: false,
            squawk: identity.squawk,
            gate: None,
            pending_runway_crossing: None,
            cleared_crossings: Vec::new(),
            held_from: None,
            holding: None,
            field_elevation,
            performance,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Explicit phase transition; a no-op when already in `to`
    pub fn transition(&mut self, to: Phase) {
        if self.phase == to {
            return;
        }
        debug!("{}: {} -> {}", self.callsign, self.phase, to);
        self.phase = to;
        self.phase_time = 0.0;
    }

    /// Read-only view for peers and monitors
    pub fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            callsign: self.callsign.clone(),
            aircraft_type: self.aircraft_type.clone(),
            phase: self.phase,
            position: self.position,
            altitude: self.altitude,
            heading: self.heading,
            speed: self.speed,
            assigned_runway: self.assigned_runway.clone(),
            approach_runway: self.approach_runway.clone(),
            has_taxi_route: self.taxi_waypoint_index < self.taxi_waypoints.len(),
            pending_runway_crossing: self.pending_runway_crossing.clone(),
            cleared_crossings: self.cleared_crossings.clone(),
        }
    }

    /// Remaining taxi waypoints
    pub fn remaining_taxi_waypoints(&self) -> &[TaxiWaypoint] {
        self.taxi_waypoints.get(self.taxi_waypoint_index..).unwrap_or(&[])
    }

    /// Replace the taxi route
    pub fn assign_taxi_route(&mut self, waypoints: Vec<TaxiWaypoint>, taxiways: Vec<String>) {
        self.taxi_waypoints = waypoints;
        self.taxi_waypoint_index = 0;
        self.hold_short_at = None;
        self.taxi_route = taxiways;
    }

    /// Advance this aircraft by `dt` seconds
    pub fn update(&mut self, dt: f64, peers: &[AircraftSnapshot], config: &SimConfig) {
        if dt <= 0.0 {
            return;
        }
        self.phase_time += dt;

        match self.phase {
            Phase::Parked | Phase::PushbackPending | Phase::HoldingShort | Phase::Arrived => {
                self.hold_still(&config.ground)
            }
            Phase::Pushback => self.update_pushback(dt, &config.ground),
            Phase::TaxiOut | Phase::TaxiIn | Phase::Lineup => {
                self.update_taxi(dt, peers, &config.ground)
            }
            Phase::Takeoff => self.update_takeoff(dt, config),
            Phase::Climbing | Phase::Descending => self.update_climb_descent(dt, &config.flight),
            Phase::Cruise => self.update_cruise(dt, &config.flight),
            Phase::Approach => self.update_approach(dt, &config.flight),
            Phase::Final => self.update_final(dt, &config.flight),
            Phase::Landing => self.update_landing(dt, &config.ground),
            Phase::Holding => self.update_holding(dt, &config.flight),
        }
    }

    fn hold_still(&mut self, ground: &GroundConfig) {
        self.speed = 0.0;
        self.altitude = self.field_elevation;

        if self.phase == Phase::PushbackPending && self.phase_time >= ground.pushback_delay_secs {
            self.pushback_origin = self.position;
            self.pushback_distance = 0.0;
            self.pushback_waypoint_index = 0;
            self.transition(Phase::Pushback);
        }
    }

    // Ground movement

    fn update_pushback(&mut self, dt: f64, ground: &GroundConfig) {
        self.altitude = self.field_elevation;
        self.speed = ground.pushback_speed_kt;

        if self.pushback_waypoints.is_empty() {
            let tail = physics::normalize_heading(self.heading + 180.0);
            self.position = physics::update_position(self.position, tail, self.speed, dt);
            self.pushback_distance += self.speed * KT_TO_FPS * dt;
            if self.pushback_distance >= self.pushback_target_distance {
                self.finish_pushback();
            }
            return;
        }

        while let Some(target) = self.pushback_waypoints.get(self.pushback_waypoint_index) {
            if geo::distance_ft(self.position, target.position) > ground.waypoint_reached_ft {
                break;
            }
            self.pushback_waypoint_index += 1;
        }
        let index = self.pushback_waypoint_index;
        let Some(target) = self.pushback_waypoints.get(index).map(|w| w.position) else {
            self.finish_pushback();
            return;
        };

        let distance = geo::distance_ft(self.position, target);
        let mut nose = physics::normalize_heading(geo::bearing(self.position, target) + 180.0);

        if let Some(next) = self.pushback_waypoints.get(index + 1) {
            if distance < ground.pushback_blend_ft {
                let next_nose = physics::normalize_heading(geo::bearing(target, next.position) + 180.0);
                let blend = 1.0 - distance / ground.pushback_blend_ft;
                nose += physics::heading_difference(nose, next_nose) * blend;
            }
        }

        let previous = match index {
            0 => self.pushback_origin,
            _ => self.pushback_waypoints[index - 1].position,
        };
        let cross_track = geo::cross_track_ft(self.position, previous, target);
        let limit = ground.pushback_correction_limit_deg;
        let correction = (-ground.cross_track_gain * cross_track).clamp(-limit, limit);
        let desired_nose = physics::normalize_heading(nose + correction);

        self.heading = physics::update_heading(self.heading, desired_nose, ground.ground_turn_rate, dt);
        let tail = physics::normalize_heading(self.heading + 180.0);
        self.position = physics::update_position(self.position, tail, self.speed, dt);
        self.pushback_distance += self.speed * KT_TO_FPS * dt;
    }

    fn finish_pushback(&mut self) {
        self.speed = 0.0;
        if let Some(face) = self.pushback_face_heading.take() {
            self.heading = physics::normalize_heading(face);
        }
        self.transition(Phase::TaxiOut);
    }

    fn update_taxi(&mut self, dt: f64, peers: &[AircraftSnapshot], ground: &GroundConfig) {
        self.altitude = self.field_elevation;

        // Skip every waypoint already reached or passed
        while let Some(target) = self.taxi_waypoints.get(self.taxi_waypoint_index) {
            let reached = geo::distance_ft(self.position, target.position) <= ground.waypoint_reached_ft;
            let passed = self.taxi_waypoint_index > 0 && {
                let previous = self.taxi_waypoints[self.taxi_waypoint_index - 1].position;
                geo::along_track_ft(self.position, previous, target.position)
                    >= geo::distance_ft(previous, target.position)
            };
            if !(reached || passed) {
                break;
            }
            trace!("{}: reached taxi waypoint {}", self.callsign, target.node_id);
            self.taxi_waypoint_index += 1;
        }

        let index = self.taxi_waypoint_index;
        if self.hold_short_at.is_some_and(|stop| index >= stop) {
            self.hold_short_at = None;
            self.hold_short();
            return;
        }
        let Some(target) = self.taxi_waypoints.get(index).map(|w| w.position) else {
            self.finish_taxi();
            return;
        };

        let distance = geo::distance_ft(self.position, target);
        let bearing = geo::bearing(self.position, target);

        let desired = match index {
            0 => bearing,
            _ => {
                let previous = self.taxi_waypoints[index - 1].position;
                let course = geo::bearing(previous, target);
                let cross_track = geo::cross_track_ft(self.position, previous, target);
                let limit = ground.taxi_correction_limit_deg;
                let correction = (-ground.cross_track_gain * cross_track).clamp(-limit, limit);
                physics::normalize_heading(course + correction)
            }
        };

        let base_speed = match self.phase {
            Phase::Lineup => ground.lineup_speed_kt,
            _ => ground.taxi_speed_kt,
        };
        let mut target_speed = base_speed;

        let heading_error = physics::heading_difference(self.heading, desired).abs();
        target_speed = target_speed.min(turn_speed(heading_error, base_speed, ground));
        if heading_error > 90.0 {
            target_speed = target_speed.min(ground.creep_speed_kt);
        }

        let next = match self.hold_short_at {
            Some(stop) if stop <= index + 1 => None,
            _ => self.taxi_waypoints.get(index + 1),
        };
        match next {
            Some(next) if distance < ground.turn_lookahead_ft => {
                let turn = physics::heading_difference(bearing, geo::bearing(target, next.position)).abs();
                target_speed = target_speed.min(turn_speed(turn, base_speed, ground));
            }
            None if distance < ground.slow_radius_ft => {
                let creep = ground.creep_speed_kt;
                let taper = creep + (base_speed - creep) * (distance / ground.slow_radius_ft);
                target_speed = target_speed.min(taper);
            }
            _ => {}
        }

        target_speed *= self.traffic_factor(peers, ground);

        let accel = if target_speed < self.speed { ground.ground_brake } else { ground.ground_accel };
        self.speed = physics::update_speed(self.speed, target_speed, accel, dt);
        self.heading = physics::update_heading(self.heading, desired, ground.ground_turn_rate, dt);
        self.position = physics::update_position(self.position, self.heading, self.speed, dt);
    }

    /// Slow-down factor in [0, 1] for ground traffic ahead; zero at the hard-stop distance
    fn traffic_factor(&self, peers: &[AircraftSnapshot], ground: &GroundConfig) -> f64 {
        let span = (ground.traffic_warning_ft - ground.traffic_stop_ft).max(1.0);

        peers
            .iter()
            .filter(|peer| peer.callsign != self.callsign && peer.phase.is_ground())
            .filter_map(|peer| {
                let distance = geo::distance_ft(self.position, peer.position);
                if distance > ground.traffic_warning_ft {
                    return None;
                }
                let relative = physics::heading_difference(
                    self.heading,
                    geo::bearing(self.position, peer.position),
                );
                if relative.abs() > ground.traffic_cone_deg {
                    return None;
                }
                let t = ((distance - ground.traffic_stop_ft) / span).clamp(0.0, 1.0);
                Some(t * t * (3.0 - 2.0 * t))
            })
            .fold(1.0, f64::min)
    }

    fn finish_taxi(&mut self) {
        match self.phase {
            Phase::TaxiOut | Phase::Lineup if self.takeoff_clearance => {
                self.transition(Phase::Takeoff);
            }
            Phase::TaxiOut => {
                self.speed = 0.0;
                self.transition(Phase::HoldingShort);
            }
            // waits on the centreline, resumable as LINEUP
            Phase::Lineup => self.hold_short(),
            Phase::TaxiIn => {
                self.speed = 0.0;
                self.transition(Phase::Arrived);
            }
            _ => {}
        }
    }

    /// Stop at the current position, remembering which taxi phase to resume
    pub fn hold_short(&mut self) {
        if self.phase.is_taxiing() {
            self.held_from = Some(self.phase);
        }
        self.speed = 0.0;
        self.transition(Phase::HoldingShort);
    }

    /// Automatic stop in front of a runway the aircraft is not cleared onto
    pub fn stop_for_runway(&mut self, runway: &str) {
        if self.phase != Phase::TaxiOut {
            return;
        }
        warn!("{}: stopped short of runway {} without crossing clearance", self.callsign, runway);
        self.pending_runway_crossing = Some(runway.to_string());
        self.hold_short();
    }

    /// Leave HOLDING_SHORT toward the phase it was entered from
    pub fn resume_taxi(&mut self) {
        let phase = self.held_from.take().unwrap_or(Phase::TaxiOut);
        self.transition(phase);
    }

    // Flight

    fn update_takeoff(&mut self, dt: f64, config: &SimConfig) {
        let perf = self.performance;
        let field = self.field_elevation;
        let climb_target = self.initial_climb_altitude.unwrap_or(field + config.flight.initial_climb_ft);

        let roll_target = perf.climb_speed.max(perf.rotation_speed + 20.0);
        self.speed = physics::update_speed(self.speed, roll_target, perf.takeoff_accel, dt);
        if let Some(course) = self.departure_course {
            self.heading = physics::update_heading(self.heading, course, config.ground.ground_turn_rate, dt);
        }

        if self.speed >= perf.rotation_speed {
            self.altitude = physics::update_altitude(self.altitude, climb_target, perf.climb_rate, dt);
        } else {
            self.altitude = field;
        }
        self.position = physics::update_position(self.position, self.heading, self.speed, dt);

        if self.altitude > field + config.flight.liftoff_margin_ft {
            self.target_heading = Some(self.takeoff_heading.unwrap_or(self.heading));
            self.target_altitude = Some(climb_target);
            self.turn_direction = TurnDirection::Auto;
            self.transition(Phase::Climbing);
        }
    }

    fn update_climb_descent(&mut self, dt: f64, flight: &FlightConfig) {
        let perf = self.performance;
        let target = self.target_altitude.unwrap_or(match self.phase {
            Phase::Climbing => perf.cruise_altitude,
            _ => self.field_elevation + flight.approach_altitude_agl_ft,
        });
        let rate = if target > self.altitude { perf.climb_rate } else { perf.descent_rate };
        self.altitude = physics::update_altitude(self.altitude, target, rate, dt);

        let default_speed = match self.phase {
            Phase::Climbing => perf.climb_speed,
            _ => perf.cruise_speed,
        };
        self.fly(dt, flight, default_speed);

        if (self.altitude - target).abs() <= flight.altitude_capture_ft {
            self.transition(Phase::Cruise);
        }
    }

    fn update_cruise(&mut self, dt: f64, flight: &FlightConfig) {
        let perf = self.performance;
        let target = self.target_altitude.unwrap_or(self.altitude);
        let delta = target - self.altitude;

        if delta > flight.altitude_band_ft {
            self.transition(Phase::Climbing);
        } else if delta < -flight.altitude_band_ft {
            self.transition(Phase::Descending);
        } else {
            let rate = if delta > 0.0 { perf.climb_rate } else { perf.descent_rate };
            self.altitude = physics::update_altitude(self.altitude, target, rate, dt);
        }

        self.fly(dt, flight, perf.cruise_speed);
    }

    fn update_approach(&mut self, dt: f64, flight: &FlightConfig) {
        let perf = self.performance;
        let field = self.field_elevation;

        self.track_localizer(flight);
        if self.ils_intercepted {
            self.descend_on_glide_path(dt, flight);
        } else {
            let floor = field + flight.approach_altitude_agl_ft;
            if self.altitude > floor {
                self.altitude = physics::update_altitude(self.altitude, floor, perf.descent_rate, dt);
            }
        }
        self.fly(dt, flight, perf.approach_speed);

        if self.altitude - field < flight.final_agl_ft {
            self.transition(Phase::Final);
        }
    }

    fn update_final(&mut self, dt: f64, flight: &FlightConfig) {
        let field = self.field_elevation;

        self.track_localizer(flight);
        self.descend_on_glide_path(dt, flight);
        self.fly(dt, flight, self.performance.landing_speed);

        let height = self.altitude - field;
        if !self.landing_clearance && height <= flight.decision_height_ft {
            warn!("{}: no landing clearance at decision height, going around", self.callsign);
            self.go_around(flight);
            return;
        }
        if height <= flight.touchdown_margin_ft {
            self.altitude = field;
            self.transition(Phase::Landing);
        }
    }

    fn update_landing(&mut self, dt: f64, ground: &GroundConfig) {
        self.altitude = self.field_elevation;
        self.speed = physics::update_speed(self.speed, 0.0, self.performance.landing_decel, dt);
        self.position = physics::update_position(self.position, self.heading, self.speed, dt);

        if self.speed <= ground.min_taxi_speed_kt {
            self.transition(Phase::TaxiIn);
        }
    }

    fn update_holding(&mut self, dt: f64, flight: &FlightConfig) {
        let perf = self.performance;
        let Some(mut hold) = self.holding else {
            self.transition(Phase::Descending);
            return;
        };

        let target_altitude = self.target_altitude.unwrap_or(self.altitude);
        let rate = if target_altitude > self.altitude { perf.climb_rate } else { perf.descent_rate };
        self.altitude = physics::update_altitude(self.altitude, target_altitude, rate, dt);

        let mut target_speed = self.target_speed.unwrap_or(HOLDING_SPEED_KT.min(perf.cruise_speed));
        if self.altitude < flight.speed_limit_altitude_ft {
            target_speed = target_speed.min(flight.speed_limit_kt);
        }
        self.speed = physics::update_speed(self.speed, target_speed, perf.airborne_accel, dt);

        let radius_ft = hold.radius_nm * FEET_PER_NM;
        if radius_ft > 0.0 {
            let rate_deg = (self.speed * KT_TO_FPS / radius_ft).to_degrees();
            hold.angle = physics::normalize_heading(hold.angle + rate_deg * dt);
        }
        self.position = geo::destination(hold.fix, hold.angle, hold.radius_nm);
        self.heading = physics::normalize_heading(hold.angle + 90.0);
        self.holding = Some(hold);
    }

    /// Converge speed and heading toward targets, then move
    fn fly(&mut self, dt: f64, flight: &FlightConfig, default_speed: f64) {
        let perf = self.performance;
        let mut target_speed = self.target_speed.unwrap_or(default_speed);
        if self.altitude < flight.speed_limit_altitude_ft {
            target_speed = target_speed.min(flight.speed_limit_kt);
        }
        self.speed = physics::update_speed(self.speed, target_speed, perf.airborne_accel, dt);

        if let Some(target) = self.target_heading {
            self.heading = physics::turn_toward(self.heading, target, perf.turn_rate, dt, self.turn_direction);
            if physics::heading_difference(self.heading, target).abs() < 1e-9 {
                self.turn_direction = TurnDirection::Auto;
            }
        }
        self.position = physics::update_position(self.position, self.heading, self.speed, dt);
    }

    /// Steer onto the localizer and flag the intercept once established
    fn track_localizer(&mut self, flight: &FlightConfig) {
        let Some(localizer) = self.localizer else {
            return;
        };

        let outer = geo::destination(localizer.threshold, localizer.course + 180.0, 10.0);
        let cross_track = geo::cross_track_ft(self.position, outer, localizer.threshold);
        let limit = flight.intercept_angle_deg;
        let correction = (-cross_track / FEET_PER_NM * limit).clamp(-limit, limit);

        self.target_heading = Some(physics::normalize_heading(localizer.course + correction));
        self.turn_direction = TurnDirection::Auto;

        if !self.ils_intercepted
            && cross_track.abs() <= flight.localizer_capture_ft
            && physics::heading_difference(self.heading, localizer.course).abs() <= limit
        {
            debug!("{}: established on localizer", self.callsign);
            self.ils_intercepted = true;
        }
    }

    fn descend_on_glide_path(&mut self, dt: f64, flight: &FlightConfig) {
        let slope = flight.glide_slope_deg.to_radians().tan();
        // vertical speed = horizontal speed * tan(glide slope)
        let glide_rate_fpm = self.speed * KT_TO_FPS * 60.0 * slope;

        let target = match self.localizer {
            Some(localizer) => {
                self.field_elevation + geo::distance_ft(self.position, localizer.threshold) * slope
            }
            None => self.field_elevation,
        };
        if target >= self.altitude {
            return;
        }
        let rate = if self.altitude - target > 100.0 {
            glide_rate_fpm * flight.glide_capture_factor
        } else {
            glide_rate_fpm
        };
        self.altitude = physics::update_altitude(self.altitude, target, rate, dt).max(self.field_elevation);
    }

    /// Abandon the approach and climb straight ahead to the missed approach altitude
    pub fn go_around(&mut self, flight: &FlightConfig) {
        self.landing_clearance = false;
        self.ils_intercepted = false;
        self.target_altitude = Some(self.field_elevation + flight.missed_approach_agl_ft);
        self.target_heading = Some(self.localizer.map_or(self.heading, |l| l.course));
        self.target_speed = None;
        self.turn_direction = TurnDirection::Auto;
        self.localizer = None;
        self.approach_runway = None;
        self.transition(Phase::Climbing);
    }

    /// Enter a right-hand orbit through the present position
    pub fn enter_hold(&mut self, radius_nm: f64) {
        let fix = geo::destination(self.position, self.heading + 90.0, radius_nm);
        let angle = geo::bearing(fix, self.position);
        self.holding = Some(HoldingPattern { fix, angle, radius_nm });
        self.target_heading = None;
        self.turn_direction = TurnDirection::Auto;
        self.transition(Phase::Holding);
    }

    pub fn exit_hold(&mut self) {
        self.holding = None;
        self.target_heading = Some(self.heading);
        self.transition(Phase::Descending);
    }
}

/// Taxi speed limit for a heading change of `turn` degrees
fn turn_speed(turn: f64, base: f64, ground: &GroundConfig) -> f64 {
    if turn > 60.0 {
        ground.sharp_turn_speed_kt
    } else if turn > 30.0 {
        ground.moderate_turn_speed_kt
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD: f64 = 13.0;
    const ORIGIN: Position = Position::new(37.6, -122.4);

    fn identity(callsign: &str, aircraft_type: &str) -> Identity {
        Identity {
            callsign: callsign.to_string(),
            flight_number: "123".to_string(),
            aircraft_type: aircraft_type.to_string(),
            origin: "KSIM".to_string(),
            destination: "KLAX".to_string(),
            squawk: 1200,
        }
    }

    fn on_ground(callsign: &str, phase: Phase, heading: f64) -> Aircraft {
        let mut aircraft = Aircraft::parked(identity(callsign, "A320"), "G1", ORIGIN, heading, FIELD);
        aircraft.transition(phase);
        aircraft
    }

    fn run_until(aircraft: &mut Aircraft, phase: Phase, dt: f64, max_ticks: usize) -> usize {
        let config = SimConfig::default();
        for tick in 0..max_ticks {
            if aircraft.phase() == phase {
                return tick;
            }
            let peers = vec![aircraft.snapshot()];
            aircraft.update(dt, &peers, &config);
        }
        panic!("{} never reached {phase}, stuck in {}", aircraft.callsign, aircraft.phase());
    }

    #[test]
    fn unknown_type_keeps_default_performance() {
        let aircraft = Aircraft::parked(identity("TST1", "ZZZZ"), "G1", ORIGIN, 0.0, FIELD);
        assert_eq!(aircraft.performance, Performance::default());
        assert_eq!(aircraft.phase(), Phase::Parked);
    }

    #[test]
    fn parked_aircraft_stays_pinned() {
        let mut aircraft = on_ground("TST1", Phase::Parked, 90.0);
        aircraft.speed = 12.0;
        aircraft.altitude = 400.0;
        aircraft.update(1.0, &[], &SimConfig::default());
        assert_eq!(aircraft.speed, 0.0);
        assert_eq!(aircraft.altitude, FIELD);
        assert_eq!(aircraft.position, ORIGIN);
    }

    #[test]
    fn pushback_waits_for_the_tug() {
        let mut aircraft = on_ground("TST1", Phase::PushbackPending, 90.0);
        let config = SimConfig::default();
        aircraft.update(1.0, &[], &config);
        assert_eq!(aircraft.phase(), Phase::PushbackPending);
        aircraft.update(config.ground.pushback_delay_secs, &[], &config);
        assert_eq!(aircraft.phase(), Phase::Pushback);
    }

    #[test]
    fn straight_pushback_reverses_the_target_distance() {
        let mut aircraft = on_ground("TST1", Phase::Pushback, 90.0);
        aircraft.pushback_target_distance = 150.0;
        run_until(&mut aircraft, Phase::TaxiOut, 0.5, 1000);

        let travelled = geo::distance_ft(ORIGIN, aircraft.position);
        assert!((travelled - 150.0).abs() < 5.0, "travelled {travelled}");
        // tail first: moved west while facing east
        assert!(aircraft.position.lon < ORIGIN.lon);
        assert_eq!(aircraft.heading, 90.0);
        assert_eq!(aircraft.speed, 0.0);
    }

    #[test]
    fn pushback_along_waypoints_snaps_to_face_heading() {
        let mut aircraft = on_ground("TST1", Phase::Pushback, 180.0);
        let behind = geo::offset_ft(ORIGIN, 0.0, 200.0);
        aircraft.pushback_waypoints = vec![TaxiWaypoint::new(behind, "L1")];
        aircraft.pushback_face_heading = Some(270.0);
        run_until(&mut aircraft, Phase::TaxiOut, 0.5, 2000);

        assert!(geo::distance_ft(aircraft.position, behind) <= 30.0);
        assert_eq!(aircraft.heading, 270.0);
    }

    #[test]
    fn taxi_follows_route_to_hold_short_without_heading_jumps() {
        let config = SimConfig::default();
        let mut aircraft = on_ground("TST1", Phase::TaxiOut, 0.0);
        let a = geo::offset_ft(ORIGIN, 0.0, 500.0);
        let b = geo::offset_ft(a, 90.0, 800.0);
        aircraft.assign_taxi_route(
            vec![
                TaxiWaypoint::new(ORIGIN, "N0"),
                TaxiWaypoint::new(a, "N1"),
                TaxiWaypoint::new(b, "N2"),
            ],
            vec!["A".to_string()],
        );

        let dt = 0.5;
        let max_step = config.ground.ground_turn_rate * dt + 1e-6;
        for _ in 0..4000 {
            if aircraft.phase() == Phase::HoldingShort {
                break;
            }
            let before = aircraft.heading;
            aircraft.update(dt, &[aircraft.snapshot()], &config);
            assert!(physics::heading_difference(before, aircraft.heading).abs() <= max_step);
            assert!(aircraft.taxi_waypoint_index <= aircraft.taxi_waypoints.len());
        }

        assert_eq!(aircraft.phase(), Phase::HoldingShort);
        assert!(geo::distance_ft(aircraft.position, b) <= config.ground.waypoint_reached_ft + 5.0);
    }

    #[test]
    fn hold_short_point_stops_mid_route_and_resumes() {
        let mut aircraft = on_ground("TST1", Phase::TaxiOut, 0.0);
        let a = geo::offset_ft(ORIGIN, 0.0, 400.0);
        let b = geo::offset_ft(a, 0.0, 400.0);
        aircraft.assign_taxi_route(vec![TaxiWaypoint::new(a, "N1"), TaxiWaypoint::new(b, "N2")], Vec::new());
        aircraft.hold_short_at = Some(1);

        run_until(&mut aircraft, Phase::HoldingShort, 0.5, 2000);
        assert!(geo::distance_ft(aircraft.position, a) <= 35.0);
        assert_eq!(aircraft.taxi_waypoint_index, 1);
        assert_eq!(aircraft.held_from, Some(Phase::TaxiOut));

        aircraft.resume_taxi();
        assert_eq!(aircraft.phase(), Phase::TaxiOut);
        run_until(&mut aircraft, Phase::HoldingShort, 0.5, 2000);
        assert!(geo::distance_ft(aircraft.position, b) <= 35.0);
    }

    #[test]
    fn taxi_with_takeoff_clearance_rolls_straight_into_takeoff() {
        let mut aircraft = on_ground("TST1", Phase::TaxiOut, 0.0);
        aircraft.takeoff_clearance = true;
        aircraft.assign_taxi_route(vec![TaxiWaypoint::new(geo::offset_ft(ORIGIN, 0.0, 100.0), "N1")], Vec::new());
        run_until(&mut aircraft, Phase::Takeoff, 0.5, 1000);
    }

    #[test]
    fn taxi_in_ends_at_arrived() {
        let mut aircraft = on_ground("TST1", Phase::TaxiIn, 90.0);
        aircraft.assign_taxi_route(vec![TaxiWaypoint::new(geo::offset_ft(ORIGIN, 90.0, 300.0), "GATE G1")], Vec::new());
        run_until(&mut aircraft, Phase::Arrived, 0.5, 1000);
        assert_eq!(aircraft.speed, 0.0);
    }

    #[test]
    fn traffic_ahead_brings_taxiing_aircraft_to_a_stop() {
        let config = SimConfig::default();
        let mut aircraft = on_ground("TST1", Phase::TaxiOut, 0.0);
        aircraft.assign_taxi_route(vec![TaxiWaypoint::new(geo::offset_ft(ORIGIN, 0.0, 2000.0), "N1")], Vec::new());

        let blocker = on_ground("TST2", Phase::HoldingShort, 0.0);
        let mut blocker_snapshot = blocker.snapshot();
        blocker_snapshot.position = geo::offset_ft(ORIGIN, 0.0, 120.0);

        for _ in 0..100 {
            let peers = vec![aircraft.snapshot(), blocker_snapshot.clone()];
            aircraft.update(0.5, &peers, &config);
        }
        assert_eq!(aircraft.speed, 0.0);
        assert_eq!(aircraft.position, ORIGIN);

        // same aircraft behind us does not matter
        blocker_snapshot.position = geo::offset_ft(ORIGIN, 180.0, 120.0);
        for _ in 0..20 {
            let peers = vec![aircraft.snapshot(), blocker_snapshot.clone()];
            aircraft.update(0.5, &peers, &config);
        }
        assert!(aircraft.speed > 0.0);
    }

    #[test]
    fn takeoff_becomes_climbing_with_cleared_heading() {
        let mut aircraft = on_ground("TST1", Phase::Takeoff, 280.0);
        aircraft.takeoff_clearance = true;
        aircraft.takeoff_heading = Some(290.0);
        aircraft.initial_climb_altitude = Some(5000.0);
        run_until(&mut aircraft, Phase::Climbing, 0.5, 1000);

        assert!(aircraft.altitude > FIELD + 50.0);
        assert!(aircraft.speed >= aircraft.performance.rotation_speed);
        assert_eq!(aircraft.target_heading, Some(290.0));
        assert_eq!(aircraft.target_altitude, Some(5000.0));
    }

    #[test]
    fn climb_levels_off_into_cruise_and_respects_speed_limit() {
        let config = SimConfig::default();
        let mut aircraft = Aircraft::airborne(identity("TST1", "A320"), ORIGIN, 3000.0, 90.0, 200.0, FIELD);
        aircraft.target_altitude = Some(9000.0);
        aircraft.target_speed = Some(300.0);

        aircraft.update(0.5, &[], &config);
        assert_eq!(aircraft.phase(), Phase::Climbing);

        for _ in 0..2000 {
            aircraft.update(0.5, &[], &config);
            assert!(aircraft.speed <= config.flight.speed_limit_kt + 1e-9);
            if aircraft.phase() == Phase::Cruise {
                break;
            }
        }
        assert_eq!(aircraft.phase(), Phase::Cruise);
        assert!((aircraft.altitude - 9000.0).abs() <= config.flight.altitude_capture_ft);
    }

    #[test]
    fn forced_turn_direction_is_honoured_then_cleared() {
        let config = SimConfig::default();
        let mut aircraft = Aircraft::airborne(identity("TST1", "A320"), ORIGIN, 8000.0, 350.0, 220.0, FIELD);
        aircraft.target_heading = Some(10.0);
        aircraft.turn_direction = TurnDirection::Left;

        aircraft.update(1.0, &[], &config);
        assert!((aircraft.heading - 347.0).abs() < 1e-9);

        for _ in 0..200 {
            aircraft.update(1.0, &[], &config);
        }
        assert!((aircraft.heading - 10.0).abs() < 1e-9);
        assert_eq!(aircraft.turn_direction, TurnDirection::Auto);
    }

    #[test]
    fn holding_stays_on_the_circle_with_tangent_heading() {
        let config = SimConfig::default();
        let mut aircraft = Aircraft::airborne(identity("TST1", "A320"), ORIGIN, 6000.0, 90.0, 220.0, FIELD);
        aircraft.enter_hold(2.0);
        let fix = aircraft.holding.unwrap().fix;

        for _ in 0..600 {
            let before = aircraft.heading;
            aircraft.update(1.0, &[], &config);
            let hold = aircraft.holding.unwrap();
            assert!((geo::distance_nm(fix, aircraft.position) - 2.0).abs() < 1e-3);
            assert!((aircraft.heading - physics::normalize_heading(hold.angle + 90.0)).abs() < 1e-9);
            assert!(physics::heading_difference(before, aircraft.heading).abs() <= aircraft.performance.turn_rate);
        }

        aircraft.exit_hold();
        assert_eq!(aircraft.phase(), Phase::Descending);
    }

    fn on_final(landing_clearance: bool) -> Aircraft {
        let threshold = ORIGIN;
        let start = geo::offset_ft(threshold, 100.0, 12_000.0);
        let slope = 3.0_f64.to_radians().tan();
        let mut aircraft = Aircraft::airborne(
            identity("TST1", "A320"),
            start,
            FIELD + 12_000.0 * slope,
            280.0,
            140.0,
            FIELD,
        );
        aircraft.target_altitude = None;
        aircraft.localizer = Some(Localizer { threshold, course: 280.0 });
        aircraft.approach_runway = Some("28R".to_string());
        aircraft.ils_intercepted = true;
        aircraft.landing_clearance = landing_clearance;
        aircraft.transition(Phase::Final);
        aircraft
    }

    #[test]
    fn cleared_final_lands_and_rolls_out() {
        let mut aircraft = on_final(true);
        run_until(&mut aircraft, Phase::Landing, 0.5, 2000);
        assert_eq!(aircraft.altitude, FIELD);
        run_until(&mut aircraft, Phase::TaxiIn, 0.5, 2000);
        assert!(aircraft.speed <= SimConfig::default().ground.min_taxi_speed_kt);
    }

    #[test]
    fn uncleared_final_goes_around_at_decision_height() {
        let mut aircraft = on_final(false);
        run_until(&mut aircraft, Phase::Climbing, 0.5, 2000);
        assert!(aircraft.altitude > FIELD);
        assert!(aircraft.localizer.is_none());
        assert_eq!(aircraft.target_altitude, Some(FIELD + 3000.0));
    }

    #[test]
    fn runway_stop_only_applies_while_taxiing_out() {
        let mut aircraft = on_ground("TST1", Phase::TaxiOut, 0.0);
        aircraft.stop_for_runway("01");
        assert_eq!(aircraft.phase(), Phase::HoldingShort);
        assert_eq!(aircraft.pending_runway_crossing.as_deref(), Some("01"));
        assert_eq!(aircraft.held_from, Some(Phase::TaxiOut));

        let mut parked = on_ground("TST2", Phase::Parked, 0.0);
        parked.stop_for_runway("01");
        assert_eq!(parked.phase(), Phase::Parked);
    }
}
