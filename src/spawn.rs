use crate::aircraft::{ Aircraft, Identity };
use crate::airport::{ AirportData, TrafficRecord };
use crate::types::Position;

/// Codes reserved for emergencies that are never handed out
const RESERVED_SQUAWKS: [u16; 3] = [7500, 7600, 7700];

const FIRST_SQUAWK: u16 = 4201;
const FIRST_FLIGHT_NUMBER: u32 = 100;

/// Discrete transponder code generator cycling through the octal code space
#[derive(Debug, Clone)]
pub struct SquawkSequence {
    next: u16,
}

impl Default for SquawkSequence {
    fn default() -> Self {
        Self::starting_at(FIRST_SQUAWK)
    }
}

impl SquawkSequence {
    pub fn starting_at(code: u16) -> Self {
        Self { next: code }
    }

    pub fn next_code(&mut self) -> u16 {
        loop {
            let code = self.next;
            self.next = next_octal(code);
            if is_discrete(code) && !RESERVED_SQUAWKS.contains(&code) {
                return code;
            }
        }
    }
}

/// Every digit 0-7 and not the VFR or all-zero code
fn is_discrete(code: u16) -> bool {
    let digits_ok = format!("{code:04}").chars().all(|c| c <= '7');
    digits_ok && code != 0 && code != 1200
}

/// Increment as a four digit octal number, wrapping 7777 to 0001
fn next_octal(code: u16) -> u16 {
    let mut digits: Vec<u16> = format!("{code:04}").chars().filter_map(|c| c.to_digit(10)).map(|d| d as u16).collect();
    for digit in digits.iter_mut().rev() {
        if *digit >= 7 {
            *digit = 0;
        } else {
            *digit += 1;
            return digits.iter().fold(0, |acc, d| acc * 10 + d);
        }
    }
    1
}

/// Builds fully populated aircraft with explicit counter state
#[derive(Debug, Clone)]
pub struct Spawner {
    squawks: SquawkSequence,
    next_flight_number: u32,
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new(SquawkSequence::default(), FIRST_FLIGHT_NUMBER)
    }
}

impl Spawner {
    pub fn new(squawks: SquawkSequence, first_flight_number: u32) -> Self {
        Self { squawks, next_flight_number: first_flight_number }
    }

    fn identity(&mut self, callsign: Option<&str>, airline: &str, aircraft_type: &str, origin: &str, destination: &str) -> Identity {
        let (callsign, flight_number) = match callsign {
            Some(callsign) => {
                let number = callsign.trim_start_matches(|c: char| c.is_ascii_alphabetic());
                (callsign.to_ascii_uppercase(), number.to_string())
            }
            None => {
                let number = self.next_flight_number;
                self.next_flight_number += 1;
                (format!("{}{number}", airline.to_ascii_uppercase()), number.to_string())
            }
        };

        Identity {
            callsign,
            flight_number,
            aircraft_type: aircraft_type.to_ascii_uppercase(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            squawk: self.squawks.next_code(),
        }
    }

    /// Departure parked at `gate`; `None` if the airport has no such gate
    pub fn parked(
        &mut self,
        airport: &AirportData,
        callsign: Option<&str>,
        airline: &str,
        aircraft_type: &str,
        gate: &str,
        destination: &str,
    ) -> Option<Aircraft> {
        let gate = airport.gate(gate)?;
        let identity = self.identity(callsign, airline, aircraft_type, &airport.icao, destination);
        Some(Aircraft::parked(identity, &gate.id, gate.position(), gate.heading, airport.elevation_ft))
    }

    /// Arrival already in flight toward `airport`
    #[allow(clippy::too_many_arguments)]
    pub fn arrival(
        &mut self,
        airport: &AirportData,
        callsign: Option<&str>,
        airline: &str,
        aircraft_type: &str,
        origin: &str,
        position: Position,
        altitude: f64,
        heading: f64,
        speed: f64,
    ) -> Aircraft {
        let identity = self.identity(callsign, airline, aircraft_type, origin, &airport.icao);
        Aircraft::airborne(identity, position, altitude, heading, speed, airport.elevation_ft)
    }

    /// Aircraft for one initial traffic record
    pub fn from_record(&mut self, airport: &AirportData, record: &TrafficRecord) -> Option<Aircraft> {
        match record {
            TrafficRecord::Departure { callsign, airline, aircraft_type, gate, destination } => {
                self.parked(airport, callsign.as_deref(), airline, aircraft_type, gate, destination)
            }
            TrafficRecord::Arrival { callsign, airline, aircraft_type, origin, lat, lon, altitude, heading, speed } => {
                Some(self.arrival(
                    airport,
                    callsign.as_deref(),
                    airline,
                    aircraft_type,
                    origin,
                    Position::new(*lat, *lon),
                    *altitude,
                    *heading,
                    *speed,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::sample_airport;
    use crate::types::Phase;

    #[test]
    fn squawks_stay_octal_and_skip_reserved_codes() {
        let mut squawks = SquawkSequence::starting_at(7477);
        let codes: Vec<u16> = (0..3).map(|_| squawks.next_code()).collect();
        assert_eq!(codes, [7477, 7501, 7502]);

        let mut squawks = SquawkSequence::starting_at(7777);
        assert_eq!(squawks.next_code(), 7777);
        assert_eq!(squawks.next_code(), 1);
    }

    #[test]
    fn lengthy_sequence_never_repeats_soon_or_leaves_octal() {
        let mut squawks = SquawkSequence::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let code = squawks.next_code();
            assert!(is_discrete(code));
            assert!(seen.insert(code));
        }
    }

    #[test]
    fn flight_numbers_come_from_the_spawner() {
        let airport = sample_airport();
        let mut first = Spawner::default();
        let mut second = Spawner::default();

        let a = first.parked(&airport, None, "dal", "B738", "G2", "KSEA").unwrap();
        let b = first.parked(&airport, None, "DAL", "B738", "G3", "KSEA").unwrap();
        let c = second.parked(&airport, None, "DAL", "B738", "G3", "KSEA").unwrap();

        assert_eq!(a.callsign, "DAL100");
        assert_eq!(b.callsign, "DAL101");
        assert_eq!(c.callsign, "DAL100");
        assert_ne!(a.squawk, b.squawk);
        assert_eq!(a.phase(), Phase::Parked);
        assert_eq!(a.gate.as_deref(), Some("G2"));
        assert_eq!(a.origin, "KSIM");
    }

    #[test]
    fn initial_traffic_is_fully_populated() {
        let airport = sample_airport();
        let mut spawner = Spawner::default();
        let fleet: Vec<Aircraft> = airport.traffic.iter().filter_map(|r| spawner.from_record(&airport, r)).collect();

        assert_eq!(fleet.len(), 3);
        assert_eq!(fleet[0].callsign, "UAL123");
        assert_eq!(fleet[0].flight_number, "123");
        assert_eq!(fleet[2].phase(), Phase::Cruise);
        assert_eq!(fleet[2].destination, "KSIM");
        assert!(spawner.parked(&airport, None, "UAL", "A320", "G9", "KLAX").is_none());
    }
}
