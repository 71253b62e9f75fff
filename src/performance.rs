use serde::{ Deserialize, Serialize };
use std::fmt;

/// Kinematic performance profile for an aircraft type
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Performance {
    /// Rotation speed in knots
    pub rotation_speed: f64,

    /// Takeoff roll acceleration in knots per second
    pub takeoff_accel: f64,

    /// Airborne acceleration/deceleration in knots per second
    pub airborne_accel: f64,

    /// Landing roll deceleration in knots per second
    pub landing_decel: f64,

    /// Climb rate in feet per minute
    pub climb_rate: f64,

    /// Descent rate in feet per minute
    pub descent_rate: f64,

    /// Airborne turn rate in degrees per second
    pub turn_rate: f64,

    pub climb_speed: f64,
    pub cruise_speed: f64,
    pub approach_speed: f64,

    /// Final approach reference speed
    pub landing_speed: f64,

    pub min_speed: f64,
    pub max_speed: f64,

    /// Default climb ceiling when no target altitude is assigned
    pub cruise_altitude: f64,
}

impl Default for Performance {
    /// Generic narrow-body jet
    fn default() -> Self {
        Self {
            rotation_speed: 145.0,
            takeoff_accel: 4.0,
            airborne_accel: 2.0,
            landing_decel: 4.0,
            climb_rate: 2500.0,
            descent_rate: 2000.0,
            turn_rate: 3.0,
            climb_speed: 250.0,
            cruise_speed: 280.0,
            approach_speed: 170.0,
            landing_speed: 140.0,
            min_speed: 130.0,
            max_speed: 340.0,
            cruise_altitude: 35000.0,
        }
    }
}

impl Performance {
    /// Performance data for an ICAO type designator, if the type is known
    pub fn for_type(aircraft_type: &str) -> Option<Self> {
        let base = Self::default();
        let profile = match aircraft_type.to_ascii_uppercase().as_str() {
            "A319" | "A320" | "A20N" | "A321" | "A21N" => Self { rotation_speed: 142.0, landing_speed: 137.0, ..base },
            "B737" | "B738" | "B739" | "B38M" | "B39M" => Self { rotation_speed: 145.0, landing_speed: 142.0, ..base },
            "E170" | "E175" | "E190" | "CRJ7" | "CRJ9" => Self {
                rotation_speed: 130.0,
                landing_speed: 128.0,
                approach_speed: 160.0,
                min_speed: 120.0,
                max_speed: 310.0,
                cruise_altitude: 33000.0,
                ..base
            },
            "B763" | "B772" | "B77W" | "B788" | "B789" | "A332" | "A333" | "A359" | "A35K" => Self {
                rotation_speed: 155.0,
                takeoff_accel: 3.2,
                landing_decel: 3.5,
                climb_rate: 2000.0,
                landing_speed: 148.0,
                approach_speed: 180.0,
                min_speed: 140.0,
                max_speed: 350.0,
                cruise_altitude: 37000.0,
                ..base
            },
            "B744" | "B748" | "A388" => Self {
                rotation_speed: 160.0,
                takeoff_accel: 3.0,
                landing_decel: 3.0,
                climb_rate: 1800.0,
                landing_speed: 150.0,
                approach_speed: 180.0,
                min_speed: 145.0,
                max_speed: 350.0,
                cruise_altitude: 37000.0,
                ..base
            },
            "C172" | "PA28" | "SR22" => Self {
                rotation_speed: 55.0,
                takeoff_accel: 2.5,
                airborne_accel: 1.5,
                landing_decel: 3.0,
                climb_rate: 700.0,
                descent_rate: 600.0,
                climb_speed: 80.0,
                cruise_speed: 115.0,
                approach_speed: 85.0,
                landing_speed: 65.0,
                min_speed: 55.0,
                max_speed: 150.0,
                cruise_altitude: 8500.0,
                ..base
            },
            "DH8D" | "AT76" | "PC12" => Self {
                rotation_speed: 110.0,
                takeoff_accel: 3.0,
                climb_rate: 1800.0,
                climb_speed: 200.0,
                cruise_speed: 250.0,
                approach_speed: 140.0,
                landing_speed: 115.0,
                min_speed: 105.0,
                max_speed: 280.0,
                cruise_altitude: 25000.0,
                ..base
            },
            _ => return None,
        };
        Some(profile)
    }
}

/// Wake turbulence category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeCategory {
    Super,
    Heavy,
    Medium,
    Small,
}

impl WakeCategory {
    /// Category for an ICAO type designator; unknown types are treated as medium
    pub fn for_type(aircraft_type: &str) -> Self {
        match aircraft_type.to_ascii_uppercase().as_str() {
            "A388" | "A225" => WakeCategory::Super,
            "B744" | "B748" | "B763" | "B772" | "B77W" | "B788" | "B789" | "A332" | "A333"
            | "A359" | "A35K" | "MD11" => WakeCategory::Heavy,
            "C172" | "PA28" | "SR22" | "PC12" | "BE20" => WakeCategory::Small,
            _ => WakeCategory::Medium,
        }
    }

    /// Required in-trail separation in nautical miles for `follower` behind `self`
    pub fn required_separation_nm(self, follower: WakeCategory) -> f64 {
        use WakeCategory::*;
        match (self, follower) {
            (Super, Super) | (Super, Heavy) => 6.0,
            (Super, Medium) => 7.0,
            (Super, Small) => 8.0,
            (Heavy, Super) | (Heavy, Heavy) => 4.0,
            (Heavy, Medium) | (Heavy, Small) => 5.0,
            _ => 3.0,
        }
    }
}

impl fmt::Display for WakeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WakeCategory::Super => "super",
            WakeCategory::Heavy => "heavy",
            WakeCategory::Medium => "medium",
            WakeCategory::Small => "small",
        };
        f.pad(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_table_matches_standard_minima() {
        assert_eq!(WakeCategory::Super.required_separation_nm(WakeCategory::Small), 8.0);
        assert_eq!(WakeCategory::Medium.required_separation_nm(WakeCategory::Medium), 3.0);
        assert_eq!(WakeCategory::Heavy.required_separation_nm(WakeCategory::Medium), 5.0);
        assert_eq!(WakeCategory::Small.required_separation_nm(WakeCategory::Super), 3.0);
    }

    #[test]
    fn categories_by_type() {
        assert_eq!(WakeCategory::for_type("A388"), WakeCategory::Super);
        assert_eq!(WakeCategory::for_type("b77w"), WakeCategory::Heavy);
        assert_eq!(WakeCategory::for_type("C172"), WakeCategory::Small);
        assert_eq!(WakeCategory::for_type("ZZZZ"), WakeCategory::Medium);
    }

    #[test]
    fn unknown_type_has_no_profile() {
        assert!(Performance::for_type("ZZZZ").is_none());
        let heavy = Performance::for_type("B77W").unwrap();
        assert!(heavy.rotation_speed > Performance::default().rotation_speed);
    }
}
