//! Controller phraseology to structured commands.

use crate::taxiway::Router;
use crate::types::TurnDirection;

#[derive(Debug, Clone, PartialEq)]
pub enum HoldShortTarget {
    Runway(String),
    Taxiway(String),
}

/// One recognised instruction and exactly the parameters it needs
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pushback { face: Option<f64> },
    ClearedIfr,
    Taxi { runway: String, via: Vec<String> },
    TaxiToGate { gate: String, via: Vec<String> },
    Exit { taxiway: String },
    HoldShort { target: HoldShortTarget },
    HoldPosition,
    CrossRunway { runway: Option<String> },
    ContinueTaxi,
    LineUpAndWait { runway: Option<String> },
    ClearedTakeoff { runway: Option<String>, fly_heading: Option<f64> },
    CancelTakeoff,
    FlyHeading { heading: f64 },
    TurnHeading { heading: f64, direction: TurnDirection },
    Climb { altitude: f64 },
    Descend { altitude: f64 },
    Maintain { altitude: f64 },
    Speed { knots: f64 },
    ResumeNormalSpeed,
    ClearedApproach { runway: String },
    ClearedLand { runway: Option<String> },
    GoAround,
    Hold,
    ExitHold,
    Squawk { code: u16 },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Pushback { .. } => "PUSHBACK",
            Command::ClearedIfr => "CLEARED_IFR",
            Command::Taxi { .. } => "TAXI",
            Command::TaxiToGate { .. } => "TAXI_TO_GATE",
            Command::Exit { .. } => "EXIT",
            Command::HoldShort { .. } => "HOLD_SHORT",
            Command::HoldPosition => "HOLD_POSITION",
            Command::CrossRunway { .. } => "CROSS_RUNWAY",
            Command::ContinueTaxi => "CONTINUE_TAXI",
            Command::LineUpAndWait { .. } => "LINE_UP_AND_WAIT",
            Command::ClearedTakeoff { .. } => "CLEARED_TAKEOFF",
            Command::CancelTakeoff => "CANCEL_TAKEOFF",
            Command::FlyHeading { .. } => "FLY_HEADING",
            Command::TurnHeading { .. } => "TURN_HEADING",
            Command::Climb { .. } => "CLIMB",
            Command::Descend { .. } => "DESCEND",
            Command::Maintain { .. } => "MAINTAIN",
            Command::Speed { .. } => "SPEED",
            Command::ResumeNormalSpeed => "RESUME_NORMAL_SPEED",
            Command::ClearedApproach { .. } => "CLEARED_APPROACH",
            Command::ClearedLand { .. } => "CLEARED_LAND",
            Command::GoAround => "GO_AROUND",
            Command::Hold => "HOLD",
            Command::ExitHold => "EXIT_HOLD",
            Command::Squawk { .. } => "SQUAWK",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    /// First token as typed, upper-cased
    pub callsign: String,
    pub command: Command,
}

/// Parse `<callsign> <instruction>`; `None` when no grammar pattern matches
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let tokens: Vec<String> = input
        .split_whitespace()
        .map(|token| token.trim_end_matches(',').to_ascii_uppercase())
        .filter(|token| !token.is_empty())
        .collect();
    let (callsign, rest) = tokens.split_first()?;
    let words: Vec<&str> = rest.iter().map(String::as_str).collect();

    Some(ParsedCommand {
        callsign: callsign.clone(),
        command: parse_instruction(&words)?,
    })
}

fn parse_instruction(words: &[&str]) -> Option<Command> {
    let command = match words {
        ["PUSH", "BACK", rest @ ..] | ["PUSHBACK", rest @ ..] => Command::Pushback { face: parse_face(rest)? },

        ["CLEARED", "IFR", ..] | ["CLEARED", "AS", "FILED"] => Command::ClearedIfr,
        ["CLEARED", "FOR", "TAKEOFF", rest @ ..] => parse_takeoff(skip(rest, &["RUNWAY"]))?,
        ["CLEARED", "TO", "LAND", rest @ ..] => Command::ClearedLand { runway: optional_runway(rest)? },
        ["CLEARED", rest @ ..] => {
            let rest = skip(skip(skip(rest, &["ILS"]), &["APPROACH"]), &["RUNWAY"]);
            match rest {
                [runway] if is_runway(runway) => Command::ClearedApproach { runway: runway.to_string() },
                _ => return None,
            }
        }

        ["TAXI", "TO", "GATE", gate, rest @ ..] => Command::TaxiToGate {
            gate: gate.to_string(),
            via: parse_via(rest)?,
        },
        ["TAXI", rest @ ..] => match skip(skip(rest, &["TO"]), &["RUNWAY"]) {
            [runway, via @ ..] if is_runway(runway) => Command::Taxi {
                runway: runway.to_string(),
                via: parse_via(via)?,
            },
            _ => return None,
        },

        ["EXIT", "HOLD"] | ["CANCEL", "HOLD"] | ["RESUME", "OWN", "NAVIGATION"] => Command::ExitHold,
        ["EXIT", rest @ ..] => match skip(skip(skip(rest, &["RUNWAY"]), &["VIA"]), &["TAXIWAY"]) {
            [taxiway] => Command::Exit { taxiway: route_token(taxiway) },
            _ => return None,
        },

        ["HOLD", "SHORT", "RUNWAY", id] if is_runway(id) => Command::HoldShort {
            target: HoldShortTarget::Runway(id.to_string()),
        },
        ["HOLD", "SHORT", "TAXIWAY", id] => Command::HoldShort {
            target: HoldShortTarget::Taxiway(route_token(id)),
        },
        ["HOLD", "SHORT", id] => Command::HoldShort {
            target: if is_runway(id) {
                HoldShortTarget::Runway(id.to_string())
            } else {
                HoldShortTarget::Taxiway(route_token(id))
            },
        },
        ["HOLD", "POSITION"] => Command::HoldPosition,
        ["HOLD"] | ["HOLD", "AS", "PUBLISHED"] | ["HOLD", "AT", "PRESENT", "POSITION"] => Command::Hold,

        ["CROSS", rest @ ..] => Command::CrossRunway { runway: optional_runway(rest)? },
        ["CONTINUE", "TAXI"] => Command::ContinueTaxi,
        ["LINE", "UP", "AND", "WAIT", rest @ ..] | ["LINEUP", "AND", "WAIT", rest @ ..] => {
            Command::LineUpAndWait { runway: optional_runway(rest)? }
        }
        ["CANCEL", "TAKEOFF", ..] | ["ABORT", "TAKEOFF"] => Command::CancelTakeoff,

        ["FLY", "HEADING", heading] => Command::FlyHeading { heading: parse_heading(heading)? },
        ["TURN", direction @ ("LEFT" | "RIGHT"), rest @ ..] => match skip(rest, &["HEADING"]) {
            [heading] => Command::TurnHeading {
                heading: parse_heading(heading)?,
                direction: if *direction == "LEFT" { TurnDirection::Left } else { TurnDirection::Right },
            },
            _ => return None,
        },

        ["CLIMB", rest @ ..] => Command::Climb { altitude: parse_altitude(skip(rest, &["AND", "MAINTAIN"]))? },
        ["DESCEND", rest @ ..] => Command::Descend { altitude: parse_altitude(skip(rest, &["AND", "MAINTAIN"]))? },
        ["MAINTAIN", "SPEED", rest @ ..] => Command::Speed { knots: parse_speed(rest)? },
        ["MAINTAIN", rest @ ..] => Command::Maintain { altitude: parse_altitude(rest)? },

        ["SPEED", rest @ ..] | ["REDUCE", "SPEED", rest @ ..] | ["INCREASE", "SPEED", rest @ ..] => {
            Command::Speed { knots: parse_speed(rest)? }
        }
        ["RESUME", "NORMAL", "SPEED"] => Command::ResumeNormalSpeed,

        ["GO", "AROUND"] => Command::GoAround,
        ["SQUAWK", code] => Command::Squawk { code: parse_squawk(code)? },

        _ => return None,
    };
    Some(command)
}

/// Drop `filler` from the front of `words` when it is present in full
fn skip<'a, 'b>(words: &'a [&'b str], filler: &[&str]) -> &'a [&'b str] {
    let matched = words.iter().zip(filler).take_while(|(w, f)| w == f).count();
    if matched == filler.len() { &words[matched..] } else { words }
}

/// `28R`, `9`, `01C`
fn is_runway(token: &str) -> bool {
    let digits = token.chars().take_while(char::is_ascii_digit).count();
    let suffix = &token[digits..];
    (1..=2).contains(&digits) && matches!(suffix, "" | "L" | "R" | "C")
}

fn route_token(token: &str) -> String {
    Router::parse_route_tokens(&[token]).pop().unwrap_or_else(|| token.to_string())
}

fn optional_runway(rest: &[&str]) -> Option<Option<String>> {
    match skip(rest, &["RUNWAY"]) {
        [] => Some(None),
        [runway] if is_runway(runway) => Some(Some(runway.to_string())),
        _ => None,
    }
}

fn parse_via(rest: &[&str]) -> Option<Vec<String>> {
    match rest {
        [] => Some(Vec::new()),
        ["VIA", route @ ..] if !route.is_empty() => Some(Router::parse_route_tokens(route)),
        _ => None,
    }
}

fn parse_face(rest: &[&str]) -> Option<Option<f64>> {
    match rest {
        [] => Some(None),
        ["FACE" | "FACING", direction] | ["FACE" | "FACING", direction, "HEADING"] => {
            let heading = match *direction {
                "NORTH" => 0.0,
                "EAST" => 90.0,
                "SOUTH" => 180.0,
                "WEST" => 270.0,
                other => parse_heading(other)?,
            };
            Some(Some(heading))
        }
        _ => None,
    }
}

fn parse_takeoff(rest: &[&str]) -> Option<Command> {
    let (runway, rest) = match rest {
        [runway, rest @ ..] if is_runway(runway) => (Some(runway.to_string()), rest),
        _ => (None, rest),
    };
    let fly_heading = match rest {
        [] => None,
        ["FLY", "HEADING", heading] => Some(parse_heading(heading)?),
        _ => return None,
    };
    Some(Command::ClearedTakeoff { runway, fly_heading })
}

fn parse_heading(token: &str) -> Option<f64> {
    let heading: u16 = token.parse().ok()?;
    (heading <= 360).then_some(f64::from(heading))
}

/// `5000`, `FL240`, `FLIGHT LEVEL 240`
fn parse_altitude(rest: &[&str]) -> Option<f64> {
    let feet: u32 = match rest {
        ["FLIGHT", "LEVEL", level] => level.parse::<u32>().ok()?.checked_mul(100)?,
        [token] => match token.strip_prefix("FL") {
            Some(level) => level.parse::<u32>().ok()?.checked_mul(100)?,
            None => token.parse().ok()?,
        },
        [token, "FEET" | "FT"] => token.parse().ok()?,
        _ => return None,
    };
    (1..=60_000).contains(&feet).then_some(f64::from(feet))
}

fn parse_speed(rest: &[&str]) -> Option<f64> {
    let knots: u16 = match skip(rest, &["TO"]) {
        [token] | [token, "KNOTS" | "KTS"] => token.parse().ok()?,
        _ => return None,
    };
    (knots > 0).then_some(f64::from(knots))
}

/// Four octal digits, kept as their decimal reading (`0421` is 421)
fn parse_squawk(token: &str) -> Option<u16> {
    if token.len() != 4 || !token.chars().all(|c| ('0'..='7').contains(&c)) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(input: &str) -> Command {
        parse_command(input).unwrap_or_else(|| panic!("no parse for {input:?}")).command
    }

    #[test]
    fn takeoff_with_heading() {
        let parsed = parse_command("UAL123 CLEARED FOR TAKEOFF 28R FLY HEADING 290").unwrap();
        assert_eq!(parsed.callsign, "UAL123");
        assert_eq!(parsed.command, Command::ClearedTakeoff {
            runway: Some("28R".into()),
            fly_heading: Some(290.0),
        });
        assert_eq!(parsed.command.kind(), "CLEARED_TAKEOFF");
    }

    #[test]
    fn input_is_case_insensitive() {
        assert_eq!(parse_command("ual123 go around").unwrap().callsign, "UAL123");
        assert_eq!(command("ual123 cleared for takeoff runway 28r"), Command::ClearedTakeoff {
            runway: Some("28R".into()),
            fly_heading: None,
        });
    }

    #[test]
    fn taxi_forms() {
        assert_eq!(command("DAL1 TAXI 28R VIA ALPHA"), Command::Taxi {
            runway: "28R".into(),
            via: vec!["A".into()],
        });
        assert_eq!(command("DAL1 TAXI TO RUNWAY 1 VIA A B3"), Command::Taxi {
            runway: "1".into(),
            via: vec!["A".into(), "B3".into()],
        });
        assert_eq!(command("DAL1 TAXI TO GATE G2 VIA BRAVO ALPHA"), Command::TaxiToGate {
            gate: "G2".into(),
            via: vec!["B".into(), "A".into()],
        });
        assert!(parse_command("DAL1 TAXI ALPHA").is_none());
        assert!(parse_command("DAL1 TAXI 28R VIA").is_none());
    }

    #[test]
    fn hold_short_targets() {
        assert_eq!(command("DAL1 HOLD SHORT RUNWAY 01"), Command::HoldShort {
            target: HoldShortTarget::Runway("01".into()),
        });
        assert_eq!(command("DAL1 HOLD SHORT BRAVO"), Command::HoldShort {
            target: HoldShortTarget::Taxiway("B".into()),
        });
        assert_eq!(command("DAL1 HOLD POSITION"), Command::HoldPosition);
        assert_eq!(command("DAL1 HOLD"), Command::Hold);
        assert_eq!(command("DAL1 HOLD AT PRESENT POSITION"), Command::Hold);
    }

    #[test]
    fn altitude_forms() {
        assert_eq!(command("N1 CLIMB AND MAINTAIN 5000"), Command::Climb { altitude: 5000.0 });
        assert_eq!(command("N1 DESCEND AND MAINTAIN FL240"), Command::Descend { altitude: 24_000.0 });
        assert_eq!(command("N1 MAINTAIN FLIGHT LEVEL 350"), Command::Maintain { altitude: 35_000.0 });
        assert!(parse_command("N1 CLIMB AND MAINTAIN 0").is_none());
    }

    #[test]
    fn oversized_flight_levels_do_not_parse() {
        assert!(parse_command("UAL1 CLIMB AND MAINTAIN FL50000000").is_none());
        assert!(parse_command("UAL1 MAINTAIN FLIGHT LEVEL 4294967295").is_none());
        assert!(parse_command("UAL1 CLIMB AND MAINTAIN FL700").is_none());
    }

    #[test]
    fn heading_and_speed_forms() {
        assert_eq!(command("N1 TURN LEFT HEADING 180"), Command::TurnHeading {
            heading: 180.0,
            direction: TurnDirection::Left,
        });
        assert_eq!(command("N1 FLY HEADING 090"), Command::FlyHeading { heading: 90.0 });
        assert!(parse_command("N1 FLY HEADING 400").is_none());
        assert_eq!(command("N1 REDUCE SPEED TO 210 KNOTS"), Command::Speed { knots: 210.0 });
        assert_eq!(command("N1 MAINTAIN SPEED 180"), Command::Speed { knots: 180.0 });
        assert_eq!(command("N1 RESUME NORMAL SPEED"), Command::ResumeNormalSpeed);
    }

    #[test]
    fn ground_and_approach_forms() {
        assert_eq!(command("N1 PUSH BACK"), Command::Pushback { face: None });
        assert_eq!(command("N1 PUSHBACK FACING WEST"), Command::Pushback { face: Some(270.0) });
        assert_eq!(command("N1 CLEARED AS FILED"), Command::ClearedIfr);
        assert_eq!(command("N1 CANCEL TAKEOFF CLEARANCE"), Command::CancelTakeoff);
        assert_eq!(command("N1 EXIT VIA BRAVO"), Command::Exit { taxiway: "B".into() });
        assert_eq!(command("N1 EXIT HOLD"), Command::ExitHold);
        assert_eq!(command("N1 CROSS RUNWAY 01"), Command::CrossRunway { runway: Some("01".into()) });
        assert_eq!(command("N1 LINE UP AND WAIT 28R"), Command::LineUpAndWait { runway: Some("28R".into()) });
        assert_eq!(command("N1 CLEARED ILS APPROACH RUNWAY 28R"), Command::ClearedApproach { runway: "28R".into() });
        assert_eq!(command("N1 CLEARED TO LAND"), Command::ClearedLand { runway: None });
        assert_eq!(command("N1 SQUAWK 4271"), Command::Squawk { code: 4271 });
        assert!(parse_command("N1 SQUAWK 4281").is_none());
    }

    #[test]
    fn unmatched_input_yields_none() {
        assert!(parse_command("").is_none());
        assert!(parse_command("UAL123").is_none());
        assert!(parse_command("UAL123 DO A BARREL ROLL").is_none());
        assert!(parse_command("UAL123 CLEARED TO KLAX").is_none());
    }
}
