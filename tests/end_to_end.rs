use towersim::airport::sample_airport;
use towersim::config::SimConfig;
use towersim::physics;
use towersim::state::Simulation;
use towersim::types::Phase;

const DT: f64 = 0.5;

fn simulation() -> Simulation {
    let sim = Simulation::new(sample_airport(), SimConfig::default());
    sim.spawn_initial_traffic();
    sim
}

/// Tick until `callsign` reaches `phase`, checking heading continuity and runway discipline
fn run_until(sim: &Simulation, callsign: &str, phase: Phase, max_ticks: usize) {
    let config = sim.get_config();
    let half_width = config.separation.runway_half_width_ft;

    for _ in 0..max_ticks {
        let before = sim.get_aircraft_by_callsign(callsign).unwrap();
        if before.phase() == phase {
            return;
        }
        sim.tick(DT);
        let after = sim.get_aircraft_by_callsign(callsign).unwrap();

        let rate = config.ground.ground_turn_rate.max(after.performance.turn_rate);
        let change = physics::heading_difference(before.heading, after.heading).abs();
        assert!(
            change <= rate * DT + 1e-6,
            "{callsign} heading jumped {change:.1} deg in {} -> {}",
            before.phase(),
            after.phase()
        );
        assert!(after.heading >= 0.0 && after.heading < 360.0);
        assert!(after.taxi_waypoint_index <= after.taxi_waypoints.len());

        if after.phase().is_ground() {
            assert!(after.altitude >= after.field_elevation);
            for runway in sim.runways().iter() {
                if !runway.contains(after.position, half_width) {
                    continue;
                }
                let cleared = after.assigned_runway.as_deref().is_some_and(|id| id == runway.id || id == runway.opposite)
                    || after.cleared_crossings.iter().any(|id| *id == runway.id || *id == runway.opposite);
                assert!(cleared, "{callsign} entered runway {} in {}", runway.id, after.phase());
            }
        }
    }
    panic!("{callsign} never reached {phase}");
}

#[test]
fn gate_to_climb_out() {
    let sim = simulation();

    assert_eq!(sim.execute("UAL123 PUSH BACK").unwrap(), "push back approved, UAL123");
    assert_eq!(
        sim.execute("UAL123 TAXI 28R VIA ALPHA").unwrap(),
        "taxi to runway two eight right via alpha, UAL123"
    );

    run_until(&sim, "UAL123", Phase::Pushback, 100);
    run_until(&sim, "UAL123", Phase::TaxiOut, 1000);
    run_until(&sim, "UAL123", Phase::HoldingShort, 4000);

    let holding = sim.get_aircraft_by_callsign("UAL123").unwrap();
    assert!(holding.pending_runway_crossing.is_none());
    assert_eq!(holding.speed, 0.0);

    let readback = sim.execute("UAL123 CLEARED FOR TAKEOFF 28R").unwrap();
    assert_eq!(readback, "runway two eight right, cleared for takeoff, UAL123");

    run_until(&sim, "UAL123", Phase::Takeoff, 2000);
    run_until(&sim, "UAL123", Phase::Climbing, 2000);

    let climbing = sim.get_aircraft_by_callsign("UAL123").unwrap();
    assert!(climbing.altitude > climbing.field_elevation);
    assert_eq!(climbing.target_heading, Some(280.0));
    assert!(physics::heading_difference(climbing.heading, 280.0).abs() < 5.0);
}

#[test]
fn runway_is_occupied_only_while_the_departure_uses_it() {
    let sim = simulation();

    sim.execute("UAL123 PUSH BACK").unwrap();
    sim.execute("UAL123 TAXI 28R VIA A").unwrap();
    run_until(&sim, "UAL123", Phase::HoldingShort, 5000);
    assert!(!sim.runways().is_occupied("28R", &sim.snapshots()));

    sim.execute("UAL123 CLEARED FOR TAKEOFF 28R FLY HEADING 300").unwrap();
    assert_eq!(sim.get_aircraft_by_callsign("UAL123").unwrap().phase(), Phase::Lineup);
    assert!(sim.runways().is_occupied("28R", &sim.snapshots()));

    run_until(&sim, "UAL123", Phase::Climbing, 4000);
    let climbing = sim.get_aircraft_by_callsign("UAL123").unwrap();
    assert_eq!(climbing.target_heading, Some(300.0));
    assert!(!sim.runways().is_occupied("28R", &sim.snapshots()));
}
