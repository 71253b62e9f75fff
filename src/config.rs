use anyhow::{ Context, Result };
use notify::{ Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher };
use serde::{ Deserialize, Serialize };
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::state::Simulation;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub airport: AirportConfig,

    #[serde(default)]
    pub ground: GroundConfig,

    #[serde(default)]
    pub flight: FlightConfig,

    #[serde(default)]
    pub separation: SeparationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Ticks per wall-clock second
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Simulated seconds per wall-clock second
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Remove ARRIVED aircraft after this many simulated seconds (0 keeps them)
    #[serde(default = "default_arrived_dwell")]
    pub arrived_dwell_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AirportConfig {
    /// Airport JSON data; the built-in sample airport is used when unset
    #[serde(default)]
    pub data_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GroundConfig {
    /// Tail-first pushback speed in knots
    #[serde(default = "default_pushback_speed")]
    pub pushback_speed_kt: f64,

    /// Straight-line pushback distance when no path is available
    #[serde(default = "default_pushback_distance")]
    pub pushback_distance_ft: f64,

    /// Tug connection time spent in PUSHBACK_PENDING
    #[serde(default = "default_pushback_delay")]
    pub pushback_delay_secs: f64,

    /// Distance before a pushback waypoint over which the nose blends to the next segment
    #[serde(default = "default_pushback_blend")]
    pub pushback_blend_ft: f64,

    /// Heading correction per foot of cross-track error
    #[serde(default = "default_cross_track_gain")]
    pub cross_track_gain: f64,

    /// Taxi cross-track correction limit in degrees
    #[serde(default = "default_taxi_correction_limit")]
    pub taxi_correction_limit_deg: f64,

    /// Pushback cross-track correction limit in degrees
    #[serde(default = "default_pushback_correction_limit")]
    pub pushback_correction_limit_deg: f64,

    #[serde(default = "default_taxi_speed")]
    pub taxi_speed_kt: f64,

    #[serde(default = "default_lineup_speed")]
    pub lineup_speed_kt: f64,

    #[serde(default = "default_moderate_turn_speed")]
    pub moderate_turn_speed_kt: f64,

    #[serde(default = "default_sharp_turn_speed")]
    pub sharp_turn_speed_kt: f64,

    /// Speed when creeping up to the last waypoint
    #[serde(default = "default_creep_speed")]
    pub creep_speed_kt: f64,

    /// Landing roll ends and taxi-in begins at this speed
    #[serde(default = "default_min_taxi_speed")]
    pub min_taxi_speed_kt: f64,

    #[serde(default = "default_waypoint_reached")]
    pub waypoint_reached_ft: f64,

    #[serde(default = "default_slow_radius")]
    pub slow_radius_ft: f64,

    /// Distance to a waypoint from which the turn after it is anticipated
    #[serde(default = "default_turn_lookahead")]
    pub turn_lookahead_ft: f64,

    #[serde(default = "default_ground_accel")]
    pub ground_accel: f64,

    #[serde(default = "default_ground_brake")]
    pub ground_brake: f64,

    /// Ground turn rate in degrees per second
    #[serde(default = "default_ground_turn_rate")]
    pub ground_turn_rate: f64,

    #[serde(default = "default_traffic_warning")]
    pub traffic_warning_ft: f64,

    #[serde(default = "default_traffic_stop")]
    pub traffic_stop_ft: f64,

    /// Half angle of the forward-looking traffic cone
    #[serde(default = "default_traffic_cone")]
    pub traffic_cone_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlightConfig {
    /// Level-off tolerance
    #[serde(default = "default_altitude_capture")]
    pub altitude_capture_ft: f64,

    /// CRUISE leaves level flight when the target differs by more than this
    #[serde(default = "default_altitude_band")]
    pub altitude_band_ft: f64,

    /// Height above field at which TAKEOFF becomes CLIMBING
    #[serde(default = "default_liftoff_margin")]
    pub liftoff_margin_ft: f64,

    #[serde(default = "default_speed_limit_altitude")]
    pub speed_limit_altitude_ft: f64,

    #[serde(default = "default_speed_limit")]
    pub speed_limit_kt: f64,

    #[serde(default = "default_initial_climb")]
    pub initial_climb_ft: f64,

    #[serde(default = "default_glide_slope")]
    pub glide_slope_deg: f64,

    /// Descent rate multiplier while above the glide path
    #[serde(default = "default_glide_capture_factor")]
    pub glide_capture_factor: f64,

    /// Altitude above field held by an approach that is not ILS coupled
    #[serde(default = "default_approach_altitude")]
    pub approach_altitude_agl_ft: f64,

    /// APPROACH becomes FINAL below this height above field
    #[serde(default = "default_final_agl")]
    pub final_agl_ft: f64,

    #[serde(default = "default_touchdown_margin")]
    pub touchdown_margin_ft: f64,

    /// Missed approach is flown when reaching this height without landing clearance
    #[serde(default = "default_decision_height")]
    pub decision_height_ft: f64,

    #[serde(default = "default_missed_approach")]
    pub missed_approach_agl_ft: f64,

    #[serde(default = "default_holding_radius")]
    pub holding_radius_nm: f64,

    /// Maximum intercept angle onto the localizer
    #[serde(default = "default_intercept_angle")]
    pub intercept_angle_deg: f64,

    /// Cross-track distance inside which the localizer counts as captured
    #[serde(default = "default_localizer_capture")]
    pub localizer_capture_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeparationConfig {
    #[serde(default = "default_ground_critical")]
    pub ground_critical_ft: f64,

    #[serde(default = "default_ground_warning")]
    pub ground_warning_ft: f64,

    #[serde(default = "default_approach_critical")]
    pub approach_critical_nm: f64,

    /// Generic radar in-trail minimum
    #[serde(default = "default_in_trail_minimum")]
    pub in_trail_minimum_nm: f64,

    /// Pairs laterally closer than this need vertical separation
    #[serde(default = "default_vertical_window")]
    pub vertical_window_nm: f64,

    /// Above this altitude the vertical minimum doubles
    #[serde(default = "default_vertical_transition")]
    pub vertical_transition_ft: f64,

    #[serde(default = "default_vertical_minimum")]
    pub vertical_minimum_ft: f64,

    /// Taxiing aircraft closer than this to an uncleared threshold are stopped
    #[serde(default = "default_hold_short_distance")]
    pub hold_short_distance_ft: f64,

    #[serde(default = "default_runway_half_width")]
    pub runway_half_width_ft: f64,
}

// Default value functions
fn default_tick_hz() -> f64 {
    4.0
}
fn default_time_scale() -> f64 {
    1.0
}
fn default_arrived_dwell() -> f64 {
    120.0
}

fn default_pushback_speed() -> f64 {
    3.0
}
fn default_pushback_distance() -> f64 {
    150.0
}
fn default_pushback_delay() -> f64 {
    3.0
}
fn default_pushback_blend() -> f64 {
    40.0
}
fn default_cross_track_gain() -> f64 {
    0.5
}
fn default_taxi_correction_limit() -> f64 {
    30.0
}
fn default_pushback_correction_limit() -> f64 {
    45.0
}
fn default_taxi_speed() -> f64 {
    20.0
}
fn default_lineup_speed() -> f64 {
    10.0
}
fn default_moderate_turn_speed() -> f64 {
    10.0
}
fn default_sharp_turn_speed() -> f64 {
    6.0
}
fn default_creep_speed() -> f64 {
    3.0
}
fn default_min_taxi_speed() -> f64 {
    15.0
}
fn default_waypoint_reached() -> f64 {
    30.0
}
fn default_slow_radius() -> f64 {
    150.0
}
fn default_turn_lookahead() -> f64 {
    250.0
}
fn default_ground_accel() -> f64 {
    2.0
}
fn default_ground_brake() -> f64 {
    4.0
}
fn default_ground_turn_rate() -> f64 {
    15.0
}
fn default_traffic_warning() -> f64 {
    400.0
}
fn default_traffic_stop() -> f64 {
    150.0
}
fn default_traffic_cone() -> f64 {
    30.0
}

fn default_altitude_capture() -> f64 {
    50.0
}
fn default_altitude_band() -> f64 {
    200.0
}
fn default_liftoff_margin() -> f64 {
    50.0
}
fn default_speed_limit_altitude() -> f64 {
    10_000.0
}
fn default_speed_limit() -> f64 {
    250.0
}
fn default_initial_climb() -> f64 {
    5000.0
}
fn default_glide_slope() -> f64 {
    3.0
}
fn default_glide_capture_factor() -> f64 {
    1.5
}
fn default_approach_altitude() -> f64 {
    3000.0
}
fn default_final_agl() -> f64 {
    1500.0
}
fn default_touchdown_margin() -> f64 {
    10.0
}
fn default_decision_height() -> f64 {
    200.0
}
fn default_missed_approach() -> f64 {
    3000.0
}
fn default_holding_radius() -> f64 {
    2.0
}
fn default_intercept_angle() -> f64 {
    30.0
}
fn default_localizer_capture() -> f64 {
    600.0
}

fn default_ground_critical() -> f64 {
    150.0
}
fn default_ground_warning() -> f64 {
    360.0
}
fn default_approach_critical() -> f64 {
    1.5
}
fn default_in_trail_minimum() -> f64 {
    3.0
}
fn default_vertical_window() -> f64 {
    5.0
}
fn default_vertical_transition() -> f64 {
    29_000.0
}
fn default_vertical_minimum() -> f64 {
    1000.0
}
fn default_hold_short_distance() -> f64 {
    250.0
}
fn default_runway_half_width() -> f64 {
    150.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            time_scale: default_time_scale(),
            arrived_dwell_secs: default_arrived_dwell(),
        }
    }
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            pushback_speed_kt: default_pushback_speed(),
            pushback_distance_ft: default_pushback_distance(),
            pushback_delay_secs: default_pushback_delay(),
            pushback_blend_ft: default_pushback_blend(),
            cross_track_gain: default_cross_track_gain(),
            taxi_correction_limit_deg: default_taxi_correction_limit(),
            pushback_correction_limit_deg: default_pushback_correction_limit(),
            taxi_speed_kt: default_taxi_speed(),
            lineup_speed_kt: default_lineup_speed(),
            moderate_turn_speed_kt: default_moderate_turn_speed(),
            sharp_turn_speed_kt: default_sharp_turn_speed(),
            creep_speed_kt: default_creep_speed(),
            min_taxi_speed_kt: default_min_taxi_speed(),
            waypoint_reached_ft: default_waypoint_reached(),
            slow_radius_ft: default_slow_radius(),
            turn_lookahead_ft: default_turn_lookahead(),
            ground_accel: default_ground_accel(),
            ground_brake: default_ground_brake(),
            ground_turn_rate: default_ground_turn_rate(),
            traffic_warning_ft: default_traffic_warning(),
            traffic_stop_ft: default_traffic_stop(),
            traffic_cone_deg: default_traffic_cone(),
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            altitude_capture_ft: default_altitude_capture(),
            altitude_band_ft: default_altitude_band(),
            liftoff_margin_ft: default_liftoff_margin(),
            speed_limit_altitude_ft: default_speed_limit_altitude(),
            speed_limit_kt: default_speed_limit(),
            initial_climb_ft: default_initial_climb(),
            glide_slope_deg: default_glide_slope(),
            glide_capture_factor: default_glide_capture_factor(),
            approach_altitude_agl_ft: default_approach_altitude(),
            final_agl_ft: default_final_agl(),
            touchdown_margin_ft: default_touchdown_margin(),
            decision_height_ft: default_decision_height(),
            missed_approach_agl_ft: default_missed_approach(),
            holding_radius_nm: default_holding_radius(),
            intercept_angle_deg: default_intercept_angle(),
            localizer_capture_ft: default_localizer_capture(),
        }
    }
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            ground_critical_ft: default_ground_critical(),
            ground_warning_ft: default_ground_warning(),
            approach_critical_nm: default_approach_critical(),
            in_trail_minimum_nm: default_in_trail_minimum(),
            vertical_window_nm: default_vertical_window(),
            vertical_transition_ft: default_vertical_transition(),
            vertical_minimum_ft: default_vertical_minimum(),
            hold_short_distance_ft: default_hold_short_distance(),
            runway_half_width_ft: default_runway_half_width(),
        }
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// Load configuration from file or create default
pub fn load_config() -> Result<SimConfig> {
    let path = config_path();

    if path.exists() {
        let contents = std::fs::read_to_string(&path).context("Failed to read config.toml")?;

        parse_config(&contents)
    } else {
        tracing::warn!("config.toml not found, creating default configuration");
        let config = SimConfig::default();
        save_config(&config)?;
        Ok(config)
    }
}

/// Parse configuration text; missing sections and fields take their defaults
pub fn parse_config(contents: &str) -> Result<SimConfig> {
    toml::from_str(contents).context("Failed to parse config.toml")
}

/// Save configuration to file
pub fn save_config(config: &SimConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs::write(config_path(), contents).context("Failed to write config.toml")?;

    Ok(())
}

/// Configuration file watcher with hot-reload
pub struct ConfigWatcher {
    sim: Arc<Simulation>,
}

impl ConfigWatcher {
    pub fn new(sim: Arc<Simulation>) -> Self {
        Self { sim }
    }

    /// Start watching the config file for changes
    pub async fn watch(self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(1);

        let mut watcher = RecommendedWatcher::new(move |res| {
            let _ = tx.blocking_send(res);
        }, NotifyConfig::default())?;

        watcher.watch(config_path().as_ref(), RecursiveMode::NonRecursive)?;

        tracing::info!("Config file watcher started");

        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) => {
                    tracing::debug!("Config file event: {:?}", event);

                    // editors often write in several steps
                    tokio::time::sleep(Duration::from_millis(100)).await;

                    match load_config() {
                        Ok(config) => {
                            self.sim.update_config(config);
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload config: {}", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }

        Ok(())
    }
}
