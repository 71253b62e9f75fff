//! Airport tower simulation core: aircraft phase machine and kinematics, taxi routing,
//! runway occupancy, separation monitoring and the controller command interpreter.

pub mod aircraft;
pub mod airport;
pub mod config;
pub mod geo;
pub mod handler;
pub mod parser;
pub mod performance;
pub mod phonetic;
pub mod physics;
pub mod runway;
pub mod separation;
pub mod spawn;
pub mod state;
pub mod taxiway;
pub mod types;
