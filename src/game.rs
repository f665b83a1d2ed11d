//! Game layer for Skirmish.
//!
//! Implements the rules of the simulation:
//! - Map, terrain, rubble, parts, and ore
//! - The robot catalog and per-team ledgers
//! - Action arbitration behind the controller surface
//! - Delay accounting, death, infection, and victory
//! - The per-round signal stream

mod catalog;
pub mod constants;
mod controller;
mod engine;
mod geometry;
mod invariants;
mod map;
mod memory;
mod rng;
mod robot;
mod signal;
mod world;

pub use catalog::{CommanderSkillType, DependencyProgress, RobotType, Team, Upgrade};
pub use controller::RobotController;
pub use engine::Match;
pub use geometry::{Direction, MapLocation};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use map::{
    GameMap, GameMapBuilder, InitialRobot, TerrainTile, ZombieCount, ZombieSpawnSchedule,
};
pub use memory::{MapMemory, TileMemory};
pub use robot::{InternalRobot, RobotInfo};
pub use signal::{BroadcastSignal, DeathCause, Signal};
pub use world::{GameWorld, MatchOutcome, TeamState, VictoryReason};
