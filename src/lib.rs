// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Skirmish: a deterministic grid-based multi-agent battle engine.
//!
//! Two player teams of autonomous robots, plus a scheduled zombie
//! faction, act on a tiled map under an engine that enforces rules,
//! costs, delays, and line of sight. The engine is designed for:
//! - Bit-exact deterministic simulation (ascending-id scheduling,
//!   seeded randomness derived from the map seed and round only)
//! - A typed action surface with precise legality and cost rules
//! - An ordered per-round signal stream for replay and viewing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Player sandbox (external)         │
//! ├─────────────────────────────────────┤
//! │   RobotController (action surface)  │
//! ├─────────────────────────────────────┤
//! │   GameWorld + round engine          │
//! └─────────────────────────────────────┘
//! ```
//!
//! The instrumented player sandbox is a collaborator, not part of this
//! crate: it maps player code into a per-robot callback
//! `fn(u32, &mut RobotController)` and reports bytecodes used per turn.

pub mod error;
pub mod game;

pub use error::{ActionResult, GameError};

// Re-export key game types at crate root for convenience
pub use game::{
    Direction, GameMap, GameMapBuilder, GameWorld, MapLocation, Match, MatchOutcome,
    RobotController, RobotInfo, RobotType, Signal, Team,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_reexports() {
        let map = GameMapBuilder::new(4, 4, 10).build();
        let game = Match::new(map);
        assert_eq!(game.world().round(), 0);
        assert!(game.world().winner().is_none());
    }
}
