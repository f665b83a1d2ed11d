//! The per-round event stream and the robot-to-robot broadcast record.
//!
//! Everything external consumers (replay writer, viewer) learn about a
//! round arrives as an ordered list of [`Signal`] values. Robots talking
//! to each other exchange [`BroadcastSignal`] values through bounded
//! inboxes; those are plain values, so every recipient reads its own copy.

use serde::Serialize;

use crate::game::catalog::{RobotType, Team, Upgrade};
use crate::game::geometry::MapLocation;

/// A spatial broadcast as seen from a recipient's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastSignal {
    /// Id of the sender.
    pub robot_id: u32,
    /// Sender's team.
    pub team: Team,
    /// Where the sender stood when it broadcast.
    pub location: MapLocation,
    /// Message payload; `None` for a plain location ping.
    pub message: Option<[i32; 2]>,
}

/// Why a robot died. Drives the rubble deposited on its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeathCause {
    /// Killed by a regular attack; full max health becomes rubble.
    NormalAttack,
    /// Killed by turret fire; a third of max health becomes rubble.
    TurretAttack,
    /// Consumed by activation; the tile stays clean.
    Activation,
    /// Self-destructed or disintegrated; the tile stays clean.
    SelfDestruct,
}

/// One entry in the round's ordered event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Signal {
    /// A robot moved to a new location.
    Movement {
        id: u32,
        new_location: MapLocation,
        delay: f64,
    },
    /// A robot attacked a location.
    Attack { id: u32, target: MapLocation },
    /// A basher struck everything around it.
    Bash { id: u32 },
    /// A robot was placed: spawned, built, launched, or raised.
    Spawn {
        /// The robot doing the placing; `None` for schedule spawns.
        parent_id: Option<u32>,
        id: u32,
        location: MapLocation,
        robot_type: RobotType,
        team: Team,
        /// Rounds until the new robot can act.
        delay: u32,
    },
    /// A robot mined its own tile.
    Mine {
        location: MapLocation,
        team: Team,
        miner_type: RobotType,
    },
    /// Research on an upgrade began.
    Research { id: u32, upgrade: Upgrade },
    /// A commander flashed to a new location.
    Cast { id: u32, target: MapLocation },
    /// Debug dot for the viewer.
    IndicatorDot {
        id: u32,
        location: MapLocation,
        red: u8,
        green: u8,
        blue: u8,
    },
    /// Debug line for the viewer.
    IndicatorLine {
        id: u32,
        from: MapLocation,
        to: MapLocation,
        red: u8,
        green: u8,
        blue: u8,
    },
    /// Debug string slot update.
    IndicatorString {
        id: u32,
        index: u32,
        value: String,
    },
    /// Free-form observation recorded into the match stream.
    MatchObservation { id: u32, observation: String },
    /// Supply on a tile changed.
    LocationSupplyChange { location: MapLocation, amount: f64 },
    /// A spatial broadcast was emitted.
    Broadcast(BroadcastSignal),
    /// A robot died.
    Death { id: u32, cause: DeathCause },
}
