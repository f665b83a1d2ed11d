//! The immutable game map and the zombie spawn schedule.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::game::catalog::{RobotType, Team};
use crate::game::geometry::MapLocation;

/// Terrain of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerrainTile {
    /// Ordinary ground.
    Normal,
    /// A hole in the map; impassable.
    Void,
    /// Outside the map bounds.
    OffMap,
}

impl TerrainTile {
    /// Whether robots can stand on this terrain.
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        matches!(self, TerrainTile::Normal)
    }
}

/// A robot type and how many of it to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZombieCount {
    /// Type to spawn.
    pub robot_type: RobotType,
    /// How many.
    pub count: u32,
}

/// Rounds on which zombies spawn at every den, and what spawns then.
///
/// Rounds are kept sorted and unique. Lookups hand out clones, so a
/// caller mutating the returned value cannot corrupt the stored schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZombieSpawnSchedule {
    schedule: BTreeMap<u32, Vec<ZombieCount>>,
}

impl ZombieSpawnSchedule {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` robots of `robot_type` to the given round. Repeated
    /// adds for one round append in call order.
    pub fn add(&mut self, round: u32, robot_type: RobotType, count: u32) {
        self.schedule
            .entry(round)
            .or_default()
            .push(ZombieCount { robot_type, count });
    }

    /// The scheduled rounds, sorted ascending and unique.
    #[must_use]
    pub fn rounds(&self) -> Vec<u32> {
        self.schedule.keys().copied().collect()
    }

    /// What spawns on the given round. Empty if the round is unscheduled.
    #[must_use]
    pub fn schedule_for_round(&self, round: u32) -> Vec<ZombieCount> {
        self.schedule.get(&round).cloned().unwrap_or_default()
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}

/// An initial robot placement on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialRobot {
    /// Where the robot starts.
    pub location: MapLocation,
    /// What it is.
    pub robot_type: RobotType,
    /// Who owns it.
    pub team: Team,
}

/// The immutable map a match is played on.
///
/// Tile attributes here are the *initial* values; the world copies them
/// into its own mutable state at match start. Locations are absolute
/// (origin-offset); everything outside the bounds is `OffMap`.
#[derive(Debug, Clone)]
pub struct GameMap {
    width: i32,
    height: i32,
    origin: MapLocation,
    rounds: u32,
    seed: u64,
    rubble: Vec<f64>,
    parts: Vec<f64>,
    ore: Vec<f64>,
    terrain: Vec<TerrainTile>,
    initial_robots: Vec<InitialRobot>,
    zombie_schedule: ZombieSpawnSchedule,
}

impl GameMap {
    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The northwest corner of the map.
    #[must_use]
    pub const fn origin(&self) -> MapLocation {
        self.origin
    }

    /// The round limit.
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// The map seed all engine randomness derives from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Whether the location lies on the map.
    #[must_use]
    pub const fn on_map(&self, loc: MapLocation) -> bool {
        loc.x >= self.origin.x
            && loc.y >= self.origin.y
            && loc.x < self.origin.x + self.width
            && loc.y < self.origin.y + self.height
    }

    /// Index of an on-map location into the tile vectors.
    pub(crate) fn index_of(&self, loc: MapLocation) -> Option<usize> {
        if self.on_map(loc) {
            let x = (loc.x - self.origin.x) as usize;
            let y = (loc.y - self.origin.y) as usize;
            Some(y * self.width as usize + x)
        } else {
            None
        }
    }

    /// Terrain at a location; `OffMap` outside the bounds.
    #[must_use]
    pub fn terrain(&self, loc: MapLocation) -> TerrainTile {
        self.index_of(loc)
            .map_or(TerrainTile::OffMap, |i| self.terrain[i])
    }

    /// Initial rubble at a location; zero off the map.
    #[must_use]
    pub fn initial_rubble(&self, loc: MapLocation) -> f64 {
        self.index_of(loc).map_or(0.0, |i| self.rubble[i])
    }

    /// Initial parts at a location; zero off the map.
    #[must_use]
    pub fn initial_parts(&self, loc: MapLocation) -> f64 {
        self.index_of(loc).map_or(0.0, |i| self.parts[i])
    }

    /// Initial ore at a location; zero off the map.
    #[must_use]
    pub fn initial_ore(&self, loc: MapLocation) -> f64 {
        self.index_of(loc).map_or(0.0, |i| self.ore[i])
    }

    /// Raw initial tile vectors, row-major. Used by the world to seed its
    /// mutable copies.
    pub(crate) fn initial_tiles(&self) -> (&[f64], &[f64], &[f64]) {
        (&self.rubble, &self.parts, &self.ore)
    }

    /// The robots placed before round one.
    #[must_use]
    pub fn initial_robots(&self) -> &[InitialRobot] {
        &self.initial_robots
    }

    /// Where the given team's archons start, sorted by (y, x) ascending.
    #[must_use]
    pub fn initial_archon_locations(&self, team: Team) -> Vec<MapLocation> {
        let mut locs: Vec<MapLocation> = self
            .initial_robots
            .iter()
            .filter(|r| r.robot_type == RobotType::Archon && r.team == team)
            .map(|r| r.location)
            .collect();
        locs.sort_by_key(|loc| (loc.y, loc.x));
        locs
    }

    /// The zombie spawn schedule.
    #[must_use]
    pub const fn zombie_schedule(&self) -> &ZombieSpawnSchedule {
        &self.zombie_schedule
    }
}

/// Builder for maps, mirroring how test scenarios are written: start from
/// a clear field and sprinkle attributes.
#[derive(Debug, Clone)]
pub struct GameMapBuilder {
    map: GameMap,
}

impl GameMapBuilder {
    /// Start a clear `width` x `height` map with the given round limit.
    #[must_use]
    pub fn new(width: i32, height: i32, rounds: u32) -> Self {
        let size = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            map: GameMap {
                width,
                height,
                origin: MapLocation::new(0, 0),
                rounds,
                seed: 0,
                rubble: vec![0.0; size],
                parts: vec![0.0; size],
                ore: vec![0.0; size],
                terrain: vec![TerrainTile::Normal; size],
                initial_robots: Vec::new(),
                zombie_schedule: ZombieSpawnSchedule::new(),
            },
        }
    }

    /// Set the map origin.
    #[must_use]
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.map.origin = MapLocation::new(x, y);
        self
    }

    /// Set the map seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.map.seed = seed;
        self
    }

    /// Set rubble at origin-relative coordinates.
    #[must_use]
    pub fn with_rubble(mut self, x: i32, y: i32, value: f64) -> Self {
        if let Some(i) = self.relative_index(x, y) {
            self.map.rubble[i] = value;
        }
        self
    }

    /// Set parts at origin-relative coordinates.
    #[must_use]
    pub fn with_parts(mut self, x: i32, y: i32, value: f64) -> Self {
        if let Some(i) = self.relative_index(x, y) {
            self.map.parts[i] = value;
        }
        self
    }

    /// Set ore at origin-relative coordinates.
    #[must_use]
    pub fn with_ore(mut self, x: i32, y: i32, value: f64) -> Self {
        if let Some(i) = self.relative_index(x, y) {
            self.map.ore[i] = value;
        }
        self
    }

    /// Set terrain at origin-relative coordinates.
    #[must_use]
    pub fn with_terrain(mut self, x: i32, y: i32, terrain: TerrainTile) -> Self {
        if let Some(i) = self.relative_index(x, y) {
            self.map.terrain[i] = terrain;
        }
        self
    }

    /// Place an initial robot at origin-relative coordinates.
    #[must_use]
    pub fn with_robot(mut self, robot_type: RobotType, team: Team, x: i32, y: i32) -> Self {
        let location = MapLocation::new(self.map.origin.x + x, self.map.origin.y + y);
        self.map.initial_robots.push(InitialRobot {
            location,
            robot_type,
            team,
        });
        self
    }

    /// Schedule a zombie spawn.
    #[must_use]
    pub fn with_zombie_spawn(mut self, round: u32, robot_type: RobotType, count: u32) -> Self {
        self.map.zombie_schedule.add(round, robot_type, count);
        self
    }

    /// Finish the map.
    #[must_use]
    pub fn build(self) -> GameMap {
        self.map
    }

    fn relative_index(&self, x: i32, y: i32) -> Option<usize> {
        self.map
            .index_of(MapLocation::new(self.map.origin.x + x, self.map.origin.y + y))
    }
}
