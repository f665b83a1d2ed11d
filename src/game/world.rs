//! The authoritative world state.
//!
//! One `GameWorld` owns every robot, tile attribute, team ledger, and the
//! round's event stream. Robots are keyed by id in a `BTreeMap` so every
//! iteration the engine performs is in ascending-id order; that ordering is
//! the backbone of determinism and is relied on by signal delivery, zombie
//! spawning, and victory resolution.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{ActionResult, GameError};
use crate::game::catalog::{CommanderSkillType, DependencyProgress, RobotType, Team, Upgrade};
use crate::game::constants::{
    ARCHON_PART_INCOME, DEN_PART_REWARD, GUARD_DAMAGE_REDUCTION,
    MISSILE_MAX_COUNT, MISSILE_SPAWN_FREQUENCY, OUTBREAK_MULTIPLIER_INCREASE, OUTBREAK_TIMER,
    PARTS_INITIAL_AMOUNT, PART_INCOME_UNIT_PENALTY, REGENERATION_RATE,
    RUBBLE_CLEAR_FLAT_AMOUNT, RUBBLE_CLEAR_PERCENTAGE, RUBBLE_FROM_TURRET_FACTOR,
    RUBBLE_OBSTRUCTION_THRESH, TEAM_MEMORY_LENGTH, TURRET_MINIMUM_RANGE_SQUARED,
};
use crate::game::geometry::{Direction, MapLocation};
use crate::game::map::{GameMap, TerrainTile};
use crate::game::memory::{MapMemory, TileMemory};
use crate::game::rng::GameRng;
use crate::game::robot::{InternalRobot, RobotInfo};
use crate::game::signal::{DeathCause, Signal};

/// How a match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VictoryReason {
    /// The losing team's last archon fell.
    Elimination,
    /// Round limit: more archons standing.
    ArchonCount,
    /// Round limit: greater total robot health.
    TotalHealth,
    /// Round limit: seeded coin flip.
    CoinFlip,
}

/// The final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub winner: Team,
    pub reason: VictoryReason,
}

/// Per-team ledger: parts, upgrades, radio, and persistent memory.
#[derive(Debug, Clone)]
pub struct TeamState {
    pub resources: f64,
    pub upgrades: Vec<Upgrade>,
    /// Radio channels. Sparse; unwritten channels read zero.
    shared_channels: HashMap<u32, i32>,
    team_memory: [i64; TEAM_MEMORY_LENGTH],
    /// Snapshot taken at round start; what `get_team_memory` returns.
    old_team_memory: [i64; TEAM_MEMORY_LENGTH],
    pub commanders_spawned: u32,
    pub has_commander: bool,
}

impl TeamState {
    fn new() -> Self {
        Self {
            resources: PARTS_INITIAL_AMOUNT,
            upgrades: Vec::new(),
            shared_channels: HashMap::new(),
            team_memory: [0; TEAM_MEMORY_LENGTH],
            old_team_memory: [0; TEAM_MEMORY_LENGTH],
            commanders_spawned: 0,
            has_commander: false,
        }
    }
}

/// A death recorded during the round, reaped at round end.
#[derive(Debug, Clone, Copy)]
struct DeathRecord {
    id: u32,
    robot_type: RobotType,
    team: Team,
    location: MapLocation,
    max_health: f64,
    cause: DeathCause,
    infected: bool,
}

/// The mutable world a match runs in.
#[derive(Debug, Clone)]
pub struct GameWorld {
    map: GameMap,
    /// Current round; zero before the first round begins.
    round: u32,
    next_id: u32,
    robots: BTreeMap<u32, InternalRobot>,
    occupied: HashMap<MapLocation, u32>,
    rubble: Vec<f64>,
    parts: Vec<f64>,
    ore: Vec<f64>,
    supply: Vec<f64>,
    teams: [TeamState; 2],
    memories: [MapMemory; 2],
    signals: Vec<Signal>,
    pending_deaths: Vec<DeathRecord>,
    ever_had_archon: [bool; 2],
    zombie_overflow_last_round: u32,
    winner: Option<MatchOutcome>,
}

impl GameWorld {
    /// Build the world for a map: copy tile attributes, seed team
    /// ledgers, and place the map's initial robots.
    #[must_use]
    pub fn new(map: GameMap) -> Self {
        let (rubble, parts, ore) = {
            let (rubble, parts, ore) = map.initial_tiles();
            (rubble.to_vec(), parts.to_vec(), ore.to_vec())
        };
        let tile_count = rubble.len();
        let mut world = Self {
            rubble,
            parts,
            ore,
            supply: vec![0.0; tile_count],
            round: 0,
            next_id: 1,
            robots: BTreeMap::new(),
            occupied: HashMap::new(),
            teams: [TeamState::new(), TeamState::new()],
            memories: [MapMemory::new(tile_count), MapMemory::new(tile_count)],
            signals: Vec::new(),
            pending_deaths: Vec::new(),
            ever_had_archon: [false, false],
            zombie_overflow_last_round: 0,
            winner: None,
            map,
        };
        for placement in world.map.initial_robots().to_vec() {
            world.spawn_robot(
                placement.robot_type,
                placement.team,
                placement.location,
                None,
                0,
                1.0,
            );
        }
        world
    }

    // ----- basic queries -----

    /// The immutable map.
    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    /// The current round number; zero before the first round.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The match outcome, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<MatchOutcome> {
        self.winner
    }

    /// Look up a robot by id.
    #[must_use]
    pub fn robot(&self, id: u32) -> Option<&InternalRobot> {
        self.robots.get(&id)
    }

    /// Mutable robot lookup.
    pub fn robot_mut(&mut self, id: u32) -> Option<&mut InternalRobot> {
        self.robots.get_mut(&id)
    }

    /// The robot standing at a location, if any. Constant time.
    #[must_use]
    pub fn robot_at(&self, loc: MapLocation) -> Option<&InternalRobot> {
        self.occupied.get(&loc).and_then(|id| self.robots.get(id))
    }

    /// All living robots, ascending by id. The view is stable: rewrites
    /// of unrelated entries do not reorder it.
    pub fn all_robots(&self) -> impl Iterator<Item = &InternalRobot> {
        self.robots.values()
    }

    /// Ids of all living robots, ascending.
    #[must_use]
    pub fn robot_ids(&self) -> Vec<u32> {
        self.robots.keys().copied().collect()
    }

    /// Living robots on a team, any construction state.
    #[must_use]
    pub fn robot_count(&self, team: Team) -> u32 {
        self.robots.values().filter(|r| r.team == team).count() as u32
    }

    /// Active robots of a type on a team.
    #[must_use]
    pub fn active_type_count(&self, team: Team, robot_type: RobotType) -> u32 {
        self.robots
            .values()
            .filter(|r| r.team == team && r.robot_type == robot_type && r.is_active())
            .count() as u32
    }

    /// Robots of a type on a team, counting ones still under
    /// construction.
    #[must_use]
    pub fn total_type_count(&self, team: Team, robot_type: RobotType) -> u32 {
        self.robots
            .values()
            .filter(|r| r.team == team && r.robot_type == robot_type)
            .count() as u32
    }

    /// How far along a team is toward owning a robot type.
    #[must_use]
    pub fn dependency_progress(&self, team: Team, robot_type: RobotType) -> DependencyProgress {
        if self.active_type_count(team, robot_type) > 0 {
            DependencyProgress::Done
        } else if self.total_type_count(team, robot_type) > 0 {
            DependencyProgress::InProgress
        } else {
            DependencyProgress::None
        }
    }

    /// Zombies discarded for lack of space during the last round's
    /// scheduled spawn.
    #[must_use]
    pub const fn zombie_overflow_last_round(&self) -> u32 {
        self.zombie_overflow_last_round
    }

    // ----- team ledgers -----

    fn team_state(&self, team: Team) -> Option<&TeamState> {
        match team {
            Team::A => Some(&self.teams[0]),
            Team::B => Some(&self.teams[1]),
            _ => None,
        }
    }

    fn team_state_mut(&mut self, team: Team) -> Option<&mut TeamState> {
        match team {
            Team::A => Some(&mut self.teams[0]),
            Team::B => Some(&mut self.teams[1]),
            _ => None,
        }
    }

    /// Parts held by a team. Non-player teams hold nothing.
    #[must_use]
    pub fn resources(&self, team: Team) -> f64 {
        self.team_state(team).map_or(0.0, |t| t.resources)
    }

    /// Adjust a team's parts. Fails if the result would be negative;
    /// non-player teams accept any adjustment as a no-op.
    pub fn adjust_resources(&mut self, team: Team, delta: f64) -> ActionResult<()> {
        let Some(state) = self.team_state_mut(team) else {
            return Ok(());
        };
        let result = state.resources + delta;
        if result < 0.0 {
            return Err(GameError::NotEnoughResource);
        }
        state.resources = result;
        Ok(())
    }

    /// Whether a team owns an upgrade.
    #[must_use]
    pub fn has_upgrade(&self, team: Team, upgrade: Upgrade) -> bool {
        self.team_state(team)
            .is_some_and(|t| t.upgrades.contains(&upgrade))
    }

    /// Rounds left on a team's research of an upgrade; zero when none is
    /// in progress.
    #[must_use]
    pub fn upgrade_progress(&self, team: Team, upgrade: Upgrade) -> u32 {
        self.robots
            .values()
            .filter(|r| r.team == team)
            .filter_map(|r| r.research)
            .filter(|(u, _)| *u == upgrade)
            .map(|(_, rounds)| rounds)
            .max()
            .unwrap_or(0)
    }

    /// Whether a team currently has a commander.
    #[must_use]
    pub fn has_commander(&self, team: Team) -> bool {
        self.team_state(team).is_some_and(|t| t.has_commander)
    }

    /// How many commanders the team has ever spawned; doubles the next
    /// one's cost each time.
    #[must_use]
    pub fn commanders_spawned(&self, team: Team) -> u32 {
        self.team_state(team).map_or(0, |t| t.commanders_spawned)
    }

    /// The radio value on a team channel; zero if never written.
    #[must_use]
    pub fn read_channel(&self, team: Team, channel: u32) -> i32 {
        self.team_state(team)
            .and_then(|t| t.shared_channels.get(&channel).copied())
            .unwrap_or(0)
    }

    /// Publish a robot's queued radio writes to its team. Called when
    /// the robot's turn ends.
    pub fn flush_broadcasts(&mut self, id: u32) {
        let Some(robot) = self.robots.get_mut(&id) else {
            return;
        };
        let team = robot.team;
        let queued = std::mem::take(&mut robot.queued_broadcasts);
        if let Some(state) = self.team_state_mut(team) {
            for (channel, data) in queued {
                state.shared_channels.insert(channel, data);
            }
        }
    }

    /// Write a slot of a team's persistent memory, through an optional
    /// bit mask. Out-of-range indices are ignored.
    pub fn set_team_memory(&mut self, team: Team, index: usize, value: i64, mask: Option<i64>) {
        let Some(state) = self.team_state_mut(team) else {
            return;
        };
        if index >= TEAM_MEMORY_LENGTH {
            return;
        }
        state.team_memory[index] = match mask {
            Some(mask) => (state.team_memory[index] & !mask) | (value & mask),
            None => value,
        };
    }

    /// The round-start snapshot of a team's persistent memory.
    #[must_use]
    pub fn team_memory_snapshot(&self, team: Team) -> [i64; TEAM_MEMORY_LENGTH] {
        self.team_state(team)
            .map_or([0; TEAM_MEMORY_LENGTH], |t| t.old_team_memory)
    }

    // ----- tiles -----

    /// Current rubble at a location; zero off the map.
    #[must_use]
    pub fn rubble(&self, loc: MapLocation) -> f64 {
        self.map.index_of(loc).map_or(0.0, |i| self.rubble[i])
    }

    /// Current parts at a location; zero off the map.
    #[must_use]
    pub fn parts(&self, loc: MapLocation) -> f64 {
        self.map.index_of(loc).map_or(0.0, |i| self.parts[i])
    }

    /// Current ore at a location; zero off the map.
    #[must_use]
    pub fn ore(&self, loc: MapLocation) -> f64 {
        self.map.index_of(loc).map_or(0.0, |i| self.ore[i])
    }

    /// Current loose supply at a location; zero off the map.
    #[must_use]
    pub fn supply(&self, loc: MapLocation) -> f64 {
        self.map.index_of(loc).map_or(0.0, |i| self.supply[i])
    }

    pub(crate) fn add_rubble(&mut self, loc: MapLocation, amount: f64) {
        if let Some(i) = self.map.index_of(loc) {
            self.rubble[i] = (self.rubble[i] + amount).max(0.0);
        }
    }

    /// Apply one clear action to the rubble at a location and return the
    /// new value. Never goes negative.
    pub(crate) fn clear_rubble_at(&mut self, loc: MapLocation) -> f64 {
        let Some(i) = self.map.index_of(loc) else {
            return 0.0;
        };
        self.rubble[i] =
            (self.rubble[i] * (1.0 - RUBBLE_CLEAR_PERCENTAGE) - RUBBLE_CLEAR_FLAT_AMOUNT).max(0.0);
        self.rubble[i]
    }

    pub(crate) fn take_ore(&mut self, loc: MapLocation, amount: f64) -> f64 {
        let Some(i) = self.map.index_of(loc) else {
            return 0.0;
        };
        let taken = amount.min(self.ore[i]);
        self.ore[i] -= taken;
        taken
    }

    pub(crate) fn adjust_supply(&mut self, loc: MapLocation, delta: f64) -> f64 {
        let Some(i) = self.map.index_of(loc) else {
            return 0.0;
        };
        self.supply[i] = (self.supply[i] + delta).max(0.0);
        self.supply[i]
    }

    /// Whether a robot of the given type could stand at the location:
    /// on the map, traversable terrain, rubble below the obstruction
    /// threshold (missiles fly over it), and unoccupied.
    #[must_use]
    pub fn can_move(&self, loc: MapLocation, robot_type: RobotType) -> bool {
        if !self.map.terrain(loc).is_traversable() {
            return false;
        }
        if robot_type != RobotType::Missile && self.rubble(loc) >= RUBBLE_OBSTRUCTION_THRESH {
            return false;
        }
        !self.occupied.contains_key(&loc)
    }

    /// Whether the robot's type permits an attack on the square.
    #[must_use]
    pub fn can_attack_square(&self, id: u32, loc: MapLocation) -> bool {
        let Some(robot) = self.robots.get(&id) else {
            return false;
        };
        let d = robot.location.distance_squared_to(loc);
        match robot.robot_type {
            RobotType::Turret => (TURRET_MINIMUM_RANGE_SQUARED..=RobotType::Turret
                .attack_radius_squared())
                .contains(&d),
            _ => d <= robot.robot_type.attack_radius_squared(),
        }
    }

    // ----- robots entering and leaving -----

    /// Place a new robot in the world and return its id.
    ///
    /// Player robots landing on a tile with parts sweep them into the
    /// team's pool. `health_multiplier` scales spawn health for
    /// outbreak-era zombies.
    pub fn spawn_robot(
        &mut self,
        robot_type: RobotType,
        team: Team,
        loc: MapLocation,
        parent_id: Option<u32>,
        rounds_until_active: u32,
        health_multiplier: f64,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let robot = InternalRobot::new(id, robot_type, team, loc, health_multiplier, rounds_until_active);
        self.occupied.insert(loc, id);
        self.robots.insert(id, robot);

        if robot_type == RobotType::Archon && team.is_player() {
            self.ever_had_archon[team.index()] = true;
        }
        if robot_type == RobotType::Commander {
            if let Some(state) = self.team_state_mut(team) {
                state.has_commander = true;
                state.commanders_spawned += 1;
            }
        }
        if team.is_player() {
            self.pick_up_parts(team, loc);
        }

        self.signals.push(Signal::Spawn {
            parent_id,
            id,
            location: loc,
            robot_type,
            team,
            delay: rounds_until_active,
        });
        id
    }

    fn pick_up_parts(&mut self, team: Team, loc: MapLocation) {
        let Some(i) = self.map.index_of(loc) else {
            return;
        };
        let amount = self.parts[i];
        if amount > 0.0 {
            self.parts[i] = 0.0;
            if let Some(state) = self.team_state_mut(team) {
                state.resources += amount;
            }
        }
    }

    /// Move a robot to a new tile, updating occupancy and sweeping parts
    /// for player teams.
    pub(crate) fn move_robot(&mut self, id: u32, to: MapLocation) {
        let Some(robot) = self.robots.get_mut(&id) else {
            return;
        };
        let from = robot.location;
        let team = robot.team;
        robot.location = to;
        robot.moved_this_turn = true;
        if self.occupied.get(&from) == Some(&id) {
            self.occupied.remove(&from);
        }
        self.occupied.insert(to, id);
        if team.is_player() {
            self.pick_up_parts(team, to);
        }
    }

    /// Apply damage from an optional attacker, with guard damage
    /// reduction against zombies and infection from infectious types.
    /// Lethal damage kills the target immediately.
    pub fn damage_robot(&mut self, target_id: u32, amount: f64, attacker: Option<(RobotType, Team)>) {
        let Some(target) = self.robots.get_mut(&target_id) else {
            return;
        };
        let mut damage = amount;
        if let Some((attacker_type, attacker_team)) = attacker {
            if target.robot_type == RobotType::Guard && attacker_team == Team::Zombie {
                damage = (damage - GUARD_DAMAGE_REDUCTION).max(0.0);
            }
            if attacker_type.infects_on_attack() && target.team != Team::Zombie {
                target.infected = true;
            }
        }
        target.take_damage(damage);
        if target.health <= 0.0 {
            let cause = match attacker {
                Some((RobotType::Turret, _)) => DeathCause::TurretAttack,
                _ => DeathCause::NormalAttack,
            };
            self.kill_robot(target_id, cause, attacker.map(|(_, team)| team));
        }
    }

    /// Remove a robot from the world at once; rubble and the death signal
    /// are settled at the round-end reap.
    pub fn kill_robot(&mut self, id: u32, cause: DeathCause, killer_team: Option<Team>) {
        let Some(robot) = self.robots.remove(&id) else {
            return;
        };
        if self.occupied.get(&robot.location) == Some(&id) {
            self.occupied.remove(&robot.location);
        }

        if robot.robot_type == RobotType::Commander {
            if let Some(state) = self.team_state_mut(robot.team) {
                state.has_commander = false;
            }
        }
        if robot.robot_type == RobotType::ZombieDen {
            if let Some(team) = killer_team {
                if team.is_player() {
                    if let Some(state) = self.team_state_mut(team) {
                        state.resources += DEN_PART_REWARD;
                    }
                }
            }
        }

        self.pending_deaths.push(DeathRecord {
            id,
            robot_type: robot.robot_type,
            team: robot.team,
            location: robot.location,
            max_health: robot.max_health,
            cause,
            infected: robot.infected && robot.team != Team::Zombie,
        });
    }

    // ----- sensing -----

    /// Whether the robot's sensors cover the location. Zombies see the
    /// whole map.
    #[must_use]
    pub fn can_sense_location(&self, id: u32, loc: MapLocation) -> bool {
        let Some(robot) = self.robots.get(&id) else {
            return false;
        };
        robot.team == Team::Zombie
            || robot.location.distance_squared_to(loc)
                <= robot.robot_type.sensor_radius_squared()
    }

    /// Whether the robot can sense another robot: own team is always
    /// visible, everything else requires sensor coverage.
    #[must_use]
    pub fn can_sense_robot(&self, id: u32, target_id: u32) -> bool {
        let (Some(robot), Some(target)) = (self.robots.get(&id), self.robots.get(&target_id))
        else {
            return false;
        };
        robot.team == target.team || self.can_sense_location(id, target.location)
    }

    fn memory_for(&self, team: Team) -> Option<&MapMemory> {
        match team {
            Team::A => Some(&self.memories[0]),
            Team::B => Some(&self.memories[1]),
            _ => None,
        }
    }

    fn sense_tile_value(
        &self,
        id: u32,
        loc: MapLocation,
        current: impl Fn(&Self, usize) -> f64,
        recalled: impl Fn(TileMemory) -> f64,
    ) -> f64 {
        let Some(index) = self.map.index_of(loc) else {
            return -1.0;
        };
        if self.can_sense_location(id, loc) {
            return current(self, index);
        }
        let team = match self.robots.get(&id) {
            Some(robot) => robot.team,
            None => return -1.0,
        };
        self.memory_for(team)
            .and_then(|m| m.recall(index))
            .map_or(-1.0, recalled)
    }

    /// Rubble as the robot knows it: current if in sight, remembered if
    /// ever seen, `-1.0` otherwise.
    #[must_use]
    pub fn sense_rubble(&self, id: u32, loc: MapLocation) -> f64 {
        self.sense_tile_value(id, loc, |w, i| w.rubble[i], |m| m.rubble)
    }

    /// Parts as the robot knows them; same memory rules as rubble.
    #[must_use]
    pub fn sense_parts(&self, id: u32, loc: MapLocation) -> f64 {
        self.sense_tile_value(id, loc, |w, i| w.parts[i], |m| m.parts)
    }

    /// Ore as the robot knows it; same memory rules as rubble.
    #[must_use]
    pub fn sense_ore(&self, id: u32, loc: MapLocation) -> f64 {
        self.sense_tile_value(id, loc, |w, i| w.ore[i], |m| m.ore)
    }

    /// Loose supply as the robot knows it; same memory rules as rubble.
    #[must_use]
    pub fn sense_supply(&self, id: u32, loc: MapLocation) -> f64 {
        self.sense_tile_value(id, loc, |w, i| w.supply[i], |m| m.supply)
    }

    /// Terrain as the robot knows it. Map bounds are public knowledge,
    /// so off-map locations always answer `OffMap`; on-map tiles answer
    /// from sight or memory, `None` if never seen.
    #[must_use]
    pub fn sense_terrain(&self, id: u32, loc: MapLocation) -> Option<TerrainTile> {
        let Some(index) = self.map.index_of(loc) else {
            return Some(TerrainTile::OffMap);
        };
        if self.can_sense_location(id, loc) {
            return Some(self.map.terrain(loc));
        }
        let team = self.robots.get(&id)?.team;
        self.memory_for(team)
            .and_then(|m| m.recall(index))
            .map(|m| m.terrain)
    }

    /// Locations in sight (and within `radius_squared`, if nonnegative)
    /// whose current parts are positive, scanned row-major.
    #[must_use]
    pub fn sense_part_locations(&self, id: u32, radius_squared: i32) -> Vec<MapLocation> {
        let Some(robot) = self.robots.get(&id) else {
            return Vec::new();
        };
        let center = robot.location;
        let origin = self.map.origin();
        let mut found = Vec::new();
        for y in 0..self.map.height() {
            for x in 0..self.map.width() {
                let loc = MapLocation::new(origin.x + x, origin.y + y);
                if radius_squared >= 0 && center.distance_squared_to(loc) > radius_squared {
                    continue;
                }
                if !self.can_sense_location(id, loc) {
                    continue;
                }
                if self.parts(loc) > 0.0 {
                    found.push(loc);
                }
            }
        }
        found
    }

    /// All robots the caller can sense within `radius_squared` of
    /// `center` (unbounded if negative), optionally filtered by team,
    /// excluding the caller. Ascending id order.
    #[must_use]
    pub fn sense_nearby_robots(
        &self,
        id: u32,
        center: MapLocation,
        radius_squared: i32,
        team_filter: Option<Team>,
    ) -> Vec<RobotInfo> {
        self.robots
            .values()
            .filter(|r| r.id != id)
            .filter(|r| {
                radius_squared < 0 || r.location.distance_squared_to(center) <= radius_squared
            })
            .filter(|r| match team_filter {
                Some(team) => r.team == team,
                None => true,
            })
            .filter(|r| self.can_sense_robot(id, r.id))
            .map(InternalRobot::info)
            .collect()
    }

    // ----- memory upkeep -----

    /// Record everything a robot currently sees into its team's memory.
    pub fn record_robot_sight(&mut self, id: u32) {
        let Some(robot) = self.robots.get(&id) else {
            return;
        };
        if !robot.team.is_player() {
            return;
        }
        let team = robot.team;
        let center = robot.location;
        let radius = robot.robot_type.sensor_radius_squared();
        let reach = (radius as f64).sqrt().floor() as i32;

        let mut observations = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let loc = MapLocation::new(center.x + dx, center.y + dy);
                if center.distance_squared_to(loc) > radius {
                    continue;
                }
                if let Some(index) = self.map.index_of(loc) {
                    observations.push((
                        index,
                        TileMemory {
                            rubble: self.rubble[index],
                            parts: self.parts[index],
                            ore: self.ore[index],
                            supply: self.supply[index],
                            terrain: self.map.terrain(loc),
                        },
                    ));
                }
            }
        }
        let memory = &mut self.memories[team.index()];
        for (index, observation) in observations {
            memory.record(index, observation);
        }
    }

    fn refresh_all_memories(&mut self) {
        for id in self.robot_ids() {
            self.record_robot_sight(id);
        }
    }

    // ----- signals -----

    /// Append an event to the round's stream.
    pub(crate) fn push_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    /// Take the accumulated event stream.
    pub fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    // ----- round lifecycle -----

    /// The zombie health/rubble multiplier in effect for a round.
    #[must_use]
    pub fn outbreak_multiplier(round: u32) -> f64 {
        1.0 + OUTBREAK_MULTIPLIER_INCREASE * f64::from(round / OUTBREAK_TIMER)
    }

    /// Start a new round: advance the counter, snapshot team memory,
    /// admit injected signals, and run the zombie spawn schedule.
    pub fn begin_round(&mut self, injected: Vec<Signal>) {
        self.round += 1;
        self.zombie_overflow_last_round = 0;
        for state in &mut self.teams {
            state.old_team_memory = state.team_memory;
        }
        self.signals.extend(injected);
        self.spawn_scheduled_zombies();
    }

    fn spawn_scheduled_zombies(&mut self) {
        let counts = self.map.zombie_schedule().schedule_for_round(self.round);
        if counts.is_empty() {
            return;
        }
        let multiplier = Self::outbreak_multiplier(self.round);
        let dens: Vec<(u32, MapLocation)> = self
            .robots
            .values()
            .filter(|r| r.robot_type == RobotType::ZombieDen)
            .map(|r| (r.id, r.location))
            .collect();

        for (den_id, den_loc) in dens {
            for entry in &counts {
                for _ in 0..entry.count {
                    let free = Direction::CARDINAL_ORDER
                        .iter()
                        .map(|&dir| den_loc.add(dir))
                        .find(|&loc| self.map.on_map(loc) && self.can_move(loc, entry.robot_type));
                    match free {
                        Some(loc) => {
                            self.spawn_robot(
                                entry.robot_type,
                                Team::Zombie,
                                loc,
                                Some(den_id),
                                0,
                                multiplier,
                            );
                        }
                        None => self.zombie_overflow_last_round += 1,
                    }
                }
            }
        }
    }

    /// Close out the round: research, regeneration, reaping, income,
    /// memory refresh, and victory determination.
    pub fn end_round(&mut self) {
        self.sweep_dead();
        self.tick_research();
        self.tick_passives();
        self.reap();
        self.apply_income();
        self.refresh_all_memories();
        self.check_victory();
    }

    /// Robots driven to zero health outside the damage path (harness
    /// edits, future rules) and robots flagged self-destructed still
    /// count as pending-dead at round end.
    fn sweep_dead(&mut self) {
        let dead: Vec<(u32, bool)> = self
            .robots
            .values()
            .filter(|r| r.health <= 0.0 || r.self_destructed)
            .map(|r| (r.id, r.self_destructed))
            .collect();
        for (id, self_destructed) in dead {
            let cause = if self_destructed {
                DeathCause::SelfDestruct
            } else {
                DeathCause::NormalAttack
            };
            self.kill_robot(id, cause, None);
        }
    }

    fn tick_research(&mut self) {
        let mut completed: Vec<(Team, Upgrade)> = Vec::new();
        for robot in self.robots.values_mut() {
            if let Some((upgrade, rounds_left)) = robot.research {
                if rounds_left <= 1 {
                    robot.research = None;
                    completed.push((robot.team, upgrade));
                } else {
                    robot.research = Some((upgrade, rounds_left - 1));
                }
            }
        }
        for (team, upgrade) in completed {
            if let Some(state) = self.team_state_mut(team) {
                if !state.upgrades.contains(&upgrade) {
                    state.upgrades.push(upgrade);
                }
            }
        }
    }

    fn tick_passives(&mut self) {
        let round = self.round;
        for robot in self.robots.values_mut() {
            if robot.robot_type == RobotType::Launcher
                && round % MISSILE_SPAWN_FREQUENCY == 0
                && robot.missile_count < MISSILE_MAX_COUNT
            {
                robot.missile_count += 1;
            }
            if robot.has_learned_skill(CommanderSkillType::Regeneration) {
                robot.heal(REGENERATION_RATE);
            }
        }
    }

    fn reap(&mut self) {
        let deaths = std::mem::take(&mut self.pending_deaths);
        let multiplier = Self::outbreak_multiplier(self.round);
        for record in &deaths {
            if record.infected {
                // The corpse rises instead of crumbling.
                if self.map.on_map(record.location)
                    && self.can_move(record.location, RobotType::StandardZombie)
                {
                    self.spawn_robot(
                        RobotType::StandardZombie,
                        Team::Zombie,
                        record.location,
                        None,
                        0,
                        multiplier,
                    );
                }
            } else {
                let rubble = match record.cause {
                    DeathCause::NormalAttack => record.max_health,
                    DeathCause::TurretAttack => record.max_health * RUBBLE_FROM_TURRET_FACTOR,
                    DeathCause::Activation | DeathCause::SelfDestruct => 0.0,
                };
                if rubble > 0.0 {
                    self.add_rubble(record.location, rubble);
                }
            }
            self.signals.push(Signal::Death {
                id: record.id,
                cause: record.cause,
            });
        }
        // Keep the records around for this round's victory ordering.
        self.pending_deaths = deaths;
    }

    fn apply_income(&mut self) {
        for team in [Team::A, Team::B] {
            let units = self.robot_count(team);
            let income = ARCHON_PART_INCOME - PART_INCOME_UNIT_PENALTY * f64::from(units);
            if income > 0.0 {
                if let Some(state) = self.team_state_mut(team) {
                    state.resources += income;
                }
            }
        }
    }

    fn count_archons(&self, team: Team) -> u32 {
        self.total_type_count(team, RobotType::Archon)
    }

    fn last_archon_death_index(&self, team: Team) -> Option<usize> {
        self.pending_deaths
            .iter()
            .enumerate()
            .filter(|(_, d)| d.robot_type == RobotType::Archon && d.team == team)
            .map(|(i, _)| i)
            .last()
    }

    fn check_victory(&mut self) {
        if self.winner.is_some() {
            self.pending_deaths.clear();
            return;
        }

        let a_eliminated = self.ever_had_archon[0] && self.count_archons(Team::A) == 0;
        let b_eliminated = self.ever_had_archon[1] && self.count_archons(Team::B) == 0;

        let winner = match (a_eliminated, b_eliminated) {
            (true, true) => {
                // Both fell this round: the team whose last archon died
                // later in emission order survives longest and wins.
                let last_a = self.last_archon_death_index(Team::A);
                let last_b = self.last_archon_death_index(Team::B);
                Some(if last_b > last_a { Team::B } else { Team::A })
            }
            (true, false) => Some(Team::B),
            (false, true) => Some(Team::A),
            (false, false) => None,
        };

        if let Some(team) = winner {
            self.winner = Some(MatchOutcome {
                winner: team,
                reason: VictoryReason::Elimination,
            });
        } else if self.round >= self.map.rounds() {
            self.winner = Some(self.round_limit_tiebreak());
        }

        self.pending_deaths.clear();
    }

    fn round_limit_tiebreak(&self) -> MatchOutcome {
        let archons_a = self.count_archons(Team::A);
        let archons_b = self.count_archons(Team::B);
        if archons_a != archons_b {
            return MatchOutcome {
                winner: if archons_a > archons_b { Team::A } else { Team::B },
                reason: VictoryReason::ArchonCount,
            };
        }

        let health = |team: Team| -> f64 {
            self.robots
                .values()
                .filter(|r| r.team == team)
                .map(|r| r.health)
                .sum()
        };
        let health_a = health(Team::A);
        let health_b = health(Team::B);
        if (health_a - health_b).abs() > f64::EPSILON {
            return MatchOutcome {
                winner: if health_a > health_b { Team::A } else { Team::B },
                reason: VictoryReason::TotalHealth,
            };
        }

        let mut rng = GameRng::new(self.map.seed(), self.round);
        MatchOutcome {
            winner: if rng.next_bool() { Team::A } else { Team::B },
            reason: VictoryReason::CoinFlip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::GameMapBuilder;

    const EPSILON: f64 = 1.0e-9;

    fn empty_world() -> GameWorld {
        GameWorld::new(GameMapBuilder::new(10, 10, 100).build())
    }

    #[test]
    fn test_one_robot_per_location() {
        let mut world = empty_world();
        let a = world.spawn_robot(
            RobotType::Soldier,
            Team::A,
            MapLocation::new(2, 2),
            None,
            0,
            1.0,
        );
        assert_eq!(world.robot_at(MapLocation::new(2, 2)).unwrap().id, a);
        assert!(!world.can_move(MapLocation::new(2, 2), RobotType::Soldier));
        assert!(world.can_move(MapLocation::new(2, 3), RobotType::Soldier));
    }

    #[test]
    fn test_adjust_resources_rejects_negative() {
        let mut world = empty_world();
        assert!(world.adjust_resources(Team::A, -PARTS_INITIAL_AMOUNT).is_ok());
        assert_eq!(
            world.adjust_resources(Team::A, -1.0),
            Err(GameError::NotEnoughResource)
        );
        assert!((world.resources(Team::A) - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_rubble_obstruction() {
        let map = GameMapBuilder::new(10, 10, 100)
            .with_rubble(3, 3, 100.0)
            .with_rubble(4, 4, 99.0)
            .build();
        let world = GameWorld::new(map);
        assert!(!world.can_move(MapLocation::new(3, 3), RobotType::Soldier));
        assert!(world.can_move(MapLocation::new(4, 4), RobotType::Soldier));
        // Missiles fly over rubble.
        assert!(world.can_move(MapLocation::new(3, 3), RobotType::Missile));
    }

    #[test]
    fn test_death_rubble_by_cause() {
        let mut world = empty_world();
        let loc = MapLocation::new(1, 1);
        let id = world.spawn_robot(RobotType::Soldier, Team::B, loc, None, 0, 1.0);
        world.begin_round(Vec::new());
        world.damage_robot(id, 1000.0, Some((RobotType::Soldier, Team::A)));
        assert!(world.robot(id).is_none());
        assert!(world.robot_at(loc).is_none());
        world.end_round();
        assert!((world.rubble(loc) - RobotType::Soldier.max_health()).abs() < EPSILON);
    }

    #[test]
    fn test_turret_death_rubble_is_reduced() {
        let mut world = empty_world();
        let loc = MapLocation::new(1, 1);
        let id = world.spawn_robot(RobotType::Soldier, Team::B, loc, None, 0, 1.0);
        world.begin_round(Vec::new());
        world.damage_robot(id, 1000.0, Some((RobotType::Turret, Team::A)));
        world.end_round();
        assert!(
            (world.rubble(loc)
                - RobotType::Soldier.max_health() * RUBBLE_FROM_TURRET_FACTOR)
                .abs()
                < EPSILON
        );
    }

    #[test]
    fn test_infected_corpse_rises_without_rubble() {
        let mut world = empty_world();
        let loc = MapLocation::new(5, 5);
        let id = world.spawn_robot(RobotType::Soldier, Team::B, loc, None, 0, 1.0);
        world.begin_round(Vec::new());
        world.damage_robot(id, 1000.0, Some((RobotType::StandardZombie, Team::Zombie)));
        world.end_round();
        assert!((world.rubble(loc) - 0.0).abs() < EPSILON);
        let risen = world.robot_at(loc).unwrap();
        assert_eq!(risen.robot_type, RobotType::StandardZombie);
        assert_eq!(risen.team, Team::Zombie);
    }

    #[test]
    fn test_den_destruction_rewards_parts() {
        let mut world = empty_world();
        let id = world.spawn_robot(
            RobotType::ZombieDen,
            Team::Zombie,
            MapLocation::new(4, 4),
            None,
            0,
            1.0,
        );
        let before = world.resources(Team::B);
        world.begin_round(Vec::new());
        world.damage_robot(id, 1e9, Some((RobotType::Soldier, Team::B)));
        assert!((world.resources(Team::B) - before - DEN_PART_REWARD).abs() < EPSILON);
    }

    #[test]
    fn test_income_is_flat_minus_unit_penalty() {
        let mut world = empty_world();
        world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 0), None, 0, 1.0);
        world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 1), None, 0, 1.0);
        world.spawn_robot(RobotType::Soldier, Team::A, MapLocation::new(0, 2), None, 0, 1.0);
        let before = world.resources(Team::A);
        world.begin_round(Vec::new());
        world.end_round();
        assert!(
            (world.resources(Team::A)
                - before
                - (ARCHON_PART_INCOME - 3.0 * PART_INCOME_UNIT_PENALTY))
                .abs()
                < EPSILON
        );
    }

    #[test]
    fn test_income_applies_with_no_units() {
        let mut world = empty_world();
        let before = world.resources(Team::B);
        world.begin_round(Vec::new());
        world.end_round();
        assert!((world.resources(Team::B) - before - ARCHON_PART_INCOME).abs() < EPSILON);
    }

    #[test]
    fn test_outbreak_multiplier_steps() {
        assert!((GameWorld::outbreak_multiplier(0) - 1.0).abs() < EPSILON);
        assert!((GameWorld::outbreak_multiplier(299) - 1.0).abs() < EPSILON);
        assert!((GameWorld::outbreak_multiplier(300) - 1.1).abs() < EPSILON);
        assert!((GameWorld::outbreak_multiplier(601) - 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_scheduled_zombies_spawn_clockwise_from_north() {
        let map = GameMapBuilder::new(10, 10, 100)
            .with_zombie_spawn(1, RobotType::StandardZombie, 3)
            .build();
        let mut world = GameWorld::new(map);
        let den_loc = MapLocation::new(5, 5);
        world.spawn_robot(RobotType::ZombieDen, Team::Zombie, den_loc, None, 0, 1.0);
        world.begin_round(Vec::new());

        for dir in [Direction::North, Direction::NorthEast, Direction::East] {
            let robot = world.robot_at(den_loc.add(dir)).expect("zombie expected");
            assert_eq!(robot.robot_type, RobotType::StandardZombie);
            assert_eq!(robot.team, Team::Zombie);
        }
        assert_eq!(world.zombie_overflow_last_round(), 0);
    }

    #[test]
    fn test_zombie_overflow_is_discarded_and_counted() {
        // Den in a corner walled in by rubble: only one free neighbor.
        let map = GameMapBuilder::new(3, 3, 100)
            .with_rubble(1, 0, 200.0)
            .with_rubble(1, 1, 200.0)
            .with_zombie_spawn(1, RobotType::StandardZombie, 3)
            .build();
        let mut world = GameWorld::new(map);
        world.spawn_robot(
            RobotType::ZombieDen,
            Team::Zombie,
            MapLocation::new(0, 0),
            None,
            0,
            1.0,
        );
        world.begin_round(Vec::new());

        // South is the only reachable neighbor; the other two spawns drop.
        assert!(world.robot_at(MapLocation::new(0, 1)).is_some());
        assert_eq!(world.zombie_overflow_last_round(), 2);
    }

    #[test]
    fn test_double_elimination_later_death_wins() {
        let mut world = empty_world();
        let archon_a =
            world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 0), None, 0, 1.0);
        let archon_b =
            world.spawn_robot(RobotType::Archon, Team::B, MapLocation::new(0, 1), None, 0, 1.0);
        world.begin_round(Vec::new());
        world.damage_robot(archon_a, 1e9, Some((RobotType::Soldier, Team::B)));
        world.damage_robot(archon_b, 1e9, Some((RobotType::Soldier, Team::A)));
        world.end_round();

        let outcome = world.winner().expect("match should be decided");
        assert_eq!(outcome.winner, Team::B);
        assert_eq!(outcome.reason, VictoryReason::Elimination);
    }

    #[test]
    fn test_round_limit_tiebreak_archon_count() {
        let map = GameMapBuilder::new(10, 10, 1).build();
        let mut world = GameWorld::new(map);
        world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 0), None, 0, 1.0);
        world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 1), None, 0, 1.0);
        world.spawn_robot(RobotType::Archon, Team::B, MapLocation::new(5, 5), None, 0, 1.0);
        world.begin_round(Vec::new());
        world.end_round();

        let outcome = world.winner().expect("round limit reached");
        assert_eq!(outcome.winner, Team::A);
        assert_eq!(outcome.reason, VictoryReason::ArchonCount);
    }

    #[test]
    fn test_team_memory_masked_write_and_snapshot() {
        let mut world = empty_world();
        world.set_team_memory(Team::A, 0, 0xFF00, None);
        world.set_team_memory(Team::A, 0, 0x00AB, Some(0x00FF));
        // Snapshot is from round start; nothing visible yet.
        assert_eq!(world.team_memory_snapshot(Team::A)[0], 0);
        world.begin_round(Vec::new());
        assert_eq!(world.team_memory_snapshot(Team::A)[0], 0xFFAB);
        // Out-of-range writes are ignored.
        world.set_team_memory(Team::A, TEAM_MEMORY_LENGTH, 7, None);
    }

    #[test]
    fn test_map_memory_remembers_stale_values() {
        let map = GameMapBuilder::new(30, 1, 100).with_rubble(2, 0, 40.0).build();
        let mut world = GameWorld::new(map);
        let id = world.spawn_robot(RobotType::Soldier, Team::A, MapLocation::new(0, 0), None, 0, 1.0);
        let far = MapLocation::new(20, 0);
        let near = MapLocation::new(2, 0);

        // Never seen: unknown.
        assert!((world.sense_rubble(id, far) - -1.0).abs() < EPSILON);
        // In sight: current value.
        assert!((world.sense_rubble(id, near) - 40.0).abs() < EPSILON);

        world.record_robot_sight(id);
        world.move_robot(id, MapLocation::new(29, 0));
        // Out of sight now, but remembered.
        assert!((world.sense_rubble(id, near) - 40.0).abs() < EPSILON);
        // The memory is stale by design.
        world.add_rubble(near, 60.0);
        assert!((world.sense_rubble(id, near) - 40.0).abs() < EPSILON);
        assert!((world.sense_rubble(id, far) - -1.0).abs() < EPSILON);
    }

    #[test]
    fn test_zombies_sense_everything() {
        let map = GameMapBuilder::new(100, 100, 100).with_rubble(99, 99, 77.0).build();
        let mut world = GameWorld::new(map);
        let zombie = world.spawn_robot(
            RobotType::FastZombie,
            Team::Zombie,
            MapLocation::new(0, 0),
            None,
            0,
            1.0,
        );
        let soldier =
            world.spawn_robot(RobotType::Soldier, Team::B, MapLocation::new(99, 99), None, 0, 1.0);

        assert!(world.can_sense_location(zombie, MapLocation::new(99, 99)));
        assert!((world.sense_rubble(zombie, MapLocation::new(99, 99)) - 77.0).abs() < EPSILON);
        assert!(world.can_sense_robot(zombie, soldier));
        assert!(!world.can_sense_robot(soldier, zombie));
    }

    #[test]
    fn test_sense_nearby_ordering_and_filters() {
        let mut world = empty_world();
        let caller =
            world.spawn_robot(RobotType::Soldier, Team::A, MapLocation::new(5, 5), None, 0, 1.0);
        let friend =
            world.spawn_robot(RobotType::Soldier, Team::A, MapLocation::new(6, 5), None, 0, 1.0);
        let enemy =
            world.spawn_robot(RobotType::Soldier, Team::B, MapLocation::new(5, 6), None, 0, 1.0);

        let all = world.sense_nearby_robots(caller, MapLocation::new(5, 5), -1, None);
        assert_eq!(
            all.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![friend, enemy]
        );

        let enemies =
            world.sense_nearby_robots(caller, MapLocation::new(5, 5), -1, Some(Team::B));
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].id, enemy);

        let close = world.sense_nearby_robots(caller, MapLocation::new(6, 5), 0, None);
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].id, friend);
    }

    #[test]
    fn test_guard_reduction_only_against_zombies() {
        let mut world = empty_world();
        let guard =
            world.spawn_robot(RobotType::Guard, Team::B, MapLocation::new(1, 1), None, 0, 1.0);

        world.damage_robot(guard, RobotType::Soldier.attack_power(), Some((RobotType::Soldier, Team::A)));
        let after_soldier = world.robot(guard).unwrap().health;
        assert!(
            (after_soldier - (RobotType::Guard.max_health() - RobotType::Soldier.attack_power()))
                .abs()
                < EPSILON
        );

        world.damage_robot(
            guard,
            RobotType::BigZombie.attack_power(),
            Some((RobotType::BigZombie, Team::Zombie)),
        );
        let after_zombie = world.robot(guard).unwrap().health;
        assert!(
            (after_zombie
                - (after_soldier - RobotType::BigZombie.attack_power()
                    + GUARD_DAMAGE_REDUCTION))
                .abs()
                < EPSILON
        );
    }
}
