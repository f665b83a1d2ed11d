//! The action surface exposed to robot controllers.
//!
//! Every action follows the same shape: validate, charge delays and
//! costs, emit a signal, mutate the world. Failures come back as typed
//! [`GameError`] values and leave no partial effects behind.

use crate::error::{ActionResult, GameError};
use crate::game::catalog::{
    CommanderSkillType, DependencyProgress, RobotType, Team, Upgrade,
};
use crate::game::constants::{
    ARCHON_ACTIVATION_RANGE_SQUARED, ARCHON_REPAIR_AMOUNT, BASH_RADIUS_SQUARED,
    BASIC_SIGNALS_PER_TURN, BEAVER_MINE_MAX, BEAVER_MINE_RATE, BROADCAST_ADDITIONAL_DELAY_INCREASE,
    BROADCAST_BASE_DELAY_INCREASE, BROADCAST_MAX_CHANNELS, COMMANDER_MAX_COST_DOUBLINGS,
    DIAGONAL_DELAY_MULTIPLIER, FLASH_MOVEMENT_DELAY, FLASH_RANGE_SQUARED,
    MESSAGE_SIGNALS_PER_TURN, MINER_MINE_MAX, MINER_MINE_RATE, MINING_LOADING_DELAY,
    MINING_MOVEMENT_DELAY, MISSILE_DAMAGE, MISSILE_RADIUS_SQUARED, NUMBER_OF_INDICATOR_STRINGS,
    RUBBLE_CLEAR_DELAY, RUBBLE_SLOW_THRESH, SUPPLY_TRANSFER_RADIUS_SQUARED, TEAM_MEMORY_LENGTH,
};
use crate::game::geometry::{Direction, MapLocation};
use crate::game::map::{TerrainTile, ZombieSpawnSchedule};
use crate::game::robot::{InternalRobot, RobotInfo};
use crate::game::signal::{BroadcastSignal, DeathCause, Signal};
use crate::game::world::GameWorld;

/// A single robot's handle on the world for the duration of its turn.
///
/// Constructed by the round engine and passed into the controller
/// callback; all sensing and acting goes through it.
pub struct RobotController<'w> {
    world: &'w mut GameWorld,
    id: u32,
}

impl<'w> RobotController<'w> {
    pub(crate) fn new(world: &'w mut GameWorld, id: u32) -> Self {
        Self { world, id }
    }

    fn actor(&self) -> ActionResult<&InternalRobot> {
        // A robot that died mid-turn (explode, self-inflicted attack) has
        // no record left; every further action fails here.
        self.world.robot(self.id).ok_or(GameError::CantDoThatBro)
    }

    fn actor_mut(&mut self) -> ActionResult<&mut InternalRobot> {
        self.world.robot_mut(self.id).ok_or(GameError::CantDoThatBro)
    }

    fn charge(&mut self, core: f64, weapon: f64) {
        if let Some(robot) = self.world.robot_mut(self.id) {
            robot.charge(core, weapon);
        }
    }

    fn assert_core_ready(&self) -> ActionResult<()> {
        if self.actor()?.core_ready() {
            Ok(())
        } else {
            Err(GameError::NotActive)
        }
    }

    fn assert_weapon_ready(&self) -> ActionResult<()> {
        if self.actor()?.weapon_ready() {
            Ok(())
        } else {
            Err(GameError::NotActive)
        }
    }

    fn assert_real_direction(dir: Direction) -> ActionResult<()> {
        if dir.is_real() {
            Ok(())
        } else {
            Err(GameError::CantDoThatBro)
        }
    }

    // ----- global queries -----

    /// The current round number.
    #[must_use]
    pub fn round_num(&self) -> u32 {
        self.world.round()
    }

    /// Map width in tiles.
    #[must_use]
    pub fn map_width(&self) -> i32 {
        self.world.map().width()
    }

    /// Map height in tiles.
    #[must_use]
    pub fn map_height(&self) -> i32 {
        self.world.map().height()
    }

    /// Parts held by this robot's team.
    #[must_use]
    pub fn team_parts(&self) -> f64 {
        self.actor().map_or(0.0, |r| self.world.resources(r.team))
    }

    /// Living robots on this robot's team.
    #[must_use]
    pub fn robot_count(&self) -> u32 {
        self.actor().map_or(0, |r| self.world.robot_count(r.team))
    }

    /// A copy of the zombie spawn schedule. Mutating it changes nothing.
    #[must_use]
    pub fn zombie_spawn_schedule(&self) -> ZombieSpawnSchedule {
        self.world.map().zombie_schedule().clone()
    }

    /// Where a team's archons started, sorted by (y, x).
    #[must_use]
    pub fn initial_archon_locations(&self, team: Team) -> Vec<MapLocation> {
        self.world.map().initial_archon_locations(team)
    }

    // ----- unit queries -----

    /// This robot's id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// This robot's team.
    #[must_use]
    pub fn team(&self) -> Team {
        self.actor().map_or(Team::Neutral, |r| r.team)
    }

    /// This robot's type.
    #[must_use]
    pub fn robot_type(&self) -> RobotType {
        self.actor().map_or(RobotType::Soldier, |r| r.robot_type)
    }

    /// This robot's location.
    #[must_use]
    pub fn location(&self) -> MapLocation {
        self.actor().map_or(MapLocation::new(0, 0), |r| r.location)
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f64 {
        self.actor().map_or(0.0, |r| r.health)
    }

    /// Current core delay.
    #[must_use]
    pub fn core_delay(&self) -> f64 {
        self.actor().map_or(0.0, |r| r.core_delay)
    }

    /// Current weapon delay.
    #[must_use]
    pub fn weapon_delay(&self) -> f64 {
        self.actor().map_or(0.0, |r| r.weapon_delay)
    }

    /// Supply carried by this robot.
    #[must_use]
    pub fn supply_level(&self) -> f64 {
        self.actor().map_or(0.0, |r| r.supply_level)
    }

    /// Commander experience.
    #[must_use]
    pub fn xp(&self) -> u32 {
        self.actor().map_or(0, |r| r.xp)
    }

    /// Missiles held by this launcher.
    #[must_use]
    pub fn missile_count(&self) -> u32 {
        self.actor().map_or(0, |r| r.missile_count)
    }

    /// Whether this robot is infected.
    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.actor().map_or(false, |r| r.infected)
    }

    /// Whether the core counter permits movement-class actions.
    #[must_use]
    pub fn is_core_ready(&self) -> bool {
        self.actor().map_or(false, InternalRobot::core_ready)
    }

    /// Whether the weapon counter permits attack-class actions.
    #[must_use]
    pub fn is_weapon_ready(&self) -> bool {
        self.actor().map_or(false, InternalRobot::weapon_ready)
    }

    // ----- sensing -----

    /// Whether this robot's sensors cover a location.
    #[must_use]
    pub fn can_sense_location(&self, loc: MapLocation) -> bool {
        self.world.can_sense_location(self.id, loc)
    }

    /// Whether this robot can sense the robot with the given id.
    #[must_use]
    pub fn can_sense_robot(&self, id: u32) -> bool {
        self.world.can_sense_robot(self.id, id)
    }

    /// Whether a visible location is occupied.
    pub fn is_location_occupied(&self, loc: MapLocation) -> ActionResult<bool> {
        if !self.can_sense_location(loc) {
            return Err(GameError::CantSenseThat);
        }
        Ok(self.world.robot_at(loc).is_some())
    }

    /// The robot at a visible location, if any.
    pub fn sense_robot_at_location(&self, loc: MapLocation) -> ActionResult<Option<RobotInfo>> {
        if !self.can_sense_location(loc) {
            return Err(GameError::CantSenseThat);
        }
        Ok(self
            .world
            .robot_at(loc)
            .filter(|r| self.can_sense_robot(r.id))
            .map(InternalRobot::info))
    }

    /// A sensable robot by id.
    pub fn sense_robot(&self, id: u32) -> ActionResult<RobotInfo> {
        if !self.can_sense_robot(id) {
            return Err(GameError::CantSenseThat);
        }
        self.world
            .robot(id)
            .map(InternalRobot::info)
            .ok_or(GameError::CantSenseThat)
    }

    /// Every robot this one can sense, ascending by id.
    #[must_use]
    pub fn sense_nearby_robots(&self) -> Vec<RobotInfo> {
        self.sense_robots(self.location(), -1, None)
    }

    /// Sensable robots within `radius_squared` of `center` (unbounded if
    /// negative), optionally filtered by team. Ascending id order.
    #[must_use]
    pub fn sense_robots(
        &self,
        center: MapLocation,
        radius_squared: i32,
        team: Option<Team>,
    ) -> Vec<RobotInfo> {
        self.world
            .sense_nearby_robots(self.id, center, radius_squared, team)
    }

    /// Sensable robots hostile to this one within a radius of `center`.
    #[must_use]
    pub fn sense_hostile_robots(&self, center: MapLocation, radius_squared: i32) -> Vec<RobotInfo> {
        let team = self.team();
        let mut robots = self.sense_robots(center, radius_squared, None);
        robots.retain(|r| r.team != team && r.team != Team::Neutral);
        robots
    }

    /// Rubble as this robot knows it; `-1.0` if never observed.
    #[must_use]
    pub fn sense_rubble(&self, loc: MapLocation) -> f64 {
        self.world.sense_rubble(self.id, loc)
    }

    /// Parts as this robot knows them; `-1.0` if never observed.
    #[must_use]
    pub fn sense_parts(&self, loc: MapLocation) -> f64 {
        self.world.sense_parts(self.id, loc)
    }

    /// Ore as this robot knows it; `-1.0` if never observed.
    #[must_use]
    pub fn sense_ore(&self, loc: MapLocation) -> f64 {
        self.world.sense_ore(self.id, loc)
    }

    /// Loose tile supply as this robot knows it; `-1.0` if never
    /// observed.
    #[must_use]
    pub fn sense_supply_level(&self, loc: MapLocation) -> f64 {
        self.world.sense_supply(self.id, loc)
    }

    /// Terrain as this robot knows it; `None` if never observed.
    #[must_use]
    pub fn sense_terrain(&self, loc: MapLocation) -> Option<TerrainTile> {
        self.world.sense_terrain(self.id, loc)
    }

    /// Visible locations with parts on them, within `radius_squared`
    /// (`-1` for anywhere in sight).
    #[must_use]
    pub fn sense_part_locations(&self, radius_squared: i32) -> Vec<MapLocation> {
        self.world.sense_part_locations(self.id, radius_squared)
    }

    // ----- movement -----

    /// Whether a step in the direction is currently possible.
    #[must_use]
    pub fn can_move(&self, dir: Direction) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        actor.robot_type.can_move()
            && dir.is_real()
            && self
                .world
                .can_move(actor.location.add(dir), actor.robot_type)
    }

    /// Step one tile. Charges movement delay to the core counter and
    /// cooldown delay to the weapon counter; rubble above the slow
    /// threshold doubles both, a diagonal step multiplies both by the
    /// diagonal factor.
    pub fn move_to(&mut self, dir: Direction) -> ActionResult<()> {
        self.assert_core_ready()?;
        let actor = self.actor()?;
        if !actor.robot_type.can_move() {
            return Err(GameError::CantDoThatBro);
        }
        Self::assert_real_direction(dir)?;
        let robot_type = actor.robot_type;
        let target = actor.location.add(dir);
        if !self.world.can_move(target, robot_type) {
            return Err(GameError::CantMoveThere);
        }

        let mut factor = if dir.is_diagonal() {
            DIAGONAL_DELAY_MULTIPLIER
        } else {
            1.0
        };
        if self.world.rubble(target) > RUBBLE_SLOW_THRESH {
            factor *= 2.0;
        }
        let core = robot_type.movement_delay() * factor;
        let weapon = robot_type.cooldown_delay() * factor;

        self.world.move_robot(self.id, target);
        self.charge(core, weapon);
        self.world.push_signal(Signal::Movement {
            id: self.id,
            new_location: target,
            delay: core,
        });
        Ok(())
    }

    /// Clear some rubble from an adjacent tile.
    pub fn clear_rubble(&mut self, dir: Direction) -> ActionResult<()> {
        self.assert_core_ready()?;
        Self::assert_real_direction(dir)?;
        let target = self.actor()?.location.add(dir);
        if !self.world.map().on_map(target) {
            return Err(GameError::CantDoThatBro);
        }
        self.world.clear_rubble_at(target);
        self.charge(RUBBLE_CLEAR_DELAY, 0.0);
        Ok(())
    }

    // ----- attacking -----

    /// Whether this robot could attack the location right now, delays
    /// aside.
    #[must_use]
    pub fn can_attack_location(&self, loc: MapLocation) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        actor.robot_type.can_attack()
            && actor.robot_type != RobotType::Basher
            && self.world.can_attack_square(self.id, loc)
    }

    /// Attack a location. Damage resolves immediately against whatever
    /// stands there.
    pub fn attack_location(&mut self, loc: MapLocation) -> ActionResult<()> {
        self.assert_weapon_ready()?;
        let actor = self.actor()?;
        if !actor.robot_type.can_attack() {
            return Err(GameError::CantDoThatBro);
        }
        if actor.robot_type == RobotType::Basher {
            return Err(GameError::CantDoThatBro);
        }
        if !self.world.can_attack_square(self.id, loc) {
            return Err(GameError::OutOfRange);
        }

        let robot_type = actor.robot_type;
        let team = actor.team;
        self.charge(robot_type.cooldown_delay(), robot_type.attack_delay());
        self.world.push_signal(Signal::Attack { id: self.id, target: loc });
        if let Some(target_id) = self.world.robot_at(loc).map(|r| r.id) {
            self.world
                .damage_robot(target_id, robot_type.attack_power(), Some((robot_type, team)));
        }
        Ok(())
    }

    /// Strike every adjacent enemy at once. Bashers only.
    pub fn bash(&mut self) -> ActionResult<()> {
        self.assert_weapon_ready()?;
        let actor = self.actor()?;
        if actor.robot_type != RobotType::Basher {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        let center = actor.location;
        let robot_type = actor.robot_type;

        self.charge(robot_type.cooldown_delay(), robot_type.attack_delay());
        self.world.push_signal(Signal::Bash { id: self.id });
        let victims: Vec<u32> = self
            .world
            .all_robots()
            .filter(|r| r.id != self.id && r.team != team)
            .filter(|r| r.location.distance_squared_to(center) <= BASH_RADIUS_SQUARED)
            .map(|r| r.id)
            .collect();
        for victim in victims {
            self.world
                .damage_robot(victim, robot_type.attack_power(), Some((robot_type, team)));
        }
        Ok(())
    }

    /// Detonate this missile, damaging everything adjacent. The missile
    /// is gone afterwards and the controller frame must yield.
    pub fn explode(&mut self) -> ActionResult<()> {
        let actor = self.actor()?;
        if actor.robot_type != RobotType::Missile {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        let center = actor.location;

        let victims: Vec<u32> = self
            .world
            .all_robots()
            .filter(|r| r.id != self.id)
            .filter(|r| r.location.distance_squared_to(center) <= MISSILE_RADIUS_SQUARED)
            .map(|r| r.id)
            .collect();
        for victim in victims {
            self.world
                .damage_robot(victim, MISSILE_DAMAGE, Some((RobotType::Missile, team)));
        }
        self.world
            .kill_robot(self.id, DeathCause::SelfDestruct, None);
        Ok(())
    }

    /// Remove this robot from the game. Leaves no rubble.
    pub fn disintegrate(&mut self) {
        self.world
            .kill_robot(self.id, DeathCause::SelfDestruct, None);
    }

    /// Concede: every robot on this team disintegrates.
    pub fn resign(&mut self) {
        let team = self.team();
        let ids: Vec<u32> = self
            .world
            .all_robots()
            .filter(|r| r.team == team)
            .map(|r| r.id)
            .collect();
        for id in ids {
            self.world.kill_robot(id, DeathCause::SelfDestruct, None);
        }
    }

    // ----- spawning and building -----

    /// The team's progress toward owning a robot type.
    #[must_use]
    pub fn check_dependency_progress(&self, robot_type: RobotType) -> DependencyProgress {
        self.actor().map_or(DependencyProgress::None, |r| {
            self.world.dependency_progress(r.team, robot_type)
        })
    }

    fn spawn_cost(&self, team: Team, robot_type: RobotType) -> f64 {
        let mut cost = robot_type.part_cost();
        if robot_type == RobotType::Commander {
            let doublings = self
                .world
                .commanders_spawned(team)
                .min(COMMANDER_MAX_COST_DOUBLINGS);
            cost *= f64::from(1u32 << doublings);
        }
        cost
    }

    /// Whether a spawn in the direction would succeed, delays aside.
    #[must_use]
    pub fn can_spawn(&self, dir: Direction, robot_type: RobotType) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        if !actor.robot_type.can_spawn()
            || robot_type.spawn_source() != Some(actor.robot_type)
            || !dir.is_real()
        {
            return false;
        }
        if robot_type == RobotType::Commander && self.world.has_commander(actor.team) {
            return false;
        }
        if self.spawn_cost(actor.team, robot_type) > self.world.resources(actor.team) {
            return false;
        }
        self.world.can_move(actor.location.add(dir), robot_type)
    }

    /// Spawn a unit next to this robot. The new robot occupies its tile
    /// at once but is under construction for the type's build turns.
    pub fn spawn(&mut self, dir: Direction, robot_type: RobotType) -> ActionResult<()> {
        let actor = self.actor()?;
        if !actor.robot_type.can_spawn() {
            return Err(GameError::CantDoThatBro);
        }
        if robot_type.spawn_source() != Some(actor.robot_type) {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        if robot_type == RobotType::Commander && self.world.has_commander(team) {
            return Err(GameError::CantDoThatBro);
        }
        Self::assert_real_direction(dir)?;
        self.assert_core_ready()?;

        let cost = self.spawn_cost(team, robot_type);
        if cost > self.world.resources(team) {
            return Err(GameError::NotEnoughResource);
        }
        let target = self.actor()?.location.add(dir);
        if !self.world.can_move(target, robot_type) {
            return Err(GameError::CantMoveThere);
        }

        self.world.adjust_resources(team, -cost)?;
        let build_turns = robot_type.build_turns();
        self.world
            .spawn_robot(robot_type, team, target, Some(self.id), build_turns, 1.0);
        self.charge(f64::from(build_turns), 0.0);
        Ok(())
    }

    /// Whether a build in the direction would succeed, delays aside.
    #[must_use]
    pub fn can_build(&self, dir: Direction, robot_type: RobotType) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        if !actor.robot_type.can_build() || !robot_type.is_building() || !dir.is_real() {
            return false;
        }
        if let Some(dep) = robot_type.dependency() {
            if self.world.active_type_count(actor.team, dep) == 0 {
                return false;
            }
        }
        if robot_type.part_cost() > self.world.resources(actor.team) {
            return false;
        }
        self.world.can_move(actor.location.add(dir), robot_type)
    }

    /// Construct a building next to this robot. Charges both delay
    /// counters for the full build time.
    pub fn build(&mut self, dir: Direction, robot_type: RobotType) -> ActionResult<()> {
        let actor = self.actor()?;
        if !actor.robot_type.can_build() {
            return Err(GameError::CantDoThatBro);
        }
        if !robot_type.is_building() {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        if let Some(dep) = robot_type.dependency() {
            if self.world.active_type_count(team, dep) == 0 {
                return Err(GameError::CantDoThatBro);
            }
        }
        Self::assert_real_direction(dir)?;
        self.assert_core_ready()?;

        let cost = robot_type.part_cost();
        if cost > self.world.resources(team) {
            return Err(GameError::NotEnoughResource);
        }
        let target = self.actor()?.location.add(dir);
        if !self.world.can_move(target, robot_type) {
            return Err(GameError::CantMoveThere);
        }

        self.world.adjust_resources(team, -cost)?;
        let build_turns = robot_type.build_turns();
        self.world
            .spawn_robot(robot_type, team, target, Some(self.id), build_turns, 1.0);
        self.charge(f64::from(build_turns), f64::from(build_turns));
        Ok(())
    }

    // ----- archon support -----

    /// Restore a little health to a nearby ally. Archons only; costs no
    /// delay.
    pub fn repair(&mut self, loc: MapLocation) -> ActionResult<()> {
        let actor = self.actor()?;
        if actor.robot_type != RobotType::Archon {
            return Err(GameError::CantDoThatBro);
        }
        if actor.location.distance_squared_to(loc) > actor.robot_type.attack_radius_squared() {
            return Err(GameError::OutOfRange);
        }
        let team = actor.team;
        let target_id = self
            .world
            .robot_at(loc)
            .map(|r| r.id)
            .ok_or(GameError::NoRobotThere)?;
        let target = self.world.robot(target_id).ok_or(GameError::NoRobotThere)?;
        if target.team != team || target.robot_type == RobotType::Archon {
            return Err(GameError::CantDoThatBro);
        }
        if let Some(target) = self.world.robot_mut(target_id) {
            target.heal(ARCHON_REPAIR_AMOUNT);
        }
        Ok(())
    }

    /// Convert an adjacent neutral robot to this archon's team. The
    /// neutral is consumed cleanly and a fresh robot takes its place at
    /// full health.
    pub fn activate(&mut self, loc: MapLocation) -> ActionResult<()> {
        let actor = self.actor()?;
        if actor.robot_type != RobotType::Archon {
            return Err(GameError::CantDoThatBro);
        }
        if actor.location.distance_squared_to(loc) > ARCHON_ACTIVATION_RANGE_SQUARED {
            return Err(GameError::OutOfRange);
        }
        self.assert_core_ready()?;
        let team = actor.team;
        let neutral = self.world.robot_at(loc).ok_or(GameError::NoRobotThere)?;
        if neutral.team != Team::Neutral {
            return Err(GameError::CantDoThatBro);
        }
        let (neutral_id, neutral_type) = (neutral.id, neutral.robot_type);

        self.world
            .kill_robot(neutral_id, DeathCause::Activation, None);
        self.world
            .spawn_robot(neutral_type, team, loc, Some(self.id), 0, 1.0);
        Ok(())
    }

    // ----- mining -----

    /// Whether this robot can mine at all.
    #[must_use]
    pub fn can_mine(&self) -> bool {
        self.actor().map_or(false, |r| r.robot_type.can_mine())
    }

    /// Mine ore from the tile under this robot and credit the team.
    pub fn mine(&mut self) -> ActionResult<()> {
        self.assert_core_ready()?;
        let actor = self.actor()?;
        if !actor.robot_type.can_mine() {
            return Err(GameError::CantDoThatBro);
        }
        let (team, robot_type, loc) = (actor.team, actor.robot_type, actor.location);

        let available = self.world.ore(loc);
        let (rate, floor) = if robot_type == RobotType::Beaver {
            (BEAVER_MINE_RATE, BEAVER_MINE_MAX)
        } else {
            (MINER_MINE_RATE, MINER_MINE_MAX)
        };
        let mut amount = available.min((available / rate).max(floor));
        if self.world.has_upgrade(team, Upgrade::Pickaxe) {
            amount *= 2.0;
        }
        let mined = self.world.take_ore(loc, amount);
        self.world.adjust_resources(team, mined)?;

        self.charge(MINING_MOVEMENT_DELAY, MINING_LOADING_DELAY);
        self.world.push_signal(Signal::Mine {
            location: loc,
            team,
            miner_type: robot_type,
        });
        Ok(())
    }

    // ----- missiles -----

    /// Whether a missile launch in the direction would succeed.
    #[must_use]
    pub fn can_launch(&self, dir: Direction) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        actor.robot_type.can_launch()
            && dir.is_real()
            && actor.missile_count > 0
            && !actor.moved_this_turn
            && self
                .world
                .can_move(actor.location.add(dir), RobotType::Missile)
    }

    /// Launch a missile onto an adjacent tile. A launcher cannot move
    /// and launch in the same turn, and fires at most once per tile per
    /// turn.
    pub fn launch_missile(&mut self, dir: Direction) -> ActionResult<()> {
        let actor = self.actor()?;
        if !actor.robot_type.can_launch() {
            return Err(GameError::CantDoThatBro);
        }
        Self::assert_real_direction(dir)?;
        if actor.missile_count == 0 {
            return Err(GameError::CantDoThatBro);
        }
        if actor.moved_this_turn {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        let target = actor.location.add(dir);
        if !self.world.can_move(target, RobotType::Missile) {
            return Err(GameError::CantMoveThere);
        }
        if actor.launched_at.contains(&target) {
            return Err(GameError::CantDoThatBro);
        }

        {
            let actor = self.actor_mut()?;
            actor.missile_count -= 1;
            actor.launched_at.push(target);
        }
        self.world
            .spawn_robot(RobotType::Missile, team, target, Some(self.id), 0, 1.0);
        Ok(())
    }

    // ----- commander -----

    /// Whether this robot's team fields a commander.
    #[must_use]
    pub fn has_commander(&self) -> bool {
        self.actor()
            .map_or(false, |r| self.world.has_commander(r.team))
    }

    /// Whether this team's commander has learned a skill. Fails without
    /// a commander.
    pub fn has_learned_skill(&self, skill: CommanderSkillType) -> ActionResult<bool> {
        let team = self.actor()?.team;
        if !self.world.has_commander(team) {
            return Err(GameError::CantDoThatBro);
        }
        Ok(self
            .world
            .all_robots()
            .filter(|r| r.team == team)
            .any(|r| r.has_learned_skill(skill)))
    }

    /// Flash-teleport to a nearby tile. Commanders with the Flash skill
    /// only.
    pub fn cast_flash(&mut self, loc: MapLocation) -> ActionResult<()> {
        let actor = self.actor()?;
        if actor.robot_type != RobotType::Commander {
            return Err(GameError::CantDoThatBro);
        }
        if !actor.has_learned_skill(CommanderSkillType::Flash) {
            return Err(GameError::MissingUpgrade);
        }
        if actor.location.distance_squared_to(loc) > FLASH_RANGE_SQUARED {
            return Err(GameError::OutOfRange);
        }
        self.assert_core_ready()?;
        let robot_type = self.actor()?.robot_type;
        if !self.world.can_move(loc, robot_type) {
            return Err(GameError::CantMoveThere);
        }

        self.world.move_robot(self.id, loc);
        self.charge(FLASH_MOVEMENT_DELAY, robot_type.cooldown_delay());
        self.world.push_signal(Signal::Cast { id: self.id, target: loc });
        Ok(())
    }

    // ----- research -----

    /// Whether a research action would succeed right now.
    #[must_use]
    pub fn can_research(&self, upgrade: Upgrade) -> bool {
        let Ok(actor) = self.actor() else {
            return false;
        };
        actor.robot_type.can_research()
            && !self.world.has_upgrade(actor.team, upgrade)
            && self.world.upgrade_progress(actor.team, upgrade) == 0
            && upgrade.ore_cost() <= self.world.resources(actor.team)
    }

    /// Whether this robot's team owns an upgrade.
    #[must_use]
    pub fn has_upgrade(&self, upgrade: Upgrade) -> bool {
        self.actor()
            .map_or(false, |r| self.world.has_upgrade(r.team, upgrade))
    }

    /// Rounds left on this team's research of an upgrade; zero if none.
    #[must_use]
    pub fn check_research_progress(&self, upgrade: Upgrade) -> u32 {
        self.actor()
            .map_or(0, |r| self.world.upgrade_progress(r.team, upgrade))
    }

    /// Start researching an upgrade. The cost is reserved immediately;
    /// the upgrade lands after its research rounds elapse.
    pub fn research_upgrade(&mut self, upgrade: Upgrade) -> ActionResult<()> {
        let actor = self.actor()?;
        if !actor.robot_type.can_research() {
            return Err(GameError::CantDoThatBro);
        }
        let team = actor.team;
        if self.world.has_upgrade(team, upgrade) {
            return Err(GameError::CantDoThatBro);
        }
        if self.world.upgrade_progress(team, upgrade) > 0 {
            return Err(GameError::CantDoThatBro);
        }
        self.assert_core_ready()?;
        if upgrade.ore_cost() > self.world.resources(team) {
            return Err(GameError::NotEnoughResource);
        }

        self.world.adjust_resources(team, -upgrade.ore_cost())?;
        let rounds = upgrade.num_rounds();
        self.actor_mut()?.research = Some((upgrade, rounds));
        self.charge(f64::from(rounds), f64::from(rounds));
        self.world.push_signal(Signal::Research {
            id: self.id,
            upgrade,
        });
        Ok(())
    }

    // ----- radio -----

    /// Write a value to a team radio channel. Visible to this robot at
    /// once and to teammates from the next turn.
    pub fn broadcast(&mut self, channel: u32, data: i32) -> ActionResult<()> {
        if channel > BROADCAST_MAX_CHANNELS {
            return Err(GameError::CantDoThatBro);
        }
        self.actor_mut()?.queue_broadcast(channel, data);
        Ok(())
    }

    /// Read a team radio channel; zero if never written.
    pub fn read_broadcast(&self, channel: u32) -> ActionResult<i32> {
        if channel > BROADCAST_MAX_CHANNELS {
            return Err(GameError::CantDoThatBro);
        }
        let actor = self.actor()?;
        if let Some(queued) = actor.queued_broadcast_for(channel) {
            return Ok(queued);
        }
        Ok(self.world.read_channel(actor.team, channel))
    }

    // ----- spatial signals -----

    /// Plain signals sent so far this turn.
    #[must_use]
    pub fn basic_signal_count(&self) -> u32 {
        self.actor().map_or(0, |r| r.basic_signal_count)
    }

    /// Message signals sent so far this turn.
    #[must_use]
    pub fn message_signal_count(&self) -> u32 {
        self.actor().map_or(0, |r| r.message_signal_count)
    }

    fn emit_spatial_signal(
        &mut self,
        radius_squared: i32,
        message: Option<[i32; 2]>,
    ) -> ActionResult<()> {
        if radius_squared < 0 {
            return Err(GameError::CantDoThatBro);
        }
        let actor = self.actor()?;
        let over_cap = match message {
            None => actor.basic_signal_count >= BASIC_SIGNALS_PER_TURN,
            Some(_) => actor.message_signal_count >= MESSAGE_SIGNALS_PER_TURN,
        };
        if over_cap {
            return Err(GameError::CantDoThatBro);
        }

        let sender_loc = actor.location;
        let sender_team = actor.team;
        let sensor = f64::from(actor.robot_type.sensor_radius_squared());
        // Shouting past twice your own sight costs extra delay.
        let excess = (f64::from(radius_squared) / sensor - 2.0).max(0.0);
        let delay =
            BROADCAST_BASE_DELAY_INCREASE + excess * BROADCAST_ADDITIONAL_DELAY_INCREASE;

        {
            let actor = self.actor_mut()?;
            match message {
                None => actor.basic_signal_count += 1,
                Some(_) => actor.message_signal_count += 1,
            }
        }
        self.charge(delay, delay);

        let signal = BroadcastSignal {
            robot_id: self.id,
            team: sender_team,
            location: sender_loc,
            message,
        };
        let recipients: Vec<u32> = self
            .world
            .all_robots()
            .filter(|r| r.id != self.id)
            .filter(|r| r.location.distance_squared_to(sender_loc) <= radius_squared)
            .map(|r| r.id)
            .collect();
        for id in recipients {
            if let Some(robot) = self.world.robot_mut(id) {
                robot.deliver_signal(signal.clone());
            }
        }
        self.world.push_signal(Signal::Broadcast(signal));
        Ok(())
    }

    /// Ping this robot's location to everything within the radius.
    pub fn broadcast_signal(&mut self, radius_squared: i32) -> ActionResult<()> {
        self.emit_spatial_signal(radius_squared, None)
    }

    /// Send a two-word message to everything within the radius.
    pub fn broadcast_message_signal(
        &mut self,
        first: i32,
        second: i32,
        radius_squared: i32,
    ) -> ActionResult<()> {
        self.emit_spatial_signal(radius_squared, Some([first, second]))
    }

    /// Pop the oldest unread signal, if any.
    pub fn read_signal(&mut self) -> Option<BroadcastSignal> {
        self.world.robot_mut(self.id)?.read_signal()
    }

    /// Take the whole inbox at once, oldest first.
    pub fn empty_signal_queue(&mut self) -> Vec<BroadcastSignal> {
        self.world
            .robot_mut(self.id)
            .map(InternalRobot::empty_signal_queue)
            .unwrap_or_default()
    }

    // ----- supply -----

    /// Hand supply to a robot within transfer range.
    pub fn transfer_supplies(&mut self, amount: f64, loc: MapLocation) -> ActionResult<()> {
        let actor = self.actor()?;
        if actor.location.distance_squared_to(loc) > SUPPLY_TRANSFER_RADIUS_SQUARED {
            return Err(GameError::CantDoThatBro);
        }
        let target_id = self
            .world
            .robot_at(loc)
            .map(|r| r.id)
            .ok_or(GameError::NoRobotThere)?;
        let give = amount.max(0.0).min(actor.supply_level);

        self.actor_mut()?.supply_level -= give;
        if let Some(target) = self.world.robot_mut(target_id) {
            target.supply_level += give;
        }
        Ok(())
    }

    /// Drop supply onto this robot's tile.
    pub fn drop_supplies(&mut self, amount: f64) -> ActionResult<()> {
        let actor = self.actor()?;
        let loc = actor.location;
        let drop = amount.max(0.0).min(actor.supply_level);
        self.actor_mut()?.supply_level -= drop;
        let total = self.world.adjust_supply(loc, drop);
        self.world.push_signal(Signal::LocationSupplyChange {
            location: loc,
            amount: total,
        });
        Ok(())
    }

    /// Pick loose supply up from this robot's tile.
    pub fn pick_up_supplies(&mut self, amount: f64) -> ActionResult<()> {
        let loc = self.actor()?.location;
        let take = amount.max(0.0).min(self.world.supply(loc));
        let total = self.world.adjust_supply(loc, -take);
        self.actor_mut()?.supply_level += take;
        self.world.push_signal(Signal::LocationSupplyChange {
            location: loc,
            amount: total,
        });
        Ok(())
    }

    // ----- team memory -----

    /// Overwrite a slot of the team's persistent memory.
    pub fn set_team_memory(&mut self, index: usize, value: i64) {
        if let Ok(actor) = self.actor() {
            let team = actor.team;
            self.world.set_team_memory(team, index, value, None);
        }
    }

    /// Write the masked bits of a slot of the team's persistent memory.
    pub fn set_team_memory_masked(&mut self, index: usize, value: i64, mask: i64) {
        if let Ok(actor) = self.actor() {
            let team = actor.team;
            self.world.set_team_memory(team, index, value, Some(mask));
        }
    }

    /// The team memory as it stood when the round began.
    #[must_use]
    pub fn get_team_memory(&self) -> [i64; TEAM_MEMORY_LENGTH] {
        self.actor()
            .map_or([0; TEAM_MEMORY_LENGTH], |r| {
                self.world.team_memory_snapshot(r.team)
            })
    }

    // ----- debug channel -----

    /// Update one of this robot's indicator string slots. Out-of-range
    /// indices are ignored.
    pub fn set_indicator_string(&mut self, index: u32, value: &str) {
        if index < NUMBER_OF_INDICATOR_STRINGS {
            self.world.push_signal(Signal::IndicatorString {
                id: self.id,
                index,
                value: value.to_string(),
            });
        }
    }

    /// Draw a debug dot for the viewer.
    pub fn set_indicator_dot(&mut self, loc: MapLocation, red: u8, green: u8, blue: u8) {
        self.world.push_signal(Signal::IndicatorDot {
            id: self.id,
            location: loc,
            red,
            green,
            blue,
        });
    }

    /// Draw a debug line for the viewer.
    pub fn set_indicator_line(
        &mut self,
        from: MapLocation,
        to: MapLocation,
        red: u8,
        green: u8,
        blue: u8,
    ) {
        self.world.push_signal(Signal::IndicatorLine {
            id: self.id,
            from,
            to,
            red,
            green,
            blue,
        });
    }

    /// Record a free-form observation into the match stream.
    pub fn add_match_observation(&mut self, observation: &str) {
        self.world.push_signal(Signal::MatchObservation {
            id: self.id,
            observation: observation.to_string(),
        });
    }
}
