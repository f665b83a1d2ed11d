//! Per-robot mutable state and delay accounting.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::game::catalog::{CommanderSkillType, RobotType, Team, Upgrade};
use crate::game::constants::{DELAY_DECAY_FREE_BYTECODES, SIGNAL_QUEUE_MAX_SIZE};
use crate::game::geometry::MapLocation;
use crate::game::signal::BroadcastSignal;

/// Snapshot of a robot as other robots sense it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotInfo {
    pub id: u32,
    pub team: Team,
    pub robot_type: RobotType,
    pub location: MapLocation,
    pub health: f64,
    pub max_health: f64,
    pub core_delay: f64,
    pub weapon_delay: f64,
    pub supply_level: f64,
    pub xp: u32,
    pub missile_count: u32,
    pub infected: bool,
    /// Rounds left under construction; zero means the robot can act.
    pub rounds_until_active: u32,
}

/// The authoritative record for one living robot.
///
/// Robots refer to each other by id only; all navigation back to the
/// world goes through the engine handle, never through pointers.
#[derive(Debug, Clone)]
pub struct InternalRobot {
    pub id: u32,
    pub robot_type: RobotType,
    pub team: Team,
    pub location: MapLocation,
    pub health: f64,
    /// Effective max health; outbreak-scaled at spawn for zombies.
    pub max_health: f64,
    pub core_delay: f64,
    pub weapon_delay: f64,
    pub supply_level: f64,
    pub missile_count: u32,
    pub xp: u32,
    /// Bytecodes the sandbox reports for the robot's last turn.
    pub bytecodes_used: u32,
    pub infected: bool,
    /// Rounds left before a freshly placed robot can act.
    pub rounds_until_active: u32,
    /// Upgrade being researched and rounds left, if any.
    pub research: Option<(Upgrade, u32)>,
    pub(crate) basic_signal_count: u32,
    pub(crate) message_signal_count: u32,
    /// Radio writes made this turn, not yet visible to teammates.
    pub(crate) queued_broadcasts: BTreeMap<u32, i32>,
    pub(crate) inbox: VecDeque<BroadcastSignal>,
    pub(crate) moved_this_turn: bool,
    /// Tiles this launcher has already fired at this turn.
    pub(crate) launched_at: Vec<MapLocation>,
    pub(crate) self_destructed: bool,
}

impl InternalRobot {
    /// Create a robot at full health.
    ///
    /// `health_multiplier` is the outbreak multiplier for zombie spawns;
    /// everything else passes 1.0.
    #[must_use]
    pub fn new(
        id: u32,
        robot_type: RobotType,
        team: Team,
        location: MapLocation,
        health_multiplier: f64,
        rounds_until_active: u32,
    ) -> Self {
        let max_health = robot_type.max_health() * health_multiplier;
        Self {
            id,
            robot_type,
            team,
            location,
            health: max_health,
            max_health,
            core_delay: 0.0,
            weapon_delay: 0.0,
            supply_level: 0.0,
            missile_count: 0,
            xp: 0,
            bytecodes_used: 0,
            infected: false,
            rounds_until_active,
            research: None,
            basic_signal_count: 0,
            message_signal_count: 0,
            queued_broadcasts: BTreeMap::new(),
            inbox: VecDeque::new(),
            moved_this_turn: false,
            launched_at: Vec::new(),
            self_destructed: false,
        }
    }

    /// Whether construction has finished and the robot may act.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.rounds_until_active == 0
    }

    /// Whether the core counter permits movement-class actions.
    #[must_use]
    pub fn core_ready(&self) -> bool {
        self.core_delay < 1.0
    }

    /// Whether the weapon counter permits attack-class actions.
    #[must_use]
    pub fn weapon_ready(&self) -> bool {
        self.weapon_delay < 1.0
    }

    /// Add delay to both counters.
    pub fn charge(&mut self, core: f64, weapon: f64) {
        self.core_delay += core;
        self.weapon_delay += weapon;
    }

    /// Decay both delay counters by the rate earned with last turn's
    /// bytecode usage. Runs once between the robot's turns.
    ///
    /// Up to the free budget (`bytecode_limit - DELAY_DECAY_FREE_BYTECODES`,
    /// exclusive) the full 1.0 decays; past the limit only 0.7 does; in
    /// between the rate falls off with a 3/2-power curve.
    pub fn decay_delays(&mut self) {
        let limit = self.robot_type.bytecode_limit();
        let free = limit.saturating_sub(DELAY_DECAY_FREE_BYTECODES);
        let used = self.bytecodes_used;

        let decay = if used < free {
            1.0
        } else if used < limit {
            1.0 - 0.3 * (f64::from(used) / f64::from(limit)).powf(1.5)
        } else {
            0.7
        };

        self.core_delay = (self.core_delay - decay).max(0.0);
        self.weapon_delay = (self.weapon_delay - decay).max(0.0);
    }

    /// Reset the per-turn bookkeeping before the robot's controller runs.
    pub fn begin_turn(&mut self) {
        self.basic_signal_count = 0;
        self.message_signal_count = 0;
        self.moved_this_turn = false;
        self.launched_at.clear();
    }

    /// Apply raw damage, ignoring any reduction rules.
    pub fn take_damage(&mut self, amount: f64) {
        self.health -= amount;
    }

    /// Heal, capped at max health.
    pub fn heal(&mut self, amount: f64) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Queue a radio write; it becomes visible to teammates when the
    /// turn ends.
    pub fn queue_broadcast(&mut self, channel: u32, data: i32) {
        self.queued_broadcasts.insert(channel, data);
    }

    /// A radio value this robot wrote earlier in its own turn, if any.
    #[must_use]
    pub fn queued_broadcast_for(&self, channel: u32) -> Option<i32> {
        self.queued_broadcasts.get(&channel).copied()
    }

    /// Deliver a broadcast into the inbox, dropping the oldest entry if
    /// the queue is full.
    pub fn deliver_signal(&mut self, signal: BroadcastSignal) {
        if self.inbox.len() >= SIGNAL_QUEUE_MAX_SIZE {
            self.inbox.pop_front();
        }
        self.inbox.push_back(signal);
    }

    /// Pop the oldest unread broadcast.
    pub fn read_signal(&mut self) -> Option<BroadcastSignal> {
        self.inbox.pop_front()
    }

    /// Atomically take the whole inbox, oldest first.
    pub fn empty_signal_queue(&mut self) -> Vec<BroadcastSignal> {
        self.inbox.drain(..).collect()
    }

    /// Whether a commander-skill threshold has been reached. Only
    /// meaningful for commanders.
    #[must_use]
    pub fn has_learned_skill(&self, skill: CommanderSkillType) -> bool {
        self.robot_type == RobotType::Commander && self.xp >= skill.xp_required()
    }

    /// The sensing snapshot other robots receive.
    #[must_use]
    pub fn info(&self) -> RobotInfo {
        RobotInfo {
            id: self.id,
            team: self.team,
            robot_type: self.robot_type,
            location: self.location,
            health: self.health,
            max_health: self.max_health,
            core_delay: self.core_delay,
            weapon_delay: self.weapon_delay,
            supply_level: self.supply_level,
            xp: self.xp,
            missile_count: self.missile_count,
            infected: self.infected,
            rounds_until_active: self.rounds_until_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Team;

    const EPSILON: f64 = 1.0e-9;

    fn soldier() -> InternalRobot {
        InternalRobot::new(1, RobotType::Soldier, Team::A, MapLocation::new(0, 0), 1.0, 0)
    }

    #[test]
    fn test_full_decay_below_free_threshold() {
        let mut robot = soldier();
        robot.charge(2.0, 1.0);
        robot.bytecodes_used = 0;
        robot.decay_delays();
        assert!((robot.core_delay - 1.0).abs() < EPSILON);
        assert!((robot.weapon_delay - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_partial_decay_at_free_threshold() {
        // A soldier's free budget is limit - 4000 = limit / 2, so the
        // falloff curve evaluates at exactly 0.5.
        let mut robot = soldier();
        robot.charge(2.0, 2.0);
        robot.bytecodes_used = RobotType::Soldier.bytecode_limit() - 4000;
        robot.decay_delays();
        let expected = 1.0 - 0.3 * 0.5_f64.powf(1.5);
        assert!((robot.core_delay - (2.0 - expected)).abs() < EPSILON);
        assert!((robot.weapon_delay - (2.0 - expected)).abs() < EPSILON);
    }

    #[test]
    fn test_minimum_decay_at_limit() {
        let mut robot = soldier();
        robot.charge(2.0, 2.0);
        robot.bytecodes_used = RobotType::Soldier.bytecode_limit();
        robot.decay_delays();
        assert!((robot.core_delay - 1.3).abs() < EPSILON);
        assert!((robot.weapon_delay - 1.3).abs() < EPSILON);
    }

    #[test]
    fn test_delays_saturate_at_zero() {
        let mut robot = soldier();
        robot.charge(0.25, 0.0);
        robot.decay_delays();
        assert!((robot.core_delay - 0.0).abs() < EPSILON);
        assert!((robot.weapon_delay - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_inbox_drops_oldest_on_overflow() {
        let mut robot = soldier();
        for i in 0..(SIGNAL_QUEUE_MAX_SIZE as i32 + 20) {
            robot.deliver_signal(BroadcastSignal {
                robot_id: 2,
                team: Team::B,
                location: MapLocation::new(0, 0),
                message: Some([i, 0]),
            });
        }
        assert_eq!(robot.inbox.len(), SIGNAL_QUEUE_MAX_SIZE);
        let first = robot.read_signal().unwrap();
        assert_eq!(first.message, Some([20, 0]));
    }

    #[test]
    fn test_empty_signal_queue_clears() {
        let mut robot = soldier();
        for _ in 0..3 {
            robot.deliver_signal(BroadcastSignal {
                robot_id: 2,
                team: Team::B,
                location: MapLocation::new(0, 0),
                message: None,
            });
        }
        let drained = robot.empty_signal_queue();
        assert_eq!(drained.len(), 3);
        assert!(robot.read_signal().is_none());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut robot = soldier();
        robot.take_damage(10.0);
        robot.heal(100.0);
        assert!((robot.health - robot.max_health).abs() < EPSILON);
    }

    #[test]
    fn test_outbreak_multiplier_scales_spawn_health() {
        let zombie = InternalRobot::new(
            5,
            RobotType::RangedZombie,
            Team::Zombie,
            MapLocation::new(0, 0),
            1.2,
            0,
        );
        assert!((zombie.health - RobotType::RangedZombie.max_health() * 1.2).abs() < EPSILON);
        assert!((zombie.max_health - RobotType::RangedZombie.max_health() * 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_commander_skills_by_xp() {
        let mut commander = InternalRobot::new(
            9,
            RobotType::Commander,
            Team::A,
            MapLocation::new(0, 0),
            1.0,
            0,
        );
        assert!(commander.has_learned_skill(CommanderSkillType::Regeneration));
        assert!(!commander.has_learned_skill(CommanderSkillType::Flash));
        commander.xp = 2000;
        assert!(commander.has_learned_skill(CommanderSkillType::Flash));

        let soldier = soldier();
        assert!(!soldier.has_learned_skill(CommanderSkillType::Regeneration));
    }
}
