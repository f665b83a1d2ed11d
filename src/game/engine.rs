//! The round engine.
//!
//! A [`Match`] owns a [`GameWorld`] and drives it one round at a time.
//! Within a round every living robot is visited once, in ascending-id
//! order; each visit hands the robot's controller a [`RobotController`]
//! and runs it to completion before the next robot is touched. All of a
//! robot's mutations are visible to every later-visited robot in the
//! same round.
//!
//! The instrumented player sandbox is an external collaborator: it maps
//! player code onto the controller callback and reports a bytecodes-used
//! figure per turn through [`Match::set_bytecodes_used`].

use crate::game::catalog::{RobotType, Team};
use crate::game::controller::RobotController;
use crate::game::geometry::MapLocation;
use crate::game::map::GameMap;
use crate::game::signal::Signal;
use crate::game::world::{GameWorld, MatchOutcome};

/// A match in progress: the world plus round scheduling.
#[derive(Debug)]
pub struct Match {
    world: GameWorld,
    injected: Vec<Signal>,
}

impl Match {
    /// Start a match on a map. Initial robots are placed and team
    /// ledgers seeded; no round has run yet.
    #[must_use]
    pub fn new(map: GameMap) -> Self {
        Self {
            world: GameWorld::new(map),
            injected: Vec::new(),
        }
    }

    /// Read-only view of the world.
    #[must_use]
    pub const fn world(&self) -> &GameWorld {
        &self.world
    }

    /// Mutable access to the world, for harnesses and tests.
    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    /// Whether the match has been decided.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.world.winner().is_some()
    }

    /// Place a robot directly, skipping construction. Harness use only;
    /// in-game placement goes through spawn and build actions.
    pub fn spawn(&mut self, loc: MapLocation, robot_type: RobotType, team: Team) -> u32 {
        self.world.spawn_robot(robot_type, team, loc, None, 0, 1.0)
    }

    /// Record the bytecodes a robot's sandbox burned this turn; the
    /// next turn's delay decay depends on it.
    pub fn set_bytecodes_used(&mut self, id: u32, bytecodes: u32) {
        if let Some(robot) = self.world.robot_mut(id) {
            robot.bytecodes_used = bytecodes;
        }
    }

    /// Append a signal verbatim to the next round's event stream.
    pub fn inject(&mut self, signal: Signal) {
        self.injected.push(signal);
    }

    /// Run one full round: every living robot's controller, then the
    /// end-of-round bookkeeping. Returns the round's event stream.
    pub fn round<F>(&mut self, mut controller: F) -> Vec<Signal>
    where
        F: FnMut(u32, &mut RobotController),
    {
        self.world.begin_round(std::mem::take(&mut self.injected));

        // The roster is fixed at round start; robots placed mid-round
        // wait for the next round.
        for id in self.world.robot_ids() {
            let Some(robot) = self.world.robot_mut(id) else {
                // Died earlier this round.
                continue;
            };
            if robot.rounds_until_active > 0 {
                robot.rounds_until_active -= 1;
                continue;
            }
            robot.decay_delays();
            robot.begin_turn();

            let mut rc = RobotController::new(&mut self.world, id);
            controller(id, &mut rc);

            self.world.flush_broadcasts(id);
            self.world.record_robot_sight(id);
        }

        self.world.end_round();
        self.world.drain_signals()
    }

    /// Run rounds with an inert controller, letting delays tick down.
    pub fn wait_rounds(&mut self, rounds: u32) {
        for _ in 0..rounds {
            self.round(|_, _| {});
        }
    }

    /// Run the same controller every round until the match is decided.
    /// The round-limit tiebreak guarantees a decision.
    pub fn run<F>(&mut self, mut controller: F) -> MatchOutcome
    where
        F: FnMut(u32, &mut RobotController),
    {
        loop {
            if let Some(outcome) = self.world.winner() {
                return outcome;
            }
            self.round(&mut controller);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::Direction;
    use crate::game::map::GameMapBuilder;
    use crate::game::signal::DeathCause;

    const EPSILON: f64 = 1.0e-9;

    fn basic_match() -> Match {
        Match::new(GameMapBuilder::new(10, 10, 100).build())
    }

    #[test]
    fn test_delays_decay_between_turns() {
        let mut game = basic_match();
        let soldier = game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        game.set_bytecodes_used(soldier, 0);

        game.round(|id, rc| {
            if id == soldier {
                rc.move_to(Direction::East).unwrap();
            }
        });
        // The acting round ends with the full charge in place.
        let robot = game.world().robot(soldier).unwrap();
        assert!((robot.core_delay - RobotType::Soldier.movement_delay()).abs() < EPSILON);
        assert!((robot.weapon_delay - RobotType::Soldier.cooldown_delay()).abs() < EPSILON);

        game.wait_rounds(1);
        let robot = game.world().robot(soldier).unwrap();
        assert!((robot.core_delay - (RobotType::Soldier.movement_delay() - 1.0)).abs() < EPSILON);

        game.wait_rounds(3);
        let robot = game.world().robot(soldier).unwrap();
        assert!((robot.core_delay - 0.0).abs() < EPSILON);
        assert!((robot.weapon_delay - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_heavy_bytecode_usage_slows_decay() {
        let mut game = basic_match();
        let soldier = game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        game.set_bytecodes_used(soldier, RobotType::Soldier.bytecode_limit() - 4000);

        game.round(|id, rc| {
            if id == soldier {
                rc.move_to(Direction::East).unwrap();
            }
        });
        game.wait_rounds(1);

        let decrement = 1.0 - 0.3 * 0.5_f64.powf(1.5);
        let robot = game.world().robot(soldier).unwrap();
        assert!(
            (robot.core_delay - (RobotType::Soldier.movement_delay() - decrement)).abs() < EPSILON
        );
    }

    #[test]
    fn test_actions_visible_within_turn() {
        let mut game = Match::new(GameMapBuilder::new(3, 1, 20).build());
        let a = game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        let b = game.spawn(MapLocation::new(2, 0), RobotType::Soldier, Team::B);

        game.round(|id, rc| {
            if id != a {
                return;
            }
            assert_eq!(rc.location(), MapLocation::new(0, 0));
            rc.move_to(Direction::East).unwrap();
            assert_eq!(rc.location(), MapLocation::new(1, 0));
        });

        game.wait_rounds(10);

        game.round(|id, rc| {
            if id != a {
                return;
            }
            let before = rc.sense_robot_at_location(MapLocation::new(2, 0)).unwrap().unwrap();
            assert!((before.health - RobotType::Soldier.max_health()).abs() < 1e-5);
            rc.attack_location(MapLocation::new(2, 0)).unwrap();
            let after = rc.sense_robot_at_location(MapLocation::new(2, 0)).unwrap().unwrap();
            assert!(
                (after.health
                    - (RobotType::Soldier.max_health() - RobotType::Soldier.attack_power()))
                .abs()
                    < 1e-5
            );
        });
        assert!(game.world().robot(b).is_some());
    }

    #[test]
    fn test_spawned_robot_waits_out_construction() {
        let mut game = basic_match();
        let archon = game.spawn(MapLocation::new(5, 5), RobotType::Archon, Team::A);
        let mut spawned_acted = false;

        game.round(|id, rc| {
            if id == archon {
                rc.spawn(Direction::East, RobotType::Soldier).unwrap();
            }
        });
        let soldier = game.world().robot_at(MapLocation::new(6, 5)).unwrap().id;

        for _ in 0..RobotType::Soldier.build_turns() {
            game.round(|id, _| {
                if id == soldier {
                    spawned_acted = true;
                }
            });
            assert!(!spawned_acted, "acted while under construction");
        }
        game.round(|id, _| {
            if id == soldier {
                spawned_acted = true;
            }
        });
        assert!(spawned_acted);
    }

    #[test]
    fn test_broadcast_visible_next_round() {
        let mut game = basic_match();
        let writer = game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        let reader = game.spawn(MapLocation::new(5, 5), RobotType::Soldier, Team::A);

        game.round(|id, rc| {
            if id == writer {
                rc.broadcast(42, 777).unwrap();
            } else if id == reader {
                // Writer runs first (lower id), so the flush has landed.
                assert_eq!(rc.read_broadcast(42).unwrap(), 777);
            }
        });
        game.round(|id, rc| {
            if id == reader {
                assert_eq!(rc.read_broadcast(42).unwrap(), 777);
            }
        });
    }

    #[test]
    fn test_injected_signals_lead_next_round_stream() {
        let mut game = basic_match();
        game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        // Flush the placement signal out of the stream first.
        game.round(|_, _| {});

        game.inject(Signal::MatchObservation {
            id: 0,
            observation: "injected".to_string(),
        });
        let signals = game.round(|_, _| {});
        assert_eq!(
            signals.first(),
            Some(&Signal::MatchObservation {
                id: 0,
                observation: "injected".to_string(),
            })
        );
    }

    #[test]
    fn test_research_completes_after_rounds() {
        use crate::game::catalog::Upgrade;
        let mut game = basic_match();
        let hq = game.spawn(MapLocation::new(5, 5), RobotType::Hq, Team::A);

        game.round(|id, rc| {
            if id == hq {
                rc.research_upgrade(Upgrade::Pickaxe).unwrap();
            }
        });
        game.wait_rounds(Upgrade::Pickaxe.num_rounds() - 1);
        assert!(game.world().has_upgrade(Team::A, Upgrade::Pickaxe));
    }

    #[test]
    fn test_scheduled_outbreak_spawns_scaled_zombies() {
        let map = GameMapBuilder::new(10, 10, 1000)
            .with_zombie_spawn(601, RobotType::RangedZombie, 1)
            .build();
        let mut game = Match::new(map);
        game.spawn(MapLocation::new(5, 5), RobotType::ZombieDen, Team::Zombie);

        game.wait_rounds(600);
        assert_eq!(game.world().robot_count(Team::Zombie), 1);
        game.wait_rounds(1);

        let zombie = game
            .world()
            .robot_at(MapLocation::new(5, 4))
            .expect("zombie north of den");
        assert_eq!(zombie.robot_type, RobotType::RangedZombie);
        assert!((zombie.health - RobotType::RangedZombie.max_health() * 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_dead_robot_skipped_same_round() {
        let mut game = basic_match();
        let killer = game.spawn(MapLocation::new(0, 0), RobotType::BigZombie, Team::Zombie);
        let victim = game.spawn(MapLocation::new(0, 1), RobotType::Beaver, Team::A);
        game.world_mut()
            .robot_mut(victim)
            .unwrap()
            .take_damage(RobotType::Beaver.max_health() - 1.0);

        let mut victim_acted = false;
        game.round(|id, rc| {
            if id == killer {
                rc.attack_location(MapLocation::new(0, 1)).unwrap();
            } else if id == victim {
                victim_acted = true;
            }
        });
        assert!(!victim_acted, "reaped robot still got a turn");
    }

    #[test]
    fn test_run_reaches_round_limit_tiebreak() {
        let map = GameMapBuilder::new(5, 5, 10).with_seed(99).build();
        let mut game = Match::new(map);
        game.spawn(MapLocation::new(0, 0), RobotType::Archon, Team::A);
        game.spawn(MapLocation::new(4, 4), RobotType::Archon, Team::B);

        let outcome = game.run(|_, _| {});
        assert_eq!(game.world().round(), 10);
        // Same archons, same health: decided by the seeded coin.
        assert!(outcome.winner == Team::A || outcome.winner == Team::B);
    }

    #[test]
    fn test_death_signal_emitted_on_reap() {
        let mut game = basic_match();
        let soldier = game.spawn(MapLocation::new(0, 0), RobotType::Soldier, Team::A);
        game.world_mut()
            .damage_robot(soldier, 1e9, Some((RobotType::Soldier, Team::B)));

        let signals = game.round(|_, _| {});
        assert!(signals.contains(&Signal::Death {
            id: soldier,
            cause: DeathCause::NormalAttack,
        }));
    }
}
