//! World invariants - sanity checks that detect engine bugs.
//!
//! These should NEVER trigger in a correctly implemented engine. They are
//! not gameplay limits; a violation means a rule mutated state it had no
//! business touching, and the match should abort deterministically.

use crate::game::catalog::Team;
use crate::game::constants::SIGNAL_QUEUE_MAX_SIZE;
use crate::game::geometry::MapLocation;
use crate::game::world::GameWorld;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all world invariants.
///
/// Returns the violations found, empty if the world is consistent.
#[must_use]
pub fn check_invariants(world: &GameWorld) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let origin = world.map().origin();
    for y in 0..world.map().height() {
        for x in 0..world.map().width() {
            let loc = MapLocation::new(origin.x + x, origin.y + y);
            if world.rubble(loc) < 0.0 {
                violations.push(InvariantViolation {
                    message: format!("Negative rubble {} at {:?}", world.rubble(loc), loc),
                });
            }
            if world.parts(loc) < 0.0 {
                violations.push(InvariantViolation {
                    message: format!("Negative parts {} at {:?}", world.parts(loc), loc),
                });
            }
            if world.ore(loc) < 0.0 {
                violations.push(InvariantViolation {
                    message: format!("Negative ore {} at {:?}", world.ore(loc), loc),
                });
            }
            if world.supply(loc) < 0.0 {
                violations.push(InvariantViolation {
                    message: format!("Negative supply {} at {:?}", world.supply(loc), loc),
                });
            }
        }
    }

    for team in [Team::A, Team::B] {
        if world.resources(team) < 0.0 {
            violations.push(InvariantViolation {
                message: format!("Team {team:?} has negative resources {}", world.resources(team)),
            });
        }
    }

    let mut seen_locations: Vec<MapLocation> = Vec::new();
    for robot in world.all_robots() {
        if seen_locations.contains(&robot.location) {
            violations.push(InvariantViolation {
                message: format!("Two robots share location {:?}", robot.location),
            });
        }
        seen_locations.push(robot.location);

        if robot.health > robot.max_health {
            violations.push(InvariantViolation {
                message: format!(
                    "Robot {} health {} exceeds max {}",
                    robot.id, robot.health, robot.max_health
                ),
            });
        }
        if robot.core_delay < 0.0 || robot.weapon_delay < 0.0 {
            violations.push(InvariantViolation {
                message: format!(
                    "Robot {} has negative delay ({}, {})",
                    robot.id, robot.core_delay, robot.weapon_delay
                ),
            });
        }
        if robot.inbox.len() > SIGNAL_QUEUE_MAX_SIZE {
            violations.push(InvariantViolation {
                message: format!(
                    "Robot {} inbox holds {} > {}",
                    robot.id,
                    robot.inbox.len(),
                    SIGNAL_QUEUE_MAX_SIZE
                ),
            });
        }

        let occupant = world.robot_at(robot.location).map(|r| r.id);
        if occupant != Some(robot.id) {
            violations.push(InvariantViolation {
                message: format!(
                    "Robot {} at {:?} missing from the spatial index",
                    robot.id, robot.location
                ),
            });
        }
    }

    violations
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with a detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(world: &GameWorld) {
    let violations = check_invariants(world);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_world: &GameWorld) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::RobotType;
    use crate::game::map::GameMapBuilder;

    fn valid_world() -> GameWorld {
        let mut world = GameWorld::new(GameMapBuilder::new(10, 10, 100).build());
        world.spawn_robot(RobotType::Archon, Team::A, MapLocation::new(0, 0), None, 0, 1.0);
        world.spawn_robot(RobotType::Soldier, Team::B, MapLocation::new(5, 5), None, 0, 1.0);
        world
    }

    #[test]
    fn test_valid_world_passes() {
        let world = valid_world();
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_overheal_detected() {
        let mut world = valid_world();
        let id = world.robot_at(MapLocation::new(5, 5)).unwrap().id;
        world.robot_mut(id).unwrap().health = RobotType::Soldier.max_health() + 1.0;

        let violations = check_invariants(&world);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("exceeds max"));
    }

    #[test]
    fn test_negative_delay_detected() {
        let mut world = valid_world();
        let id = world.robot_at(MapLocation::new(5, 5)).unwrap().id;
        world.robot_mut(id).unwrap().core_delay = -0.5;

        let violations = check_invariants(&world);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("negative delay"));
    }

    #[test]
    fn test_world_stays_valid_through_a_fight() {
        let mut world = valid_world();
        let attacker = world.robot_at(MapLocation::new(5, 5)).unwrap().id;
        world.begin_round(Vec::new());
        world.damage_robot(
            attacker,
            1e9,
            Some((RobotType::Soldier, Team::A)),
        );
        world.end_round();
        assert!(check_invariants(&world).is_empty());
    }
}
