//! Benchmarks for running complete matches.
//!
//! This exercises the full round loop - sensing, action arbitration,
//! and end-of-round bookkeeping - the hot path of the engine.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use skirmish::game::Team;
use skirmish::{Direction, GameMap, GameMapBuilder, Match, MatchOutcome, RobotType};

const DIRECTIONS: [Direction; 8] = Direction::CARDINAL_ORDER;

fn skirmish_map(seed: u64) -> GameMap {
    let mut builder = GameMapBuilder::new(30, 30, 200).with_seed(seed);
    for i in 0..10 {
        builder = builder
            .with_parts(3 * i, 7, 20.0)
            .with_rubble(i, 2 * i, 60.0)
            .with_ore(29 - i, 15, 40.0);
    }
    builder
        .with_robot(RobotType::Archon, Team::A, 0, 0)
        .with_robot(RobotType::Soldier, Team::A, 1, 0)
        .with_robot(RobotType::Soldier, Team::A, 0, 1)
        .with_robot(RobotType::Archon, Team::B, 29, 29)
        .with_robot(RobotType::Soldier, Team::B, 28, 29)
        .with_robot(RobotType::Soldier, Team::B, 29, 28)
        .with_robot(RobotType::ZombieDen, Team::Zombie, 15, 15)
        .with_zombie_spawn(50, RobotType::StandardZombie, 2)
        .with_zombie_spawn(150, RobotType::FastZombie, 3)
        .build()
}

/// A deterministic scripted controller: wander, shoot whatever is in
/// range, shout occasionally.
fn run_match(seed: u64) -> MatchOutcome {
    let mut game = Match::new(skirmish_map(seed));
    game.run(|id, rc| {
        let round = rc.round_num();
        let dir = DIRECTIONS[((id + round) % 8) as usize];
        if rc.can_move(dir) {
            let _ = rc.move_to(dir);
        }
        let hostiles = rc.sense_hostile_robots(rc.location(), rc.robot_type().attack_radius_squared());
        if let Some(target) = hostiles.first() {
            let _ = rc.attack_location(target.location);
        }
        if round % 10 == 0 {
            let _ = rc.broadcast_signal(24);
        }
    })
}

fn bench_full_match(c: &mut Criterion) {
    c.bench_function("full_match_30x30_200_rounds", |b| {
        b.iter(|| black_box(run_match(black_box(42))));
    });
}

fn bench_round_throughput(c: &mut Criterion) {
    c.bench_function("hundred_rounds_idle", |b| {
        b.iter(|| {
            let mut game = Match::new(skirmish_map(7));
            game.wait_rounds(100);
            black_box(game.world().round())
        });
    });
}

criterion_group!(benches, bench_full_match, bench_round_throughput);
criterion_main!(benches);
