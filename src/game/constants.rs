//! Game-wide tunables.
//!
//! Every number the rules reference lives here so a balance change never
//! means hunting through the engine.

/// Highest usable radio channel, inclusive.
pub const BROADCAST_MAX_CHANNELS: u32 = 65_535;

/// Plain location-ping signals a robot may emit per turn.
pub const BASIC_SIGNALS_PER_TURN: u32 = 5;

/// Message-carrying signals a robot may emit per turn.
pub const MESSAGE_SIGNALS_PER_TURN: u32 = 20;

/// Inbox capacity; on overflow the oldest entries are dropped.
pub const SIGNAL_QUEUE_MAX_SIZE: usize = 1000;

/// Core delay charged by a Flash teleport.
pub const FLASH_MOVEMENT_DELAY: f64 = 2.0;

/// Squared range limit of a Flash teleport.
pub const FLASH_RANGE_SQUARED: i32 = 10;

/// Weapon delay charged by mining.
pub const MINING_LOADING_DELAY: f64 = 1.0;

/// Core delay charged by mining.
pub const MINING_MOVEMENT_DELAY: f64 = 2.0;

/// Squared range within which supply can be transferred.
pub const SUPPLY_TRANSFER_RADIUS_SQUARED: i32 = 36;

/// Indicator string slots per robot.
pub const NUMBER_OF_INDICATOR_STRINGS: u32 = 3;

/// Fraction of a tile's rubble removed by one clear action.
pub const RUBBLE_CLEAR_PERCENTAGE: f64 = 0.05;

/// Flat rubble removed by one clear action, after the percentage.
pub const RUBBLE_CLEAR_FLAT_AMOUNT: f64 = 10.0;

/// Core delay charged by clearing rubble.
pub const RUBBLE_CLEAR_DELAY: f64 = 2.0;

/// Rubble at or above this blocks movement and placement.
pub const RUBBLE_OBSTRUCTION_THRESH: f64 = 100.0;

/// Rubble strictly above this doubles movement delay charges.
pub const RUBBLE_SLOW_THRESH: f64 = 50.0;

/// Fraction of max health deposited as rubble on death by turret fire.
pub const RUBBLE_FROM_TURRET_FACTOR: f64 = 1.0 / 3.0;

/// Factor applied to both movement charges for a diagonal step.
pub const DIAGONAL_DELAY_MULTIPLIER: f64 = 1.4;

/// Flat per-team parts income each round.
pub const ARCHON_PART_INCOME: f64 = 40.0;

/// Income reduction per living unit on the team.
pub const PART_INCOME_UNIT_PENALTY: f64 = 1.0;

/// Parts each player team starts with.
pub const PARTS_INITIAL_AMOUNT: f64 = 300.0;

/// Parts awarded to the team that destroys a zombie den.
pub const DEN_PART_REWARD: f64 = 20.0;

/// Damage shaved off every zombie attack against a guard.
pub const GUARD_DAMAGE_REDUCTION: f64 = 1.0;

/// Health restored by one archon repair.
pub const ARCHON_REPAIR_AMOUNT: f64 = 1.0;

/// Delay added to both counters by any spatial signal.
pub const BROADCAST_BASE_DELAY_INCREASE: f64 = 0.05;

/// Extra delay per unit of signal radius beyond twice the sender's sight.
pub const BROADCAST_ADDITIONAL_DELAY_INCREASE: f64 = 0.005;

/// Bytecodes below the per-type limit that still decay delays at the
/// full rate; the free threshold is `bytecode_limit - this`.
pub const DELAY_DECAY_FREE_BYTECODES: u32 = 4000;

/// Rounds between outbreak strength increases.
pub const OUTBREAK_TIMER: u32 = 300;

/// Outbreak multiplier gained per timer period.
pub const OUTBREAK_MULTIPLIER_INCREASE: f64 = 0.1;

/// Rounds between free missiles for a launcher.
pub const MISSILE_SPAWN_FREQUENCY: u32 = 6;

/// Most missiles a launcher can hold.
pub const MISSILE_MAX_COUNT: u32 = 5;

/// Damage dealt by an exploding missile.
pub const MISSILE_DAMAGE: f64 = 20.0;

/// Squared blast radius of an exploding missile.
pub const MISSILE_RADIUS_SQUARED: i32 = 2;

/// Squared radius of a basher's strike.
pub const BASH_RADIUS_SQUARED: i32 = 2;

/// Inner edge of the turret's attack window, squared.
pub const TURRET_MINIMUM_RANGE_SQUARED: i32 = 24;

/// Squared radius within which an archon can activate a neutral robot.
pub const ARCHON_ACTIVATION_RANGE_SQUARED: i32 = 2;

/// Health a commander with Regeneration recovers each round.
pub const REGENERATION_RATE: f64 = 1.0;

/// Beaver mining: divisor applied to tile ore per action.
pub const BEAVER_MINE_RATE: f64 = 20.0;

/// Beaver mining: floor on ore taken per action (capped by the tile).
pub const BEAVER_MINE_MAX: f64 = 2.0;

/// Miner mining: divisor applied to tile ore per action.
pub const MINER_MINE_RATE: f64 = 4.0;

/// Miner mining: floor on ore taken per action (capped by the tile).
pub const MINER_MINE_MAX: f64 = 3.0;

/// Slots in each team's persistent memory array.
pub const TEAM_MEMORY_LENGTH: usize = 32;

/// Cap on commander cost doublings.
pub const COMMANDER_MAX_COST_DOUBLINGS: u32 = 8;
