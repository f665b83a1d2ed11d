//! The unit catalog: teams, robot types and their stats, upgrades, and
//! commander skills.
//!
//! Stats live in `const fn` match tables so the whole catalog is
//! compile-time data; there is no runtime registry to keep in sync.

use serde::Serialize;

/// A faction in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Team {
    /// First player team.
    A,
    /// Second player team.
    B,
    /// Unowned robots waiting to be activated.
    Neutral,
    /// The scheduled outbreak faction.
    Zombie,
}

impl Team {
    /// The opposing player team. Neutral and Zombie oppose themselves.
    #[must_use]
    pub const fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
            other => other,
        }
    }

    /// Whether this is one of the two player-controlled teams.
    #[must_use]
    pub const fn is_player(self) -> bool {
        matches!(self, Team::A | Team::B)
    }

    /// Stable index for per-team storage.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
            Team::Neutral => 2,
            Team::Zombie => 3,
        }
    }
}

/// Every kind of robot the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RobotType {
    /// Headquarters: researches upgrades, spawns beavers and heroes.
    Hq,
    /// Mobile base: spawns combat units, repairs allies, activates neutrals.
    Archon,
    /// Worker: builds buildings and mines ore.
    Beaver,
    /// Dedicated ore miner.
    Miner,
    /// Line infantry.
    Soldier,
    /// Melee tank; shrugs off part of every zombie hit.
    Guard,
    /// Fast, far-sighted, unarmed.
    Scout,
    /// Infects the robots it attacks.
    Viper,
    /// Melee unit that strikes everything around it at once.
    Basher,
    /// Stationary long-range gun with a minimum-range blind spot.
    Turret,
    /// Unique hero unit: earns XP, learns skills, can teleport.
    Commander,
    /// Missile platform.
    Launcher,
    /// Single-use projectile; explodes, leaves no rubble.
    Missile,
    /// Supply logistics building.
    SupplyDepot,
    /// Spawns zombies on the outbreak schedule.
    ZombieDen,
    /// Baseline zombie. Infected corpses rise as this type.
    StandardZombie,
    /// Zombie with a ranged attack.
    RangedZombie,
    /// Zombie that closes distance quickly.
    FastZombie,
    /// Slow, devastating zombie.
    BigZombie,
}

impl RobotType {
    /// Maximum (and spawn) health, before any outbreak scaling.
    #[must_use]
    pub const fn max_health(self) -> f64 {
        match self {
            RobotType::Hq => 2000.0,
            RobotType::Archon => 1000.0,
            RobotType::Beaver => 30.0,
            RobotType::Miner => 40.0,
            RobotType::Soldier => 50.0,
            RobotType::Guard => 145.0,
            RobotType::Scout => 100.0,
            RobotType::Viper => 120.0,
            RobotType::Basher => 90.0,
            RobotType::Turret => 125.0,
            RobotType::Commander => 200.0,
            RobotType::Launcher => 150.0,
            RobotType::Missile => 3.0,
            RobotType::SupplyDepot => 100.0,
            RobotType::ZombieDen => 2000.0,
            RobotType::StandardZombie => 60.0,
            RobotType::RangedZombie => 60.0,
            RobotType::FastZombie => 80.0,
            RobotType::BigZombie => 500.0,
        }
    }

    /// Damage dealt by a single attack.
    #[must_use]
    pub const fn attack_power(self) -> f64 {
        match self {
            RobotType::Beaver => 2.0,
            RobotType::Soldier => 4.0,
            RobotType::Guard => 1.5,
            RobotType::Viper => 2.0,
            RobotType::Basher => 3.0,
            RobotType::Turret => 18.0,
            RobotType::Commander => 6.0,
            RobotType::StandardZombie => 3.0,
            RobotType::RangedZombie => 5.0,
            RobotType::FastZombie => 3.0,
            RobotType::BigZombie => 25.0,
            _ => 0.0,
        }
    }

    /// Weapon delay charged by an attack.
    #[must_use]
    pub const fn attack_delay(self) -> f64 {
        match self {
            RobotType::Beaver | RobotType::Viper | RobotType::Turret => 3.0,
            RobotType::Soldier | RobotType::Commander | RobotType::StandardZombie => 2.0,
            RobotType::Guard | RobotType::Basher => 1.0,
            RobotType::RangedZombie | RobotType::FastZombie => 2.0,
            RobotType::BigZombie => 3.0,
            _ => 0.0,
        }
    }

    /// Core delay charged alongside an attack, and weapon delay charged
    /// alongside a move.
    #[must_use]
    pub const fn cooldown_delay(self) -> f64 {
        match self {
            RobotType::Turret => 3.0,
            RobotType::Hq | RobotType::SupplyDepot | RobotType::ZombieDen => 0.0,
            RobotType::Missile => 0.0,
            _ => 1.0,
        }
    }

    /// Core delay charged by a cardinal move onto clear ground.
    #[must_use]
    pub const fn movement_delay(self) -> f64 {
        match self {
            RobotType::Scout | RobotType::FastZombie | RobotType::Missile => 1.0,
            RobotType::StandardZombie | RobotType::RangedZombie | RobotType::BigZombie => 3.0,
            _ => 2.0,
        }
    }

    /// Squared sensor radius. Zombies ignore this and see everything.
    #[must_use]
    pub const fn sensor_radius_squared(self) -> i32 {
        match self {
            RobotType::Hq | RobotType::Archon => 35,
            RobotType::Scout => 53,
            RobotType::Missile => 2,
            _ => 24,
        }
    }

    /// Squared attack radius. For the turret this is the outer edge of
    /// its window; for the archon it bounds repair and activation.
    #[must_use]
    pub const fn attack_radius_squared(self) -> i32 {
        match self {
            RobotType::Archon => 24,
            RobotType::Beaver => 5,
            RobotType::Soldier | RobotType::Viper | RobotType::Commander => 13,
            RobotType::Guard | RobotType::Basher => 2,
            RobotType::Turret => 48,
            RobotType::RangedZombie => 13,
            RobotType::StandardZombie | RobotType::FastZombie | RobotType::BigZombie => 2,
            _ => 0,
        }
    }

    /// Instrumented bytecode budget per turn.
    #[must_use]
    pub const fn bytecode_limit(self) -> u32 {
        match self {
            RobotType::Hq | RobotType::Archon | RobotType::Scout => 20_000,
            RobotType::Commander => 15_000,
            RobotType::Launcher => 12_000,
            RobotType::Soldier | RobotType::Basher | RobotType::Turret => 8_000,
            RobotType::Missile => 500,
            RobotType::SupplyDepot | RobotType::ZombieDen => 8_000,
            _ => 10_000,
        }
    }

    /// Parts cost to spawn or build one. Zombies and initial-only units
    /// are free.
    #[must_use]
    pub const fn part_cost(self) -> f64 {
        match self {
            RobotType::Beaver => 20.0,
            RobotType::Miner => 30.0,
            RobotType::Soldier | RobotType::Guard | RobotType::Scout => 25.0,
            RobotType::Viper | RobotType::Commander => 100.0,
            RobotType::Basher => 30.0,
            RobotType::Turret => 125.0,
            RobotType::Launcher => 150.0,
            RobotType::SupplyDepot => 50.0,
            _ => 0.0,
        }
    }

    /// Rounds a freshly placed robot of this type stays under
    /// construction before it can act.
    #[must_use]
    pub const fn build_turns(self) -> u32 {
        match self {
            RobotType::Beaver | RobotType::Soldier | RobotType::Guard | RobotType::Basher => 10,
            RobotType::Miner | RobotType::Scout => 15,
            RobotType::Viper | RobotType::Commander | RobotType::SupplyDepot => 20,
            RobotType::Turret | RobotType::Launcher => 25,
            _ => 0,
        }
    }

    /// Building this type requires the team to own an active robot of the
    /// returned type.
    #[must_use]
    pub const fn dependency(self) -> Option<RobotType> {
        match self {
            RobotType::Turret => Some(RobotType::SupplyDepot),
            _ => None,
        }
    }

    /// The type that spawns this one, if it is spawned rather than built.
    #[must_use]
    pub const fn spawn_source(self) -> Option<RobotType> {
        match self {
            RobotType::Beaver | RobotType::Commander | RobotType::Launcher => {
                Some(RobotType::Hq)
            }
            RobotType::Miner
            | RobotType::Soldier
            | RobotType::Guard
            | RobotType::Scout
            | RobotType::Viper
            | RobotType::Basher => Some(RobotType::Archon),
            RobotType::StandardZombie
            | RobotType::RangedZombie
            | RobotType::FastZombie
            | RobotType::BigZombie => Some(RobotType::ZombieDen),
            _ => None,
        }
    }

    /// Whether this type can move at all.
    #[must_use]
    pub const fn can_move(self) -> bool {
        !self.is_building()
    }

    /// Whether this type can attack with `attack_location` or `bash`.
    #[must_use]
    pub const fn can_attack(self) -> bool {
        matches!(
            self,
            RobotType::Beaver
                | RobotType::Soldier
                | RobotType::Guard
                | RobotType::Viper
                | RobotType::Basher
                | RobotType::Turret
                | RobotType::Commander
                | RobotType::StandardZombie
                | RobotType::RangedZombie
                | RobotType::FastZombie
                | RobotType::BigZombie
        )
    }

    /// Whether this type can construct buildings.
    #[must_use]
    pub const fn can_build(self) -> bool {
        matches!(self, RobotType::Beaver | RobotType::Archon)
    }

    /// Whether this type can spawn units.
    #[must_use]
    pub const fn can_spawn(self) -> bool {
        matches!(self, RobotType::Hq | RobotType::Archon | RobotType::ZombieDen)
    }

    /// Whether this type can mine ore from its own tile.
    #[must_use]
    pub const fn can_mine(self) -> bool {
        matches!(self, RobotType::Beaver | RobotType::Miner)
    }

    /// Whether this type can launch missiles.
    #[must_use]
    pub const fn can_launch(self) -> bool {
        matches!(self, RobotType::Launcher)
    }

    /// Whether this type can research upgrades.
    #[must_use]
    pub const fn can_research(self) -> bool {
        matches!(self, RobotType::Hq)
    }

    /// Whether this type is a stationary building.
    #[must_use]
    pub const fn is_building(self) -> bool {
        matches!(
            self,
            RobotType::Hq | RobotType::Turret | RobotType::SupplyDepot | RobotType::ZombieDen
        )
    }

    /// Whether this type belongs to the zombie faction's roster.
    #[must_use]
    pub const fn is_zombie(self) -> bool {
        matches!(
            self,
            RobotType::ZombieDen
                | RobotType::StandardZombie
                | RobotType::RangedZombie
                | RobotType::FastZombie
                | RobotType::BigZombie
        )
    }

    /// Whether a successful attack by this type marks the target infected.
    #[must_use]
    pub const fn infects_on_attack(self) -> bool {
        matches!(
            self,
            RobotType::Viper
                | RobotType::StandardZombie
                | RobotType::RangedZombie
                | RobotType::FastZombie
                | RobotType::BigZombie
        )
    }
}

/// Researchable team upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Upgrade {
    /// Doubles mining yield.
    Pickaxe,
    Fusion,
    Vision,
}

impl Upgrade {
    /// Parts reserved when research starts.
    #[must_use]
    pub const fn ore_cost(self) -> f64 {
        match self {
            Upgrade::Pickaxe => 50.0,
            Upgrade::Fusion => 100.0,
            Upgrade::Vision => 75.0,
        }
    }

    /// Rounds from research start to completion.
    #[must_use]
    pub const fn num_rounds(self) -> u32 {
        match self {
            Upgrade::Pickaxe => 25,
            Upgrade::Fusion => 50,
            Upgrade::Vision => 40,
        }
    }
}

/// Skills a commander learns as it accumulates XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommanderSkillType {
    /// Passive self-heal each round.
    Regeneration,
    Leadership,
    /// Short-range teleport via `cast_flash`.
    Flash,
}

impl CommanderSkillType {
    /// XP at which the skill is learned.
    #[must_use]
    pub const fn xp_required(self) -> u32 {
        match self {
            CommanderSkillType::Regeneration => 0,
            CommanderSkillType::Leadership => 1000,
            CommanderSkillType::Flash => 2000,
        }
    }
}

/// Progress of a team toward owning a robot type, used for build
/// dependency queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DependencyProgress {
    /// No robot of the type exists or is being built.
    None,
    /// One is under construction but none is active yet.
    InProgress,
    /// At least one active robot of the type exists.
    Done,
}
