use std::collections::VecDeque;

use bevy::{math::Vec2, prelude::*};
use bitflags::bitflags;
use sim_runtime::{Cell, LifeCode, Point, Team, Uid, UnitCategory};

bitflags! {
    /// Selection-related unit state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UnitFlags: u8 {
        const SELECTABLE = 1 << 0;
        const SELECTED = 1 << 1;
    }
}

bitflags! {
    /// Which target categories a weapon can engage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CombatFlags: u8 {
        /// Vehicles and buildings.
        const ATTACK_LAND = 1 << 0;
        /// Aircraft.
        const ATTACK_AIR = 1 << 1;
    }
}

/// Behavior phase a unit is locked into, independent of its order.
///
/// `ticks_left` counts logic ticks; the animate pass decrements it and emits
/// the completion side effect (spawn, replacement) when it reaches zero.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitAction {
    Stand,
    /// Production building assembling a new unit.
    Constructing { kind: String, ticks_left: u32 },
    /// Construction yard erecting a new building at `origin`.
    Erecting {
        kind: String,
        origin: Cell,
        ticks_left: u32,
    },
    /// Freshly placed building raising out of the ground.
    Raising { ticks_left: u32 },
    /// Vehicle converting itself into a building at `site`.
    Deploying {
        into: String,
        site: Vec2,
        ticks_left: u32,
    },
}

impl UnitAction {
    /// Entities mid-construction or mid-deploy cannot be selected or targeted.
    pub fn allows_selection(&self) -> bool {
        matches!(self, UnitAction::Stand)
    }
}

/// Identity and pose of a simulation entity.
#[derive(Component, Debug, Clone)]
pub struct Unit {
    pub uid: Uid,
    pub kind: String,
    pub category: UnitCategory,
    pub team: Team,
    /// Fractional grid units.
    pub position: Vec2,
    /// Discrete sprite facing in `[0, directions)`.
    pub direction: f32,
    pub action: UnitAction,
    pub flags: UnitFlags,
    /// Sprite frame counter, cycled by the animate pass.
    pub frame: u32,
}

impl Unit {
    pub fn is_selectable(&self) -> bool {
        self.flags.contains(UnitFlags::SELECTABLE) && self.action.allows_selection()
    }

    pub fn is_selected(&self) -> bool {
        self.flags.contains(UnitFlags::SELECTED)
    }

    pub fn point(&self) -> Point {
        Point::new(self.position.x, self.position.y)
    }

    pub fn cell(&self) -> Cell {
        Cell::new(
            self.position.x.max(0.0).floor() as u32,
            self.position.y.max(0.0).floor() as u32,
        )
    }
}

/// Remaining and maximum life.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub life: f32,
    pub max_life: f32,
}

impl Health {
    pub fn full(max_life: f32) -> Self {
        Self {
            life: max_life,
            max_life,
        }
    }

    pub fn with_life(life: f32, max_life: f32) -> Self {
        Self {
            life: life.min(max_life),
            max_life,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    pub fn ratio(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }

    /// `Dead` iff life is exhausted; `Damaged` below the sprite cutover ratio.
    pub fn life_code(&self, damaged_ratio: f32) -> LifeCode {
        if self.is_dead() {
            LifeCode::Dead
        } else if self.life < self.max_life * damaged_ratio {
            LifeCode::Damaged
        } else {
            LifeCode::Healthy
        }
    }
}

/// Damage soak subtracted from incoming hits.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Armor(pub f32);

/// Sight radius in grid units; feeds fog of war and target acquisition.
#[derive(Component, Debug, Clone, Copy)]
pub struct Sight(pub f32);

/// Weapon state for entities that can attack.
#[derive(Component, Debug, Clone)]
pub struct Combat {
    pub power: f32,
    pub range: f32,
    pub reload_ticks: u32,
    pub reload_left: u32,
    pub flags: CombatFlags,
    /// Projectile template spawned on fire.
    pub projectile: String,
}

impl Combat {
    pub fn ready(&self) -> bool {
        self.reload_left == 0
    }

    pub fn can_target(&self, category: UnitCategory) -> bool {
        match category {
            UnitCategory::Vehicle | UnitCategory::Building => {
                self.flags.contains(CombatFlags::ATTACK_LAND)
            }
            UnitCategory::Aircraft => self.flags.contains(CombatFlags::ATTACK_AIR),
            UnitCategory::Terrain | UnitCategory::Projectile => false,
        }
    }
}

/// Movement state for vehicles and aircraft.
#[derive(Component, Debug, Clone)]
pub struct Mobile {
    pub speed: f32,
    pub turn_speed: f32,
    /// Collision/exclusion radius in grid units.
    pub radius: f32,
    /// Aircraft shadow offset in grid units; zero for ground units.
    pub shadow: f32,
    /// Cached waypoints from the external pathfinder.
    pub path: VecDeque<Cell>,
    /// Goal the cached path was computed for.
    pub path_goal: Option<Cell>,
    /// Occupancy revision the cached path was computed against.
    pub path_revision: u64,
    /// Movement applied last tick, for render interpolation only.
    pub last_step: Vec2,
}

impl Mobile {
    pub fn new(speed: f32, turn_speed: f32, radius: f32, shadow: f32) -> Self {
        Self {
            speed,
            turn_speed,
            radius,
            shadow,
            path: VecDeque::new(),
            path_goal: None,
            path_revision: 0,
            last_step: Vec2::ZERO,
        }
    }

    pub fn forget_path(&mut self) {
        self.path.clear();
        self.path_goal = None;
    }
}

/// Flight state of a live projectile.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub target: Uid,
    /// Weapon power captured at launch.
    pub power: f32,
    pub speed: f32,
    /// Where the projectile keeps flying if the target disappears mid-flight.
    pub last_known_target: Vec2,
}
