//! Shared runtime contracts for Dustline.
//!
//! This crate holds the data types exchanged between the simulation core and
//! its collaborators (input layer, AI, scripted missions, tests): identifiers,
//! the command surface, level definitions, occupancy grids, and the pathfinder
//! contract. It deliberately carries no Bevy dependency so clients can consume
//! the command surface without pulling in the full runtime of `core_sim`.

mod commands;
mod error;
mod grid;
mod level;
mod pathfinding;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use commands::{Command, CommandBatch};
pub use error::{CommandError, PlacementError, SpawnError};
pub use grid::{Cell, OccupancyGrid};
pub use level::{LevelDef, PlacementDef};
pub use pathfinding::{DirectPathfinder, MovementDomain, Pathfinder};

/// Stable identifier of a simulation entity.
///
/// Ordinary entities draw ascending positive ids from the registry counter.
/// Negative ids are reserved for scripted entities that missions need to
/// reference before they exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(pub i64);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Green,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Blue => Team::Green,
            Team::Green => Team::Blue,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => write!(f, "blue"),
            Team::Green => write!(f, "green"),
        }
    }
}

/// Closed set of entity categories the simulation knows how to advance.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Building,
    Vehicle,
    Aircraft,
    Terrain,
    Projectile,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 5] = [
        UnitCategory::Building,
        UnitCategory::Vehicle,
        UnitCategory::Aircraft,
        UnitCategory::Terrain,
        UnitCategory::Projectile,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether footprints of this category stamp the occupancy grids.
    pub fn occupies_ground(self) -> bool {
        matches!(self, UnitCategory::Building | UnitCategory::Terrain)
    }

    pub fn is_airborne(self) -> bool {
        matches!(self, UnitCategory::Aircraft)
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitCategory::Building => "building",
            UnitCategory::Vehicle => "vehicle",
            UnitCategory::Aircraft => "aircraft",
            UnitCategory::Terrain => "terrain",
            UnitCategory::Projectile => "projectile",
        };
        write!(f, "{name}")
    }
}

/// Coarse health bucket derived from a unit's remaining life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeCode {
    Healthy,
    Damaged,
    Dead,
}

impl LifeCode {
    pub fn is_dead(self) -> bool {
        matches!(self, LifeCode::Dead)
    }
}

/// A point in fractional grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<Cell> for Point {
    fn from(cell: Cell) -> Self {
        Point::new(cell.x as f32, cell.y as f32)
    }
}
