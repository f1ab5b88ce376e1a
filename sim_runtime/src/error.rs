use thiserror::Error;

use crate::{Cell, Uid};

/// Failure to create an entity through the registry.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("no unit template named `{0}`")]
    UnknownKind(String),
    #[error("uid {0} is already registered")]
    DuplicateUid(Uid),
}

/// Failure to place a building footprint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("footprint cell {0:?} is outside the map")]
    OutOfBounds(Cell),
    #[error("footprint cell {0:?} is obstructed")]
    Obstructed(Cell),
    #[error("footprint cell {0:?} is hidden by fog of war")]
    Fogged(Cell),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },
}

/// Failure to apply a command. Commands never abort sibling processing;
/// these are reported for logging and player feedback only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("target {0} is missing or dead")]
    StaleTarget(Uid),
    #[error("unit {0} does not exist")]
    UnknownUnit(Uid),
    #[error("unit {0} cannot execute this command")]
    Inapplicable(Uid),
}
