use serde::{Deserialize, Serialize};

use crate::{Cell, Point, Uid};

/// Player- or script-issued intent for one or more units.
///
/// This is the sole command surface: local input, scripted triggers, and AI
/// all speak it. Commands are resolved against the registry when processed;
/// stale target references drop the command rather than failing the batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// Walk or fly to a destination point.
    Move { destination: Point },
    /// Engage a specific enemy unit.
    Attack { target: Uid },
    /// Hold position and engage anything hostile that enters sight.
    Guard { target: Uid },
    /// Deploy onto a terrain feature (harvester onto an oilfield).
    Deploy { target: Uid },
    /// Produce a unit from a production building.
    ConstructUnit { kind: String },
    /// Erect a building with its footprint origin at `origin`.
    ConstructBuilding { kind: String, origin: Cell },
}

impl Command {
    /// Target uid the command cannot be applied without, if any.
    pub fn required_target(&self) -> Option<Uid> {
        match self {
            Command::Attack { target } | Command::Guard { target } | Command::Deploy { target } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// A command addressed to a set of units, as enqueued on the command channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub uids: Vec<Uid>,
    pub command: Command,
}

impl CommandBatch {
    pub fn new(uids: Vec<Uid>, command: Command) -> Self {
        Self { uids, command }
    }

    pub fn single(uid: Uid, command: Command) -> Self {
        Self {
            uids: vec![uid],
            command,
        }
    }
}
