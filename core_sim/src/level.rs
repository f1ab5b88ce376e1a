//! Level ingestion: turning a [`LevelDef`] into live simulation state.

use bevy::prelude::*;
use sim_runtime::{LevelDef, SpawnError};
use thiserror::Error;

use crate::registry::{spawn_unit, SpawnRequest};
use crate::resources::Treasury;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level: {0}")]
    Invalid(String),
    #[error("level placement failed: {0}")]
    Placement(#[from] SpawnError),
}

/// Spawns the level's placement list and seeds the treasury. The spatial
/// baseline and camera are installed by `build_headless_app` before this
/// runs; placements spawn in list order so reserved uids land first.
pub fn populate_level(world: &mut World, level: &LevelDef) -> Result<(), LevelError> {
    level.validate().map_err(LevelError::Invalid)?;

    world.insert_resource(Treasury::with_balances(level.cash.clone()));

    for placement in &level.placements {
        let mut request = SpawnRequest::new(
            placement.kind.clone(),
            placement.team,
            Vec2::new(placement.x, placement.y),
        );
        request.uid = placement.uid;
        request.life = placement.life;
        request.selectable = placement.selectable;
        spawn_unit(world, request)?;
    }

    tracing::info!(
        target: "dustline::level",
        name = %level.name,
        placements = level.placements.len(),
        width = level.map_grid_width,
        height = level.map_grid_height,
        "level populated"
    );
    Ok(())
}
