//! Core simulation crate for the Dustline RTS prototype.
//!
//! Owns the authoritative state of all units, buildings, and projectiles and
//! advances it on a fixed logic tick, decoupled from whatever cadence the
//! render layer runs at. One [`build_headless_app`] call yields a Bevy [`App`]
//! whose `Update` schedule is one complete tick: command drain, trigger pump,
//! the order pass, the animate pass, the dead sweep, and derived-state
//! refreshes, chained in that order.
//!
//! Rendering, asset handling, input widgets, and the pathfinding algorithm
//! itself live outside this crate; see `sim_runtime` for the contracts they
//! are consumed through.

mod behavior;
mod clock;
pub mod combat;
mod components;
mod grid;
mod level;
mod orders;
mod registry;
mod render;
mod resources;
mod simulation;
mod templates;
mod triggers;
mod visibility;

use std::sync::Arc;

use bevy::prelude::*;
use sim_runtime::{DirectPathfinder, LevelDef};

pub use clock::SimClock;
pub use combat::{
    angle_diff, calculate_damage, find_angle, find_firing_angle, find_targets_in_sight,
    has_line_of_sight, is_valid_target, wrap_direction, AimProfile, SightedUnit,
};
pub use components::{
    Armor, Combat, CombatFlags, Health, Mobile, Projectile, Sight, Unit, UnitAction, UnitFlags,
};
pub use grid::{
    ensure_buildable, ensure_passable, validate_placement, Footprint, FootprintMask, SpatialIndex,
};
pub use level::{populate_level, LevelError};
pub use orders::{process_command, CurrentOrder, Order};
pub use registry::{
    clear_selection, destroy_unit, select_unit, spawn_unit, unit_is_alive, ProjectileSpawn,
    SpawnRequest, UnitRegistry,
};
pub use render::{build_render_frame, Camera, DrawItem, IndicatorView, RenderFrame};
pub use resources::{
    AttackIndicator, AttackIndicators, CommandInbox, CommandSender, ConfigError, GameMessage,
    MessageOutbox, PathfinderHandle, SimRng, SimulationConfig, SimulationTick, Treasury,
};
pub use simulation::{Simulation, UnitView};
pub use templates::{UnitCatalog, UnitTemplate, WeaponSpec};
pub use triggers::{run_triggers, TriggerId, TriggerScheduler};
pub use visibility::{update_fog, FogOfWar, TeamVisibilityMap, VisibilityState};

/// Construct a headless Bevy [`App`] wired with the Dustline tick pipeline
/// and populated from `level`. One [`run_tick`] (or `app.update()`) is one
/// complete logic tick.
pub fn build_headless_app(level: &LevelDef, config: SimulationConfig) -> Result<App, LevelError> {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);

    app.insert_resource(SimulationTick::default())
        .insert_resource(UnitRegistry::default())
        .insert_resource(UnitCatalog::standard())
        .insert_resource(SpatialIndex::from_level(level))
        .insert_resource(FogOfWar::default())
        .insert_resource(SimRng::seeded(config.rng_seed))
        .insert_resource(CommandInbox::default())
        .insert_resource(TriggerScheduler::default())
        .insert_resource(MessageOutbox::default())
        .insert_resource(AttackIndicators::default())
        .insert_resource(Camera::from_level(level, &config))
        .insert_resource(PathfinderHandle(Arc::new(DirectPathfinder)))
        .insert_resource(config);

    app.add_systems(
        Update,
        (
            grid::age_buildable,
            orders::drain_command_inbox,
            triggers::run_triggers,
            behavior::process_orders,
            behavior::animate_units,
            behavior::sweep_dead,
            registry::rebuild_render_order,
            visibility::update_fog,
            resources::advance_tick,
        )
            .chain(),
    );

    level::populate_level(&mut app.world, level)?;
    // Prime the fog so placement checks before the first tick already see
    // starting units' sight.
    visibility::update_fog(&mut app.world);

    Ok(app)
}

/// Execute a single logic tick.
pub fn run_tick(app: &mut App) {
    app.update();
}
