//! Order state and command ingestion.
//!
//! `process_command` is the sole mutation entry point for unit intent; local
//! input, AI opponents, and scripted triggers all call it (directly or via
//! the crossbeam inbox drained at the top of each tick). A command replaces
//! each listed entity's order wholesale; there is no queueing.

use bevy::prelude::*;
use sim_runtime::{Cell, Command, Uid, UnitCategory};

use crate::components::{Combat, Health, Mobile, Unit};
use crate::registry::{unit_is_alive, UnitRegistry};
use crate::resources::{AttackIndicators, CommandInbox, SimulationConfig, SimulationTick};
use crate::templates::UnitCatalog;

/// A unit's single active intent, matched exhaustively by the behavior pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Stand,
    Move { destination: Vec2 },
    Attack { target: Uid },
    Guard { target: Uid },
    Deploy { target: Uid },
    ConstructUnit { kind: String },
    ConstructBuilding { kind: String, origin: Cell },
}

/// The order currently driving an entity. Exactly one per entity.
#[derive(Component, Debug, Clone)]
pub struct CurrentOrder(pub Order);

/// Drains the command channel and applies each batch to completion, in
/// arrival order, before any entity steps this tick.
pub fn drain_command_inbox(world: &mut World) {
    let batches = world.resource::<CommandInbox>().drain();
    for batch in batches {
        process_command(world, &batch.uids, &batch.command);
    }
}

/// Resolves and applies one command to a set of units.
///
/// A required target that is missing or dead drops the whole command (logged,
/// never fatal). Per-unit applicability failures skip that unit only; the
/// rest of the batch still processes.
pub fn process_command(world: &mut World, uids: &[Uid], command: &Command) {
    if let Some(target) = command.required_target() {
        if !unit_is_alive(world, target) {
            tracing::debug!(
                target: "dustline::orders",
                %target,
                ?command,
                "command dropped: stale target"
            );
            return;
        }
        if matches!(command, Command::Attack { .. }) {
            let now_ms = {
                let tick = world.resource::<SimulationTick>().0;
                tick * world.resource::<SimulationConfig>().tick_period_ms
            };
            let duration = world.resource::<SimulationConfig>().attack_indicator_ms;
            world
                .resource_mut::<AttackIndicators>()
                .push(target, now_ms, duration);
        }
    }

    for uid in uids {
        apply_to_unit(world, *uid, command);
    }
}

fn apply_to_unit(world: &mut World, uid: Uid, command: &Command) {
    let Some(entity) = world.resource::<UnitRegistry>().find_by_uid(uid) else {
        tracing::debug!(target: "dustline::orders", %uid, "command skipped: unknown unit");
        return;
    };

    let order = match command {
        Command::Move { destination } => {
            if world.get::<Mobile>(entity).is_none() {
                tracing::debug!(target: "dustline::orders", %uid, "move skipped: immobile unit");
                return;
            }
            Order::Move {
                destination: Vec2::new(destination.x, destination.y),
            }
        }
        Command::Attack { target } => {
            if !attack_applies(world, entity, *target) {
                return;
            }
            Order::Attack { target: *target }
        }
        Command::Guard { target } => {
            let category = world.get::<Unit>(entity).map(|unit| unit.category);
            if !matches!(
                category,
                Some(UnitCategory::Vehicle | UnitCategory::Aircraft | UnitCategory::Building)
            ) {
                return;
            }
            Order::Guard { target: *target }
        }
        Command::Deploy { target } => {
            if !deploy_applies(world, entity, *target) {
                return;
            }
            Order::Deploy { target: *target }
        }
        Command::ConstructUnit { kind } => {
            if !construct_unit_applies(world, entity, kind) {
                return;
            }
            Order::ConstructUnit { kind: kind.clone() }
        }
        Command::ConstructBuilding { kind, origin } => {
            if !construct_building_applies(world, entity, kind) {
                return;
            }
            Order::ConstructBuilding {
                kind: kind.clone(),
                origin: *origin,
            }
        }
    };

    if let Some(mut mobile) = world.get_mut::<Mobile>(entity) {
        mobile.forget_path();
    }
    if let Some(mut current) = world.get_mut::<CurrentOrder>(entity) {
        tracing::debug!(target: "dustline::orders", %uid, order = ?order, "order set");
        current.0 = order;
    }
}

fn attack_applies(world: &World, entity: Entity, target: Uid) -> bool {
    let Some(weapon) = world.get::<Combat>(entity) else {
        return false;
    };
    let Some(attacker) = world.get::<Unit>(entity) else {
        return false;
    };
    let Some(target_entity) = world.resource::<UnitRegistry>().find_by_uid(target) else {
        return false;
    };
    let (Some(target_unit), Some(target_health)) = (
        world.get::<Unit>(target_entity),
        world.get::<Health>(target_entity),
    ) else {
        return false;
    };
    let damaged_ratio = world.resource::<SimulationConfig>().damaged_ratio;
    crate::combat::is_valid_target(
        attacker,
        Some(weapon),
        target_unit,
        target_health.life_code(damaged_ratio),
    )
}

fn deploy_applies(world: &World, entity: Entity, target: Uid) -> bool {
    let Some(unit) = world.get::<Unit>(entity) else {
        return false;
    };
    if world.get::<Mobile>(entity).is_none() {
        return false;
    }
    let deployable = world
        .resource::<UnitCatalog>()
        .get(&unit.kind)
        .map_or(false, |template| template.deploys_into.is_some());
    if !deployable {
        return false;
    }
    let Some(target_entity) = world.resource::<UnitRegistry>().find_by_uid(target) else {
        return false;
    };
    world
        .get::<Unit>(target_entity)
        .map_or(false, |target_unit| {
            target_unit.category == UnitCategory::Terrain
        })
}

fn construct_unit_applies(world: &World, entity: Entity, kind: &str) -> bool {
    let Some(unit) = world.get::<Unit>(entity) else {
        return false;
    };
    let catalog = world.resource::<UnitCatalog>();
    let can_produce = catalog
        .get(&unit.kind)
        .map_or(false, |template| template.can_construct_units);
    let buildable_kind = catalog.get(kind).map_or(false, |template| {
        matches!(
            template.category,
            UnitCategory::Vehicle | UnitCategory::Aircraft
        )
    });
    can_produce && buildable_kind
}

fn construct_building_applies(world: &World, entity: Entity, kind: &str) -> bool {
    let Some(unit) = world.get::<Unit>(entity) else {
        return false;
    };
    let catalog = world.resource::<UnitCatalog>();
    let can_construct = catalog
        .get(&unit.kind)
        .map_or(false, |template| template.can_construct_buildings);
    let is_building = catalog.get(kind).map_or(false, |template| {
        template.category == UnitCategory::Building
    });
    can_construct && is_building
}
