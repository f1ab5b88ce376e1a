//! Per-tick behavior resolution.
//!
//! Each logic tick runs exactly two full passes over the registry's insertion
//! order: [`process_orders`] steps every entity's order state machine, then
//! [`animate_units`] advances actions, reloads, projectile flight, and life
//! state. Destructions observed during the second pass are applied by
//! [`sweep_dead`] so neither pass ever iterates a half-removed entity.

use bevy::prelude::*;
use sim_runtime::{Cell, MovementDomain, OccupancyGrid, Uid, UnitCategory};

use crate::combat::{
    angle_diff, find_angle, find_firing_angle, find_targets_in_sight, has_line_of_sight,
    wrap_direction, AimProfile, SightedUnit,
};
use crate::components::{Armor, Combat, Health, Mobile, Projectile, Sight, Unit, UnitAction, UnitFlags};
use crate::grid::{self, Footprint, SpatialIndex};
use crate::orders::{CurrentOrder, Order};
use crate::registry::{
    destroy_unit, spawn_unit, unit_is_alive, ProjectileSpawn, SpawnRequest, UnitRegistry,
};
use crate::resources::{MessageOutbox, PathfinderHandle, SimRng, SimulationConfig, Treasury};
use crate::templates::UnitCatalog;

/// How close a vehicle must be to a terrain feature to deploy onto it.
const DEPLOY_RANGE: f32 = 1.5;

/// Facing slack, in direction steps, within which a weapon may fire.
const FIRING_ARC: f32 = 0.5;

fn cell_of(position: Vec2) -> Cell {
    Cell::new(
        position.x.max(0.0).floor() as u32,
        position.y.max(0.0).floor() as u32,
    )
}

fn set_order(world: &mut World, entity: Entity, order: Order) {
    if let Some(mut current) = world.get_mut::<CurrentOrder>(entity) {
        current.0 = order;
    }
}

fn deselect(world: &mut World, entity: Entity) {
    let uid = {
        let Some(mut unit) = world.get_mut::<Unit>(entity) else {
            return;
        };
        if !unit.is_selected() {
            return;
        }
        unit.flags.remove(UnitFlags::SELECTED);
        unit.uid
    };
    world.resource_mut::<UnitRegistry>().remove_selection(uid);
}

/// First pass: resolve every entity's order, in registry insertion order.
pub fn process_orders(world: &mut World) {
    grid::ensure_passable(world);
    let passable = world.resource::<SpatialIndex>().passable().clone();
    let revision = world.resource::<SpatialIndex>().revision();
    let config = world.resource::<SimulationConfig>().clone();

    let entities = world.resource::<UnitRegistry>().insertion_snapshot();
    for entity in entities {
        // Interpolation deltas are rebuilt from scratch each tick.
        if let Some(mut mobile) = world.get_mut::<Mobile>(entity) {
            mobile.last_step = Vec2::ZERO;
        }
        let Some(order) = world.get::<CurrentOrder>(entity).map(|order| order.0.clone()) else {
            continue;
        };
        match order {
            Order::Stand => {}
            Order::Move { destination } => {
                step_move(world, entity, destination, &passable, revision, &config)
            }
            Order::Attack { target } => {
                step_attack(world, entity, target, &passable, revision, &config)
            }
            Order::Guard { target } => step_guard(world, entity, target, &passable, &config),
            Order::Deploy { target } => {
                step_deploy(world, entity, target, &passable, revision, &config)
            }
            Order::ConstructUnit { kind } => step_construct_unit(world, entity, &kind),
            Order::ConstructBuilding { kind, origin } => {
                step_construct_building(world, entity, &kind, origin, &config)
            }
        }
    }
}

enum MoveOutcome {
    Moving,
    Arrived,
    Unreachable,
}

/// Steps a mobile entity toward `destination` along cached pathfinder
/// waypoints, turning before it moves. Paths are requested lazily and kept
/// until the destination or the occupancy revision changes.
fn step_toward(
    world: &mut World,
    entity: Entity,
    destination: Vec2,
    passable: &OccupancyGrid,
    revision: u64,
    config: &SimulationConfig,
) -> MoveOutcome {
    let Some((position, direction, category)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.position, unit.direction, unit.category))
    else {
        return MoveOutcome::Unreachable;
    };
    if position.distance(destination) <= config.arrival_epsilon {
        return MoveOutcome::Arrived;
    }
    let Some((mut path, path_goal, path_revision, speed, turn_speed)) =
        world.get::<Mobile>(entity).map(|mobile| {
            (
                mobile.path.clone(),
                mobile.path_goal,
                mobile.path_revision,
                mobile.speed,
                mobile.turn_speed,
            )
        })
    else {
        return MoveOutcome::Unreachable;
    };

    let goal = cell_of(destination);
    if path_goal != Some(goal) || path_revision != revision {
        let pathfinder = world.resource::<PathfinderHandle>().clone();
        let domain = if category.is_airborne() {
            MovementDomain::Air
        } else {
            MovementDomain::Ground
        };
        match pathfinder
            .0
            .find_path(passable, cell_of(position), goal, domain)
        {
            Some(waypoints) => path = waypoints.into(),
            None => {
                tracing::debug!(
                    target: "dustline::behavior",
                    ?goal,
                    "no path to destination"
                );
                if let Some(mut mobile) = world.get_mut::<Mobile>(entity) {
                    mobile.forget_path();
                }
                return MoveOutcome::Unreachable;
            }
        }
    }

    // Skip waypoints the entity is already on top of; past the last one the
    // entity homes in on the exact fractional destination.
    let waypoint = loop {
        match path.front() {
            Some(cell) => {
                let point = Vec2::new(cell.x as f32, cell.y as f32);
                if position.distance(point) <= config.arrival_epsilon.max(0.1) {
                    path.pop_front();
                    continue;
                }
                break point;
            }
            None => break destination,
        }
    };

    let desired = find_angle(position, waypoint, config.directions);
    let diff = angle_diff(direction, desired, config.directions);
    let turn_step = turn_speed * config.turn_speed_adjustment_factor;
    let (new_direction, step) = if diff.abs() > turn_step {
        // Still coming about; no translation this tick.
        (
            wrap_direction(direction + turn_step.copysign(diff), config.directions),
            Vec2::ZERO,
        )
    } else {
        let step_len = speed * config.speed_adjustment_factor;
        let to_waypoint = waypoint - position;
        let distance = to_waypoint.length();
        let step = if distance <= step_len {
            to_waypoint
        } else {
            to_waypoint / distance * step_len
        };
        (desired, step)
    };

    let new_position = position + step;
    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
        unit.position = new_position;
        unit.direction = new_direction;
    }
    if let Some(mut mobile) = world.get_mut::<Mobile>(entity) {
        mobile.path = path;
        mobile.path_goal = Some(goal);
        mobile.path_revision = revision;
        mobile.last_step = step;
    }

    if new_position.distance(destination) <= config.arrival_epsilon {
        MoveOutcome::Arrived
    } else {
        MoveOutcome::Moving
    }
}

fn step_move(
    world: &mut World,
    entity: Entity,
    destination: Vec2,
    passable: &OccupancyGrid,
    revision: u64,
    config: &SimulationConfig,
) {
    match step_toward(world, entity, destination, passable, revision, config) {
        MoveOutcome::Moving => {}
        MoveOutcome::Arrived | MoveOutcome::Unreachable => {
            if let Some(mut mobile) = world.get_mut::<Mobile>(entity) {
                mobile.forget_path();
                mobile.last_step = Vec2::ZERO;
            }
            set_order(world, entity, Order::Stand);
        }
    }
}

enum Engagement {
    /// Target missing, dead, or no longer a valid match for this weapon.
    TargetGone,
    /// Valid target outside range or line of sight.
    OutOfReach { position: Vec2 },
    /// Turning onto or firing at the target.
    Holding,
}

/// Shared firing logic for attack and guard orders: validity, range, line of
/// sight, coming about to the firing angle, and projectile spawn on a cold
/// reload timer.
fn engage_target(
    world: &mut World,
    entity: Entity,
    target_uid: Uid,
    passable: &OccupancyGrid,
    config: &SimulationConfig,
) -> Engagement {
    let Some(target_entity) = world.resource::<UnitRegistry>().find_by_uid(target_uid) else {
        return Engagement::TargetGone;
    };
    {
        let (Some(attacker), Some(weapon), Some(target_unit), Some(target_health)) = (
            world.get::<Unit>(entity),
            world.get::<Combat>(entity),
            world.get::<Unit>(target_entity),
            world.get::<Health>(target_entity),
        ) else {
            return Engagement::TargetGone;
        };
        if !crate::combat::is_valid_target(
            attacker,
            Some(weapon),
            target_unit,
            target_health.life_code(config.damaged_ratio),
        ) {
            return Engagement::TargetGone;
        }
    }

    let Some((a_pos, a_dir, a_team, a_cat)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.position, unit.direction, unit.team, unit.category))
    else {
        return Engagement::TargetGone;
    };
    let Some(weapon) = world.get::<Combat>(entity).cloned() else {
        return Engagement::TargetGone;
    };
    let a_footprint = world.get::<Footprint>(entity).map(|f| f.size());
    let a_turn = world.get::<Mobile>(entity).map(|m| m.turn_speed);
    let a_shadow = world.get::<Mobile>(entity).map(|m| m.shadow).unwrap_or(0.0);

    let Some((t_pos, t_cat)) = world
        .get::<Unit>(target_entity)
        .map(|unit| (unit.position, unit.category))
    else {
        return Engagement::TargetGone;
    };
    let t_footprint = world.get::<Footprint>(target_entity).map(|f| f.size());
    let t_shadow = world
        .get::<Mobile>(target_entity)
        .map(|m| m.shadow)
        .unwrap_or(0.0);

    if a_pos.distance(t_pos) > weapon.range || !has_line_of_sight(passable, a_pos, t_pos) {
        return Engagement::OutOfReach { position: t_pos };
    }

    let source = AimProfile {
        position: a_pos,
        category: a_cat,
        footprint: a_footprint,
        shadow: a_shadow,
    };
    let target = AimProfile {
        position: t_pos,
        category: t_cat,
        footprint: t_footprint,
        shadow: t_shadow,
    };
    let desired = find_firing_angle(&target, &source, config.directions);
    let diff = angle_diff(a_dir, desired, config.directions);
    if diff.abs() > FIRING_ARC {
        let new_direction = match a_turn {
            Some(turn_speed) => {
                let turn_step = turn_speed * config.turn_speed_adjustment_factor;
                if turn_step >= diff.abs() {
                    desired
                } else {
                    wrap_direction(a_dir + turn_step.copysign(diff), config.directions)
                }
            }
            // Turrets swivel within a tick.
            None => desired,
        };
        if let Some(mut unit) = world.get_mut::<Unit>(entity) {
            unit.direction = new_direction;
        }
        return Engagement::Holding;
    }

    if weapon.reload_left == 0 {
        if let Some(mut combat) = world.get_mut::<Combat>(entity) {
            combat.reload_left = combat.reload_ticks;
        }
        let request = SpawnRequest::new(weapon.projectile.clone(), a_team, source.aim_point())
            .with_projectile(ProjectileSpawn {
                target: target_uid,
                power: weapon.power,
            });
        match spawn_unit(world, request) {
            Ok(projectile_uid) => {
                tracing::debug!(
                    target: "dustline::behavior",
                    shooter = %world.get::<Unit>(entity).map(|u| u.uid).unwrap_or(Uid(0)),
                    projectile = %projectile_uid,
                    target = %target_uid,
                    "projectile fired"
                );
            }
            Err(err) => {
                tracing::warn!(target: "dustline::behavior", %err, "projectile spawn failed");
            }
        }
    }
    Engagement::Holding
}

fn step_attack(
    world: &mut World,
    entity: Entity,
    target: Uid,
    passable: &OccupancyGrid,
    revision: u64,
    config: &SimulationConfig,
) {
    match engage_target(world, entity, target, passable, config) {
        Engagement::TargetGone => set_order(world, entity, Order::Stand),
        Engagement::OutOfReach { position } => {
            // Mobile categories pursue; emplacements hold and wait.
            if world.get::<Mobile>(entity).is_some() {
                step_toward(world, entity, position, passable, revision, config);
            }
        }
        Engagement::Holding => {}
    }
}

fn step_guard(
    world: &mut World,
    entity: Entity,
    guard_target: Uid,
    passable: &OccupancyGrid,
    config: &SimulationConfig,
) {
    if !unit_is_alive(world, guard_target) {
        set_order(world, entity, Order::Stand);
        return;
    }
    let Some((uid, position, team)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.uid, unit.position, unit.team))
    else {
        return;
    };
    let Some(weapon) = world.get::<Combat>(entity).cloned() else {
        // Unarmed guards just hold their post.
        return;
    };
    let sight = world.get::<Sight>(entity).map(|s| s.0).unwrap_or(0.0);

    let candidates = collect_sighted(world, uid, config.damaged_ratio);
    let in_sight = find_targets_in_sight(position, team, sight, passable, &candidates);
    let chosen = in_sight.into_iter().find(|found| {
        candidates
            .iter()
            .find(|candidate| candidate.uid == *found)
            .map_or(false, |candidate| weapon.can_target(candidate.category))
    });
    if let Some(target) = chosen {
        // Guards never pursue; engage only while the intruder stays in reach.
        let _ = engage_target(world, entity, target, passable, config);
    }
}

fn step_deploy(
    world: &mut World,
    entity: Entity,
    target: Uid,
    passable: &OccupancyGrid,
    revision: u64,
    config: &SimulationConfig,
) {
    let Some(action) = world.get::<Unit>(entity).map(|unit| unit.action.clone()) else {
        return;
    };
    if matches!(action, UnitAction::Deploying { .. }) {
        return;
    }
    let Some(target_entity) = world.resource::<UnitRegistry>().find_by_uid(target) else {
        set_order(world, entity, Order::Stand);
        return;
    };
    if world
        .get::<Health>(target_entity)
        .map_or(true, |health| health.is_dead())
    {
        set_order(world, entity, Order::Stand);
        return;
    }
    let Some(site) = world
        .get::<Unit>(target_entity)
        .map(|unit| unit.position)
    else {
        set_order(world, entity, Order::Stand);
        return;
    };

    let position = world
        .get::<Unit>(entity)
        .map(|unit| unit.position)
        .unwrap_or(site);
    if position.distance(site) > DEPLOY_RANGE {
        if let MoveOutcome::Unreachable =
            step_toward(world, entity, site, passable, revision, config)
        {
            set_order(world, entity, Order::Stand);
        }
        return;
    }

    let kind = world.get::<Unit>(entity).map(|unit| unit.kind.clone());
    let Some((into, deploy_ticks)) = kind.and_then(|kind| {
        let template = world.resource::<UnitCatalog>().get(&kind)?;
        Some((template.deploys_into?.to_string(), template.deploy_ticks))
    }) else {
        set_order(world, entity, Order::Stand);
        return;
    };

    deselect(world, entity);
    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
        unit.action = UnitAction::Deploying {
            into,
            site,
            ticks_left: deploy_ticks,
        };
    }
    set_order(world, entity, Order::Stand);
}

fn step_construct_unit(world: &mut World, entity: Entity, kind: &str) {
    let Some((team, action, producer_kind)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.team, unit.action.clone(), unit.kind.clone()))
    else {
        return;
    };
    if action != UnitAction::Stand {
        // Busy; the order waits for the current action to finish.
        return;
    }
    let Some((cost, construct_ticks)) = world
        .resource::<UnitCatalog>()
        .get(kind)
        .map(|template| template.cost)
        .zip(
            world
                .resource::<UnitCatalog>()
                .get(&producer_kind)
                .map(|template| template.construct_ticks),
        )
    else {
        set_order(world, entity, Order::Stand);
        return;
    };

    let funded = world.resource_mut::<Treasury>().debit(team, cost);
    if let Err(err) = funded {
        tracing::debug!(target: "dustline::behavior", %err, kind, "construction refused");
        world
            .resource_mut::<MessageOutbox>()
            .push("system", format!("Not enough money to build a {kind}."));
        set_order(world, entity, Order::Stand);
        return;
    }

    deselect(world, entity);
    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
        unit.action = UnitAction::Constructing {
            kind: kind.to_string(),
            ticks_left: construct_ticks,
        };
    }
    set_order(world, entity, Order::Stand);
}

fn step_construct_building(
    world: &mut World,
    entity: Entity,
    kind: &str,
    origin: Cell,
    _config: &SimulationConfig,
) {
    let Some((team, action)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.team, unit.action.clone()))
    else {
        return;
    };
    if action != UnitAction::Stand {
        return;
    }
    let Some((mask, cost, construct_ticks)) =
        world.resource::<UnitCatalog>().get(kind).and_then(|template| {
            Some((
                template.buildable_mask.clone()?,
                template.cost,
                template.construct_ticks,
            ))
        })
    else {
        set_order(world, entity, Order::Stand);
        return;
    };

    grid::ensure_buildable(world);
    let placement = {
        let spatial = world.resource::<SpatialIndex>();
        let fog = world.resource::<crate::visibility::FogOfWar>();
        match fog.team(team) {
            Some(map) => grid::validate_placement(&mask, origin, spatial.buildable(), map),
            None => Err(sim_runtime::PlacementError::Fogged(origin)),
        }
    };
    let outcome = placement.and_then(|_| world.resource_mut::<Treasury>().debit(team, cost));

    match outcome {
        Err(err) => {
            tracing::debug!(target: "dustline::behavior", %err, kind, "placement refused");
            world
                .resource_mut::<MessageOutbox>()
                .push("system", format!("Cannot place {kind} there: {err}."));
            set_order(world, entity, Order::Stand);
        }
        Ok(()) => {
            deselect(world, entity);
            if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                unit.action = UnitAction::Erecting {
                    kind: kind.to_string(),
                    origin,
                    ticks_left: construct_ticks,
                };
            }
            set_order(world, entity, Order::Stand);
        }
    }
}

fn collect_sighted(world: &mut World, exclude: Uid, damaged_ratio: f32) -> Vec<SightedUnit> {
    let mut candidates = Vec::new();
    let mut query = world.query::<(&Unit, &Health)>();
    for (unit, health) in query.iter(world) {
        if unit.uid == exclude || unit.category == UnitCategory::Projectile {
            continue;
        }
        candidates.push(SightedUnit {
            uid: unit.uid,
            team: unit.team,
            category: unit.category,
            position: unit.position,
            selectable: unit.is_selectable(),
            life: health.life_code(damaged_ratio),
        });
    }
    candidates
}

/// Second pass: reload timers, action animations and their completion side
/// effects, projectile flight and impact.
pub fn animate_units(world: &mut World) {
    let config = world.resource::<SimulationConfig>().clone();
    let entities = world.resource::<UnitRegistry>().insertion_snapshot();
    for entity in entities {
        if let Some(mut combat) = world.get_mut::<Combat>(entity) {
            if combat.reload_left > 0 {
                combat.reload_left -= 1;
            }
        }

        let action = {
            let Some(mut unit) = world.get_mut::<Unit>(entity) else {
                continue;
            };
            unit.frame = unit.frame.wrapping_add(1);
            unit.action.clone()
        };
        match action {
            UnitAction::Stand => {}
            UnitAction::Constructing { kind, ticks_left } => {
                if ticks_left > 1 {
                    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                        unit.action = UnitAction::Constructing {
                            kind,
                            ticks_left: ticks_left - 1,
                        };
                    }
                } else {
                    finish_unit_construction(world, entity, &kind);
                }
            }
            UnitAction::Erecting {
                kind,
                origin,
                ticks_left,
            } => {
                if ticks_left > 1 {
                    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                        unit.action = UnitAction::Erecting {
                            kind,
                            origin,
                            ticks_left: ticks_left - 1,
                        };
                    }
                } else {
                    finish_building_construction(world, entity, &kind, origin);
                }
            }
            UnitAction::Raising { ticks_left } => {
                if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                    unit.action = if ticks_left > 1 {
                        UnitAction::Raising {
                            ticks_left: ticks_left - 1,
                        }
                    } else {
                        UnitAction::Stand
                    };
                }
            }
            UnitAction::Deploying {
                into,
                site,
                ticks_left,
            } => {
                if ticks_left > 1 {
                    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                        unit.action = UnitAction::Deploying {
                            into,
                            site,
                            ticks_left: ticks_left - 1,
                        };
                    }
                } else {
                    finish_deploy(world, entity, &into, site);
                    // The vehicle is gone; nothing further to animate.
                    continue;
                }
            }
        }

        step_projectile(world, entity, &config);
    }
}

fn finish_unit_construction(world: &mut World, entity: Entity, kind: &str) {
    let Some((team, position, uid)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.team, unit.position, unit.uid))
    else {
        return;
    };
    let exit_rows = world
        .get::<Footprint>(entity)
        .map(|footprint| footprint.size().1)
        .unwrap_or(1);
    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
        unit.action = UnitAction::Stand;
    }

    let exit = position + Vec2::new(0.5, exit_rows as f32 + 0.5);
    match spawn_unit(world, SpawnRequest::new(kind, team, exit)) {
        Ok(new_uid) => {
            tracing::info!(
                target: "dustline::behavior",
                producer = %uid,
                unit = %new_uid,
                kind,
                "unit constructed"
            );
        }
        Err(err) => {
            tracing::warn!(target: "dustline::behavior", %err, kind, "construction spawn failed");
        }
    }
}

fn finish_building_construction(world: &mut World, entity: Entity, kind: &str, origin: Cell) {
    let Some(team) = world.get::<Unit>(entity).map(|unit| unit.team) else {
        return;
    };
    if let Some(mut unit) = world.get_mut::<Unit>(entity) {
        unit.action = UnitAction::Stand;
    }
    let raise_ticks = world
        .resource::<UnitCatalog>()
        .get(kind)
        .map(|template| template.construct_ticks)
        .unwrap_or(1);
    let request = SpawnRequest::new(kind, team, Vec2::new(origin.x as f32, origin.y as f32))
        .with_action(UnitAction::Raising {
            ticks_left: raise_ticks,
        });
    match spawn_unit(world, request) {
        Ok(new_uid) => {
            tracing::info!(
                target: "dustline::behavior",
                building = %new_uid,
                kind,
                "building placed"
            );
        }
        Err(err) => {
            tracing::warn!(target: "dustline::behavior", %err, kind, "building spawn failed");
        }
    }
}

fn finish_deploy(world: &mut World, entity: Entity, into: &str, site: Vec2) {
    let Some((uid, team)) = world
        .get::<Unit>(entity)
        .map(|unit| (unit.uid, unit.team))
    else {
        return;
    };
    destroy_unit(world, uid);
    match spawn_unit(world, SpawnRequest::new(into, team, site)) {
        Ok(new_uid) => {
            tracing::info!(
                target: "dustline::behavior",
                vehicle = %uid,
                building = %new_uid,
                kind = into,
                "deploy complete"
            );
        }
        Err(err) => {
            tracing::warn!(target: "dustline::behavior", %err, kind = into, "deploy spawn failed");
        }
    }
}

fn step_projectile(world: &mut World, entity: Entity, config: &SimulationConfig) {
    let Some(projectile) = world.get::<Projectile>(entity).cloned() else {
        return;
    };
    let Some(position) = world.get::<Unit>(entity).map(|unit| unit.position) else {
        return;
    };

    let target_entity = world
        .resource::<UnitRegistry>()
        .find_by_uid(projectile.target);
    let aim = target_entity.and_then(|target| {
        let unit = world.get::<Unit>(target)?;
        let health = world.get::<Health>(target)?;
        if health.is_dead() {
            return None;
        }
        let footprint = world.get::<Footprint>(target).map(|f| f.size());
        let shadow = world.get::<Mobile>(target).map(|m| m.shadow).unwrap_or(0.0);
        Some(
            AimProfile {
                position: unit.position,
                category: unit.category,
                footprint,
                shadow,
            }
            .aim_point(),
        )
    });

    let destination = aim.unwrap_or(projectile.last_known_target);
    let step_len = projectile.speed * config.speed_adjustment_factor;
    let delta = destination - position;
    let distance = delta.length();

    if distance <= step_len.max(config.impact_epsilon) {
        if let (Some(target), Some(_)) = (target_entity, aim) {
            let armor = world.get::<Armor>(target).map(|a| a.0).unwrap_or(0.0);
            let damage = {
                let mut rng = world.resource_mut::<SimRng>();
                crate::combat::calculate_damage(&mut rng.0, projectile.power, armor)
            };
            if let Some(mut health) = world.get_mut::<Health>(target) {
                health.life -= damage as f32;
            }
            tracing::debug!(
                target: "dustline::behavior",
                projectile = %world.get::<Unit>(entity).map(|u| u.uid).unwrap_or(Uid(0)),
                victim = %projectile.target,
                damage,
                "projectile hit"
            );
        }
        // Spent either way; the reaper collects it this tick.
        if let Some(mut health) = world.get_mut::<Health>(entity) {
            health.life = 0.0;
        }
    } else {
        let new_position = position + delta / distance * step_len;
        let new_direction = find_angle(position, destination, config.directions);
        if let Some(mut unit) = world.get_mut::<Unit>(entity) {
            unit.position = new_position;
            unit.direction = new_direction;
        }
        if let Some(mut flight) = world.get_mut::<Projectile>(entity) {
            flight.last_known_target = destination;
        }
    }
}

/// Removes every dead entity from all indices, within the same tick its
/// death was observed.
pub fn sweep_dead(world: &mut World) {
    let mut dead: Vec<(Uid, UnitCategory)> = Vec::new();
    let mut query = world.query::<(&Unit, &Health)>();
    for (unit, health) in query.iter(world) {
        if health.is_dead() {
            dead.push((unit.uid, unit.category));
        }
    }
    for (uid, category) in dead {
        destroy_unit(world, uid);
        if category != UnitCategory::Projectile {
            tracing::info!(target: "dustline::behavior", %uid, %category, "unit destroyed in action");
        }
    }
}
