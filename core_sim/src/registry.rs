//! Entity registry and lifecycle.
//!
//! The registry owns every index into the live entity set: the uid map, the
//! per-category lists, the tick iteration order, the selection, and the
//! painter-ordered render projection. All cross-tick references anywhere else
//! in the simulation are plain uids resolved through [`UnitRegistry::find_by_uid`].

use bevy::prelude::*;
use std::collections::HashMap;

use sim_runtime::{SpawnError, Team, Uid, UnitCategory};

use crate::components::{
    Armor, Combat, Health, Mobile, Projectile, Sight, Unit, UnitAction, UnitFlags,
};
use crate::grid::{Footprint, SpatialIndex};
use crate::orders::{CurrentOrder, Order};
use crate::resources::SimulationConfig;
use crate::templates::UnitCatalog;

/// Flight parameters handed to a projectile at launch.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileSpawn {
    pub target: Uid,
    pub power: f32,
}

/// Caller-supplied overrides merged over the template at spawn time.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub kind: String,
    pub team: Team,
    pub position: Vec2,
    pub uid: Option<Uid>,
    pub life: Option<f32>,
    pub selectable: Option<bool>,
    pub direction: f32,
    pub action: Option<UnitAction>,
    pub projectile: Option<ProjectileSpawn>,
}

impl SpawnRequest {
    pub fn new(kind: impl Into<String>, team: Team, position: Vec2) -> Self {
        Self {
            kind: kind.into(),
            team,
            position,
            uid: None,
            life: None,
            selectable: None,
            direction: 0.0,
            action: None,
            projectile: None,
        }
    }

    pub fn with_uid(mut self, uid: Uid) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_life(mut self, life: f32) -> Self {
        self.life = Some(life);
        self
    }

    pub fn with_action(mut self, action: UnitAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_projectile(mut self, projectile: ProjectileSpawn) -> Self {
        self.projectile = Some(projectile);
        self
    }

    pub fn unselectable(mut self) -> Self {
        self.selectable = Some(false);
        self
    }
}

/// Map-based indices over the live entity set.
#[derive(Resource, Debug)]
pub struct UnitRegistry {
    by_uid: HashMap<Uid, Entity>,
    by_category: [Vec<Entity>; 5],
    insertion_order: Vec<Entity>,
    selection: Vec<Uid>,
    render_order: Vec<Uid>,
    counter: i64,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self {
            by_uid: HashMap::new(),
            by_category: std::array::from_fn(|_| Vec::new()),
            insertion_order: Vec::new(),
            selection: Vec::new(),
            render_order: Vec::new(),
            counter: 1,
        }
    }
}

impl UnitRegistry {
    pub fn find_by_uid(&self, uid: Uid) -> Option<Entity> {
        self.by_uid.get(&uid).copied()
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.by_uid.contains_key(&uid)
    }

    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }

    pub fn allocate_uid(&mut self) -> Uid {
        let uid = Uid(self.counter);
        self.counter += 1;
        uid
    }

    /// Tick iteration order (insertion order).
    pub fn insertion_order(&self) -> &[Entity] {
        &self.insertion_order
    }

    pub fn insertion_snapshot(&self) -> Vec<Entity> {
        self.insertion_order.clone()
    }

    pub fn category(&self, category: UnitCategory) -> &[Entity] {
        &self.by_category[category.index()]
    }

    pub fn selection(&self) -> &[Uid] {
        &self.selection
    }

    pub fn render_order(&self) -> &[Uid] {
        &self.render_order
    }

    pub fn set_render_order(&mut self, order: Vec<Uid>) {
        self.render_order = order;
    }

    fn register(&mut self, uid: Uid, entity: Entity, category: UnitCategory) {
        self.by_uid.insert(uid, entity);
        self.by_category[category.index()].push(entity);
        self.insertion_order.push(entity);
    }

    fn unregister(&mut self, uid: Uid, entity: Entity, category: UnitCategory) {
        self.by_uid.remove(&uid);
        self.by_category[category.index()].retain(|e| *e != entity);
        self.insertion_order.retain(|e| *e != entity);
        self.selection.retain(|u| *u != uid);
        self.render_order.retain(|u| *u != uid);
    }

    fn push_selection(&mut self, uid: Uid) {
        if !self.selection.contains(&uid) {
            self.selection.push(uid);
        }
    }

    pub(crate) fn remove_selection(&mut self, uid: Uid) {
        self.selection.retain(|u| *u != uid);
    }
}

/// Creates an entity from its template plus caller overrides and registers it
/// in every index. Buildings and terrain invalidate the occupancy caches.
pub fn spawn_unit(world: &mut World, request: SpawnRequest) -> Result<Uid, SpawnError> {
    let template = world
        .resource::<UnitCatalog>()
        .get(&request.kind)
        .cloned()
        .ok_or_else(|| SpawnError::UnknownKind(request.kind.clone()))?;

    let uid = match request.uid {
        Some(uid) => {
            if world.resource::<UnitRegistry>().contains(uid) {
                return Err(SpawnError::DuplicateUid(uid));
            }
            uid
        }
        None => world.resource_mut::<UnitRegistry>().allocate_uid(),
    };

    let grid_px = world.resource::<SimulationConfig>().grid_pixel_size as f32;
    let category = template.category;

    let default_selectable = category != UnitCategory::Projectile;
    let mut flags = UnitFlags::empty();
    if request.selectable.unwrap_or(default_selectable) {
        flags |= UnitFlags::SELECTABLE;
    }

    let unit = Unit {
        uid,
        kind: request.kind.clone(),
        category,
        team: request.team,
        position: request.position,
        direction: request.direction,
        action: request.action.unwrap_or(UnitAction::Stand),
        flags,
        frame: 0,
    };
    let health = match request.life {
        Some(life) => Health::with_life(life, template.hit_points),
        None => Health::full(template.hit_points),
    };

    let mut spawned = world.spawn((
        unit,
        health,
        Armor(template.armor),
        Sight(template.sight),
        CurrentOrder(Order::Stand),
    ));
    if let Some(weapon) = &template.weapon {
        spawned.insert(Combat {
            power: weapon.power,
            range: weapon.range,
            reload_ticks: weapon.reload_ticks,
            reload_left: 0,
            flags: weapon.flags,
            projectile: weapon.projectile.to_string(),
        });
    }
    if matches!(category, UnitCategory::Vehicle | UnitCategory::Aircraft) {
        spawned.insert(Mobile::new(
            template.speed,
            template.turn_speed,
            template.radius_px / grid_px,
            template.shadow_px / grid_px,
        ));
    }
    if let (Some(passable), Some(buildable)) = (&template.passable_mask, &template.buildable_mask) {
        spawned.insert(Footprint {
            passable: passable.clone(),
            buildable: buildable.clone(),
        });
    }
    if category == UnitCategory::Projectile {
        let seed = request.projectile.unwrap_or(ProjectileSpawn {
            target: Uid(0),
            power: 0.0,
        });
        debug_assert!(
            request.projectile.is_some(),
            "projectile spawned without flight parameters"
        );
        spawned.insert(Projectile {
            target: seed.target,
            power: seed.power,
            speed: template.projectile_speed,
            last_known_target: request.position,
        });
    }
    let entity = spawned.id();

    world
        .resource_mut::<UnitRegistry>()
        .register(uid, entity, category);
    if category.occupies_ground() {
        world.resource_mut::<SpatialIndex>().invalidate();
    }

    tracing::debug!(
        target: "dustline::registry",
        %uid,
        kind = %request.kind,
        %category,
        team = %request.team,
        "unit spawned"
    );
    Ok(uid)
}

/// Removes a unit from every index and despawns it. Idempotent: destroying an
/// unknown uid is a no-op.
pub fn destroy_unit(world: &mut World, uid: Uid) -> bool {
    let Some(entity) = world.resource::<UnitRegistry>().find_by_uid(uid) else {
        return false;
    };
    let Some(category) = world.get::<Unit>(entity).map(|unit| unit.category) else {
        return false;
    };

    world
        .resource_mut::<UnitRegistry>()
        .unregister(uid, entity, category);
    world.despawn(entity);
    if category.occupies_ground() {
        world.resource_mut::<SpatialIndex>().invalidate();
    }

    tracing::debug!(target: "dustline::registry", %uid, %category, "unit destroyed");
    true
}

/// Registered and not yet dead.
pub fn unit_is_alive(world: &World, uid: Uid) -> bool {
    world
        .resource::<UnitRegistry>()
        .find_by_uid(uid)
        .and_then(|entity| world.get::<Health>(entity))
        .map_or(false, |health| !health.is_dead())
}

/// Selection entry point. Shift-clicking a selected unit deselects it;
/// otherwise the unit joins the selection if it is currently selectable.
pub fn select_unit(world: &mut World, uid: Uid, shift: bool) {
    let Some(entity) = world.resource::<UnitRegistry>().find_by_uid(uid) else {
        return;
    };
    let Some(mut unit) = world.get_mut::<Unit>(entity) else {
        return;
    };

    if shift && unit.is_selected() {
        unit.flags.remove(UnitFlags::SELECTED);
        world.resource_mut::<UnitRegistry>().remove_selection(uid);
        return;
    }
    if unit.is_selectable() && !unit.is_selected() {
        unit.flags.insert(UnitFlags::SELECTED);
        world.resource_mut::<UnitRegistry>().push_selection(uid);
    }
}

pub fn clear_selection(world: &mut World) {
    let selected: Vec<Uid> = world.resource::<UnitRegistry>().selection().to_vec();
    for uid in selected {
        if let Some(entity) = world.resource::<UnitRegistry>().find_by_uid(uid) {
            if let Some(mut unit) = world.get_mut::<Unit>(entity) {
                unit.flags.remove(UnitFlags::SELECTED);
            }
        }
    }
    world.resource_mut::<UnitRegistry>().selection.clear();
}

/// Recomputes the painter-order projection: y ascending, ties x descending.
pub fn rebuild_render_order(mut registry: ResMut<UnitRegistry>, units: Query<&Unit>) {
    let mut entries: Vec<(f32, f32, Uid)> = registry
        .insertion_order()
        .iter()
        .filter_map(|entity| units.get(*entity).ok())
        .map(|unit| (unit.position.y, unit.position.x, unit.uid))
        .collect();
    entries.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    registry.set_render_order(entries.into_iter().map(|(_, _, uid)| uid).collect());
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_runtime::OccupancyGrid;

    fn test_world() -> World {
        let mut world = World::new();
        world.insert_resource(SimulationConfig::default());
        world.insert_resource(UnitCatalog::standard());
        world.insert_resource(UnitRegistry::default());
        world.insert_resource(SpatialIndex::new(OccupancyGrid::new(20, 20)));
        world
    }

    #[test]
    fn spawn_assigns_ascending_uids() {
        let mut world = test_world();
        let a = spawn_unit(
            &mut world,
            SpawnRequest::new("scout-tank", Team::Blue, Vec2::new(1.0, 1.0)),
        )
        .unwrap();
        let b = spawn_unit(
            &mut world,
            SpawnRequest::new("scout-tank", Team::Blue, Vec2::new(2.0, 2.0)),
        )
        .unwrap();
        assert!(b.0 > a.0);
        assert_eq!(world.resource::<UnitRegistry>().len(), 2);
    }

    #[test]
    fn spawn_accepts_reserved_negative_uid() {
        let mut world = test_world();
        let uid = spawn_unit(
            &mut world,
            SpawnRequest::new("base", Team::Green, Vec2::new(3.0, 3.0)).with_uid(Uid(-7)),
        )
        .unwrap();
        assert_eq!(uid, Uid(-7));
        assert!(world.resource::<UnitRegistry>().find_by_uid(Uid(-7)).is_some());

        let duplicate = spawn_unit(
            &mut world,
            SpawnRequest::new("base", Team::Green, Vec2::new(5.0, 5.0)).with_uid(Uid(-7)),
        );
        assert!(matches!(duplicate, Err(SpawnError::DuplicateUid(_))));
    }

    #[test]
    fn spawn_rejects_unknown_kind() {
        let mut world = test_world();
        let result = spawn_unit(
            &mut world,
            SpawnRequest::new("mammoth-tank", Team::Blue, Vec2::ZERO),
        );
        assert!(matches!(result, Err(SpawnError::UnknownKind(_))));
    }

    #[test]
    fn life_override_is_capped_at_maximum() {
        let mut world = test_world();
        let uid = spawn_unit(
            &mut world,
            SpawnRequest::new("base", Team::Green, Vec2::ZERO).with_life(50.0),
        )
        .unwrap();
        let entity = world.resource::<UnitRegistry>().find_by_uid(uid).unwrap();
        let health = world.get::<Health>(entity).unwrap();
        assert_eq!(health.life, 50.0);
        assert_eq!(health.max_life, 500.0);
    }

    #[test]
    fn building_spawn_invalidates_grids() {
        let mut world = test_world();
        {
            let mut spatial = world.resource_mut::<SpatialIndex>();
            spatial.rebuild_passable(&[]);
            assert!(!spatial.passable_stale());
        }
        spawn_unit(
            &mut world,
            SpawnRequest::new("base", Team::Blue, Vec2::new(4.0, 4.0)),
        )
        .unwrap();
        assert!(world.resource::<SpatialIndex>().passable_stale());
    }

    #[test]
    fn destroy_removes_unit_from_every_index() {
        let mut world = test_world();
        let uid = spawn_unit(
            &mut world,
            SpawnRequest::new("scout-tank", Team::Blue, Vec2::new(1.0, 1.0)),
        )
        .unwrap();
        select_unit(&mut world, uid, false);
        assert_eq!(world.resource::<UnitRegistry>().selection(), &[uid]);

        assert!(destroy_unit(&mut world, uid));
        let registry = world.resource::<UnitRegistry>();
        assert!(registry.find_by_uid(uid).is_none());
        assert!(registry.selection().is_empty());
        assert!(registry.insertion_order().is_empty());
        assert!(registry.category(UnitCategory::Vehicle).is_empty());
        assert!(!registry.render_order().contains(&uid));

        // Destroying again is a no-op, not an error.
        assert!(!destroy_unit(&mut world, uid));
    }

    #[test]
    fn shift_click_toggles_selection() {
        let mut world = test_world();
        let uid = spawn_unit(
            &mut world,
            SpawnRequest::new("scout-tank", Team::Blue, Vec2::ZERO),
        )
        .unwrap();

        select_unit(&mut world, uid, false);
        assert_eq!(world.resource::<UnitRegistry>().selection(), &[uid]);

        select_unit(&mut world, uid, true);
        assert!(world.resource::<UnitRegistry>().selection().is_empty());
    }

    #[test]
    fn projectiles_are_never_selectable() {
        let mut world = test_world();
        let uid = spawn_unit(
            &mut world,
            SpawnRequest::new("bullet", Team::Blue, Vec2::ZERO).with_projectile(ProjectileSpawn {
                target: Uid(99),
                power: 5.0,
            }),
        )
        .unwrap();
        select_unit(&mut world, uid, false);
        assert!(world.resource::<UnitRegistry>().selection().is_empty());
    }
}
