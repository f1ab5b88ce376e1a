use bevy::prelude::*;
use sim_runtime::{Cell, LevelDef, OccupancyGrid, PlacementError};

use crate::components::{Mobile, Unit};
use crate::visibility::TeamVisibilityMap;

/// Small occupancy mask stamped over the world grids at an entity's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootprintMask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl FootprintMask {
    /// Builds a mask from row-major 0/1 rows, top row first.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.len()).unwrap_or(0) as u32;
        let mut cells = Vec::with_capacity((width * height) as usize);
        for row in rows {
            debug_assert_eq!(row.len() as u32, width, "ragged footprint mask");
            for value in *row {
                cells.push(*value != 0);
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[(y * self.width + x) as usize]
    }

    /// Iterate the set cells as (x, y) offsets from the mask origin.
    pub fn iter_set(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(move |(idx, _)| (idx as u32 % width, idx as u32 / width))
    }
}

/// Occupancy masks of a building or terrain piece.
#[derive(Component, Debug, Clone)]
pub struct Footprint {
    pub passable: FootprintMask,
    pub buildable: FootprintMask,
}

impl Footprint {
    pub fn size(&self) -> (u32, u32) {
        (self.buildable.width(), self.buildable.height())
    }
}

/// Cached map-wide occupancy, derived from registry contents.
///
/// Contract: rebuild-on-demand, cache-until-invalidated. Registry mutations
/// of buildings/terrain call [`SpatialIndex::invalidate`]; the buildable grid
/// is additionally aged every tick because vehicle exclusion zones move.
/// Readers go through [`ensure_passable`] / [`ensure_buildable`] before
/// touching the cached grids.
#[derive(Resource, Debug, Clone)]
pub struct SpatialIndex {
    terrain_base: OccupancyGrid,
    passable: Option<OccupancyGrid>,
    buildable: Option<OccupancyGrid>,
    revision: u64,
}

impl SpatialIndex {
    pub fn new(terrain_base: OccupancyGrid) -> Self {
        Self {
            terrain_base,
            passable: None,
            buildable: None,
            revision: 0,
        }
    }

    pub fn from_level(level: &LevelDef) -> Self {
        let mut base = OccupancyGrid::new(level.map_grid_width, level.map_grid_height);
        for cell in &level.obstructed_terrain {
            base.set_obstructed(cell.x, cell.y, true);
        }
        Self::new(base)
    }

    pub fn width(&self) -> u32 {
        self.terrain_base.width()
    }

    pub fn height(&self) -> u32 {
        self.terrain_base.height()
    }

    pub fn terrain_base(&self) -> &OccupancyGrid {
        &self.terrain_base
    }

    /// Monotonic generation counter; bumped whenever occupancy changes, so
    /// cached paths can detect staleness.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drops both cached grids. Called on every building/terrain add/remove.
    pub fn invalidate(&mut self) {
        self.passable = None;
        self.buildable = None;
        self.revision += 1;
    }

    /// Drops only the buildable cache; vehicle exclusion zones shift every
    /// tick even when no structure changed.
    pub fn age_buildable(&mut self) {
        self.buildable = None;
    }

    pub fn passable_stale(&self) -> bool {
        self.passable.is_none()
    }

    pub fn buildable_stale(&self) -> bool {
        self.buildable.is_none()
    }

    pub fn rebuild_passable(&mut self, overlays: &[(Cell, FootprintMask)]) {
        let mut grid = self.terrain_base.clone();
        for (origin, mask) in overlays {
            for (dx, dy) in mask.iter_set() {
                grid.set_obstructed(origin.x + dx, origin.y + dy, true);
            }
        }
        self.passable = Some(grid);
    }

    pub fn rebuild_buildable(
        &mut self,
        overlays: &[(Cell, FootprintMask)],
        vehicle_zones: &[(Vec2, f32)],
    ) {
        let mut grid = self.terrain_base.clone();
        for (origin, mask) in overlays {
            for (dx, dy) in mask.iter_set() {
                grid.set_obstructed(origin.x + dx, origin.y + dy, true);
            }
        }
        // Soft square exclusion around every vehicle so a building cannot be
        // dropped under a unit mid-transit.
        for (center, radius) in vehicle_zones {
            let x1 = (center.x - radius).floor().max(0.0) as u32;
            let y1 = (center.y - radius).floor().max(0.0) as u32;
            let x2 = ((center.x + radius).floor() as u32).min(grid.width().saturating_sub(1));
            let y2 = ((center.y + radius).floor() as u32).min(grid.height().saturating_sub(1));
            for y in y1..=y2 {
                for x in x1..=x2 {
                    grid.set_obstructed(x, y, true);
                }
            }
        }
        self.buildable = Some(grid);
    }

    /// Cached passable grid; callers must run [`ensure_passable`] first.
    pub fn passable(&self) -> &OccupancyGrid {
        self.passable.as_ref().unwrap_or(&self.terrain_base)
    }

    /// Cached buildable grid; callers must run [`ensure_buildable`] first.
    pub fn buildable(&self) -> &OccupancyGrid {
        self.buildable.as_ref().unwrap_or(&self.terrain_base)
    }
}

/// Rebuilds the passable cache from live buildings/terrain if stale.
pub fn ensure_passable(world: &mut World) {
    if !world.resource::<SpatialIndex>().passable_stale() {
        return;
    }
    let overlays = collect_ground_overlays(world, OverlayKind::Passable);
    let mut spatial = world.resource_mut::<SpatialIndex>();
    spatial.rebuild_passable(&overlays);
    log::debug!("passable grid rebuilt over {} footprints", overlays.len());
}

/// Rebuilds the buildable cache from structures plus vehicle zones if stale.
pub fn ensure_buildable(world: &mut World) {
    if !world.resource::<SpatialIndex>().buildable_stale() {
        return;
    }
    let overlays = collect_ground_overlays(world, OverlayKind::Buildable);
    let zones = collect_vehicle_zones(world);
    let mut spatial = world.resource_mut::<SpatialIndex>();
    spatial.rebuild_buildable(&overlays, &zones);
    log::debug!(
        "buildable grid rebuilt over {} footprints and {} vehicle zones",
        overlays.len(),
        zones.len()
    );
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OverlayKind {
    Passable,
    Buildable,
}

fn collect_ground_overlays(world: &mut World, kind: OverlayKind) -> Vec<(Cell, FootprintMask)> {
    let mut overlays = Vec::new();
    let mut query = world.query::<(&Unit, &Footprint)>();
    for (unit, footprint) in query.iter(world) {
        if !unit.category.occupies_ground() {
            continue;
        }
        let mask = match kind {
            OverlayKind::Passable => footprint.passable.clone(),
            OverlayKind::Buildable => footprint.buildable.clone(),
        };
        overlays.push((unit.cell(), mask));
    }
    overlays
}

fn collect_vehicle_zones(world: &mut World) -> Vec<(Vec2, f32)> {
    let mut zones = Vec::new();
    let mut query = world.query::<(&Unit, &Mobile)>();
    for (unit, mobile) in query.iter(world) {
        if unit.category == sim_runtime::UnitCategory::Vehicle {
            zones.push((unit.position, mobile.radius));
        }
    }
    zones
}

/// Ages the buildable cache at the top of every tick.
pub fn age_buildable(mut spatial: ResMut<SpatialIndex>) {
    spatial.age_buildable();
}

/// Checks a candidate footprint against bounds, occupancy, and fog.
///
/// Funds are checked separately by the order pipeline; this function is pure
/// and safe for UI placement previews.
pub fn validate_placement(
    mask: &FootprintMask,
    origin: Cell,
    buildable: &OccupancyGrid,
    fog: &TeamVisibilityMap,
) -> Result<(), PlacementError> {
    for (dx, dy) in mask.iter_set() {
        let x = origin.x + dx;
        let y = origin.y + dy;
        let cell = Cell::new(x, y);
        if !buildable.in_bounds(x, y) {
            return Err(PlacementError::OutOfBounds(cell));
        }
        if buildable.is_obstructed(x, y) {
            return Err(PlacementError::Obstructed(cell));
        }
        if !fog.is_visible(x, y) {
            return Err(PlacementError::Fogged(cell));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_runtime::Team;

    fn mask_2x2() -> FootprintMask {
        FootprintMask::from_rows(&[&[1, 1], &[1, 1]])
    }

    #[test]
    fn footprint_mask_iterates_set_cells() {
        let mask = FootprintMask::from_rows(&[&[1, 1], &[0, 0], &[0, 1]]);
        let set: Vec<(u32, u32)> = mask.iter_set().collect();
        assert_eq!(set, vec![(0, 0), (1, 0), (1, 2)]);
        assert_eq!(mask.width(), 2);
        assert_eq!(mask.height(), 3);
    }

    #[test]
    fn rebuild_passable_stamps_footprints_over_baseline() {
        let mut base = OccupancyGrid::new(8, 8);
        base.set_obstructed(7, 7, true);
        let mut spatial = SpatialIndex::new(base);

        spatial.rebuild_passable(&[(Cell::new(2, 3), mask_2x2())]);
        let grid = spatial.passable();
        assert!(grid.is_obstructed(2, 3));
        assert!(grid.is_obstructed(3, 4));
        assert!(grid.is_obstructed(7, 7));
        assert!(!grid.is_obstructed(4, 4));

        // Removing the structure and rebuilding reverts to the baseline.
        spatial.invalidate();
        spatial.rebuild_passable(&[]);
        assert!(!spatial.passable().is_obstructed(2, 3));
        assert!(spatial.passable().is_obstructed(7, 7));
    }

    #[test]
    fn invalidate_bumps_revision_and_drops_caches() {
        let mut spatial = SpatialIndex::new(OccupancyGrid::new(4, 4));
        spatial.rebuild_passable(&[]);
        assert!(!spatial.passable_stale());
        let before = spatial.revision();
        spatial.invalidate();
        assert!(spatial.passable_stale());
        assert!(spatial.buildable_stale());
        assert_eq!(spatial.revision(), before + 1);
    }

    #[test]
    fn vehicle_zones_block_building_placement() {
        let mut spatial = SpatialIndex::new(OccupancyGrid::new(10, 10));
        spatial.rebuild_buildable(&[], &[(Vec2::new(5.0, 5.0), 1.0)]);
        let grid = spatial.buildable();
        assert!(grid.is_obstructed(5, 5));
        assert!(grid.is_obstructed(4, 4));
        assert!(grid.is_obstructed(6, 6));
        assert!(!grid.is_obstructed(8, 8));
    }

    #[test]
    fn placement_rejects_fog_and_obstructions() {
        let mut buildable = OccupancyGrid::new(10, 10);
        let mut fog = TeamVisibilityMap::new(Team::Blue, 10, 10);
        let mask = mask_2x2();

        // Everything fogged: rejected even on open ground.
        assert!(matches!(
            validate_placement(&mask, Cell::new(1, 1), &buildable, &fog),
            Err(PlacementError::Fogged(_))
        ));

        for y in 0..10 {
            for x in 0..10 {
                fog.mark_visible(x, y);
            }
        }
        assert!(validate_placement(&mask, Cell::new(1, 1), &buildable, &fog).is_ok());

        buildable.set_obstructed(2, 2, true);
        assert!(matches!(
            validate_placement(&mask, Cell::new(1, 1), &buildable, &fog),
            Err(PlacementError::Obstructed(cell)) if cell == Cell::new(2, 2)
        ));

        assert!(matches!(
            validate_placement(&mask, Cell::new(9, 9), &buildable, &fog),
            Err(PlacementError::OutOfBounds(_))
        ));
    }
}
