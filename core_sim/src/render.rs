//! Read-only projections for the render layer.
//!
//! The render cadence is independent of the logic tick: it may run many times
//! between ticks. Everything here reads simulation state and produces plain
//! data; nothing mutates an entity.

use bevy::prelude::*;
use sim_runtime::{LevelDef, LifeCode, Point, Team, Uid, UnitCategory};

use crate::components::{Health, Mobile, Unit, UnitAction};
use crate::registry::UnitRegistry;
use crate::resources::{AttackIndicators, SimulationConfig, SimulationTick};

/// Viewport camera with edge panning, in pixel space.
#[derive(Resource, Debug, Clone)]
pub struct Camera {
    pub offset_x: f32,
    pub offset_y: f32,
    viewport_width: f32,
    viewport_height: f32,
    map_pixel_width: f32,
    map_pixel_height: f32,
    panning_threshold: f32,
    panning_speed: f32,
}

impl Camera {
    pub fn from_level(level: &LevelDef, config: &SimulationConfig) -> Self {
        let grid_px = config.grid_pixel_size as f32;
        let mut camera = Self {
            offset_x: level.start_camera.x as f32 * grid_px,
            offset_y: level.start_camera.y as f32 * grid_px,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            map_pixel_width: level.map_grid_width as f32 * grid_px,
            map_pixel_height: level.map_grid_height as f32 * grid_px,
            panning_threshold: config.panning_threshold,
            panning_speed: config.panning_speed,
        };
        camera.clamp();
        camera
    }

    /// Edge panning, run once per render tick. Only applies while the pointer
    /// is inside the viewport; the offset always stays clamped to map bounds.
    pub fn pan(&mut self, pointer_x: f32, pointer_y: f32, inside_viewport: bool) -> bool {
        if !inside_viewport {
            return false;
        }
        let (before_x, before_y) = (self.offset_x, self.offset_y);

        if pointer_x <= self.panning_threshold {
            self.offset_x -= self.panning_speed;
        } else if pointer_x >= self.viewport_width - self.panning_threshold {
            self.offset_x += self.panning_speed;
        }
        if pointer_y <= self.panning_threshold {
            self.offset_y -= self.panning_speed;
        } else if pointer_y >= self.viewport_height - self.panning_threshold {
            self.offset_y += self.panning_speed;
        }

        self.clamp();
        self.offset_x != before_x || self.offset_y != before_y
    }

    fn clamp(&mut self) {
        let max_x = (self.map_pixel_width - self.viewport_width).max(0.0);
        let max_y = (self.map_pixel_height - self.viewport_height).max(0.0);
        self.offset_x = self.offset_x.clamp(0.0, max_x);
        self.offset_y = self.offset_y.clamp(0.0, max_y);
    }
}

/// One entity as the render layer should draw it this frame.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub uid: Uid,
    pub kind: String,
    pub category: UnitCategory,
    pub team: Team,
    /// Interpolated display position in grid units.
    pub position: Point,
    pub direction: f32,
    pub frame: u32,
    pub action: UnitAction,
    pub life_ratio: f32,
    pub life_code: LifeCode,
    pub selected: bool,
}

/// Attack highlight with its current fade.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorView {
    pub target: Uid,
    pub position: Point,
    pub alpha: f32,
}

/// Snapshot handed to the render layer: painter-ordered entities, decayed
/// attack indicators, camera offset, and the interpolation factor used.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub tick: u64,
    pub interpolation: f32,
    pub camera_offset: (f32, f32),
    pub items: Vec<DrawItem>,
    pub indicators: Vec<IndicatorView>,
}

/// Builds the frame for the current render instant. Decays expired attack
/// indicators as a side effect; entity state is untouched.
pub fn build_render_frame(world: &mut World, interpolation: f32, now_ms: u64) -> RenderFrame {
    let damaged_ratio = world.resource::<SimulationConfig>().damaged_ratio;
    let tick = world.resource::<SimulationTick>().0;
    let camera_offset = {
        let camera = world.resource::<Camera>();
        (camera.offset_x, camera.offset_y)
    };

    world.resource_mut::<AttackIndicators>().decay(now_ms);

    let order: Vec<Uid> = world.resource::<UnitRegistry>().render_order().to_vec();
    let mut items = Vec::with_capacity(order.len());
    for uid in order {
        let Some(entity) = world.resource::<UnitRegistry>().find_by_uid(uid) else {
            continue;
        };
        let (Some(unit), Some(health)) = (world.get::<Unit>(entity), world.get::<Health>(entity))
        else {
            continue;
        };
        // Interpolation only smooths display: the factor is <= 0, so the
        // drawn position lags the authoritative one by a fraction of the
        // last step and never predicts the next tick.
        let display = world
            .get::<Mobile>(entity)
            .map(|mobile| unit.position + mobile.last_step * interpolation)
            .unwrap_or(unit.position);
        items.push(DrawItem {
            uid,
            kind: unit.kind.clone(),
            category: unit.category,
            team: unit.team,
            position: Point::new(display.x, display.y),
            direction: unit.direction,
            frame: unit.frame,
            action: unit.action.clone(),
            life_ratio: health.ratio(),
            life_code: health.life_code(damaged_ratio),
            selected: unit.is_selected(),
        });
    }

    let mut indicators = Vec::new();
    let snapshot: Vec<_> = world
        .resource::<AttackIndicators>()
        .iter()
        .copied()
        .collect();
    for indicator in snapshot {
        let Some(entity) = world
            .resource::<UnitRegistry>()
            .find_by_uid(indicator.target)
        else {
            continue;
        };
        let Some(unit) = world.get::<Unit>(entity) else {
            continue;
        };
        indicators.push(IndicatorView {
            target: indicator.target,
            position: Point::new(unit.position.x, unit.position.y),
            alpha: indicator.alpha(now_ms),
        });
    }

    RenderFrame {
        tick,
        interpolation,
        camera_offset,
        items,
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_runtime::Cell;
    use std::collections::HashMap;

    fn camera_on_60x40_map() -> Camera {
        let level = LevelDef {
            name: "test".into(),
            briefing: String::new(),
            map_grid_width: 60,
            map_grid_height: 40,
            obstructed_terrain: vec![],
            start_camera: Cell::new(4, 4),
            cash: HashMap::new(),
            placements: vec![],
        };
        Camera::from_level(&level, &SimulationConfig::default())
    }

    #[test]
    fn pointer_outside_viewport_never_pans() {
        let mut camera = camera_on_60x40_map();
        let before = (camera.offset_x, camera.offset_y);
        assert!(!camera.pan(0.0, 0.0, false));
        assert_eq!((camera.offset_x, camera.offset_y), before);
    }

    #[test]
    fn panning_clamps_to_map_bounds() {
        let mut camera = camera_on_60x40_map();
        // Drag hard left for far longer than the map is wide.
        for _ in 0..200 {
            camera.pan(0.0, 240.0, true);
        }
        assert_eq!(camera.offset_x, 0.0);

        // And hard right: clamp at map width minus viewport.
        for _ in 0..500 {
            camera.pan(639.0, 240.0, true);
        }
        assert_eq!(camera.offset_x, 60.0 * 20.0 - 640.0);
    }

    #[test]
    fn start_offset_comes_from_level_camera_cell() {
        let camera = camera_on_60x40_map();
        assert_eq!(camera.offset_x, 80.0);
        assert_eq!(camera.offset_y, 80.0);
    }
}
