//! Per-team fog of war.
//!
//! Each team owns a visibility raster over the map. A cell is `Visible` while
//! inside some living friendly entity's sight radius, decays to `Explored`
//! when sight moves away, and starts `Unexplored`. The raster is recomputed
//! once per logic tick, after deaths are swept, so a destroyed unit stops
//! contributing sight the same tick it dies. Everything outside this module
//! treats the fog as read-only.

use std::collections::HashMap;

use bevy::prelude::*;
use sim_runtime::Team;

use crate::components::{Health, Sight, Unit};
use crate::grid::SpatialIndex;

/// Visibility state of a single cell from one team's perspective.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Unexplored = 0,
    Explored = 1,
    Visible = 2,
}

impl VisibilityState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One team's visibility raster, row-major.
#[derive(Debug, Clone)]
pub struct TeamVisibilityMap {
    pub team: Team,
    width: u32,
    height: u32,
    cells: Vec<VisibilityState>,
}

impl TeamVisibilityMap {
    pub fn new(team: Team, width: u32, height: u32) -> Self {
        Self {
            team,
            width,
            height,
            cells: vec![VisibilityState::Unexplored; (width * height) as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    pub fn state_at(&self, x: u32, y: u32) -> VisibilityState {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(VisibilityState::Unexplored)
    }

    pub fn is_visible(&self, x: u32, y: u32) -> bool {
        self.state_at(x, y) == VisibilityState::Visible
    }

    pub fn is_explored(&self, x: u32, y: u32) -> bool {
        self.state_at(x, y) != VisibilityState::Unexplored
    }

    pub fn mark_visible(&mut self, x: u32, y: u32) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = VisibilityState::Visible;
        }
    }

    /// Demotes currently visible cells to explored; the per-tick refresh
    /// re-marks whatever is still in sight.
    pub fn demote_visible(&mut self) {
        for cell in &mut self.cells {
            if *cell == VisibilityState::Visible {
                *cell = VisibilityState::Explored;
            }
        }
    }

    /// Marks every cell within `radius` (Euclidean) of `center` visible.
    pub fn reveal_circle(&mut self, center: Vec2, radius: f32) {
        let min_x = (center.x - radius).floor().max(0.0) as u32;
        let min_y = (center.y - radius).floor().max(0.0) as u32;
        let max_x = ((center.x + radius).ceil() as u32).min(self.width.saturating_sub(1));
        let max_y = ((center.y + radius).ceil() as u32).min(self.height.saturating_sub(1));
        let radius_sq = radius * radius;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 - center.x;
                let dy = y as f32 - center.y;
                if dx * dx + dy * dy <= radius_sq {
                    self.mark_visible(x, y);
                }
            }
        }
    }

    pub fn count_by_state(&self) -> (usize, usize, usize) {
        let mut unexplored = 0;
        let mut explored = 0;
        let mut visible = 0;
        for cell in &self.cells {
            match cell {
                VisibilityState::Unexplored => unexplored += 1,
                VisibilityState::Explored => explored += 1,
                VisibilityState::Visible => visible += 1,
            }
        }
        (unexplored, explored, visible)
    }

    /// Row-major byte export for the render layer.
    pub fn to_byte_raster(&self) -> Vec<u8> {
        self.cells.iter().map(|cell| cell.as_u8()).collect()
    }
}

/// All teams' visibility maps.
#[derive(Resource, Debug, Clone, Default)]
pub struct FogOfWar {
    maps: HashMap<Team, TeamVisibilityMap>,
}

impl FogOfWar {
    pub fn ensure_team(&mut self, team: Team, width: u32, height: u32) -> &mut TeamVisibilityMap {
        self.maps
            .entry(team)
            .or_insert_with(|| TeamVisibilityMap::new(team, width, height))
    }

    pub fn team(&self, team: Team) -> Option<&TeamVisibilityMap> {
        self.maps.get(&team)
    }

    pub fn is_visible(&self, team: Team, x: u32, y: u32) -> bool {
        self.maps
            .get(&team)
            .map(|map| map.is_visible(x, y))
            .unwrap_or(false)
    }

    pub fn is_explored(&self, team: Team, x: u32, y: u32) -> bool {
        self.maps
            .get(&team)
            .map(|map| map.is_explored(x, y))
            .unwrap_or(false)
    }
}

/// Recomputes every team's raster from living entities' sight radii.
pub fn update_fog(world: &mut World) {
    let (width, height) = {
        let spatial = world.resource::<SpatialIndex>();
        (spatial.width(), spatial.height())
    };

    let mut sources: Vec<(Team, Vec2, f32)> = Vec::new();
    let mut query = world.query::<(&Unit, &Health, &Sight)>();
    for (unit, health, sight) in query.iter(world) {
        if !health.is_dead() {
            sources.push((unit.team, unit.position, sight.0));
        }
    }

    let mut fog = world.resource_mut::<FogOfWar>();
    for team in [Team::Blue, Team::Green] {
        fog.ensure_team(team, width, height).demote_visible();
    }
    for (team, position, radius) in sources {
        fog.ensure_team(team, width, height)
            .reveal_circle(position, radius);
    }
}
