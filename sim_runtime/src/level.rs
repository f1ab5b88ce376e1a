use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Cell, Team, Uid};

/// Declarative description of a mission map: dimensions, terrain
/// obstructions, starting camera, starting cash, and initial placements.
///
/// Level content itself is authored outside the simulation; this is only the
/// ingestion contract. Deserialized from JSON with serde.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    #[serde(default)]
    pub briefing: String,
    pub map_grid_width: u32,
    pub map_grid_height: u32,
    /// Cells obstructed by the map art itself (cliffs, water).
    #[serde(default)]
    pub obstructed_terrain: Vec<Cell>,
    /// Starting camera position, in grid cells.
    pub start_camera: Cell,
    /// Starting cash balance per team.
    #[serde(default)]
    pub cash: HashMap<Team, u32>,
    /// Entities present when the mission opens.
    #[serde(default)]
    pub placements: Vec<PlacementDef>,
}

/// One entity listed in a level's placement list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementDef {
    pub kind: String,
    pub team: Team,
    pub x: f32,
    pub y: f32,
    /// Override starting life; defaults to the template's maximum.
    #[serde(default)]
    pub life: Option<f32>,
    /// Reserved uid for scripted entities; negative values permitted.
    #[serde(default)]
    pub uid: Option<Uid>,
    #[serde(default)]
    pub selectable: Option<bool>,
}

impl LevelDef {
    /// Validate internal consistency: placements and obstructions in bounds.
    pub fn validate(&self) -> Result<(), String> {
        for cell in &self.obstructed_terrain {
            if cell.x >= self.map_grid_width || cell.y >= self.map_grid_height {
                return Err(format!(
                    "obstruction {:?} outside {}x{} map",
                    cell, self.map_grid_width, self.map_grid_height
                ));
            }
        }
        for placement in &self.placements {
            if placement.x < 0.0
                || placement.y < 0.0
                || placement.x >= self.map_grid_width as f32
                || placement.y >= self.map_grid_height as f32
            {
                return Err(format!(
                    "placement `{}` at ({}, {}) outside {}x{} map",
                    placement.kind,
                    placement.x,
                    placement.y,
                    self.map_grid_width,
                    self.map_grid_height
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_placement() {
        let level = LevelDef {
            name: "test".into(),
            briefing: String::new(),
            map_grid_width: 10,
            map_grid_height: 10,
            obstructed_terrain: vec![],
            start_camera: Cell::new(0, 0),
            cash: HashMap::new(),
            placements: vec![PlacementDef {
                kind: "base".into(),
                team: Team::Blue,
                x: 12.0,
                y: 0.0,
                life: None,
                uid: None,
                selectable: None,
            }],
        };
        assert!(level.validate().is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let json = r#"{
            "name": "plains",
            "map_grid_width": 60,
            "map_grid_height": 40,
            "obstructed_terrain": [{"x": 0, "y": 0}, {"x": 1, "y": 0}],
            "start_camera": {"x": 4, "y": 4},
            "cash": {"blue": 1000, "green": 1000},
            "placements": [
                {"kind": "base", "team": "blue", "x": 11.0, "y": 14.0},
                {"kind": "base", "team": "green", "x": 12.0, "y": 16.0, "life": 50.0}
            ]
        }"#;
        let level: LevelDef = serde_json::from_str(json).expect("level parses");
        assert_eq!(level.map_grid_width, 60);
        assert_eq!(level.placements.len(), 2);
        assert_eq!(level.cash[&Team::Blue], 1000);
        assert!(level.validate().is_ok());
    }
}
