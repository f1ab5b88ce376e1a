#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;

use core_sim::{Simulation, SimulationConfig};
use sim_runtime::{Cell, LevelDef, PlacementDef, Team, Uid};

/// An empty, fully open map with default cash for both teams.
pub fn open_level(width: u32, height: u32) -> LevelDef {
    LevelDef {
        name: "test".into(),
        briefing: String::new(),
        map_grid_width: width,
        map_grid_height: height,
        obstructed_terrain: vec![],
        start_camera: Cell::new(0, 0),
        cash: HashMap::from([(Team::Blue, 1000), (Team::Green, 1000)]),
        placements: vec![],
    }
}

pub fn placement(kind: &str, team: Team, x: f32, y: f32) -> PlacementDef {
    PlacementDef {
        kind: kind.into(),
        team,
        x,
        y,
        life: None,
        uid: None,
        selectable: None,
    }
}

pub fn placement_with_uid(kind: &str, team: Team, x: f32, y: f32, uid: i64) -> PlacementDef {
    PlacementDef {
        uid: Some(Uid(uid)),
        ..placement(kind, team, x, y)
    }
}

pub fn sim_with(level: &LevelDef) -> Simulation {
    Simulation::new(level, SimulationConfig::default()).expect("test level builds")
}

pub fn run_ticks(sim: &mut Simulation, ticks: u64) {
    for _ in 0..ticks {
        sim.logic_tick();
    }
}

/// The bundled skirmish fixture, exercising the serde ingestion path.
pub fn load_skirmish_fixture() -> LevelDef {
    try_load_fixture().expect("skirmish fixture loads")
}

fn try_load_fixture() -> anyhow::Result<LevelDef> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("skirmish_level.json");
    let raw = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}
