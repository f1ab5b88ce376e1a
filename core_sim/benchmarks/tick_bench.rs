use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, Criterion};

use core_sim::{build_headless_app, run_tick, SimulationConfig};
use sim_runtime::{Cell, LevelDef, PlacementDef, Team};

fn crowded_level() -> LevelDef {
    let mut placements = vec![
        PlacementDef {
            kind: "base".into(),
            team: Team::Blue,
            x: 5.0,
            y: 5.0,
            life: None,
            uid: None,
            selectable: None,
        },
        PlacementDef {
            kind: "base".into(),
            team: Team::Green,
            x: 50.0,
            y: 32.0,
            life: None,
            uid: None,
            selectable: None,
        },
    ];
    for i in 0..40 {
        placements.push(PlacementDef {
            kind: if i % 2 == 0 { "scout-tank" } else { "heavy-tank" }.into(),
            team: if i % 2 == 0 { Team::Blue } else { Team::Green },
            x: 8.0 + (i % 10) as f32 * 4.0,
            y: 10.0 + (i / 10) as f32 * 6.0,
            life: None,
            uid: None,
            selectable: None,
        });
    }
    LevelDef {
        name: "bench".into(),
        briefing: String::new(),
        map_grid_width: 60,
        map_grid_height: 40,
        obstructed_terrain: vec![],
        start_camera: Cell::new(0, 0),
        cash: HashMap::from([(Team::Blue, 10_000), (Team::Green, 10_000)]),
        placements,
    }
}

fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("logic_tick_42_entities", |b| {
        let mut app = build_headless_app(&crowded_level(), SimulationConfig::default())
            .expect("bench level builds");
        b.iter(|| run_tick(&mut app));
    });
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
