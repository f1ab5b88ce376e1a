//! Headless demo runner: builds a skirmish level, drives the dual-rate loop
//! for a fixed number of ticks, and logs what the simulation does.
//!
//! Usage: `headless [ticks]` (default 100). Log verbosity via `RUST_LOG`.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use core_sim::{Simulation, SimulationConfig};
use sim_runtime::{Cell, Command, LevelDef, PlacementDef, Point, Team, Uid};

fn skirmish_level() -> LevelDef {
    LevelDef {
        name: "skirmish".into(),
        briefing: "Open plains; two bases and a handful of tanks.".into(),
        map_grid_width: 60,
        map_grid_height: 40,
        obstructed_terrain: vec![
            Cell::new(20, 10),
            Cell::new(20, 11),
            Cell::new(21, 10),
            Cell::new(21, 11),
        ],
        start_camera: Cell::new(4, 4),
        cash: HashMap::from([(Team::Blue, 1000), (Team::Green, 1000)]),
        placements: vec![
            PlacementDef {
                kind: "base".into(),
                team: Team::Blue,
                x: 11.0,
                y: 14.0,
                life: None,
                uid: Some(Uid(-1)),
                selectable: None,
            },
            PlacementDef {
                kind: "base".into(),
                team: Team::Green,
                x: 40.0,
                y: 20.0,
                life: None,
                uid: None,
                selectable: None,
            },
            PlacementDef {
                kind: "scout-tank".into(),
                team: Team::Blue,
                x: 14.0,
                y: 16.0,
                life: None,
                uid: None,
                selectable: None,
            },
            PlacementDef {
                kind: "heavy-tank".into(),
                team: Team::Green,
                x: 38.0,
                y: 22.0,
                life: None,
                uid: None,
                selectable: None,
            },
            PlacementDef {
                kind: "oilfield".into(),
                team: Team::Green,
                x: 30.0,
                y: 30.0,
                life: None,
                uid: None,
                selectable: None,
            },
        ],
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ticks: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(100);

    let config = match std::env::var_os("DUSTLINE_CONFIG") {
        Some(path) => SimulationConfig::from_json_file(std::path::Path::new(&path))
            .expect("config override parses"),
        None => SimulationConfig::default(),
    };
    let tick_period = Duration::from_millis(config.tick_period_ms);
    let mut sim = Simulation::new(&skirmish_level(), config).expect("demo level is valid");

    info!(target: "dustline::headless", ticks, "Dustline headless run starting");

    // Send the blue scout toward the green base to make the log interesting.
    let scout = Uid(2);
    sim.process_command(
        &[scout],
        Command::Move {
            destination: Point::new(36.0, 20.0),
        },
    );

    let started = Instant::now();
    while sim.tick() < ticks {
        let now = Instant::now();
        let ran = sim.advance(now);
        let frame = sim.render_tick(now);
        if ran > 0 && sim.tick() % 10 == 0 {
            info!(
                target: "dustline::headless",
                tick = frame.tick,
                entities = frame.items.len(),
                interpolation = frame.interpolation,
                cash_blue = sim.cash(Team::Blue),
                "tick summary"
            );
        }
        for message in sim.drain_messages() {
            info!(
                target: "dustline::headless",
                speaker = %message.speaker,
                text = %message.text,
                "game message"
            );
        }
        // Render faster than logic to exercise interpolation.
        thread::sleep(tick_period / 4);
    }

    if let Some(view) = sim.unit_view(scout) {
        info!(
            target: "dustline::headless",
            position = ?view.position,
            order = ?view.order,
            "scout final state"
        );
    }

    sim.end();
    info!(
        target: "dustline::headless",
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run complete"
    );
}
