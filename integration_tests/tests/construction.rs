mod common;

use core_sim::UnitRegistry;
use sim_runtime::{Cell, Command, Team, Uid, UnitCategory};

/// A starport assembles a scout tank: cash is debited up front, the
/// producer is unselectable mid-action, and the tank appears at the pad.
#[test]
fn starport_constructs_a_unit() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("starport", Team::Blue, 10.0, 10.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(
        &[Uid(1)],
        Command::ConstructUnit {
            kind: "scout-tank".into(),
        },
    );
    sim.logic_tick();
    assert_eq!(sim.cash(Team::Blue), 500);

    // Mid-action the producer refuses selection.
    sim.select(Uid(1), false);
    assert!(sim.selected().is_empty());

    common::run_ticks(&mut sim, 25);
    let vehicles = sim
        .world()
        .resource::<UnitRegistry>()
        .category(UnitCategory::Vehicle)
        .len();
    assert_eq!(vehicles, 1, "scout tank should have rolled out");

    // Once idle again the starport is selectable.
    sim.select(Uid(1), false);
    assert_eq!(sim.selected(), vec![Uid(1)]);
}

/// Ordering a unit the team cannot afford surfaces a player message and
/// leaves the simulation untouched.
#[test]
fn construction_without_funds_is_refused() {
    let mut level = common::open_level(30, 30);
    level.cash.insert(Team::Blue, 100);
    level
        .placements
        .push(common::placement("starport", Team::Blue, 10.0, 10.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(
        &[Uid(1)],
        Command::ConstructUnit {
            kind: "heavy-tank".into(),
        },
    );
    sim.logic_tick();

    assert_eq!(sim.cash(Team::Blue), 100);
    let messages = sim.drain_messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.contains("heavy-tank"));
    assert!(sim
        .world()
        .resource::<UnitRegistry>()
        .category(UnitCategory::Vehicle)
        .is_empty());
}

/// Building placement honors the fog of war: ground the team has never
/// seen is rejected, ground inside its own sight is accepted.
#[test]
fn building_placement_respects_fog() {
    let mut level = common::open_level(40, 40);
    level
        .placements
        .push(common::placement("base", Team::Blue, 10.0, 10.0));

    let mut sim = common::sim_with(&level);

    // Far corner, never scouted: refused with a message, cash unchanged.
    sim.process_command(
        &[Uid(1)],
        Command::ConstructBuilding {
            kind: "ground-turret".into(),
            origin: Cell::new(35, 35),
        },
    );
    sim.logic_tick();
    assert_eq!(sim.cash(Team::Blue), 1000);
    assert!(!sim.drain_messages().is_empty());

    // Right next to the base, inside its sight: accepted and erected.
    level.cash.insert(Team::Blue, 2000);
    let mut sim = common::sim_with(&level);
    sim.process_command(
        &[Uid(1)],
        Command::ConstructBuilding {
            kind: "ground-turret".into(),
            origin: Cell::new(12, 10),
        },
    );
    sim.logic_tick();
    assert_eq!(sim.cash(Team::Blue), 500);

    common::run_ticks(&mut sim, 80);
    let buildings = sim
        .world()
        .resource::<UnitRegistry>()
        .category(UnitCategory::Building)
        .len();
    assert_eq!(buildings, 2, "turret should stand next to the base");
}

/// A harvester deploys onto an oilfield and is atomically replaced by a
/// refinery building on the same site.
#[test]
fn harvester_deploys_into_refinery() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("harvester", Team::Blue, 10.0, 10.0));
    level
        .placements
        .push(common::placement("oilfield", Team::Blue, 11.0, 10.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(&[Uid(1)], Command::Deploy { target: Uid(2) });

    common::run_ticks(&mut sim, 2);
    // Mid-deploy the harvester refuses selection.
    sim.select(Uid(1), false);
    assert!(sim.selected().is_empty());

    common::run_ticks(&mut sim, 30);
    assert!(sim.unit_view(Uid(1)).is_none(), "harvester consumed");

    let registry = sim.world().resource::<UnitRegistry>();
    assert_eq!(registry.category(UnitCategory::Building).len(), 1);
    assert_eq!(registry.category(UnitCategory::Vehicle).len(), 0);
    drop(registry);

    let refinery = sim.unit_view(Uid(3)).expect("refinery spawned");
    assert_eq!(refinery.kind, "refinery");
    assert_eq!(refinery.team, Team::Blue);
    assert_eq!((refinery.position.x, refinery.position.y), (11.0, 10.0));
}
