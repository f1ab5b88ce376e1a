mod common;

use core_sim::{Combat, Order, UnitRegistry};
use sim_runtime::{Command, Team, Uid};

/// Two tanks, one per team, in range with clear line of sight: the attack
/// order resets the shooter's reload timer and the victim's life strictly
/// decreases within a reload cycle.
#[test]
fn attack_fires_and_damages_target() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 10.0, 10.0));
    level
        .placements
        .push(common::placement("scout-tank", Team::Green, 12.0, 10.0));

    let mut sim = common::sim_with(&level);
    let attacker = Uid(1);
    let victim = Uid(2);
    let starting_life = sim.unit_view(victim).unwrap().life;

    sim.process_command(&[attacker], Command::Attack { target: victim });
    assert!(matches!(
        sim.unit_view(attacker).unwrap().order,
        Order::Attack { .. }
    ));

    let mut saw_reload_reset = false;
    let mut damage_tick = None;
    for tick in 0..60 {
        sim.logic_tick();
        let reload_left = {
            let world = sim.world();
            let entity = world
                .resource::<UnitRegistry>()
                .find_by_uid(attacker)
                .expect("attacker alive");
            world.get::<Combat>(entity).expect("attacker armed").reload_left
        };
        if reload_left > 0 {
            saw_reload_reset = true;
        }
        let life = sim.unit_view(victim).map(|view| view.life);
        if life.map_or(true, |life| life < starting_life) {
            damage_tick = Some(tick);
            break;
        }
    }

    assert!(saw_reload_reset, "reload timer never reset");
    assert!(
        damage_tick.is_some(),
        "victim life never decreased within 60 ticks"
    );
}

/// Attacking a uid that does not exist is a complete no-op: no entity's
/// orders change.
#[test]
fn attack_on_missing_uid_changes_nothing() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 5.0, 5.0));
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 7.0, 5.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(&[Uid(1), Uid(2)], Command::Attack { target: Uid(999) });

    for uid in [Uid(1), Uid(2)] {
        assert_eq!(sim.unit_view(uid).unwrap().order, Order::Stand);
    }
}

/// Same-team attacks are capability-filtered into silence.
#[test]
fn friendly_fire_is_rejected() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 5.0, 5.0));
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 7.0, 5.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(&[Uid(1)], Command::Attack { target: Uid(2) });
    assert_eq!(sim.unit_view(Uid(1)).unwrap().order, Order::Stand);
}

/// A land-only weapon cannot be ordered onto an aircraft.
#[test]
fn capability_mismatch_is_rejected() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("scout-tank", Team::Blue, 5.0, 5.0));
    level
        .placements
        .push(common::placement("wraith", Team::Green, 8.0, 5.0));

    let mut sim = common::sim_with(&level);
    sim.process_command(&[Uid(1)], Command::Attack { target: Uid(2) });
    assert_eq!(sim.unit_view(Uid(1)).unwrap().order, Order::Stand);

    // The wraith's anti-air weapon cannot engage the tank either.
    sim.process_command(&[Uid(2)], Command::Attack { target: Uid(1) });
    assert_eq!(sim.unit_view(Uid(2)).unwrap().order, Order::Stand);
}

/// A fight to the death: the loser is removed from every index within a
/// tick of dying, and the attack order collapses back to standing.
#[test]
fn destroyed_target_reverts_attacker_to_stand() {
    let mut level = common::open_level(30, 30);
    level
        .placements
        .push(common::placement("heavy-tank", Team::Blue, 10.0, 10.0));
    // Start the victim nearly dead so the scenario stays short.
    let mut victim = common::placement("scout-tank", Team::Green, 12.0, 10.0);
    victim.life = Some(3.0);
    level.placements.push(victim);

    let mut sim = common::sim_with(&level);
    sim.process_command(&[Uid(1)], Command::Attack { target: Uid(2) });

    let mut died_at = None;
    for tick in 0..120 {
        sim.logic_tick();
        if sim.unit_view(Uid(2)).is_none() {
            died_at = Some(tick);
            break;
        }
    }
    assert!(died_at.is_some(), "victim survived 120 ticks");

    // One more tick for the attacker to notice its target is gone.
    sim.logic_tick();
    assert_eq!(sim.unit_view(Uid(1)).unwrap().order, Order::Stand);
    assert!(!sim
        .world()
        .resource::<UnitRegistry>()
        .render_order()
        .contains(&Uid(2)));
}
