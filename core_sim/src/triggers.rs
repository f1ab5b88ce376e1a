//! Deterministic trigger scheduler.
//!
//! Scripted mission events run off the simulation clock, not wall-clock
//! timers: a priority queue of `(fire_tick, seq)` entries is pumped by the
//! same tick that advances entities, so trigger behavior is replayable. Timed
//! entries re-arm only when marked repeating; conditional entries poll on
//! their own fixed period and disarm on first satisfaction. `clear` cancels
//! everything, and teardown must leave nothing scheduled.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use bevy::prelude::*;

use crate::resources::SimulationTick;

/// Handle for cancelling a scheduled trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(u64);

pub type TriggerAction = Box<dyn FnMut(&mut World) + Send + Sync>;
pub type TriggerCondition = Box<dyn Fn(&mut World) -> bool + Send + Sync>;

enum TriggerKind {
    Timed { period: u64, repeating: bool },
    Conditional {
        poll: u64,
        condition: TriggerCondition,
    },
}

struct TriggerEntry {
    id: TriggerId,
    kind: TriggerKind,
    action: TriggerAction,
}

/// Priority queue of scheduled triggers, owned by the simulation clock.
#[derive(Resource, Default)]
pub struct TriggerScheduler {
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    entries: HashMap<u64, TriggerEntry>,
    next_id: u64,
    next_seq: u64,
}

impl TriggerScheduler {
    /// Fire `action` once `delay` ticks from `now`; re-arm every `delay`
    /// ticks when `repeating`.
    pub fn schedule_timed(
        &mut self,
        now: u64,
        delay: u64,
        repeating: bool,
        action: impl FnMut(&mut World) + Send + Sync + 'static,
    ) -> TriggerId {
        let id = self.fresh_id();
        self.push_entry(
            now + delay,
            TriggerEntry {
                id,
                kind: TriggerKind::Timed {
                    period: delay,
                    repeating,
                },
                action: Box::new(action),
            },
        );
        id
    }

    /// Evaluate `condition` every `poll` ticks; on first satisfaction run
    /// `action` and disarm.
    pub fn schedule_conditional(
        &mut self,
        now: u64,
        poll: u64,
        condition: impl Fn(&mut World) -> bool + Send + Sync + 'static,
        action: impl FnMut(&mut World) + Send + Sync + 'static,
    ) -> TriggerId {
        let id = self.fresh_id();
        self.push_entry(
            now + poll,
            TriggerEntry {
                id,
                kind: TriggerKind::Conditional {
                    poll,
                    condition: Box::new(condition),
                },
                action: Box::new(action),
            },
        );
        id
    }

    pub fn cancel(&mut self, id: TriggerId) {
        self.entries.retain(|_, entry| entry.id != id);
    }

    /// Cancels every outstanding trigger. Required at teardown.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.entries.clear();
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    fn fresh_id(&mut self) -> TriggerId {
        self.next_id += 1;
        TriggerId(self.next_id)
    }

    fn push_entry(&mut self, fire_tick: u64, entry: TriggerEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((fire_tick, seq)));
        self.entries.insert(seq, entry);
    }

    fn take_due(&mut self, now: u64) -> Vec<TriggerEntry> {
        let mut due = Vec::new();
        while let Some(Reverse((fire_tick, seq))) = self.queue.peek().copied() {
            if fire_tick > now {
                break;
            }
            self.queue.pop();
            // Cancelled entries leave a dangling queue slot; skip them.
            if let Some(entry) = self.entries.remove(&seq) {
                due.push(entry);
            }
        }
        due
    }
}

/// Pumps due triggers. Entries are removed from the scheduler before their
/// actions run, so an action may freely schedule or cancel other triggers.
pub fn run_triggers(world: &mut World) {
    let now = world.resource::<SimulationTick>().0;
    let due = world.resource_mut::<TriggerScheduler>().take_due(now);
    if due.is_empty() {
        return;
    }

    let mut rearm = Vec::new();
    for mut entry in due {
        match &entry.kind {
            TriggerKind::Timed { period, repeating } => {
                let (period, repeating) = (*period, *repeating);
                tracing::debug!(target: "dustline::triggers", id = ?entry.id, "timed trigger fired");
                (entry.action)(world);
                if repeating {
                    rearm.push((now + period.max(1), entry));
                }
            }
            TriggerKind::Conditional { poll, condition } => {
                let poll = *poll;
                if condition(world) {
                    tracing::debug!(
                        target: "dustline::triggers",
                        id = ?entry.id,
                        "conditional trigger satisfied"
                    );
                    (entry.action)(world);
                } else {
                    rearm.push((now + poll.max(1), entry));
                }
            }
        }
    }

    let mut scheduler = world.resource_mut::<TriggerScheduler>();
    for (fire_tick, entry) in rearm {
        scheduler.push_entry(fire_tick, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct FireCount(u32);

    fn world_at_tick(tick: u64) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationTick(tick));
        world.insert_resource(TriggerScheduler::default());
        world.insert_resource(FireCount::default());
        world
    }

    fn pump_ticks(world: &mut World, ticks: u64) {
        for _ in 0..ticks {
            let next = world.resource::<SimulationTick>().0 + 1;
            world.resource_mut::<SimulationTick>().0 = next;
            run_triggers(world);
        }
    }

    #[test]
    fn one_shot_timed_trigger_fires_once() {
        let mut world = world_at_tick(0);
        world
            .resource_mut::<TriggerScheduler>()
            .schedule_timed(0, 3, false, |world| {
                world.resource_mut::<FireCount>().0 += 1;
            });

        pump_ticks(&mut world, 10);
        assert_eq!(world.resource::<FireCount>().0, 1);
        assert_eq!(world.resource::<TriggerScheduler>().pending(), 0);
    }

    #[test]
    fn repeating_trigger_rearms_until_cleared() {
        let mut world = world_at_tick(0);
        world
            .resource_mut::<TriggerScheduler>()
            .schedule_timed(0, 2, true, |world| {
                world.resource_mut::<FireCount>().0 += 1;
            });

        pump_ticks(&mut world, 9);
        assert_eq!(world.resource::<FireCount>().0, 4);

        world.resource_mut::<TriggerScheduler>().clear();
        pump_ticks(&mut world, 10);
        assert_eq!(world.resource::<FireCount>().0, 4);
        assert_eq!(world.resource::<TriggerScheduler>().pending(), 0);
    }

    #[test]
    fn conditional_trigger_disarms_on_first_satisfaction() {
        #[derive(Resource)]
        struct Threshold(u64);

        let mut world = world_at_tick(0);
        world.insert_resource(Threshold(5));
        world.resource_mut::<TriggerScheduler>().schedule_conditional(
            0,
            1,
            |world| world.resource::<SimulationTick>().0 >= world.resource::<Threshold>().0,
            |world| {
                world.resource_mut::<FireCount>().0 += 1;
            },
        );

        pump_ticks(&mut world, 20);
        assert_eq!(world.resource::<FireCount>().0, 1);
        assert_eq!(world.resource::<TriggerScheduler>().pending(), 0);
    }

    #[test]
    fn cancelled_trigger_never_fires() {
        let mut world = world_at_tick(0);
        let id = world
            .resource_mut::<TriggerScheduler>()
            .schedule_timed(0, 2, false, |world| {
                world.resource_mut::<FireCount>().0 += 1;
            });
        world.resource_mut::<TriggerScheduler>().cancel(id);

        pump_ticks(&mut world, 5);
        assert_eq!(world.resource::<FireCount>().0, 0);
    }

    #[test]
    fn actions_may_schedule_followup_triggers() {
        let mut world = world_at_tick(0);
        world
            .resource_mut::<TriggerScheduler>()
            .schedule_timed(0, 1, false, |world| {
                world.resource_mut::<FireCount>().0 += 1;
                let now = world.resource::<SimulationTick>().0;
                world
                    .resource_mut::<TriggerScheduler>()
                    .schedule_timed(now, 1, false, |world| {
                        world.resource_mut::<FireCount>().0 += 10;
                    });
            });

        pump_ticks(&mut world, 3);
        assert_eq!(world.resource::<FireCount>().0, 11);
    }
}
