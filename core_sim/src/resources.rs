use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use sim_runtime::{CommandBatch, Pathfinder, PlacementError, Team, Uid};
use thiserror::Error;

/// Global tuning parameters for one simulation instance.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Logic tick period in milliseconds.
    pub tick_period_ms: u64,
    /// Number of discrete sprite facings.
    pub directions: u32,
    /// Converts template speed into grid units per tick.
    pub speed_adjustment_factor: f32,
    /// Converts template turn speed into facings per tick.
    pub turn_speed_adjustment_factor: f32,
    /// Distance below which a move order counts as arrived.
    pub arrival_epsilon: f32,
    /// Distance below which a projectile detonates.
    pub impact_epsilon: f32,
    /// Life ratio below which a unit reads as damaged.
    pub damaged_ratio: f32,
    /// Attack target highlight lifetime, milliseconds.
    pub attack_indicator_ms: u64,
    /// Pixels per grid cell; only used to translate pixel-flavored template
    /// stats and camera math into grid units.
    pub grid_pixel_size: u32,
    /// Edge panning trigger distance, pixels.
    pub panning_threshold: f32,
    /// Edge panning speed, pixels per render tick.
    pub panning_speed: f32,
    /// Viewport size in pixels, for camera clamping.
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Upper bound on logic ticks run per `advance` call.
    pub max_ticks_per_advance: u32,
    /// Seed for all simulation randomness.
    pub rng_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            directions: 8,
            speed_adjustment_factor: 1.0 / 64.0,
            turn_speed_adjustment_factor: 1.0 / 8.0,
            arrival_epsilon: 0.08,
            impact_epsilon: 0.25,
            damaged_ratio: 0.4,
            attack_indicator_ms: 1000,
            grid_pixel_size: 20,
            panning_threshold: 60.0,
            panning_speed: 10.0,
            viewport_width: 640.0,
            viewport_height: 480.0,
            max_ticks_per_advance: 8,
            rng_seed: 0x00d5_71fe,
        }
    }
}

/// Failure to load a [`SimulationConfig`] override file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SimulationConfig {
    /// Loads overrides from a JSON file; fields the file omits keep their
    /// defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Total logic ticks elapsed.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// Seeded randomness source; the only RNG the simulation touches.
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Per-team cash balances.
#[derive(Resource, Debug, Clone, Default)]
pub struct Treasury {
    balances: HashMap<Team, u32>,
}

impl Treasury {
    pub fn with_balances(balances: HashMap<Team, u32>) -> Self {
        Self { balances }
    }

    pub fn cash(&self, team: Team) -> u32 {
        self.balances.get(&team).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, team: Team, amount: u32) {
        *self.balances.entry(team).or_insert(0) += amount;
    }

    pub fn debit(&mut self, team: Team, amount: u32) -> Result<(), PlacementError> {
        let available = self.cash(team);
        if available < amount {
            return Err(PlacementError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        self.balances.insert(team, available - amount);
        Ok(())
    }
}

/// A `showMessage`-surface line for the UI to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMessage {
    pub speaker: String,
    pub text: String,
}

/// Outbox of pending player-facing messages; the UI drains it each frame.
#[derive(Resource, Debug, Default)]
pub struct MessageOutbox {
    pending: Vec<GameMessage>,
}

impl MessageOutbox {
    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.pending.push(GameMessage {
            speaker: speaker.into(),
            text: text.into(),
        });
    }

    pub fn drain(&mut self) -> Vec<GameMessage> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Transient highlight over the target of an attack command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackIndicator {
    pub target: Uid,
    pub started_ms: u64,
    pub duration_ms: u64,
}

impl AttackIndicator {
    pub fn alpha(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.started_ms);
        if elapsed >= self.duration_ms {
            0.0
        } else {
            1.0 - elapsed as f32 / self.duration_ms as f32
        }
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.duration_ms
    }
}

/// Active attack highlights, decayed on the render cadence.
#[derive(Resource, Debug, Default)]
pub struct AttackIndicators {
    active: Vec<AttackIndicator>,
}

impl AttackIndicators {
    pub fn push(&mut self, target: Uid, started_ms: u64, duration_ms: u64) {
        self.active.push(AttackIndicator {
            target,
            started_ms,
            duration_ms,
        });
    }

    pub fn decay(&mut self, now_ms: u64) {
        self.active.retain(|indicator| !indicator.expired(now_ms));
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttackIndicator> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Clonable handle collaborators use to enqueue command batches.
#[derive(Clone)]
pub struct CommandSender(Sender<CommandBatch>);

impl CommandSender {
    /// Returns false if the simulation side has shut down.
    pub fn send(&self, batch: CommandBatch) -> bool {
        self.0.send(batch).is_ok()
    }
}

/// Single-consumer command channel drained at the top of every logic tick.
///
/// Local input, AI, and scripted triggers all funnel through this one inbox,
/// so command batches are applied one at a time on the simulation thread.
#[derive(Resource)]
pub struct CommandInbox {
    sender: Sender<CommandBatch>,
    receiver: Receiver<CommandBatch>,
}

impl Default for CommandInbox {
    fn default() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }
}

impl CommandInbox {
    pub fn sender(&self) -> CommandSender {
        CommandSender(self.sender.clone())
    }

    pub fn drain(&self) -> Vec<CommandBatch> {
        self.receiver.try_iter().collect()
    }
}

/// Shared handle to the external pathfinder implementation.
#[derive(Resource, Clone)]
pub struct PathfinderHandle(pub Arc<dyn Pathfinder>);

/// Advances the tick counter; runs last in the Update chain.
pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 += 1;
    tracing::trace!(target: "dustline::tick", tick = tick.0, "tick complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treasury_debit_enforces_balance() {
        let mut treasury = Treasury::default();
        treasury.credit(Team::Blue, 1000);
        assert!(treasury.debit(Team::Blue, 400).is_ok());
        assert_eq!(treasury.cash(Team::Blue), 600);

        let err = treasury.debit(Team::Blue, 601).unwrap_err();
        assert_eq!(
            err,
            PlacementError::InsufficientFunds {
                needed: 601,
                available: 600
            }
        );
        assert_eq!(treasury.cash(Team::Blue), 600);
    }

    #[test]
    fn indicator_alpha_fades_to_zero() {
        let indicator = AttackIndicator {
            target: Uid(7),
            started_ms: 1000,
            duration_ms: 1000,
        };
        assert_eq!(indicator.alpha(1000), 1.0);
        assert!((indicator.alpha(1500) - 0.5).abs() < 1e-6);
        assert_eq!(indicator.alpha(2000), 0.0);
        assert!(indicator.expired(2000));
    }

    #[test]
    fn inbox_drains_in_send_order() {
        let inbox = CommandInbox::default();
        let sender = inbox.sender();
        sender.send(CommandBatch::single(
            Uid(1),
            sim_runtime::Command::Move {
                destination: sim_runtime::Point::new(1.0, 1.0),
            },
        ));
        sender.send(CommandBatch::single(
            Uid(2),
            sim_runtime::Command::Move {
                destination: sim_runtime::Point::new(2.0, 2.0),
            },
        ));
        let drained = inbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].uids, vec![Uid(1)]);
        assert_eq!(drained[1].uids, vec![Uid(2)]);
    }
}
