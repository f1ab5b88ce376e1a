//! The owning handle for one simulation instance.
//!
//! There is no process-wide game state: a [`Simulation`] owns its Bevy app,
//! its clock, and everything in between, so tests and replays can run any
//! number of instances side by side.

use std::time::{Duration, Instant};

use bevy::prelude::*;
use sim_runtime::{Command, LevelDef, LifeCode, Point, SpawnError, Team, Uid, UnitCategory};

use crate::clock::SimClock;
use crate::level::LevelError;
use crate::orders::{self, CurrentOrder, Order};
use crate::registry::{self, SpawnRequest, UnitRegistry};
use crate::render::{self, Camera, RenderFrame};
use crate::resources::{
    CommandInbox, CommandSender, GameMessage, MessageOutbox, SimulationConfig, SimulationTick,
    Treasury,
};
use crate::templates::UnitCatalog;
use crate::triggers::{TriggerId, TriggerScheduler};
use crate::{build_headless_app, components::{Health, Unit}};

/// UI-facing snapshot of one unit.
#[derive(Debug, Clone)]
pub struct UnitView {
    pub uid: Uid,
    pub kind: String,
    pub category: UnitCategory,
    pub team: Team,
    pub position: Point,
    pub direction: f32,
    pub life: f32,
    pub max_life: f32,
    pub life_code: LifeCode,
    pub order: Order,
    pub selected: bool,
}

/// One complete simulation: authoritative state plus the dual-rate clock.
pub struct Simulation {
    app: App,
    clock: SimClock,
    running: bool,
}

impl Simulation {
    pub fn new(level: &LevelDef, config: SimulationConfig) -> Result<Self, LevelError> {
        let clock = SimClock::new(
            Duration::from_millis(config.tick_period_ms),
            config.max_ticks_per_advance,
            Instant::now(),
        );
        let app = build_headless_app(level, config)?;
        Ok(Self {
            app,
            clock,
            running: true,
        })
    }

    /// Direct world access for scripted setup and tests.
    pub fn world(&mut self) -> &mut World {
        &mut self.app.world
    }

    pub fn tick(&self) -> u64 {
        self.app.world.resource::<SimulationTick>().0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs exactly one fixed logic tick.
    pub fn logic_tick(&mut self) {
        if self.running {
            self.app.update();
        }
    }

    /// Runs however many fixed ticks are due at `now`; returns how many ran.
    /// Simulation state only ever advances in whole ticks.
    pub fn advance(&mut self, now: Instant) -> u32 {
        if !self.running {
            return 0;
        }
        let due = self.clock.ticks_due(now);
        for _ in 0..due {
            self.app.update();
        }
        due
    }

    /// Builds the display snapshot for `now`. Read-only with respect to
    /// entity state; attack indicators decay on this cadence.
    pub fn render_tick(&mut self, now: Instant) -> RenderFrame {
        let interpolation = self.clock.interpolation(now);
        let now_ms = self.clock.elapsed_ms(now);
        render::build_render_frame(&mut self.app.world, interpolation, now_ms)
    }

    /// Render-cadence edge panning; pointer coordinates are viewport pixels.
    pub fn pan_camera(&mut self, pointer_x: f32, pointer_y: f32, inside_viewport: bool) -> bool {
        self.app
            .world
            .resource_mut::<Camera>()
            .pan(pointer_x, pointer_y, inside_viewport)
    }

    pub fn camera_offset(&self) -> (f32, f32) {
        let camera = self.app.world.resource::<Camera>();
        (camera.offset_x, camera.offset_y)
    }

    /// The sole command ingestion point; applied immediately, to completion.
    pub fn process_command(&mut self, uids: &[Uid], command: Command) {
        orders::process_command(&mut self.app.world, uids, &command);
    }

    /// Channel handle for collaborators (input layer, AI) running off-thread;
    /// batches land at the top of the next logic tick.
    pub fn command_sender(&self) -> CommandSender {
        self.app.world.resource::<CommandInbox>().sender()
    }

    pub fn spawn(&mut self, request: SpawnRequest) -> Result<Uid, SpawnError> {
        registry::spawn_unit(&mut self.app.world, request)
    }

    pub fn destroy(&mut self, uid: Uid) {
        registry::destroy_unit(&mut self.app.world, uid);
    }

    pub fn unit_view(&self, uid: Uid) -> Option<UnitView> {
        let world = &self.app.world;
        let entity = world.resource::<UnitRegistry>().find_by_uid(uid)?;
        let unit = world.get::<Unit>(entity)?;
        let health = world.get::<Health>(entity)?;
        let order = world
            .get::<CurrentOrder>(entity)
            .map(|current| current.0.clone())
            .unwrap_or(Order::Stand);
        let damaged_ratio = world.resource::<SimulationConfig>().damaged_ratio;
        Some(UnitView {
            uid,
            kind: unit.kind.clone(),
            category: unit.category,
            team: unit.team,
            position: unit.point(),
            direction: unit.direction,
            life: health.life,
            max_life: health.max_life,
            life_code: health.life_code(damaged_ratio),
            order,
            selected: unit.is_selected(),
        })
    }

    pub fn select(&mut self, uid: Uid, shift: bool) {
        registry::select_unit(&mut self.app.world, uid, shift);
    }

    pub fn clear_selection(&mut self) {
        registry::clear_selection(&mut self.app.world);
    }

    pub fn selected(&self) -> Vec<Uid> {
        self.app
            .world
            .resource::<UnitRegistry>()
            .selection()
            .to_vec()
    }

    pub fn cash(&self, team: Team) -> u32 {
        self.app.world.resource::<Treasury>().cash(team)
    }

    pub fn drain_messages(&mut self) -> Vec<GameMessage> {
        self.app.world.resource_mut::<MessageOutbox>().drain()
    }

    pub fn catalog(&self) -> &UnitCatalog {
        self.app.world.resource::<UnitCatalog>()
    }

    pub fn schedule_timed_trigger(
        &mut self,
        delay_ticks: u64,
        repeating: bool,
        action: impl FnMut(&mut World) + Send + Sync + 'static,
    ) -> TriggerId {
        let now = self.tick();
        self.app
            .world
            .resource_mut::<TriggerScheduler>()
            .schedule_timed(now, delay_ticks, repeating, action)
    }

    pub fn schedule_conditional_trigger(
        &mut self,
        poll_ticks: u64,
        condition: impl Fn(&mut World) -> bool + Send + Sync + 'static,
        action: impl FnMut(&mut World) + Send + Sync + 'static,
    ) -> TriggerId {
        let now = self.tick();
        self.app
            .world
            .resource_mut::<TriggerScheduler>()
            .schedule_conditional(now, poll_ticks, condition, action)
    }

    pub fn cancel_trigger(&mut self, id: TriggerId) {
        self.app
            .world
            .resource_mut::<TriggerScheduler>()
            .cancel(id);
    }

    pub fn pending_triggers(&self) -> usize {
        self.app.world.resource::<TriggerScheduler>().pending()
    }

    /// Stops the loop and cancels every outstanding trigger. Nothing may stay
    /// scheduled after teardown.
    pub fn end(&mut self) {
        self.app
            .world
            .resource_mut::<TriggerScheduler>()
            .clear();
        self.running = false;
        tracing::info!(target: "dustline::sim", tick = self.tick(), "simulation ended");
    }
}
