// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The fixed + variable rate simulation scheduler.

use crate::config::EngineConfig;
use std::cell::Cell;
use std::time::Duration;
use vesper_core::event::{
    EarlyFixedUpdate, EarlyUpdate, EventBus, FixedUpdate, LateFixedUpdate, LateUpdate,
    MainLoopBegin, MainLoopEnd, PostRender, PreRender, Render, Update,
};
use vesper_core::time::{Clock, FixedTime, FrameTime};
use vesper_core::{EngineError, EngineResult};

/// Default cap on fixed steps per tick.
pub const DEFAULT_MAX_FIXED_STEPS_PER_TICK: u32 = 8;

/// What a single [`Simulation::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Fixed steps dispatched.
    pub fixed_steps: u32,
    /// Whole fixed steps discarded because the per-tick cap was reached.
    pub dropped_steps: u64,
    /// Whether a variable-rate frame was dispatched.
    pub frame_ran: bool,
}

impl TickOutcome {
    /// Returns `true` if the tick dispatched nothing.
    pub fn is_idle(&self) -> bool {
        self.fixed_steps == 0 && !self.frame_ran
    }
}

/// Drives the engine events from a [`Clock`].
///
/// Each [`tick`](Self::tick) first consumes the accumulated time in whole
/// fixed steps, dispatching `EarlyFixedUpdate`, `FixedUpdate` and
/// `LateFixedUpdate` per step. Then, if at least one frame period has passed
/// since the last processed frame, it flushes deferred events and dispatches
/// the eight frame events from `MainLoopBegin` to `MainLoopEnd`.
///
/// A listener error aborts the tick and is returned as is.
pub struct Simulation {
    clock: Box<dyn Clock>,
    fixed_step: Duration,
    frame_period: Duration,
    max_fixed_steps_per_tick: u32,

    start: Duration,
    accumulator: Cell<Duration>,
    last_tick: Cell<Duration>,
    last_frame: Cell<Duration>,
    fixed_ticks: Cell<u64>,
    frames: Cell<u64>,
    ticking: Cell<bool>,
}

impl Simulation {
    /// Creates a scheduler starting at the clock's current time.
    ///
    /// Fails with [`EngineError::Config`] if either duration is zero.
    pub fn new(
        clock: Box<dyn Clock>,
        fixed_step: Duration,
        frame_period: Duration,
    ) -> EngineResult<Self> {
        if fixed_step.is_zero() || frame_period.is_zero() {
            return Err(EngineError::Config(
                "fixed step and frame period must be positive".to_owned(),
            ));
        }
        let start = clock.now();
        Ok(Self {
            clock,
            fixed_step,
            frame_period,
            max_fixed_steps_per_tick: DEFAULT_MAX_FIXED_STEPS_PER_TICK,
            start,
            accumulator: Cell::new(Duration::ZERO),
            last_tick: Cell::new(start),
            last_frame: Cell::new(start),
            fixed_ticks: Cell::new(0),
            frames: Cell::new(0),
            ticking: Cell::new(false),
        })
    }

    /// Creates a scheduler with the rates of `config`.
    pub fn from_config(config: &EngineConfig, clock: Box<dyn Clock>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::new(clock, config.fixed_step(), config.frame_period())?
            .with_max_fixed_steps_per_tick(config.max_fixed_steps_per_tick))
    }

    /// Sets the number of fixed steps run at most per tick. Clamped to at least one.
    pub fn with_max_fixed_steps_per_tick(mut self, max: u32) -> Self {
        self.max_fixed_steps_per_tick = max.max(1);
        self
    }

    /// The length of one fixed step.
    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    /// The minimum time between two processed frames.
    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    /// Fixed steps dispatched so far.
    pub fn fixed_tick_count(&self) -> u64 {
        self.fixed_ticks.get()
    }

    /// Frames dispatched so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }

    /// Time left until the next fixed step or frame is due.
    pub fn time_until_next(&self) -> Duration {
        let now = self.clock.now();
        let pending = self.accumulator.get() + now.saturating_sub(self.last_tick.get());
        let until_step = self.fixed_step.saturating_sub(pending);
        let until_frame = self
            .frame_period
            .saturating_sub(now.saturating_sub(self.last_frame.get()));
        until_step.min(until_frame)
    }

    /// Advances the simulation to the clock's current time.
    ///
    /// Calling `tick` from inside one of its own listeners fails with
    /// [`EngineError::ReentrantAccess`].
    pub fn tick(&self, bus: &EventBus) -> EngineResult<TickOutcome> {
        if self.ticking.replace(true) {
            return Err(EngineError::ReentrantAccess {
                type_name: std::any::type_name::<Self>(),
            });
        }
        let result = self.advance(bus);
        self.ticking.set(false);
        result
    }

    fn advance(&self, bus: &EventBus) -> EngineResult<TickOutcome> {
        let now = self.clock.now();
        let mut outcome = TickOutcome::default();

        let mut accumulator = self.accumulator.get() + now.saturating_sub(self.last_tick.get());
        self.last_tick.set(now);

        while accumulator >= self.fixed_step && outcome.fixed_steps < self.max_fixed_steps_per_tick {
            accumulator -= self.fixed_step;
            self.accumulator.set(accumulator);
            self.run_fixed_step(bus)?;
            outcome.fixed_steps += 1;
        }
        if accumulator >= self.fixed_step {
            let step = self.fixed_step.as_nanos();
            let behind = accumulator.as_nanos();
            let dropped = u64::try_from(behind / step).unwrap_or(u64::MAX);
            accumulator = nanos_to_duration(behind % step);
            outcome.dropped_steps = dropped;
            log::warn!(
                "Simulation fell behind: dropped {dropped} fixed step(s) after running {}",
                outcome.fixed_steps
            );
        }
        self.accumulator.set(accumulator);

        let since_frame = now.saturating_sub(self.last_frame.get());
        if since_frame >= self.frame_period {
            self.last_frame.set(now);
            let time = FrameTime {
                delta: since_frame.as_secs_f32(),
                frame: self.frames.get(),
                elapsed: now.saturating_sub(self.start).as_secs_f64(),
            };
            self.frames.set(self.frames.get() + 1);
            self.run_frame(bus, time)?;
            outcome.frame_ran = true;
        }
        Ok(outcome)
    }

    fn run_fixed_step(&self, bus: &EventBus) -> EngineResult<()> {
        let tick = self.fixed_ticks.get();
        self.fixed_ticks.set(tick + 1);
        let step = self.fixed_step.as_secs_f64();
        let time = FixedTime {
            step: step as f32,
            tick,
            elapsed: (tick + 1) as f64 * step,
        };
        log::trace!("Fixed step {tick}");

        bus.dispatch(&EarlyFixedUpdate(time))?;
        bus.dispatch(&FixedUpdate(time))?;
        bus.dispatch(&LateFixedUpdate(time))
    }

    fn run_frame(&self, bus: &EventBus, time: FrameTime) -> EngineResult<()> {
        let flushed = bus.flush_deferred()?;
        if flushed > 0 {
            log::trace!("Flushed {flushed} deferred event(s)");
        }

        bus.dispatch(&MainLoopBegin(time))?;
        bus.dispatch(&EarlyUpdate(time))?;
        bus.dispatch(&Update(time))?;
        bus.dispatch(&LateUpdate(time))?;
        bus.dispatch(&PreRender(time))?;
        bus.dispatch(&Render(time))?;
        bus.dispatch(&PostRender(time))?;
        bus.dispatch(&MainLoopEnd(time))
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("fixed_step", &self.fixed_step)
            .field("frame_period", &self.frame_period)
            .field("max_fixed_steps_per_tick", &self.max_fixed_steps_per_tick)
            .field("fixed_ticks", &self.fixed_ticks.get())
            .field("frames", &self.frames.get())
            .finish()
    }
}

/// Converts a nanosecond count below `u64::MAX` seconds into a [`Duration`].
fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new(
        u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX),
        (nanos % NANOS_PER_SEC) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vesper_core::event::{Event, EventKind};
    use vesper_core::time::ManualClock;

    const STEP: Duration = Duration::from_millis(20);
    const FRAME: Duration = Duration::from_nanos(16_666_667);

    type Trace = Rc<RefCell<Vec<&'static str>>>;

    fn trace<T: Event>(bus: &EventBus, trace: &Trace, label: &'static str) {
        let trace = trace.clone();
        bus.subscribe(move |_: &T| {
            trace.borrow_mut().push(label);
            Ok(())
        });
    }

    fn simulation(clock: &ManualClock) -> Simulation {
        Simulation::new(Box::new(clock.clone()), STEP, FRAME).unwrap()
    }

    #[test]
    fn idle_until_time_passes() {
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();

        assert!(sim.tick(&bus).unwrap().is_idle());

        clock.advance(Duration::from_millis(10));
        assert!(sim.tick(&bus).unwrap().is_idle());
        assert_eq!(sim.time_until_next(), Duration::from_nanos(6_666_667));
    }

    #[test]
    fn fixed_steps_precede_update_which_precedes_render() {
        // --- 1. SETUP ---
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();
        let log = Trace::default();
        // Subscribed in reverse so ordering comes from the scheduler, not the bus.
        trace::<Render>(&bus, &log, "render");
        trace::<Update>(&bus, &log, "update");
        trace::<FixedUpdate>(&bus, &log, "fixed");

        // --- 2. ACTION ---
        clock.advance(Duration::from_millis(45));
        let outcome = sim.tick(&bus).unwrap();

        // --- 3. ASSERTIONS ---
        assert_eq!(outcome.fixed_steps, 2);
        assert!(outcome.frame_ran);
        assert_eq!(*log.borrow(), ["fixed", "fixed", "update", "render"]);
    }

    #[test]
    fn frame_events_run_in_documented_order() {
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();
        let log = Trace::default();
        trace::<MainLoopEnd>(&bus, &log, "MainLoopEnd");
        trace::<PostRender>(&bus, &log, "PostRender");
        trace::<Render>(&bus, &log, "Render");
        trace::<PreRender>(&bus, &log, "PreRender");
        trace::<LateUpdate>(&bus, &log, "LateUpdate");
        trace::<Update>(&bus, &log, "Update");
        trace::<EarlyUpdate>(&bus, &log, "EarlyUpdate");
        trace::<MainLoopBegin>(&bus, &log, "MainLoopBegin");
        trace::<LateFixedUpdate>(&bus, &log, "LateFixedUpdate");
        trace::<FixedUpdate>(&bus, &log, "FixedUpdate");
        trace::<EarlyFixedUpdate>(&bus, &log, "EarlyFixedUpdate");

        clock.advance(STEP);
        sim.tick(&bus).unwrap();

        let expected: Vec<&str> = vesper_core::event::FIXED_STEP_ORDER
            .iter()
            .chain(vesper_core::event::FRAME_ORDER.iter())
            .map(|kind| match kind {
                EventKind::EarlyFixedUpdate => "EarlyFixedUpdate",
                EventKind::FixedUpdate => "FixedUpdate",
                EventKind::LateFixedUpdate => "LateFixedUpdate",
                EventKind::MainLoopBegin => "MainLoopBegin",
                EventKind::EarlyUpdate => "EarlyUpdate",
                EventKind::Update => "Update",
                EventKind::LateUpdate => "LateUpdate",
                EventKind::PreRender => "PreRender",
                EventKind::Render => "Render",
                EventKind::PostRender => "PostRender",
                EventKind::MainLoopEnd => "MainLoopEnd",
                other => panic!("unexpected kind {other:?}"),
            })
            .collect();
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn exact_fixed_step_ticks_run_one_step_and_one_frame_each() {
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();

        for _ in 0..25 {
            clock.advance(STEP);
            let outcome = sim.tick(&bus).unwrap();
            assert_eq!(outcome.fixed_steps, 1);
            assert!(outcome.frame_ran);
        }
        assert_eq!(sim.fixed_tick_count(), 25);
        assert_eq!(sim.frame_count(), 25);
    }

    #[test]
    fn catch_up_is_capped_and_excess_dropped() {
        let clock = ManualClock::new();
        let sim = simulation(&clock).with_max_fixed_steps_per_tick(3);
        let bus = EventBus::new();

        clock.advance(STEP * 10 + Duration::from_millis(5));
        let outcome = sim.tick(&bus).unwrap();

        assert_eq!(outcome.fixed_steps, 3);
        assert_eq!(outcome.dropped_steps, 7);
        // The 5ms remainder is kept: 15ms more completes the next step.
        clock.advance(Duration::from_millis(15));
        assert_eq!(sim.tick(&bus).unwrap().fixed_steps, 1);
    }

    #[test]
    fn long_stall_with_a_tiny_step_drops_every_missed_step() {
        let clock = ManualClock::new();
        let sim = Simulation::new(Box::new(clock.clone()), Duration::from_nanos(1), FRAME)
            .unwrap()
            .with_max_fixed_steps_per_tick(1);
        let bus = EventBus::new();

        // Ten seconds of 1ns steps is more than `u32::MAX` steps.
        clock.advance(Duration::from_secs(10));
        let outcome = sim.tick(&bus).unwrap();
        assert_eq!(outcome.fixed_steps, 1);
        assert_eq!(outcome.dropped_steps, 9_999_999_999);

        // Nothing is left over for the next tick.
        let outcome = sim.tick(&bus).unwrap();
        assert_eq!(outcome.fixed_steps, 0);
        assert_eq!(outcome.dropped_steps, 0);
    }

    #[test]
    fn deferred_events_are_flushed_before_the_frame() {
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();
        let log = Trace::default();
        trace::<MainLoopBegin>(&bus, &log, "begin");
        trace::<vesper_core::event::WindowClosed>(&bus, &log, "deferred");

        let sender = bus.deferred_sender();
        std::thread::spawn(move || sender.post(vesper_core::event::WindowClosed))
            .join()
            .unwrap();
        assert_eq!(bus.pending_deferred(), 1);

        clock.advance(FRAME);
        sim.tick(&bus).unwrap();
        assert_eq!(*log.borrow(), ["deferred", "begin"]);
    }

    #[test]
    fn listener_error_aborts_the_tick() {
        let clock = ManualClock::new();
        let sim = simulation(&clock);
        let bus = EventBus::new();
        let log = Trace::default();
        bus.subscribe(|_: &Update| Err(anyhow::anyhow!("boom").into()));
        trace::<Render>(&bus, &log, "render");

        clock.advance(STEP);
        assert!(matches!(sim.tick(&bus), Err(EngineError::Other(_))));
        assert!(log.borrow().is_empty());

        // The scheduler itself is still usable.
        bus.clear();
        clock.advance(STEP);
        assert!(sim.tick(&bus).is_ok());
    }

    #[test]
    fn reentrant_tick_is_rejected() {
        let clock = ManualClock::new();
        let sim = Rc::new(simulation(&clock));
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(None));

        let (inner_sim, inner_bus, inner_seen) = (sim.clone(), Rc::downgrade(&bus), seen.clone());
        bus.subscribe(move |_: &Update| {
            if let Some(bus) = inner_bus.upgrade() {
                *inner_seen.borrow_mut() = Some(inner_sim.tick(&bus).is_err());
            }
            Ok(())
        });

        clock.advance(STEP);
        sim.tick(&bus).unwrap();
        assert_eq!(*seen.borrow(), Some(true));
    }

    #[test]
    fn zero_rates_are_rejected() {
        let clock = ManualClock::new();
        assert!(Simulation::new(Box::new(clock.clone()), Duration::ZERO, FRAME).is_err());
        let config = EngineConfig {
            target_frame_rate: 0,
            ..EngineConfig::default()
        };
        assert!(Simulation::from_config(&config, Box::new(clock)).is_err());
    }
}
