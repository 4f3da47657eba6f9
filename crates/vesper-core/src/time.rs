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

//! Clocks and the timing data carried by simulation events.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A simple stopwatch measuring wall-clock time since it was started.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Stopwatch {
    /// Creates a new stopwatch, started now.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Returns the elapsed time since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the elapsed time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Returns the elapsed time in seconds as `f64`.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Restarts the stopwatch and returns the time elapsed before the restart.
    pub fn restart(&mut self) -> Duration {
        let elapsed = self.elapsed();
        self.start_time = Instant::now();
        elapsed
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// A monotonic time source read by the simulation scheduler.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// The host's monotonic clock, measured from the moment it was created.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    stopwatch: Stopwatch,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.stopwatch.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to the
/// scheduler and keep another to advance it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Creates a clock stopped at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timing data of one variable-rate frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous processed frame.
    pub delta: f32,
    /// Index of this frame, starting at zero.
    pub frame: u64,
    /// Seconds since the simulation started.
    pub elapsed: f64,
}

/// Timing data of one fixed simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedTime {
    /// The constant step length in seconds.
    pub step: f32,
    /// Index of this step, starting at zero.
    pub tick: u64,
    /// Simulated seconds consumed by all steps so far, this one included.
    pub elapsed: f64,
}

impl From<FixedTime> for FrameTime {
    fn from(time: FixedTime) -> Self {
        FrameTime {
            delta: time.step,
            frame: time.tick,
            elapsed: time.elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(20));
        handle.advance(Duration::from_millis(5));
        assert_eq!(clock.now(), Duration::from_millis(25));
        clock.set(Duration::from_secs(1));
        assert_eq!(handle.now(), Duration::from_secs(1));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn stopwatch_restart_resets_origin() {
        let mut watch = Stopwatch::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(watch.elapsed_ms() >= 5);
        let before = watch.restart();
        assert!(before >= Duration::from_millis(5));
        assert!(watch.elapsed() < before + Duration::from_millis(500));
    }

    #[test]
    fn fixed_time_converts_to_frame_time() {
        let fixed = FixedTime {
            step: 0.02,
            tick: 3,
            elapsed: 0.08,
        };
        let frame: FrameTime = fixed.into();
        assert_eq!(frame.delta, 0.02);
        assert_eq!(frame.frame, 3);
    }
}
