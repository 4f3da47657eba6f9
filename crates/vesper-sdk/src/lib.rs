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

//! The public-facing SDK of the Vesper engine.
//!
//! [`Engine`] boots the subsystems through their installers, hands the
//! service container to the application once, then ticks the simulation until
//! the window closes.
//!
//! ```no_run
//! use vesper_sdk::prelude::*;
//!
//! let code = Engine::new(EngineConfig::default()).run(|services| {
//!     let scenes = services.resolve::<SceneManager>()?;
//!     let scene = scenes.create_scene("Main")?;
//!     scenes.with_scene(scene, |scene| scene.create_game_object(None, Some("Camera")))??;
//!     Ok(())
//! });
//! std::process::exit(code);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod installers;
pub mod logging;
pub mod simulation;
pub mod window;

use crate::config::EngineConfig;
use crate::installers::{
    ConfigInstaller, EventsInstaller, LoggingInstaller, SceneInstaller, SimulationInstaller,
    WindowInstaller,
};
use crate::simulation::Simulation;
use crate::window::{WindowBackend, WindowService};
use anyhow::Context;
use std::time::Duration;
use vesper_core::event::EventBus;
use vesper_core::services::{Installer, InstallerStack, ServiceContainer};
use vesper_core::time::Clock;
use vesper_core::Stopwatch;

/// Longest sleep taken when a main-loop iteration had nothing to do.
const MAX_IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::config::{EngineConfig, WindowConfig};
    pub use crate::simulation::{Simulation, TickOutcome};
    pub use crate::window::{HeadlessWindow, WindowBackend, WindowService};
    pub use crate::Engine;
    pub use vesper_core::event::{
        Event, EventBus, EventKind, FixedUpdate, MainLoopEnd, Render, Update, WindowClosed,
    };
    pub use vesper_core::math::{Mat4, Quaternion, Vec3};
    pub use vesper_core::resource::Resource;
    pub use vesper_core::services::{Factory, Installer, ServiceContainer};
    pub use vesper_core::time::{FixedTime, FrameTime};
    pub use vesper_core::{EngineError, EngineResult, Identifier};
    pub use vesper_data::scene::{
        Camera, Component, ComponentContext, ComponentHooks, GameObject, Scene, SceneManager,
        Transform,
    };
}

/// Configures and runs the engine.
pub struct Engine {
    config: EngineConfig,
    clock: Option<Box<dyn Clock>>,
    window: Option<Box<dyn WindowBackend>>,
    installers: Vec<Box<dyn Installer>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an engine with `config`, the system clock and a headless window.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: None,
            window: None,
            installers: Vec::new(),
        }
    }

    /// Drives the simulation from `clock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Uses `backend` as the window.
    pub fn with_window(mut self, backend: Box<dyn WindowBackend>) -> Self {
        self.window = Some(backend);
        self
    }

    /// Adds an application installer. Application installers run after the
    /// scene installer and before the simulation installer, in push order.
    pub fn with_installer(mut self, installer: Box<dyn Installer>) -> Self {
        self.installers.push(installer);
        self
    }

    /// Runs the engine to completion and returns the process exit code.
    ///
    /// `on_init` is called once, after every installer ran and before the
    /// first tick. Any error, from `on_init` or from the main loop, is logged
    /// and turns into exit code `1`. Installed services are uninstalled in
    /// every case.
    pub fn run<F>(self, on_init: F) -> i32
    where
        F: FnOnce(&ServiceContainer) -> anyhow::Result<()>,
    {
        match self.try_run(on_init) {
            Ok(frames) => {
                log::info!("Engine stopped after {frames} frame(s)");
                0
            }
            Err(e) => {
                log::error!("Engine terminated with an error: {e:?}");
                1
            }
        }
    }

    /// Like [`run`](Self::run), but returns the error and the frame count.
    pub fn try_run<F>(self, on_init: F) -> anyhow::Result<u64>
    where
        F: FnOnce(&ServiceContainer) -> anyhow::Result<()>,
    {
        let mut stack = self.boot_stack();
        let mut services = ServiceContainer::new();
        stack
            .install_all(&mut services)
            .context("failed to install engine services")?;
        log::info!("Engine started with {} service(s)", services.len());

        let result = on_init(&services)
            .context("application initialization failed")
            .and_then(|()| main_loop(&services));

        log::info!("Shutting down...");
        let uninstalled = stack
            .uninstall_all(&mut services)
            .context("failed to uninstall engine services");

        let frames = result?;
        uninstalled?;
        Ok(frames)
    }

    fn boot_stack(self) -> InstallerStack {
        let mut stack = InstallerStack::new();
        stack.push(Box::new(LoggingInstaller::new(self.config.log_filter.clone())));
        stack.push(Box::new(ConfigInstaller::new(self.config)));
        stack.push(Box::new(EventsInstaller));
        stack.push(Box::new(match self.window {
            Some(backend) => WindowInstaller::with_backend(backend),
            None => WindowInstaller::default(),
        }));
        stack.push(Box::new(SceneInstaller::default()));
        for installer in self.installers {
            stack.push(installer);
        }
        stack.push(Box::new(match self.clock {
            Some(clock) => SimulationInstaller::with_clock(clock),
            None => SimulationInstaller::default(),
        }));
        stack
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("custom_clock", &self.clock.is_some())
            .field("custom_window", &self.window.is_some())
            .field("installers", &self.installers.len())
            .finish()
    }
}

/// Polls the window and ticks the simulation until the window closes.
fn main_loop(services: &ServiceContainer) -> anyhow::Result<u64> {
    let bus = services.resolve::<EventBus>()?;
    let window = services.resolve::<WindowService>()?;
    let simulation = services.resolve::<Simulation>()?;
    let uptime = Stopwatch::new();

    while window.poll(&bus)? {
        let outcome = simulation.tick(&bus).with_context(|| {
            format!("simulation failed at frame {}", simulation.frame_count())
        })?;
        if outcome.is_idle() {
            std::thread::sleep(simulation.time_until_next().min(MAX_IDLE_SLEEP));
        }
    }

    log::info!(
        "Main loop ran {} frame(s) and {} fixed step(s) in {:.2}s",
        simulation.frame_count(),
        simulation.fixed_tick_count(),
        uptime.elapsed_secs_f64()
    );
    Ok(simulation.frame_count())
}
