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

//! The built-in installers, one per engine subsystem.
//!
//! [`Engine`](crate::Engine) pushes them in boot order: logging, config,
//! events, window, scene, then user installers, then simulation.

use crate::config::EngineConfig;
use crate::logging;
use crate::simulation::Simulation;
use crate::window::{HeadlessWindow, WindowBackend, WindowService};
use vesper_core::event::{EventBus, EventKind};
use vesper_core::services::{Installer, ServiceContainer};
use vesper_core::time::{Clock, SystemClock};
use vesper_core::{EngineResult, Identifier};
use vesper_data::scene::SceneManager;

/// Installs the global logger. Registers no service.
#[derive(Debug, Clone)]
pub struct LoggingInstaller {
    filter: String,
}

impl LoggingInstaller {
    /// `filter` is used when `RUST_LOG` is not set.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
        }
    }
}

impl Installer for LoggingInstaller {
    fn name(&self) -> &str {
        "logging"
    }

    fn install(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
        if !logging::init(&self.filter) {
            log::debug!("Logger already installed, keeping it");
        }
        Ok(())
    }

    // The global logger cannot be removed once set.
    fn uninstall(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
        Ok(())
    }
}

/// Registers the [`EngineConfig`] singleton.
#[derive(Debug, Clone)]
pub struct ConfigInstaller {
    config: EngineConfig,
}

impl ConfigInstaller {
    /// Installs `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Installer for ConfigInstaller {
    fn name(&self) -> &str {
        "config"
    }

    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        self.config.validate()?;
        services.add_singleton(self.config.clone())?;
        Ok(())
    }

    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        services.remove_singleton::<EngineConfig>()
    }
}

/// Registers the [`EventBus`].
#[derive(Debug, Default)]
pub struct EventsInstaller;

impl Installer for EventsInstaller {
    fn name(&self) -> &str {
        "events"
    }

    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        services.add_singleton(EventBus::new())?;
        Ok(())
    }

    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        // Listeners may hold `Rc`s to other services; drop them first.
        if let Some(bus) = services.try_resolve::<EventBus>() {
            bus.clear();
        }
        services.remove_singleton::<EventBus>()
    }
}

/// Registers the [`WindowService`].
///
/// Without an explicit backend, a [`HeadlessWindow`] is built from the
/// installed [`EngineConfig`].
#[derive(Default)]
pub struct WindowInstaller {
    backend: Option<Box<dyn WindowBackend>>,
}

impl WindowInstaller {
    /// Uses `backend` instead of a headless window.
    pub fn with_backend(backend: Box<dyn WindowBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }
}

impl Installer for WindowInstaller {
    fn name(&self) -> &str {
        "window"
    }

    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        let backend: Box<dyn WindowBackend> = match self.backend.take() {
            Some(backend) => backend,
            None => {
                let config = services.resolve::<EngineConfig>()?;
                log::info!("Using a headless window '{}'", config.window.title);
                Box::new(HeadlessWindow::from_config(&config.window))
            }
        };
        services.add_singleton(WindowService::new(backend))?;
        Ok(())
    }

    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        services.remove_singleton::<WindowService>()
    }
}

/// Registers the [`SceneManager`] and hooks it to the [`EventBus`].
#[derive(Debug, Default)]
pub struct SceneInstaller {
    subscriptions: Vec<(EventKind, Identifier)>,
}

impl Installer for SceneInstaller {
    fn name(&self) -> &str {
        "scene"
    }

    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        let bus = services.resolve::<EventBus>()?;
        let manager = services.add_singleton(SceneManager::new())?;
        self.subscriptions = manager.subscribe(&bus);
        Ok(())
    }

    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        if let Some(bus) = services.try_resolve::<EventBus>() {
            for (kind, id) in self.subscriptions.drain(..) {
                bus.remove_listener(kind, id);
            }
        }
        let manager = services.resolve::<SceneManager>()?;
        let unloaded = manager.unload_all();
        services.remove_singleton::<SceneManager>()?;
        unloaded
    }
}

/// Registers the [`Simulation`] scheduler, rated from the [`EngineConfig`].
#[derive(Default)]
pub struct SimulationInstaller {
    clock: Option<Box<dyn Clock>>,
}

impl SimulationInstaller {
    /// Drives the simulation from `clock` instead of the system clock.
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self { clock: Some(clock) }
    }
}

impl Installer for SimulationInstaller {
    fn name(&self) -> &str {
        "simulation"
    }

    fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        let config = services.resolve::<EngineConfig>()?;
        let clock: Box<dyn Clock> = match self.clock.take() {
            Some(clock) => clock,
            None => Box::new(SystemClock::new()),
        };
        let simulation = Simulation::from_config(&config, clock)?;
        log::info!(
            "Simulation at {} Hz fixed, {} fps target",
            config.fixed_update_hz,
            config.target_frame_rate
        );
        services.add_singleton(simulation)?;
        Ok(())
    }

    fn uninstall(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
        services.remove_singleton::<Simulation>()
    }
}
