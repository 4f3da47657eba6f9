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

//! End-to-end runs of the engine with a deterministic clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use vesper_core::platform::NativeHandle;
use vesper_core::time::{Clock, ManualClock};
use vesper_sdk::prelude::*;

const STEP: Duration = Duration::from_millis(20);

/// A window that advances the clock by one fixed step per poll and closes
/// after a fixed number of polls.
struct SteppingWindow {
    clock: ManualClock,
    remaining: u32,
    closed: bool,
}

impl SteppingWindow {
    fn new(clock: &ManualClock, polls: u32) -> Self {
        Self {
            clock: clock.clone(),
            remaining: polls,
            closed: false,
        }
    }
}

impl WindowBackend for SteppingWindow {
    fn poll_events(&mut self) -> EngineResult<()> {
        if self.remaining == 0 {
            self.closed = true;
        } else {
            self.remaining -= 1;
            self.clock.advance(STEP);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn request_close(&mut self) {
        self.remaining = 0;
    }

    fn inner_size(&self) -> (u32, u32) {
        (320, 240)
    }

    fn native_handle(&self) -> NativeHandle {
        NativeHandle::null()
    }
}

/// Counts its updates and fixed updates into shared cells.
struct Counter {
    updates: Rc<Cell<u32>>,
    fixed: Rc<Cell<u32>>,
}

impl Component for Counter {
    fn hooks(&self) -> ComponentHooks {
        ComponentHooks::UPDATE | ComponentHooks::FIXED_UPDATE
    }

    fn on_fixed_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        self.fixed.set(self.fixed.get() + 1);
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        self.updates.set(self.updates.get() + 1);
        Ok(())
    }
}

/// Fails on its n-th update.
struct FailAfter(u32);

impl Component for FailAfter {
    fn hooks(&self) -> ComponentHooks {
        ComponentHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        if ctx.time.frame + 1 >= u64::from(self.0) {
            return Err(anyhow::anyhow!("gave up at frame {}", ctx.time.frame).into());
        }
        Ok(())
    }
}

fn engine(clock: &ManualClock, polls: u32) -> Engine {
    Engine::new(EngineConfig::default())
        .with_clock(Box::new(clock.clone()))
        .with_window(Box::new(SteppingWindow::new(clock, polls)))
}

#[test]
fn behaviour_runs_once_per_tick() {
    // --- 1. SETUP ---
    const TICKS: u32 = 12;
    let clock = ManualClock::new();
    let updates = Rc::new(Cell::new(0));
    let fixed = Rc::new(Cell::new(0));
    let (u, f) = (updates.clone(), fixed.clone());

    // --- 2. ACTION ---
    let code = engine(&clock, TICKS).run(move |services| {
        let scenes = services.resolve::<SceneManager>()?;
        let scene = scenes.create_scene("Main")?;
        scenes.with_scene(scene, |scene| -> EngineResult<()> {
            let camera = scene.create_game_object(None, Some("Camera"))?;
            scene.add_component(camera, Counter { updates: u, fixed: f })?;
            Ok(())
        })??;
        let camera = scenes.with_active(|scene| scene.find_by_name("Camera"))?.flatten();
        anyhow::ensure!(camera.is_some(), "camera not found in the active scene");
        Ok(())
    });

    // --- 3. ASSERTIONS ---
    assert_eq!(code, 0);
    assert_eq!(updates.get(), TICKS);
    assert_eq!(fixed.get(), TICKS);
}

#[test]
fn scene_graph_is_built_during_init() {
    let clock = ManualClock::new();
    let code = engine(&clock, 1).run(|services| {
        let scenes = services.resolve::<SceneManager>()?;
        let scene = scenes.create_scene("Main")?;
        scenes.with_scene(scene, |scene| -> anyhow::Result<()> {
            let camera = scene.create_game_object(None, Some("Camera"))?;
            scene.add_component(camera, Camera::default())?;
            anyhow::ensure!(scene.parent(camera)? == Some(scene.root()));

            let parent = scene.create_game_object(None, Some("Parent"))?;
            scene.transform_mut(parent)?.set_translation(Vec3::new(5.0, 0.0, 0.0));
            let child = scene.create_game_object(Some(parent), Some("Child"))?;
            scene.transform_mut(child)?.set_translation(Vec3::new(1.0, 0.0, 0.0));

            let world = scene.world_position(child)?;
            anyhow::ensure!(
                approx::relative_eq!(world, Vec3::new(6.0, 0.0, 0.0)),
                "child at {world:?}"
            );
            Ok(())
        })??;
        Ok(())
    });
    assert_eq!(code, 0);
}

#[test]
fn failing_init_returns_exit_code_one_and_uninstalls() {
    struct Tracking(Rc<RefCell<Vec<&'static str>>>);

    impl Installer for Tracking {
        fn name(&self) -> &str {
            "tracking"
        }

        fn install(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
            self.0.borrow_mut().push("install");
            Ok(())
        }

        fn uninstall(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
            self.0.borrow_mut().push("uninstall");
            Ok(())
        }
    }

    let clock = ManualClock::new();
    let journal = Rc::new(RefCell::new(Vec::new()));
    let code = engine(&clock, 5)
        .with_installer(Box::new(Tracking(journal.clone())))
        .run(|_| anyhow::bail!("no assets"));

    assert_eq!(code, 1);
    assert_eq!(*journal.borrow(), ["install", "uninstall"]);
}

#[test]
fn frame_error_stops_the_loop() {
    let clock = ManualClock::new();
    let result = engine(&clock, 100).try_run(|services| {
        let scenes = services.resolve::<SceneManager>()?;
        let scene = scenes.create_scene("Main")?;
        scenes.with_scene(scene, |scene| -> EngineResult<()> {
            let entity = scene.create_game_object(None, None)?;
            scene.add_component(entity, FailAfter(3))?;
            Ok(())
        })??;
        Ok(())
    });

    let error = result.unwrap_err();
    assert!(format!("{error:?}").contains("gave up at frame 2"));
    // Only three polls were consumed.
    assert_eq!(clock.now(), STEP * 3);
}

#[test]
fn listener_can_close_the_window() {
    let clock = ManualClock::new();
    let result = engine(&clock, 1_000).try_run(|services| {
        let bus = services.resolve::<EventBus>()?;
        let window = services.resolve::<WindowService>()?;
        bus.subscribe(move |e: &Update| {
            if e.0.frame == 4 {
                window.request_close()?;
            }
            Ok(())
        });
        Ok(())
    });

    assert_eq!(result.unwrap(), 5);
}

#[test]
fn headless_frame_limit_ends_the_run() {
    let mut config = EngineConfig::default();
    config.window.frame_limit = Some(3);
    assert_eq!(Engine::new(config).run(|_| Ok(())), 0);
}

#[test]
fn boot_order_puts_application_installers_before_the_simulation() {
    struct NeedsScenes;

    impl Installer for NeedsScenes {
        fn name(&self) -> &str {
            "needs-scenes"
        }

        fn install(&mut self, services: &mut ServiceContainer) -> EngineResult<()> {
            services.resolve::<SceneManager>()?;
            if services.contains::<Simulation>() {
                return Err(EngineError::Config("simulation installed too early".into()));
            }
            Ok(())
        }

        fn uninstall(&mut self, _services: &mut ServiceContainer) -> EngineResult<()> {
            Ok(())
        }
    }

    let clock = ManualClock::new();
    let code = engine(&clock, 0).with_installer(Box::new(NeedsScenes)).run(|_| Ok(()));
    assert_eq!(code, 0);
}
