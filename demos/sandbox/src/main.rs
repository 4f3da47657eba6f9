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

// Vesper Sandbox
// Headless demo of scenes, behaviours and the simulation loop.
//
// Usage: sandbox [config.ron]

use anyhow::{Context, Result};
use std::f32::consts::FRAC_PI_2;
use vesper_sdk::prelude::*;

/// Frames rendered before the sandbox closes its window.
const DEMO_FRAMES: u64 = 180;

/// Rotates its game object around the Y axis.
struct Spinner {
    radians_per_second: f32,
}

impl Component for Spinner {
    fn hooks(&self) -> ComponentHooks {
        ComponentHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        let angle = self.radians_per_second * ctx.time.delta;
        ctx.scene
            .transform_mut(ctx.entity)?
            .rotate(Quaternion::from_axis_angle(Vec3::Y, angle));
        Ok(())
    }
}

/// Logs the world position of its game object once per second of frames.
struct PositionReporter;

impl Component for PositionReporter {
    fn hooks(&self) -> ComponentHooks {
        ComponentHooks::RENDER | ComponentHooks::DESTROY
    }

    fn on_render(&mut self, ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        if ctx.time.frame % 60 == 0 {
            let position = ctx.scene.world_position(ctx.entity)?;
            log::info!(
                "Frame {}: orbiter at ({:.2}, {:.2}, {:.2})",
                ctx.time.frame,
                position.x,
                position.y,
                position.z
            );
        }
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        log::info!("Orbiter {:?} destroyed", ctx.entity);
        Ok(())
    }
}

fn load_config() -> Result<EngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path)
            .with_context(|| format!("cannot load configuration from '{path}'")),
        None => Ok(EngineConfig::default()),
    }
}

fn setup(services: &ServiceContainer) -> Result<()> {
    let scenes = services.resolve::<SceneManager>()?;
    let scene = scenes.create_scene("Sandbox")?;

    scenes.with_scene(scene, |scene| -> EngineResult<()> {
        let camera = scene.create_game_object(None, Some("Camera"))?;
        scene.transform_mut(camera)?.set_translation(Vec3::new(0.0, 2.0, 10.0));
        scene.add_component(camera, Camera::default())?;

        let pivot = scene.create_game_object(None, Some("Pivot"))?;
        scene.add_component(
            pivot,
            Spinner {
                radians_per_second: FRAC_PI_2,
            },
        )?;

        let orbiter = scene.create_game_object(Some(pivot), Some("Orbiter"))?;
        scene.transform_mut(orbiter)?.set_translation(Vec3::new(3.0, 0.0, 0.0));
        scene.add_component(orbiter, PositionReporter)?;
        Ok(())
    })??;

    let bus = services.resolve::<EventBus>()?;
    let window = services.resolve::<WindowService>()?;
    bus.subscribe(move |e: &MainLoopEnd| {
        if e.0.frame + 1 == DEMO_FRAMES {
            log::info!("Demo finished, closing the window");
            window.request_close()?;
        }
        Ok(())
    });

    log::info!("Sandbox scene ready");
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    };

    let code = Engine::new(config).run(setup);
    std::process::exit(code);
}
