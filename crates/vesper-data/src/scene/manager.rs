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

use super::graph::Scene;
use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use vesper_core::event::{EventBus, EventKind, FixedUpdate, MainLoopEnd, Render, Update};
use vesper_core::resource::{Resource, ResourceStore};
use vesper_core::time::{FixedTime, FrameTime};
use vesper_core::{EngineError, EngineResult, Identifier};

/// The service owning every loaded [`Scene`] and tracking the active one.
///
/// Per-step hooks run on the active scene only; destroyed game objects are
/// reaped in every loaded scene when the frame ends.
///
/// Scenes are borrowed mutably for the duration of a closure. Calling back
/// into the manager from inside such a closure (for example from a component
/// hook) fails with [`EngineError::ReentrantAccess`]; hooks reach their own
/// scene through [`ComponentContext`](super::ComponentContext) instead.
#[derive(Default)]
pub struct SceneManager {
    scenes: RefCell<ResourceStore<Scene>>,
    active: Cell<Option<Resource<Scene>>>,
}

impl SceneManager {
    /// Creates a manager with no scenes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scene. The first scene created becomes active.
    pub fn create_scene(&self, name: &str) -> EngineResult<Resource<Scene>> {
        let handle = self.scenes_mut()?.insert(Scene::new(name));
        if self.active.get().is_none() {
            self.active.set(Some(handle));
        }
        log::info!("Scene '{name}' loaded");
        Ok(handle)
    }

    /// Makes `scene` the active scene.
    pub fn set_active(&self, scene: Resource<Scene>) -> EngineResult<()> {
        self.scenes()?.get(scene)?;
        self.active.set(Some(scene));
        Ok(())
    }

    /// The active scene, if any.
    pub fn active(&self) -> Option<Resource<Scene>> {
        self.active.get()
    }

    /// Number of loaded scenes.
    pub fn scene_count(&self) -> EngineResult<usize> {
        Ok(self.scenes()?.len())
    }

    /// Runs `f` on the active scene. Returns `Ok(None)` when there is none.
    pub fn with_active<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> EngineResult<Option<R>> {
        match self.active.get() {
            Some(scene) => self.with_scene(scene, f).map(Some),
            None => Ok(None),
        }
    }

    /// Runs `f` on `scene`.
    pub fn with_scene<R>(
        &self,
        scene: Resource<Scene>,
        f: impl FnOnce(&mut Scene) -> R,
    ) -> EngineResult<R> {
        let mut scenes = self.scenes_mut()?;
        Ok(f(scenes.get_mut(scene)?))
    }

    /// Destroys every game object of `scene`, reaps them and unloads the scene.
    ///
    /// If `scene` was active, no scene is active afterwards.
    pub fn unload_scene(&self, scene: Resource<Scene>) -> EngineResult<()> {
        let mut unloaded = {
            let mut scenes = self.scenes_mut()?;
            scenes.remove(scene)?
        };
        if self.active.get() == Some(scene) {
            self.active.set(None);
        }

        let root = unloaded.root();
        let children = unloaded.children(root)?.to_vec();
        for child in children {
            unloaded.destroy(child)?;
        }
        unloaded.on_cleanup()?;
        log::info!("Scene '{}' unloaded", unloaded.name());
        Ok(())
    }

    /// Unloads every scene, in load order.
    ///
    /// Every scene is unloaded even if one fails; the first error is returned.
    pub fn unload_all(&self) -> EngineResult<()> {
        let handles = self.scenes()?.handles();
        let mut result = Ok(());
        for scene in handles {
            let outcome = self.unload_scene(scene);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    /// Runs the fixed-step hooks of the active scene.
    pub fn fixed_update(&self, time: FixedTime) -> EngineResult<()> {
        self.with_active(|scene| scene.fixed_update(time))?
            .unwrap_or(Ok(()))
    }

    /// Runs the update hooks of the active scene.
    pub fn update(&self, time: FrameTime) -> EngineResult<()> {
        self.with_active(|scene| scene.update(time))?
            .unwrap_or(Ok(()))
    }

    /// Runs the render hooks of the active scene.
    pub fn render(&self, time: FrameTime) -> EngineResult<()> {
        self.with_active(|scene| scene.render(time))?
            .unwrap_or(Ok(()))
    }

    /// Reaps destroyed game objects in every loaded scene.
    ///
    /// Returns the total number of game objects removed.
    pub fn end_frame(&self) -> EngineResult<usize> {
        let mut scenes = self.scenes_mut()?;
        let mut reaped = 0;
        let mut first_error = None;
        for (_, scene) in scenes.iter_mut() {
            let before = scene.object_count();
            if let Err(e) = scene.on_cleanup() {
                first_error.get_or_insert(e);
            }
            reaped += before.saturating_sub(scene.object_count());
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reaped),
        }
    }

    /// Hooks the manager up to the engine events.
    ///
    /// Returns the registrations so they can be removed with
    /// [`EventBus::remove_listener`].
    pub fn subscribe(self: &Rc<Self>, bus: &EventBus) -> Vec<(EventKind, Identifier)> {
        let manager = Rc::clone(self);
        let fixed = bus.subscribe(move |e: &FixedUpdate| manager.fixed_update(e.0));
        let manager = Rc::clone(self);
        let update = bus.subscribe(move |e: &Update| manager.update(e.0));
        let manager = Rc::clone(self);
        let render = bus.subscribe(move |e: &Render| manager.render(e.0));
        let manager = Rc::clone(self);
        let end = bus.subscribe(move |_: &MainLoopEnd| manager.end_frame().map(|_| ()));

        vec![
            (EventKind::FixedUpdate, fixed),
            (EventKind::Update, update),
            (EventKind::Render, render),
            (EventKind::MainLoopEnd, end),
        ]
    }

    fn scenes(&self) -> EngineResult<std::cell::Ref<'_, ResourceStore<Scene>>> {
        self.scenes.try_borrow().map_err(|_| EngineError::ReentrantAccess {
            type_name: type_name::<Self>(),
        })
    }

    fn scenes_mut(&self) -> EngineResult<std::cell::RefMut<'_, ResourceStore<Scene>>> {
        self.scenes
            .try_borrow_mut()
            .map_err(|_| EngineError::ReentrantAccess {
                type_name: type_name::<Self>(),
            })
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("active", &self.active.get())
            .field("scenes", &self.scenes.try_borrow().map(|s| s.len()).ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Component, ComponentContext, ComponentHooks};

    #[test]
    fn first_scene_becomes_active() {
        let manager = SceneManager::new();
        let first = manager.create_scene("Main").unwrap();
        let second = manager.create_scene("Menu").unwrap();

        assert_eq!(manager.active(), Some(first));
        manager.set_active(second).unwrap();
        assert_eq!(manager.active(), Some(second));
        assert_eq!(manager.scene_count().unwrap(), 2);
    }

    #[test]
    fn unload_clears_active_and_invalidates_handle() {
        let manager = SceneManager::new();
        let scene = manager.create_scene("Main").unwrap();
        manager
            .with_scene(scene, |s| s.create_game_object(None, Some("Player")))
            .unwrap()
            .unwrap();

        manager.unload_scene(scene).unwrap();

        assert_eq!(manager.active(), None);
        assert_eq!(manager.with_active(|_| ()).unwrap(), None);
        assert!(manager.set_active(scene).unwrap_err().is_stale_reference());
    }

    #[test]
    fn reentrant_access_is_rejected() {
        let manager = SceneManager::new();
        manager.create_scene("Main").unwrap();

        let nested = manager
            .with_active(|_| manager.with_active(|_| ()))
            .unwrap()
            .unwrap();
        assert!(matches!(nested, Err(EngineError::ReentrantAccess { .. })));
    }

    struct Counter(Rc<Cell<u32>>);
    impl Component for Counter {
        fn hooks(&self) -> ComponentHooks {
            ComponentHooks::UPDATE
        }
        fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn events_drive_the_active_scene() {
        let bus = EventBus::new();
        let manager = Rc::new(SceneManager::new());
        let registrations = manager.subscribe(&bus);
        assert_eq!(registrations.len(), 4);

        let count = Rc::new(Cell::new(0));
        // No scene yet: events are no-ops.
        bus.dispatch(&Update(FrameTime::default())).unwrap();

        manager.create_scene("Main").unwrap();
        let entity = manager
            .with_active(|scene| {
                let e = scene.create_game_object(None, None)?;
                scene.add_component(e, Counter(count.clone()))?;
                Ok::<_, EngineError>(e)
            })
            .unwrap()
            .unwrap()
            .unwrap();

        bus.dispatch(&Update(FrameTime::default())).unwrap();
        bus.dispatch(&Update(FrameTime::default())).unwrap();
        assert_eq!(count.get(), 2);

        manager
            .with_active(|scene| scene.destroy(entity))
            .unwrap()
            .unwrap()
            .unwrap();
        bus.dispatch(&MainLoopEnd(FrameTime::default())).unwrap();
        let alive = manager
            .with_active(|scene| scene.contains(entity))
            .unwrap()
            .unwrap();
        assert!(!alive);

        for (kind, id) in registrations {
            assert!(bus.remove_listener(kind, id));
        }
        assert_eq!(Rc::strong_count(&manager), 1);
    }

    struct FailsOnDestroy;
    impl Component for FailsOnDestroy {
        fn hooks(&self) -> ComponentHooks {
            ComponentHooks::DESTROY
        }
        fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
            Err(EngineError::Config("teardown refused".into()))
        }
    }

    #[test]
    fn end_frame_reaps_every_scene_despite_a_failing_hook() {
        let manager = SceneManager::new();
        let mut marked = Vec::new();
        for name in ["Broken", "Healthy"] {
            let scene = manager.create_scene(name).unwrap();
            let entity = manager
                .with_scene(scene, |s| {
                    let e = s.create_game_object(None, None)?;
                    if name == "Broken" {
                        s.add_component(e, FailsOnDestroy)?;
                    }
                    s.destroy(e)?;
                    Ok::<_, EngineError>(e)
                })
                .unwrap()
                .unwrap();
            marked.push((scene, entity));
        }

        assert!(matches!(manager.end_frame(), Err(EngineError::Config(_))));
        for (scene, entity) in marked {
            let alive = manager.with_scene(scene, |s| s.contains(entity)).unwrap();
            assert!(!alive);
        }
        assert_eq!(manager.end_frame().unwrap(), 0);

        // Both scenes are consistent again and unload cleanly.
        manager.unload_all().unwrap();
        assert_eq!(manager.scene_count().unwrap(), 0);
    }
}
