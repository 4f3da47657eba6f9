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

use super::component::{Component, ComponentContext, Hook};
use super::game_object::GameObject;
use super::transform::Transform;
use std::any::{type_name, TypeId};
use vesper_core::math::{Mat4, Vec3};
use vesper_core::resource::{Resource, ResourceStore};
use vesper_core::services::ServiceContainer;
use vesper_core::time::{FixedTime, FrameTime};
use vesper_core::{EngineError, EngineResult, Identifier};

const ROOT_NAME: &str = "Root";
const DEFAULT_OBJECT_NAME: &str = "GameObject";

/// A tree of game objects under a single root.
///
/// The scene owns every game object; parent and child links are
/// `Resource<GameObject>` handles held by the transforms, so no game object
/// owns another.
///
/// Destruction is two-phase. [`destroy`](Self::destroy) only marks a game
/// object and its whole subtree, so it is safe to call from inside a hook.
/// [`on_cleanup`](Self::on_cleanup) later runs `on_destroy` hooks and frees
/// the marked objects; the scene manager calls it at the end of each frame.
pub struct Scene {
    id: Identifier,
    name: String,
    objects: ResourceStore<GameObject>,
    root: Resource<GameObject>,
    pending_destroy: Vec<Resource<GameObject>>,
}

impl Scene {
    /// Creates a scene holding only its root game object.
    pub fn new(name: impl Into<String>) -> Self {
        let mut objects = ResourceStore::new();
        let root = objects.insert(GameObject::new(ROOT_NAME));
        let name = name.into();
        log::debug!("Scene '{name}' created");
        Self {
            id: Identifier::new(),
            name,
            objects,
            root,
            pending_destroy: Vec::new(),
        }
    }

    /// The unique identifier of this scene.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// The display name of this scene.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root game object. It cannot be destroyed or reparented.
    pub fn root(&self) -> Resource<GameObject> {
        self.root
    }

    /// Number of game objects held by the scene, including the root and any
    /// object marked for destruction but not yet reaped.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of game objects waiting for [`on_cleanup`](Self::on_cleanup).
    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy.len()
    }

    /// Returns `true` if `entity` refers to a game object of this scene.
    pub fn contains(&self, entity: Resource<GameObject>) -> bool {
        self.objects.contains(entity)
    }

    /// Resolves `entity`.
    pub fn get(&self, entity: Resource<GameObject>) -> EngineResult<&GameObject> {
        self.objects.get(entity)
    }

    /// Resolves `entity` mutably.
    pub fn get_mut(&mut self, entity: Resource<GameObject>) -> EngineResult<&mut GameObject> {
        self.objects.get_mut(entity)
    }

    /// Iterates over every game object, root included.
    pub fn iter(&self) -> impl Iterator<Item = (Resource<GameObject>, &GameObject)> + '_ {
        self.objects.iter()
    }

    /// Creates a game object under `parent` (the root if `None`).
    ///
    /// A game object created under a parent already marked for destruction
    /// is marked too, and will be reaped with it.
    pub fn create_game_object(
        &mut self,
        parent: Option<Resource<GameObject>>,
        name: Option<&str>,
    ) -> EngineResult<Resource<GameObject>> {
        let parent = parent.unwrap_or(self.root);
        let parent_destroyed = self.objects.get(parent)?.destroyed;

        let mut object = GameObject::new(name.unwrap_or(DEFAULT_OBJECT_NAME));
        object.transform.set_parent_link(Some(parent));
        let entity = self.objects.insert(object);
        self.objects.get_mut(parent)?.transform.push_child(entity);

        if parent_destroyed {
            self.objects.get_mut(entity)?.destroyed = true;
            self.pending_destroy.push(entity);
        }
        log::trace!("Created game object {entity:?} under {parent:?}");
        Ok(entity)
    }

    /// Marks `entity` and all of its descendants for destruction.
    ///
    /// Nothing is removed until [`on_cleanup`](Self::on_cleanup). Marking an
    /// already marked game object does nothing.
    pub fn destroy(&mut self, entity: Resource<GameObject>) -> EngineResult<()> {
        if entity == self.root {
            return Err(EngineError::InvalidHierarchy(
                "the scene root cannot be destroyed".to_owned(),
            ));
        }
        if self.objects.get(entity)?.destroyed {
            return Ok(());
        }

        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Ok(object) = self.objects.get_mut(current) else {
                continue;
            };
            if object.destroyed {
                continue;
            }
            object.destroyed = true;
            stack.extend_from_slice(object.transform.children());
            self.pending_destroy.push(current);
        }
        log::debug!(
            "Marked {entity:?} for destruction ({} pending)",
            self.pending_destroy.len()
        );
        Ok(())
    }

    /// Returns `true` if `entity` is marked for destruction.
    pub fn is_destroyed(&self, entity: Resource<GameObject>) -> EngineResult<bool> {
        Ok(self.objects.get(entity)?.destroyed)
    }

    /// Reaps every game object marked for destruction.
    ///
    /// First the `on_destroy` hooks of all marked objects run, then the
    /// objects are removed and detached from surviving parents. Objects
    /// marked by those hooks are reaped in the same call. Returns the number
    /// of game objects removed.
    ///
    /// A failing hook does not stop the reaping: every marked object is
    /// still removed, then the first hook error is returned.
    pub fn on_cleanup(&mut self) -> EngineResult<usize> {
        let mut reaped = 0;
        let mut first_error = None;
        while !self.pending_destroy.is_empty() {
            let batch = std::mem::take(&mut self.pending_destroy);

            for &entity in &batch {
                if let Err(e) = self.run_destroy_hooks(entity, FrameTime::default()) {
                    log::error!("on_destroy failed in scene '{}': {e}", self.name);
                    first_error.get_or_insert(e);
                }
            }

            for entity in batch {
                let Ok(object) = self.objects.remove(entity) else {
                    continue;
                };
                if let Some(parent) = object.transform.parent() {
                    if let Ok(parent) = self.objects.get_mut(parent) {
                        parent.transform.remove_child(entity);
                    }
                }
                reaped += 1;
            }
        }
        if reaped > 0 {
            log::debug!("Scene '{}' reaped {reaped} game object(s)", self.name);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(reaped),
        }
    }

    /// Moves `entity` under `new_parent` (the root if `None`), keeping its
    /// local transform.
    ///
    /// Fails with [`EngineError::InvalidHierarchy`] for the root, for
    /// parenting an object to itself or to one of its descendants, and for a
    /// parent marked for destruction.
    pub fn set_parent(
        &mut self,
        entity: Resource<GameObject>,
        new_parent: Option<Resource<GameObject>>,
    ) -> EngineResult<()> {
        let new_parent = new_parent.unwrap_or(self.root);
        if entity == self.root {
            return Err(EngineError::InvalidHierarchy(
                "the scene root cannot be reparented".to_owned(),
            ));
        }
        if entity == new_parent {
            return Err(EngineError::InvalidHierarchy(
                "a game object cannot be its own parent".to_owned(),
            ));
        }
        let old_parent = self.objects.get(entity)?.transform.parent();
        if self.objects.get(new_parent)?.destroyed {
            return Err(EngineError::InvalidHierarchy(
                "cannot parent to a game object marked for destruction".to_owned(),
            ));
        }

        let mut ancestor = Some(new_parent);
        while let Some(current) = ancestor {
            if current == entity {
                return Err(EngineError::InvalidHierarchy(
                    "a game object cannot be parented to its own descendant".to_owned(),
                ));
            }
            ancestor = self.objects.get(current)?.transform.parent();
        }

        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if let Some(old) = old_parent {
            if let Ok(old) = self.objects.get_mut(old) {
                old.transform.remove_child(entity);
            }
        }
        self.objects.get_mut(new_parent)?.transform.push_child(entity);
        self.objects
            .get_mut(entity)?
            .transform
            .set_parent_link(Some(new_parent));
        Ok(())
    }

    /// The parent of `entity`; `None` for the root.
    pub fn parent(&self, entity: Resource<GameObject>) -> EngineResult<Option<Resource<GameObject>>> {
        Ok(self.objects.get(entity)?.transform.parent())
    }

    /// The children of `entity`, in attachment order.
    pub fn children(&self, entity: Resource<GameObject>) -> EngineResult<&[Resource<GameObject>]> {
        Ok(self.objects.get(entity)?.transform.children())
    }

    /// Finds the first live game object named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Resource<GameObject>> {
        self.objects
            .iter()
            .find(|(_, object)| !object.destroyed && object.name() == name)
            .map(|(handle, _)| handle)
    }

    // --- Transforms ---

    /// The transform of `entity`.
    pub fn transform(&self, entity: Resource<GameObject>) -> EngineResult<&Transform> {
        Ok(&self.objects.get(entity)?.transform)
    }

    /// The transform of `entity`, mutably.
    pub fn transform_mut(&mut self, entity: Resource<GameObject>) -> EngineResult<&mut Transform> {
        Ok(&mut self.objects.get_mut(entity)?.transform)
    }

    /// The world matrix of `entity`: `parent world * T * R * S`.
    ///
    /// Only the nodes on the path from the root whose inputs changed since
    /// the last read are recomputed.
    pub fn world_matrix(&self, entity: Resource<GameObject>) -> EngineResult<Mat4> {
        let mut chain = Vec::new();
        let mut cursor = Some(entity);
        while let Some(current) = cursor {
            let transform = &self.objects.get(current)?.transform;
            chain.push(transform);
            cursor = transform.parent();
        }

        let (mut world, mut revision) = (Mat4::IDENTITY, 0);
        for transform in chain.into_iter().rev() {
            (world, revision) = transform.resolve_world(world, revision);
        }
        Ok(world)
    }

    /// The world-space position of `entity`.
    pub fn world_position(&self, entity: Resource<GameObject>) -> EngineResult<Vec3> {
        Ok(self.world_matrix(entity)?.translation())
    }

    // --- Components ---

    /// Attaches `component` to `entity` and returns it.
    ///
    /// Fails with [`EngineError::DuplicateComponent`] if `entity` already has
    /// a component of type `T`. [`Transform`] always counts as present.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Resource<GameObject>,
        component: T,
    ) -> EngineResult<&mut T> {
        self.objects.get_mut(entity)?.attach(component)
    }

    /// Builds a `T` with the [`Factory`](vesper_core::services::Factory)
    /// registered in `services` and attaches it to `entity`.
    pub fn create_component<T: Component>(
        &mut self,
        entity: Resource<GameObject>,
        services: &ServiceContainer,
    ) -> EngineResult<&mut T> {
        if self.objects.get(entity)?.has_component::<T>() {
            return Err(EngineError::DuplicateComponent {
                type_name: type_name::<T>(),
                object: self.objects.get(entity)?.name().to_owned(),
            });
        }
        let component = services.create::<T>()?;
        self.add_component(entity, component)
    }

    /// The component of type `T` on `entity`, if any.
    pub fn get_component<T: Component>(&self, entity: Resource<GameObject>) -> EngineResult<Option<&T>> {
        Ok(self.objects.get(entity)?.component::<T>())
    }

    /// The component of type `T` on `entity` mutably, if any.
    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Resource<GameObject>,
    ) -> EngineResult<Option<&mut T>> {
        Ok(self.objects.get_mut(entity)?.component_mut::<T>())
    }

    /// Returns `true` if `entity` has a component of type `T`.
    pub fn has_component<T: Component>(&self, entity: Resource<GameObject>) -> EngineResult<bool> {
        Ok(self.objects.get(entity)?.has_component::<T>())
    }

    /// Detaches the component of type `T` from `entity`, running its
    /// `on_destroy` hook. Returns `false` if there was none.
    ///
    /// The transform cannot be removed.
    pub fn remove_component<T: Component>(&mut self, entity: Resource<GameObject>) -> EngineResult<bool> {
        if TypeId::of::<T>() == TypeId::of::<Transform>() {
            return Err(EngineError::InvalidHierarchy(
                "the transform cannot be removed from a game object".to_owned(),
            ));
        }
        let Some(slot) = self.objects.get_mut(entity)?.detach(TypeId::of::<T>()) else {
            return Ok(false);
        };
        // A component removed from inside its own hook is finished by
        // `run_hook` once the hook returns.
        if let Some(component) = slot.component {
            self.finish_component(entity, component, FrameTime::default())?;
        }
        Ok(true)
    }

    // --- Per-step hooks ---

    /// Runs `on_fixed_update` on every component that implements it.
    pub fn fixed_update(&mut self, time: FixedTime) -> EngineResult<()> {
        self.run_hook(Hook::FixedUpdate, time.into())
    }

    /// Runs `on_update` on every component that implements it.
    pub fn update(&mut self, time: FrameTime) -> EngineResult<()> {
        self.run_hook(Hook::Update, time)
    }

    /// Runs `on_render` on every component that implements it.
    pub fn render(&mut self, time: FrameTime) -> EngineResult<()> {
        self.run_hook(Hook::Render, time)
    }

    /// Calls `hook` on the components of every game object that exists when
    /// the traversal starts and is not marked for destruction when reached.
    fn run_hook(&mut self, hook: Hook, time: FrameTime) -> EngineResult<()> {
        for entity in self.objects.handles() {
            let targets = match self.objects.get(entity) {
                Ok(object) if !object.destroyed => object.hooked(hook.flag()),
                _ => continue,
            };
            for type_id in targets {
                let Some(mut component) = self.take_live(entity, type_id) else {
                    continue;
                };
                let result = {
                    let mut ctx = ComponentContext {
                        scene: &mut *self,
                        entity,
                        time,
                    };
                    hook.invoke(component.as_mut(), &mut ctx)
                };
                let orphan = match self.objects.get_mut(entity) {
                    Ok(object) => object.restore(type_id, component),
                    Err(_) => Some(component),
                };
                if let Some(orphan) = orphan {
                    self.finish_component(entity, orphan, time)?;
                }
                result?;
            }
        }
        Ok(())
    }

    fn take_live(
        &mut self,
        entity: Resource<GameObject>,
        type_id: TypeId,
    ) -> Option<Box<dyn Component>> {
        let object = self.objects.get_mut(entity).ok()?;
        if object.destroyed {
            return None;
        }
        object.take(type_id)
    }

    /// Runs the `on_destroy` hook of every component of `entity`.
    fn run_destroy_hooks(&mut self, entity: Resource<GameObject>, time: FrameTime) -> EngineResult<()> {
        let targets = match self.objects.get(entity) {
            Ok(object) => object.hooked(Hook::Destroy.flag()),
            Err(_) => return Ok(()),
        };
        let mut result = Ok(());
        for type_id in targets {
            let Some(slot) = self
                .objects
                .get_mut(entity)
                .ok()
                .and_then(|object| object.detach(type_id))
            else {
                continue;
            };
            if let Some(component) = slot.component {
                let outcome = self.finish_component(entity, component, time);
                if result.is_ok() {
                    result = outcome;
                }
            }
        }
        result
    }

    /// Runs `on_destroy` on a component that has left its game object.
    fn finish_component(
        &mut self,
        entity: Resource<GameObject>,
        mut component: Box<dyn Component>,
        time: FrameTime,
    ) -> EngineResult<()> {
        if !component.hooks().contains(Hook::Destroy.flag()) {
            return Ok(());
        }
        let mut ctx = ComponentContext {
            scene: &mut *self,
            entity,
            time,
        };
        Hook::Destroy.invoke(component.as_mut(), &mut ctx)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("objects", &self.objects.len())
            .field("pending_destroy", &self.pending_destroy.len())
            .finish()
    }
}
