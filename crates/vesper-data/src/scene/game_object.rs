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

use super::component::{self, AsAny, Component, ComponentHooks};
use super::transform::Transform;
use std::any::{type_name, TypeId};
use vesper_core::{EngineError, EngineResult, Identifier};

/// A component attached to a game object.
///
/// `component` is `None` while one of its hooks is running.
pub(crate) struct ComponentSlot {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) hooks: ComponentHooks,
    pub(crate) component: Option<Box<dyn Component>>,
}

/// An entity in a [`Scene`](super::Scene): a name, a transform and a set of
/// components, at most one per concrete type.
///
/// Game objects are only created through the scene, which owns them and
/// hands out `Resource<GameObject>` handles.
pub struct GameObject {
    id: Identifier,
    name: String,
    pub(crate) transform: Transform,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) destroyed: bool,
}

impl GameObject {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: Identifier::new(),
            name: name.into(),
            transform: Transform::identity(),
            components: Vec::new(),
            destroyed: false,
        }
    }

    /// The unique identifier of this game object.
    pub fn id(&self) -> Identifier {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the game object.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The transform of this game object.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The transform of this game object, mutably.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Returns `true` once the game object has been marked for destruction.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of attached components, not counting the transform.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Type names of the attached components, in attachment order.
    pub fn component_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(|slot| slot.type_name)
    }

    /// Returns `true` if a component of type `T` is attached.
    ///
    /// Always `true` for [`Transform`].
    pub fn has_component<T: Component>(&self) -> bool {
        TypeId::of::<T>() == TypeId::of::<Transform>()
            || self.slot_index(TypeId::of::<T>()).is_some()
    }

    /// Returns the component of type `T`, if attached and not currently running a hook.
    pub fn component<T: Component>(&self) -> Option<&T> {
        if TypeId::of::<T>() == TypeId::of::<Transform>() {
            return self.transform.as_any().downcast_ref::<T>();
        }
        let index = self.slot_index(TypeId::of::<T>())?;
        component::downcast_ref::<T>(self.components[index].component.as_deref()?)
    }

    /// Returns the component of type `T` mutably, if attached and not currently running a hook.
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        if TypeId::of::<T>() == TypeId::of::<Transform>() {
            return self.transform.as_any_mut().downcast_mut::<T>();
        }
        let index = self.slot_index(TypeId::of::<T>())?;
        component::downcast_mut::<T>(self.components[index].component.as_deref_mut()?)
    }

    /// Attaches `component`, failing with [`EngineError::DuplicateComponent`]
    /// if one of the same concrete type is present.
    pub(crate) fn attach<T: Component>(&mut self, component: T) -> EngineResult<&mut T> {
        if self.has_component::<T>() {
            return Err(EngineError::DuplicateComponent {
                type_name: type_name::<T>(),
                object: self.name.clone(),
            });
        }
        let hooks = component.hooks();
        self.components.push(ComponentSlot {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            hooks,
            component: Some(Box::new(component)),
        });
        log::trace!("Attached {} to '{}'", type_name::<T>(), self.name);
        self.components
            .last_mut()
            .and_then(|slot| slot.component.as_deref_mut())
            .and_then(|c| component::downcast_mut::<T>(c))
            .ok_or(EngineError::ReentrantAccess {
                type_name: type_name::<T>(),
            })
    }

    /// Detaches the slot holding a `type_id` component and returns it.
    pub(crate) fn detach(&mut self, type_id: TypeId) -> Option<ComponentSlot> {
        let index = self.slot_index(type_id)?;
        Some(self.components.remove(index))
    }

    /// Type ids of the components that implement `hooks`, in attachment order.
    pub(crate) fn hooked(&self, hooks: ComponentHooks) -> Vec<TypeId> {
        self.components
            .iter()
            .filter(|slot| slot.hooks.intersects(hooks))
            .map(|slot| slot.type_id)
            .collect()
    }

    /// Moves a component out of its slot so a hook can run with the scene
    /// borrowed mutably.
    pub(crate) fn take(&mut self, type_id: TypeId) -> Option<Box<dyn Component>> {
        let index = self.slot_index(type_id)?;
        self.components[index].component.take()
    }

    /// Puts a component taken with [`take`](Self::take) back.
    ///
    /// Hands it back if its slot was removed in the meantime.
    pub(crate) fn restore(
        &mut self,
        type_id: TypeId,
        component: Box<dyn Component>,
    ) -> Option<Box<dyn Component>> {
        match self.slot_index(type_id) {
            Some(index) if self.components[index].component.is_none() => {
                self.components[index].component = Some(component);
                None
            }
            _ => Some(component),
        }
    }

    fn slot_index(&self, type_id: TypeId) -> Option<usize> {
        self.components.iter().position(|slot| slot.type_id == type_id)
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("components", &self.component_names().collect::<Vec<_>>())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_core::math::Vec3;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    struct Mana;
    impl Component for Mana {
        fn hooks(&self) -> ComponentHooks {
            ComponentHooks::UPDATE
        }
    }

    #[test]
    fn one_component_per_concrete_type() {
        let mut object = GameObject::new("Player");
        object.attach(Health(10)).unwrap();
        object.attach(Mana).unwrap();

        let result = object.attach(Health(5));
        assert!(matches!(
            result,
            Err(EngineError::DuplicateComponent { object, .. }) if object == "Player"
        ));
        assert_eq!(object.component::<Health>(), Some(&Health(10)));
        assert_eq!(object.component_count(), 2);
    }

    #[test]
    fn transform_counts_as_a_component() {
        let mut object = GameObject::new("Crate");
        assert!(object.has_component::<Transform>());
        assert!(matches!(
            object.attach(Transform::identity()),
            Err(EngineError::DuplicateComponent { .. })
        ));

        object
            .component_mut::<Transform>()
            .unwrap()
            .set_translation(Vec3::X);
        assert_eq!(object.transform().translation(), Vec3::X);
    }

    #[test]
    fn taken_component_is_hidden_until_restored() {
        let mut object = GameObject::new("Mage");
        object.attach(Mana).unwrap();
        assert_eq!(object.hooked(ComponentHooks::UPDATE), vec![TypeId::of::<Mana>()]);

        let taken = object.take(TypeId::of::<Mana>()).unwrap();
        assert!(object.component::<Mana>().is_none());
        assert!(object.has_component::<Mana>());

        assert!(object.restore(TypeId::of::<Mana>(), taken).is_none());
        assert!(object.component::<Mana>().is_some());
    }

    #[test]
    fn restore_hands_back_orphans() {
        let mut object = GameObject::new("Ghost");
        object.attach(Mana).unwrap();
        let taken = object.take(TypeId::of::<Mana>()).unwrap();
        assert!(object.detach(TypeId::of::<Mana>()).is_some());
        assert!(object.restore(TypeId::of::<Mana>(), taken).is_some());
    }
}
