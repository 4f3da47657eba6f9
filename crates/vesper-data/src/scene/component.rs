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

use super::game_object::GameObject;
use super::graph::Scene;
use bitflags::bitflags;
use std::any::Any;
use vesper_core::resource::Resource;
use vesper_core::time::FrameTime;
use vesper_core::EngineResult;

bitflags! {
    /// The lifecycle hooks a component wants to be called for.
    ///
    /// The scene only invokes hooks whose flag is set, so components that
    /// merely hold data cost nothing per frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentHooks: u8 {
        /// Call [`Component::on_fixed_update`] once per fixed step.
        const FIXED_UPDATE = 1 << 0;
        /// Call [`Component::on_update`] once per processed frame.
        const UPDATE = 1 << 1;
        /// Call [`Component::on_render`] once per processed frame.
        const RENDER = 1 << 2;
        /// Call [`Component::on_destroy`] when the component is detached or reaped.
        const DESTROY = 1 << 3;
    }
}

/// Upcasting to [`Any`], implemented for every `'static` type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What a hook receives: the scene it runs in, the owning game object and
/// the timing of the current step.
///
/// While a hook runs, its own component is detached from the game object, so
/// looking it up through `scene` returns `None`. Every other part of the scene
/// is freely accessible, including destroying game objects.
pub struct ComponentContext<'a> {
    /// The scene that owns the game object.
    pub scene: &'a mut Scene,
    /// The game object the component is attached to.
    pub entity: Resource<GameObject>,
    /// Timing of the current fixed step or frame.
    pub time: FrameTime,
}

/// A unit of data and behaviour attached to a [`GameObject`].
///
/// A game object holds at most one component of each concrete type.
///
/// # Examples
///
/// ```
/// use vesper_data::scene::{Component, ComponentContext, ComponentHooks};
/// use vesper_core::EngineResult;
///
/// #[derive(Default)]
/// struct Spinner { turns: u32 }
///
/// impl Component for Spinner {
///     fn hooks(&self) -> ComponentHooks {
///         ComponentHooks::UPDATE
///     }
///
///     fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
///         self.turns += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Component: AsAny {
    /// The hooks this component implements. Read once when it is attached.
    fn hooks(&self) -> ComponentHooks {
        ComponentHooks::empty()
    }

    /// Called once per fixed simulation step.
    fn on_fixed_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Called once per processed frame, before rendering.
    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Called once per processed frame, after every update.
    fn on_render(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        Ok(())
    }

    /// Called exactly once, when the component is removed or its game
    /// object is reaped.
    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) -> EngineResult<()> {
        Ok(())
    }
}

/// Downcasts a type-erased component.
pub(crate) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

/// Downcasts a type-erased component mutably.
pub(crate) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}

/// One of the per-step hooks, paired with its capability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    FixedUpdate,
    Update,
    Render,
    Destroy,
}

impl Hook {
    pub(crate) fn flag(self) -> ComponentHooks {
        match self {
            Hook::FixedUpdate => ComponentHooks::FIXED_UPDATE,
            Hook::Update => ComponentHooks::UPDATE,
            Hook::Render => ComponentHooks::RENDER,
            Hook::Destroy => ComponentHooks::DESTROY,
        }
    }

    pub(crate) fn invoke(
        self,
        component: &mut dyn Component,
        ctx: &mut ComponentContext<'_>,
    ) -> EngineResult<()> {
        match self {
            Hook::FixedUpdate => component.on_fixed_update(ctx),
            Hook::Update => component.on_update(ctx),
            Hook::Render => component.on_render(ctx),
            Hook::Destroy => component.on_destroy(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl Component for Marker {}

    struct Ticker(u32);
    impl Component for Ticker {
        fn hooks(&self) -> ComponentHooks {
            ComponentHooks::UPDATE | ComponentHooks::DESTROY
        }
    }

    #[test]
    fn default_hooks_are_empty() {
        assert!(Marker.hooks().is_empty());
        assert!(Ticker(0).hooks().contains(ComponentHooks::UPDATE));
        assert!(!Ticker(0).hooks().contains(ComponentHooks::RENDER));
    }

    #[test]
    fn downcast_through_trait_object() {
        let mut boxed: Box<dyn Component> = Box::new(Ticker(3));
        assert!(downcast_ref::<Marker>(&*boxed).is_none());
        downcast_mut::<Ticker>(&mut *boxed).unwrap().0 += 1;
        assert_eq!(downcast_ref::<Ticker>(&*boxed).unwrap().0, 4);
    }

    #[test]
    fn hook_flags_match_capabilities() {
        assert_eq!(Hook::FixedUpdate.flag(), ComponentHooks::FIXED_UPDATE);
        assert_eq!(Hook::Destroy.flag(), ComponentHooks::DESTROY);
    }
}
