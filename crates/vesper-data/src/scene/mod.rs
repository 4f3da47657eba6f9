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

//! Implements the scene graph.
//!
//! A [`Scene`] owns a tree of [`GameObject`]s rooted at a single root object.
//! Every game object carries a [`Transform`] and any number of
//! [`Component`]s, at most one per concrete type. Components opt into
//! per-step hooks through [`ComponentHooks`]; the [`SceneManager`] service
//! drives those hooks from the engine events and reaps destroyed game objects
//! at the end of each frame.

mod camera;
mod component;
mod game_object;
mod graph;
mod manager;
mod transform;

pub use camera::Camera;
pub use component::{AsAny, Component, ComponentContext, ComponentHooks};
pub use game_object::GameObject;
pub use graph::Scene;
pub use manager::SceneManager;
pub use transform::Transform;
