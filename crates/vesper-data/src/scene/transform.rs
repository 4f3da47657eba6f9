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

use super::component::Component;
use super::game_object::GameObject;
use std::cell::Cell;
use vesper_core::math::{Mat4, Quaternion, Vec3};
use vesper_core::resource::Resource;

/// The position, rotation and scale of a game object relative to its parent,
/// plus its links in the scene hierarchy.
///
/// Every game object owns exactly one `Transform`. Matrices are computed
/// lazily: setters only mark this node dirty. When a world matrix is read,
/// the scene walks from the root down and each node recomputes only if it is
/// dirty itself or its parent produced a new world matrix since the last read
/// (tracked through `revision`). A write therefore never touches the parent's
/// cache and only invalidates this node's subtree.
#[derive(Debug)]
pub struct Transform {
    translation: Vec3,
    rotation: Quaternion,
    scale: Vec3,

    parent: Option<Resource<GameObject>>,
    children: Vec<Resource<GameObject>>,

    local: Cell<Mat4>,
    local_dirty: Cell<bool>,
    world: Cell<Mat4>,
    world_dirty: Cell<bool>,
    /// Bumped every time `world` is recomputed.
    revision: Cell<u64>,
    /// The parent's `revision` that `world` was computed against.
    parent_revision: Cell<u64>,
}

impl Transform {
    /// Creates an unparented transform with the given local values.
    pub fn new(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            parent: None,
            children: Vec::new(),
            local: Cell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world: Cell::new(Mat4::IDENTITY),
            world_dirty: Cell::new(true),
            revision: Cell::new(0),
            parent_revision: Cell::new(0),
        }
    }

    /// Creates an unparented identity transform.
    pub fn identity() -> Self {
        Self::new(Vec3::ZERO, Quaternion::IDENTITY, Vec3::ONE)
    }

    /// The local translation.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// The local rotation.
    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    /// The local scale.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Sets the local translation.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.mark_local_dirty();
    }

    /// Moves the transform by `delta` in parent space.
    pub fn translate(&mut self, delta: Vec3) {
        self.set_translation(self.translation + delta);
    }

    /// Sets the local rotation.
    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
        self.mark_local_dirty();
    }

    /// Applies `rotation` after the current local rotation.
    pub fn rotate(&mut self, rotation: Quaternion) {
        self.set_rotation((rotation * self.rotation).normalize());
    }

    /// Sets the local scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.mark_local_dirty();
    }

    /// The game object this transform is parented to. Only the scene root has none.
    pub fn parent(&self) -> Option<Resource<GameObject>> {
        self.parent
    }

    /// The child game objects, in attachment order.
    pub fn children(&self) -> &[Resource<GameObject>] {
        &self.children
    }

    /// Returns `T * R * S` for the local values, recomputing it if needed.
    pub fn local_matrix(&self) -> Mat4 {
        if self.local_dirty.get() {
            self.local
                .set(Mat4::from_trs(self.translation, self.rotation, self.scale));
            self.local_dirty.set(false);
        }
        self.local.get()
    }

    /// Returns `true` if the cached world matrix is known to be out of date.
    ///
    /// A `false` result does not guarantee freshness: an ancestor may have
    /// changed since.
    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get() || self.local_dirty.get()
    }

    /// Resolves the world matrix given the parent's world matrix and revision.
    ///
    /// Returns the world matrix and this node's revision, for the children.
    pub(crate) fn resolve_world(&self, parent_world: Mat4, parent_revision: u64) -> (Mat4, u64) {
        if self.is_world_dirty() || self.parent_revision.get() != parent_revision {
            self.world.set(parent_world * self.local_matrix());
            self.world_dirty.set(false);
            self.parent_revision.set(parent_revision);
            self.revision.set(self.revision.get().wrapping_add(1));
        }
        (self.world.get(), self.revision.get())
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<Resource<GameObject>>) {
        self.parent = parent;
        self.world_dirty.set(true);
    }

    pub(crate) fn push_child(&mut self, child: Resource<GameObject>) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: Resource<GameObject>) -> bool {
        match self.children.iter().position(|c| *c == child) {
            Some(position) => {
                self.children.remove(position);
                true
            }
            None => false,
        }
    }

    fn mark_local_dirty(&mut self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transforms live on the game object itself; this impl lets them take part
/// in typed component lookups and the one-of-each rule.
impl Component for Transform {}
