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

use super::handle::Resource;
use crate::error::{EngineError, EngineResult};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_STORE_ID: AtomicU32 = AtomicU32::new(1);

/// A slot-based owning collection handing out [`Resource`] handles.
///
/// The store keeps a dense list of slots and a free list of indices available
/// for reuse, enabling O(1) insertion and removal. Each slot carries a
/// generation that is incremented when its object is removed, *before* the
/// slot can be handed out again.
pub struct ResourceStore<T> {
    id: u32,
    /// Every slot ever allocated: its current generation and, if occupied, the value.
    slots: Vec<(u32, Option<T>)>,
    /// Indices of unoccupied slots, reused last-in first-out.
    free: Vec<u32>,
    len: usize,
}

impl<T> ResourceStore<T> {
    /// Creates a new, empty store with a process-unique id.
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// The id stamped into every handle issued by this store.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Moves `value` into the store and returns a handle to it.
    ///
    /// If there are indices in the free list, one is reused with its current
    /// (already incremented) generation. Otherwise a new slot is appended.
    pub fn insert(&mut self, value: T) -> Resource<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let (generation, slot) = &mut self.slots[index as usize];
            *slot = Some(value);
            Resource::new(self.id, index, *generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push((0, Some(value)));
            Resource::new(self.id, index, 0)
        }
    }

    /// Returns `true` if `handle` refers to a live object of this store.
    pub fn contains(&self, handle: Resource<T>) -> bool {
        self.get(handle).is_ok()
    }

    /// Resolves `handle` to a shared reference.
    ///
    /// Fails with [`EngineError::StaleReference`] if the handle belongs to
    /// another store, or if its object has been removed (even if the slot was
    /// reused since).
    pub fn get(&self, handle: Resource<T>) -> EngineResult<&T> {
        if handle.store != self.id {
            return Err(stale(handle));
        }
        match self.slots.get(handle.index as usize) {
            Some((generation, Some(value))) if *generation == handle.generation => Ok(value),
            _ => Err(stale(handle)),
        }
    }

    /// Resolves `handle` to a mutable reference. See [`get`](Self::get).
    pub fn get_mut(&mut self, handle: Resource<T>) -> EngineResult<&mut T> {
        if handle.store != self.id {
            return Err(stale(handle));
        }
        match self.slots.get_mut(handle.index as usize) {
            Some((generation, Some(value))) if *generation == handle.generation => Ok(value),
            _ => Err(stale(handle)),
        }
    }

    /// Removes the object `handle` refers to and returns it.
    ///
    /// The slot's generation is incremented before the slot is released, so
    /// every outstanding handle to it becomes stale.
    pub fn remove(&mut self, handle: Resource<T>) -> EngineResult<T> {
        self.get(handle)?;
        let (generation, slot) = &mut self.slots[handle.index as usize];
        let value = slot.take().ok_or_else(|| stale(handle))?;
        *generation = generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Ok(value)
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the store holds no live object.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total number of slots (both live and free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns handles to every live object, in slot order.
    pub fn handles(&self) -> Vec<Resource<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Iterates over every live object with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (Resource<T>, &T)> + '_ {
        let id = self.id;
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, (generation, slot))| {
                slot.as_ref()
                    .map(|value| (Resource::new(id, index as u32, *generation), value))
            })
    }

    /// Iterates mutably over every live object with its handle.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Resource<T>, &mut T)> + '_ {
        let id = self.id;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, (generation, slot))| {
                slot.as_mut()
                    .map(|value| (Resource::new(id, index as u32, *generation), value))
            })
    }

    /// Removes every object. All outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, (generation, slot)) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                *generation = generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }
}

impl<T> Default for ResourceStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn stale<T>(handle: Resource<T>) -> EngineError {
    EngineError::StaleReference {
        type_name: std::any::type_name::<T>(),
        index: handle.index,
        generation: handle.generation,
    }
}
