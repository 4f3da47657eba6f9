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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A copyable, hashable, non-owning handle to an object of type `T`.
///
/// It combines the owning store's id, a slot index and a generation count to
/// solve the "ABA problem": when an object is destroyed its slot can be
/// recycled, but the generation is incremented first, so older handles to that
/// slot no longer match.
pub struct Resource<T> {
    pub(crate) store: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Resource<T> {
    pub(crate) fn new(store: u32, index: u32, generation: u32) -> Self {
        Self {
            store,
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// The slot index this handle points at.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The slot generation this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The id of the store that issued this handle.
    pub fn store_id(&self) -> u32 {
        self.store
    }
}

// Manual impls: deriving would require `T` itself to be `Clone`, `Eq`, ...

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resource<T> {}

impl<T> PartialEq for Resource<T> {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl<T> Eq for Resource<T> {}

impl<T> Hash for Resource<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        write!(
            f,
            "Resource<{short}>({}:{}v{})",
            self.store, self.index, self.generation
        )
    }
}
