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

use super::container::ServiceContainer;
use crate::error::EngineResult;
use std::fmt;

type BuildFn<T> = dyn Fn(&ServiceContainer) -> EngineResult<T>;

/// Produces new instances of `T`.
///
/// A factory is itself registered as a service (see
/// [`ServiceContainer::add_factory`]), and receives the container on every
/// call so it can pull in the services the new instance depends on. It holds
/// no other state.
pub struct Factory<T: 'static> {
    build: Box<BuildFn<T>>,
}

impl<T: 'static> Factory<T> {
    /// Creates a factory from a build function.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&ServiceContainer) -> EngineResult<T> + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }

    /// Builds a new instance.
    pub fn create(&self, services: &ServiceContainer) -> EngineResult<T> {
        (self.build)(services)
    }
}

impl<T: Default + 'static> Factory<T> {
    /// Creates a factory that builds `T::default()`.
    pub fn from_default() -> Self {
        Self::new(|_| Ok(T::default()))
    }
}

impl<T: 'static> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Factory<{}>", std::any::type_name::<T>())
    }
}
