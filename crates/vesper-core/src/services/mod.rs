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

//! A typed dependency container for engine subsystems.
//!
//! Every engine subsystem (event bus, window, scene manager, simulation, ...)
//! is a *service*: a singleton stored in the [`ServiceContainer`] under its
//! own type. Services enter and leave the container only through
//! [`Installer`]s, whose call order at boot is the engine's dependency graph.
//!
//! # Design
//!
//! The container performs no dependency discovery. Resolving a service that
//! has not been installed yet is an error, not a lazy construction.

mod container;
mod factory;
mod installer;

pub use self::container::ServiceContainer;
pub use self::factory::Factory;
pub use self::installer::{Installer, InstallerStack};
