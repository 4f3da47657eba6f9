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

//! # Vesper Core
//!
//! Foundational crate containing the object/lifecycle primitives every other
//! part of the engine is built on: identifiers, the service container,
//! generation-checked resource handles, the event bus and the small set of
//! math and I/O types they need.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod identifier;
pub mod io;
pub mod math;
pub mod platform;
pub mod resource;
pub mod services;
pub mod time;

pub use error::{EngineError, EngineResult};
pub use identifier::Identifier;
pub use time::Stopwatch;
