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

//! Provides the engine's typed, synchronous publish/subscribe dispatcher.
//!
//! Events are plain immutable values implementing [`Event`]. Each event type
//! maps to one [`EventKind`] tag, and the [`EventBus`] keeps one ordered
//! listener list per tag. Dispatch is synchronous and happens on the calling
//! (simulation) thread; the only cross-thread entry point is the
//! [`DeferredSender`], whose events are queued until the simulation thread
//! flushes them.

mod bus;
mod deferred;
mod kinds;

pub use self::bus::EventBus;
pub use self::deferred::DeferredSender;
pub use self::kinds::*;
