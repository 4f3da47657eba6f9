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

//! Generation-checked handles to engine-owned objects.
//!
//! A [`Resource<T>`] is an indirect reference into a [`ResourceStore<T>`]:
//! it names the owning store, a slot index and the slot's generation at the
//! time the handle was issued. The store bumps a slot's generation whenever
//! the object living there is destroyed, so a handle held past its object's
//! lifetime is detected as stale instead of silently resolving to whatever
//! object reuses the slot.
//!
//! Handles carry no ownership. Ownership lives in the store only.

mod handle;
mod store;

pub use self::handle::Resource;
pub use self::store::ResourceStore;
