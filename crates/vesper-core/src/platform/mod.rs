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

//! Types shared with platform backends.

use std::ffi::c_void;

/// An opaque pointer owned by a native subsystem (window, GPU context, physics body).
///
/// The engine never dereferences it; it only carries the pointer between the
/// services that produced and consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(*mut c_void);

impl NativeHandle {
    /// Returns a null handle, used by backends without a native object.
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// Wraps a raw pointer.
    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Returns the wrapped pointer.
    pub const fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Returns `true` if the handle is null.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl Default for NativeHandle {
    fn default() -> Self {
        Self::null()
    }
}
