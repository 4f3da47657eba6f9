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

//! Defines the error taxonomy shared by every engine subsystem.

use thiserror::Error;

/// A convenient alias for results produced by engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// The errors raised by the engine's object/lifecycle runtime.
///
/// `StaleReference` is the only variant callers are expected to handle
/// locally: it signals that a long-lived handle outlived its object. Every
/// other variant denotes a wiring or programming mistake and is meant to
/// bubble up to the top-level run loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A service was resolved before it was registered.
    #[error("Service not found: {type_name}")]
    ServiceNotFound {
        /// The type name of the missing service.
        type_name: &'static str,
    },

    /// A service was registered twice without an intervening removal.
    #[error("Service already registered: {type_name}")]
    DuplicateService {
        /// The type name of the duplicated service.
        type_name: &'static str,
    },

    /// A handle no longer refers to the object it was created for.
    #[error("Stale reference to {type_name} (slot {index}, generation {generation})")]
    StaleReference {
        /// The type name of the referenced object.
        type_name: &'static str,
        /// The slot index carried by the handle.
        index: u32,
        /// The generation carried by the handle.
        generation: u32,
    },

    /// A component of the same concrete type is already attached to the entity.
    #[error("Component {type_name} is already attached to game object '{object}'")]
    DuplicateComponent {
        /// The type name of the duplicated component.
        type_name: &'static str,
        /// The display name of the game object.
        object: String,
    },

    /// An indexed access fell outside the valid range.
    #[error("Index {index} is out of range (length {len})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The valid length.
        len: usize,
    },

    /// A native subsystem (window, graphics context, ...) failed to initialize.
    #[error("Native initialization failed: {0}")]
    NativeInitFailure(String),

    /// A scene hierarchy operation would break the tree invariants.
    #[error("Invalid hierarchy operation: {0}")]
    InvalidHierarchy(String),

    /// A shared object was accessed while it was already mutably borrowed.
    #[error("Re-entrant access to {type_name}")]
    ReentrantAccess {
        /// The type name of the object being accessed.
        type_name: &'static str,
    },

    /// A string could not be parsed as an identifier.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The engine configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation on a byte stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error raised by user code (listeners, behaviours, init callbacks).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    /// Returns `true` for the recoverable stale-handle condition.
    pub fn is_stale_reference(&self) -> bool {
        matches!(self, EngineError::StaleReference { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_type() {
        let err = EngineError::ServiceNotFound {
            type_name: "EventBus",
        };
        assert_eq!(err.to_string(), "Service not found: EventBus");

        let err = EngineError::OutOfRange { index: 3, len: 3 };
        assert_eq!(err.to_string(), "Index 3 is out of range (length 3)");
    }

    #[test]
    fn stale_reference_is_recoverable() {
        let err = EngineError::StaleReference {
            type_name: "GameObject",
            index: 0,
            generation: 1,
        };
        assert!(err.is_stale_reference());
        assert!(!EngineError::NativeInitFailure("gpu".into()).is_stale_reference());
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
