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

//! Globally unique identifiers for entities, components, assets and listeners.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A 128-bit globally unique, immutable identifier.
///
/// Identifiers are the identity key for game objects, scenes, assets and
/// event-listener subscriptions. They are cheap to copy and compare, and
/// round-trip through their canonical hyphenated string form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Identifier(Uuid);

impl Identifier {
    /// The all-zero identifier, never produced by [`Identifier::new`].
    pub const NIL: Identifier = Identifier(Uuid::nil());

    /// Creates a new, random (version 4) `Identifier`.
    ///
    /// The random bytes come from the operating system's cryptographically
    /// secure generator.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from its raw 16 bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the raw 16 bytes of this identifier.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Returns `true` if this is the [`Identifier::NIL`] value.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for Identifier {
    /// Creates a new, random (version 4) `Identifier`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| EngineError::InvalidIdentifier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_identifiers_are_unique() {
        let ids: HashSet<Identifier> = (0..1000).map(|_| Identifier::new()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(!ids.contains(&Identifier::NIL));
    }

    #[test]
    fn canonical_string_round_trip() {
        let id = Identifier::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<Identifier>().unwrap(), id);
    }

    #[test]
    fn parsing_garbage_fails() {
        let err = "not-an-id".parse::<Identifier>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidIdentifier(ref s) if s == "not-an-id"));
    }

    #[test]
    fn bytes_round_trip() {
        let bytes = [7u8; 16];
        let id = Identifier::from_bytes(bytes);
        assert_eq!(id.as_bytes(), &bytes);
        assert!(Identifier::from_bytes([0; 16]).is_nil());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let id: Identifier = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"67e55044-10b1-426f-9247-bb680e5fe0c8\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
