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

//! Engine configuration, stored as RON.
//!
//! ```ron
//! (
//!     fixed_update_hz: 50,
//!     target_frame_rate: 60,
//!     window: (title: "Sandbox", width: 1280, height: 720),
//! )
//! ```
//!
//! Every field is optional; missing fields take their default value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vesper_core::io::{FileStream, Reader, Writer};
use vesper_core::{EngineError, EngineResult};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Settings of the window service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// The window title.
    pub title: String,
    /// Inner width in physical pixels.
    pub width: u32,
    /// Inner height in physical pixels.
    pub height: u32,
    /// Closes the headless window after this many main-loop iterations.
    /// `None` keeps it open until a close is requested.
    pub frame_limit: Option<u64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vesper".to_owned(),
            width: 1280,
            height: 720,
            frame_limit: None,
        }
    }
}

/// Settings read once at boot and installed as a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed simulation steps per second.
    pub fixed_update_hz: u32,
    /// Variable-rate frames per second.
    pub target_frame_rate: u32,
    /// Fixed steps run at most per main-loop iteration; whole steps beyond
    /// this are dropped.
    pub max_fixed_steps_per_tick: u32,
    /// `env_logger` filter used unless `RUST_LOG` is set.
    pub log_filter: String,
    /// Window settings.
    pub window: WindowConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_update_hz: 50,
            target_frame_rate: 60,
            max_fixed_steps_per_tick: 8,
            log_filter: "info".to_owned(),
            window: WindowConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> EngineResult<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| EngineError::Config(format!("invalid RON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from the rest of `reader`.
    pub fn from_reader(reader: &mut dyn Reader) -> EngineResult<Self> {
        let bytes = reader.read_to_end()?;
        let text = String::from_utf8(bytes)
            .map_err(|e| EngineError::Config(format!("configuration is not UTF-8: {e}")))?;
        Self::from_ron_str(&text)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        log::info!("Loading configuration from {}", path.display());
        let mut stream = FileStream::open(path)?;
        Self::from_reader(&mut stream)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron_string(&self) -> EngineResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Writes the configuration to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let text = self.to_ron_string()?;
        let mut stream = FileStream::create(path)?;
        stream.write_all(text.as_bytes())?;
        stream.flush()
    }

    /// Rejects values the scheduler cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.fixed_update_hz == 0 {
            return Err(EngineError::Config("fixed_update_hz must be positive".to_owned()));
        }
        if self.target_frame_rate == 0 {
            return Err(EngineError::Config(
                "target_frame_rate must be positive".to_owned(),
            ));
        }
        if self.max_fixed_steps_per_tick == 0 {
            return Err(EngineError::Config(
                "max_fixed_steps_per_tick must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// The length of one fixed step.
    pub fn fixed_step(&self) -> Duration {
        period_of(self.fixed_update_hz)
    }

    /// The minimum time between two processed frames.
    pub fn frame_period(&self) -> Duration {
        period_of(self.target_frame_rate)
    }
}

/// `1 / hz` seconds, rounded to the nearest nanosecond.
fn period_of(hz: u32) -> Duration {
    let hz = u64::from(hz.max(1));
    Duration::from_nanos((NANOS_PER_SEC + hz / 2) / hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_core::io::MemoryStream;

    #[test]
    fn defaults_match_the_documented_rates() {
        let config = EngineConfig::default();
        assert_eq!(config.fixed_step(), Duration::from_millis(20));
        assert_eq!(config.frame_period(), Duration::from_nanos(16_666_667));
        assert_eq!(config.max_fixed_steps_per_tick, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config =
            EngineConfig::from_ron_str("(fixed_update_hz: 100, window: (title: \"Demo\"))").unwrap();

        assert_eq!(config.fixed_update_hz, 100);
        assert_eq!(config.target_frame_rate, 60);
        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.frame_limit, None);
    }

    #[test]
    fn malformed_or_invalid_input_is_a_config_error() {
        assert!(matches!(
            EngineConfig::from_ron_str("(fixed_update_hz: \"fast\")"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_ron_str("(fixed_update_hz: 0)"),
            Err(EngineError::Config(_))
        ));
        let mut not_utf8 = MemoryStream::from_bytes(vec![0xff, 0xfe]);
        assert!(matches!(
            EngineConfig::from_reader(&mut not_utf8),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn save_and_load_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let mut config = EngineConfig::default();
        config.window.frame_limit = Some(10);
        config.log_filter = "debug".to_owned();

        config.save(&path).unwrap();

        assert_eq!(EngineConfig::load(&path).unwrap(), config);
        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.ron")),
            Err(EngineError::Io(_))
        ));
    }
}
