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

//! Storage configuration.
//!
//! A `StorageConfig` is a small JSON-serializable document that tunes the memory
//! policy of component types and the defaults used by chunk registries.

use crate::error::{StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Memory policy applied to every component type interned by a catalog.
///
/// The policy is captured per component type at intern time, so changing a
/// catalog's configuration never affects types it already interned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryPolicy {
    /// Fill component memory with zeroes before default construction.
    pub zero_on_construct: bool,
    /// Fill component memory with zeroes after destruction.
    pub zero_on_destruct: bool,
}

/// Tuning knobs for a storage registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Memory policy for component types.
    pub memory: MemoryPolicy,
    /// Node capacity given to a bunch created without an explicit capacity.
    pub initial_bunch_capacity: usize,
    /// Number of structures a router cache reserves room for up front.
    pub route_cache_capacity_hint: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            memory: MemoryPolicy::default(),
            initial_bunch_capacity: 16,
            route_cache_capacity_hint: 8,
        }
    }
}

impl StorageConfig {
    /// A configuration for debugging memory issues: component memory is zeroed
    /// before construction and after destruction.
    pub fn debug_memory() -> Self {
        Self {
            memory: MemoryPolicy {
                zero_on_construct: true,
                zero_on_destruct: true,
            },
            ..Self::default()
        }
    }

    /// Checks that every value is within its accepted range.
    pub fn validate(&self) -> StrataResult<()> {
        if self.initial_bunch_capacity == 0 {
            return Err(StrataError::InvalidConfig(
                "initial_bunch_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON string. Missing fields take their default value.
    pub fn from_json(json: &str) -> StrataResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> StrataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StrataError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Saves the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> StrataResult<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| StrataError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StorageConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.memory.zero_on_construct);
        assert!(!config.memory.zero_on_destruct);
        assert_eq!(config.initial_bunch_capacity, 16);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = StorageConfig::from_json(r#"{ "memory": { "zero_on_destruct": true } }"#)
            .expect("partial config should parse");
        assert!(config.memory.zero_on_destruct);
        assert!(!config.memory.zero_on_construct);
        assert_eq!(
            config.initial_bunch_capacity,
            StorageConfig::default().initial_bunch_capacity
        );
    }

    #[test]
    fn test_zero_bunch_capacity_is_rejected() {
        let result = StorageConfig::from_json(r#"{ "initial_bunch_capacity": 0 }"#);
        assert!(matches!(result, Err(StrataError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let result = StorageConfig::from_json("{ initial_bunch_capacity: ");
        assert!(matches!(result, Err(StrataError::Json(_))));
    }

    #[test]
    fn test_file_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage.json");

        let config = StorageConfig {
            initial_bunch_capacity: 64,
            ..StorageConfig::debug_memory()
        };
        config.to_file(&path)?;

        let loaded = StorageConfig::from_file(&path)?;
        assert_eq!(loaded, config, "Config should survive a file round trip");
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = StorageConfig::from_file("/definitely/not/here/storage.json").unwrap_err();
        assert!(err.to_string().contains("storage.json"));
    }
}
