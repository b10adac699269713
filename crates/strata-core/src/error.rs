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

//! Error types for the fallible, non-fatal parts of the engine.
//!
//! Broken storage preconditions are not errors in this sense: they go through
//! [`strata_assert!`](crate::strata_assert) and terminate. `StrataError` covers the
//! ambient operations that can legitimately fail at runtime.

use std::path::PathBuf;
use thiserror::Error;

/// A convenience alias for results produced by strata crates.
pub type StrataResult<T> = Result<T, StrataError>;

/// Errors produced by configuration handling and engine setup.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A host allocator was already installed for this process.
    #[error("a host allocator is already installed ('{0}')")]
    AllocatorAlreadyInstalled(&'static str),
}

impl StrataError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
