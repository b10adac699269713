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

//! # Strata Core
//!
//! Foundational contracts shared by the strata storage crates: the host allocator
//! seam, process-wide storage memory counters, the error type, the storage
//! configuration and the precondition assertion used across the engine.

#![warn(missing_docs)]

pub mod assert;
pub mod config;
pub mod error;
pub mod memory;

pub use config::StorageConfig;
pub use error::{StrataError, StrataResult};
pub use memory::{host_allocator, install_host_allocator, HostAllocator, SystemAllocator};

#[doc(hidden)]
pub use log as __log;
