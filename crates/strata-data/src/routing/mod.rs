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

//! Algorithm routing.
//!
//! An [`Algorithm`] declares the components it needs through [`Binding`]s. A
//! [`Router`] resolves those bindings against a container's structure, runs the
//! algorithm once per chunk and resets the bindings. [`DirectRouter`] resolves
//! with identity lookups every time; [`CachedRouter`] records a route per
//! structure and replays it.

mod algorithm;
mod binder;
mod pipeline;
mod route;
mod router;

pub use algorithm::{Algorithm, Binding, Requirements};
pub use pipeline::Pipeline;
pub use route::{AlgorithmRoute, RouteCache};
pub use router::{CachedRouter, DirectRouter, Router};
