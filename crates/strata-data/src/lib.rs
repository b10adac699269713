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

//! # Strata Data
//!
//! Chunked, type-erased component storage.
//!
//! - [`component`]: component type descriptors and their lifecycle operations.
//! - [`structure`]: canonical sets of component types.
//! - [`node`]: the bulk construct, destruct, move and copy protocol over
//!   component data arrays.
//! - [`container`]: the container shapes built on that protocol.
//! - [`routing`]: binding algorithms to containers, with route caching.
//! - [`registry`]: interning of types and structures, and container storage.

#![warn(missing_docs)]

extern crate self as strata_data;

pub mod component;
pub mod container;
pub mod memory;
pub mod node;
pub mod registry;
pub mod routing;
pub mod structure;

pub use component::{Component, ComponentOwner, ComponentType, ComponentVTable};
pub use container::{
    Bucket, Bunch, Chunk, ChunkArray, ChunkTree, ChunkView, ChunkViewMut, ContainerKind,
    KindContainer, UniformArray,
};
pub use registry::{ChunkHandle, ComponentSet, StorageRegistry};
pub use routing::{Algorithm, Binding, CachedRouter, DirectRouter, Pipeline, Requirements, Router};
pub use structure::ChunkStructure;
/// Derives [`Component`]; `#[component(chunk)]` makes it chunk-owned and
/// `#[component(pod)]` selects the byte-copy lifecycle of `bytemuck::Pod` types.
pub use strata_macros::Component;

/// The traits needed to work with containers and algorithms.
pub mod prelude {
    pub use crate::container::{Bounded, Growable, MultiChunk, Owned, RouteTarget};
    pub use crate::routing::{Algorithm, Requirements, Router};
    pub use crate::Component;
}
