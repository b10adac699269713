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

//! Component containers.
//!
//! Every shape shares one core (structure, component data array, node count)
//! and differs only in its layout:
//!
//! - [`Chunk`]: a fixed node count.
//! - [`Bucket`]: a fixed capacity and a variable node count ([`Bounded`]).
//! - [`Bunch`]: a bucket that grows on demand ([`Growable`]).
//! - [`ChunkArray`] and [`UniformArray`]: several chunk elements in one
//!   allocation per component ([`MultiChunk`]).
//!
//! Containers own their data ([`Owned`]). [`ChunkTree`] links containers into a
//! forest and [`KindContainer`] dispatches over shapes at runtime.

mod array;
mod base;
mod bounded;
mod chunk;
mod kind;
mod own;
mod tree;
mod view;

pub use array::*;
pub use base::{Container, ContainerState, ShapeLayout};
pub use bounded::*;
pub use chunk::*;
pub use kind::*;
pub use own::Owned;
pub use tree::*;
pub use view::*;
