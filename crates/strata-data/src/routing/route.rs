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

//! Recorded routes and their cache.

use std::sync::Arc;

use ahash::AHashMap;

use crate::structure::ChunkStructure;

/// The resolution of an algorithm's requirements against one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmRoute {
    /// Component index in the structure for every declared requirement, in
    /// declaration order; `None` for an absent optional component.
    Route(Vec<Option<usize>>),
    /// A required component is absent from the structure.
    Mismatch,
}

impl AlgorithmRoute {
    /// Returns `true` if the structure satisfies the algorithm.
    pub fn is_match(&self) -> bool {
        matches!(self, AlgorithmRoute::Route(_))
    }
}

/// Routes keyed by structure identity.
///
/// Every entry keeps its structure alive so that the address used as key can
/// never be reused by another structure while the entry exists.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: AHashMap<usize, (Arc<ChunkStructure>, AlgorithmRoute)>,
}

impl RouteCache {
    /// Creates a cache with room for `capacity` structures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity),
        }
    }

    fn key(structure: &Arc<ChunkStructure>) -> usize {
        Arc::as_ptr(structure) as usize
    }

    /// The route recorded for `structure`.
    pub fn get(&self, structure: &Arc<ChunkStructure>) -> Option<&AlgorithmRoute> {
        self.entries.get(&Self::key(structure)).map(|(_, route)| route)
    }

    /// Records the route for `structure`.
    pub fn insert(&mut self, structure: &Arc<ChunkStructure>, route: AlgorithmRoute) {
        self.entries
            .insert(Self::key(structure), (Arc::clone(structure), route));
    }

    /// Number of recorded structures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every route and releases the structures.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
