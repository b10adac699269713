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

//! Canonical chunk structures.
//!
//! A [`ChunkStructure`] is the sorted, deduplicated set of component types a
//! chunk stores. Structures are interned by the
//! [`ChunkStructureRegistry`](crate::registry::ChunkStructureRegistry), so two
//! containers share a structure exactly when their `Arc`s point to the same
//! allocation.

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;

use crate::component::{Component, ComponentOwner, ComponentType};

/// The golden-ratio constant used by the hash combiner.
const HASH_COMBINE_SEED: u64 = 0x9e37_79b9;

/// Folds `value` into `seed` the way `boost::hash_combine` does.
#[inline]
fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(HASH_COMBINE_SEED)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

fn hash_type_id(type_id: TypeId) -> u64 {
    let mut hasher = DefaultHasher::new();
    type_id.hash(&mut hasher);
    hasher.finish()
}

/// Computes the canonical hash of a sorted component list.
pub(crate) fn canonical_hash(components: &[Arc<ComponentType>]) -> u64 {
    components
        .iter()
        .fold(0, |seed, ty| hash_combine(seed, hash_type_id(ty.type_id())))
}

/// Sorts component types by identity and removes duplicates.
pub(crate) fn canonicalize(mut components: Vec<Arc<ComponentType>>) -> Vec<Arc<ComponentType>> {
    components.sort_by_key(|ty| ty.type_id());
    components.dedup_by_key(|ty| ty.type_id());
    components
}

/// An immutable, canonical set of component types.
///
/// Besides the sorted component list, a structure precomputes the index
/// subsets the bulk node protocol iterates: node-owned and chunk-owned
/// components, and among each the ones that need a constructor or a destructor
/// call.
pub struct ChunkStructure {
    /// Component types sorted by `TypeId`, without duplicates.
    components: Vec<Arc<ComponentType>>,
    /// Canonical hash of `components`.
    hash: u64,
    /// Maps a component's `TypeId` to its index in `components`.
    index_by_type: AHashMap<TypeId, usize>,
    node_components: Vec<usize>,
    chunk_components: Vec<usize>,
    node_components_to_construct: Vec<usize>,
    chunk_components_to_construct: Vec<usize>,
    node_components_to_destruct: Vec<usize>,
    chunk_components_to_destruct: Vec<usize>,
    /// Number of identity lookups served by [`ChunkStructure::index_of`].
    lookups: AtomicU64,
}

impl ChunkStructure {
    /// Builds a structure from an arbitrary list of component types.
    ///
    /// The list is sorted and deduplicated. Structures built this way are not
    /// interned; use the structure registry to get shared instances.
    pub fn new(components: Vec<Arc<ComponentType>>) -> Self {
        let components = canonicalize(components);
        let hash = canonical_hash(&components);

        let mut index_by_type = AHashMap::with_capacity(components.len());
        let mut node_components = Vec::new();
        let mut chunk_components = Vec::new();
        let mut node_components_to_construct = Vec::new();
        let mut chunk_components_to_construct = Vec::new();
        let mut node_components_to_destruct = Vec::new();
        let mut chunk_components_to_destruct = Vec::new();

        for (index, ty) in components.iter().enumerate() {
            index_by_type.insert(ty.type_id(), index);
            let (all, to_construct, to_destruct) = match ty.owner() {
                ComponentOwner::Node => (
                    &mut node_components,
                    &mut node_components_to_construct,
                    &mut node_components_to_destruct,
                ),
                ComponentOwner::Chunk => (
                    &mut chunk_components,
                    &mut chunk_components_to_construct,
                    &mut chunk_components_to_destruct,
                ),
            };
            all.push(index);
            if ty.needs_construct() {
                to_construct.push(index);
            }
            if ty.needs_destruct() {
                to_destruct.push(index);
            }
        }

        Self {
            components,
            hash,
            index_by_type,
            node_components,
            chunk_components,
            node_components_to_construct,
            chunk_components_to_construct,
            node_components_to_destruct,
            chunk_components_to_destruct,
            lookups: AtomicU64::new(0),
        }
    }

    /// The canonical hash of the component list.
    #[must_use]
    pub fn canonical_hash(&self) -> u64 {
        self.hash
    }

    /// Returns `true` if both structures hold the same component types.
    ///
    /// Interned structures can be compared with `Arc::ptr_eq` instead.
    #[must_use]
    pub fn is_same(&self, other: &ChunkStructure) -> bool {
        self.hash == other.hash
            && self.components.len() == other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.type_id() == b.type_id())
    }

    /// Returns `true` if this structure holds exactly `components` once canonicalized.
    pub(crate) fn matches_canonical(&self, components: &[Arc<ComponentType>]) -> bool {
        self.components.len() == components.len()
            && self
                .components
                .iter()
                .zip(components)
                .all(|(a, b)| a.type_id() == b.type_id())
    }

    /// Number of component types.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// The sorted component types.
    #[must_use]
    pub fn component_types(&self) -> &[Arc<ComponentType>] {
        &self.components
    }

    /// The component type at `index`.
    #[inline]
    #[must_use]
    pub fn component_type(&self, index: usize) -> &ComponentType {
        &self.components[index]
    }

    /// Index of the component identified by `type_id`, if present.
    ///
    /// This is the slow identity lookup path; every call is counted (see
    /// [`ChunkStructure::lookup_count`]).
    pub fn index_of(&self, type_id: TypeId) -> Option<usize> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.index_by_type.get(&type_id).copied()
    }

    /// Index of the component `T`, if present.
    pub fn index_of_type<T: Component>(&self) -> Option<usize> {
        self.index_of(TypeId::of::<T>())
    }

    /// Returns `true` if the structure holds component `T`.
    ///
    /// Does not count as an identity lookup.
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.index_by_type.contains_key(&TypeId::of::<T>())
    }

    /// Number of identity lookups served so far.
    #[must_use]
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Indices of node-owned components.
    #[must_use]
    pub fn node_component_indices(&self) -> &[usize] {
        &self.node_components
    }

    /// Indices of chunk-owned components.
    #[must_use]
    pub fn chunk_component_indices(&self) -> &[usize] {
        &self.chunk_components
    }

    /// Indices of node-owned components with a non-trivial constructor.
    #[must_use]
    pub fn node_components_to_construct(&self) -> &[usize] {
        &self.node_components_to_construct
    }

    /// Indices of chunk-owned components with a non-trivial constructor.
    #[must_use]
    pub fn chunk_components_to_construct(&self) -> &[usize] {
        &self.chunk_components_to_construct
    }

    /// Indices of node-owned components with a non-trivial destructor.
    #[must_use]
    pub fn node_components_to_destruct(&self) -> &[usize] {
        &self.node_components_to_destruct
    }

    /// Indices of chunk-owned components with a non-trivial destructor.
    #[must_use]
    pub fn chunk_components_to_destruct(&self) -> &[usize] {
        &self.chunk_components_to_destruct
    }
}

impl PartialEq for ChunkStructure {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for ChunkStructure {}

impl Hash for ChunkStructure {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for ChunkStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStructure")
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Position(#[allow(dead_code)] [f32; 3]);
    impl Component for Position {}

    #[derive(Clone, Default)]
    struct Velocity(#[allow(dead_code)] [f32; 3]);
    impl Component for Velocity {}

    #[derive(Clone, Default)]
    struct Label(#[allow(dead_code)] String);
    impl Component for Label {}

    #[derive(Clone, Default)]
    struct Gravity(#[allow(dead_code)] f32);
    impl Component for Gravity {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    fn ty<T: Component>() -> Arc<ComponentType> {
        Arc::new(ComponentType::of::<T>())
    }

    #[test]
    fn test_hash_combine_matches_reference_formula() {
        let seed = 0x1234_u64;
        let value = 0xabcd_u64;
        let expected = seed ^ (value + 0x9e37_79b9 + (seed << 6) + (seed >> 2));
        assert_eq!(hash_combine(seed, value), expected);
    }

    #[test]
    fn test_structure_is_order_independent() {
        let (p, v) = (ty::<Position>(), ty::<Velocity>());
        let a = ChunkStructure::new(vec![p.clone(), v.clone()]);
        let b = ChunkStructure::new(vec![v.clone(), p.clone(), v]);

        assert!(a.is_same(&b));
        assert_eq!(a.canonical_hash(), b.canonical_hash());
        assert_eq!(b.component_count(), 2, "Duplicates are removed");
    }

    #[test]
    fn test_structures_with_extra_component_differ() {
        let (p, v, l) = (ty::<Position>(), ty::<Velocity>(), ty::<Label>());
        let a = ChunkStructure::new(vec![p.clone(), v.clone()]);
        let b = ChunkStructure::new(vec![p, v, l]);

        assert!(!a.is_same(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_index_subsets() {
        let structure = ChunkStructure::new(vec![
            ty::<Position>(),
            ty::<Label>(),
            ty::<Gravity>(),
        ]);

        let label = structure.index_of_type::<Label>().unwrap();
        let gravity = structure.index_of_type::<Gravity>().unwrap();

        assert_eq!(structure.node_component_indices().len(), 2);
        assert_eq!(structure.chunk_component_indices(), &[gravity]);
        assert_eq!(structure.node_components_to_destruct(), &[label]);
        assert!(structure.chunk_components_to_destruct().is_empty());
        // Every general-table component has a constructor.
        assert_eq!(structure.node_components_to_construct().len(), 2);
        assert_eq!(structure.chunk_components_to_construct(), &[gravity]);
    }

    #[test]
    fn test_lookup_counter_and_missing_component() {
        let structure = ChunkStructure::new(vec![ty::<Position>()]);
        assert_eq!(structure.lookup_count(), 0);

        assert!(structure.index_of_type::<Position>().is_some());
        assert!(structure.index_of_type::<Velocity>().is_none());
        assert_eq!(structure.lookup_count(), 2);

        assert!(structure.contains::<Position>());
        assert_eq!(structure.lookup_count(), 2, "contains() is not an identity lookup");
    }
}
