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

//! Interning of chunk structures.

use std::sync::Arc;

use ahash::AHashMap;

use crate::component::ComponentType;
use crate::structure::{canonical_hash, canonicalize, ChunkStructure};

/// A registry that hands out one shared [`ChunkStructure`] per component set.
///
/// Structures are bucketed by canonical hash and compared component by
/// component inside a bucket, so two lists naming the same types in any order
/// yield the same `Arc`.
#[derive(Debug, Default)]
pub struct ChunkStructureRegistry {
    buckets: AHashMap<u64, Vec<Arc<ChunkStructure>>>,
    len: usize,
}

impl ChunkStructureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the interned structure holding `components`, creating it on
    /// first use. Order and duplicates in `components` are irrelevant.
    pub fn get_or_add(&mut self, components: &[Arc<ComponentType>]) -> Arc<ChunkStructure> {
        let canonical = canonicalize(components.to_vec());
        let hash = canonical_hash(&canonical);
        let bucket = self.buckets.entry(hash).or_default();

        if let Some(existing) = bucket.iter().find(|s| s.matches_canonical(&canonical)) {
            return Arc::clone(existing);
        }

        let structure = Arc::new(ChunkStructure::new(canonical));
        log::debug!(
            "Interned chunk structure {:016x} with {} components",
            hash,
            structure.component_count()
        );
        bucket.push(Arc::clone(&structure));
        self.len += 1;
        structure
    }

    /// The interned structure holding `components`, if any.
    pub fn find(&self, components: &[Arc<ComponentType>]) -> Option<&Arc<ChunkStructure>> {
        let canonical = canonicalize(components.to_vec());
        self.buckets
            .get(&canonical_hash(&canonical))?
            .iter()
            .find(|s| s.matches_canonical(&canonical))
    }

    /// Number of interned structures.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is interned.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over every interned structure, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ChunkStructure>> {
        self.buckets.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    #[derive(Clone, Default)]
    struct North(u8);
    impl Component for North {}

    #[derive(Clone, Default)]
    struct South(u16);
    impl Component for South {}

    #[derive(Clone, Default)]
    struct East(u32);
    impl Component for East {}

    fn types() -> (Arc<ComponentType>, Arc<ComponentType>, Arc<ComponentType>) {
        (
            Arc::new(ComponentType::of::<North>()),
            Arc::new(ComponentType::of::<South>()),
            Arc::new(ComponentType::of::<East>()),
        )
    }

    #[test]
    fn test_interning_ignores_order_and_duplicates() {
        let (n, s, e) = types();
        let mut registry = ChunkStructureRegistry::new();
        let a = registry.get_or_add(&[Arc::clone(&n), Arc::clone(&s), Arc::clone(&e)]);
        let b = registry.get_or_add(&[Arc::clone(&e), Arc::clone(&n), Arc::clone(&s), Arc::clone(&n)]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert_eq!(a.component_count(), 3);
    }

    #[test]
    fn test_distinct_sets() {
        let (n, s, e) = types();
        let mut registry = ChunkStructureRegistry::new();
        let ns = registry.get_or_add(&[Arc::clone(&n), Arc::clone(&s)]);
        let ne = registry.get_or_add(&[Arc::clone(&n), Arc::clone(&e)]);
        let empty = registry.get_or_add(&[]);
        assert!(!Arc::ptr_eq(&ns, &ne));
        assert_eq!(empty.component_count(), 0);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.iter().count(), 3);
        assert!(registry.find(&[s, n]).is_some_and(|f| Arc::ptr_eq(f, &ns)));
        assert!(registry.find(&[e]).is_none());
    }
}
