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

//! Capacity-bounded shapes: the fixed-capacity bucket and the growable bunch.

use std::sync::Arc;

use crate::container::base::{Container, ShapeLayout};
use crate::container::kind::ContainerKind;
use crate::node::{self, Extent};
use crate::structure::ChunkStructure;
use strata_core::strata_assert;

/// A layout with a node capacity independent of the node count.
pub trait CapacityLayout: ShapeLayout {
    /// Creates the layout for `capacity` nodes.
    fn with_capacity(capacity: usize) -> Self;

    /// Node capacity.
    fn capacity(&self) -> usize;

    /// Capacity needed to add `additional` nodes to `node_count`, or `None`
    /// if the layout cannot grow.
    fn grown_capacity(&self, _node_count: usize, _additional: usize) -> Option<usize> {
        None
    }
}

/// Layout of a [`Bucket`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketLayout {
    capacity: usize,
}

impl ShapeLayout for BucketLayout {
    const KIND: ContainerKind = ContainerKind::Bucket;

    fn node_capacity(&self, _node_count: usize) -> usize {
        self.capacity
    }
}

impl CapacityLayout for BucketLayout {
    fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Layout of a [`Bunch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BunchLayout {
    capacity: usize,
}

impl ShapeLayout for BunchLayout {
    const KIND: ContainerKind = ContainerKind::Bunch;

    fn node_capacity(&self, _node_count: usize) -> usize {
        self.capacity
    }
}

impl CapacityLayout for BunchLayout {
    fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn grown_capacity(&self, node_count: usize, additional: usize) -> Option<usize> {
        let needed = node_count.checked_add(additional)?;
        (needed > self.capacity).then(|| self.capacity.saturating_mul(2).max(needed))
    }
}

/// A chunk with a fixed node capacity and a variable node count.
pub type Bucket = Container<BucketLayout>;

/// A bucket that reallocates when its capacity is exceeded.
pub type Bunch = Container<BunchLayout>;

impl<L: CapacityLayout> Container<L> {
    /// Allocates an empty container able to hold `capacity` nodes.
    pub fn with_capacity(structure: Arc<ChunkStructure>, capacity: usize) -> Self {
        log::trace!("Allocating {:?} with capacity {}", L::KIND, capacity);
        Self::allocate(structure, L::with_capacity(capacity), 0)
    }
}

/// Node bookkeeping of a container with spare capacity.
///
/// Removal never shrinks capacity. Chunk-owned components are left alone by
/// every operation here.
pub trait Bounded {
    /// Nodes that can be added without exceeding the capacity.
    fn available_nodes(&self) -> usize;

    /// Adds one default-constructed node. See [`Bounded::add_nodes`].
    fn add_node(&mut self) -> Option<usize> {
        self.add_nodes(1)
    }

    /// Adds `count` default-constructed nodes at the end and returns the index
    /// of the first one.
    ///
    /// Returns `None` without touching the container when the capacity would
    /// be exceeded and the shape cannot grow, or when the node count would
    /// overflow. A growable shape in the `StructNull` state allocates on its
    /// first growth; a fixed-capacity one returns `None`. Adding to a container
    /// without a structure is fatal.
    fn add_nodes(&mut self, count: usize) -> Option<usize>;

    /// Removes `count` nodes from `first`, shifting every following node down.
    fn remove_node_keep_order(&mut self, first: usize, count: usize);

    /// Removes `count` nodes from `first`, filling the gap with the last nodes.
    ///
    /// At most `count` nodes are moved, but the relative order of the survivors
    /// is not preserved.
    fn remove_node(&mut self, first: usize, count: usize);

    /// Destructs every node component and sets the node count to zero.
    fn clear(&mut self);

    /// Exchanges the node components of nodes `a` and `b`.
    fn swap_nodes(&mut self, a: usize, b: usize);
}

/// A bounded container that can change its capacity.
pub trait Growable: Bounded {
    /// Ensures room for at least `capacity` nodes.
    fn reserve(&mut self, capacity: usize);

    /// Reallocates to exactly `capacity` nodes, destructing any node past it.
    fn set_capacity(&mut self, capacity: usize);

    /// Reallocates so that the capacity equals the node count.
    fn shrink_to_fit(&mut self);
}

impl<L: CapacityLayout> Bounded for Container<L> {
    fn available_nodes(&self) -> usize {
        self.node_capacity() - self.node_count()
    }

    fn add_nodes(&mut self, count: usize) -> Option<usize> {
        let first = self.node_count();
        if first.checked_add(count)? > self.node_capacity() {
            let grown = self.layout.grown_capacity(first, count)?;
            self.grow(grown);
        }
        if count == 0 {
            return Some(first);
        }

        let (structure, slots) = self.parts_mut();
        // SAFETY: the range [first, first + count) is within capacity and
        // holds no live node.
        unsafe { node::construct_node_components(structure, slots, first, count) };
        self.core.node_count += count;
        Some(first)
    }

    fn remove_node_keep_order(&mut self, first: usize, count: usize) {
        let node_count = self.node_count();
        strata_assert!(
            first.checked_add(count).is_some_and(|end| end <= node_count),
            "cannot remove {} nodes from {} of {}",
            count,
            first,
            node_count
        );
        if count == 0 {
            return;
        }

        let (structure, slots) = self.parts();
        let following = first + count;
        // SAFETY: the removed range is live; the following range is live and
        // is relocated onto the destructed range below it.
        unsafe {
            node::destruct_node_components(structure, slots, first, count);
            if following < node_count {
                node::move_construct_node_components_forward(
                    structure,
                    slots,
                    first,
                    slots,
                    following,
                    node_count - following,
                );
            }
        }
        self.core.node_count -= count;
    }

    fn remove_node(&mut self, first: usize, count: usize) {
        let node_count = self.node_count();
        strata_assert!(
            first.checked_add(count).is_some_and(|end| end <= node_count),
            "cannot remove {} nodes from {} of {}",
            count,
            first,
            node_count
        );
        if count == 0 {
            return;
        }

        let (structure, slots) = self.parts();
        let moving_first = (first + count).max(node_count - count);
        // SAFETY: the removed range is destructed before the tail nodes, which
        // never overlap it, are relocated into its head.
        unsafe {
            node::destruct_node_components(structure, slots, first, count);
            if moving_first < node_count {
                node::move_construct_node_components_forward(
                    structure,
                    slots,
                    first,
                    slots,
                    moving_first,
                    node_count - moving_first,
                );
            }
        }
        self.core.node_count -= count;
    }

    fn clear(&mut self) {
        if self.is_null() {
            return;
        }
        let node_count = self.node_count();
        let (structure, slots) = self.parts_mut();
        // SAFETY: every node below the count is live.
        unsafe { node::destruct_node_components(structure, slots, 0, node_count) };
        self.core.node_count = 0;
    }

    fn swap_nodes(&mut self, a: usize, b: usize) {
        let node_count = self.node_count();
        strata_assert!(
            a < node_count && b < node_count,
            "cannot swap nodes {} and {} of {}",
            a,
            b,
            node_count
        );
        if a == b {
            return;
        }
        let (structure, slots) = self.parts_mut();
        // SAFETY: both nodes are live and distinct.
        unsafe { node::swap_node_components(structure, slots, a, b, 1) };
    }
}

impl<L: CapacityLayout> Container<L> {
    /// Resizes to `capacity`, allocating the buffers of a `StructNull` container.
    fn grow(&mut self, capacity: usize) {
        if !self.is_null() {
            self.resize(capacity);
            return;
        }
        match self.core.structure.clone() {
            Some(structure) => {
                log::trace!("Allocating {:?} with capacity {} on first growth", L::KIND, capacity);
                *self = Self::allocate(structure, L::with_capacity(capacity), 0);
            }
            None => strata_assert!(
                false,
                "container used as data while in the {:?} state",
                self.state()
            ),
        }
    }

    /// Reallocates the node-owned buffers for `capacity` nodes, relocating the
    /// live nodes that still fit.
    fn resize(&mut self, capacity: usize) {
        let current = self.extent();
        let target = Extent {
            node_capacity: capacity,
            node_count: current.node_count.min(capacity),
            ..current
        };
        log::trace!(
            "Reallocating {:?} from {} to {} nodes",
            L::KIND,
            current.node_capacity,
            capacity
        );

        let (structure, slots) = self.parts_mut();
        let from = slots.to_vec();
        // SAFETY: `from` aliases `slots`, which is the in-place growth case.
        unsafe { node::reallocate_move_all_forward(structure, slots, current, &from, target) };
        self.core.node_count = target.node_count;
        self.layout = L::with_capacity(capacity);
    }
}

impl Growable for Container<BunchLayout> {
    fn reserve(&mut self, capacity: usize) {
        if capacity > self.node_capacity() {
            self.grow(capacity);
        }
    }

    fn set_capacity(&mut self, capacity: usize) {
        if capacity != self.node_capacity() {
            self.grow(capacity);
        }
    }

    fn shrink_to_fit(&mut self) {
        self.set_capacity(self.node_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentOwner, ComponentType};

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Tag(String);
    impl Component for Tag {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Mass(u32);
    impl Component for Mass {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Frame(u32);
    impl Component for Frame {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    fn structure() -> Arc<ChunkStructure> {
        Arc::new(ChunkStructure::new(vec![
            Arc::new(ComponentType::of::<Tag>()),
            Arc::new(ComponentType::of::<Mass>()),
            Arc::new(ComponentType::of::<Frame>()),
        ]))
    }

    fn masses<L: CapacityLayout>(c: &Container<L>) -> Vec<u32> {
        c.component_slice::<Mass>().unwrap().iter().map(|m| m.0).collect()
    }

    fn filled<L: CapacityLayout>(capacity: usize, count: usize) -> Container<L> {
        let mut c = Container::<L>::with_capacity(structure(), capacity);
        c.add_nodes(count).unwrap();
        for (i, m) in c.component_slice_mut::<Mass>().unwrap().iter_mut().enumerate() {
            m.0 = i as u32;
        }
        c
    }

    #[test]
    fn test_bucket_add_until_full() {
        let mut bucket = Bucket::with_capacity(structure(), 3);
        assert_eq!(bucket.node_count(), 0);
        assert_eq!(bucket.available_nodes(), 3);
        assert_eq!(bucket.add_nodes(2), Some(0));
        assert_eq!(bucket.add_node(), Some(2));
        assert_eq!(bucket.add_node(), None);
        assert_eq!(bucket.node_count(), 3);
        assert_eq!(bucket.node_capacity(), 3);
    }

    #[test]
    fn test_remove_keep_order() {
        let mut bucket = filled::<BucketLayout>(8, 6);
        bucket.remove_node_keep_order(1, 2);
        assert_eq!(masses(&bucket), vec![0, 3, 4, 5]);
        assert_eq!(bucket.node_capacity(), 8);
    }

    #[test]
    fn test_remove_fills_from_tail() {
        let mut bucket = filled::<BucketLayout>(8, 6);
        bucket.remove_node(1, 2);
        assert_eq!(masses(&bucket), vec![0, 4, 5, 3]);

        let mut bucket = filled::<BucketLayout>(8, 6);
        bucket.remove_node(4, 2);
        assert_eq!(masses(&bucket), vec![0, 1, 2, 3]);

        let mut bucket = filled::<BucketLayout>(8, 3);
        bucket.remove_node(0, 2);
        assert_eq!(masses(&bucket), vec![2]);
    }

    #[test]
    fn test_remove_releases_strings() {
        let mut bucket = Bucket::with_capacity(structure(), 4);
        bucket.add_nodes(4).unwrap();
        for (i, tag) in bucket.component_slice_mut::<Tag>().unwrap().iter_mut().enumerate() {
            tag.0 = format!("node-{i}");
        }
        bucket.remove_node(0, 1);
        let tags: Vec<_> = bucket
            .component_slice::<Tag>()
            .unwrap()
            .iter()
            .map(|t| t.0.clone())
            .collect();
        assert_eq!(tags, vec!["node-3", "node-1", "node-2"]);
    }

    #[test]
    fn test_clear_keeps_chunk_components() {
        let mut bucket = filled::<BucketLayout>(4, 4);
        bucket.component_slice_mut::<Frame>().unwrap()[0] = Frame(12);
        bucket.clear();
        assert_eq!(bucket.node_count(), 0);
        assert_eq!(bucket.component_slice::<Frame>().unwrap(), &[Frame(12)]);
    }

    #[test]
    fn test_swap_nodes() {
        let mut bucket = filled::<BucketLayout>(4, 3);
        bucket.swap_nodes(0, 2);
        assert_eq!(masses(&bucket), vec![2, 1, 0]);
    }

    #[test]
    fn test_bunch_grows() {
        let mut bunch = filled::<BunchLayout>(2, 2);
        assert_eq!(bunch.add_node(), Some(2));
        assert_eq!(bunch.node_capacity(), 4);
        assert_eq!(bunch.add_nodes(5), Some(3));
        assert_eq!(bunch.node_capacity(), 8);
        assert_eq!(&masses(&bunch)[..3], &[0, 1, 0]);
    }

    #[test]
    fn test_bunch_from_zero_capacity() {
        let mut bunch = Bunch::with_capacity(structure(), 0);
        assert_eq!(bunch.add_nodes(3), Some(0));
        assert_eq!(bunch.node_capacity(), 3);
    }

    #[test]
    fn test_bunch_capacity_control() {
        let mut bunch = filled::<BunchLayout>(2, 2);
        bunch.reserve(10);
        assert_eq!(bunch.node_capacity(), 10);
        bunch.reserve(4);
        assert_eq!(bunch.node_capacity(), 10);
        bunch.shrink_to_fit();
        assert_eq!(bunch.node_capacity(), 2);
        bunch.set_capacity(1);
        assert_eq!(bunch.node_count(), 1);
        assert_eq!(masses(&bunch), vec![0]);
    }

    #[test]
    #[should_panic(expected = "cannot remove")]
    fn test_remove_out_of_range() {
        let mut bucket = filled::<BucketLayout>(4, 2);
        bucket.remove_node(1, 2);
    }

    #[test]
    fn test_add_overflow_is_rejected() {
        let mut bucket = filled::<BucketLayout>(2, 1);
        assert_eq!(bucket.add_nodes(usize::MAX), None);
        assert_eq!(bucket.node_count(), 1);
        assert_eq!(bucket.node_capacity(), 2);

        let mut bunch = filled::<BunchLayout>(2, 1);
        let buffer = bunch.component_data(0);
        assert_eq!(bunch.add_nodes(usize::MAX), None);
        assert_eq!(bunch.node_count(), 1);
        assert_eq!(bunch.node_capacity(), 2);
        assert_eq!(bunch.component_data(0), buffer);
        assert_eq!(masses(&bunch), vec![0]);
    }

    #[test]
    fn test_struct_null_shapes() {
        let mut bucket = Bucket::with_structure(structure());
        assert_eq!(bucket.add_node(), None);
        assert!(bucket.is_null());

        let mut bunch = Bunch::with_structure(structure());
        assert_eq!(bunch.add_nodes(0), Some(0));
        assert!(bunch.is_null());
        assert_eq!(bunch.add_node(), Some(0));
        assert!(!bunch.is_null());
        assert_eq!(bunch.node_count(), 1);
        assert_eq!(bunch.node_capacity(), 1);
        assert_eq!(bunch.component_slice::<Frame>().unwrap(), &[Frame(0)]);
    }

    #[test]
    #[should_panic(expected = "VoidNull")]
    fn test_add_without_structure_is_fatal() {
        Bunch::default().add_node();
    }
}
