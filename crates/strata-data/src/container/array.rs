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

//! Multi-chunk shapes: arrays of chunks stored in one allocation per component.
//!
//! Node-owned buffers hold the nodes of every element back to back and
//! chunk-owned buffers hold one instance per element. The component data array
//! stores a slot group per element pointing into the shared buffers; the first
//! group owns the allocations.

use std::sync::Arc;

use crate::container::base::{Container, ShapeLayout};
use crate::container::kind::ContainerKind;
use crate::container::view::{ChunkView, ChunkViewMut, ElementCounts};
use crate::structure::ChunkStructure;
use strata_core::strata_assert;

/// A layout made of several chunk elements.
pub trait MultiChunkLayout: ShapeLayout {
    /// Number of elements.
    fn element_count(&self) -> usize;

    /// Node count of `element`.
    fn element_node_count(&self, element: usize) -> usize;

    /// Index of the first node of `element` in the node-owned buffers.
    fn element_node_offset(&self, element: usize) -> usize;
}

fn rebuild_element_slots<L: MultiChunkLayout>(layout: &L, structure: &ChunkStructure, slots: &mut [*mut u8]) {
    let cc = structure.component_count();
    for element in 1..layout.element_count() {
        let offset = layout.element_node_offset(element);
        for (c, ty) in structure.component_types().iter().enumerate() {
            slots[element * cc + c] = ty.instance_ptr(slots[c], ty.instance_index(offset, element));
        }
    }
}

/// Layout of a [`ChunkArray`]: elements with individual node counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayLayout {
    node_counts: Vec<usize>,
    offsets: Vec<usize>,
}

impl ArrayLayout {
    /// A layout for elements holding `node_counts` nodes each.
    pub fn new(node_counts: &[usize]) -> Self {
        let offsets = node_counts
            .iter()
            .scan(0, |next, &count| {
                let offset = *next;
                *next += count;
                Some(offset)
            })
            .collect();
        Self {
            node_counts: node_counts.to_vec(),
            offsets,
        }
    }

    /// Node count of every element.
    pub fn node_counts(&self) -> &[usize] {
        &self.node_counts
    }

    fn total_nodes(&self) -> usize {
        self.node_counts.iter().sum()
    }
}

impl ShapeLayout for ArrayLayout {
    const KIND: ContainerKind = ContainerKind::Array;

    fn node_capacity(&self, _node_count: usize) -> usize {
        self.total_nodes()
    }

    fn chunk_count(&self) -> usize {
        self.node_counts.len()
    }

    fn elements(&self, _node_count: usize) -> ElementCounts<'_> {
        ElementCounts::Varying(&self.node_counts)
    }

    fn rebuild_slots(&self, structure: &ChunkStructure, slots: &mut [*mut u8]) {
        rebuild_element_slots(self, structure, slots);
    }
}

impl MultiChunkLayout for ArrayLayout {
    fn element_count(&self) -> usize {
        self.node_counts.len()
    }

    fn element_node_count(&self, element: usize) -> usize {
        self.node_counts[element]
    }

    fn element_node_offset(&self, element: usize) -> usize {
        self.offsets[element]
    }
}

/// Layout of a [`UniformArray`]: elements sharing one node count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformLayout {
    chunk_count: usize,
    nodes_per_chunk: usize,
}

impl UniformLayout {
    /// A layout of `chunk_count` elements of `nodes_per_chunk` nodes.
    pub fn new(chunk_count: usize, nodes_per_chunk: usize) -> Self {
        Self {
            chunk_count,
            nodes_per_chunk,
        }
    }

    /// Node count of every element.
    pub fn nodes_per_chunk(&self) -> usize {
        self.nodes_per_chunk
    }
}

impl ShapeLayout for UniformLayout {
    const KIND: ContainerKind = ContainerKind::UniformArray;

    fn node_capacity(&self, _node_count: usize) -> usize {
        self.chunk_count * self.nodes_per_chunk
    }

    fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    fn elements(&self, _node_count: usize) -> ElementCounts<'_> {
        ElementCounts::Uniform {
            chunk_count: self.chunk_count,
            nodes_per_chunk: self.nodes_per_chunk,
        }
    }

    fn rebuild_slots(&self, structure: &ChunkStructure, slots: &mut [*mut u8]) {
        rebuild_element_slots(self, structure, slots);
    }
}

impl MultiChunkLayout for UniformLayout {
    fn element_count(&self) -> usize {
        self.chunk_count
    }

    fn element_node_count(&self, _element: usize) -> usize {
        self.nodes_per_chunk
    }

    fn element_node_offset(&self, element: usize) -> usize {
        element * self.nodes_per_chunk
    }
}

/// An array of chunks with individual node counts.
pub type ChunkArray = Container<ArrayLayout>;

/// An array of chunks with the same node count.
pub type UniformArray = Container<UniformLayout>;

impl Container<ArrayLayout> {
    /// Allocates one element per entry of `node_counts`.
    pub fn new(structure: Arc<ChunkStructure>, node_counts: &[usize]) -> Self {
        let layout = ArrayLayout::new(node_counts);
        let total = layout.total_nodes();
        log::trace!("Allocating array of {} chunks, {} nodes", node_counts.len(), total);
        Self::allocate(structure, layout, total)
    }
}

impl Container<UniformLayout> {
    /// Allocates `chunk_count` elements of `nodes_per_chunk` nodes.
    pub fn new(structure: Arc<ChunkStructure>, chunk_count: usize, nodes_per_chunk: usize) -> Self {
        log::trace!(
            "Allocating uniform array of {} chunks of {} nodes",
            chunk_count,
            nodes_per_chunk
        );
        Self::allocate(
            structure,
            UniformLayout::new(chunk_count, nodes_per_chunk),
            chunk_count * nodes_per_chunk,
        )
    }
}

/// Element access of a multi-chunk container.
pub trait MultiChunk {
    /// Number of chunk elements.
    fn element_count(&self) -> usize;

    /// Node count of `element`.
    fn element_node_count(&self, element: usize) -> usize;

    /// A view of one element, or `None` if no data is held.
    fn element(&self, element: usize) -> Option<ChunkView<'_>>;

    /// A mutable view of one element, or `None` if no data is held.
    fn element_mut(&mut self, element: usize) -> Option<ChunkViewMut<'_>>;
}

impl<L: MultiChunkLayout> MultiChunk for Container<L> {
    fn element_count(&self) -> usize {
        if self.is_null() {
            0
        } else {
            self.layout.element_count()
        }
    }

    fn element_node_count(&self, element: usize) -> usize {
        self.layout.element_node_count(element)
    }

    fn element(&self, element: usize) -> Option<ChunkView<'_>> {
        let structure = self.core.structure.as_ref()?;
        let slots = self.core.slots.as_deref()?;
        let group = element_group(structure, slots, element, self.layout.element_count());
        Some(ChunkView::new(
            structure,
            group,
            self.layout.element_node_count(element),
            1,
        ))
    }

    fn element_mut(&mut self, element: usize) -> Option<ChunkViewMut<'_>> {
        let structure = self.core.structure.as_ref()?;
        let slots = self.core.slots.as_deref()?;
        let group = element_group(structure, slots, element, self.layout.element_count());
        Some(ChunkViewMut::new(
            structure,
            group,
            self.layout.element_node_count(element),
            1,
        ))
    }
}

fn element_group<'a>(
    structure: &ChunkStructure,
    slots: &'a [*mut u8],
    element: usize,
    element_count: usize,
) -> &'a [*mut u8] {
    strata_assert!(
        element < element_count,
        "element {} out of range of {}",
        element,
        element_count
    );
    let cc = structure.component_count();
    &slots[element * cc..(element + 1) * cc]
}

impl<L: MultiChunkLayout> Container<L> {
    /// Views of every element in order.
    pub fn elements(&self) -> impl Iterator<Item = ChunkView<'_>> + '_ {
        (0..self.element_count()).filter_map(move |e| self.element(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentOwner, ComponentType};
    use crate::container::own::Owned;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Path(String);
    impl Component for Path {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Depth(u16);
    impl Component for Depth {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Batch(u32);
    impl Component for Batch {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    fn structure() -> Arc<ChunkStructure> {
        Arc::new(ChunkStructure::new(vec![
            Arc::new(ComponentType::of::<Path>()),
            Arc::new(ComponentType::of::<Depth>()),
            Arc::new(ComponentType::of::<Batch>()),
        ]))
    }

    fn label(array: &mut impl MultiChunk, element: usize) {
        let mut view = array.element_mut(element).unwrap();
        for (i, depth) in view.component_slice_mut::<Depth>().unwrap().iter_mut().enumerate() {
            depth.0 = (element * 10 + i) as u16;
        }
        view.chunk_component_mut::<Batch>().unwrap().0 = element as u32;
    }

    #[test]
    fn test_array_elements() {
        let mut array = ChunkArray::new(structure(), &[2, 0, 3]);
        assert_eq!(array.element_count(), 3);
        assert_eq!(array.chunk_count(), 3);
        assert_eq!(array.node_count(), 5);
        assert_eq!(array.element_node_count(2), 3);
        for e in 0..3 {
            label(&mut array, e);
        }

        let depths: Vec<_> = array.component_slice::<Depth>().unwrap().iter().map(|d| d.0).collect();
        assert_eq!(depths, vec![0, 1, 20, 21, 22]);
        let batches: Vec<_> = array.component_slice::<Batch>().unwrap().iter().map(|b| b.0).collect();
        assert_eq!(batches, vec![0, 1, 2]);
        assert!(array.element(1).unwrap().component_slice::<Depth>().unwrap().is_empty());
    }

    #[test]
    fn test_uniform_elements() {
        let mut array = UniformArray::new(structure(), 3, 2);
        assert_eq!(array.node_count(), 6);
        assert_eq!(array.node_capacity(), 6);
        for e in 0..3 {
            label(&mut array, e);
        }
        let views: Vec<_> = array.elements().collect();
        assert_eq!(views.len(), 3);
        assert_eq!(views[2].component_slice::<Depth>().unwrap(), &[Depth(20), Depth(21)]);
        assert_eq!(views[1].chunk_component::<Batch>(), Some(&Batch(1)));
    }

    #[test]
    fn test_array_clone_rebuilds_slots() {
        let mut array = ChunkArray::new(structure(), &[1, 2]);
        label(&mut array, 1);
        array.element_mut(1).unwrap().component_slice_mut::<Path>().unwrap()[1]
            .0
            .push_str("leaf");

        let copy = array.clone();
        drop(array);

        let element = copy.element(1).unwrap();
        assert_eq!(element.component_slice::<Path>().unwrap()[1].0, "leaf");
        assert_eq!(element.component_slice::<Depth>().unwrap(), &[Depth(10), Depth(11)]);
        assert_eq!(element.chunk_component::<Batch>(), Some(&Batch(1)));
    }

    #[test]
    fn test_array_clone_from_other_shape() {
        let mut source = ChunkArray::new(structure(), &[3, 1]);
        label(&mut source, 1);
        let mut target = ChunkArray::new(structure(), &[1, 1]);

        target.clone_from(&source);

        assert_eq!(target.layout().node_counts(), &[3, 1]);
        assert_eq!(
            target.element(1).unwrap().component_slice::<Depth>().unwrap(),
            &[Depth(10)]
        );
    }

    #[test]
    fn test_empty_array() {
        let mut array = ChunkArray::new(structure(), &[]);
        assert_eq!(array.element_count(), 0);
        assert_eq!(array.node_count(), 0);
        assert_eq!(array.elements().count(), 0);
        let taken = array.take();
        assert!(array.is_null());
        assert!(!taken.is_null());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_element_out_of_range() {
        let array = UniformArray::new(structure(), 2, 1);
        let _ = array.element(2);
    }
}
