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

//! Borrowed views over component data.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::component::Component;
use crate::structure::ChunkStructure;
use strata_core::strata_assert;

/// A shared, non-owning view over one chunk's component data.
///
/// For multi-chunk containers the view covers every element: node-owned
/// buffers are contiguous across elements and chunk-owned buffers hold one
/// instance per element.
#[derive(Clone, Copy)]
pub struct ChunkView<'a> {
    structure: &'a Arc<ChunkStructure>,
    slots: &'a [*mut u8],
    node_count: usize,
    chunk_count: usize,
}

impl<'a> ChunkView<'a> {
    pub(crate) fn new(
        structure: &'a Arc<ChunkStructure>,
        slots: &'a [*mut u8],
        node_count: usize,
        chunk_count: usize,
    ) -> Self {
        Self {
            structure,
            slots,
            node_count,
            chunk_count,
        }
    }

    /// The structure of the viewed data.
    #[must_use]
    pub fn structure(&self) -> &'a Arc<ChunkStructure> {
        self.structure
    }

    /// Live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Chunk instances held by chunk-owned buffers.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// The buffer of the component at `index`.
    #[must_use]
    pub fn component_data(&self, index: usize) -> *const u8 {
        strata_assert!(
            index < self.structure.component_count(),
            "component index {} out of range",
            index
        );
        self.slots[index]
    }

    /// Typed access to the live instances of `T`.
    #[must_use]
    pub fn component_slice<T: Component>(&self) -> Option<&'a [T]> {
        let (ptr, len) = typed_range::<T>(self.structure, self.slots, self.node_count, self.chunk_count)?;
        // SAFETY: the first `len` instances of the buffer are constructed and
        // the borrow of the owning container outlives 'a.
        Some(unsafe { std::slice::from_raw_parts(ptr as *const T, len) })
    }

    /// The first chunk-owned instance of `T`.
    #[must_use]
    pub fn chunk_component<T: Component>(&self) -> Option<&'a T> {
        self.component_slice::<T>()?.first()
    }
}

/// An exclusive, non-owning view over one chunk's component data.
pub struct ChunkViewMut<'a> {
    structure: &'a Arc<ChunkStructure>,
    slots: &'a [*mut u8],
    node_count: usize,
    chunk_count: usize,
    _marker: PhantomData<&'a mut u8>,
}

impl<'a> ChunkViewMut<'a> {
    pub(crate) fn new(
        structure: &'a Arc<ChunkStructure>,
        slots: &'a [*mut u8],
        node_count: usize,
        chunk_count: usize,
    ) -> Self {
        Self {
            structure,
            slots,
            node_count,
            chunk_count,
            _marker: PhantomData,
        }
    }

    /// A shared view over the same data.
    #[must_use]
    pub fn as_view(&self) -> ChunkView<'_> {
        ChunkView::new(self.structure, self.slots, self.node_count, self.chunk_count)
    }

    /// Reborrows the view for a shorter lifetime.
    pub fn reborrow(&mut self) -> ChunkViewMut<'_> {
        ChunkViewMut::new(self.structure, self.slots, self.node_count, self.chunk_count)
    }

    /// The structure of the viewed data.
    #[must_use]
    pub fn structure(&self) -> &'a Arc<ChunkStructure> {
        self.structure
    }

    /// Live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Chunk instances held by chunk-owned buffers.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// The buffer of the component at `index`.
    #[must_use]
    pub fn component_data_mut(&mut self, index: usize) -> *mut u8 {
        strata_assert!(
            index < self.structure.component_count(),
            "component index {} out of range",
            index
        );
        self.slots[index]
    }

    /// Mutable typed access to the live instances of `T`.
    pub fn component_slice_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        self.reborrow().into_component_slice_mut::<T>()
    }

    /// Consumes the view into a mutable slice bound to the view's lifetime.
    pub fn into_component_slice_mut<T: Component>(self) -> Option<&'a mut [T]> {
        let (ptr, len) = typed_range::<T>(self.structure, self.slots, self.node_count, self.chunk_count)?;
        // SAFETY: the view was created from an exclusive borrow of the
        // container and the first `len` instances are constructed.
        Some(unsafe { std::slice::from_raw_parts_mut(ptr as *mut T, len) })
    }

    /// The first chunk-owned instance of `T`.
    pub fn chunk_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component_slice_mut::<T>()?.first_mut()
    }
}

fn typed_range<T: Component>(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    node_count: usize,
    chunk_count: usize,
) -> Option<(*mut u8, usize)> {
    let index = structure.index_of(std::any::TypeId::of::<T>())?;
    let ty = &structure.component_types()[index];
    Some((slots[index], ty.instance_count(node_count, chunk_count)))
}

/// Node counts of the chunks an algorithm runs on, one per execution.
#[derive(Debug, Clone, Copy)]
pub enum ElementCounts<'a> {
    /// A single chunk.
    Single(usize),
    /// `chunk_count` chunks of `nodes_per_chunk` nodes each.
    Uniform {
        /// Number of chunks.
        chunk_count: usize,
        /// Nodes in every chunk.
        nodes_per_chunk: usize,
    },
    /// One chunk per entry, with the given node count.
    Varying(&'a [usize]),
}

impl ElementCounts<'_> {
    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        match *self {
            ElementCounts::Single(_) => 1,
            ElementCounts::Uniform { chunk_count, .. } => chunk_count,
            ElementCounts::Varying(counts) => counts.len(),
        }
    }

    /// Returns `true` if there is no chunk to run on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node count of chunk `element`.
    #[must_use]
    pub fn get(&self, element: usize) -> usize {
        match *self {
            ElementCounts::Single(count) => count,
            ElementCounts::Uniform { nodes_per_chunk, .. } => nodes_per_chunk,
            ElementCounts::Varying(counts) => counts[element],
        }
    }
}

/// What a router needs from a container: its structure, the base slots and
/// the node count of every chunk element.
pub struct RouteFrame<'a> {
    pub(crate) structure: &'a Arc<ChunkStructure>,
    pub(crate) slots: &'a [*mut u8],
    pub(crate) elements: ElementCounts<'a>,
    _marker: PhantomData<&'a mut u8>,
}

impl<'a> RouteFrame<'a> {
    pub(crate) fn new(
        structure: &'a Arc<ChunkStructure>,
        slots: &'a [*mut u8],
        elements: ElementCounts<'a>,
    ) -> Self {
        Self {
            structure,
            slots,
            elements,
            _marker: PhantomData,
        }
    }

    /// The structure of the routed data.
    #[must_use]
    pub fn structure(&self) -> &'a Arc<ChunkStructure> {
        self.structure
    }

    /// The chunk elements an algorithm is executed on.
    #[must_use]
    pub fn elements(&self) -> ElementCounts<'a> {
        self.elements
    }
}

/// Anything an algorithm can be routed over.
pub trait RouteTarget {
    /// Exclusive access to the routable data, or `None` if no data is held.
    fn route_frame(&mut self) -> Option<RouteFrame<'_>>;
}

impl<T: RouteTarget + ?Sized> RouteTarget for &mut T {
    fn route_frame(&mut self) -> Option<RouteFrame<'_>> {
        (**self).route_frame()
    }
}

impl RouteTarget for ChunkViewMut<'_> {
    fn route_frame(&mut self) -> Option<RouteFrame<'_>> {
        Some(RouteFrame::new(
            self.structure,
            self.slots,
            ElementCounts::Single(self.node_count),
        ))
    }
}
