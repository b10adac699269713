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

//! The container core shared by every shape.
//!
//! A [`Container`] pairs a [`ChunkCore`] (structure, component data array,
//! node count) with a shape layout `L` that describes capacity and how many
//! chunk elements the component data array addresses. Concrete shapes are type
//! aliases over `Container<L>`; capabilities are traits implemented for the
//! layouts that support them.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::component::Component;
use crate::container::kind::ContainerKind;
use crate::container::view::{ChunkView, ChunkViewMut, ElementCounts, RouteFrame, RouteTarget};
use crate::node::{self, Extent};
use crate::structure::ChunkStructure;
use strata_core::strata_assert;

/// The null state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerState {
    /// No structure and no data: a default-constructed placeholder.
    VoidNull,
    /// A known structure without allocated data.
    StructNull,
    /// A structure with allocated component data.
    StructData,
}

/// Structure, component data array and node count of a container.
///
/// The component data array holds one buffer pointer per component, or one
/// per component per chunk element for multi-chunk shapes (element `e` owns
/// slots `e * component_count..(e + 1) * component_count`).
pub struct ChunkCore {
    pub(crate) structure: Option<Arc<ChunkStructure>>,
    pub(crate) slots: Option<Box<[*mut u8]>>,
    pub(crate) node_count: usize,
}

impl ChunkCore {
    /// A core without structure or data.
    pub(crate) const fn void() -> Self {
        Self {
            structure: None,
            slots: None,
            node_count: 0,
        }
    }

    /// Assembles a core from its parts.
    ///
    /// Data without a structure can never be destructed nor freed, so it is a
    /// fatal error.
    pub(crate) fn from_parts(
        structure: Option<Arc<ChunkStructure>>,
        slots: Option<Box<[*mut u8]>>,
        node_count: usize,
    ) -> Self {
        strata_assert!(
            structure.is_some() || slots.is_none(),
            "a container cannot hold component data without a structure"
        );
        Self {
            structure,
            slots,
            node_count,
        }
    }

    pub(crate) fn state(&self) -> ContainerState {
        match (&self.structure, &self.slots) {
            (None, None) => ContainerState::VoidNull,
            (Some(_), None) => ContainerState::StructNull,
            (Some(_), Some(_)) => ContainerState::StructData,
            (None, Some(_)) => {
                strata_assert!(false, "container holds data without a structure");
                unreachable!()
            }
        }
    }

    /// Allocates an empty component data array for `groups` chunk elements.
    pub(crate) fn empty_slots(structure: &ChunkStructure, groups: usize) -> Box<[*mut u8]> {
        vec![std::ptr::null_mut(); structure.component_count() * groups.max(1)].into_boxed_slice()
    }
}

/// A shape layout: the per-shape state that sits next to a [`ChunkCore`].
pub trait ShapeLayout: Clone + Default + fmt::Debug {
    /// The runtime tag of the shape.
    const KIND: ContainerKind;

    /// Nodes the node-owned buffers can hold, given the live node count.
    fn node_capacity(&self, node_count: usize) -> usize;

    /// Number of chunk elements, which is also the chunk capacity.
    fn chunk_count(&self) -> usize {
        1
    }

    /// Node counts of the chunks an algorithm is executed on.
    fn elements(&self, node_count: usize) -> ElementCounts<'_> {
        ElementCounts::Single(node_count)
    }

    /// Recomputes the per-element slots from the first `component_count` slots.
    fn rebuild_slots(&self, _structure: &ChunkStructure, _slots: &mut [*mut u8]) {}
}

/// A container: a core plus a shape layout.
///
/// Containers exclusively own their component memory. Cloning deep-copies
/// every live component, dropping destructs then frees, and moving transfers
/// the buffers without touching them. Containers are neither `Send` nor
/// `Sync`: component memory stays on the thread that allocated it.
pub struct Container<L: ShapeLayout> {
    pub(crate) core: ChunkCore,
    pub(crate) layout: L,
}

impl<L: ShapeLayout> Default for Container<L> {
    fn default() -> Self {
        Self {
            core: ChunkCore::void(),
            layout: L::default(),
        }
    }
}

impl<L: ShapeLayout> Container<L> {
    /// A `StructNull` container: the structure is known, nothing is allocated.
    pub fn with_structure(structure: Arc<ChunkStructure>) -> Self {
        Self {
            core: ChunkCore::from_parts(Some(structure), None, 0),
            layout: L::default(),
        }
    }

    /// Allocates buffers for the layout and constructs `node_count` nodes and every chunk.
    pub(crate) fn allocate(structure: Arc<ChunkStructure>, layout: L, node_count: usize) -> Self {
        let chunk_count = layout.chunk_count();
        let extent = Extent {
            node_capacity: layout.node_capacity(node_count),
            chunk_capacity: chunk_count,
            node_count,
            chunk_count,
        };
        strata_assert!(
            extent.node_count <= extent.node_capacity,
            "node count {} exceeds capacity {}",
            extent.node_count,
            extent.node_capacity
        );

        let mut slots = ChunkCore::empty_slots(&structure, chunk_count);
        // SAFETY: `slots` is fresh and sized for the structure.
        unsafe { node::allocate_construct_all(&structure, &mut slots, extent) };
        layout.rebuild_slots(&structure, &mut slots);

        Self {
            core: ChunkCore::from_parts(Some(structure), Some(slots), node_count),
            layout,
        }
    }

    /// The runtime tag of this shape.
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        L::KIND
    }

    /// The null state of the container.
    #[must_use]
    pub fn state(&self) -> ContainerState {
        self.core.state()
    }

    /// Returns `true` if no component data is allocated.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.core.slots.is_none()
    }

    /// Returns `true` if the container has a structure.
    #[must_use]
    pub fn has_structure(&self) -> bool {
        self.core.structure.is_some()
    }

    /// The structure, if known.
    #[must_use]
    pub fn structure(&self) -> Option<&Arc<ChunkStructure>> {
        self.core.structure.as_ref()
    }

    /// Returns `true` if both containers use the same interned structure.
    #[must_use]
    pub fn is_same_structure<M: ShapeLayout>(&self, other: &Container<M>) -> bool {
        match (&self.core.structure, &other.core.structure) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Live nodes across all chunk elements.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.core.node_count
    }

    /// Node capacity across all chunk elements.
    #[must_use]
    pub fn node_capacity(&self) -> usize {
        if self.is_null() {
            0
        } else {
            self.layout.node_capacity(self.core.node_count)
        }
    }

    /// Number of chunk elements.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        if self.is_null() {
            0
        } else {
            self.layout.chunk_count()
        }
    }

    /// The shape layout.
    #[must_use]
    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub(crate) fn extent(&self) -> Extent {
        let chunk_count = self.chunk_count();
        Extent {
            node_capacity: self.node_capacity(),
            chunk_capacity: chunk_count,
            node_count: self.core.node_count,
            chunk_count,
        }
    }

    /// Structure and slots of a `StructData` container; fatal otherwise.
    pub(crate) fn parts(&self) -> (&Arc<ChunkStructure>, &[*mut u8]) {
        match (&self.core.structure, &self.core.slots) {
            (Some(structure), Some(slots)) => (structure, slots),
            _ => {
                strata_assert!(false, "container used as data while in the {:?} state", self.state());
                unreachable!()
            }
        }
    }

    /// Mutable slots of a `StructData` container; fatal otherwise.
    pub(crate) fn parts_mut(&mut self) -> (&Arc<ChunkStructure>, &mut [*mut u8]) {
        let state = self.core.state();
        match (&self.core.structure, &mut self.core.slots) {
            (Some(structure), Some(slots)) => (structure, slots),
            _ => {
                strata_assert!(false, "container used as data while in the {:?} state", state);
                unreachable!()
            }
        }
    }

    /// The buffer of the component at `index` in the structure.
    ///
    /// This is the fast access path. For node-owned components the buffer holds
    /// at least [`Container::node_count`] instances, for chunk-owned components
    /// one instance per chunk element.
    #[must_use]
    pub fn component_data(&self, index: usize) -> *const u8 {
        let (structure, slots) = self.parts();
        strata_assert!(
            index < structure.component_count(),
            "component index {} out of range",
            index
        );
        slots[index]
    }

    /// Mutable variant of [`Container::component_data`].
    #[must_use]
    pub fn component_data_mut(&mut self, index: usize) -> *mut u8 {
        let (structure, slots) = self.parts_mut();
        strata_assert!(
            index < structure.component_count(),
            "component index {} out of range",
            index
        );
        slots[index]
    }

    /// The buffer of the component identified by `type_id`, or `None` if the
    /// structure does not hold it.
    ///
    /// This is the slow access path: it performs an identity lookup.
    #[must_use]
    pub fn component_data_by_type(&self, type_id: TypeId) -> Option<*const u8> {
        let (structure, slots) = self.parts();
        structure.index_of(type_id).map(|i| slots[i] as *const u8)
    }

    /// Typed access to every live instance of `T`.
    pub fn component_slice<T: Component>(&self) -> Option<&[T]> {
        self.view()?.component_slice::<T>()
    }

    /// Mutable typed access to every live instance of `T`.
    pub fn component_slice_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        self.view_mut()?.into_component_slice_mut::<T>()
    }

    /// A borrowed view over the whole container, or `None` if it holds no data.
    #[must_use]
    pub fn view(&self) -> Option<ChunkView<'_>> {
        let structure = self.core.structure.as_ref()?;
        let slots = self.core.slots.as_deref()?;
        Some(ChunkView::new(
            structure,
            slots,
            self.core.node_count,
            self.layout.chunk_count(),
        ))
    }

    /// A mutable borrowed view over the whole container.
    #[must_use]
    pub fn view_mut(&mut self) -> Option<ChunkViewMut<'_>> {
        let chunk_count = self.layout.chunk_count();
        let structure = self.core.structure.as_ref()?;
        let slots = self.core.slots.as_deref()?;
        Some(ChunkViewMut::new(
            structure,
            slots,
            self.core.node_count,
            chunk_count,
        ))
    }

    /// Returns `true` if both containers point at the same component data.
    #[must_use]
    pub fn is_same_data(&self, other: &Self) -> bool {
        match (&self.core.slots, &other.core.slots) {
            (Some(a), Some(b)) => a.first() == b.first() && a.len() == b.len(),
            _ => false,
        }
    }
}

impl<L: ShapeLayout> RouteTarget for Container<L> {
    fn route_frame(&mut self) -> Option<RouteFrame<'_>> {
        let structure = self.core.structure.as_ref()?;
        let slots = self.core.slots.as_deref()?;
        Some(RouteFrame::new(
            structure,
            slots,
            self.layout.elements(self.core.node_count),
        ))
    }
}

impl<L: ShapeLayout> fmt::Debug for Container<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("kind", &L::KIND)
            .field("state", &self.state())
            .field("structure", &self.core.structure)
            .field("node_count", &self.core.node_count)
            .field("layout", &self.layout)
            .finish()
    }
}
