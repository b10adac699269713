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

//! The bulk node protocol.
//!
//! Every container shape manages its component memory through these
//! primitives. They operate on a structure and a *component data array*: one
//! opaque buffer pointer per component of the structure, in structure order.
//! Node-owned buffers hold one instance per node and chunk-owned buffers one
//! instance per chunk.
//!
//! All primitives are `unsafe`: the caller guarantees that ranges are in bounds
//! of the buffers, that construct targets are uninitialized and every other
//! target holds live instances, and that forward moves inside one buffer never
//! start the destination after the source.

use crate::component::ComponentType;
use crate::memory;
use crate::structure::ChunkStructure;
use strata_core::{strata_assert, strata_debug_assert};

/// Capacities and live counts of a component data array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    /// Nodes the node-owned buffers can hold.
    pub node_capacity: usize,
    /// Chunks the chunk-owned buffers can hold.
    pub chunk_capacity: usize,
    /// Live nodes.
    pub node_count: usize,
    /// Live chunks.
    pub chunk_count: usize,
}

impl Extent {
    /// An extent whose capacities equal its counts.
    pub fn exact(node_count: usize, chunk_count: usize) -> Self {
        Self {
            node_capacity: node_count,
            chunk_capacity: chunk_count,
            node_count,
            chunk_count,
        }
    }

    /// Live instance count of `ty` in this extent.
    #[inline]
    pub fn live(&self, ty: &ComponentType) -> usize {
        ty.instance_count(self.node_count, self.chunk_count)
    }

    /// Byte footprint of the buffer of `ty` in this extent.
    #[inline]
    pub fn footprint(&self, ty: &ComponentType) -> usize {
        ty.footprint(self.node_capacity, self.chunk_capacity)
    }
}

#[inline]
fn check_slots(structure: &ChunkStructure, slots: &[*mut u8]) {
    strata_debug_assert!(
        slots.len() >= structure.component_count(),
        "component data array has {} slots for {} components",
        slots.len(),
        structure.component_count()
    );
}

// --- Construct ---

/// Constructs node-owned components for `node_count` nodes starting at `first_node`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn construct_node_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_node: usize,
    node_count: usize,
) {
    check_slots(structure, slots);
    for &i in structure.node_component_indices() {
        structure
            .component_type(i)
            .construct_data(slots[i], first_node, node_count);
    }
}

/// Constructs chunk-owned components for `chunk_count` chunks starting at `first_chunk`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn construct_chunk_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_chunk: usize,
    chunk_count: usize,
) {
    check_slots(structure, slots);
    for &i in structure.chunk_component_indices() {
        structure
            .component_type(i)
            .construct_data(slots[i], first_chunk, chunk_count);
    }
}

/// Constructs every component for the given node and chunk ranges.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn construct_all_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_node: usize,
    first_chunk: usize,
    node_count: usize,
    chunk_count: usize,
) {
    construct_node_components(structure, slots, first_node, node_count);
    construct_chunk_components(structure, slots, first_chunk, chunk_count);
}

// --- Destruct ---

/// Destructs node-owned components of `node_count` nodes starting at `first_node`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn destruct_node_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_node: usize,
    node_count: usize,
) {
    check_slots(structure, slots);
    for &i in structure.node_components_to_destruct() {
        structure
            .component_type(i)
            .destruct_data(slots[i], first_node, node_count);
    }
}

/// Destructs chunk-owned components of `chunk_count` chunks starting at `first_chunk`.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn destruct_chunk_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_chunk: usize,
    chunk_count: usize,
) {
    check_slots(structure, slots);
    for &i in structure.chunk_components_to_destruct() {
        structure
            .component_type(i)
            .destruct_data(slots[i], first_chunk, chunk_count);
    }
}

/// Destructs every component for the given node and chunk ranges.
///
/// # Safety
///
/// See the module documentation.
pub unsafe fn destruct_all_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_node: usize,
    first_chunk: usize,
    node_count: usize,
    chunk_count: usize,
) {
    destruct_node_components(structure, slots, first_node, node_count);
    destruct_chunk_components(structure, slots, first_chunk, chunk_count);
}

// --- Move and copy ---
//
// The `*_node_*` and `*_chunk_*` variants iterate one owner subset; `*_all_*`
// variants take node and chunk coordinates and let each component pick.

macro_rules! transfer_subset {
    ($(#[$doc:meta])* $name:ident, $subset:ident, $op:ident, $from_ty:ty) => {
        $(#[$doc])*
        ///
        /// # Safety
        ///
        /// See the module documentation.
        pub unsafe fn $name(
            structure: &ChunkStructure,
            to: &[*mut u8],
            first_to: usize,
            from: &[*mut u8],
            first_from: usize,
            count: usize,
        ) {
            check_slots(structure, to);
            check_slots(structure, from);
            for &i in structure.$subset() {
                structure
                    .component_type(i)
                    .$op(to[i], first_to, from[i] as $from_ty, first_from, count);
            }
        }
    };
}

macro_rules! transfer_all {
    ($(#[$doc:meta])* $name:ident, $op:ident, $from_ty:ty) => {
        $(#[$doc])*
        ///
        /// # Safety
        ///
        /// See the module documentation.
        #[allow(clippy::too_many_arguments)]
        pub unsafe fn $name(
            structure: &ChunkStructure,
            to: &[*mut u8],
            first_node_to: usize,
            first_chunk_to: usize,
            from: &[*mut u8],
            first_node_from: usize,
            first_chunk_from: usize,
            node_count: usize,
            chunk_count: usize,
        ) {
            check_slots(structure, to);
            check_slots(structure, from);
            for (i, ty) in structure.component_types().iter().enumerate() {
                ty.$op(
                    to[i],
                    ty.instance_index(first_node_to, first_chunk_to),
                    from[i] as $from_ty,
                    ty.instance_index(first_node_from, first_chunk_from),
                    ty.instance_count(node_count, chunk_count),
                );
            }
        }
    };
}

transfer_subset!(
    /// Relocates node-owned components of `count` nodes into uninitialized nodes.
    move_construct_node_components_forward,
    node_component_indices,
    move_construct_data_forward,
    *mut u8
);
transfer_subset!(
    /// Relocates chunk-owned components of `count` chunks into uninitialized chunks.
    move_construct_chunk_components_forward,
    chunk_component_indices,
    move_construct_data_forward,
    *mut u8
);
transfer_all!(
    /// Relocates every component into uninitialized nodes and chunks.
    move_construct_all_components_forward,
    move_construct_data_forward,
    *mut u8
);

transfer_subset!(
    /// Relocates node-owned components of `count` nodes over live nodes.
    move_assign_node_components_forward,
    node_component_indices,
    move_assign_data_forward,
    *mut u8
);
transfer_subset!(
    /// Relocates chunk-owned components of `count` chunks over live chunks.
    move_assign_chunk_components_forward,
    chunk_component_indices,
    move_assign_data_forward,
    *mut u8
);
transfer_all!(
    /// Relocates every component over live nodes and chunks.
    move_assign_all_components_forward,
    move_assign_data_forward,
    *mut u8
);

transfer_subset!(
    /// Clones node-owned components of `count` nodes into uninitialized nodes.
    copy_construct_node_components_forward,
    node_component_indices,
    copy_construct_data_forward,
    *const u8
);
transfer_subset!(
    /// Clones chunk-owned components of `count` chunks into uninitialized chunks.
    copy_construct_chunk_components_forward,
    chunk_component_indices,
    copy_construct_data_forward,
    *const u8
);
transfer_all!(
    /// Clones every component into uninitialized nodes and chunks.
    copy_construct_all_components_forward,
    copy_construct_data_forward,
    *const u8
);

transfer_subset!(
    /// Clones node-owned components of `count` nodes over live nodes.
    copy_assign_node_components_forward,
    node_component_indices,
    copy_assign_data_forward,
    *const u8
);
transfer_subset!(
    /// Clones chunk-owned components of `count` chunks over live chunks.
    copy_assign_chunk_components_forward,
    chunk_component_indices,
    copy_assign_data_forward,
    *const u8
);
transfer_all!(
    /// Clones every component over live nodes and chunks.
    copy_assign_all_components_forward,
    copy_assign_data_forward,
    *const u8
);

/// Exchanges the node-owned components of two node ranges.
///
/// # Safety
///
/// See the module documentation. Both ranges hold live nodes.
pub unsafe fn swap_node_components(
    structure: &ChunkStructure,
    slots: &[*mut u8],
    first_a: usize,
    first_b: usize,
    count: usize,
) {
    check_slots(structure, slots);
    for &i in structure.node_component_indices() {
        let ty = structure.component_type(i);
        if first_a <= first_b {
            ty.swap_data_forward(slots[i], first_a, slots[i], first_b, count);
        } else {
            ty.swap_data_backward(slots[i], first_a, slots[i], first_b, count);
        }
    }
}

// --- Allocation ---

/// Allocates every component buffer for `extent` capacities and constructs
/// `extent.node_count` nodes and `extent.chunk_count` chunks.
///
/// # Safety
///
/// `slots` must not own any buffer yet; previous pointers are overwritten.
pub unsafe fn allocate_construct_all(structure: &ChunkStructure, slots: &mut [*mut u8], extent: Extent) {
    check_slots(structure, slots);
    for (i, ty) in structure.component_types().iter().enumerate() {
        let data = memory::allocate(ty.layout(extent.node_capacity, extent.chunk_capacity));
        ty.construct_data(data, 0, extent.live(ty));
        slots[i] = data;
    }
}

/// Allocates every component buffer for `extent` capacities and clones the
/// first `extent.node_count` nodes and `extent.chunk_count` chunks of `from`.
///
/// # Safety
///
/// `to` must not own any buffer yet; `from` must hold at least the copied
/// live instances.
pub unsafe fn allocate_copy_construct_all_forward(
    structure: &ChunkStructure,
    to: &mut [*mut u8],
    from: &[*mut u8],
    extent: Extent,
) {
    check_slots(structure, to);
    check_slots(structure, from);
    for (i, ty) in structure.component_types().iter().enumerate() {
        let data = memory::allocate(ty.layout(extent.node_capacity, extent.chunk_capacity));
        ty.copy_construct_data_forward(data, 0, from[i], 0, extent.live(ty));
        to[i] = data;
    }
}

/// Clones the live instances of `from` into `to`, resizing each buffer of `to`
/// to the capacities of `target`.
///
/// The decision is taken per component: a buffer whose footprint does not
/// change is reused and overwritten in place, any other buffer is replaced by a
/// fresh allocation. On return `to` holds `target.node_count` nodes and
/// `target.chunk_count` chunks.
///
/// # Safety
///
/// `to` holds the live instances described by `current`; `from` holds at least
/// the instances described by `target`; `to` and `from` never share a buffer.
pub unsafe fn reallocate_copy_all_forward(
    structure: &ChunkStructure,
    to: &mut [*mut u8],
    current: Extent,
    from: &[*mut u8],
    target: Extent,
) {
    check_slots(structure, to);
    check_slots(structure, from);
    for (i, ty) in structure.component_types().iter().enumerate() {
        strata_assert!(
            to[i] != from[i] || ty.footprint(1, 1) == 0,
            "copy source and destination share the buffer of '{}'",
            ty.name()
        );
        let live_to = current.live(ty);
        let wanted = target.live(ty);
        if current.footprint(ty) == target.footprint(ty) {
            // Same footprint: assign over the overlap, then settle the difference.
            let assigned = live_to.min(wanted);
            ty.copy_assign_data_forward(to[i], 0, from[i], 0, assigned);
            if live_to > wanted {
                ty.destruct_data(to[i], wanted, live_to - wanted);
            } else {
                ty.copy_construct_data_forward(to[i], assigned, from[i], assigned, wanted - assigned);
            }
        } else {
            let data = memory::allocate(ty.layout(target.node_capacity, target.chunk_capacity));
            ty.copy_construct_data_forward(data, 0, from[i], 0, wanted);
            ty.destruct_data(to[i], 0, live_to);
            memory::free(to[i], ty.layout(current.node_capacity, current.chunk_capacity));
            to[i] = data;
        }
    }
}

/// Relocates the live instances of `from` into `to`, resizing each buffer of
/// `to` to the capacities of `target`.
///
/// `to` and `from` may describe the same container (growth in place): buffers
/// whose footprint does not change are then left untouched. Otherwise the same
/// per-component reuse rule as [`reallocate_copy_all_forward`] applies. The
/// relocated range of `from` is uninitialized afterwards.
///
/// # Safety
///
/// `to` holds the live instances described by `current`; `from` holds at least
/// the instances described by `target`.
pub unsafe fn reallocate_move_all_forward(
    structure: &ChunkStructure,
    to: &mut [*mut u8],
    current: Extent,
    from: &[*mut u8],
    target: Extent,
) {
    check_slots(structure, to);
    check_slots(structure, from);
    for (i, ty) in structure.component_types().iter().enumerate() {
        let same_buffer = to[i] == from[i];
        let live_to = current.live(ty);
        let wanted = target.live(ty);
        if current.footprint(ty) == target.footprint(ty) {
            if same_buffer {
                if live_to > wanted {
                    ty.destruct_data(to[i], wanted, live_to - wanted);
                }
                continue;
            }
            let assigned = live_to.min(wanted);
            ty.move_assign_data_forward(to[i], 0, from[i], 0, assigned);
            if live_to > wanted {
                ty.destruct_data(to[i], wanted, live_to - wanted);
            } else {
                ty.move_construct_data_forward(to[i], assigned, from[i], assigned, wanted - assigned);
            }
        } else {
            let data = memory::allocate(ty.layout(target.node_capacity, target.chunk_capacity));
            ty.move_construct_data_forward(data, 0, from[i], 0, wanted);
            if same_buffer {
                // The relocated prefix is gone; only a trailing surplus is still live.
                if live_to > wanted {
                    ty.destruct_data(to[i], wanted, live_to - wanted);
                }
            } else {
                ty.destruct_data(to[i], 0, live_to);
            }
            memory::free(to[i], ty.layout(current.node_capacity, current.chunk_capacity));
            to[i] = data;
        }
    }
}

/// Destructs the live instances described by `extent` and frees every buffer.
///
/// # Safety
///
/// `slots` must own buffers allocated for `extent` capacities. The pointers are
/// dangling afterwards.
pub unsafe fn free_destruct_all(structure: &ChunkStructure, slots: &[*mut u8], extent: Extent) {
    check_slots(structure, slots);
    for (i, ty) in structure.component_types().iter().enumerate() {
        ty.destruct_data(slots[i], 0, extent.live(ty));
        memory::free(slots[i], ty.layout(extent.node_capacity, extent.chunk_capacity));
    }
}
