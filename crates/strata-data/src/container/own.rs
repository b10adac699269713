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

//! Value semantics of containers: deep copy, transfer and release.

use std::sync::Arc;

use crate::container::base::{ChunkCore, Container, ContainerState, ShapeLayout};
use crate::node;

/// Ownership capability: a container that can hand its data over.
///
/// Containers are `Clone` (deep copy) and release their memory on drop; this
/// trait adds the explicit transfer that leaves the source `VoidNull`.
pub trait Owned: Sized {
    /// Moves the data out, leaving `self` without structure nor data.
    fn take(&mut self) -> Self;

    /// Destructs and frees the data, leaving `self` without structure nor data.
    fn release(&mut self) {
        drop(self.take());
    }
}

impl<L: ShapeLayout> Owned for Container<L> {
    fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<L: ShapeLayout> Drop for Container<L> {
    fn drop(&mut self) {
        if self.state() != ContainerState::StructData {
            return;
        }
        let extent = self.extent();
        let (structure, slots) = self.parts();
        // SAFETY: the slots own buffers sized for `extent` with its live instances.
        unsafe { node::free_destruct_all(structure, slots, extent) };
        self.core.slots = None;
    }
}

impl<L: ShapeLayout> Clone for Container<L> {
    fn clone(&self) -> Self {
        if self.state() != ContainerState::StructData {
            return Self {
                core: ChunkCore::from_parts(self.core.structure.clone(), None, 0),
                layout: self.layout.clone(),
            };
        }

        let extent = self.extent();
        let (structure, from) = self.parts();
        let mut slots = ChunkCore::empty_slots(structure, self.layout.chunk_count());
        // SAFETY: `slots` is fresh and `from` holds the live instances of `extent`.
        unsafe { node::allocate_copy_construct_all_forward(structure, &mut slots, from, extent) };
        self.layout.rebuild_slots(structure, &mut slots);

        Self {
            core: ChunkCore::from_parts(Some(Arc::clone(structure)), Some(slots), self.core.node_count),
            layout: self.layout.clone(),
        }
    }

    /// Copies `source` into `self`, reusing every buffer whose size does not change.
    fn clone_from(&mut self, source: &Self) {
        let reusable = self.state() == ContainerState::StructData
            && source.state() == ContainerState::StructData
            && self.is_same_structure(source)
            && self.layout.chunk_count() == source.layout.chunk_count();
        if !reusable {
            *self = source.clone();
            return;
        }

        let current = self.extent();
        let target = source.extent();
        let (structure, from) = source.parts();
        let (_, to) = self.parts_mut();
        // SAFETY: both containers hold live data for their extents and never
        // share buffers, since each container exclusively owns its own.
        unsafe { node::reallocate_copy_all_forward(structure, to, current, from, target) };

        self.core.node_count = source.core.node_count;
        self.layout = source.layout.clone();
        if let (Some(structure), Some(slots)) = (&self.core.structure, &mut self.core.slots) {
            self.layout.rebuild_slots(structure, slots);
        }
    }
}
