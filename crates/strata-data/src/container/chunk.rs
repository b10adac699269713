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

//! The fixed-size chunk.

use std::sync::Arc;

use crate::component::Component;
use crate::container::base::{Container, ShapeLayout};
use crate::container::kind::ContainerKind;
use crate::structure::ChunkStructure;

/// Layout of a [`Chunk`]: capacity always equals the node count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedLayout;

impl ShapeLayout for FixedLayout {
    const KIND: ContainerKind = ContainerKind::Chunk;

    fn node_capacity(&self, node_count: usize) -> usize {
        node_count
    }
}

/// A single chunk with a node count fixed at allocation.
pub type Chunk = Container<FixedLayout>;

impl Container<FixedLayout> {
    /// Allocates a chunk of `node_count` default-constructed nodes.
    pub fn new(structure: Arc<ChunkStructure>, node_count: usize) -> Self {
        log::trace!("Allocating chunk of {} nodes", node_count);
        Self::allocate(structure, FixedLayout, node_count)
    }

    /// The chunk-owned instance of `T`.
    pub fn chunk_component<T: Component>(&self) -> Option<&T> {
        self.view()?.chunk_component::<T>()
    }

    /// Mutable access to the chunk-owned instance of `T`.
    pub fn chunk_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.component_slice_mut::<T>()?.first_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentOwner, ComponentType};
    use crate::container::base::ContainerState;
    use crate::container::own::Owned;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Name(String);
    impl Component for Name {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Speed(f32);
    impl Component for Speed {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Tick(u64);
    impl Component for Tick {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    fn structure() -> Arc<ChunkStructure> {
        Arc::new(ChunkStructure::new(vec![
            Arc::new(ComponentType::of::<Name>()),
            Arc::new(ComponentType::of::<Speed>()),
            Arc::new(ComponentType::of::<Tick>()),
        ]))
    }

    #[test]
    fn test_null_states() {
        let void = Chunk::default();
        assert_eq!(void.state(), ContainerState::VoidNull);
        assert!(void.is_null());
        assert_eq!(void.node_count(), 0);
        assert_eq!(void.node_capacity(), 0);

        let typed = Chunk::with_structure(structure());
        assert_eq!(typed.state(), ContainerState::StructNull);
        assert!(typed.is_null());
        assert!(typed.has_structure());
        assert!(typed.view().is_none());
    }

    #[test]
    fn test_new_constructs_defaults() {
        let chunk = Chunk::new(structure(), 4);
        assert_eq!(chunk.state(), ContainerState::StructData);
        assert_eq!(chunk.node_count(), 4);
        assert_eq!(chunk.node_capacity(), 4);
        assert_eq!(chunk.chunk_count(), 1);
        assert_eq!(chunk.component_slice::<Name>().map(<[Name]>::len), Some(4));
        assert!(chunk.component_slice::<Name>().unwrap().iter().all(|n| n.0.is_empty()));
        assert_eq!(chunk.chunk_component::<Tick>(), Some(&Tick(0)));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut chunk = Chunk::new(structure(), 2);
        chunk.component_slice_mut::<Name>().unwrap()[1].0.push_str("orbit");
        chunk.chunk_component_mut::<Tick>().unwrap().0 = 9;

        let copy = chunk.clone();
        chunk.component_slice_mut::<Name>().unwrap()[1].0.clear();

        assert!(!copy.is_same_data(&chunk));
        assert!(copy.is_same_structure(&chunk));
        assert_eq!(copy.component_slice::<Name>().unwrap()[1].0, "orbit");
        assert_eq!(copy.chunk_component::<Tick>(), Some(&Tick(9)));
    }

    #[test]
    fn test_take_leaves_void() {
        let mut chunk = Chunk::new(structure(), 3);
        let moved = chunk.take();
        assert_eq!(chunk.state(), ContainerState::VoidNull);
        assert_eq!(moved.node_count(), 3);
    }

    #[test]
    fn test_clone_from_reuses_same_sized_buffers() {
        let s = structure();
        let mut source = Chunk::new(Arc::clone(&s), 3);
        source.component_slice_mut::<Speed>().unwrap()[2] = Speed(4.0);
        let mut target = Chunk::new(s, 3);
        let before = target.component_data(target.structure().unwrap().index_of_type::<Speed>().unwrap());

        target.clone_from(&source);

        let index = target.structure().unwrap().index_of_type::<Speed>().unwrap();
        assert_eq!(target.component_data(index), before);
        assert_eq!(target.component_slice::<Speed>().unwrap()[2], Speed(4.0));
    }

    #[test]
    fn test_clone_from_resizes() {
        let s = structure();
        let mut source = Chunk::new(Arc::clone(&s), 5);
        source.component_slice_mut::<Name>().unwrap()[4].0.push_str("tail");
        let mut target = Chunk::new(s, 1);

        target.clone_from(&source);

        assert_eq!(target.node_count(), 5);
        assert_eq!(target.component_slice::<Name>().unwrap()[4].0, "tail");
    }

    #[test]
    fn test_missing_component() {
        #[derive(Clone, Default)]
        struct Absent;
        impl Component for Absent {}

        let chunk = Chunk::new(structure(), 1);
        assert!(chunk.component_slice::<Absent>().is_none());
        assert!(chunk
            .component_data_by_type(std::any::TypeId::of::<Absent>())
            .is_none());
    }

    #[test]
    #[should_panic(expected = "without a structure")]
    fn test_data_without_structure_is_fatal() {
        let _ = crate::container::base::ChunkCore::from_parts(
            None,
            Some(vec![std::ptr::null_mut()].into_boxed_slice()),
            0,
        );
    }
}
