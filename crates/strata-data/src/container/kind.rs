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

//! Runtime dispatch over container shapes.

use std::sync::Arc;

use crate::container::array::{ChunkArray, UniformArray};
use crate::container::bounded::{Bucket, Bunch};
use crate::container::chunk::Chunk;
use crate::container::base::ContainerState;
use crate::container::view::{ChunkView, ChunkViewMut, RouteFrame, RouteTarget};
use crate::structure::ChunkStructure;

/// The shape of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A fixed-size [`Chunk`].
    Chunk,
    /// A fixed-capacity [`Bucket`].
    Bucket,
    /// A growable [`Bunch`].
    Bunch,
    /// A [`ChunkArray`] with per-element node counts.
    Array,
    /// A [`UniformArray`].
    UniformArray,
}

impl ContainerKind {
    /// Returns `true` for shapes whose node count can change.
    #[must_use]
    pub fn is_bounded(self) -> bool {
        matches!(self, ContainerKind::Bucket | ContainerKind::Bunch)
    }

    /// Returns `true` for shapes made of several chunk elements.
    #[must_use]
    pub fn is_multi_chunk(self) -> bool {
        matches!(self, ContainerKind::Array | ContainerKind::UniformArray)
    }
}

/// An owning container of any shape, tagged with its kind.
#[derive(Debug, Clone)]
pub enum KindContainer {
    /// See [`Chunk`].
    Chunk(Chunk),
    /// See [`Bucket`].
    Bucket(Bucket),
    /// See [`Bunch`].
    Bunch(Bunch),
    /// See [`ChunkArray`].
    Array(ChunkArray),
    /// See [`UniformArray`].
    UniformArray(UniformArray),
}

macro_rules! dispatch {
    ($self:expr, $c:ident => $body:expr) => {
        match $self {
            KindContainer::Chunk($c) => $body,
            KindContainer::Bucket($c) => $body,
            KindContainer::Bunch($c) => $body,
            KindContainer::Array($c) => $body,
            KindContainer::UniformArray($c) => $body,
        }
    };
}

impl KindContainer {
    /// The runtime tag.
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        dispatch!(self, c => c.kind())
    }

    /// The null state.
    #[must_use]
    pub fn state(&self) -> ContainerState {
        dispatch!(self, c => c.state())
    }

    /// Returns `true` if no component data is allocated.
    #[must_use]
    pub fn is_null(&self) -> bool {
        dispatch!(self, c => c.is_null())
    }

    /// The structure, if known.
    #[must_use]
    pub fn structure(&self) -> Option<&Arc<ChunkStructure>> {
        dispatch!(self, c => c.structure())
    }

    /// Live nodes across all chunk elements.
    #[must_use]
    pub fn node_count(&self) -> usize {
        dispatch!(self, c => c.node_count())
    }

    /// Node capacity across all chunk elements.
    #[must_use]
    pub fn node_capacity(&self) -> usize {
        dispatch!(self, c => c.node_capacity())
    }

    /// Number of chunk elements.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        dispatch!(self, c => c.chunk_count())
    }

    /// A view over the whole container.
    #[must_use]
    pub fn view(&self) -> Option<ChunkView<'_>> {
        dispatch!(self, c => c.view())
    }

    /// A mutable view over the whole container.
    #[must_use]
    pub fn view_mut(&mut self) -> Option<ChunkViewMut<'_>> {
        dispatch!(self, c => c.view_mut())
    }

    /// The bucket, if this is one.
    #[must_use]
    pub fn as_bucket_mut(&mut self) -> Option<&mut Bucket> {
        match self {
            KindContainer::Bucket(c) => Some(c),
            _ => None,
        }
    }

    /// The bunch, if this is one.
    #[must_use]
    pub fn as_bunch_mut(&mut self) -> Option<&mut Bunch> {
        match self {
            KindContainer::Bunch(c) => Some(c),
            _ => None,
        }
    }
}

impl RouteTarget for KindContainer {
    fn route_frame(&mut self) -> Option<RouteFrame<'_>> {
        dispatch!(self, c => c.route_frame())
    }
}

macro_rules! impl_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for KindContainer {
                fn from(c: $ty) -> Self {
                    KindContainer::$variant(c)
                }
            }
        )*
    };
}

impl_from!(
    Chunk => Chunk,
    Bucket => Bucket,
    Bunch => Bunch,
    Array => ChunkArray,
    UniformArray => UniformArray,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentType};
    use crate::container::bounded::Bounded;

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Weight(u8);
    impl Component for Weight {}

    fn structure() -> Arc<ChunkStructure> {
        Arc::new(ChunkStructure::new(vec![Arc::new(ComponentType::of::<Weight>())]))
    }

    #[test]
    fn test_kinds() {
        let s = structure();
        let all: Vec<KindContainer> = vec![
            Chunk::new(Arc::clone(&s), 2).into(),
            Bucket::with_capacity(Arc::clone(&s), 4).into(),
            Bunch::with_capacity(Arc::clone(&s), 1).into(),
            ChunkArray::new(Arc::clone(&s), &[1, 2]).into(),
            UniformArray::new(s, 2, 2).into(),
        ];
        let kinds: Vec<_> = all.iter().map(KindContainer::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContainerKind::Chunk,
                ContainerKind::Bucket,
                ContainerKind::Bunch,
                ContainerKind::Array,
                ContainerKind::UniformArray
            ]
        );
        let counts: Vec<_> = all.iter().map(KindContainer::node_count).collect();
        assert_eq!(counts, vec![2, 0, 0, 3, 4]);
        assert!(ContainerKind::Bunch.is_bounded());
        assert!(ContainerKind::Array.is_multi_chunk());
    }

    #[test]
    fn test_downcast() {
        let mut c: KindContainer = Bunch::with_capacity(structure(), 1).into();
        assert!(c.as_bucket_mut().is_none());
        let bunch = c.as_bunch_mut().unwrap();
        bunch.add_nodes(3).unwrap();
        assert_eq!(c.node_count(), 3);
        assert_eq!(c.view().unwrap().component_slice::<Weight>().unwrap().len(), 3);
    }
}
