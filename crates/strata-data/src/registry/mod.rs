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

//! Registries: interning of component types and structures, and storage of
//! live containers.
//!
//! [`StorageRegistry`] bundles the three under one [`StorageConfig`].

mod chunk_registry;
mod component_registry;
mod component_set;
mod structure_registry;

pub use chunk_registry::*;
pub use component_registry::*;
pub use component_set::*;
pub use structure_registry::*;

use std::sync::Arc;

use strata_core::{StorageConfig, StrataResult};

use crate::container::{Bucket, Bunch, Chunk, ChunkArray, KindContainer, UniformArray};
use crate::routing::{Algorithm, Pipeline};
use crate::structure::ChunkStructure;

/// The storage entry point: interns types and structures, creates containers
/// of any shape and keeps them alive behind [`ChunkHandle`]s.
#[derive(Debug)]
pub struct StorageRegistry {
    config: StorageConfig,
    component_types: ComponentTypeRegistry,
    structures: ChunkStructureRegistry,
    chunks: ChunkRegistry<KindContainer>,
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::from_valid_config(StorageConfig::default())
    }
}

impl StorageRegistry {
    /// Creates a registry after validating `config`.
    pub fn with_config(config: StorageConfig) -> StrataResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: StorageConfig) -> Self {
        log::info!(
            "Storage registry created (bunch capacity {}, zero on construct {}, zero on destruct {})",
            config.initial_bunch_capacity,
            config.memory.zero_on_construct,
            config.memory.zero_on_destruct
        );
        Self {
            component_types: ComponentTypeRegistry::new(config.memory),
            structures: ChunkStructureRegistry::new(),
            chunks: ChunkRegistry::new(),
            config,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The component type registry.
    pub fn component_types(&mut self) -> &mut ComponentTypeRegistry {
        &mut self.component_types
    }

    /// The structure registry.
    pub fn structures(&self) -> &ChunkStructureRegistry {
        &self.structures
    }

    /// The live containers.
    pub fn chunks(&self) -> &ChunkRegistry<KindContainer> {
        &self.chunks
    }

    /// Mutable access to the live containers.
    pub fn chunks_mut(&mut self) -> &mut ChunkRegistry<KindContainer> {
        &mut self.chunks
    }

    /// The interned structure of the component set `S`.
    pub fn structure_of<S: ComponentSet>(&mut self) -> Arc<ChunkStructure> {
        let types = S::component_types(&mut self.component_types);
        self.structures.get_or_add(&types)
    }

    /// Creates a [`Chunk`] of `node_count` nodes with the components of `S`.
    pub fn new_chunk<S: ComponentSet>(&mut self, node_count: usize) -> ChunkHandle {
        let structure = self.structure_of::<S>();
        self.chunks.insert(Chunk::new(structure, node_count).into())
    }

    /// Creates an empty [`Bucket`] holding up to `capacity` nodes.
    pub fn new_bucket<S: ComponentSet>(&mut self, capacity: usize) -> ChunkHandle {
        let structure = self.structure_of::<S>();
        self.chunks
            .insert(Bucket::with_capacity(structure, capacity).into())
    }

    /// Creates an empty [`Bunch`] with the configured initial capacity.
    pub fn new_bunch<S: ComponentSet>(&mut self) -> ChunkHandle {
        let structure = self.structure_of::<S>();
        let capacity = self.config.initial_bunch_capacity;
        self.chunks
            .insert(Bunch::with_capacity(structure, capacity).into())
    }

    /// Creates a [`ChunkArray`] with one element per entry of `node_counts`.
    pub fn new_array<S: ComponentSet>(&mut self, node_counts: &[usize]) -> ChunkHandle {
        let structure = self.structure_of::<S>();
        self.chunks
            .insert(ChunkArray::new(structure, node_counts).into())
    }

    /// Creates a [`UniformArray`] of `chunk_count` elements of `nodes_per_chunk` nodes.
    pub fn new_uniform_array<S: ComponentSet>(
        &mut self,
        chunk_count: usize,
        nodes_per_chunk: usize,
    ) -> ChunkHandle {
        let structure = self.structure_of::<S>();
        self.chunks
            .insert(UniformArray::new(structure, chunk_count, nodes_per_chunk).into())
    }

    /// The container behind `handle`.
    pub fn get(&self, handle: ChunkHandle) -> Option<&KindContainer> {
        self.chunks.get(handle)
    }

    /// Mutable access to the container behind `handle`.
    pub fn get_mut(&mut self, handle: ChunkHandle) -> Option<&mut KindContainer> {
        self.chunks.get_mut(handle)
    }

    /// Destroys the container behind `handle`. See [`ChunkRegistry::delete`].
    pub fn delete(&mut self, handle: ChunkHandle) -> bool {
        self.chunks.delete(handle)
    }

    /// A pipeline for `algorithm` sized by the configured route cache hint.
    pub fn pipeline<A: Algorithm>(&self, algorithm: A) -> Pipeline<A> {
        Pipeline::with_config(algorithm, &self.config)
    }

    /// Runs `pipeline` over every live container and returns how many of them
    /// matched its requirements.
    pub fn run<A: Algorithm>(&mut self, pipeline: &mut Pipeline<A>) -> usize {
        pipeline.run_registry(&mut self.chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentOwner};
    use crate::container::{Bounded, ContainerKind};
    use strata_core::config::MemoryPolicy;
    use strata_core::StrataError;

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Heat(u32);
    impl Component for Heat {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Zone(u8);
    impl Component for Zone {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StorageConfig {
            initial_bunch_capacity: 0,
            ..StorageConfig::default()
        };
        assert!(matches!(
            StorageRegistry::with_config(config),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_structures_are_shared_between_shapes() {
        let mut registry = StorageRegistry::default();
        let chunk = registry.new_chunk::<(Heat, Zone)>(2);
        let array = registry.new_uniform_array::<(Zone, Heat)>(2, 3);

        let a = registry.get(chunk).unwrap().structure().unwrap();
        let b = registry.get(array).unwrap().structure().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(registry.structures().len(), 1);
        assert_eq!(registry.component_types().len(), 2);
    }

    #[test]
    fn test_bunch_uses_configured_capacity() -> anyhow::Result<()> {
        let config = StorageConfig::from_json(r#"{ "initial_bunch_capacity": 3 }"#)?;
        let mut registry = StorageRegistry::with_config(config)?;
        let handle = registry.new_bunch::<(Heat,)>();
        let container = registry.get_mut(handle).unwrap();
        assert_eq!(container.kind(), ContainerKind::Bunch);
        assert_eq!(container.node_capacity(), 3);
        container.as_bunch_mut().unwrap().add_nodes(4).unwrap();
        assert_eq!(container.node_capacity(), 6);
        Ok(())
    }

    #[test]
    fn test_memory_policy_reaches_component_types() -> anyhow::Result<()> {
        let config = StorageConfig::debug_memory();
        let mut registry = StorageRegistry::with_config(config.clone())?;
        let structure = registry.structure_of::<(Heat,)>();
        assert_eq!(structure.component_types()[0].policy(), config.memory);
        assert_ne!(config.memory, MemoryPolicy::default());
        Ok(())
    }

    #[test]
    fn test_delete() {
        let mut registry = StorageRegistry::default();
        let handle = registry.new_bucket::<(Heat,)>(4);
        assert!(registry.delete(handle));
        assert!(!registry.delete(handle));
        assert!(registry.chunks().is_empty());
    }
}
