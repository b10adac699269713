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

//! Pipelines: one algorithm run over many containers through a cached router.

use strata_core::StorageConfig;

use crate::container::RouteTarget;
use crate::registry::ChunkRegistry;
use crate::routing::algorithm::Algorithm;
use crate::routing::router::{CachedRouter, Router};

/// An algorithm paired with its own cached router.
///
/// Containers whose structure does not satisfy the algorithm are skipped; the
/// route cache remembers the mismatch so later runs skip them without any
/// lookup.
pub struct Pipeline<A: Algorithm> {
    algorithm: A,
    router: CachedRouter<A>,
}

impl<A: Algorithm> Pipeline<A> {
    /// Creates a pipeline with an empty route cache.
    pub fn new(algorithm: A) -> Self {
        Self {
            algorithm,
            router: CachedRouter::new(),
        }
    }

    /// Creates a pipeline whose cache is sized by `config`.
    pub fn with_config(algorithm: A, config: &StorageConfig) -> Self {
        Self {
            algorithm,
            router: CachedRouter::with_capacity(config.route_cache_capacity_hint),
        }
    }

    /// The algorithm.
    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Mutable access to the algorithm, for reading results or tuning parameters.
    pub fn algorithm_mut(&mut self) -> &mut A {
        &mut self.algorithm
    }

    /// The router and its route cache.
    pub fn router(&self) -> &CachedRouter<A> {
        &self.router
    }

    /// Consumes the pipeline, returning the algorithm.
    pub fn into_inner(self) -> A {
        self.algorithm
    }

    /// Runs the algorithm over one container. See [`Router::try_run`].
    pub fn try_run<T: RouteTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        self.router.try_run(&mut self.algorithm, target)
    }

    /// Runs the algorithm over every container of `targets` and returns how
    /// many of them matched.
    pub fn run_all<I>(&mut self, targets: I) -> usize
    where
        I: IntoIterator,
        I::Item: RouteTarget,
    {
        let mut matched = 0;
        for mut target in targets {
            if self.router.try_run(&mut self.algorithm, &mut target) {
                matched += 1;
            }
        }
        log::trace!("Pipeline ran on {} containers", matched);
        matched
    }

    /// Runs the algorithm over every container of `registry`.
    pub fn run_registry<C: RouteTarget>(&mut self, registry: &mut ChunkRegistry<C>) -> usize {
        self.run_all(registry.iter_mut().map(|(_, container)| container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentType};
    use crate::container::{Chunk, KindContainer, UniformArray};
    use crate::routing::algorithm::{Binding, Requirements};
    use crate::structure::ChunkStructure;
    use std::sync::Arc;

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Charge(i32);
    impl Component for Charge {}

    #[derive(Clone, Copy, Default, Debug, PartialEq)]
    struct Spin(i32);
    impl Component for Spin {}

    #[derive(Default)]
    struct TotalCharge {
        charge: Binding<Charge>,
        total: i64,
        nodes: usize,
    }

    impl Algorithm for TotalCharge {
        fn requirements<R: Requirements>(&mut self, req: &mut R) -> bool {
            req.require(&mut self.charge)
        }

        fn execute(&mut self, node_count: usize) {
            self.nodes += node_count;
            self.total += self.charge.as_slice().iter().map(|c| i64::from(c.0)).sum::<i64>();
        }
    }

    fn charged(nodes: usize) -> Chunk {
        let s = Arc::new(ChunkStructure::new(vec![Arc::new(ComponentType::of::<Charge>())]));
        let mut chunk = Chunk::new(s, nodes);
        for c in chunk.component_slice_mut::<Charge>().unwrap() {
            c.0 = 2;
        }
        chunk
    }

    #[test]
    fn test_run_all_skips_mismatches() {
        let spin_only = Arc::new(ChunkStructure::new(vec![Arc::new(ComponentType::of::<Spin>())]));
        let mut containers: Vec<KindContainer> = vec![
            charged(3).into(),
            UniformArray::new(spin_only, 2, 2).into(),
            charged(1).into(),
        ];
        let mut pipeline = Pipeline::new(TotalCharge::default());

        assert_eq!(pipeline.run_all(containers.iter_mut()), 2);
        assert_eq!(pipeline.algorithm().total, 8);
        assert_eq!(pipeline.algorithm().nodes, 4);
        assert_eq!(pipeline.router().cache().len(), 3);
    }

    #[test]
    fn test_run_registry() {
        let mut registry = ChunkRegistry::new();
        registry.insert(charged(2));
        let stale = registry.insert(charged(5));
        registry.delete(stale);
        let mut pipeline = Pipeline::with_config(TotalCharge::default(), &StorageConfig::default());

        assert_eq!(pipeline.run_registry(&mut registry), 1);
        assert_eq!(pipeline.into_inner().total, 4);
    }
}
