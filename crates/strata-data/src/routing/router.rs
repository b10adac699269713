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

//! Routers: bind an algorithm to containers and execute it chunk by chunk.

use std::marker::PhantomData;

use crate::container::{RouteFrame, RouteTarget};
use crate::routing::algorithm::Algorithm;
use crate::routing::binder::{Advancer, BindTarget, DirectBinder, RouteBuilder, RouteReplayer, Unbinder};
use crate::routing::route::{AlgorithmRoute, RouteCache};
use strata_core::strata_assert;

/// Binds an algorithm to containers and runs it.
pub trait Router<A: Algorithm> {
    /// Binds every requirement of `algorithm` to the first chunk of `frame`,
    /// holding `node_count` nodes. Returns `false` if a required component is
    /// absent.
    fn bind(&mut self, algorithm: &mut A, frame: &RouteFrame<'_>, node_count: usize) -> bool;

    /// Runs `algorithm` once per chunk of `target`.
    ///
    /// Returns `false` without executing anything if the target holds no data
    /// or lacks a required component. Bindings are reset afterwards.
    fn try_run<T: RouteTarget + ?Sized>(&mut self, algorithm: &mut A, target: &mut T) -> bool {
        let Some(frame) = target.route_frame() else {
            return false;
        };
        let elements = frame.elements();
        let first_count = if elements.is_empty() { 0 } else { elements.get(0) };

        if !self.bind(algorithm, &frame, first_count) {
            algorithm.requirements(&mut Unbinder);
            return false;
        }
        for element in 0..elements.len() {
            if element > 0 {
                algorithm.requirements(&mut Advancer {
                    previous_node_count: elements.get(element - 1),
                    node_count: elements.get(element),
                });
            }
            algorithm.execute(elements.get(element));
        }
        algorithm.requirements(&mut Unbinder);
        true
    }

    /// [`Router::try_run`] that treats a failure as fatal.
    fn run<T: RouteTarget + ?Sized>(&mut self, algorithm: &mut A, target: &mut T) {
        let routed = self.try_run(algorithm, target);
        strata_assert!(
            routed,
            "algorithm requirements are not met by the container"
        );
    }
}

fn bind_target<'a>(frame: &'a RouteFrame<'_>, node_count: usize) -> BindTarget<'a> {
    BindTarget {
        structure: frame.structure(),
        slots: frame.slots,
        node_count,
    }
}

/// A router that resolves requirements with identity lookups on every run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectRouter;

impl<A: Algorithm> Router<A> for DirectRouter {
    fn bind(&mut self, algorithm: &mut A, frame: &RouteFrame<'_>, node_count: usize) -> bool {
        algorithm.requirements(&mut DirectBinder::new(bind_target(frame, node_count)))
    }
}

/// A router that records the route of each structure it meets and replays it
/// on later runs, skipping identity lookups.
///
/// Results are identical to [`DirectRouter`]. One router serves one algorithm
/// instance: routes depend on the order in which requirements are declared.
pub struct CachedRouter<A> {
    cache: RouteCache,
    _algorithm: PhantomData<fn(&mut A)>,
}

impl<A: Algorithm> CachedRouter<A> {
    /// Creates a router with an empty cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a router with room for `capacity` structures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: RouteCache::with_capacity(capacity),
            _algorithm: PhantomData,
        }
    }

    /// The recorded routes.
    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Forgets every recorded route.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<A: Algorithm> Default for CachedRouter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Algorithm> Router<A> for CachedRouter<A> {
    fn bind(&mut self, algorithm: &mut A, frame: &RouteFrame<'_>, node_count: usize) -> bool {
        let target = bind_target(frame, node_count);
        match self.cache.get(frame.structure()) {
            Some(AlgorithmRoute::Mismatch) => false,
            Some(AlgorithmRoute::Route(route)) => {
                algorithm.requirements(&mut RouteReplayer::new(target, route))
            }
            None => {
                let mut builder = RouteBuilder::new(target);
                let matched = algorithm.requirements(&mut builder);
                let route = if matched {
                    AlgorithmRoute::Route(builder.into_route())
                } else {
                    AlgorithmRoute::Mismatch
                };
                log::trace!(
                    "Recorded {} route for structure {:016x}",
                    if matched { "a" } else { "a mismatch" },
                    frame.structure().canonical_hash()
                );
                self.cache.insert(frame.structure(), route);
                matched
            }
        }
    }
}
