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

//! The requirement visitors used by routers.

use std::any::TypeId;

use crate::component::Component;
use crate::routing::algorithm::{Binding, Requirements};
use crate::structure::ChunkStructure;
use strata_core::{strata_assert, strata_debug_assert};

/// The first chunk of a container, as seen by the binders.
#[derive(Clone, Copy)]
pub(crate) struct BindTarget<'a> {
    pub(crate) structure: &'a ChunkStructure,
    pub(crate) slots: &'a [*mut u8],
    pub(crate) node_count: usize,
}

impl BindTarget<'_> {
    fn bind<T: Component>(&self, index: usize, binding: &mut Binding<T>) {
        let ty = self.structure.component_type(index);
        binding.bind(self.slots[index], ty.instance_count(self.node_count, 1));
    }
}

/// Rejects a component bound twice by one algorithm: the two bindings would
/// alias the same buffer.
fn assert_first_request<T: Component>(already_bound: bool) {
    strata_assert!(
        !already_bound,
        "component '{}' is requested twice by the same algorithm",
        std::any::type_name::<T>()
    );
}

/// Resolves every requirement with an identity lookup.
pub(crate) struct DirectBinder<'a> {
    target: BindTarget<'a>,
    bound: Vec<usize>,
}

impl<'a> DirectBinder<'a> {
    pub(crate) fn new(target: BindTarget<'a>) -> Self {
        Self {
            target,
            bound: Vec::new(),
        }
    }

    fn resolve<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        match self.target.structure.index_of(TypeId::of::<T>()) {
            Some(index) => {
                assert_first_request::<T>(self.bound.contains(&index));
                self.bound.push(index);
                self.target.bind(index, binding);
                true
            }
            None => {
                binding.unbind();
                false
            }
        }
    }
}

impl Requirements for DirectBinder<'_> {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.resolve(binding)
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.resolve(binding);
        true
    }
}

/// Resolves every requirement with an identity lookup and records the
/// resulting component indices in declaration order.
pub(crate) struct RouteBuilder<'a> {
    target: BindTarget<'a>,
    route: Vec<Option<usize>>,
}

impl<'a> RouteBuilder<'a> {
    pub(crate) fn new(target: BindTarget<'a>) -> Self {
        Self {
            target,
            route: Vec::new(),
        }
    }

    pub(crate) fn into_route(self) -> Vec<Option<usize>> {
        self.route
    }

    fn record<T: Component>(&mut self, binding: &mut Binding<T>) -> Option<usize> {
        let index = self.target.structure.index_of(TypeId::of::<T>());
        if let Some(index) = index {
            assert_first_request::<T>(self.route.contains(&Some(index)));
            self.target.bind(index, binding);
        } else {
            binding.unbind();
        }
        self.route.push(index);
        index
    }
}

impl Requirements for RouteBuilder<'_> {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.record(binding).is_some()
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.record(binding);
        true
    }
}

/// Binds from a recorded route without any identity lookup.
pub(crate) struct RouteReplayer<'a> {
    target: BindTarget<'a>,
    route: &'a [Option<usize>],
    cursor: usize,
}

impl<'a> RouteReplayer<'a> {
    pub(crate) fn new(target: BindTarget<'a>, route: &'a [Option<usize>]) -> Self {
        Self {
            target,
            route,
            cursor: 0,
        }
    }

    fn replay<T: Component>(&mut self, binding: &mut Binding<T>) -> Option<usize> {
        strata_assert!(
            self.cursor < self.route.len(),
            "algorithm declares more requirements than its recorded route"
        );
        let entry = self.route[self.cursor];
        self.cursor += 1;
        match entry {
            Some(index) => {
                strata_debug_assert!(
                    self.target.structure.component_type(index).type_id() == TypeId::of::<T>(),
                    "recorded route does not match component '{}'",
                    std::any::type_name::<T>()
                );
                self.target.bind(index, binding);
            }
            None => binding.unbind(),
        }
        entry
    }
}

impl Requirements for RouteReplayer<'_> {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.replay(binding).is_some()
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.replay(binding);
        true
    }
}

/// Moves every bound binding from one chunk element to the next.
pub(crate) struct Advancer {
    pub(crate) previous_node_count: usize,
    pub(crate) node_count: usize,
}

impl Requirements for Advancer {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        binding.advance(self.previous_node_count, self.node_count);
        true
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.require(binding)
    }
}

/// Resets every binding once a run is over.
pub(crate) struct Unbinder;

impl Requirements for Unbinder {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        binding.unbind();
        true
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        binding.unbind();
        true
    }
}

/// Captures the address of every binding, for comparing routers.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct AddressRecorder {
    pub(crate) addresses: Vec<*const u8>,
}

#[cfg(test)]
impl Requirements for AddressRecorder {
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.addresses.push(binding.address());
        true
    }

    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool {
        self.require(binding)
    }
}
