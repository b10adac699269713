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

//! Algorithms and the component bindings they declare.

use std::fmt;
use std::marker::PhantomData;

use crate::component::{Component, ComponentOwner};

/// A typed pointer into a container's component buffer, filled in by a router.
///
/// A binding is only bound while its algorithm executes; outside of a run it is
/// empty and every accessor returns an empty slice.
pub struct Binding<T: Component> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Component> Binding<T> {
    /// An unbound binding.
    pub const fn new() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Who owns the bound instances: one per node or one per chunk.
    pub const fn owner(&self) -> ComponentOwner {
        T::OWNER
    }

    /// Returns `true` while bound to component data.
    pub fn is_bound(&self) -> bool {
        !self.ptr.is_null()
    }

    /// Number of bound instances.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no instance is bound.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bound instances.
    pub fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() {
            return &[];
        }
        // SAFETY: a bound pointer addresses `len` live instances of the
        // container being routed, which is exclusively borrowed for the run.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// The bound instances, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.ptr.is_null() {
            return &mut [];
        }
        // SAFETY: see `as_slice`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// The first bound instance: the chunk's instance for chunk-owned components.
    pub fn get(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Mutable variant of [`Binding::get`].
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub(crate) fn bind(&mut self, data: *mut u8, len: usize) {
        self.ptr = data.cast::<T>();
        self.len = len;
    }

    /// Moves the binding to the next chunk element.
    pub(crate) fn advance(&mut self, previous_node_count: usize, node_count: usize) {
        if self.ptr.is_null() {
            return;
        }
        match T::OWNER {
            ComponentOwner::Node => {
                self.ptr = self.ptr.wrapping_add(previous_node_count);
                self.len = node_count;
            }
            ComponentOwner::Chunk => {
                self.ptr = self.ptr.wrapping_add(1);
            }
        }
    }

    pub(crate) fn unbind(&mut self) {
        self.ptr = std::ptr::null_mut();
        self.len = 0;
    }

    #[cfg(test)]
    pub(crate) fn address(&self) -> *const u8 {
        self.ptr as *const u8
    }
}

impl<T: Component> Default for Binding<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("component", &std::any::type_name::<T>())
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

// SAFETY: a binding only refers to `Send + Sync` components and is unbound
// outside of the exclusive borrow of a run.
unsafe impl<T: Component> Send for Binding<T> {}
// SAFETY: see above.
unsafe impl<T: Component> Sync for Binding<T> {}

/// A visitor over the component requirements of an algorithm.
///
/// Routers implement this to resolve, replay, advance or reset bindings.
pub trait Requirements {
    /// Visits a required component. Returns `false` if it cannot be provided,
    /// which aborts the run.
    fn require<T: Component>(&mut self, binding: &mut Binding<T>) -> bool;

    /// Visits an optional component. An absent component leaves the binding
    /// unbound. Never aborts.
    fn optional<T: Component>(&mut self, binding: &mut Binding<T>) -> bool;
}

/// An algorithm executed over the chunks of containers.
///
/// ```ignore
/// struct Integrate {
///     position: Binding<Position>,
///     velocity: Binding<Velocity>,
/// }
///
/// impl Algorithm for Integrate {
///     fn requirements<R: Requirements>(&mut self, req: &mut R) -> bool {
///         req.require(&mut self.position) && req.require(&mut self.velocity)
///     }
///
///     fn execute(&mut self, _node_count: usize) {
///         let velocity = self.velocity.as_slice().to_vec();
///         for (p, v) in self.position.as_mut_slice().iter_mut().zip(velocity) {
///             p.0 += v.0;
///         }
///     }
/// }
/// ```
pub trait Algorithm {
    /// Declares every component binding, in a fixed order.
    ///
    /// Each binding is passed to the visitor exactly once, and the visit must
    /// stop as soon as the visitor returns `false`. The order and the set of
    /// requirements must not depend on the data.
    fn requirements<R: Requirements>(&mut self, req: &mut R) -> bool;

    /// Runs on one chunk of `node_count` nodes with every binding resolved.
    fn execute(&mut self, node_count: usize);
}
