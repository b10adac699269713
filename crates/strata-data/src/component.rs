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

//! Type-erased component descriptions.
//!
//! A [`ComponentType`] captures everything the storage engine needs to manage
//! values of a component without knowing its concrete type: identity, size,
//! alignment, ownership kind and an operation table ([`ComponentVTable`]).
//! Operations work on whole ranges of instances laid out contiguously.

use std::alloc::Layout;
use std::any::TypeId;
use std::fmt;
use std::ptr;

use strata_core::config::MemoryPolicy;
use strata_core::strata_assert;

/// How many instances of a component a chunk holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentOwner {
    /// One instance per node.
    Node,
    /// Exactly one instance per chunk, regardless of node count.
    Chunk,
}

/// A marker trait for types that can be stored in chunks.
///
/// `Default` is used to construct fresh nodes and `Clone` to deep-copy
/// containers. The `'static` lifetime keeps the `TypeId` identity meaningful and
/// `Send + Sync` lets immutable structures be shared freely.
///
/// Prefer `#[derive(Component)]`, which also accepts `#[component(chunk)]` and
/// `#[component(pod)]`.
pub trait Component: 'static + Send + Sync + Default + Clone {
    /// Whether the component is stored per node or per chunk.
    const OWNER: ComponentOwner = ComponentOwner::Node;

    /// Builds the operation table used to manage type-erased instances.
    fn vtable() -> ComponentVTable {
        ComponentVTable::of::<Self>()
    }
}

/// Constructs or destructs `count` instances starting at instance `first`.
pub type RangeFn = unsafe fn(data: *mut u8, first: usize, count: usize);

/// Moves `count` instances from `from[first_from..]` into `to[first_to..]`.
pub type MoveFn =
    unsafe fn(to: *mut u8, first_to: usize, from: *mut u8, first_from: usize, count: usize);

/// Copies `count` instances from `from[first_from..]` into `to[first_to..]`.
pub type CopyFn =
    unsafe fn(to: *mut u8, first_to: usize, from: *const u8, first_from: usize, count: usize);

/// Swaps `count` instances between `a[first_a..]` and `b[first_b..]`.
pub type SwapFn = unsafe fn(a: *mut u8, first_a: usize, b: *mut u8, first_b: usize, count: usize);

/// The operation table of a component type.
///
/// Every entry is optional. A missing entry means the operation is trivial and
/// the engine falls back to raw memory: zero fill for construction, nothing for
/// destruction, and a byte copy for move, copy and swap. Forward variants walk
/// the range from low to high indices and backward variants from high to low, so
/// that overlapping ranges inside one buffer can be handled in either direction.
///
/// Move semantics follow Rust: a moved-from instance is logically uninitialized
/// and is never destructed. Move-assign drops the destination instance first.
#[derive(Clone, Copy, Default)]
pub struct ComponentVTable {
    /// Writes a default value into uninitialized instances.
    pub construct: Option<RangeFn>,
    /// Drops live instances in place.
    pub destruct: Option<RangeFn>,
    /// Relocates live instances into uninitialized slots, low to high.
    pub move_construct_forward: Option<MoveFn>,
    /// Relocates live instances into uninitialized slots, high to low.
    pub move_construct_backward: Option<MoveFn>,
    /// Relocates live instances over live instances, low to high.
    pub move_assign_forward: Option<MoveFn>,
    /// Relocates live instances over live instances, high to low.
    pub move_assign_backward: Option<MoveFn>,
    /// Clones live instances into uninitialized slots, low to high.
    pub copy_construct_forward: Option<CopyFn>,
    /// Clones live instances into uninitialized slots, high to low.
    pub copy_construct_backward: Option<CopyFn>,
    /// Clones live instances over live instances, low to high.
    pub copy_assign_forward: Option<CopyFn>,
    /// Clones live instances over live instances, high to low.
    pub copy_assign_backward: Option<CopyFn>,
    /// Exchanges live instances, low to high.
    pub swap_forward: Option<SwapFn>,
    /// Exchanges live instances, high to low.
    pub swap_backward: Option<SwapFn>,
}

impl ComponentVTable {
    /// The general table for a component type.
    ///
    /// Rust values are always relocatable by a byte copy, so moves and swaps stay
    /// trivial. Destruction and move-assign are only non-trivial when `T` needs
    /// to be dropped.
    pub fn of<T: Default + Clone + 'static>() -> Self {
        let needs_drop = std::mem::needs_drop::<T>();
        Self {
            construct: Some(construct_range::<T>),
            destruct: needs_drop.then_some(destruct_range::<T> as RangeFn),
            move_construct_forward: None,
            move_construct_backward: None,
            move_assign_forward: needs_drop.then_some(move_assign_forward::<T> as MoveFn),
            move_assign_backward: needs_drop.then_some(move_assign_backward::<T> as MoveFn),
            copy_construct_forward: Some(copy_construct_forward::<T>),
            copy_construct_backward: Some(copy_construct_backward::<T>),
            copy_assign_forward: Some(copy_assign_forward::<T>),
            copy_assign_backward: Some(copy_assign_backward::<T>),
            swap_forward: None,
            swap_backward: None,
        }
    }

    /// The fully trivial table for plain-old-data components.
    ///
    /// Fresh instances are all-zero bit patterns (valid for any `Pod` type) and
    /// every other operation is a byte copy.
    pub fn pod<T: bytemuck::Pod>() -> Self {
        Self::default()
    }
}

impl fmt::Debug for ComponentVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentVTable")
            .field("construct", &self.construct.is_some())
            .field("destruct", &self.destruct.is_some())
            .field("move_construct", &self.move_construct_forward.is_some())
            .field("move_assign", &self.move_assign_forward.is_some())
            .field("copy_construct", &self.copy_construct_forward.is_some())
            .field("copy_assign", &self.copy_assign_forward.is_some())
            .field("swap", &self.swap_forward.is_some())
            .finish()
    }
}

unsafe fn construct_range<T: Default>(data: *mut u8, first: usize, count: usize) {
    let base = data.cast::<T>().add(first);
    for i in 0..count {
        base.add(i).write(T::default());
    }
}

unsafe fn destruct_range<T>(data: *mut u8, first: usize, count: usize) {
    let base = data.cast::<T>().add(first);
    ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base, count));
}

unsafe fn move_assign_forward<T>(
    to: *mut u8,
    first_to: usize,
    from: *mut u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in 0..count {
        ptr::drop_in_place(to.add(i));
        to.add(i).write(from.add(i).read());
    }
}

unsafe fn move_assign_backward<T>(
    to: *mut u8,
    first_to: usize,
    from: *mut u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in (0..count).rev() {
        ptr::drop_in_place(to.add(i));
        to.add(i).write(from.add(i).read());
    }
}

unsafe fn copy_construct_forward<T: Clone>(
    to: *mut u8,
    first_to: usize,
    from: *const u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in 0..count {
        to.add(i).write((*from.add(i)).clone());
    }
}

unsafe fn copy_construct_backward<T: Clone>(
    to: *mut u8,
    first_to: usize,
    from: *const u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in (0..count).rev() {
        to.add(i).write((*from.add(i)).clone());
    }
}

unsafe fn copy_assign_forward<T: Clone>(
    to: *mut u8,
    first_to: usize,
    from: *const u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in 0..count {
        (*to.add(i)).clone_from(&*from.add(i));
    }
}

unsafe fn copy_assign_backward<T: Clone>(
    to: *mut u8,
    first_to: usize,
    from: *const u8,
    first_from: usize,
    count: usize,
) {
    let to = to.cast::<T>().add(first_to);
    let from = from.cast::<T>().add(first_from);
    for i in (0..count).rev() {
        (*to.add(i)).clone_from(&*from.add(i));
    }
}

/// The interned description of one component type.
///
/// Created once per distinct component type by the
/// [`ComponentTypeRegistry`](crate::registry::ComponentTypeRegistry) and immutable
/// thereafter. Identity is the `TypeId`; within a registry, instances are shared
/// behind an `Arc` so identity can also be checked by address.
pub struct ComponentType {
    type_id: TypeId,
    name: &'static str,
    size: usize,
    align: usize,
    owner: ComponentOwner,
    vtable: ComponentVTable,
    policy: MemoryPolicy,
}

impl ComponentType {
    /// Describes the component type `T` with the default memory policy.
    pub fn of<T: Component>() -> Self {
        Self::with_policy::<T>(MemoryPolicy::default())
    }

    /// Describes the component type `T` with an explicit memory policy.
    pub fn with_policy<T: Component>(policy: MemoryPolicy) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            owner: T::OWNER,
            vtable: T::vtable(),
            policy,
        }
    }

    /// Describes a component from its raw parts.
    ///
    /// # Safety
    ///
    /// Every operation in `vtable` must be valid for instances of `size` bytes
    /// aligned to `align`, and missing operations must be valid as raw byte
    /// operations on those instances.
    pub unsafe fn from_raw_parts(
        type_id: TypeId,
        name: &'static str,
        size: usize,
        align: usize,
        owner: ComponentOwner,
        vtable: ComponentVTable,
        policy: MemoryPolicy,
    ) -> Self {
        strata_assert!(
            align.is_power_of_two(),
            "component '{}' has an invalid alignment {}",
            name,
            align
        );
        Self {
            type_id,
            name,
            size,
            align,
            owner,
            vtable,
            policy,
        }
    }

    /// The identity token of the component type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size in bytes of one instance.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment in bytes of one instance.
    #[must_use]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Whether the component is stored per node or per chunk.
    #[must_use]
    pub fn owner(&self) -> ComponentOwner {
        self.owner
    }

    /// Returns `true` for node-owned components.
    #[must_use]
    pub fn is_node_component(&self) -> bool {
        self.owner == ComponentOwner::Node
    }

    /// Returns `true` for chunk-owned components.
    #[must_use]
    pub fn is_chunk_component(&self) -> bool {
        self.owner == ComponentOwner::Chunk
    }

    /// The operation table.
    #[must_use]
    pub fn vtable(&self) -> &ComponentVTable {
        &self.vtable
    }

    /// The memory policy captured at intern time.
    #[must_use]
    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Returns `true` if fresh instances need a constructor call.
    #[must_use]
    pub fn needs_construct(&self) -> bool {
        self.vtable.construct.is_some()
    }

    /// Returns `true` if live instances need a destructor call.
    #[must_use]
    pub fn needs_destruct(&self) -> bool {
        self.vtable.destruct.is_some()
    }

    /// Picks the node or chunk quantity depending on the owner.
    #[inline]
    #[must_use]
    pub fn select(&self, node_value: usize, chunk_value: usize) -> usize {
        match self.owner {
            ComponentOwner::Node => node_value,
            ComponentOwner::Chunk => chunk_value,
        }
    }

    /// Number of instances stored for the given node and chunk counts.
    #[inline]
    #[must_use]
    pub fn instance_count(&self, node_count: usize, chunk_count: usize) -> usize {
        self.select(node_count, chunk_count)
    }

    /// Index of the first instance for the given first node and first chunk.
    #[inline]
    #[must_use]
    pub fn instance_index(&self, first_node: usize, first_chunk: usize) -> usize {
        self.select(first_node, first_chunk)
    }

    /// Byte footprint of a buffer sized for the given capacities.
    #[inline]
    #[must_use]
    pub fn footprint(&self, node_capacity: usize, chunk_capacity: usize) -> usize {
        self.size * self.select(node_capacity, chunk_capacity)
    }

    /// Allocation layout of a buffer sized for the given capacities.
    pub fn layout(&self, node_capacity: usize, chunk_capacity: usize) -> Layout {
        let size = self.footprint(node_capacity, chunk_capacity);
        match Layout::from_size_align(size, self.align) {
            Ok(layout) => layout,
            Err(_) => {
                log::error!(
                    "Component '{}' buffer of {} bytes overflows the address space",
                    self.name,
                    size
                );
                panic!("component buffer layout overflow");
            }
        }
    }

    /// Address of instance `index` in `data`.
    #[inline]
    #[must_use]
    pub fn instance_ptr(&self, data: *mut u8, index: usize) -> *mut u8 {
        data.wrapping_add(index * self.size)
    }

    // --- Instance-range operations ---

    /// Constructs `count` instances starting at instance `first`.
    ///
    /// # Safety
    ///
    /// The range must be in bounds of `data` and uninitialized.
    pub unsafe fn construct_data(&self, data: *mut u8, first: usize, count: usize) {
        if count == 0 {
            return;
        }
        match self.vtable.construct {
            Some(construct) => {
                if self.policy.zero_on_construct {
                    self.zero_data(data, first, count);
                }
                construct(data, first, count);
            }
            None => self.zero_data(data, first, count),
        }
    }

    /// Destructs `count` instances starting at instance `first`.
    ///
    /// # Safety
    ///
    /// The range must be in bounds of `data` and hold live instances.
    pub unsafe fn destruct_data(&self, data: *mut u8, first: usize, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(destruct) = self.vtable.destruct {
            destruct(data, first, count);
        }
        if self.policy.zero_on_destruct {
            self.zero_data(data, first, count);
        }
    }

    /// Relocates `count` live instances into uninitialized slots, walking low to high.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds. When they share a buffer, the destination
    /// must not start after the source. The source range is uninitialized afterwards.
    pub unsafe fn move_construct_data_forward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *mut u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.move_construct_forward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Relocates `count` live instances into uninitialized slots, walking high to low.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds. When they share a buffer, the destination
    /// must not start before the source. The source range is uninitialized afterwards.
    pub unsafe fn move_construct_data_backward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *mut u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.move_construct_backward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Relocates `count` live instances over live instances, walking low to high.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds, hold live instances and must not overlap.
    /// The source range is uninitialized afterwards.
    pub unsafe fn move_assign_data_forward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *mut u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.move_assign_forward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Relocates `count` live instances over live instances, walking high to low.
    ///
    /// # Safety
    ///
    /// Same contract as [`ComponentType::move_assign_data_forward`].
    pub unsafe fn move_assign_data_backward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *mut u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.move_assign_backward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Clones `count` live instances into uninitialized slots, walking low to high.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds and must not overlap.
    pub unsafe fn copy_construct_data_forward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *const u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.copy_construct_forward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Clones `count` live instances into uninitialized slots, walking high to low.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds and must not overlap.
    pub unsafe fn copy_construct_data_backward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *const u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.copy_construct_backward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Clones `count` live instances over live instances, walking low to high.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds, hold live instances and must not overlap.
    pub unsafe fn copy_assign_data_forward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *const u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.copy_assign_forward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Clones `count` live instances over live instances, walking high to low.
    ///
    /// # Safety
    ///
    /// Same contract as [`ComponentType::copy_assign_data_forward`].
    pub unsafe fn copy_assign_data_backward(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *const u8,
        first_from: usize,
        count: usize,
    ) {
        match self.vtable.copy_assign_backward {
            Some(op) => op(to, first_to, from, first_from, count),
            None => self.copy_bytes(to, first_to, from, first_from, count),
        }
    }

    /// Exchanges `count` live instances, walking low to high.
    ///
    /// # Safety
    ///
    /// Both ranges must be in bounds and hold live instances. Overlapping ranges
    /// in one buffer are swapped instance by instance.
    pub unsafe fn swap_data_forward(
        &self,
        a: *mut u8,
        first_a: usize,
        b: *mut u8,
        first_b: usize,
        count: usize,
    ) {
        match self.vtable.swap_forward {
            Some(op) => op(a, first_a, b, first_b, count),
            None => {
                for i in 0..count {
                    self.swap_bytes(a, first_a + i, b, first_b + i);
                }
            }
        }
    }

    /// Exchanges `count` live instances, walking high to low.
    ///
    /// # Safety
    ///
    /// Same contract as [`ComponentType::swap_data_forward`].
    pub unsafe fn swap_data_backward(
        &self,
        a: *mut u8,
        first_a: usize,
        b: *mut u8,
        first_b: usize,
        count: usize,
    ) {
        match self.vtable.swap_backward {
            Some(op) => op(a, first_a, b, first_b, count),
            None => {
                for i in (0..count).rev() {
                    self.swap_bytes(a, first_a + i, b, first_b + i);
                }
            }
        }
    }

    // --- Owner-aware operations ---
    //
    // These take node and chunk coordinates and pick the relevant pair from
    // the component's owner.

    /// Constructs the instances covering the given nodes or chunks.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::construct_data`].
    pub unsafe fn construct_component(
        &self,
        data: *mut u8,
        first_node: usize,
        first_chunk: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.construct_data(
            data,
            self.instance_index(first_node, first_chunk),
            self.instance_count(node_count, chunk_count),
        );
    }

    /// Destructs the instances covering the given nodes or chunks.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::destruct_data`].
    pub unsafe fn destruct_component(
        &self,
        data: *mut u8,
        first_node: usize,
        first_chunk: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.destruct_data(
            data,
            self.instance_index(first_node, first_chunk),
            self.instance_count(node_count, chunk_count),
        );
    }

    /// Relocates the instances covering the given nodes or chunks into uninitialized slots.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::move_construct_data_forward`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn move_construct_component_forward(
        &self,
        to: *mut u8,
        first_node_to: usize,
        first_chunk_to: usize,
        from: *mut u8,
        first_node_from: usize,
        first_chunk_from: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.move_construct_data_forward(
            to,
            self.instance_index(first_node_to, first_chunk_to),
            from,
            self.instance_index(first_node_from, first_chunk_from),
            self.instance_count(node_count, chunk_count),
        );
    }

    /// Relocates the instances covering the given nodes or chunks over live instances.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::move_assign_data_forward`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn move_assign_component_forward(
        &self,
        to: *mut u8,
        first_node_to: usize,
        first_chunk_to: usize,
        from: *mut u8,
        first_node_from: usize,
        first_chunk_from: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.move_assign_data_forward(
            to,
            self.instance_index(first_node_to, first_chunk_to),
            from,
            self.instance_index(first_node_from, first_chunk_from),
            self.instance_count(node_count, chunk_count),
        );
    }

    /// Clones the instances covering the given nodes or chunks into uninitialized slots.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::copy_construct_data_forward`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn copy_construct_component_forward(
        &self,
        to: *mut u8,
        first_node_to: usize,
        first_chunk_to: usize,
        from: *const u8,
        first_node_from: usize,
        first_chunk_from: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.copy_construct_data_forward(
            to,
            self.instance_index(first_node_to, first_chunk_to),
            from,
            self.instance_index(first_node_from, first_chunk_from),
            self.instance_count(node_count, chunk_count),
        );
    }

    /// Clones the instances covering the given nodes or chunks over live instances.
    ///
    /// # Safety
    ///
    /// See [`ComponentType::copy_assign_data_forward`].
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn copy_assign_component_forward(
        &self,
        to: *mut u8,
        first_node_to: usize,
        first_chunk_to: usize,
        from: *const u8,
        first_node_from: usize,
        first_chunk_from: usize,
        node_count: usize,
        chunk_count: usize,
    ) {
        self.copy_assign_data_forward(
            to,
            self.instance_index(first_node_to, first_chunk_to),
            from,
            self.instance_index(first_node_from, first_chunk_from),
            self.instance_count(node_count, chunk_count),
        );
    }

    // --- Raw byte fallbacks ---

    unsafe fn zero_data(&self, data: *mut u8, first: usize, count: usize) {
        if self.size != 0 {
            ptr::write_bytes(self.instance_ptr(data, first), 0, count * self.size);
        }
    }

    unsafe fn copy_bytes(
        &self,
        to: *mut u8,
        first_to: usize,
        from: *const u8,
        first_from: usize,
        count: usize,
    ) {
        if self.size == 0 || count == 0 {
            return;
        }
        let src = from.wrapping_add(first_from * self.size);
        let dst = self.instance_ptr(to, first_to);
        if src != dst as *const u8 {
            // `copy` tolerates overlap in both directions.
            ptr::copy(src, dst, count * self.size);
        }
    }

    unsafe fn swap_bytes(&self, a: *mut u8, index_a: usize, b: *mut u8, index_b: usize) {
        let pa = self.instance_ptr(a, index_a);
        let pb = self.instance_ptr(b, index_b);
        if self.size != 0 && pa != pb {
            ptr::swap_nonoverlapping(pa, pb, self.size);
        }
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("owner", &self.owner)
            .field("vtable", &self.vtable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::MaybeUninit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy, Default, PartialEq, Debug, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Velocity {
        x: f32,
        y: f32,
    }

    impl Component for Velocity {
        fn vtable() -> ComponentVTable {
            ComponentVTable::pod::<Self>()
        }
    }

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Name(String);
    impl Component for Name {}

    #[derive(Clone, Copy, Default)]
    struct Gravity(#[allow(dead_code)] f32);
    impl Component for Gravity {
        const OWNER: ComponentOwner = ComponentOwner::Chunk;
    }

    static DROPS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Clone, Default)]
    struct Counted(#[allow(dead_code)] u32);
    impl Drop for Counted {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::SeqCst);
        }
    }
    impl Component for Counted {}

    #[test]
    fn test_vtable_shape_follows_type_capabilities() {
        let name = ComponentType::of::<Name>();
        assert!(name.needs_construct());
        assert!(name.needs_destruct(), "String needs drop");
        assert!(name.vtable().move_assign_forward.is_some());
        assert!(name.vtable().move_construct_forward.is_none());
        assert!(name.vtable().swap_forward.is_none());

        let velocity = ComponentType::of::<Velocity>();
        assert!(!velocity.needs_construct(), "Pod types construct by zero fill");
        assert!(!velocity.needs_destruct());
        assert!(velocity.vtable().copy_construct_forward.is_none());
    }

    #[test]
    fn test_owner_selects_counts_and_footprint() {
        let velocity = ComponentType::of::<Velocity>();
        let gravity = ComponentType::of::<Gravity>();

        assert_eq!(velocity.owner(), ComponentOwner::Node);
        assert_eq!(gravity.owner(), ComponentOwner::Chunk);

        assert_eq!(velocity.footprint(10, 3), 10 * 8);
        assert_eq!(gravity.footprint(10, 3), 3 * 4);
        assert_eq!(velocity.instance_count(7, 1), 7);
        assert_eq!(gravity.instance_count(7, 1), 1);
        assert_eq!(velocity.instance_index(5, 2), 5);
        assert_eq!(gravity.instance_index(5, 2), 2);
    }

    #[test]
    fn test_construct_copy_and_destruct_strings() {
        let ty = ComponentType::of::<Name>();
        let mut a: [MaybeUninit<Name>; 3] = [const { MaybeUninit::uninit() }; 3];
        let mut b: [MaybeUninit<Name>; 3] = [const { MaybeUninit::uninit() }; 3];
        let pa = a.as_mut_ptr().cast::<u8>();
        let pb = b.as_mut_ptr().cast::<u8>();

        unsafe {
            ty.construct_data(pa, 0, 3);
            (*pa.cast::<Name>().add(1)).0.push_str("bolt");
            ty.copy_construct_data_forward(pb, 0, pa, 0, 3);
            assert_eq!((*pb.cast::<Name>().add(1)).0, "bolt");
            assert_eq!((*pb.cast::<Name>()).0, "");

            // Copy-assign overwrites live values.
            (*pa.cast::<Name>()).0.push_str("nut");
            ty.copy_assign_data_forward(pb, 0, pa, 0, 1);
            assert_eq!((*pb.cast::<Name>()).0, "nut");

            ty.destruct_data(pa, 0, 3);
            ty.destruct_data(pb, 0, 3);
        }
    }

    #[test]
    fn test_move_forward_within_one_buffer() {
        let ty = ComponentType::of::<Velocity>();
        let mut buf = [
            Velocity { x: 0.0, y: 0.0 },
            Velocity { x: 1.0, y: 1.0 },
            Velocity { x: 2.0, y: 2.0 },
            Velocity { x: 3.0, y: 3.0 },
        ];
        let p = buf.as_mut_ptr().cast::<u8>();
        unsafe { ty.move_construct_data_forward(p, 0, p, 1, 3) };
        assert_eq!(buf[0].x, 1.0);
        assert_eq!(buf[1].x, 2.0);
        assert_eq!(buf[2].x, 3.0);
    }

    #[test]
    fn test_move_assign_drops_destination() {
        DROPS.store(0, Ordering::SeqCst);
        let ty = ComponentType::of::<Counted>();
        let mut a: [MaybeUninit<Counted>; 2] = [const { MaybeUninit::uninit() }; 2];
        let mut b: [MaybeUninit<Counted>; 2] = [const { MaybeUninit::uninit() }; 2];
        let pa = a.as_mut_ptr().cast::<u8>();
        let pb = b.as_mut_ptr().cast::<u8>();
        unsafe {
            ty.construct_data(pa, 0, 2);
            ty.construct_data(pb, 0, 2);
            ty.move_assign_data_forward(pa, 0, pb, 0, 2);
            assert_eq!(DROPS.load(Ordering::SeqCst), 2, "Old destination values dropped");
            // `b` is moved-from now; only `a` holds live values.
            ty.destruct_data(pa, 0, 2);
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_swap_exchanges_instances() {
        let ty = ComponentType::of::<Velocity>();
        let mut buf = [Velocity { x: 1.0, y: 0.0 }, Velocity { x: 2.0, y: 0.0 }];
        let p = buf.as_mut_ptr().cast::<u8>();
        unsafe { ty.swap_data_forward(p, 0, p, 1, 1) };
        assert_eq!(buf[0].x, 2.0);
        assert_eq!(buf[1].x, 1.0);
    }

    #[test]
    fn test_zero_on_destruct_policy() {
        let policy = MemoryPolicy {
            zero_on_construct: false,
            zero_on_destruct: true,
        };
        let ty = ComponentType::with_policy::<Velocity>(policy);
        let mut buf = [Velocity { x: 5.0, y: 6.0 }];
        unsafe { ty.destruct_data(buf.as_mut_ptr().cast(), 0, 1) };
        assert_eq!(buf[0], Velocity::default());
    }
}
