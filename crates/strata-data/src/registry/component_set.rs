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

//! Static component sets.

use std::sync::Arc;

use crate::component::{Component, ComponentType};
use crate::registry::ComponentTypeRegistry;

/// A set of component types known at compile time, used to name a structure.
///
/// Implemented for tuples of up to twelve components, like `(Position, Velocity)`.
/// Use a one-element tuple for a single component.
pub trait ComponentSet {
    /// Interns every component type of the set in `registry`, in declaration order.
    fn component_types(registry: &mut ComponentTypeRegistry) -> Vec<Arc<ComponentType>>;
}

macro_rules! impl_component_set_tuple {
    ($($C:ident),*) => {
        impl<$($C: Component),*> ComponentSet for ($($C,)*) {
            fn component_types(registry: &mut ComponentTypeRegistry) -> Vec<Arc<ComponentType>> {
                vec![$(registry.get_or_add::<$C>()),*]
            }
        }
    };
}

impl_component_set_tuple!(C1);
impl_component_set_tuple!(C1, C2);
impl_component_set_tuple!(C1, C2, C3);
impl_component_set_tuple!(C1, C2, C3, C4);
impl_component_set_tuple!(C1, C2, C3, C4, C5);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7, C8);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7, C8, C9);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11);
impl_component_set_tuple!(C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11, C12);
