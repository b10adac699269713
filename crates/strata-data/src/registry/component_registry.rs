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

//! Interning of component types.

use std::any::TypeId;
use std::sync::Arc;

use ahash::AHashMap;
use strata_core::config::MemoryPolicy;

use crate::component::{Component, ComponentType};

/// A registry that hands out one shared [`ComponentType`] per Rust type.
///
/// Every type registered here gets the registry's memory policy.
#[derive(Debug, Default)]
pub struct ComponentTypeRegistry {
    policy: MemoryPolicy,
    types: AHashMap<TypeId, Arc<ComponentType>>,
}

impl ComponentTypeRegistry {
    /// Creates an empty registry applying `policy` to every new type.
    pub fn new(policy: MemoryPolicy) -> Self {
        Self {
            policy,
            types: AHashMap::new(),
        }
    }

    /// The memory policy applied to new types.
    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Returns the shared descriptor of `T`, creating it on first use.
    pub fn get_or_add<T: Component>(&mut self) -> Arc<ComponentType> {
        let policy = self.policy;
        Arc::clone(self.types.entry(TypeId::of::<T>()).or_insert_with(|| {
            log::debug!("Registering component type '{}'", std::any::type_name::<T>());
            Arc::new(ComponentType::with_policy::<T>(policy))
        }))
    }

    /// Registers a hand-built descriptor.
    ///
    /// If a descriptor with the same identity exists it is kept and returned.
    pub fn register(&mut self, ty: ComponentType) -> Arc<ComponentType> {
        let type_id = ty.type_id();
        Arc::clone(self.types.entry(type_id).or_insert_with(|| {
            log::debug!("Registering component type '{}'", ty.name());
            Arc::new(ty)
        }))
    }

    /// The descriptor registered for `type_id`.
    pub fn lookup(&self, type_id: TypeId) -> Option<&Arc<ComponentType>> {
        self.types.get(&type_id)
    }

    /// The descriptor registered for `T`.
    pub fn get<T: Component>(&self) -> Option<&Arc<ComponentType>> {
        self.lookup(TypeId::of::<T>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over every registered descriptor, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentType>> {
        self.types.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Hue(u8);
    impl Component for Hue {}

    #[test]
    fn test_get_or_add_is_shared() {
        let mut registry = ComponentTypeRegistry::default();
        let a = registry.get_or_add::<Hue>();
        let b = registry.get_or_add::<Hue>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert!(registry.get::<Hue>().is_some());
        assert!(registry.lookup(TypeId::of::<u8>()).is_none());
    }

    #[test]
    fn test_policy_is_applied() {
        let policy = MemoryPolicy {
            zero_on_construct: true,
            zero_on_destruct: true,
        };
        let mut registry = ComponentTypeRegistry::new(policy);
        assert_eq!(registry.get_or_add::<Hue>().policy(), policy);
    }

    #[test]
    fn test_register_keeps_first() {
        let mut registry = ComponentTypeRegistry::default();
        let first = registry.get_or_add::<Hue>();
        let second = registry.register(ComponentType::of::<Hue>());
        assert!(Arc::ptr_eq(&first, &second));
    }
}
