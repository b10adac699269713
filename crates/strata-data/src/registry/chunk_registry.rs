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

//! Storage of live containers behind generational handles.

use strata_core::strata_assert;

/// Handle of a container in a [`ChunkRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkHandle {
    /// Slot of the container.
    pub index: u32,
    /// Incremented each time the slot is recycled.
    pub generation: u32,
}

/// A slot map of containers.
///
/// Deleting a container destructs its components and frees its memory;
/// dropping the registry does the same for every container left.
#[derive(Debug)]
pub struct ChunkRegistry<C> {
    slots: Vec<(ChunkHandle, Option<C>)>,
    freed: Vec<u32>,
    len: usize,
}

impl<C> Default for ChunkRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChunkRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            freed: Vec::new(),
            len: 0,
        }
    }

    /// Stores `container` and returns its handle.
    pub fn insert(&mut self, container: C) -> ChunkHandle {
        let handle = self.store(container);
        log::debug!("Stored chunk {:?} ({} live)", handle, self.len);
        handle
    }

    fn store(&mut self, container: C) -> ChunkHandle {
        self.len += 1;
        if let Some(index) = self.freed.pop() {
            let (handle, slot) = &mut self.slots[index as usize];
            handle.generation += 1;
            *slot = Some(container);
            *handle
        } else {
            let Ok(index) = u32::try_from(self.slots.len()) else {
                strata_assert!(false, "chunk registry is full");
                unreachable!()
            };
            let handle = ChunkHandle {
                index,
                generation: 0,
            };
            self.slots.push((handle, Some(container)));
            handle
        }
    }

    /// The container behind `handle`, if it is still alive.
    pub fn get(&self, handle: ChunkHandle) -> Option<&C> {
        match self.slots.get(handle.index as usize) {
            Some((current, slot)) if *current == handle => slot.as_ref(),
            _ => None,
        }
    }

    /// Mutable access to the container behind `handle`.
    pub fn get_mut(&mut self, handle: ChunkHandle) -> Option<&mut C> {
        match self.slots.get_mut(handle.index as usize) {
            Some((current, slot)) if *current == handle => slot.as_mut(),
            _ => None,
        }
    }

    /// Returns `true` if `handle` refers to a live container.
    pub fn contains(&self, handle: ChunkHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Takes the container behind `handle` out of the registry.
    pub fn remove(&mut self, handle: ChunkHandle) -> Option<C> {
        let container = match self.slots.get_mut(handle.index as usize) {
            Some((current, slot)) if *current == handle => slot.take()?,
            _ => return None,
        };
        self.freed.push(handle.index);
        self.len -= 1;
        Some(container)
    }

    /// Destroys the container behind `handle`.
    ///
    /// Returns `false` and logs a warning if the handle is unknown or stale.
    pub fn delete(&mut self, handle: ChunkHandle) -> bool {
        match self.remove(handle) {
            Some(_) => {
                log::debug!("Deleted chunk {:?} ({} live)", handle, self.len);
                true
            }
            None => {
                log::warn!("Attempted to delete an unknown chunk {:?}", handle);
                false
            }
        }
    }

    /// Number of live containers.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no container is alive.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over every live container.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkHandle, &C)> {
        self.slots
            .iter()
            .filter_map(|(handle, slot)| slot.as_ref().map(|c| (*handle, c)))
    }

    /// Iterates mutably over every live container.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ChunkHandle, &mut C)> {
        self.slots
            .iter_mut()
            .filter_map(|(handle, slot)| slot.as_mut().map(|c| (*handle, c)))
    }

    /// Destroys every container. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, (_, slot)) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.freed.push(index as u32);
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_delete() {
        let mut registry = ChunkRegistry::new();
        let a = registry.insert("a".to_string());
        let b = registry.insert("b".to_string());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(a).map(String::as_str), Some("a"));

        assert!(registry.delete(a));
        assert!(!registry.delete(a));
        assert!(registry.get(a).is_none());
        assert_eq!(registry.len(), 1);

        let c = registry.insert("c".to_string());
        assert_eq!(c.index, a.index);
        assert_ne!(c, a);
        assert!(registry.get(a).is_none());
        registry.get_mut(b).unwrap().push('!');
        let values: Vec<_> = registry.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["c", "b!"]);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut registry = ChunkRegistry::new();
        let handles: Vec<_> = (0..3).map(|i| registry.insert(i)).collect();
        registry.clear();
        assert!(registry.is_empty());
        assert!(handles.iter().all(|h| !registry.contains(*h)));
        let reused = registry.insert(9);
        assert_eq!(reused.generation, 1);
    }
}
