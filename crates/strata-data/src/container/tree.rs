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

//! Tree-linked containers.
//!
//! A [`ChunkTree`] is an arena of containers linked into a forest. Siblings
//! form a circular list: a lone child is its own next and previous sibling, and
//! the last child is the previous sibling of the first. A node that is not part
//! of any sibling ring is *extracted*.

use strata_core::{strata_assert, strata_debug_assert};

/// Handle of a node in a [`ChunkTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeNodeId {
    /// Slot of the node in the arena.
    pub index: u32,
    /// Incremented each time the slot is recycled.
    pub generation: u32,
}

/// Tree links of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeLinks {
    /// The parent, `None` for a root.
    pub parent: Option<TreeNodeId>,
    /// The first child of the sibling ring below this node.
    pub first_child: Option<TreeNodeId>,
    /// The next sibling, `None` when extracted.
    pub next: Option<TreeNodeId>,
    /// The previous sibling, `None` when extracted.
    pub previous: Option<TreeNodeId>,
}

#[derive(Debug, Clone)]
struct TreeNode<C> {
    container: C,
    links: TreeLinks,
}

/// An arena of containers linked as a forest.
#[derive(Debug, Clone)]
pub struct ChunkTree<C> {
    nodes: Vec<(TreeNodeId, Option<TreeNode<C>>)>,
    freed: Vec<u32>,
    len: usize,
}

impl<C> Default for ChunkTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ChunkTree<C> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            freed: Vec::new(),
            len: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no node.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds an extracted root node holding `container`.
    pub fn insert(&mut self, container: C) -> TreeNodeId {
        self.len += 1;
        let node = TreeNode {
            container,
            links: TreeLinks::default(),
        };
        if let Some(index) = self.freed.pop() {
            let (id, slot) = &mut self.nodes[index as usize];
            id.generation += 1;
            *slot = Some(node);
            *id
        } else {
            let Ok(index) = u32::try_from(self.nodes.len()) else {
                strata_assert!(false, "tree arena is full");
                unreachable!()
            };
            let id = TreeNodeId {
                index,
                generation: 0,
            };
            self.nodes.push((id, Some(node)));
            id
        }
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn contains(&self, id: TreeNodeId) -> bool {
        self.node(id).is_some()
    }

    /// The container of a live node.
    pub fn get(&self, id: TreeNodeId) -> Option<&C> {
        self.node(id).map(|n| &n.container)
    }

    /// Mutable access to the container of a live node.
    pub fn get_mut(&mut self, id: TreeNodeId) -> Option<&mut C> {
        self.node_mut(id).map(|n| &mut n.container)
    }

    /// The links of a live node.
    pub fn links(&self, id: TreeNodeId) -> Option<TreeLinks> {
        self.node(id).map(|n| n.links)
    }

    /// The parent of `id`.
    pub fn parent(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.expect_links(id).parent
    }

    /// The first child of `id`.
    pub fn first_child(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.expect_links(id).first_child
    }

    /// The last child of `id`, which is the previous sibling of the first.
    pub fn last_child(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.first_child(id).and_then(|first| self.previous_sibling(first))
    }

    /// The next sibling of `id`, wrapping around the ring.
    pub fn next_sibling(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.expect_links(id).next
    }

    /// The previous sibling of `id`, wrapping around the ring.
    pub fn previous_sibling(&self, id: TreeNodeId) -> Option<TreeNodeId> {
        self.expect_links(id).previous
    }

    /// Returns `true` if `id` has no parent.
    pub fn is_root(&self, id: TreeNodeId) -> bool {
        self.parent(id).is_none()
    }

    /// Returns `true` if `id` has no child.
    pub fn is_leaf(&self, id: TreeNodeId) -> bool {
        self.first_child(id).is_none()
    }

    /// Returns `true` if `id` is not part of a sibling ring.
    pub fn is_extracted(&self, id: TreeNodeId) -> bool {
        self.next_sibling(id).is_none()
    }

    /// The children of `id`, from the first child around the ring.
    pub fn children(&self, id: TreeNodeId) -> Children<'_, C> {
        let first = self.first_child(id);
        Children {
            tree: self,
            first,
            next: first,
        }
    }

    /// Unlinks `id` from its sibling ring and its parent.
    ///
    /// The parent's first child moves to the next sibling, or to `None` when
    /// `id` was the only child. The children of `id` stay attached to it.
    pub fn extract(&mut self, id: TreeNodeId) {
        let links = self.expect_links(id);
        let (Some(next), Some(previous)) = (links.next, links.previous) else {
            return;
        };

        if let Some(parent) = links.parent {
            let parent_links = self.links_mut(parent);
            if parent_links.first_child == Some(id) {
                parent_links.first_child = (next != id).then_some(next);
            }
        }
        if next != id {
            self.links_mut(previous).next = Some(next);
            self.links_mut(next).previous = Some(previous);
        }

        let links = self.links_mut(id);
        links.next = None;
        links.previous = None;
        links.parent = None;
    }

    /// Links the extracted node `sibling` right before `id`.
    ///
    /// `sibling` takes the parent of `id`. An extracted `id` first becomes a
    /// ring of its own.
    pub fn insert_previous_sibling(&mut self, id: TreeNodeId, sibling: TreeNodeId) {
        self.check_insertable(id, sibling);
        if self.is_extracted(id) {
            let links = self.links_mut(id);
            links.next = Some(id);
            links.previous = Some(id);
        }

        let links = self.expect_links(id);
        let previous = links.previous.unwrap_or(id);
        let sibling_links = self.links_mut(sibling);
        sibling_links.parent = links.parent;
        sibling_links.next = Some(id);
        sibling_links.previous = Some(previous);
        self.links_mut(previous).next = Some(sibling);
        self.links_mut(id).previous = Some(sibling);
    }

    /// Links the extracted node `sibling` right after `id`.
    pub fn insert_next_sibling(&mut self, id: TreeNodeId, sibling: TreeNodeId) {
        self.check_insertable(id, sibling);
        if self.is_extracted(id) {
            let links = self.links_mut(id);
            links.next = Some(id);
            links.previous = Some(id);
        }
        let next = self.expect_links(id).next.unwrap_or(id);
        self.insert_previous_sibling(next, sibling);
    }

    /// Links the extracted node `child` as the first child of `id`.
    pub fn insert_first_child(&mut self, id: TreeNodeId, child: TreeNodeId) {
        self.check_insertable(id, child);
        match self.first_child(id) {
            Some(first) => self.insert_previous_sibling(first, child),
            None => self.adopt_only_child(id, child),
        }
        self.links_mut(id).first_child = Some(child);
    }

    /// Links the extracted node `child` as the last child of `id`.
    pub fn insert_last_child(&mut self, id: TreeNodeId, child: TreeNodeId) {
        self.check_insertable(id, child);
        match self.first_child(id) {
            Some(first) => self.insert_previous_sibling(first, child),
            None => {
                self.adopt_only_child(id, child);
                self.links_mut(id).first_child = Some(child);
            }
        }
    }

    /// Extracts `child`, then links it as the first child of `id`.
    pub fn move_to_first_child(&mut self, id: TreeNodeId, child: TreeNodeId) {
        self.extract(child);
        self.insert_first_child(id, child);
    }

    /// Extracts `child`, then links it as the last child of `id`.
    pub fn move_to_last_child(&mut self, id: TreeNodeId, child: TreeNodeId) {
        self.extract(child);
        self.insert_last_child(id, child);
    }

    /// Extracts `sibling`, then links it right before `id`.
    pub fn move_to_previous_sibling(&mut self, id: TreeNodeId, sibling: TreeNodeId) {
        self.extract(sibling);
        self.insert_previous_sibling(id, sibling);
    }

    /// Extracts `sibling`, then links it right after `id`.
    pub fn move_to_next_sibling(&mut self, id: TreeNodeId, sibling: TreeNodeId) {
        self.extract(sibling);
        self.insert_next_sibling(id, sibling);
    }

    /// Removes `id` and its whole subtree, returning the container of `id`.
    pub fn remove(&mut self, id: TreeNodeId) -> Option<C> {
        self.node(id)?;
        self.extract(id);

        let mut pending: Vec<TreeNodeId> = self.children(id).collect();
        while let Some(descendant) = pending.pop() {
            pending.extend(self.children(descendant));
            self.release(descendant);
        }
        self.release(id)
    }

    /// Iterates over every live node.
    pub fn iter(&self) -> impl Iterator<Item = (TreeNodeId, &C)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.as_ref().map(|n| (*id, &n.container)))
    }

    /// Iterates mutably over every live node.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TreeNodeId, &mut C)> {
        self.nodes
            .iter_mut()
            .filter_map(|(id, node)| node.as_mut().map(|n| (*id, &mut n.container)))
    }

    fn release(&mut self, id: TreeNodeId) -> Option<C> {
        let (_, slot) = &mut self.nodes[id.index as usize];
        let node = slot.take()?;
        self.freed.push(id.index);
        self.len -= 1;
        Some(node.container)
    }

    fn adopt_only_child(&mut self, id: TreeNodeId, child: TreeNodeId) {
        let links = self.links_mut(child);
        links.parent = Some(id);
        links.next = Some(child);
        links.previous = Some(child);
    }

    fn check_insertable(&self, id: TreeNodeId, inserted: TreeNodeId) {
        strata_assert!(id != inserted, "a tree node cannot be linked to itself");
        strata_assert!(
            self.is_extracted(inserted),
            "tree node {:?} must be extracted before it is inserted",
            inserted
        );
        strata_debug_assert!(
            !self.is_ancestor(inserted, id),
            "tree node {:?} cannot be linked below its own descendant {:?}",
            inserted,
            id
        );
    }

    /// Returns `true` if `ancestor` is on the parent chain of `id`.
    fn is_ancestor(&self, ancestor: TreeNodeId, id: TreeNodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    fn node(&self, id: TreeNodeId) -> Option<&TreeNode<C>> {
        match self.nodes.get(id.index as usize) {
            Some((slot_id, node)) if *slot_id == id => node.as_ref(),
            _ => None,
        }
    }

    fn node_mut(&mut self, id: TreeNodeId) -> Option<&mut TreeNode<C>> {
        match self.nodes.get_mut(id.index as usize) {
            Some((slot_id, node)) if *slot_id == id => node.as_mut(),
            _ => None,
        }
    }

    fn expect_links(&self, id: TreeNodeId) -> TreeLinks {
        match self.node(id) {
            Some(node) => node.links,
            None => {
                strata_assert!(false, "stale tree node {:?}", id);
                unreachable!()
            }
        }
    }

    fn links_mut(&mut self, id: TreeNodeId) -> &mut TreeLinks {
        match self.node_mut(id) {
            Some(node) => &mut node.links,
            None => {
                strata_assert!(false, "stale tree node {:?}", id);
                unreachable!()
            }
        }
    }
}

/// Iterator over the children of a tree node.
pub struct Children<'a, C> {
    tree: &'a ChunkTree<C>,
    first: Option<TreeNodeId>,
    next: Option<TreeNodeId>,
}

impl<C> Iterator for Children<'_, C> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<TreeNodeId> {
        let current = self.next?;
        let following = self.tree.next_sibling(current);
        self.next = following.filter(|id| Some(*id) != self.first);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(count: usize) -> (ChunkTree<usize>, Vec<TreeNodeId>) {
        let mut tree = ChunkTree::new();
        let ids = (0..count).map(|i| tree.insert(i)).collect();
        (tree, ids)
    }

    fn child_values(tree: &ChunkTree<usize>, id: TreeNodeId) -> Vec<usize> {
        tree.children(id).map(|c| *tree.get(c).unwrap()).collect()
    }

    #[test]
    fn test_new_nodes_are_extracted_roots() {
        let (tree, ids) = tree(1);
        assert!(tree.is_extracted(ids[0]));
        assert!(tree.is_root(ids[0]));
        assert!(tree.is_leaf(ids[0]));
    }

    #[test]
    fn test_single_child_ring() {
        let (mut tree, ids) = tree(2);
        tree.insert_first_child(ids[0], ids[1]);
        assert_eq!(tree.first_child(ids[0]), Some(ids[1]));
        assert_eq!(tree.parent(ids[1]), Some(ids[0]));
        assert_eq!(tree.next_sibling(ids[1]), Some(ids[1]));
        assert_eq!(tree.previous_sibling(ids[1]), Some(ids[1]));
    }

    #[test]
    fn test_first_and_last_children() {
        let (mut tree, ids) = tree(4);
        tree.insert_last_child(ids[0], ids[1]);
        tree.insert_last_child(ids[0], ids[2]);
        tree.insert_first_child(ids[0], ids[3]);
        assert_eq!(child_values(&tree, ids[0]), vec![3, 1, 2]);
        assert_eq!(tree.last_child(ids[0]), Some(ids[2]));
        assert_eq!(tree.next_sibling(ids[2]), Some(ids[3]));
        assert!(tree.children(ids[0]).all(|c| tree.parent(c) == Some(ids[0])));
    }

    #[test]
    fn test_sibling_insertion() {
        let (mut tree, ids) = tree(4);
        tree.insert_first_child(ids[0], ids[1]);
        tree.insert_next_sibling(ids[1], ids[2]);
        tree.insert_previous_sibling(ids[1], ids[3]);
        // Inserting before the first child appends at the end of the ring.
        assert_eq!(child_values(&tree, ids[0]), vec![1, 2, 3]);
        assert_eq!(tree.parent(ids[3]), Some(ids[0]));
    }

    #[test]
    fn test_extract_first_child() {
        let (mut tree, ids) = tree(3);
        tree.insert_last_child(ids[0], ids[1]);
        tree.insert_last_child(ids[0], ids[2]);

        tree.extract(ids[1]);
        assert!(tree.is_extracted(ids[1]));
        assert!(tree.is_root(ids[1]));
        assert_eq!(tree.first_child(ids[0]), Some(ids[2]));
        assert_eq!(tree.next_sibling(ids[2]), Some(ids[2]));

        tree.extract(ids[2]);
        assert!(tree.is_leaf(ids[0]));
        tree.extract(ids[2]);
    }

    #[test]
    fn test_move_between_parents() {
        let (mut tree, ids) = tree(4);
        tree.insert_last_child(ids[0], ids[2]);
        tree.insert_last_child(ids[0], ids[3]);
        tree.move_to_first_child(ids[1], ids[3]);
        assert_eq!(child_values(&tree, ids[0]), vec![2]);
        assert_eq!(child_values(&tree, ids[1]), vec![3]);
        tree.move_to_next_sibling(ids[2], ids[3]);
        assert_eq!(child_values(&tree, ids[0]), vec![2, 3]);
        assert!(tree.is_leaf(ids[1]));
    }

    #[test]
    fn test_remove_subtree() {
        let (mut tree, ids) = tree(4);
        tree.insert_last_child(ids[0], ids[1]);
        tree.insert_last_child(ids[1], ids[2]);
        tree.insert_last_child(ids[0], ids[3]);

        assert_eq!(tree.remove(ids[1]), Some(1));
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains(ids[2]));
        assert_eq!(child_values(&tree, ids[0]), vec![3]);

        let reused = tree.insert(7);
        assert_eq!(reused.generation, 1);
        assert_eq!(reused.index, ids[1].index);
        assert!(tree.get(ids[1]).is_none());
        assert_eq!(tree.get(reused), Some(&7));
    }

    #[test]
    #[should_panic(expected = "must be extracted")]
    fn test_insert_linked_node() {
        let (mut tree, ids) = tree(3);
        tree.insert_first_child(ids[0], ids[1]);
        tree.insert_first_child(ids[2], ids[1]);
    }

    fn chain(count: usize) -> (ChunkTree<usize>, Vec<TreeNodeId>) {
        let (mut tree, ids) = tree(count);
        for pair in ids.windows(2) {
            tree.insert_last_child(pair[0], pair[1]);
        }
        (tree, ids)
    }

    #[test]
    #[should_panic(expected = "below its own descendant")]
    fn test_insert_under_descendant() {
        let (mut tree, ids) = chain(3);
        tree.insert_last_child(ids[2], ids[0]);
    }

    #[test]
    #[should_panic(expected = "below its own descendant")]
    fn test_insert_beside_descendant() {
        let (mut tree, ids) = chain(3);
        tree.move_to_next_sibling(ids[2], ids[0]);
    }

    #[test]
    fn test_move_subtree_under_other_root() {
        let (mut tree, ids) = chain(3);
        let other = tree.insert(9);
        tree.move_to_first_child(other, ids[1]);
        assert_eq!(tree.parent(ids[1]), Some(other));
        assert!(tree.is_leaf(ids[0]));
        assert_eq!(child_values(&tree, ids[1]), vec![2]);
        assert_eq!(tree.remove(other), Some(9));
        assert_eq!(tree.len(), 1);
    }
}
