//! Comment tree for nested comment threads.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every node
//! owns the list of its replies; `parent`, `prev_sibling` and `next_sibling`
//! are plain ids maintained by the tree. Slots of removed nodes are never
//! reused, so a stale id resolves to `None` instead of to another comment.

use std::iter;
use std::slice;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::api::{CommentRecord, CommentSort};
use crate::date::DateText;
use crate::profile::profile_link;
use crate::text::{Paragraph, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Sibling order of a comment list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentOrder {
    /// Oldest reply first.
    #[default]
    Chronological,
    /// Newest reply first.
    ReverseChronological,
}

impl CommentOrder {
    pub fn reversed(self) -> Self {
        match self {
            Self::Chronological => Self::ReverseChronological,
            Self::ReverseChronological => Self::Chronological,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Chronological => "Chronological",
            Self::ReverseChronological => "New First",
        }
    }
}

impl From<CommentSort> for CommentOrder {
    fn from(sort: CommentSort) -> Self {
        match sort {
            CommentSort::OldestFirst => Self::Chronological,
            CommentSort::MostRecentFirst => Self::ReverseChronological,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("no comment node {0:?}")]
    UnknownNode(NodeId),
    #[error("comment {0} is already in the tree")]
    DuplicateComment(u64),
}

/// Whether a node starts out expanded for a collapse depth `k`. Top-level
/// nodes are always expanded; with `k > 0`, nodes at multiples of `k` are not.
pub fn expanded_at_depth(depth: usize, collapse_depth: usize) -> bool {
    !(collapse_depth > 0 && depth > 0 && depth % collapse_depth == 0)
}

/// The ordered replies of one node, or the top-level comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentList {
    order: CommentOrder,
    items: Vec<NodeId>,
}

impl CommentList {
    fn new(order: CommentOrder) -> Self {
        Self {
            order,
            items: Vec::new(),
        }
    }

    pub fn order(&self) -> CommentOrder {
        self.order
    }

    pub fn items(&self) -> &[NodeId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.items.last().copied()
    }
}

/// What is shown in place of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Paragraphs(Vec<Paragraph>),
    Deleted,
    Unavailable,
}

/// One comment in the tree.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment_id: Option<u64>,
    pub user_id: Option<u64>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
    pub deleted: bool,
    pub content: Content,
    pub date_text: Option<DateText>,
    pub edited_text: Option<DateText>,
    /// Hides the node's descendants, never the node itself.
    pub expanded: bool,
    /// Set by the `hideUsers` option. Shown as a one-line placeholder.
    pub hidden: bool,
    /// A create, edit or delete for this node is in flight.
    pub busy: bool,
    depth: usize,
    children: CommentList,
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

fn content_for(body: Option<&str>, deleted: bool) -> Content {
    match body {
        Some(body) => Content::Paragraphs(tokenize(body)),
        None if deleted => Content::Deleted,
        None => Content::Unavailable,
    }
}

impl CommentNode {
    fn from_record(
        record: &CommentRecord,
        parent: Option<NodeId>,
        depth: usize,
        order: CommentOrder,
    ) -> Self {
        Self {
            comment_id: record.id,
            user_id: record.user_id,
            author: record.name.clone(),
            created_at: record.date,
            edited_at: record.edited_at,
            body: record.body.clone(),
            deleted: record.deleted,
            content: content_for(record.body.as_deref(), record.deleted),
            date_text: None,
            edited_text: None,
            expanded: true,
            hidden: false,
            busy: false,
            depth,
            children: CommentList::new(order),
            parent,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &CommentList {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Whether replies are part of the traversal. A hidden node behaves like
    /// a collapsed one.
    pub fn shows_children(&self) -> bool {
        self.expanded && !self.hidden
    }

    pub fn first_visible_child(&self) -> Option<NodeId> {
        self.children.first().filter(|_| self.shows_children())
    }

    pub fn last_visible_child(&self) -> Option<NodeId> {
        self.children.last().filter(|_| self.shows_children())
    }

    /// Author name, or the placeholder for a missing one.
    pub fn author_text(&self) -> &str {
        match &self.author {
            Some(name) => name,
            None if self.deleted => "deleted",
            None => "unavailable",
        }
    }

    pub fn profile_url(&self) -> Option<String> {
        profile_link(self.user_id, self.author.as_deref())
    }

    pub fn is_tombstone(&self) -> bool {
        self.deleted && self.body.is_none()
    }

    /// Take over the body and edit date of an edited record.
    pub fn apply_edit(&mut self, record: &CommentRecord) {
        self.body = record.body.clone();
        self.edited_at = record.edited_at.or(self.edited_at);
        self.content = content_for(self.body.as_deref(), self.deleted);
    }

    /// Replace the content with a deletion marker, keeping position and replies.
    pub fn tombstone(&mut self) {
        self.deleted = true;
        self.body = None;
        self.content = Content::Deleted;
    }

    /// First link target in the body, if any.
    pub fn first_link(&self) -> Option<&str> {
        let Content::Paragraphs(paragraphs) = &self.content else {
            return None;
        };
        paragraphs
            .iter()
            .flatten()
            .find_map(|segment| segment.href())
    }
}

/// The top-level comment list plus the arena holding every node.
#[derive(Debug, Default)]
pub struct CommentTree {
    nodes: Vec<Option<CommentNode>>,
    roots: CommentList,
}

impl CommentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from records whose sibling sequences are already in
    /// `order` at every level.
    pub fn from_records(records: &[CommentRecord], order: CommentOrder) -> Self {
        let start = std::time::Instant::now();
        let mut tree = Self {
            nodes: Vec::new(),
            roots: CommentList::new(order),
        };
        tree.roots = tree.build_list(records, None, 0, order);
        debug!(
            nodes = tree.len(),
            ?order,
            elapsed_us = start.elapsed().as_micros() as u64,
            "built comment tree"
        );
        tree
    }

    fn build_list(
        &mut self,
        records: &[CommentRecord],
        parent: Option<NodeId>,
        depth: usize,
        order: CommentOrder,
    ) -> CommentList {
        let mut list = CommentList::new(order);
        list.items = records
            .iter()
            .map(|record| self.build_node(record, parent, depth, order))
            .collect();
        link_siblings(&mut self.nodes, &list.items);
        list
    }

    fn build_node(
        &mut self,
        record: &CommentRecord,
        parent: Option<NodeId>,
        depth: usize,
        order: CommentOrder,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Some(CommentNode::from_record(record, parent, depth, order)));
        let children = self.build_list(&record.children, Some(id), depth + 1, order);
        if let Some(node) = self.get_mut(id) {
            node.children = children;
        }
        id
    }

    /// Order shared by every list in the tree.
    pub fn order(&self) -> CommentOrder {
        self.roots.order
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &CommentList {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&CommentNode> {
        self.nodes.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut CommentNode> {
        self.nodes.get_mut(id.0)?.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_comment_id(&self, comment_id: u64) -> Option<NodeId> {
        self.iter()
            .find(|&id| self.get(id).and_then(|n| n.comment_id) == Some(comment_id))
    }

    /// The list holding the replies of `parent`, or the top-level list.
    pub fn list(&self, parent: Option<NodeId>) -> Option<&CommentList> {
        match parent {
            None => Some(&self.roots),
            Some(id) => self.get(id).map(|node| &node.children),
        }
    }

    fn list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut CommentList> {
        match parent {
            None => Some(&mut self.roots),
            Some(id) => self.get_mut(id).map(|node| &mut node.children),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev_sibling
    }

    /// Top-level ancestor of `id`, or `id` itself.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.get(current)?.parent {
            current = parent;
        }
        Some(current)
    }

    /// Flip the expanded state. Returns the new state.
    pub fn toggle_expanded(&mut self, id: NodeId) -> Option<bool> {
        let node = self.get_mut(id)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    /// Next node in depth-first order, skipping the replies of collapsed nodes.
    pub fn find_next(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        if let Some(child) = node.first_visible_child() {
            return Some(child);
        }
        let mut current = Some(id);
        while let Some(candidate) = current {
            let node = self.get(candidate)?;
            if node.next_sibling.is_some() {
                return node.next_sibling;
            }
            current = node.parent;
        }
        None
    }

    /// Previous node in depth-first order: the parent for a first child,
    /// otherwise the last visible descendant of the previous sibling.
    pub fn find_previous(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        let Some(mut current) = node.prev_sibling else {
            return node.parent;
        };
        while let Some(child) = self.get(current)?.last_visible_child() {
            current = child;
        }
        Some(current)
    }

    /// Nodes as they appear on screen, top to bottom.
    pub fn visible(&self) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.roots.first(), |&id| self.find_next(id))
    }

    /// Every node in pre-order, ignoring collapse state.
    pub fn iter(&self) -> Subtree<'_> {
        Subtree {
            tree: self,
            root: None,
            stack: vec![self.roots.items.iter()],
        }
    }

    /// `id` followed by all of its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree {
            tree: self,
            root: self.contains(id).then_some(id),
            stack: Vec::new(),
        }
    }

    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.subtree(id).count().saturating_sub(1)
    }

    fn relink(&mut self, parent: Option<NodeId>) {
        let items = match self.list(parent) {
            Some(list) => list.items.clone(),
            None => return,
        };
        link_siblings(&mut self.nodes, &items);
    }

    /// Reverse one list without touching the lists below it.
    fn reverse_list(&mut self, parent: Option<NodeId>) {
        if let Some(list) = self.list_mut(parent) {
            list.items.reverse();
            list.order = list.order.reversed();
        }
        self.relink(parent);
    }

    /// Reverse the list of `parent` and every list below it.
    fn reverse_lists_from(&mut self, parent: Option<NodeId>) {
        let mut pending = vec![parent];
        while let Some(parent) = pending.pop() {
            self.reverse_list(parent);
            if let Some(list) = self.list(parent) {
                pending.extend(list.items.iter().map(|&id| Some(id)));
            }
        }
    }

    /// Reverse the sibling order of every list. Expansion state, depth and
    /// parentage are unchanged.
    pub fn reverse(&mut self) {
        self.reverse_lists_from(None);
        debug!(order = ?self.order(), "reversed comment order");
    }

    pub fn set_order(&mut self, order: CommentOrder) {
        if self.order() != order {
            self.reverse();
        }
    }

    /// Add a newly created comment as the chronologically last reply of
    /// `parent` (or as the last top-level comment).
    ///
    /// In reverse order this lands the node at the front of its list.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        record: &CommentRecord,
    ) -> Result<NodeId, TreeError> {
        let depth = match parent {
            None => 0,
            Some(id) => self.get(id).ok_or(TreeError::UnknownNode(id))?.depth + 1,
        };
        if let Some(comment_id) = record.id
            && self.find_by_comment_id(comment_id).is_some()
        {
            return Err(TreeError::DuplicateComment(comment_id));
        }

        let reverse =
            self.list(parent).map(CommentList::order) == Some(CommentOrder::ReverseChronological);
        if reverse {
            self.reverse_list(parent);
        }
        let id = self.build_node(record, parent, depth, CommentOrder::Chronological);
        if let Some(list) = self.list_mut(parent) {
            list.items.push(id);
        }
        self.relink(parent);
        if reverse {
            self.reverse_list(parent);
            self.reverse_lists_from(Some(id));
        }
        Ok(id)
    }

    /// Remove a node and its replies, repairing the links of its siblings.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        let parent = self.get(id).ok_or(TreeError::UnknownNode(id))?.parent;
        let doomed: Vec<NodeId> = self.subtree(id).collect();
        if let Some(list) = self.list_mut(parent) {
            list.items.retain(|&item| item != id);
        }
        self.relink(parent);
        for node in doomed {
            self.nodes[node.0] = None;
        }
        Ok(())
    }
}

fn link_siblings(nodes: &mut [Option<CommentNode>], items: &[NodeId]) {
    for (i, &id) in items.iter().enumerate() {
        if let Some(Some(node)) = nodes.get_mut(id.0) {
            node.prev_sibling = i.checked_sub(1).map(|prev| items[prev]);
            node.next_sibling = items.get(i + 1).copied();
        }
    }
}

/// Pre-order walk over a subtree, driven by a stack of child cursors.
pub struct Subtree<'a> {
    tree: &'a CommentTree,
    root: Option<NodeId>,
    stack: Vec<slice::Iter<'a, NodeId>>,
}

impl Iterator for Subtree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        if let Some(root) = self.root.take() {
            if let Some(node) = tree.get(root) {
                self.stack.push(node.children.items.iter());
            }
            return Some(root);
        }
        loop {
            let cursor = self.stack.last_mut()?;
            match cursor.next() {
                Some(&id) => {
                    if let Some(node) = tree.get(id) {
                        self.stack.push(node.children.items.iter());
                    }
                    return Some(id);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordBuilder, chain, sample_records};

    fn sample_tree() -> CommentTree {
        CommentTree::from_records(&sample_records(), CommentOrder::Chronological)
    }

    fn by_comment(tree: &CommentTree, comment_id: u64) -> NodeId {
        tree.find_by_comment_id(comment_id).unwrap()
    }

    fn comment_ids(tree: &CommentTree, ids: impl IntoIterator<Item = NodeId>) -> Vec<u64> {
        ids.into_iter()
            .map(|id| tree.get(id).unwrap().comment_id.unwrap())
            .collect()
    }

    fn list_ids(tree: &CommentTree, parent: Option<NodeId>) -> Vec<u64> {
        comment_ids(tree, tree.list(parent).unwrap().items().to_vec())
    }

    fn assert_links(tree: &CommentTree) {
        let mut lists = vec![None];
        lists.extend(tree.iter().map(Some));
        for parent in lists {
            let items = tree.list(parent).unwrap().items();
            for (i, &id) in items.iter().enumerate() {
                let node = tree.get(id).unwrap();
                assert_eq!(node.parent(), parent);
                assert_eq!(node.prev_sibling(), i.checked_sub(1).map(|p| items[p]));
                assert_eq!(node.next_sibling(), items.get(i + 1).copied());
                let expected_depth = parent.map_or(0, |p| tree.get(p).unwrap().depth() + 1);
                assert_eq!(node.depth(), expected_depth);
                assert_eq!(node.children().order(), tree.order());
            }
        }
    }

    #[test]
    fn test_new_tree_is_empty() {
        let tree = CommentTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.visible().count(), 0);
    }

    #[test]
    fn test_build_from_records() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 6);
        assert_eq!(list_ids(&tree, None), vec![1, 5]);
        assert_eq!(list_ids(&tree, Some(by_comment(&tree, 1))), vec![2, 3]);
        assert_eq!(tree.get(by_comment(&tree, 4)).unwrap().depth(), 2);
        assert_links(&tree);
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let records = vec![
            RecordBuilder::new(1).no_name().no_body().deleted().build(),
            RecordBuilder::new(2).no_name().no_body().build(),
        ];
        let tree = CommentTree::from_records(&records, CommentOrder::Chronological);
        let deleted = tree.get(by_comment(&tree, 1)).unwrap();
        assert_eq!(deleted.author_text(), "deleted");
        assert_eq!(deleted.content, Content::Deleted);
        assert!(deleted.profile_url().is_none());
        let missing = tree.get(by_comment(&tree, 2)).unwrap();
        assert_eq!(missing.author_text(), "unavailable");
        assert_eq!(missing.content, Content::Unavailable);
    }

    #[test]
    fn test_visible_respects_collapse() {
        let mut tree = sample_tree();
        assert_eq!(comment_ids(&tree, tree.visible()), vec![1, 2, 4, 3, 5, 6]);

        tree.toggle_expanded(by_comment(&tree, 2));
        assert_eq!(comment_ids(&tree, tree.visible()), vec![1, 2, 3, 5, 6]);

        tree.toggle_expanded(by_comment(&tree, 1));
        assert_eq!(comment_ids(&tree, tree.visible()), vec![1, 5, 6]);
    }

    #[test]
    fn test_hidden_node_hides_replies() {
        let mut tree = sample_tree();
        tree.get_mut(by_comment(&tree, 1)).unwrap().hidden = true;
        assert_eq!(comment_ids(&tree, tree.visible()), vec![1, 5, 6]);
    }

    #[test]
    fn test_find_next_climbs_to_ancestor_sibling() {
        let tree = sample_tree();
        let four = by_comment(&tree, 4);
        assert_eq!(tree.find_next(four), Some(by_comment(&tree, 3)));
        let three = by_comment(&tree, 3);
        assert_eq!(tree.find_next(three), Some(by_comment(&tree, 5)));
        assert_eq!(tree.find_next(by_comment(&tree, 6)), None);
    }

    #[test]
    fn test_find_previous_descends_into_last_child() {
        let mut tree = sample_tree();
        let five = by_comment(&tree, 5);
        assert_eq!(tree.find_previous(five), Some(by_comment(&tree, 3)));
        assert_eq!(tree.find_previous(by_comment(&tree, 2)), Some(by_comment(&tree, 1)));
        assert_eq!(tree.find_previous(by_comment(&tree, 1)), None);

        tree.toggle_expanded(by_comment(&tree, 1));
        assert_eq!(tree.find_previous(five), Some(by_comment(&tree, 1)));
    }

    #[test]
    fn test_next_and_previous_are_inverse() {
        let mut tree = sample_tree();
        for collapsed in [None, Some(2), Some(1), Some(5)] {
            if let Some(comment_id) = collapsed {
                tree.toggle_expanded(by_comment(&tree, comment_id));
            }
            let visible: Vec<NodeId> = tree.visible().collect();
            for &id in &visible {
                if let Some(next) = tree.find_next(id) {
                    assert_eq!(tree.find_previous(next), Some(id));
                }
                if let Some(prev) = tree.find_previous(id) {
                    assert_eq!(tree.find_next(prev), Some(id));
                }
            }
        }
    }

    #[test]
    fn test_root_of() {
        let tree = sample_tree();
        let root = by_comment(&tree, 1);
        assert_eq!(tree.root_of(by_comment(&tree, 4)), Some(root));
        assert_eq!(tree.root_of(root), Some(root));
    }

    #[test]
    fn test_iter_and_subtree_are_preorder() {
        let tree = sample_tree();
        assert_eq!(comment_ids(&tree, tree.iter()), vec![1, 2, 4, 3, 5, 6]);
        let one = by_comment(&tree, 1);
        assert_eq!(comment_ids(&tree, tree.subtree(one)), vec![1, 2, 4, 3]);
        assert_eq!(tree.descendant_count(one), 3);
        assert_eq!(tree.descendant_count(by_comment(&tree, 6)), 0);
    }

    #[test]
    fn test_iter_ignores_collapse() {
        let mut tree = sample_tree();
        tree.toggle_expanded(by_comment(&tree, 1));
        assert_eq!(tree.iter().count(), 6);
    }

    #[test]
    fn test_reverse_is_per_level() {
        let mut tree = sample_tree();
        tree.reverse();
        assert_eq!(tree.order(), CommentOrder::ReverseChronological);
        assert_eq!(comment_ids(&tree, tree.iter()), vec![5, 6, 1, 3, 2, 4]);
        assert_links(&tree);
    }

    #[test]
    fn test_reverse_twice_restores_everything() {
        let mut tree = sample_tree();
        tree.toggle_expanded(by_comment(&tree, 2));
        let before: Vec<_> = tree
            .iter()
            .map(|id| {
                let n = tree.get(id).unwrap();
                (id, n.parent(), n.prev_sibling(), n.next_sibling(), n.expanded, n.depth())
            })
            .collect();

        tree.reverse();
        tree.reverse();

        let after: Vec<_> = tree
            .iter()
            .map(|id| {
                let n = tree.get(id).unwrap();
                (id, n.parent(), n.prev_sibling(), n.next_sibling(), n.expanded, n.depth())
            })
            .collect();
        assert_eq!(before, after);
        assert_eq!(tree.order(), CommentOrder::Chronological);
    }

    #[test]
    fn test_set_order_is_idempotent() {
        let mut tree = sample_tree();
        tree.set_order(CommentOrder::ReverseChronological);
        tree.set_order(CommentOrder::ReverseChronological);
        assert_eq!(list_ids(&tree, None), vec![5, 1]);
    }

    #[test]
    fn test_insert_chronological_appends() {
        let mut tree = sample_tree();
        let one = by_comment(&tree, 1);
        let id = tree.insert(Some(one), &RecordBuilder::new(7).build()).unwrap();
        assert_eq!(list_ids(&tree, Some(one)), vec![2, 3, 7]);
        assert_eq!(tree.get(id).unwrap().depth(), 1);
        assert_links(&tree);
    }

    #[test]
    fn test_insert_reverse_order_goes_first() {
        let records = vec![
            RecordBuilder::new(1).build(),
            RecordBuilder::new(2).build(),
            RecordBuilder::new(3).build(),
        ];
        let mut tree = CommentTree::from_records(&records, CommentOrder::Chronological);
        tree.reverse();
        assert_eq!(list_ids(&tree, None), vec![3, 2, 1]);

        tree.insert(None, &RecordBuilder::new(4).build()).unwrap();
        assert_eq!(list_ids(&tree, None), vec![4, 3, 2, 1]);
        assert_eq!(tree.order(), CommentOrder::ReverseChronological);
        assert_links(&tree);

        tree.reverse();
        assert_eq!(list_ids(&tree, None), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_record_with_replies_matches_tree_order() {
        let mut tree = sample_tree();
        tree.reverse();
        let record = RecordBuilder::new(10)
            .child(RecordBuilder::new(11).build())
            .child(RecordBuilder::new(12).build())
            .build();
        let id = tree.insert(None, &record).unwrap();
        assert_eq!(list_ids(&tree, Some(id)), vec![12, 11]);
        assert_links(&tree);
    }

    #[test]
    fn test_insert_errors_leave_tree_untouched() {
        let mut tree = sample_tree();
        let dup = tree.insert(None, &RecordBuilder::new(3).build());
        assert_eq!(dup, Err(TreeError::DuplicateComment(3)));

        let four = by_comment(&tree, 4);
        tree.remove(four).unwrap();
        let stale = tree.insert(Some(four), &RecordBuilder::new(8).build());
        assert_eq!(stale, Err(TreeError::UnknownNode(four)));
        assert_eq!(tree.len(), 5);
        assert_links(&tree);
    }

    #[test]
    fn test_depth_invariant_after_mixed_operations() {
        let mut tree = CommentTree::from_records(&chain(4), CommentOrder::Chronological);
        let leaf = tree.iter().last().unwrap();
        tree.reverse();
        let added = tree.insert(Some(leaf), &RecordBuilder::new(100).build()).unwrap();
        tree.insert(None, &RecordBuilder::new(101).build()).unwrap();
        tree.reverse();
        tree.insert(Some(added), &RecordBuilder::new(102).build()).unwrap();
        assert_eq!(tree.get(added).unwrap().depth(), 4);
        assert_links(&tree);
    }

    #[test]
    fn test_remove_repairs_siblings() {
        let mut tree = sample_tree();
        let one = by_comment(&tree, 1);
        tree.remove(one).unwrap();
        assert_eq!(list_ids(&tree, None), vec![5]);
        assert_eq!(tree.len(), 2);
        assert!(tree.get(one).is_none());
        assert_eq!(tree.prev_sibling(by_comment(&tree, 5)), None);
        assert_eq!(tree.remove(one), Err(TreeError::UnknownNode(one)));
        assert_links(&tree);
    }

    #[test]
    fn test_apply_edit_and_tombstone() {
        let mut tree = sample_tree();
        let three = by_comment(&tree, 3);
        let node = tree.get_mut(three).unwrap();
        node.apply_edit(&RecordBuilder::new(3).body("see http://example.com").edited().build());
        assert_eq!(node.first_link(), Some("http://example.com"));
        assert!(node.edited_at.is_some());

        node.tombstone();
        assert!(node.is_tombstone());
        assert_eq!(node.content, Content::Deleted);
        assert_eq!(node.first_link(), None);
    }

    #[test]
    fn test_expanded_at_depth() {
        assert!(expanded_at_depth(0, 2));
        assert!(expanded_at_depth(1, 2));
        assert!(!expanded_at_depth(2, 2));
        assert!(expanded_at_depth(3, 2));
        assert!(!expanded_at_depth(4, 2));
        assert!(expanded_at_depth(4, 0));
    }
}
