use generational_arena::{Arena, Index};
use std::fmt;
use termtree::Tree;
use tracing::instrument;

/// Name carried by nodes that never received a name token.
pub const PLACEHOLDER: &str = "?";

/// Expression node in the arena-based tree.
#[derive(Debug, Clone)]
pub struct ExprNode {
    /// Node name; empty for transparent grouping nodes
    pub name: String,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in order
    pub children: Vec<Index>,
}

impl ExprNode {
    fn new(parent: Option<Index>) -> Self {
        Self {
            name: PLACEHOLDER.to_string(),
            parent,
            children: Vec::new(),
        }
    }

    /// Transparent grouping nodes only hold siblings and are never printed as calls.
    pub fn is_group(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Arena-based expression tree.
///
/// Every tree owns exactly one root, created up front with the placeholder
/// name. Nodes are owned by the arena; parent/child links are arena indices,
/// so a subtree can be dropped or re-parented without touching the rest.
#[derive(Debug)]
pub struct ExprTree {
    arena: Arena<ExprNode>,
    root: Index,
}

impl Default for ExprTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(ExprNode::new(None));
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&ExprNode> {
        self.arena.get(idx)
    }

    /// Name of a node, empty if the index is stale.
    pub fn name(&self, idx: Index) -> &str {
        self.arena.get(idx).map_or("", |n| n.name.as_str())
    }

    /// Child indices of a node, empty if the index is stale.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn set_name(&mut self, idx: Index, name: impl Into<String>) {
        if let Some(node) = self.arena.get_mut(idx) {
            node.name = name.into();
        }
    }

    /// Append a new placeholder-named child to `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: Index) -> Index {
        let idx = self.arena.insert(ExprNode::new(Some(parent)));
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(idx);
        }
        idx
    }

    /// Replace the child list of `idx`, re-parenting the new children.
    ///
    /// Children dropped from the list are removed from the arena together
    /// with their subtrees.
    pub fn set_children(&mut self, idx: Index, children: Vec<Index>) {
        let old = match self.arena.get_mut(idx) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for dropped in old.into_iter().filter(|c| !children.contains(c)) {
            self.remove_subtree(dropped);
        }
        for &child in &children {
            if let Some(node) = self.arena.get_mut(child) {
                node.parent = Some(idx);
            }
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.children = children;
        }
    }

    /// Remove a node and everything below it.
    pub fn remove_subtree(&mut self, idx: Index) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        match self.get_node(node_idx) {
            Some(node) => {
                1 + node
                    .children
                    .iter()
                    .map(|&child| self.calculate_depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }

    /// Names of all leaves, left to right.
    pub fn leaf_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.name.clone())
            .collect()
    }

    /// Render the tree for debugging, one node per line.
    pub fn to_tree_string(&self) -> Tree<String> {
        fn build(tree: &ExprTree, idx: Index) -> Tree<String> {
            let label = match tree.get_node(idx) {
                Some(node) if node.is_group() => "<group>".to_string(),
                Some(node) => node.to_string(),
                None => String::new(),
            };
            let leaves: Vec<_> = tree
                .children(idx)
                .iter()
                .map(|&child| build(tree, child))
                .collect();
            Tree::new(label).with_leaves(leaves)
        }
        build(self, self.root)
    }
}

pub struct TreeIterator<'a> {
    arena: &'a ExprTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a ExprTree) -> Self {
        Self {
            arena,
            stack: vec![arena.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a ExprNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExprTree {
        // f(a, g(b))
        let mut tree = ExprTree::new();
        let root = tree.root();
        tree.set_name(root, "f");
        let a = tree.add_child(root);
        tree.set_name(a, "a");
        let g = tree.add_child(root);
        tree.set_name(g, "g");
        let b = tree.add_child(g);
        tree.set_name(b, "b");
        tree
    }

    #[test]
    fn test_new_tree_has_placeholder_root() {
        let tree = ExprTree::new();
        assert_eq!(tree.name(tree.root()), PLACEHOLDER);
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_preorder_depth_and_leaves() {
        let tree = sample();
        let pre: Vec<_> = tree.iter().map(|(_, n)| n.name.clone()).collect();
        assert_eq!(pre, vec!["f", "a", "g", "b"]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_set_children_drops_removed_subtrees() {
        let mut tree = sample();
        let root = tree.root();
        let a = tree.children(root)[0];
        tree.set_children(root, vec![a]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.leaf_names(), vec!["a"]);
    }

    #[test]
    fn test_to_tree_string_labels_groups() {
        let mut tree = sample();
        tree.set_name(tree.root(), "");
        let rendered = tree.to_tree_string().to_string();
        assert!(rendered.starts_with("<group>"));
        assert!(rendered.contains("b"));
    }
}
