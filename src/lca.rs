//! Lowest common ancestor lookup on a [`SectionTree`].
//!
//! The resolver descends from a starting node for as long as both targets stay
//! below a single child, and stops at the first node where their paths split
//! (or where the node is one of the targets).

use crate::tree::{NodeId, SectionTree};

/// Finds lowest common ancestors within one section tree.
#[derive(Debug, Clone, Copy)]
pub struct LcaResolver<'t> {
    tree: &'t SectionTree,
}

impl<'t> LcaResolver<'t> {
    /// Create a resolver over `tree`.
    pub fn new(tree: &'t SectionTree) -> Self {
        Self { tree }
    }

    /// Lowest common ancestor of `n1` and `n2` in the subtree rooted at `root`.
    ///
    /// Returns `None` if either node is not below `root`. A node is its own
    /// ancestor, so the LCA of a section and one of its ancestors is the ancestor.
    pub fn lca(&self, root: NodeId, n1: NodeId, n2: NodeId) -> Option<NodeId> {
        if !self.tree.is_reachable(root, n1) || !self.tree.is_reachable(root, n2) {
            return None;
        }

        let node = self.tree.node(root);
        if *node == *self.tree.node(n1) || *node == *self.tree.node(n2) {
            return Some(root);
        }

        let mut children_in_path = 0;
        let mut next_child = None;
        for &child in &node.children {
            if self.tree.is_reachable(child, n1) || self.tree.is_reachable(child, n2) {
                children_in_path += 1;
                if children_in_path == 2 {
                    return Some(root);
                }
                next_child = Some(child);
            }
        }

        next_child.and_then(|child| self.lca(child, n1, n2))
    }

    /// Lowest common ancestor of two full section paths, searched from the page root.
    pub fn lca_of_sections(&self, sec1: &str, sec2: &str) -> Option<NodeId> {
        let n1 = self.tree.find_section(sec1)?;
        let n2 = self.tree.find_section(sec2)?;
        self.lca(self.tree.root(), n1, n2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SectionTree {
        SectionTree::build([
            "Page/A/B",
            "Page/A/C",
            "Page/A/C/D",
            "Page/E",
            "Page/E/F/G",
        ])
        .unwrap()
    }

    fn value_of(tree: &SectionTree, id: Option<NodeId>) -> Option<&str> {
        id.map(|id| tree.node(id).value.as_str())
    }

    #[test]
    fn test_siblings_meet_at_parent() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let lca = resolver.lca_of_sections("Page/A/B", "Page/A/C");
        assert_eq!(value_of(&tree, lca), Some("Page/A"));
    }

    #[test]
    fn test_ancestor_is_its_own_lca() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let lca = resolver.lca_of_sections("Page/A", "Page/A/C/D");
        assert_eq!(value_of(&tree, lca), Some("Page/A"));

        let lca = resolver.lca_of_sections("Page/A/C/D", "Page/A");
        assert_eq!(value_of(&tree, lca), Some("Page/A"));
    }

    #[test]
    fn test_same_node() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let lca = resolver.lca_of_sections("Page/E/F/G", "Page/E/F/G");
        assert_eq!(value_of(&tree, lca), Some("Page/E/F/G"));
    }

    #[test]
    fn test_different_top_level_sections_meet_at_root() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let lca = resolver.lca_of_sections("Page/A/C/D", "Page/E/F/G");
        assert_eq!(lca, Some(tree.root()));
    }

    #[test]
    fn test_deep_divergence() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let lca = resolver.lca_of_sections("Page/A/C/D", "Page/A/B");
        assert_eq!(value_of(&tree, lca), Some("Page/A"));
    }

    #[test]
    fn test_unreachable_target_yields_none() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        let b = tree.find_section("Page/A/B").unwrap();
        let e = tree.find_section("Page/E").unwrap();
        let g = tree.find_section("Page/E/F/G").unwrap();

        assert_eq!(resolver.lca(e, b, g), None);
        assert_eq!(value_of(&tree, resolver.lca(e, g, e)), Some("Page/E"));
    }

    #[test]
    fn test_missing_section_yields_none() {
        let tree = tree();
        let resolver = LcaResolver::new(&tree);
        assert!(resolver.lca_of_sections("Page/A/B", "Page/Z").is_none());
    }
}
