//! Section tree built from slash-delimited section paths.
//!
//! Every page's outline is a rooted tree: the root holds the page identifier and
//! every other node holds the full path from the page root down to one section
//! (e.g. `"Page/History/Early life"`). Nodes live in an arena owned by
//! [`SectionTree`] and refer to each other through [`NodeId`]s, so the parent link
//! is a plain index and never an owning reference.

use crate::error::{DistanceError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Delimiter between the segments of a section path.
pub const PATH_DELIMITER: char = '/';

/// Index of a node inside its [`SectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node in the section tree.
///
/// Identity is the path string: two nodes are equal iff their `value`s are equal,
/// regardless of where they are stored.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Full path from the page root to this node.
    pub value: String,

    /// Child nodes, each extending `value` by exactly one segment.
    pub children: Vec<NodeId>,

    /// Owning node, `None` for the page root.
    pub parent: Option<NodeId>,
}

impl TreeNode {
    fn new(value: String, parent: Option<NodeId>) -> Self {
        Self {
            value,
            children: Vec::new(),
            parent,
        }
    }

    /// Number of delimiters in the node's path. The page root has depth 0.
    pub fn depth(&self) -> usize {
        section_depth(&self.value)
    }

    /// Last segment of the path (the section name, or the page id for the root).
    pub fn name(&self) -> &str {
        self.value
            .rsplit_once(PATH_DELIMITER)
            .map_or(self.value.as_str(), |(_, name)| name)
    }

    /// Check if this node has children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for TreeNode {}

impl Hash for TreeNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Depth of a section path, counted as the number of `/` characters.
pub fn section_depth(path: &str) -> usize {
    path.matches(PATH_DELIMITER).count()
}

/// Page identifier of a section path (its first segment).
pub fn page_of(path: &str) -> &str {
    split_first_segment(path).0
}

/// Split `path` into its first segment and the remaining suffix.
fn split_first_segment(path: &str) -> (&str, &str) {
    path.split_once(PATH_DELIMITER).unwrap_or((path, ""))
}

/// The section outline of a single page.
#[derive(Debug, Clone)]
pub struct SectionTree {
    nodes: Vec<TreeNode>,
}

impl SectionTree {
    /// Build a tree from the section paths used by one page.
    ///
    /// All paths must start with the same page segment. Duplicate paths are
    /// harmless: inserting a path that is already present changes nothing.
    pub fn build<I, S>(sections: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections = sections.into_iter();
        let first = sections.next().ok_or(DistanceError::EmptySectionSet)?;
        let first = first.as_ref();

        let mut tree = Self {
            nodes: vec![TreeNode::new(page_of(first).to_string(), None)],
        };
        tree.insert_section(first)?;

        for section in sections {
            tree.insert_section(section.as_ref())?;
        }

        Ok(tree)
    }

    fn insert_section(&mut self, path: &str) -> Result<NodeId> {
        let (page, rest) = split_first_segment(path);
        if page != self.page_id() {
            return Err(DistanceError::InconsistentPageRoot {
                expected: self.page_id().to_string(),
                found: path.to_string(),
            });
        }
        Ok(self.insert(self.root(), rest))
    }

    /// Recursively insert the remaining `suffix` below `parent`.
    fn insert(&mut self, parent: NodeId, suffix: &str) -> NodeId {
        if suffix.is_empty() {
            return parent;
        }

        let (segment, rest) = split_first_segment(suffix);
        let value = self.child_value(parent, segment);

        let child = match self.child_with_value(parent, &value) {
            Some(existing) => existing,
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(TreeNode::new(value, Some(parent)));
                self.nodes[parent.0].children.push(id);
                id
            }
        };

        self.insert(child, rest)
    }

    fn child_value(&self, parent: NodeId, segment: &str) -> String {
        format!("{}{}{}", self.nodes[parent.0].value, PATH_DELIMITER, segment)
    }

    fn child_with_value(&self, parent: NodeId, value: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].value == value)
    }

    /// The page root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Page identifier held by the root.
    pub fn page_id(&self) -> &str {
        &self.nodes[0].value
    }

    /// Access a node of this tree.
    ///
    /// Panics if `id` was not handed out by this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Depth of a node (number of `/` in its value).
    pub fn depth(&self, id: NodeId) -> usize {
        self.nodes[id.0].depth()
    }

    /// Walk from `from` along `suffix`, a path relative to `from`'s value.
    ///
    /// `find(root, "")` is the root itself; a missing child at any step yields `None`.
    pub fn find(&self, from: NodeId, suffix: &str) -> Option<NodeId> {
        if suffix.is_empty() {
            return Some(from);
        }

        let (segment, rest) = split_first_segment(suffix);
        let value = self.child_value(from, segment);
        let child = self.child_with_value(from, &value)?;
        self.find(child, rest)
    }

    /// Look up a full section path such as `"Page/A/B"`.
    pub fn find_section(&self, path: &str) -> Option<NodeId> {
        let (page, rest) = split_first_segment(path);
        if page != self.page_id() {
            return None;
        }
        self.find(self.root(), rest)
    }

    /// Check whether a full section path is part of this tree.
    pub fn contains(&self, path: &str) -> bool {
        self.find_section(path).is_some()
    }

    /// True iff `target` is `from` or lies somewhere below it.
    pub fn is_reachable(&self, from: NodeId, target: NodeId) -> bool {
        if self.nodes[from.0] == self.nodes[target.0] {
            return true;
        }
        self.nodes[from.0]
            .children
            .iter()
            .any(|&child| self.is_reachable(child, target))
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a built tree, which holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest node.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    /// Iterate over all nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Format the outline for display, one node per line in pre-order.
    pub fn format(&self) -> String {
        let mut result = String::new();
        self.format_node(self.root(), 0, &mut result);
        result
    }

    fn format_node(&self, id: NodeId, indent: usize, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push_str(&"  ".repeat(indent));
        out.push_str(&node.value);
        out.push('\n');

        for &child in &node.children {
            self.format_node(child, indent + 1, out);
        }
    }
}
