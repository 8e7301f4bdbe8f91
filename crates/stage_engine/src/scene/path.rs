//! Root-to-node id sequences

use std::fmt;

use crate::foundation::ids::NodeId;

/// Ids from the root of the stage down to a node, inclusive
///
/// Ordering is lexicographic: a path sorts before every longer path that
/// extends it, so sorting paths yields a depth-first pre-order listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StageNodePath {
    nodes: Vec<NodeId>,
}

impl StageNodePath {
    /// Empty path
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append a node at the deep end
    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    /// Builder-style [`push`](Self::push)
    #[must_use]
    pub fn child(mut self, node: NodeId) -> Self {
        self.nodes.push(node);
        self
    }

    /// True if `prefix` is a (not necessarily strict) prefix of this path
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.nodes.starts_with(&prefix.nodes)
    }

    /// True if `prefix` is a prefix and strictly shorter
    pub fn strictly_starts_with(&self, prefix: &Self) -> bool {
        self.nodes.len() > prefix.nodes.len() && self.starts_with(prefix)
    }

    /// The node this path leads to
    pub fn target(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Path of the parent, `None` for a root or empty path
    pub fn parent(&self) -> Option<Self> {
        match self.nodes.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self {
                nodes: rest.to_vec(),
            }),
            _ => None,
        }
    }

    /// Ids in root-first order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Depth of the target (a root has length 1)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True for the empty path
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<Vec<NodeId>> for StageNodePath {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<NodeId> for StageNodePath {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StageNodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "/{}", node.raw())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ids: &[u64]) -> StageNodePath {
        ids.iter().map(|&id| NodeId::from_raw(id)).collect()
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert!(path(&[1, 2]) < path(&[1, 2, 3]));
        assert!(path(&[1, 2]) < path(&[1, 3]));
        assert!(path(&[1, 2, 3]) < path(&[1, 3]));
        assert_eq!(path(&[4, 5]), path(&[4, 5]));
    }

    #[test]
    fn test_starts_with() {
        assert!(path(&[1, 2, 3]).starts_with(&path(&[1, 2])));
        assert!(!path(&[1, 2]).starts_with(&path(&[1, 2, 3])));
        assert!(path(&[1, 2]).starts_with(&path(&[1, 2])));
        assert!(!path(&[1, 2]).strictly_starts_with(&path(&[1, 2])));
        assert!(!path(&[1, 3]).starts_with(&path(&[1, 2])));
    }

    #[test]
    fn test_parent_and_target() {
        let p = path(&[1, 2, 3]);
        assert_eq!(p.target(), Some(NodeId::from_raw(3)));
        assert_eq!(p.parent(), Some(path(&[1, 2])));
        assert_eq!(path(&[1]).parent(), None);
        assert_eq!(p.to_string(), "/1/2/3");
    }
}
