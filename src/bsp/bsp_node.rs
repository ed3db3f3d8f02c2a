//! src/bsp/bsp_node.rs

use std::ops::Range;

use crate::bsp::{BoundingBox, Divline, Seg};

/// Index of a node inside its [`BspTree`].
pub type NodeId = usize;

/// One entry of the tree arena.
#[derive(Debug, Clone, PartialEq)]
pub enum BspNode {
    /// A partition line with the subtrees on either side of it.
    Node {
        divline: Divline,
        front: NodeId,
        back: NodeId,
        bbox: BoundingBox,
    },
    /// A convex subsector: a contiguous run of the tree's seg list.
    Leaf { segs: Range<usize>, bbox: BoundingBox },
}

impl BspNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, BspNode::Leaf { .. })
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            BspNode::Node { bbox, .. } | BspNode::Leaf { bbox, .. } => *bbox,
        }
    }
}

/// A finished BSP tree. Children are always pushed before their parent, so
/// the root is the last node in the arena.
#[derive(Debug, Clone)]
pub struct BspTree {
    pub(crate) nodes: Vec<BspNode>,
    pub(crate) segs: Vec<Seg>,
    pub(crate) root: NodeId,
    pub(crate) splits: usize,
}

impl BspTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id]
    }

    /// Every seg of every leaf, leaf by leaf.
    pub fn segs(&self) -> &[Seg] {
        &self.segs
    }

    /// The segs of a leaf; empty for an internal node.
    pub fn leaf_segs(&self, id: NodeId) -> &[Seg] {
        match &self.nodes[id] {
            BspNode::Leaf { segs, .. } => &self.segs[segs.clone()],
            BspNode::Node { .. } => &[],
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &[Seg])> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(move |(id, _)| (id, self.leaf_segs(id)))
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn num_internal(&self) -> usize {
        self.nodes.len() - self.num_leaves()
    }

    /// How many seg cuts the build performed.
    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Depth of the deepest leaf (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            match &self.nodes[id] {
                BspNode::Node { front, back, .. } => {
                    stack.push((*front, depth + 1));
                    stack.push((*back, depth + 1));
                }
                BspNode::Leaf { .. } => deepest = deepest.max(depth),
            }
        }
        deepest
    }
}
