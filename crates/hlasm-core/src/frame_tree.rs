//! The processing-frame tree: an interned call stack of macro/copy expansions.
//!
//! Grounded in `examples/original_source/parser_library/src/context/source_context.h`'s
//! `processing_frame_tree`. The original uses a `pmr::monotonic_buffer_resource`
//! and raw-pointer-keyed interning sets so that two statements which reached
//! the same point in the same way (same parent, same resource, same position,
//! same member) share a single node. This crate gets the same sharing with a
//! plain append-only arena: nodes are never freed individually, so a `Vec`
//! indexed by [`NodeId`] is both simpler and safe.

use hlasm_syntax::Position;
use rustc_hash::FxHashMap;

use crate::location::ResourceLocation;

/// What kind of member a processing frame is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingType {
    /// Not currently inside any nested member (top-level open code).
    None,
    /// Expanding the primary open-code file.
    OpenCode,
    /// Expanding a `COPY` member.
    Copy,
    /// Expanding a macro definition.
    Macro,
}

/// Index of a node in a [`ProcessingFrameTree`]'s arena.
///
/// `NodeId::ROOT` never denotes a real frame; it is the conventional "no
/// parent" sentinel, analogous to the original's null `processing_frame_node*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The sentinel id denoting "no parent" / the tree root.
    pub const ROOT: NodeId = NodeId(u32::MAX);

    fn as_index(self) -> Option<usize> {
        if self == Self::ROOT {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

/// A single stack frame: where in a source file the processor currently is,
/// within which member, doing what kind of expansion.
///
/// Equivalent to `processing_frame`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessingFrame {
    /// Position within `resource`.
    pub position: Position,
    /// The resource (file or virtual member) this frame is positioned in.
    pub resource: ResourceLocation,
    /// The macro/copy member name this frame is expanding, if any.
    pub member_name: Option<smol_str::SmolStr>,
    /// What kind of member this frame is processing.
    pub proc_type: ProcessingType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Node {
    parent: NodeId,
    frame: ProcessingFrame,
}

/// The interned tree of processing frames, shared across the whole open-code
/// parse so that recursive macro expansions reuse identical suffixes of the
/// call stack instead of allocating a fresh chain every step.
#[derive(Debug, Default)]
pub struct ProcessingFrameTree {
    nodes: Vec<Node>,
    interned: FxHashMap<Node, NodeId>,
}

impl ProcessingFrameTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances `current` by one processing step, returning the (possibly
    /// newly interned) node for the resulting frame.
    ///
    /// Equivalent to `processing_frame_tree::step`.
    pub fn step(
        &mut self,
        current: NodeId,
        position: Position,
        resource: ResourceLocation,
        member_name: Option<smol_str::SmolStr>,
        proc_type: ProcessingType,
    ) -> NodeId {
        let node = Node {
            parent: current,
            frame: ProcessingFrame {
                position,
                resource,
                member_name,
                proc_type,
            },
        };
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let id = NodeId(u32::try_from(self.nodes.len()).expect("frame tree exceeds u32::MAX nodes"));
        self.nodes.push(node.clone());
        self.interned.insert(node, id);
        id
    }

    /// The frame stored at `id`, or `None` for [`NodeId::ROOT`].
    #[must_use]
    pub fn frame(&self, id: NodeId) -> Option<&ProcessingFrame> {
        id.as_index().map(|idx| &self.nodes[idx].frame)
    }

    /// The parent of `id`, or [`NodeId::ROOT`] if `id` is itself the root or a top-level frame.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> NodeId {
        id.as_index().map_or(NodeId::ROOT, |idx| self.nodes[idx].parent)
    }

    /// Walks from `id` up to the root, returning frames innermost-first.
    ///
    /// Equivalent to `node_pointer::to_vector`.
    #[must_use]
    pub fn to_vec(&self, mut id: NodeId) -> Vec<&ProcessingFrame> {
        let mut out = Vec::new();
        while let Some(frame) = self.frame(id) {
            out.push(frame);
            id = self.parent(id);
        }
        out
    }

    /// The number of distinct frames interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if no frames have been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Position {
        Position::new(line, 0)
    }

    #[test]
    fn identical_steps_intern_to_the_same_node() {
        let mut tree = ProcessingFrameTree::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        let a = tree.step(NodeId::ROOT, pos(1), loc.clone(), None, ProcessingType::OpenCode);
        let b = tree.step(NodeId::ROOT, pos(1), loc, None, ProcessingType::OpenCode);
        assert_eq!(a, b);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn distinct_steps_get_distinct_nodes() {
        let mut tree = ProcessingFrameTree::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        let a = tree.step(NodeId::ROOT, pos(1), loc.clone(), None, ProcessingType::OpenCode);
        let b = tree.step(a, pos(2), loc, Some("MAC".into()), ProcessingType::Macro);
        assert_ne!(a, b);
        assert_eq!(tree.parent(b), a);
        assert_eq!(tree.to_vec(b).len(), 2);
    }

    #[test]
    fn root_has_no_frame() {
        let tree = ProcessingFrameTree::new();
        assert!(tree.frame(NodeId::ROOT).is_none());
        assert!(tree.to_vec(NodeId::ROOT).is_empty());
    }
}
