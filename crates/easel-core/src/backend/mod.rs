//! Tree-mutation API consumed by the reconciliation engine.
//!
//! Nodes are addressed by [`NodeId`] handles into a backend-owned arena.
//! Every child operation works on the parent's positionally ordered child
//! list. [`MemoryTree`] is the in-crate implementation.

mod memory;

pub use memory::{ComponentFactory, ComponentHandle, ElementFields, MemoryTree, NodeKind, TreeOp};

use std::fmt;

use serde_json::Value;

use crate::diagnostics::CallbackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait TreeBackend {
    // ── Creation ──

    fn create_text_node(&mut self, content: &str) -> NodeId;

    /// A non-rendering grouping node (`wx:if`, `wx:for`, `slot`, ...).
    fn create_virtual_node(&mut self, name: &str) -> NodeId;

    /// A component when `tag` names a registered component, a native element otherwise.
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn set_text_content(&mut self, node: NodeId, content: &str);

    // ── Structure ──

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn child_nodes(&self, node: NodeId) -> &[NodeId];

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.child_nodes(parent).get(index).copied()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Insert `nodes` before position `at`; `None` appends.
    fn insert_children(&mut self, parent: NodeId, nodes: &[NodeId], at: Option<usize>);

    /// Insert `child` before the child currently at `at`.
    ///
    /// A child already under `parent` is moved: it is detached first and
    /// `at` is shifted down when it sat before the target position.
    fn insert_child_at(&mut self, parent: NodeId, child: NodeId, at: usize);

    fn remove_children(&mut self, parent: NodeId, from: usize, count: usize);

    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId);

    fn replace_child_at(&mut self, parent: NodeId, new: NodeId, index: usize);

    // ── Element fields ──

    /// Queue a property on a component; `false` when the component does not declare it.
    fn set_property(&mut self, node: NodeId, name: &str, value: &Value) -> bool;

    /// `None` removes the attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>);

    fn set_id(&mut self, node: NodeId, id: &str);

    fn set_class(&mut self, node: NodeId, class: &str);

    fn set_style(&mut self, node: NodeId, style: &str);

    fn set_dataset(&mut self, node: NodeId, name: &str, value: &Value);

    // ── Nested components ──

    fn is_component(&self, node: NodeId) -> bool;

    fn has_pending_changes(&self, node: NodeId) -> bool;

    /// Flush a nested component's own change queue.
    fn apply_pending_changes(&mut self, node: NodeId) -> Result<(), CallbackError>;
}
