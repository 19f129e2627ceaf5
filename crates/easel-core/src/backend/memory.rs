//! Arena-backed in-memory element tree.

use std::fmt::{self, Write as _};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use super::{NodeId, TreeBackend};
use crate::diagnostics::{trigger_warning, CallbackError};

/// What a [`MemoryTree`] needs from a nested component.
pub trait ComponentHandle {
    /// Queue a property update; `false` when the property is not declared.
    fn replace_property(&self, name: &str, value: &Value) -> bool;

    fn has_pending_changes(&self) -> bool;

    fn apply_pending_changes(&self) -> Result<(), CallbackError>;
}

/// Builds the component registered for a tag.
pub type ComponentFactory = Rc<dyn Fn(&str) -> Rc<dyn ComponentHandle>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Text(String),
    Virtual(String),
    Element { tag: String, component: bool },
}

/// Element state written through the [`TreeBackend`] setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFields {
    pub id: String,
    pub class: String,
    pub style: String,
    pub attributes: IndexMap<String, String>,
    pub dataset: IndexMap<String, Value>,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    Create(NodeId),
    Insert {
        parent: NodeId,
        nodes: Vec<NodeId>,
        at: Option<usize>,
    },
    Move {
        parent: NodeId,
        node: NodeId,
        at: usize,
    },
    Remove {
        parent: NodeId,
        from: usize,
        count: usize,
    },
    Replace {
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    },
    SetText(NodeId),
    /// `field` is `id`, `class`, `style`, `attr:<name>`, `data:<name>` or `prop:<name>`.
    Set {
        node: NodeId,
        field: String,
    },
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    fields: ElementFields,
    component: Option<Rc<dyn ComponentHandle>>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            fields: ElementFields::default(),
            component: None,
        }
    }
}

/// Nodes live in a `Vec` arena and are never freed; removed nodes are
/// only detached.
pub struct MemoryTree {
    nodes: Vec<NodeData>,
    components: IndexMap<String, ComponentFactory>,
    log: Vec<TreeOp>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTree")
            .field("nodes", &self.nodes.len())
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("tree", &self.dump(self.root()))
            .finish()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Root)],
            components: IndexMap::new(),
            log: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Elements created with `tag` become components built by `factory`.
    pub fn register_component(
        &mut self,
        tag: impl Into<String>,
        factory: impl Fn(&str) -> Rc<dyn ComponentHandle> + 'static,
    ) {
        self.components.insert(tag.into(), Rc::new(factory));
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        self.log.push(TreeOp::Create(id));
        id
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.node(node).map(|n| &n.kind)
    }

    pub fn fields(&self, node: NodeId) -> Option<&ElementFields> {
        self.node(node).map(|n| &n.fields)
    }

    pub fn component(&self, node: NodeId) -> Option<Rc<dyn ComponentHandle>> {
        self.node(node).and_then(|n| n.component.clone())
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        if let NodeKind::Text(s) = &data.kind {
            out.push_str(s);
        }
        for child in &data.children {
            self.collect_text(*child, out);
        }
    }

    pub fn ops(&self) -> &[TreeOp] {
        &self.log
    }

    pub fn take_ops(&mut self) -> Vec<TreeOp> {
        std::mem::take(&mut self.log)
    }

    /// Markup of the children of `node`, virtual nodes included as `<!name>` groups.
    pub fn dump(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_children(node, true, &mut out);
        out
    }

    /// Markup of the children of `node` as rendered: virtual nodes are transparent.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_children(node, false, &mut out);
        out
    }

    fn write_children(&self, node: NodeId, virtuals: bool, out: &mut String) {
        if let Some(data) = self.node(node) {
            for child in &data.children {
                self.write_node(*child, virtuals, out);
            }
        }
    }

    fn write_node(&self, node: NodeId, virtuals: bool, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Root => self.write_children(node, virtuals, out),
            NodeKind::Text(s) => out.push_str(s),
            NodeKind::Virtual(name) => {
                if virtuals {
                    let _ = write!(out, "<!{name}>");
                }
                self.write_children(node, virtuals, out);
                if virtuals {
                    let _ = write!(out, "</!{name}>");
                }
            }
            NodeKind::Element { tag, .. } => {
                let f = &data.fields;
                out.push('<');
                out.push_str(tag);
                for (name, value) in [("id", &f.id), ("class", &f.class), ("style", &f.style)] {
                    if !value.is_empty() {
                        let _ = write!(out, " {name}=\"{value}\"");
                    }
                }
                for (name, value) in &f.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                for (name, value) in &f.dataset {
                    let _ = write!(out, " data-{name}={value}");
                }
                out.push('>');
                self.write_children(node, virtuals, out);
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }

    fn attach(&mut self, parent: NodeId, nodes: &[NodeId], at: Option<usize>) {
        for node in nodes {
            self.detach(*node);
            if let Some(n) = self.node_mut(*node) {
                n.parent = Some(parent);
            }
        }
        if let Some(p) = self.node_mut(parent) {
            let at = at.unwrap_or(p.children.len()).min(p.children.len());
            p.children.splice(at..at, nodes.iter().copied());
        }
    }

    fn set_field(&mut self, node: NodeId, field: String, f: impl FnOnce(&mut ElementFields)) {
        match self.node_mut(node) {
            Some(NodeData {
                kind: NodeKind::Element { .. },
                fields,
                ..
            }) => f(fields),
            _ => {
                trigger_warning(&format!("Cannot set \"{field}\" on non-element node {node}."));
                return;
            }
        }
        self.log.push(TreeOp::Set { node, field });
    }
}

impl TreeBackend for MemoryTree {
    fn create_text_node(&mut self, content: &str) -> NodeId {
        self.push(NodeData::new(NodeKind::Text(content.to_string())))
    }

    fn create_virtual_node(&mut self, name: &str) -> NodeId {
        self.push(NodeData::new(NodeKind::Virtual(name.to_string())))
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let handle = self.components.get(tag).cloned().map(|factory| factory(tag));
        let mut data = NodeData::new(NodeKind::Element {
            tag: tag.to_string(),
            component: handle.is_some(),
        });
        data.component = handle;
        self.push(data)
    }

    fn set_text_content(&mut self, node: NodeId, content: &str) {
        if let Some(NodeData {
            kind: NodeKind::Text(s),
            ..
        }) = self.node_mut(node)
        {
            *s = content.to_string();
            self.log.push(TreeOp::SetText(node));
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_children(parent, &[child], None);
    }

    fn insert_children(&mut self, parent: NodeId, nodes: &[NodeId], at: Option<usize>) {
        self.attach(parent, nodes, at);
        self.log.push(TreeOp::Insert {
            parent,
            nodes: nodes.to_vec(),
            at,
        });
    }

    fn insert_child_at(&mut self, parent: NodeId, child: NodeId, at: usize) {
        let current = self
            .child_nodes(parent)
            .iter()
            .position(|c| *c == child);
        let Some(pos) = current else {
            self.insert_children(parent, &[child], Some(at));
            return;
        };
        let at = if pos < at { at - 1 } else { at };
        self.attach(parent, &[child], Some(at));
        self.log.push(TreeOp::Move {
            parent,
            node: child,
            at,
        });
    }

    fn remove_children(&mut self, parent: NodeId, from: usize, count: usize) {
        let Some(p) = self.node_mut(parent) else {
            return;
        };
        let from = from.min(p.children.len());
        let end = from.saturating_add(count).min(p.children.len());
        let removed: Vec<NodeId> = p.children.drain(from..end).collect();
        for node in removed {
            if let Some(n) = self.node_mut(node) {
                n.parent = None;
            }
        }
        self.log.push(TreeOp::Remove { parent, from, count });
    }

    fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) {
        self.detach(new);
        let Some(pos) = self.child_nodes(parent).iter().position(|c| *c == old) else {
            trigger_warning(&format!("Node {old} is not a child of {parent}. Replacement is ignored."));
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children[pos] = new;
        }
        if let Some(n) = self.node_mut(old) {
            n.parent = None;
        }
        if let Some(n) = self.node_mut(new) {
            n.parent = Some(parent);
        }
        self.log.push(TreeOp::Replace { parent, new, old });
    }

    fn replace_child_at(&mut self, parent: NodeId, new: NodeId, index: usize) {
        match self.child_at(parent, index) {
            Some(old) => self.replace_child(parent, new, old),
            None => self.insert_children(parent, &[new], None),
        }
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: &Value) -> bool {
        let Some(handle) = self.component(node) else {
            return false;
        };
        let declared = handle.replace_property(name, value);
        if declared {
            self.log.push(TreeOp::Set {
                node,
                field: format!("prop:{name}"),
            });
        }
        declared
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: Option<&str>) {
        self.set_field(node, format!("attr:{name}"), |f| match value {
            Some(v) => {
                f.attributes.insert(name.to_string(), v.to_string());
            }
            None => {
                f.attributes.shift_remove(name);
            }
        });
    }

    fn set_id(&mut self, node: NodeId, id: &str) {
        self.set_field(node, "id".into(), |f| f.id = id.to_string());
    }

    fn set_class(&mut self, node: NodeId, class: &str) {
        self.set_field(node, "class".into(), |f| f.class = class.to_string());
    }

    fn set_style(&mut self, node: NodeId, style: &str) {
        self.set_field(node, "style".into(), |f| f.style = style.to_string());
    }

    fn set_dataset(&mut self, node: NodeId, name: &str, value: &Value) {
        self.set_field(node, format!("data:{name}"), |f| {
            f.dataset.insert(name.to_string(), value.clone());
        });
    }

    fn is_component(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.component.is_some())
    }

    fn has_pending_changes(&self, node: NodeId) -> bool {
        self.node(node)
            .and_then(|n| n.component.as_ref())
            .is_some_and(|c| c.has_pending_changes())
    }

    fn apply_pending_changes(&mut self, node: NodeId) -> Result<(), CallbackError> {
        match self.component(node) {
            Some(handle) => handle.apply_pending_changes(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_with(children: &[&str]) -> (MemoryTree, Vec<NodeId>) {
        let mut t = MemoryTree::new();
        let root = t.root();
        let ids: Vec<NodeId> = children.iter().map(|c| t.create_text_node(c)).collect();
        t.insert_children(root, &ids, None);
        (t, ids)
    }

    #[test]
    fn test_insert_and_remove() {
        let (mut t, ids) = tree_with(&["a", "b", "c"]);
        let root = t.root();
        let x = t.create_text_node("x");
        t.insert_children(root, &[x], Some(1));
        assert_eq!(t.to_html(root), "axbc");
        t.remove_children(root, 0, 2);
        assert_eq!(t.to_html(root), "bc");
        assert_eq!(t.parent(ids[0]), None);
        assert_eq!(t.parent(ids[1]), Some(root));
    }

    #[test]
    fn test_move_adjusts_target() {
        let (mut t, ids) = tree_with(&["a", "b", "c"]);
        let root = t.root();
        t.insert_child_at(root, ids[0], 3);
        assert_eq!(t.to_html(root), "bca");
        t.insert_child_at(root, ids[0], 0);
        assert_eq!(t.to_html(root), "abc");
        let moves = t
            .ops()
            .iter()
            .filter(|op| matches!(op, TreeOp::Move { .. }))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn test_replace() {
        let (mut t, ids) = tree_with(&["a", "b"]);
        let root = t.root();
        let x = t.create_text_node("x");
        t.replace_child_at(root, x, 1);
        assert_eq!(t.to_html(root), "ax");
        assert_eq!(t.parent(ids[1]), None);
        let y = t.create_text_node("y");
        t.replace_child(root, y, ids[0]);
        assert_eq!(t.to_html(root), "yx");
    }

    #[test]
    fn test_element_fields_and_dump() {
        let mut t = MemoryTree::new();
        let root = t.root();
        let v = t.create_virtual_node("wx:if");
        let div = t.create_element("div");
        let text = t.create_text_node("hi");
        t.append_child(root, v);
        t.append_child(v, div);
        t.append_child(div, text);
        t.set_class(div, "c");
        t.set_attribute(div, "title", Some("t"));
        t.set_dataset(div, "n", &json!(1));
        assert_eq!(t.to_html(root), "<div class=\"c\" title=\"t\" data-n=1>hi</div>");
        assert_eq!(
            t.dump(root),
            "<!wx:if><div class=\"c\" title=\"t\" data-n=1>hi</div></!wx:if>"
        );
        t.set_attribute(div, "title", None);
        assert!(t.fields(div).unwrap().attributes.is_empty());
        assert_eq!(t.text_content(root), "hi");
        assert!(!t.set_property(div, "x", &json!(1)));
    }
}
