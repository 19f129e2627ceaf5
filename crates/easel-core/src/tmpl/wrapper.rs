//! Creation and update walks over a process generator.
//!
//! A process generator is a closure that describes the children of a node
//! by calling [`Scope`] methods in order. The same closure runs once in
//! creation mode, where every call creates a node, and again for each
//! structural update, where every call consumes the next live child and
//! patches it. Per-node template state (branch keys, list identity) lives
//! in a side table keyed by [`NodeId`].

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::binding::BindingMap;
use super::list_diff::{KeySource, ListIndex, ListTarget, RangeListManager};
use super::update_tree::{UpdatePathTree, UpdateRef};
use crate::backend::{NodeId, TreeBackend};
use crate::diagnostics::{trigger_warning, CallbackError};

/// Describes the children of a template root from the data snapshot and
/// the update-path tree of the current pass.
pub type ProcGen = Rc<dyn Fn(&mut Scope<'_>, &Value, UpdateRef<'_>)>;

/// Identifies the chosen branch of a conditional group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchKey {
    Index(usize),
    Name(String),
}

impl From<usize> for BranchKey {
    fn from(i: usize) -> Self {
        BranchKey::Index(i)
    }
}

impl From<&str> for BranchKey {
    fn from(s: &str) -> Self {
        BranchKey::Name(s.to_string())
    }
}

impl From<String> for BranchKey {
    fn from(s: String) -> Self {
        BranchKey::Name(s)
    }
}

enum NodeState {
    Branch(BranchKey),
    List(RangeListManager),
    Slot(String),
}

#[derive(Default)]
struct WrapperState {
    nodes: HashMap<NodeId, NodeState>,
    bindings: BindingMap,
    error: Option<CallbackError>,
}

impl WrapperState {
    fn record(&mut self, result: Result<(), CallbackError>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }

    /// Drop side-table entries and bindings of a detached subtree.
    fn forget(&mut self, backend: &dyn TreeBackend, node: NodeId) {
        self.nodes.remove(&node);
        self.bindings.forget(node);
        for child in backend.child_nodes(node) {
            self.forget(backend, *child);
        }
    }
}

fn dash_to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn attribute_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn flush_component(backend: &mut dyn TreeBackend, node: NodeId) -> Result<(), CallbackError> {
    if backend.is_component(node) && backend.has_pending_changes(node) {
        backend.apply_pending_changes(node)?;
    }
    Ok(())
}

// ── Element fields ────────────────────────────────────────────────────────

/// Field setters of one element.
pub struct ElementRef<'a> {
    backend: &'a mut dyn TreeBackend,
    node: NodeId,
}

impl ElementRef<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// A component property (dash-case names are camel-cased), or an
    /// attribute on a native element.
    pub fn property(&mut self, name: &str, value: &Value) {
        if self.backend.is_component(self.node) {
            let camel = dash_to_camel_case(name);
            if !self.backend.set_property(self.node, &camel, value) {
                trigger_warning(&format!("\"{camel}\" is not a valid property"));
            }
        } else {
            self.attribute(name, value);
        }
    }

    /// `true` sets an empty attribute; `false` and null remove it.
    pub fn attribute(&mut self, name: &str, value: &Value) {
        let value = attribute_value(value);
        self.backend.set_attribute(self.node, name, value.as_deref());
    }

    pub fn id(&mut self, id: &str) {
        self.backend.set_id(self.node, id);
    }

    pub fn class(&mut self, class: &str) {
        self.backend.set_class(self.node, class);
    }

    pub fn style(&mut self, style: &str) {
        self.backend.set_style(self.node, style);
    }

    pub fn dataset(&mut self, name: &str, value: &Value) {
        self.backend.set_dataset(self.node, name, value);
    }
}

/// Handed to an element's property-init closure, in creation and update mode.
pub struct Props<'a> {
    backend: &'a mut dyn TreeBackend,
    bindings: &'a mut BindingMap,
    node: NodeId,
    creating: bool,
    data: &'a Value,
    update: UpdateRef<'a>,
}

impl Props<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_creation(&self) -> bool {
        self.creating
    }

    /// Whether a top-level field changed in this pass (always true while creating).
    pub fn changed(&self, field: &str) -> bool {
        self.creating || self.update.field(field).is_changed()
    }

    pub fn element(&mut self) -> ElementRef<'_> {
        ElementRef {
            backend: &mut *self.backend,
            node: self.node,
        }
    }

    /// Bind element fields to a top-level data field.
    ///
    /// `f` runs now while creating and is recorded in the binding map; in
    /// update mode it runs again only when `field` changed.
    pub fn bind(&mut self, field: &str, f: impl Fn(&mut ElementRef<'_>, &Value) + 'static) {
        let data = self.data;
        if self.creating {
            let f = Rc::new(f);
            f(&mut self.element(), data);
            self.bindings.add(
                field,
                self.node,
                Rc::new(move |backend: &mut dyn TreeBackend, node: NodeId, data: &Value| {
                    f(&mut ElementRef { backend, node }, data)
                }),
            );
        } else if self.changed(field) {
            f(&mut self.element(), data);
        }
    }
}

/// One item of a repeated block.
#[derive(Debug, Clone, Copy)]
pub struct ForItem<'i> {
    pub value: &'i Value,
    pub index: &'i ListIndex,
    /// Changes below this item; `All` for a new item.
    pub update: UpdateRef<'i>,
    pub index_changed: bool,
}

impl ForItem<'_> {
    /// Whether a field of the item changed.
    pub fn changed(&self, field: &str) -> bool {
        self.update.field(field).is_changed()
    }
}

// ── Scope ─────────────────────────────────────────────────────────────────

enum Mode {
    Create(Vec<NodeId>),
    Update(usize),
}

/// The children of one node, being created or updated.
pub struct Scope<'a> {
    backend: &'a mut dyn TreeBackend,
    state: &'a mut WrapperState,
    parent: NodeId,
    data: &'a Value,
    update: UpdateRef<'a>,
    mode: Mode,
}

impl<'a> Scope<'a> {
    fn child(&mut self, parent: NodeId, creating: bool) -> Scope<'_> {
        Scope {
            backend: &mut *self.backend,
            state: &mut *self.state,
            parent,
            data: self.data,
            update: if creating { UpdateRef::all() } else { self.update },
            mode: if creating {
                Mode::Create(Vec::new())
            } else {
                Mode::Update(0)
            },
        }
    }

    fn finish(self) {
        if let Mode::Create(children) = self.mode {
            if !children.is_empty() {
                self.backend.insert_children(self.parent, &children, None);
            }
        }
    }

    fn created(&mut self, node: NodeId) {
        if let Mode::Create(children) = &mut self.mode {
            children.push(node);
        }
    }

    fn cursor(&self) -> usize {
        match &self.mode {
            Mode::Create(children) => children.len(),
            Mode::Update(i) => *i,
        }
    }

    fn next_child(&mut self) -> Option<NodeId> {
        let Mode::Update(i) = &mut self.mode else {
            return None;
        };
        let node = self.backend.child_at(self.parent, *i);
        *i += 1;
        node
    }

    pub fn is_creation(&self) -> bool {
        matches!(self.mode, Mode::Create(_))
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Changes of the current pass; `All` while creating.
    pub fn update_tree(&self) -> UpdateRef<'a> {
        self.update
    }

    /// Whether a top-level field changed in this pass (always true while creating).
    pub fn changed(&self, field: &str) -> bool {
        self.is_creation() || self.update.field(field).is_changed()
    }

    /// Report that per-field updates cannot be trusted for this template.
    pub fn disable_binding_map(&mut self) {
        self.state.bindings.disable();
    }

    /// Declare that the structure of this scope (a branch key, a list
    /// source) reads the top-level `field`; changes to it always take the
    /// structural walk.
    pub fn depends_on(&mut self, field: &str) {
        if self.is_creation() {
            self.state.bindings.exclude(field);
        }
    }

    /// A text node; `None` keeps the current content in update mode.
    pub fn text(&mut self, content: Option<&str>) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_text_node(content.unwrap_or_default());
            self.created(node);
            return Some(node);
        }
        let node = self.next_child()?;
        if let Some(content) = content {
            self.backend.set_text_content(node, content);
        }
        Some(node)
    }

    /// A text node rendered from the data and bound to a top-level field.
    pub fn bound_text(&mut self, field: &str, f: impl Fn(&Value) -> String + 'static) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_text_node(&f(self.data));
            self.created(node);
            self.state.bindings.add(
                field,
                node,
                Rc::new(move |backend: &mut dyn TreeBackend, node: NodeId, data: &Value| {
                    backend.set_text_content(node, &f(data))
                }),
            );
            return Some(node);
        }
        let node = self.next_child()?;
        if self.update.field(field).is_changed() {
            self.backend.set_text_content(node, &f(self.data));
        }
        Some(node)
    }

    fn init_props(&mut self, node: NodeId, creating: bool, props: impl FnOnce(&mut Props<'_>)) {
        let mut p = Props {
            backend: &mut *self.backend,
            bindings: &mut self.state.bindings,
            node,
            creating,
            data: self.data,
            update: self.update,
        };
        props(&mut p);
    }

    /// A component or native element.
    ///
    /// In update mode a component that received property changes flushes
    /// its own queue and its children here are left alone.
    pub fn element(
        &mut self,
        tag: &str,
        props: impl FnOnce(&mut Props<'_>),
        children: impl FnOnce(&mut Scope<'_>),
    ) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_element(tag);
            self.init_props(node, true, props);
            let flushed = flush_component(&mut *self.backend, node);
            self.state.record(flushed);
            let mut scope = self.child(node, true);
            children(&mut scope);
            scope.finish();
            self.created(node);
            return Some(node);
        }
        let node = self.next_child()?;
        self.init_props(node, false, props);
        if self.backend.is_component(node) && self.backend.has_pending_changes(node) {
            let flushed = self.backend.apply_pending_changes(node);
            self.state.record(flushed);
            return Some(node);
        }
        let mut scope = self.child(node, false);
        children(&mut scope);
        Some(node)
    }

    fn create_branch(&mut self, key: BranchKey, children: impl FnOnce(&mut Scope<'_>)) -> NodeId {
        let node = self.backend.create_virtual_node("wx:if");
        self.state.nodes.insert(node, NodeState::Branch(key));
        let mut scope = self.child(node, true);
        children(&mut scope);
        scope.finish();
        node
    }

    /// A conditional group; a different `key` than last time rebuilds the branch.
    pub fn if_group(
        &mut self,
        key: impl Into<BranchKey>,
        children: impl FnOnce(&mut Scope<'_>),
    ) -> Option<NodeId> {
        let key = key.into();
        if self.is_creation() {
            let node = self.create_branch(key, children);
            self.created(node);
            return Some(node);
        }
        let index = self.cursor();
        let node = self.next_child()?;
        let same = matches!(self.state.nodes.get(&node), Some(NodeState::Branch(k)) if *k == key);
        if same {
            let mut scope = self.child(node, false);
            children(&mut scope);
            return Some(node);
        }
        let replacement = self.create_branch(key, children);
        self.state.forget(&*self.backend, node);
        self.backend.replace_child_at(self.parent, replacement, index);
        Some(replacement)
    }

    /// A repeated block over `list` (array, object, or for testing a string or number).
    ///
    /// `key` names the identity field, `*this` keys items by value, `None`
    /// matches items by position. `update` is the list's subtree of the
    /// update-path tree.
    pub fn for_loop(
        &mut self,
        list: &Value,
        key: Option<&str>,
        update: UpdateRef<'_>,
        item: impl Fn(&mut Scope<'_>, &ForItem<'_>),
    ) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_virtual_node("wx:for");
            let manager = {
                let mut target = ForTarget {
                    backend: &mut *self.backend,
                    state: &mut *self.state,
                    node,
                    data: self.data,
                    root_update: UpdateRef::all(),
                    item: &item,
                };
                RangeListManager::new(KeySource::parse(key), list, &mut target)
            };
            self.state.nodes.insert(node, NodeState::List(manager));
            self.created(node);
            return Some(node);
        }
        let node = self.next_child()?;
        let mut manager = match self.state.nodes.remove(&node) {
            Some(NodeState::List(m)) => m,
            other => {
                if let Some(state) = other {
                    self.state.nodes.insert(node, state);
                }
                trigger_warning(&format!("Node {node} is not a rendered list. The list update is skipped."));
                return Some(node);
            }
        };
        {
            let mut target = ForTarget {
                backend: &mut *self.backend,
                state: &mut *self.state,
                node,
                data: self.data,
                root_update: self.update,
                item: &item,
            };
            manager.diff(list, update, &mut target);
        }
        self.state.nodes.insert(node, NodeState::List(manager));
        Some(node)
    }

    /// A slot placeholder named `name`.
    pub fn slot(&mut self, name: &str) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_virtual_node("slot");
            self.state.nodes.insert(node, NodeState::Slot(name.to_string()));
            self.created(node);
            return Some(node);
        }
        let node = self.next_child()?;
        let same = matches!(self.state.nodes.get(&node), Some(NodeState::Slot(n)) if n == name);
        if !same {
            self.state.nodes.insert(node, NodeState::Slot(name.to_string()));
        }
        Some(node)
    }

    /// A pass-through grouping node.
    pub fn virtual_node(&mut self, children: impl FnOnce(&mut Scope<'_>)) -> Option<NodeId> {
        if self.is_creation() {
            let node = self.backend.create_virtual_node("virtual");
            let mut scope = self.child(node, true);
            children(&mut scope);
            scope.finish();
            self.created(node);
            return Some(node);
        }
        let node = self.next_child()?;
        let mut scope = self.child(node, false);
        children(&mut scope);
        Some(node)
    }
}

struct ForTarget<'t> {
    backend: &'t mut dyn TreeBackend,
    state: &'t mut WrapperState,
    node: NodeId,
    data: &'t Value,
    root_update: UpdateRef<'t>,
    item: &'t dyn Fn(&mut Scope<'_>, &ForItem<'_>),
}

impl ListTarget for ForTarget<'_> {
    type Node = NodeId;

    fn create_item(&mut self, item: &Value, index: &ListIndex) -> NodeId {
        let node = self.backend.create_virtual_node("wx:for-item");
        let mut scope = Scope {
            backend: &mut *self.backend,
            state: &mut *self.state,
            parent: node,
            data: self.data,
            update: UpdateRef::all(),
            mode: Mode::Create(Vec::new()),
        };
        let for_item = ForItem {
            value: item,
            index,
            update: UpdateRef::all(),
            index_changed: true,
        };
        (self.item)(&mut scope, &for_item);
        scope.finish();
        node
    }

    fn update_item(
        &mut self,
        item: &Value,
        index: &ListIndex,
        update: UpdateRef<'_>,
        index_changed: bool,
        node: NodeId,
    ) {
        let mut scope = Scope {
            backend: &mut *self.backend,
            state: &mut *self.state,
            parent: node,
            data: self.data,
            update: self.root_update,
            mode: Mode::Update(0),
        };
        let for_item = ForItem {
            value: item,
            index,
            update,
            index_changed,
        };
        (self.item)(&mut scope, &for_item);
    }

    fn child_at(&self, position: usize) -> Option<NodeId> {
        self.backend.child_at(self.node, position)
    }

    fn insert_children(&mut self, nodes: &[NodeId], at: Option<usize>) {
        self.backend.insert_children(self.node, nodes, at);
    }

    fn insert_child_at(&mut self, node: NodeId, at: usize) {
        self.backend.insert_child_at(self.node, node, at);
    }

    fn remove_children(&mut self, from: usize, count: usize) {
        let removed: Vec<NodeId> = self
            .backend
            .child_nodes(self.node)
            .iter()
            .skip(from)
            .take(count)
            .copied()
            .collect();
        for node in removed {
            self.state.forget(&*self.backend, node);
        }
        self.backend.remove_children(self.node, from, count);
    }
}

// ── Wrapper ───────────────────────────────────────────────────────────────

/// Runs a process generator against the children of a host node.
pub struct ProcGenWrapper {
    host: NodeId,
    gen: ProcGen,
    state: WrapperState,
}

impl ProcGenWrapper {
    pub fn new(host: NodeId, gen: ProcGen) -> Self {
        Self {
            host,
            gen,
            state: WrapperState::default(),
        }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn bindings(&self) -> &BindingMap {
        &self.state.bindings
    }

    /// Render the children of the host and record a fresh binding map.
    pub fn create(&mut self, backend: &mut dyn TreeBackend, data: &Value) -> Result<(), CallbackError> {
        self.state = WrapperState::default();
        let gen = self.gen.clone();
        let mut scope = Scope {
            backend,
            state: &mut self.state,
            parent: self.host,
            data,
            update: UpdateRef::all(),
            mode: Mode::Create(Vec::new()),
        };
        gen(&mut scope, data, UpdateRef::all());
        scope.finish();
        self.take_error()
    }

    /// Walk the live children against the generator.
    pub fn update(
        &mut self,
        backend: &mut dyn TreeBackend,
        data: &Value,
        tree: &UpdatePathTree,
    ) -> Result<(), CallbackError> {
        let gen = self.gen.clone();
        let update = UpdateRef::new(Some(tree));
        let mut scope = Scope {
            backend,
            state: &mut self.state,
            parent: self.host,
            data,
            update,
            mode: Mode::Update(0),
        };
        gen(&mut scope, data, update);
        self.take_error()
    }

    /// Update one top-level field through the binding map.
    pub fn binding_map_update(
        &mut self,
        backend: &mut dyn TreeBackend,
        field: &str,
        data: &Value,
    ) -> Result<bool, CallbackError> {
        self.state.bindings.update(field, backend, data)
    }

    fn take_error(&mut self) -> Result<(), CallbackError> {
        match self.state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryTree, TreeOp};
    use crate::data_group::DataChange;
    use serde_json::json;

    fn wrapper(gen: impl Fn(&mut Scope<'_>, &Value, UpdateRef<'_>) + 'static) -> (MemoryTree, ProcGenWrapper) {
        let tree = MemoryTree::new();
        let w = ProcGenWrapper::new(tree.root(), Rc::new(gen));
        (tree, w)
    }

    fn changes(fields: &[&str]) -> UpdatePathTree {
        let list: Vec<DataChange> = fields
            .iter()
            .map(|f| DataChange::replace(vec![(*f).into()], Value::Null))
            .collect();
        UpdatePathTree::build(&list)
    }

    #[test]
    fn test_create_all_node_kinds() {
        let (mut tree, mut w) = wrapper(|s, data, _| {
            s.text(Some("a"));
            s.element(
                "div",
                |p| {
                    if p.is_creation() {
                        p.element().class("box");
                    }
                },
                |s| {
                    s.bound_text("title", |d| d["title"].as_str().unwrap_or_default().to_string());
                },
            );
            s.if_group(0, |s| {
                s.text(Some("yes"));
            });
            s.for_loop(&data["list"], None, UpdateRef::none(), |s, item| {
                s.text(Some(&item.value.to_string()));
            });
            s.slot("");
            s.virtual_node(|s| {
                s.text(Some("v"));
            });
        });
        w.create(&mut tree, &json!({"title": "T", "list": [1, 2]})).unwrap();
        let root = tree.root();
        assert_eq!(
            tree.dump(root),
            "a<div class=\"box\">T</div><!wx:if>yes</!wx:if>\
             <!wx:for><!wx:for-item>1</!wx:for-item><!wx:for-item>2</!wx:for-item></!wx:for>\
             <!slot></!slot><!virtual>v</!virtual>"
        );
        assert!(w.bindings().covers("title"));
    }

    #[test]
    fn test_update_only_touches_changed_fields() {
        let (mut tree, mut w) = wrapper(|s, data, _| {
            let a = data["a"].as_str().unwrap_or_default().to_string();
            let b = data["b"].as_str().unwrap_or_default().to_string();
            let (ca, cb) = (s.changed("a"), s.changed("b"));
            s.text(ca.then_some(a.as_str()));
            s.text(cb.then_some(b.as_str()));
        });
        w.create(&mut tree, &json!({"a": "1", "b": "2"})).unwrap();
        tree.take_ops();
        w.update(&mut tree, &json!({"a": "1", "b": "3"}), &changes(&["b"])).unwrap();
        assert_eq!(tree.to_html(tree.root()), "13");
        assert_eq!(tree.take_ops().len(), 1);
    }

    #[test]
    fn test_branch_switch_replaces_node() {
        let (mut tree, mut w) = wrapper(|s, data, _| {
            let on = data["on"].as_bool().unwrap_or(false);
            s.if_group(usize::from(on), |s| {
                s.text(Some(if on { "on" } else { "off" }));
            });
        });
        w.create(&mut tree, &json!({"on": false})).unwrap();
        let first = tree.child_at(tree.root(), 0);
        w.update(&mut tree, &json!({"on": false}), &changes(&["on"])).unwrap();
        assert_eq!(tree.child_at(tree.root(), 0), first);
        tree.take_ops();
        w.update(&mut tree, &json!({"on": true}), &changes(&["on"])).unwrap();
        assert_ne!(tree.child_at(tree.root(), 0), first);
        assert_eq!(tree.to_html(tree.root()), "on");
        assert!(tree.ops().iter().any(|op| matches!(op, TreeOp::Replace { .. })));
    }

    #[test]
    fn test_keyed_list_reorder_moves_once() {
        let (mut tree, mut w) = wrapper(|s, data, u| {
            s.for_loop(&data["list"], Some("id"), u.field("list"), |s, item| {
                s.text(item.changed("id").then(|| item.value["id"].to_string()).as_deref());
            });
        });
        w.create(&mut tree, &json!({"list": [{"id": 1}, {"id": 2}, {"id": 3}]})).unwrap();
        tree.take_ops();
        let new = json!({"list": [{"id": 3}, {"id": 1}, {"id": 2}]});
        w.update(&mut tree, &new, &changes(&["list"])).unwrap();
        assert_eq!(tree.to_html(tree.root()), "312");
        let ops = tree.take_ops();
        assert_eq!(ops.iter().filter(|op| matches!(op, TreeOp::Move { .. })).count(), 1);
        assert!(!ops.iter().any(|op| matches!(op, TreeOp::Create(_) | TreeOp::Remove { .. })));
    }

    #[test]
    fn test_bind_and_binding_map_update() {
        let (mut tree, mut w) = wrapper(|s, _, _| {
            s.element(
                "span",
                |p| {
                    p.bind("cls", |e, d| e.class(d["cls"].as_str().unwrap_or_default()));
                    p.bind("hidden", |e, d| e.attribute("hidden", &d["hidden"]));
                },
                |_| {},
            );
        });
        w.create(&mut tree, &json!({"cls": "a", "hidden": true})).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<span class=\"a\" hidden=\"\"></span>");
        let data = json!({"cls": "b", "hidden": false});
        assert!(w.binding_map_update(&mut tree, "cls", &data).unwrap());
        assert!(w.binding_map_update(&mut tree, "hidden", &data).unwrap());
        assert!(!w.binding_map_update(&mut tree, "other", &data).unwrap());
        assert_eq!(tree.to_html(tree.root()), "<span class=\"b\"></span>");
    }

    #[test]
    fn test_native_property_falls_back_to_attribute() {
        let (mut tree, mut w) = wrapper(|s, _, _| {
            s.element("input", |p| p.element().property("max-length", &json!(4)), |_| {});
        });
        w.create(&mut tree, &json!({})).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<input max-length=\"4\"></input>");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(dash_to_camel_case("max-length"), "maxLength");
        assert_eq!(dash_to_camel_case("a"), "a");
    }
}
