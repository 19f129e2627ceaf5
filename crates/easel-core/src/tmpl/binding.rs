//! Per-field updaters recorded while a template is created.

use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::backend::{NodeId, TreeBackend};
use crate::diagnostics::CallbackError;

/// Re-renders one bound node from the full data snapshot.
pub type BindingUpdater = Rc<dyn Fn(&mut dyn TreeBackend, NodeId, &Value)>;

#[derive(Clone)]
pub struct Binding {
    pub node: NodeId,
    updater: BindingUpdater,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("node", &self.node).finish()
    }
}

/// Field name → every updater bound to that top-level field.
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    fields: IndexMap<String, Vec<Binding>>,
    structural: IndexSet<String>,
    disabled: bool,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, node: NodeId, updater: BindingUpdater) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(Binding { node, updater });
    }

    /// Stop fast-path updates for good; every later update takes the structural walk.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Mark `field` as read by template structure (branches, lists), which
    /// the recorded updaters cannot patch.
    pub fn exclude(&mut self, field: impl Into<String>) {
        self.structural.insert(field.into());
    }

    pub fn covers(&self, field: &str) -> bool {
        !self.disabled && !self.structural.contains(field) && self.fields.contains_key(field)
    }

    pub fn bindings(&self, field: &str) -> &[Binding] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop the updaters aimed at `node`; a field left with none is no longer covered.
    pub fn forget(&mut self, node: NodeId) {
        self.fields.retain(|_, bindings| {
            bindings.retain(|b| b.node != node);
            !bindings.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Run every updater of `field`.
    ///
    /// Updaters of one element are consecutive; each time the updates move
    /// on to another element, and after the last one, a component element
    /// with queued changes is flushed. Returns `Ok(false)` without touching
    /// the tree when the field is not covered.
    pub fn update(
        &self,
        field: &str,
        backend: &mut dyn TreeBackend,
        data: &Value,
    ) -> Result<bool, CallbackError> {
        if !self.covers(field) {
            return Ok(false);
        }
        let Some(bindings) = self.fields.get(field) else {
            return Ok(false);
        };
        let mut prev: Option<NodeId> = None;
        for binding in bindings {
            if let Some(p) = prev {
                if p != binding.node {
                    finish_element(backend, p)?;
                }
            }
            prev = Some(binding.node);
            (binding.updater)(backend, binding.node, data);
        }
        if let Some(p) = prev {
            finish_element(backend, p)?;
        }
        tracing::trace!(target: "easel", field, bindings = bindings.len(), "binding map update");
        Ok(true)
    }
}

fn finish_element(backend: &mut dyn TreeBackend, node: NodeId) -> Result<(), CallbackError> {
    if backend.has_pending_changes(node) {
        backend.apply_pending_changes(node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryTree;
    use serde_json::json;

    #[test]
    fn test_update_runs_field_bindings() {
        let mut tree = MemoryTree::new();
        let root = tree.root();
        let a = tree.create_text_node("");
        let b = tree.create_text_node("");
        tree.insert_children(root, &[a, b], None);
        let mut map = BindingMap::new();
        let text = |key: &'static str| -> BindingUpdater {
            Rc::new(move |backend: &mut dyn TreeBackend, node: NodeId, data: &Value| {
                backend.set_text_content(node, data[key].as_str().unwrap_or_default())
            })
        };
        map.add("x", a, text("x"));
        map.add("y", b, text("y"));
        let data = json!({"x": "1", "y": "2"});
        assert!(map.update("x", &mut tree, &data).unwrap());
        assert_eq!(tree.to_html(root), "1");
        assert!(!map.update("z", &mut tree, &data).unwrap());
        map.exclude("x");
        assert!(!map.update("x", &mut tree, &data).unwrap());
        map.disable();
        assert!(!map.covers("y"));
        assert!(!map.update("y", &mut tree, &data).unwrap());
        assert_eq!(tree.to_html(root), "1");
    }

    #[test]
    fn test_forget_drops_node_bindings() {
        let mut tree = MemoryTree::new();
        let a = tree.create_text_node("");
        let b = tree.create_text_node("");
        let noop: BindingUpdater = Rc::new(|_: &mut dyn TreeBackend, _: NodeId, _: &Value| {});
        let mut map = BindingMap::new();
        map.add("x", a, noop.clone());
        map.add("x", b, noop.clone());
        map.add("y", a, noop);
        assert_eq!(map.len(), 3);
        map.forget(a);
        assert_eq!(map.len(), 1);
        assert_eq!(map.bindings("x").len(), 1);
        assert!(!map.covers("y"));
    }
}
