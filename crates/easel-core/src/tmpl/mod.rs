//! Template instantiation and update dispatch.
//!
//! A [`Template`] wraps a process generator (see [`Scope`]). Each host gets
//! its own [`TemplateInstance`], which renders once with
//! [`init_values`](TemplateInstance::init_values) and then receives the
//! applied data changes of every flush through
//! [`update_values`](TemplateInstance::update_values). An update is either
//! routed through the binding map recorded at creation or turned into an
//! [`UpdatePathTree`] and walked structurally.

mod binding;
mod list_diff;
mod update_tree;
mod wrapper;

pub use binding::{Binding, BindingMap, BindingUpdater};
pub use list_diff::{KeySource, ListIndex, ListTarget, RangeListManager};
pub use update_tree::{UpdatePathTree, UpdateRef};
pub use wrapper::{BranchKey, ElementRef, ForItem, ProcGen, ProcGenWrapper, Props, Scope};

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::backend::{NodeId, TreeBackend};
use crate::data_group::DataChange;
use crate::diagnostics::{trigger_warning, CallbackError};
use crate::options::UpdateMode;

#[derive(Clone)]
pub struct Template {
    gen: ProcGen,
    update_mode: UpdateMode,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("update_mode", &self.update_mode)
            .finish_non_exhaustive()
    }
}

impl Template {
    pub fn new(gen: impl Fn(&mut Scope<'_>, &Value, UpdateRef<'_>) + 'static) -> Self {
        Self {
            gen: Rc::new(gen),
            update_mode: UpdateMode::default(),
        }
    }

    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    /// An instance rendering into the children of `host`.
    pub fn create_instance(&self, host: NodeId) -> TemplateInstance {
        TemplateInstance {
            wrapper: ProcGenWrapper::new(host, self.gen.clone()),
            update_mode: self.update_mode,
            initialized: false,
        }
    }
}

pub struct TemplateInstance {
    wrapper: ProcGenWrapper,
    update_mode: UpdateMode,
    initialized: bool,
}

impl TemplateInstance {
    pub fn host(&self) -> NodeId {
        self.wrapper.host()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The binding map recorded by the last [`init_values`](Self::init_values).
    pub fn bindings(&self) -> Option<&BindingMap> {
        self.initialized.then(|| self.wrapper.bindings())
    }

    /// Render the host's children from `data`.
    pub fn init_values(&mut self, backend: &mut dyn TreeBackend, data: &Value) -> Result<(), CallbackError> {
        tracing::debug!(target: "easel", host = %self.host(), "template init");
        self.initialized = true;
        self.wrapper.create(backend, data)
    }

    /// Bring the rendered tree up to date with `data` after `changes` were applied.
    pub fn update_values(
        &mut self,
        backend: &mut dyn TreeBackend,
        data: &Value,
        changes: &[DataChange],
    ) -> Result<(), CallbackError> {
        if !self.initialized {
            trigger_warning("Template instance updated before it was initialized. Rendering it from the current data.");
            return self.init_values(backend, data);
        }
        match self.update_mode {
            UpdateMode::Forced => {
                let mut first_error = None;
                for change in changes {
                    if let Err(e) = self.try_binding_map_update(backend, data, Some(change)) {
                        first_error.get_or_insert(e);
                    }
                }
                return first_error.map_or(Ok(()), Err);
            }
            UpdateMode::Enabled if changes.len() <= 1 => {
                if self.try_binding_map_update(backend, data, changes.first())? {
                    tracing::trace!(target: "easel", host = %self.host(), "binding map update");
                    return Ok(());
                }
            }
            _ => {}
        }
        let tree = UpdatePathTree::build(changes);
        tracing::trace!(target: "easel", host = %self.host(), changes = changes.len(), "structural update");
        self.wrapper.update(backend, data, &tree)
    }

    fn try_binding_map_update(
        &mut self,
        backend: &mut dyn TreeBackend,
        data: &Value,
        change: Option<&DataChange>,
    ) -> Result<bool, CallbackError> {
        let Some(change) = change else {
            return Ok(true);
        };
        let [field] = change.path().as_slice() else {
            return Ok(false);
        };
        self.wrapper.binding_map_update(backend, &field.as_key(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryTree, TreeOp};
    use serde_json::json;

    fn greeting() -> Template {
        Template::new(|s, data, _| {
            s.element(
                "p",
                |p| p.bind("cls", |e, d| e.class(d["cls"].as_str().unwrap_or_default())),
                |s| {
                    s.bound_text("name", |d| format!("hi {}", d["name"].as_str().unwrap_or_default()));
                },
            );
            s.depends_on("show");
            let show = data["show"].as_bool().unwrap_or(false);
            s.if_group(usize::from(show), |s| {
                if show {
                    s.text(Some("!"));
                }
            });
        })
    }

    fn replace(field: &str, value: Value) -> DataChange {
        DataChange::replace(vec![field.into()], value)
    }

    fn render(mode: UpdateMode, data: &Value) -> (MemoryTree, TemplateInstance) {
        let mut tree = MemoryTree::new();
        let mut inst = greeting().with_update_mode(mode).create_instance(tree.root());
        inst.init_values(&mut tree, data).unwrap();
        tree.take_ops();
        (tree, inst)
    }

    #[test]
    fn test_single_bound_change_uses_binding_map() {
        let (mut tree, mut inst) = render(UpdateMode::Enabled, &json!({"name": "a", "cls": "x"}));
        let data = json!({"name": "b", "cls": "x"});
        inst.update_values(&mut tree, &data, &[replace("name", json!("b"))]).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p class=\"x\">hi b</p>");
        assert_eq!(tree.take_ops(), vec![TreeOp::SetText(NodeId(2))]);
    }

    #[test]
    fn test_structural_field_takes_walk() {
        let (mut tree, mut inst) = render(UpdateMode::Enabled, &json!({"name": "a", "show": false}));
        let data = json!({"name": "a", "show": true});
        inst.update_values(&mut tree, &data, &[replace("show", json!(true))]).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p>hi a</p>!");
    }

    #[test]
    fn test_multiple_changes_take_walk() {
        let (mut tree, mut inst) = render(UpdateMode::Enabled, &json!({"name": "a", "cls": "x"}));
        let data = json!({"name": "b", "cls": "y"});
        let changes = [replace("name", json!("b")), replace("cls", json!("y"))];
        inst.update_values(&mut tree, &data, &changes).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p class=\"y\">hi b</p>");
    }

    #[test]
    fn test_forced_mode_ignores_uncovered_changes() {
        let (mut tree, mut inst) = render(UpdateMode::Forced, &json!({"name": "a", "show": false}));
        let data = json!({"name": "b", "show": true});
        let changes = [replace("name", json!("b")), replace("show", json!(true))];
        inst.update_values(&mut tree, &data, &changes).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p>hi b</p>");
    }

    #[test]
    fn test_disabled_mode_always_walks() {
        let (mut tree, mut inst) = render(UpdateMode::Disabled, &json!({"name": "a"}));
        let data = json!({"name": "b"});
        inst.update_values(&mut tree, &data, &[replace("name", json!("b"))]).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p>hi b</p>");
    }

    #[test]
    fn test_nested_path_takes_walk() {
        let (mut tree, mut inst) = render(UpdateMode::Enabled, &json!({"name": "a"}));
        let data = json!({"name": "a", "cls": {"k": 1}});
        let change = DataChange::replace(vec!["cls".into(), "k".into()], json!(1));
        inst.update_values(&mut tree, &data, &[change]).unwrap();
        assert_eq!(tree.to_html(tree.root()), "<p>hi a</p>");
    }

    #[test]
    fn test_update_before_init_renders() {
        let mut tree = MemoryTree::new();
        let mut inst = greeting().create_instance(tree.root());
        assert!(inst.bindings().is_none());
        inst.update_values(&mut tree, &json!({"name": "z"}), &[]).unwrap();
        assert!(inst.is_initialized());
        assert_eq!(tree.to_html(tree.root()), "<p>hi z</p>");
    }

    #[test]
    fn test_branch_toggles_keep_binding_count() {
        let template = Template::new(|s, data, _| {
            s.depends_on("show");
            let show = data["show"].as_bool().unwrap_or(false);
            s.if_group(usize::from(show), |s| {
                if show {
                    s.bound_text("name", |d| d["name"].as_str().unwrap_or_default().to_string());
                }
            });
        });
        let mut tree = MemoryTree::new();
        let mut inst = template.create_instance(tree.root());
        let mut data = json!({"name": "a", "show": true});
        inst.init_values(&mut tree, &data).unwrap();
        for i in 0..10 {
            let show = i % 2 == 1;
            data["show"] = json!(show);
            inst.update_values(&mut tree, &data, &[replace("show", json!(show))]).unwrap();
            let expected = usize::from(show);
            assert_eq!(inst.bindings().unwrap().bindings("name").len(), expected);
        }
        assert_eq!(inst.bindings().unwrap().len(), 1);

        data["name"] = json!("b");
        tree.take_ops();
        inst.update_values(&mut tree, &data, &[replace("name", json!("b"))]).unwrap();
        assert_eq!(tree.to_html(tree.root()), "b");
        assert_eq!(tree.take_ops().len(), 1);
    }
}
