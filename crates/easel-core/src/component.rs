//! A data group, a template instance and a shadow tree wired together.
//!
//! Every flush of the group hands its combined changes to the template
//! instance, which patches the component's own [`MemoryTree`]. A component
//! placed inside another component's template is reached through its
//! [`ComponentHandle`]: the parent queues properties on it and asks it to
//! flush, never touching its data directly.
//!
//! ```
//! use std::rc::Rc;
//! use easel_core::component::Component;
//! use easel_core::data_group::ObserverTree;
//! use easel_core::options::ComponentOptions;
//! use easel_core::tmpl::Template;
//! use serde_json::json;
//!
//! let template = Template::new(|s, _, _| {
//!     s.bound_text("count", |d| d["count"].to_string());
//! });
//! let comp = Component::new(
//!     &template,
//!     &ComponentOptions::default(),
//!     Rc::new(ObserverTree::new()),
//!     json!({"count": 1}),
//! )
//! .unwrap();
//! comp.set_data(json!({"count": 2})).unwrap();
//! assert_eq!(comp.html(), "2");
//! ```

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::backend::{ComponentHandle, MemoryTree};
use crate::data_group::{DataChange, DataGroup, ObserverTree};
use crate::diagnostics::{trigger_warning, CallbackError};
use crate::options::{ComponentOptions, UpdateMode};
use crate::tmpl::{Template, TemplateInstance};

struct RenderState {
    instance: TemplateInstance,
    shadow: MemoryTree,
    error: Option<CallbackError>,
}

impl RenderState {
    fn update(&mut self, data: &Value, changes: &[DataChange]) {
        let RenderState {
            instance,
            shadow,
            error,
        } = self;
        if let Err(e) = instance.update_values(shadow, data, changes) {
            error.get_or_insert(e);
        }
    }
}

struct ComponentInner {
    group: RefCell<DataGroup>,
    render: Rc<RefCell<RenderState>>,
}

#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("html", &self.html())
            .finish_non_exhaustive()
    }
}

impl Component {
    /// Create the group and render the template into a fresh shadow tree.
    pub fn new(
        template: &Template,
        options: &ComponentOptions,
        tree: Rc<ObserverTree>,
        data: Value,
    ) -> Result<Self, CallbackError> {
        Self::with_shadow_tree(MemoryTree::new(), template, options, tree, data)
    }

    /// Like [`new`](Self::new), rendering into `shadow` (which may already
    /// have nested components registered).
    pub fn with_shadow_tree(
        shadow: MemoryTree,
        template: &Template,
        options: &ComponentOptions,
        tree: Rc<ObserverTree>,
        data: Value,
    ) -> Result<Self, CallbackError> {
        let comp = Self::build(shadow, template, options, tree, data);
        comp.take_render_error()?;
        Ok(comp)
    }

    /// Render errors are kept and reported by the next flush. A template
    /// left at the default update mode takes the mode from `options`.
    fn build(
        mut shadow: MemoryTree,
        template: &Template,
        options: &ComponentOptions,
        tree: Rc<ObserverTree>,
        data: Value,
    ) -> Self {
        let mut group = DataGroup::new(data, options, tree);
        let mut instance = if template.update_mode() == UpdateMode::default() {
            template
                .clone()
                .with_update_mode(options.update_mode)
                .create_instance(shadow.root())
        } else {
            template.create_instance(shadow.root())
        };
        let error = instance.init_values(&mut shadow, group.snapshot()).err();
        let render = Rc::new(RefCell::new(RenderState {
            instance,
            shadow,
            error,
        }));
        let target = render.clone();
        group.set_update_listener(move |data, changes| match target.try_borrow_mut() {
            Ok(mut state) => state.update(data, changes),
            Err(_) => trigger_warning(
                "A component flushed its data while its own template was rendering. The render is skipped.",
            ),
        });
        Self {
            inner: Rc::new(ComponentInner {
                group: RefCell::new(group),
                render,
            }),
        }
    }

    /// A factory for [`MemoryTree::register_component`]; every element of
    /// the registered tag gets its own component.
    pub fn factory(
        template: Template,
        options: ComponentOptions,
        tree: Rc<ObserverTree>,
        data: Value,
    ) -> impl Fn(&str) -> Rc<dyn ComponentHandle> + 'static {
        move |tag: &str| {
            tracing::debug!(target: "easel", tag, "component created");
            Self::build(
                MemoryTree::new(),
                &template,
                &options,
                tree.clone(),
                data.clone(),
            )
            .handle()
        }
    }

    pub fn handle(&self) -> Rc<dyn ComponentHandle> {
        Rc::new(self.clone())
    }

    fn group_mut(&self) -> Result<RefMut<'_, DataGroup>, CallbackError> {
        self.inner
            .group
            .try_borrow_mut()
            .map_err(|_| CallbackError::msg("the component data group is already being updated"))
    }

    fn take_render_error(&self) -> Result<(), CallbackError> {
        match self.inner.render.borrow_mut().error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run `f` on the data group, then report render errors of any flush it did.
    pub fn with_group<T>(&self, f: impl FnOnce(&mut DataGroup) -> T) -> Result<T, CallbackError> {
        let ret = f(&mut *self.group_mut()?);
        self.take_render_error()?;
        Ok(ret)
    }

    pub fn set_data(&self, data: Value) -> Result<(), CallbackError> {
        self.group_mut()?.set_data(data)?;
        self.take_render_error()
    }

    /// Queue without flushing.
    pub fn update_data(&self, data: Value) -> Result<(), CallbackError> {
        self.group_mut()?.update_data(data)
    }

    pub fn apply_data_updates(&self) -> Result<(), CallbackError> {
        self.group_mut()?.apply_data_updates()?;
        self.take_render_error()
    }

    pub fn data(&self) -> Ref<'_, Value> {
        Ref::map(self.inner.group.borrow(), DataGroup::data)
    }

    pub fn shadow(&self) -> Ref<'_, MemoryTree> {
        Ref::map(self.inner.render.borrow(), |r| &r.shadow)
    }

    /// Rendered markup of the shadow tree.
    pub fn html(&self) -> String {
        match self.inner.render.try_borrow() {
            Ok(r) => r.shadow.to_html(r.shadow.root()),
            Err(_) => String::new(),
        }
    }
}

impl ComponentHandle for Component {
    fn replace_property(&self, name: &str, value: &Value) -> bool {
        match self.inner.group.try_borrow_mut() {
            Ok(mut group) => group.replace_property(name, value.clone()),
            Err(_) => {
                trigger_warning(&format!("Cannot set property \"{name}\" while the component is updating."));
                false
            }
        }
    }

    fn has_pending_changes(&self) -> bool {
        self.inner
            .group
            .try_borrow()
            .is_ok_and(|group| group.has_pending_changes())
    }

    fn apply_pending_changes(&self) -> Result<(), CallbackError> {
        self.group_mut()?.apply_data_updates_with(true)?;
        self.take_render_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_group::{PropertyDefinition, PropertyType};
    use serde_json::json;

    fn counter() -> Template {
        Template::new(|s, _, _| {
            s.bound_text("count", |d| d["count"].to_string());
        })
    }

    fn label_tree() -> Rc<ObserverTree> {
        let mut tree = ObserverTree::new();
        tree.add_property("title", PropertyDefinition::new(PropertyType::String));
        Rc::new(tree)
    }

    #[test]
    fn test_flush_rerenders() {
        let comp = Component::new(
            &counter(),
            &ComponentOptions::default(),
            Rc::new(ObserverTree::new()),
            json!({"count": 0}),
        )
        .unwrap();
        assert_eq!(comp.html(), "0");
        comp.update_data(json!({"count": 5})).unwrap();
        assert_eq!(comp.html(), "0");
        comp.apply_data_updates().unwrap();
        assert_eq!(comp.html(), "5");
        assert_eq!(*comp.data(), json!({"count": 5}));
    }

    #[test]
    fn test_handle_queues_declared_properties() {
        let label = Template::new(|s, _, _| {
            s.bound_text("title", |d| d["title"].as_str().unwrap_or_default().to_string());
        });
        let comp = Component::new(&label, &ComponentOptions::default(), label_tree(), json!({})).unwrap();
        let handle = comp.handle();
        assert!(!handle.replace_property("missing", &json!(1)));
        assert!(!handle.has_pending_changes());
        assert!(handle.replace_property("title", &json!("t")));
        assert!(handle.has_pending_changes());
        handle.apply_pending_changes().unwrap();
        assert_eq!(comp.html(), "t");
    }

    #[test]
    fn test_with_group_reports_render() {
        let comp = Component::new(
            &counter(),
            &ComponentOptions::default(),
            Rc::new(ObserverTree::new()),
            json!({"count": 1}),
        )
        .unwrap();
        let pending = comp
            .with_group(|g| {
                g.replace_data_on_path(vec!["count".into()], json!(2));
                g.has_pending_changes()
            })
            .unwrap();
        assert!(pending);
        comp.with_group(|g| g.apply_data_updates()).unwrap().unwrap();
        assert_eq!(comp.html(), "2");
    }
}
