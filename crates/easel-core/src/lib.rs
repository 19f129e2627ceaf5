//! Reactive component data and template reconciliation.
//!
//! - [`data_group`]: path-addressed data with a change queue, observers,
//!   typed properties and a batched flush.
//! - [`tmpl`]: process-generator templates, binding-map fast updates,
//!   structural updates driven by an update-path tree, and the keyed list
//!   reconciler.
//! - [`backend`]: the tree-mutation trait and the in-memory arena tree.
//! - [`component`]: a group and a template instance wired to a shadow tree.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use easel_core::component::Component;
//! use easel_core::data_group::ObserverTree;
//! use easel_core::options::ComponentOptions;
//! use easel_core::tmpl::Template;
//! use serde_json::json;
//!
//! let template = Template::new(|s, data, u| {
//!     s.depends_on("items");
//!     s.for_loop(&data["items"], Some("id"), u.field("items"), |s, item| {
//!         s.element("li", |_| {}, |s| {
//!             let label = item.value["label"].as_str().unwrap_or_default();
//!             s.text(item.changed("label").then_some(label));
//!         });
//!     });
//! });
//! let list = Component::new(
//!     &template,
//!     &ComponentOptions::default(),
//!     Rc::new(ObserverTree::new()),
//!     json!({"items": [{"id": 1, "label": "a"}, {"id": 2, "label": "b"}]}),
//! )
//! .unwrap();
//! list.set_data(json!({"items[1].label": "B"})).unwrap();
//! assert_eq!(list.html(), "<li>a</li><li>B</li>");
//! ```

pub mod backend;
pub mod component;
pub mod data_group;
pub mod diagnostics;
pub mod options;
pub mod tmpl;

pub use backend::{MemoryTree, NodeId, TreeBackend};
pub use component::Component;
pub use data_group::{DataChange, DataGroup};
pub use diagnostics::CallbackError;
pub use easel_data_path as path;
pub use options::{ComponentOptions, DeepCopyStrategy, UpdateMode};
pub use tmpl::{Template, TemplateInstance, UpdatePathTree};
