//! Prefix tree mapping data paths to observer ids.

use std::fmt;
use std::rc::Rc;

use easel_data_path::{MultiPaths, PathSegment};
use indexmap::IndexMap;
use serde_json::Value;

use super::property::PropertyDefinition;
use super::DataGroup;
use crate::diagnostics::CallbackError;

/// Observer callback: receives the group and the current value of every declared path.
pub type DataObserver = Rc<dyn Fn(&mut DataGroup, &[Value]) -> Result<(), CallbackError>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverNode {
    /// Observers whose path ends exactly here.
    pub listener: Vec<usize>,
    /// Observers watching this node and its whole subtree.
    pub wildcard: Vec<usize>,
    pub sub: IndexMap<String, ObserverNode>,
}

#[derive(Clone)]
pub struct ObserverEntry {
    pub paths: MultiPaths,
    pub(crate) callback: DataObserver,
}

/// Property declarations plus the observer trie of a component behavior.
///
/// Groups share one tree through an `Rc` and copy it on write when an
/// instance registers its own observers.
#[derive(Clone, Default)]
pub struct ObserverTree {
    pub(crate) prop_fields: IndexMap<String, PropertyDefinition>,
    pub(crate) root: ObserverNode,
    pub(crate) observers: Vec<ObserverEntry>,
}

impl fmt::Debug for ObserverTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverTree")
            .field("prop_fields", &self.prop_fields)
            .field("root", &self.root)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObserverTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(prop_fields: IndexMap<String, PropertyDefinition>) -> Self {
        Self {
            prop_fields,
            ..Self::default()
        }
    }

    pub fn add_property(&mut self, name: impl Into<String>, def: PropertyDefinition) {
        self.prop_fields.insert(name.into(), def);
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.prop_fields.get(name)
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyDefinition> {
        &self.prop_fields
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn root(&self) -> &ObserverNode {
        &self.root
    }

    /// Register an observer on every path of `paths` and return its id.
    pub fn add_observer(
        &mut self,
        paths: MultiPaths,
        f: impl Fn(&mut DataGroup, &[Value]) -> Result<(), CallbackError> + 'static,
    ) -> usize {
        self.add_observer_rc(paths, Rc::new(f))
    }

    pub(crate) fn add_observer_rc(&mut self, paths: MultiPaths, callback: DataObserver) -> usize {
        let id = self.observers.len();
        for path in &paths {
            let mut cur = &mut self.root;
            for segment in &path.segments {
                cur = cur.sub.entry(segment.as_key()).or_default();
            }
            if path.wildcard {
                cur.wildcard.push(id);
            } else {
                cur.listener.push(id);
            }
        }
        self.observers.push(ObserverEntry { paths, callback });
        id
    }

    /// Mark every observer affected by a change on `path`.
    pub fn mark_triggered(&self, path: &[PathSegment], status: &mut [bool]) {
        let mut cur = &self.root;
        for segment in path {
            for id in &cur.wildcard {
                status[*id] = true;
            }
            match cur.sub.get(&segment.as_key()) {
                Some(next) => cur = next,
                None => return,
            }
        }
        mark_subtree(cur, status);
    }
}

fn mark_subtree(node: &ObserverNode, status: &mut [bool]) {
    for id in node.listener.iter().chain(&node.wildcard) {
        status[*id] = true;
    }
    for child in node.sub.values() {
        mark_subtree(child, status);
    }
}
