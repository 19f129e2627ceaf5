//! Reactive, path-addressed data store.
//!
//! A [`DataGroup`] owns a component's data snapshot. Mutations are queued
//! and applied in one batch by [`DataGroup::apply_data_updates`], which
//! triggers the affected observers (looping until no observer queues further
//! changes) and then hands the combined change list to the update listener.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use easel_core::data_group::DataGroup;
//! use serde_json::json;
//!
//! let mut group = DataGroup::create(json!({"a": 1}));
//! let calls = Rc::new(RefCell::new(0));
//! let c = calls.clone();
//! group.set_update_listener(move |_, changes| *c.borrow_mut() += changes.len());
//! group.set_data(json!({"a": 2, "list[0]": "x"})).unwrap();
//! assert_eq!(group.data(), &json!({"a": 2, "list": ["x"]}));
//! assert_eq!(*calls.borrow(), 2);
//! ```

mod change;
mod observer_tree;
mod property;

pub use change::DataChange;
pub use observer_tree::{DataObserver, ObserverEntry, ObserverNode, ObserverTree};
pub use property::{
    PropertyComparer, PropertyDefault, PropertyDefinition, PropertyObserver, PropertyType,
};

use std::rc::Rc;

use easel_data_path::{format_path, get, parse_single_path, DataPath, MultiPaths, PathSegment};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::diagnostics::{dispatch_error, safe_callback, trigger_warning, CallbackError};
use crate::options::{ComponentOptions, DeepCopyStrategy};
use change::{normalize_splice_index, splice_vec};
use property::convert_value_to_type;

pub type UpdateListener = Rc<dyn Fn(&Value, &[DataChange])>;
pub type ModelBindingListener = Rc<dyn Fn(&Value)>;
/// Receives a reflected attribute name and its value (`None` removes the attribute).
pub type AttributeReflector = Rc<dyn Fn(&str, Option<&str>)>;
/// A named method; also used for function-typed properties and named observers.
pub type Method = Rc<dyn Fn(&mut DataGroup, &[Value]) -> Result<(), CallbackError>>;

struct PropertyChange {
    name: String,
    observer: Option<PropertyObserver>,
    old_value: Value,
    new_value: Value,
    skip_model_listener: bool,
}

/// State of the flush in progress.
#[derive(Default)]
struct Batch {
    prop: Vec<PropertyChange>,
    combined: Vec<DataChange>,
    count: usize,
}

pub struct DataGroup {
    data: Value,
    inner_data: Option<Value>,
    pure_data_pattern: Option<Regex>,
    data_deep_copy: DeepCopyStrategy,
    property_passing_deep_copy: DeepCopyStrategy,
    reflect_to_attributes: bool,
    id_prefix: Option<String>,
    tree: Rc<ObserverTree>,
    observer_status: Vec<bool>,
    methods: IndexMap<String, Method>,
    model_binding_listeners: IndexMap<String, ModelBindingListener>,
    update_listener: Option<UpdateListener>,
    attribute_reflector: Option<AttributeReflector>,
    pending: Vec<DataChange>,
    doing_updates: Option<Batch>,
}

// ── Path writes ───────────────────────────────────────────────────────────

struct NotAnArray;

enum Write {
    Set(Option<Value>),
    Splice {
        index: Option<usize>,
        delete_count: usize,
        inserts: Vec<Value>,
    },
}

fn as_object_mut(v: &mut Value) -> &mut Map<String, Value> {
    if !v.is_object() {
        *v = Value::Object(Map::new());
    }
    match v {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn array_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Field(s) => s.parse().ok(),
    }
}

/// The slot for `segment` under `parent`, created when missing.
fn slot_mut<'a>(parent: &'a mut Value, segment: &PathSegment) -> &'a mut Value {
    let index = match (&*parent, array_index(segment)) {
        (Value::Array(_), Some(i)) => Some(i),
        _ => None,
    };
    if index.is_none() && !parent.is_object() {
        *parent = match std::mem::take(parent) {
            Value::Array(arr) => Value::Object(
                arr.into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            _ => Value::Object(Map::new()),
        };
    }
    match (parent, index) {
        (Value::Array(arr), Some(i)) => {
            if arr.len() <= i {
                arr.resize(i + 1, Value::Null);
            }
            &mut arr[i]
        }
        (Value::Object(map), _) => map.entry(segment.as_key()).or_insert(Value::Null),
        _ => unreachable!(),
    }
}

fn existing_mut<'a>(parent: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match parent {
        Value::Object(map) => map.get_mut(&segment.as_key()),
        Value::Array(arr) => array_index(segment).and_then(|i| arr.get_mut(i)),
        _ => None,
    }
}

/// Write at `path`, creating intermediate containers: an array when the next
/// segment is an index, an object otherwise. Returns the normalized splice start.
fn write_path(root: &mut Value, path: &[PathSegment], op: Write) -> Result<Option<usize>, NotAnArray> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(None);
    };
    let mut cur = root;
    for (i, segment) in parents.iter().enumerate() {
        let want_array = path[i + 1].is_index();
        cur = slot_mut(cur, segment);
        let fits = if want_array { cur.is_array() } else { cur.is_object() };
        if !fits {
            *cur = if want_array {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
    }
    match op {
        Write::Set(Some(value)) => {
            *slot_mut(cur, last) = value;
            Ok(None)
        }
        Write::Set(None) => {
            match cur {
                Value::Object(map) => {
                    map.remove(&last.as_key());
                }
                Value::Array(arr) => {
                    if let Some(v) = array_index(last).and_then(|i| arr.get_mut(i)) {
                        *v = Value::Null;
                    }
                }
                _ => {}
            }
            Ok(None)
        }
        Write::Splice {
            index,
            delete_count,
            inserts,
        } => match existing_mut(cur, last) {
            Some(Value::Array(arr)) => {
                let start = normalize_splice_index(index, arr.len());
                splice_vec(arr, start, delete_count, inserts);
                Ok(Some(start))
            }
            _ => Err(NotAnArray),
        },
    }
}

fn dash_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn warn_not_array(path: &[PathSegment]) {
    trigger_warning(&format!(
        "An array splice change cannot be applied to a non-array value (on path \"{}\"). The change is ignored.",
        format_path(path)
    ));
}

// ── DataGroup ─────────────────────────────────────────────────────────────

impl DataGroup {
    /// A plain group without properties, observers or copying.
    pub fn create(data: Value) -> Self {
        let options = ComponentOptions {
            data_deep_copy: DeepCopyStrategy::None,
            property_passing_deep_copy: DeepCopyStrategy::None,
            ..ComponentOptions::default()
        };
        Self::new(data, &options, Rc::new(ObserverTree::new()))
    }

    /// Create a group; declared properties missing from `data` get their defaults.
    pub fn new(data: Value, options: &ComponentOptions, tree: Rc<ObserverTree>) -> Self {
        let mut data = data;
        let map = as_object_mut(&mut data);
        for (name, prop) in &tree.prop_fields {
            if !map.contains_key(name) {
                map.insert(name.clone(), prop.default_value());
            }
        }
        let mut group = Self {
            data,
            inner_data: None,
            pure_data_pattern: options.pure_data_pattern.clone(),
            data_deep_copy: options.data_deep_copy,
            property_passing_deep_copy: options.property_passing_deep_copy,
            reflect_to_attributes: options.reflect_to_attributes,
            id_prefix: None,
            observer_status: vec![false; tree.observer_count()],
            tree,
            methods: IndexMap::new(),
            model_binding_listeners: IndexMap::new(),
            update_listener: None,
            attribute_reflector: None,
            pending: Vec::new(),
            doing_updates: None,
        };
        group.inner_data = group.generate_inner_data();
        group
    }

    fn generate_inner_data(&self) -> Option<Value> {
        if self.pure_data_pattern.is_none() && self.data_deep_copy == DeepCopyStrategy::None {
            return None;
        }
        let map = self.data.as_object()?;
        let inner: Map<String, Value> = map
            .iter()
            .filter(|(k, _)| !self.is_pure_data(k))
            .map(|(k, v)| (k.clone(), self.data_deep_copy.copy(v)))
            .collect();
        Some(Value::Object(inner))
    }

    fn is_pure_data(&self, field: &str) -> bool {
        self.pure_data_pattern
            .as_ref()
            .is_some_and(|p| p.is_match(field))
    }

    // ── Reading ──

    /// The canonical data snapshot.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The snapshot without pure-data fields, when copying or a pure-data pattern is configured.
    pub fn inner_data(&self) -> Option<&Value> {
        self.inner_data.as_ref()
    }

    /// What templates render from: the inner data when present, the data otherwise.
    pub fn snapshot(&self) -> &Value {
        self.inner_data.as_ref().unwrap_or(&self.data)
    }

    pub fn get(&self, path: &[PathSegment]) -> Option<&Value> {
        get(&self.data, path)
    }

    pub fn observer_tree(&self) -> &Rc<ObserverTree> {
        &self.tree
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.tree.property(name)
    }

    /// Replace the underlying data without notifying anyone.
    pub fn replace_whole_data(&mut self, data: Value) {
        self.data = data;
        as_object_mut(&mut self.data);
        self.inner_data = self.generate_inner_data();
    }

    // ── Wiring ──

    pub fn set_update_listener(&mut self, f: impl Fn(&Value, &[DataChange]) + 'static) {
        self.update_listener = Some(Rc::new(f));
    }

    pub fn set_model_binding_listener(&mut self, prop: impl Into<String>, f: impl Fn(&Value) + 'static) {
        self.model_binding_listeners.insert(prop.into(), Rc::new(f));
    }

    /// Reflect single-level property values to attributes when `reflect_to_attributes` is set.
    pub fn set_attribute_reflector(&mut self, f: impl Fn(&str, Option<&str>) + 'static) {
        self.attribute_reflector = Some(Rc::new(f));
    }

    /// Prefix written before values of properties flagged `reflect_id_prefix`.
    pub fn set_id_prefix(&mut self, prefix: Option<String>) {
        self.id_prefix = prefix;
    }

    pub fn register_method(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&mut DataGroup, &[Value]) -> Result<(), CallbackError> + 'static,
    ) {
        self.methods.insert(name.into(), Rc::new(f));
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Result<(), CallbackError> {
        let f = self
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| CallbackError::MissingMethod(name.to_string()))?;
        f(self, args)
    }

    /// Register an observer for this instance only; the shared tree is copied first.
    pub fn add_observer(
        &mut self,
        paths: MultiPaths,
        f: impl Fn(&mut DataGroup, &[Value]) -> Result<(), CallbackError> + 'static,
    ) -> usize {
        self.add_observer_rc(paths, Rc::new(f))
    }

    /// Register a method from the method table as an observer.
    pub fn add_named_observer(&mut self, paths: MultiPaths, method: &str) -> Result<usize, CallbackError> {
        let f = self
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| CallbackError::MissingMethod(method.to_string()))?;
        Ok(self.add_observer_rc(paths, f))
    }

    fn add_observer_rc(&mut self, paths: MultiPaths, f: DataObserver) -> usize {
        let id = Rc::make_mut(&mut self.tree).add_observer_rc(paths, f);
        self.observer_status.resize(self.tree.observer_count(), false);
        id
    }

    // ── Queueing ──

    pub fn replace_data_on_path(&mut self, path: DataPath, value: Value) {
        self.pending.push(DataChange::replace(path, value));
    }

    /// Queue an "undefined" assignment.
    pub fn remove_data_on_path(&mut self, path: DataPath) {
        self.pending.push(DataChange::Replace {
            path,
            value: None,
            compare: false,
        });
    }

    /// Queue an array splice; `index: None` appends.
    pub fn splice_array_data_on_path(
        &mut self,
        path: DataPath,
        index: Option<usize>,
        delete_count: usize,
        inserts: Vec<Value>,
    ) {
        self.pending
            .push(DataChange::splice(path, index, delete_count, inserts));
    }

    /// Queue a property update coming from a parent template.
    ///
    /// Returns `false` without queueing anything when `name` is not a declared property.
    pub fn replace_property(&mut self, name: &str, value: Value) -> bool {
        if self.tree.property(name).is_none() {
            return false;
        }
        let value = match self.property_passing_deep_copy {
            DeepCopyStrategy::None => value,
            strategy => strategy.copy(&value),
        };
        self.pending.push(DataChange::Replace {
            path: vec![PathSegment::Field(name.to_string())],
            value: Some(value),
            compare: true,
        });
        true
    }

    /// Queue every `key: value` pair of an object; keys use the set-data path grammar.
    ///
    /// A key that fails to parse is reported and skipped.
    pub fn update_data(&mut self, data: Value) -> Result<(), CallbackError> {
        let Value::Object(map) = data else {
            trigger_warning("Data updates must be an object. The update is ignored.");
            return Ok(());
        };
        for (key, value) in map {
            match parse_single_path(&key) {
                Ok(path) => self.replace_data_on_path(path, value),
                Err(e) => dispatch_error(e.into(), "setData")?,
            }
        }
        Ok(())
    }

    /// [`update_data`](Self::update_data) followed by a flush.
    pub fn set_data(&mut self, data: Value) -> Result<(), CallbackError> {
        self.update_data(data)?;
        self.apply_data_updates()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn get_changes(&self) -> &[DataChange] {
        &self.pending
    }

    /// Discard the queue and replace it with `changes`.
    pub fn set_changes(&mut self, changes: Vec<DataChange>) {
        self.pending = changes;
    }

    /// Run `f`, then flush once.
    pub fn group_updates<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> Result<T, CallbackError> {
        let ret = f(self);
        self.apply_data_updates()?;
        Ok(ret)
    }

    // ── Flushing ──

    pub fn apply_data_updates(&mut self) -> Result<(), CallbackError> {
        self.apply_data_updates_with(false)
    }

    /// Apply every queued change.
    ///
    /// Inside an active flush (an observer calling back in) the changes join
    /// the current batch and the outer flush settles them.
    pub fn apply_data_updates_with(&mut self, skip_model_listener: bool) -> Result<(), CallbackError> {
        if self.doing_updates.is_some() {
            self.apply_pending(skip_model_listener);
            return Ok(());
        }
        if self.pending.is_empty() {
            return Ok(());
        }
        self.doing_updates = Some(Batch::default());
        let mut first_error = None;
        self.settle(skip_model_listener, &mut first_error);
        let batch = self.doing_updates.take().unwrap_or_default();
        self.notify(batch, &mut first_error);
        first_error.map_or(Ok(()), Err)
    }

    fn batch_count(&self) -> usize {
        self.doing_updates.as_ref().map_or(0, |b| b.count)
    }

    /// Run observers until no observer queues further changes.
    ///
    /// The first rethrown observer error lands in `first_error`; later
    /// observers still run.
    fn settle(&mut self, skip_model_listener: bool, first_error: &mut Option<CallbackError>) {
        self.apply_pending(skip_model_listener);
        let mut passes = 0usize;
        loop {
            let count = self.batch_count();
            self.trigger_observers(first_error);
            if !self.pending.is_empty() {
                self.apply_pending(skip_model_listener);
            }
            passes += 1;
            if count == self.batch_count() {
                tracing::trace!(target: "easel", passes, "observers settled");
                return;
            }
        }
    }

    fn trigger_observers(&mut self, first_error: &mut Option<CallbackError>) {
        let mut i = 0;
        while i < self.observer_status.len() {
            if self.observer_status[i] {
                self.observer_status[i] = false;
                let entry = self.tree.observers[i].clone();
                let args: Vec<Value> = entry
                    .paths
                    .iter()
                    .map(|p| get(&self.data, &p.segments).cloned().unwrap_or(Value::Null))
                    .collect();
                if let Err(e) = safe_callback("Data Observer", || (entry.callback)(self, &args)) {
                    first_error.get_or_insert(e);
                }
            }
            i += 1;
        }
    }

    fn notify(&mut self, batch: Batch, first_error: &mut Option<CallbackError>) {
        tracing::debug!(
            target: "easel",
            changes = batch.combined.len(),
            applied = batch.count,
            "data updates applied"
        );
        if let Some(listener) = self.update_listener.clone() {
            listener(self.snapshot(), &batch.combined);
        }
        for change in batch.prop {
            if !change.skip_model_listener {
                if let Some(listener) = self.model_binding_listeners.get(&change.name).cloned() {
                    listener(&change.new_value);
                }
            }
            if let Some(observer) = change.observer {
                let result = safe_callback("Property Observer", || {
                    observer(self, &change.new_value, &change.old_value)
                });
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
        }
    }

    fn apply_pending(&mut self, skip_model_listener: bool) {
        let changes = std::mem::take(&mut self.pending);
        for change in changes {
            self.apply_change(change, skip_model_listener);
        }
    }

    fn apply_change(&mut self, mut change: DataChange, skip_model_listener: bool) {
        let path = change.path().clone();
        let Some(first) = path.first() else {
            trigger_warning("A data change with an empty path is ignored.");
            return;
        };
        let name = first.as_key();
        let excluded = self.is_pure_data(&name);
        let tree = self.tree.clone();
        let prop = tree.property(&name);
        let copy = self.data_deep_copy;
        let mut applied = true;
        let mut changed = true;
        let mut prop_change = None;

        match prop {
            Some(prop) if path.len() == 1 => {
                let old_value = self.data.get(&name).cloned().unwrap_or(Value::Null);
                let new_value = match &mut change {
                    DataChange::Splice {
                        index,
                        delete_count,
                        inserts,
                        ..
                    } => {
                        match as_object_mut(&mut self.data).get_mut(&name) {
                            Some(Value::Array(arr)) => {
                                let start = normalize_splice_index(*index, arr.len());
                                *index = Some(start);
                                splice_vec(arr, start, *delete_count, inserts.clone());
                            }
                            _ => {
                                warn_not_array(&path);
                                applied = false;
                            }
                        }
                        let current = self.data.get(&name).cloned().unwrap_or(Value::Null);
                        if applied && !excluded {
                            if let Some(inner) = &mut self.inner_data {
                                let inner_map = as_object_mut(inner);
                                match (inner_map.get_mut(&name), *index) {
                                    (Some(Value::Array(arr)), Some(start)) => {
                                        let copies = inserts.iter().map(|v| copy.copy(v)).collect();
                                        splice_vec(arr, start, *delete_count, copies);
                                    }
                                    _ => {
                                        inner_map.insert(name.clone(), copy.copy(&current));
                                    }
                                }
                            }
                        }
                        current
                    }
                    DataChange::Replace { value, compare, .. } => {
                        let methods = &self.methods;
                        let is_method = |s: &str| methods.contains_key(s);
                        let filtered = convert_value_to_type(value.as_ref(), &name, prop, &is_method);
                        changed = match (&prop.comparer, *compare) {
                            (Some(comparer), true) => comparer(&filtered, &old_value),
                            _ => filtered != old_value,
                        };
                        *value = Some(filtered.clone());
                        if !excluded {
                            if let Some(inner) = &mut self.inner_data {
                                as_object_mut(inner).insert(name.clone(), copy.copy(&filtered));
                            }
                        }
                        as_object_mut(&mut self.data).insert(name.clone(), filtered.clone());
                        filtered
                    }
                };
                if applied {
                    self.reflect_attribute(&name, prop, &new_value);
                }
                if applied && changed && !excluded {
                    prop_change = Some(PropertyChange {
                        name: name.clone(),
                        observer: prop.observer.clone(),
                        old_value,
                        new_value,
                        skip_model_listener,
                    });
                }
            }
            _ => {
                match &mut change {
                    DataChange::Replace { value, .. } => {
                        if path.len() == 1 {
                            changed = self.data.get(&name) != value.as_ref();
                        }
                        let _ = write_path(&mut self.data, &path, Write::Set(value.clone()));
                        if !excluded {
                            if let Some(inner) = &mut self.inner_data {
                                let inner_value = value.as_ref().map(|v| copy.copy(v));
                                let _ = write_path(inner, &path, Write::Set(inner_value));
                            }
                        }
                    }
                    DataChange::Splice {
                        index,
                        delete_count,
                        inserts,
                        ..
                    } => {
                        let op = Write::Splice {
                            index: *index,
                            delete_count: *delete_count,
                            inserts: inserts.clone(),
                        };
                        match write_path(&mut self.data, &path, op) {
                            Ok(start) => {
                                *index = start;
                                if !excluded {
                                    if let Some(inner) = &mut self.inner_data {
                                        let op = Write::Splice {
                                            index: start,
                                            delete_count: *delete_count,
                                            inserts: inserts.iter().map(|v| copy.copy(v)).collect(),
                                        };
                                        if write_path(inner, &path, op).is_err() {
                                            let current = get(&self.data, &path).cloned();
                                            let _ = write_path(inner, &path, Write::Set(current));
                                        }
                                    }
                                }
                            }
                            Err(NotAnArray) => {
                                warn_not_array(&path);
                                applied = false;
                            }
                        }
                    }
                }
                if let Some(prop) = prop {
                    if applied && changed && !excluded {
                        prop_change = Some(PropertyChange {
                            name: name.clone(),
                            observer: prop.observer.clone(),
                            old_value: Value::Null,
                            new_value: self.data.get(&name).cloned().unwrap_or(Value::Null),
                            skip_model_listener,
                        });
                    }
                }
            }
        }

        tree.mark_triggered(&path, &mut self.observer_status);
        if let Some(batch) = self.doing_updates.as_mut() {
            if let Some(pc) = prop_change {
                batch.prop.push(pc);
            }
            if applied && changed && !excluded {
                batch.combined.push(change);
            }
            batch.count += 1;
        }
    }

    fn reflect_attribute(&self, name: &str, prop: &PropertyDefinition, value: &Value) {
        if !self.reflect_to_attributes {
            return;
        }
        let Some(reflector) = &self.attribute_reflector else {
            return;
        };
        let attr_name = dash_case(name);
        let prefixed;
        let value = match (&self.id_prefix, prop.reflect_id_prefix) {
            (Some(prefix), true) => {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                prefixed = Value::String(format!("{prefix}--{raw}"));
                &prefixed
            }
            _ => value,
        };
        match value {
            Value::Bool(true) => reflector(&attr_name, Some("")),
            Value::Bool(false) => reflector(&attr_name, None),
            Value::String(s) => reflector(&attr_name, Some(s)),
            other => reflector(&attr_name, Some(&other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_data_path::parse_multi_paths;
    use serde_json::json;
    use std::cell::RefCell;

    fn path(s: &str) -> DataPath {
        parse_single_path(s).unwrap()
    }

    #[test]
    fn test_queue_is_not_applied_before_flush() {
        let mut g = DataGroup::create(json!({"a": 1}));
        g.replace_data_on_path(path("a"), json!(2));
        assert_eq!(g.data()["a"], json!(1));
        assert!(g.has_pending_changes());
        g.apply_data_updates().unwrap();
        assert_eq!(g.data()["a"], json!(2));
        assert!(!g.has_pending_changes());
    }

    #[test]
    fn test_write_creates_containers() {
        let mut g = DataGroup::create(json!({}));
        g.replace_data_on_path(path("a.b[1].c"), json!(true));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"a": {"b": [null, {"c": true}]}}));
    }

    #[test]
    fn test_write_replaces_mismatched_container() {
        let mut g = DataGroup::create(json!({"a": {"x": 1}, "b": 3}));
        g.replace_data_on_path(path("a[0]"), json!(1));
        g.replace_data_on_path(path("b.c"), json!(2));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"a": [1], "b": {"c": 2}}));
    }

    #[test]
    fn test_remove_data() {
        let mut g = DataGroup::create(json!({"a": 1, "b": [1, 2]}));
        g.remove_data_on_path(path("a"));
        g.remove_data_on_path(path("b[0]"));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"b": [null, 2]}));
    }

    #[test]
    fn test_splice_non_array_is_ignored() {
        let mut g = DataGroup::create(json!({"a": {"b": 1}}));
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        g.set_update_listener(move |_, changes| *s.borrow_mut() = Some(changes.len()));
        g.splice_array_data_on_path(path("a.b"), Some(0), 0, vec![json!(1)]);
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"a": {"b": 1}}));
        assert_eq!(*seen.borrow(), Some(0));
    }

    #[test]
    fn test_nested_splice_records_clamped_index() {
        let mut g = DataGroup::create(json!({"o": {"arr": [1]}}));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        g.set_update_listener(move |_, changes| s.borrow_mut().extend_from_slice(changes));
        g.splice_array_data_on_path(path("o.arr"), None, 0, vec![json!(2)]);
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"o": {"arr": [1, 2]}}));
        match &seen.borrow()[0] {
            DataChange::Splice { index, .. } => assert_eq!(*index, Some(1)),
            other => panic!("unexpected {other:?}"),
        };
    }

    #[test]
    fn test_unchanged_single_level_is_not_combined() {
        let mut g = DataGroup::create(json!({"a": 1}));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        g.set_update_listener(move |_, changes| s.borrow_mut().push(changes.len()));
        g.set_data(json!({"a": 1})).unwrap();
        g.set_data(json!({"a": 2})).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_pure_data_is_excluded() {
        let options = ComponentOptions {
            pure_data_pattern: Some(Regex::new("^_").unwrap()),
            ..ComponentOptions::default()
        };
        let mut g = DataGroup::new(json!({"_p": 1, "v": 1}), &options, Rc::new(ObserverTree::new()));
        assert_eq!(g.inner_data(), Some(&json!({"v": 1})));
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        g.add_observer(parse_multi_paths("_p").unwrap(), move |_, _| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        g.set_update_listener(move |snapshot, changes| s.borrow_mut().push((snapshot.clone(), changes.len())));
        g.set_data(json!({"_p": 2, "v": 2})).unwrap();
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(*seen.borrow(), vec![(json!({"v": 2}), 1)]);
        assert_eq!(g.data(), &json!({"_p": 2, "v": 2}));
    }

    #[test]
    fn test_property_defaults_and_coercion() {
        let mut tree = ObserverTree::new();
        tree.add_property("n", PropertyDefinition::new(PropertyType::Number).with_default(json!(5)));
        tree.add_property("s", PropertyDefinition::new(PropertyType::String));
        let mut g = DataGroup::new(json!({}), &ComponentOptions::default(), Rc::new(tree));
        assert_eq!(g.data(), &json!({"n": 5, "s": ""}));
        assert!(g.replace_property("n", json!("12")));
        assert!(g.replace_property("s", json!(3)));
        assert!(!g.replace_property("missing", json!(1)));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data(), &json!({"n": 12, "s": "3"}));
        g.remove_data_on_path(path("n"));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data()["n"], json!(5));
    }

    #[test]
    fn test_property_comparer() {
        let mut tree = ObserverTree::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        tree.add_property(
            "p",
            PropertyDefinition::new(PropertyType::Any)
                .with_comparer(|_, _| false)
                .with_observer(move |_, new, old| {
                    c.borrow_mut().push((new.clone(), old.clone()));
                    Ok(())
                }),
        );
        let mut g = DataGroup::new(json!({"p": 1}), &ComponentOptions::default(), Rc::new(tree));
        g.replace_property("p", json!(2));
        g.apply_data_updates().unwrap();
        // comparer says unchanged: applied but no observer call
        assert_eq!(g.data()["p"], json!(2));
        assert!(calls.borrow().is_empty());
        g.replace_data_on_path(path("p"), json!(3));
        g.apply_data_updates().unwrap();
        assert_eq!(*calls.borrow(), vec![(json!(3), json!(2))]);
    }

    #[test]
    fn test_property_observer_runs_after_update_listener() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut tree = ObserverTree::new();
        let o = order.clone();
        tree.add_property(
            "p",
            PropertyDefinition::new(PropertyType::Number).with_observer(move |_, _, _| {
                o.borrow_mut().push("property");
                Ok(())
            }),
        );
        let mut g = DataGroup::new(json!({}), &ComponentOptions::default(), Rc::new(tree));
        let o = order.clone();
        g.set_update_listener(move |_, _| o.borrow_mut().push("listener"));
        let o = order.clone();
        g.set_model_binding_listener("p", move |_| o.borrow_mut().push("model"));
        g.replace_property("p", json!(1));
        g.apply_data_updates().unwrap();
        g.replace_property("p", json!(2));
        g.apply_data_updates_with(true).unwrap();
        assert_eq!(
            *order.borrow(),
            vec!["listener", "model", "property", "listener", "property"]
        );
    }

    #[test]
    fn test_function_property_uses_method_table() {
        let mut tree = ObserverTree::new();
        tree.add_property("handler", PropertyDefinition::new(PropertyType::Function));
        let mut g = DataGroup::new(json!({}), &ComponentOptions::default(), Rc::new(tree));
        g.register_method("onTap", |g, _| {
            g.replace_data_on_path(vec!["tapped".into()], json!(true));
            Ok(())
        });
        g.replace_property("handler", json!("onTap"));
        g.apply_data_updates().unwrap();
        assert_eq!(g.data()["handler"], json!("onTap"));
        g.call_method("onTap", &[]).unwrap();
        g.apply_data_updates().unwrap();
        assert_eq!(g.data()["tapped"], json!(true));
        assert_eq!(
            g.call_method("nope", &[]),
            Err(CallbackError::MissingMethod("nope".into()))
        );
    }

    #[test]
    fn test_attribute_reflection() {
        let mut tree = ObserverTree::new();
        tree.add_property("isOpen", PropertyDefinition::new(PropertyType::Boolean));
        tree.add_property("itemList", PropertyDefinition::new(PropertyType::Array));
        tree.add_property("ref", PropertyDefinition::new(PropertyType::String).with_reflect_id_prefix());
        let options = ComponentOptions {
            reflect_to_attributes: true,
            ..ComponentOptions::default()
        };
        let mut g = DataGroup::new(json!({}), &options, Rc::new(tree));
        let attrs = Rc::new(RefCell::new(Vec::new()));
        let a = attrs.clone();
        g.set_attribute_reflector(move |name, value| {
            a.borrow_mut().push((name.to_string(), value.map(str::to_string)))
        });
        g.set_id_prefix(Some("c1".into()));
        g.set_data(json!({"isOpen": true, "itemList": [1], "ref": "x"})).unwrap();
        g.set_data(json!({"isOpen": false})).unwrap();
        assert_eq!(
            *attrs.borrow(),
            vec![
                ("is-open".to_string(), Some(String::new())),
                ("item-list".to_string(), Some("[1]".to_string())),
                ("ref".to_string(), Some("c1--x".to_string())),
                ("is-open".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_set_data_bad_key_does_not_abort() {
        let mut g = DataGroup::create(json!({}));
        g.set_data(json!({"a[x]": 1, "b": 2})).unwrap();
        assert_eq!(g.data(), &json!({"b": 2}));
    }

    #[test]
    fn test_group_updates_flushes_once() {
        let mut g = DataGroup::create(json!({}));
        let calls = Rc::new(RefCell::new(0));
        let c = calls.clone();
        g.set_update_listener(move |_, _| *c.borrow_mut() += 1);
        let r = g
            .group_updates(|g| {
                g.replace_data_on_path(path("a"), json!(1));
                g.replace_data_on_path(path("b"), json!(2));
                7
            })
            .unwrap();
        assert_eq!(r, 7);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_instance_observer_does_not_touch_shared_tree() {
        let shared = Rc::new(ObserverTree::new());
        let mut g = DataGroup::new(json!({}), &ComponentOptions::default(), shared.clone());
        g.add_observer(parse_multi_paths("a").unwrap(), |_, _| Ok(()));
        assert_eq!(shared.observer_count(), 0);
        assert_eq!(g.observer_tree().observer_count(), 1);
    }

    #[test]
    fn test_named_observer() {
        let mut g = DataGroup::create(json!({"a": 0}));
        g.register_method("double", |g, args| {
            let v = args[0].as_i64().unwrap_or(0);
            g.replace_data_on_path(vec!["b".into()], json!(v * 2));
            Ok(())
        });
        g.add_named_observer(parse_multi_paths("a").unwrap(), "double").unwrap();
        assert!(g.add_named_observer(parse_multi_paths("a").unwrap(), "nope").is_err());
        g.set_data(json!({"a": 4})).unwrap();
        assert_eq!(g.data()["b"], json!(8));
    }
}
