//! Keyed list reconciliation.
//!
//! [`RangeListManager`] remembers the keys of the last rendered list and, on
//! every [`diff`](RangeListManager::diff), emits the smallest practical set of
//! create / insert / move / remove operations against a [`ListTarget`].
//! Items that keep their relative order (the longest common subsequence of
//! old positions in new order) are never moved; they are only updated.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use super::update_tree::{UpdatePathTree, UpdateRef};
use crate::diagnostics::trigger_warning;

/// Where an item's identity comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Items are matched by position.
    None,
    /// The item value itself (`*this`).
    This,
    /// A field of the item.
    Field(String),
}

impl KeySource {
    /// `None` and `""` mean no key; `*this` keys items by themselves.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            None | Some("") => KeySource::None,
            Some("*this") => KeySource::This,
            Some(name) => KeySource::Field(name.to_string()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, KeySource::None)
    }

    /// Whether a change subtree of one item touches its key.
    fn touched_by(&self, sub: &UpdatePathTree) -> bool {
        if sub.is_all() {
            return true;
        }
        match self {
            KeySource::None => false,
            KeySource::This => true,
            KeySource::Field(name) => sub.child(name).is_some(),
        }
    }
}

/// The logical index of a list item: a position for arrays, a key for objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListIndex {
    Position(usize),
    Key(String),
}

impl ListIndex {
    /// The key of this item inside its list's update-path tree.
    pub fn as_key(&self) -> String {
        match self {
            ListIndex::Position(i) => i.to_string(),
            ListIndex::Key(k) => k.clone(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ListIndex::Position(i) => Value::from(*i),
            ListIndex::Key(k) => Value::String(k.clone()),
        }
    }
}

/// The children container a list is rendered into.
///
/// Positions are child positions at the moment of the call.
pub trait ListTarget {
    type Node: Copy;

    fn create_item(&mut self, item: &Value, index: &ListIndex) -> Self::Node;

    fn update_item(
        &mut self,
        item: &Value,
        index: &ListIndex,
        update: UpdateRef<'_>,
        index_changed: bool,
        node: Self::Node,
    );

    fn child_at(&self, position: usize) -> Option<Self::Node>;

    /// Insert `nodes` before position `at`; `None` appends.
    fn insert_children(&mut self, nodes: &[Self::Node], at: Option<usize>);

    /// Move an existing child so it lands before the child currently at `at`.
    fn insert_child_at(&mut self, node: Self::Node, at: usize);

    fn remove_children(&mut self, from: usize, count: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Stable,
    /// Towards the end of the list.
    ForwardMove,
    /// Towards the start of the list.
    BackwardMove,
}

enum ItemUpdates<'a> {
    Nothing,
    All,
    Tree(&'a UpdatePathTree),
    PerItem(Vec<UpdateRef<'a>>),
}

impl<'a> ItemUpdates<'a> {
    fn get(&self, position: usize, index: &ListIndex) -> UpdateRef<'a> {
        match self {
            ItemUpdates::Nothing => UpdateRef::none(),
            ItemUpdates::All => UpdateRef::all(),
            ItemUpdates::Tree(tree) => UpdateRef::new(tree.child(&index.as_key())),
            ItemUpdates::PerItem(list) => list.get(position).copied().unwrap_or_default(),
        }
    }
}

fn index_in(indexes: &Option<Vec<String>>, i: usize) -> ListIndex {
    match indexes {
        Some(keys) => ListIndex::Key(keys[i].clone()),
        None => ListIndex::Position(i),
    }
}

fn shifted(pos: usize, diff: isize) -> usize {
    pos.checked_add_signed(diff).unwrap_or(0)
}

fn set_at(v: &mut Vec<usize>, i: usize, value: usize) {
    if i < v.len() {
        v[i] = value;
    } else {
        v.push(value);
    }
}

/// Identity state of one rendered repeated block.
#[derive(Debug, Clone)]
pub struct RangeListManager {
    key: KeySource,
    items: Vec<Value>,
    indexes: Option<Vec<String>>,
    raw_keys: Vec<String>,
    key_map: HashMap<String, usize>,
    shared_keys: IndexMap<String, Vec<usize>>,
}

impl RangeListManager {
    /// Render `list` for the first time, appending one item per entry.
    pub fn new<T: ListTarget>(key: KeySource, list: &Value, target: &mut T) -> Self {
        let mut this = Self {
            key,
            items: Vec::new(),
            indexes: None,
            raw_keys: Vec::new(),
            key_map: HashMap::new(),
            shared_keys: IndexMap::new(),
        };
        this.update_keys(list);
        let nodes: Vec<T::Node> = (0..this.items.len())
            .map(|i| target.create_item(&this.items[i], &this.index_of(i)))
            .collect();
        target.insert_children(&nodes, None);
        this
    }

    pub fn key_source(&self) -> &KeySource {
        &self.key
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Keys after duplicate disambiguation; empty when the list is unkeyed.
    pub fn keys(&self) -> &[String] {
        &self.raw_keys
    }

    pub fn index_of(&self, i: usize) -> ListIndex {
        index_in(&self.indexes, i)
    }

    fn raw_key(&self, item: &Value) -> String {
        let field = match &self.key {
            KeySource::None => None,
            KeySource::This => Some(item),
            KeySource::Field(name) => item.get(name.as_str()),
        };
        match field {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
        }
    }

    fn update_keys(&mut self, list: &Value) {
        let (items, indexes) = match list {
            Value::Array(arr) => (arr.clone(), None),
            Value::Object(map) => (
                map.values().cloned().collect(),
                Some(map.keys().cloned().collect()),
            ),
            Value::String(s) => {
                trigger_warning(
                    "Use string as for-list is generally for testing. Each character is treated as an item.",
                );
                (s.chars().map(|c| Value::String(c.to_string())).collect(), None)
            }
            Value::Number(n) => {
                trigger_warning(
                    "Use number as for-list is generally for testing. The number is used as the repeated times of the item.",
                );
                let count = n
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map_or(0, |f| f as usize);
                ((0..count).map(Value::from).collect(), None)
            }
            _ => {
                trigger_warning("The for-list data is invalid. Use empty array instead.");
                (Vec::new(), None)
            }
        };
        self.items = items;
        self.indexes = indexes;

        let mut raw_keys = Vec::new();
        let mut key_map = HashMap::new();
        let mut shared: IndexMap<String, Vec<usize>> = IndexMap::new();
        if !self.key.is_none() {
            raw_keys.reserve(self.items.len());
            for (i, item) in self.items.iter().enumerate() {
                let raw = self.raw_key(item);
                if let Some(first) = key_map.remove(&raw) {
                    shared.insert(raw.clone(), vec![first, i]);
                } else if let Some(positions) = shared.get_mut(&raw) {
                    positions.push(i);
                } else {
                    key_map.insert(raw.clone(), i);
                }
                raw_keys.push(raw);
            }
            if !shared.is_empty() {
                let names: Vec<&str> = shared.keys().map(String::as_str).collect();
                trigger_warning(&format!(
                    "Some keys are not unique while list updates: \"{}\".",
                    names.join("\", \"")
                ));
                for (key, positions) in &shared {
                    let mut inc = 0usize;
                    for &index in positions {
                        while key_map.contains_key(&format!("{key}--{inc}")) {
                            inc += 1;
                        }
                        let k = format!("{key}--{inc}");
                        key_map.insert(k.clone(), index);
                        raw_keys[index] = k;
                    }
                }
            }
        }
        self.raw_keys = raw_keys;
        self.key_map = key_map;
        self.shared_keys = shared;
    }

    /// Reconcile the rendered children with `list`.
    ///
    /// `update` is the list's subtree of the update-path tree; `None` means
    /// no item content changed.
    pub fn diff<T: ListTarget>(&mut self, list: &Value, update: UpdateRef<'_>, target: &mut T) {
        let old_len = self.items.len();
        let old_raw_keys = std::mem::take(&mut self.raw_keys);
        let old_key_map = std::mem::take(&mut self.key_map);
        let old_shared = std::mem::take(&mut self.shared_keys);
        let old_indexes = self.indexes.take();
        self.update_keys(list);
        let new_len = self.items.len();

        let ori = update.tree();
        let (updates, fast) = match ori {
            None => (ItemUpdates::Nothing, true),
            Some(UpdatePathTree::All) => (ItemUpdates::All, self.key.is_none()),
            Some(_) if self.key.is_none() => (ItemUpdates::All, true),
            Some(tree) => {
                let need_update = match tree {
                    UpdatePathTree::Fields(map) => map.values().any(|sub| self.key.touched_by(sub)),
                    _ => true,
                };
                if need_update {
                    let per_item = (0..new_len)
                        .map(|i| {
                            let k = &self.raw_keys[i];
                            if old_shared.contains_key(k) || self.shared_keys.contains_key(k) {
                                return UpdateRef::all();
                            }
                            match tree.child(&self.index_of(i).as_key()) {
                                None => UpdateRef::none(),
                                Some(sub) if self.key.touched_by(sub) => UpdateRef::all(),
                                Some(sub) => UpdateRef::new(Some(sub)),
                            }
                        })
                        .collect();
                    (ItemUpdates::PerItem(per_item), false)
                } else {
                    (ItemUpdates::Tree(tree), false)
                }
            }
        };

        tracing::trace!(target: "easel", old_len, new_len, fast, "list diff");

        if fast {
            let updates = match ori {
                None => ItemUpdates::Nothing,
                Some(UpdatePathTree::All | UpdatePathTree::Spliced { .. }) => ItemUpdates::All,
                Some(tree) => ItemUpdates::Tree(tree),
            };
            self.update_in_place(old_len.min(new_len), &old_indexes, &updates, target);
            if new_len < old_len {
                target.remove_children(new_len, old_len - new_len);
            } else if old_len < new_len {
                let nodes: Vec<T::Node> = (old_len..new_len)
                    .map(|i| target.create_item(&self.items[i], &self.index_of(i)))
                    .collect();
                target.insert_children(&nodes, None);
            }
            return;
        }

        // Patience-sorting LCS over old positions in new order.
        // `min_index_by_len[l]` is the smallest old position ending a common
        // subsequence of length `l + 1`.
        let mut min_index_by_len: Vec<usize> = Vec::new();
        let mut min_index_by_len_indexes: Vec<usize> = Vec::new();
        let mut min_index_prev: Vec<Option<usize>> = vec![None; new_len];
        let mut old_pos_list: Vec<Option<usize>> = vec![None; new_len];
        let mut prev_old_index: Option<usize> = None;
        let mut prev_len_index: Option<usize> = None;
        for i in 0..new_len {
            let raw_key = &self.raw_keys[i];
            let next_old = prev_old_index.map_or(0, |p| p + 1);
            if old_raw_keys.get(next_old) == Some(raw_key) {
                let top = prev_len_index.map_or(0, |p| p + 1);
                set_at(&mut min_index_by_len, top, next_old);
                set_at(&mut min_index_by_len_indexes, top, i);
                min_index_prev[i] = top.checked_sub(1).map(|t| min_index_by_len_indexes[t]);
                old_pos_list[i] = Some(next_old);
                prev_old_index = Some(next_old);
                prev_len_index = Some(top);
                continue;
            }
            let Some(&old_index) = old_key_map.get(raw_key) else {
                continue;
            };
            let (mut bottom, mut top) = (0, min_index_by_len.len());
            while bottom < top {
                let mid = (bottom + top) / 2;
                if old_index < min_index_by_len[mid] {
                    top = mid;
                } else {
                    bottom = mid + 1;
                }
            }
            set_at(&mut min_index_by_len, top, old_index);
            set_at(&mut min_index_by_len_indexes, top, i);
            min_index_prev[i] = top.checked_sub(1).map(|t| min_index_by_len_indexes[t]);
            old_pos_list[i] = Some(old_index);
            prev_old_index = Some(old_index);
            prev_len_index = Some(top);
        }
        let lcs_len = min_index_by_len_indexes.len();

        if lcs_len == new_len && lcs_len == old_len {
            self.update_in_place(new_len, &old_indexes, &updates, target);
            return;
        }

        let mut lcs = vec![0usize; lcs_len];
        let mut slot = lcs_len;
        let mut cur = lcs_len.checked_sub(1).map(|t| min_index_by_len_indexes[t]);
        while let Some(p) = cur {
            slot -= 1;
            lcs[slot] = p;
            cur = min_index_prev[p];
        }

        let mut old_ops: Vec<Option<OpKind>> = vec![None; old_len];
        let mut changed: Vec<Option<T::Node>> = vec![None; new_len];
        let mut lcs_cursor = 0;
        let mut prev_lcs_old_pos: Option<usize> = None;
        for (i, old_pos) in old_pos_list.iter().enumerate() {
            if lcs.get(lcs_cursor) == Some(&i) {
                prev_lcs_old_pos = *old_pos;
                lcs_cursor += 1;
                if let Some(p) = old_pos {
                    old_ops[*p] = Some(OpKind::Stable);
                }
                continue;
            }
            match old_pos {
                None => changed[i] = Some(target.create_item(&self.items[i], &self.index_of(i))),
                Some(p) => {
                    let backward = prev_lcs_old_pos.map_or(true, |q| *p > q);
                    old_ops[*p] = Some(if backward {
                        OpKind::BackwardMove
                    } else {
                        OpKind::ForwardMove
                    });
                    changed[i] = target.child_at(*p);
                }
            }
        }

        let mut moves = 0usize;
        let mut real_diff: isize = 0;
        let mut op_old_pos = 0usize;
        let mut op_index = 0usize;
        let mut cursor = 0usize;
        loop {
            let (next_stable, next_stable_old_pos) = match lcs.get(cursor) {
                Some(&s) => (s, old_pos_list[s].unwrap_or(old_len)),
                None => (new_len, old_len),
            };

            // remove vanished runs before the anchor
            while op_old_pos < next_stable_old_pos {
                match old_ops[op_old_pos] {
                    None => {
                        let start = op_old_pos;
                        op_old_pos += 1;
                        let mut count = 1;
                        while op_old_pos < next_stable_old_pos && old_ops[op_old_pos].is_none() {
                            op_old_pos += 1;
                            count += 1;
                        }
                        target.remove_children(shifted(start, real_diff), count);
                        real_diff -= count as isize;
                    }
                    Some(op) => {
                        if op == OpKind::BackwardMove {
                            real_diff -= 1;
                        }
                        op_old_pos += 1;
                    }
                }
            }

            // insert new runs and move reused items before the anchor
            while op_index < next_stable {
                match old_pos_list[op_index] {
                    None => {
                        let start = op_index;
                        op_index += 1;
                        while op_index < next_stable && old_pos_list[op_index].is_none() {
                            op_index += 1;
                        }
                        let nodes: Vec<T::Node> =
                            changed[start..op_index].iter().flatten().copied().collect();
                        target.insert_children(&nodes, Some(shifted(next_stable_old_pos, real_diff)));
                        real_diff += (op_index - start) as isize;
                    }
                    Some(old_pos) => {
                        if let Some(node) = changed[op_index] {
                            target.insert_child_at(node, shifted(next_stable_old_pos, real_diff));
                            moves += 1;
                            let index = self.index_of(op_index);
                            let old_index = index_in(&old_indexes, old_pos);
                            let u = updates.get(op_index, &index);
                            target.update_item(&self.items[op_index], &index, u, index != old_index, node);
                        }
                        if old_ops[old_pos] == Some(OpKind::BackwardMove) {
                            real_diff += 1;
                        }
                        op_index += 1;
                    }
                }
            }

            // anchors stay in place but may carry content or index changes
            if cursor < lcs.len() {
                let index = self.index_of(next_stable);
                let old_index = index_in(&old_indexes, next_stable_old_pos);
                if let Some(node) = target.child_at(shifted(next_stable_old_pos, real_diff)) {
                    let u = updates.get(next_stable, &index);
                    target.update_item(&self.items[next_stable], &index, u, index != old_index, node);
                }
            }

            op_old_pos = next_stable_old_pos + 1;
            op_index = next_stable + 1;
            cursor += 1;
            if cursor > lcs.len() {
                break;
            }
        }
        tracing::trace!(target: "easel", lcs_len, moves, "list diff applied");
    }

    fn update_in_place<T: ListTarget>(
        &self,
        count: usize,
        old_indexes: &Option<Vec<String>>,
        updates: &ItemUpdates<'_>,
        target: &mut T,
    ) {
        for i in 0..count {
            let index = self.index_of(i);
            let old_index = index_in(old_indexes, i);
            if let Some(node) = target.child_at(i) {
                let u = updates.get(i, &index);
                target.update_item(&self.items[i], &index, u, index != old_index, node);
            }
        }
    }
}
