//! "What changed" trees built from applied data changes.

use easel_data_path::PathSegment;
use indexmap::IndexMap;

use crate::data_group::DataChange;

/// A nested record of changed paths.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePathTree {
    /// The whole subtree changed.
    All,
    /// Changed fields, by key.
    Fields(IndexMap<String, UpdatePathTree>),
    /// An array that was spliced; `slots` mirror the spliced array positions
    /// (`None` is an untouched item) and `named` keeps non-index keys.
    Spliced {
        slots: Vec<Option<UpdatePathTree>>,
        named: IndexMap<String, UpdatePathTree>,
    },
}

pub static ALL: UpdatePathTree = UpdatePathTree::All;

fn segment_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(i) => Some(*i),
        PathSegment::Field(s) => s.parse().ok(),
    }
}

impl UpdatePathTree {
    /// Build the tree for a list of applied changes.
    ///
    /// ```
    /// use easel_core::data_group::DataChange;
    /// use easel_core::tmpl::UpdatePathTree;
    /// use serde_json::json;
    ///
    /// let tree = UpdatePathTree::build(&[
    ///     DataChange::replace(vec!["a".into(), "b".into()], json!(1)),
    ///     DataChange::splice(vec!["list".into()], Some(1), 0, vec![json!(0)]),
    /// ]);
    /// assert!(tree.child("a").unwrap().child("b").unwrap().is_all());
    /// assert!(tree.child("a").unwrap().child("c").is_none());
    /// assert!(tree.child("list").unwrap().index(1).unwrap().is_all());
    /// assert!(tree.child("list").unwrap().index(0).is_none());
    /// ```
    pub fn build(changes: &[DataChange]) -> Self {
        let mut root = UpdatePathTree::Fields(IndexMap::new());
        for change in changes {
            root.add_change(change);
        }
        root
    }

    fn add_change(&mut self, change: &DataChange) {
        let path = change.path();
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut cur = self;
        for segment in parents {
            match cur.ensure(segment, || UpdatePathTree::Fields(IndexMap::new())) {
                Some(next) if !next.is_all() => cur = next,
                _ => return,
            }
        }
        match change {
            DataChange::Replace { .. } => cur.set_child(last, UpdatePathTree::All),
            DataChange::Splice {
                index,
                inserts,
                delete_count,
                ..
            } => {
                let start = index.unwrap_or_default();
                let Some(node) = cur.ensure(last, || UpdatePathTree::Spliced {
                    slots: vec![None; start],
                    named: IndexMap::new(),
                }) else {
                    return;
                };
                if let UpdatePathTree::Fields(map) = node {
                    *node = fields_to_spliced(std::mem::take(map));
                }
                if let UpdatePathTree::Spliced { slots, .. } = node {
                    if slots.len() < start {
                        slots.resize(start, None);
                    }
                    let end = start.saturating_add(*delete_count).min(slots.len());
                    slots.splice(start..end, inserts.iter().map(|_| Some(UpdatePathTree::All)));
                }
            }
        }
    }

    /// The child node for `segment`, created with `make` when missing.
    /// `None` when this node is `All`.
    fn ensure(
        &mut self,
        segment: &PathSegment,
        make: impl FnOnce() -> UpdatePathTree,
    ) -> Option<&mut UpdatePathTree> {
        match self {
            UpdatePathTree::All => None,
            UpdatePathTree::Fields(map) => Some(map.entry(segment.as_key()).or_insert_with(make)),
            UpdatePathTree::Spliced { slots, named } => match segment_index(segment) {
                Some(i) => {
                    if slots.len() <= i {
                        slots.resize(i + 1, None);
                    }
                    Some(slots[i].get_or_insert_with(make))
                }
                None => Some(named.entry(segment.as_key()).or_insert_with(make)),
            },
        }
    }

    fn set_child(&mut self, segment: &PathSegment, value: UpdatePathTree) {
        if let Some(node) = self.ensure(segment, || UpdatePathTree::All) {
            *node = value;
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, UpdatePathTree::All)
    }

    /// The subtree for a field; `All` propagates to every child.
    pub fn child(&self, key: &str) -> Option<&UpdatePathTree> {
        match self {
            UpdatePathTree::All => Some(&ALL),
            UpdatePathTree::Fields(map) => map.get(key),
            UpdatePathTree::Spliced { slots, named } => match key.parse::<usize>() {
                Ok(i) => slots.get(i).and_then(Option::as_ref),
                Err(_) => named.get(key),
            },
        }
    }

    /// The subtree for an array position.
    pub fn index(&self, i: usize) -> Option<&UpdatePathTree> {
        match self {
            UpdatePathTree::All => Some(&ALL),
            UpdatePathTree::Fields(map) => map.get(&i.to_string()),
            UpdatePathTree::Spliced { slots, .. } => slots.get(i).and_then(Option::as_ref),
        }
    }
}

fn fields_to_spliced(map: IndexMap<String, UpdatePathTree>) -> UpdatePathTree {
    let mut slots: Vec<Option<UpdatePathTree>> = Vec::new();
    let mut named = IndexMap::new();
    for (key, value) in map {
        match key.parse::<usize>() {
            Ok(i) => {
                if slots.len() <= i {
                    slots.resize(i + 1, None);
                }
                slots[i] = Some(value);
            }
            Err(_) => {
                named.insert(key, value);
            }
        }
    }
    UpdatePathTree::Spliced { slots, named }
}

// ── Borrowed view ─────────────────────────────────────────────────────────

/// A borrowed, possibly absent subtree handed to template generators.
///
/// An absent subtree means nothing below it changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateRef<'a>(Option<&'a UpdatePathTree>);

impl<'a> UpdateRef<'a> {
    pub fn new(tree: Option<&'a UpdatePathTree>) -> Self {
        Self(tree)
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn all() -> Self {
        Self(Some(&ALL))
    }

    pub fn tree(&self) -> Option<&'a UpdatePathTree> {
        self.0
    }

    pub fn is_changed(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_all(&self) -> bool {
        self.0.is_some_and(UpdatePathTree::is_all)
    }

    pub fn field(&self, key: &str) -> UpdateRef<'a> {
        Self(self.0.and_then(|t| t.child(key)))
    }

    pub fn index(&self, i: usize) -> UpdateRef<'a> {
        Self(self.0.and_then(|t| t.index(i)))
    }
}
