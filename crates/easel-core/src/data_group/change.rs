//! Queued data changes.

use easel_data_path::{format_path, DataPath};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum DataChange {
    /// Assign `value` at `path`; `None` removes the value.
    Replace {
        path: DataPath,
        value: Option<Value>,
        /// Decide "changed" with the property comparer.
        compare: bool,
    },
    /// Splice an array at `path`.
    ///
    /// `index: None` appends. Once applied, the index holds the clamped position.
    Splice {
        path: DataPath,
        inserts: Vec<Value>,
        index: Option<usize>,
        delete_count: usize,
    },
}

impl DataChange {
    pub fn replace(path: DataPath, value: Value) -> Self {
        DataChange::Replace {
            path,
            value: Some(value),
            compare: false,
        }
    }

    pub fn splice(path: DataPath, index: Option<usize>, delete_count: usize, inserts: Vec<Value>) -> Self {
        DataChange::Splice {
            path,
            inserts,
            index,
            delete_count,
        }
    }

    pub fn path(&self) -> &DataPath {
        match self {
            DataChange::Replace { path, .. } | DataChange::Splice { path, .. } => path,
        }
    }

    pub fn is_splice(&self) -> bool {
        matches!(self, DataChange::Splice { .. })
    }

    /// Dotted path, for diagnostics.
    pub fn path_string(&self) -> String {
        format_path(self.path())
    }
}

/// Clamp a splice start into `[0, len]`; out-of-range or missing starts append.
pub(crate) fn normalize_splice_index(index: Option<usize>, len: usize) -> usize {
    match index {
        Some(i) if i < len => i,
        _ => len,
    }
}

/// Splice `arr` in place like `Array.prototype.splice` with a normalized start.
pub(crate) fn splice_vec(arr: &mut Vec<Value>, start: usize, delete_count: usize, inserts: Vec<Value>) {
    let end = start.saturating_add(delete_count).min(arr.len());
    arr.splice(start..end, inserts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_splice_index(Some(1), 3), 1);
        assert_eq!(normalize_splice_index(Some(3), 3), 3);
        assert_eq!(normalize_splice_index(Some(99), 3), 3);
        assert_eq!(normalize_splice_index(None, 3), 3);
    }

    #[test]
    fn test_splice_vec() {
        let mut arr = vec![json!(1), json!(2), json!(3)];
        splice_vec(&mut arr, 1, 1, vec![json!(9), json!(8)]);
        assert_eq!(arr, vec![json!(1), json!(9), json!(8), json!(3)]);
        splice_vec(&mut arr, 4, 5, vec![json!(0)]);
        assert_eq!(arr.len(), 5);
        splice_vec(&mut arr, 0, usize::MAX, vec![]);
        assert!(arr.is_empty());
    }

    #[test]
    fn test_path_string() {
        let c = DataChange::replace(vec!["a".into(), 2.into()], json!(1));
        assert_eq!(c.path_string(), "a[2]");
        assert!(!c.is_splice());
    }
}
