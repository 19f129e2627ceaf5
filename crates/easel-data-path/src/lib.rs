//! Data path descriptors.
//!
//! A data path addresses a value inside a component's data object, e.g.
//! `list[2].name`. This crate parses the two textual forms used by the runtime
//! and resolves parsed paths against `serde_json` values.
//!
//! # Example
//!
//! ```
//! use easel_data_path::{parse_multi_paths, parse_single_path, get, PathSegment};
//! use serde_json::json;
//!
//! // Observer declarations: strict grammar, comma separated, `**` wildcard
//! let paths = parse_multi_paths("a.b[2], c.**").unwrap();
//! assert_eq!(paths.len(), 2);
//! assert!(paths[1].wildcard);
//!
//! // Set-data keys: lenient grammar
//! let path = parse_single_path("list[1].name").unwrap();
//! assert_eq!(path[1], PathSegment::Index(1));
//!
//! let doc = json!({"list": [{"name": "a"}, {"name": "b"}]});
//! assert_eq!(get(&doc, &path), Some(&json!("b")));
//! ```

use serde_json::Value;

pub mod types;
pub use types::{DataPath, MultiPaths, ObserverPath, PathSegment};

mod parser;
pub use parser::{DataPathParser, PathSyntaxError, SyntaxErrorKind};

/// Parse a comma separated list of observer paths.
///
/// # Errors
///
/// Returns a [`PathSyntaxError`] if any path is malformed or the input has
/// trailing characters.
pub fn parse_multi_paths(descriptor: &str) -> Result<MultiPaths, PathSyntaxError> {
    DataPathParser::parse_multi(descriptor)
}

/// Parse every descriptor of a list as a single observer path.
pub fn parse_path_list<S: AsRef<str>>(descriptors: &[S]) -> Result<MultiPaths, PathSyntaxError> {
    descriptors
        .iter()
        .map(|s| DataPathParser::parse_observer(s.as_ref()))
        .collect()
}

/// Parse a single observer path.
///
/// # Example
///
/// ```
/// use easel_data_path::{parse_path, PathSegment};
///
/// let p = parse_path("a.b[2]").unwrap();
/// assert_eq!(p.segments, vec!["a".into(), "b".into(), PathSegment::Index(2)]);
/// assert!(parse_path("**").unwrap().wildcard);
/// assert!(parse_path("a..b").is_err());
/// ```
pub fn parse_path(descriptor: &str) -> Result<ObserverPath, PathSyntaxError> {
    DataPathParser::parse_observer(descriptor)
}

/// Parse a set-data string key such as `list[2].name` or `a\.b`.
///
/// The whole key is always consumed; only an illegal index is an error,
/// including an index too large for `usize`.
pub fn parse_single_path(key: &str) -> Result<DataPath, PathSyntaxError> {
    DataPathParser::parse_single(key)
}

/// Format a path back into its dotted form.
///
/// # Example
///
/// ```
/// use easel_data_path::{format_path, PathSegment};
///
/// assert_eq!(format_path(&["a".into(), PathSegment::Index(2), "b".into()]), "a[2].b");
/// assert_eq!(format_path(&[]), "");
/// ```
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Resolve a path against a JSON value.
///
/// Object members are looked up by the segment key (so index segments also
/// address numeric object keys); array elements require an index segment.
pub fn get<'a>(val: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = val;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(&segment.as_key())?,
            Value::Array(arr) => arr.get(segment.index()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(val: &'a mut Value, path: &[PathSegment]) -> Option<&'a mut Value> {
    let mut current = val;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get_mut(&segment.as_key())?,
            Value::Array(arr) => arr.get_mut(segment.index()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Check if `parent` is a strict prefix of `child`.
pub fn is_child(parent: &[PathSegment], child: &[PathSegment]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let doc = json!({"a": {"b": [1, 2, {"c": true}]}});
        let path = parse_single_path("a.b[2].c").unwrap();
        assert_eq!(get(&doc, &path), Some(&json!(true)));
        assert_eq!(get(&doc, &parse_single_path("a.x").unwrap()), None);
        assert_eq!(get(&doc, &[]), Some(&doc));
    }

    #[test]
    fn test_get_index_on_object() {
        let doc = json!({"m": {"0": "zero"}});
        assert_eq!(get(&doc, &["m".into(), PathSegment::Index(0)]), Some(&json!("zero")));
    }

    #[test]
    fn test_get_field_on_array() {
        let doc = json!({"a": [1]});
        assert_eq!(get(&doc, &["a".into(), "length".into()]), None);
    }

    #[test]
    fn test_get_mut() {
        let mut doc = json!({"a": [1, 2]});
        *get_mut(&mut doc, &["a".into(), 1.into()]).unwrap() = json!(5);
        assert_eq!(doc, json!({"a": [1, 5]}));
    }

    #[test]
    fn test_is_child() {
        let parent: DataPath = vec!["a".into()];
        let child: DataPath = vec!["a".into(), 1.into()];
        assert!(is_child(&parent, &child));
        assert!(!is_child(&child, &parent));
        assert!(!is_child(&parent, &parent));
    }

    #[test]
    fn test_parse_path_list() {
        let paths = parse_path_list(&["a", "b.**"]).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].wildcard);
        assert!(parse_path_list(&["a, b"]).is_err());
    }
}
