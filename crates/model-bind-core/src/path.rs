//! Dotted model paths.
//!
//! Paths address nodes inside a JSON document: `"users.3.name"` walks the
//! `users` key, index `3`, then the `name` key. The empty path addresses the
//! document root.

use std::fmt;

use serde_json::Value;

use crate::store::ModelError;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

/// An absolute location in a shared model document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// The document root.
    pub fn new() -> Self {
        Path(Vec::new())
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Path(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Child path one key below `self`.
    pub fn child_key(&self, key: impl Into<String>) -> Path {
        let mut steps = self.0.clone();
        steps.push(PathStep::Key(key.into()));
        Path(steps)
    }

    /// Child path one index below `self`.
    pub fn child_index(&self, index: usize) -> Path {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index));
        Path(steps)
    }

    /// Concatenation of `self` and `tail`.
    pub fn join(&self, tail: &Path) -> Path {
        let mut steps = self.0.clone();
        steps.extend_from_slice(&tail.0);
        Path(steps)
    }

    /// Splits off the final step. `None` at the root.
    pub fn split_leaf(&self) -> Option<(Path, &PathStep)> {
        let (leaf, parent) = self.0.split_last()?;
        Some((Path(parent.to_vec()), leaf))
    }

    /// True when every step of `self` matches the head of `other`.
    ///
    /// The root path is a prefix of every path, including itself.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// True when either path is a prefix of the other.
    ///
    /// A change at one of two related paths is always visible from the
    /// other: overwriting a parent rewrites every descendant, and writing a
    /// descendant changes the parent's value.
    pub fn prefix_related(&self, other: &Path) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl From<Vec<PathStep>> for Path {
    fn from(steps: Vec<PathStep>) -> Self {
        Path(steps)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match step {
                PathStep::Key(key) => f.write_str(key)?,
                PathStep::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

/// Parses dotted path text into a [`Path`].
///
/// Segments that parse as `usize` become [`PathStep::Index`], everything
/// else becomes [`PathStep::Key`]. The empty string parses to the root.
///
/// # Example
///
/// ```
/// use model_bind_core::path::{parse_path, PathStep};
///
/// let path = parse_path("_page.items.0").unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.steps()[2], PathStep::Index(0));
/// ```
pub fn parse_path(text: &str) -> Result<Path, ModelError> {
    if text.is_empty() {
        return Ok(Path::new());
    }
    let mut steps = Vec::new();
    for segment in text.split('.') {
        if segment.is_empty() {
            return Err(ModelError::InvalidPath(text.to_string()));
        }
        match segment.parse::<usize>() {
            Ok(index) => steps.push(PathStep::Index(index)),
            Err(_) => steps.push(PathStep::Key(segment.to_string())),
        }
    }
    Ok(Path(steps))
}

/// Resolves `path` inside `root`, if every step matches the document shape.
pub fn value_at<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut cur = root;
    for step in path.steps() {
        cur = match (step, cur) {
            (PathStep::Key(key), Value::Object(map)) => map.get(key)?,
            (PathStep::Index(index), Value::Array(arr)) => arr.get(*index)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Mutable variant of [`value_at`]. Never creates missing nodes.
pub fn value_at_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut cur = root;
    for step in path.steps() {
        cur = match (step, cur) {
            (PathStep::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (PathStep::Index(index), Value::Array(arr)) => arr.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dotted_path() {
        let path = parse_path("_page.message").unwrap();
        assert_eq!(
            path.steps(),
            &[
                PathStep::Key("_page".to_string()),
                PathStep::Key("message".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_numeric_segment_is_index() {
        let path = parse_path("items.2.label").unwrap();
        assert_eq!(path.steps()[1], PathStep::Index(2));
    }

    #[test]
    fn test_parse_empty_text_is_root() {
        assert!(parse_path("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!(parse_path("a..b").is_err());
        assert!(parse_path(".a").is_err());
        assert!(parse_path("a.").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let text = "users.3.name";
        let path = parse_path(text).unwrap();
        assert_eq!(path.to_string(), text);
    }

    #[test]
    fn test_prefix_relations() {
        let root = Path::new();
        let parent = parse_path("a.b").unwrap();
        let child = parse_path("a.b.c").unwrap();
        let sibling = parse_path("a.x").unwrap();

        assert!(root.is_prefix_of(&child));
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert!(parent.prefix_related(&child));
        assert!(child.prefix_related(&parent));
        assert!(!sibling.prefix_related(&child));
        assert!(parent.is_prefix_of(&parent));
    }

    #[test]
    fn test_split_leaf() {
        let path = parse_path("a.b.1").unwrap();
        let (parent, leaf) = path.split_leaf().unwrap();
        assert_eq!(parent, parse_path("a.b").unwrap());
        assert_eq!(leaf, &PathStep::Index(1));
        assert!(Path::new().split_leaf().is_none());
    }

    #[test]
    fn test_child_builders() {
        let path = Path::new().child_key("list").child_index(0).child_key("id");
        assert_eq!(path.to_string(), "list.0.id");
    }

    #[test]
    fn test_value_at() {
        let doc = json!({"a": {"b": [10, 20]}});
        let path = parse_path("a.b.1").unwrap();
        assert_eq!(value_at(&doc, &path), Some(&json!(20)));
        assert_eq!(value_at(&doc, &parse_path("a.z").unwrap()), None);
        assert_eq!(value_at(&doc, &Path::new()), Some(&doc));
    }

    #[test]
    fn test_value_at_type_mismatch() {
        let doc = json!({"a": 5});
        assert_eq!(value_at(&doc, &parse_path("a.b").unwrap()), None);
        assert_eq!(value_at(&doc, &parse_path("0").unwrap()), None);
    }
}
