//! Validation failures and the paths locating them inside a document.

use serde::{Serialize, Serializer};
use std::fmt;

/// One step from a parent node to a child: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a value within the document, rendered as `buildTypes/beta/env/0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePath(Vec<PathSegment>);

impl FailurePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to the value stored under `key` in the mapping at `self`.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_owned()));
        Self(segments)
    }

    /// Path to the element at `index` in the sequence at `self`.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FailurePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for FailurePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Wrong type, missing or unknown property, or a failed coercion.
    Shape,
    /// A sequence that must be unique contains the same key twice.
    Uniqueness,
    /// Two features declare the same env variable.
    Conflict,
    /// `default` does not name a declared build type.
    Referential,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape => f.write_str("shape"),
            Self::Uniqueness => f.write_str("uniqueness"),
            Self::Conflict => f.write_str("conflict"),
            Self::Referential => f.write_str("referential"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub path: FailurePath,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>, path: FailurePath) -> Self {
        Self {
            kind,
            message: message.into(),
            path,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} (at {})", self.message, self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joins_segments_with_slash() {
        let path = FailurePath::root().key("buildTypes").key("beta").key("env").index(0);
        assert_eq!(path.to_string(), "buildTypes/beta/env/0");
        assert_eq!(path.segments().len(), 4);
    }

    #[test]
    fn root_path_renders_empty() {
        assert_eq!(FailurePath::root().to_string(), "");
        assert!(FailurePath::root().is_root());
    }

    #[test]
    fn child_paths_do_not_alias_parent() {
        let parent = FailurePath::root().key("features");
        let a = parent.key("a");
        let b = parent.key("b");
        assert_eq!(parent.to_string(), "features");
        assert_eq!(a.to_string(), "features/a");
        assert_eq!(b.to_string(), "features/b");
    }

    #[test]
    fn failure_serializes_path_as_string() {
        let failure = Failure::new(
            FailureKind::Uniqueness,
            "Array contains duplicated values",
            FailurePath::root().key("env"),
        );
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "uniqueness");
        assert_eq!(json["path"], "env");
        assert_eq!(json["message"], "Array contains duplicated values");
    }

    #[test]
    fn failure_display_includes_path() {
        let failure = Failure::new(
            FailureKind::Shape,
            "Expected a boolean, but received: 1",
            FailurePath::root().key("buildTypes").key("main").key("isPrerelease"),
        );
        assert_eq!(
            failure.to_string(),
            "Expected a boolean, but received: 1 (at buildTypes/main/isPrerelease)"
        );
    }
}
