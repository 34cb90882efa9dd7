//! Error types for yMMSL documents.
//!
//! One enum covers every failure the library reports. Variants are grouped by
//! [`Category`]: malformed names (syntax), wrong document shape (schema),
//! cross-reference problems (consistency) and failed merges.
//!
//! A key repeated within one mapping is a schema error ([`Error::DuplicateKey`]),
//! except under `model.components`, where it names a component twice and is
//! reported as [`Error::DuplicateComponent`].

use crate::document::DocPath;

use std::fmt;
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Malformed identifier, reference or YAML text.
    Syntax,
    /// Unknown, missing or conflicting keys, or values of the wrong shape.
    Schema,
    /// References that do not resolve, duplicates, version mismatches.
    Consistency,
    /// Two documents that cannot be combined.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid identifier {text:?}: {reason}")]
    InvalidIdentifier { text: String, reason: &'static str },

    #[error("identifier {0:?} starts with an underscore, which is reserved for internal names")]
    ReservedName(String),

    #[error("invalid reference {text:?}: {reason}")]
    InvalidReference { text: String, reason: String },

    #[error("malformed YAML: {0}")]
    Yaml(String),

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("conflicting keys: {0}")]
    ConflictingKeys(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid setting key {key:?}: {reason}")]
    InvalidSettingKey { key: String, reason: Box<Error> },

    #[error("irregular matrix: row {row} has {len} columns where {expected} were expected")]
    IrregularMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("resource request mixes keys of different shapes: {keys}")]
    AmbiguousResourceShape { keys: String },

    #[error("`{field}` must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("port `{0}` is declared more than once")]
    DuplicatePort(String),

    #[error("key `{0}` appears more than once")]
    DuplicateKey(String),

    #[error("setting `{0}` is given more than once")]
    DuplicateSetting(String),

    #[error("invalid checkpoint rule: {0}")]
    InvalidCheckpoint(String),

    #[error("unsupported ymmsl_version {0:?}, only \"v0.1\" is supported")]
    UnsupportedVersion(String),

    #[error("component `{0}` is declared more than once")]
    DuplicateComponent(String),

    #[error("receiving port `{0}` is connected by more than one conduit")]
    DuplicateReceiver(String),

    #[error("conduit {conduit}: unknown component `{component}`")]
    UnknownComponent { conduit: String, component: String },

    #[error("conduit {conduit}: component `{component}` has no {direction} port `{port}`")]
    UnknownPort {
        conduit: String,
        component: String,
        port: String,
        direction: &'static str,
    },

    #[error("conduit {conduit}: slots on conduit endpoints are not supported")]
    SlotNotSupported { conduit: String },

    #[error("cannot merge model `{overlay}` into model `{base}`: names differ")]
    IncompatibleModels { base: String, overlay: String },

    /// Any other error, located in the document tree.
    #[error("at {path}: {error}")]
    At { path: DocPath, error: Box<Error> },
}

impl Error {
    /// Attach a document location, unless a more precise one is already set.
    pub fn at(self, path: &DocPath) -> Self {
        match self {
            Self::At { .. } => self,
            other => Self::At {
                path: path.clone(),
                error: Box::new(other),
            },
        }
    }

    /// The underlying error, with any location wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::At { error, .. } => error.root(),
            other => other,
        }
    }

    /// Document location of the error, if known.
    pub fn path(&self) -> Option<&DocPath> {
        match self {
            Self::At { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn category(&self) -> Category {
        match self.root() {
            Self::InvalidIdentifier { .. }
            | Self::ReservedName(_)
            | Self::InvalidReference { .. }
            | Self::Yaml(_) => Category::Syntax,

            Self::MissingKey(_)
            | Self::UnknownKey(_)
            | Self::ConflictingKeys(_)
            | Self::UnexpectedType { .. }
            | Self::InvalidSettingKey { .. }
            | Self::IrregularMatrix { .. }
            | Self::AmbiguousResourceShape { .. }
            | Self::NotPositive { .. }
            | Self::InvalidValue(_)
            | Self::DuplicatePort(_)
            | Self::DuplicateKey(_)
            | Self::DuplicateSetting(_)
            | Self::InvalidCheckpoint(_) => Category::Schema,

            Self::UnsupportedVersion(_)
            | Self::DuplicateComponent(_)
            | Self::DuplicateReceiver(_)
            | Self::UnknownComponent { .. }
            | Self::UnknownPort { .. }
            | Self::SlotNotSupported { .. } => Category::Consistency,

            Self::IncompatibleModels { .. } => Category::Merge,

            // root() never returns a location wrapper
            Self::At { error, .. } => error.category(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax error",
            Self::Schema => "schema error",
            Self::Consistency => "consistency error",
            Self::Merge => "merge error",
        };
        f.write_str(name)
    }
}

/// Location helper for results produced while walking a document.
pub(crate) trait ResultExt<T> {
    fn at(self, path: &DocPath) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn at(self, path: &DocPath) -> Result<T> {
        self.map_err(|e| e.at(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_is_kept_innermost() {
        let outer = DocPath::root().join("model");
        let inner = outer.join("components").join("macro");

        let err = Error::DuplicatePort("x".into()).at(&inner).at(&outer);
        assert_eq!(err.path(), Some(&inner));
        assert_eq!(err.root(), &Error::DuplicatePort("x".into()));
        assert_eq!(
            err.to_string(),
            "at /model/components/macro: port `x` is declared more than once"
        );
    }

    #[test]
    fn categories_follow_the_root_error() {
        let err = Error::DuplicateReceiver("b.in".into()).at(&DocPath::root());
        assert_eq!(err.category(), Category::Consistency);
        assert_eq!(
            Error::ReservedName("_x".into()).category(),
            Category::Syntax
        );
        assert_eq!(
            Error::IncompatibleModels {
                base: "a".into(),
                overlay: "b".into()
            }
            .category(),
            Category::Merge
        );
    }
}
