//! Error types for geotree operations.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while parsing, serializing, or editing a feature tree.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Feature is not a folder")]
    NotAFolder,

    #[error("Child index {index} out of range (folder has {len} children)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// True for document-level failures that abort a whole parse.
    pub fn is_malformed_document(&self) -> bool {
        matches!(
            self,
            Error::Xml(_) | Error::Json(_) | Error::MalformedDocument(_)
        )
    }

    /// True for rejected tree edits. The tree is left unmodified.
    pub fn is_invalid_tree_operation(&self) -> bool {
        matches!(self, Error::NotAFolder | Error::IndexOutOfRange { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A per-element problem that was recovered from during a parse.
///
/// Diagnostics never abort a parse. They are collected on the resulting
/// [`Document`](crate::Document) so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A geometry was recognized structurally but could not be converted.
    /// The enclosing feature became [`FeatureKind::Unknown`](crate::FeatureKind::Unknown).
    UnsupportedGeometry { element: String, reason: String },
    /// A coordinate tuple failed numeric parsing and was dropped.
    NumericParseFailure { tuple: String },
    /// A placemark carried no recognized geometry and was left out of the tree.
    SkippedPlacemark { name: Option<String> },
    /// A feature kind the output format cannot represent was left out.
    UnexportableFeature { kind: String, name: Option<String> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedGeometry { element, reason } => {
                write!(f, "unsupported geometry <{element}>: {reason}")
            }
            Diagnostic::NumericParseFailure { tuple } => {
                write!(f, "dropped unparseable coordinate tuple {tuple:?}")
            }
            Diagnostic::SkippedPlacemark { name: Some(name) } => {
                write!(f, "skipped placemark {name:?} without geometry")
            }
            Diagnostic::SkippedPlacemark { name: None } => {
                write!(f, "skipped unnamed placemark without geometry")
            }
            Diagnostic::UnexportableFeature { kind, name } => match name {
                Some(name) => write!(f, "{kind} {name:?} cannot be exported"),
                None => write!(f, "{kind} cannot be exported"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::MalformedDocument("empty".into()).is_malformed_document());
        assert!(Error::NotAFolder.is_invalid_tree_operation());
        assert!(Error::IndexOutOfRange { index: 3, len: 1 }.is_invalid_tree_operation());
        assert!(!Error::NotAFolder.is_malformed_document());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::NumericParseFailure {
            tuple: "a,b".into(),
        };
        assert_eq!(d.to_string(), "dropped unparseable coordinate tuple \"a,b\"");
    }
}
