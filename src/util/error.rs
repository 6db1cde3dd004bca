//! Error types for the classio library.

use thiserror::Error;

use crate::codec;
use crate::pack;

/// Errors raised while decorating a type, before any file is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// An explicit codec does not advertise the save/load protocol
    #[error("Codec {codec} given for {attribute} does not implement {missing}")]
    ProtocolViolation {
        attribute: String,
        codec: String,
        missing: String,
    },

    /// An attribute was declared without a type annotation
    #[error("Missing type hint for attribute {attribute}")]
    MissingTypeHint { attribute: String },

    /// An attribute is annotated with a union of types
    #[error("Union type annotations are not supported (attribute {attribute}: {annotation})")]
    UnsupportedUnionType { attribute: String, annotation: String },

    /// Explicit codecs were given for names that are not attributes
    #[error("Invalid keys in io_modules: {}", .keys.join(", "))]
    InvalidAttributeKey { keys: Vec<String> },

    /// An attribute name cannot name an archive entry
    #[error("Invalid attribute name {0:?}: names must be non-empty and free of NUL bytes")]
    InvalidAttributeName(String),

    /// The same attribute name was declared twice
    #[error("Attribute {0} is declared more than once")]
    DuplicateAttribute(String),

    /// No explicit codec and no inference rule matched
    #[error("No IO codec provided or inferred for {attribute}: {annotation}")]
    UnresolvedCodec { attribute: String, annotation: String },
}

/// Main error type for classio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Decoration failed
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// The archive could not be written or read
    #[error(transparent)]
    Archive(#[from] pack::Error),

    /// An attribute codec failed
    #[error(transparent)]
    Codec(#[from] codec::Error),

    /// A record lacks a value for a declared attribute
    #[error("No value for attribute {0}")]
    MissingValue(String),

    /// A value does not have the shape its attribute type expects
    #[error("Type mismatch: expected {expected}, got {actual}")]
    ValueMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Archive(pack::Error::Io(err))
    }
}

/// Result type alias for classio operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = DeclarationError::InvalidAttributeKey {
            keys: vec!["nonexistent".into(), "other".into()],
        };
        assert_eq!(e.to_string(), "Invalid keys in io_modules: nonexistent, other");

        let e = DeclarationError::UnresolvedCodec {
            attribute: "widget".into(),
            annotation: "Widget".into(),
        };
        assert!(e.to_string().contains("widget"));
        assert!(e.to_string().contains("Widget"));
    }

    #[test]
    fn test_error_from_layers() {
        let err: Error = pack::Error::EntryNotFound("df".into()).into();
        assert!(matches!(err, Error::Archive(pack::Error::EntryNotFound(_))));
        assert_eq!(err.to_string(), "Entry not found: df");

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Archive(pack::Error::Io(_))));

        let err: Error = DeclarationError::MissingTypeHint { attribute: "x".into() }.into();
        assert!(matches!(err, Error::Declaration(_)));
    }
}
