//! Error types for the annotation library.
//!
//! Every fallible operation returns [`Result`]. Documented incapabilities
//! (for example regenerating the appearance of a popup) are reported as
//! `Ok(false)` rather than as an error, and lookups that can legitimately
//! find nothing return `Option`.

use crate::annotation_types::AnnotationKind;
use crate::annotations::AnnotId;

/// Result type alias for annotation library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while editing annotations.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A parameter was outside its documented domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The operation is not supported for this kind of annotation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The handle refers to an annotation that has been removed from its page
    #[error("Annotation handle {0} has been invalidated")]
    InvalidatedHandle(AnnotId),

    /// The handle was issued by a different page
    #[error("Annotation handle belongs to a different page")]
    ForeignHandle,

    /// A markup-only operation was invoked on a non-markup annotation
    #[error("Annotation of kind {0:?} is not a markup annotation")]
    NotMarkup(AnnotationKind),

    /// The configured capabilities do not grant the requested module
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// A required dictionary entry is absent
    #[error("Missing required key: /{0}")]
    MissingKey(String),

    /// A date string could not be parsed
    #[error("Invalid date string: {0}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_error() {
        let err = Error::InvalidParameter("group needs at least two members".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid parameter"));
        assert!(msg.contains("two members"));
    }

    #[test]
    fn test_not_markup_error() {
        let err = Error::NotMarkup(AnnotationKind::Link);
        assert!(format!("{}", err).contains("Link"));
    }

    #[test]
    fn test_invalid_object_type_error() {
        let err = Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: "Integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Dictionary"));
        assert!(msg.contains("Integer"));
    }

    #[test]
    fn test_missing_key_error() {
        let err = Error::MissingKey("Subtype".to_string());
        assert_eq!(format!("{}", err), "Missing required key: /Subtype");
    }

    #[test]
    fn test_missing_capability_error() {
        let err = Error::MissingCapability("redaction".to_string());
        assert!(format!("{}", err).contains("redaction"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
