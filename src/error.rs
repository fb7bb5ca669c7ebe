//! Rich diagnostic error types for the ontograph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for the ontograph engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum OntoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl OntoError {
    /// Whether this error reports a missing class, object, node, or property.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OntoError::Ontology(
                OntologyError::ClassNotFound { .. }
                    | OntologyError::ObjectNotFound { .. }
                    | OntologyError::NodeNotFound { .. }
                    | OntologyError::PropertyNotFound { .. }
            )
        )
    }

    /// Whether this error was raised before any mutation by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, OntoError::Validation(_))
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(onto::store::io),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(onto::store::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption — try running with a fresh data directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(onto::store::serde),
        help(
            "Failed to serialize or deserialize a stored node or edge. \
             This usually means the on-disk format changed between versions."
        )
    )]
    Serialization { message: String },

    #[error("a node with uri {uri} already exists")]
    #[diagnostic(
        code(onto::store::duplicate_uri),
        help("URIs are unique across the whole graph regardless of label. Omit the uri to generate a fresh one.")
    )]
    DuplicateUri { uri: String },

    #[error("cannot create {rel_type} edge: endpoint {uri} does not exist")]
    #[diagnostic(
        code(onto::store::endpoint_missing),
        help("Both endpoints of an edge must exist before the edge is created.")
    )]
    EndpointMissing { rel_type: String, uri: String },

    #[error("store returned no result for {operation}")]
    #[diagnostic(
        code(onto::store::no_result),
        help("The graph is in a state the operation did not expect. Inspect the node's edges.")
    )]
    NoResult { operation: String },

    #[error("graph lock poisoned")]
    #[diagnostic(
        code(onto::store::poisoned),
        help("A thread panicked while holding the graph lock. Restart the process.")
    )]
    LockPoisoned,
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("unknown property {key}")]
    #[diagnostic(
        code(onto::validate::unknown_property),
        help(
            "Property keys must be the uri of a DatatypeProperty declared on the \
             object's class or one of its ancestors. Run `ontograph class signature` to list them."
        )
    )]
    UnknownProperty { key: String },

    #[error("unknown object property {relation_uri}")]
    #[diagnostic(
        code(onto::validate::unknown_relation),
        help(
            "Relation keys must be the uri of an ObjectProperty declared on the \
             object's class or one of its ancestors."
        )
    )]
    UnknownRelation { relation_uri: String },

    #[error("target object not found: {target_uri}")]
    #[diagnostic(
        code(onto::validate::target_not_found),
        help("Create the target object first, or fix the target uri.")
    )]
    TargetNotFound { target_uri: String },

    #[error("target {target_uri} is not an instance of range class {range_uri}")]
    #[diagnostic(
        code(onto::validate::target_out_of_range),
        help(
            "With `enforce_range` enabled, relationship targets must be objects of the \
             property's RANGE class or one of its subclasses."
        )
    )]
    TargetOutOfRange {
        target_uri: String,
        range_uri: String,
    },

    #[error("label is required")]
    #[diagnostic(
        code(onto::validate::missing_label),
        help("Every node carries exactly one non-empty label.")
    )]
    MissingLabel,

    #[error("property {key} is immutable")]
    #[diagnostic(
        code(onto::validate::immutable_key),
        help("`uri` and `label` are fixed at creation time and cannot be updated.")
    )]
    ImmutableKey { key: String },
}

// ---------------------------------------------------------------------------
// Ontology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("class not found: {uri}")]
    #[diagnostic(
        code(onto::ontology::class_not_found),
        help("No node with this uri carries the Class label. List classes with `ontograph class list`.")
    )]
    ClassNotFound { uri: String },

    #[error("object not found: {uri}")]
    #[diagnostic(
        code(onto::ontology::object_not_found),
        help("No node with this uri carries the Object label.")
    )]
    ObjectNotFound { uri: String },

    #[error("node not found: {uri}")]
    #[diagnostic(code(onto::ontology::node_not_found), help("Check the uri."))]
    NodeNotFound { uri: String },

    #[error("property not found: {uri}")]
    #[diagnostic(
        code(onto::ontology::property_not_found),
        help("No DatatypeProperty or ObjectProperty node has this uri.")
    )]
    PropertyNotFound { uri: String },
}

/// Convenience alias for functions returning ontograph results.
pub type OntoResult<T> = std::result::Result<T, OntoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_onto_error() {
        let err = StoreError::NoResult {
            operation: "object class".into(),
        };
        let onto: OntoError = err.into();
        assert!(matches!(onto, OntoError::Store(StoreError::NoResult { .. })));
    }

    #[test]
    fn not_found_classification() {
        let err: OntoError = OntologyError::ClassNotFound { uri: "x".into() }.into();
        assert!(err.is_not_found());
        assert!(!err.is_validation());

        let err: OntoError = ValidationError::UnknownProperty { key: "k".into() }.into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ValidationError::TargetOutOfRange {
            target_uri: "http://ontology.com/t".into(),
            range_uri: "http://ontology.com/r".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("http://ontology.com/t"));
        assert!(msg.contains("http://ontology.com/r"));
    }
}
