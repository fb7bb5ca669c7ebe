// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # ontograph
//!
//! A property-graph ontology engine: classes arranged in a multiple-inheritance
//! DAG, attributes inherited down that DAG, and instances validated against
//! the resulting signature before they are written.
//!
//! ## Architecture
//!
//! - **Model** (`model`): labeled nodes, typed directed edges, closed property values
//! - **Storage** (`store`): the [`GraphStore`](store::GraphStore) trait, a petgraph
//!   in-memory backend, and a redb write-through backend
//! - **Ontology** (`ontology`): hierarchy closures, signature resolution,
//!   validation, relationship reconciliation, cascading deletion
//! - **Config** (`config`): TOML-backed engine settings
//!
//! ## Library usage
//!
//! ```no_run
//! use ontograph::config::OntologyConfig;
//! use ontograph::ontology::{ObjectDraft, Ontology};
//!
//! let onto = Ontology::in_memory(OntologyConfig::default()).unwrap();
//! let person = onto.create_class("Person", "A human being", None).unwrap();
//! let age = onto.add_datatype_property(&person.uri, "age").unwrap();
//! let bob = onto
//!     .create_object(&person.uri, ObjectDraft::titled("Bob").with_property(&age.uri, 42i64))
//!     .unwrap();
//! assert_eq!(onto.object_class(&bob.uri).unwrap().unwrap().uri, person.uri);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod ontology;
pub mod store;
pub mod uri;
