//! Signature resolution: the effective attribute schema of a class.
//!
//! A class's signature is every DatatypeProperty and ObjectProperty whose
//! DOMAIN is the class or any of its transitive ancestors. In a DAG the same
//! property can be reached along several paths; it is listed once.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::OntoResult;
use crate::model::{DOMAIN, Label, RANGE};
use crate::store::{EdgePattern, GraphStore};

use super::Ontology;

/// A scalar attribute applicable to a class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatatypePropertyRef {
    pub uri: String,
    pub title: String,
}

/// A relationship applicable to a class, with the class its targets belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPropertyRef {
    pub uri: String,
    pub title: String,
    pub target_class_uri: String,
}

/// Resolved datatype and object properties of a class, own properties first,
/// then inherited ones in breadth-first ancestor order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub datatype_properties: Vec<DatatypePropertyRef>,
    pub object_properties: Vec<ObjectPropertyRef>,
}

impl Signature {
    pub fn datatype(&self, uri: &str) -> Option<&DatatypePropertyRef> {
        self.datatype_properties.iter().find(|p| p.uri == uri)
    }

    pub fn object(&self, uri: &str) -> Option<&ObjectPropertyRef> {
        self.object_properties.iter().find(|p| p.uri == uri)
    }

    /// The nearest object property whose title (the edge relation type) is `title`.
    pub fn object_by_title(&self, title: &str) -> Option<&ObjectPropertyRef> {
        self.object_properties.iter().find(|p| p.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.datatype_properties.is_empty() && self.object_properties.is_empty()
    }
}

impl<S: GraphStore> Ontology<S> {
    /// Resolve the effective signature of a class, including everything it
    /// inherits. Fails with `ClassNotFound` if `class_uri` is not a Class.
    pub fn resolve_signature(&self, class_uri: &str) -> OntoResult<Signature> {
        self.require_class(class_uri)?;

        let mut signature = Signature::default();
        let mut seen: HashSet<String> = HashSet::new();

        for class in self.ancestors_inclusive(class_uri)? {
            let declared = self
                .store
                .match_edges(&EdgePattern::incoming(&class.uri).of_type(DOMAIN))?;
            for edge in declared {
                if seen.contains(&edge.from_uri) {
                    continue;
                }
                let Some(property) = self.store.get_node(&edge.from_uri)? else {
                    continue;
                };
                match property.label {
                    Label::DatatypeProperty => {
                        seen.insert(property.uri.clone());
                        signature.datatype_properties.push(DatatypePropertyRef {
                            title: property.title().to_string(),
                            uri: property.uri,
                        });
                    }
                    Label::ObjectProperty => {
                        // Object properties without a RANGE class are not usable.
                        let Some(range) = self.range_of(&property.uri)? else {
                            continue;
                        };
                        seen.insert(property.uri.clone());
                        signature.object_properties.push(ObjectPropertyRef {
                            title: property.title().to_string(),
                            uri: property.uri,
                            target_class_uri: range,
                        });
                    }
                    _ => {}
                }
            }
        }

        tracing::debug!(
            class = %class_uri,
            datatype = signature.datatype_properties.len(),
            object = signature.object_properties.len(),
            "resolved signature"
        );
        Ok(signature)
    }

    /// The first RANGE target of an object property that is a Class.
    pub(crate) fn range_of(&self, property_uri: &str) -> OntoResult<Option<String>> {
        for edge in self
            .store
            .match_edges(&EdgePattern::outgoing(property_uri).of_type(RANGE))?
        {
            if self.node_with_label(&edge.to_uri, &Label::Class)?.is_some() {
                return Ok(Some(edge.to_uri));
            }
        }
        Ok(None)
    }
}
