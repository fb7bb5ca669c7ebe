//! Instance validation against a resolved signature.
//!
//! Validation never mutates the graph. Object creation and update run every
//! check here before their first write.

use crate::error::{OntoResult, ValidationError};
use crate::model::{INSTANCEOF, Label, PropertyMap};
use crate::store::{EdgePattern, GraphStore};

use super::signature::Signature;
use super::{Direction, Ontology, RelationAssignment};

/// A relationship that passed validation, carrying the edge relation type
/// (the ObjectProperty's title) it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidRelation {
    pub relation_uri: String,
    pub rel_type: String,
    pub target_uri: String,
    pub direction: Direction,
}

impl ValidRelation {
    /// `(from, to)` of the edge for an object at `object_uri`.
    pub fn endpoints<'a>(&'a self, object_uri: &'a str) -> (&'a str, &'a str) {
        match self.direction {
            Direction::Forward => (object_uri, self.target_uri.as_str()),
            Direction::Reverse => (self.target_uri.as_str(), object_uri),
        }
    }
}

/// Every key must be the uri of a DatatypeProperty in the signature.
pub fn check_properties(signature: &Signature, properties: &PropertyMap) -> Result<(), ValidationError> {
    match properties.keys().find(|key| signature.datatype(key).is_none()) {
        Some(key) => Err(ValidationError::UnknownProperty { key: key.clone() }),
        None => Ok(()),
    }
}

impl<S: GraphStore> Ontology<S> {
    /// Check a property map against the signature of `class_uri`.
    pub fn validate_properties(&self, class_uri: &str, properties: &PropertyMap) -> OntoResult<()> {
        let signature = self.resolve_signature(class_uri)?;
        Ok(check_properties(&signature, properties)?)
    }

    /// Check relationship assignments against the signature of `class_uri`.
    pub fn validate_object_properties(
        &self,
        class_uri: &str,
        relations: &[RelationAssignment],
    ) -> OntoResult<Vec<ValidRelation>> {
        let signature = self.resolve_signature(class_uri)?;
        self.check_relations(&signature, relations)
    }

    pub(crate) fn check_relations(
        &self,
        signature: &Signature,
        relations: &[RelationAssignment],
    ) -> OntoResult<Vec<ValidRelation>> {
        let mut valid = Vec::with_capacity(relations.len());
        for rel in relations {
            let property = signature.object(&rel.relation_uri).ok_or_else(|| {
                ValidationError::UnknownRelation {
                    relation_uri: rel.relation_uri.clone(),
                }
            })?;
            let Some(target) = self.store.get_node(&rel.target_uri)? else {
                return Err(ValidationError::TargetNotFound {
                    target_uri: rel.target_uri.clone(),
                }
                .into());
            };
            if self.config.enforce_range
                && !self.is_instance_within(&target.uri, &target.label, &property.target_class_uri)?
            {
                return Err(ValidationError::TargetOutOfRange {
                    target_uri: target.uri,
                    range_uri: property.target_class_uri.clone(),
                }
                .into());
            }
            valid.push(ValidRelation {
                relation_uri: rel.relation_uri.clone(),
                rel_type: property.title.clone(),
                target_uri: rel.target_uri.clone(),
                direction: rel.direction,
            });
        }
        Ok(valid)
    }

    /// Whether an object is an instance of `range_uri` or of one of its subclasses.
    fn is_instance_within(&self, uri: &str, label: &Label, range_uri: &str) -> OntoResult<bool> {
        if label != &Label::Object {
            return Ok(false);
        }
        for edge in self
            .store
            .match_edges(&EdgePattern::outgoing(uri).of_type(INSTANCEOF))?
        {
            if self.is_subclass_of(&edge.to_uri, range_uri)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
