//! End-to-end tests for the ontology engine.
//!
//! These exercise the public API over the in-memory store: inheritance,
//! validation, relationship reconciliation, and cascading deletion working
//! together on small but realistic class hierarchies.

use std::collections::HashSet;

use ontograph::config::OntologyConfig;
use ontograph::error::{OntoError, ValidationError};
use ontograph::model::{Edge, INSTANCEOF, Label, PropertyMap, PropertyValue, SUBCLASSOF};
use ontograph::ontology::{ObjectDraft, ObjectPatch, Ontology, RelationAssignment};
use ontograph::store::MemGraphStore;
use ontograph::uri::SequentialUriGenerator;

fn test_ontology() -> Ontology<MemGraphStore> {
    Ontology::in_memory(OntologyConfig {
        namespace: "it".into(),
        ..Default::default()
    })
    .unwrap()
    .with_uri_generator(SequentialUriGenerator::new())
}

fn datatype_uris(onto: &Ontology<MemGraphStore>, class_uri: &str) -> Vec<String> {
    onto.resolve_signature(class_uri)
        .unwrap()
        .datatype_properties
        .into_iter()
        .map(|p| p.uri)
        .collect()
}

fn relation_edges(onto: &Ontology<MemGraphStore>) -> HashSet<(String, String, String)> {
    onto.graph_snapshot()
        .unwrap()
        .edges
        .into_iter()
        .filter(|e: &Edge| e.rel_type != INSTANCEOF && e.rel_type != SUBCLASSOF)
        .filter(|e| e.rel_type != "DOMAIN" && e.rel_type != "RANGE")
        .map(|e| (e.rel_type, e.from_uri, e.to_uri))
        .collect()
}

#[test]
fn inheritance_closure_follows_parent_edges() {
    let onto = test_ontology();
    let c = onto.create_class("C", "", None).unwrap();
    let b = onto.create_class("B", "", Some(&c.uri)).unwrap();
    let a = onto.create_class("A", "", Some(&b.uri)).unwrap();
    let on_c = onto.add_datatype_property(&c.uri, "fromC").unwrap();

    assert!(datatype_uris(&onto, &a.uri).contains(&on_c.uri));

    assert!(onto.remove_class_parent(&c.uri, &b.uri).unwrap());
    assert!(!datatype_uris(&onto, &a.uri).contains(&on_c.uri));
    assert!(!datatype_uris(&onto, &b.uri).contains(&on_c.uri));
    assert!(datatype_uris(&onto, &c.uri).contains(&on_c.uri));
}

#[test]
fn diamond_inheritance_lists_property_once() {
    let onto = test_ontology();
    let d = onto.create_class("D", "", None).unwrap();
    let b = onto.create_class("B", "", Some(&d.uri)).unwrap();
    let c = onto.create_class("C", "", Some(&d.uri)).unwrap();
    let a = onto.create_class("A", "", Some(&b.uri)).unwrap();
    onto.add_class_parent(&c.uri, &a.uri).unwrap();
    let on_d = onto.add_datatype_property(&d.uri, "fromD").unwrap();

    let uris = datatype_uris(&onto, &a.uri);
    assert_eq!(uris.iter().filter(|u| **u == on_d.uri).count(), 1);
    assert_eq!(uris.len(), 1);

    let ancestors: Vec<String> = onto
        .ancestors_inclusive(&a.uri)
        .unwrap()
        .into_iter()
        .map(|n| n.uri)
        .collect();
    assert_eq!(ancestors.len(), 4);
    assert_eq!(ancestors[0], a.uri);
    assert_eq!(ancestors[3], d.uri);
}

#[test]
fn cyclic_hierarchy_terminates() {
    let onto = test_ontology();
    let a = onto.create_class("A", "", None).unwrap();
    let b = onto.create_class("B", "", Some(&a.uri)).unwrap();
    onto.add_class_parent(&b.uri, &a.uri).unwrap();
    let on_a = onto.add_datatype_property(&a.uri, "fromA").unwrap();
    let on_b = onto.add_datatype_property(&b.uri, "fromB").unwrap();

    let uris: HashSet<String> = datatype_uris(&onto, &a.uri).into_iter().collect();
    assert_eq!(uris, HashSet::from([on_a.uri, on_b.uri]));
    assert_eq!(onto.descendants_inclusive(&a.uri).unwrap().len(), 2);
}

#[test]
fn validation_rejects_unknown_key_without_creating() {
    let onto = test_ontology();
    let a = onto.create_class("A", "", None).unwrap();
    onto.add_datatype_property(&a.uri, "known").unwrap();
    let nodes_before = onto.graph_snapshot().unwrap().nodes.len();

    let err = onto
        .create_object(&a.uri, ObjectDraft::titled("x").with_property("unknown", 1i64))
        .unwrap_err();
    assert!(matches!(
        err,
        OntoError::Validation(ValidationError::UnknownProperty { ref key }) if key == "unknown"
    ));
    assert_eq!(onto.graph_snapshot().unwrap().nodes.len(), nodes_before);
    assert!(onto.class_objects(&a.uri).unwrap().is_empty());
}

#[test]
fn inherited_properties_validate_on_subclass_objects() {
    let onto = test_ontology();
    let animal = onto.create_class("Animal", "", None).unwrap();
    let dog = onto.create_class("Dog", "", Some(&animal.uri)).unwrap();
    let legs = onto.add_datatype_property(&animal.uri, "legs").unwrap();

    let rex = onto
        .create_object(&dog.uri, ObjectDraft::titled("rex").with_property(&legs.uri, 4i64))
        .unwrap();
    assert_eq!(rex.properties[&legs.uri], PropertyValue::from(4i64));
}

#[test]
fn reconciliation_is_idempotent() {
    let onto = test_ontology();
    let person = onto.create_class("Person", "", None).unwrap();
    let knows = onto.add_object_property(&person.uri, "knows", &person.uri).unwrap();
    let me = onto.create_object(&person.uri, ObjectDraft::titled("me")).unwrap();
    let alice = onto.create_object(&person.uri, ObjectDraft::titled("alice")).unwrap();
    let bob = onto.create_object(&person.uri, ObjectDraft::titled("bob")).unwrap();

    let patch = || ObjectPatch {
        relations: Some(vec![
            RelationAssignment::forward(&knows.uri, &alice.uri),
            RelationAssignment::reverse(&knows.uri, &bob.uri),
        ]),
        ..Default::default()
    };

    let first = onto.update_object(&me.uri, patch()).unwrap();
    assert_eq!(first.report.created.len(), 2);
    let edges_after_first = relation_edges(&onto);

    let second = onto.update_object(&me.uri, patch()).unwrap();
    assert!(second.report.created.is_empty());
    assert!(second.report.deleted.is_empty());
    assert_eq!(relation_edges(&onto), edges_after_first);
}

#[test]
fn reconciliation_is_minimal() {
    let onto = test_ontology();
    let person = onto.create_class("Person", "", None).unwrap();
    let r1 = onto.add_object_property(&person.uri, "r1", &person.uri).unwrap();
    let r2 = onto.add_object_property(&person.uri, "r2", &person.uri).unwrap();
    let t1 = onto.create_object(&person.uri, ObjectDraft::titled("t1")).unwrap();
    let t2 = onto.create_object(&person.uri, ObjectDraft::titled("t2")).unwrap();
    let me = onto
        .create_object(
            &person.uri,
            ObjectDraft::titled("me").with_relation(RelationAssignment::forward(&r1.uri, &t1.uri)),
        )
        .unwrap();

    let update = onto
        .update_object(
            &me.uri,
            ObjectPatch {
                relations: Some(vec![
                    RelationAssignment::forward(&r1.uri, &t1.uri),
                    RelationAssignment::reverse(&r2.uri, &t2.uri),
                ]),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(update.report.created.len(), 1);
    assert!(update.report.deleted.is_empty());
    let created = &update.report.created[0];
    assert_eq!(created.rel_type, "r2");
    assert_eq!(created.from_uri, t2.uri);
    assert_eq!(created.to_uri, me.uri);
}

#[test]
fn cascade_removes_subtree_without_dangling_edges() {
    let onto = test_ontology();
    let p = onto.create_class("P", "", None).unwrap();
    let q = onto.create_class("Q", "", Some(&p.uri)).unwrap();
    let o = onto.create_object(&q.uri, ObjectDraft::titled("o")).unwrap();

    assert!(onto.delete_class(&p.uri).unwrap());

    for uri in [&p.uri, &q.uri, &o.uri] {
        assert!(onto.get_node(uri).unwrap().is_none());
    }
    let snapshot = onto.graph_snapshot().unwrap();
    assert!(
        snapshot
            .edges
            .iter()
            .all(|e| e.rel_type != INSTANCEOF && e.rel_type != SUBCLASSOF)
    );
    assert!(!onto.delete_class(&p.uri).unwrap());
    assert!(!onto.delete_class("http://it.com/missing").unwrap());
}

#[test]
fn node_round_trip_preserves_properties() {
    let onto = test_ontology();
    let mut props = PropertyMap::new();
    props.insert("a".into(), PropertyValue::from(1i64));
    props.insert("b".into(), PropertyValue::from("x"));

    let node = onto.create_node("Thing", props.clone()).unwrap();
    let fetched = onto.get_node(&node.uri).unwrap().unwrap();
    assert_eq!(fetched.properties, props);
    assert_eq!(fetched.label, Label::Custom("Thing".into()));
}

#[test]
fn range_enforcement_is_opt_in() {
    let strict = Ontology::in_memory(OntologyConfig {
        namespace: "strict".into(),
        enforce_range: true,
        ..Default::default()
    })
    .unwrap();
    let person = strict.create_class("Person", "", None).unwrap();
    let city = strict.create_class("City", "", None).unwrap();
    let lives_in = strict.add_object_property(&person.uri, "livesIn", &city.uri).unwrap();
    let bob = strict.create_object(&person.uri, ObjectDraft::titled("bob")).unwrap();

    let err = strict
        .create_object(
            &person.uri,
            ObjectDraft::titled("alice").with_relation(RelationAssignment::forward(&lives_in.uri, &bob.uri)),
        )
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(strict.class_objects(&person.uri).unwrap().len(), 1);
}
