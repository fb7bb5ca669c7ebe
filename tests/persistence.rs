//! Persistence and recovery tests for the durable store.
//!
//! These verify that classes, objects, and edges survive a close + reopen
//! cycle, and that edge ids keep increasing across sessions.

use ontograph::config::OntologyConfig;
use ontograph::model::{INSTANCEOF, PropertyValue};
use ontograph::ontology::{ObjectDraft, Ontology, RelationAssignment};
use ontograph::store::{DurableGraphStore, EdgePattern, GraphStore};

fn persistent_ontology(dir: &std::path::Path) -> Ontology<DurableGraphStore> {
    Ontology::open(OntologyConfig {
        data_dir: Some(dir.to_path_buf()),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn ontology_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let (person, age, knows, alice, bob) = {
        let onto = persistent_ontology(dir.path());
        let person = onto.create_class("Person", "", None).unwrap();
        let age = onto.add_datatype_property(&person.uri, "age").unwrap();
        let knows = onto.add_object_property(&person.uri, "knows", &person.uri).unwrap();
        let alice = onto
            .create_object(&person.uri, ObjectDraft::titled("alice").with_property(&age.uri, 30i64))
            .unwrap();
        let bob = onto
            .create_object(
                &person.uri,
                ObjectDraft::titled("bob").with_relation(RelationAssignment::forward(&knows.uri, &alice.uri)),
            )
            .unwrap();
        (person.uri, age.uri, knows.uri, alice.uri, bob.uri)
    };

    let onto = persistent_ontology(dir.path());
    let sig = onto.resolve_signature(&person).unwrap();
    assert!(sig.datatype(&age).is_some());
    assert!(sig.object(&knows).is_some());

    let alice_node = onto.get_object(&alice).unwrap().unwrap();
    assert_eq!(alice_node.title(), "alice");
    assert_eq!(alice_node.properties[&age], PropertyValue::from(30i64));

    let rels = onto.current_relations(&bob).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].other_uri, alice);
    assert_eq!(onto.object_class(&bob).unwrap().unwrap().uri, person);
}

#[test]
fn deletions_survive_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let (parent, child, object) = {
        let onto = persistent_ontology(dir.path());
        let parent = onto.create_class("P", "", None).unwrap();
        let child = onto.create_class("Q", "", Some(&parent.uri)).unwrap();
        let object = onto.create_object(&child.uri, ObjectDraft::titled("o")).unwrap();
        assert!(onto.delete_class(&parent.uri).unwrap());
        (parent.uri, child.uri, object.uri)
    };

    let onto = persistent_ontology(dir.path());
    for uri in [&parent, &child, &object] {
        assert!(onto.get_node(uri).unwrap().is_none());
    }
    let snapshot = onto.graph_snapshot().unwrap();
    assert!(snapshot.nodes.is_empty());
    assert!(snapshot.edges.is_empty());
}

#[test]
fn edge_ids_are_not_reused_after_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    let first_id = {
        let onto = persistent_ontology(dir.path());
        let class = onto.create_class("C", "", None).unwrap();
        let object = onto.create_object(&class.uri, ObjectDraft::titled("o")).unwrap();
        let edge = onto
            .store()
            .match_edges(&EdgePattern::outgoing(&object.uri).of_type(INSTANCEOF))
            .unwrap()
            .remove(0);
        assert!(onto.delete_object(&object.uri).unwrap());
        edge.id
    };

    let onto = persistent_ontology(dir.path());
    let a = onto.create_node("Thing", Default::default()).unwrap();
    let b = onto.create_node("Thing", Default::default()).unwrap();
    let edge = onto.create_edge(&a.uri, &b.uri, "").unwrap();
    assert!(edge.id > first_id);
}
