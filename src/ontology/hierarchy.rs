//! Class hierarchy over `SUBCLASSOF` edges.
//!
//! `(child SUBCLASSOF parent)` edges form a DAG (multiple parents allowed).
//! Closures are computed by BFS with a visited set keyed by uri, so they
//! terminate on malformed cyclic hierarchies and list each class once. Any
//! cycle reachable from the start class is reported with a warning.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::OntoResult;
use crate::model::{Label, Node, SUBCLASSOF};
use crate::store::{EdgePattern, GraphStore};

use super::Ontology;

/// Which way a closure walks `SUBCLASSOF` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    /// child → parent
    Up,
    /// parent → child
    Down,
}

impl<S: GraphStore> Ontology<S> {
    /// Direct parents of a class (one SUBCLASSOF hop forward), sorted by uri.
    pub fn parents(&self, class_uri: &str) -> OntoResult<Vec<Node>> {
        self.step(class_uri, Walk::Up)
    }

    /// Direct children of a class (one SUBCLASSOF hop backward), sorted by uri.
    pub fn children(&self, class_uri: &str) -> OntoResult<Vec<Node>> {
        self.step(class_uri, Walk::Down)
    }

    /// Classes with no outgoing SUBCLASSOF edge.
    pub fn root_classes(&self) -> OntoResult<Vec<Node>> {
        let mut roots = Vec::new();
        for class in self.store.find_nodes_by_labels(&[Label::Class])? {
            let up = self
                .store
                .match_edges(&EdgePattern::outgoing(&class.uri).of_type(SUBCLASSOF))?;
            if up.is_empty() {
                roots.push(class);
            }
        }
        Ok(roots)
    }

    /// The class itself plus every transitive parent, nearest first.
    ///
    /// Empty if `class_uri` is not a Class.
    pub fn ancestors_inclusive(&self, class_uri: &str) -> OntoResult<Vec<Node>> {
        self.closure(class_uri, Walk::Up)
    }

    /// The class itself plus every transitive subclass, nearest first.
    ///
    /// Empty if `class_uri` is not a Class.
    pub fn descendants_inclusive(&self, class_uri: &str) -> OntoResult<Vec<Node>> {
        self.closure(class_uri, Walk::Down)
    }

    /// Whether `class_uri` is `ancestor_uri` or one of its transitive subclasses.
    pub fn is_subclass_of(&self, class_uri: &str, ancestor_uri: &str) -> OntoResult<bool> {
        Ok(self
            .ancestors_inclusive(class_uri)?
            .iter()
            .any(|c| c.uri == ancestor_uri))
    }

    fn step(&self, class_uri: &str, walk: Walk) -> OntoResult<Vec<Node>> {
        let edges = match walk {
            Walk::Up => self
                .store
                .match_edges(&EdgePattern::outgoing(class_uri).of_type(SUBCLASSOF))?,
            Walk::Down => self
                .store
                .match_edges(&EdgePattern::incoming(class_uri).of_type(SUBCLASSOF))?,
        };
        let mut neighbors = Vec::new();
        let mut seen = HashSet::new();
        for edge in edges {
            let uri = match walk {
                Walk::Up => edge.to_uri,
                Walk::Down => edge.from_uri,
            };
            if !seen.insert(uri.clone()) {
                continue;
            }
            if let Some(node) = self.node_with_label(&uri, &Label::Class)? {
                neighbors.push(node);
            }
        }
        neighbors.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(neighbors)
    }

    fn closure(&self, class_uri: &str, walk: Walk) -> OntoResult<Vec<Node>> {
        let (nodes, cycles) = self.walk_closure(class_uri, walk)?;
        for members in cycles {
            tracing::warn!(
                class = %class_uri,
                ?walk,
                ?members,
                "SUBCLASSOF cycle detected, ignoring back edges"
            );
        }
        Ok(nodes)
    }

    /// BFS closure plus every cycle met on the way, each as a sorted uri list.
    ///
    /// Traversed edges are recorded in a scratch graph; a strongly connected
    /// component with more than one member, or a self-loop, is a cycle.
    fn walk_closure(&self, class_uri: &str, walk: Walk) -> OntoResult<(Vec<Node>, Vec<Vec<String>>)> {
        let Some(start) = self.node_with_label(class_uri, &Label::Class)? else {
            return Ok((vec![], vec![]));
        };

        let mut walked: DiGraph<String, ()> = DiGraph::new();
        let mut visited: HashMap<String, NodeIndex> = HashMap::new();
        let mut queue: VecDeque<(Node, NodeIndex)> = VecDeque::new();
        let mut result = Vec::new();

        let start_idx = walked.add_node(start.uri.clone());
        visited.insert(start.uri.clone(), start_idx);
        queue.push_back((start, start_idx));

        while let Some((current, current_idx)) = queue.pop_front() {
            for next in self.step(&current.uri, walk)? {
                let known = visited.get(&next.uri).copied();
                let next_idx = match known {
                    Some(idx) => idx,
                    None => {
                        let idx = walked.add_node(next.uri.clone());
                        visited.insert(next.uri.clone(), idx);
                        queue.push_back((next, idx));
                        idx
                    }
                };
                walked.add_edge(current_idx, next_idx, ());
            }
            result.push(current);
        }

        let mut cycles = Vec::new();
        if is_cyclic_directed(&walked) {
            for component in tarjan_scc(&walked) {
                let looped = component.len() > 1 || walked.contains_edge(component[0], component[0]);
                if looped {
                    let mut members: Vec<String> = component.iter().map(|&i| walked[i].clone()).collect();
                    members.sort();
                    cycles.push(members);
                }
            }
            cycles.sort();
        }

        Ok((result, cycles))
    }
}
