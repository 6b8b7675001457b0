//! Dependent closure and propagation order over the dependency edge table

use crate::error::{CatalogError, Result};
use crate::store::DependencyEdge;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Every parameter that depends on `name`, directly or transitively.
///
/// Breadth-first over the edge list: each round collects the consumers of the
/// previous round's names and stops once a round adds nothing new. `name`
/// itself is never part of the result, even on a cyclic graph.
pub fn find_dependents(edges: &[DependencyEdge], name: &str) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut frontier: BTreeSet<&str> = BTreeSet::new();
    frontier.insert(name);

    loop {
        let mut next = BTreeSet::new();
        let mut grew = false;

        for edge in edges {
            if frontier.contains(edge.producer.as_str()) {
                next.insert(edge.consumer.as_str());
                if edge.consumer != name && closure.insert(edge.consumer.clone()) {
                    grew = true;
                }
            }
        }

        if !grew {
            break;
        }
        frontier = next;
    }

    closure
}

/// The dependents of `name` ordered so every parameter comes after all of its
/// producers that are themselves dependents of `name`. Ties go by name.
///
/// A cycle among the dependents fails with
/// [`CatalogError::CyclicOrTooDeepDependency`].
pub fn propagation_order(
    edges: &[DependencyEdge],
    name: &str,
    max_depth: usize,
) -> Result<Vec<String>> {
    let closure = find_dependents(edges, name);

    // Producers of each dependent, restricted to the closure
    let mut producers: BTreeMap<&str, BTreeSet<&str>> = closure
        .iter()
        .map(|dependent| (dependent.as_str(), BTreeSet::new()))
        .collect();
    for edge in edges {
        if let Some(set) = producers.get_mut(edge.consumer.as_str()) {
            if closure.contains(&edge.producer) {
                set.insert(edge.producer.as_str());
            }
        }
    }

    // Depth-first over producers with an explicit stack, emitting each node
    // once all of its producers have been emitted
    let no_producers = BTreeSet::new();
    let mut order = Vec::with_capacity(closure.len());
    let mut visited: HashSet<&str> = HashSet::new();
    let mut temp_visited: HashSet<&str> = HashSet::new();

    for dependent in producers.keys() {
        if visited.contains(dependent) {
            continue;
        }

        temp_visited.insert(*dependent);
        let before = producers.get(dependent).unwrap_or(&no_producers);
        let mut stack = vec![(*dependent, before.iter())];

        while let Some((node, pending)) = stack.last_mut() {
            match pending.next() {
                Some(producer) => {
                    if visited.contains(producer) {
                        continue;
                    }
                    if !temp_visited.insert(*producer) {
                        return Err(CatalogError::CyclicOrTooDeepDependency {
                            name: producer.to_string(),
                            max_depth,
                        });
                    }
                    let before = producers.get(producer).unwrap_or(&no_producers);
                    stack.push((*producer, before.iter()));
                }
                None => {
                    let node = *node;
                    stack.pop();
                    temp_visited.remove(node);
                    visited.insert(node);
                    order.push(node.to_string());
                }
            }
        }
    }

    Ok(order)
}
