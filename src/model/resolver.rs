//! Dependency resolution over the model universe.
//!
//! Builds the reference graph, marks models on cycles, produces a
//! deterministic most-dependent-first ordering, and rewrites cyclic
//! references into deferred ones so the emitter can break the cycles.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::model::types::{ModelDefinition, TypeDescriptor};

/// The resolved shape of the universe: edges, cycle members and order.
#[derive(Debug)]
pub struct Resolution {
    /// `name -> models it references` (only edges to known models).
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Models participating in at least one reference cycle.
    pub cyclic: BTreeSet<String>,
    /// Every model exactly once, dependents before their dependencies.
    /// Cycle leftovers come last in sorted order.
    pub order: Vec<String>,
}

/// Resolve the universe and rewrite cyclic references in place.
pub fn resolve(
    models: &mut BTreeMap<String, ModelDefinition>,
    warnings: &mut Vec<String>,
) -> Resolution {
    let dependencies = build_graph(models);
    let cyclic = detect_cycles(&dependencies);
    if !cyclic.is_empty() {
        let names: Vec<_> = cyclic.iter().cloned().collect();
        warnings.push(format!(
            "circular references detected among: {}",
            names.join(", ")
        ));
        warn!(models = ?names, "circular references detected");
    }
    let order = topological_order(&dependencies, warnings);
    break_cycles(models, &cyclic);
    debug!(
        models = order.len(),
        cyclic = cyclic.len(),
        "dependency resolution complete"
    );
    Resolution {
        dependencies,
        cyclic,
        order,
    }
}

/// Edges from each model to the known models it references. Every model is
/// keyed even when it has no outgoing edges; references to names outside the
/// universe are dropped.
fn build_graph(models: &BTreeMap<String, ModelDefinition>) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph = BTreeMap::new();
    for (name, model) in models {
        let deps: BTreeSet<String> = model
            .references()
            .into_iter()
            .filter(|dep| dep != name && models.contains_key(dep))
            .collect();
        graph.insert(name.clone(), deps);
    }
    // Self-references are still cycles even though they are not graph edges.
    for (name, model) in models {
        if model.references().contains(name) {
            if let Some(deps) = graph.get_mut(name) {
                deps.insert(name.clone());
            }
        }
    }
    graph
}

/// Depth-first search with an explicit path stack; every node on the path
/// segment that closes a cycle is marked.
fn detect_cycles(graph: &BTreeMap<String, BTreeSet<String>>) -> BTreeSet<String> {
    let mut visited = BTreeSet::new();
    let mut cyclic = BTreeSet::new();
    let mut path = Vec::new();

    for node in graph.keys() {
        visit(node, graph, &mut visited, &mut path, &mut cyclic);
    }
    cyclic
}

fn visit(
    node: &str,
    graph: &BTreeMap<String, BTreeSet<String>>,
    visited: &mut BTreeSet<String>,
    path: &mut Vec<String>,
    cyclic: &mut BTreeSet<String>,
) {
    if let Some(pos) = path.iter().position(|n| n == node) {
        for member in &path[pos..] {
            cyclic.insert(member.clone());
        }
        return;
    }
    if visited.contains(node) {
        return;
    }
    visited.insert(node.to_string());
    path.push(node.to_string());
    if let Some(deps) = graph.get(node) {
        for dep in deps {
            visit(dep, graph, visited, path, cyclic);
        }
    }
    path.pop();
}

/// Kahn's algorithm with a sorted ready queue. In-degree counts dependents,
/// so models nobody depends on come first and shared leaves come last.
/// Models stranded by cycles are appended in sorted order.
fn topological_order(
    graph: &BTreeMap<String, BTreeSet<String>>,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let mut in_degree: BTreeMap<&str, usize> = graph.keys().map(|n| (n.as_str(), 0)).collect();
    for deps in graph.values() {
        for dep in deps {
            if let Some(count) = in_degree.get_mut(dep.as_str()) {
                *count += 1;
            }
        }
    }

    let mut queue: Vec<&str> = in_degree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while !queue.is_empty() {
        queue.sort_unstable();
        let node = queue.remove(0);
        order.push(node.to_string());
        if let Some(deps) = graph.get(node) {
            for dep in deps {
                if let Some(count) = in_degree.get_mut(dep.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push(dep);
                    }
                }
            }
        }
    }

    if order.len() < graph.len() {
        let mut leftover: Vec<String> = graph
            .keys()
            .filter(|name| !order.contains(*name))
            .cloned()
            .collect();
        leftover.sort_unstable();
        warnings.push(format!(
            "cyclic models appended to ordering: {}",
            leftover.join(", ")
        ));
        order.extend(leftover);
    }
    order
}

/// Rewrite references between cycle members into deferred references.
fn break_cycles(models: &mut BTreeMap<String, ModelDefinition>, cyclic: &BTreeSet<String>) {
    for name in cyclic {
        let Some(model) = models.get_mut(name) else {
            continue;
        };
        for field in &mut model.fields {
            defer(&mut field.ty, cyclic);
        }
        if let Some(root) = &mut model.root {
            defer(root, cyclic);
        }
    }
}

fn defer(ty: &mut TypeDescriptor, cyclic: &BTreeSet<String>) {
    match ty {
        TypeDescriptor::Reference(name) if cyclic.contains(name) => {
            *ty = TypeDescriptor::Deferred(name.clone());
        }
        TypeDescriptor::List(inner) => defer(inner, cyclic),
        TypeDescriptor::Map(key, value) => {
            defer(key, cyclic);
            defer(value, cyclic);
        }
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::types::{FieldDefinition, Primitive};

    fn object(name: &str, refs: &[&str]) -> ModelDefinition {
        let fields = refs
            .iter()
            .map(|r| FieldDefinition {
                source_name: r.to_lowercase(),
                name: r.to_lowercase(),
                ty: TypeDescriptor::Reference((*r).to_string()),
                alias: None,
                required: false,
            })
            .collect();
        ModelDefinition::object(name, fields)
    }

    fn scalar(name: &str) -> ModelDefinition {
        ModelDefinition::object(
            name,
            vec![FieldDefinition {
                source_name: "id".into(),
                name: "id".into(),
                ty: TypeDescriptor::Primitive(Primitive::Str),
                alias: None,
                required: false,
            }],
        )
    }

    fn universe(models: Vec<ModelDefinition>) -> BTreeMap<String, ModelDefinition> {
        models.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn test_acyclic_order_dependents_first() {
        let mut models = universe(vec![
            object("Line", &["Mode", "Crowding"]),
            object("Mode", &["Crowding"]),
            scalar("Crowding"),
        ]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        assert!(warnings.is_empty());
        assert!(res.cyclic.is_empty());
        assert_eq!(res.order, vec!["Line", "Mode", "Crowding"]);
    }

    #[test]
    fn test_order_is_deterministic_for_siblings() {
        let build = || {
            let mut models = universe(vec![scalar("Zeta"), scalar("Alpha"), scalar("Mid")]);
            let mut warnings = Vec::new();
            resolve(&mut models, &mut warnings).order
        };
        let order = build();
        assert_eq!(order, vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(order, build());
    }

    #[test]
    fn test_two_cycle_marks_both_and_defers_both() {
        let mut models = universe(vec![object("Foo", &["Bar"]), object("Bar", &["Foo"])]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        assert_eq!(
            res.cyclic.iter().cloned().collect::<Vec<_>>(),
            vec!["Bar", "Foo"]
        );
        assert_eq!(res.order.len(), 2);
        assert_eq!(
            models["Foo"].fields[0].ty,
            TypeDescriptor::Deferred("Bar".into())
        );
        assert_eq!(
            models["Bar"].fields[0].ty,
            TypeDescriptor::Deferred("Foo".into())
        );
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut models = universe(vec![object("Node", &["Node"])]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        assert!(res.cyclic.contains("Node"));
        assert_eq!(
            models["Node"].fields[0].ty,
            TypeDescriptor::Deferred("Node".into())
        );
    }

    #[test]
    fn test_cycle_does_not_defer_edges_out_of_the_cycle() {
        let mut models = universe(vec![
            object("Foo", &["Bar", "Leaf"]),
            object("Bar", &["Foo"]),
            scalar("Leaf"),
        ]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        assert!(!res.cyclic.contains("Leaf"));
        let leaf_field = models["Foo"]
            .fields
            .iter()
            .find(|f| f.name == "leaf")
            .unwrap();
        assert_eq!(leaf_field.ty, TypeDescriptor::Reference("Leaf".into()));
    }

    #[test]
    fn test_unknown_references_are_dropped_from_graph() {
        let mut models = universe(vec![object("Line", &["Phantom"])]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        assert!(res.dependencies["Line"].is_empty());
        assert_eq!(res.order, vec!["Line"]);
    }

    #[test]
    fn test_every_model_appears_exactly_once() {
        let mut models = universe(vec![
            object("A", &["B"]),
            object("B", &["A"]),
            object("C", &["A"]),
            scalar("D"),
        ]);
        let mut warnings = Vec::new();
        let res = resolve(&mut models, &mut warnings);
        let mut sorted = res.order.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert_eq!(res.order.len(), 4);
    }
}
