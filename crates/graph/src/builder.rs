//! Dependency Graph (§4.1): a DAG of tables built once per job from its
//! `JobSpec`, exposing copy-order (parents first) and delete-order
//! (children first). Pure, in-memory, immutable once built.

use crate::error::GraphError;
use model::{DependencyKind, JobSpec};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Incoming-edge metadata for a non-root node: the FK column on this table,
/// the column it references on the parent, and the declared cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMeta {
    pub fk_column: String,
    pub referenced_column: String,
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub pk_column: String,
    /// `None` only for the root node.
    pub edge_meta: Option<EdgeMeta>,
}

/// The dependency graph for one job: one node per table, directed edges
/// parent -> child. Built once before any I/O and never mutated afterward.
#[derive(Debug, Clone)]
pub struct Graph {
    root: String,
    nodes: HashMap<String, Node>,
    parent_of: HashMap<String, String>,
    children_of: HashMap<String, Vec<String>>,
}

impl Graph {
    /// Builds a graph from a `JobSpec`, validating that the relation tree
    /// normalizes into a DAG: no table appears twice as a child with
    /// conflicting metadata, and (separately, via `has_cycle`) no cycle
    /// exists among the declared edges.
    pub fn build(spec: &JobSpec) -> Result<Self, GraphError> {
        let mut graph = Graph {
            root: spec.root_table.clone(),
            nodes: HashMap::new(),
            parent_of: HashMap::new(),
            children_of: HashMap::new(),
        };

        graph.add_node(
            &spec.root_table,
            &spec.primary_key,
            None,
        )?;

        for (parent, relation) in spec.flatten() {
            let edge_meta = EdgeMeta {
                fk_column: relation.foreign_key.clone(),
                referenced_column: graph
                    .nodes
                    .get(parent)
                    .map(|n| n.pk_column.clone())
                    .ok_or_else(|| {
                        GraphError::InvalidSpec(format!(
                            "relation on '{}' references unknown parent table '{parent}'",
                            relation.table
                        ))
                    })?,
                kind: relation.dependency_type,
            };

            graph.add_node(&relation.table, &relation.primary_key, Some(edge_meta))?;
            graph.add_edge(parent, &relation.table)?;
        }

        if let Some(unprocessed) = graph.has_cycle() {
            return Err(GraphError::CycleDetected(unprocessed));
        }

        Ok(graph)
    }

    /// Registers a table. A table already present must carry identical
    /// metadata — conflicting re-declaration (e.g. same child table under
    /// two parents with different PK/FK columns) is `InvalidSpec`.
    pub fn add_node(
        &mut self,
        name: &str,
        pk_col: &str,
        edge_meta: Option<EdgeMeta>,
    ) -> Result<(), GraphError> {
        let node = Node {
            name: name.to_string(),
            pk_column: pk_col.to_string(),
            edge_meta,
        };

        match self.nodes.get(name) {
            Some(existing) if existing != &node => Err(GraphError::InvalidSpec(format!(
                "table '{name}' declared with conflicting metadata: {existing:?} vs {node:?}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.nodes.insert(name.to_string(), node);
                Ok(())
            }
        }
    }

    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(parent) {
            return Err(GraphError::InvalidSpec(format!(
                "edge references unknown parent table '{parent}'"
            )));
        }
        if !self.nodes.contains_key(child) {
            return Err(GraphError::InvalidSpec(format!(
                "edge references unknown child table '{child}'"
            )));
        }

        match self.parent_of.get(child) {
            Some(existing_parent) if existing_parent != parent => {
                return Err(GraphError::InvalidSpec(format!(
                    "table '{child}' declared under two different parents: '{existing_parent}' and '{parent}'"
                )));
            }
            _ => {}
        }

        self.parent_of.insert(child.to_string(), parent.to_string());
        let children = self.children_of.entry(parent.to_string()).or_default();
        if !children.iter().any(|c| c == child) {
            children.push(child.to_string());
        }
        Ok(())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn children(&self, node: &str) -> &[String] {
        self.children_of.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, node: &str) -> Option<&str> {
        self.parent_of.get(node).map(String::as_str)
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn pk_of(&self, table: &str) -> Option<&str> {
        self.nodes.get(table).map(|n| n.pk_column.as_str())
    }

    pub fn edge_meta(&self, parent: &str, child: &str) -> Option<&EdgeMeta> {
        self.nodes
            .get(child)
            .filter(|n| self.parent_of.get(child).map(String::as_str) == Some(parent))
            .and_then(|n| n.edge_meta.as_ref())
    }

    /// Kahn topological sort, parents strictly before children, ties broken
    /// by lexicographic table name for determinism across runs.
    pub fn copy_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), 0usize))
            .collect();
        for children in self.children_of.values() {
            for child in children {
                *in_degree.get_mut(child.as_str()).unwrap() += 1;
            }
        }

        let mut ready: BTreeSet<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.to_string())
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = ready.iter().next().cloned() {
            ready.remove(&next);
            order.push(next.clone());

            for child in self.children(&next) {
                let degree = in_degree.get_mut(child.as_str()).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(child.clone());
                }
            }
        }

        order
    }

    /// `copy_order` reversed (§4.1, §8.1 order invariant).
    pub fn delete_order(&self) -> Vec<String> {
        let mut order = self.copy_order();
        order.reverse();
        order
    }

    /// Runs Kahn's algorithm; if fewer nodes emerge than were inserted, a
    /// cycle exists among the unprocessed set. Returns `Some(unprocessed)`
    /// on a cycle, `None` if the graph is acyclic.
    pub fn has_cycle(&self) -> Option<Vec<String>> {
        let order = self.copy_order();
        if order.len() == self.nodes.len() {
            return None;
        }

        let processed: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut unprocessed: Vec<String> = self
            .nodes
            .keys()
            .filter(|name| !processed.contains(name.as_str()))
            .cloned()
            .collect();
        unprocessed.sort();
        Some(unprocessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{DependencyKind, Relation};

    fn relation(table: &str, fk: &str, children: Vec<Relation>) -> Relation {
        Relation {
            table: table.to_string(),
            primary_key: "id".to_string(),
            foreign_key: fk.to_string(),
            dependency_type: DependencyKind::OneToMany,
            relations: children,
        }
    }

    #[test]
    fn copy_order_puts_parents_before_children() {
        let spec = JobSpec::new("customers", "id")
            .with_relation(relation("orders", "customer_id", vec![]));
        let graph = Graph::build(&spec).unwrap();

        let copy = graph.copy_order();
        let delete = graph.delete_order();
        assert_eq!(copy, vec!["customers".to_string(), "orders".to_string()]);
        assert_eq!(delete, vec!["orders".to_string(), "customers".to_string()]);
    }

    #[test]
    fn delete_order_is_copy_order_reversed_for_deep_chain() {
        let spec = JobSpec::new("a", "id").with_relation(relation(
            "b",
            "a_id",
            vec![relation("c", "b_id", vec![relation("d", "c_id", vec![])])],
        ));
        let graph = Graph::build(&spec).unwrap();

        let mut copy = graph.copy_order();
        let delete = graph.delete_order();
        copy.reverse();
        assert_eq!(copy, delete);
        assert_eq!(delete.first().unwrap(), "d");
        assert_eq!(delete.last().unwrap(), "a");
    }

    #[test]
    fn ties_break_lexicographically() {
        let spec = JobSpec::new("root", "id")
            .with_relation(relation("zebra", "root_id", vec![]))
            .with_relation(relation("alpha", "root_id", vec![]));
        let graph = Graph::build(&spec).unwrap();

        assert_eq!(
            graph.copy_order(),
            vec!["root".to_string(), "alpha".to_string(), "zebra".to_string()]
        );
    }

    #[test]
    fn conflicting_metadata_for_shared_child_table_is_invalid_spec() {
        let mut graph = Graph {
            root: "root".to_string(),
            nodes: HashMap::new(),
            parent_of: HashMap::new(),
            children_of: HashMap::new(),
        };
        graph.add_node("root", "id", None).unwrap();
        graph.add_node("a", "id", None).unwrap();
        graph.add_node("b", "id", None).unwrap();
        graph
            .add_node(
                "shared",
                "id",
                Some(EdgeMeta {
                    fk_column: "a_id".to_string(),
                    referenced_column: "id".to_string(),
                    kind: DependencyKind::OneToMany,
                }),
            )
            .unwrap();

        let err = graph.add_node(
            "shared",
            "id",
            Some(EdgeMeta {
                fk_column: "b_id".to_string(),
                referenced_column: "id".to_string(),
                kind: DependencyKind::OneToMany,
            }),
        );
        assert!(matches!(err, Err(GraphError::InvalidSpec(_))));
    }

    #[test]
    fn manual_cycle_is_detected_with_unprocessed_nodes_reported() {
        let mut graph = Graph {
            root: "a".to_string(),
            nodes: HashMap::new(),
            parent_of: HashMap::new(),
            children_of: HashMap::new(),
        };
        graph.add_node("a", "id", None).unwrap();
        graph.add_node("b", "id", None).unwrap();
        graph.children_of.insert("a".to_string(), vec!["b".to_string()]);
        graph.children_of.insert("b".to_string(), vec!["a".to_string()]);

        let cycle = graph.has_cycle();
        assert_eq!(cycle, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
