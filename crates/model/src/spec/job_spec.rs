use serde::{Deserialize, Serialize};

/// Kind of child-to-parent relationship declared on a `Relation`. Purely
/// descriptive for the core: both kinds are discovered and copied the same
/// way, but the distinction is preserved for the benefit of preflight
/// reporting and future cardinality-aware optimizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    #[serde(rename = "1-1")]
    OneToOne,
    #[serde(rename = "1-N")]
    OneToMany,
}

/// One edge in the relation tree: a child table hanging off a parent via a
/// foreign-key column, plus any further children of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub table: String,
    pub primary_key: String,
    pub foreign_key: String,
    pub dependency_type: DependencyKind,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Relation {
    /// Flattens this relation and its descendants into `(parent, relation)`
    /// pairs, depth-first, for graph construction.
    pub fn flatten<'a>(&'a self, parent: &'a str) -> Vec<(&'a str, &'a Relation)> {
        let mut out = vec![(parent, self)];
        for child in &self.relations {
            out.extend(child.flatten(&self.table));
        }
        out
    }
}

/// Immutable description of one archive job: the root table, how to select
/// its rows, and the tree of tables that hang off it transitively. Parsed
/// once from external configuration and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub root_table: String,
    pub primary_key: String,
    #[serde(rename = "where", default)]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl JobSpec {
    pub fn new(root_table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        JobSpec {
            root_table: root_table.into(),
            primary_key: primary_key.into(),
            where_clause: None,
            relations: Vec::new(),
        }
    }

    pub fn with_where(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// All `(parent_table, relation)` pairs in the tree, depth-first, rooted
    /// at `root_table`.
    pub fn flatten(&self) -> Vec<(&str, &Relation)> {
        self.relations
            .iter()
            .flat_map(|r| r.flatten(self.root_table.as_str()))
            .collect()
    }

    pub fn predicate_or_default(&self) -> &str {
        self.where_clause.as_deref().unwrap_or("1=1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_walks_nested_relations_depth_first() {
        let spec = JobSpec::new("customers", "id").with_relation(Relation {
            table: "orders".into(),
            primary_key: "id".into(),
            foreign_key: "customer_id".into(),
            dependency_type: DependencyKind::OneToMany,
            relations: vec![Relation {
                table: "order_items".into(),
                primary_key: "id".into(),
                foreign_key: "order_id".into(),
                dependency_type: DependencyKind::OneToMany,
                relations: vec![],
            }],
        });

        let flat = spec.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].0, "customers");
        assert_eq!(flat[0].1.table, "orders");
        assert_eq!(flat[1].0, "orders");
        assert_eq!(flat[1].1.table, "order_items");
    }

    #[test]
    fn predicate_or_default_falls_back_to_tautology() {
        let spec = JobSpec::new("customers", "id");
        assert_eq!(spec.predicate_or_default(), "1=1");
    }
}
