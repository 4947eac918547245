//! Dependency graph among catalog entries.
//!
//! An edge `A -> B` exists when entry `A` has a child with
//! `componentRef = B`. Generation order puts leaves first: entries are
//! ranked by dependency depth (longest path to a leaf) and ties keep their
//! catalog order, so adding a component elsewhere in the catalog does not
//! reshuffle unrelated entries.

use crate::error::CyclicDependencyError;
use crate::model::Catalog;

/// Directed reference graph over a catalog, by entry index.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    catalog: &'a Catalog,
    edges: Vec<Vec<usize>>,
}

/// Entries in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOrder {
    steps: Vec<BuildStep>,
}

/// One entry of the build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// External name of the entry.
    pub name: String,
    /// Longest path to a leaf; leaves are 0.
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done(usize),
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph. The loader guarantees every reference resolves.
    pub fn new(catalog: &'a Catalog) -> Self {
        let edges = catalog
            .entries
            .iter()
            .map(|entry| {
                entry
                    .component_refs()
                    .into_iter()
                    .filter_map(|name| catalog.position(name))
                    .collect()
            })
            .collect();
        Self { catalog, edges }
    }

    /// Direct dependencies of an entry, in declaration order.
    pub fn dependencies(&self, name: &str) -> Vec<&'a str> {
        let catalog = self.catalog;
        catalog
            .position(name)
            .map(|i| {
                self.edges[i]
                    .iter()
                    .map(|&j| catalog.entries[j].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Leaves-first order, or the first cycle found.
    pub fn topological_order(&self) -> Result<BuildOrder, CyclicDependencyError> {
        let mut marks = vec![Mark::Unvisited; self.edges.len()];
        let mut stack = Vec::new();

        for index in 0..self.edges.len() {
            self.visit(index, &mut marks, &mut stack)?;
        }

        let mut ranked: Vec<(usize, usize)> = marks
            .iter()
            .enumerate()
            .map(|(index, mark)| match mark {
                Mark::Done(depth) => (*depth, index),
                _ => (0, index),
            })
            .collect();
        ranked.sort();

        let steps = ranked
            .into_iter()
            .map(|(depth, index)| BuildStep {
                name: self.catalog.entries[index].name.clone(),
                depth,
            })
            .collect();

        Ok(BuildOrder { steps })
    }

    fn visit(
        &self,
        index: usize,
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
    ) -> Result<usize, CyclicDependencyError> {
        match marks[index] {
            Mark::Done(depth) => return Ok(depth),
            Mark::Visiting => {
                let start = stack.iter().position(|&i| i == index).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..]
                    .iter()
                    .map(|&i| self.catalog.entries[i].name.clone())
                    .collect();
                cycle.push(self.catalog.entries[index].name.clone());
                return Err(CyclicDependencyError { cycle });
            }
            Mark::Unvisited => {}
        }

        marks[index] = Mark::Visiting;
        stack.push(index);

        let mut depth = 0;
        for &dep in &self.edges[index] {
            depth = depth.max(self.visit(dep, marks, stack)? + 1);
        }

        stack.pop();
        marks[index] = Mark::Done(depth);
        Ok(depth)
    }
}

impl BuildOrder {
    /// Steps in order.
    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    /// External names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Human-facing build-order lines.
    pub fn log_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{:>3}. {} (depth {})", i + 1, step.name, step.depth))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_documents;

    fn catalog(json: &str) -> Catalog {
        load_documents(json, "{}").unwrap().catalog
    }

    #[test]
    fn test_leaves_first() {
        let catalog = catalog(
            r#"[
                {"name":"Card","children":[{"componentRef":"Button"},{"componentRef":"Icon"}]},
                {"name":"Button","children":[{"componentRef":"Icon"}]},
                {"name":"Icon"}
            ]"#,
        );
        let order = DependencyGraph::new(&catalog).topological_order().unwrap();
        assert_eq!(order.names().collect::<Vec<_>>(), vec!["Icon", "Button", "Card"]);
        assert_eq!(order.steps()[2].depth, 2);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = catalog(
            r#"[{"name":"Zeta"},{"name":"Alpha"},{"name":"Mid","children":[{"componentRef":"Zeta"}]},{"name":"Beta"}]"#,
        );
        let order = DependencyGraph::new(&catalog).topological_order().unwrap();
        assert_eq!(
            order.names().collect::<Vec<_>>(),
            vec!["Zeta", "Alpha", "Beta", "Mid"]
        );
    }

    #[test]
    fn test_cycle_is_rejected_with_participants() {
        let catalog = catalog(
            r#"[{"name":"X","children":[{"componentRef":"Y"}]},{"name":"Y","children":[{"componentRef":"X"}]}]"#,
        );
        let err = DependencyGraph::new(&catalog).topological_order().unwrap_err();
        assert_eq!(err.cycle, vec!["X", "Y", "X"]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let catalog = catalog(r#"[{"name":"Tree","children":[{"componentRef":"Tree"}]}]"#);
        let err = DependencyGraph::new(&catalog).topological_order().unwrap_err();
        assert_eq!(err.cycle, vec!["Tree", "Tree"]);
    }

    #[test]
    fn test_dependencies() {
        let catalog = catalog(
            r#"[{"name":"Icon"},{"name":"Button","children":[{"componentRef":"Icon"}]},{"name":"Chip","children":[{"componentRef":"Icon"}]}]"#,
        );
        let graph = DependencyGraph::new(&catalog);
        assert_eq!(graph.dependencies("Button"), vec!["Icon"]);
        assert_eq!(graph.dependencies("Chip"), vec!["Icon"]);
        assert!(graph.dependencies("Icon").is_empty());
    }

    #[test]
    fn test_log_lines() {
        let catalog = catalog(r#"[{"name":"Icon"}]"#);
        let order = DependencyGraph::new(&catalog).topological_order().unwrap();
        assert_eq!(order.log_lines(), vec!["  1. Icon (depth 0)"]);
    }
}
