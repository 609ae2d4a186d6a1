//! # Dependency Graph
//!
//! An immutable, validated set of operations plus their dependency edges.
//!
//! Graphs are assembled with [`GraphBuilder`] and validated once in
//! [`GraphBuilder::build`]: duplicate ids, dependencies on unknown operations,
//! self-dependencies and cycles are rejected there, so the scheduler only ever
//! sees an acyclic graph whose edges all resolve.
//!
//! ## Usage
//!
//! ```rust
//! use push_extension_core::orchestration::{operation_fn, GraphBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = GraphBuilder::new();
//! builder
//!     .add_operation("fetch", operation_fn(|| async { Ok(()) }))
//!     .add_operation("merge", operation_fn(|| async { Ok(()) }))
//!     .add_dependency("merge", "fetch");
//!
//! let graph = builder.build()?;
//! assert_eq!(graph.dependencies_of("merge"), Some(vec!["fetch"]));
//! # Ok(())
//! # }
//! ```

use crate::error::GraphError;
use crate::orchestration::operation::Operation;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// One operation in a validated graph
pub struct OperationNode {
    pub(crate) id: String,
    pub(crate) dependencies: Vec<usize>,
    pub(crate) operation: Arc<dyn Operation>,
}

impl OperationNode {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for OperationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNode")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("operation", &"<Arc<dyn Operation>>")
            .finish()
    }
}

/// Validated, acyclic dependency graph
#[derive(Debug)]
pub struct DependencyGraph {
    pub(crate) nodes: Vec<OperationNode>,
    pub(crate) dependents: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependencies_of(&self, id: &str) -> Option<Vec<&str>> {
        let idx = *self.index.get(id)?;
        Some(
            self.nodes[idx]
                .dependencies
                .iter()
                .map(|&dep| self.nodes[dep].id.as_str())
                .collect(),
        )
    }

    pub fn dependents_of(&self, id: &str) -> Option<Vec<&str>> {
        let idx = *self.index.get(id)?;
        Some(
            self.dependents[idx]
                .iter()
                .map(|&dep| self.nodes[dep].id.as_str())
                .collect(),
        )
    }

    /// Operations with no dependencies, eligible as soon as scheduling starts
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.dependencies.is_empty())
            .map(|node| node.id.as_str())
            .collect()
    }
}

/// Collects operations and edges, then validates them into a [`DependencyGraph`]
#[derive(Default)]
pub struct GraphBuilder {
    operations: Vec<(String, Arc<dyn Operation>)>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operation(
        &mut self,
        id: impl Into<String>,
        operation: Arc<dyn Operation>,
    ) -> &mut Self {
        self.operations.push((id.into(), operation));
        self
    }

    /// Declare that `dependent` may only start once `dependency` has settled
    pub fn add_dependency(
        &mut self,
        dependent: impl Into<String>,
        dependency: impl Into<String>,
    ) -> &mut Self {
        self.edges.push((dependent.into(), dependency.into()));
        self
    }

    pub fn build(self) -> Result<DependencyGraph, GraphError> {
        let mut index = HashMap::with_capacity(self.operations.len());
        for (position, (id, _)) in self.operations.iter().enumerate() {
            if index.insert(id.clone(), position).is_some() {
                return Err(GraphError::DuplicateOperation { id: id.clone() });
            }
        }

        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); self.operations.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.operations.len()];
        let mut seen_edges = HashSet::new();

        for (dependent, dependency) in &self.edges {
            if dependent == dependency {
                return Err(GraphError::SelfDependency {
                    id: dependent.clone(),
                });
            }
            let (Some(&from), Some(&to)) = (index.get(dependency), index.get(dependent)) else {
                return Err(GraphError::DanglingDependency {
                    dependent: dependent.clone(),
                    dependency: dependency.clone(),
                });
            };
            if seen_edges.insert((from, to)) {
                dependencies[to].push(from);
                dependents[from].push(to);
            }
        }

        detect_cycles(&self.operations, &dependencies, &dependents)?;

        let nodes = self
            .operations
            .into_iter()
            .zip(dependencies)
            .map(|((id, operation), dependencies)| OperationNode {
                id,
                dependencies,
                operation,
            })
            .collect();

        Ok(DependencyGraph {
            nodes,
            dependents,
            index,
        })
    }
}

/// Kahn's algorithm: whatever cannot be peeled off lies on or behind a cycle.
fn detect_cycles(
    operations: &[(String, Arc<dyn Operation>)],
    dependencies: &[Vec<usize>],
    dependents: &[Vec<usize>],
) -> Result<(), GraphError> {
    let mut in_degree: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut visited = 0;
    while let Some(idx) = queue.pop_front() {
        visited += 1;
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if visited == operations.len() {
        return Ok(());
    }

    let involved = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree > 0)
        .map(|(idx, _)| operations[idx].0.clone())
        .collect();
    Err(GraphError::CycleDetected { involved })
}
