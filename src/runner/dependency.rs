//! Dependency graph for step execution ordering.
//!
//! Steps keep their declaration position; every ordering the graph hands
//! out breaks ties by that position, so the same definition always runs in
//! the same order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::error::{Result, StepwiseError};

/// Represents the dependency relationships between steps.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Step names in declaration order.
    steps: Vec<String>,
    /// Declaration position of each step.
    position: HashMap<String, usize>,
    /// Map of step name to its direct dependencies, in declared order.
    dependencies: HashMap<String, Vec<String>>,
    /// Map of step name to steps that depend on it, in declaration order.
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Get the direct dependencies of a step.
    pub fn dependencies_of(&self, step: &str) -> Option<&[String]> {
        self.dependencies.get(step).map(Vec::as_slice)
    }

    /// Get steps that depend on the given step.
    pub fn dependents_of(&self, step: &str) -> Option<&[String]> {
        self.dependents.get(step).map(Vec::as_slice)
    }

    /// Check if a step exists in the graph.
    pub fn contains(&self, step: &str) -> bool {
        self.position.contains_key(step)
    }

    /// Get all step names in declaration order.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Declaration position of a step.
    pub fn position(&self, step: &str) -> Option<usize> {
        self.position.get(step).copied()
    }

    /// Get the number of steps in the graph.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns steps in topological order (dependencies before dependents).
    ///
    /// Among steps whose dependencies are all placed, the one declared
    /// first comes first. Returns an error naming the cycle if one exists.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut in_degree: Vec<usize> = self
            .steps
            .iter()
            .map(|s| self.dependencies.get(s).map_or(0, Vec::len))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut result = Vec::with_capacity(self.steps.len());

        while let Some(Reverse(idx)) = ready.pop() {
            let step = &self.steps[idx];
            result.push(step.clone());

            for dependent in self.dependents.get(step).into_iter().flatten() {
                if let Some(&dep_idx) = self.position.get(dependent) {
                    in_degree[dep_idx] -= 1;
                    if in_degree[dep_idx] == 0 {
                        ready.push(Reverse(dep_idx));
                    }
                }
            }
        }

        if result.len() != self.steps.len() {
            let cycle = self.find_cycle().unwrap_or_else(|| {
                self.steps
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| in_degree[*idx] > 0)
                    .map(|(_, s)| s.clone())
                    .collect()
            });

            return Err(StepwiseError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        Ok(result)
    }

    /// Find a cycle in the graph, returning the path if one exists.
    ///
    /// The path starts and ends with the same step, e.g. `["a", "b", "a"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        let mut state: HashMap<&str, State> = self
            .steps
            .iter()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();

        let mut path: Vec<String> = Vec::new();

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node.to_string());

            if let Some(deps) = graph.dependencies.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let cycle_start = path.iter().position(|s| s == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = path[cycle_start..].to_vec();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) | None => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        for step in &self.steps {
            if state.get(step.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(step, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Returns groups of steps that can execute in parallel.
    ///
    /// Each group contains steps whose dependencies are satisfied
    /// by all previous groups, in declaration order.
    pub fn parallel_groups(&self) -> Result<Vec<Vec<String>>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(StepwiseError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();

        while completed.len() < self.steps.len() {
            let ready: Vec<String> = self
                .steps
                .iter()
                .filter(|s| !completed.contains(*s))
                .filter(|s| self.is_ready(s, &completed))
                .cloned()
                .collect();

            if ready.is_empty() {
                break;
            }

            completed.extend(ready.iter().cloned());
            groups.push(ready);
        }

        Ok(groups)
    }

    /// Check if a step is ready to run given completed steps.
    pub fn is_ready(&self, step: &str, completed: &HashSet<String>) -> bool {
        match self.dependencies.get(step) {
            None => true,
            Some(deps) => deps.iter().all(|d| completed.contains(d)),
        }
    }

    /// Get all transitive dependents of a step.
    ///
    /// Returns steps that depend on the given step, directly or indirectly.
    pub fn transitive_dependents(&self, step: &str) -> HashSet<String> {
        let mut result = HashSet::new();
        let mut to_visit = vec![step.to_string()];

        while let Some(current) = to_visit.pop() {
            if let Some(dependents) = self.dependents.get(&current) {
                for dep in dependents {
                    if result.insert(dep.clone()) {
                        to_visit.push(dep.clone());
                    }
                }
            }
        }

        result
    }
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    steps: Vec<(String, Vec<String>)>,
}

impl DependencyGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with its dependencies.
    ///
    /// Steps are positioned in the order they are added.
    pub fn add_step(mut self, name: impl Into<String>, depends_on: Vec<String>) -> Self {
        self.steps.push((name.into(), depends_on));
        self
    }

    /// Build the dependency graph.
    ///
    /// Returns `DuplicateStep` if a name is added twice and
    /// `UnknownDependency` if a dependency names a step that was never added.
    pub fn build(self) -> Result<DependencyGraph> {
        let mut position = HashMap::new();
        for (idx, (name, _)) in self.steps.iter().enumerate() {
            if position.insert(name.clone(), idx).is_some() {
                return Err(StepwiseError::DuplicateStep { step: name.clone() });
            }
        }

        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = self
            .steps
            .iter()
            .map(|(name, _)| (name.clone(), Vec::new()))
            .collect();

        for (name, deps) in &self.steps {
            let mut unique: Vec<String> = Vec::with_capacity(deps.len());
            for dep in deps {
                if !position.contains_key(dep) {
                    return Err(StepwiseError::UnknownDependency {
                        step: name.clone(),
                        dependency: dep.clone(),
                    });
                }
                if !unique.contains(dep) {
                    unique.push(dep.clone());
                }
            }

            for dep in &unique {
                if let Some(list) = dependents.get_mut(dep) {
                    list.push(name.clone());
                }
            }
            dependencies.insert(name.clone(), unique);
        }

        Ok(DependencyGraph {
            steps: self.steps.into_iter().map(|(name, _)| name).collect(),
            position,
            dependencies,
            dependents,
        })
    }
}
