//! Prerequisite graph over a job's task set.
//!
//! - Forward edges: task -> tasks it lists as prerequisites
//! - Reverse edges: task -> tasks that list it (its dependents)
//! - Invariant: edges and reverse_edges are kept in sync
//!
//! Prerequisite lists come straight from user-submitted configs, so the graph
//! may contain self-references and cycles. Nothing here rejects them.

use std::collections::{HashMap, HashSet};

use super::ids::TaskId;
use super::task::Task;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: HashMap<TaskId, HashSet<TaskId>>,
    reverse_edges: HashMap<TaskId, HashSet<TaskId>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every task's prerequisite list.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::new();
        for task in tasks {
            for prereq in &task.config.prereq_tasks {
                graph.add_dependency(task.task_id, *prereq);
            }
        }
        graph
    }

    /// `task` lists `depends_on` as a prerequisite.
    pub fn add_dependency(&mut self, task: TaskId, depends_on: TaskId) {
        self.edges.entry(task).or_default().insert(depends_on);
        self.reverse_edges
            .entry(depends_on)
            .or_default()
            .insert(task);
    }

    /// Tasks that list `task_id` as a prerequisite, excluding itself.
    /// Sorted for a deterministic traversal order.
    pub fn dependents(&self, task_id: TaskId) -> Vec<TaskId> {
        let mut dependents: Vec<TaskId> = self
            .reverse_edges
            .get(&task_id)
            .map(|waiting| waiting.iter().copied().filter(|t| *t != task_id).collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    pub fn prerequisites(&self, task_id: TaskId) -> Vec<TaskId> {
        let mut deps: Vec<TaskId> = self
            .edges
            .get(&task_id)
            .map(|deps| deps.iter().copied().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Return one prerequisite cycle if the graph has any.
    ///
    /// Iterative three-color DFS; a self-reference is reported as a
    /// one-element cycle.
    pub fn detect_cycle(&self) -> Option<Vec<TaskId>> {
        let mut color: HashMap<TaskId, Color> = HashMap::new();
        let mut roots: Vec<TaskId> = self.edges.keys().copied().collect();
        roots.sort();

        for root in roots {
            if color.contains_key(&root) {
                continue;
            }
            // (node, index of the next prerequisite to visit)
            let mut stack: Vec<(TaskId, usize)> = vec![(root, 0)];
            color.insert(root, Color::Gray);

            while let Some((node, next)) = stack.pop() {
                let prereqs = self.prerequisites(node);
                let Some(&dep) = prereqs.get(next) else {
                    color.insert(node, Color::Black);
                    continue;
                };
                stack.push((node, next + 1));
                match color.get(&dep) {
                    Some(Color::Gray) => {
                        let start = stack
                            .iter()
                            .position(|(t, _)| *t == dep)
                            .unwrap_or_default();
                        return Some(stack[start..].iter().map(|(t, _)| *t).collect());
                    }
                    Some(Color::Black) => {}
                    None => {
                        color.insert(dep, Color::Gray);
                        stack.push((dep, 0));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> TaskId {
        TaskId::from_u128(n)
    }

    #[test]
    fn add_dependency_creates_both_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(id(2), id(1)); // 2 waits for 1

        assert_eq!(graph.prerequisites(id(2)), vec![id(1)]);
        assert_eq!(graph.dependents(id(1)), vec![id(2)]);
        assert!(graph.dependents(id(2)).is_empty());
    }

    #[test]
    fn self_reference_is_not_its_own_dependent() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(id(1), id(1));
        assert!(graph.dependents(id(1)).is_empty());
        assert_eq!(graph.detect_cycle(), Some(vec![id(1)]));
    }

    #[test]
    fn detect_three_cycle() {
        let mut graph = DependencyGraph::new();
        // A -> B -> C -> A
        graph.add_dependency(id(1), id(2));
        graph.add_dependency(id(2), id(3));
        graph.add_dependency(id(3), id(1));

        let cycle = graph.detect_cycle().expect("cycle");
        assert_eq!(cycle.len(), 3);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(id(2), id(1));
        graph.add_dependency(id(3), id(1));
        graph.add_dependency(id(4), id(2));
        graph.add_dependency(id(4), id(3));

        assert!(graph.detect_cycle().is_none());
    }

    #[test]
    fn chain_with_shortcut_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(id(2), id(1));
        graph.add_dependency(id(3), id(2));
        graph.add_dependency(id(3), id(1));

        assert!(graph.detect_cycle().is_none());
    }
}
