//! Task generation and dependency-aware ordering.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use super::priority::PriorityMatrix;
use crate::core::{normalize_dir_path, Gap, GapKind, Priority};
use crate::errors::{Error, Result};

/// A unit of remediation work derived from one gap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub effort_hours: f64,
    pub category: String,
    #[serde(default)]
    pub files_to_create: Vec<String>,
    #[serde(default)]
    pub files_to_modify: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Requirement or improvement the task traces back to.
    pub reference: String,
}

impl Task {
    pub fn is_quick_win(&self, threshold_hours: f64) -> bool {
        self.effort_hours <= threshold_hours
            && matches!(self.priority, Priority::High | Priority::Medium)
    }
}

/// Tasks of one category scheduled together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkPackage {
    pub category: String,
    pub tasks: Vec<Task>,
    pub total_hours: f64,
}

pub struct TaskGenerator {
    matrix: PriorityMatrix,
}

impl Default for TaskGenerator {
    fn default() -> Self {
        Self::new(PriorityMatrix::default())
    }
}

impl TaskGenerator {
    pub fn new(matrix: PriorityMatrix) -> Self {
        Self { matrix }
    }

    /// One task per gap, ids `TASK-001` onwards in gap order. A gap whose
    /// directory lies inside another gap's directory depends on that task.
    pub fn generate_tasks(&self, gaps: &[Gap]) -> Vec<Task> {
        let ids: Vec<String> = (1..=gaps.len()).map(task_id).collect();
        let paths: Vec<String> = gaps.iter().map(|g| normalize_dir_path(&g.path)).collect();

        let tasks: Vec<Task> = gaps
            .iter()
            .enumerate()
            .map(|(index, gap)| {
                let dependencies = paths
                    .iter()
                    .enumerate()
                    .filter(|(other, path)| {
                        *other != index && is_proper_ancestor(path, &paths[index])
                    })
                    .map(|(other, _)| ids[other].clone())
                    .collect();
                self.task_for_gap(ids[index].clone(), gap, dependencies)
            })
            .collect();

        log::debug!("Generated {} tasks", tasks.len());
        tasks
    }

    fn task_for_gap(&self, id: String, gap: &Gap, dependencies: Vec<String>) -> Task {
        let priority = self.matrix.categorize_priority(gap);
        let effort = self.matrix.estimate_effort(gap);
        let base = gap.path.trim_end_matches('/');

        let (title, files_to_create, files_to_modify) = match gap.kind {
            GapKind::Missing => (
                format!("Create {}", gap.path),
                std::iter::once(gap.path.clone())
                    .chain(gap.missing_items.iter().map(|item| format!("{}/{}", base, item)))
                    .collect(),
                Vec::new(),
            ),
            GapKind::Partial => (
                format!("Complete {}", gap.path),
                gap.missing_items
                    .iter()
                    .map(|item| format!("{}/{}", base, item))
                    .collect(),
                Vec::new(),
            ),
            GapKind::Conflict => (
                format!("Resolve conflict at {}", gap.path),
                Vec::new(),
                vec![gap.path.clone()],
            ),
        };

        Task {
            id,
            title,
            description: format!("{} {}", gap.description, gap.proposed_action),
            priority,
            effort_hours: effort.hours(),
            category: gap.category.clone(),
            files_to_create,
            files_to_modify,
            dependencies,
            reference: gap.related_requirement.clone(),
        }
    }

    /// Topological order honoring `dependencies`; among ready tasks, higher
    /// priority first, then input order. Dependencies outside the set are
    /// treated as satisfied.
    pub fn prioritize_tasks(&self, tasks: &[Task]) -> Result<Vec<Task>> {
        prioritize_tasks(tasks)
    }

    /// Partition tasks by category, keeping input order within a package.
    pub fn group_related_tasks(&self, tasks: &[Task]) -> Vec<WorkPackage> {
        group_related_tasks(tasks)
    }
}

/// Pure: see [`TaskGenerator::prioritize_tasks`].
pub fn prioritize_tasks(tasks: &[Task]) -> Result<Vec<Task>> {
    let (graph, _) = build_dependency_graph(tasks)?;

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<(u8, Reverse<usize>)> = graph
        .node_indices()
        .filter(|node| in_degree[node.index()] == 0)
        .map(|node| (tasks[node.index()].priority.rank(), Reverse(node.index())))
        .collect();

    let mut ordered = Vec::with_capacity(tasks.len());
    while let Some((_, Reverse(index))) = ready.pop() {
        ordered.push(tasks[index].clone());
        for next in graph.neighbors_directed(NodeIndex::new(index), Direction::Outgoing) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push((tasks[next.index()].priority.rank(), Reverse(next.index())));
            }
        }
    }

    if ordered.len() < tasks.len() {
        let cycle = find_cycle(&graph);
        log::warn!("Task dependency cycle: {}", cycle.join(" -> "));
        return Err(Error::DependencyCycle(cycle));
    }
    Ok(ordered)
}

/// Pure: see [`TaskGenerator::group_related_tasks`].
pub fn group_related_tasks(tasks: &[Task]) -> Vec<WorkPackage> {
    let mut groups: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        groups
            .entry(task.category.clone())
            .or_default()
            .push(task.clone());
    }
    groups
        .into_iter()
        .map(|(category, tasks)| WorkPackage {
            total_hours: tasks.iter().map(|t| t.effort_hours).sum(),
            category,
            tasks,
        })
        .collect()
}

/// Pure: tasks cheap enough and important enough to do first.
pub fn quick_wins(tasks: &[Task], threshold_hours: f64) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.is_quick_win(threshold_hours))
        .cloned()
        .collect()
}

/// Edge `dependency -> dependent` for every known dependency id.
fn build_dependency_graph(tasks: &[Task]) -> Result<(DiGraph<String, ()>, HashMap<&str, NodeIndex>)> {
    let mut graph = DiGraph::new();
    let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();

    for task in tasks {
        let node = graph.add_node(task.id.clone());
        if node_map.insert(task.id.as_str(), node).is_some() {
            return Err(Error::validation(format!("duplicate task id {}", task.id)));
        }
    }

    for task in tasks {
        let dependent = node_map[task.id.as_str()];
        for dep in &task.dependencies {
            match node_map.get(dep.as_str()) {
                Some(&dependency) => {
                    graph.add_edge(dependency, dependent, ());
                }
                None => log::debug!("{} depends on unknown task {}; ignoring", task.id, dep),
            }
        }
    }

    Ok((graph, node_map))
}

/// Ids of one strongly connected component that forms a cycle.
fn find_cycle(graph: &DiGraph<String, ()>) -> Vec<String> {
    tarjan_scc(graph)
        .into_iter()
        .find(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&node| graph.contains_edge(node, node))
        })
        .map(|component| {
            let mut ids: Vec<String> = component.iter().map(|&n| graph[n].clone()).collect();
            ids.sort();
            ids
        })
        .unwrap_or_default()
}

fn task_id(n: usize) -> String {
    format!("TASK-{:03}", n)
}

fn is_proper_ancestor(ancestor: &str, path: &str) -> bool {
    ancestor != "." && path.starts_with(&format!("{}/", ancestor))
}
