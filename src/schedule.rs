use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::{TaskId, TaskSchedule};

/// Output of one critical path run: an annotation for every task plus the
/// project-level figures. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSchedule {
    project_start: i64,
    project_finish: i64,
    tasks: BTreeMap<TaskId, TaskSchedule>,
    topological_order: Vec<TaskId>,
    critical_path: Vec<TaskId>,
    critical_chains: Vec<Vec<TaskId>>,
}

impl ComputedSchedule {
    pub(crate) fn new(
        project_start: i64,
        project_finish: i64,
        tasks: BTreeMap<TaskId, TaskSchedule>,
        topological_order: Vec<TaskId>,
        critical_chains: Vec<Vec<TaskId>>,
    ) -> Self {
        let critical_path = topological_order
            .iter()
            .copied()
            .filter(|id| tasks.get(id).is_some_and(|t| t.is_critical))
            .collect();
        Self {
            project_start,
            project_finish,
            tasks,
            topological_order,
            critical_path,
            critical_chains,
        }
    }

    pub fn project_start(&self) -> i64 {
        self.project_start
    }

    /// Latest early finish across all tasks.
    pub fn project_finish(&self) -> i64 {
        self.project_finish
    }

    pub fn project_duration(&self) -> i64 {
        self.project_finish - self.project_start
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskSchedule> {
        self.tasks.get(&id)
    }

    /// Annotations in task id order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSchedule> {
        self.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn topological_order(&self) -> &[TaskId] {
        &self.topological_order
    }

    /// Every zero-float task, in topological order.
    pub fn critical_path(&self) -> &[TaskId] {
        &self.critical_path
    }

    /// Each distinct chain of critical tasks from a critical start to a
    /// critical end. Parallel critical paths show up as separate chains.
    pub fn critical_chains(&self) -> &[Vec<TaskId>] {
        &self.critical_chains
    }

    pub fn summary(&self) -> ScheduleSummary {
        ScheduleSummary {
            task_count: self.tasks.len(),
            critical_count: self.critical_path.len(),
            critical_path: self.critical_path.clone(),
            project_finish: self.project_finish,
            project_duration: self.project_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub task_count: usize,
    pub critical_count: usize,
    pub critical_path: Vec<TaskId>,
    pub project_finish: i64,
    pub project_duration: i64,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("critical={}", self.critical_count));
        parts.push(format!("finish={}", self.project_finish));
        parts.push(format!("duration={}", self.project_duration));
        if !self.critical_path.is_empty() {
            let chain = self
                .critical_path
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("path={chain}"));
        }
        parts.join(", ")
    }
}
