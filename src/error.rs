//! Error taxonomy for the scheduling pipeline.

use thiserror::Error;

use crate::leveling::{LevelingOutcome, ResourceConflict};
use crate::task::TaskId;

/// Errors produced by the graph builder, the critical path calculator,
/// resource leveling, the baseline manager and the export serializer.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("dependency {predecessor} -> {successor} references unknown task {missing}")]
    UnknownTaskReference {
        predecessor: TaskId,
        successor: TaskId,
        missing: TaskId,
    },
    #[error("invalid dependency {predecessor} -> {successor}: {reason}")]
    InvalidDependency {
        predecessor: TaskId,
        successor: TaskId,
        reason: String,
    },
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<TaskId> },
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),
    #[error("duplicate resource id '{0}'")]
    DuplicateResource(String),
    #[error("task {task_id} is assigned to unknown resource '{resource_id}'")]
    UnknownResourceReference { task_id: TaskId, resource_id: String },
    #[error("invalid assignment of task {task_id} to '{resource_id}': {reason}")]
    InvalidAssignment {
        task_id: TaskId,
        resource_id: String,
        reason: String,
    },
    #[error("invalid resource '{resource_id}': {reason}")]
    InvalidResource { resource_id: String, reason: String },
    #[error("invalid work calendar: {0}")]
    InvalidCalendar(String),
    #[error("infeasible schedule at task {task_id}: {reason}")]
    InfeasibleSchedule { task_id: TaskId, reason: String },
    #[error(
        "resource leveling did not converge after {iterations} iterations ({} conflicts remain)",
        .remaining.len()
    )]
    LevelingDidNotConverge {
        iterations: usize,
        partial: Box<LevelingOutcome>,
        remaining: Vec<ResourceConflict>,
    },
    #[error("no schedule has been computed for project '{0}'")]
    NoScheduleComputed(String),
    #[error("baseline version {0} not found")]
    BaselineNotFound(u32),
    #[error("baseline version {version} does not extend the sequence (latest is {latest})")]
    BaselineVersionConflict { version: u32, latest: u32 },
    #[error("baseline belongs to project '{found}', not '{expected}'")]
    BaselineProjectMismatch { expected: String, found: String },
    #[error("unsupported export format '{0}'")]
    UnsupportedExportFormat(String),
    #[error("export failed: {0}")]
    Export(String),
}

impl ScheduleError {
    /// Validation failures are caller errors detected before any computation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScheduleError::UnknownTaskReference { .. }
                | ScheduleError::InvalidDependency { .. }
                | ScheduleError::CyclicDependency { .. }
                | ScheduleError::DuplicateTask(_)
                | ScheduleError::DuplicateResource(_)
                | ScheduleError::UnknownResourceReference { .. }
                | ScheduleError::InvalidAssignment { .. }
                | ScheduleError::InvalidResource { .. }
                | ScheduleError::InvalidCalendar(_)
        )
    }

    /// Best leveling result reached before the iteration bound.
    pub fn partial_outcome(&self) -> Option<&LevelingOutcome> {
        match self {
            ScheduleError::LevelingDidNotConverge { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

fn format_cycle(cycle: &[TaskId]) -> String {
    let mut chain = cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if let Some(first) = cycle.first() {
        chain.push(first.to_string());
    }
    chain.join(" -> ")
}

pub type EngineResult<T> = Result<T, ScheduleError>;
