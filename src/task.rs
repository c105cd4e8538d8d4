use serde::{Deserialize, Serialize};

pub type TaskId = i32;

/// Input record for a unit of work. Everything here is supplied by the
/// caller; computed dates live in [`TaskSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Whole scheduling periods (hours, days, ...). Zero marks a milestone.
    pub duration: i64,
    /// Start-no-earlier-than constraint, as a period offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wbs_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, duration: i64) -> Self {
        Self {
            id,
            name: name.into(),
            duration,
            earliest_start: None,
            wbs_code: None,
            notes: None,
        }
    }

    pub fn with_earliest_start(mut self, period: i64) -> Self {
        self.earliest_start = Some(period);
        self
    }

    pub fn is_milestone(&self) -> bool {
        self.duration == 0
    }
}

/// Derived annotation for one task, produced fresh by every pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub task_id: TaskId,
    pub duration: i64,
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub total_float: i64,
    pub free_float: i64,
    pub is_critical: bool,
    /// Predecessor whose dependency fixed `early_start`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_predecessor: Option<TaskId>,
}

impl TaskSchedule {
    /// Periods `[early_start, early_finish)` the task is active in.
    pub fn active_span(&self) -> std::ops::Range<i64> {
        self.early_start..self.early_finish
    }
}
