//! Baseline snapshots and variance against the current schedule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{EngineResult, ScheduleError};
use crate::project::Project;
use crate::schedule::ComputedSchedule;
use crate::task::TaskId;

/// Dates captured for one task when a baseline is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineTask {
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub duration: i64,
}

/// Immutable snapshot of a computed schedule, keyed by
/// (project, version, creation time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    project_id: String,
    version: u32,
    label: String,
    created_at: DateTime<Utc>,
    project_finish: i64,
    tasks: BTreeMap<TaskId, BaselineTask>,
}

impl Baseline {
    pub fn from_schedule(
        project_id: impl Into<String>,
        version: u32,
        label: impl Into<String>,
        created_at: DateTime<Utc>,
        schedule: &ComputedSchedule,
    ) -> Self {
        let tasks = schedule
            .tasks()
            .map(|task| {
                (
                    task.task_id,
                    BaselineTask {
                        early_start: task.early_start,
                        early_finish: task.early_finish,
                        late_start: task.late_start,
                        late_finish: task.late_finish,
                        duration: task.duration,
                    },
                )
            })
            .collect();
        Self {
            project_id: project_id.into(),
            version,
            label: label.into(),
            created_at,
            project_finish: schedule.project_finish(),
            tasks,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn project_finish(&self) -> i64 {
        self.project_finish
    }

    pub fn task(&self, id: TaskId) -> Option<&BaselineTask> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &BaselineTask)> {
        self.tasks.iter().map(|(&id, task)| (id, task))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskVariance {
    pub task_id: TaskId,
    pub baseline_finish: i64,
    pub current_finish: i64,
    /// Current EF minus baseline EF; positive means late.
    pub finish_variance: i64,
    pub start_variance: i64,
    pub duration_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub baseline_version: u32,
    /// Tasks present on both sides, by id.
    pub entries: Vec<TaskVariance>,
    /// In the current schedule but not the baseline.
    pub added: Vec<TaskId>,
    /// In the baseline but no longer scheduled.
    pub removed: Vec<TaskId>,
    pub project_finish_variance: i64,
}

impl VarianceReport {
    pub fn slipped(&self) -> impl Iterator<Item = &TaskVariance> {
        self.entries.iter().filter(|entry| entry.finish_variance > 0)
    }

    pub fn is_on_baseline(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.project_finish_variance == 0
            && self.entries.iter().all(|entry| entry.finish_variance == 0)
    }
}

/// Appends a new baseline built from the project's current schedule and
/// returns its version.
pub fn create_baseline(project: &mut Project, label: &str) -> EngineResult<u32> {
    create_baseline_at(project, label, Utc::now())
}

pub fn create_baseline_at(
    project: &mut Project,
    label: &str,
    created_at: DateTime<Utc>,
) -> EngineResult<u32> {
    let schedule = project
        .schedule()
        .cloned()
        .ok_or_else(|| ScheduleError::NoScheduleComputed(project.id().to_string()))?;
    let version = project.next_baseline_version();
    let baseline = Baseline::from_schedule(project.id(), version, label, created_at, &schedule);
    info!(
        project = project.id(),
        version,
        tasks = schedule.task_count(),
        "baseline created"
    );
    project.push_baseline(baseline);
    Ok(version)
}

pub fn compare_to_baseline(project: &Project, version: u32) -> EngineResult<VarianceReport> {
    let baseline = project
        .baseline(version)
        .ok_or(ScheduleError::BaselineNotFound(version))?;
    let schedule = project
        .schedule()
        .ok_or_else(|| ScheduleError::NoScheduleComputed(project.id().to_string()))?;

    let mut entries = Vec::new();
    let mut added = Vec::new();
    for current in schedule.tasks() {
        match baseline.task(current.task_id) {
            Some(base) => entries.push(TaskVariance {
                task_id: current.task_id,
                baseline_finish: base.early_finish,
                current_finish: current.early_finish,
                finish_variance: current.early_finish - base.early_finish,
                start_variance: current.early_start - base.early_start,
                duration_delta: current.duration - base.duration,
            }),
            None => added.push(current.task_id),
        }
    }
    let removed = baseline
        .tasks()
        .filter(|(id, _)| schedule.task(*id).is_none())
        .map(|(id, _)| id)
        .collect();

    Ok(VarianceReport {
        baseline_version: version,
        entries,
        added,
        removed,
        project_finish_variance: schedule.project_finish() - baseline.project_finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::CriticalPathCalculator;
    use crate::graph::ScheduleDag;
    use crate::metadata::ProjectMetadata;
    use crate::task::Task;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn scheduled(tasks: Vec<Task>) -> Project {
        let mut project = Project::from_records(
            ProjectMetadata::default(),
            tasks,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let dag = ScheduleDag::build(&project).unwrap();
        let schedule = CriticalPathCalculator::new(&dag, &project, 16).execute().unwrap();
        project.set_schedule(Arc::new(schedule));
        project
    }

    #[test]
    fn versions_increase_from_one() {
        let mut project = scheduled(vec![Task::new(1, "A", 3)]);
        let at = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        assert_eq!(create_baseline_at(&mut project, "plan", at).unwrap(), 1);
        assert_eq!(create_baseline_at(&mut project, "replan", at).unwrap(), 2);
        let latest = project.latest_baseline().unwrap();
        assert_eq!(latest.label(), "replan");
        assert_eq!(latest.created_at(), at);
        assert_eq!(latest.task(1).map(|t| t.early_finish), Some(3));
    }

    #[test]
    fn report_lists_variance_per_common_task() {
        let mut project = scheduled(vec![Task::new(1, "A", 3), Task::new(2, "B", 2)]);
        create_baseline(&mut project, "plan").unwrap();

        let mut longer = Task::new(1, "A", 5);
        longer.earliest_start = Some(1);
        project.upsert_task(longer);
        let dag = ScheduleDag::build(&project).unwrap();
        let schedule = CriticalPathCalculator::new(&dag, &project, 16).execute().unwrap();
        project.set_schedule(Arc::new(schedule));

        let report = compare_to_baseline(&project, 1).unwrap();
        let a = report.entries.iter().find(|e| e.task_id == 1).unwrap();
        assert_eq!(a.finish_variance, 3);
        assert_eq!(a.start_variance, 1);
        assert_eq!(a.duration_delta, 2);
        assert_eq!(report.project_finish_variance, 3);
        assert_eq!(report.slipped().count(), 1);
        assert!(!report.is_on_baseline());
    }
}
