//! The project aggregate: flat record collections keyed by identifier.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::baseline::Baseline;
use crate::calendar::WorkCalendar;
use crate::dependency::Dependency;
use crate::error::{EngineResult, ScheduleError};
use crate::metadata::ProjectMetadata;
use crate::resource::{Assignment, Resource};
use crate::schedule::ComputedSchedule;
use crate::task::{Task, TaskId};
use crate::task_validation;

/// Owns the tasks, dependencies, resources, assignments and baselines of one
/// project. Records refer to each other only by identifier; the indices
/// below resolve identifiers in O(1).
///
/// The most recently computed schedule is kept alongside the inputs and is
/// dropped whenever an input record changes.
#[derive(Debug, Clone, Default)]
pub struct Project {
    metadata: ProjectMetadata,
    tasks: Vec<Task>,
    task_index: HashMap<TaskId, usize>,
    dependencies: Vec<Dependency>,
    resources: Vec<Resource>,
    resource_index: HashMap<String, usize>,
    assignments: Vec<Assignment>,
    baselines: Vec<Baseline>,
    schedule: Option<Arc<ComputedSchedule>>,
}

impl Project {
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Builds a project from plain records supplied by the caller.
    /// Dependencies are checked later by the graph builder.
    pub fn from_records(
        metadata: ProjectMetadata,
        tasks: Vec<Task>,
        dependencies: Vec<Dependency>,
        resources: Vec<Resource>,
        assignments: Vec<Assignment>,
    ) -> EngineResult<Self> {
        validate_calendar(&metadata)?;
        task_validation::validate_task_collection(&tasks)?;
        task_validation::validate_resource_collection(&resources)?;
        task_validation::validate_assignments(&assignments, &tasks, &resources)?;

        let task_index = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| (task.id, idx))
            .collect();
        let resource_index = resources
            .iter()
            .enumerate()
            .map(|(idx, resource)| (resource.id.clone(), idx))
            .collect();

        Ok(Self {
            metadata,
            tasks,
            task_index,
            dependencies,
            resources,
            resource_index,
            assignments,
            baselines: Vec::new(),
            schedule: None,
        })
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.project_id
    }

    /// Replaces the metadata. The project id is fixed once baselines exist.
    pub fn set_metadata(&mut self, metadata: ProjectMetadata) -> EngineResult<()> {
        validate_calendar(&metadata)?;
        if let Some(baseline) = self.latest_baseline()
            && baseline.project_id() != metadata.project_id
        {
            return Err(ScheduleError::BaselineProjectMismatch {
                expected: metadata.project_id,
                found: baseline.project_id().to_string(),
            });
        }
        self.metadata = metadata;
        self.invalidate();
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.task_index.get(&id).map(|&idx| &self.tasks[idx])
    }

    pub fn contains_task(&self, id: TaskId) -> bool {
        self.task_index.contains_key(&id)
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resource_index.get(id).map(|&idx| &self.resources[idx])
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignments_for_task(&self, task_id: TaskId) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .iter()
            .filter(move |assignment| assignment.task_id == task_id)
    }

    pub fn baselines(&self) -> &[Baseline] {
        &self.baselines
    }

    pub fn baseline(&self, version: u32) -> Option<&Baseline> {
        self.baselines
            .iter()
            .find(|baseline| baseline.version() == version)
    }

    pub fn latest_baseline(&self) -> Option<&Baseline> {
        self.baselines.last()
    }

    pub fn schedule(&self) -> Option<&Arc<ComputedSchedule>> {
        self.schedule.as_ref()
    }

    /// Working calendar used to date exported periods.
    pub fn working_calendar(&self) -> EngineResult<WorkCalendar> {
        match &self.metadata.calendar {
            Some(config) => {
                WorkCalendar::from_config(config).map_err(ScheduleError::InvalidCalendar)
            }
            None => Ok(WorkCalendar::default()),
        }
    }

    pub fn add_task(&mut self, task: Task) -> EngineResult<()> {
        if self.contains_task(task.id) {
            return Err(ScheduleError::DuplicateTask(task.id));
        }
        self.task_index.insert(task.id, self.tasks.len());
        self.tasks.push(task);
        self.invalidate();
        Ok(())
    }

    /// Inserts the task or replaces the record with the same id.
    pub fn upsert_task(&mut self, task: Task) {
        match self.task_index.get(&task.id) {
            Some(&idx) => self.tasks[idx] = task,
            None => {
                self.task_index.insert(task.id, self.tasks.len());
                self.tasks.push(task);
            }
        }
        self.invalidate();
    }

    /// Removes a task together with every dependency and assignment that
    /// references it.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        if !self.contains_task(id) {
            return false;
        }
        self.tasks.retain(|task| task.id != id);
        self.task_index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| (task.id, idx))
            .collect();
        self.dependencies
            .retain(|dep| dep.predecessor != id && dep.successor != id);
        self.assignments.retain(|assignment| assignment.task_id != id);
        self.invalidate();
        true
    }

    pub fn add_dependency(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
        self.invalidate();
    }

    pub fn remove_dependency(&mut self, predecessor: TaskId, successor: TaskId) -> bool {
        let before = self.dependencies.len();
        self.dependencies
            .retain(|dep| !(dep.predecessor == predecessor && dep.successor == successor));
        let removed = self.dependencies.len() != before;
        if removed {
            self.invalidate();
        }
        removed
    }

    pub fn add_resource(&mut self, resource: Resource) -> EngineResult<()> {
        task_validation::validate_resource(&resource)?;
        if self.resource_index.contains_key(&resource.id) {
            return Err(ScheduleError::DuplicateResource(resource.id));
        }
        self.resource_index
            .insert(resource.id.clone(), self.resources.len());
        self.resources.push(resource);
        self.invalidate();
        Ok(())
    }

    pub fn assign(&mut self, assignment: Assignment) -> EngineResult<()> {
        task_validation::validate_assignments(
            std::slice::from_ref(&assignment),
            &self.tasks,
            &self.resources,
        )?;
        self.assignments.push(assignment);
        self.invalidate();
        Ok(())
    }

    /// Restores a persisted baseline. It must belong to this project and
    /// its version must strictly extend the existing sequence.
    pub fn restore_baseline(&mut self, baseline: Baseline) -> EngineResult<()> {
        if baseline.project_id() != self.id() {
            return Err(ScheduleError::BaselineProjectMismatch {
                expected: self.id().to_string(),
                found: baseline.project_id().to_string(),
            });
        }
        let latest = self.latest_baseline().map_or(0, Baseline::version);
        if baseline.version() <= latest {
            return Err(ScheduleError::BaselineVersionConflict {
                version: baseline.version(),
                latest,
            });
        }
        self.baselines.push(baseline);
        Ok(())
    }

    pub(crate) fn next_baseline_version(&self) -> u32 {
        self.latest_baseline().map_or(1, |baseline| baseline.version() + 1)
    }

    pub(crate) fn push_baseline(&mut self, baseline: Baseline) {
        self.baselines.push(baseline);
    }

    pub(crate) fn set_schedule(&mut self, schedule: Arc<ComputedSchedule>) {
        self.schedule = Some(schedule);
    }

    fn invalidate(&mut self) {
        if self.schedule.take().is_some() {
            debug!(project = %self.metadata.project_id, "input changed, dropping computed schedule");
        }
    }
}

fn validate_calendar(metadata: &ProjectMetadata) -> EngineResult<()> {
    match &metadata.calendar {
        Some(config) => WorkCalendar::from_config(config)
            .map(|_| ())
            .map_err(ScheduleError::InvalidCalendar),
        None => Ok(()),
    }
}
