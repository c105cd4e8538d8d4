use crate::error::{EngineResult, ScheduleError};
use crate::resource::{Assignment, Resource};
use crate::task::{Task, TaskId};
use std::collections::HashSet;

const EPSILON: f64 = 1e-6;

pub fn validate_task_collection(tasks: &[Task]) -> EngineResult<()> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(ScheduleError::DuplicateTask(task.id));
        }
    }
    Ok(())
}

pub fn validate_resource(resource: &Resource) -> EngineResult<()> {
    if resource.id.trim().is_empty() {
        return Err(ScheduleError::InvalidResource {
            resource_id: resource.id.clone(),
            reason: "resource id must not be empty".into(),
        });
    }
    if !resource.capacity.is_finite() || resource.capacity < -EPSILON {
        return Err(ScheduleError::InvalidResource {
            resource_id: resource.id.clone(),
            reason: format!("invalid capacity {}", resource.capacity),
        });
    }
    Ok(())
}

pub fn validate_resource_collection(resources: &[Resource]) -> EngineResult<()> {
    let mut seen_ids = HashSet::with_capacity(resources.len());
    for resource in resources {
        validate_resource(resource)?;
        if !seen_ids.insert(resource.id.as_str()) {
            return Err(ScheduleError::DuplicateResource(resource.id.clone()));
        }
    }
    Ok(())
}

/// Checks the allocation bounds and that both ends of the assignment exist.
pub fn validate_assignment(
    assignment: &Assignment,
    task_ids: &HashSet<TaskId>,
    resource_ids: &HashSet<&str>,
) -> EngineResult<()> {
    let invalid = |reason: String| ScheduleError::InvalidAssignment {
        task_id: assignment.task_id,
        resource_id: assignment.resource_id.clone(),
        reason,
    };

    if !assignment.allocation.is_finite()
        || assignment.allocation <= 0.0
        || assignment.allocation > 1.0 + EPSILON
    {
        return Err(invalid(format!(
            "allocation {} must be in (0, 1]",
            assignment.allocation
        )));
    }
    if !assignment.units.is_finite() || assignment.units <= 0.0 {
        return Err(invalid(format!(
            "units {} must be positive",
            assignment.units
        )));
    }
    if !task_ids.contains(&assignment.task_id) {
        return Err(invalid(format!("unknown task {}", assignment.task_id)));
    }
    if !resource_ids.contains(assignment.resource_id.as_str()) {
        return Err(ScheduleError::UnknownResourceReference {
            task_id: assignment.task_id,
            resource_id: assignment.resource_id.clone(),
        });
    }
    Ok(())
}

pub fn validate_assignments(
    assignments: &[Assignment],
    tasks: &[Task],
    resources: &[Resource],
) -> EngineResult<()> {
    let task_ids: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();
    let resource_ids: HashSet<&str> = resources.iter().map(|r| r.id.as_str()).collect();
    for assignment in assignments {
        validate_assignment(assignment, &task_ids, &resource_ids)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_task_ids() {
        let tasks = vec![Task::new(1, "A", 1), Task::new(1, "B", 2)];
        assert!(matches!(
            validate_task_collection(&tasks),
            Err(ScheduleError::DuplicateTask(1))
        ));
    }

    #[test]
    fn allocation_must_be_a_positive_fraction() {
        let tasks = vec![Task::new(1, "A", 1)];
        let resources = vec![Resource::new("crew", 1.0)];
        for allocation in [0.0, -0.5, 1.5, f64::NAN] {
            let assignments = vec![Assignment::new(1, "crew", allocation)];
            assert!(matches!(
                validate_assignments(&assignments, &tasks, &resources),
                Err(ScheduleError::InvalidAssignment { .. })
            ));
        }
        let ok = vec![Assignment::new(1, "crew", 1.0)];
        assert!(validate_assignments(&ok, &tasks, &resources).is_ok());
    }

    #[test]
    fn unknown_resource_is_reported_by_name() {
        let tasks = vec![Task::new(1, "A", 1)];
        let assignments = vec![Assignment::new(1, "ghost", 0.5)];
        match validate_assignments(&assignments, &tasks, &[]) {
            Err(ScheduleError::UnknownResourceReference { resource_id, .. }) => {
                assert_eq!(resource_id, "ghost")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
