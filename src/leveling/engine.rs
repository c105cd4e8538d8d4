use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use super::profile::DemandProfile;
use super::{
    CancellationToken, LevelingMode, LevelingOutcome, LevelingStatus, ResourceConflict, TaskShift,
};
use crate::calculations::CriticalPathCalculator;
use crate::error::{EngineResult, ScheduleError};
use crate::graph::ScheduleDag;
use crate::project::Project;
use crate::schedule::ComputedSchedule;
use crate::task::TaskId;

const EPSILON: f64 = 1e-6;

/// What happened to one conflict.
enum Resolution {
    Moved {
        starts: BTreeMap<TaskId, i64>,
        extended: bool,
    },
    Unresolved,
}

/// Priority-list leveling over a CPM-annotated schedule.
///
/// Each iteration picks the earliest over-allocated (period, resource) pair
/// and delays the conflicting task with the lowest priority to keep just
/// past that period. Successors are pushed along so every dependency keeps
/// holding; durations and relationships are never touched.
pub struct ResourceLeveler<'a> {
    project: &'a Project,
    dag: &'a ScheduleDag,
    mode: LevelingMode,
    max_iterations: usize,
    max_chains: usize,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> ResourceLeveler<'a> {
    pub fn new(
        project: &'a Project,
        dag: &'a ScheduleDag,
        mode: LevelingMode,
        max_iterations: usize,
        max_chains: usize,
    ) -> Self {
        Self {
            project,
            dag,
            mode,
            max_iterations,
            max_chains,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn execute(&self, initial: &ComputedSchedule) -> EngineResult<LevelingOutcome> {
        let original: BTreeMap<TaskId, i64> = initial
            .tasks()
            .map(|task| (task.task_id, task.early_start))
            .collect();
        let mut starts = original.clone();
        let mut current = initial.clone();
        let mut unresolved: HashSet<(String, i64)> = HashSet::new();
        let mut iterations = 0usize;

        let status = loop {
            if self.cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(iterations, "resource leveling cancelled");
                break LevelingStatus::Cancelled;
            }

            let profile = DemandProfile::build(self.project, self.dag, &starts);
            let conflicts = profile.over_allocations(self.project);
            let Some(conflict) = conflicts
                .iter()
                .find(|conflict| !unresolved.contains(&conflict.key()))
            else {
                break LevelingStatus::Complete;
            };

            match self.resolve(conflict, &starts, initial, &current) {
                Resolution::Moved {
                    starts: next,
                    extended,
                } => {
                    // Only moves count against the bound.
                    if iterations >= self.max_iterations {
                        let partial = self.outcome(
                            LevelingStatus::IterationLimitReached,
                            &original,
                            &starts,
                            iterations,
                        )?;
                        warn!(
                            iterations,
                            remaining = partial.conflicts.len(),
                            "resource leveling did not converge"
                        );
                        let remaining = partial.conflicts.clone();
                        return Err(ScheduleError::LevelingDidNotConverge {
                            iterations,
                            partial: Box::new(partial),
                            remaining,
                        });
                    }
                    iterations += 1;
                    starts = next;
                    if extended {
                        current = self.recompute(&starts)?;
                        debug!(
                            project_finish = current.project_finish(),
                            "project extended by leveling"
                        );
                    }
                }
                Resolution::Unresolved => {
                    let run = unresolved_run(&conflicts, conflict);
                    warn!(
                        %conflict,
                        periods = run.len(),
                        "conflict cannot be resolved in {} mode",
                        self.mode
                    );
                    unresolved.extend(run);
                }
            }
        };

        let outcome = self.outcome(status, &original, &starts, iterations)?;
        info!(
            mode = %self.mode,
            iterations,
            shifted = outcome.shifts.len(),
            remaining = outcome.conflicts.len(),
            project_finish = outcome.schedule.project_finish(),
            "resource leveling finished"
        );
        Ok(outcome)
    }

    /// `priority` is the schedule leveling started from; ranks stay fixed
    /// for the whole run.
    fn resolve(
        &self,
        conflict: &ResourceConflict,
        starts: &BTreeMap<TaskId, i64>,
        priority: &ComputedSchedule,
        current: &ComputedSchedule,
    ) -> Resolution {
        if let [only] = conflict.tasks.as_slice() {
            if self.exceeds_capacity_alone(*only, &conflict.resource_id) {
                return Resolution::Unresolved;
            }
        }

        let candidates = self.rank_candidates(conflict, priority);
        let new_start = conflict.period + 1;

        match self.mode {
            LevelingMode::WithinFloat => {
                for &task_id in &candidates {
                    if current.task(task_id).is_some_and(|t| t.is_critical) {
                        continue;
                    }
                    let trial = self.shifted(starts, task_id, new_start);
                    if within_float(&trial, current) {
                        debug!(task_id, new_start, period = conflict.period, "delayed within float");
                        return Resolution::Moved {
                            starts: trial,
                            extended: false,
                        };
                    }
                }
                Resolution::Unresolved
            }
            LevelingMode::AllowExtension => {
                let Some(&task_id) = candidates.first() else {
                    return Resolution::Unresolved;
                };
                let trial = self.shifted(starts, task_id, new_start);
                let extended = !within_float(&trial, current);
                debug!(task_id, new_start, period = conflict.period, extended, "delayed");
                Resolution::Moved {
                    starts: trial,
                    extended,
                }
            }
        }
    }

    /// Lowest priority to keep first: non-critical, larger total float,
    /// later late finish, then smaller id.
    fn rank_candidates(
        &self,
        conflict: &ResourceConflict,
        priority: &ComputedSchedule,
    ) -> Vec<TaskId> {
        let mut ranked: Vec<(bool, Reverse<i64>, Reverse<i64>, TaskId)> = conflict
            .tasks
            .iter()
            .filter_map(|&task_id| {
                let task = priority.task(task_id)?;
                Some((
                    task.is_critical,
                    Reverse(task.total_float),
                    Reverse(task.late_finish),
                    task_id,
                ))
            })
            .collect();
        ranked.sort();
        ranked.into_iter().map(|(_, _, _, id)| id).collect()
    }

    /// Moves one task to `new_start` and pushes successors forward until
    /// every dependency holds again. Nothing ever moves earlier.
    fn shifted(
        &self,
        starts: &BTreeMap<TaskId, i64>,
        task_id: TaskId,
        new_start: i64,
    ) -> BTreeMap<TaskId, i64> {
        let mut trial = starts.clone();
        if let Some(start) = trial.get_mut(&task_id) {
            *start = (*start).max(new_start);
        }
        for &id in self.dag.topological_order() {
            let duration = self.dag.duration(id);
            let required = self
                .dag
                .predecessors(id)
                .into_iter()
                .filter_map(|(pred_id, rel)| {
                    let pred_start = *trial.get(&pred_id)?;
                    rel.earliest_successor_start(pred_start, self.dag.duration(pred_id), duration)
                })
                .max();
            if let (Some(required), Some(start)) = (required, trial.get_mut(&id)) {
                if *start < required {
                    *start = required;
                }
            }
        }
        trial
    }

    fn exceeds_capacity_alone(&self, task_id: TaskId, resource_id: &str) -> bool {
        let Some(resource) = self.project.resource(resource_id) else {
            return false;
        };
        let demand: f64 = self
            .project
            .assignments_for_task(task_id)
            .filter(|assignment| assignment.resource_id == resource_id)
            .map(|assignment| assignment.demand())
            .sum();
        demand > resource.capacity + EPSILON
    }

    fn recompute(&self, starts: &BTreeMap<TaskId, i64>) -> EngineResult<ComputedSchedule> {
        CriticalPathCalculator::new(self.dag, self.project, self.max_chains)
            .with_start_overrides(starts)
            .execute()
    }

    fn outcome(
        &self,
        status: LevelingStatus,
        original: &BTreeMap<TaskId, i64>,
        starts: &BTreeMap<TaskId, i64>,
        iterations: usize,
    ) -> EngineResult<LevelingOutcome> {
        let schedule = self.recompute(starts)?;
        let profile = DemandProfile::build(self.project, self.dag, starts);
        for (resource_id, peak) in profile.peak_demand() {
            debug!(resource_id, peak, "leveled peak demand");
        }
        let shifts = starts
            .iter()
            .filter_map(|(&task_id, &leveled_start)| {
                let original_start = *original.get(&task_id)?;
                (leveled_start != original_start).then_some(TaskShift {
                    task_id,
                    original_start,
                    leveled_start,
                })
            })
            .collect();

        Ok(LevelingOutcome {
            mode: self.mode,
            status,
            conflicts: profile.over_allocations(self.project),
            schedule,
            shifts,
            iterations,
        })
    }
}

fn within_float(starts: &BTreeMap<TaskId, i64>, schedule: &ComputedSchedule) -> bool {
    starts
        .iter()
        .all(|(id, start)| schedule.task(*id).is_none_or(|task| *start <= task.late_start))
}

/// Keys of `first` and of the conflicts in the periods right after it on the
/// same resource with the same task set.
fn unresolved_run(conflicts: &[ResourceConflict], first: &ResourceConflict) -> Vec<(String, i64)> {
    let mut run = Vec::new();
    let mut expected = first.period;
    for conflict in conflicts
        .iter()
        .filter(|c| c.resource_id == first.resource_id && c.period >= first.period)
    {
        if conflict.period != expected || conflict.tasks != first.tasks {
            break;
        }
        run.push(conflict.key());
        expected += 1;
    }
    run
}
