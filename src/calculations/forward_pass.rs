use std::collections::HashMap;

use crate::error::{EngineResult, ScheduleError};
use crate::graph::ScheduleDag;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyDates {
    pub early_start: i64,
    pub early_finish: i64,
    pub binding_predecessor: Option<TaskId>,
}

pub struct ForwardPass<'a> {
    dag: &'a ScheduleDag,
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag) -> Self {
        Self { dag }
    }

    /// Computes ES/EF in topological order.
    ///
    /// `earliest` holds start-no-earlier-than constraints; tasks without
    /// predecessors or constraints start at `project_start`.
    pub fn execute(
        &self,
        project_start: i64,
        earliest: &HashMap<TaskId, i64>,
    ) -> EngineResult<HashMap<TaskId, EarlyDates>> {
        let mut results: HashMap<TaskId, EarlyDates> =
            HashMap::with_capacity(self.dag.task_count());

        for &task_id in self.dag.topological_order() {
            let duration = self.dag.duration(task_id);
            if duration < 0 {
                return Err(ScheduleError::InfeasibleSchedule {
                    task_id,
                    reason: format!("negative duration {duration}"),
                });
            }

            let floor = earliest
                .get(&task_id)
                .map_or(project_start, |&constraint| constraint.max(project_start));

            // Binding predecessor: largest bound, then latest EF + lag; the
            // id-sorted iteration keeps the smallest id on full ties.
            let mut binding: Option<(i64, i64, TaskId)> = None;
            for (pred_id, rel) in self.dag.predecessors(task_id) {
                let Some(pred) = results.get(&pred_id) else {
                    continue;
                };
                let pred_duration = self.dag.duration(pred_id);
                let bound = rel
                    .earliest_successor_start(pred.early_start, pred_duration, duration)
                    .ok_or_else(|| overflow(task_id))?;
                let finish_plus_lag = pred.early_finish.saturating_add(rel.lag);
                let better = match binding {
                    None => true,
                    Some((best_bound, best_finish, _)) => {
                        (bound, finish_plus_lag) > (best_bound, best_finish)
                    }
                };
                if better {
                    binding = Some((bound, finish_plus_lag, pred_id));
                }
            }

            let (early_start, binding_predecessor) = match binding {
                Some((bound, _, pred_id)) if bound >= floor => (bound, Some(pred_id)),
                _ => (floor, None),
            };
            let early_finish = early_start
                .checked_add(duration)
                .ok_or_else(|| overflow(task_id))?;

            results.insert(
                task_id,
                EarlyDates {
                    early_start,
                    early_finish,
                    binding_predecessor,
                },
            );
        }

        Ok(results)
    }
}

fn overflow(task_id: TaskId) -> ScheduleError {
    ScheduleError::InfeasibleSchedule {
        task_id,
        reason: "dependency lag overflows the schedule horizon".into(),
    }
}
