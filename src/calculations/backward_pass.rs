use std::collections::HashMap;

use crate::error::{EngineResult, ScheduleError};
use crate::graph::ScheduleDag;
use crate::task::TaskId;

pub struct BackwardPass<'a> {
    dag: &'a ScheduleDag,
}

impl<'a> BackwardPass<'a> {
    pub fn new(dag: &'a ScheduleDag) -> Self {
        Self { dag }
    }

    /// Computes (LS, LF) keyed by task id.
    pub fn execute(&self, project_finish: i64) -> EngineResult<HashMap<TaskId, (i64, i64)>> {
        let mut results: HashMap<TaskId, (i64, i64)> =
            HashMap::with_capacity(self.dag.task_count());

        // Reverse topological order
        for &task_id in self.dag.topological_order().iter().rev() {
            let duration = self.dag.duration(task_id);

            // Never later than the project finish, even when a successor
            // would tolerate it (SS / SF relationships).
            let mut lf = project_finish;
            for (succ_id, rel) in self.dag.successors(task_id) {
                let Some(&(succ_ls, _)) = results.get(&succ_id) else {
                    continue;
                };
                let bound = rel
                    .latest_predecessor_finish(succ_ls, self.dag.duration(succ_id), duration)
                    .ok_or_else(|| ScheduleError::InfeasibleSchedule {
                        task_id,
                        reason: "dependency lag overflows the schedule horizon".into(),
                    })?;
                lf = lf.min(bound);
            }

            let ls = lf - duration;
            results.insert(task_id, (ls, lf));
        }

        Ok(results)
    }
}
