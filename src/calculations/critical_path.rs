//! Critical path calculator: forward pass, backward pass, float and chain
//! enumeration over a validated [`ScheduleDag`].

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::backward_pass::BackwardPass;
use super::forward_pass::ForwardPass;
use crate::error::{EngineResult, ScheduleError};
use crate::graph::ScheduleDag;
use crate::project::Project;
use crate::schedule::ComputedSchedule;
use crate::task::{TaskId, TaskSchedule};

pub struct CriticalPathCalculator<'a> {
    dag: &'a ScheduleDag,
    project_start: i64,
    earliest: HashMap<TaskId, i64>,
    max_chains: usize,
}

impl<'a> CriticalPathCalculator<'a> {
    pub fn new(dag: &'a ScheduleDag, project: &Project, max_chains: usize) -> Self {
        let earliest = project
            .tasks()
            .iter()
            .filter_map(|task| task.earliest_start.map(|period| (task.id, period)))
            .collect();
        Self {
            dag,
            project_start: project.metadata().start_period,
            earliest,
            max_chains,
        }
    }

    /// Pins tasks to start no earlier than the given periods, on top of
    /// their own constraints. Leveling uses this to recompute floats for
    /// shifted starts.
    pub fn with_start_overrides(mut self, starts: &BTreeMap<TaskId, i64>) -> Self {
        for (&task_id, &start) in starts {
            let entry = self.earliest.entry(task_id).or_insert(start);
            *entry = (*entry).max(start);
        }
        self
    }

    pub fn execute(&self) -> EngineResult<ComputedSchedule> {
        let early = ForwardPass::new(self.dag).execute(self.project_start, &self.earliest)?;
        let project_finish = early
            .values()
            .map(|dates| dates.early_finish)
            .max()
            .unwrap_or(self.project_start);
        let late = BackwardPass::new(self.dag).execute(project_finish)?;

        let mut tasks: BTreeMap<TaskId, TaskSchedule> = BTreeMap::new();
        for &task_id in self.dag.topological_order() {
            let (Some(dates), Some(&(late_start, late_finish))) =
                (early.get(&task_id), late.get(&task_id))
            else {
                continue;
            };
            let duration = self.dag.duration(task_id);
            let total_float = late_start - dates.early_start;
            if total_float < 0 {
                return Err(ScheduleError::InfeasibleSchedule {
                    task_id,
                    reason: format!("negative total float {total_float}"),
                });
            }

            let successors = self.dag.successors(task_id);
            let free_float = if successors.is_empty() {
                project_finish - dates.early_finish
            } else {
                successors
                    .iter()
                    .filter_map(|(succ_id, rel)| {
                        let succ = early.get(succ_id)?;
                        rel.slack(
                            dates.early_start,
                            duration,
                            succ.early_start,
                            self.dag.duration(*succ_id),
                        )
                    })
                    .min()
                    .unwrap_or(0)
            };

            tasks.insert(
                task_id,
                TaskSchedule {
                    task_id,
                    duration,
                    early_start: dates.early_start,
                    early_finish: dates.early_finish,
                    late_start,
                    late_finish,
                    total_float,
                    // free float never exceeds total float
                    free_float: free_float.clamp(0, total_float),
                    is_critical: total_float == 0,
                    binding_predecessor: dates.binding_predecessor,
                },
            );
        }

        let chains = self.critical_chains(&tasks);
        debug!(
            tasks = tasks.len(),
            project_finish,
            chains = chains.len(),
            "critical path computed"
        );

        Ok(ComputedSchedule::new(
            self.project_start,
            project_finish,
            tasks,
            self.dag.topological_order().to_vec(),
            chains,
        ))
    }

    /// Enumerates chains of critical tasks joined by driving (zero-slack)
    /// dependencies, up to `max_chains`.
    fn critical_chains(&self, tasks: &BTreeMap<TaskId, TaskSchedule>) -> Vec<Vec<TaskId>> {
        let is_critical = |id: &TaskId| tasks.get(id).is_some_and(|t| t.is_critical);
        let driving = |from: TaskId, to: TaskId| -> Option<bool> {
            let (pred, succ) = (tasks.get(&from)?, tasks.get(&to)?);
            Some(self.dag.successors(from).iter().any(|(succ_id, rel)| {
                *succ_id == to
                    && rel.slack(pred.early_start, pred.duration, succ.early_start, succ.duration)
                        == Some(0)
            }))
        };

        let mut next: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut has_driver: HashMap<TaskId, bool> = HashMap::new();
        for &task_id in self.dag.topological_order() {
            if !is_critical(&task_id) {
                continue;
            }
            let mut outgoing: Vec<TaskId> = self
                .dag
                .successors(task_id)
                .into_iter()
                .map(|(succ_id, _)| succ_id)
                .filter(|succ_id| is_critical(succ_id))
                .filter(|&succ_id| driving(task_id, succ_id).unwrap_or(false))
                .collect();
            outgoing.dedup();
            for succ_id in &outgoing {
                has_driver.insert(*succ_id, true);
            }
            next.insert(task_id, outgoing);
        }

        let mut chains = Vec::new();
        for &start in self.dag.topological_order() {
            if !is_critical(&start) || has_driver.get(&start).copied().unwrap_or(false) {
                continue;
            }
            // Depth-first walk with an explicit stack of partial chains
            let mut stack = vec![vec![start]];
            while let Some(chain) = stack.pop() {
                if chains.len() >= self.max_chains {
                    warn!(limit = self.max_chains, "critical chain enumeration truncated");
                    return chains;
                }
                let Some(&tail) = chain.last() else {
                    continue;
                };
                let outgoing = next.get(&tail).map(Vec::as_slice).unwrap_or(&[]);
                if outgoing.is_empty() {
                    chains.push(chain);
                    continue;
                }
                for succ_id in outgoing.iter().rev() {
                    let mut extended = chain.clone();
                    extended.push(*succ_id);
                    stack.push(extended);
                }
            }
        }
        chains
    }
}
