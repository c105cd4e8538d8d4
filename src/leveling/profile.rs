//! Per-resource, per-period demand built from task starts and assignments.

use std::collections::{BTreeMap, HashMap};

use super::ResourceConflict;
use crate::graph::ScheduleDag;
use crate::project::Project;
use crate::task::TaskId;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodLoad {
    pub demand: f64,
    pub tasks: Vec<TaskId>,
}

/// Demand keyed by resource id, then period.
#[derive(Debug, Clone, Default)]
pub struct DemandProfile {
    loads: BTreeMap<String, BTreeMap<i64, PeriodLoad>>,
}

impl DemandProfile {
    pub fn build(project: &Project, dag: &ScheduleDag, starts: &BTreeMap<TaskId, i64>) -> Self {
        let mut loads: BTreeMap<String, BTreeMap<i64, PeriodLoad>> = BTreeMap::new();
        for assignment in project.assignments() {
            let Some(&start) = starts.get(&assignment.task_id) else {
                continue;
            };
            let duration = dag.duration(assignment.task_id);
            let periods = loads.entry(assignment.resource_id.clone()).or_default();
            for period in start..start + duration {
                let load = periods.entry(period).or_default();
                load.demand += assignment.demand();
                if !load.tasks.contains(&assignment.task_id) {
                    load.tasks.push(assignment.task_id);
                }
            }
        }
        for load in loads.values_mut().flat_map(|periods| periods.values_mut()) {
            load.tasks.sort_unstable();
        }
        Self { loads }
    }

    pub fn demand(&self, resource_id: &str, period: i64) -> f64 {
        self.loads
            .get(resource_id)
            .and_then(|periods| periods.get(&period))
            .map_or(0.0, |load| load.demand)
    }

    /// Every (resource, period) whose demand exceeds capacity, ordered by
    /// period then resource id.
    pub fn over_allocations(&self, project: &Project) -> Vec<ResourceConflict> {
        let mut conflicts = Vec::new();
        for (resource_id, periods) in &self.loads {
            let Some(resource) = project.resource(resource_id) else {
                continue;
            };
            for (&period, load) in periods {
                let capacity = resource.capacity_at(period);
                if load.demand > capacity + EPSILON {
                    conflicts.push(ResourceConflict {
                        resource_id: resource_id.clone(),
                        period,
                        demand: load.demand,
                        capacity,
                        tasks: load.tasks.clone(),
                    });
                }
            }
        }
        conflicts.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then_with(|| a.resource_id.cmp(&b.resource_id))
        });
        conflicts
    }

    /// Peak demand per resource, for reporting.
    pub fn peak_demand(&self) -> HashMap<&str, f64> {
        self.loads
            .iter()
            .map(|(resource_id, periods)| {
                let peak = periods
                    .values()
                    .map(|load| load.demand)
                    .fold(0.0_f64, f64::max);
                (resource_id.as_str(), peak)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ProjectMetadata;
    use crate::resource::{Assignment, Resource, ResourceCalendar};
    use crate::task::Task;

    fn project() -> Project {
        Project::from_records(
            ProjectMetadata::default(),
            vec![Task::new(1, "A", 2), Task::new(2, "B", 3)],
            Vec::new(),
            vec![Resource::new("crew", 1.0)
                .with_calendar(ResourceCalendar::with_unavailable([4]))],
            vec![
                Assignment::new(1, "crew", 1.0),
                Assignment::new(2, "crew", 0.5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn demand_sums_overlapping_assignments() {
        let project = project();
        let dag = ScheduleDag::build(&project).unwrap();
        let starts = BTreeMap::from([(1, 0), (2, 1)]);
        let profile = DemandProfile::build(&project, &dag, &starts);

        assert_eq!(profile.demand("crew", 0), 1.0);
        assert_eq!(profile.demand("crew", 1), 1.5);
        assert_eq!(profile.demand("crew", 3), 0.5);
        assert_eq!(profile.demand("crew", 4), 0.0);

        let conflicts = profile.over_allocations(&project);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].period, 1);
        assert_eq!(conflicts[0].tasks, vec![1, 2]);
        assert_eq!(profile.peak_demand().get("crew").copied(), Some(1.5));
    }

    #[test]
    fn unavailable_period_counts_as_zero_capacity() {
        let project = project();
        let dag = ScheduleDag::build(&project).unwrap();
        let starts = BTreeMap::from([(1, 10), (2, 3)]);
        let conflicts = DemandProfile::build(&project, &dag, &starts).over_allocations(&project);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].period, 4);
        assert_eq!(conflicts[0].capacity, 0.0);
    }
}
