//! Pipeline entry points: graph build, critical path, leveling, baselines
//! and export over a [`Project`].

use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

use crate::baseline::{self, VarianceReport};
use crate::calculations::CriticalPathCalculator;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::export;
use crate::graph::ScheduleDag;
use crate::leveling::{CancellationToken, LevelingMode, LevelingOutcome, ResourceLeveler};
use crate::project::Project;
use crate::schedule::ComputedSchedule;

#[derive(Debug, Clone, Default)]
pub struct ScheduleEngine {
    config: EngineConfig,
}

impl ScheduleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates the dependency graph, runs the forward and backward passes
    /// and stores the result on the project.
    pub fn compute_critical_path(&self, project: &mut Project) -> EngineResult<Arc<ComputedSchedule>> {
        let dag = ScheduleDag::build(project)?;
        let schedule = CriticalPathCalculator::new(&dag, project, self.config.max_critical_chains)
            .execute()?;
        info!(
            project = project.id(),
            "{}",
            schedule.summary().to_cli_summary()
        );
        let schedule = Arc::new(schedule);
        project.set_schedule(Arc::clone(&schedule));
        Ok(schedule)
    }

    /// Levels a fresh critical path run with `mode`, or the configured
    /// default when `None`. The leveled schedule replaces the stored one.
    pub fn level_resources(
        &self,
        project: &mut Project,
        mode: Option<LevelingMode>,
    ) -> EngineResult<LevelingOutcome> {
        self.level(project, mode, None)
    }

    pub fn level_resources_with_cancel(
        &self,
        project: &mut Project,
        mode: Option<LevelingMode>,
        cancel: &CancellationToken,
    ) -> EngineResult<LevelingOutcome> {
        self.level(project, mode, Some(cancel))
    }

    fn level(
        &self,
        project: &mut Project,
        mode: Option<LevelingMode>,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<LevelingOutcome> {
        let mode = mode.unwrap_or(self.config.default_leveling_mode);
        let dag = ScheduleDag::build(project)?;
        let initial =
            CriticalPathCalculator::new(&dag, project, self.config.max_critical_chains).execute()?;

        let mut leveler = ResourceLeveler::new(
            project,
            &dag,
            mode,
            self.config.max_leveling_iterations,
            self.config.max_critical_chains,
        );
        if let Some(token) = cancel {
            leveler = leveler.with_cancellation(token);
        }
        let outcome = leveler.execute(&initial)?;
        project.set_schedule(Arc::new(outcome.schedule.clone()));
        Ok(outcome)
    }

    pub fn create_baseline(&self, project: &mut Project, label: &str) -> EngineResult<u32> {
        baseline::create_baseline(project, label)
    }

    pub fn compare_to_baseline(&self, project: &Project, version: u32) -> EngineResult<VarianceReport> {
        baseline::compare_to_baseline(project, version)
    }

    pub fn export_schedule(&self, project: &Project, format: &str) -> EngineResult<Vec<u8>> {
        export::export_schedule(project, format)
    }

    /// Computes independent projects in parallel. Results line up with the
    /// input slice.
    pub fn compute_portfolio(
        &self,
        projects: &mut [Project],
    ) -> Vec<EngineResult<Arc<ComputedSchedule>>> {
        let results: Vec<_> = projects
            .par_iter_mut()
            .map(|project| self.compute_critical_path(project))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "portfolio computed with failures");
        }
        results
    }
}

impl From<EngineConfig> for ScheduleEngine {
    fn from(config: EngineConfig) -> Self {
        Self::new(config)
    }
}

/// Shorthand for callers that only need the default engine.
pub fn compute_critical_path(project: &mut Project) -> EngineResult<Arc<ComputedSchedule>> {
    ScheduleEngine::default().compute_critical_path(project)
}

pub fn level_resources(project: &mut Project, mode: LevelingMode) -> EngineResult<LevelingOutcome> {
    ScheduleEngine::default().level_resources(project, Some(mode))
}
