//! Export serializer: renders a computed schedule for external consumers.
//!
//! Output is a pure function of the project's records, its computed
//! schedule and its latest baseline. Rows are in task id order and edges in
//! (predecessor, successor, kind) order, so exporting twice yields the same
//! bytes.

pub mod table;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::baseline::Baseline;
use crate::error::{EngineResult, ScheduleError};
use crate::project::Project;
use crate::schedule::ComputedSchedule;
use crate::task::TaskId;

pub use table::{render_df_as_text_table, to_dataframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Table,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Table => "table",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "table" | "text" => Ok(ExportFormat::Table),
            _ => Err(ScheduleError::UnsupportedExportFormat(s.to_string())),
        }
    }
}

/// One exported task row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub task_id: TaskId,
    pub name: String,
    pub duration: i64,
    pub early_start: i64,
    pub early_finish: i64,
    pub late_start: i64,
    pub late_finish: i64,
    pub total_float: i64,
    pub free_float: i64,
    pub is_critical: bool,
    pub binding_predecessor: Option<TaskId>,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    /// Resource ids assigned to the task, sorted and joined with `;`.
    pub resources: String,
    pub wbs_code: Option<String>,
    pub notes: Option<String>,
    pub baseline_start: Option<i64>,
    pub baseline_finish: Option<i64>,
    pub finish_variance: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRow {
    pub predecessor: TaskId,
    pub successor: TaskId,
    pub kind: &'static str,
    pub lag: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDocument {
    pub project_id: String,
    pub project_name: String,
    pub project_start: i64,
    pub project_finish: i64,
    pub project_duration: i64,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub critical_path: Vec<TaskId>,
    pub critical_chains: Vec<Vec<TaskId>>,
    pub baseline_version: Option<u32>,
    pub tasks: Vec<ScheduleRow>,
    pub dependencies: Vec<EdgeRow>,
}

impl ScheduleDocument {
    pub fn build(project: &Project) -> EngineResult<Self> {
        let schedule = project
            .schedule()
            .ok_or_else(|| ScheduleError::NoScheduleComputed(project.id().to_string()))?;
        Self::from_schedule(project, schedule)
    }

    fn from_schedule(project: &Project, schedule: &ComputedSchedule) -> EngineResult<Self> {
        let metadata = project.metadata();
        let calendar = project.working_calendar()?;
        let baseline = project.latest_baseline();
        let dated = |from: i64, to: i64| -> EngineResult<(Option<NaiveDate>, Option<NaiveDate>)> {
            let Some(anchor) = metadata.start_date else {
                return Ok((None, None));
            };
            let offset = metadata.start_period;
            let start = calendar.date_for_period(anchor, from - offset);
            let finish = calendar.finish_date(anchor, from - offset, to - offset);
            match (start, finish) {
                (Some(start), Some(finish)) => Ok((Some(start), Some(finish))),
                _ => Err(ScheduleError::Export(format!(
                    "periods {from}..{to} fall outside the calendar date range"
                ))),
            }
        };

        let tasks = schedule
            .tasks()
            .map(|computed| {
                let record = project.task(computed.task_id);
                let (start_date, finish_date) =
                    dated(computed.early_start, computed.early_finish)?;
                let base = baseline.and_then(|b| b.task(computed.task_id));
                Ok(ScheduleRow {
                    task_id: computed.task_id,
                    name: record.map(|t| t.name.clone()).unwrap_or_default(),
                    duration: computed.duration,
                    early_start: computed.early_start,
                    early_finish: computed.early_finish,
                    late_start: computed.late_start,
                    late_finish: computed.late_finish,
                    total_float: computed.total_float,
                    free_float: computed.free_float,
                    is_critical: computed.is_critical,
                    binding_predecessor: computed.binding_predecessor,
                    start_date,
                    finish_date,
                    resources: resources_for(project, computed.task_id),
                    wbs_code: record.and_then(|t| t.wbs_code.clone()),
                    notes: record.and_then(|t| t.notes.clone()),
                    baseline_start: base.map(|b| b.early_start),
                    baseline_finish: base.map(|b| b.early_finish),
                    finish_variance: base.map(|b| computed.early_finish - b.early_finish),
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let mut dependencies: Vec<_> = project.dependencies().iter().collect();
        dependencies.sort_by_key(|dep| dep.sort_key());
        let dependencies = dependencies
            .into_iter()
            .map(|dep| EdgeRow {
                predecessor: dep.predecessor,
                successor: dep.successor,
                kind: dep.kind().as_str(),
                lag: dep.lag(),
            })
            .collect();

        let (start_date, finish_date) =
            dated(schedule.project_start(), schedule.project_finish())?;
        Ok(Self {
            project_id: metadata.project_id.clone(),
            project_name: metadata.project_name.clone(),
            project_start: schedule.project_start(),
            project_finish: schedule.project_finish(),
            project_duration: schedule.project_duration(),
            start_date,
            finish_date,
            critical_path: schedule.critical_path().to_vec(),
            critical_chains: schedule.critical_chains().to_vec(),
            baseline_version: baseline.map(Baseline::version),
            tasks,
            dependencies,
        })
    }
}

fn resources_for(project: &Project, task_id: TaskId) -> String {
    let mut ids: Vec<&str> = project
        .assignments_for_task(task_id)
        .map(|assignment| assignment.resource_id.as_str())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.join(";")
}

/// Serializes the project's computed schedule in the named format.
pub fn export_schedule(project: &Project, format: &str) -> EngineResult<Vec<u8>> {
    let format: ExportFormat = format.parse()?;
    export_schedule_as(project, format)
}

pub fn export_schedule_as(project: &Project, format: ExportFormat) -> EngineResult<Vec<u8>> {
    let document = ScheduleDocument::build(project)?;
    let bytes = match format {
        ExportFormat::Json => to_json(&document)?,
        ExportFormat::Csv => to_csv(&document)?,
        ExportFormat::Table => {
            let df = to_dataframe(&document.tasks)
                .map_err(|err| ScheduleError::Export(err.to_string()))?;
            render_df_as_text_table(&df).into_bytes()
        }
    };
    debug!(
        project = project.id(),
        %format,
        bytes = bytes.len(),
        "schedule exported"
    );
    Ok(bytes)
}

fn to_json(document: &ScheduleDocument) -> EngineResult<Vec<u8>> {
    serde_json::to_vec_pretty(document).map_err(|err| ScheduleError::Export(err.to_string()))
}

/// Task table, an empty separator record, then the dependency edge table.
fn to_csv(document: &ScheduleDocument) -> EngineResult<Vec<u8>> {
    let export_err = |err: csv::Error| ScheduleError::Export(err.to_string());
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in &document.tasks {
        writer.serialize(row).map_err(export_err)?;
    }
    if document.tasks.is_empty() {
        writer
            .write_record(TASK_COLUMNS)
            .map_err(export_err)?;
    }
    writer.write_record(None::<&[u8]>).map_err(export_err)?;
    writer
        .write_record(["predecessor", "successor", "kind", "lag"])
        .map_err(export_err)?;
    for edge in &document.dependencies {
        writer
            .write_record([
                edge.predecessor.to_string(),
                edge.successor.to_string(),
                edge.kind.to_string(),
                edge.lag.to_string(),
            ])
            .map_err(export_err)?;
    }
    writer
        .into_inner()
        .map_err(|err| ScheduleError::Export(err.to_string()))
}

const TASK_COLUMNS: [&str; 19] = [
    "task_id",
    "name",
    "duration",
    "early_start",
    "early_finish",
    "late_start",
    "late_finish",
    "total_float",
    "free_float",
    "is_critical",
    "binding_predecessor",
    "start_date",
    "finish_date",
    "resources",
    "wbs_code",
    "notes",
    "baseline_start",
    "baseline_finish",
    "finish_variance",
];
