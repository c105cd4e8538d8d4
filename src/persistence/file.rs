use super::{PersistenceError, PersistenceResult};
use crate::baseline::Baseline;
use crate::dependency::{Dependency, DependencyKind};
use crate::graph::ScheduleDag;
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::resource::{Assignment, Resource};
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Every input record of a project plus its baselines. Computed schedules
/// are not stored; they are derived again on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub metadata: ProjectMetadata,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub baselines: Vec<Baseline>,
}

impl ProjectSnapshot {
    pub fn from_project(project: &Project) -> Self {
        Self {
            metadata: project.metadata().clone(),
            tasks: project.tasks().to_vec(),
            dependencies: project.dependencies().to_vec(),
            resources: project.resources().to_vec(),
            assignments: project.assignments().to_vec(),
            baselines: project.baselines().to_vec(),
        }
    }

    pub fn into_project(self) -> PersistenceResult<Project> {
        let mut project = Project::from_records(
            self.metadata,
            self.tasks,
            self.dependencies,
            self.resources,
            self.assignments,
        )?;
        for baseline in self.baselines {
            project.restore_baseline(baseline)?;
        }
        Ok(project)
    }
}

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let snapshot = ProjectSnapshot::from_project(project);
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    debug!(path = %path.as_ref().display(), tasks = snapshot.tasks.len(), "project saved");
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    snapshot.into_project()
}

#[derive(Serialize, Deserialize)]
struct TaskCsvRecord {
    id: TaskId,
    name: String,
    duration: i64,
    /// Predecessor links separated by `;`, e.g. `1;2SS+1;3FF-2`.
    predecessors: String,
    earliest_start: String,
    wbs_code: String,
    notes: String,
}

impl TaskCsvRecord {
    fn from_task(task: &Task, dependencies: &[Dependency]) -> Self {
        let mut incoming: Vec<&Dependency> = dependencies
            .iter()
            .filter(|dep| dep.successor == task.id)
            .collect();
        incoming.sort_by_key(|dep| dep.sort_key());
        Self {
            id: task.id,
            name: task.name.clone(),
            duration: task.duration,
            predecessors: incoming
                .iter()
                .map(|dep| format_link(dep))
                .collect::<Vec<_>>()
                .join(";"),
            earliest_start: task.earliest_start.map(|p| p.to_string()).unwrap_or_default(),
            wbs_code: task.wbs_code.clone().unwrap_or_default(),
            notes: task.notes.clone().unwrap_or_default(),
        }
    }

    fn into_records(self) -> PersistenceResult<(Task, Vec<Dependency>)> {
        let mut task = Task::new(self.id, self.name, self.duration);
        task.earliest_start = match self.earliest_start.trim() {
            "" => None,
            raw => Some(raw.parse().map_err(|_| {
                PersistenceError::InvalidData(format!(
                    "task {} has invalid earliest_start '{raw}'",
                    self.id
                ))
            })?),
        };
        task.wbs_code = non_empty(self.wbs_code);
        task.notes = non_empty(self.notes);
        let dependencies = self
            .predecessors
            .split(';')
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(|link| parse_link(link, self.id))
            .collect::<PersistenceResult<Vec<_>>>()?;
        Ok((task, dependencies))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn format_link(dep: &Dependency) -> String {
    let mut out = dep.predecessor.to_string();
    if dep.kind() != DependencyKind::FinishToStart || dep.lag() != 0 {
        out.push_str(dep.kind().as_str());
    }
    if dep.lag() != 0 {
        out.push_str(&format!("{:+}", dep.lag()));
    }
    out
}

/// Parses `<id>[FS|SS|FF|SF][(+|-)<lag>]`.
fn parse_link(link: &str, successor: TaskId) -> PersistenceResult<Dependency> {
    let invalid = || {
        PersistenceError::InvalidData(format!("task {successor} has invalid predecessor '{link}'"))
    };
    let digits = link
        .find(|c: char| !c.is_ascii_digit() && c != '-')
        .filter(|&idx| idx > 0)
        .unwrap_or(link.len());
    let predecessor: TaskId = link[..digits].parse().map_err(|_| invalid())?;
    let rest = &link[digits..];
    let (kind, lag) = match rest.find(['+', '-']) {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let kind = if kind.is_empty() {
        DependencyKind::FinishToStart
    } else {
        kind.parse().map_err(|_| invalid())?
    };
    let lag = if lag.is_empty() {
        0
    } else {
        lag.trim_start_matches('+').parse().map_err(|_| invalid())?
    };
    Ok(Dependency::new(predecessor, successor, kind, lag))
}

pub fn save_tasks_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    let mut tasks: Vec<&Task> = project.tasks().iter().collect();
    tasks.sort_by_key(|task| task.id);
    for task in tasks {
        writer.serialize(TaskCsvRecord::from_task(task, project.dependencies()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a task table into a project with default metadata; dependencies
/// come from the `predecessors` column.
pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    let mut dependencies = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        let (task, links) = record?.into_records()?;
        tasks.push(task);
        dependencies.extend(links);
    }

    if tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no tasks".into(),
        ));
    }

    let project = Project::from_records(
        ProjectMetadata::default(),
        tasks,
        dependencies,
        Vec::new(),
        Vec::new(),
    )?;
    // Links must resolve and stay acyclic.
    ScheduleDag::build(&project)?;
    debug!(tasks = project.tasks().len(), "task table imported");
    Ok(project)
}
