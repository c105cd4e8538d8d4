//! Plain-data record exchange: project snapshots and task tables on disk.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::ScheduleError;
use crate::project::Project;

pub mod file;

pub use file::{
    load_project_from_json, load_tasks_from_csv, save_project_to_json, save_tasks_to_csv,
    ProjectSnapshot,
};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Records parsed but failed engine validation.
    #[error("invalid records: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait ProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()>;
    fn load_project(&self) -> PersistenceResult<Option<Project>>;
}

/// Keeps one project snapshot in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProjectStore for JsonFileStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()> {
        save_project_to_json(project, &self.path)
    }

    fn load_project(&self) -> PersistenceResult<Option<Project>> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_project_from_json(&self.path).map(Some)
    }
}
