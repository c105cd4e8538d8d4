pub mod baseline;
pub mod calculations;
pub mod calendar;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod leveling;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod resource;
pub mod schedule;
pub mod task;
pub mod task_validation;
pub mod telemetry;

pub use baseline::{Baseline, TaskVariance, VarianceReport};
pub use calendar::{WorkCalendar, WorkCalendarConfig};
pub use config::EngineConfig;
pub use dependency::{Dependency, DependencyKind};
pub use engine::ScheduleEngine;
pub use error::{EngineResult, ScheduleError};
pub use export::ExportFormat;
pub use graph::ScheduleDag;
pub use leveling::{
    CancellationToken, LevelingMode, LevelingOutcome, LevelingStatus, ResourceConflict, TaskShift,
};
pub use metadata::ProjectMetadata;
pub use persistence::{
    load_project_from_json, load_tasks_from_csv, save_project_to_json, save_tasks_to_csv,
    JsonFileStore, PersistenceError, ProjectStore,
};
pub use project::Project;
pub use resource::{Assignment, Resource, ResourceCalendar};
pub use schedule::{ComputedSchedule, ScheduleSummary};
pub use task::{Task, TaskId, TaskSchedule};
