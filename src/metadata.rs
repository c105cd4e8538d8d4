use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::WorkCalendarConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_id: String,
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    /// Period tasks without predecessors start from.
    #[serde(default)]
    pub start_period: i64,
    /// Calendar date of `start_period`, used to date exported rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<WorkCalendarConfig>,
}

impl ProjectMetadata {
    pub fn new(project_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            project_name: project_name.into(),
            ..Self::default()
        }
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_id: "project".to_string(),
            project_name: "New Project".to_string(),
            project_description: String::new(),
            start_period: 0,
            start_date: None,
            calendar: None,
        }
    }
}
