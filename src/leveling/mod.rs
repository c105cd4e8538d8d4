//! Resource leveling: removes over-allocation by delaying task starts.

pub mod engine;
pub mod profile;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::schedule::ComputedSchedule;
use crate::task::TaskId;

pub use engine::ResourceLeveler;
pub use profile::DemandProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelingMode {
    /// Tasks only move inside their float; the project finish never moves.
    #[default]
    WithinFloat,
    /// Tasks may move past their late start, extending the project.
    AllowExtension,
}

impl LevelingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LevelingMode::WithinFloat => "within-float",
            LevelingMode::AllowExtension => "allow-extension",
        }
    }
}

impl fmt::Display for LevelingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "within-float" | "within-float-only" => Ok(LevelingMode::WithinFloat),
            "allow-extension" | "extend" => Ok(LevelingMode::AllowExtension),
            other => Err(format!("unknown leveling mode '{other}'")),
        }
    }
}

/// A resource/period pair whose demand exceeds capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConflict {
    pub resource_id: String,
    pub period: i64,
    pub demand: f64,
    pub capacity: f64,
    /// Tasks active on the resource in that period, by id.
    pub tasks: Vec<TaskId>,
}

impl ResourceConflict {
    pub fn key(&self) -> (String, i64) {
        (self.resource_id.clone(), self.period)
    }
}

impl fmt::Display for ResourceConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} over-allocated in period {} ({:.2} > {:.2}; tasks {:?})",
            self.resource_id, self.period, self.demand, self.capacity, self.tasks
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskShift {
    pub task_id: TaskId,
    pub original_start: i64,
    pub leveled_start: i64,
}

impl TaskShift {
    pub fn delay(&self) -> i64 {
        self.leveled_start - self.original_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelingStatus {
    Complete,
    /// Stopped by a [`CancellationToken`]; the result is the best so far.
    Cancelled,
    IterationLimitReached,
}

#[derive(Debug, Clone)]
pub struct LevelingOutcome {
    pub mode: LevelingMode,
    pub status: LevelingStatus,
    /// CPM rerun over the leveled starts.
    pub schedule: ComputedSchedule,
    /// Over-allocations left in the leveled schedule.
    pub conflicts: Vec<ResourceConflict>,
    /// Every task whose start moved, by task id.
    pub shifts: Vec<TaskShift>,
    pub iterations: usize,
}

impl LevelingOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == LevelingStatus::Complete
    }

    pub fn is_fully_leveled(&self) -> bool {
        self.is_complete() && self.conflicts.is_empty()
    }
}

/// Cooperative cancellation flag, checked between leveling iterations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_cli_spellings() {
        assert_eq!("within-float".parse::<LevelingMode>(), Ok(LevelingMode::WithinFloat));
        assert_eq!("WITHIN_FLOAT_ONLY".parse::<LevelingMode>(), Ok(LevelingMode::WithinFloat));
        assert_eq!("allow_extension".parse::<LevelingMode>(), Ok(LevelingMode::AllowExtension));
        assert!("sideways".parse::<LevelingMode>().is_err());
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
