use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::task::TaskId;

/// A person, crew, or piece of equipment with a per-period capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Identifier for the resource. This can be a person id, crew name, or equipment tag.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Units available in every working period.
    pub capacity: f64,
    #[serde(default, skip_serializing_if = "ResourceCalendar::is_always_available")]
    pub calendar: ResourceCalendar,
}

impl Resource {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            capacity,
            calendar: ResourceCalendar::default(),
        }
    }

    pub fn with_calendar(mut self, calendar: ResourceCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Capacity in a given period; zero outside the working calendar.
    pub fn capacity_at(&self, period: i64) -> f64 {
        if self.calendar.is_available(period) {
            self.capacity
        } else {
            0.0
        }
    }
}

/// Working calendar of a resource.
///
/// The available set is unbounded, so it is stored as its complement: the
/// periods the resource does not work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCalendar {
    #[serde(default)]
    unavailable: BTreeSet<i64>,
}

impl ResourceCalendar {
    pub fn with_unavailable<I>(periods: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        Self {
            unavailable: periods.into_iter().collect(),
        }
    }

    pub fn is_available(&self, period: i64) -> bool {
        !self.unavailable.contains(&period)
    }

    pub fn is_always_available(&self) -> bool {
        self.unavailable.is_empty()
    }

    pub fn unavailable_periods(&self) -> impl Iterator<Item = i64> + '_ {
        self.unavailable.iter().copied()
    }
}

/// Assignment of a resource to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub resource_id: String,
    /// Share of the task's time the resource works on it, in `(0, 1]`.
    pub allocation: f64,
    /// Capacity units consumed per period at full allocation.
    #[serde(default = "Assignment::default_units")]
    pub units: f64,
}

impl Assignment {
    pub fn new(task_id: TaskId, resource_id: impl Into<String>, allocation: f64) -> Self {
        Self {
            task_id,
            resource_id: resource_id.into(),
            allocation,
            units: Self::default_units(),
        }
    }

    fn default_units() -> f64 {
        1.0
    }

    /// Capacity this assignment consumes in each active period.
    pub fn demand(&self) -> f64 {
        self.allocation * self.units
    }
}
