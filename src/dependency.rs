//! Dependency records and the relationship formula table shared by the
//! forward pass, backward pass, free float and leveling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::TaskId;

/// Which end of a task a relationship is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Finish,
}

impl Anchor {
    /// Offset of this anchor from the task start.
    fn offset(self, duration: i64) -> i64 {
        match self {
            Anchor::Start => 0,
            Anchor::Finish => duration,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DependencyKind {
    #[default]
    #[serde(rename = "FS", alias = "finish_to_start")]
    FinishToStart,
    #[serde(rename = "SS", alias = "start_to_start")]
    StartToStart,
    #[serde(rename = "FF", alias = "finish_to_finish")]
    FinishToFinish,
    #[serde(rename = "SF", alias = "start_to_finish")]
    StartToFinish,
}

impl DependencyKind {
    /// The formula table: (predecessor anchor, successor anchor).
    ///
    /// Every relationship reads "successor anchor >= predecessor anchor + lag".
    pub const fn anchors(self) -> (Anchor, Anchor) {
        match self {
            DependencyKind::FinishToStart => (Anchor::Finish, Anchor::Start),
            DependencyKind::StartToStart => (Anchor::Start, Anchor::Start),
            DependencyKind::FinishToFinish => (Anchor::Finish, Anchor::Finish),
            DependencyKind::StartToFinish => (Anchor::Start, Anchor::Finish),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "FS",
            DependencyKind::StartToStart => "SS",
            DependencyKind::FinishToFinish => "FF",
            DependencyKind::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS" | "FINISH_TO_START" => Ok(DependencyKind::FinishToStart),
            "SS" | "START_TO_START" => Ok(DependencyKind::StartToStart),
            "FF" | "FINISH_TO_FINISH" => Ok(DependencyKind::FinishToFinish),
            "SF" | "START_TO_FINISH" => Ok(DependencyKind::StartToFinish),
            other => Err(format!("unknown dependency kind '{other}'")),
        }
    }
}

/// Relationship kind plus lag (negative lag is a lead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag: i64,
}

impl Relationship {
    pub fn new(kind: DependencyKind, lag: i64) -> Self {
        Self { kind, lag }
    }

    /// Earliest successor start permitted by a predecessor starting at
    /// `pred_start`. `None` on arithmetic overflow.
    pub fn earliest_successor_start(
        &self,
        pred_start: i64,
        pred_duration: i64,
        succ_duration: i64,
    ) -> Option<i64> {
        let (pred_anchor, succ_anchor) = self.kind.anchors();
        pred_start
            .checked_add(pred_anchor.offset(pred_duration))?
            .checked_add(self.lag)?
            .checked_sub(succ_anchor.offset(succ_duration))
    }

    /// Latest predecessor finish permitted by a successor starting at
    /// `succ_start`. Mirror of [`Self::earliest_successor_start`].
    pub fn latest_predecessor_finish(
        &self,
        succ_start: i64,
        succ_duration: i64,
        pred_duration: i64,
    ) -> Option<i64> {
        let (pred_anchor, succ_anchor) = self.kind.anchors();
        succ_start
            .checked_add(succ_anchor.offset(succ_duration))?
            .checked_sub(self.lag)?
            .checked_sub(pred_anchor.offset(pred_duration))?
            .checked_add(pred_duration)
    }

    /// Periods the predecessor may slip before it pushes the successor.
    pub fn slack(
        &self,
        pred_start: i64,
        pred_duration: i64,
        succ_start: i64,
        succ_duration: i64,
    ) -> Option<i64> {
        let bound = self.earliest_successor_start(pred_start, pred_duration, succ_duration)?;
        succ_start.checked_sub(bound)
    }
}

/// Ordered (predecessor, successor) pair with its relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor: TaskId,
    pub successor: TaskId,
    #[serde(flatten)]
    pub relationship: Relationship,
}

impl Dependency {
    pub fn finish_to_start(predecessor: TaskId, successor: TaskId) -> Self {
        Self::new(predecessor, successor, DependencyKind::FinishToStart, 0)
    }

    pub fn new(predecessor: TaskId, successor: TaskId, kind: DependencyKind, lag: i64) -> Self {
        Self {
            predecessor,
            successor,
            relationship: Relationship::new(kind, lag),
        }
    }

    pub fn kind(&self) -> DependencyKind {
        self.relationship.kind
    }

    pub fn lag(&self) -> i64 {
        self.relationship.lag
    }

    /// Sort key used wherever edges are emitted.
    pub fn sort_key(&self) -> (TaskId, TaskId, DependencyKind, i64) {
        (self.predecessor, self.successor, self.kind(), self.lag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_bounds_follow_formula_table() {
        // predecessor starts at 10 and lasts 4; successor lasts 3
        let bound = |kind| Relationship::new(kind, 2).earliest_successor_start(10, 4, 3);
        assert_eq!(bound(DependencyKind::FinishToStart), Some(16));
        assert_eq!(bound(DependencyKind::StartToStart), Some(12));
        assert_eq!(bound(DependencyKind::FinishToFinish), Some(13));
        assert_eq!(bound(DependencyKind::StartToFinish), Some(9));
    }

    #[test]
    fn backward_bounds_mirror_forward_bounds() {
        for kind in [
            DependencyKind::FinishToStart,
            DependencyKind::StartToStart,
            DependencyKind::FinishToFinish,
            DependencyKind::StartToFinish,
        ] {
            let rel = Relationship::new(kind, -1);
            let succ_start = rel.earliest_successor_start(5, 4, 3).unwrap();
            let pred_finish = rel.latest_predecessor_finish(succ_start, 3, 4).unwrap();
            assert_eq!(pred_finish, 9, "{kind} should be tight in both directions");
            assert_eq!(rel.slack(5, 4, succ_start, 3), Some(0));
        }
    }

    #[test]
    fn parses_short_and_long_kind_names() {
        assert_eq!("ss".parse::<DependencyKind>(), Ok(DependencyKind::StartToStart));
        assert_eq!(
            "finish_to_finish".parse::<DependencyKind>(),
            Ok(DependencyKind::FinishToFinish)
        );
        assert!("XX".parse::<DependencyKind>().is_err());
    }

    #[test]
    fn overflowing_lag_is_reported() {
        let rel = Relationship::new(DependencyKind::FinishToStart, i64::MAX);
        assert_eq!(rel.earliest_successor_start(1, 1, 0), None);
    }
}
