//! Project working calendar. The engine schedules in abstract periods; the
//! calendar maps those periods onto dates for exports.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, String> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err("work calendar requires at least one working day".into());
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();
        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Working weekdays per week.
    fn days_per_week(&self) -> u64 {
        (7 - self.non_working_days.len()) as u64
    }

    /// First working date on or after `from`. `None` when the calendar has
    /// no working day or the search runs past the last representable date.
    pub fn first_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        if self.days_per_week() == 0 {
            return None;
        }
        let mut current = from;
        while !self.is_available(current) {
            current = current.succ_opt()?;
        }
        Some(current)
    }

    /// Date of a period offset, where period 0 is the first working date on
    /// or after `start`. Negative periods walk backwards. `None` when the
    /// date falls outside the representable range.
    pub fn date_for_period(&self, start: NaiveDate, period: i64) -> Option<NaiveDate> {
        let mut current = self.first_available(start)?;
        let forward = period >= 0;
        let per_week = self.days_per_week();
        let mut remaining = period.unsigned_abs();

        // Whole weeks first; holidays on working weekdays inside the jump
        // are added back to what is left to walk.
        while remaining >= per_week {
            let weeks = remaining / per_week;
            let days = Days::new(weeks.checked_mul(7)?);
            let target = if forward {
                current.checked_add_days(days)?
            } else {
                current.checked_sub_days(days)?
            };
            let lost = self.working_holidays_between(current, target) as u64;
            remaining = remaining - weeks * per_week + lost;
            current = target;
            if lost == 0 {
                break;
            }
        }

        while remaining > 0 {
            current = if forward {
                current.succ_opt()?
            } else {
                current.pred_opt()?
            };
            if self.is_available(current) {
                remaining -= 1;
            }
        }
        Some(current)
    }

    /// Holidays strictly after `from` up to and including `to` (in either
    /// direction) that fall on a working weekday.
    fn working_holidays_between(&self, from: NaiveDate, to: NaiveDate) -> usize {
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        self.holidays
            .iter()
            .filter(|&&day| day != from && low <= day && day <= high)
            .filter(|day| !self.non_working_days.contains(&day.weekday()))
            .count()
    }

    /// Last working date of a span `[start_period, finish_period)`.
    /// Milestones finish on their start date.
    pub fn finish_date(
        &self,
        start: NaiveDate,
        start_period: i64,
        finish_period: i64,
    ) -> Option<NaiveDate> {
        if finish_period > start_period {
            self.date_for_period(start, finish_period - 1)
        } else {
            self.date_for_period(start, start_period)
        }
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Self {
            working_days: working,
            holidays,
        }
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect::<Vec<_>>();
        WorkCalendarConfig::new(working, calendar.holidays.iter().copied())
    }
}
