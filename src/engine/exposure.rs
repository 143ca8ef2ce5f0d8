use chrono::{Datelike, NaiveDate};

use crate::model::*;

/// Weekend dates inside `[start, start + day_count)` on which `employee` normally works.
///
/// Chronological. A zero `day_count` yields nothing.
pub fn weekend_exposures(employee: &Employee, start: NaiveDate, day_count: u32) -> Vec<WeekendExposure> {
    start
        .iter_days()
        .take(day_count as usize)
        .filter(|date| employee.works_on(date.weekday()))
        .filter_map(|date| WeekendDay::of(date).map(|day| WeekendExposure { date, day }))
        .collect()
}

/// Exposures of a block, empty while it is pending.
pub fn block_exposures(employee: &Employee, block: &VacationBlock) -> Vec<WeekendExposure> {
    match block.start_date {
        Some(start) => weekend_exposures(employee, start, block.day_count),
        None => Vec::new(),
    }
}
