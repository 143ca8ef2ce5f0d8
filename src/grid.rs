use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::engine::EngineError;
use crate::limits::*;
use crate::model::Language;

pub const DAYS_PER_WEEK: usize = 7;

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const MONTHS_ES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
    "Octubre", "Noviembre", "Diciembre",
];
const WEEKDAYS_EN: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const WEEKDAYS_ES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

/// Month name for `month` in 1..=12.
pub fn month_name(month: u32, lang: Language) -> Option<&'static str> {
    let idx = month.checked_sub(1)? as usize;
    match lang {
        Language::English => MONTHS_EN.get(idx).copied(),
        Language::Spanish => MONTHS_ES.get(idx).copied(),
    }
}

/// Column headers, Sunday first.
pub fn weekday_short_names(lang: Language) -> [&'static str; 7] {
    match lang {
        Language::English => WEEKDAYS_EN,
        Language::Spanish => WEEKDAYS_ES,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for filler days borrowed from the neighbouring months.
    pub in_month: bool,
}

/// One displayed month: whole Sunday-first weeks covering the month.
///
/// Cells are contiguous calendar days, so a date's cell index is its offset from the
/// first cell. Row `r` holds cells `7r..7r+7`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    pub fn build(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidMonth(month));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::LimitExceeded("year out of range"));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(EngineError::InvalidMonth(month))?;
        let next_first = first
            .checked_add_months(Months::new(1))
            .ok_or(EngineError::LimitExceeded("year out of range"))?;
        let days_in_month = (next_first - first).num_days() as usize;

        let leading = first.weekday().num_days_from_sunday() as usize;
        let grid_start = first - Days::new(leading as u64);
        let total = (leading + days_in_month).div_ceil(DAYS_PER_WEEK) * DAYS_PER_WEEK;

        let cells = grid_start
            .iter_days()
            .take(total)
            .map(|date| GridCell {
                date,
                in_month: date.month() == month && date.year() == year,
            })
            .collect();

        Ok(Self { year, month, cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.len() / DAYS_PER_WEEK
    }

    pub fn first_date(&self) -> NaiveDate {
        self.cells[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.cells[self.cells.len() - 1].date
    }

    pub fn cell_index(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.first_date()).num_days();
        if offset < 0 || offset as usize >= self.cells.len() {
            return None;
        }
        Some(offset as usize)
    }

    pub fn title(&self, lang: Language) -> String {
        let name = month_name(self.month, lang).unwrap_or_default();
        format!("{name} {}", self.year)
    }
}

/// Grids for several months of one year, in ascending month order, duplicates dropped.
pub fn build_month_grids(year: i32, months: &[u32]) -> Result<Vec<MonthGrid>, EngineError> {
    let mut months = months.to_vec();
    months.sort_unstable();
    months.dedup();
    if months.len() > MAX_MONTHS_PER_VIEW {
        return Err(EngineError::LimitExceeded("too many months requested"));
    }
    months.into_iter().map(|m| MonthGrid::build(year, m)).collect()
}
