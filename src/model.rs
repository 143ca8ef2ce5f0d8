use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

pub type EmployeeId = Ulid;
pub type BlockId = Ulid;

/// Quota granted when a stored employee carries none.
pub const DEFAULT_QUOTA_DAYS: u32 = 30;

/// Display color for employees created without one.
pub const DEFAULT_COLOR: &str = "#3498db";

/// Inclusive run of calendar days `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DaySpan {
    /// Span covering `day_count` consecutive days from `start`. `day_count` must be ≥ 1.
    pub fn from_start(start: NaiveDate, day_count: u32) -> Self {
        debug_assert!(day_count >= 1, "DaySpan needs at least one day");
        let end = start
            .checked_add_days(Days::new(u64::from(day_count.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Closed intervals: sharing a single day counts as overlap.
    pub fn overlaps(&self, other: &DaySpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Every date of the span in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub quota_days: u32,
    pub works_saturday: bool,
    pub works_sunday: bool,
    pub color: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn works_on(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Sat => self.works_saturday,
            Weekday::Sun => self.works_sunday,
            _ => false,
        }
    }
}

/// Editable employee fields; the id is assigned by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_quota")]
    pub quota_days: u32,
    #[serde(default)]
    pub works_saturday: bool,
    #[serde(default)]
    pub works_sunday: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

impl EmployeeDraft {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            quota_days: DEFAULT_QUOTA_DAYS,
            works_saturday: false,
            works_sunday: false,
            color: DEFAULT_COLOR.to_string(),
        }
    }

    pub fn with_quota(mut self, quota_days: u32) -> Self {
        self.quota_days = quota_days;
        self
    }

    pub fn working_weekends(mut self, saturday: bool, sunday: bool) -> Self {
        self.works_saturday = saturday;
        self.works_sunday = sunday;
        self
    }

    pub fn into_employee(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            quota_days: self.quota_days,
            works_saturday: self.works_saturday,
            works_sunday: self.works_sunday,
            color: self.color,
        }
    }
}

pub(crate) fn default_quota() -> u32 {
    DEFAULT_QUOTA_DAYS
}

pub(crate) fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// An absence request. `start_date == None` means pending (not yet on the calendar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationBlock {
    pub id: BlockId,
    pub employee_id: EmployeeId,
    pub day_count: u32,
    pub start_date: Option<NaiveDate>,
}

impl VacationBlock {
    pub fn is_pending(&self) -> bool {
        self.start_date.is_none()
    }

    /// Calendar span, or `None` while pending.
    pub fn span(&self) -> Option<DaySpan> {
        self.start_date
            .map(|start| DaySpan::from_start(start, self.day_count))
    }
}

/// Who covers the weekend days an absent employee would have worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Replacement {
    Employee(EmployeeId),
    /// Ask for outside reinforcement instead of naming a colleague.
    Reinforcement,
}

impl Replacement {
    pub const REINFORCEMENT_TAG: &'static str = "REINFORCEMENT";

    pub fn employee(&self) -> Option<EmployeeId> {
        match self {
            Replacement::Employee(id) => Some(*id),
            Replacement::Reinforcement => None,
        }
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Employee(id) => write!(f, "{id}"),
            Replacement::Reinforcement => f.write_str(Self::REINFORCEMENT_TAG),
        }
    }
}

impl std::str::FromStr for Replacement {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::REINFORCEMENT_TAG {
            return Ok(Replacement::Reinforcement);
        }
        Ulid::from_string(s).map(Replacement::Employee)
    }
}

// Stored as a bare string: an employee id or "REINFORCEMENT".
impl Serialize for Replacement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Replacement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Block id → chosen replacement. Ordered so persisted files are stable.
pub type CoverageMap = BTreeMap<BlockId, Replacement>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekendDay {
    Saturday,
    Sunday,
}

impl WeekendDay {
    pub fn of(date: NaiveDate) -> Option<Self> {
        match date.weekday() {
            Weekday::Sat => Some(WeekendDay::Saturday),
            Weekday::Sun => Some(WeekendDay::Sunday),
            _ => None,
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        match (self, lang) {
            (WeekendDay::Saturday, Language::English) => "Saturday",
            (WeekendDay::Sunday, Language::English) => "Sunday",
            (WeekendDay::Saturday, Language::Spanish) => "Sábado",
            (WeekendDay::Sunday, Language::Spanish) => "Domingo",
        }
    }
}

/// A weekend date inside a placed block on which the owner normally works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendExposure {
    pub date: NaiveDate,
    pub day: WeekendDay,
}

/// Language used for weekday and month names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "es" | "spanish" => Some(Language::Spanish),
            _ => None,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStatus {
    Available,
    /// Five days or fewer left.
    Low,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub employee: Employee,
    pub used_days: u32,
    pub remaining_days: i64,
    pub status: QuotaStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageItem {
    pub block_id: BlockId,
    pub employee_id: EmployeeId,
    pub exposures: Vec<WeekendExposure>,
    pub replacement: Option<Replacement>,
    /// Everyone except the block owner.
    pub candidates: Vec<EmployeeId>,
}
