/// Employees per planner.
pub const MAX_EMPLOYEES: usize = 1_000;

/// Blocks per planner, placed and pending together.
pub const MAX_BLOCKS: usize = 20_000;

/// Longest single absence. One leap year.
pub const MAX_DAY_COUNT: u32 = 366;

/// Largest annual quota an employee can be given.
pub const MAX_QUOTA_DAYS: u32 = 366;

pub const MAX_NAME_LEN: usize = 128;

pub const MAX_COLOR_LEN: usize = 32;

/// Months rendered by a single `month_view` request.
pub const MAX_MONTHS_PER_VIEW: usize = 12;

/// Longest accepted protocol line (an import carries the whole snapshot).
pub const MAX_LINE_LEN: usize = 8 * 1024 * 1024;

/// Years accepted for calendar grids.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2999;
