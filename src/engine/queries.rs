use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::grid::{build_month_grids, weekday_short_names, MonthGrid};
use crate::model::*;
use crate::transfer::Snapshot;

use super::exposure::block_exposures;
use super::layout::{layout_months, BlockLayout};
use super::quota::{quota_status, remaining_days, used_days};
use super::{EngineError, Planner};

/// One displayed month with everything a renderer needs to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub title: String,
    pub weekdays: [&'static str; 7],
    pub grid: MonthGrid,
    pub layouts: Vec<BlockLayout>,
}

impl Planner {
    pub fn employees(&self) -> &[Employee] {
        self.store.employees()
    }

    pub fn employee(&self, id: &EmployeeId) -> Result<&Employee, EngineError> {
        self.store
            .employee(id)
            .ok_or(EngineError::UnknownEmployee(*id))
    }

    /// Every employee with used and remaining days, in roster order.
    pub fn employee_summaries(&self) -> Vec<EmployeeSummary> {
        self.store
            .employees()
            .iter()
            .map(|e| {
                let used = used_days(&self.store, &e.id, None);
                let remaining = i64::from(e.quota_days) - i64::from(used);
                EmployeeSummary {
                    employee: e.clone(),
                    used_days: used,
                    remaining_days: remaining,
                    status: quota_status(remaining),
                }
            })
            .collect()
    }

    pub fn blocks(&self) -> &[VacationBlock] {
        self.store.blocks()
    }

    pub fn block(&self, id: &BlockId) -> Result<&VacationBlock, EngineError> {
        self.store.block(id).ok_or(EngineError::UnknownBlock(*id))
    }

    /// Blocks without a start date, in creation order.
    pub fn pending_blocks(&self) -> Vec<&VacationBlock> {
        self.store.blocks().iter().filter(|b| b.is_pending()).collect()
    }

    pub fn remaining_days(&self, employee_id: &EmployeeId) -> Result<i64, EngineError> {
        remaining_days(&self.store, employee_id, None)
    }

    /// Worked weekend days the block takes its owner away from. Empty while pending.
    pub fn weekend_exposures(&self, block_id: &BlockId) -> Result<Vec<WeekendExposure>, EngineError> {
        let block = self.block(block_id)?;
        let owner = self.employee(&block.employee_id)?;
        Ok(block_exposures(owner, block))
    }

    /// Grids and block layouts for the given months of `year`, months ascending.
    pub fn month_view(&self, year: i32, months: &[u32]) -> Result<Vec<MonthView>, EngineError> {
        let grids = build_month_grids(year, months)?;
        let start = Instant::now();
        let layouts = layout_months(&grids, self.store.blocks());
        let elapsed = start.elapsed();
        metrics::histogram!(crate::observability::LAYOUT_DURATION_SECONDS)
            .record(elapsed.as_secs_f64());
        debug!(
            year,
            months = grids.len(),
            blocks = self.store.block_count(),
            "layout recomputed in {elapsed:?}"
        );

        let weekdays = weekday_short_names(self.language);
        Ok(grids
            .into_iter()
            .zip(layouts)
            .map(|(grid, layouts)| MonthView {
                title: grid.title(self.language),
                weekdays,
                grid,
                layouts,
            })
            .collect())
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.store)
    }
}
