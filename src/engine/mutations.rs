use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::storage::Collection;
use crate::transfer;

use super::quota::check_quota;
use super::{EngineError, Planner};

const ALL_COLLECTIONS: [Collection; 3] = [
    Collection::Employees,
    Collection::Blocks,
    Collection::Coverage,
];

pub(crate) fn validate_profile(
    first_name: &str,
    last_name: &str,
    quota_days: u32,
    color: &str,
) -> Result<(), EngineError> {
    if first_name.len() > MAX_NAME_LEN || last_name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("employee name too long"));
    }
    if quota_days > MAX_QUOTA_DAYS {
        return Err(EngineError::LimitExceeded("quota too large"));
    }
    if color.len() > MAX_COLOR_LEN {
        return Err(EngineError::LimitExceeded("color too long"));
    }
    Ok(())
}

/// Start dates are kept within the supported calendar years.
pub(crate) fn validate_start(start: NaiveDate) -> Result<(), EngineError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&start.year()) {
        return Err(EngineError::LimitExceeded("date out of range"));
    }
    Ok(())
}

pub(super) fn validate_day_count(day_count: u32) -> Result<(), EngineError> {
    if day_count == 0 {
        return Err(EngineError::InvalidDayCount(day_count));
    }
    if day_count > MAX_DAY_COUNT {
        return Err(EngineError::LimitExceeded("day count too large"));
    }
    Ok(())
}

fn validate_draft(draft: &EmployeeDraft) -> Result<(), EngineError> {
    validate_profile(
        &draft.first_name,
        &draft.last_name,
        draft.quota_days,
        &draft.color,
    )
}

impl Planner {
    // ── Employees ────────────────────────────────────────────

    pub fn add_employee(&mut self, draft: EmployeeDraft) -> Result<EmployeeId, EngineError> {
        if self.store.employee_count() >= MAX_EMPLOYEES {
            return Err(EngineError::LimitExceeded("too many employees"));
        }
        validate_draft(&draft)?;

        let id = Ulid::new();
        let mut next = self.store.clone();
        next.insert_employee(draft.into_employee(id));
        self.commit(next, &[Collection::Employees])?;
        info!(employee = %id, "employee added");
        Ok(id)
    }

    /// Overwrite an employee's profile. Lowering the quota below what is already booked
    /// is allowed; the remaining count simply goes negative.
    pub fn update_employee(&mut self, id: EmployeeId, draft: EmployeeDraft) -> Result<(), EngineError> {
        if !self.store.contains_employee(&id) {
            return Err(EngineError::UnknownEmployee(id));
        }
        validate_draft(&draft)?;

        let mut next = self.store.clone();
        next.replace_employee(draft.into_employee(id));
        self.commit(next, &[Collection::Employees])?;
        info!(employee = %id, "employee updated");
        Ok(())
    }

    /// Remove an employee together with their blocks and any coverage that referred to
    /// them, as owner or as replacement. Returns the ids of the deleted blocks.
    pub fn delete_employee(&mut self, id: EmployeeId) -> Result<Vec<BlockId>, EngineError> {
        if !self.store.contains_employee(&id) {
            return Err(EngineError::UnknownEmployee(id));
        }

        let mut next = self.store.clone();
        let name = next
            .remove_employee(&id)
            .map(|e| e.full_name())
            .unwrap_or_default();
        let removed = next.remove_blocks_of(&id);
        for block_id in &removed {
            next.clear_replacement(block_id);
        }
        let released = next.clear_replacements_by(&id);
        self.commit(next, &ALL_COLLECTIONS)?;
        info!(
            employee = %id,
            %name,
            blocks = removed.len(),
            released,
            "employee deleted"
        );
        Ok(removed)
    }

    // ── Blocks ───────────────────────────────────────────────

    /// Reserve `day_count` days for an employee as a new pending block.
    pub fn create_block(&mut self, employee_id: EmployeeId, day_count: u32) -> Result<BlockId, EngineError> {
        validate_day_count(day_count)?;
        if self.store.block_count() >= MAX_BLOCKS {
            return Err(EngineError::LimitExceeded("too many blocks"));
        }
        check_quota(&self.store, &employee_id, day_count, None)?;

        let id = Ulid::new();
        let mut next = self.store.clone();
        next.insert_block(VacationBlock {
            id,
            employee_id,
            day_count,
            start_date: None,
        });
        self.commit(next, &[Collection::Blocks])?;
        info!(block = %id, employee = %employee_id, day_count, "block created");
        Ok(id)
    }

    /// Set or move a block's start date. The day count is unchanged, so quota is not
    /// re-checked.
    pub fn place_or_move(&mut self, block_id: BlockId, start: NaiveDate) -> Result<(), EngineError> {
        validate_start(start)?;
        let mut next = self.store.clone();
        let block = next
            .block_mut(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?;
        block.start_date = Some(start);
        self.commit(next, &[Collection::Blocks])?;
        info!(block = %block_id, %start, "block placed");
        Ok(())
    }

    /// Change a block's length and optionally its start. `None` keeps the current start.
    ///
    /// The block's own previous length is netted out before the quota comparison.
    pub fn edit_block(
        &mut self,
        block_id: BlockId,
        day_count: u32,
        start: Option<NaiveDate>,
    ) -> Result<(), EngineError> {
        validate_day_count(day_count)?;
        if let Some(start) = start {
            validate_start(start)?;
        }
        let owner = self
            .store
            .block(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?
            .employee_id;
        check_quota(&self.store, &owner, day_count, Some(block_id))?;

        let mut next = self.store.clone();
        let block = next
            .block_mut(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?;
        block.day_count = day_count;
        if start.is_some() {
            block.start_date = start;
        }
        self.commit(next, &[Collection::Blocks])?;
        info!(block = %block_id, day_count, "block edited");
        Ok(())
    }

    /// Take a placed block off the calendar. It keeps its reserved days.
    pub fn unplace_block(&mut self, block_id: BlockId) -> Result<(), EngineError> {
        let mut next = self.store.clone();
        let block = next
            .block_mut(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?;
        block.start_date = None;
        self.commit(next, &[Collection::Blocks])?;
        info!(block = %block_id, "block returned to pending");
        Ok(())
    }

    /// Delete a block, placed or pending, and its coverage entry.
    pub fn delete_block(&mut self, block_id: BlockId) -> Result<(), EngineError> {
        let mut next = self.store.clone();
        next.remove_block(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?;
        let had_coverage = next.clear_replacement(&block_id).is_some();
        let touched: &[Collection] = if had_coverage {
            &[Collection::Blocks, Collection::Coverage]
        } else {
            &[Collection::Blocks]
        };
        self.commit(next, touched)?;
        info!(block = %block_id, "block deleted");
        Ok(())
    }

    // ── Bulk transfer ────────────────────────────────────────

    /// Replace every collection with the contents of a snapshot document.
    ///
    /// The document is fully validated first; on any error the current state stays.
    pub fn import_snapshot(&mut self, document: Value) -> Result<(), EngineError> {
        let next = transfer::store_from_value(document)?;
        let (employees, blocks) = (next.employee_count(), next.block_count());
        self.commit(next, &ALL_COLLECTIONS)?;
        info!(employees, blocks, "snapshot imported");
        Ok(())
    }
}
