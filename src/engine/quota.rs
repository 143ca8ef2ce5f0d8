use crate::model::*;

use super::store::InMemoryStore;
use super::EngineError;

/// Remaining days at or below this count are reported as `QuotaStatus::Low`.
pub const LOW_QUOTA_THRESHOLD: i64 = 5;

/// Days reserved by the employee's blocks, placed or pending, optionally skipping one.
pub fn used_days(store: &InMemoryStore, employee_id: &EmployeeId, exclude_block: Option<BlockId>) -> u32 {
    store
        .blocks_of(employee_id)
        .filter(|b| Some(b.id) != exclude_block)
        .map(|b| b.day_count)
        .sum()
}

/// Quota minus every reserved day. Not clamped: a negative value means over quota.
///
/// Pending blocks count. Quota is reserved when a block is created, not when it is
/// placed on the calendar.
pub fn remaining_days(
    store: &InMemoryStore,
    employee_id: &EmployeeId,
    exclude_block: Option<BlockId>,
) -> Result<i64, EngineError> {
    let employee = store
        .employee(employee_id)
        .ok_or(EngineError::UnknownEmployee(*employee_id))?;
    Ok(i64::from(employee.quota_days) - i64::from(used_days(store, employee_id, exclude_block)))
}

pub fn quota_status(remaining: i64) -> QuotaStatus {
    if remaining <= 0 {
        QuotaStatus::Exhausted
    } else if remaining <= LOW_QUOTA_THRESHOLD {
        QuotaStatus::Low
    } else {
        QuotaStatus::Available
    }
}

/// Fails with `QuotaExceeded` unless `requested` fits in what is left.
pub(crate) fn check_quota(
    store: &InMemoryStore,
    employee_id: &EmployeeId,
    requested: u32,
    exclude_block: Option<BlockId>,
) -> Result<(), EngineError> {
    let remaining = remaining_days(store, employee_id, exclude_block)?;
    if i64::from(requested) > remaining {
        return Err(EngineError::QuotaExceeded {
            employee: *employee_id,
            remaining,
            requested,
        });
    }
    Ok(())
}
