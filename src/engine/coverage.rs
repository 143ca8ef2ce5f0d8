use tracing::info;

use crate::model::*;
use crate::storage::Collection;

use super::exposure::block_exposures;
use super::{EngineError, Planner};

impl Planner {
    /// Record who covers a block's weekend exposure.
    ///
    /// The block must exist, and a named replacement must be an existing employee other
    /// than the block owner. `Reinforcement` is always accepted.
    pub fn set_replacement(
        &mut self,
        block_id: BlockId,
        replacement: Replacement,
    ) -> Result<(), EngineError> {
        let owner = self
            .store
            .block(&block_id)
            .ok_or(EngineError::UnknownBlock(block_id))?
            .employee_id;
        if let Some(sub) = replacement.employee() {
            if sub == owner {
                return Err(EngineError::InvalidReplacement {
                    block: block_id,
                    employee: sub,
                });
            }
            if !self.store.contains_employee(&sub) {
                return Err(EngineError::UnknownEmployee(sub));
            }
        }

        let mut next = self.store.clone();
        next.set_replacement(block_id, replacement);
        self.commit(next, &[Collection::Coverage])?;
        info!(block = %block_id, %replacement, "replacement set");
        Ok(())
    }

    /// Forget the replacement of a block. Clearing an unset entry is not an error.
    pub fn clear_replacement(&mut self, block_id: BlockId) -> Result<Option<Replacement>, EngineError> {
        if self.store.block(&block_id).is_none() {
            return Err(EngineError::UnknownBlock(block_id));
        }
        if self.store.replacement(&block_id).is_none() {
            return Ok(None);
        }

        let mut next = self.store.clone();
        let previous = next.clear_replacement(&block_id);
        self.commit(next, &[Collection::Coverage])?;
        info!(block = %block_id, "replacement cleared");
        Ok(previous)
    }

    pub fn replacement(&self, block_id: &BlockId) -> Option<Replacement> {
        self.store.replacement(block_id)
    }

    /// Placed blocks that take their owner off at least one worked weekend day, in block
    /// order, with the current replacement and who could be picked instead.
    pub fn coverage_worklist(&self) -> Vec<CoverageItem> {
        self.store
            .blocks()
            .iter()
            .filter_map(|block| {
                let owner = self.store.employee(&block.employee_id)?;
                let exposures = block_exposures(owner, block);
                if exposures.is_empty() {
                    return None;
                }
                let candidates = self
                    .store
                    .employees()
                    .iter()
                    .filter(|e| e.id != owner.id)
                    .map(|e| e.id)
                    .collect();
                Some(CoverageItem {
                    block_id: block.id,
                    employee_id: owner.id,
                    exposures,
                    replacement: self.store.replacement(&block.id),
                    candidates,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn planner_with_weekend_block() -> (Planner, EmployeeId, EmployeeId, BlockId) {
        let mut planner = Planner::in_memory();
        let owner = planner
            .add_employee(EmployeeDraft::new("Marta", "Soler").working_weekends(true, true))
            .unwrap();
        let other = planner
            .add_employee(EmployeeDraft::new("Luis", "Gómez"))
            .unwrap();
        let block = planner.create_block(owner, 7).unwrap();
        planner.place_or_move(block, d(2025, 3, 8)).unwrap();
        (planner, owner, other, block)
    }

    #[test]
    fn self_coverage_rejected() {
        let (mut planner, owner, _, block) = planner_with_weekend_block();
        let err = planner
            .set_replacement(block, Replacement::Employee(owner))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReplacement { .. }));
        assert_eq!(planner.replacement(&block), None);
    }

    #[test]
    fn reinforcement_always_valid() {
        let (mut planner, _, _, block) = planner_with_weekend_block();
        planner.set_replacement(block, Replacement::Reinforcement).unwrap();
        assert_eq!(planner.replacement(&block), Some(Replacement::Reinforcement));
    }

    #[test]
    fn unknown_block_and_employee() {
        let (mut planner, _, _, block) = planner_with_weekend_block();
        assert!(matches!(
            planner.set_replacement(Ulid::new(), Replacement::Reinforcement),
            Err(EngineError::UnknownBlock(_))
        ));
        assert!(matches!(
            planner.set_replacement(block, Replacement::Employee(Ulid::new())),
            Err(EngineError::UnknownEmployee(_))
        ));
    }

    #[test]
    fn clear_returns_previous() {
        let (mut planner, _, other, block) = planner_with_weekend_block();
        planner.set_replacement(block, Replacement::Employee(other)).unwrap();
        assert_eq!(
            planner.clear_replacement(block).unwrap(),
            Some(Replacement::Employee(other))
        );
        assert_eq!(planner.clear_replacement(block).unwrap(), None);
    }

    #[test]
    fn worklist_lists_exposed_blocks_only() {
        let (mut planner, owner, other, block) = planner_with_weekend_block();
        // Weekday-only block for the same owner: no exposure.
        let quiet = planner.create_block(owner, 3).unwrap();
        planner.place_or_move(quiet, d(2025, 3, 11)).unwrap();
        // Pending block: never exposed.
        planner.create_block(owner, 2).unwrap();
        planner.set_replacement(block, Replacement::Employee(other)).unwrap();

        let items = planner.coverage_worklist();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.block_id, block);
        assert_eq!(item.exposures.len(), 2);
        assert_eq!(item.replacement, Some(Replacement::Employee(other)));
        assert_eq!(item.candidates, vec![other]);
    }
}
