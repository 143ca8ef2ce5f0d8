use std::collections::HashSet;

use tracing::warn;

use crate::model::*;

use super::mutations::{validate_day_count, validate_profile, validate_start};

/// The three record collections. Blocks keep insertion order, which the layout uses
/// as its tie-break when assigning stacking slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryStore {
    employees: Vec<Employee>,
    blocks: Vec<VacationBlock>,
    coverage: CoverageMap,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        employees: Vec<Employee>,
        blocks: Vec<VacationBlock>,
        coverage: CoverageMap,
    ) -> Self {
        Self {
            employees,
            blocks,
            coverage,
        }
    }

    /// Build a store from collections read off disk or out of a snapshot.
    ///
    /// Every employee profile must be within limits, every block must have a valid
    /// length and start and belong to a known employee, and ids must be unique.
    /// Coverage pointing at an unknown block or employee, or naming the block's own
    /// owner, is dropped with a warning.
    pub(crate) fn checked(
        employees: Vec<Employee>,
        blocks: Vec<VacationBlock>,
        coverage: CoverageMap,
    ) -> Result<Self, String> {
        let mut employee_ids = HashSet::with_capacity(employees.len());
        for employee in &employees {
            validate_profile(
                &employee.first_name,
                &employee.last_name,
                employee.quota_days,
                &employee.color,
            )
            .map_err(|e| format!("employee {}: {e}", employee.id))?;
            if !employee_ids.insert(employee.id) {
                return Err(format!("duplicate employee id {}", employee.id));
            }
        }

        let mut block_ids = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            validate_day_count(block.day_count).map_err(|e| format!("block {}: {e}", block.id))?;
            if let Some(start) = block.start_date {
                validate_start(start).map_err(|e| format!("block {}: {e}", block.id))?;
            }
            if !employee_ids.contains(&block.employee_id) {
                return Err(format!(
                    "block {} references unknown employee {}",
                    block.id, block.employee_id
                ));
            }
            if !block_ids.insert(block.id) {
                return Err(format!("duplicate block id {}", block.id));
            }
        }

        let mut kept = CoverageMap::new();
        for (block_id, replacement) in coverage {
            let Some(block) = blocks.iter().find(|b| b.id == block_id) else {
                warn!("dropping coverage for unknown block {block_id}");
                continue;
            };
            if let Some(sub) = replacement.employee()
                && (sub == block.employee_id || !employee_ids.contains(&sub))
            {
                warn!("dropping coverage of block {block_id} by {sub}");
                continue;
            }
            kept.insert(block_id, replacement);
        }

        Ok(Self::from_parts(employees, blocks, kept))
    }

    // ── Employees ────────────────────────────────────────────

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == *id)
    }

    pub fn contains_employee(&self, id: &EmployeeId) -> bool {
        self.employee(id).is_some()
    }

    pub fn insert_employee(&mut self, employee: Employee) {
        self.employees.push(employee);
    }

    /// Replace the record with the same id. Returns false if no such employee.
    pub fn replace_employee(&mut self, employee: Employee) -> bool {
        match self.employees.iter_mut().find(|e| e.id == employee.id) {
            Some(slot) => {
                *slot = employee;
                true
            }
            None => false,
        }
    }

    pub fn remove_employee(&mut self, id: &EmployeeId) -> Option<Employee> {
        let pos = self.employees.iter().position(|e| e.id == *id)?;
        Some(self.employees.remove(pos))
    }

    // ── Blocks ───────────────────────────────────────────────

    pub fn blocks(&self) -> &[VacationBlock] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, id: &BlockId) -> Option<&VacationBlock> {
        self.blocks.iter().find(|b| b.id == *id)
    }

    pub fn block_mut(&mut self, id: &BlockId) -> Option<&mut VacationBlock> {
        self.blocks.iter_mut().find(|b| b.id == *id)
    }

    pub fn blocks_of<'a>(
        &'a self,
        employee_id: &'a EmployeeId,
    ) -> impl Iterator<Item = &'a VacationBlock> + 'a {
        self.blocks
            .iter()
            .filter(move |b| b.employee_id == *employee_id)
    }

    pub fn insert_block(&mut self, block: VacationBlock) {
        self.blocks.push(block);
    }

    /// Remove by id, preserving the order of the remaining blocks.
    pub fn remove_block(&mut self, id: &BlockId) -> Option<VacationBlock> {
        let pos = self.blocks.iter().position(|b| b.id == *id)?;
        Some(self.blocks.remove(pos))
    }

    /// Drop every block owned by `employee_id`, returning the removed ids in order.
    pub fn remove_blocks_of(&mut self, employee_id: &EmployeeId) -> Vec<BlockId> {
        let mut removed = Vec::new();
        self.blocks.retain(|b| {
            if b.employee_id == *employee_id {
                removed.push(b.id);
                false
            } else {
                true
            }
        });
        removed
    }

    // ── Coverage ─────────────────────────────────────────────

    pub fn coverage(&self) -> &CoverageMap {
        &self.coverage
    }

    pub fn replacement(&self, block_id: &BlockId) -> Option<Replacement> {
        self.coverage.get(block_id).copied()
    }

    pub fn set_replacement(&mut self, block_id: BlockId, replacement: Replacement) {
        self.coverage.insert(block_id, replacement);
    }

    pub fn clear_replacement(&mut self, block_id: &BlockId) -> Option<Replacement> {
        self.coverage.remove(block_id)
    }

    /// Remove entries naming `employee_id` as the replacement. Returns how many went.
    pub fn clear_replacements_by(&mut self, employee_id: &EmployeeId) -> usize {
        let before = self.coverage.len();
        self.coverage
            .retain(|_, r| r.employee() != Some(*employee_id));
        before - self.coverage.len()
    }
}
