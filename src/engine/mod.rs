mod coverage;
mod error;
mod exposure;
mod layout;
mod mutations;
mod queries;
mod quota;
mod store;

pub use error::EngineError;
pub use exposure::{block_exposures, weekend_exposures};
pub use layout::{
    assign_slots, layout_grid, layout_months, segments, BlockLayout, Segment, SlotAssignment,
};
pub use queries::MonthView;
pub use quota::{quota_status, remaining_days, used_days, LOW_QUOTA_THRESHOLD};
pub use store::InMemoryStore;

use std::path::Path;

use tracing::info;

use crate::model::Language;
use crate::storage::{Collection, Storage};

/// The vacation planner: the three collections plus an optional storage directory.
///
/// Mutations take `&mut self` and are all-or-nothing: each builds the next store on a
/// copy, persists the collections it touched, and only then swaps the copy in. A
/// storage failure therefore leaves the in-memory state as it was.
pub struct Planner {
    store: InMemoryStore,
    storage: Option<Storage>,
    language: Language,
}

impl Planner {
    /// Planner with no backing directory. Used by tests and benches.
    pub fn in_memory() -> Self {
        Self {
            store: InMemoryStore::new(),
            storage: None,
            language: Language::default(),
        }
    }

    /// Load the collections found in `dir`, creating it if needed.
    ///
    /// Files that break the record invariants (a zero-length block, a block whose
    /// owner is gone, a repeated id) fail with `Storage`.
    pub fn open(dir: &Path) -> Result<Self, EngineError> {
        let storage = Storage::open(dir).map_err(|e| EngineError::Storage(e.to_string()))?;
        let store = storage
            .load()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        info!(
            employees = store.employee_count(),
            blocks = store.block_count(),
            coverage = store.coverage().len(),
            "loaded planner from {}",
            storage.dir().display()
        );
        Ok(Self {
            store,
            storage: Some(storage),
            language: Language::default(),
        })
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    /// Persist `touched` from `next`, then make `next` the live state.
    pub(super) fn commit(
        &mut self,
        next: InMemoryStore,
        touched: &[Collection],
    ) -> Result<(), EngineError> {
        if let Some(storage) = &self.storage {
            storage
                .write(&next, touched)
                .map_err(|e| EngineError::Storage(e.to_string()))?;
        }
        self.store = next;
        Ok(())
    }
}
