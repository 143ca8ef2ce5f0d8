use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{EngineError, InMemoryStore};
use crate::limits::*;
use crate::model::*;
use crate::storage::StoredEmployee;

/// Snapshot format written by `export`. Imports of newer versions are refused.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Every collection at one instant, as exchanged by export/import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub employees: Vec<Employee>,
    pub blocks: Vec<VacationBlock>,
    pub coverage: CoverageMap,
}

impl Snapshot {
    pub fn capture(store: &InMemoryStore) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            employees: store.employees().to_vec(),
            blocks: store.blocks().to_vec(),
            coverage: store.coverage().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Storage(e.to_string()))
    }
}

fn invalid(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidImportPayload(msg.into())
}

/// Validate a snapshot document and build the store it describes.
///
/// `employees` and `blocks` must be present arrays. A missing `version` is read as 1,
/// a missing `coverage` as empty. Coverage entries that point at unknown blocks or
/// employees, or name the block owner, are dropped with a warning. Nothing here
/// touches live state.
pub fn store_from_value(value: Value) -> Result<InMemoryStore, EngineError> {
    let Value::Object(mut doc) = value else {
        return Err(invalid("snapshot must be a JSON object"));
    };

    let version = match doc.get("version") {
        None | Some(Value::Null) => 1,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| invalid("version must be a positive integer"))?,
    };
    if version == 0 || version > u64::from(SNAPSHOT_VERSION) {
        return Err(invalid(format!("unsupported snapshot version {version}")));
    }

    let raw_employees = match doc.remove("employees") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid("employees must be an array")),
        None => return Err(invalid("missing employees array")),
    };
    let raw_blocks = match doc.remove("blocks") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid("blocks must be an array")),
        None => return Err(invalid("missing blocks array")),
    };
    if raw_employees.len() > MAX_EMPLOYEES {
        return Err(EngineError::LimitExceeded("too many employees"));
    }
    if raw_blocks.len() > MAX_BLOCKS {
        return Err(EngineError::LimitExceeded("too many blocks"));
    }

    let employees = raw_employees
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_value::<StoredEmployee>(raw)
                .map(StoredEmployee::normalize)
                .map_err(|e| invalid(format!("employee {i}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let blocks = raw_blocks
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_value::<VacationBlock>(raw)
                .map_err(|e| invalid(format!("block {i}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let coverage: CoverageMap = match doc.remove("coverage") {
        None | Some(Value::Null) => CoverageMap::new(),
        Some(v) => serde_json::from_value(v).map_err(|e| invalid(format!("coverage: {e}")))?,
    };

    InMemoryStore::checked(employees, blocks, coverage).map_err(invalid)
}
