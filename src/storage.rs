use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::InMemoryStore;
use crate::model::*;

pub const EMPLOYEES_FILE: &str = "employees.json";
pub const BLOCKS_FILE: &str = "blocks.json";
pub const COVERAGE_FILE: &str = "coverage.json";

/// Which persisted collection a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Employees,
    Blocks,
    Coverage,
}

/// Employee record as found on disk. Older files may lack the quota, the weekend
/// flags or the color.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredEmployee {
    id: EmployeeId,
    first_name: String,
    last_name: String,
    quota_days: Option<u32>,
    works_saturday: Option<bool>,
    works_sunday: Option<bool>,
    color: Option<String>,
}

impl StoredEmployee {
    pub(crate) fn is_legacy(&self) -> bool {
        self.quota_days.is_none()
            || self.works_saturday.is_none()
            || self.works_sunday.is_none()
            || self.color.is_none()
    }

    pub(crate) fn normalize(self) -> Employee {
        Employee {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            quota_days: self.quota_days.unwrap_or_else(default_quota),
            works_saturday: self.works_saturday.unwrap_or(false),
            works_sunday: self.works_sunday.unwrap_or(false),
            color: self.color.unwrap_or_else(default_color),
        }
    }
}

/// Directory holding one JSON document per collection.
///
/// Each file is rewritten in full on every change: `<name>.json.tmp` is written and
/// fsynced, then renamed over the live file, so a crash leaves either the old or the
/// new document, never a torn one.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open (or create) the data directory.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read all three collections. Missing files are empty collections.
    ///
    /// Records that break the store invariants are reported as `InvalidData`.
    /// Dangling coverage entries are dropped.
    pub fn load(&self) -> io::Result<InMemoryStore> {
        let stored: Vec<StoredEmployee> =
            read_json(&self.dir.join(EMPLOYEES_FILE))?.unwrap_or_default();
        let legacy = stored.iter().filter(|e| e.is_legacy()).count();
        if legacy > 0 {
            warn!("filled defaults for {legacy} employee record(s) missing fields");
        }
        let employees = stored.into_iter().map(StoredEmployee::normalize).collect();
        let blocks: Vec<VacationBlock> =
            read_json(&self.dir.join(BLOCKS_FILE))?.unwrap_or_default();
        let coverage: CoverageMap =
            read_json(&self.dir.join(COVERAGE_FILE))?.unwrap_or_default();
        InMemoryStore::checked(employees, blocks, coverage).map_err(|msg| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {msg}", self.dir.display()),
            )
        })
    }

    pub fn write_employees(&self, employees: &[Employee]) -> io::Result<()> {
        write_json_atomic(&self.dir.join(EMPLOYEES_FILE), &employees)
    }

    pub fn write_blocks(&self, blocks: &[VacationBlock]) -> io::Result<()> {
        write_json_atomic(&self.dir.join(BLOCKS_FILE), &blocks)
    }

    pub fn write_coverage(&self, coverage: &CoverageMap) -> io::Result<()> {
        write_json_atomic(&self.dir.join(COVERAGE_FILE), coverage)
    }

    /// Rewrite the named collections from `store`, in the order given.
    pub fn write(&self, store: &InMemoryStore, touched: &[Collection]) -> io::Result<()> {
        for collection in touched {
            match collection {
                Collection::Employees => self.write_employees(store.employees())?,
                Collection::Blocks => self.write_blocks(store.blocks())?,
                Collection::Coverage => self.write_coverage(store.coverage())?,
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {e}", path.display()),
        )
    })?;
    Ok(Some(value))
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn tmp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("vacaplan_test_storage_{}", Ulid::new()))
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        let store = storage.load().unwrap();
        assert_eq!(store, InMemoryStore::new());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_and_reload() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();

        let emp = EmployeeDraft::new("Ana", "Ruiz")
            .working_weekends(true, false)
            .into_employee(Ulid::new());
        let block = VacationBlock {
            id: Ulid::new(),
            employee_id: emp.id,
            day_count: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 1),
        };
        let mut coverage = CoverageMap::new();
        coverage.insert(block.id, Replacement::Reinforcement);

        let store = InMemoryStore::from_parts(vec![emp], vec![block], coverage);
        storage
            .write(&store, &[Collection::Employees, Collection::Blocks, Collection::Coverage])
            .unwrap();

        let reloaded = Storage::open(&dir).unwrap().load().unwrap();
        assert_eq!(reloaded, store);
        assert!(!dir.join("blocks.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn legacy_employee_gets_defaults() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        let id = Ulid::new();
        fs::write(
            dir.join(EMPLOYEES_FILE),
            format!(r#"[{{"id":"{id}","firstName":"Pablo","lastName":"Vidal"}}]"#),
        )
        .unwrap();

        let store = storage.load().unwrap();
        let emp = store.employee(&id).unwrap();
        assert_eq!(emp.quota_days, DEFAULT_QUOTA_DAYS);
        assert!(!emp.works_saturday);
        assert!(!emp.works_sunday);
        assert_eq!(emp.color, DEFAULT_COLOR);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_invalid_data() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        fs::write(dir.join(BLOCKS_FILE), "[{not json").unwrap();
        let err = storage.load().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let _ = fs::remove_dir_all(&dir);
    }

    fn write_team(dir: &Path, owner: EmployeeId, blocks: serde_json::Value) {
        fs::write(
            dir.join(EMPLOYEES_FILE),
            format!(r#"[{{"id":"{owner}","firstName":"Ana","lastName":"Ruiz"}}]"#),
        )
        .unwrap();
        fs::write(dir.join(BLOCKS_FILE), blocks.to_string()).unwrap();
    }

    #[test]
    fn zero_day_block_on_disk_rejected() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        let owner = Ulid::new();
        write_team(
            &dir,
            owner,
            serde_json::json!([{"id": Ulid::new(), "employeeId": owner, "dayCount": 0, "startDate": "2025-03-10"}]),
        );
        let err = storage.load().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("day count"), "{err}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn orphan_block_on_disk_rejected() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        let owner = Ulid::new();
        write_team(
            &dir,
            owner,
            serde_json::json!([{"id": Ulid::new(), "employeeId": Ulid::new(), "dayCount": 3, "startDate": null}]),
        );
        let err = storage.load().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("unknown employee"), "{err}");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dangling_coverage_on_disk_dropped() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        let owner = Ulid::new();
        let block = Ulid::new();
        write_team(
            &dir,
            owner,
            serde_json::json!([{"id": block, "employeeId": owner, "dayCount": 3, "startDate": null}]),
        );
        fs::write(
            dir.join(COVERAGE_FILE),
            serde_json::json!({ block.to_string(): owner, Ulid::new().to_string(): "REINFORCEMENT" }).to_string(),
        )
        .unwrap();

        let store = storage.load().unwrap();
        assert_eq!(store.block_count(), 1);
        assert!(store.coverage().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_fails_when_directory_vanishes() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert!(storage.write_blocks(&[]).is_err());
    }

    #[test]
    fn only_touched_collections_written() {
        let dir = tmp_dir();
        let storage = Storage::open(&dir).unwrap();
        storage.write(&InMemoryStore::new(), &[Collection::Coverage]).unwrap();
        assert!(dir.join(COVERAGE_FILE).exists());
        assert!(!dir.join(EMPLOYEES_FILE).exists());
        assert!(!dir.join(BLOCKS_FILE).exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
