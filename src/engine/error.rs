use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    QuotaExceeded {
        employee: Ulid,
        remaining: i64,
        requested: u32,
    },
    UnknownEmployee(Ulid),
    UnknownBlock(Ulid),
    InvalidReplacement {
        block: Ulid,
        employee: Ulid,
    },
    InvalidImportPayload(String),
    InvalidDayCount(u32),
    InvalidMonth(u32),
    LimitExceeded(&'static str),
    Storage(String),
}

impl EngineError {
    /// Stable machine-readable code reported over the protocol.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            EngineError::UnknownEmployee(_) => "UNKNOWN_EMPLOYEE",
            EngineError::UnknownBlock(_) => "UNKNOWN_BLOCK",
            EngineError::InvalidReplacement { .. } => "INVALID_REPLACEMENT",
            EngineError::InvalidImportPayload(_) => "INVALID_IMPORT_PAYLOAD",
            EngineError::InvalidDayCount(_) => "INVALID_DAY_COUNT",
            EngineError::InvalidMonth(_) => "INVALID_MONTH",
            EngineError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            EngineError::Storage(_) => "STORAGE",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::QuotaExceeded {
                employee,
                remaining,
                requested,
            } => write!(
                f,
                "employee {employee} only has {remaining} days left; cannot assign {requested}"
            ),
            EngineError::UnknownEmployee(id) => write!(f, "unknown employee: {id}"),
            EngineError::UnknownBlock(id) => write!(f, "unknown block: {id}"),
            EngineError::InvalidReplacement { block, employee } => {
                write!(f, "employee {employee} owns block {block} and cannot cover it")
            }
            EngineError::InvalidImportPayload(msg) => write!(f, "invalid import payload: {msg}"),
            EngineError::InvalidDayCount(n) => write!(f, "invalid day count: {n} (must be at least 1)"),
            EngineError::InvalidMonth(m) => write!(f, "invalid month: {m} (expected 1-12)"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
