use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::EngineError;
use crate::model::*;

/// One request line, tagged by `"op"`.
///
/// ```text
/// {"op":"create_block","employeeId":"01J…","dayCount":5}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Command {
    ListEmployees,
    AddEmployee {
        employee: EmployeeDraft,
    },
    UpdateEmployee {
        id: EmployeeId,
        employee: EmployeeDraft,
    },
    DeleteEmployee {
        id: EmployeeId,
    },
    CreateBlock {
        employee_id: EmployeeId,
        day_count: u32,
    },
    PlaceBlock {
        block_id: BlockId,
        start_date: NaiveDate,
    },
    UnplaceBlock {
        block_id: BlockId,
    },
    EditBlock {
        block_id: BlockId,
        day_count: u32,
        #[serde(default)]
        start_date: Option<NaiveDate>,
    },
    DeleteBlock {
        block_id: BlockId,
    },
    PendingBlocks,
    RemainingDays {
        employee_id: EmployeeId,
    },
    WeekendExposures {
        block_id: BlockId,
    },
    SetReplacement {
        block_id: BlockId,
        replacement: Replacement,
    },
    ClearReplacement {
        block_id: BlockId,
    },
    Coverage,
    MonthView {
        year: i32,
        months: Vec<u32>,
    },
    Export,
    Import {
        snapshot: Value,
    },
}

impl Command {
    /// Whether the command can change stored state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddEmployee { .. }
                | Command::UpdateEmployee { .. }
                | Command::DeleteEmployee { .. }
                | Command::CreateBlock { .. }
                | Command::PlaceBlock { .. }
                | Command::UnplaceBlock { .. }
                | Command::EditBlock { .. }
                | Command::DeleteBlock { .. }
                | Command::SetReplacement { .. }
                | Command::ClearReplacement { .. }
                | Command::Import { .. }
        )
    }
}

pub fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    serde_json::from_str(trimmed).map_err(|e| ProtocolError::Parse(e.to_string()))
}

#[derive(Debug)]
pub enum ProtocolError {
    Parse(String),
    Empty,
    LineTooLong,
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Parse(_) | ProtocolError::Empty => "BAD_REQUEST",
            ProtocolError::LineTooLong => "LINE_TOO_LONG",
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Parse(s) => write!(f, "parse error: {s}"),
            ProtocolError::Empty => write!(f, "empty request"),
            ProtocolError::LineTooLong => write!(f, "request line too long"),
        }
    }
}

impl std::error::Error for ProtocolError {}

// ── Responses ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// `{"ok":true,"data":…}` or `{"ok":false,"error":{"code":…,"message":…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn ok<T: Serialize + ?Sized>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                ok: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::error("INTERNAL", e.to_string()),
        }
    }

    pub fn empty() -> Self {
        Self {
            ok: true,
            data: Some(Value::Null),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Error code, if this is a failure.
    pub fn code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }

    /// Serialize to one line (no trailing newline; the codec adds it).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"error":{{"code":"INTERNAL","message":"{e}"}}}}"#)
        })
    }
}

impl From<EngineError> for Response {
    fn from(e: EngineError) -> Self {
        Response::error(e.code(), e.to_string())
    }
}

impl From<ProtocolError> for Response {
    fn from(e: ProtocolError) -> Self {
        Response::error(e.code(), e.to_string())
    }
}
