use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::protocol::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total requests handled. Labels: op, status.
pub const REQUESTS_TOTAL: &str = "vacaplan_requests_total";

/// Histogram: request latency in seconds, lock wait included. Labels: op.
pub const REQUEST_DURATION_SECONDS: &str = "vacaplan_request_duration_seconds";

/// Histogram: time to lay out the requested months, in seconds.
pub const LAYOUT_DURATION_SECONDS: &str = "vacaplan_layout_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "vacaplan_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "vacaplan_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "vacaplan_connections_rejected_total";

/// Gauge: employees currently stored.
pub const EMPLOYEES_STORED: &str = "vacaplan_employees_stored";

/// Gauge: blocks currently stored, placed or pending.
pub const BLOCKS_STORED: &str = "vacaplan_blocks_stored";

/// Install the Prometheus exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::ListEmployees => "list_employees",
        Command::AddEmployee { .. } => "add_employee",
        Command::UpdateEmployee { .. } => "update_employee",
        Command::DeleteEmployee { .. } => "delete_employee",
        Command::CreateBlock { .. } => "create_block",
        Command::PlaceBlock { .. } => "place_block",
        Command::UnplaceBlock { .. } => "unplace_block",
        Command::EditBlock { .. } => "edit_block",
        Command::DeleteBlock { .. } => "delete_block",
        Command::PendingBlocks => "pending_blocks",
        Command::RemainingDays { .. } => "remaining_days",
        Command::WeekendExposures { .. } => "weekend_exposures",
        Command::SetReplacement { .. } => "set_replacement",
        Command::ClearReplacement { .. } => "clear_replacement",
        Command::Coverage => "coverage",
        Command::MonthView { .. } => "month_view",
        Command::Export => "export",
        Command::Import { .. } => "import",
    }
}
