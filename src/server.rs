use std::io;
use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, warn};

use crate::engine::{EngineError, Planner};
use crate::limits::MAX_LINE_LEN;
use crate::observability;
use crate::protocol::{self, Command, ProtocolError, Response};

/// The planner shared by every connection. One lock serializes all commands.
pub type SharedPlanner = Arc<Mutex<Planner>>;

pub fn shared(planner: Planner) -> SharedPlanner {
    Arc::new(Mutex::new(planner))
}

/// Run one command against the planner and build its response payload.
pub fn execute_command(planner: &mut Planner, cmd: Command) -> Result<Response, EngineError> {
    match cmd {
        Command::ListEmployees => Ok(Response::ok(&planner.employee_summaries())),
        Command::AddEmployee { employee } => {
            let id = planner.add_employee(employee)?;
            Ok(Response::ok(&json!({ "id": id })))
        }
        Command::UpdateEmployee { id, employee } => {
            planner.update_employee(id, employee)?;
            Ok(Response::ok(planner.employee(&id)?))
        }
        Command::DeleteEmployee { id } => {
            let removed = planner.delete_employee(id)?;
            Ok(Response::ok(&json!({ "removedBlocks": removed })))
        }
        Command::CreateBlock {
            employee_id,
            day_count,
        } => {
            let id = planner.create_block(employee_id, day_count)?;
            Ok(Response::ok(planner.block(&id)?))
        }
        Command::PlaceBlock {
            block_id,
            start_date,
        } => {
            planner.place_or_move(block_id, start_date)?;
            Ok(Response::ok(planner.block(&block_id)?))
        }
        Command::UnplaceBlock { block_id } => {
            planner.unplace_block(block_id)?;
            Ok(Response::ok(planner.block(&block_id)?))
        }
        Command::EditBlock {
            block_id,
            day_count,
            start_date,
        } => {
            planner.edit_block(block_id, day_count, start_date)?;
            Ok(Response::ok(planner.block(&block_id)?))
        }
        Command::DeleteBlock { block_id } => {
            planner.delete_block(block_id)?;
            Ok(Response::empty())
        }
        Command::PendingBlocks => Ok(Response::ok(&planner.pending_blocks())),
        Command::RemainingDays { employee_id } => {
            let remaining = planner.remaining_days(&employee_id)?;
            Ok(Response::ok(&json!({
                "employeeId": employee_id,
                "remainingDays": remaining,
                "status": crate::engine::quota_status(remaining),
            })))
        }
        Command::WeekendExposures { block_id } => {
            Ok(Response::ok(&planner.weekend_exposures(&block_id)?))
        }
        Command::SetReplacement {
            block_id,
            replacement,
        } => {
            planner.set_replacement(block_id, replacement)?;
            Ok(Response::empty())
        }
        Command::ClearReplacement { block_id } => {
            let previous = planner.clear_replacement(block_id)?;
            Ok(Response::ok(&json!({ "previous": previous })))
        }
        Command::Coverage => Ok(Response::ok(&planner.coverage_worklist())),
        Command::MonthView { year, months } => Ok(Response::ok(&planner.month_view(year, &months)?)),
        Command::Export => Ok(Response::ok(&planner.export_snapshot())),
        Command::Import { snapshot } => {
            planner.import_snapshot(snapshot)?;
            Ok(Response::ok(&json!({
                "employees": planner.employees().len(),
                "blocks": planner.blocks().len(),
            })))
        }
    }
}

/// Parse, execute and account for one request line.
pub async fn handle_line(planner: &SharedPlanner, line: &str) -> Response {
    let cmd = match protocol::parse_command(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!("rejected request: {e}");
            metrics::counter!(observability::REQUESTS_TOTAL, "op" => "invalid", "status" => "error")
                .increment(1);
            return Response::from(e);
        }
    };

    let label = observability::command_label(&cmd);
    let mutation = cmd.is_mutation();
    let start = Instant::now();

    let mut guard = planner.lock().await;
    let response = match execute_command(&mut guard, cmd) {
        Ok(response) => response,
        Err(e) => {
            warn!(op = label, code = e.code(), "{e}");
            Response::from(e)
        }
    };
    if mutation && response.ok {
        metrics::gauge!(observability::EMPLOYEES_STORED).set(guard.employees().len() as f64);
        metrics::gauge!(observability::BLOCKS_STORED).set(guard.blocks().len() as f64);
    }
    drop(guard);

    let status = if response.ok { "ok" } else { "error" };
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => label, "status" => status).increment(1);
    metrics::histogram!(observability::REQUEST_DURATION_SECONDS, "op" => label)
        .record(start.elapsed().as_secs_f64());
    debug!(op = label, status, "request handled");
    response
}

fn codec_err(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::Io(e) => e,
        LinesCodecError::MaxLineLengthExceeded => {
            io::Error::new(io::ErrorKind::InvalidData, ProtocolError::LineTooLong)
        }
    }
}

/// Serve newline-delimited JSON requests on one connection until the peer hangs up.
///
/// An over-long line is answered with `LINE_TOO_LONG`; the codec discards the rest of
/// it and the connection stays usable.
pub async fn process_connection(socket: TcpStream, planner: SharedPlanner) -> io::Result<()> {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    while let Some(frame) = framed.next().await {
        let response = match frame {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(&planner, &line).await,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("request line exceeded {MAX_LINE_LEN} bytes");
                Response::from(ProtocolError::LineTooLong)
            }
            Err(e) => return Err(codec_err(e)),
        };
        framed.send(response.to_line()).await.map_err(codec_err)?;
    }
    Ok(())
}
