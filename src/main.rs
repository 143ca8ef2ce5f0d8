use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use vacaplan::config::Config;
use vacaplan::engine::Planner;
use vacaplan::server;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const DRAIN_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    vacaplan::observability::init(config.metrics_port)?;

    let planner = Planner::open(&config.data_dir)?.with_language(config.language);
    metrics::gauge!(vacaplan::observability::EMPLOYEES_STORED).set(planner.employees().len() as f64);
    metrics::gauge!(vacaplan::observability::BLOCKS_STORED).set(planner.blocks().len() as f64);
    let planner = server::shared(planner);
    let max_connections = config.max_connections;
    let semaphore = Arc::new(Semaphore::new(max_connections));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("vacaplan listening on {addr}");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  max_connections: {max_connections}");
    info!("  language: {:?}", config.language);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("accept failed: {e}");
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let Ok(permit) = semaphore.clone().try_acquire_owned() else {
            tracing::warn!("refusing {peer}: all {max_connections} connection slots busy");
            metrics::counter!(vacaplan::observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
            continue;
        };

        info!("client {peer} connected");
        metrics::counter!(vacaplan::observability::CONNECTIONS_TOTAL).increment(1);
        metrics::gauge!(vacaplan::observability::CONNECTIONS_ACTIVE).increment(1.0);
        let planner = planner.clone();
        tokio::spawn(async move {
            if let Err(e) = server::process_connection(socket, planner).await {
                tracing::error!("client {peer}: {e}");
            }
            metrics::gauge!(vacaplan::observability::CONNECTIONS_ACTIVE).decrement(1.0);
            drop(permit);
        });
    }

    info!("no longer accepting clients");
    drain(&semaphore, max_connections, DRAIN_TIMEOUT).await;
    info!("vacaplan stopped");
    Ok(())
}

/// Resolves on ctrl-c, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!("cannot listen for SIGTERM ({e}), ctrl-c only"),
        }
    }
    tokio::signal::ctrl_c().await.ok();
}

/// Wait until every connection permit is back, or `timeout` passes.
async fn drain(semaphore: &Semaphore, max_connections: usize, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while semaphore.available_permits() < max_connections {
        if tokio::time::Instant::now() >= deadline {
            let open = max_connections - semaphore.available_permits();
            tracing::warn!("gave up waiting on {open} open connection(s)");
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
    info!("all clients disconnected");
}
