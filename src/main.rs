use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tetrabase::docker::DockerClient;
use tetrabase::server::config::ServerConfig;
use tetrabase::server::status_poller::StatusPoller;
use tetrabase::version::VERSION;
use tetrabase::web::{self, models::WsMessage};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "tetrabase.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Manually check for --version before full parsing to keep the output minimal.
    if std::env::args().any(|arg| arg == "--version") {
        println!("TetraBase version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting TetraBase, version: {}", VERSION);

    // --- Container Engine ---
    let docker = match DockerClient::connect(server_config.stop_timeout_secs).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to connect to the container engine.");
            return Err(e.into());
        }
    };

    // --- Status Push ---
    let (status_tx, _) = broadcast::channel::<WsMessage>(16);
    let poller_handle = StatusPoller::new(
        docker.clone(),
        status_tx.clone(),
        server_config.poll_interval(),
    )
    .run();

    // --- Axum HTTP Server Setup ---
    let app = web::create_axum_router(docker, status_tx, server_config.clone());

    let addr = server_config.listen_addr;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, "TetraBase running at http://localhost:{}", addr.port());

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Box::new)?;

    poller_handle.abort();
    info!("TetraBase stopped.");
    Ok(())
}
