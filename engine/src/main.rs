use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use waitroom::config::AppConfig;
use waitroom::queue::backend::{MockBackend, QueueBackend};
use waitroom::queue::captcha::{CaptchaVerifier, RecaptchaVerifier};
use waitroom::queue::QueueManager;
use waitroom::startup::{print_startup_summary, StartupConfig};
use waitroom::{http, runtime, telemetry};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler, continuing without it");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, continuing without it");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.log_format);
    runtime::print_runtime_info();

    let queue_manager = create_queue_manager(&config);
    if queue_manager.scheduler().start() {
        info!("Auto-promotion scheduler running");
    }

    let router = http::create_router(
        Arc::clone(&queue_manager),
        config.cors_allow_origin.as_deref(),
    );
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(port = config.port, error = %e, "Failed to bind HTTP listener");
            return Err(e.into());
        }
    };

    print_startup_summary(&StartupConfig::new(&config));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        endpoint = %format!("http://{addr}"),
        "waitroom ready"
    );

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!(error = %e, "HTTP server error");
    }

    queue_manager.shutdown();
    info!("Shutdown complete");
    Ok(())
}

/// Build the manager with the configured backend and optional CAPTCHA.
fn create_queue_manager(config: &AppConfig) -> Arc<QueueManager> {
    let backend: Arc<dyn QueueBackend> = Arc::new(MockBackend::new(config.backend_failure_rate));
    if config.backend_failure_rate > 0.0 {
        warn!(
            failure_rate = config.backend_failure_rate,
            "Mock backend will inject failures"
        );
    }

    let captcha = config.captcha.as_ref().map(|c| {
        info!(threshold = c.threshold, "reCAPTCHA verification enabled");
        Arc::new(RecaptchaVerifier::new(c.secret.clone(), c.threshold)) as Arc<dyn CaptchaVerifier>
    });

    QueueManager::with_components(config.queue.clone(), backend, captcha)
}
