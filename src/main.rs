//! LearnHub Server — E-Learning Platform Backend
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use learnhub_core::config::AppConfig;
use learnhub_core::error::AppError;

#[tokio::main]
async fn main() {
    let config_path =
        std::env::var("LEARNHUB_CONFIG").unwrap_or_else(|_| "config/default".to_string());

    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting LearnHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = learnhub_database::connection::create_pool(&config.database).await?;
    learnhub_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Repositories ─────────────────────────────────────
    let user_repo = Arc::new(learnhub_database::repositories::user::UserRepository::new(
        db_pool.clone(),
    ));
    let course_repo = Arc::new(
        learnhub_database::repositories::course::CourseRepository::new(db_pool.clone()),
    );
    let enrollment_repo = Arc::new(
        learnhub_database::repositories::enrollment::EnrollmentRepository::new(db_pool.clone()),
    );
    let job_repo = Arc::new(learnhub_database::repositories::job::JobRepository::new(
        db_pool.clone(),
    ));

    // ── Step 3: Auth ─────────────────────────────────────────────
    let password_hasher = Arc::new(learnhub_auth::password::PasswordHasher::new());
    let jwt_encoder = Arc::new(learnhub_auth::jwt::JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(learnhub_auth::jwt::JwtDecoder::new(&config.auth));

    // ── Step 4: Enrollment queue + services ──────────────────────
    let queue = Arc::new(learnhub_queue::queue::EnrollmentQueue::new(
        Arc::clone(&job_repo),
        config.queue.clone(),
    ));

    let enrollment_service = Arc::new(
        learnhub_service::enrollment::service::EnrollmentService::new(
            Arc::clone(&course_repo),
            Arc::clone(&enrollment_repo),
            Arc::clone(&queue),
        ),
    );
    let queue_status_service = Arc::new(
        learnhub_service::enrollment::status::QueueStatusService::new(Arc::clone(&queue)),
    );

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Worker pool + maintenance scheduler ──────────────
    let (worker_handle, scheduler) = if config.queue.enabled {
        tracing::info!("Starting enrollment worker pool...");

        let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);

        let mut executor = learnhub_queue::executor::JobExecutor::new();
        executor.register(Arc::new(
            learnhub_queue::jobs::enrollment::EnrollmentJobHandler::new(
                Arc::clone(&user_repo),
                Arc::clone(&course_repo),
                Arc::clone(&enrollment_repo),
            ),
        ));
        let executor = Arc::new(executor);

        let runner = learnhub_queue::runner::WorkerRunner::new(
            Arc::clone(&queue),
            Arc::clone(&executor),
            worker_id,
        );

        let scheduler =
            learnhub_queue::scheduler::MaintenanceScheduler::new(Arc::clone(&queue)).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;

        let worker_shutdown = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_shutdown).await;
        });

        tracing::info!("Enrollment worker pool started");
        (Some(handle), Some(scheduler))
    } else {
        tracing::info!("Enrollment worker pool disabled");
        (None, None)
    };

    // ── Step 7: Build and start the HTTP server ──────────────────
    let app_state = learnhub_api::state::AppState {
        config: Arc::new(config.clone()),
        db_pool: db_pool.clone(),
        jwt_encoder,
        jwt_decoder,
        password_hasher,
        user_repo,
        enrollment_service,
        queue_status_service,
    };

    let app = learnhub_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("LearnHub server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Drain background tasks ───────────────────────────
    if let Some(scheduler) = scheduler {
        let _ = scheduler.shutdown().await;
    }
    if let Some(handle) = worker_handle {
        tracing::info!("Waiting for in-flight enrollment jobs to complete...");
        let _ = tokio::time::timeout(std::time::Duration::from_secs(35), handle).await;
    }

    tracing::info!("LearnHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
