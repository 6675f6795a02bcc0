use std::sync::Arc;

use account_service::config::Config;
use account_service::dispatcher::TaskDispatcher;
use account_service::domain::account::ports::AccountServicePort;
use account_service::domain::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::clock::SystemClock;
use account_service::outbound::mailer::LogMailer;
use account_service::outbound::repositories::token::PostgresTokenRepository;
use account_service::outbound::repositories::user::PostgresUserRepository;
use auth::Authenticator;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    let expiry_policy = config.tokens.expiry_policy()?;

    tracing::info!(
        http_port = config.server.http_port,
        environment = %config.server.environment,
        max_connections = config.database.max_connections,
        authentication_ttl_minutes = config.tokens.authentication_ttl_minutes,
        activation_ttl_minutes = config.tokens.activation_ttl_minutes,
        password_reset_ttl_minutes = config.tokens.password_reset_ttl_minutes,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let dispatcher = TaskDispatcher::new();
    let account_service: Arc<dyn AccountServicePort> = Arc::new(AccountService::new(
        Arc::new(PostgresUserRepository::new(pg_pool.clone())),
        Arc::new(PostgresTokenRepository::new(pg_pool.clone())),
        Arc::new(LogMailer::new(config.mailer.sender.clone())),
        Arc::new(Authenticator::new(expiry_policy)),
        dispatcher.clone(),
        Arc::new(SystemClock),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(account_service, &config.server.environment);
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        in_flight = dispatcher.in_flight(),
        "Http server stopped, draining background tasks"
    );

    match dispatcher
        .drain_with_deadline(config.dispatcher.drain_timeout())
        .await
    {
        Ok(()) => tracing::info!("Background tasks drained"),
        Err(e) => tracing::warn!(error = %e, "Shutting down with background tasks still running"),
    }

    pg_pool.close().await;
    tracing::info!("Service stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
        _ = terminate => tracing::info!(signal = "SIGTERM", "Shutdown signal received"),
    }
}
