use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use expense_tracker::app::{AppState, build_router};
use expense_tracker::config::AppConfig;
use expense_tracker::repositories::category_repository::PostgresCategoryRepository;
use expense_tracker::repositories::expense_repository::PostgresExpenseRepository;
use expense_tracker::repositories::user_repository::PostgresUserRepository;
use expense_tracker::services::auth_service::{AuthServiceImpl, AuthSettings};
use expense_tracker::services::category_service::{CategoryService, CategoryServiceImpl};
use expense_tracker::services::expense_service::ExpenseServiceImpl;
use expense_tracker::services::user_service::UserServiceImpl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("expense_tracker=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!("connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations completed");

    // Repositories
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let expense_repository = Arc::new(PostgresExpenseRepository::new(pool));

    // Services
    let auth_settings = AuthSettings {
        jwt_secret: config.security.jwt_secret.clone(),
        token_ttl: config.security.token_ttl(),
        bcrypt_cost: config.security.bcrypt_cost,
        default_category: config.default_category.clone(),
    };
    let category_service: Arc<dyn CategoryService> = Arc::new(CategoryServiceImpl::new(
        category_repository,
        expense_repository.clone(),
    ));
    let state = AppState {
        auth_service: Arc::new(AuthServiceImpl::new(user_repository.clone(), auth_settings)),
        user_service: Arc::new(UserServiceImpl::new(
            user_repository.clone(),
            config.security.bcrypt_cost,
        )),
        category_service: category_service.clone(),
        expense_service: Arc::new(ExpenseServiceImpl::new(
            expense_repository,
            category_service,
            user_repository,
        )),
    };

    let app = build_router(state);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("server running on http://{}", addr);
    tracing::info!("API docs at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutting down");
}
