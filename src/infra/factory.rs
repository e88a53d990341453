use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::models::admin::Admin;
use crate::domain::services::{auth_service::AuthService, mailer::load_templates};
use crate::error::AppError;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_admin_repo::PostgresAdminRepo, postgres_event_repo::PostgresEventRepo,
    postgres_guest_repo::PostgresGuestRepo,
    sqlite_admin_repo::SqliteAdminRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_guest_repo::SqliteGuestRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let email_service = Arc::new(HttpEmailService::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
    ));

    let templates = Arc::new(load_templates().expect("Failed to load email templates"));

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(PostgresAdminRepo::new(pool.clone())),
            Arc::new(PostgresEventRepo::new(pool.clone())),
            Arc::new(PostgresGuestRepo::new(pool)),
            email_service,
            templates,
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(SqliteAdminRepo::new(pool.clone())),
            Arc::new(SqliteEventRepo::new(pool.clone())),
            Arc::new(SqliteGuestRepo::new(pool)),
            email_service,
            templates,
        )
    };

    ensure_default_admin(&state).await.expect("Failed to create default admin");
    state
}

/// Creates the admin named by `DEFAULT_ADMIN_EMAIL`/`DEFAULT_ADMIN_PASSWORD`
/// when no admin exists yet. Returns whether one was created.
pub async fn ensure_default_admin(state: &AppState) -> Result<bool, AppError> {
    let (Some(email), Some(password)) = (&state.config.default_admin_email, &state.config.default_admin_password) else {
        return Ok(false);
    };

    if state.admin_repo.count().await? > 0 {
        return Ok(false);
    }

    let admin = Admin::new(email, AuthService::hash_password(password)?);
    state.admin_repo.create(&admin).await?;
    warn!("Created default admin {}; change its password after first login", admin.email);
    Ok(true)
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
