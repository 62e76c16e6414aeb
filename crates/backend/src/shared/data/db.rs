use once_cell::sync::OnceCell;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

use crate::domain::a002_tax_category;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Open (or create) the SQLite file, ensure the schema and keep the connection globally
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database: {}", db_url);
    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// In-memory database with the full schema. Single connection, so every query
/// sees the same memory database.
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    bootstrap_schema(&conn).await?;
    Ok(conn)
}

pub fn get_connection() -> Option<&'static DatabaseConnection> {
    DB_CONN.get()
}

async fn table_exists(conn: &DatabaseConnection, table: &str) -> anyhow::Result<bool> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            [table.into()],
        ))
        .await?;
    Ok(!rows.is_empty())
}

async fn create_table(conn: &DatabaseConnection, table: &str, sql: &str) -> anyhow::Result<bool> {
    if table_exists(conn, table).await? {
        return Ok(false);
    }
    tracing::info!("Creating {} table", table);
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        sql.to_string(),
    ))
    .await?;
    Ok(true)
}

/// Ensure required tables exist (minimal schema bootstrap)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    create_table(
        conn,
        "a001_payment",
        r#"
            CREATE TABLE a001_payment (
                id TEXT PRIMARY KEY NOT NULL,
                date TEXT NOT NULL,
                amount REAL NOT NULL,
                invoiced INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#,
    )
    .await?;

    let categories_created = create_table(
        conn,
        "a002_tax_category",
        r#"
            CREATE TABLE a002_tax_category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                annual_limit REAL NOT NULL,
                monthly_fee_services REAL NOT NULL,
                monthly_fee_commerce REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                valid_until TEXT
            );
        "#,
    )
    .await?;

    create_table(
        conn,
        "a003_user_config",
        r#"
            CREATE TABLE a003_user_config (
                id TEXT PRIMARY KEY NOT NULL,
                current_category TEXT NOT NULL,
                activity_type TEXT NOT NULL DEFAULT 'services',
                target_invoicing_percentage INTEGER NOT NULL DEFAULT 100,
                registration_date TEXT,
                notes TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#,
    )
    .await?;

    if categories_created {
        let inserted = a002_tax_category::repository::seed_current_categories(conn).await?;
        tracing::info!("Seeded {} monotributo categories", inserted);
    }

    Ok(())
}
