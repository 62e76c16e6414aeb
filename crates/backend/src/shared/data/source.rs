//! Фасад доступа к данным дашборда.
//!
//! Три чтения и одна запись. "Нет строк" возвращается как `Ok(None)` или
//! пустой список и никогда не является ошибкой.

use async_trait::async_trait;
use chrono::NaiveDate;
use contracts::dashboards::d400_monotributo::BillingSnapshot;
use contracts::domain::a001_payment::PaymentRecord;
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::{UserConfig, UserConfigDto};
use contracts::domain::common::Origin;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::config::{self, Config, DataSourceKind};
use crate::shared::data::{db, hosted_source::HostedDataSource, local_source::LocalDataSource};

static DATA_SOURCE: OnceCell<Arc<dyn MonotributoDataSource>> = OnceCell::new();

/// Ошибки доступа к данным
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl DataAccessError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DataAccessError::Validation(_))
    }
}

impl From<sea_orm::DbErr> for DataAccessError {
    fn from(e: sea_orm::DbErr) -> Self {
        DataAccessError::Database(e.to_string())
    }
}

impl From<anyhow::Error> for DataAccessError {
    fn from(e: anyhow::Error) -> Self {
        DataAccessError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for DataAccessError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DataAccessError::Decode(e.to_string())
        } else {
            DataAccessError::Transport(e.to_string())
        }
    }
}

/// Источник данных дашборда монотрибуто
#[async_trait]
pub trait MonotributoDataSource: Send + Sync {
    /// Откуда читаются данные
    fn origin(&self) -> Origin;

    /// Сводка по счетам за период перекатегоризации
    async fn get_billing_snapshot(&self) -> Result<Option<BillingSnapshot>, DataAccessError>;

    /// Не удаленные платежи с даты `since` включительно
    async fn get_payments_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<PaymentRecord>, DataAccessError>;

    /// Действующая (последняя измененная) настройка пользователя
    async fn get_user_config(&self) -> Result<Option<UserConfig>, DataAccessError>;

    /// Действующие категории, по возрастанию кода
    async fn get_tax_categories(&self) -> Result<Vec<TaxCategory>, DataAccessError>;

    /// Обновить действующую настройку или вставить первую
    async fn upsert_user_config(&self, dto: UserConfigDto)
        -> Result<UserConfig, DataAccessError>;
}

/// Создать источник данных по конфигурации
pub async fn build_source(cfg: &Config) -> anyhow::Result<Arc<dyn MonotributoDataSource>> {
    match cfg.data_source.kind {
        DataSourceKind::Sqlite => {
            let db_path = config::get_database_path(cfg)?;
            db::initialize_database(&db_path).await?;
            let conn = db::get_connection()
                .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))?;
            tracing::info!("Data source: local SQLite at {}", db_path.display());
            Ok(Arc::new(LocalDataSource::new(conn.clone())))
        }
        DataSourceKind::Rest => {
            let url = cfg
                .data_source
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("data_source.url is required for kind = \"rest\""))?;
            let api_key = cfg
                .data_source
                .api_key
                .clone()
                .ok_or_else(|| {
                    anyhow::anyhow!("data_source.api_key is required for kind = \"rest\"")
                })?;
            tracing::info!("Data source: hosted REST backend at {}", url);
            Ok(Arc::new(HostedDataSource::new(&url, &api_key)?))
        }
    }
}

/// Сделать источник данных доступным обработчикам запросов
pub fn install(source: Arc<dyn MonotributoDataSource>) -> anyhow::Result<()> {
    DATA_SOURCE
        .set(source)
        .map_err(|_| anyhow::anyhow!("Data source is already installed"))
}

pub fn get_source() -> anyhow::Result<Arc<dyn MonotributoDataSource>> {
    DATA_SOURCE
        .get()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Data source has not been initialized"))
}
