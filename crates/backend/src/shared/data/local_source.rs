use async_trait::async_trait;
use chrono::NaiveDate;
use contracts::dashboards::d400_monotributo::BillingSnapshot;
use contracts::domain::a001_payment::PaymentRecord;
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::{UserConfig, UserConfigDto};
use contracts::domain::common::Origin;
use sea_orm::DatabaseConnection;

use crate::dashboards::d400_monotributo::snapshot;
use crate::domain::{a001_payment, a002_tax_category, a003_user_config};
use crate::shared::data::source::{DataAccessError, MonotributoDataSource};

/// Источник данных поверх локальной SQLite базы.
///
/// Внешней витрины со сводкой здесь нет, поэтому сводка считается на лету.
#[derive(Clone)]
pub struct LocalDataSource {
    db: DatabaseConnection,
    today: Option<NaiveDate>,
}

impl LocalDataSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, today: None }
    }

    /// Источник с фиксированной текущей датой
    pub fn with_today(db: DatabaseConnection, today: NaiveDate) -> Self {
        Self {
            db,
            today: Some(today),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[async_trait]
impl MonotributoDataSource for LocalDataSource {
    fn origin(&self) -> Origin {
        Origin::Local
    }

    async fn get_billing_snapshot(&self) -> Result<Option<BillingSnapshot>, DataAccessError> {
        let Some(config) = a003_user_config::repository::get_latest(&self.db).await? else {
            return Ok(None);
        };
        let today = self.today();
        let categories = a002_tax_category::repository::list_current(&self.db).await?;
        let payments =
            a001_payment::repository::list_since(&self.db, snapshot::period_start(today)).await?;
        let payments: Vec<PaymentRecord> = payments.into_iter().filter(|p| p.date <= today).collect();

        Ok(Some(snapshot::build(today, &payments, &config, &categories)))
    }

    async fn get_payments_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<PaymentRecord>, DataAccessError> {
        Ok(a001_payment::repository::list_since(&self.db, since).await?)
    }

    async fn get_user_config(&self) -> Result<Option<UserConfig>, DataAccessError> {
        Ok(a003_user_config::repository::get_latest(&self.db).await?)
    }

    async fn get_tax_categories(&self) -> Result<Vec<TaxCategory>, DataAccessError> {
        Ok(a002_tax_category::repository::list_current(&self.db).await?)
    }

    async fn upsert_user_config(
        &self,
        dto: UserConfigDto,
    ) -> Result<UserConfig, DataAccessError> {
        a003_user_config::service::upsert_local(&self.db, &dto).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::dashboards::d400_monotributo::AlertState;
    use contracts::domain::a001_payment::PaymentDto;

    #[tokio::test]
    async fn test_snapshot_absent_until_configured() {
        let db = connect_in_memory().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let source = LocalDataSource::with_today(db, today);

        assert!(source.get_billing_snapshot().await.unwrap().is_none());
        assert!(source.get_user_config().await.unwrap().is_none());

        a001_payment::service::create(
            source.connection(),
            PaymentDto {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                amount: 600_000.0,
                invoiced: true,
                description: None,
            },
        )
        .await
        .unwrap();

        source
            .upsert_user_config(UserConfigDto {
                current_category: Some("A".into()),
                target_invoicing_percentage: Some(80),
                ..Default::default()
            })
            .await
            .unwrap();

        let snapshot = source.get_billing_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.current_category, "A");
        assert_eq!(snapshot.period_total_received, 600_000.0);
        assert_eq!(snapshot.period_invoiced_percentage, 100);
        assert_eq!(snapshot.annual_limit, 6_450_000.0);
        assert_eq!(snapshot.alert_state, AlertState::Ok);
    }
}
