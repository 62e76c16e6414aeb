use chrono::NaiveDate;
use contracts::domain::a002_tax_category::TaxCategory;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_tax_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub annual_limit: f64,
    pub monthly_fee_services: f64,
    pub monthly_fee_commerce: f64,
    pub description: String,
    pub valid_until: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for TaxCategory {
    fn from(m: Model) -> Self {
        TaxCategory {
            code: m.code,
            annual_limit: m.annual_limit,
            monthly_fee_services: m.monthly_fee_services,
            monthly_fee_commerce: m.monthly_fee_commerce,
            description: m.description,
            valid_until: m
                .valid_until
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        }
    }
}

/// Действующие категории (без даты окончания), по возрастанию кода
pub async fn list_current(db: &DatabaseConnection) -> anyhow::Result<Vec<TaxCategory>> {
    let items = Entity::find()
        .filter(Column::ValidUntil.is_null())
        .order_by_asc(Column::Code)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert(db: &DatabaseConnection, category: &TaxCategory) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: NotSet,
        code: Set(category.code.clone()),
        annual_limit: Set(category.annual_limit),
        monthly_fee_services: Set(category.monthly_fee_services),
        monthly_fee_commerce: Set(category.monthly_fee_commerce),
        description: Set(category.description.clone()),
        valid_until: Set(category
            .valid_until
            .map(|d| d.format("%Y-%m-%d").to_string())),
    };
    active.insert(db).await?;
    Ok(())
}

/// Справочные значения категорий (годовой доход, взнос услуги, взнос продажа)
fn reference_categories() -> Vec<TaxCategory> {
    vec![
        TaxCategory::new("A", 6_450_000.0, 26_631.10, 26_631.10, "Categoría A"),
        TaxCategory::new("B", 9_450_000.0, 29_700.21, 29_700.21, "Categoría B"),
        TaxCategory::new("C", 13_250_000.0, 34_117.69, 33_047.24, "Categoría C"),
        TaxCategory::new("D", 16_450_000.0, 43_467.00, 42_013.86, "Categoría D"),
        TaxCategory::new("E", 19_350_000.0, 63_657.64, 56_046.99, "Categoría E"),
        TaxCategory::new("F", 24_250_000.0, 79_779.08, 70_057.70, "Categoría F"),
        TaxCategory::new("G", 29_000_000.0, 97_211.85, 80_040.39, "Categoría G"),
        TaxCategory::new("H", 44_000_000.0, 173_570.14, 139_210.38, "Categoría H"),
        TaxCategory::new("I", 49_250_000.0, 280_119.94, 179_217.81, "Categoría I"),
        TaxCategory::new("J", 56_400_000.0, 325_346.35, 210_232.12, "Categoría J"),
        TaxCategory::new("K", 68_000_000.0, 391_289.17, 253_002.92, "Categoría K"),
    ]
}

/// Заполнить пустой справочник действующими категориями
pub async fn seed_current_categories(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let categories = reference_categories();
    for category in &categories {
        insert(db, category).await?;
    }
    Ok(categories.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_list_current_skips_expired_rows() {
        let db = connect_in_memory().await.unwrap();
        let mut expired = TaxCategory::new("A", 1_000.0, 10.0, 10.0, "Categoría A (vieja)");
        expired.valid_until = NaiveDate::from_ymd_opt(2023, 12, 31);
        insert(&db, &expired).await.unwrap();

        let current = list_current(&db).await.unwrap();
        assert_eq!(current.len(), 11);
        assert!(current.iter().all(|c| c.valid_until.is_none()));
        let codes: Vec<&str> = current.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes.first(), Some(&"A"));
        assert_eq!(codes.last(), Some(&"K"));
    }

    #[test]
    fn test_reference_limits_are_increasing() {
        let categories = reference_categories();
        assert!(categories
            .windows(2)
            .all(|w| w[0].annual_limit < w[1].annual_limit));
    }
}
