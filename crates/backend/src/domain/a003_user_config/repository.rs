use chrono::{NaiveDate, Utc};
use contracts::domain::a003_user_config::{UserConfig, UserConfigId};
use contracts::domain::common::EntityMetadata;
use contracts::enums::ActivityType;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_user_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub current_category: String,
    pub activity_type: String,
    pub target_invoicing_percentage: i32,
    pub registration_date: Option<String>,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserConfig {
    fn from(m: Model) -> Self {
        UserConfig {
            id: UserConfigId(m.id),
            current_category: m.current_category,
            activity_type: ActivityType::from_code(&m.activity_type).unwrap_or_default(),
            target_invoicing_percentage: m.target_invoicing_percentage.clamp(0, 100) as u32,
            registration_date: m
                .registration_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            notes: m.notes,
            metadata: EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                is_deleted: m.is_deleted,
                version: m.version,
            },
        }
    }
}

fn to_active(config: &UserConfig) -> ActiveModel {
    ActiveModel {
        id: Set(config.id.0.clone()),
        current_category: Set(config.current_category.clone()),
        activity_type: Set(config.activity_type.code().to_string()),
        target_invoicing_percentage: Set(config.target_invoicing_percentage as i32),
        registration_date: Set(config
            .registration_date
            .map(|d| d.format("%Y-%m-%d").to_string())),
        notes: Set(config.notes.clone()),
        is_deleted: Set(config.metadata.is_deleted),
        created_at: Set(Some(config.metadata.created_at)),
        updated_at: Set(Some(config.metadata.updated_at)),
        version: Set(config.metadata.version),
    }
}

/// Действующая настройка: запись с самым поздним `updated_at`
pub async fn get_latest(db: &DatabaseConnection) -> anyhow::Result<Option<UserConfig>> {
    let result = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::UpdatedAt)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(db: &DatabaseConnection, config: &UserConfig) -> anyhow::Result<()> {
    to_active(config).insert(db).await?;
    Ok(())
}

pub async fn update(db: &DatabaseConnection, config: &UserConfig) -> anyhow::Result<()> {
    let mut active = to_active(config);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

pub async fn count_active(db: &DatabaseConnection) -> anyhow::Result<u64> {
    let count = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    Ok(count)
}
