use chrono::{NaiveDate, Utc};
use contracts::domain::a001_payment::{PaymentId, PaymentRecord};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Дата в формате "YYYY-MM-DD"
    pub date: String,
    pub amount: f64,
    pub invoiced: bool,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for PaymentRecord {
    type Error = chrono::ParseError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&m.date, "%Y-%m-%d")?;
        Ok(PaymentRecord {
            id: PaymentId(m.id),
            date,
            amount: m.amount,
            invoiced: m.invoiced,
            description: m.description,
            metadata: EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                is_deleted: m.is_deleted,
                version: m.version,
            },
        })
    }
}

/// Не удаленные платежи начиная с даты `since`, по возрастанию даты
pub async fn list_since(
    db: &DatabaseConnection,
    since: NaiveDate,
) -> anyhow::Result<Vec<PaymentRecord>> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Date.gte(since.format("%Y-%m-%d").to_string()))
        .order_by_asc(Column::Date)
        .all(db)
        .await?;

    let mut items = Vec::with_capacity(models.len());
    for model in models {
        let id = model.id.clone();
        match PaymentRecord::try_from(model) {
            Ok(record) => items.push(record),
            Err(e) => tracing::warn!("Skipping payment {} with invalid date: {}", id, e),
        }
    }
    Ok(items)
}

pub async fn insert(db: &DatabaseConnection, payment: &PaymentRecord) -> anyhow::Result<String> {
    let active = ActiveModel {
        id: Set(payment.id.0.clone()),
        date: Set(payment.date.format("%Y-%m-%d").to_string()),
        amount: Set(payment.amount),
        invoiced: Set(payment.invoiced),
        description: Set(payment.description.clone()),
        is_deleted: Set(payment.metadata.is_deleted),
        created_at: Set(Some(payment.metadata.created_at)),
        updated_at: Set(Some(payment.metadata.updated_at)),
        version: Set(payment.metadata.version),
    };
    active.insert(db).await?;
    Ok(payment.id.0.clone())
}

pub async fn soft_delete(db: &DatabaseConnection, id: &str) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
