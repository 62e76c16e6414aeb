use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::common::EntityMetadata;

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор поступления (cobro)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Полученный платеж. После чтения из базы не изменяется.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    /// Дата поступления
    pub date: NaiveDate,
    /// Сумма в местной валюте (ARS)
    pub amount: f64,
    /// Выставлен ли счет (facturado)
    pub invoiced: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl PaymentRecord {
    pub fn new_for_insert(
        date: NaiveDate,
        amount: f64,
        invoiced: bool,
        description: Option<String>,
    ) -> Self {
        Self {
            id: PaymentId::new_v4(),
            date,
            amount,
            invoiced,
            description,
            metadata: EntityMetadata::new(),
        }
    }

    /// Ключ месяца в формате "YYYY-MM"
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() {
            return Err("El monto debe ser un número".into());
        }
        if self.amount < 0.0 {
            return Err("El monto no puede ser negativo".into());
        }
        Ok(())
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания платежа (тестовые данные локальной базы)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDto {
    pub date: NaiveDate,
    pub amount: f64,
    pub invoiced: bool,
    pub description: Option<String>,
}
