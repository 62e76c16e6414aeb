use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::a002_tax_category::TaxCategory;
use crate::domain::a003_user_config::UserConfig;
use crate::domain::common::Origin;
use crate::enums::CurrencyMode;

/// Request for the monotributo dashboard.
/// Both fields only affect formatting of amounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonotributoDashboardRequest {
    pub currency: Option<CurrencyMode>,
    pub rate: Option<f64>,
}

/// Поступления и счета за один календарный месяц
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// Period in format "YYYY-MM"
    pub period: String,
    /// Короткая подпись, например "ene '24"
    pub short_label: String,
    /// Полная подпись, например "enero 2024"
    pub long_label: String,
    pub total_received: f64,
    pub total_invoiced: f64,
    pub count_received: u32,
    pub count_invoiced: u32,
    pub invoiced_percentage: u32,
    pub uninvoiced_amount: f64,
}

/// Состояние предупреждения. Первое совпавшее условие побеждает:
/// лимит, близость к лимиту, недобор по счетам, норма.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    LimitAlert,
    LimitCaution,
    BelowInvoicingTarget,
    Ok,
}

impl AlertState {
    /// Разбор тега внешней базы. Неизвестный или пустой тег считается нормой.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "LIMIT_ALERT" | "ALERTA_LIMITE" => AlertState::LimitAlert,
            "LIMIT_CAUTION" | "PRECAUCION_LIMITE" => AlertState::LimitCaution,
            "BELOW_INVOICING_TARGET" | "BAJO_OBJETIVO" => AlertState::BelowInvoicingTarget,
            _ => AlertState::Ok,
        }
    }
}

/// Уровень важности сообщения для UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
    Success,
}

/// Готовое к показу предупреждение
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertView {
    pub state: AlertState,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Сводка по счетам за период перекатегоризации
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSnapshot {
    pub current_category: String,
    pub period_total_received: f64,
    pub period_total_invoiced: f64,
    pub period_invoiced_percentage: u32,
    pub target_invoicing_percentage: u32,
    pub alert_state: AlertState,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub days_until_recategorization: i64,
    pub next_recategorization_date: NaiveDate,
    pub available_margin: f64,
    pub annual_limit: f64,
    pub limit_utilization_percentage: u32,
    /// Прогноз годового дохода (None, если прогноз невозможен)
    pub annual_projection: Option<f64>,
}

/// Категория, в которую попадет прогноз годового дохода
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCategory {
    pub category: TaxCategory,
    pub differs_from_current: bool,
    /// Разница ежемесячного взноса (прогнозная минус текущая категория)
    pub monthly_fee_delta: f64,
}

/// Суммы сводки, отформатированные в выбранной валюте
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedAmounts {
    pub period_total_received: String,
    pub period_total_invoiced: String,
    pub available_margin: String,
    pub annual_limit: String,
    pub annual_projection: Option<String>,
}

/// Response for the monotributo dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonotributoDashboardResponse {
    /// Номер загрузки, по которому отбрасываются устаревшие ответы
    pub sequence: u64,
    pub origin: Origin,
    pub snapshot: Option<BillingSnapshot>,
    pub alert: Option<AlertView>,
    /// Months sorted ascending by "YYYY-MM"
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<TaxCategory>,
    pub config: Option<UserConfig>,
    pub projected_category: Option<ProjectedCategory>,
    pub currency: CurrencyMode,
    pub formatted: Option<FormattedAmounts>,
}

/// Ответ на сохранение настройки: подтверждение и свежие данные дашборда
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfigResponse {
    pub message: String,
    pub config: UserConfig,
    pub dashboard: MonotributoDashboardResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_state_tags() {
        for (state, tag) in [
            (AlertState::LimitAlert, "LIMIT_ALERT"),
            (AlertState::LimitCaution, "LIMIT_CAUTION"),
            (AlertState::BelowInvoicingTarget, "BELOW_INVOICING_TARGET"),
            (AlertState::Ok, "OK"),
        ] {
            assert_eq!(AlertState::from_tag(tag), state);
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", tag));
        }
        assert_eq!(AlertState::from_tag("something_else"), AlertState::Ok);
        assert_eq!(AlertState::from_tag(""), AlertState::Ok);
    }
}
