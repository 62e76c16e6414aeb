use chrono::NaiveDate;
use contracts::dashboards::d400_monotributo::{
    BillingSnapshot, FormattedAmounts, MonotributoDashboardRequest, MonotributoDashboardResponse,
    SaveConfigResponse,
};
use contracts::domain::a001_payment::PaymentRecord;
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::{UserConfig, UserConfigDto};
use contracts::domain::common::Origin;
use contracts::enums::{ActivityType, CurrencyMode};

use super::state::DashboardState;
use super::{aggregator, evaluator};
use crate::domain::a003_user_config;
use crate::shared::data::source::{DataAccessError, MonotributoDataSource};
use crate::shared::format::format_amount;

pub const CONFIG_SAVED_MESSAGE: &str = "Configuración guardada correctamente";

/// Результаты чтений одной загрузки. Неудачное чтение уже заменено пустым.
#[derive(Debug, Clone, Default)]
pub struct DashboardSlices {
    pub snapshot: Option<BillingSnapshot>,
    pub payments: Vec<PaymentRecord>,
    pub config: Option<UserConfig>,
    pub categories: Vec<TaxCategory>,
}

fn degrade<T: Default>(slice: &str, result: Result<T, DataAccessError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("D400 Monotributo: failed to load {}: {}", slice, e);
        T::default()
    })
}

/// Параллельные чтения источника. Ошибка одного чтения не мешает остальным.
pub async fn fetch_slices(source: &dyn MonotributoDataSource, epoch: NaiveDate) -> DashboardSlices {
    let (snapshot, payments, config, categories) = tokio::join!(
        source.get_billing_snapshot(),
        source.get_payments_since(epoch),
        source.get_user_config(),
        source.get_tax_categories(),
    );

    DashboardSlices {
        snapshot: degrade("billing snapshot", snapshot),
        payments: degrade("payments", payments),
        config: degrade("user config", config),
        categories: degrade("tax categories", categories),
    }
}

fn format_snapshot(snapshot: &BillingSnapshot, currency: CurrencyMode, rate: f64) -> FormattedAmounts {
    FormattedAmounts {
        period_total_received: format_amount(snapshot.period_total_received, currency, rate),
        period_total_invoiced: format_amount(snapshot.period_total_invoiced, currency, rate),
        available_margin: format_amount(snapshot.available_margin, currency, rate),
        annual_limit: format_amount(snapshot.annual_limit, currency, rate),
        annual_projection: snapshot
            .annual_projection
            .map(|p| format_amount(p, currency, rate)),
    }
}

/// Собрать ответ дашборда из прочитанных данных
pub fn build_response(
    sequence: u64,
    origin: Origin,
    slices: DashboardSlices,
    request: &MonotributoDashboardRequest,
) -> MonotributoDashboardResponse {
    let DashboardSlices {
        mut snapshot,
        payments,
        config,
        categories,
    } = slices;

    // Категория и цель всегда берутся из действующей настройки
    if let (Some(s), Some(c)) = (snapshot.as_mut(), config.as_ref()) {
        s.current_category = c.current_category.clone();
        s.target_invoicing_percentage = c.target_invoicing_percentage;
    }

    let activity = config
        .as_ref()
        .map(|c| c.activity_type)
        .unwrap_or_else(ActivityType::default);
    let currency = request.currency.unwrap_or_default();
    let rate = request.rate.unwrap_or(1.0);

    let monthly = aggregator::aggregate(&payments);
    let alert = snapshot.as_ref().map(evaluator::alert_view);
    let projected_category = snapshot
        .as_ref()
        .and_then(|s| evaluator::project(s, &categories, activity));
    let formatted = snapshot
        .as_ref()
        .map(|s| format_snapshot(s, currency, rate));

    MonotributoDashboardResponse {
        sequence,
        origin,
        snapshot,
        alert,
        monthly,
        categories,
        config,
        projected_category,
        currency,
        formatted,
    }
}

/// Загрузка дашборда.
///
/// Вызывающий всегда получает ответ, собранный по его запросу. Номер загрузки
/// решает только, станет ли ответ последним примененным состоянием.
pub async fn load_dashboard(
    source: &dyn MonotributoDataSource,
    state: &DashboardState,
    epoch: NaiveDate,
    request: &MonotributoDashboardRequest,
) -> MonotributoDashboardResponse {
    let ticket = state.begin();
    let slices = fetch_slices(source, epoch).await;
    let response = build_response(ticket.sequence, source.origin(), slices, request);

    if state.apply(ticket) {
        tracing::info!(
            "D400 Monotributo: applied load #{} from {} in {} ({} months, {} categories)",
            response.sequence,
            response.origin,
            response.currency,
            response.monthly.len(),
            response.categories.len()
        );
    } else {
        tracing::info!(
            "D400 Monotributo: load #{} finished after #{}, state not updated",
            response.sequence,
            state.applied_sequence().unwrap_or_default()
        );
    }
    response
}

/// Действующие категории. Ошибка чтения дает пустой список.
pub async fn get_categories(source: &dyn MonotributoDataSource) -> Vec<TaxCategory> {
    degrade("tax categories", source.get_tax_categories().await)
}

/// Доступные периоды "YYYY-MM" с платежами начиная с `epoch`.
/// Ошибка чтения дает пустой список.
pub async fn get_available_periods(
    source: &dyn MonotributoDataSource,
    epoch: NaiveDate,
) -> Vec<String> {
    let payments = degrade("payments", source.get_payments_since(epoch).await);
    aggregator::available_periods(&aggregator::aggregate(&payments))
}

/// Сохранить настройку и один раз обновить дашборд.
/// При ошибке записи состояние дашборда не меняется.
pub async fn save_config(
    source: &dyn MonotributoDataSource,
    state: &DashboardState,
    epoch: NaiveDate,
    dto: UserConfigDto,
    request: &MonotributoDashboardRequest,
) -> Result<SaveConfigResponse, DataAccessError> {
    let config = a003_user_config::service::save(source, dto).await?;
    let dashboard = load_dashboard(source, state, epoch, request).await;
    Ok(SaveConfigResponse {
        message: CONFIG_SAVED_MESSAGE.to_string(),
        config,
        dashboard,
    })
}
