//! Сводка по счетам за период перекатегоризации для локальной базы.
//!
//! Внешний бэкенд отдает готовую сводку из своей витрины, здесь она
//! считается по тем же правилам из платежей, настройки и справочника.

use chrono::{Datelike, Months, NaiveDate};
use contracts::dashboards::d400_monotributo::BillingSnapshot;
use contracts::domain::a001_payment::PaymentRecord;
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::UserConfig;

use super::{aggregator, evaluator};

/// День месяца, к которому приурочена перекатегоризация
pub const RECATEGORIZATION_DAY: u32 = 20;
/// Месяцы перекатегоризации (январь и июль)
pub const RECATEGORIZATION_MONTHS: [u32; 2] = [1, 7];

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Начало скользящего двенадцатимесячного периода
pub fn period_start(today: NaiveDate) -> NaiveDate {
    let first = first_of_month(today);
    first.checked_sub_months(Months::new(11)).unwrap_or(first)
}

/// Ближайшая дата перекатегоризации строго после `today`
pub fn next_recategorization(today: NaiveDate) -> NaiveDate {
    for year in [today.year(), today.year() + 1] {
        for month in RECATEGORIZATION_MONTHS {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, RECATEGORIZATION_DAY) {
                if date > today {
                    return date;
                }
            }
        }
    }
    today
}

/// Число календарных месяцев от `from` до `to` включительно
pub fn months_between_inclusive(from: NaiveDate, to: NaiveDate) -> u32 {
    let diff = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if diff < 0 {
        0
    } else {
        diff as u32 + 1
    }
}

/// Годовой прогноз по среднемесячной сумме счетов
pub fn annual_projection(
    today: NaiveDate,
    period_payments: &[&PaymentRecord],
    total_invoiced: f64,
) -> Option<f64> {
    let first_payment = period_payments.iter().map(|p| p.date).min()?;
    let from = first_of_month(first_payment).max(period_start(today));
    let months = months_between_inclusive(from, today);
    if months == 0 {
        return None;
    }
    Some(total_invoiced / months as f64 * 12.0)
}

pub fn build(
    today: NaiveDate,
    payments: &[PaymentRecord],
    config: &UserConfig,
    categories: &[TaxCategory],
) -> BillingSnapshot {
    let start = period_start(today);
    let in_period: Vec<&PaymentRecord> = payments
        .iter()
        .filter(|p| p.date >= start && p.date <= today)
        .collect();

    let total_received: f64 = in_period.iter().map(|p| p.amount).sum();
    let total_invoiced: f64 = in_period
        .iter()
        .filter(|p| p.invoiced)
        .map(|p| p.amount)
        .sum();
    let invoiced_pct = aggregator::invoiced_percentage(total_invoiced, total_received);

    let annual_limit = categories
        .iter()
        .find(|c| c.code == config.current_category)
        .map(|c| c.annual_limit)
        .unwrap_or(0.0);
    let limit_utilization = if annual_limit > 0.0 {
        (total_invoiced / annual_limit * 100.0).round().max(0.0) as u32
    } else {
        0
    };

    let next_date = next_recategorization(today);
    let alert_state = evaluator::classify(
        limit_utilization,
        invoiced_pct,
        config.target_invoicing_percentage,
    );

    BillingSnapshot {
        current_category: config.current_category.clone(),
        period_total_received: total_received,
        period_total_invoiced: total_invoiced,
        period_invoiced_percentage: invoiced_pct,
        target_invoicing_percentage: config.target_invoicing_percentage,
        alert_state,
        period_start: start,
        period_end: today,
        days_until_recategorization: (next_date - today).num_days(),
        next_recategorization_date: next_date,
        available_margin: annual_limit - total_invoiced,
        annual_limit,
        limit_utilization_percentage: limit_utilization,
        annual_projection: annual_projection(today, &in_period, total_invoiced),
    }
}
