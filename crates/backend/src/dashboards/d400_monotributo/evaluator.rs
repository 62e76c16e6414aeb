//! Оценка соблюдения режима: предупреждение и прогнозная категория.

use contracts::dashboards::d400_monotributo::{
    AlertSeverity, AlertState, AlertView, BillingSnapshot, ProjectedCategory,
};
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::enums::ActivityType;

/// Использование лимита (%), начиная с которого включается тревога
pub const LIMIT_ALERT_UTILIZATION: u32 = 90;
/// Использование лимита (%), начиная с которого включается предупреждение
pub const LIMIT_CAUTION_UTILIZATION: u32 = 75;

/// Классификация состояния, первое совпадение побеждает
pub fn classify(limit_utilization: u32, period_invoiced_percentage: u32, target: u32) -> AlertState {
    if limit_utilization >= LIMIT_ALERT_UTILIZATION {
        AlertState::LimitAlert
    } else if limit_utilization >= LIMIT_CAUTION_UTILIZATION {
        AlertState::LimitCaution
    } else if period_invoiced_percentage < target {
        AlertState::BelowInvoicingTarget
    } else {
        AlertState::Ok
    }
}

pub fn severity(state: AlertState) -> AlertSeverity {
    match state {
        AlertState::LimitAlert => AlertSeverity::Error,
        AlertState::LimitCaution => AlertSeverity::Warning,
        AlertState::BelowInvoicingTarget => AlertSeverity::Info,
        AlertState::Ok => AlertSeverity::Success,
    }
}

pub fn message(snapshot: &BillingSnapshot) -> String {
    match snapshot.alert_state {
        AlertState::LimitAlert => format!(
            "Alcanzaste el {}% del límite anual de la categoría {}. Revisá tu recategorización antes del {}.",
            snapshot.limit_utilization_percentage,
            snapshot.current_category,
            snapshot.next_recategorization_date.format("%d/%m/%Y")
        ),
        AlertState::LimitCaution => format!(
            "Llevás el {}% del límite anual de la categoría {}. Faltan {} días para la próxima recategorización.",
            snapshot.limit_utilization_percentage,
            snapshot.current_category,
            snapshot.days_until_recategorization
        ),
        AlertState::BelowInvoicingTarget => format!(
            "Facturaste el {}% de lo cobrado en el período; tu objetivo es {}%.",
            snapshot.period_invoiced_percentage, snapshot.target_invoicing_percentage
        ),
        AlertState::Ok => format!(
            "Todo en orden: facturaste el {}% de lo cobrado (objetivo {}%).",
            snapshot.period_invoiced_percentage, snapshot.target_invoicing_percentage
        ),
    }
}

pub fn alert_view(snapshot: &BillingSnapshot) -> AlertView {
    AlertView {
        state: snapshot.alert_state,
        severity: severity(snapshot.alert_state),
        message: message(snapshot),
    }
}

/// Первая категория (по возрастанию лимита), чей лимит не меньше прогноза.
/// Если прогноз выше всех лимитов - самая старшая категория.
/// `None`, если прогноза нет или справочник пуст.
pub fn projected_category(
    annual_projection: Option<f64>,
    categories: &[TaxCategory],
) -> Option<&TaxCategory> {
    let projection = annual_projection?;
    let mut sorted: Vec<&TaxCategory> = categories.iter().collect();
    sorted.sort_by(|a, b| a.annual_limit.total_cmp(&b.annual_limit));

    sorted
        .iter()
        .find(|c| c.annual_limit >= projection)
        .or_else(|| sorted.last())
        .copied()
}

/// Разница ежемесячного взноса между прогнозной и текущей категорией
pub fn monthly_fee_delta(
    current_code: &str,
    projected: &TaxCategory,
    categories: &[TaxCategory],
    activity: ActivityType,
) -> f64 {
    if projected.code == current_code {
        return 0.0;
    }
    match categories.iter().find(|c| c.code == current_code) {
        Some(current) => projected.monthly_fee(activity) - current.monthly_fee(activity),
        None => 0.0,
    }
}

/// Прогнозная категория для сводки вместе с разницей взноса
pub fn project(
    snapshot: &BillingSnapshot,
    categories: &[TaxCategory],
    activity: ActivityType,
) -> Option<ProjectedCategory> {
    let projected = projected_category(snapshot.annual_projection, categories)?;
    let differs_from_current = projected.code != snapshot.current_category;
    Some(ProjectedCategory {
        category: projected.clone(),
        differs_from_current,
        monthly_fee_delta: monthly_fee_delta(
            &snapshot.current_category,
            projected,
            categories,
            activity,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn two_categories() -> Vec<TaxCategory> {
        vec![
            TaxCategory::new("A", 2_000_000.0, 10_000.0, 9_000.0, "Categoría A"),
            TaxCategory::new("B", 4_000_000.0, 15_000.0, 12_000.0, "Categoría B"),
        ]
    }

    fn snapshot(state: AlertState) -> BillingSnapshot {
        BillingSnapshot {
            current_category: "A".into(),
            period_total_received: 1_000_000.0,
            period_total_invoiced: 700_000.0,
            period_invoiced_percentage: 70,
            target_invoicing_percentage: 80,
            alert_state: state,
            period_start: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            days_until_recategorization: 35,
            next_recategorization_date: NaiveDate::from_ymd_opt(2024, 7, 20).unwrap(),
            available_margin: 1_000_000.0,
            annual_limit: 2_000_000.0,
            limit_utilization_percentage: 50,
            annual_projection: Some(3_000_000.0),
        }
    }

    #[test]
    fn test_projected_category_scenarios() {
        let categories = two_categories();
        assert_eq!(
            projected_category(Some(3_000_000.0), &categories).map(|c| c.code.as_str()),
            Some("B")
        );
        assert_eq!(
            projected_category(Some(5_000_000.0), &categories).map(|c| c.code.as_str()),
            Some("B")
        );
        assert_eq!(
            projected_category(Some(2_000_000.0), &categories).map(|c| c.code.as_str()),
            Some("A")
        );
        assert!(projected_category(Some(1.0), &[]).is_none());
        assert!(projected_category(None, &categories).is_none());
    }

    #[test]
    fn test_projected_category_ignores_input_order() {
        let mut categories = two_categories();
        categories.reverse();
        assert_eq!(
            projected_category(Some(1_500_000.0), &categories).map(|c| c.code.as_str()),
            Some("A")
        );
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(classify(95, 10, 80), AlertState::LimitAlert);
        assert_eq!(classify(90, 100, 80), AlertState::LimitAlert);
        assert_eq!(classify(75, 10, 80), AlertState::LimitCaution);
        assert_eq!(classify(74, 79, 80), AlertState::BelowInvoicingTarget);
        assert_eq!(classify(10, 80, 80), AlertState::Ok);
    }

    #[test]
    fn test_alert_view_severity_and_message() {
        let view = alert_view(&snapshot(AlertState::BelowInvoicingTarget));
        assert_eq!(view.severity, AlertSeverity::Info);
        assert!(view.message.contains("70%"));
        assert!(view.message.contains("80%"));

        let view = alert_view(&snapshot(AlertState::LimitAlert));
        assert_eq!(view.severity, AlertSeverity::Error);
        assert!(view.message.contains("20/07/2024"));

        assert_eq!(severity(AlertState::LimitCaution), AlertSeverity::Warning);
        assert_eq!(severity(AlertState::Ok), AlertSeverity::Success);
    }

    #[test]
    fn test_project_reports_fee_delta_by_activity() {
        let categories = two_categories();
        let s = snapshot(AlertState::Ok);

        let services = project(&s, &categories, ActivityType::Services).unwrap();
        assert_eq!(services.category.code, "B");
        assert!(services.differs_from_current);
        assert_eq!(services.monthly_fee_delta, 5_000.0);

        let commerce = project(&s, &categories, ActivityType::Commerce).unwrap();
        assert_eq!(commerce.monthly_fee_delta, 3_000.0);

        let mut same = s.clone();
        same.annual_projection = Some(1_000_000.0);
        let p = project(&same, &categories, ActivityType::Services).unwrap();
        assert!(!p.differs_from_current);
        assert_eq!(p.monthly_fee_delta, 0.0);
    }

    #[test]
    fn test_fee_delta_zero_for_unknown_current_category() {
        let categories = two_categories();
        assert_eq!(
            monthly_fee_delta("Z", &categories[1], &categories, ActivityType::Services),
            0.0
        );
    }
}
