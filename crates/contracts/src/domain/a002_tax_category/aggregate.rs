use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::ActivityType;

/// Категория монотрибуто: годовой лимит дохода и ежемесячные взносы.
///
/// Справочник только для чтения. Действующими считаются строки без даты окончания.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCategory {
    /// Код категории ("A".."K")
    pub code: String,
    /// Годовой лимит дохода
    pub annual_limit: f64,
    pub monthly_fee_services: f64,
    pub monthly_fee_commerce: f64,
    pub description: String,
    /// Дата окончания действия (None = действует)
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl TaxCategory {
    pub fn new(
        code: &str,
        annual_limit: f64,
        monthly_fee_services: f64,
        monthly_fee_commerce: f64,
        description: &str,
    ) -> Self {
        Self {
            code: code.to_string(),
            annual_limit,
            monthly_fee_services,
            monthly_fee_commerce,
            description: description.to_string(),
            valid_until: None,
        }
    }

    /// Ежемесячный взнос для типа деятельности
    pub fn monthly_fee(&self, activity: ActivityType) -> f64 {
        match activity {
            ActivityType::Services => self.monthly_fee_services,
            ActivityType::Commerce => self.monthly_fee_commerce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_fee_by_activity() {
        let c = TaxCategory::new("B", 4_000_000.0, 30_000.0, 28_000.0, "Categoría B");
        assert_eq!(c.monthly_fee(ActivityType::Services), 30_000.0);
        assert_eq!(c.monthly_fee(ActivityType::Commerce), 28_000.0);
    }
}
