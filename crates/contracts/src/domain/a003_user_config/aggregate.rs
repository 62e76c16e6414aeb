use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::common::EntityMetadata;
use crate::enums::ActivityType;

/// Целевой процент выставленных счетов для новой настройки
pub const DEFAULT_TARGET_INVOICING_PERCENTAGE: u32 = 100;

/// Категория по умолчанию для новой настройки
const DEFAULT_CATEGORY: &str = "A";

// ============================================================================
// ID Type
// ============================================================================

/// Идентификатор настройки пользователя
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserConfigId(pub String);

impl UserConfigId {
    /// Фиксированный ключ единственной действующей настройки.
    /// Две параллельные первые записи сталкиваются на первичном ключе.
    pub fn singleton() -> Self {
        Self("current".to_string())
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Настройка монотрибутиста: категория, тип деятельности и цель по счетам.
///
/// Действующей считается запись с самым поздним `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: UserConfigId,
    pub current_category: String,
    pub activity_type: ActivityType,
    /// Целевой процент выставленных счетов (0..=100)
    pub target_invoicing_percentage: u32,
    pub registration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub metadata: EntityMetadata,
}

impl UserConfig {
    /// Создать новую настройку для вставки в БД из присланных полей
    pub fn new_for_insert(dto: &UserConfigDto) -> Self {
        let mut config = Self {
            id: UserConfigId::singleton(),
            current_category: DEFAULT_CATEGORY.to_string(),
            activity_type: ActivityType::default(),
            target_invoicing_percentage: DEFAULT_TARGET_INVOICING_PERCENTAGE,
            registration_date: None,
            notes: None,
            metadata: EntityMetadata::new(),
        };
        config.update(dto);
        config
    }

    /// Дата последнего изменения
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.metadata.updated_at
    }

    /// Слить присланные поля. Отсутствующие поля не меняются.
    pub fn update(&mut self, dto: &UserConfigDto) {
        if let Some(category) = &dto.current_category {
            self.current_category = category.trim().to_uppercase();
        }
        if let Some(activity) = dto.activity_type {
            self.activity_type = activity;
        }
        if let Some(target) = dto.target_invoicing_percentage {
            self.target_invoicing_percentage = target.clamp(0, 100) as u32;
        }
        if dto.registration_date.is_some() {
            self.registration_date = dto.registration_date;
        }
        if dto.notes.is_some() {
            self.notes = dto.notes.clone();
        }
    }

    /// Валидация данных.
    ///
    /// `category_codes` - коды действующих категорий. Пустой список не проверяется.
    pub fn validate(&self, category_codes: &[String]) -> Result<(), String> {
        if self.current_category.is_empty() {
            return Err("La categoría no puede estar vacía".into());
        }
        if !category_codes.is_empty() && !category_codes.contains(&self.current_category) {
            return Err(format!(
                "La categoría {} no es una categoría vigente",
                self.current_category
            ));
        }
        if self.target_invoicing_percentage > 100 {
            return Err("El objetivo de facturación debe estar entre 0 y 100".into());
        }
        Ok(())
    }

    /// Хук перед записью
    pub fn before_write(&mut self) {
        self.metadata.touch();
        self.metadata.increment_version();
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// Присланные с формы поля настройки. Все поля необязательны.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfigDto {
    pub current_category: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub target_invoicing_percentage: Option<i32>,
    pub registration_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl UserConfigDto {
    /// Проверка полей, которые нельзя молча исправить
    pub fn validate(&self) -> Result<(), String> {
        if let Some(target) = self.target_invoicing_percentage {
            if !(0..=100).contains(&target) {
                return Err(format!(
                    "El objetivo de facturación debe estar entre 0 y 100 (recibido: {})",
                    target
                ));
            }
        }
        if let Some(category) = &self.current_category {
            if category.trim().is_empty() {
                return Err("La categoría no puede estar vacía".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_for_insert_uses_defaults_and_singleton_id() {
        let dto = UserConfigDto {
            target_invoicing_percentage: Some(80),
            ..Default::default()
        };
        let config = UserConfig::new_for_insert(&dto);
        assert_eq!(config.id, UserConfigId::singleton());
        assert_eq!(config.target_invoicing_percentage, 80);
        assert_eq!(config.current_category, "A");
        assert_eq!(config.activity_type, ActivityType::Services);
    }

    #[test]
    fn test_update_merges_only_present_fields() {
        let mut config = UserConfig::new_for_insert(&UserConfigDto {
            current_category: Some("c".into()),
            notes: Some("inicio".into()),
            ..Default::default()
        });
        config.update(&UserConfigDto {
            activity_type: Some(ActivityType::Commerce),
            ..Default::default()
        });
        assert_eq!(config.current_category, "C");
        assert_eq!(config.activity_type, ActivityType::Commerce);
        assert_eq!(config.notes.as_deref(), Some("inicio"));
    }

    #[test]
    fn test_dto_validate_rejects_out_of_range_target() {
        let dto = UserConfigDto {
            target_invoicing_percentage: Some(101),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
        let dto = UserConfigDto {
            target_invoicing_percentage: Some(-1),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_validate_checks_category_against_current_codes() {
        let config = UserConfig::new_for_insert(&UserConfigDto {
            current_category: Some("Z".into()),
            ..Default::default()
        });
        assert!(config.validate(&[]).is_ok());
        assert!(config.validate(&["A".to_string(), "B".to_string()]).is_err());
    }

    #[test]
    fn test_before_write_advances_last_updated() {
        let mut config = UserConfig::new_for_insert(&UserConfigDto::default());
        let before = config.last_updated();
        config.before_write();
        assert!(config.last_updated() > before);
        assert_eq!(config.metadata.version, 1);
    }
}
