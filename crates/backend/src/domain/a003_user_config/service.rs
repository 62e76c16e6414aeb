use contracts::domain::a003_user_config::{UserConfig, UserConfigDto};
use sea_orm::DatabaseConnection;

use super::repository;
use crate::shared::data::source::{DataAccessError, MonotributoDataSource};

/// Действующая настройка. `Ok(None)` означает "еще не настроено", это не ошибка.
pub async fn get_current(
    source: &dyn MonotributoDataSource,
) -> Result<Option<UserConfig>, DataAccessError> {
    source.get_user_config().await
}

/// Сохранение настройки: валидация результата слияния, затем upsert через источник
pub async fn save(
    source: &dyn MonotributoDataSource,
    dto: UserConfigDto,
) -> Result<UserConfig, DataAccessError> {
    dto.validate().map_err(DataAccessError::Validation)?;

    // Без справочника категорию проверить нечем, запись не блокируем
    let codes: Vec<String> = match source.get_tax_categories().await {
        Ok(categories) => categories.into_iter().map(|c| c.code).collect(),
        Err(e) => {
            tracing::warn!("Category check skipped, categories unavailable: {}", e);
            Vec::new()
        }
    };
    let mut candidate = match source.get_user_config().await {
        Ok(Some(existing)) => existing,
        Ok(None) => UserConfig::new_for_insert(&UserConfigDto::default()),
        Err(e) => {
            tracing::warn!("Validating against defaults, user config unavailable: {}", e);
            UserConfig::new_for_insert(&UserConfigDto::default())
        }
    };
    candidate.update(&dto);
    candidate
        .validate(&codes)
        .map_err(DataAccessError::Validation)?;

    let saved = source.upsert_user_config(dto).await?;
    tracing::info!(
        "User config {} saved: category {}, activity {}, target {}%",
        saved.id.0,
        saved.current_category,
        saved.activity_type,
        saved.target_invoicing_percentage
    );
    Ok(saved)
}

/// Upsert в локальной базе: обновить последнюю запись, иначе вставить одну новую
pub async fn upsert_local(
    db: &DatabaseConnection,
    dto: &UserConfigDto,
) -> Result<UserConfig, DataAccessError> {
    let existing = repository::get_latest(db).await?;
    let is_update = existing.is_some();
    let mut config = match existing {
        Some(mut existing) => {
            existing.update(dto);
            existing
        }
        None => UserConfig::new_for_insert(dto),
    };
    config.validate(&[]).map_err(DataAccessError::Validation)?;
    config.before_write();

    if is_update {
        repository::update(db, &config).await?;
    } else {
        repository::insert(db, &config).await?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::shared::data::local_source::LocalDataSource;

    #[tokio::test]
    async fn test_first_write_inserts_single_row() {
        let db = connect_in_memory().await.unwrap();
        assert!(repository::get_latest(&db).await.unwrap().is_none());

        let dto = UserConfigDto {
            target_invoicing_percentage: Some(80),
            ..Default::default()
        };
        upsert_local(&db, &dto).await.unwrap();

        let read = repository::get_latest(&db).await.unwrap().unwrap();
        assert_eq!(read.target_invoicing_percentage, 80);
        assert_eq!(repository::count_active(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_local_write_is_validation_error() {
        let db = connect_in_memory().await.unwrap();
        let err = upsert_local(
            &db,
            &UserConfigDto {
                current_category: Some("   ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(repository::count_active(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_rejects_category_outside_table() {
        let db = connect_in_memory().await.unwrap();
        let source = LocalDataSource::new(db.clone());

        let err = save(
            &source,
            UserConfigDto {
                current_category: Some("z".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
        assert!(repository::get_latest(&db).await.unwrap().is_none());

        let saved = save(
            &source,
            UserConfigDto {
                current_category: Some("k".into()),
                target_invoicing_percentage: Some(70),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(saved.current_category, "K");
        assert_eq!(saved.target_invoicing_percentage, 70);
    }

    #[tokio::test]
    async fn test_repeated_write_updates_same_row() {
        let db = connect_in_memory().await.unwrap();
        upsert_local(&db, &UserConfigDto::default()).await.unwrap();

        let dto = UserConfigDto {
            current_category: Some("D".into()),
            target_invoicing_percentage: Some(90),
            ..Default::default()
        };
        let first = upsert_local(&db, &dto).await.unwrap();
        let second = upsert_local(&db, &dto).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.last_updated() > first.last_updated());
        assert_eq!(repository::count_active(&db).await.unwrap(), 1);

        let read = repository::get_latest(&db).await.unwrap().unwrap();
        assert_eq!(read.id, second.id);
        assert_eq!(read.current_category, "D");
        assert_eq!(read.target_invoicing_percentage, 90);
    }
}
