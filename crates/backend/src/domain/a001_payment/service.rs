use chrono::{Datelike, Months, NaiveDate};
use contracts::domain::a001_payment::{PaymentDto, PaymentRecord};
use sea_orm::DatabaseConnection;

use super::repository;

/// Создание нового платежа
pub async fn create(db: &DatabaseConnection, dto: PaymentDto) -> anyhow::Result<String> {
    let payment = PaymentRecord::new_for_insert(dto.date, dto.amount, dto.invoiced, dto.description);

    payment
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    repository::insert(db, &payment).await
}

/// Демонстрационные платежи за последние 14 месяцев до `today`
pub fn demo_payments(today: NaiveDate) -> Vec<PaymentDto> {
    let first_month = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .and_then(|d| d.checked_sub_months(Months::new(13)))
        .unwrap_or(today);

    let mut data = Vec::new();
    for offset in 0..14u32 {
        let Some(month_start) = first_month.checked_add_months(Months::new(offset)) else {
            continue;
        };
        let base = 450_000.0 + 35_000.0 * offset as f64;
        let entries = [
            (5, base, true, "Honorarios"),
            (12, base * 0.4, offset % 3 != 0, "Consultoría"),
            (24, base * 0.25, offset % 2 == 0, "Transferencia"),
        ];
        for (day, amount, invoiced, description) in entries {
            let Some(date) = month_start.with_day(day) else {
                continue;
            };
            if date > today {
                continue;
            }
            data.push(PaymentDto {
                date,
                amount: amount.round(),
                invoiced,
                description: Some(description.to_string()),
            });
        }
    }
    data
}

/// Вставка тестовых данных
pub async fn insert_test_data(db: &DatabaseConnection, today: NaiveDate) -> anyhow::Result<usize> {
    let data = demo_payments(today);
    let count = data.len();
    for dto in data {
        create(db, dto).await?;
    }
    Ok(count)
}
