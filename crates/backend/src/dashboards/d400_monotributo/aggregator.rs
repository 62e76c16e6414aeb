//! Группировка платежей по календарным месяцам.

use chrono::{Datelike, NaiveDate};
use contracts::dashboards::d400_monotributo::MonthlyBucket;
use contracts::domain::a001_payment::PaymentRecord;
use std::collections::BTreeMap;

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const MONTH_SHORT_NAMES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Итоги по всем месяцам
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub total_received: f64,
    pub total_invoiced: f64,
    pub count_received: u32,
    pub count_invoiced: u32,
}

/// Процент выставленных счетов, округленный; 0 при нулевых поступлениях
pub fn invoiced_percentage(total_invoiced: f64, total_received: f64) -> u32 {
    if total_received > 0.0 {
        (total_invoiced / total_received * 100.0).round().max(0.0) as u32
    } else {
        0
    }
}

/// "ene '24"
pub fn short_label(date: NaiveDate) -> String {
    let idx = date.month0() as usize;
    format!("{} '{:02}", MONTH_SHORT_NAMES[idx], date.year().rem_euclid(100))
}

/// "enero 2024"
pub fn long_label(date: NaiveDate) -> String {
    let idx = date.month0() as usize;
    format!("{} {}", MONTH_NAMES[idx], date.year())
}

fn empty_bucket(date: NaiveDate) -> MonthlyBucket {
    MonthlyBucket {
        period: format!("{:04}-{:02}", date.year(), date.month()),
        short_label: short_label(date),
        long_label: long_label(date),
        total_received: 0.0,
        total_invoiced: 0.0,
        count_received: 0,
        count_invoiced: 0,
        invoiced_percentage: 0,
        uninvoiced_amount: 0.0,
    }
}

/// Собрать помесячные итоги.
///
/// На вход приходят уже отфильтрованные платежи (без удаленных, не раньше эпохи).
/// Результат отсортирован по ключу "YYYY-MM", что совпадает с хронологией.
pub fn aggregate(payments: &[PaymentRecord]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<String, MonthlyBucket> = BTreeMap::new();

    for payment in payments {
        let bucket = buckets
            .entry(payment.month_key())
            .or_insert_with(|| empty_bucket(payment.date));

        bucket.total_received += payment.amount;
        bucket.count_received += 1;
        if payment.invoiced {
            bucket.total_invoiced += payment.amount;
            bucket.count_invoiced += 1;
        }
    }

    buckets
        .into_values()
        .map(|mut bucket| {
            bucket.invoiced_percentage =
                invoiced_percentage(bucket.total_invoiced, bucket.total_received);
            bucket.uninvoiced_amount = bucket.total_received - bucket.total_invoiced;
            bucket
        })
        .collect()
}

/// Ключи месяцев, по которым есть данные
pub fn available_periods(buckets: &[MonthlyBucket]) -> Vec<String> {
    buckets.iter().map(|b| b.period.clone()).collect()
}

pub fn totals(buckets: &[MonthlyBucket]) -> PeriodTotals {
    buckets.iter().fold(PeriodTotals::default(), |mut acc, b| {
        acc.total_received += b.total_received;
        acc.total_invoiced += b.total_invoiced;
        acc.count_received += b.count_received;
        acc.count_invoiced += b.count_invoiced;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(y: i32, m: u32, d: u32, amount: f64, invoiced: bool) -> PaymentRecord {
        PaymentRecord::new_for_insert(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            amount,
            invoiced,
            None,
        )
    }

    #[test]
    fn test_two_month_scenario() {
        let payments = vec![
            payment(2024, 1, 5, 1000.0, true),
            payment(2024, 1, 20, 500.0, false),
            payment(2024, 2, 1, 2000.0, true),
        ];
        let buckets = aggregate(&payments);
        assert_eq!(buckets.len(), 2);

        let jan = &buckets[0];
        assert_eq!(jan.period, "2024-01");
        assert_eq!(jan.total_received, 1500.0);
        assert_eq!(jan.total_invoiced, 1000.0);
        assert_eq!(jan.invoiced_percentage, 67);
        assert_eq!(jan.uninvoiced_amount, 500.0);
        assert_eq!(jan.count_received, 2);
        assert_eq!(jan.count_invoiced, 1);
        assert_eq!(jan.short_label, "ene '24");
        assert_eq!(jan.long_label, "enero 2024");

        let feb = &buckets[1];
        assert_eq!(feb.period, "2024-02");
        assert_eq!(feb.total_received, 2000.0);
        assert_eq!(feb.total_invoiced, 2000.0);
        assert_eq!(feb.invoiced_percentage, 100);
        assert_eq!(feb.uninvoiced_amount, 0.0);
    }

    #[test]
    fn test_sums_match_input_and_order_is_chronological() {
        let payments = vec![
            payment(2025, 3, 2, 10.0, false),
            payment(2024, 12, 31, 250.0, true),
            payment(2024, 11, 1, 40.0, true),
            payment(2025, 3, 28, 5.5, true),
            payment(2024, 12, 1, 0.0, false),
        ];
        let buckets = aggregate(&payments);

        let input_received: f64 = payments.iter().map(|p| p.amount).sum();
        let input_invoiced: f64 = payments.iter().filter(|p| p.invoiced).map(|p| p.amount).sum();
        let t = totals(&buckets);
        assert_eq!(t.total_received, input_received);
        assert_eq!(t.total_invoiced, input_invoiced);
        assert_eq!(t.count_received, 5);
        assert_eq!(t.count_invoiced, 3);

        assert!(buckets.windows(2).all(|w| w[0].period <= w[1].period));
        assert_eq!(
            available_periods(&buckets),
            vec!["2024-11", "2024-12", "2025-03"]
        );
    }

    #[test]
    fn test_zero_received_month_is_zero_percent() {
        let buckets = aggregate(&[payment(2024, 5, 10, 0.0, true)]);
        assert_eq!(buckets[0].invoiced_percentage, 0);
        assert_eq!(buckets[0].uninvoiced_amount, 0.0);
        assert_eq!(invoiced_percentage(0.0, 0.0), 0);
    }

    #[test]
    fn test_labels_for_december_and_century() {
        let date = NaiveDate::from_ymd_opt(2100, 12, 1).unwrap();
        assert_eq!(short_label(date), "dic '00");
        assert_eq!(long_label(date), "diciembre 2100");
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
        assert_eq!(totals(&[]), PeriodTotals::default());
    }
}
