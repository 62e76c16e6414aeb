use contracts::enums::CurrencyMode;

/// Форматирует число с разделителями тысяч (запятыми)
///
/// # Примеры
/// ```
/// use backend::shared::format::format_number;
/// assert_eq!(format_number(1234567), "1,234,567");
/// assert_eq!(format_number(42), "42");
/// ```
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Сумма в выбранной валюте.
///
/// ARS: округление до целого с разделителями тысяч, `"1,000,000 ARS"`.
/// USD: деление на курс и округление без разделителей, `"1000 USD"`.
/// Неположительный или нечисловой курс считается равным 1.
pub fn format_amount(amount: f64, mode: CurrencyMode, rate: f64) -> String {
    match mode {
        CurrencyMode::ARS => {
            let rounded = amount.round();
            let grouped = format_number(rounded.abs() as usize);
            if rounded < 0.0 {
                format!("-{} ARS", grouped)
            } else {
                format!("{} ARS", grouped)
            }
        }
        CurrencyMode::USD => {
            let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
            format!("{} USD", (amount / rate).round() as i64)
        }
    }
}
