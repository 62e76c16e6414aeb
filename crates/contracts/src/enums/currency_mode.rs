use serde::{Deserialize, Serialize};

/// Валюта отображения сумм. Влияет только на форматирование.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurrencyMode {
    #[default]
    ARS,
    USD,
}

impl CurrencyMode {
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyMode::ARS => "ARS",
            CurrencyMode::USD => "USD",
        }
    }
}

impl std::fmt::Display for CurrencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
