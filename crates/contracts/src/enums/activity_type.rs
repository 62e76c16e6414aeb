use serde::{Deserialize, Serialize};

/// Тип деятельности монотрибутиста. От него зависит ежемесячный взнос категории.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// Locación y prestación de servicios
    #[default]
    Services,
    /// Venta de cosas muebles
    Commerce,
}

impl ActivityType {
    /// Получить код типа деятельности
    pub fn code(&self) -> &'static str {
        match self {
            ActivityType::Services => "services",
            ActivityType::Commerce => "commerce",
        }
    }

    /// Парсинг из строки. Принимает и испанские коды внешней базы.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "services" | "servicios" => Some(ActivityType::Services),
            "commerce" | "comercio" | "venta" => Some(ActivityType::Commerce),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
