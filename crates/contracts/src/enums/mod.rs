pub mod activity_type;
pub mod currency_mode;

pub use activity_type::ActivityType;
pub use currency_mode::CurrencyMode;
