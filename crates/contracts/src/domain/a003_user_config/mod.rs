pub mod aggregate;

pub use aggregate::{UserConfig, UserConfigDto, UserConfigId, DEFAULT_TARGET_INVOICING_PERCENTAGE};
