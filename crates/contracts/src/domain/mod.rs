pub mod a001_payment;
pub mod a002_tax_category;
pub mod a003_user_config;
pub mod common;
