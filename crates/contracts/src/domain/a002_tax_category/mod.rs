pub mod aggregate;

pub use aggregate::TaxCategory;
