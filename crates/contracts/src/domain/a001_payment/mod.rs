pub mod aggregate;

pub use aggregate::{PaymentDto, PaymentId, PaymentRecord};
