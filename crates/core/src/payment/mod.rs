//! Payment classification and reference derivation.

pub mod reference;
pub mod types;

pub use reference::payment_reference;
pub use types::{PaymentMethod, PaymentStatus, PaymentType};
