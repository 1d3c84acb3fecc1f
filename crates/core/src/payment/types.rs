//! Payment domain enums.

use serde::{Deserialize, Serialize};

/// What a payment represents within the financing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Single settling payment on a cash quotation ("contado").
    Cash,
    /// Down payment on a financed quotation ("anticipo").
    Advance,
    /// Scheduled or ad hoc installment ("abono").
    Installment,
    /// Ordinary interest charge.
    Interest,
    /// Moratory interest on an overdue balance.
    Arrears,
}

impl PaymentType {
    /// Reference prefix for this payment type.
    #[must_use]
    pub const fn reference_prefix(&self) -> &'static str {
        match self {
            Self::Cash => "CON",
            Self::Advance => "ANT",
            Self::Installment => "ABO",
            Self::Interest => "INT",
            Self::Arrears => "MOR",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Advance => write!(f, "advance"),
            Self::Installment => write!(f, "installment"),
            Self::Interest => write!(f, "interest"),
            Self::Arrears => write!(f, "arrears"),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer.
    Transfer,
    /// Card payment.
    Card,
    /// Bank deposit.
    Deposit,
}

/// Lifecycle status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Scheduled, not yet collected.
    Pending,
    /// Money received.
    Completed,
    /// Voided before collection.
    Cancelled,
    /// Returned after collection.
    Refunded,
    /// Declined by the payment processor.
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_prefixes_are_distinct() {
        let prefixes = [
            PaymentType::Cash.reference_prefix(),
            PaymentType::Advance.reference_prefix(),
            PaymentType::Installment.reference_prefix(),
            PaymentType::Interest.reference_prefix(),
            PaymentType::Arrears.reference_prefix(),
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
