//! Human-readable payment reference derivation.
//!
//! References must be unique per payment. They are derived from the payment
//! type and a time-based suffix; on a uniqueness conflict the caller retries
//! with an incremented attempt counter, which changes the suffix.

use chrono::{DateTime, Utc};

use super::types::PaymentType;

/// Derives a human-readable payment reference.
///
/// Format: `{PREFIX}-{yyyymmddHHMMSS}-{attempt+millis:04X}`, e.g.
/// `ABO-20260825143000-01F4`. The final component mixes the sub-second
/// timestamp with the retry attempt so a retry always produces a different
/// reference within the same second.
#[must_use]
pub fn payment_reference(payment_type: PaymentType, at: DateTime<Utc>, attempt: u32) -> String {
    let suffix = (at.timestamp_subsec_millis() + attempt * 1000) & 0xFFFF;
    format!(
        "{}-{}-{suffix:04X}",
        payment_type.reference_prefix(),
        at.format("%Y%m%d%H%M%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_format() {
        let at = Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap();
        let reference = payment_reference(PaymentType::Installment, at, 0);
        assert!(reference.starts_with("ABO-20260825143000-"));
        assert_eq!(reference.len(), "ABO-20260825143000-0000".len());
    }

    #[test]
    fn test_retry_changes_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap();
        let first = payment_reference(PaymentType::Advance, at, 0);
        let second = payment_reference(PaymentType::Advance, at, 1);
        assert_ne!(first, second);
    }

    #[test]
    fn test_prefix_follows_type() {
        let at = Utc::now();
        assert!(payment_reference(PaymentType::Cash, at, 0).starts_with("CON-"));
        assert!(payment_reference(PaymentType::Arrears, at, 0).starts_with("MOR-"));
    }
}
