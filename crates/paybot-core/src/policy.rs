//! When a parsed notification may move funds or be reported to the escrow.

use std::fmt;

use paybot_types::payment::{ParsedPayment, TransactionType};
use rust_decimal::Decimal;

/// Symbols treated as the chain's native token.
pub const NATIVE_SYMBOLS: &[&str] = &["ETH", "BNB", "MATIC", "POL", "AVAX", "ROSE", "XDAI"];

/// Outcome of [`decide_transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDecision {
    /// Send the parsed amount.
    Transfer,
    /// Do nothing for this notification.
    Skip(SkipReason),
}

/// Why a notification does not trigger a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// At least one required field is missing.
    Incomplete,
    /// The mailbox owner paid, not got paid.
    NotReceived,
    /// Zero or negative amount.
    NonPositiveAmount,
    /// No chain client is configured.
    ChainDisabled,
    /// The mailbox owner got paid, so there is nothing to report.
    NotSent,
    /// Zero amount; a sent amount may carry either sign.
    ZeroAmount,
    /// No escrow contract is configured.
    ProofDisabled,
}

/// Outcome of [`decide_proof`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofDecision {
    /// Report the payment to the escrow.
    Submit,
    Skip(SkipReason),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Incomplete => "incomplete",
            Self::NotReceived => "not a received payment",
            Self::NonPositiveAmount => "amount not positive",
            Self::ChainDisabled => "chain disabled",
            Self::NotSent => "not a sent payment",
            Self::ZeroAmount => "amount is zero",
            Self::ProofDisabled => "escrow reporting disabled",
        };
        f.write_str(s)
    }
}

/// A transfer happens iff the record is complete, received, strictly
/// positive, and a chain is available.
pub fn decide_transfer(payment: &ParsedPayment, chain_available: bool) -> TransferDecision {
    if !payment.is_complete() {
        return TransferDecision::Skip(SkipReason::Incomplete);
    }
    if payment.transaction_type != Some(TransactionType::Received) {
        return TransferDecision::Skip(SkipReason::NotReceived);
    }
    if payment.amount.is_none_or(|a| a <= Decimal::ZERO) {
        return TransferDecision::Skip(SkipReason::NonPositiveAmount);
    }
    if !chain_available {
        return TransferDecision::Skip(SkipReason::ChainDisabled);
    }
    TransferDecision::Transfer
}

/// A proof is submitted iff the record is complete, sent, non-zero, and an
/// escrow is configured.
pub fn decide_proof(payment: &ParsedPayment, escrow_available: bool) -> ProofDecision {
    if !payment.is_complete() {
        return ProofDecision::Skip(SkipReason::Incomplete);
    }
    if payment.transaction_type != Some(TransactionType::Sent) {
        return ProofDecision::Skip(SkipReason::NotSent);
    }
    if payment.amount.is_none_or(|a| a.is_zero()) {
        return ProofDecision::Skip(SkipReason::ZeroAmount);
    }
    if !escrow_available {
        return ProofDecision::Skip(SkipReason::ProofDisabled);
    }
    ProofDecision::Submit
}

/// Whether `currency` names a native token (case-insensitive).
pub fn is_native_symbol(currency: &str) -> bool {
    NATIVE_SYMBOLS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(currency.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(amount: Decimal) -> ParsedPayment {
        ParsedPayment {
            uid: 1,
            subject: "Acme Corp has sent you money".into(),
            transaction_id: Some("3GH81236WK4502918".into()),
            amount: Some(amount),
            currency: Some("EUR".into()),
            transaction_type: Some(TransactionType::Received),
            counterparty_name: Some("Acme Corp".into()),
        }
    }

    #[test]
    fn complete_positive_received_transfers() {
        assert_eq!(
            decide_transfer(&received(Decimal::new(10000, 2)), true),
            TransferDecision::Transfer
        );
    }

    #[test]
    fn zero_and_negative_amounts_skip() {
        assert_eq!(
            decide_transfer(&received(Decimal::ZERO), true),
            TransferDecision::Skip(SkipReason::NonPositiveAmount)
        );
        assert_eq!(
            decide_transfer(&received(Decimal::new(-500, 2)), true),
            TransferDecision::Skip(SkipReason::NonPositiveAmount)
        );
    }

    #[test]
    fn sent_skips() {
        let mut p = received(Decimal::ONE);
        p.transaction_type = Some(TransactionType::Sent);
        assert_eq!(
            decide_transfer(&p, true),
            TransferDecision::Skip(SkipReason::NotReceived)
        );
    }

    #[test]
    fn any_missing_field_skips() {
        let mut p = received(Decimal::ONE);
        p.counterparty_name = None;
        assert_eq!(
            decide_transfer(&p, true),
            TransferDecision::Skip(SkipReason::Incomplete)
        );

        let mut p = received(Decimal::ONE);
        p.transaction_id = None;
        assert_eq!(
            decide_transfer(&p, true),
            TransferDecision::Skip(SkipReason::Incomplete)
        );
    }

    #[test]
    fn no_chain_skips() {
        assert_eq!(
            decide_transfer(&received(Decimal::ONE), false),
            TransferDecision::Skip(SkipReason::ChainDisabled)
        );
    }

    fn sent(amount: Decimal) -> ParsedPayment {
        ParsedPayment {
            subject: "Vous avez envoyé un paiement à Jean Dupont".into(),
            transaction_type: Some(TransactionType::Sent),
            counterparty_name: Some("Jean Dupont".into()),
            ..received(amount)
        }
    }

    #[test]
    fn sent_payments_are_reported_whatever_the_sign() {
        assert_eq!(decide_proof(&sent(Decimal::new(2000, 2)), true), ProofDecision::Submit);
        assert_eq!(decide_proof(&sent(Decimal::new(-2000, 2)), true), ProofDecision::Submit);
    }

    #[test]
    fn proof_skips() {
        assert_eq!(
            decide_proof(&received(Decimal::ONE), true),
            ProofDecision::Skip(SkipReason::NotSent)
        );
        assert_eq!(
            decide_proof(&sent(Decimal::ZERO), true),
            ProofDecision::Skip(SkipReason::ZeroAmount)
        );
        assert_eq!(
            decide_proof(&sent(Decimal::ONE), false),
            ProofDecision::Skip(SkipReason::ProofDisabled)
        );
        let mut p = sent(Decimal::ONE);
        p.transaction_id = None;
        assert_eq!(
            decide_proof(&p, true),
            ProofDecision::Skip(SkipReason::Incomplete)
        );
    }

    #[test]
    fn native_symbols() {
        assert!(is_native_symbol("ETH"));
        assert!(is_native_symbol("matic"));
        assert!(is_native_symbol(" POL "));
        assert!(!is_native_symbol("EUR"));
        assert!(!is_native_symbol("USD"));
    }
}
