//! Parsed payment notifications and transfer outcomes.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a payment notification, seen from the mailbox owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// The mailbox owner paid someone.
    Sent,
    /// Someone paid the mailbox owner.
    Received,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => f.write_str("sent"),
            Self::Received => f.write_str("received"),
        }
    }
}

/// Fields extracted from one payment notification.
///
/// Every extracted field is optional: a pattern that does not match leaves
/// the field empty, which is not an error. Only a [complete](Self::is_complete)
/// record is allowed to trigger a chain transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPayment {
    /// UID of the source message.
    pub uid: u32,
    /// Subject of the source message, kept for log context.
    pub subject: String,
    /// Provider transaction identifier.
    pub transaction_id: Option<String>,
    /// Amount as printed in the message (sign preserved).
    pub amount: Option<Decimal>,
    /// Three-letter currency code.
    pub currency: Option<String>,
    /// Direction, from the subject line.
    pub transaction_type: Option<TransactionType>,
    /// Sender name for received payments, recipient name for sent ones.
    pub counterparty_name: Option<String>,
}

impl ParsedPayment {
    /// An empty record for the given message.
    pub fn empty(uid: u32, subject: impl Into<String>) -> Self {
        Self {
            uid,
            subject: subject.into(),
            transaction_id: None,
            amount: None,
            currency: None,
            transaction_type: None,
            counterparty_name: None,
        }
    }

    /// Names of the required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.transaction_id.is_none() {
            missing.push("transaction_id");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.currency.is_none() {
            missing.push("currency");
        }
        if self.transaction_type.is_none() {
            missing.push("transaction_type");
        }
        if self.counterparty_name.is_none() {
            missing.push("counterparty_name");
        }
        missing
    }

    /// `true` when all five required fields are present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Receipt of a mined transfer.
///
/// A receipt with `status == false` means the transaction was mined but
/// reverted. The absence of a receipt (timeout, broadcast failure) is
/// represented by `None` at the call site, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Transaction hash, `0x`-prefixed.
    pub tx_hash: String,
    /// `true` for status `0x1`.
    pub status: bool,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Gas consumed.
    pub gas_used: u64,
}
