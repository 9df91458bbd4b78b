//! Orchestration for paybot.
//!
//! [`bot::PaymentBot`] wires a [`Mailbox`](paybot_mail::Mailbox) and an
//! optional [`NativeTransfer`](paybot_chain::NativeTransfer) backend into a
//! cooperative polling loop. [`policy`] holds the pure rule deciding which
//! notifications move funds.

pub mod bot;
pub mod policy;

pub use bot::{BotSettings, PaymentBot, PollReport};
pub use policy::{ProofDecision, SkipReason, TransferDecision, decide_proof, decide_transfer};
