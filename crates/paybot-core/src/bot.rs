//! The polling loop.
//!
//! One poll fetches new notifications, parses each one independently, and
//! sends at most one transfer per actionable received notification. With
//! an escrow configured, each actionable sent notification is reported
//! with one proof-of-payment call. Polls run strictly one after another
//! with a fixed sleep in between. Nothing that goes wrong inside a poll
//! stops the loop; only cancellation does.

use std::sync::Arc;
use std::time::Duration;

use paybot_chain::{NativeTransfer, PaymentProof};
use paybot_mail::{Mailbox, parse_payment};
use paybot_types::config::{BotConfig, GasPrice, ProofConfig};
use paybot_types::mail::MailMessage;
use paybot_types::payment::ParsedPayment;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::policy::{
    ProofDecision, TransferDecision, decide_proof, decide_transfer, is_native_symbol,
};

/// Per-run settings the loop needs from the configuration.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub sender_filter: String,
    pub recipient: String,
    pub gas_limit: u64,
    pub gas_price: GasPrice,
    pub poll_interval: Duration,
    /// Escrow reporting of sent payments.
    pub proof: Option<ProofConfig>,
}

impl BotSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            sender_filter: config.mailbox.sender_filter.clone(),
            recipient: config.transfer.recipient.clone(),
            gas_limit: config.transfer.gas_limit,
            gas_price: config.transfer.gas_price,
            poll_interval: config.poll_interval(),
            proof: config.proof.clone(),
        }
    }
}

/// Counters for one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Messages returned by the mailbox.
    pub fetched: usize,
    /// Messages recognized as payment notifications.
    pub parsed: usize,
    /// Parsed records with every field present.
    pub actionable: usize,
    pub transfers_attempted: usize,
    /// Mined with status 1.
    pub transfers_confirmed: usize,
    /// Mined with status 0.
    pub transfers_failed: usize,
    /// No receipt observed (broadcast error or timeout).
    pub transfers_unconfirmed: usize,
    pub proofs_attempted: usize,
    pub proofs_confirmed: usize,
    pub proofs_failed: usize,
    pub proofs_unconfirmed: usize,
}

/// The bot: a mailbox, optional chain backends, and settings.
pub struct PaymentBot {
    mailbox: Arc<dyn Mailbox>,
    chain: Option<Arc<dyn NativeTransfer>>,
    escrow: Option<Arc<dyn PaymentProof>>,
    settings: BotSettings,
}

impl PaymentBot {
    pub fn new(
        mailbox: Arc<dyn Mailbox>,
        chain: Option<Arc<dyn NativeTransfer>>,
        settings: BotSettings,
    ) -> Self {
        Self {
            mailbox,
            chain,
            escrow: None,
            settings,
        }
    }

    /// Report sent payments through `escrow` when settings carry a contract.
    pub fn with_escrow(mut self, escrow: Arc<dyn PaymentProof>) -> Self {
        self.escrow = Some(escrow);
        self
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Whether transfers are enabled for this run.
    pub fn chain_enabled(&self) -> bool {
        self.chain.is_some()
    }

    /// Whether sent payments are reported for this run.
    pub fn escrow_enabled(&self) -> bool {
        self.escrow.is_some() && self.settings.proof.is_some()
    }

    /// Fetch and process one batch.
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();

        let messages = match self.mailbox.fetch_new(&self.settings.sender_filter).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "mailbox fetch failed");
                Vec::new()
            }
        };
        report.fetched = messages.len();

        if messages.is_empty() {
            info!("no new emails");
            return report;
        }
        info!(count = messages.len(), "processing new emails");

        for message in &messages {
            self.process_message(message, &mut report).await;
        }
        report
    }

    async fn process_message(&self, message: &MailMessage, report: &mut PollReport) {
        let Some(payment) = parse_payment(message) else {
            return;
        };
        report.parsed += 1;

        if payment.is_complete() {
            report.actionable += 1;
            info!(
                uid = payment.uid,
                transaction_id = payment.transaction_id.as_deref().unwrap_or_default(),
                direction = ?payment.transaction_type,
                amount = ?payment.amount,
                currency = payment.currency.as_deref().unwrap_or_default(),
                counterparty = payment.counterparty_name.as_deref().unwrap_or_default(),
                "payment notification parsed"
            );
        } else {
            warn!(
                uid = payment.uid,
                subject = %payment.subject,
                missing = ?payment.missing_fields(),
                "payment notification incomplete"
            );
        }

        match decide_transfer(&payment, self.chain.is_some()) {
            TransferDecision::Skip(reason) => {
                debug!(uid = payment.uid, reason = %reason, "no transfer");
            }
            TransferDecision::Transfer => {
                if let Some(chain) = &self.chain {
                    self.transfer(chain.as_ref(), &payment, report).await;
                }
            }
        }

        match decide_proof(&payment, self.escrow_enabled()) {
            ProofDecision::Skip(reason) => {
                debug!(uid = payment.uid, reason = %reason, "no proof of payment");
            }
            ProofDecision::Submit => {
                if let (Some(escrow), Some(proof)) = (&self.escrow, &self.settings.proof) {
                    self.report_proof(escrow.as_ref(), proof, &payment, report)
                        .await;
                }
            }
        }
    }

    async fn report_proof(
        &self,
        escrow: &dyn PaymentProof,
        proof: &ProofConfig,
        payment: &ParsedPayment,
        report: &mut PollReport,
    ) {
        let (Some(amount), Some(payee)) = (payment.amount, payment.counterparty_name.as_deref())
        else {
            return;
        };
        let transaction_id = payment.transaction_id.as_deref().unwrap_or_default();
        // Sent amounts are sometimes rendered negative.
        let amount = amount.abs();

        info!(
            transaction_id,
            contract = %proof.contract,
            payee,
            amount = %amount,
            "reporting proof of payment"
        );
        report.proofs_attempted += 1;

        match escrow.submit_proof_of_payment(proof, payee, amount).await {
            Some(receipt) if receipt.status => {
                report.proofs_confirmed += 1;
                info!(transaction_id, tx_hash = %receipt.tx_hash, "proof of payment confirmed");
            }
            Some(receipt) => {
                report.proofs_failed += 1;
                error!(transaction_id, tx_hash = %receipt.tx_hash, "proof of payment reverted on chain");
            }
            None => {
                report.proofs_unconfirmed += 1;
                error!(transaction_id, "proof of payment not confirmed");
            }
        }
    }

    async fn transfer(
        &self,
        chain: &dyn NativeTransfer,
        payment: &ParsedPayment,
        report: &mut PollReport,
    ) {
        let (Some(amount), Some(currency)) = (payment.amount, payment.currency.as_deref()) else {
            return;
        };
        let transaction_id = payment.transaction_id.as_deref().unwrap_or_default();

        if !is_native_symbol(currency) {
            warn!(
                transaction_id,
                currency,
                "currency is not a native token symbol; sending the parsed amount unconverted"
            );
        }

        info!(
            transaction_id,
            recipient = %self.settings.recipient,
            amount = %amount,
            "sending native transfer"
        );
        report.transfers_attempted += 1;

        match chain
            .send_native_transfer(
                &self.settings.recipient,
                amount,
                self.settings.gas_limit,
                self.settings.gas_price,
            )
            .await
        {
            Some(receipt) if receipt.status => {
                report.transfers_confirmed += 1;
                info!(transaction_id, tx_hash = %receipt.tx_hash, "transfer confirmed");
            }
            Some(receipt) => {
                report.transfers_failed += 1;
                error!(transaction_id, tx_hash = %receipt.tx_hash, "transfer reverted on chain");
            }
            None => {
                report.transfers_unconfirmed += 1;
                error!(transaction_id, "transfer not confirmed");
            }
        }
    }

    /// Poll until `cancel` fires, then log out of the mailbox.
    ///
    /// Cancellation is checked before each poll and during the sleep; a
    /// batch in progress always runs to completion.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            chain_enabled = self.chain_enabled(),
            escrow_enabled = self.escrow_enabled(),
            "payment bot started"
        );

        while !cancel.is_cancelled() {
            let report = self.poll_once().await;
            debug!(?report, "poll finished");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        info!("payment bot shutting down");
        self.mailbox.logout().await;
    }
}
