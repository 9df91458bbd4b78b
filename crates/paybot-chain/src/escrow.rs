//! Proof-of-payment reporting to the escrow contract.
//!
//! When the account owner sends a payment, the escrow learns about it
//! through `proofOfPaiement(string name, uint256 amount)`: the payee's
//! display name and the amount in the token's smallest unit.

use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use paybot_types::ChainError;
use paybot_types::config::{MAX_PROOF_TOKEN_DECIMALS, ProofConfig};
use paybot_types::payment::TransferReceipt;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, error, info};

use crate::client::{ChainClient, parse_address};

alloy::sol! {
    function proofOfPaiement(string name, uint256 amount);
}

/// Something that can record an outgoing payment on chain.
#[async_trait]
pub trait PaymentProof: Send + Sync {
    /// Report that `amount` (human units, non-negative) was paid to `payee`.
    ///
    /// Same outcome contract as
    /// [`NativeTransfer`](crate::client::NativeTransfer): `None` when no
    /// receipt was observed, `Some` with `status == false` when reverted.
    async fn submit_proof_of_payment(
        &self,
        proof: &ProofConfig,
        payee: &str,
        amount: Decimal,
    ) -> Option<TransferReceipt>;
}

/// `amount` scaled to `decimals` places, truncated toward zero.
pub fn token_units(amount: Decimal, decimals: u32) -> Result<U256, ChainError> {
    if amount.is_sign_negative() {
        return Err(ChainError::InvalidAmount(format!("negative amount {amount}")));
    }
    if decimals > MAX_PROOF_TOKEN_DECIMALS {
        return Err(ChainError::InvalidAmount(format!(
            "{decimals} token decimals exceeds {MAX_PROOF_TOKEN_DECIMALS}"
        )));
    }
    let too_large = || ChainError::InvalidAmount(format!("{amount} too large for {decimals} decimals"));
    let scale = Decimal::from(10u64.pow(decimals));
    let units = amount.checked_mul(scale).ok_or_else(too_large)?.trunc();
    units.to_u128().map(U256::from).ok_or_else(too_large)
}

/// ABI-encoded `proofOfPaiement` call data.
pub fn encode_proof_call(payee: &str, units: U256) -> Bytes {
    proofOfPaiementCall {
        name: payee.to_string(),
        amount: units,
    }
    .abi_encode()
    .into()
}

impl ChainClient {
    /// Build, sign, broadcast, and wait for one proof-of-payment call.
    pub async fn try_submit_proof(
        &self,
        proof: &ProofConfig,
        payee: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt, ChainError> {
        let contract = parse_address(&proof.contract)?;
        let units = token_units(amount, proof.token_decimals)?;
        let input = encode_proof_call(payee, units);
        let tx = self
            .build_call(contract, U256::ZERO, input, proof.gas_limit, proof.gas_price)
            .await?;
        debug!(
            nonce = tx.nonce,
            gas_price_wei = tx.gas_price,
            gas_limit = proof.gas_limit,
            units = %units,
            "built proof of payment"
        );

        let tx_hash = self.broadcast(tx).await?;
        info!(tx_hash = %tx_hash, payee, amount = %amount, "proof of payment broadcast, waiting for receipt");
        self.wait_for_receipt(&tx_hash).await
    }
}

#[async_trait]
impl PaymentProof for ChainClient {
    async fn submit_proof_of_payment(
        &self,
        proof: &ProofConfig,
        payee: &str,
        amount: Decimal,
    ) -> Option<TransferReceipt> {
        match self.try_submit_proof(proof, payee, amount).await {
            Ok(receipt) if receipt.status => {
                info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "proof of payment confirmed");
                Some(receipt)
            }
            Ok(receipt) => {
                error!(tx_hash = %receipt.tx_hash, "proof of payment reverted");
                Some(receipt)
            }
            Err(e) => {
                error!(error = %e, payee, amount = %amount, "proof of payment not confirmed");
                None
            }
        }
    }
}
