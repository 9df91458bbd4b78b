//! EVM chain client: balance queries and native-token transfers.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::utils::{parse_ether, parse_units};
use alloy::primitives::{Address, Bytes, TxKind, U256, hex};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use paybot_types::config::GasPrice;
use paybot_types::payment::TransferReceipt;
use paybot_types::{ChainError, SecretString};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::rpc::{HttpRpcTransport, RpcTransport, parse_quantity_u64, parse_quantity_u256};

/// How long to wait for a receipt after broadcasting.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
/// Delay between receipt polls.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Decimal places of the native token.
const NATIVE_DECIMALS: u32 = 18;

/// Something that can move native tokens.
#[async_trait]
pub trait NativeTransfer: Send + Sync {
    /// Send `amount` (human units) to `recipient`.
    ///
    /// `None` means no confirmation was observed. The transaction may still
    /// be pending or get mined later. A mined but reverted transaction is
    /// `Some` with `status == false`.
    async fn send_native_transfer(
        &self,
        recipient: &str,
        amount: Decimal,
        gas_limit: u64,
        gas_price: GasPrice,
    ) -> Option<TransferReceipt>;
}

/// Client for one EVM endpoint and one signing key.
pub struct ChainClient {
    transport: Arc<dyn RpcTransport>,
    signer: PrivateKeySigner,
    chain_id: u64,
    receipt_timeout: Duration,
    receipt_poll_interval: Duration,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Connect to `rpc_url` over HTTP.
    ///
    /// Fails with [`ChainError::ConnectionFailed`] when the endpoint does not
    /// answer `eth_chainId`.
    pub async fn connect(
        rpc_url: &str,
        signing_key: &SecretString,
        expected_chain_id: Option<u64>,
    ) -> Result<Self, ChainError> {
        let transport = HttpRpcTransport::new(rpc_url)?;
        Self::with_transport(Arc::new(transport), signing_key, expected_chain_id).await
    }

    /// Build a client over an existing transport.
    ///
    /// The live chain id always wins; a differing `expected_chain_id` is
    /// only logged.
    pub async fn with_transport(
        transport: Arc<dyn RpcTransport>,
        signing_key: &SecretString,
        expected_chain_id: Option<u64>,
    ) -> Result<Self, ChainError> {
        let signer = PrivateKeySigner::from_str(signing_key.expose().trim())
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?;

        let live = transport
            .call("eth_chainId", json!([]))
            .await
            .map_err(|e| ChainError::ConnectionFailed(e.to_string()))?;
        let chain_id = parse_quantity_u64(&live, "eth_chainId")?;

        if let Some(expected) = expected_chain_id
            && expected != chain_id
        {
            warn!(
                configured = expected,
                live = chain_id,
                "configured chain id differs from endpoint, using live value"
            );
        }

        info!(address = %signer.address(), chain_id, "chain client connected");
        Ok(Self {
            transport,
            signer,
            chain_id,
            receipt_timeout: RECEIPT_TIMEOUT,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        })
    }

    /// Override how long and how often to poll for receipts.
    pub fn with_receipt_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.receipt_timeout = timeout;
        self.receipt_poll_interval = poll_interval;
        self
    }

    /// Address derived from the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain id reported by the endpoint.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Native balance in human units; defaults to the signer's own address.
    pub async fn get_balance(&self, address: Option<Address>) -> Result<Decimal, ChainError> {
        let address = address.unwrap_or_else(|| self.address());
        let result = self
            .transport
            .call("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        let wei = parse_quantity_u256(&result, "eth_getBalance")?;
        wei_to_native(wei)
    }

    /// Gas price in wei for the given policy.
    pub async fn resolve_gas_price(&self, policy: GasPrice) -> Result<u128, ChainError> {
        match policy {
            GasPrice::Gwei(gwei) => gwei_to_wei(gwei),
            GasPrice::Auto => {
                let result = self.transport.call("eth_gasPrice", json!([])).await?;
                let wei = parse_quantity_u256(&result, "eth_gasPrice")?;
                let wei = u128::try_from(wei)
                    .map_err(|_| ChainError::InvalidResponse(format!("gas price {wei} too large")))?;
                debug!(gas_price_wei = wei, "using live gas price");
                Ok(wei)
            }
        }
    }

    /// Unsigned legacy transfer with the pending nonce and resolved gas price.
    pub async fn build_transfer(
        &self,
        recipient: &str,
        amount: Decimal,
        gas_limit: u64,
        gas_price: GasPrice,
    ) -> Result<TxLegacy, ChainError> {
        let to = parse_address(recipient)?;
        let value = native_to_wei(amount)?;
        self.build_call(to, value, Bytes::new(), gas_limit, gas_price)
            .await
    }

    /// Unsigned legacy transaction to `to` carrying `input`, with the
    /// pending nonce and resolved gas price.
    pub async fn build_call(
        &self,
        to: Address,
        value: U256,
        input: Bytes,
        gas_limit: u64,
        gas_price: GasPrice,
    ) -> Result<TxLegacy, ChainError> {
        let nonce = self
            .transport
            .call(
                "eth_getTransactionCount",
                json!([self.address().to_string(), "pending"]),
            )
            .await?;
        let nonce = parse_quantity_u64(&nonce, "eth_getTransactionCount")?;
        let gas_price = self.resolve_gas_price(gas_price).await?;

        Ok(TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(to),
            value,
            input,
        })
    }

    /// Sign `tx` and return its hash and raw EIP-2718 encoding.
    pub fn sign(&self, mut tx: TxLegacy) -> Result<(String, Vec<u8>), ChainError> {
        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        let signed = tx.into_signed(signature);
        let tx_hash = signed.hash().to_string();
        let raw = TxEnvelope::from(signed).encoded_2718();
        Ok((tx_hash, raw))
    }

    /// Poll for the receipt of `tx_hash` until it appears or the timeout
    /// elapses.
    pub async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransferReceipt, ChainError> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            let result = self
                .transport
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !result.is_null() {
                return parse_receipt(tx_hash, &result);
            }
            if tokio::time::Instant::now() + self.receipt_poll_interval > deadline {
                return Err(ChainError::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                    waited_secs: self.receipt_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }

    /// Build, sign, broadcast, and wait for one native transfer.
    pub async fn try_send_native_transfer(
        &self,
        recipient: &str,
        amount: Decimal,
        gas_limit: u64,
        gas_price: GasPrice,
    ) -> Result<TransferReceipt, ChainError> {
        let tx = self
            .build_transfer(recipient, amount, gas_limit, gas_price)
            .await?;
        debug!(
            nonce = tx.nonce,
            gas_price_wei = tx.gas_price,
            gas_limit,
            value_wei = %tx.value,
            "built transfer"
        );

        let tx_hash = self.broadcast(tx).await?;
        info!(tx_hash = %tx_hash, recipient, amount = %amount, "transfer broadcast, waiting for receipt");

        self.wait_for_receipt(&tx_hash).await
    }

    /// Sign and broadcast `tx`, returning the hash the node reports.
    pub async fn broadcast(&self, tx: TxLegacy) -> Result<String, ChainError> {
        let (tx_hash, raw) = self.sign(tx)?;
        let sent = self
            .transport
            .call("eth_sendRawTransaction", json!([hex::encode_prefixed(&raw)]))
            .await?;
        Ok(sent.as_str().map(str::to_string).unwrap_or(tx_hash))
    }
}

#[async_trait]
impl NativeTransfer for ChainClient {
    async fn send_native_transfer(
        &self,
        recipient: &str,
        amount: Decimal,
        gas_limit: u64,
        gas_price: GasPrice,
    ) -> Option<TransferReceipt> {
        match self
            .try_send_native_transfer(recipient, amount, gas_limit, gas_price)
            .await
        {
            Ok(receipt) if receipt.status => {
                info!(
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "transfer confirmed"
                );
                Some(receipt)
            }
            Ok(receipt) => {
                error!(
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    "transfer mined but failed on chain"
                );
                Some(receipt)
            }
            Err(e) => {
                error!(error = %e, recipient, amount = %amount, "transfer not confirmed");
                None
            }
        }
    }
}

fn parse_receipt(tx_hash: &str, receipt: &Value) -> Result<TransferReceipt, ChainError> {
    let field = |name: &str| {
        receipt
            .get(name)
            .ok_or_else(|| ChainError::InvalidResponse(format!("receipt missing {name}")))
    };
    Ok(TransferReceipt {
        tx_hash: receipt
            .get("transactionHash")
            .and_then(Value::as_str)
            .unwrap_or(tx_hash)
            .to_string(),
        status: parse_quantity_u64(field("status")?, "receipt status")? == 1,
        block_number: parse_quantity_u64(field("blockNumber")?, "receipt blockNumber")?,
        gas_used: parse_quantity_u64(field("gasUsed")?, "receipt gasUsed")?,
    })
}

pub(crate) fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(raw.trim()).map_err(|e| ChainError::InvalidAddress(format!("{raw}: {e}")))
}

/// Human-unit amount to wei.
pub fn native_to_wei(amount: Decimal) -> Result<U256, ChainError> {
    if amount.is_sign_negative() {
        return Err(ChainError::InvalidAmount(format!("negative amount {amount}")));
    }
    parse_ether(&amount.to_string()).map_err(|e| ChainError::InvalidAmount(format!("{amount}: {e}")))
}

/// Gwei to wei, rejecting fractions below one wei.
pub fn gwei_to_wei(gwei: Decimal) -> Result<u128, ChainError> {
    let wei: U256 = parse_units(&gwei.to_string(), "gwei")
        .map_err(|e| ChainError::InvalidAmount(format!("{gwei} gwei: {e}")))?
        .get_absolute();
    u128::try_from(wei).map_err(|_| ChainError::InvalidAmount(format!("{gwei} gwei too large")))
}

/// Wei to human units.
pub fn wei_to_native(wei: U256) -> Result<Decimal, ChainError> {
    let too_large = || ChainError::InvalidResponse(format!("balance {wei} wei too large"));
    let wei = u128::try_from(wei).map_err(|_| too_large())?;
    let wei = i128::try_from(wei).map_err(|_| too_large())?;
    Decimal::try_from_i128_with_scale(wei, NATIVE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| too_large())
}
