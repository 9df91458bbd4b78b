//! EVM chain access for paybot.
//!
//! [`rpc`] carries JSON-RPC over HTTP; [`client::ChainClient`] signs and
//! broadcasts native-token transfers and waits for their receipts.
//! [`escrow`] adds proof-of-payment calls to the escrow contract. The
//! orchestrator only sees the [`client::NativeTransfer`] and
//! [`escrow::PaymentProof`] traits.

pub mod client;
pub mod escrow;
pub mod rpc;

pub use alloy::primitives::Address;
pub use client::{ChainClient, NativeTransfer, RECEIPT_POLL_INTERVAL, RECEIPT_TIMEOUT};
pub use escrow::PaymentProof;
pub use rpc::{HttpRpcTransport, RpcTransport};
