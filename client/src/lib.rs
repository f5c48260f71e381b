//! Client core for a VFT (fungible token) program.
//!
//! Provides everything a wallet-connected front end needs:
//! - Balance reads keyed by canonical address, with in-flight sharing
//! - Token metadata with a coalesced total-supply refetch
//! - Mint, burn and transfer orchestration with one request in flight per operation
//! - Event subscription with per-kind callbacks
//! - A JSON-RPC gateway channel and a WebSocket event transport
//!
//! Wallet plumbing, signing and the ledger itself stay behind the
//! [`AccountProvider`], [`RemoteChannel`] and [`EventTransport`] traits.

pub mod account;
pub mod balance;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod notify;
pub mod orchestrator;
pub mod rpc;
pub mod ws;

pub use account::{Account, AccountProvider, StaticAccount};
pub use balance::{BalanceQueryCache, BalanceState};
pub use channel::{QueryMethod, RemoteChannel};
pub use client::TokenClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ChannelError;
pub use events::{EventHandler, EventReconciler, EventTransport, Subscription, TokenEventCallbacks};
pub use metadata::MetadataQueryCache;
pub use notify::{NotificationSink, TracingNotifier};
pub use orchestrator::{PendingTransaction, TransactionOrchestrator};
pub use rpc::RpcChannel;
pub use ws::WsEventTransport;
