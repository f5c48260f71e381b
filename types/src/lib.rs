//! Fundamental types for the VFT client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account and program identities, token amounts, metadata, transaction requests
//! and their lifecycle states, program events, and the error taxonomy.

pub mod address;
pub mod amount;
pub mod error;
pub mod event;
pub mod metadata;
pub mod state;
pub mod transaction;

pub use address::{Address, ProgramId, ADDRESS_LEN};
pub use amount::TokenAmount;
pub use error::TokenError;
pub use event::{ApprovalEvent, BurnedEvent, EventKind, MintedEvent, TokenEvent, TransferEvent};
pub use metadata::TokenMetadata;
pub use state::TransactionState;
pub use transaction::{Operation, Receipt, TransactionRequest};
