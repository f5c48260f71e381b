//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the client core (remote channel, wallet account,
//! event transport, notification sink) sits behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return scripted values
//! - Can be controlled programmatically (hold calls pending, emit events)
//! - Record what they were asked to do, for assertions
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod accounts;
pub mod channel;
pub mod events;
pub mod notifier;

pub use accounts::NullAccounts;
pub use channel::NullChannel;
pub use events::NullEventTransport;
pub use notifier::{NullNotifier, Notice};
