//! Balance reads keyed by canonical address.
//!
//! Every read for an address shares one future per canonical key: while it is
//! in flight, further reads join it instead of issuing another call; once it
//! resolves successfully it doubles as the cached value. Failed reads are
//! evicted so the next read retries.
//!
//! The backing call runs on its own task, so it settles (and a failure is
//! evicted) even when every caller stops waiting.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use vft_crypto::{is_valid_address, normalize_address};
use vft_types::{Address, TokenAmount, TokenError};

use crate::channel::{decode_amount, QueryMethod, RemoteChannel};
use crate::error::ChannelError;

type SharedBalance = Shared<BoxFuture<'static, Result<TokenAmount, ChannelError>>>;

/// What a consumer can render for an address's balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalanceState {
    /// The address is not valid (or was never read); no read was issued.
    Undetermined,
    /// A read is in flight.
    Loading,
    Ready(TokenAmount),
    /// The read failed; the reason is displayable.
    Failed(String),
}

impl BalanceState {
    pub fn amount(&self) -> Option<&TokenAmount> {
        match self {
            Self::Ready(amount) => Some(amount),
            _ => None,
        }
    }
}

struct Entry {
    generation: u64,
    read: SharedBalance,
    settled: Option<TokenAmount>,
}

type Entries = Arc<Mutex<HashMap<Address, Entry>>>;

/// Read path for single-account balances.
pub struct BalanceQueryCache<C> {
    channel: Arc<C>,
    entries: Entries,
    generation: AtomicU64,
}

impl<C: RemoteChannel> BalanceQueryCache<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            channel,
            entries: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether reads for `input` are enabled at all.
    pub fn is_enabled(input: &str) -> bool {
        is_valid_address(input)
    }

    /// Cached read. Disabled inputs yield [`BalanceState::Undetermined`]
    /// without touching the channel; failures come back as
    /// [`BalanceState::Failed`].
    pub async fn read(&self, input: &str) -> BalanceState {
        let Ok(address) = normalize_address(input) else {
            return BalanceState::Undetermined;
        };
        match self.fetch(address, false).await {
            Ok(amount) => BalanceState::Ready(amount),
            Err(err) => BalanceState::Failed(err.to_string()),
        }
    }

    /// Manual "check balance": skips a completed cached value and reads
    /// again, but still joins a read already in flight for the same account.
    pub async fn check(&self, input: &str) -> Result<TokenAmount, TokenError> {
        let address = normalize_address(input)?;
        self.fetch(address, true)
            .await
            .map_err(|err| err.into_token_error("failed to check balance"))
    }

    /// Current state without issuing a read. A failed read is evicted, so it
    /// shows as `Undetermined` once it has settled.
    pub fn state(&self, input: &str) -> BalanceState {
        let Ok(address) = normalize_address(input) else {
            return BalanceState::Undetermined;
        };
        let entries = self.entries.lock().unwrap();
        match entries.get(&address) {
            None => BalanceState::Undetermined,
            Some(Entry {
                settled: Some(amount),
                ..
            }) => BalanceState::Ready(amount.clone()),
            Some(_) => BalanceState::Loading,
        }
    }

    /// Drop the cached balance of one account; the next read goes remote.
    pub fn invalidate(&self, address: &Address) {
        if self.entries.lock().unwrap().remove(address).is_some() {
            debug!(%address, "balance invalidated");
        }
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().unwrap().clear();
    }

    async fn fetch(&self, address: Address, refresh: bool) -> Result<TokenAmount, ChannelError> {
        let read = {
            let mut entries = self.entries.lock().unwrap();
            let reusable = entries
                .get(&address)
                .filter(|entry| !refresh || entry.settled.is_none())
                .map(|entry| entry.read.clone());
            match reusable {
                Some(existing) => {
                    debug!(%address, "joining balance read");
                    existing
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let read = self.spawn_read(address, generation);
                    entries.insert(
                        address,
                        Entry {
                            generation,
                            read: read.clone(),
                            settled: None,
                        },
                    );
                    read
                }
            }
        };
        read.await
    }

    /// Start the backing call. The task settles its own entry, matched by
    /// `generation` so a newer read for the same account is left alone.
    fn spawn_read(&self, address: Address, generation: u64) -> SharedBalance {
        let channel = self.channel.clone();
        let entries = self.entries.clone();
        let task = tokio::spawn(async move {
            let result = match channel
                .query(QueryMethod::BalanceOf, vec![Value::String(address.to_hex())])
                .await
            {
                Ok(value) => decode_amount(QueryMethod::BalanceOf, value),
                Err(err) => Err(err),
            };

            let mut entries = entries.lock().unwrap();
            let current = entries
                .get(&address)
                .is_some_and(|entry| entry.generation == generation);
            match &result {
                Ok(amount) => {
                    if let Some(entry) = entries.get_mut(&address).filter(|_| current) {
                        entry.settled = Some(amount.clone());
                    }
                }
                Err(err) => {
                    warn!(%address, %err, "balance read failed");
                    if current {
                        entries.remove(&address);
                    }
                }
            }
            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|err| {
                Err(ChannelError::Unavailable(format!("balance read did not finish: {err}")))
            })
        })
        .boxed()
        .shared()
    }
}
