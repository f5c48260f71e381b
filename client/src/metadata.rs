//! Token metadata: name, symbol, decimals, total supply.
//!
//! Name, symbol and decimals are fixed for the lifetime of a token and are
//! loaded once. Total supply changes with every mint and burn and is the only
//! refetchable field; overlapping refetches share a single backing call.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use vft_types::{TokenAmount, TokenMetadata};

use crate::channel::{decode_amount, decode_decimals, decode_string, QueryMethod, RemoteChannel};
use crate::error::ChannelError;

type SharedSupply = Shared<BoxFuture<'static, Result<TokenAmount, ChannelError>>>;

/// Counts a backing request as outstanding until dropped.
struct Outstanding(Arc<AtomicUsize>);

impl Outstanding {
    fn begin(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for Outstanding {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The refetch in flight, tagged so its task clears only its own slot.
struct Refetch {
    generation: u64,
    supply: SharedSupply,
}

pub struct MetadataQueryCache<C> {
    channel: Arc<C>,
    fields: Arc<Mutex<TokenMetadata>>,
    outstanding: Arc<AtomicUsize>,
    refetch: Arc<Mutex<Option<Refetch>>>,
    generation: AtomicU64,
}

impl<C: RemoteChannel> MetadataQueryCache<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            channel,
            fields: Arc::new(Mutex::new(TokenMetadata::default())),
            outstanding: Arc::new(AtomicUsize::new(0)),
            refetch: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// The fields loaded so far.
    pub fn snapshot(&self) -> TokenMetadata {
        self.fields.lock().unwrap().clone()
    }

    /// True while any field's backing request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }

    /// Fetch all four fields concurrently. Each field is stored as soon as its
    /// own read succeeds; a failed field stays unloaded.
    pub async fn load(&self) -> TokenMetadata {
        let name = async {
            if let Some(name) = self.fetch_field(QueryMethod::Name, decode_string).await {
                self.fields.lock().unwrap().name = Some(name);
            }
        };
        let symbol = async {
            if let Some(symbol) = self.fetch_field(QueryMethod::Symbol, decode_string).await {
                self.fields.lock().unwrap().symbol = Some(symbol);
            }
        };
        let decimals = async {
            if let Some(decimals) = self.fetch_field(QueryMethod::Decimals, decode_decimals).await {
                self.fields.lock().unwrap().decimals = Some(decimals);
            }
        };
        let total_supply = async {
            // Joins a concurrent refetch rather than racing it.
            let _ = self.refetch_total_supply().await;
        };
        futures_util::join!(name, symbol, decimals, total_supply);
        self.snapshot()
    }

    /// Refetch total supply. Calls made while a refetch is outstanding join
    /// it and observe the same result. The call runs on its own task and
    /// completes even if every caller stops waiting.
    pub async fn refetch_total_supply(&self) -> Result<TokenAmount, ChannelError> {
        let supply = {
            let mut slot = self.refetch.lock().unwrap();
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("joining total supply refetch");
                    in_flight.supply.clone()
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let supply = self.spawn_refetch(generation);
                    *slot = Some(Refetch {
                        generation,
                        supply: supply.clone(),
                    });
                    supply
                }
            }
        };
        supply.await
    }

    fn spawn_refetch(&self, generation: u64) -> SharedSupply {
        let channel = self.channel.clone();
        let fields = self.fields.clone();
        let slot = self.refetch.clone();
        let outstanding = Outstanding::begin(&self.outstanding);
        let task = tokio::spawn(async move {
            let _outstanding = outstanding;
            let result = match channel.query(QueryMethod::TotalSupply, Vec::new()).await {
                Ok(value) => decode_amount(QueryMethod::TotalSupply, value),
                Err(err) => Err(err),
            };
            match &result {
                Ok(supply) => fields.lock().unwrap().total_supply = Some(supply.clone()),
                Err(err) => warn!(%err, "total supply refetch failed"),
            }

            let mut slot = slot.lock().unwrap();
            if slot.as_ref().is_some_and(|r| r.generation == generation) {
                *slot = None;
            }
            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|err| {
                Err(ChannelError::Unavailable(format!("total supply refetch did not finish: {err}")))
            })
        })
        .boxed()
        .shared()
    }

    async fn fetch_field<T>(
        &self,
        method: QueryMethod,
        decode: fn(QueryMethod, Value) -> Result<T, ChannelError>,
    ) -> Option<T> {
        let _outstanding = Outstanding::begin(&self.outstanding);
        let result = match self.channel.query(method, Vec::new()).await {
            Ok(value) => decode(method, value),
            Err(err) => Err(err),
        };
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%method, %err, "metadata read failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockRemoteChannel;
    use mockall::predicate::*;
    use serde_json::json;

    #[tokio::test]
    async fn load_fills_every_field() {
        let mut channel = MockRemoteChannel::new();
        channel
            .expect_query()
            .returning(|method, _| match method {
                QueryMethod::Name => Ok(json!("Vara Token")),
                QueryMethod::Symbol => Ok(json!("VFT")),
                QueryMethod::Decimals => Ok(json!(12)),
                QueryMethod::TotalSupply => Ok(json!("1000000")),
                QueryMethod::BalanceOf => unreachable!(),
            });
        let cache = MetadataQueryCache::new(Arc::new(channel));
        assert_eq!(cache.snapshot(), TokenMetadata::default());

        let metadata = cache.load().await;
        assert_eq!(metadata.name.as_deref(), Some("Vara Token"));
        assert_eq!(metadata.symbol.as_deref(), Some("VFT"));
        assert_eq!(metadata.decimals, Some(12));
        assert_eq!(metadata.total_supply, Some(TokenAmount::from(1_000_000u64)));
        assert!(metadata.is_complete());
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn failed_field_stays_unloaded() {
        let mut channel = MockRemoteChannel::new();
        channel.expect_query().returning(|method, _| match method {
            QueryMethod::Symbol => Err(ChannelError::Unavailable("down".into())),
            QueryMethod::Decimals => Ok(json!("not a number")),
            _ => Ok(json!("7")),
        });
        let cache = MetadataQueryCache::new(Arc::new(channel));

        let metadata = cache.load().await;
        assert_eq!(metadata.name.as_deref(), Some("7"));
        assert_eq!(metadata.symbol, None);
        assert_eq!(metadata.decimals, None);
        assert_eq!(metadata.total_supply, Some(TokenAmount::from(7u64)));
        assert!(!metadata.is_complete());
    }

    #[tokio::test]
    async fn refetch_updates_only_total_supply() {
        let mut channel = MockRemoteChannel::new();
        channel
            .expect_query()
            .with(eq(QueryMethod::TotalSupply), always())
            .times(2)
            .returning(|_, _| Ok(json!("10")));
        let cache = MetadataQueryCache::new(Arc::new(channel));

        assert_eq!(cache.refetch_total_supply().await.unwrap(), TokenAmount::from(10u64));
        // The first refetch has completed, so this one issues a new call.
        cache.refetch_total_supply().await.unwrap();
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.total_supply, Some(TokenAmount::from(10u64)));
        assert_eq!(snapshot.name, None);
    }

    #[tokio::test]
    async fn abandoned_refetch_still_completes() {
        let mut channel = MockRemoteChannel::new();
        channel
            .expect_query()
            .with(eq(QueryMethod::TotalSupply), always())
            .times(2)
            .returning(|_, _| Ok(json!("33")));
        let cache = MetadataQueryCache::new(Arc::new(channel));

        assert!(cache.refetch_total_supply().now_or_never().is_none());
        assert!(cache.is_loading());

        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        assert!(!cache.is_loading());
        assert_eq!(cache.snapshot().total_supply, Some(TokenAmount::from(33u64)));

        // Settled, so the next refetch goes remote again.
        cache.refetch_total_supply().await.unwrap();
    }
}
