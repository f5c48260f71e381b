//! Event subscription and per-kind callback dispatch.
//!
//! The reconciler holds at most one subscription, scoped to the program id.
//! Each incoming [`TokenEvent`] goes through a single `match` to the callback
//! registered for its kind. Events arrive in transport order and are never
//! buffered or replayed; a failing or panicking callback is logged and does
//! not affect later events.

use async_trait::async_trait;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use vft_types::{
    ApprovalEvent, BurnedEvent, EventKind, MintedEvent, ProgramId, TokenEvent, TransferEvent,
};

use crate::error::ChannelError;

/// Receives every event delivered on a subscription.
pub type EventHandler = Arc<dyn Fn(TokenEvent) + Send + Sync>;

type Callback<E> = Box<dyn Fn(E) -> anyhow::Result<()> + Send + Sync>;

/// Live subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// A subscription whose release runs `release` exactly once.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release now rather than at drop.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Source of program events.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Start delivering events of `program_id` to `handler` until the
    /// returned [`Subscription`] is dropped.
    async fn subscribe(
        &self,
        program_id: ProgramId,
        handler: EventHandler,
    ) -> Result<Subscription, ChannelError>;
}

/// Up to one callback per event kind.
#[derive(Default)]
pub struct TokenEventCallbacks {
    on_minted: Option<Callback<MintedEvent>>,
    on_burned: Option<Callback<BurnedEvent>>,
    on_transfer: Option<Callback<TransferEvent>>,
    on_approval: Option<Callback<ApprovalEvent>>,
}

impl TokenEventCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_minted(
        mut self,
        callback: impl Fn(MintedEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_minted = Some(Box::new(callback));
        self
    }

    pub fn on_burned(
        mut self,
        callback: impl Fn(BurnedEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_burned = Some(Box::new(callback));
        self
    }

    pub fn on_transfer(
        mut self,
        callback: impl Fn(TransferEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_transfer = Some(Box::new(callback));
        self
    }

    pub fn on_approval(
        mut self,
        callback: impl Fn(ApprovalEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.on_approval = Some(Box::new(callback));
        self
    }

    /// Route `event` to the callback for its kind, if one is registered.
    pub fn dispatch(&self, event: TokenEvent) {
        let kind = event.kind();
        match event {
            TokenEvent::Minted(payload) => invoke(kind, self.on_minted.as_ref(), payload),
            TokenEvent::Burned(payload) => invoke(kind, self.on_burned.as_ref(), payload),
            TokenEvent::Transferred(payload) => invoke(kind, self.on_transfer.as_ref(), payload),
            TokenEvent::Approved(payload) => invoke(kind, self.on_approval.as_ref(), payload),
        }
    }
}

fn invoke<E>(kind: EventKind, callback: Option<&Callback<E>>, payload: E) {
    let Some(callback) = callback else {
        debug!(%kind, "no callback registered");
        return;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| callback(payload))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(%kind, error = %err, "event callback failed"),
        Err(_) => warn!(%kind, "event callback panicked"),
    }
}

fn observe(observer: &EventHandler, event: TokenEvent) {
    let kind = event.kind();
    if panic::catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
        warn!(%kind, "event observer panicked");
    }
}

/// Keeps local state in step with program events.
pub struct EventReconciler<T> {
    transport: Arc<T>,
    program_id: ProgramId,
    callbacks: Arc<TokenEventCallbacks>,
    observer: Option<EventHandler>,
    subscription: Mutex<Option<Subscription>>,
    activating: tokio::sync::Mutex<()>,
}

impl<T: EventTransport> EventReconciler<T> {
    pub fn new(transport: Arc<T>, program_id: ProgramId, callbacks: TokenEventCallbacks) -> Self {
        Self {
            transport,
            program_id,
            callbacks: Arc::new(callbacks),
            observer: None,
            subscription: Mutex::new(None),
            activating: tokio::sync::Mutex::new(()),
        }
    }

    /// Also hand every event to `observer`, before the per-kind callback.
    pub fn with_observer(mut self, observer: EventHandler) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub fn is_active(&self) -> bool {
        self.subscription.lock().unwrap().is_some()
    }

    /// Subscribe to the program's events. Does nothing if already active;
    /// concurrent calls wait for the first and then find it active.
    pub async fn activate(&self) -> Result<(), ChannelError> {
        let _activating = self.activating.lock().await;
        if self.is_active() {
            return Ok(());
        }

        let callbacks = self.callbacks.clone();
        let observer = self.observer.clone();
        let handler: EventHandler = Arc::new(move |event: TokenEvent| {
            if let Some(observer) = &observer {
                observe(observer, event.clone());
            }
            callbacks.dispatch(event);
        });

        let subscription = self.transport.subscribe(self.program_id, handler).await?;
        *self.subscription.lock().unwrap() = Some(subscription);
        info!(program_id = %self.program_id, "subscribed to program events");
        Ok(())
    }

    /// Release the subscription, if any.
    pub fn deactivate(&self) {
        let released = self.subscription.lock().unwrap().take();
        if let Some(subscription) = released {
            subscription.unsubscribe();
            info!(program_id = %self.program_id, "unsubscribed from program events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vft_types::{Address, TokenAmount};

    /// Records the handler and counts live subscriptions.
    #[derive(Default)]
    struct Recording {
        handler: Mutex<Option<EventHandler>>,
        subscribes: AtomicUsize,
        live: Arc<AtomicUsize>,
    }

    impl Recording {
        fn emit(&self, event: TokenEvent) {
            let handler = self.handler.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(event);
            }
        }
    }

    #[async_trait]
    impl EventTransport for Recording {
        async fn subscribe(
            &self,
            _program_id: ProgramId,
            handler: EventHandler,
        ) -> Result<Subscription, ChannelError> {
            tokio::task::yield_now().await;
            self.subscribes.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            *self.handler.lock().unwrap() = Some(handler);
            let live = self.live.clone();
            Ok(Subscription::new(move || {
                live.fetch_sub(1, Ordering::SeqCst);
            }))
        }
    }

    fn transfer() -> TokenEvent {
        TokenEvent::Transferred(TransferEvent {
            from: Address::new([1; 32]),
            to: Address::new([2; 32]),
            amount: TokenAmount::from(5u64),
        })
    }

    fn minted() -> TokenEvent {
        TokenEvent::Minted(MintedEvent {
            owner: Address::new([1; 32]),
            amount: TokenAmount::from(1u64),
        })
    }

    #[test]
    fn transfer_fires_only_on_transfer() {
        fn record<E>(
            hits: &Arc<Mutex<Vec<&'static str>>>,
            name: &'static str,
        ) -> impl Fn(E) -> anyhow::Result<()> + Send + Sync + 'static {
            let hits = hits.clone();
            move |_| {
                hits.lock().unwrap().push(name);
                Ok(())
            }
        }

        let hits = Arc::new(Mutex::new(Vec::new()));
        let callbacks = TokenEventCallbacks::new()
            .on_minted(record(&hits, "minted"))
            .on_burned(record(&hits, "burned"))
            .on_transfer(record(&hits, "transfer"))
            .on_approval(record(&hits, "approval"));

        callbacks.dispatch(transfer());
        assert_eq!(*hits.lock().unwrap(), vec!["transfer"]);
    }

    #[test]
    fn failing_callbacks_are_isolated() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let callbacks = TokenEventCallbacks::new()
            .on_minted(|_| anyhow::bail!("ui gone"))
            .on_burned(|_| panic!("boom"))
            .on_transfer(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        callbacks.dispatch(minted());
        callbacks.dispatch(TokenEvent::Burned(BurnedEvent {
            owner: Address::new([1; 32]),
            amount: TokenAmount::from(1u64),
        }));
        callbacks.dispatch(transfer());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn activate_is_idempotent_and_drop_releases() {
        let transport = Arc::new(Recording::default());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let reconciler = EventReconciler::new(
            transport.clone(),
            Address::new([9; 32]),
            TokenEventCallbacks::new().on_transfer(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        reconciler.activate().await.unwrap();
        reconciler.activate().await.unwrap();
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 1);
        assert!(reconciler.is_active());

        transport.emit(transfer());
        transport.emit(minted());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(reconciler);
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deactivate_releases_and_allows_reactivation() {
        let transport = Arc::new(Recording::default());
        let reconciler =
            EventReconciler::new(transport.clone(), Address::new([9; 32]), TokenEventCallbacks::new());

        reconciler.activate().await.unwrap();
        reconciler.deactivate();
        assert!(!reconciler.is_active());
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);

        reconciler.activate().await.unwrap();
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 2);
        assert_eq!(transport.live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_activations_subscribe_once() {
        let transport = Arc::new(Recording::default());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let reconciler = EventReconciler::new(
            transport.clone(),
            Address::new([9; 32]),
            TokenEventCallbacks::new().on_transfer(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        let (first, second) = tokio::join!(reconciler.activate(), reconciler.activate());
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(transport.subscribes.load(Ordering::SeqCst), 1);
        assert_eq!(transport.live.load(Ordering::SeqCst), 1);

        transport.emit(transfer());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_observer_does_not_stop_callbacks() {
        let transport = Arc::new(Recording::default());
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let reconciler = EventReconciler::new(
            transport.clone(),
            Address::new([9; 32]),
            TokenEventCallbacks::new().on_transfer(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .with_observer(Arc::new(|_: TokenEvent| panic!("cache lock poisoned")));

        reconciler.activate().await.unwrap();
        transport.emit(transfer());
        transport.emit(transfer());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn observer_sees_every_event() {
        let transport = Arc::new(Recording::default());
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = kinds.clone();
        let reconciler =
            EventReconciler::new(transport.clone(), Address::new([9; 32]), TokenEventCallbacks::new())
                .with_observer(Arc::new(move |event: TokenEvent| {
                    sink.lock().unwrap().push(event.kind());
                }));

        reconciler.activate().await.unwrap();
        transport.emit(minted());
        transport.emit(transfer());
        assert_eq!(
            *kinds.lock().unwrap(),
            vec![EventKind::Minted, EventKind::Transferred]
        );
    }
}
