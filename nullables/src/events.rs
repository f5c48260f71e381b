//! Nullable event transport — events are emitted by the test.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vft_client::{ChannelError, EventHandler, EventTransport, Subscription};
use vft_types::{ProgramId, TokenEvent};

type Registry = Arc<Mutex<Vec<(u64, ProgramId, EventHandler)>>>;

/// An in-memory event transport.
///
/// [`emit`](Self::emit) delivers synchronously to every live subscription
/// for the event's program, in subscription order.
#[derive(Default)]
pub struct NullEventTransport {
    subscribers: Registry,
    next_id: AtomicU64,
    subscribe_calls: AtomicUsize,
    fail_next: Mutex<Option<ChannelError>>,
}

impl NullEventTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` as if `program_id` had emitted it. Returns how many
    /// subscriptions received it.
    pub fn emit(&self, program_id: ProgramId, event: TokenEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, program, _)| *program == program_id)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler(event.clone());
        }
        handlers.len()
    }

    /// Make the next `subscribe` call fail with `error`.
    pub fn fail_next_subscribe(&self, error: ChannelError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// Number of subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Number of `subscribe` calls, including failed ones.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventTransport for NullEventTransport {
    async fn subscribe(
        &self,
        program_id: ProgramId,
        handler: EventHandler,
    ) -> Result<Subscription, ChannelError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers
            .lock()
            .unwrap()
            .push((id, program_id, handler));

        let subscribers = self.subscribers.clone();
        Ok(Subscription::new(move || {
            subscribers.lock().unwrap().retain(|(entry, _, _)| *entry != id);
        }))
    }
}
