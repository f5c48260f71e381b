//! Nullable remote channel — scripted responses, recorded calls.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::watch;
use vft_client::{ChannelError, QueryMethod, RemoteChannel};
use vft_types::{Operation, Receipt};

/// A remote channel that answers from a script.
///
/// Calls are recorded as soon as they arrive, then wait while the channel is
/// held (see [`hold`](Self::hold)), so tests can observe how many calls are
/// in flight at once.
pub struct NullChannel {
    query_script: Mutex<HashMap<QueryMethod, VecDeque<Result<Value, ChannelError>>>>,
    query_fallback: Mutex<HashMap<QueryMethod, Result<Value, ChannelError>>>,
    submit_script: Mutex<VecDeque<Result<Receipt, ChannelError>>>,
    queries: Mutex<Vec<(QueryMethod, Vec<Value>)>>,
    submissions: Mutex<Vec<(Operation, Vec<Value>)>>,
    gate: watch::Sender<bool>,
    query_gate: watch::Sender<bool>,
}

impl NullChannel {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let (query_gate, _) = watch::channel(true);
        Self {
            query_script: Mutex::new(HashMap::new()),
            query_fallback: Mutex::new(HashMap::new()),
            submit_script: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            gate,
            query_gate,
        }
    }

    /// Answer every `method` query with `value` unless a one-shot
    /// response is queued.
    pub fn respond(&self, method: QueryMethod, value: Value) -> &Self {
        self.query_fallback.lock().unwrap().insert(method, Ok(value));
        self
    }

    /// Queue a one-shot response for the next `method` query.
    pub fn respond_once(&self, method: QueryMethod, response: Result<Value, ChannelError>) -> &Self {
        self.query_script
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(response);
        self
    }

    /// Fail every `method` query unless a one-shot response is queued.
    pub fn fail(&self, method: QueryMethod, error: ChannelError) -> &Self {
        self.query_fallback.lock().unwrap().insert(method, Err(error));
        self
    }

    /// Queue the outcome of the next submission. Unscripted submissions
    /// succeed with an empty receipt.
    pub fn submit_outcome(&self, outcome: Result<Receipt, ChannelError>) -> &Self {
        self.submit_script.lock().unwrap().push_back(outcome);
        self
    }

    /// Make subsequent and in-flight calls wait until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Like [`hold`](Self::hold), but only queries wait; submissions pass.
    pub fn hold_queries(&self) {
        self.query_gate.send_replace(false);
    }

    pub fn release_queries(&self) {
        self.query_gate.send_replace(true);
    }

    /// All queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<(QueryMethod, Vec<Value>)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self, method: QueryMethod) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| *m == method)
            .count()
    }

    /// All submissions received so far, in arrival order.
    pub fn submissions(&self) -> Vec<(Operation, Vec<Value>)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    /// Clear recorded calls; scripts are kept.
    pub fn reset_calls(&self) {
        self.queries.lock().unwrap().clear();
        self.submissions.lock().unwrap().clear();
    }

    async fn pass_gate(gate: &watch::Sender<bool>) {
        let mut open = gate.subscribe();
        // The sender outlives this borrow, so the channel cannot close here.
        let _ = open.wait_for(|open| *open).await;
    }
}

impl Default for NullChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteChannel for NullChannel {
    async fn submit(&self, operation: Operation, args: Vec<Value>) -> Result<Receipt, ChannelError> {
        self.submissions.lock().unwrap().push((operation, args));
        Self::pass_gate(&self.gate).await;
        self.submit_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Receipt::default()))
    }

    async fn query(&self, method: QueryMethod, args: Vec<Value>) -> Result<Value, ChannelError> {
        self.queries.lock().unwrap().push((method, args));
        Self::pass_gate(&self.gate).await;
        Self::pass_gate(&self.query_gate).await;
        if let Some(response) = self
            .query_script
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }
        self.query_fallback
            .lock()
            .unwrap()
            .get(&method)
            .cloned()
            .unwrap_or_else(|| {
                Err(ChannelError::Unavailable(format!("no response scripted for {method}")))
            })
    }
}
