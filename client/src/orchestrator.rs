//! Mint, burn and transfer orchestration.
//!
//! One [`TransactionOrchestrator`] per operation. [`TransactionOrchestrator::submit`]
//! is deliberately not `async`: every precondition is checked and the
//! instance moves to `Pending` before it returns, so a second submission is
//! refused with [`TokenError::AlreadyPending`] even if the first future has
//! not been polled yet. Awaiting the returned future issues exactly one
//! remote submission.
//!
//! Dropping the future abandons only the local wait. If the submission had
//! already left, the ledger may still apply it; the effect then shows up
//! later through events and refreshed reads.

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use vft_crypto::normalize_address;
use vft_types::{Address, Operation, Receipt, TokenAmount, TokenError, TransactionRequest, TransactionState};

use crate::account::{Account, AccountProvider};
use crate::balance::BalanceQueryCache;
use crate::channel::RemoteChannel;
use crate::metadata::MetadataQueryCache;
use crate::notify::NotificationSink;

/// A submission that has passed its preconditions and is waiting to run.
pub type PendingTransaction = BoxFuture<'static, Result<Receipt, TokenError>>;

/// Failure reason recorded when a pending future is dropped unresolved.
pub const ABANDONED: &str = "abandoned before completion; the ledger may still apply it";

pub struct TransactionOrchestrator<C, A> {
    operation: Operation,
    channel: Arc<C>,
    accounts: Arc<A>,
    state: Arc<Mutex<TransactionState>>,
    metadata: Option<Arc<MetadataQueryCache<C>>>,
    balances: Option<Arc<BalanceQueryCache<C>>>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl<C: RemoteChannel, A: AccountProvider> TransactionOrchestrator<C, A> {
    pub fn new(operation: Operation, channel: Arc<C>, accounts: Arc<A>) -> Self {
        Self {
            operation,
            channel,
            accounts,
            state: Arc::new(Mutex::new(TransactionState::Idle)),
            metadata: None,
            balances: None,
            notifier: None,
        }
    }

    /// Refetch total supply from this cache after a successful mint or burn.
    pub fn with_metadata(mut self, metadata: Arc<MetadataQueryCache<C>>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Invalidate affected balances in this cache after a success.
    pub fn with_balances(mut self, balances: Arc<BalanceQueryCache<C>>) -> Self {
        self.balances = Some(balances);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn state(&self) -> TransactionState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().is_pending()
    }

    /// Return a resolved instance to `Idle`. Has no effect while pending.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        if state.is_resolved() {
            *state = TransactionState::Idle;
        }
    }

    /// Validate a submission and, if it passes, move to `Pending`.
    ///
    /// `recipient` is required for transfers. For mint and burn it defaults
    /// to the active account. Every error except `AlreadyPending` is also
    /// recorded as the `Failed` state; none of them reaches the channel.
    pub fn submit(
        &self,
        recipient: Option<&str>,
        amount: &str,
    ) -> Result<PendingTransaction, TokenError> {
        let mut state = self.state.lock().unwrap();
        if state.is_pending() {
            debug!(operation = %self.operation, "submission refused: already pending");
            return Err(TokenError::AlreadyPending);
        }

        match self.prepare(recipient, amount) {
            Ok((sender, request)) => {
                *state = TransactionState::Pending;
                drop(state);
                Ok(self.run(sender, request))
            }
            Err(err) => {
                *state = TransactionState::Failed(err.to_string());
                drop(state);
                warn!(operation = %self.operation, %err, "submission rejected locally");
                if let Some(notifier) = &self.notifier {
                    notifier.error(&err.to_string());
                }
                Err(err)
            }
        }
    }

    fn prepare(
        &self,
        recipient: Option<&str>,
        amount: &str,
    ) -> Result<(Account, TransactionRequest), TokenError> {
        let sender = self.accounts.active_account().ok_or(TokenError::NoAccount)?;

        let recipient = match recipient {
            Some(input) => Some(normalize_address(input)?),
            None if self.operation == Operation::Transfer => {
                return Err(TokenError::InvalidAddress("recipient is required".into()));
            }
            None => None,
        };
        let amount = TokenAmount::parse_positive(amount)?;

        if self.operation == Operation::Transfer && recipient == Some(sender.decoded) {
            return Err(TokenError::SelfTransfer);
        }

        Ok((
            sender,
            TransactionRequest {
                operation: self.operation,
                recipient,
                amount,
            },
        ))
    }

    fn run(&self, sender: Account, request: TransactionRequest) -> PendingTransaction {
        let channel = self.channel.clone();
        let metadata = self.metadata.clone();
        let balances = self.balances.clone();
        let notifier = self.notifier.clone();
        let mut resolution = Resolution::new(self.state.clone());

        async move {
            let operation = request.operation;
            let target = request.target(&sender.decoded);
            debug!(%operation, %target, amount = %request.amount, "submitting");

            match channel.submit(operation, call_args(&request, &sender.decoded)).await {
                Ok(receipt) => {
                    info!(%operation, %target, amount = %request.amount, block = ?receipt.block_hash, "submission accepted");
                    resolution.resolve(TransactionState::Succeeded);

                    // Detached, so a caller that stops waiting cannot cut it short.
                    let follow_up = tokio::spawn(after_success(
                        operation,
                        [sender.decoded, target],
                        metadata,
                        balances,
                        notifier,
                    ));
                    if let Err(err) = follow_up.await {
                        warn!(%operation, %err, "post-success follow-up did not finish");
                    }
                    Ok(receipt)
                }
                Err(err) => {
                    let err = err.into_token_error(operation.fallback_failure());
                    warn!(%operation, %err, "submission failed");
                    resolution.resolve(TransactionState::Failed(err.to_string()));
                    if let Some(notifier) = &notifier {
                        notifier.error(&err.to_string());
                    }
                    Err(err)
                }
            }
        }
        .boxed()
    }
}

/// Refresh what a successful submission changed, then tell the user.
async fn after_success<C: RemoteChannel>(
    operation: Operation,
    touched: [Address; 2],
    metadata: Option<Arc<MetadataQueryCache<C>>>,
    balances: Option<Arc<BalanceQueryCache<C>>>,
    notifier: Option<Arc<dyn NotificationSink>>,
) {
    if let (Operation::Mint | Operation::Burn, Some(metadata)) = (operation, &metadata) {
        if let Err(err) = metadata.refetch_total_supply().await {
            warn!(%operation, %err, "total supply refresh after success failed");
        }
    }
    if let Some(balances) = &balances {
        for account in &touched {
            balances.invalidate(account);
        }
    }
    if let Some(notifier) = &notifier {
        notifier.success(success_message(operation));
    }
}

/// Arguments of the program call: target account, then amount.
fn call_args(request: &TransactionRequest, sender: &Address) -> Vec<Value> {
    vec![
        Value::String(request.target(sender).to_hex()),
        Value::String(request.amount.to_string()),
    ]
}

fn success_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Mint => "Mint success!",
        Operation::Burn => "Burn success!",
        Operation::Transfer => "Transfer success!",
    }
}

/// Writes the terminal state of one submission. If the submission future is
/// dropped first, records it as abandoned so the instance accepts new work.
struct Resolution {
    state: Arc<Mutex<TransactionState>>,
    resolved: bool,
}

impl Resolution {
    fn new(state: Arc<Mutex<TransactionState>>) -> Self {
        Self {
            state,
            resolved: false,
        }
    }

    fn resolve(&mut self, outcome: TransactionState) {
        *self.state.lock().unwrap() = outcome;
        self.resolved = true;
    }
}

impl Drop for Resolution {
    fn drop(&mut self) {
        if !self.resolved {
            *self.state.lock().unwrap() = TransactionState::Failed(ABANDONED.to_string());
        }
    }
}
