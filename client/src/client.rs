//! The client facade: one program, one account provider, everything wired.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use vft_types::{Operation, ProgramId, TokenError, TokenEvent, TokenMetadata};

use crate::account::{Account, AccountProvider};
use crate::balance::{BalanceQueryCache, BalanceState};
use crate::channel::RemoteChannel;
use crate::events::{EventReconciler, EventTransport, TokenEventCallbacks};
use crate::metadata::MetadataQueryCache;
use crate::notify::NotificationSink;
use crate::orchestrator::{PendingTransaction, TransactionOrchestrator};

/// Default amount for mint and burn when the caller gives none.
pub const DEFAULT_AMOUNT: &str = "1000";

/// Token client for one program.
///
/// Owns the two read caches and one orchestrator per operation. A
/// successful mint or burn refreshes total supply; every success and every
/// incoming event invalidates the balances it touches.
pub struct TokenClient<C, A, T> {
    program_id: ProgramId,
    accounts: Arc<A>,
    transport: Arc<T>,
    notifier: Arc<dyn NotificationSink>,
    metadata: Arc<MetadataQueryCache<C>>,
    balances: Arc<BalanceQueryCache<C>>,
    mint: TransactionOrchestrator<C, A>,
    burn: TransactionOrchestrator<C, A>,
    transfer: TransactionOrchestrator<C, A>,
    mint_amount: String,
    burn_amount: String,
}

impl<C, A, T> TokenClient<C, A, T>
where
    C: RemoteChannel,
    A: AccountProvider,
    T: EventTransport,
{
    pub fn new(
        program_id: ProgramId,
        channel: Arc<C>,
        accounts: Arc<A>,
        transport: Arc<T>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let metadata = Arc::new(MetadataQueryCache::new(channel.clone()));
        let balances = Arc::new(BalanceQueryCache::new(channel.clone()));
        let orchestrator = |operation| {
            TransactionOrchestrator::new(operation, channel.clone(), accounts.clone())
                .with_metadata(metadata.clone())
                .with_balances(balances.clone())
                .with_notifier(notifier.clone())
        };
        let mint = orchestrator(Operation::Mint);
        let burn = orchestrator(Operation::Burn);
        let transfer = orchestrator(Operation::Transfer);

        Self {
            program_id,
            accounts,
            transport,
            notifier,
            metadata,
            balances,
            mint,
            burn,
            transfer,
            mint_amount: DEFAULT_AMOUNT.to_string(),
            burn_amount: DEFAULT_AMOUNT.to_string(),
        }
    }

    /// Override the amounts used by [`mint`](Self::mint) and
    /// [`burn`](Self::burn) when none is given.
    pub fn with_default_amounts(mut self, mint: impl Into<String>, burn: impl Into<String>) -> Self {
        self.mint_amount = mint.into();
        self.burn_amount = burn.into();
        self
    }

    pub fn program_id(&self) -> ProgramId {
        self.program_id
    }

    pub fn active_account(&self) -> Option<Account> {
        self.accounts.active_account()
    }

    pub fn metadata(&self) -> &MetadataQueryCache<C> {
        &self.metadata
    }

    pub async fn load_metadata(&self) -> TokenMetadata {
        self.metadata.load().await
    }

    pub fn balances(&self) -> &BalanceQueryCache<C> {
        &self.balances
    }

    pub async fn balance_of(&self, address: &str) -> BalanceState {
        self.balances.read(address).await
    }

    /// Balance of the active account; `Undetermined` when none is connected.
    pub async fn own_balance(&self) -> BalanceState {
        match self.accounts.active_account() {
            Some(account) => self.balances.read(&account.decoded.to_hex()).await,
            None => BalanceState::Undetermined,
        }
    }

    pub fn orchestrator(&self, operation: Operation) -> &TransactionOrchestrator<C, A> {
        match operation {
            Operation::Mint => &self.mint,
            Operation::Burn => &self.burn,
            Operation::Transfer => &self.transfer,
        }
    }

    /// Mint to the active account.
    pub fn mint(&self, amount: Option<&str>) -> Result<PendingTransaction, TokenError> {
        self.mint.submit(None, amount.unwrap_or(&self.mint_amount))
    }

    /// Burn from the active account.
    pub fn burn(&self, amount: Option<&str>) -> Result<PendingTransaction, TokenError> {
        self.burn.submit(None, amount.unwrap_or(&self.burn_amount))
    }

    pub fn transfer(&self, to: &str, amount: &str) -> Result<PendingTransaction, TokenError> {
        self.transfer.submit(Some(to), amount)
    }

    /// A reconciler for this program that invalidates the balances each event
    /// touches before running `callbacks`. Call `activate` to subscribe.
    pub fn event_reconciler(&self, callbacks: TokenEventCallbacks) -> EventReconciler<T> {
        let balances = self.balances.clone();
        EventReconciler::new(self.transport.clone(), self.program_id, callbacks).with_observer(
            Arc::new(move |event: TokenEvent| {
                for account in event.affected_accounts() {
                    balances.invalidate(&account);
                }
            }),
        )
    }

    /// Callbacks that surface every event as an info notification, e.g.
    /// `Transfer event: {"from":"0x..","to":"0x..","amount":"5"}`.
    pub fn notifying_callbacks(&self) -> TokenEventCallbacks {
        let (minted, burned, transfer, approval) = (
            self.notifier.clone(),
            self.notifier.clone(),
            self.notifier.clone(),
            self.notifier.clone(),
        );
        TokenEventCallbacks::new()
            .on_minted(move |event| announce(&*minted, "Mint", &event))
            .on_burned(move |event| announce(&*burned, "Burn", &event))
            .on_transfer(move |event| announce(&*transfer, "Transfer", &event))
            .on_approval(move |event| announce(&*approval, "Approval", &event))
    }
}

fn announce(
    notifier: &dyn NotificationSink,
    label: &str,
    payload: &impl Serialize,
) -> anyhow::Result<()> {
    let data = serde_json::to_string(payload)?;
    debug!(label, "announcing event");
    notifier.info(&format!("{label} event: {data}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{MockAccountProvider, StaticAccount};
    use crate::channel::{MockRemoteChannel, QueryMethod};
    use crate::error::ChannelError;
    use crate::events::{EventHandler, Subscription};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use vft_types::{Address, Receipt, TokenAmount, TransactionState, TransferEvent};

    const ALICE_SS58: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const BOB_HEX: &str = "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    #[derive(Default)]
    struct Captured(Mutex<Vec<String>>);

    impl NotificationSink for Captured {
        fn info(&self, message: &str) {
            self.0.lock().unwrap().push(format!("info: {message}"));
        }
        fn success(&self, message: &str) {
            self.0.lock().unwrap().push(format!("success: {message}"));
        }
        fn error(&self, message: &str) {
            self.0.lock().unwrap().push(format!("error: {message}"));
        }
    }

    #[derive(Default)]
    struct Loopback(Mutex<Option<EventHandler>>);

    #[async_trait]
    impl EventTransport for Loopback {
        async fn subscribe(
            &self,
            _program_id: ProgramId,
            handler: EventHandler,
        ) -> Result<Subscription, ChannelError> {
            *self.0.lock().unwrap() = Some(handler);
            Ok(Subscription::new(|| {}))
        }
    }

    fn alice() -> Arc<StaticAccount> {
        Arc::new(StaticAccount::new(Some(Account::from_input(ALICE_SS58).unwrap())))
    }

    #[tokio::test]
    async fn mint_uses_default_amount_and_refreshes_supply() {
        let mut channel = MockRemoteChannel::new();
        channel
            .expect_submit()
            .withf(|op, args| *op == Operation::Mint && args[1] == json!("250"))
            .times(1)
            .returning(|_, _| Ok(Receipt::default()));
        channel
            .expect_query()
            .withf(|method, _| *method == QueryMethod::TotalSupply)
            .times(1)
            .returning(|_, _| Ok(json!("250")));
        let notes = Arc::new(Captured::default());
        let client = TokenClient::new(
            Address::new([9; 32]),
            Arc::new(channel),
            alice(),
            Arc::new(Loopback::default()),
            notes.clone(),
        )
        .with_default_amounts("250", "1");

        client.mint(None).unwrap().await.unwrap();
        assert_eq!(
            client.metadata().snapshot().total_supply,
            Some(TokenAmount::from(250u64))
        );
        assert_eq!(
            client.orchestrator(Operation::Mint).state(),
            TransactionState::Succeeded
        );
        assert_eq!(*notes.0.lock().unwrap(), vec!["success: Mint success!"]);
    }

    #[test]
    fn disconnected_wallet_reports_no_account() {
        let mut accounts = MockAccountProvider::new();
        accounts.expect_active_account().returning(|| None);
        let notes = Arc::new(Captured::default());
        let client = TokenClient::new(
            Address::new([9; 32]),
            Arc::new(MockRemoteChannel::new()),
            Arc::new(accounts),
            Arc::new(Loopback::default()),
            notes.clone(),
        );

        assert!(matches!(client.transfer(BOB_HEX, "1"), Err(TokenError::NoAccount)));
        assert_eq!(*notes.0.lock().unwrap(), vec!["error: no account selected"]);
    }

    #[tokio::test]
    async fn events_invalidate_balances_and_notify() {
        let mut channel = MockRemoteChannel::new();
        channel
            .expect_query()
            .withf(|method, _| *method == QueryMethod::BalanceOf)
            .times(2)
            .returning(|_, _| Ok(json!("3")));
        let transport = Arc::new(Loopback::default());
        let notes = Arc::new(Captured::default());
        let client = TokenClient::new(
            Address::new([9; 32]),
            Arc::new(channel),
            alice(),
            transport.clone(),
            notes.clone(),
        );

        client.own_balance().await;
        let reconciler = client.event_reconciler(client.notifying_callbacks());
        reconciler.activate().await.unwrap();

        let handler = transport.0.lock().unwrap().clone().unwrap();
        handler(TokenEvent::Transferred(TransferEvent {
            from: Address::from_hex(ALICE_HEX).unwrap(),
            to: Address::from_hex(BOB_HEX).unwrap(),
            amount: TokenAmount::from(5u64),
        }));

        assert_eq!(client.balances().state(ALICE_HEX), BalanceState::Undetermined);
        client.balance_of(ALICE_SS58).await;
        let notes = notes.0.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("info: Transfer event: {\"from\":\"0xd435"));
    }
}
