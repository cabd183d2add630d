// In-memory execution harness: runs transaction groups against deployed contracts
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::vm::{
    Approval, CallContext, ContractStorage, LedgerView, MemoryStorage, StateChange, TealValue,
};
use super::{evaluate, Contract};
use crate::blockchain::transaction::{
    AppCall, InnerTransaction, OnCompletion, Transaction, TransactionGroup, TransactionKind,
};
use crate::primitives::primitives::{
    Address, Amount, AppId, AssetId, Policy, Round, Timestamp, TxId,
};
use crate::primitives::{LedgerError, Rejection, Result};

/// Outcome of one application call inside an accepted group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractReceipt {
    pub txid: TxId,
    pub app_id: AppId,
    pub sender: Address,
    pub on_completion: OnCompletion,
    pub created: bool,
    /// False only for a clear-state call whose program rejected
    pub approved: bool,
    pub changes: Vec<StateChange>,
    pub inner: Option<InnerTransaction>,
    pub round: Round,
    pub group_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReceipt {
    pub group_id: TxId,
    pub round: Round,
    pub receipts: Vec<ContractReceipt>,
}

impl GroupReceipt {
    /// Application created by this group, if any
    pub fn created_app(&self) -> Option<AppId> {
        self.receipts.iter().find(|r| r.created).map(|r| r.app_id)
    }

    pub fn inner_transactions(&self) -> Vec<&InnerTransaction> {
        self.receipts.iter().filter_map(|r| r.inner.as_ref()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetParams {
    pub creator: Address,
    pub total: u64,
    pub unit_name: String,
}

#[derive(Debug, Clone, Default)]
struct AccountState {
    balance: Amount,
    assets: BTreeMap<AssetId, u64>,
}

/// Everything a group may mutate; cloned as the rollback snapshot
#[derive(Clone, Default)]
struct LedgerState {
    accounts: HashMap<Address, AccountState>,
    assets: HashMap<AssetId, AssetParams>,
    programs: HashMap<AppId, Arc<dyn Contract>>,
    storage: MemoryStorage,
    next_index: u64,
    round: Round,
    timestamp: Timestamp,
}

impl LedgerState {
    fn allocate_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn credit(&mut self, account: &Address, amount: Amount) -> std::result::Result<(), Rejection> {
        let entry = self.accounts.entry(*account).or_default();
        entry.balance = entry.balance.checked_add(amount).ok_or(Rejection::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, account: &Address, amount: Amount) -> std::result::Result<(), Rejection> {
        let entry = self
            .accounts
            .get_mut(account)
            .ok_or(Rejection::InsufficientBalance(*account))?;
        entry.balance = entry
            .balance
            .checked_sub(amount)
            .ok_or(Rejection::InsufficientBalance(*account))?;
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> std::result::Result<(), Rejection> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    fn transfer_asset(
        &mut self,
        from: &Address,
        asset_id: AssetId,
        to: &Address,
        amount: u64,
    ) -> std::result::Result<(), Rejection> {
        if !self.assets.contains_key(&asset_id) {
            return Err(Rejection::precondition(format!("unknown {}", asset_id)));
        }

        let holding = self
            .accounts
            .get_mut(from)
            .and_then(|account| account.assets.get_mut(&asset_id))
            .ok_or(Rejection::InsufficientBalance(*from))?;
        *holding = holding
            .checked_sub(amount)
            .ok_or(Rejection::InsufficientBalance(*from))?;

        let receiver = self.accounts.entry(*to).or_default();
        let held = receiver.assets.entry(asset_id).or_insert(0);
        *held = held.checked_add(amount).ok_or(Rejection::Overflow)?;
        Ok(())
    }

    fn execute_inner(&mut self, app_account: &Address, inner: &InnerTransaction) -> std::result::Result<(), Rejection> {
        match inner {
            InnerTransaction::Payment { receiver, amount } => self.transfer(app_account, receiver, *amount),
            InnerTransaction::AssetTransfer {
                asset_id,
                receiver,
                amount,
            } => self.transfer_asset(app_account, *asset_id, receiver, *amount),
        }
    }
}

impl ContractStorage for LedgerState {
    fn app_creator(&self, app: AppId) -> Option<Address> {
        self.storage.app_creator(app)
    }

    fn global_get(&self, app: AppId, key: &str) -> Option<TealValue> {
        self.storage.global_get(app, key)
    }

    fn is_opted_in(&self, app: AppId, account: &Address) -> bool {
        self.storage.is_opted_in(app, account)
    }

    fn local_get(&self, app: AppId, account: &Address, key: &str) -> Option<TealValue> {
        self.storage.local_get(app, account, key)
    }

    fn box_get(&self, app: AppId, name: &[u8]) -> Option<Vec<u8>> {
        self.storage.box_get(app, name)
    }
}

impl LedgerView for LedgerState {
    fn balance(&self, account: &Address) -> Amount {
        self.accounts.get(account).map(|a| a.balance).unwrap_or(0)
    }

    fn latest_timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn round(&self) -> Round {
        self.round
    }
}

/// Plays the platform's part: balances, assets, applications and atomic groups.
///
/// Minimum balances and asset opt-ins are not modeled; holdings start at zero.
pub struct ContractEngine {
    state: LedgerState,
    receipts: Vec<ContractReceipt>,
    min_fee: Amount,
}

impl Default for ContractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractEngine {
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            state: LedgerState {
                next_index: Policy::FIRST_INDEX,
                timestamp: now,
                ..LedgerState::default()
            },
            receipts: Vec::new(),
            min_fee: Policy::MIN_TXN_FEE,
        }
    }

    pub fn with_min_fee(mut self, min_fee: Amount) -> Self {
        self.min_fee = min_fee;
        self
    }

    /// Mint funds into an account
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<()> {
        self.state
            .credit(&account, amount)
            .map_err(|reason| LedgerError::Rejected { index: 0, reason })
    }

    /// Create an asset whose whole supply starts with the creator
    pub fn create_asset(&mut self, creator: Address, total: u64, unit_name: &str) -> AssetId {
        let asset_id = AssetId(self.state.allocate_index());
        self.state.assets.insert(
            asset_id,
            AssetParams {
                creator,
                total,
                unit_name: unit_name.to_string(),
            },
        );
        self.state
            .accounts
            .entry(creator)
            .or_default()
            .assets
            .insert(asset_id, total);
        info!("Created {} ({}) with supply {}", asset_id, unit_name, total);
        asset_id
    }

    /// Submit the creation call for `contract` on behalf of `creator`
    pub fn deploy(&mut self, creator: Address, contract: Arc<dyn Contract>) -> Result<AppId> {
        let create = Transaction::app_call(creator, AppId::CREATE, OnCompletion::NoOp, Vec::new());
        let name = contract.name();
        let receipt = self.execute(&TransactionGroup::single(create), Some(contract))?;
        let app_id = receipt
            .created_app()
            .ok_or_else(|| LedgerError::NotFound("created application".to_string()))?;
        info!("Deployed {} as {} (escrow {})", name, app_id, app_id.address());
        Ok(app_id)
    }

    /// Run a group atomically. Any rejection restores the prior state.
    pub fn submit(&mut self, group: &TransactionGroup) -> Result<GroupReceipt> {
        self.execute(group, None)
    }

    pub fn submit_one(&mut self, transaction: Transaction) -> Result<GroupReceipt> {
        self.submit(&TransactionGroup::single(transaction))
    }

    fn execute(&mut self, group: &TransactionGroup, program: Option<Arc<dyn Contract>>) -> Result<GroupReceipt> {
        let group_id = group.id()?;
        let txids = group
            .transactions()
            .iter()
            .map(Transaction::id)
            .collect::<Result<Vec<_>>>()?;

        let snapshot = self.state.clone();
        self.state.round += 1;

        let mut program = program;
        let mut receipts = Vec::new();
        for (index, txid) in txids.into_iter().enumerate() {
            match self.apply_transaction(group.transactions(), index, txid, &mut program) {
                Ok(Some(receipt)) => receipts.push(receipt),
                Ok(None) => {}
                Err(reason) => {
                    self.state = snapshot;
                    warn!("Group {} rejected at index {}: {}", group_id, index, reason);
                    return Err(LedgerError::Rejected { index, reason });
                }
            }
        }

        info!(
            "Group {} accepted in round {} ({} transactions)",
            group_id,
            self.state.round,
            group.len()
        );
        self.receipts.extend(receipts.iter().cloned());

        Ok(GroupReceipt {
            group_id,
            round: self.state.round,
            receipts,
        })
    }

    fn apply_transaction(
        &mut self,
        transactions: &[Transaction],
        index: usize,
        txid: TxId,
        program: &mut Option<Arc<dyn Contract>>,
    ) -> std::result::Result<Option<ContractReceipt>, Rejection> {
        let txn = &transactions[index];
        if txn.fee < self.min_fee {
            return Err(Rejection::precondition(format!(
                "fee {} below minimum {}",
                txn.fee, self.min_fee
            )));
        }
        self.state.debit(&txn.sender, txn.fee)?;

        match &txn.kind {
            TransactionKind::Payment(payment) => {
                self.state.transfer(&txn.sender, &payment.receiver, payment.amount)?;
                Ok(None)
            }
            TransactionKind::AssetTransfer(transfer) => {
                self.state
                    .transfer_asset(&txn.sender, transfer.asset_id, &transfer.receiver, transfer.amount)?;
                Ok(None)
            }
            TransactionKind::AppCall(call) => self
                .apply_app_call(transactions, index, txid, call, program)
                .map(Some),
        }
    }

    fn apply_app_call(
        &mut self,
        transactions: &[Transaction],
        index: usize,
        txid: TxId,
        call: &AppCall,
        program: &mut Option<Arc<dyn Contract>>,
    ) -> std::result::Result<ContractReceipt, Rejection> {
        let sender = transactions[index].sender;
        let creating = call.app_id.is_create();

        if call.args.len() > Policy::MAX_APP_ARGS {
            return Err(Rejection::MalformedArgument(format!(
                "{} arguments exceed {}",
                call.args.len(),
                Policy::MAX_APP_ARGS
            )));
        }

        let (app_id, contract) = if creating {
            let contract = program
                .take()
                .ok_or_else(|| Rejection::precondition("application creation requires a program"))?;
            let app_id = AppId(self.state.allocate_index());
            self.state.storage.create_app(app_id, sender);
            self.state.programs.insert(app_id, contract.clone());
            (app_id, contract)
        } else {
            let contract = self
                .state
                .programs
                .get(&call.app_id)
                .cloned()
                .ok_or(Rejection::UnknownApplication(call.app_id))?;
            (call.app_id, contract)
        };

        if !creating {
            match call.on_completion {
                OnCompletion::OptIn => self.state.storage.opt_in(app_id, sender)?,
                OnCompletion::CloseOut | OnCompletion::ClearState => {
                    if !self.state.storage.is_opted_in(app_id, &sender) {
                        return Err(Rejection::NotOptedIn(sender));
                    }
                }
                _ => {}
            }
        }

        let verdict = {
            let ctx = CallContext::new(&self.state, transactions, index, app_id, creating)?;
            evaluate(contract.as_ref(), &ctx)
        };

        let (approval, approved) = match verdict {
            Ok(approval) => (approval, true),
            Err(reason) if !creating && call.on_completion == OnCompletion::ClearState => {
                debug!("Clear-state program of {} rejected ({}), clearing anyway", app_id, reason);
                (Approval::new(), false)
            }
            Err(reason) => return Err(reason),
        };

        for change in &approval.changes {
            debug!("{} {:?}", app_id, change);
            self.state.storage.apply(app_id, change)?;
        }

        if let Some(inner) = &approval.inner {
            debug!("{} inner transaction {:?}", app_id, inner);
            self.state.execute_inner(&app_id.address(), inner)?;
        }

        if !creating {
            match call.on_completion {
                OnCompletion::CloseOut | OnCompletion::ClearState => {
                    self.state.storage.close_out(app_id, &sender);
                }
                OnCompletion::DeleteApplication => {
                    self.state.storage.delete_app(app_id);
                    self.state.programs.remove(&app_id);
                }
                _ => {}
            }
        }

        Ok(ContractReceipt {
            txid,
            app_id,
            sender,
            on_completion: call.on_completion,
            created: creating,
            approved,
            changes: approval.changes,
            inner: approval.inner,
            round: self.state.round,
            group_index: index,
        })
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.state.balance(account)
    }

    pub fn asset_balance(&self, account: &Address, asset_id: AssetId) -> u64 {
        self.state
            .accounts
            .get(account)
            .and_then(|a| a.assets.get(&asset_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn asset_params(&self, asset_id: AssetId) -> Option<&AssetParams> {
        self.state.assets.get(&asset_id)
    }

    pub fn application_address(&self, app_id: AppId) -> Address {
        app_id.address()
    }

    pub fn application_exists(&self, app_id: AppId) -> bool {
        self.state.storage.has_app(app_id)
    }

    pub fn is_opted_in(&self, app_id: AppId, account: &Address) -> bool {
        self.state.storage.is_opted_in(app_id, account)
    }

    pub fn local(&self, app_id: AppId, account: &Address, key: &str) -> Option<TealValue> {
        self.state.storage.local_get(app_id, account, key)
    }

    pub fn global(&self, app_id: AppId, key: &str) -> Option<TealValue> {
        self.state.storage.global_get(app_id, key)
    }

    pub fn box_value(&self, app_id: AppId, name: &[u8]) -> Option<Vec<u8>> {
        self.state.storage.box_get(app_id, name)
    }

    pub fn timestamp(&self) -> Timestamp {
        self.state.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.state.timestamp = timestamp;
    }

    pub fn round(&self) -> Round {
        self.state.round
    }

    pub fn receipts(&self) -> &[ContractReceipt] {
        &self.receipts
    }

    /// Read-only view handed to contracts, for oracles built outside a call
    pub fn view(&self) -> &dyn LedgerView {
        &self.state
    }
}
