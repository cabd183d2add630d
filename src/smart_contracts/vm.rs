// Contract execution model: state values, state changes, verdicts and the call context
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::blockchain::transaction::{
    AssetTransfer, InnerTransaction, OnCompletion, Payment, Transaction, TransactionKind,
};
use crate::primitives::primitives::{btoi, Address, Amount, AppId, AssetId, Round, Timestamp};
use crate::primitives::Rejection;

/// A stored state value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TealValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl TealValue {
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            TealValue::Uint(value) => Some(*value),
            TealValue::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TealValue::Uint(_) => None,
            TealValue::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<u64> for TealValue {
    fn from(value: u64) -> Self {
        TealValue::Uint(value)
    }
}

impl From<&str> for TealValue {
    fn from(value: &str) -> Self {
        TealValue::Bytes(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for TealValue {
    fn from(value: &[u8]) -> Self {
        TealValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for TealValue {
    fn from(value: Vec<u8>) -> Self {
        TealValue::Bytes(value)
    }
}

impl From<Address> for TealValue {
    fn from(value: Address) -> Self {
        TealValue::Bytes(value.as_bytes().to_vec())
    }
}

/// One state write produced by an approved call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    GlobalPut { key: String, value: TealValue },
    LocalPut { account: Address, key: String, value: TealValue },
    BoxPut {
        #[serde(with = "hex::serde")]
        name: Vec<u8>,
        #[serde(with = "hex::serde")]
        value: Vec<u8>,
    },
    BoxDelete {
        #[serde(with = "hex::serde")]
        name: Vec<u8>,
    },
}

/// Accepted call: state changes in order plus at most one inner transfer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub changes: Vec<StateChange>,
    pub inner: Option<InnerTransaction>,
}

impl Approval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_put(mut self, key: &str, value: impl Into<TealValue>) -> Self {
        self.changes.push(StateChange::GlobalPut {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn local_put(mut self, account: Address, key: &str, value: impl Into<TealValue>) -> Self {
        self.changes.push(StateChange::LocalPut {
            account,
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn box_put(mut self, name: &[u8], value: Vec<u8>) -> Self {
        self.changes.push(StateChange::BoxPut {
            name: name.to_vec(),
            value,
        });
        self
    }

    pub fn box_delete(mut self, name: &[u8]) -> Self {
        self.changes.push(StateChange::BoxDelete { name: name.to_vec() });
        self
    }

    pub fn pay(mut self, receiver: Address, amount: Amount) -> Self {
        self.inner = Some(InnerTransaction::Payment { receiver, amount });
        self
    }

    pub fn send_asset(mut self, asset_id: AssetId, receiver: Address, amount: u64) -> Self {
        self.inner = Some(InnerTransaction::AssetTransfer {
            asset_id,
            receiver,
            amount,
        });
        self
    }
}

/// Either an approval or the reason the call was rejected
pub type Verdict = std::result::Result<Approval, Rejection>;

/// Read access to application state
pub trait ContractStorage {
    fn app_creator(&self, app: AppId) -> Option<Address>;
    fn global_get(&self, app: AppId, key: &str) -> Option<TealValue>;
    fn is_opted_in(&self, app: AppId, account: &Address) -> bool;
    fn local_get(&self, app: AppId, account: &Address, key: &str) -> Option<TealValue>;
    fn box_get(&self, app: AppId, name: &[u8]) -> Option<Vec<u8>>;
}

/// Everything a contract may observe while it runs
pub trait LedgerView: ContractStorage {
    fn balance(&self, account: &Address) -> Amount;
    fn latest_timestamp(&self) -> Timestamp;
    fn round(&self) -> Round;
}

/// State of one deployed application
#[derive(Debug, Clone, Default)]
pub struct AppRecord {
    pub creator: Address,
    pub global: BTreeMap<String, TealValue>,
    pub local: BTreeMap<Address, BTreeMap<String, TealValue>>,
    pub boxes: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Simple in-memory storage implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    apps: HashMap<AppId, AppRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_app(&mut self, app: AppId, creator: Address) {
        self.apps.insert(
            app,
            AppRecord {
                creator,
                ..AppRecord::default()
            },
        );
    }

    pub fn delete_app(&mut self, app: AppId) -> bool {
        self.apps.remove(&app).is_some()
    }

    pub fn has_app(&self, app: AppId) -> bool {
        self.apps.contains_key(&app)
    }

    pub fn app(&self, app: AppId) -> Option<&AppRecord> {
        self.apps.get(&app)
    }

    pub fn opt_in(&mut self, app: AppId, account: Address) -> std::result::Result<(), Rejection> {
        let record = self
            .apps
            .get_mut(&app)
            .ok_or(Rejection::UnknownApplication(app))?;
        if record.local.contains_key(&account) {
            return Err(Rejection::AlreadyOptedIn(account));
        }
        record.local.insert(account, BTreeMap::new());
        Ok(())
    }

    /// Drop an account's local state. Returns false if it was not opted in.
    pub fn close_out(&mut self, app: AppId, account: &Address) -> bool {
        self.apps
            .get_mut(&app)
            .map(|record| record.local.remove(account).is_some())
            .unwrap_or(false)
    }

    pub fn apply(&mut self, app: AppId, change: &StateChange) -> std::result::Result<(), Rejection> {
        let record = self
            .apps
            .get_mut(&app)
            .ok_or(Rejection::UnknownApplication(app))?;

        match change {
            StateChange::GlobalPut { key, value } => {
                record.global.insert(key.clone(), value.clone());
            }
            StateChange::LocalPut { account, key, value } => {
                let slots = record
                    .local
                    .get_mut(account)
                    .ok_or(Rejection::NotOptedIn(*account))?;
                slots.insert(key.clone(), value.clone());
            }
            StateChange::BoxPut { name, value } => {
                record.boxes.insert(name.clone(), value.clone());
            }
            StateChange::BoxDelete { name } => {
                if record.boxes.remove(name).is_none() {
                    return Err(Rejection::BoxMissing(hex::encode(name)));
                }
            }
        }
        Ok(())
    }
}

impl ContractStorage for MemoryStorage {
    fn app_creator(&self, app: AppId) -> Option<Address> {
        self.apps.get(&app).map(|record| record.creator)
    }

    fn global_get(&self, app: AppId, key: &str) -> Option<TealValue> {
        self.apps.get(&app)?.global.get(key).cloned()
    }

    fn is_opted_in(&self, app: AppId, account: &Address) -> bool {
        self.apps
            .get(&app)
            .map(|record| record.local.contains_key(account))
            .unwrap_or(false)
    }

    fn local_get(&self, app: AppId, account: &Address, key: &str) -> Option<TealValue> {
        self.apps.get(&app)?.local.get(account)?.get(key).cloned()
    }

    fn box_get(&self, app: AppId, name: &[u8]) -> Option<Vec<u8>> {
        self.apps.get(&app)?.boxes.get(name).cloned()
    }
}

/// The atomic group as seen from the executing application call
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    transactions: &'a [Transaction],
    position: usize,
}

impl<'a> GroupView<'a> {
    pub fn new(transactions: &'a [Transaction], position: usize) -> Self {
        Self {
            transactions,
            position,
        }
    }

    pub fn size(&self) -> usize {
        self.transactions.len()
    }

    /// Index of the executing call within the group
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, index: usize) -> Option<&'a Transaction> {
        self.transactions.get(index)
    }

    pub fn require_size(&self, expected: usize) -> std::result::Result<(), Rejection> {
        if self.size() != expected {
            return Err(Rejection::GroupSize {
                expected,
                actual: self.size(),
            });
        }
        Ok(())
    }

    /// Payment at a fixed position, with its sender
    pub fn payment_at(&self, index: usize) -> std::result::Result<(&'a Address, &'a Payment), Rejection> {
        let txn = self.get(index).ok_or(Rejection::CompanionMissing(index))?;
        match &txn.kind {
            TransactionKind::Payment(payment) => Ok((&txn.sender, payment)),
            _ => Err(Rejection::mismatch(
                index,
                format!("expected payment, found {:?}", txn.txn_type()),
            )),
        }
    }

    /// Asset transfer at a fixed position, with its sender
    pub fn asset_transfer_at(
        &self,
        index: usize,
    ) -> std::result::Result<(&'a Address, &'a AssetTransfer), Rejection> {
        let txn = self.get(index).ok_or(Rejection::CompanionMissing(index))?;
        match &txn.kind {
            TransactionKind::AssetTransfer(transfer) => Ok((&txn.sender, transfer)),
            _ => Err(Rejection::mismatch(
                index,
                format!("expected asset transfer, found {:?}", txn.txn_type()),
            )),
        }
    }
}

/// Everything a contract sees about the call it is judging
pub struct CallContext<'a> {
    pub app_id: AppId,
    pub sender: Address,
    pub on_completion: OnCompletion,
    pub args: &'a [Vec<u8>],
    pub group: GroupView<'a>,
    /// True while the application is being created
    pub creating: bool,
    view: &'a dyn LedgerView,
}

impl<'a> CallContext<'a> {
    pub fn new(
        view: &'a dyn LedgerView,
        group: &'a [Transaction],
        position: usize,
        app_id: AppId,
        creating: bool,
    ) -> std::result::Result<Self, Rejection> {
        let txn = group.get(position).ok_or(Rejection::CompanionMissing(position))?;
        let call = match &txn.kind {
            TransactionKind::AppCall(call) => call,
            _ => return Err(Rejection::mismatch(position, "not an application call")),
        };

        Ok(Self {
            app_id,
            sender: txn.sender,
            on_completion: call.on_completion,
            args: &call.args,
            group: GroupView::new(group, position),
            creating,
            view,
        })
    }

    pub fn view(&self) -> &'a dyn LedgerView {
        self.view
    }

    pub fn app_address(&self) -> Address {
        self.app_id.address()
    }

    pub fn creator(&self) -> std::result::Result<Address, Rejection> {
        self.view
            .app_creator(self.app_id)
            .ok_or(Rejection::UnknownApplication(self.app_id))
    }

    pub fn require_creator(&self) -> std::result::Result<(), Rejection> {
        if self.sender != self.creator()? {
            return Err(Rejection::NotAdmin);
        }
        Ok(())
    }

    pub fn latest_timestamp(&self) -> Timestamp {
        self.view.latest_timestamp()
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.view.balance(account)
    }

    pub fn arg(&self, index: usize) -> std::result::Result<&'a [u8], Rejection> {
        self.args
            .get(index)
            .map(Vec::as_slice)
            .ok_or(Rejection::MissingArgument(index))
    }

    pub fn arg_uint(&self, index: usize) -> std::result::Result<u64, Rejection> {
        btoi(self.arg(index)?)
    }

    pub fn arg_address(&self, index: usize) -> std::result::Result<Address, Rejection> {
        let bytes = self.arg(index)?;
        Address::from_slice(bytes).ok_or_else(|| {
            Rejection::MalformedArgument(format!(
                "argument {} is {} bytes, expected an address",
                index,
                bytes.len()
            ))
        })
    }

    pub fn global_uint(&self, key: &str) -> std::result::Result<u64, Rejection> {
        match self.view.global_get(self.app_id, key) {
            None => Ok(0),
            Some(value) => value
                .as_uint()
                .ok_or_else(|| Rejection::precondition(format!("global {} holds bytes", key))),
        }
    }

    pub fn global_bytes(&self, key: &str) -> std::result::Result<Vec<u8>, Rejection> {
        match self.view.global_get(self.app_id, key) {
            None => Ok(Vec::new()),
            Some(TealValue::Bytes(bytes)) => Ok(bytes),
            Some(TealValue::Uint(_)) => Err(Rejection::precondition(format!("global {} holds a uint", key))),
        }
    }

    pub fn require_opted_in(&self, account: &Address) -> std::result::Result<(), Rejection> {
        if !self.view.is_opted_in(self.app_id, account) {
            return Err(Rejection::NotOptedIn(*account));
        }
        Ok(())
    }

    pub fn local_uint(&self, account: &Address, key: &str) -> std::result::Result<u64, Rejection> {
        self.require_opted_in(account)?;
        match self.view.local_get(self.app_id, account, key) {
            None => Ok(0),
            Some(value) => value
                .as_uint()
                .ok_or_else(|| Rejection::precondition(format!("local {} holds bytes", key))),
        }
    }

    pub fn local_bytes(&self, account: &Address, key: &str) -> std::result::Result<Vec<u8>, Rejection> {
        self.require_opted_in(account)?;
        match self.view.local_get(self.app_id, account, key) {
            None => Ok(Vec::new()),
            Some(TealValue::Bytes(bytes)) => Ok(bytes),
            Some(TealValue::Uint(_)) => Err(Rejection::precondition(format!("local {} holds a uint", key))),
        }
    }

    pub fn box_get(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.view.box_get(self.app_id, name)
    }
}
