// Transaction types submitted to the contracts
use serde::{Deserialize, Serialize};

use crate::primitives::primitives::{hash_json, Address, Amount, AppId, AssetId, Policy, TxId};
use crate::primitives::{LedgerError, Result};

/// What the caller intends to happen to its association with the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnCompletion {
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

impl std::fmt::Display for OnCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OnCompletion::NoOp => "NoOp",
            OnCompletion::OptIn => "OptIn",
            OnCompletion::CloseOut => "CloseOut",
            OnCompletion::ClearState => "ClearState",
            OnCompletion::UpdateApplication => "UpdateApplication",
            OnCompletion::DeleteApplication => "DeleteApplication",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnType {
    Payment,
    AssetTransfer,
    ApplicationCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub receiver: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub asset_id: AssetId,
    pub receiver: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCall {
    pub app_id: AppId,
    pub on_completion: OnCompletion,
    pub args: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Payment(Payment),
    AssetTransfer(AssetTransfer),
    AppCall(AppCall),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub fee: Amount,
    /// Disambiguates otherwise identical transactions
    pub note: Vec<u8>,
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn payment(sender: Address, receiver: Address, amount: Amount) -> Self {
        Self::new(sender, TransactionKind::Payment(Payment { receiver, amount }))
    }

    pub fn asset_transfer(sender: Address, asset_id: AssetId, receiver: Address, amount: u64) -> Self {
        Self::new(
            sender,
            TransactionKind::AssetTransfer(AssetTransfer {
                asset_id,
                receiver,
                amount,
            }),
        )
    }

    pub fn app_call(sender: Address, app_id: AppId, on_completion: OnCompletion, args: Vec<Vec<u8>>) -> Self {
        Self::new(
            sender,
            TransactionKind::AppCall(AppCall {
                app_id,
                on_completion,
                args,
            }),
        )
    }

    /// NoOp call whose first argument names the operation
    pub fn call(sender: Address, app_id: AppId, operation: &str, mut args: Vec<Vec<u8>>) -> Self {
        args.insert(0, operation.as_bytes().to_vec());
        Self::app_call(sender, app_id, OnCompletion::NoOp, args)
    }

    pub fn opt_in(sender: Address, app_id: AppId) -> Self {
        Self::app_call(sender, app_id, OnCompletion::OptIn, Vec::new())
    }

    fn new(sender: Address, kind: TransactionKind) -> Self {
        Self {
            sender,
            fee: Policy::MIN_TXN_FEE,
            note: Vec::new(),
            kind,
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = note.into();
        self
    }

    pub fn txn_type(&self) -> TxnType {
        match self.kind {
            TransactionKind::Payment(_) => TxnType::Payment,
            TransactionKind::AssetTransfer(_) => TxnType::AssetTransfer,
            TransactionKind::AppCall(_) => TxnType::ApplicationCall,
        }
    }

    pub fn id(&self) -> Result<TxId> {
        Ok(hash_json(self)?)
    }
}

/// Ordered atomic group. Positions are significant: contracts look for
/// companions at fixed indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    transactions: Vec<Transaction>,
}

impl TransactionGroup {
    pub fn new(transactions: Vec<Transaction>) -> Result<Self> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidGroup("group is empty".to_string()));
        }
        if transactions.len() > Policy::MAX_GROUP_SIZE {
            return Err(LedgerError::InvalidGroup(format!(
                "group of {} exceeds {} transactions",
                transactions.len(),
                Policy::MAX_GROUP_SIZE
            )));
        }
        Ok(Self { transactions })
    }

    pub fn single(transaction: Transaction) -> Self {
        Self {
            transactions: vec![transaction],
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn id(&self) -> Result<TxId> {
        Ok(hash_json(&self.transactions)?)
    }
}

/// Transfer issued by an application from its own account. Fee is always zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InnerTransaction {
    Payment { receiver: Address, amount: Amount },
    AssetTransfer { asset_id: AssetId, receiver: Address, amount: u64 },
}

impl InnerTransaction {
    pub fn receiver(&self) -> &Address {
        match self {
            InnerTransaction::Payment { receiver, .. } => receiver,
            InnerTransaction::AssetTransfer { receiver, .. } => receiver,
        }
    }

    pub fn fee(&self) -> Amount {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_size_limits() {
        let alice = Address::from_seed(b"alice");
        let txn = Transaction::payment(alice, Address::zero(), 1);
        assert!(TransactionGroup::new(vec![]).is_err());
        assert!(TransactionGroup::new(vec![txn.clone(); Policy::MAX_GROUP_SIZE]).is_ok());
        assert!(TransactionGroup::new(vec![txn; Policy::MAX_GROUP_SIZE + 1]).is_err());
    }

    #[test]
    fn test_call_prepends_operation() {
        let alice = Address::from_seed(b"alice");
        let txn = Transaction::call(alice, AppId(7), "borrow", vec![b"bike-1".to_vec()]);
        match &txn.kind {
            TransactionKind::AppCall(call) => {
                assert_eq!(call.args[0], b"borrow".to_vec());
                assert_eq!(call.args[1], b"bike-1".to_vec());
                assert_eq!(call.on_completion, OnCompletion::NoOp);
            }
            other => panic!("expected app call, got {:?}", other),
        }
    }

    #[test]
    fn test_notes_change_ids() {
        let alice = Address::from_seed(b"alice");
        let a = Transaction::payment(alice, Address::zero(), 1);
        let b = a.clone().with_note("second");
        assert_ne!(a.id().unwrap(), b.id().unwrap());
        assert_eq!(a.id().unwrap(), a.clone().id().unwrap());
    }
}
