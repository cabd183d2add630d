// Transaction model consumed by the contracts and the execution harness

pub mod transaction;

pub use transaction::{
    AppCall, AssetTransfer, InnerTransaction, OnCompletion, Payment, Transaction, TransactionGroup,
    TransactionKind, TxnType,
};
