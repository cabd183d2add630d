// Civic contracts library
// Lending, reputation, marketplace and commute contracts with a local execution harness

pub mod primitives;
pub mod blockchain;
pub mod config;
pub mod smart_contracts;

// Re-export key types for easy access
pub use primitives::{
    primitives::*,
    error::*,
};

pub use blockchain::transaction::{
    InnerTransaction, OnCompletion, Transaction, TransactionGroup,
};

pub use config::ContractsConfig;

pub use smart_contracts::{
    evaluate, find_contract, registry,
    Approval, CallContext, Contract, ContractCompiler, ContractEngine, ContractReceipt,
    GroupReceipt, StateChange, TealValue, TrustOracle, Verdict,
};
