// Shared fixtures for the contract integration tests
#![allow(dead_code)]

use civic_contracts::*;
use std::sync::Arc;

pub const GENESIS_TIME: Timestamp = 1_700_000_000;

pub struct Fixture {
    pub engine: ContractEngine,
    pub admin: Address,
}

impl Fixture {
    pub fn new() -> Self {
        let mut engine = ContractEngine::new();
        engine.set_timestamp(GENESIS_TIME);
        let admin = Address::from_seed(b"admin");
        engine.fund(admin, 10_000_000).unwrap();
        Self { engine, admin }
    }

    pub fn account(&mut self, seed: &str, amount: Amount) -> Address {
        let account = Address::from_seed(seed.as_bytes());
        self.engine.fund(account, amount).unwrap();
        account
    }

    pub fn deploy(&mut self, contract: impl Contract + 'static) -> AppId {
        let admin = self.admin;
        self.engine.deploy(admin, Arc::new(contract)).unwrap()
    }

    pub fn opt_in(&mut self, account: Address, app: AppId) {
        self.engine.submit_one(Transaction::opt_in(account, app)).unwrap();
    }

    pub fn call(&mut self, sender: Address, app: AppId, op: &str, args: Vec<Vec<u8>>) -> Result<GroupReceipt> {
        self.engine.submit_one(Transaction::call(sender, app, op, args))
    }

    /// Companion at position 0, application call at position 1
    pub fn call_with(
        &mut self,
        companion: Transaction,
        sender: Address,
        app: AppId,
        op: &str,
        args: Vec<Vec<u8>>,
    ) -> Result<GroupReceipt> {
        let group = TransactionGroup::new(vec![companion, Transaction::call(sender, app, op, args)])?;
        self.engine.submit(&group)
    }

    pub fn local_uint(&self, app: AppId, account: &Address, key: &str) -> Option<u64> {
        self.engine.local(app, account, key).and_then(|v| v.as_uint())
    }

    pub fn local_bytes(&self, app: AppId, account: &Address, key: &str) -> Option<Vec<u8>> {
        self.engine
            .local(app, account, key)
            .and_then(|v| v.as_bytes().map(<[u8]>::to_vec))
    }
}

pub fn addr(account: &Address) -> Vec<u8> {
    account.as_bytes().to_vec()
}

pub fn uint(value: u64) -> Vec<u8> {
    itob(value).to_vec()
}

/// Reason tag of a rejected group
pub fn rejection(result: Result<GroupReceipt>) -> Rejection {
    match result {
        Ok(receipt) => panic!("expected rejection, group accepted in round {}", receipt.round),
        Err(err) => err
            .rejection()
            .cloned()
            .unwrap_or_else(|| panic!("expected contract rejection, got {}", err)),
    }
}
