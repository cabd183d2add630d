// Read-only trust score lookups used to waive collateral
use std::collections::HashMap;

use super::vm::LedgerView;
use crate::primitives::primitives::{Address, AppId};

/// Local key the trust score contract keeps its score under
pub const TRUST_SCORE_KEY: &str = "Trust_Score";

/// Source of an account's trust score. `None` means the account has no score.
pub trait TrustOracle {
    fn score(&self, account: &Address) -> Option<u64>;
}

/// Reads another application's local state through the ledger.
///
/// Trusts that `app` really is the score contract and that its value is current.
pub struct LocalStateOracle<'a> {
    view: &'a dyn LedgerView,
    app: AppId,
    key: &'a str,
}

impl<'a> LocalStateOracle<'a> {
    pub fn new(view: &'a dyn LedgerView, app: AppId) -> Self {
        Self::with_key(view, app, TRUST_SCORE_KEY)
    }

    pub fn with_key(view: &'a dyn LedgerView, app: AppId, key: &'a str) -> Self {
        Self { view, app, key }
    }
}

impl TrustOracle for LocalStateOracle<'_> {
    fn score(&self, account: &Address) -> Option<u64> {
        self.view.local_get(self.app, account, self.key)?.as_uint()
    }
}

/// Fixed table of scores
#[derive(Debug, Clone, Default)]
pub struct FixedScores {
    scores: HashMap<Address, u64>,
}

impl FixedScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, account: Address, score: u64) -> Self {
        self.scores.insert(account, score);
        self
    }
}

impl TrustOracle for FixedScores {
    fn score(&self, account: &Address) -> Option<u64> {
        self.scores.get(account).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_scores() {
        let alice = Address::from_seed(b"alice");
        let bob = Address::from_seed(b"bob");
        let oracle = FixedScores::new().with(alice, 72);
        assert_eq!(oracle.score(&alice), Some(72));
        assert_eq!(oracle.score(&bob), None);
    }
}
