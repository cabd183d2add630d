// Deployment parameters shared by the contracts
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::primitives::primitives::{Amount, AppId, Policy};
use crate::primitives::Result;

/// Tunables baked into the contracts at build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Application whose local `Trust_Score` the lending escrow consults
    pub trust_app_id: Option<u64>,
    /// Score at or above which a borrower skips collateral
    pub trust_threshold: u64,
    /// Smallest collateral payment accepted by the lending escrow
    pub min_collateral: Amount,
    /// Fixed amount refunded by the deposit escrow
    pub deposit_refund: Amount,
    /// Ceiling for cumulative trust scores
    pub score_ceiling: u64,
    /// Fee withheld by the prize pool when paying out its balance
    pub min_fee: Amount,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            trust_app_id: None,
            trust_threshold: 50,
            min_collateral: 1_000_000,
            deposit_refund: 5_000_000,
            score_ceiling: 100,
            min_fee: Policy::MIN_TXN_FEE,
        }
    }
}

impl ContractsConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn trust_app(&self) -> Option<AppId> {
        self.trust_app_id.map(AppId)
    }
}
