// Smart contracts and the machinery to run them
pub mod vm;
pub mod oracle;
pub mod compiler;
pub mod engine;

pub mod civic_rewards;
pub mod commute;
pub mod deposit_escrow;
pub mod lending_escrow;
pub mod marketplace;
pub mod prize_pool;
pub mod trust_score;

pub use vm::{
    Approval, CallContext, ContractStorage, GroupView, LedgerView, MemoryStorage, StateChange, TealValue, Verdict,
};
pub use oracle::{FixedScores, LocalStateOracle, TrustOracle, TRUST_SCORE_KEY};
pub use compiler::{CompiledProgram, ContractCompiler, ProgramKind};
pub use engine::{ContractEngine, ContractReceipt, GroupReceipt};

pub use civic_rewards::CivicRewards;
pub use commute::CommuteCheckin;
pub use deposit_escrow::DepositEscrow;
pub use lending_escrow::LendingEscrow;
pub use marketplace::Marketplace;
pub use prize_pool::PrizePool;
pub use trust_score::TrustScore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blockchain::transaction::OnCompletion;
use crate::config::ContractsConfig;
use crate::primitives::Rejection;

/// Number of uint and byte-slice slots a state scope reserves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    pub num_uints: u32,
    pub num_byte_slices: u32,
}

impl StateSchema {
    pub const EMPTY: StateSchema = StateSchema {
        num_uints: 0,
        num_byte_slices: 0,
    };

    pub const fn new(num_uints: u32, num_byte_slices: u32) -> Self {
        Self {
            num_uints,
            num_byte_slices,
        }
    }
}

/// Whether the lifecycle completions without a dedicated handler are accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPolicy {
    pub close_out: bool,
    pub update: bool,
    pub delete: bool,
}

impl CompletionPolicy {
    /// Everything allowed, development style
    pub const OPEN: CompletionPolicy = CompletionPolicy {
        close_out: true,
        update: true,
        delete: true,
    };

    /// Accounts may leave, code and application are frozen
    pub const FROZEN: CompletionPolicy = CompletionPolicy {
        close_out: true,
        update: false,
        delete: false,
    };

    /// Only creation, opt-in and calls are accepted
    pub const CLOSED: CompletionPolicy = CompletionPolicy {
        close_out: false,
        update: false,
        delete: false,
    };

    pub fn permits(&self, on_completion: OnCompletion) -> bool {
        match on_completion {
            OnCompletion::NoOp | OnCompletion::OptIn | OnCompletion::ClearState => true,
            OnCompletion::CloseOut => self.close_out,
            OnCompletion::UpdateApplication => self.update,
            OnCompletion::DeleteApplication => self.delete,
        }
    }
}

/// Documentation of one callable operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub args: &'static [&'static str],
    /// What must sit at group position 0, if anything
    pub companion: Option<&'static str>,
    pub admin_only: bool,
}

impl MethodDescriptor {
    pub const fn new(name: &'static str, args: &'static [&'static str]) -> Self {
        Self {
            name,
            args,
            companion: None,
            admin_only: false,
        }
    }

    pub const fn with_companion(self, companion: &'static str) -> Self {
        Self {
            companion: Some(companion),
            ..self
        }
    }

    pub const fn admin_only(self) -> Self {
        Self {
            admin_only: true,
            ..self
        }
    }
}

/// A deployable decision table
pub trait Contract: Send + Sync {
    fn name(&self) -> &'static str;

    fn avm_version(&self) -> u8 {
        6
    }

    fn global_schema(&self) -> StateSchema {
        StateSchema::EMPTY
    }

    fn local_schema(&self) -> StateSchema {
        StateSchema::EMPTY
    }

    fn completion_policy(&self) -> CompletionPolicy;

    fn methods(&self) -> Vec<MethodDescriptor>;

    fn on_create(&self, _ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new())
    }

    fn on_opt_in(&self, _ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new())
    }

    /// NoOp calls, dispatched on the first argument
    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict;

    fn clear_state(&self, _ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new())
    }
}

/// Approval program entry point: route a call by creation flag and on-completion
pub fn evaluate(contract: &dyn Contract, ctx: &CallContext<'_>) -> Verdict {
    if ctx.creating {
        return contract.on_create(ctx);
    }

    match ctx.on_completion {
        OnCompletion::NoOp => contract.on_call(ctx),
        OnCompletion::OptIn => contract.on_opt_in(ctx),
        OnCompletion::ClearState => contract.clear_state(ctx),
        other if contract.completion_policy().permits(other) => Ok(Approval::new()),
        other => Err(Rejection::CompletionRejected(other.to_string())),
    }
}

/// First argument as an operation name, for rejection messages
pub(crate) fn unknown_operation(raw: &[u8]) -> Rejection {
    Rejection::UnknownOperation(String::from_utf8_lossy(raw).into_owned())
}

/// Every contract, configured
pub fn registry(config: &ContractsConfig) -> Vec<Arc<dyn Contract>> {
    vec![
        Arc::new(LendingEscrow::new(config)),
        Arc::new(DepositEscrow::new(config)),
        Arc::new(TrustScore::new(config)),
        Arc::new(Marketplace::new()),
        Arc::new(CommuteCheckin::new()),
        Arc::new(CivicRewards::new()),
        Arc::new(PrizePool::new(config)),
    ]
}

pub fn find_contract(name: &str, config: &ContractsConfig) -> Option<Arc<dyn Contract>> {
    registry(config).into_iter().find(|contract| contract.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let contracts = registry(&ContractsConfig::default());
        let mut names: Vec<_> = contracts.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), contracts.len());
        assert!(find_contract("marketplace", &ContractsConfig::default()).is_some());
        assert!(find_contract("nope", &ContractsConfig::default()).is_none());
    }

    #[test]
    fn test_completion_policies() {
        assert!(CompletionPolicy::OPEN.permits(OnCompletion::DeleteApplication));
        assert!(CompletionPolicy::FROZEN.permits(OnCompletion::CloseOut));
        assert!(!CompletionPolicy::FROZEN.permits(OnCompletion::UpdateApplication));
        assert!(!CompletionPolicy::CLOSED.permits(OnCompletion::CloseOut));
        assert!(CompletionPolicy::CLOSED.permits(OnCompletion::NoOp));
    }
}
