// Trust score keeper: the admin adjusts per-account reputation counters
use super::oracle::TRUST_SCORE_KEY;
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor, StateSchema};
use crate::config::ContractsConfig;
use crate::primitives::primitives::Address;
use crate::primitives::Rejection;

pub const FITNESS_KEY: &str = "Fitness_Level";
pub const ECO_POINTS_KEY: &str = "Eco_Points";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustOp {
    AddTrust,
    SlashTrust,
    AddFitness,
    AddEco,
}

impl TrustOp {
    pub fn decode(raw: &[u8]) -> Result<Self, Rejection> {
        match raw {
            b"add_trust" => Ok(TrustOp::AddTrust),
            b"slash_trust" => Ok(TrustOp::SlashTrust),
            b"add_fitness" => Ok(TrustOp::AddFitness),
            b"add_eco" => Ok(TrustOp::AddEco),
            other => Err(unknown_operation(other)),
        }
    }

    fn key(self) -> &'static str {
        match self {
            TrustOp::AddTrust | TrustOp::SlashTrust => TRUST_SCORE_KEY,
            TrustOp::AddFitness => FITNESS_KEY,
            TrustOp::AddEco => ECO_POINTS_KEY,
        }
    }
}

pub struct TrustScore {
    ceiling: u64,
}

impl TrustScore {
    pub fn new(config: &ContractsConfig) -> Self {
        Self {
            ceiling: config.score_ceiling,
        }
    }

    fn adjust(&self, op: TrustOp, current: u64, delta: u64) -> Result<u64, Rejection> {
        match op {
            TrustOp::AddTrust => Ok(current.saturating_add(delta).min(self.ceiling)),
            TrustOp::SlashTrust => Ok(current.saturating_sub(delta)),
            TrustOp::AddFitness | TrustOp::AddEco => current.checked_add(delta).ok_or(Rejection::Overflow),
        }
    }
}

impl Contract for TrustScore {
    fn name(&self) -> &'static str {
        "trust_score"
    }

    fn local_schema(&self) -> StateSchema {
        StateSchema::new(3, 0)
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::OPEN
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add_trust", &["account", "amount"]).admin_only(),
            MethodDescriptor::new("slash_trust", &["account", "amount"]).admin_only(),
            MethodDescriptor::new("add_fitness", &["account", "amount"]).admin_only(),
            MethodDescriptor::new("add_eco", &["account", "amount"]).admin_only(),
        ]
    }

    fn on_opt_in(&self, ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new()
            .local_put(ctx.sender, TRUST_SCORE_KEY, 0u64)
            .local_put(ctx.sender, FITNESS_KEY, 0u64)
            .local_put(ctx.sender, ECO_POINTS_KEY, 0u64))
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        let op = TrustOp::decode(ctx.arg(0)?)?;
        ctx.require_creator()?;

        let target: Address = ctx.arg_address(1)?;
        let delta = ctx.arg_uint(2)?;
        let current = ctx.local_uint(&target, op.key())?;
        let updated = self.adjust(op, current, delta)?;

        Ok(Approval::new().local_put(target, op.key(), updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_saturates_and_floors() {
        let contract = TrustScore::new(&ContractsConfig::default());
        assert_eq!(contract.adjust(TrustOp::AddTrust, 95, 10), Ok(100));
        assert_eq!(contract.adjust(TrustOp::AddTrust, 40, 10), Ok(50));
        assert_eq!(contract.adjust(TrustOp::AddTrust, 100, u64::MAX), Ok(100));
        assert_eq!(contract.adjust(TrustOp::SlashTrust, 5, 10), Ok(0));
        assert_eq!(contract.adjust(TrustOp::AddEco, u64::MAX, 1), Err(Rejection::Overflow));
        assert_eq!(contract.adjust(TrustOp::AddFitness, 7, 3), Ok(10));
    }

    #[test]
    fn test_decode_rejects_unknown_operation() {
        assert_eq!(TrustOp::decode(b"add_eco"), Ok(TrustOp::AddEco));
        assert_eq!(
            TrustOp::decode(b"boost"),
            Err(Rejection::UnknownOperation("boost".to_string()))
        );
    }
}
