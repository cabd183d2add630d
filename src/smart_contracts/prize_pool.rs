// Prize pool: collects deposits and pays the whole balance to a winner
use tracing::debug;

use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor, StateSchema};
use crate::config::ContractsConfig;
use crate::primitives::primitives::{Address, Amount};
use crate::primitives::Rejection;

pub const ADMIN_KEY: &str = "admin";
pub const MATCH_ID_KEY: &str = "match_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOp {
    Payout { winner: Address },
    Deposit,
}

impl PoolOp {
    pub fn decode(ctx: &CallContext<'_>) -> Result<Self, Rejection> {
        match ctx.arg(0)? {
            b"payout" => Ok(PoolOp::Payout {
                winner: ctx.arg_address(1)?,
            }),
            b"deposit" => Ok(PoolOp::Deposit),
            other => Err(unknown_operation(other)),
        }
    }
}

pub struct PrizePool {
    /// Withheld from the payout so the application account can cover the fee
    fee_reserve: Amount,
}

impl PrizePool {
    pub fn new(config: &ContractsConfig) -> Self {
        Self {
            fee_reserve: config.min_fee,
        }
    }

    fn payout(&self, ctx: &CallContext<'_>, winner: Address) -> Verdict {
        let admin = ctx.global_bytes(ADMIN_KEY)?;
        if admin.as_slice() != ctx.sender.as_bytes() {
            return Err(Rejection::NotAdmin);
        }

        let balance = ctx.balance(&ctx.app_address());
        let prize = balance.checked_sub(self.fee_reserve).ok_or(Rejection::Underflow)?;
        debug!(%winner, prize, "paying out prize pool");
        Ok(Approval::new().pay(winner, prize))
    }
}

impl Contract for PrizePool {
    fn name(&self) -> &'static str {
        "prize_pool"
    }

    fn global_schema(&self) -> StateSchema {
        StateSchema::new(1, 1)
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::FROZEN
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("payout", &["winner"]).admin_only(),
            MethodDescriptor::new("deposit", &[]),
        ]
    }

    fn on_create(&self, ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new()
            .global_put(ADMIN_KEY, ctx.sender)
            .global_put(MATCH_ID_KEY, 0u64))
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match PoolOp::decode(ctx)? {
            PoolOp::Payout { winner } => self.payout(ctx, winner),
            PoolOp::Deposit => Ok(Approval::new()),
        }
    }
}
