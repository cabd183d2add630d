// Civic rewards: admin-directed payouts from the application account
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor};

#[derive(Debug, Default)]
pub struct CivicRewards;

impl CivicRewards {
    pub fn new() -> Self {
        Self
    }
}

impl Contract for CivicRewards {
    fn name(&self) -> &'static str {
        "civic_rewards"
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::CLOSED
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![MethodDescriptor::new("payout", &["receiver", "amount"]).admin_only()]
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match ctx.arg(0)? {
            b"payout" => {
                ctx.require_creator()?;
                let receiver = ctx.arg_address(1)?;
                let amount = ctx.arg_uint(2)?;
                Ok(Approval::new().pay(receiver, amount))
            }
            other => Err(unknown_operation(other)),
        }
    }
}
