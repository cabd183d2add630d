// Fixed-deposit escrow: the admin releases a preset refund to a borrower
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor};
use crate::config::ContractsConfig;
use crate::primitives::primitives::Amount;

pub struct DepositEscrow {
    refund: Amount,
}

impl DepositEscrow {
    pub fn new(config: &ContractsConfig) -> Self {
        Self {
            refund: config.deposit_refund,
        }
    }
}

impl Contract for DepositEscrow {
    fn name(&self) -> &'static str {
        "deposit_escrow"
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::CLOSED
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![MethodDescriptor::new("return_deposit", &["borrower"]).admin_only()]
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match ctx.arg(0)? {
            b"return_deposit" => {
                ctx.require_creator()?;
                let borrower = ctx.arg_address(1)?;
                Ok(Approval::new().pay(borrower, self.refund))
            }
            other => Err(unknown_operation(other)),
        }
    }
}
