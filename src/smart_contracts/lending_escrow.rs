// Item lending escrow: borrowers post collateral unless their trust score waives it
use std::sync::Arc;
use tracing::debug;

use super::oracle::{LocalStateOracle, TrustOracle};
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor, StateSchema};
use crate::config::ContractsConfig;
use crate::primitives::primitives::{Address, Amount, AppId};
use crate::primitives::Rejection;

pub const ITEM_KEY: &str = "item_id";
pub const COLLATERAL_KEY: &str = "collateral";
pub const BORROW_TIME_KEY: &str = "borrow_time";

/// Item slot value while nothing is borrowed
pub const NO_ITEM: &[u8] = b"none";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingOp {
    Borrow { item: Vec<u8> },
    Return { borrower: Address },
}

impl LendingOp {
    pub fn decode(ctx: &CallContext<'_>) -> Result<Self, Rejection> {
        match ctx.arg(0)? {
            b"borrow" => Ok(LendingOp::Borrow {
                item: ctx.arg(1)?.to_vec(),
            }),
            b"return" => Ok(LendingOp::Return {
                borrower: ctx.arg_address(1)?,
            }),
            other => Err(unknown_operation(other)),
        }
    }
}

/// Per account: idle (`item_id == "none"`) -> holding an item -> idle again
/// once the lender confirms the return.
pub struct LendingEscrow {
    trust_app: Option<AppId>,
    oracle: Option<Arc<dyn TrustOracle + Send + Sync>>,
    trust_threshold: u64,
    min_collateral: Amount,
}

impl LendingEscrow {
    pub fn new(config: &ContractsConfig) -> Self {
        Self {
            trust_app: config.trust_app(),
            oracle: None,
            trust_threshold: config.trust_threshold,
            min_collateral: config.min_collateral,
        }
    }

    /// Use a fixed score source instead of reading the trust application
    pub fn with_oracle(mut self, oracle: Arc<dyn TrustOracle + Send + Sync>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    fn trust_score(&self, ctx: &CallContext<'_>, account: &Address) -> Option<u64> {
        if let Some(oracle) = &self.oracle {
            return oracle.score(account);
        }
        let app = self.trust_app?;
        LocalStateOracle::new(ctx.view(), app).score(account)
    }

    /// Payment at position 0 locked as collateral
    fn collateral_payment(&self, ctx: &CallContext<'_>) -> Result<Amount, Rejection> {
        ctx.group.require_size(2)?;
        let (_, payment) = ctx.group.payment_at(0)?;

        if payment.receiver != ctx.app_address() {
            return Err(Rejection::mismatch(0, "collateral must be paid to the escrow"));
        }
        if payment.amount < self.min_collateral {
            return Err(Rejection::mismatch(
                0,
                format!("collateral {} below minimum {}", payment.amount, self.min_collateral),
            ));
        }
        Ok(payment.amount)
    }

    fn borrow(&self, ctx: &CallContext<'_>, item: Vec<u8>) -> Verdict {
        if item.is_empty() || item == NO_ITEM {
            return Err(Rejection::MalformedArgument("item id must name an item".to_string()));
        }

        let held = ctx.local_bytes(&ctx.sender, ITEM_KEY)?;
        if held != NO_ITEM {
            return Err(Rejection::precondition("an item is already borrowed"));
        }

        let collateral = match self.trust_score(ctx, &ctx.sender) {
            Some(score) if score >= self.trust_threshold => {
                debug!(borrower = %ctx.sender, score, "collateral waived by trust score");
                0
            }
            _ => self.collateral_payment(ctx)?,
        };

        Ok(Approval::new()
            .local_put(ctx.sender, ITEM_KEY, item)
            .local_put(ctx.sender, COLLATERAL_KEY, collateral)
            .local_put(ctx.sender, BORROW_TIME_KEY, ctx.latest_timestamp()))
    }

    fn confirm_return(&self, ctx: &CallContext<'_>, borrower: Address) -> Verdict {
        ctx.require_creator()?;

        let held = ctx.local_bytes(&borrower, ITEM_KEY)?;
        if held == NO_ITEM {
            return Err(Rejection::precondition("borrower holds no item"));
        }
        let collateral = ctx.local_uint(&borrower, COLLATERAL_KEY)?;

        let approval = Approval::new()
            .local_put(borrower, ITEM_KEY, NO_ITEM)
            .local_put(borrower, COLLATERAL_KEY, 0u64)
            .local_put(borrower, BORROW_TIME_KEY, 0u64);

        if collateral > 0 {
            return Ok(approval.pay(borrower, collateral));
        }
        Ok(approval)
    }
}

impl Contract for LendingEscrow {
    fn name(&self) -> &'static str {
        "lending_escrow"
    }

    fn local_schema(&self) -> StateSchema {
        StateSchema::new(2, 1)
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::FROZEN
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("borrow", &["item_id"])
                .with_companion("payment >= minimum collateral to the escrow, unless trusted"),
            MethodDescriptor::new("return", &["borrower"]).admin_only(),
        ]
    }

    fn on_opt_in(&self, ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new()
            .local_put(ctx.sender, ITEM_KEY, NO_ITEM)
            .local_put(ctx.sender, COLLATERAL_KEY, 0u64)
            .local_put(ctx.sender, BORROW_TIME_KEY, 0u64))
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match LendingOp::decode(ctx)? {
            LendingOp::Borrow { item } => self.borrow(ctx, item),
            LendingOp::Return { borrower } => self.confirm_return(ctx, borrower),
        }
    }
}
