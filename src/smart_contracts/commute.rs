// Commute check-in: riders escrow a trip fare that goes to the driver or back to the rider
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor, StateSchema};
use crate::primitives::primitives::{Address, Amount};
use crate::primitives::Rejection;

pub const ROLE_KEY: &str = "role";
pub const TRIP_ACTIVE_KEY: &str = "trip_active";
pub const COLLATERAL_KEY: &str = "collateral";

pub const NO_ROLE: &[u8] = b"none";
pub const DRIVER: &[u8] = b"driver";
pub const RIDER: &[u8] = b"rider";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommuteOp {
    RegisterDriver,
    RegisterRider,
    StartTrip,
    EndTrip { driver: Address },
    CancelTrip,
}

impl CommuteOp {
    pub fn decode(ctx: &CallContext<'_>) -> Result<Self, Rejection> {
        match ctx.arg(0)? {
            b"register_driver" => Ok(CommuteOp::RegisterDriver),
            b"register_rider" => Ok(CommuteOp::RegisterRider),
            b"start_trip" => Ok(CommuteOp::StartTrip),
            b"end_trip" => Ok(CommuteOp::EndTrip {
                driver: ctx.arg_address(1)?,
            }),
            b"cancel_trip" => Ok(CommuteOp::CancelTrip),
            other => Err(unknown_operation(other)),
        }
    }
}

#[derive(Debug, Default)]
pub struct CommuteCheckin;

impl CommuteCheckin {
    pub fn new() -> Self {
        Self
    }

    fn register(ctx: &CallContext<'_>, role: &[u8]) -> Verdict {
        ctx.require_opted_in(&ctx.sender)?;
        Ok(Approval::new().local_put(ctx.sender, ROLE_KEY, role))
    }

    fn start_trip(ctx: &CallContext<'_>) -> Verdict {
        ctx.group.require_size(2)?;
        let (_, payment) = ctx.group.payment_at(0)?;
        if payment.receiver != ctx.app_address() {
            return Err(Rejection::mismatch(0, "fare must be paid to the application"));
        }
        if payment.amount == 0 {
            return Err(Rejection::mismatch(0, "fare must be positive"));
        }

        if ctx.local_bytes(&ctx.sender, ROLE_KEY)? != RIDER {
            return Err(Rejection::precondition("only riders start trips"));
        }
        if ctx.local_uint(&ctx.sender, TRIP_ACTIVE_KEY)? != 0 {
            return Err(Rejection::precondition("trip already active"));
        }

        Ok(Approval::new()
            .local_put(ctx.sender, TRIP_ACTIVE_KEY, 1u64)
            .local_put(ctx.sender, COLLATERAL_KEY, payment.amount))
    }

    /// Escrowed fare of the sender's active trip
    fn active_fare(ctx: &CallContext<'_>) -> Result<Amount, Rejection> {
        if ctx.local_uint(&ctx.sender, TRIP_ACTIVE_KEY)? != 1 {
            return Err(Rejection::precondition("no active trip"));
        }
        ctx.local_uint(&ctx.sender, COLLATERAL_KEY)
    }

    fn settle(ctx: &CallContext<'_>, receiver: Address, fare: Amount) -> Verdict {
        Ok(Approval::new()
            .local_put(ctx.sender, TRIP_ACTIVE_KEY, 0u64)
            .local_put(ctx.sender, COLLATERAL_KEY, 0u64)
            .pay(receiver, fare))
    }
}

impl Contract for CommuteCheckin {
    fn name(&self) -> &'static str {
        "commute_checkin"
    }

    fn local_schema(&self) -> StateSchema {
        StateSchema::new(2, 1)
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::OPEN
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("register_driver", &[]),
            MethodDescriptor::new("register_rider", &[]),
            MethodDescriptor::new("start_trip", &[]).with_companion("positive fare payment to the application"),
            MethodDescriptor::new("end_trip", &["driver"]),
            MethodDescriptor::new("cancel_trip", &[]),
        ]
    }

    fn on_opt_in(&self, ctx: &CallContext<'_>) -> Verdict {
        Ok(Approval::new()
            .local_put(ctx.sender, ROLE_KEY, NO_ROLE)
            .local_put(ctx.sender, TRIP_ACTIVE_KEY, 0u64)
            .local_put(ctx.sender, COLLATERAL_KEY, 0u64))
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match CommuteOp::decode(ctx)? {
            CommuteOp::RegisterDriver => Self::register(ctx, DRIVER),
            CommuteOp::RegisterRider => Self::register(ctx, RIDER),
            CommuteOp::StartTrip => Self::start_trip(ctx),
            CommuteOp::EndTrip { driver } => {
                let fare = Self::active_fare(ctx)?;
                if fare == 0 {
                    return Err(Rejection::precondition("no fare escrowed"));
                }
                Self::settle(ctx, driver, fare)
            }
            CommuteOp::CancelTrip => {
                let fare = Self::active_fare(ctx)?;
                Self::settle(ctx, ctx.sender, fare)
            }
        }
    }
}
