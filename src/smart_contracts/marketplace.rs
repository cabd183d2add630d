// Asset marketplace: one storage record per listed asset, escrowed by the application
use super::vm::{Approval, CallContext, Verdict};
use super::{unknown_operation, CompletionPolicy, Contract, MethodDescriptor};
use crate::primitives::primitives::{itob, Address, Amount, AssetId};
use crate::primitives::Rejection;

/// Stored record: 32-byte seller followed by the 8-byte big-endian price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub seller: Address,
    pub price: Amount,
}

impl Listing {
    pub const ENCODED_LEN: usize = Address::LEN + 8;

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::ENCODED_LEN);
        bytes.extend_from_slice(self.seller.as_bytes());
        bytes.extend_from_slice(&itob(self.price));
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Rejection> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(Rejection::precondition(format!(
                "listing record is {} bytes, expected {}",
                bytes.len(),
                Self::ENCODED_LEN
            )));
        }
        let (seller, price) = bytes.split_at(Address::LEN);
        let seller = Address::from_slice(seller).ok_or_else(|| Rejection::precondition("corrupt seller"))?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(price);
        Ok(Self {
            seller,
            price: u64::from_be_bytes(raw),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketOp {
    List { asset: AssetId, price: Amount },
    Buy { asset: AssetId },
    Delist { asset: AssetId },
}

impl MarketOp {
    pub fn decode(ctx: &CallContext<'_>) -> Result<Self, Rejection> {
        let op = ctx.arg(0)?;
        let asset = || ctx.arg_uint(1).map(AssetId);
        match op {
            b"list" => Ok(MarketOp::List {
                asset: asset()?,
                price: ctx.arg_uint(2)?,
            }),
            b"buy" => Ok(MarketOp::Buy { asset: asset()? }),
            b"delist" => Ok(MarketOp::Delist { asset: asset()? }),
            other => Err(unknown_operation(other)),
        }
    }
}

#[derive(Debug, Default)]
pub struct Marketplace;

impl Marketplace {
    pub fn new() -> Self {
        Self
    }

    fn listing(ctx: &CallContext<'_>, asset: AssetId) -> Result<Listing, Rejection> {
        let record = ctx
            .box_get(&asset.box_name())
            .ok_or_else(|| Rejection::BoxMissing(asset.to_string()))?;
        Listing::decode(&record)
    }

    fn list(&self, ctx: &CallContext<'_>, asset: AssetId, price: Amount) -> Verdict {
        ctx.group.require_size(2)?;
        let (sender, transfer) = ctx.group.asset_transfer_at(0)?;

        if transfer.asset_id != asset {
            return Err(Rejection::mismatch(0, format!("transfers {}, listing {}", transfer.asset_id, asset)));
        }
        if transfer.receiver != ctx.app_address() {
            return Err(Rejection::mismatch(0, "asset must be sent to the marketplace"));
        }
        if transfer.amount != 1 {
            return Err(Rejection::mismatch(0, "exactly one unit must be escrowed"));
        }
        if *sender != ctx.sender {
            return Err(Rejection::mismatch(0, "asset must come from the seller"));
        }

        let name = asset.box_name();
        if ctx.box_get(&name).is_some() {
            return Err(Rejection::BoxExists(asset.to_string()));
        }

        let listing = Listing {
            seller: ctx.sender,
            price,
        };
        Ok(Approval::new().box_put(&name, listing.encode()))
    }

    fn buy(&self, ctx: &CallContext<'_>, asset: AssetId) -> Verdict {
        let listing = Self::listing(ctx, asset)?;

        ctx.group.require_size(2)?;
        let (payer, payment) = ctx.group.payment_at(0)?;
        if *payer != ctx.sender {
            return Err(Rejection::mismatch(0, "payment must come from the buyer"));
        }
        if payment.receiver != listing.seller {
            return Err(Rejection::mismatch(0, "payment must go to the seller"));
        }
        if payment.amount != listing.price {
            return Err(Rejection::mismatch(
                0,
                format!("paid {}, price is {}", payment.amount, listing.price),
            ));
        }

        Ok(Approval::new()
            .box_delete(&asset.box_name())
            .send_asset(asset, ctx.sender, 1))
    }

    fn delist(&self, ctx: &CallContext<'_>, asset: AssetId) -> Verdict {
        let listing = Self::listing(ctx, asset)?;
        if listing.seller != ctx.sender {
            return Err(Rejection::precondition("only the seller may delist"));
        }

        Ok(Approval::new()
            .box_delete(&asset.box_name())
            .send_asset(asset, ctx.sender, 1))
    }
}

impl Contract for Marketplace {
    fn name(&self) -> &'static str {
        "marketplace"
    }

    /// Storage records need AVM 8
    fn avm_version(&self) -> u8 {
        8
    }

    fn completion_policy(&self) -> CompletionPolicy {
        CompletionPolicy::OPEN
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("list", &["asset_id", "price"])
                .with_companion("transfer of 1 unit of the asset from the seller to the marketplace"),
            MethodDescriptor::new("buy", &["asset_id"])
                .with_companion("payment of the listed price from the buyer to the seller"),
            MethodDescriptor::new("delist", &["asset_id"]),
        ]
    }

    fn on_call(&self, ctx: &CallContext<'_>) -> Verdict {
        match MarketOp::decode(ctx)? {
            MarketOp::List { asset, price } => self.list(ctx, asset, price),
            MarketOp::Buy { asset } => self.buy(ctx, asset),
            MarketOp::Delist { asset } => self.delist(ctx, asset),
        }
    }
}
