// Core primitives shared by every contract and the execution harness
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512_256};

use super::error::Rejection;

pub type Amount = u64;
pub type Round = u64;
pub type Timestamp = u64;

/// 32-byte account address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Address {
    pub const LEN: usize = 32;

    pub fn zero() -> Self {
        Address([0u8; 32])
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Deterministic address derived from a seed, handy for fixtures and demos
    pub fn from_seed(seed: &[u8]) -> Self {
        Address(hash_data(seed).0)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Address(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Address(bytes))
    }
}

/// Application identifier. Zero marks a creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub u64);

impl AppId {
    pub const CREATE: AppId = AppId(0);

    pub fn is_create(&self) -> bool {
        self.0 == 0
    }

    /// Escrow account controlled by this application
    pub fn address(&self) -> Address {
        application_address(*self)
    }
}

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "app:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// 8-byte big-endian key used for per-asset storage records
    pub fn box_name(&self) -> [u8; 8] {
        itob(self.0)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "asset:{}", self.0)
    }
}

/// Transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(#[serde(with = "hex::serde")] pub [u8; 32]);

impl TxId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Platform constants
pub struct Policy;

impl Policy {
    /// Minimum fee for an outer transaction, in micro-units
    pub const MIN_TXN_FEE: Amount = 1_000;

    /// Largest atomic group accepted by the harness
    pub const MAX_GROUP_SIZE: usize = 16;

    /// First identifier handed out for applications and assets
    pub const FIRST_INDEX: u64 = 1_000;

    /// Application call argument limit
    pub const MAX_APP_ARGS: usize = 16;
}

pub fn hash_data(data: &[u8]) -> TxId {
    let mut hasher = Sha256::new();
    hasher.update(data);
    TxId(hasher.finalize().into())
}

pub fn hash_json<T: serde::Serialize>(data: &T) -> std::result::Result<TxId, serde_json::Error> {
    let json = serde_json::to_vec(data)?;
    Ok(hash_data(&json))
}

/// Address of the account an application controls: SHA-512/256 over "appID" || itob(id)
pub fn application_address(app_id: AppId) -> Address {
    let mut hasher = Sha512_256::new();
    hasher.update(b"appID");
    hasher.update(itob(app_id.0));
    Address(hasher.finalize().into())
}

pub fn itob(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Big-endian bytes to integer. More than 8 bytes is an error, empty is zero.
pub fn btoi(bytes: &[u8]) -> std::result::Result<u64, Rejection> {
    if bytes.len() > 8 {
        return Err(Rejection::MalformedArgument(format!(
            "btoi input of {} bytes exceeds 8",
            bytes.len()
        )));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}
