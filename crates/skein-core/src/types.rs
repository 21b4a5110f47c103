//! Core type definitions for Datachain Skein
//!
//! This module defines the identifier and role primitives shared by the
//! settlement engine and its collaborators. Accounts follow the protocol
//! convention of 256-bit BLAKE3-derived identifiers.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Index of a sharded settlement table contract
pub type TableIndex = u32;

/// Identifier of a consensus group (cluster)
pub type ClusterId = u32;

/// Amount in smallest token units (micro-SKN)
pub type MicroSkn = u128;

/// AccountId - Unique identifier for on-chain accounts
///
/// Node and voter accounts are derived as BLAKE3(public_key); contract
/// accounts are derived from a domain-separated preimage. Serialized as a
/// hex string so accounts can key JSON maps in persisted records.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AccountId {
    /// 256-bit BLAKE3 hash
    id: [u8; 32],
}

impl AccountId {
    /// Create a new AccountId from raw bytes
    pub fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive an AccountId from a public key using BLAKE3
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let hash = blake3::hash(public_key);
        Self {
            id: *hash.as_bytes(),
        }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut id = [0u8; 32];
        id.copy_from_slice(&bytes);
        Ok(Self { id })
    }

    /// Settlement table owning this account: the low bits of the identifier
    /// modulo the table count. The zero account is reserved and maps to no
    /// table.
    pub fn ledger_table(&self, table_count: u32) -> Option<TableIndex> {
        if table_count == 0 || *self == Self::ZERO {
            return None;
        }
        Some(u32::from(self.id[31]) % table_count)
    }

    /// Zero/null AccountId (reserved)
    pub const ZERO: Self = Self { id: [0u8; 32] };
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Network role a registered account may hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Edge node: serves client traffic at the network boundary
    Edge,
    /// Archive node: retains full history
    Archive,
    /// Auditor node: audits validator groups, backed by voter stake
    Auditor,
    /// Validator node: produces and certifies blocks
    Validator,
}

impl Role {
    /// All roles, in reward-table order
    pub const ALL: [Role; 4] = [Role::Edge, Role::Archive, Role::Auditor, Role::Validator];

    /// Bit assigned to this role in a registration bitmask
    pub fn bit(&self) -> u8 {
        match self {
            Self::Edge => 0b0001,
            Self::Archive => 0b0010,
            Self::Auditor => 0b0100,
            Self::Validator => 0b1000,
        }
    }

    /// Get role name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Archive => "archive",
            Self::Auditor => "auditor",
            Self::Validator => "validator",
        }
    }
}

/// Bitmask of the roles an account registered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(u8);

impl RoleSet {
    /// No roles registered
    pub const EMPTY: Self = Self(0);

    /// Build a role set from a slice of roles
    pub fn of(roles: &[Role]) -> Self {
        let mut set = Self::EMPTY;
        for role in roles {
            set = set.with(*role);
        }
        set
    }

    /// Add a role to the set
    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Check whether the set includes a role
    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Check whether no role is registered
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Raw bitmask value
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// A registration mask is well formed when it names at least one role
    /// and carries no unknown bits
    pub fn is_well_formed(&self) -> bool {
        !self.is_empty() && self.0 & 0b1111 == self.0
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Role::ALL
            .iter()
            .filter(|r| self.contains(**r))
            .map(|r| r.name())
            .collect();
        write!(f, "{}", names.join("+"))
    }
}
