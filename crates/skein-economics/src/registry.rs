//! Node registry snapshot
//!
//! Read-only view of the registration contract's state, taken once per
//! settlement round. The engine never mutates registrations in place except
//! to fill in the round's accumulated vote counts, which the registry itself
//! does not persist.

use serde::{Deserialize, Serialize};
use skein_core::{AccountId, MicroSkn, Role, RoleSet, Tick};
use std::collections::BTreeMap;

/// One registered network participant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRegistration {
    /// Account that owns the registration
    pub account: AccountId,

    /// Roles the account registered for
    pub roles: RoleSet,

    /// Deposited stake
    pub deposit: MicroSkn,

    /// Share of earned reward redistributed to voters: numerator
    pub support_ratio_numerator: u64,

    /// Share of earned reward redistributed to voters: denominator
    pub support_ratio_denominator: u64,

    /// Registration tick
    pub registered_at: Tick,

    /// Votes accumulated for this node in the current round. Filled in by
    /// the settlement engine, never persisted by the registry.
    #[serde(default)]
    pub accumulated_votes: u64,
}

impl NodeRegistration {
    /// Create a registration keeping the full reward (no dividend)
    pub fn new(account: AccountId, roles: RoleSet, deposit: MicroSkn) -> Self {
        Self {
            account,
            roles,
            deposit,
            support_ratio_numerator: 0,
            support_ratio_denominator: 100,
            registered_at: 0,
            accumulated_votes: 0,
        }
    }

    /// Set the voter dividend ratio
    pub fn with_support_ratio(mut self, numerator: u64, denominator: u64) -> Self {
        self.support_ratio_numerator = numerator;
        self.support_ratio_denominator = denominator;
        self
    }

    /// Check whether any stake is deposited
    pub fn has_deposit(&self) -> bool {
        self.deposit > 0
    }

    /// Internal consistency of the record itself
    pub fn is_consistent(&self) -> bool {
        self.account != AccountId::ZERO
            && self.roles.is_well_formed()
            && self.support_ratio_denominator > 0
            && self.support_ratio_numerator <= self.support_ratio_denominator
    }

    /// Validity predicate used by the census and the allocators.
    ///
    /// Edge and validator eligibility only needs a deposit; archive and
    /// auditor eligibility additionally requires a consistent record, since
    /// those roles are trusted with history and audit duties.
    pub fn is_valid_for(&self, role: Role) -> bool {
        if !self.roles.contains(role) || !self.has_deposit() {
            return false;
        }
        match role {
            Role::Edge | Role::Validator => true,
            Role::Archive | Role::Auditor => self.is_consistent(),
        }
    }

    /// Check whether this node redistributes part of its reward
    pub fn splits_dividend(&self) -> bool {
        self.support_ratio_numerator > 0
    }
}

/// Registry snapshot consumed by one settlement round
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    nodes: BTreeMap<AccountId, NodeRegistration>,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a registration
    pub fn insert(&mut self, registration: NodeRegistration) {
        self.nodes.insert(registration.account, registration);
    }

    /// Look up a registration
    pub fn get(&self, account: &AccountId) -> Option<&NodeRegistration> {
        self.nodes.get(account)
    }

    /// Look up a registration for vote-count filling
    pub fn get_mut(&mut self, account: &AccountId) -> Option<&mut NodeRegistration> {
        self.nodes.get_mut(account)
    }

    /// Check whether an account is registered
    pub fn contains(&self, account: &AccountId) -> bool {
        self.nodes.contains_key(account)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate registrations in account order
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &NodeRegistration)> {
        self.nodes.iter()
    }
}
