//! Role census over a registry snapshot
//!
//! Counts how many registrations fall into each role bucket, and how many of
//! those are actually eligible for rewards. The valid counts are the
//! divisors for the equal-split pools; a zero valid count redirects the
//! whole pool to the community instead of dividing by it.

use serde::{Deserialize, Serialize};
use skein_core::Role;

use crate::registry::RegistrySnapshot;

/// Per-role census counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    /// Registrations carrying the role bit, regardless of deposit
    pub total: u64,
    /// Registrations eligible for the role's reward pool
    pub valid: u64,
    /// Registrations carrying the role bit with no deposit
    pub zero_deposit: u64,
}

/// Census of the whole registry, one bucket per role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCensus {
    pub edge: RoleCounts,
    pub archive: RoleCounts,
    pub auditor: RoleCounts,
    pub validator: RoleCounts,
}

impl RoleCensus {
    /// Classify every registration into its role buckets
    pub fn from_registry(registry: &RegistrySnapshot) -> Self {
        let mut census = Self::default();
        for (_, registration) in registry.iter() {
            for role in Role::ALL {
                if !registration.roles.contains(role) {
                    continue;
                }
                let counts = census.counts_mut(role);
                counts.total += 1;
                if registration.deposit == 0 {
                    counts.zero_deposit += 1;
                }
                if registration.is_valid_for(role) {
                    counts.valid += 1;
                }
            }
        }
        census
    }

    /// Counters for one role
    pub fn counts(&self, role: Role) -> RoleCounts {
        match role {
            Role::Edge => self.edge,
            Role::Archive => self.archive,
            Role::Auditor => self.auditor,
            Role::Validator => self.validator,
        }
    }

    fn counts_mut(&mut self, role: Role) -> &mut RoleCounts {
        match role {
            Role::Edge => &mut self.edge,
            Role::Archive => &mut self.archive,
            Role::Auditor => &mut self.auditor,
            Role::Validator => &mut self.validator,
        }
    }
}
