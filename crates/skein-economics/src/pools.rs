//! Reward pool breakdown
//!
//! Splits one round's total issuance into per-role pools by the configured
//! percentage table, and provides the equal-split allocation used for the
//! edge and archive pools.

use serde::{Deserialize, Serialize};

use crate::params::PoolRatios;

/// Scaled per-role pools carved from one round's issuance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPools {
    /// Total scaled issuance this round
    pub total: u128,
    /// Edge node pool (equal split across valid edge nodes)
    pub edge: u128,
    /// Archive node pool (equal split across valid archive nodes)
    pub archive: u128,
    /// Validator workload pool (per-group proportional split)
    pub validator: u128,
    /// Auditor workload pool (per-group proportional split)
    pub auditor: u128,
    /// Vote reward pool (proportional to votes received)
    pub vote: u128,
    /// Governance share of the community pool
    pub governance: u128,
}

impl RewardPools {
    /// Carve pools from a round's total issuance
    pub fn from_issuance(total: u128, ratios: &PoolRatios) -> Self {
        Self {
            total,
            edge: total * u128::from(ratios.edge_percent) / 100,
            archive: total * u128::from(ratios.archive_percent) / 100,
            validator: total * u128::from(ratios.validator_percent) / 100,
            auditor: total * u128::from(ratios.auditor_percent) / 100,
            vote: total * u128::from(ratios.vote_percent) / 100,
            governance: total * u128::from(ratios.governance_percent) / 100,
        }
    }

    /// Verify the split never exceeds the total (each pool truncates at most
    /// one scaled unit)
    pub fn verify(&self) -> bool {
        let sum = self.edge + self.archive + self.validator + self.auditor + self.vote
            + self.governance;
        sum <= self.total && self.total - sum < 6
    }
}

/// Equal split of a pool across `valid_count` nodes
///
/// Returns the per-node share and the amount left over: the whole pool when
/// no valid node exists, otherwise the division remainder.
pub fn split_equal(pool: u128, valid_count: u64) -> (u128, u128) {
    if valid_count == 0 {
        return (0, pool);
    }
    let share = pool / u128::from(valid_count);
    (share, pool - share * u128::from(valid_count))
}
