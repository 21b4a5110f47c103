//! Settlement parameters
//!
//! Governance-adjustable knobs for the issuance schedule and the reward
//! split. Parameters are validated once at engine construction; a live
//! engine never sees an inconsistent table.

use serde::{Deserialize, Serialize};
use skein_core::Tick;

use crate::error::{Result, RewardError};

/// Percentage split of each round's issuance across reward pools
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRatios {
    /// Edge node pool, percent
    pub edge_percent: u8,
    /// Archive node pool, percent
    pub archive_percent: u8,
    /// Validator workload pool, percent
    pub validator_percent: u8,
    /// Auditor workload pool, percent
    pub auditor_percent: u8,
    /// Vote reward pool, percent
    pub vote_percent: u8,
    /// Governance/community pool, percent
    pub governance_percent: u8,
}

impl PoolRatios {
    /// Sum of all pool percentages
    pub fn total(&self) -> u32 {
        u32::from(self.edge_percent)
            + u32::from(self.archive_percent)
            + u32::from(self.validator_percent)
            + u32::from(self.auditor_percent)
            + u32::from(self.vote_percent)
            + u32::from(self.governance_percent)
    }
}

impl Default for PoolRatios {
    fn default() -> Self {
        Self {
            edge_percent: 2,
            archive_percent: 4,
            validator_percent: 60,
            auditor_percent: 10,
            vote_percent: 20,
            governance_percent: 4,
        }
    }
}

/// Reward engine parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardParams {
    /// Minimum ticks between settlements
    pub reward_issue_interval: Tick,

    /// Annual issuance floor as a percent of lifetime supply
    pub min_ratio_annual_total_reward: u64,

    /// Percent of the remaining reserve issued per annum
    pub additional_issue_year_ratio: u64,

    /// Pool split applied to each round's issuance
    pub ratios: PoolRatios,

    /// Groups whose filtered total workload is at or below this forfeit
    /// their pool
    pub zero_workload_threshold: u64,

    /// Number of sharded settlement tables
    pub table_count: u32,

    /// Maximum registry read-height advance per timer tick
    pub max_read_step: u64,
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            // Daily settlement at one tick per second
            reward_issue_interval: 24 * 3600,
            min_ratio_annual_total_reward: 2,
            additional_issue_year_ratio: 8,
            ratios: PoolRatios::default(),
            zero_workload_threshold: 0,
            table_count: 64,
            max_read_step: 32,
        }
    }
}

impl RewardParams {
    /// Validate the parameter set
    pub fn validate(&self) -> Result<()> {
        if self.reward_issue_interval == 0 {
            return Err(RewardError::InvalidParameter {
                name: "reward_issue_interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.ratios.total() != 100 {
            return Err(RewardError::InvalidParameter {
                name: "ratios",
                reason: format!("pool percentages sum to {}, expected 100", self.ratios.total()),
            });
        }

        if self.additional_issue_year_ratio == 0 || self.additional_issue_year_ratio > 100 {
            return Err(RewardError::InvalidParameter {
                name: "additional_issue_year_ratio",
                reason: "must be between 1 and 100".to_string(),
            });
        }

        if self.min_ratio_annual_total_reward > 100 {
            return Err(RewardError::InvalidParameter {
                name: "min_ratio_annual_total_reward",
                reason: "must not exceed 100".to_string(),
            });
        }

        if self.table_count == 0 {
            return Err(RewardError::InvalidParameter {
                name: "table_count",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.max_read_step == 0 {
            return Err(RewardError::InvalidParameter {
                name: "max_read_step",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
