//! # Round Audit Record
//!
//! Write-once-per-round snapshot of every ratio the engine used and every
//! node's computed reward components, kept for transparency and monitoring.
//! The record is overwritten by the next settled round; it is never read
//! back by the engine itself.

use log::warn;
use serde::{Deserialize, Serialize};
use skein_core::{AccountId, MicroSkn, Tick};
use skein_storage::{get_json, set_json, KeyValueStore};
use std::collections::BTreeMap;

use crate::census::RoleCensus;
use crate::error::{Result, RewardError};
use crate::params::RewardParams;
use crate::pools::RewardPools;

/// Store key for the latest round's audit record
pub const ISSUE_DETAIL_KEY: &str = "reward:issue_detail";

/// Per-node reward components for one round, scaled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRewardDetail {
    /// Edge pool share
    pub edge: u128,
    /// Archive pool share
    pub archive: u128,
    /// Auditor workload reward
    pub auditor_workload: u128,
    /// Validator workload reward
    pub validator_workload: u128,
    /// Vote reward
    pub vote: u128,
    /// Final amount kept after the dividend split
    pub self_reward: u128,
    /// Dividend redistributed to the node's voters
    pub dividend: u128,
}

impl NodeRewardDetail {
    /// Aggregate reward before the dividend split
    pub fn earned_total(&self) -> u128 {
        self.edge + self.archive + self.auditor_workload + self.validator_workload + self.vote
    }
}

/// Audit snapshot of one settlement round
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IssueDetail {
    /// Tick the round settled at
    pub settled_at: Tick,

    /// Ticks since activation at settlement
    pub elapsed: Tick,

    /// Parameters the round ran with
    pub params: RewardParams,

    /// Role census of the registry snapshot
    pub census: RoleCensus,

    /// Total scaled issuance
    pub total_issuance: u128,

    /// Pool breakdown of the issuance
    pub pools: RewardPools,

    /// Scaled amount forfeited or left undistributed
    pub forfeited: u128,

    /// Whole units actually transferred
    pub actual_issuance: MicroSkn,

    /// Whole units swept to the treasury
    pub community_issuance: MicroSkn,

    /// Per-node reward components
    pub node_details: BTreeMap<AccountId, NodeRewardDetail>,
}

/// Persist the round's audit record, replacing the previous round's
pub fn store_issue_detail<S: KeyValueStore>(store: &S, detail: &IssueDetail) -> Result<()> {
    set_json(store, ISSUE_DETAIL_KEY, detail)
        .map_err(|e| RewardError::Serialization(e.to_string()))
}

/// Load the latest audit record, if any
///
/// The record is disposable; a corrupt one is dropped with a warning rather
/// than failing the caller.
pub fn load_issue_detail<S: KeyValueStore>(store: &S) -> Option<IssueDetail> {
    match get_json(store, ISSUE_DETAIL_KEY) {
        Ok(detail) => detail,
        Err(e) => {
            warn!("dropping corrupt audit record: {e}");
            None
        }
    }
}
