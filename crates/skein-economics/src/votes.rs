//! # Vote Accounting
//!
//! Tallies the per-table vote snapshot into per-node totals and splits the
//! vote pool across eligible auditors proportional to votes received.
//!
//! Votes cast for ineligible accounts never dilute the pool (they stay out
//! of the eligible denominator) but are still recorded per node, so the
//! dividend stage sees every voter that backed a node.

use log::warn;
use serde::{Deserialize, Serialize};
use skein_core::{AccountId, Role, TableIndex};
use std::collections::BTreeMap;

use crate::census::RoleCensus;
use crate::error::{Result, RewardError};
use crate::registry::RegistrySnapshot;

/// Vote snapshot: per voter table, votes cast per candidate account
pub type VoteSnapshot = BTreeMap<TableIndex, BTreeMap<AccountId, u64>>;

/// Tallied votes for a round
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoteTally {
    /// Sum of votes cast for eligible auditor nodes
    pub total_eligible_votes: u64,

    /// Votes received per node, eligible or not
    pub node_votes: BTreeMap<AccountId, u64>,

    /// Per-node breakdown of which voter table contributed which weight
    pub node_vote_sources: BTreeMap<AccountId, BTreeMap<TableIndex, u64>>,
}

/// Tally the vote snapshot against the registry
///
/// Fills each registration's `accumulated_votes` for the round as a side
/// effect; the registry snapshot is round-scoped, so nothing persists.
pub fn calc_votes(snapshot: &VoteSnapshot, registry: &mut RegistrySnapshot) -> VoteTally {
    let mut tally = VoteTally::default();

    for (table, candidates) in snapshot {
        for (candidate, weight) in candidates {
            if *weight == 0 {
                continue;
            }
            *tally.node_votes.entry(*candidate).or_insert(0) += weight;
            *tally
                .node_vote_sources
                .entry(*candidate)
                .or_default()
                .entry(*table)
                .or_insert(0) += weight;

            let eligible = registry
                .get(candidate)
                .map(|reg| reg.is_valid_for(Role::Auditor))
                .unwrap_or(false);
            if eligible {
                tally.total_eligible_votes += weight;
            }
        }
    }

    for (candidate, votes) in &tally.node_votes {
        if let Some(registration) = registry.get_mut(candidate) {
            registration.accumulated_votes = *votes;
        }
    }

    tally
}

/// Result of allocating the vote reward pool
#[derive(Clone, Debug, Default)]
pub struct VoteRewardAllocation {
    /// Scaled vote reward per eligible auditor
    pub node_rewards: BTreeMap<AccountId, u128>,

    /// Scaled amount forfeited to the community pool
    pub forfeited: u128,
}

/// Split the vote pool across eligible auditors proportional to votes
///
/// With no valid auditors the pool is forfeited. A positive valid-auditor
/// count with zero eligible votes breaks the staking invariant that every
/// valid auditor is vote-backed, and aborts the round.
pub fn calc_vote_reward(
    vote_pool: u128,
    tally: &VoteTally,
    census: &RoleCensus,
    registry: &RegistrySnapshot,
) -> Result<VoteRewardAllocation> {
    if tally.total_eligible_votes == 0 {
        if census.auditor.valid == 0 {
            warn!("no valid auditors this round, forfeiting vote pool");
            return Ok(VoteRewardAllocation {
                node_rewards: BTreeMap::new(),
                forfeited: vote_pool,
            });
        }
        return Err(RewardError::VotesMissing {
            valid_auditors: census.auditor.valid,
        });
    }

    let mut allocation = VoteRewardAllocation::default();
    for (candidate, votes) in &tally.node_votes {
        let eligible = registry
            .get(candidate)
            .map(|reg| reg.is_valid_for(Role::Auditor))
            .unwrap_or(false);
        if !eligible {
            continue;
        }
        let share = vote_pool * u128::from(*votes) / u128::from(tally.total_eligible_votes);
        allocation.node_rewards.insert(*candidate, share);
    }

    Ok(allocation)
}
