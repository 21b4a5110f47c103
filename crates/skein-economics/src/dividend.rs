//! # Dividend Splitting
//!
//! Splits each node's aggregate round reward into the share it keeps and
//! the share redistributed to its voters, per the node's own support ratio.
//!
//! Divisions truncate toward zero at every step; the residue stays with the
//! node's self share rather than being tracked per voter.

use serde::{Deserialize, Serialize};
use skein_core::{AccountId, TableIndex};
use std::collections::BTreeMap;

use crate::registry::RegistrySnapshot;
use crate::votes::VoteTally;

/// A node's reward split for one round
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeRewardShare {
    /// Scaled amount the node keeps
    pub self_amount: u128,

    /// Scaled dividend owed to each voter table
    pub dividends: BTreeMap<TableIndex, u128>,
}

impl NodeRewardShare {
    /// Scaled dividend total across all voter tables
    pub fn dividend_total(&self) -> u128 {
        self.dividends.values().sum()
    }
}

/// Split every node's aggregate reward by its support ratio
///
/// Nodes with a zero support-ratio numerator, or without a single
/// nonzero-weight voter, keep the full amount. A nonzero dividend is divided
/// across the node's voter tables proportional to each table's recorded
/// weight out of the node's total received votes.
pub fn split_node_rewards(
    node_rewards: &BTreeMap<AccountId, u128>,
    registry: &RegistrySnapshot,
    tally: &VoteTally,
) -> BTreeMap<AccountId, NodeRewardShare> {
    let mut shares = BTreeMap::new();

    for (account, total) in node_rewards {
        if *total == 0 {
            continue;
        }
        let mut share = NodeRewardShare {
            self_amount: *total,
            dividends: BTreeMap::new(),
        };

        if let Some(registration) = registry.get(account) {
            let node_votes = tally.node_votes.get(account).copied().unwrap_or(0);
            if registration.splits_dividend() && node_votes > 0 {
                let dividend = total * u128::from(registration.support_ratio_numerator)
                    / u128::from(registration.support_ratio_denominator);
                share.self_amount = total - dividend;

                if dividend > 0 {
                    if let Some(sources) = tally.node_vote_sources.get(account) {
                        for (table, weight) in sources {
                            if *weight == 0 {
                                continue;
                            }
                            let part =
                                dividend * u128::from(*weight) / u128::from(node_votes);
                            if part > 0 {
                                share.dividends.insert(*table, part);
                            }
                        }
                    }
                }
            }
        }

        shares.insert(*account, share);
    }

    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeRegistration;
    use crate::votes::{calc_votes, VoteSnapshot};
    use skein_core::{Role, RoleSet};

    fn account(seed: u8) -> AccountId {
        AccountId::from_public_key(&[seed])
    }

    fn tally_for(node: AccountId, weights: &[(TableIndex, u64)], registry: &mut RegistrySnapshot) -> VoteTally {
        let mut snapshot = VoteSnapshot::new();
        for (table, weight) in weights {
            snapshot.entry(*table).or_default().insert(node, *weight);
        }
        calc_votes(&snapshot, registry)
    }

    #[test]
    fn test_support_ratio_split() {
        let node = account(1);
        let mut registry = RegistrySnapshot::new();
        registry.insert(
            NodeRegistration::new(node, RoleSet::of(&[Role::Auditor]), 1_000)
                .with_support_ratio(30, 100),
        );
        let tally = tally_for(node, &[(1, 60), (2, 40)], &mut registry);

        let mut rewards = BTreeMap::new();
        rewards.insert(node, 1_000u128);
        let shares = split_node_rewards(&rewards, &registry, &tally);

        let share = &shares[&node];
        assert_eq!(share.self_amount, 700);
        assert_eq!(share.dividends[&1], 180);
        assert_eq!(share.dividends[&2], 120);
        assert_eq!(share.dividend_total(), 300);
    }

    #[test]
    fn test_zero_numerator_keeps_everything() {
        let node = account(1);
        let mut registry = RegistrySnapshot::new();
        registry.insert(NodeRegistration::new(
            node,
            RoleSet::of(&[Role::Auditor]),
            1_000,
        ));
        let tally = tally_for(node, &[(1, 50)], &mut registry);

        let mut rewards = BTreeMap::new();
        rewards.insert(node, 900u128);
        let shares = split_node_rewards(&rewards, &registry, &tally);

        assert_eq!(shares[&node].self_amount, 900);
        assert!(shares[&node].dividends.is_empty());
    }

    #[test]
    fn test_no_voters_keeps_everything() {
        let node = account(1);
        let mut registry = RegistrySnapshot::new();
        registry.insert(
            NodeRegistration::new(node, RoleSet::of(&[Role::Edge]), 1_000)
                .with_support_ratio(50, 100),
        );
        let tally = VoteTally::default();

        let mut rewards = BTreeMap::new();
        rewards.insert(node, 800u128);
        let shares = split_node_rewards(&rewards, &registry, &tally);

        assert_eq!(shares[&node].self_amount, 800);
        assert!(shares[&node].dividends.is_empty());
    }

    #[test]
    fn test_truncation_residue_stays_with_node() {
        let node = account(1);
        let mut registry = RegistrySnapshot::new();
        registry.insert(
            NodeRegistration::new(node, RoleSet::of(&[Role::Auditor]), 1_000)
                .with_support_ratio(1, 3),
        );
        let tally = tally_for(node, &[(1, 3), (2, 4)], &mut registry);

        let mut rewards = BTreeMap::new();
        rewards.insert(node, 100u128);
        let shares = split_node_rewards(&rewards, &registry, &tally);

        // dividend = 100 / 3 = 33, voter parts truncate again
        let share = &shares[&node];
        assert_eq!(share.self_amount, 67);
        assert_eq!(share.dividends[&1], 14);
        assert_eq!(share.dividends[&2], 18);
        assert!(share.self_amount + share.dividend_total() <= 100);
    }

    #[test]
    fn test_unregistered_node_keeps_everything() {
        let registry = RegistrySnapshot::new();
        let tally = VoteTally::default();

        let mut rewards = BTreeMap::new();
        rewards.insert(account(1), 500u128);
        let shares = split_node_rewards(&rewards, &registry, &tally);

        assert_eq!(shares[&account(1)].self_amount, 500);
    }
}
