//! # Workload Allocation
//!
//! Splits a role's workload pool across consensus groups and, within each
//! group, across member nodes proportional to measured work.
//!
//! Filtering runs in two passes per group: leaders that are unregistered,
//! role-invalid, or deposit-free are dropped and their work leaves the group
//! total; groups left empty or at/below the zero-workload threshold then
//! forfeit their whole pool. Forfeits are returned to the caller explicitly,
//! never folded into global totals behind its back.

use log::warn;
use serde::{Deserialize, Serialize};
use skein_core::{AccountId, ClusterId, Role};
use std::collections::BTreeMap;

use crate::registry::RegistrySnapshot;

/// One consensus group's workload ledger for a round
///
/// Produced by the upstream workload collector, consumed and then cleared by
/// the settlement engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClusterWorkload {
    /// Consensus group identifier
    pub cluster_id: ClusterId,

    /// Accumulated unit-of-work count per leader account
    pub leader_workloads: BTreeMap<AccountId, u64>,

    /// Total workload across all leaders
    pub cluster_total_workload: u64,
}

impl ClusterWorkload {
    pub fn new(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            leader_workloads: BTreeMap::new(),
            cluster_total_workload: 0,
        }
    }

    /// Record work for a leader
    pub fn record(&mut self, leader: AccountId, work: u64) {
        *self.leader_workloads.entry(leader).or_insert(0) += work;
        self.cluster_total_workload += work;
    }
}

/// Result of allocating one role's workload pools
#[derive(Clone, Debug, Default)]
pub struct WorkloadAllocation {
    /// Scaled reward per node, summed across the groups it led in
    pub node_rewards: BTreeMap<AccountId, u128>,

    /// Scaled amount forfeited to the community pool
    pub forfeited: u128,
}

/// Split `group_pool` within each group of `workloads`, filtering invalid
/// leaders against the registry under `role`'s validity predicate
pub fn allocate_workload_rewards(
    role: Role,
    workloads: &[ClusterWorkload],
    group_pool: u128,
    zero_workload_threshold: u64,
    registry: &RegistrySnapshot,
) -> WorkloadAllocation {
    let mut allocation = WorkloadAllocation::default();

    for group in workloads {
        let mut survivors: BTreeMap<AccountId, u64> = BTreeMap::new();
        let mut surviving_total: u64 = 0;
        for (leader, work) in &group.leader_workloads {
            let valid = registry
                .get(leader)
                .map(|reg| reg.is_valid_for(role))
                .unwrap_or(false);
            if !valid {
                warn!(
                    "cluster {}: dropping workload {} of invalid {} leader {}",
                    group.cluster_id,
                    work,
                    role.name(),
                    leader
                );
                continue;
            }
            survivors.insert(*leader, *work);
            surviving_total += work;
        }

        if survivors.is_empty() {
            warn!(
                "cluster {}: no valid {} leaders left, forfeiting group pool",
                group.cluster_id,
                role.name()
            );
            allocation.forfeited += group_pool;
            continue;
        }

        if surviving_total <= zero_workload_threshold {
            warn!(
                "cluster {}: total {} workload {} at or below threshold {}, forfeiting group pool",
                group.cluster_id,
                role.name(),
                surviving_total,
                zero_workload_threshold
            );
            allocation.forfeited += group_pool;
            continue;
        }

        for (leader, work) in &survivors {
            let share = group_pool * u128::from(*work) / u128::from(surviving_total);
            *allocation.node_rewards.entry(*leader).or_insert(0) += share;
        }
    }

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeRegistration;
    use proptest::prelude::*;
    use skein_core::RoleSet;

    fn account(seed: u8) -> AccountId {
        AccountId::from_public_key(&[seed])
    }

    fn registry_with_validators(seeds: &[u8]) -> RegistrySnapshot {
        let mut registry = RegistrySnapshot::new();
        for seed in seeds {
            registry.insert(NodeRegistration::new(
                account(*seed),
                RoleSet::of(&[Role::Validator]),
                1_000,
            ));
        }
        registry
    }

    #[test]
    fn test_proportional_split() {
        let registry = registry_with_validators(&[1, 2]);
        let mut group = ClusterWorkload::new(7);
        group.record(account(1), 2);
        group.record(account(2), 1);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[group], 300, 0, &registry);

        assert_eq!(allocation.node_rewards[&account(1)], 200);
        assert_eq!(allocation.node_rewards[&account(2)], 100);
        assert_eq!(allocation.forfeited, 0);
    }

    #[test]
    fn test_invalid_leader_dropped_from_total() {
        let registry = registry_with_validators(&[1, 2]);
        let mut group = ClusterWorkload::new(1);
        group.record(account(1), 2);
        group.record(account(2), 1);
        // Unregistered leader: its work must leave the denominator
        group.record(account(9), 97);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[group], 300, 0, &registry);

        assert_eq!(allocation.node_rewards[&account(1)], 200);
        assert_eq!(allocation.node_rewards[&account(2)], 100);
        assert!(!allocation.node_rewards.contains_key(&account(9)));
    }

    #[test]
    fn test_zero_deposit_leader_dropped() {
        let mut registry = registry_with_validators(&[1]);
        registry.insert(NodeRegistration::new(
            account(2),
            RoleSet::of(&[Role::Validator]),
            0,
        ));
        let mut group = ClusterWorkload::new(1);
        group.record(account(1), 1);
        group.record(account(2), 3);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[group], 400, 0, &registry);

        assert_eq!(allocation.node_rewards[&account(1)], 400);
        assert!(!allocation.node_rewards.contains_key(&account(2)));
    }

    #[test]
    fn test_empty_group_forfeits_pool() {
        let registry = RegistrySnapshot::new();
        let mut group = ClusterWorkload::new(1);
        group.record(account(1), 10);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[group], 500, 0, &registry);

        assert!(allocation.node_rewards.is_empty());
        assert_eq!(allocation.forfeited, 500);
    }

    #[test]
    fn test_zero_workload_group_forfeits_pool() {
        let registry = registry_with_validators(&[1, 2]);
        let mut group = ClusterWorkload::new(1);
        group.record(account(1), 2);
        group.record(account(2), 1);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[group], 500, 5, &registry);

        assert!(allocation.node_rewards.is_empty());
        assert_eq!(allocation.forfeited, 500);
    }

    #[test]
    fn test_rewards_sum_across_groups() {
        let registry = registry_with_validators(&[1, 2]);
        let mut first = ClusterWorkload::new(1);
        first.record(account(1), 1);
        let mut second = ClusterWorkload::new(2);
        second.record(account(1), 1);
        second.record(account(2), 1);

        let allocation =
            allocate_workload_rewards(Role::Validator, &[first, second], 100, 0, &registry);

        assert_eq!(allocation.node_rewards[&account(1)], 150);
        assert_eq!(allocation.node_rewards[&account(2)], 50);
    }

    proptest! {
        /// Twice the work earns twice the reward, within one unit of
        /// truncation per division.
        #[test]
        fn doubled_work_doubles_reward(
            base_work in 1u64..1_000_000,
            pool in 1u128..1_000_000_000_000u128,
        ) {
            let registry = registry_with_validators(&[1, 2]);
            let mut group = ClusterWorkload::new(1);
            group.record(account(1), 2 * base_work);
            group.record(account(2), base_work);

            let allocation =
                allocate_workload_rewards(Role::Validator, &[group], pool, 0, &registry);

            let double = allocation.node_rewards[&account(1)];
            let single = allocation.node_rewards[&account(2)];
            let diff = double.abs_diff(2 * single);
            prop_assert!(diff <= 2);
        }
    }
}
