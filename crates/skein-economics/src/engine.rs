//! # Settlement Engine
//!
//! The timer-driven state machine tying the pipeline together:
//!
//! ```text
//! eligibility gate → snapshots → issuance → role census
//!   → workload + vote allocation → dividend split → table aggregation
//!   → dispatch → persisted record update
//! ```
//!
//! A round either fully computes and dispatches or does not run at all. The
//! host wraps each invocation in a transactional commit, so a returned error
//! discards every transfer and state write and the next timer tick retries
//! from the last persisted state. The eligibility gate is the sole
//! idempotency guard: a tick that does not advance `last_issuance_time`
//! moves no funds.

use log::{debug, info, warn};
use skein_core::{AccountId, Role, Tick};
use skein_storage::{get_json, set_json, KeyValueStore};
use std::collections::BTreeMap;

use crate::audit::{self, IssueDetail, NodeRewardDetail};
use crate::census::RoleCensus;
use crate::dispatch::{dispatch_all_rewards, DispatchSummary, LedgerHost};
use crate::dividend::split_node_rewards;
use crate::error::{Result, RewardError};
use crate::issuance::{calc_total_issuance, AccumulatedRewardRecord, ActivationRecord};
use crate::params::RewardParams;
use crate::pools::{split_equal, RewardPools};
use crate::registry::RegistrySnapshot;
use crate::tables::aggregate_table_rewards;
use crate::votes::{calc_vote_reward, calc_votes, VoteSnapshot};
use crate::workload::{allocate_workload_rewards, ClusterWorkload, WorkloadAllocation};

/// Persisted-state keys
const ACTIVATION_KEY: &str = "reward:activation";
const ACCUMULATED_KEY: &str = "reward:accumulated";
const READ_HEIGHT_KEY: &str = "reward:last_read_height";

/// Snapshots consumed by one settlement round
#[derive(Clone, Debug, Default)]
pub struct RoundSnapshot {
    /// Node registry, read from the registration contract
    pub registry: RegistrySnapshot,

    /// Auditor consensus-group workloads
    pub auditor_workloads: Vec<ClusterWorkload>,

    /// Validator consensus-group workloads
    pub validator_workloads: Vec<ClusterWorkload>,

    /// Per-table vote weights
    pub votes: VoteSnapshot,
}

/// Read-only access to sibling-contract state
///
/// `latest_height` must never regress; a regression means the source state
/// is inconsistent and the round aborts. A merely delayed snapshot is
/// reported as [`RewardError::SnapshotDelayed`] and degrades the round to
/// bookkeeping only.
pub trait SnapshotProvider {
    /// Highest state height the sources have reached
    fn latest_height(&self) -> Result<u64>;

    /// Collect the round's snapshots
    fn collect(&self) -> Result<RoundSnapshot>;
}

/// What one timer tick did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Genesis activation has not happened; the tick was a no-op
    NotActivated,

    /// The settlement interval has not elapsed; only bookkeeping advanced
    NotDue,

    /// Snapshots were unavailable; only bookkeeping advanced
    Deferred,

    /// A full round settled and dispatched
    Settled(DispatchSummary),
}

/// The reward settlement engine
///
/// Owns its persisted state through the [`KeyValueStore`] seam and drives
/// external effects through the [`LedgerHost`] seam; everything else is a
/// pure function of the round's snapshots.
pub struct SettlementEngine<S, H> {
    store: S,
    host: H,
    params: RewardParams,
}

impl<S: KeyValueStore, H: LedgerHost> SettlementEngine<S, H> {
    /// Create an engine over a store and host
    pub fn new(store: S, host: H, params: RewardParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            store,
            host,
            params,
        })
    }

    /// Record genesis activation, exactly once
    ///
    /// All elapsed-time computations are relative to this tick. A second
    /// activation attempt is rejected.
    pub fn activate(&mut self, current_time: Tick) -> Result<()> {
        let record = self.load_activation()?;
        if record.activated {
            return Err(RewardError::AlreadyActivated(record.activation_time));
        }
        let record = ActivationRecord {
            activated: true,
            activation_time: current_time,
        };
        set_json(&self.store, ACTIVATION_KEY, &record)
            .map_err(|e| RewardError::Serialization(e.to_string()))?;
        info!("reward engine activated at tick {current_time}");
        Ok(())
    }

    /// Sole entry point, invoked by the host scheduler once per tick
    pub fn on_timer(
        &mut self,
        current_time: Tick,
        provider: &dyn SnapshotProvider,
    ) -> Result<RoundOutcome> {
        let activation = self.load_activation()?;
        if !activation.activated {
            return Ok(RoundOutcome::NotActivated);
        }

        let mut record = self.load_accumulated()?;

        // Bookkeeping advances on every tick, settled or not
        match self.advance_read_height(provider) {
            Ok(()) => {}
            Err(err) if err.is_recoverable() => {
                warn!("snapshot source unreachable, deferring: {err}");
                return Ok(RoundOutcome::Deferred);
            }
            Err(err) => return Err(err),
        }

        let due_at =
            activation.activation_time + record.last_issuance_time + self.params.reward_issue_interval;
        if current_time < due_at {
            debug!(
                "settlement not due until tick {due_at}, currently {current_time}"
            );
            return Ok(RoundOutcome::NotDue);
        }

        let snapshot = match provider.collect() {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_recoverable() => {
                warn!("snapshots unavailable, deferring settlement: {err}");
                return Ok(RoundOutcome::Deferred);
            }
            Err(err) => return Err(err),
        };

        let elapsed = current_time - activation.activation_time;
        self.settle(elapsed, current_time, snapshot, &mut record)
    }

    /// Latest audit record, if a round has settled
    pub fn issue_detail(&self) -> Option<IssueDetail> {
        audit::load_issue_detail(&self.store)
    }

    /// Persisted issuance bookkeeping
    pub fn accumulated_record(&self) -> Result<AccumulatedRewardRecord> {
        self.load_accumulated()
    }

    /// Persisted activation record
    pub fn activation_record(&self) -> Result<ActivationRecord> {
        self.load_activation()
    }

    /// Rate-limited registry read height observed so far
    pub fn last_observed_height(&self) -> Result<u64> {
        get_json(&self.store, READ_HEIGHT_KEY)
            .map_err(|e| RewardError::CorruptRecord {
                key: READ_HEIGHT_KEY.to_string(),
                reason: e.to_string(),
            })
            .map(|h| h.unwrap_or(0))
    }

    /// Engine parameters
    pub fn params(&self) -> &RewardParams {
        &self.params
    }

    /// The ledger host, for inspection
    pub fn host(&self) -> &H {
        &self.host
    }

    fn settle(
        &mut self,
        elapsed: Tick,
        current_time: Tick,
        snapshot: RoundSnapshot,
        record: &mut AccumulatedRewardRecord,
    ) -> Result<RoundOutcome> {
        let RoundSnapshot {
            mut registry,
            auditor_workloads,
            validator_workloads,
            votes,
        } = snapshot;

        let total_issuance = calc_total_issuance(
            elapsed,
            self.params.min_ratio_annual_total_reward,
            self.params.additional_issue_year_ratio,
            record,
        )?;
        let pools = RewardPools::from_issuance(total_issuance, &self.params.ratios);
        let census = RoleCensus::from_registry(&registry);

        let mut forfeited: u128 = 0;
        let mut components: BTreeMap<AccountId, NodeRewardDetail> = BTreeMap::new();

        // Edge and archive pools split equally across valid nodes
        let (edge_share, edge_rest) = split_equal(pools.edge, census.edge.valid);
        forfeited += edge_rest;
        let (archive_share, archive_rest) = split_equal(pools.archive, census.archive.valid);
        forfeited += archive_rest;
        if edge_share > 0 || archive_share > 0 {
            for (account, registration) in registry.iter() {
                if edge_share > 0 && registration.is_valid_for(Role::Edge) {
                    components.entry(*account).or_default().edge = edge_share;
                }
                if archive_share > 0 && registration.is_valid_for(Role::Archive) {
                    components.entry(*account).or_default().archive = archive_share;
                }
            }
        }

        // Workload pools split per consensus group
        let auditor_alloc = self.allocate_role_workload(
            Role::Auditor,
            &auditor_workloads,
            pools.auditor,
            &registry,
        );
        forfeited += auditor_alloc.forfeited;
        for (account, amount) in &auditor_alloc.node_rewards {
            components.entry(*account).or_default().auditor_workload = *amount;
        }
        let validator_alloc = self.allocate_role_workload(
            Role::Validator,
            &validator_workloads,
            pools.validator,
            &registry,
        );
        forfeited += validator_alloc.forfeited;
        for (account, amount) in &validator_alloc.node_rewards {
            components.entry(*account).or_default().validator_workload = *amount;
        }

        // Vote rewards
        let tally = calc_votes(&votes, &mut registry);
        let vote_alloc = calc_vote_reward(pools.vote, &tally, &census, &registry)?;
        forfeited += vote_alloc.forfeited;
        for (account, amount) in &vote_alloc.node_rewards {
            components.entry(*account).or_default().vote = *amount;
        }

        // Dividend split over each node's aggregate
        let mut node_totals: BTreeMap<AccountId, u128> = BTreeMap::new();
        for (account, detail) in &components {
            let total = detail.earned_total();
            if total > 0 {
                node_totals.insert(*account, total);
            }
        }
        let shares = split_node_rewards(&node_totals, &registry, &tally);
        for (account, share) in &shares {
            let detail = components.entry(*account).or_default();
            detail.self_reward = share.self_amount;
            detail.dividend = share.dividend_total();
        }

        // Shard onto settlement tables and dispatch
        let settlements = aggregate_table_rewards(&shares, self.params.table_count);
        let summary = dispatch_all_rewards(&mut self.host, &settlements, total_issuance)?;

        // Commit the round
        self.store_accumulated(record)?;
        let detail = IssueDetail {
            settled_at: current_time,
            elapsed,
            params: self.params.clone(),
            census,
            total_issuance,
            pools,
            forfeited,
            actual_issuance: summary.actual_issuance,
            community_issuance: summary.community_issuance,
            node_details: components,
        };
        audit::store_issue_detail(&self.store, &detail)?;

        info!(
            "settlement round at tick {current_time}: {} scaled issued, {} units dispatched",
            total_issuance, summary.actual_issuance
        );
        Ok(RoundOutcome::Settled(summary))
    }

    fn allocate_role_workload(
        &self,
        role: Role,
        workloads: &[ClusterWorkload],
        pool: u128,
        registry: &RegistrySnapshot,
    ) -> WorkloadAllocation {
        if workloads.is_empty() {
            return WorkloadAllocation {
                node_rewards: BTreeMap::new(),
                forfeited: pool,
            };
        }
        let group_pool = pool / workloads.len() as u128;
        allocate_workload_rewards(
            role,
            workloads,
            group_pool,
            self.params.zero_workload_threshold,
            registry,
        )
    }

    /// Advance the rate-limited registry read height by at most
    /// `max_read_step`, rejecting a regressing source height
    fn advance_read_height(&mut self, provider: &dyn SnapshotProvider) -> Result<()> {
        let reported = provider.latest_height()?;
        let observed = self.last_observed_height()?;
        if reported < observed {
            return Err(RewardError::HeightRegressed { observed, reported });
        }
        let next = observed.saturating_add(self.params.max_read_step).min(reported);
        if next > observed {
            set_json(&self.store, READ_HEIGHT_KEY, &next)
                .map_err(|e| RewardError::Serialization(e.to_string()))?;
        }
        Ok(())
    }

    fn load_activation(&self) -> Result<ActivationRecord> {
        get_json(&self.store, ACTIVATION_KEY)
            .map_err(|e| RewardError::CorruptRecord {
                key: ACTIVATION_KEY.to_string(),
                reason: e.to_string(),
            })
            .map(|r| r.unwrap_or_default())
    }

    fn load_accumulated(&self) -> Result<AccumulatedRewardRecord> {
        get_json(&self.store, ACCUMULATED_KEY)
            .map_err(|e| RewardError::CorruptRecord {
                key: ACCUMULATED_KEY.to_string(),
                reason: e.to_string(),
            })
            .map(|r| r.unwrap_or_default())
    }

    fn store_accumulated(&self, record: &AccumulatedRewardRecord) -> Result<()> {
        set_json(&self.store, ACCUMULATED_KEY, record)
            .map_err(|e| RewardError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::MicroSkn;
    use skein_storage::MemoryStore;

    #[derive(Default)]
    struct RecordingHost {
        transfers: Vec<(AccountId, MicroSkn)>,
    }

    impl LedgerHost for RecordingHost {
        fn transfer(&mut self, dest: AccountId, amount: MicroSkn) -> Result<()> {
            self.transfers.push((dest, amount));
            Ok(())
        }

        fn notify(&mut self, _dest: AccountId, _method: &str, _payload: Vec<u8>) -> Result<()> {
            Ok(())
        }
    }

    struct StubProvider {
        height: u64,
        snapshot: RoundSnapshot,
        delayed: bool,
    }

    impl StubProvider {
        fn empty() -> Self {
            Self {
                height: 100,
                snapshot: RoundSnapshot::default(),
                delayed: false,
            }
        }
    }

    impl SnapshotProvider for StubProvider {
        fn latest_height(&self) -> Result<u64> {
            Ok(self.height)
        }

        fn collect(&self) -> Result<RoundSnapshot> {
            if self.delayed {
                return Err(RewardError::SnapshotDelayed("registry lagging".into()));
            }
            Ok(self.snapshot.clone())
        }
    }

    fn engine() -> SettlementEngine<MemoryStore, RecordingHost> {
        SettlementEngine::new(
            MemoryStore::new(),
            RecordingHost::default(),
            RewardParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_before_activation_is_noop() {
        let mut engine = engine();
        let provider = StubProvider::empty();

        let outcome = engine.on_timer(1_000, &provider).unwrap();

        assert_eq!(outcome, RoundOutcome::NotActivated);
        assert!(engine.host().transfers.is_empty());
    }

    #[test]
    fn test_activation_is_once_only() {
        let mut engine = engine();
        engine.activate(50).unwrap();

        let err = engine.activate(60).unwrap_err();
        assert!(matches!(err, RewardError::AlreadyActivated(50)));
    }

    #[test]
    fn test_not_due_before_interval() {
        let mut engine = engine();
        engine.activate(0).unwrap();
        let provider = StubProvider::empty();

        let outcome = engine.on_timer(100, &provider).unwrap();

        assert_eq!(outcome, RoundOutcome::NotDue);
        assert!(engine.host().transfers.is_empty());
    }

    #[test]
    fn test_empty_round_sweeps_everything_to_treasury() {
        let mut engine = engine();
        engine.activate(0).unwrap();
        let provider = StubProvider::empty();

        let outcome = engine.on_timer(24 * 3600, &provider).unwrap();

        match outcome {
            RoundOutcome::Settled(summary) => {
                assert_eq!(summary.tables_settled, 0);
                assert!(summary.community_issuance > 0);
                assert_eq!(summary.actual_issuance, summary.community_issuance);
            }
            other => panic!("expected settlement, got {:?}", other),
        }
        assert_eq!(engine.host().transfers.len(), 1);
    }

    #[test]
    fn test_repeated_tick_is_gated() {
        let mut engine = engine();
        engine.activate(0).unwrap();
        let provider = StubProvider::empty();
        let settle_time = 24 * 3600;

        engine.on_timer(settle_time, &provider).unwrap();
        let record_after = engine.accumulated_record().unwrap();
        let transfers_after = engine.host().transfers.len();

        let outcome = engine.on_timer(settle_time, &provider).unwrap();

        assert_eq!(outcome, RoundOutcome::NotDue);
        assert_eq!(engine.accumulated_record().unwrap(), record_after);
        assert_eq!(engine.host().transfers.len(), transfers_after);
    }

    #[test]
    fn test_delayed_snapshot_defers_round() {
        let mut engine = engine();
        engine.activate(0).unwrap();
        let provider = StubProvider {
            delayed: true,
            ..StubProvider::empty()
        };

        let outcome = engine.on_timer(24 * 3600, &provider).unwrap();

        assert_eq!(outcome, RoundOutcome::Deferred);
        assert_eq!(
            engine.accumulated_record().unwrap(),
            AccumulatedRewardRecord::default()
        );
        assert!(engine.host().transfers.is_empty());
    }

    #[test]
    fn test_height_regression_aborts() {
        let mut engine = engine();
        engine.activate(0).unwrap();

        let tall = StubProvider {
            height: 500,
            ..StubProvider::empty()
        };
        engine.on_timer(100, &tall).unwrap();
        let observed = engine.last_observed_height().unwrap();
        assert_eq!(observed, engine.params().max_read_step);

        let short = StubProvider {
            height: observed - 1,
            ..StubProvider::empty()
        };
        let err = engine.on_timer(200, &short).unwrap_err();
        assert!(matches!(err, RewardError::HeightRegressed { .. }));
    }

    #[test]
    fn test_read_height_advance_is_step_limited() {
        let mut engine = engine();
        engine.activate(0).unwrap();
        let provider = StubProvider {
            height: 1_000,
            ..StubProvider::empty()
        };

        engine.on_timer(10, &provider).unwrap();
        assert_eq!(engine.last_observed_height().unwrap(), 32);

        engine.on_timer(20, &provider).unwrap();
        assert_eq!(engine.last_observed_height().unwrap(), 64);
    }
}
