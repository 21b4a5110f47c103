//! # Skein Economics - DC SKN Issuance & Reward Settlement
//!
//! Economic state-transition layer for Datachain Skein: computes how much
//! new currency each settlement round mints and how it is divided across
//! edge, archive, auditor, and validator operators and the voters backing
//! them.
//!
//! ## Issuance Model
//!
//! Issuance draws down a 7.6B SKN mining reserve (38% of the 20B lifetime
//! supply) at 8% of the remainder per annum, floored at 2% of lifetime
//! supply:
//!
//! | Annum | Reserve remaining | Annual pool |
//! |-------|-------------------|-------------|
//! | 1 | 7.60B SKN | 608.0M SKN |
//! | 2 | 6.99B SKN | 559.4M SKN |
//! | 3 | 6.43B SKN | 514.6M SKN |
//! | ... | (8% of remainder) | floored at 400M SKN |
//!
//! ## Round Pipeline
//!
//! ```text
//! timer tick → eligibility gate → snapshots → issuance → role census
//!   → workload + vote allocation → dividend split → table aggregation
//!   → dispatch → persisted record update
//! ```
//!
//! Every stage is a pure function of the round's snapshots except dispatch
//! and the final record update; the host's transactional commit makes the
//! whole round atomic.

pub mod audit;
pub mod census;
pub mod dispatch;
pub mod dividend;
pub mod engine;
pub mod error;
pub mod issuance;
pub mod params;
pub mod pools;
pub mod registry;
pub mod tables;
pub mod votes;
pub mod workload;

// Re-exports
pub use audit::{IssueDetail, NodeRewardDetail};
pub use census::{RoleCensus, RoleCounts};
pub use dispatch::{DispatchSummary, LedgerHost};
pub use engine::{RoundOutcome, RoundSnapshot, SettlementEngine, SnapshotProvider};
pub use error::{Result, RewardError};
pub use issuance::{AccumulatedRewardRecord, ActivationRecord};
pub use params::{PoolRatios, RewardParams};
pub use pools::RewardPools;
pub use registry::{NodeRegistration, RegistrySnapshot};
pub use tables::TableSettlement;
pub use votes::{VoteSnapshot, VoteTally};
pub use workload::{ClusterWorkload, WorkloadAllocation};

/// DC SKN token constants
pub mod constants {
    /// Token symbol
    pub const SYMBOL: &str = "SKN";

    /// Token name
    pub const NAME: &str = "DATACHAIN Skein Network Token";

    /// Decimal places
    pub const DECIMALS: u8 = 6;

    /// One SKN in smallest unit
    pub const ONE_SKN: u128 = 1_000_000; // 10^6

    /// Lifetime supply: 20 billion SKN
    pub const TOTAL_ISSUANCE: u128 = 20_000_000_000 * ONE_SKN;

    /// Share of lifetime supply held as the mining reserve, percent
    pub const TOTAL_RESERVE_RATIO: u128 = 38;

    /// Fixed-point scale for fractional reward amounts
    pub const REWARD_PRECISION: u128 = 1_000_000;

    /// Mining reserve in scaled units
    pub const TOTAL_RESERVE_SCALED: u128 =
        TOTAL_ISSUANCE / 100 * TOTAL_RESERVE_RATIO * REWARD_PRECISION;
}

pub use constants::*;
