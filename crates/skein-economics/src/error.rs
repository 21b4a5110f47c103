//! Error types for the Skein reward settlement engine

use skein_core::Tick;
use thiserror::Error;

/// Result type alias for settlement operations
pub type Result<T> = std::result::Result<T, RewardError>;

/// Errors that can occur while computing or dispatching a settlement round
///
/// Recoverable variants degrade the round (deferred, or a skipped record);
/// everything else aborts the round so the host discards its effects and the
/// next timer tick retries from the last persisted state.
#[derive(Error, Debug, Clone)]
pub enum RewardError {
    // === Activation & Eligibility ===
    /// Settlement attempted before genesis activation
    #[error("reward engine is not activated")]
    NotActivated,

    /// Second activation attempt
    #[error("reward engine already activated at tick {0}")]
    AlreadyActivated(Tick),

    /// Elapsed time went backward relative to the persisted record
    #[error("settlement clock regressed: last issuance at {last}, current elapsed {current}")]
    ClockRegressed { last: Tick, current: Tick },

    // === Parameters ===
    /// Rejected reward parameter
    #[error("invalid reward parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    // === Invariants ===
    /// Valid auditors exist but the vote snapshot carries no eligible votes
    #[error("vote pool has {valid_auditors} valid auditors but zero eligible votes")]
    VotesMissing { valid_auditors: u64 },

    // === Snapshots ===
    /// Sibling contract reported a height below what was already observed
    #[error("snapshot source height regressed: observed {observed}, reported {reported}")]
    HeightRegressed { observed: u64, reported: u64 },

    /// Sibling contract state not yet readable; round degrades to bookkeeping
    #[error("snapshot not yet available: {0}")]
    SnapshotDelayed(String),

    // === Persistence ===
    /// Persisted engine record failed to decode
    #[error("corrupt persisted record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    // === Dispatch ===
    /// Funds transfer rejected by the host
    #[error("transfer to {dest} failed: {reason}")]
    TransferFailed { dest: String, reason: String },

    /// Cross-contract notification rejected by the host
    #[error("notification to {dest} failed: {reason}")]
    NotifyFailed { dest: String, reason: String },
}

impl RewardError {
    /// Get the error code for audit logs and API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::NotActivated => 3001,
            Self::AlreadyActivated(_) => 3002,
            Self::ClockRegressed { .. } => 3003,
            Self::InvalidParameter { .. } => 3004,
            Self::VotesMissing { .. } => 3005,
            Self::HeightRegressed { .. } => 3006,
            Self::SnapshotDelayed(_) => 3007,
            Self::CorruptRecord { .. } => 3008,
            Self::Serialization(_) => 3009,
            Self::TransferFailed { .. } => 3010,
            Self::NotifyFailed { .. } => 3011,
        }
    }

    /// Check if the round can continue in a degraded form
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SnapshotDelayed(_))
    }
}
