//! # Issuance Schedule
//!
//! Reserve-depleting annual issuance with a minimum floor.
//!
//! Each annum's pool is `max(reserve_remaining * year_ratio / 100, floor)`,
//! where the reserve shrinks by every completed annum's pool and the floor
//! is a fixed percentage of lifetime supply. Settlement intervals that cross
//! annum boundaries are walked one boundary at a time, so every slice of the
//! interval accrues at its own annum's rate.
//!
//! All amounts in this module are `u128` values scaled by
//! [`REWARD_PRECISION`](crate::constants::REWARD_PRECISION); callers round
//! up to whole token units only at the final transfer.

use serde::{Deserialize, Serialize};
use skein_core::clock::{self, Tick, TICKS_PER_ANNUM};

use crate::constants::{REWARD_PRECISION, TOTAL_ISSUANCE, TOTAL_RESERVE_SCALED};
use crate::error::{Result, RewardError};

/// Genesis activation record, set exactly once
///
/// All elapsed-time computations are relative to `activation_time`; before
/// activation every timer tick is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub activated: bool,
    pub activation_time: Tick,
}

/// Cumulative issuance bookkeeping persisted across rounds
///
/// `last_issuance_time` only moves forward, and `issued_until_last_annum_end`
/// only grows, advancing exactly when a settlement crosses an annum
/// boundary. A round that does not advance `last_issuance_time` must not
/// issue tokens; that is the idempotency linchpin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedRewardRecord {
    /// Ticks since activation at the last settlement
    pub last_issuance_time: Tick,

    /// Scaled issuance accounted through the last completed annum
    pub issued_until_last_annum_end: u128,
}

/// Scaled annual floor: a fixed percentage of lifetime supply
pub fn minimum_annual_issuance(min_ratio_annual_total_reward: u64) -> u128 {
    TOTAL_ISSUANCE * u128::from(min_ratio_annual_total_reward) / 100 * REWARD_PRECISION
}

/// Scaled pool for the annum that begins with `issued` already accounted
fn annual_issuance(issued: u128, min_ratio_annual_total_reward: u64, year_ratio: u64) -> u128 {
    let reserve = TOTAL_RESERVE_SCALED.saturating_sub(issued);
    let from_reserve = reserve * u128::from(year_ratio) / 100;
    from_reserve.max(minimum_annual_issuance(min_ratio_annual_total_reward))
}

/// Total scaled issuance for the interval `(record.last_issuance_time, elapsed]`
///
/// Walks every annum boundary inside the interval, accruing each slice at
/// its own annum's rate and rolling the full annum pool into
/// `issued_until_last_annum_end` as the boundary is crossed, then accrues
/// the remaining sub-annum fraction at the next annum's rate. Advances
/// `record.last_issuance_time` to `elapsed`; the caller persists the record.
pub fn calc_total_issuance(
    elapsed: Tick,
    min_ratio_annual_total_reward: u64,
    additional_issue_year_ratio: u64,
    record: &mut AccumulatedRewardRecord,
) -> Result<u128> {
    if elapsed < record.last_issuance_time {
        return Err(RewardError::ClockRegressed {
            last: record.last_issuance_time,
            current: elapsed,
        });
    }
    if elapsed == 0 {
        return Ok(0);
    }

    let mut issuance: u128 = 0;
    let mut cursor = record.last_issuance_time;

    while clock::annum_index(cursor) < clock::annum_index(elapsed) {
        let boundary = clock::next_annum_boundary(cursor);
        let annual = annual_issuance(
            record.issued_until_last_annum_end,
            min_ratio_annual_total_reward,
            additional_issue_year_ratio,
        );
        issuance += annual * u128::from(boundary - cursor) / u128::from(TICKS_PER_ANNUM);
        record.issued_until_last_annum_end += annual;
        cursor = boundary;
    }

    if elapsed > cursor {
        let annual = annual_issuance(
            record.issued_until_last_annum_end,
            min_ratio_annual_total_reward,
            additional_issue_year_ratio,
        );
        issuance += annual * u128::from(elapsed - cursor) / u128::from(TICKS_PER_ANNUM);
    }

    record.last_issuance_time = elapsed;
    Ok(issuance)
}

/// Round a scaled amount up to whole token units
///
/// The ledger never under-issues from truncation; at most
/// `REWARD_PRECISION - 1` scaled units of over-issuance per transfer are
/// absorbed by the receiving pool.
pub fn ceil_to_units(scaled: u128) -> u128 {
    scaled.div_ceil(REWARD_PRECISION)
}
