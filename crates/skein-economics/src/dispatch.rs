//! # Reward Dispatch
//!
//! The only stage with externally visible effects: transfers each table's
//! aggregate to its settlement contract, notifies the contract with the
//! per-account breakdown, and sweeps the community remainder to the
//! treasury.
//!
//! Cross-contract effects are one-way; the host offers no synchronous
//! return channel, so both primitives are fire-and-forget from the engine's
//! view and the host's transactional commit is what makes a round atomic.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use skein_core::{AccountId, MicroSkn, TableIndex};
use std::collections::BTreeMap;

use crate::error::{Result, RewardError};
use crate::issuance::ceil_to_units;
use crate::tables::{treasury_address, TableSettlement};

/// Method invoked on table contracts with the settlement payload
pub const SETTLEMENT_METHOD: &str = "on_reward_settlement";

/// Host primitives for moving funds and signalling sibling contracts
pub trait LedgerHost {
    /// Move `amount` whole token units to `dest`
    fn transfer(&mut self, dest: AccountId, amount: MicroSkn) -> Result<()>;

    /// Invoke `method` on the contract at `dest` with a serialized payload
    fn notify(&mut self, dest: AccountId, method: &str, payload: Vec<u8>) -> Result<()>;
}

/// Outcome of dispatching one round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Whole token units actually transferred, community pool included
    pub actual_issuance: MicroSkn,

    /// Whole token units swept to the treasury
    pub community_issuance: MicroSkn,

    /// Tables that received a transfer
    pub tables_settled: u64,
}

/// Transfer every nonzero settlement and the community remainder
///
/// The community transfer is `total_issuance` minus everything routed to
/// tables, so the governance share, forfeits, and split residue all land at
/// the treasury and no scaled unit is dropped. Each transfer rounds up to
/// whole units, bounding over-issuance at one unit per destination.
pub fn dispatch_all_rewards<H: LedgerHost>(
    host: &mut H,
    settlements: &BTreeMap<TableIndex, TableSettlement>,
    total_issuance: u128,
) -> Result<DispatchSummary> {
    let mut summary = DispatchSummary::default();
    let mut routed: u128 = 0;

    for settlement in settlements.values() {
        if settlement.total == 0 {
            continue;
        }
        routed += settlement.total;

        let units = ceil_to_units(settlement.total);
        host.transfer(settlement.contract, units)?;
        let payload = serde_json::to_vec(settlement)
            .map_err(|e| RewardError::Serialization(e.to_string()))?;
        host.notify(settlement.contract, SETTLEMENT_METHOD, payload)?;

        summary.actual_issuance += units;
        summary.tables_settled += 1;
        debug!(
            "table {} settled: {} units across {} accounts",
            settlement.table,
            units,
            settlement.node_rewards.len() + settlement.node_dividends.len()
        );
    }

    let community = total_issuance.saturating_sub(routed);
    if community > 0 {
        let units = ceil_to_units(community);
        host.transfer(treasury_address(), units)?;
        summary.actual_issuance += units;
        summary.community_issuance = units;
    }

    info!(
        "round dispatched: {} units over {} tables, {} units to treasury",
        summary.actual_issuance - summary.community_issuance,
        summary.tables_settled,
        summary.community_issuance
    );

    Ok(summary)
}
