//! # Settlement Table Aggregation
//!
//! Maps every node-level reward and dividend onto the sharded settlement
//! contract that credits the receiving accounts: one aggregate transfer per
//! table, plus the per-account breakdown the table contract needs to credit
//! individual balances later.

use log::warn;
use serde::{Deserialize, Serialize};
use skein_core::{AccountId, TableIndex};
use std::collections::BTreeMap;

use crate::dividend::NodeRewardShare;

/// Derive the deterministic contract address of a settlement table
pub fn table_contract_address(table: TableIndex) -> AccountId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"skein.table.");
    hasher.update(&table.to_le_bytes());
    AccountId::new(*hasher.finalize().as_bytes())
}

/// Treasury address receiving the community/governance pool
pub fn treasury_address() -> AccountId {
    AccountId::new(*blake3::hash(b"skein.treasury").as_bytes())
}

/// One table's settlement for a round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableSettlement {
    /// Table index
    pub table: TableIndex,

    /// Settlement contract address for this table
    pub contract: AccountId,

    /// Scaled aggregate owed to this table
    pub total: u128,

    /// Per-account self rewards credited through this table
    pub node_rewards: BTreeMap<AccountId, u128>,

    /// Per-node dividends owed to this table's voters
    pub node_dividends: BTreeMap<AccountId, u128>,
}

impl TableSettlement {
    fn new(table: TableIndex) -> Self {
        Self {
            table,
            contract: table_contract_address(table),
            total: 0,
            node_rewards: BTreeMap::new(),
            node_dividends: BTreeMap::new(),
        }
    }
}

/// Aggregate node reward shares into per-table settlements
///
/// A node's self share lands on the table that owns its account; each
/// dividend share lands on the voter table it is owed to. Accounts that map
/// to no table are skipped with a warning rather than blocking the round.
pub fn aggregate_table_rewards(
    shares: &BTreeMap<AccountId, NodeRewardShare>,
    table_count: u32,
) -> BTreeMap<TableIndex, TableSettlement> {
    let mut tables: BTreeMap<TableIndex, TableSettlement> = BTreeMap::new();

    for (account, share) in shares {
        if share.self_amount > 0 {
            match account.ledger_table(table_count) {
                Some(table) => {
                    let entry = tables
                        .entry(table)
                        .or_insert_with(|| TableSettlement::new(table));
                    *entry.node_rewards.entry(*account).or_insert(0) += share.self_amount;
                    entry.total += share.self_amount;
                }
                None => {
                    warn!(
                        "account {} maps to no settlement table, skipping its reward",
                        account
                    );
                }
            }
        }

        for (table, dividend) in &share.dividends {
            if *table >= table_count {
                warn!(
                    "voter table {} out of range for node {}, skipping dividend",
                    table, account
                );
                continue;
            }
            let entry = tables
                .entry(*table)
                .or_insert_with(|| TableSettlement::new(*table));
            *entry.node_dividends.entry(*account).or_insert(0) += dividend;
            entry.total += dividend;
        }
    }

    tables
}
