//! Accounts and the ledger fields that transactions mutate.

mod core;
mod reconcile;

pub use core::{
    Account, AccountKind, LedgerField, NewAccount, adjust_ledger, create_account,
    create_account_table, get_account,
};
pub use reconcile::reconcile_account;

#[cfg(test)]
pub(crate) use core::test_utils;
