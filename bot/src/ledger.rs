use crate::errors::Result;

use db::structs::Account;
use db::{ReadOnlyDb, Store, WriteableDb};
use log::{debug, info};
use serenity::model::id::UserId;
use std::collections::HashSet;
use std::sync::Arc;

/// Point balances. Every write goes through here so the protected set is
/// checked in one place.
pub struct Ledger {
    store: Arc<Store>,
    protected: HashSet<UserId>,
}

impl Ledger {
    pub fn new(store: Arc<Store>, protected: HashSet<UserId>) -> Ledger {
        Ledger { store, protected }
    }

    #[inline]
    pub fn is_protected(&self, user: UserId) -> bool {
        self.protected.contains(&user)
    }

    pub fn get_balance(&self, user: UserId) -> Result<i64> {
        Ok(self.store.call(|db| db.get_points(user))?)
    }

    /// Returns false without writing when `user` is protected.
    pub fn set_balance(&self, user: UserId, amount: i64) -> Result<bool> {
        if self.is_protected(user) {
            debug!("refusing to set balance of protected user {user}");
            return Ok(false);
        }
        self.store.call(|db| db.set_points(user, amount))?;
        info!("set balance of {user} to {amount}");
        Ok(true)
    }

    /// Applies `delta` and returns the new balance, `None` for protected users.
    pub fn add_delta(&self, user: UserId, delta: i64) -> Result<Option<i64>> {
        if self.is_protected(user) {
            debug!("refusing to change balance of protected user {user}");
            return Ok(None);
        }
        Ok(Some(self.store.call(|db| db.add_points(user, delta))?))
    }

    pub fn top(&self, limit: usize) -> Result<Vec<Account>> {
        Ok(self.store.call(|db| db.get_top_accounts(limit))?)
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.store.call(|db| db.count_accounts())?)
    }

    pub fn reset_all(&self) -> Result<usize> {
        Ok(self.store.call(|db| db.reset_points())?)
    }
}
