use crate::config::Config;
use crate::cooldown::Gates;
use crate::ledger::Ledger;
use crate::roles::ThresholdTable;
use crate::structs::Notice;

use chrono::{DateTime, Utc};
use db::Store;
use log::warn;
use serenity::model::id::{GuildId, RoleId};
use serenity::model::Permissions;
use serenity::prelude::Context;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Everything the event handler and the sweeps share.
pub struct State {
    pub config: Config,
    pub store: Arc<Store>,
    pub ledger: Ledger,
    pub gates: Gates,
    pub roles: ThresholdTable,
    pub admin_roles: HashSet<RoleId>,
    pub started_at: DateTime<Utc>,
    /// Running sweep tasks, empty until the first ready event.
    pub sweeps: Mutex<Vec<JoinHandle<()>>>,
}

impl State {
    pub fn new(config: Config, store: Arc<Store>) -> State {
        State {
            ledger: Ledger::new(Arc::clone(&store), config.protected_users()),
            gates: Gates::new(Arc::clone(&store), &config.cooldowns),
            roles: ThresholdTable::new(&config.roles),
            admin_roles: config.admin_roles(),
            started_at: Utc::now(),
            sweeps: Mutex::new(Vec::new()),
            store,
            config,
        }
    }

    #[inline]
    pub fn is_admin(&self, roles: &[RoleId], permissions: Option<Permissions>) -> bool {
        is_admin(roles, permissions, &self.admin_roles)
    }

    /// Posts to the operator log channel. Failures are only logged.
    pub async fn log(&self, ctx: &Context, guild: GuildId, notice: Notice) {
        self.post(ctx, guild, &self.config.channels.log, notice).await;
    }

    /// Posts to a named channel, returning whether it was delivered.
    pub async fn post(&self, ctx: &Context, guild: GuildId, channel: &str, notice: Notice) -> bool {
        match notice.send_named(ctx, guild, channel).await {
            Ok(sent) => sent,
            Err(why) => {
                warn!("Failed to post '{}' to #{channel} in {guild}: {why}", notice.title());
                false
            }
        }
    }
}

/// Administrator permission or any configured admin role.
pub fn is_admin(
    roles: &[RoleId],
    permissions: Option<Permissions>,
    admin_roles: &HashSet<RoleId>,
) -> bool {
    permissions.map_or(false, |p| p.administrator())
        || roles.iter().any(|r| admin_roles.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let admin_roles = HashSet::from([RoleId(10)]);
        assert!(is_admin(&[RoleId(10)], None, &admin_roles));
        assert!(is_admin(&[], Some(Permissions::ADMINISTRATOR), &admin_roles));
        assert!(!is_admin(&[RoleId(11)], Some(Permissions::SEND_MESSAGES), &admin_roles));
        assert!(!is_admin(&[], None, &admin_roles));
    }
}
