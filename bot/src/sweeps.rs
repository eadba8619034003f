//! Recurring background work: staff salaries, blacklist expiry and the
//! leaderboard broadcast. Each runs on its own fixed interval and a failing
//! pass is logged and skipped until the next tick.

use crate::config::Salary;
use crate::errors::Result;
use crate::roles;
use crate::state::State;
use crate::structs::notice::{colours, Notice};

use chrono::Utc;
use db::structs::BlacklistEntry;
use db::{ReadOnlyDb, WriteableDb};
use log::{debug, info, warn};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

const MEMBER_PAGE: u64 = 1000;

/// Starts the sweeps unless they are already running. Ready fires again on
/// every reconnect, only the first one starts them.
pub fn start(ctx: Context, state: &Arc<State>) {
    let mut running = match state.sweeps.lock() {
        Ok(running) => running,
        Err(_why) => {
            warn!("Failed to acquire lock on sweep tasks");
            return;
        }
    };
    if running.is_empty() {
        *running = spawn(ctx, Arc::clone(state));
        info!("started {} sweeps", running.len());
    }
}

/// Aborts the sweeps so a rebuilt client can start fresh ones.
pub fn stop(state: &State) {
    match state.sweeps.lock() {
        Ok(mut running) => {
            for task in running.drain(..) {
                task.abort();
            }
        }
        Err(_why) => warn!("Failed to acquire lock on sweep tasks"),
    }
}

fn spawn(ctx: Context, state: Arc<State>) -> Vec<JoinHandle<()>> {
    let sweeps = state.config.sweeps.clone();
    let mut tasks = Vec::new();

    tasks.push(every(Duration::from_secs(sweeps.salary_secs), {
        let (ctx, state) = (ctx.clone(), Arc::clone(&state));
        move || {
            let (ctx, state) = (ctx.clone(), Arc::clone(&state));
            async move { salary_sweep(&ctx, &state).await }
        }
    }));

    tasks.push(every(Duration::from_secs(sweeps.blacklist_secs), {
        let (ctx, state) = (ctx.clone(), Arc::clone(&state));
        move || {
            let (ctx, state) = (ctx.clone(), Arc::clone(&state));
            async move { blacklist_sweep(&ctx, &state).await }
        }
    }));

    if sweeps.leaderboard_secs > 0 {
        tasks.push(every(Duration::from_secs(sweeps.leaderboard_secs), move || {
            let (ctx, state) = (ctx.clone(), Arc::clone(&state));
            async move { leaderboard_broadcast(&ctx, &state).await }
        }));
    } else {
        info!("leaderboard broadcast disabled");
    }
    tasks
}

fn every<F, Fut>(period: Duration, mut task: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            task().await;
        }
    })
}

/// The salary paid to a member holding `held`: the highest amount among the
/// salaried roles they have.
pub fn pick_salary(salaries: &[Salary], held: &[RoleId]) -> Option<(RoleId, i64)> {
    salaries
        .iter()
        .filter(|s| held.contains(&RoleId(s.role)))
        .fold(None, |best: Option<&Salary>, s| match best {
            Some(b) if b.amount >= s.amount => Some(b),
            _ => Some(s),
        })
        .map(|s| (RoleId(s.role), s.amount))
}

async fn guild_members(ctx: &Context, guild: GuildId) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    let mut after: Option<UserId> = None;
    loop {
        let page = guild.members(&ctx.http, Some(MEMBER_PAGE), after).await?;
        let full = page.len() as u64 == MEMBER_PAGE;
        after = page.last().map(|m| m.user.id);
        members.extend(page);
        if !full {
            break;
        }
    }
    Ok(members)
}

async fn pay_guild(ctx: &Context, state: &State, guild: GuildId) -> Result<usize> {
    let mut paid = 0;
    for member in guild_members(ctx, guild).await? {
        let user = member.user.id;
        if member.user.bot || state.ledger.is_protected(user) {
            continue;
        }
        let (role, amount) = match pick_salary(&state.config.salaries, &member.roles) {
            Some(salary) => salary,
            None => continue,
        };
        if !state.gates.pass_salary(user, Utc::now())? {
            continue;
        }

        if let Some(balance) = state.ledger.add_delta(user, amount)? {
            info!("paid {user} a salary of {amount} for role {role}, balance {balance}");
            paid += 1;
            state
                .log(
                    ctx,
                    guild,
                    Notice::new("Salary", format!("<@{user}> received a salary of {amount} points"))
                        .colour(colours::GREEN),
                )
                .await;
            roles::reconcile_logged(ctx, state, guild, user).await;
        }
    }
    Ok(paid)
}

pub async fn salary_sweep(ctx: &Context, state: &State) {
    if state.config.salaries.is_empty() {
        return;
    }
    if !state.store.is_available() {
        warn!("Skipping salary sweep, database unavailable");
        return;
    }

    for guild in ctx.cache.guilds() {
        match pay_guild(ctx, state, guild).await {
            Ok(paid) => debug!("salary sweep paid {paid} members in {guild}"),
            Err(why) => warn!("Salary sweep failed in {guild}: {why}"),
        }
    }
}

async fn announce_expiry(ctx: &Context, state: &State, entry: &BlacklistEntry) {
    let user = UserId(entry.user_id);
    for guild in ctx.cache.guilds() {
        if guild.member(ctx, user).await.is_err() {
            continue;
        }
        let notice = Notice::new(
            "Blacklist expired",
            format!("**User:** <@{user}>'s blacklist has expired."),
        )
        .colour(colours::GREEN);
        state
            .post(ctx, guild, &state.config.channels.blacklist, notice)
            .await;
    }
}

pub async fn blacklist_sweep(ctx: &Context, state: &State) {
    let expired = match state
        .store
        .call(|db| db.take_expired_blacklist(Utc::now()))
    {
        Ok(expired) => expired,
        Err(why) if why.is_unavailable() => {
            warn!("Skipping blacklist sweep, database unavailable");
            return;
        }
        Err(why) => {
            warn!("Blacklist sweep failed: {why}");
            return;
        }
    };

    for entry in &expired {
        info!("blacklist of {} expired", entry.user_id);
        announce_expiry(ctx, state, entry).await;
    }
}

pub async fn leaderboard_broadcast(ctx: &Context, state: &State) {
    let configs = match state.store.call(|db| db.get_guild_configs()) {
        Ok(configs) => configs,
        Err(why) => {
            debug!("Skipping leaderboard broadcast: {why}");
            return;
        }
    };
    if configs.is_empty() {
        return;
    }

    let size = state.config.sweeps.leaderboard_size;
    let top = match state.ledger.top(size) {
        Ok(top) if !top.is_empty() => top,
        Ok(_) => return,
        Err(why) => {
            warn!("Failed to load the leaderboard: {why}");
            return;
        }
    };

    let notice = Notice::leaderboard(&format!("Top {size}"), &top);
    for config in configs {
        let channel = ChannelId(config.points_channel);
        if let Err(why) = notice.send(ctx, channel).await {
            warn!("Failed to post the leaderboard to {channel} in {}: {why}", config.guild_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salaries() -> Vec<Salary> {
        vec![
            Salary {
                role: 1,
                amount: 45,
            },
            Salary {
                role: 2,
                amount: 150,
            },
            Salary {
                role: 3,
                amount: 75,
            },
        ]
    }

    #[test]
    fn test_pick_highest_salary() {
        let held = [RoleId(3), RoleId(1), RoleId(99)];
        assert_eq!(pick_salary(&salaries(), &held), Some((RoleId(3), 75)));
        let held = [RoleId(1), RoleId(2), RoleId(3)];
        assert_eq!(pick_salary(&salaries(), &held), Some((RoleId(2), 150)));
    }

    #[test]
    fn test_no_salaried_role() {
        assert_eq!(pick_salary(&salaries(), &[RoleId(42)]), None);
        assert_eq!(pick_salary(&[], &[RoleId(1)]), None);
    }

    #[test]
    fn test_tie_keeps_first_configured() {
        let salaries = vec![
            Salary {
                role: 7,
                amount: 100,
            },
            Salary {
                role: 8,
                amount: 100,
            },
        ];
        assert_eq!(
            pick_salary(&salaries, &[RoleId(8), RoleId(7)]),
            Some((RoleId(7), 100))
        );
    }
}
