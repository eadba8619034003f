//! Automatic roles driven by point thresholds.
//!
//! The role a member should hold is always derived from their balance, so
//! reconciling twice is harmless and a failed attempt is simply retried the
//! next time their points change.

use crate::config::RoleThreshold;
use crate::errors::Result;
use crate::state::State;
use crate::structs::notice::{colours, Notice};

use log::{debug, error, info, warn};
use serenity::http::error::Error as HttpError;
use serenity::model::error::Error as ModelError;
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::prelude::*;

const BAR_CELLS: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub points: i64,
    pub role: RoleId,
    pub task: Option<String>,
}

/// Thresholds sorted ascending by points.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    entries: Vec<Threshold>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePlan {
    pub add: RoleId,
    pub remove: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level<'a> {
    pub current: Option<&'a Threshold>,
    pub next: Option<&'a Threshold>,
    /// Points still missing for `next`.
    pub needed: i64,
    pub bar: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Unchanged,
    Applied(RolePlan),
    MissingPermissions,
}

impl ThresholdTable {
    pub fn new(thresholds: &[RoleThreshold]) -> ThresholdTable {
        let mut entries: Vec<Threshold> = thresholds
            .iter()
            .map(|t| Threshold {
                points: t.points,
                role: RoleId(t.role),
                task: t.task.clone(),
            })
            .collect();
        entries.sort_by_key(|t| t.points);
        ThresholdTable { entries }
    }

    #[inline]
    pub fn entries(&self) -> &[Threshold] {
        &self.entries
    }

    #[inline]
    pub fn contains(&self, role: RoleId) -> bool {
        self.entries.iter().any(|t| t.role == role)
    }

    fn current(&self, balance: i64) -> Option<&Threshold> {
        self.entries.iter().rev().find(|t| t.points <= balance)
    }

    /// Role of the highest threshold not above `balance`.
    pub fn eligible(&self, balance: i64) -> Option<RoleId> {
        self.current(balance).map(|t| t.role)
    }

    /// `None` when there is nothing to do. Otherwise the eligible role is
    /// added and every other table role the member holds is removed.
    pub fn plan(&self, balance: i64, held: &[RoleId]) -> Option<RolePlan> {
        let add = self.eligible(balance)?;
        if held.contains(&add) {
            return None;
        }
        let remove = held
            .iter()
            .copied()
            .filter(|role| *role != add && self.contains(*role))
            .collect();
        Some(RolePlan { add, remove })
    }

    pub fn level(&self, balance: i64) -> Level<'_> {
        let current = self.current(balance);
        let next = self.entries.iter().find(|t| t.points > balance);
        let (needed, bar) = match next {
            Some(next) => (next.points - balance, progress_bar(balance, next.points)),
            None => (0, progress_bar(1, 1)),
        };
        Level {
            current,
            next,
            needed,
            bar,
        }
    }
}

/// 20 cells filled in proportion to `balance / target`.
pub fn progress_bar(balance: i64, target: i64) -> String {
    let filled = if target <= 0 {
        BAR_CELLS
    } else {
        (balance.max(0) * BAR_CELLS / target).clamp(0, BAR_CELLS)
    };
    format!(
        "[{}{}]",
        "=".repeat(filled as usize),
        " ".repeat((BAR_CELLS - filled) as usize)
    )
}

/// True for errors caused by the bot lacking Manage Roles or sitting below
/// the target role.
pub fn is_permission_error(err: &SerenityError) -> bool {
    match err {
        SerenityError::Model(ModelError::InvalidPermissions(_)) => true,
        SerenityError::Http(inner) => matches!(
            &**inner,
            HttpError::UnsuccessfulRequest(resp) if resp.status_code.as_u16() == 403
        ),
        _ => false,
    }
}

async fn report_missing_permissions(ctx: &Context, state: &State, guild: GuildId, user: UserId) {
    error!("Missing Manage Roles permission in guild {guild}, could not update roles of {user}");
    let notice = Notice::new(
        "Missing permissions",
        format!(
            "Could not update the rank of <@{user}>. \
             Give the bot Manage Roles and move its role above the rank roles."
        ),
    )
    .colour(colours::RED);
    state.log(ctx, guild, notice).await;
}

/// Brings the member's table roles in line with their balance.
pub async fn reconcile(
    ctx: &Context,
    state: &State,
    guild: GuildId,
    user: UserId,
) -> Result<Outcome> {
    if state.ledger.is_protected(user) {
        return Ok(Outcome::Skipped);
    }

    let balance = state.ledger.get_balance(user)?;
    let member = guild.member(ctx, user).await?;
    let plan = match state.roles.plan(balance, &member.roles) {
        Some(plan) => plan,
        None => return Ok(Outcome::Unchanged),
    };
    debug!("reconciling {user} in {guild} at {balance} points: {plan:?}");

    for role in &plan.remove {
        if let Err(why) = ctx
            .http
            .remove_member_role(guild.0, user.0, role.0, Some("rank changed"))
            .await
        {
            if is_permission_error(&why) {
                report_missing_permissions(ctx, state, guild, user).await;
                return Ok(Outcome::MissingPermissions);
            }
            warn!("Failed to remove role {role} from {user}: {why}");
        }
    }

    if let Err(why) = ctx
        .http
        .add_member_role(guild.0, user.0, plan.add.0, Some("rank reached"))
        .await
    {
        if is_permission_error(&why) {
            report_missing_permissions(ctx, state, guild, user).await;
            return Ok(Outcome::MissingPermissions);
        }
        return Err(why.into());
    }

    info!("gave role {} to {user} in {guild} at {balance} points", plan.add);
    let notice = Notice::new(
        "Auto role",
        format!("<@{user}> reached <@&{}> with {balance} points", plan.add),
    )
    .colour(colours::GREEN);
    state.log(ctx, guild, notice).await;

    Ok(Outcome::Applied(plan))
}

/// Reconciles after a balance change. Errors end here.
pub async fn reconcile_logged(ctx: &Context, state: &State, guild: GuildId, user: UserId) {
    match reconcile(ctx, state, guild, user).await {
        Ok(outcome) => debug!("reconcile {user} in {guild}: {outcome:?}"),
        Err(why) if why.is_unavailable() => {
            warn!("Skipping role update for {user}, database unavailable")
        }
        Err(why) => warn!("Failed to update roles of {user} in {guild}: {why}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ThresholdTable {
        ThresholdTable::new(&[
            RoleThreshold {
                points: 150,
                role: 3,
                task: None,
            },
            RoleThreshold {
                points: 50,
                role: 1,
                task: Some(String::from("welcome new members")),
            },
            RoleThreshold {
                points: 100,
                role: 2,
                task: None,
            },
        ])
    }

    #[test]
    fn test_eligible() {
        let table = table();
        assert_eq!(table.eligible(0), None);
        assert_eq!(table.eligible(49), None);
        assert_eq!(table.eligible(50), Some(RoleId(1)));
        assert_eq!(table.eligible(149), Some(RoleId(2)));
        assert_eq!(table.eligible(10_000), Some(RoleId(3)));
        assert_eq!(table.eligible(-20), None);
    }

    #[test]
    fn test_zero_to_150_holds_only_top_role() {
        let table = table();
        let held = vec![RoleId(1), RoleId(2), RoleId(99)];
        let plan = table.plan(150, &held).unwrap();
        assert_eq!(plan.add, RoleId(3));
        assert_eq!(plan.remove, vec![RoleId(1), RoleId(2)]);

        let after: Vec<RoleId> = held
            .into_iter()
            .filter(|r| !plan.remove.contains(r))
            .chain(std::iter::once(plan.add))
            .collect();
        let table_roles: Vec<_> = after.iter().filter(|r| table.contains(**r)).collect();
        assert_eq!(table_roles, vec![&RoleId(3)]);
        assert_eq!(table.plan(150, &after), None);
    }

    #[test]
    fn test_plan_none_without_eligible_role() {
        assert_eq!(table().plan(10, &[RoleId(1)]), None);
    }

    #[test]
    fn test_plan_none_when_already_held() {
        // a stale lower role is left alone once the right one is held
        assert_eq!(table().plan(120, &[RoleId(2), RoleId(1)]), None);
    }

    #[test]
    fn test_level() {
        let table = table();
        let level = table.level(75);
        assert_eq!(level.current.map(|t| t.role), Some(RoleId(1)));
        assert_eq!(level.next.map(|t| t.role), Some(RoleId(2)));
        assert_eq!(level.needed, 25);
        assert_eq!(level.bar, format!("[{}{}]", "=".repeat(15), " ".repeat(5)));

        let top = table.level(500);
        assert!(top.next.is_none());
        assert_eq!(top.needed, 0);
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(-40, 50), format!("[{}]", " ".repeat(20)));
        assert_eq!(progress_bar(0, 50), format!("[{}]", " ".repeat(20)));
        assert_eq!(progress_bar(50, 50), format!("[{}]", "=".repeat(20)));
    }
}
