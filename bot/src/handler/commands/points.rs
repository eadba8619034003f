use super::args;
use super::Invocation;
use crate::cooldown::{self, Claim};
use crate::errors::Result;
use crate::roles;
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::Reply;

use chrono::Utc;
use db::ReadOnlyDb;
use log::info;
use serenity::model::id::UserId;

fn target(inv: &Invocation<'_>) -> Option<UserId> {
    match args::next_arg(inv.args) {
        (Some(arg), _) => args::parse_user(arg),
        (None, _) => Some(inv.msg.author.id),
    }
}

pub fn points<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let user = match target(inv) {
        Some(user) => user,
        None => return Ok(inv.usage("points")),
    };
    let balance = inv.state.ledger.get_balance(user)?;
    Ok(inv.reply(format!("<@{user}> has **{balance}** points")))
}

pub fn level<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let user = match target(inv) {
        Some(user) => user,
        None => return Ok(inv.usage("level")),
    };
    let balance = inv.state.ledger.get_balance(user)?;
    let level = inv.state.roles.level(balance);

    let mut notice = Notice::new("Level", format!("<@{user}>"))
        .field("Points", format!("`{balance}`"), false)
        .field(
            "Current rank",
            level
                .current
                .map_or_else(|| String::from("No rank"), |t| format!("<@&{}>", t.role)),
            false,
        );
    notice = match level.next {
        Some(next) => notice
            .field("Next rank", format!("<@&{}>", next.role), false)
            .field("Points to next rank", format!("`{}` more points", level.needed), false)
            .field("Progress", format!("`{}`", level.bar), false),
        None => notice.field("Next rank", "Already at the highest rank", false),
    };
    Ok(inv.reply_notice(notice))
}

pub async fn daily<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let user = inv.msg.author.id;
    if inv.state.ledger.is_protected(user) {
        return Ok(inv.reply_const("Protected accounts can't claim the daily reward."));
    }

    if let Claim::Wait(left) = inv.state.gates.daily.claim(user, Utc::now())? {
        return Ok(inv.reply(format!(
            "You can claim your daily reward again in {}",
            cooldown::humanize(left)
        )));
    }

    let reward = cooldown::roll_daily_reward(&mut rand::thread_rng());
    let balance = match inv.state.ledger.add_delta(user, reward) {
        Ok(Some(balance)) => balance,
        Ok(None) => return Ok(inv.reply_const("Protected accounts can't claim the daily reward.")),
        Err(why) => {
            inv.state.gates.daily.release(user)?;
            return Err(why);
        }
    };
    info!("{user} claimed a daily reward of {reward}");

    inv.state
        .log(
            inv.ctx,
            inv.guild,
            Notice::new("Daily reward", format!("<@{user}> got {reward} points")),
        )
        .await;
    roles::reconcile_logged(inv.ctx, inv.state, inv.guild, user).await;

    Ok(inv.reply(format!(
        "You got **{reward} points** from your daily reward.\nYou now have {balance} points."
    )))
}

pub fn top<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    const TOP_SIZE: usize = 10;

    let accounts = inv.state.ledger.top(TOP_SIZE)?;
    if accounts.is_empty() {
        return Ok(inv.reply_const("Nobody has any points yet."));
    }
    Ok(inv.reply_notice(Notice::leaderboard("Top 10", &accounts)))
}

pub fn ranks<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let entries = inv.state.roles.entries();
    if entries.is_empty() {
        return Ok(inv.reply_const("No ranks are configured."));
    }

    let description = entries
        .iter()
        .map(|t| {
            format!(
                "<@&{}>\n**Task:** {}\n**Points needed:** {}",
                t.role,
                t.task.as_deref().unwrap_or("No task defined."),
                t.points
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n");
    Ok(inv.reply_notice(
        Notice::new("Ranks, tasks and requirements", description).colour(colours::BLUE),
    ))
}

pub fn status<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let state = inv.state;
    let db_up = state.store.is_available();
    let working = |on: bool| if on { "Working" } else { "Unavailable" };

    let mut notice = Notice::new("System status", "")
        .colour(colours::TEAL)
        .field("Chat points", working(db_up), true)
        .field("Daily rewards", working(db_up), true)
        .field("Anti-spam", working(db_up), true)
        .field("Auto roles", working(!state.roles.entries().is_empty()), true)
        .field("Staff salaries", working(db_up && !state.config.salaries.is_empty()), true)
        .field("Control panel", working(true), true)
        .field(
            "Uptime",
            cooldown::humanize(Utc::now().signed_duration_since(state.started_at)),
            true,
        );

    if db_up {
        let channel = state.store.call(|db| db.get_points_channel(inv.guild))?;
        notice = notice
            .field("Accounts", state.ledger.count()?.to_string(), true)
            .field(
                "Points channel",
                channel.map_or_else(|| String::from("Not set up"), |c| format!("<#{c}>")),
                false,
            );
    }
    Ok(inv.reply_notice(notice))
}

/// Largest amount a single addpoints or removepoints may move.
pub const MAX_ADJUSTMENT: i64 = 1_000_000_000;

#[inline]
fn amount_allowed(amount: i64) -> bool {
    (1..=MAX_ADJUSTMENT).contains(&amount)
}

/// addpoints and removepoints, `sign` is 1 or -1.
pub async fn adjust<'a>(inv: &Invocation<'a>, name: &str, sign: i64) -> Result<Reply<'a>> {
    let (user_arg, rest) = args::next_arg(inv.args);
    let (amount_arg, _) = args::next_arg(rest);
    let (user, amount) = match (
        user_arg.and_then(args::parse_user),
        amount_arg.and_then(args::parse_amount),
    ) {
        (Some(user), Some(amount)) => (user, amount),
        _ => return Ok(inv.usage(name)),
    };

    if inv.state.ledger.is_protected(user) {
        return Ok(inv.reply_const("This member's points are protected and can't be changed."));
    }
    if !amount_allowed(amount) {
        return Ok(inv.reply(format!(
            "The amount has to be a positive number no larger than {MAX_ADJUSTMENT}."
        )));
    }

    let balance = match inv.state.ledger.add_delta(user, sign * amount)? {
        Some(balance) => balance,
        None => {
            return Ok(inv.reply_const("This member's points are protected and can't be changed."))
        }
    };
    let author = inv.msg.author.id;
    info!("{author} moved the balance of {user} by {} to {balance}", sign * amount);

    let (title, text, colour) = if sign > 0 {
        (
            "Add points",
            format!("<@{author}> gave {amount} points to <@{user}>"),
            colours::GREEN,
        )
    } else {
        (
            "Remove points",
            format!("<@{author}> took {amount} points from <@{user}>"),
            colours::ORANGE,
        )
    };
    inv.state
        .log(inv.ctx, inv.guild, Notice::new(title, text).colour(colour))
        .await;
    roles::reconcile_logged(inv.ctx, inv.state, inv.guild, user).await;

    let verb = if sign > 0 { "Added" } else { "Removed" };
    Ok(inv.reply(format!(
        "{verb} {amount} points, <@{user}> now has {balance} points"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_bounds() {
        assert!(amount_allowed(1));
        assert!(amount_allowed(MAX_ADJUSTMENT));
        assert!(!amount_allowed(0));
        assert!(!amount_allowed(-5));
        assert!(!amount_allowed(MAX_ADJUSTMENT + 1));
        assert!(!amount_allowed(i64::MAX));
    }
}
