use super::args;
use super::Invocation;
use crate::cooldown;
use crate::errors::Result;
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::Reply;

use chrono::{Duration, Utc};
use db::{ReadOnlyDb, WriteableDb};
use log::info;

const MAX_DAYS: i64 = 36_500;

/// Time left on a blacklist, rounded up to the minute so an active entry
/// never reads as zero.
fn remaining_text(left: Duration) -> String {
    let minutes = (left.num_seconds() + 59) / 60;
    cooldown::humanize(Duration::minutes(minutes))
}

pub async fn blacklist<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let (user_arg, rest) = args::next_arg(inv.args);
    let (days_arg, reason) = args::next_arg(rest);
    let (user, days) = match (
        user_arg.and_then(args::parse_user),
        days_arg.and_then(args::parse_amount),
    ) {
        (Some(user), Some(days)) if !reason.is_empty() => (user, days),
        _ => return Ok(inv.usage("blacklist")),
    };
    if !(1..=MAX_DAYS).contains(&days) {
        return Ok(inv.reply_const("The duration has to be a positive number of days."));
    }

    let now = Utc::now();
    let expires_at = now + Duration::days(days);
    inv.state
        .store
        .call(|db| db.add_blacklist(user, reason, expires_at, now))?;

    let author = inv.msg.author.id;
    info!("{author} blacklisted {user} for {days} days");
    let notice = Notice::new(
        "Blacklisted",
        format!(
            "**User:** <@{user}>\n**By:** <@{author}>\n\
             **Duration:** {days} days\n**Reason:** {reason}"
        ),
    )
    .colour(colours::RED);
    inv.state
        .post(inv.ctx, inv.guild, &inv.state.config.channels.blacklist, notice.clone())
        .await;
    inv.state.log(inv.ctx, inv.guild, notice).await;

    Ok(inv.reply(format!("<@{user}> is blacklisted for {days} days.")))
}

pub async fn unblacklist<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let user = match args::next_arg(inv.args).0.and_then(args::parse_user) {
        Some(user) => user,
        None => return Ok(inv.usage("unblacklist")),
    };

    if !inv.state.store.call(|db| db.remove_blacklist(user))? {
        return Ok(inv.reply(format!("<@{user}> is not blacklisted.")));
    }

    let author = inv.msg.author.id;
    info!("{author} lifted the blacklist of {user}");
    let notice = Notice::new(
        "Unblacklisted",
        format!("**User:** <@{user}>\n**By:** <@{author}>"),
    )
    .colour(colours::GREEN);
    inv.state
        .post(inv.ctx, inv.guild, &inv.state.config.channels.blacklist, notice.clone())
        .await;
    inv.state.log(inv.ctx, inv.guild, notice).await;

    Ok(inv.reply(format!("<@{user}> was removed from the blacklist.")))
}

pub fn check<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let user = match args::next_arg(inv.args).0.and_then(args::parse_user) {
        Some(user) => user,
        None => return Ok(inv.usage("blacklistcheck")),
    };

    let entry = inv.state.store.call(|db| db.get_blacklist_entry(user))?;
    let now = Utc::now();
    // entries past their expiry wait for the next sweep but no longer count
    Ok(match entry.and_then(|e| e.remaining(now).map(|left| (e, left))) {
        Some((entry, left)) => inv.reply(format!(
            "<@{user}> is blacklisted.\n**Reason:** {}\n**Remaining:** {}",
            entry.reason,
            remaining_text(left)
        )),
        None => inv.reply(format!("<@{user}> is not blacklisted.")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_under_a_day() {
        assert_eq!(remaining_text(Duration::hours(5)), "5h");
        assert_eq!(remaining_text(Duration::seconds(30)), "1m");
        assert_eq!(remaining_text(Duration::minutes(90) - Duration::seconds(10)), "1h 30m");
    }

    #[test]
    fn test_remaining_days() {
        assert_eq!(remaining_text(Duration::days(2) + Duration::hours(3)), "2days 3h");
    }
}
