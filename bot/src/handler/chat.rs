use crate::errors::Result;
use crate::roles;
use crate::state::State;

use chrono::Utc;
use log::trace;
use serenity::model::channel::Message;
use serenity::prelude::*;

/// Chat activity points: anti-spam first, then the chat cooldown, then the
/// award and a role check.
pub async fn award(ctx: &Context, state: &State, msg: &Message) -> Result<()> {
    let guild = match msg.guild_id {
        Some(guild) => guild,
        None => return Ok(()),
    };
    let user = msg.author.id;
    let now = Utc::now();

    if !state.gates.pass_spam(user, &msg.content, now)? {
        trace!("message from {user} held back by the spam filter");
        return Ok(());
    }
    if !state.gates.pass_chat(user, now)? {
        return Ok(());
    }

    if let Some(balance) = state
        .ledger
        .add_delta(user, state.config.cooldowns.points_per_message)?
    {
        trace!("{user} earned chat points, balance {balance}");
        roles::reconcile_logged(ctx, state, guild, user).await;
    }
    Ok(())
}
