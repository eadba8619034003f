use super::{args, respond_ephemeral, Invocation};
use crate::errors::{Error, Result};
use crate::state::State;
use crate::structs::components::{ChannelChoice, MAX_SELECT_OPTIONS};
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::{Reply, ReplyContents, ReplyType};

use db::WriteableDb;
use log::{info, warn};
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::channel::{ChannelType, GuildChannel};
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::*;

async fn text_channels(ctx: &Context, guild: GuildId) -> Result<Vec<GuildChannel>> {
    let mut channels: Vec<GuildChannel> = guild
        .channels(&ctx.http)
        .await?
        .into_values()
        .filter(|c| c.kind == ChannelType::Text)
        .collect();
    channels.sort_by_key(|c| (c.position, c.id));
    Ok(channels)
}

async fn store_channel(
    ctx: &Context,
    state: &State,
    guild: GuildId,
    channel: ChannelId,
    by: UserId,
) -> Result<()> {
    state
        .store
        .call(|db| db.set_points_channel(guild, channel))?;
    info!("{by} set the points channel of {guild} to {channel}");
    state
        .log(
            ctx,
            guild,
            Notice::new("Setup", format!("<@{by}> set the points channel to <#{channel}>")),
        )
        .await;
    Ok(())
}

pub async fn setup<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let channels = text_channels(inv.ctx, inv.guild).await?;

    if let (Some(arg), _) = args::next_arg(inv.args) {
        let channel = match args::parse_channel(arg) {
            Some(channel) if channels.iter().any(|c| c.id == channel) => channel,
            _ => return Ok(inv.reply_const("That is not a text channel in this server.")),
        };
        store_channel(inv.ctx, inv.state, inv.guild, channel, inv.msg.author.id).await?;
        return Ok(inv.reply(format!("<#{channel}> is now the points channel")));
    }

    if channels.is_empty() {
        return Ok(inv.reply_const("This server has no text channels."));
    }
    if channels.len() > MAX_SELECT_OPTIONS {
        warn!(
            "Guild {} has {} text channels, only the first {MAX_SELECT_OPTIONS} are offered",
            inv.guild,
            channels.len()
        );
    }

    let choices = channels
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|c| ChannelChoice::new(c.id, &c.name))
        .collect();
    let notice = Notice::new(
        "Points system setup",
        format!(
            "Pick the channel the leaderboard is posted to.\n\n\
             If it isn't listed, use `{}setup #channel`.",
            inv.state.config.prefix
        ),
    );
    Ok(Reply::with_contents(
        ReplyContents::ChannelSelect(notice, choices),
        ReplyType::Message(inv.msg),
    ))
}

pub async fn remove_setup<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    if !inv.state.store.call(|db| db.remove_points_channel(inv.guild))? {
        return Ok(inv.reply_const("No points channel is set up."));
    }

    let author = inv.msg.author.id;
    info!("{author} removed the points channel of {}", inv.guild);
    inv.state
        .log(
            inv.ctx,
            inv.guild,
            Notice::new("Remove setup", format!("<@{author}> removed the points channel setup"))
                .colour(colours::ORANGE),
        )
        .await;
    Ok(inv.reply_const("The points channel setup was removed."))
}

/// The setup menu's selection.
pub async fn select_channel(
    ctx: &Context,
    state: &State,
    component: &MessageComponentInteraction,
) -> Result<()> {
    let guild = component
        .guild_id
        .ok_or(Error::ConstStr("setup menu used outside a guild"))?;
    let channel = component
        .data
        .values
        .first()
        .and_then(|v| v.parse::<u64>().ok())
        .map(ChannelId)
        .ok_or(Error::ConstStr("setup menu sent no channel"))?;

    if !text_channels(ctx, guild).await?.iter().any(|c| c.id == channel) {
        return respond_ephemeral(
            ctx,
            component,
            Notice::new("Setup", "That channel no longer exists.").colour(colours::RED),
        )
        .await;
    }

    let notice = match store_channel(ctx, state, guild, channel, component.user.id).await {
        Ok(()) => Notice::new("Setup", format!("<#{channel}> is now the points channel"))
            .colour(colours::GREEN),
        Err(why) if why.is_unavailable() => {
            Notice::new("Setup", "The database is unavailable, try again later.")
                .colour(colours::RED)
        }
        Err(why) => return Err(why),
    };
    respond_ephemeral(ctx, component, notice).await
}
