use super::args;
use super::Invocation;
use crate::errors::Result;
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::Reply;

use log::info;

pub async fn announce<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let (channel_arg, rest) = args::next_arg(inv.args);
    let (title, message) = args::next_arg(rest);
    let (channel, title) = match (channel_arg.and_then(args::parse_channel), title) {
        (Some(channel), Some(title)) if !message.is_empty() => (channel, title),
        _ => return Ok(inv.usage("announce")),
    };

    let in_guild = channel
        .to_channel(inv.ctx)
        .await?
        .guild()
        .map_or(false, |c| c.guild_id == inv.guild);
    if !in_guild {
        return Ok(inv.reply_const("That channel is not in this server."));
    }

    Notice::new(title, message).send(inv.ctx, channel).await?;
    info!("{} announced '{title}' in {channel}", inv.msg.author.id);
    inv.state
        .log(
            inv.ctx,
            inv.guild,
            Notice::new(
                "Announcement",
                format!("<@{}> posted '{title}' in <#{channel}>", inv.msg.author.id),
            ),
        )
        .await;

    Ok(inv.reply(format!("Announcement sent to <#{channel}>")))
}

pub async fn promotion<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let (user_arg, rest) = args::next_arg(inv.args);
    let (role_arg, reason) = args::next_arg(rest);
    let (user, role) = match (
        user_arg.and_then(args::parse_user),
        role_arg.and_then(args::parse_role),
    ) {
        (Some(user), Some(role)) if !reason.is_empty() => (user, role),
        _ => return Ok(inv.usage("promotion")),
    };

    let author = inv.msg.author.id;
    let notice = Notice::new(
        "Promotion",
        format!(
            "**Congratulations to <@{user}> on their promotion to <@&{role}>!**\n\n\
             **Reason:** {reason}\n\nPromoted by: <@{author}>"
        ),
    )
    .colour(colours::GREEN);
    publish(inv, &inv.state.config.channels.promotions, notice).await
}

pub async fn news<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    if inv.args.is_empty() {
        return Ok(inv.usage("news"));
    }
    let notice = Notice::new("News", inv.args).colour(colours::BLUE);
    publish(inv, &inv.state.config.channels.news, notice).await
}

pub async fn alert<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    if inv.args.is_empty() {
        return Ok(inv.usage("alert"));
    }
    let notice = Notice::new("Alert", inv.args).colour(colours::ORANGE);
    publish(inv, &inv.state.config.channels.alerts, notice).await
}

/// Posts to a named channel and logs who did it.
async fn publish<'a>(inv: &Invocation<'a>, channel: &str, notice: Notice) -> Result<Reply<'a>> {
    let title = notice.title().to_owned();
    if !inv.state.post(inv.ctx, inv.guild, channel, notice).await {
        return Ok(inv.reply(format!("Couldn't post to #{channel}, does the channel exist?")));
    }

    info!("{} posted {title} to #{channel}", inv.msg.author.id);
    inv.state
        .log(
            inv.ctx,
            inv.guild,
            Notice::new(title.as_str(), format!("<@{}> posted to #{channel}", inv.msg.author.id)),
        )
        .await;
    Ok(inv.reply(format!("Posted to #{channel}")))
}
