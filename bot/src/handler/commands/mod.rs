mod announce;
pub(crate) mod args;
mod blacklist;
mod panel;
mod points;
mod setup;

use crate::errors::Result;
use crate::state::State;
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::{Reply, ReplyType};
use crate::structs::components::{PanelButton, SETUP_SELECT_ID};

use log::{debug, warn};
use phf::phf_ordered_map;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::GuildId;
use serenity::prelude::*;

pub struct CommandInfo {
    pub usage: &'static str,
    pub description: &'static str,
    pub admin: bool,
}

/// Every command, in the order help lists them.
pub static COMMANDS: phf::OrderedMap<&'static str, CommandInfo> = phf_ordered_map! {
    "help" => CommandInfo {
        usage: "help [commands|ranks|info]",
        description: "Show this help.",
        admin: false,
    },
    "points" => CommandInfo {
        usage: "points [@member]",
        description: "Show your points or another member's.",
        admin: false,
    },
    "level" => CommandInfo {
        usage: "level [@member]",
        description: "Show the current rank and the points left to the next one.",
        admin: false,
    },
    "daily" => CommandInfo {
        usage: "daily",
        description: "Claim the daily reward, once every 24 hours.",
        admin: false,
    },
    "top" => CommandInfo {
        usage: "top",
        description: "Show the members with the most points.",
        admin: false,
    },
    "ranks" => CommandInfo {
        usage: "ranks",
        description: "Show the ranks, their tasks and the points they need.",
        admin: false,
    },
    "status" => CommandInfo {
        usage: "status",
        description: "Show the state of the bot's systems.",
        admin: false,
    },
    "blacklistcheck" => CommandInfo {
        usage: "blacklistcheck @member",
        description: "Check whether a member is blacklisted.",
        admin: false,
    },
    "addpoints" => CommandInfo {
        usage: "addpoints @member <amount>",
        description: "Give points to a member.",
        admin: true,
    },
    "removepoints" => CommandInfo {
        usage: "removepoints @member <amount>",
        description: "Take points from a member.",
        admin: true,
    },
    "blacklist" => CommandInfo {
        usage: "blacklist @member <days> <reason>",
        description: "Blacklist a member for a number of days.",
        admin: true,
    },
    "unblacklist" => CommandInfo {
        usage: "unblacklist @member",
        description: "Lift a member's blacklist.",
        admin: true,
    },
    "announce" => CommandInfo {
        usage: "announce #channel <title> <message>",
        description: "Post an announcement. Quote a title with spaces.",
        admin: true,
    },
    "promotion" => CommandInfo {
        usage: "promotion @member @role <reason>",
        description: "Announce a promotion.",
        admin: true,
    },
    "news" => CommandInfo {
        usage: "news <message>",
        description: "Post to the news channel.",
        admin: true,
    },
    "alert" => CommandInfo {
        usage: "alert <message>",
        description: "Post to the alerts channel.",
        admin: true,
    },
    "setup" => CommandInfo {
        usage: "setup [#channel]",
        description: "Choose the channel the leaderboard is posted to.",
        admin: true,
    },
    "removesetup" => CommandInfo {
        usage: "removesetup",
        description: "Stop posting the leaderboard.",
        admin: true,
    },
    "panel" => CommandInfo {
        usage: "panel",
        description: "Open the control panel.",
        admin: true,
    },
};

/// What each named channel is for, keyed like `[channels]` in the config.
static CHANNEL_INFO: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "log" => "Every action taken by the bot or by staff: point changes, ranks, setup.",
    "blacklist" => "Dismissals and blacklists, and when they expire.",
    "alerts" => "Decisions and warnings from the administration.",
    "promotions" => "Promotions, with the reason and who granted them.",
    "news" => "News and announcements from the administration.",
};

/// A parsed command and everything needed to run it.
pub struct Invocation<'a> {
    pub ctx: &'a Context,
    pub state: &'a State,
    pub msg: &'a Message,
    pub guild: GuildId,
    pub is_admin: bool,
    pub args: &'a str,
}

impl<'a> Invocation<'a> {
    #[inline]
    pub fn reply(&self, text: String) -> Reply<'a> {
        Reply::new(text, ReplyType::Message(self.msg))
    }

    #[inline]
    pub fn reply_const(&self, text: &'static str) -> Reply<'a> {
        Reply::new_const(text, ReplyType::Message(self.msg))
    }

    #[inline]
    pub fn reply_notice(&self, notice: Notice) -> Reply<'a> {
        Reply::notice(notice, ReplyType::Message(self.msg))
    }

    pub fn usage(&self, name: &str) -> Reply<'a> {
        let usage = COMMANDS.get(name).map_or(name, |info| info.usage);
        self.reply(format!("Usage: `{}{usage}`", self.state.config.prefix))
    }
}

fn help<'a>(inv: &Invocation<'a>) -> Result<Reply<'a>> {
    let prefix = &inv.state.config.prefix;
    let (category, _) = args::next_arg(inv.args);
    let notice = match category.map(str::to_lowercase).as_deref() {
        None => Notice::new(
            "Points system help",
            format!("Use `{prefix}help <category>` for more."),
        )
        .colour(colours::BLURPLE)
        .field("Commands", format!("`{prefix}help commands`"), true)
        .field("Ranks", format!("`{prefix}help ranks`"), true)
        .field("Info", format!("`{prefix}help info`"), true),
        Some("commands") => {
            let mut notice = Notice::new("Commands", "").colour(colours::BLURPLE);
            for (_, info) in COMMANDS.entries().filter(|(_, i)| inv.is_admin || !i.admin) {
                notice = notice.field(format!("{prefix}{}", info.usage), info.description, false);
            }
            notice
        }
        Some("ranks") => return points::ranks(inv),
        Some("info") => {
            let names = &inv.state.config.channels;
            let mut notice = Notice::new("About the channels", "").colour(colours::BLUE);
            for (key, about) in CHANNEL_INFO.entries() {
                let name = match *key {
                    "log" => &names.log,
                    "blacklist" => &names.blacklist,
                    "alerts" => &names.alerts,
                    "promotions" => &names.promotions,
                    _ => &names.news,
                };
                notice = notice.field(format!("#{name}"), *about, false);
            }
            notice.field(
                "Points channel",
                "Chosen with setup, the leaderboard is posted there every few minutes.",
                false,
            )
        }
        Some(other) => {
            return Ok(inv.reply(format!(
                "There is no help category `{other}`. Use `{prefix}help` to see them."
            )))
        }
    };
    Ok(inv.reply_notice(notice))
}

async fn run<'a>(inv: &Invocation<'a>, name: &str) -> Result<Reply<'a>> {
    match name {
        "help" => help(inv),
        "points" => points::points(inv),
        "level" => points::level(inv),
        "daily" => points::daily(inv).await,
        "top" => points::top(inv),
        "ranks" => points::ranks(inv),
        "status" => points::status(inv),
        "addpoints" => points::adjust(inv, name, 1).await,
        "removepoints" => points::adjust(inv, name, -1).await,
        "blacklist" => blacklist::blacklist(inv).await,
        "unblacklist" => blacklist::unblacklist(inv).await,
        "blacklistcheck" => blacklist::check(inv),
        "announce" => announce::announce(inv).await,
        "promotion" => announce::promotion(inv).await,
        "news" => announce::news(inv).await,
        "alert" => announce::alert(inv).await,
        "setup" => setup::setup(inv).await,
        "removesetup" => setup::remove_setup(inv).await,
        "panel" => Ok(panel::panel(inv)),
        _ => Ok(inv.reply_const("Unrecognized command")),
    }
}

pub async fn handle_command<'a>(
    ctx: &'a Context,
    state: &'a State,
    msg: &'a Message,
) -> Option<Reply<'a>> {
    let (name, args) = args::split_command(&state.config.prefix, &msg.content)?;
    let guild = msg.guild_id?;

    let info = match COMMANDS.get(name.as_str()) {
        Some(info) => info,
        None => {
            return Some(Reply::new(
                format!("Unknown command, try `{}help`", state.config.prefix),
                ReplyType::Message(msg),
            ))
        }
    };

    let is_admin = match msg.member(ctx).await {
        Ok(member) => state.is_admin(&member.roles, member.permissions(ctx).ok()),
        Err(why) => {
            warn!("Failed to load member {} for {name}: {why}", msg.author.id);
            false
        }
    };

    if info.admin && !is_admin {
        debug!("{} tried admin command {name}", msg.author.id);
        return Some(Reply::new_const(
            "You don't have permission to use this command.",
            ReplyType::Message(msg),
        ));
    }

    let inv = Invocation {
        ctx,
        state,
        msg,
        guild,
        is_admin,
        args,
    };

    match run(&inv, &name).await {
        Ok(reply) => Some(reply),
        Err(why) if why.is_unavailable() => {
            warn!("Command {name} failed, database unavailable");
            Some(inv.reply_const(
                "The points database is unavailable right now, try again later.",
            ))
        }
        Err(why) => {
            warn!("Failed to process command {name} with err: {why}");
            Some(inv.reply_const("Something went wrong running that command."))
        }
    }
}

pub(crate) async fn respond_ephemeral(
    ctx: &Context,
    component: &MessageComponentInteraction,
    notice: Notice,
) -> Result<()> {
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|data| data.ephemeral(true).embed(|e| notice.build(e)))
        })
        .await?;
    Ok(())
}

/// Select menus and buttons. Authorization is checked again on every click.
pub async fn handle_component(
    ctx: &Context,
    state: &State,
    component: &MessageComponentInteraction,
) {
    let custom_id = component.data.custom_id.as_str();
    let is_admin = component
        .member
        .as_ref()
        .map_or(false, |m| state.is_admin(&m.roles, m.permissions));

    let ret = if !is_admin {
        respond_ephemeral(
            ctx,
            component,
            Notice::new("No permission", "Only administrators can use this.").colour(colours::RED),
        )
        .await
    } else if custom_id == SETUP_SELECT_ID {
        setup::select_channel(ctx, state, component).await
    } else if let Some(button) = PanelButton::from_custom_id(custom_id) {
        panel::click(ctx, state, component, button).await
    } else {
        debug!("ignoring component {custom_id}");
        Ok(())
    };

    if let Err(why) = ret {
        warn!("Failed to handle component {custom_id}: {why}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_has_usage() {
        for (name, info) in COMMANDS.entries() {
            assert!(info.usage.starts_with(name), "{name}");
            assert!(!info.description.is_empty());
        }
    }

    #[test]
    fn test_admin_commands() {
        let admin: Vec<_> = COMMANDS
            .entries()
            .filter(|(_, i)| i.admin)
            .map(|(n, _)| *n)
            .collect();
        assert!(admin.contains(&"addpoints"));
        assert!(admin.contains(&"panel"));
        assert!(!admin.contains(&"blacklistcheck"));
        assert!(!admin.contains(&"daily"));
    }

    #[test]
    fn test_channel_info_matches_config_keys() {
        let keys: Vec<_> = CHANNEL_INFO.keys().copied().collect();
        assert_eq!(keys, vec!["log", "blacklist", "alerts", "promotions", "news"]);
    }
}
