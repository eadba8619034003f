use super::{respond_ephemeral, Invocation, COMMANDS};
use crate::errors::Result;
use crate::state::State;
use crate::structs::components::PanelButton;
use crate::structs::notice::{colours, Notice};
use crate::structs::reply::{Reply, ReplyContents, ReplyType};

use log::{info, warn};
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::prelude::*;

fn usage_lines(prefix: &str, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| COMMANDS.get(*name))
        .map(|info| format!("`{prefix}{}`\n{}", info.usage, info.description))
        .collect::<Vec<String>>()
        .join("\n\n")
}

pub fn panel<'a>(inv: &Invocation<'a>) -> Reply<'a> {
    let prefix = &inv.state.config.prefix;
    let admin_commands: Vec<&str> = COMMANDS
        .entries()
        .filter(|(_, info)| info.admin)
        .map(|(name, _)| *name)
        .collect();
    let notice = Notice::new("Control panel", usage_lines(prefix, &admin_commands))
        .footer("Only administrators can use these commands and buttons");
    Reply::with_contents(ReplyContents::Panel(notice), ReplyType::Message(inv.msg))
}

/// A panel button. The caller has already checked the clicker is an admin.
pub async fn click(
    ctx: &Context,
    state: &State,
    component: &MessageComponentInteraction,
    button: PanelButton,
) -> Result<()> {
    let prefix = state.config.prefix.as_str();
    let help = |names: &[&str]| usage_lines(prefix, names);

    let notice = match button {
        PanelButton::AddPoints => {
            Notice::new(button.label(), help(&["addpoints"])).colour(colours::GREEN)
        }
        PanelButton::RemovePoints => {
            Notice::new(button.label(), help(&["removepoints"])).colour(colours::RED)
        }
        PanelButton::Blacklist => Notice::new(
            button.label(),
            help(&["blacklist", "unblacklist", "blacklistcheck"]),
        )
        .colour(colours::RED),
        PanelButton::Announce => Notice::new(
            button.label(),
            help(&["announce", "promotion", "news", "alert"]),
        )
        .colour(colours::BLURPLE),
        PanelButton::PointsHelp => {
            Notice::new(button.label(), help(&["points", "level", "top", "ranks"]))
        }
        PanelButton::Daily => Notice::new(button.label(), help(&["daily"])).colour(colours::GREEN),
        PanelButton::Status => Notice::new(button.label(), help(&["status"])).colour(colours::TEAL),
        PanelButton::Setup => Notice::new(button.label(), help(&["setup", "removesetup"])),
        PanelButton::MyPoints => match state.ledger.get_balance(component.user.id) {
            Ok(balance) => Notice::new(button.label(), format!("You have **{balance}** points")),
            Err(why) if why.is_unavailable() => {
                Notice::new(button.label(), "The database is unavailable right now.")
                    .colour(colours::RED)
            }
            Err(why) => return Err(why),
        },
        PanelButton::ResetAll => match state.ledger.reset_all() {
            Ok(count) => {
                let by = component.user.id;
                warn!("{by} reset the points of {count} accounts");
                if let Some(guild) = component.guild_id {
                    state
                        .log(
                            ctx,
                            guild,
                            Notice::new(
                                "Reset points",
                                format!("<@{by}> reset the points of {count} accounts"),
                            )
                            .colour(colours::RED),
                        )
                        .await;
                }
                Notice::new(button.label(), format!("Reset the points of {count} accounts"))
                    .colour(colours::ORANGE)
            }
            Err(why) if why.is_unavailable() => {
                Notice::new(button.label(), "The database is unavailable right now.")
                    .colour(colours::RED)
            }
            Err(why) => return Err(why),
        },
    };

    info!("{} clicked {}", component.user.id, button.custom_id());
    respond_ephemeral(ctx, component, notice).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_lines() {
        let text = usage_lines("-", &["daily", "missing"]);
        assert!(text.starts_with("`-daily`\n"));
        assert!(!text.contains("missing"));
    }
}
