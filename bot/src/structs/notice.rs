use crate::errors::Result;

use db::structs::Account;
use log::{trace, warn};
use serenity::builder::CreateEmbed;
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::Timestamp;
use serenity::prelude::*;

pub mod colours {
    pub const GOLD: u32 = 0xFFD700;
    pub const GREEN: u32 = 0x57F287;
    pub const RED: u32 = 0xFF0000;
    pub const ORANGE: u32 = 0xFF9900;
    pub const BLUE: u32 = 0x3498DB;
    pub const BLURPLE: u32 = 0x5865F2;
    pub const TEAL: u32 = 0x00FFAA;
}

/// An embed posted to a channel, timestamped when it is built.
#[derive(Debug, Clone)]
pub struct Notice {
    title: String,
    description: String,
    colour: u32,
    fields: Vec<(String, String, bool)>,
    footer: Option<String>,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Notice {
        Notice {
            title: title.into(),
            description: description.into(),
            colour: colours::GOLD,
            fields: Vec::new(),
            footer: None,
        }
    }

    pub fn colour(mut self, colour: u32) -> Notice {
        self.colour = colour;
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Notice {
        self.fields.push((name.into(), value.into(), inline));
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Notice {
        self.footer = Some(text.into());
        self
    }

    /// One line per account, best first.
    pub fn leaderboard(title: &str, accounts: &[Account]) -> Notice {
        let lines = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| format!("**#{}** <@{}>: {} points", i + 1, a.user_id, a.points))
            .collect::<Vec<String>>()
            .join("\n");
        Notice::new(title, lines).colour(colours::TEAL)
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn build<'a>(&self, embed: &'a mut CreateEmbed) -> &'a mut CreateEmbed {
        embed
            .title(&self.title)
            .description(&self.description)
            .colour(self.colour)
            .timestamp(Timestamp::now());
        for (name, value, inline) in &self.fields {
            embed.field(name, value, *inline);
        }
        if let Some(footer) = &self.footer {
            embed.footer(|f| f.text(footer));
        }
        embed
    }

    pub async fn send(&self, ctx: &Context, channel: ChannelId) -> Result<()> {
        channel
            .send_message(&ctx.http, |m| m.embed(|e| self.build(e)))
            .await?;
        Ok(())
    }

    /// Sends to the guild's text channel called `name`. Returns false if the
    /// guild has no such channel.
    pub async fn send_named(&self, ctx: &Context, guild: GuildId, name: &str) -> Result<bool> {
        match find_text_channel(ctx, guild, name).await? {
            Some(channel) => {
                trace!("sending notice '{}' to #{name} in {guild}", self.title);
                self.send(ctx, channel).await?;
                Ok(true)
            }
            None => {
                warn!("Channel '{name}' not found in guild {guild}");
                Ok(false)
            }
        }
    }
}

pub async fn find_text_channel(
    ctx: &Context,
    guild: GuildId,
    name: &str,
) -> Result<Option<ChannelId>> {
    let channels = guild.channels(&ctx.http).await?;
    Ok(channels
        .values()
        .find(|c| c.kind == ChannelType::Text && c.name == name)
        .map(|c| c.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_lines() {
        let accounts = [
            Account {
                user_id: 5,
                points: 300,
            },
            Account {
                user_id: 9,
                points: -2,
            },
        ];
        let notice = Notice::leaderboard("Top", &accounts);
        assert_eq!(notice.title(), "Top");
        assert_eq!(
            notice.description,
            "**#1** <@5>: 300 points\n**#2** <@9>: -2 points"
        );
        assert_eq!(notice.colour, colours::TEAL);
    }

    #[test]
    fn test_builder() {
        let notice = Notice::new("Salary", "paid")
            .colour(colours::GREEN)
            .field("Amount", "75", true)
            .footer("hourly");
        assert_eq!(notice.fields, vec![(String::from("Amount"), String::from("75"), true)]);
        assert_eq!(notice.footer.as_deref(), Some("hourly"));
    }
}
