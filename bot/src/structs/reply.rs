use crate::errors::Result;
use crate::structs::components::{self, ChannelChoice};
use crate::structs::notice::Notice;

use serenity::builder::ParseValue;
use serenity::model;
use serenity::prelude::Context;

#[derive(Debug)]
pub enum ReplyContents {
    String(String),
    ConstStr(&'static str),
    Notice(Notice),
    /// Notice with the setup channel picker attached.
    ChannelSelect(Notice, Vec<ChannelChoice>),
    /// Notice with the control panel buttons attached.
    Panel(Notice),
}

#[derive(Debug)]
pub enum ReplyType<'a> {
    Message(&'a model::channel::Message),
}

#[derive(Debug)]
pub struct Reply<'a> {
    message: ReplyContents,
    place: ReplyType<'a>,
}

impl Reply<'_> {
    pub const fn new(message: String, place: ReplyType<'_>) -> Reply<'_> {
        Reply {
            message: ReplyContents::String(message),
            place,
        }
    }

    pub const fn new_const<'a>(message: &'static str, place: ReplyType<'a>) -> Reply<'a> {
        Reply {
            message: ReplyContents::ConstStr(message),
            place,
        }
    }

    pub const fn with_contents<'a>(message: ReplyContents, place: ReplyType<'a>) -> Reply<'a> {
        Reply { message, place }
    }

    pub const fn notice<'a>(notice: Notice, place: ReplyType<'a>) -> Reply<'a> {
        Reply {
            message: ReplyContents::Notice(notice),
            place,
        }
    }

    pub async fn send(&self, ctx: &Context) -> Result<()> {
        let ReplyType::Message(msg) = self.place;

        msg.channel_id
            .send_message(&ctx.http, |builder| {
                builder
                    .reference_message(msg)
                    .allowed_mentions(|f| {
                        f.replied_user(false)
                            .parse(ParseValue::Users)
                            .parse(ParseValue::Roles)
                    });
                match &self.message {
                    ReplyContents::String(inner) => builder.content(inner),
                    ReplyContents::ConstStr(inner) => builder.content(*inner),
                    ReplyContents::Notice(notice) => builder.embed(|e| notice.build(e)),
                    ReplyContents::ChannelSelect(notice, choices) => builder
                        .embed(|e| notice.build(e))
                        .components(|c| components::channel_select(c, choices)),
                    ReplyContents::Panel(notice) => builder
                        .embed(|e| notice.build(e))
                        .components(components::control_panel),
                }
            })
            .await?;

        Ok(())
    }
}
