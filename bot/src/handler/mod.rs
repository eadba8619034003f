mod chat;
pub mod commands;

use crate::state::State;
use crate::sweeps;

use log::{debug, info, trace, warn};
use serenity::{
    async_trait,
    model::application::interaction::Interaction,
    model::channel::Message,
    model::event::ResumedEvent,
    model::gateway::{Activity, Ready},
    prelude::*,
};
use std::sync::Arc;

pub struct Handler {
    state: Arc<State>,
}

impl Handler {
    pub const fn new(state: Arc<State>) -> Handler {
        Handler { state }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        // dont care about bot messages
        if msg.author.bot {
            return;
        }

        if msg.guild_id.is_none() {
            trace!("ignoring direct message from {}", msg.author.id);
            return;
        }

        if let Some(reply) = commands::handle_command(&ctx, &self.state, &msg).await {
            if let Err(why) = reply.send(&ctx).await {
                warn!("Failed to send reply with err: {why}");
            }
        }

        match chat::award(&ctx, &self.state, &msg).await {
            Ok(()) => (),
            Err(why) if why.is_unavailable() => {
                warn!("Database unavailable, no chat points for {}", msg.author.id)
            }
            Err(why) => warn!("Failed to award chat points with err: {why}"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::MessageComponent(component) => {
                commands::handle_component(&ctx, &self.state, &component).await
            }
            other => debug!("ignoring interaction {:?}", other.kind()),
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        ctx.set_activity(Activity::playing("managing points")).await;
        sweeps::start(ctx, &self.state);
    }

    async fn resume(&self, _: Context, _: ResumedEvent) {
        info!("gateway session resumed");
    }
}
