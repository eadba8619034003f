#![warn(
    clippy::cognitive_complexity,
    clippy::missing_const_for_fn,
    clippy::option_if_let_else
)]

mod config;
mod cooldown;
mod errors;
mod handler;
mod ledger;
mod roles;
mod state;
mod structs;
mod sweeps;

use log::LevelFilter;
use log::{debug, error, info, warn};
use serenity::gateway::GatewayError;
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use simple_logger::SimpleLogger;
use time::UtcOffset;

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use config::Config;
use db::Store;
use handler::Handler;
use state::State;

const DEFAULT_CONFIG: &str = "points-bot.toml";
const RESTART_DELAY: Duration = Duration::from_secs(5);

fn load_config() -> Config {
    let path = env::var("POINTS_BOT_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    match Config::load(&path) {
        Ok(config) => config,
        Err(why) => {
            error!("Failed to load config from {}, exiting: {why}", path.display());
            process::exit(1);
        }
    }
}

fn open_store(config: &Config) -> Store {
    let path = match env::var("DATABASE_URL") {
        Ok(url) => match config::database_path_from_url(&url) {
            Ok(path) => path,
            Err(why) => {
                error!("{why}");
                process::exit(1);
            }
        },
        Err(_) => config.database_path.clone(),
    };

    match Store::open(&path) {
        Ok(store) => {
            info!("sucessfully loaded and migrated db");
            store
        }
        Err(why) => {
            // keep running, commands report the outage instead of failing silently
            warn!(
                "Failed to open database at {}, running without storage: {why}",
                path.display()
            );
            Store::unavailable()
        }
    }
}

fn is_invalid_token(err: &SerenityError) -> bool {
    matches!(
        err,
        SerenityError::Gateway(GatewayError::InvalidAuthentication)
    )
}

#[tokio::main]
async fn main() {
    if let Err(why) = SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .with_module_level("points_bot", LevelFilter::Debug)
        .with_module_level("db", LevelFilter::Debug)
        .with_utc_offset(UtcOffset::UTC)
        .init()
    {
        eprintln!("Failed to start logger: {why}");
        process::exit(1);
    }

    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(_) => debug!("no .env file found"),
    }

    let config = load_config();

    // Configure the client with your Discord bot token in the environment.
    let token = match env::var("DISCORD_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            error!("Expected DISCORD_TOKEN in the environment");
            process::exit(1);
        }
    };

    let store = Arc::new(open_store(&config));
    let state = Arc::new(State::new(config, Arc::clone(&store)));

    // init for tokio metrics
    console_subscriber::init();

    let intents = GatewayIntents::GUILDS
        .union(GatewayIntents::GUILD_MEMBERS)
        .union(GatewayIntents::GUILD_MESSAGES)
        .union(GatewayIntents::MESSAGE_CONTENT);

    let shutting_down = Arc::new(AtomicBool::new(false));
    let mut exit_code = 0;

    loop {
        let mut client = match Client::builder(&token, intents)
            .event_handler(Handler::new(Arc::clone(&state)))
            .await
        {
            Ok(client) => client,
            Err(why) => {
                error!("Err creating client: {why}, retrying in {RESTART_DELAY:?}");
                tokio::time::sleep(RESTART_DELAY).await;
                continue;
            }
        };

        let shard_manager = Arc::clone(&client.shard_manager);
        let stop_flag = Arc::clone(&shutting_down);
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
                stop_flag.store(true, Ordering::SeqCst);
                shard_manager.lock().await.shutdown_all().await;
            }
        });

        let ret = client.start().await;
        ctrl_c.abort();
        sweeps::stop(&state);

        match ret {
            Ok(()) if shutting_down.load(Ordering::SeqCst) => break,
            Ok(()) => warn!("Client stopped, restarting in {RESTART_DELAY:?}"),
            Err(why) if is_invalid_token(&why) => {
                error!("Invalid token, check DISCORD_TOKEN");
                exit_code = 1;
                break;
            }
            Err(why) => error!("Client error: {why:?}, restarting in {RESTART_DELAY:?}"),
        }
        tokio::time::sleep(RESTART_DELAY).await;
    }

    store.close();
    process::exit(exit_code);
}
