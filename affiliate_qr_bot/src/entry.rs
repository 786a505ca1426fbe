use std::sync::Arc;
use teloxide::{dptree::deps, prelude::*};

use crate::{config::Config, handlers, relay::Relay};

/// Starts the bot and runs it until interrupted.
///
/// Exits the process with status 1 if the configuration is incomplete.
pub async fn entry() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    log::info!("[{}] Starting the bot...", config.instance_id);
    log::debug!("{config:?}");

    let relay = match Relay::new(&config) {
        Ok(relay) => Arc::new(relay),
        Err(e) => {
            log::error!("Could not set up HTTP clients: {e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.bot_token);

    if let Err(e) = bot.set_my_commands(handlers::generate_bot_commands()).await {
        log::warn!("Failed to set bot commands: {e}");
    }

    log::info!("Creating the handler...");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    log::info!("[{}] Dispatching the dispatcher!", config.instance_id);

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![relay])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
