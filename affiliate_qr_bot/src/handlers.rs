use std::sync::Arc;

use bot_commons::{
    commands::{split_command, CommandLine},
    useful_methods::*,
};
use html_escape::encode_text;
use teloxide::{
    prelude::*,
    types::{BotCommand, Me},
    RequestError,
};

use crate::{
    classifier::{classify, classify_argument, Request},
    qr,
    relay::{Relay, Resolution},
    types::MessageKey,
};

const COMMANDS_HELP: &str = "\
• <code>/shorten &lt;link&gt;</code> - shorten a link manually
• <code>/status</code> - check the bot status
• <b>Send anything else</b> - get a QR code of it";

const FEATURES_HELP: &str = "\
• <b>Shopee/Lazada links</b> → affiliate link + QR code
• <b>Other links/text</b> → QR code as is";

pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Show the welcome message"),
        BotCommand::new("help", "Show the welcome message"),
        BotCommand::new("shorten", "Make an affiliate link and a QR code for a link"),
        BotCommand::new("status", "Check the bot status"),
    ]
}

fn welcome_text(instance_id: &str) -> String {
    format!(
        "<b>Welcome to the QR &amp; affiliate bot!</b>

Bot instance: <code>{}</code>

<b>Commands:</b>
{COMMANDS_HELP}

<b>Special features:</b>
{FEATURES_HELP}

Just send anything and the bot will make a QR code of it!",
        encode_text(instance_id)
    )
}

fn status_text(instance_id: &str) -> String {
    format!(
        "<b>QR &amp; affiliate bot status</b>

<b>Bot</b>: online
<b>Instance ID</b>: <code>{}</code>
<b>Affiliate links</b>: working
<b>QR codes</b>: working

<b>Supported platforms:</b>
• <b>Shopee</b> - affiliate link + QR code
• <b>Lazada</b> - affiliate link + QR code
• <b>Other links/text</b> - QR code as is

<b>Commands:</b>
{COMMANDS_HELP}",
        encode_text(instance_id)
    )
}

const SHORTEN_USAGE: &str =
    "Please provide a link!\nFor example: <code>/shorten https://shopee.vn/...</code>";

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    relay: Arc<Relay>,
) -> Result<(), RequestError> {
    // Bot ignores messages made by itself.
    if message.from.as_ref().map(|from| from.id) == Some(me.id) {
        return Ok(());
    }

    let Some(text) = message.text() else {
        return Ok(());
    };

    if !relay.first_sighting(MessageKey::of(&message)) {
        log::warn!(
            "[{}] Message {} in chat {} was already handled, skipping",
            relay.instance_id,
            message.id.0,
            message.chat.id.0
        );
        return Ok(());
    }

    log::info!(
        "[{}] New message {} from {}: {}",
        relay.instance_id,
        message.id.0,
        message.sender_display_name(),
        text
    );

    match split_command(text, me.username()) {
        CommandLine::Text => process_request(&bot, &message, &relay, classify(text)).await,
        CommandLine::Foreign => Ok(()),
        CommandLine::Command { name, params } => {
            handle_command(&bot, &message, &relay, &name, params).await
        }
    }
}

async fn handle_command(
    bot: &Bot,
    message: &Message,
    relay: &Relay,
    command: &str,
    params: &str,
) -> Result<(), RequestError> {
    match command {
        // "/rutgon" is what this command used to be called.
        "/shorten" | "/rutgon" => {
            if params.is_empty() {
                bot.reply_html(message, SHORTEN_USAGE).await?;
                return Ok(());
            }
            process_request(bot, message, relay, classify_argument(params)).await
        }
        "/status" => {
            bot.reply_html(message, status_text(&relay.instance_id))
                .await?;
            Ok(())
        }
        // "/start", "/help", and anything unknown get the welcome message.
        _ => {
            bot.reply_html(message, welcome_text(&relay.instance_id))
                .await?;
            if command == "/start" {
                log::info!(
                    "[{}] Started by {}",
                    relay.instance_id,
                    message.sender_display_name()
                );
            }
            Ok(())
        }
    }
}

/// Run the request through the relay, and reply with its outcome.
///
/// A placeholder reply is sent first. It is deleted once the QR code is sent, or edited
/// into an explanation if anything goes wrong.
async fn process_request(
    bot: &Bot,
    message: &Message,
    relay: &Relay,
    request: Request,
) -> Result<(), RequestError> {
    let placeholder = bot.reply_html(message, relay.placeholder(&request)).await?;

    let reply = match relay.resolve(request).await {
        Resolution::Abort { reason } => {
            log::warn!("[{}] Giving up: {}", relay.instance_id, reason);
            bot.edit_html(&placeholder, reason).await?;
            return Ok(());
        }
        Resolution::Encode(reply) => reply,
    };

    if let Some(notice) = &reply.notice {
        if let Err(e) = bot.edit_html(&placeholder, notice.as_str()).await {
            log::warn!("[{}] Could not show a notice: {e}", relay.instance_id);
        }
    }

    let sent = match qr::encode_png_off_thread(reply.payload.clone()).await {
        Ok(png) => bot
            .reply_png(message, png, reply.caption.as_str())
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match sent {
        Ok(_) => {
            log::info!(
                "[{}] Sent a QR code of {}",
                relay.instance_id,
                reply.payload
            );
            if let Err(e) = bot.dismiss(&placeholder).await {
                log::warn!("[{}] Could not delete the placeholder: {e}", relay.instance_id);
            }
        }
        Err(e) => {
            log::error!("[{}] Failed to send a QR code: {e}", relay.instance_id);
            bot.edit_html(&placeholder, reply.failure_text).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_texts_mention_the_instance() {
        assert!(welcome_text("abc<1>").contains("<code>abc&lt;1&gt;</code>"));
        assert!(status_text("abc123").contains("<code>abc123</code>"));
    }

    #[test]
    fn bot_commands_are_valid() {
        let commands = generate_bot_commands();
        let names: Vec<&str> = commands.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, ["start", "help", "shorten", "status"]);
        for command in &commands {
            // Telegram only allows these, without the slash.
            assert!(command
                .command
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            assert!(!command.description.is_empty());
        }
    }
}
