/// What a piece of message text looks like from the point of view of
/// command handling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandLine<'a> {
    /// Plain text, not a command.
    Text,
    /// A command explicitly addressed to some other bot, like
    /// `/start@SomeOtherBot`. Should be left alone.
    Foreign,
    /// A command for us.
    Command {
        /// Lowercased callname with the leading slash, like `/start`.
        name: String,
        /// Everything after the callname, trimmed.
        params: &'a str,
    },
}

/// Split message text into a command callname and its parameters.
///
/// If the input is `/Shorten@My_Bot   https://example.com `, with the
/// bot's username being `My_Bot`, this returns a command named `/shorten`
/// with the parameters `https://example.com`.
#[must_use]
pub fn split_command<'a>(text: &'a str, bot_username: &str) -> CommandLine<'a> {
    if !text.starts_with('/') {
        return CommandLine::Text;
    }

    let Some(command) = text.split_whitespace().next() else {
        return CommandLine::Text;
    };

    if !command.is_ascii() {
        // Telegram commands must be ASCII.
        // See https://core.telegram.org/bots/api#botcommand
        return CommandLine::Text;
    }

    let params = text[command.len()..].trim();

    // If the command is "/start@Some_Bot", trim the "@" and everything after it,
    // but only if the username is actually ours.
    // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
    let callname = match command.split_once('@') {
        Some((callname, username)) => {
            if !username.eq_ignore_ascii_case(bot_username) {
                return CommandLine::Foreign;
            }
            callname
        }
        None => command,
    };

    CommandLine::Command {
        name: callname.to_ascii_lowercase(),
        params,
    }
}
