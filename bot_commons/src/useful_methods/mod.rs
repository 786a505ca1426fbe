use std::future::Future;

use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters, SendPhotoSetters},
    requests::Requester,
    sugar::request::RequestReplyExt,
    types::{InputFile, Message, ParseMode},
    Bot, RequestError,
};

pub trait MessageStuff {
    /// First name of the sending user, or title of the sending chat.
    fn sender_display_name(&self) -> &str;
}

impl MessageStuff for Message {
    fn sender_display_name(&self) -> &str {
        if let Some(user) = &self.from {
            user.first_name.as_str()
        } else if let Some(title) = self.sender_chat.as_ref().and_then(|c| c.title()) {
            title
        } else {
            // Shouldn't happen, but eh.
            "a private sender"
        }
    }
}

pub trait BotStuff {
    /// Reply to a message with HTML-formatted text.
    fn reply_html(
        &self,
        to: &Message,
        text: impl Into<String> + Send,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Reply to a message with an in-memory PNG image and an HTML caption.
    fn reply_png(
        &self,
        to: &Message,
        png: Vec<u8>,
        caption: impl Into<String> + Send,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    /// Replace the text of a message this bot has sent before.
    fn edit_html(
        &self,
        message: &Message,
        text: impl Into<String> + Send,
    ) -> impl Future<Output = Result<Message, RequestError>> + Send;

    fn dismiss(&self, message: &Message) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn reply_html(
        &self,
        to: &Message,
        text: impl Into<String> + Send,
    ) -> Result<Message, RequestError> {
        self.send_message(to.chat.id, text)
            .parse_mode(ParseMode::Html)
            .reply_to(to.id)
            .await
    }
    async fn reply_png(
        &self,
        to: &Message,
        png: Vec<u8>,
        caption: impl Into<String> + Send,
    ) -> Result<Message, RequestError> {
        // Without a filename Telegram may treat the upload as a document.
        self.send_photo(to.chat.id, InputFile::memory(png).file_name("qrcode.png"))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .reply_to(to.id)
            .await
    }
    async fn edit_html(
        &self,
        message: &Message,
        text: impl Into<String> + Send,
    ) -> Result<Message, RequestError> {
        self.edit_message_text(message.chat.id, message.id, text)
            .parse_mode(ParseMode::Html)
            .await
    }
    async fn dismiss(&self, message: &Message) -> Result<(), RequestError> {
        self.delete_message(message.chat.id, message.id).await?;
        Ok(())
    }
}
