use std::sync::{Mutex, PoisonError};

use html_escape::encode_text;

use crate::{
    affiliate::{AffiliateClient, AffiliateError},
    classifier::Request,
    config::Config,
    expander::Expander,
    ledger::DedupLedger,
    types::{MarketplaceLink, MessageKey, Platform},
};

/// Telegram refuses photo captions longer than this many characters.
const CAPTION_LIMIT: usize = 1024;
/// How much of the encoded content to show in a caption, leaving room for the rest of it.
const CONTENT_PREVIEW_LIMIT: usize = 900;
/// Visible length of the labels around the two links of an affiliate caption, with slack.
const AFFILIATE_LABELS_LEN: usize = 64;

/// What to reply with once a request is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reply with a QR code of the payload.
    Encode(Reply),
    /// Give up and tell the user why.
    Abort { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// What the QR code should contain.
    pub payload: String,
    /// Caption of the QR code image, in HTML.
    pub caption: String,
    /// Something to tell the user while the QR code is being made, in HTML.
    pub notice: Option<String>,
    /// What to show instead if the QR code can't be made or sent, in HTML.
    pub failure_text: String,
}

/// Shorten the text to at most `limit` characters, marking the cut with an ellipsis.
fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut output: String = text.chars().take(limit.saturating_sub(1)).collect();
    output.push('…');
    output
}

/// Holds all the state the bot has and the clients it talks to the outside world with.
pub struct Relay {
    pub instance_id: String,
    expander: Expander,
    affiliate: AffiliateClient,
    ledger: Mutex<DedupLedger<MessageKey>>,
}

impl Relay {
    pub fn new(config: &Config) -> Result<Self, AffiliateError> {
        Ok(Self::with_parts(
            config.instance_id.clone(),
            Expander::new(config.instance_id.clone())?,
            AffiliateClient::new(
                config.instance_id.clone(),
                config.affiliate_api_url.clone(),
                config.affiliate_token.clone(),
                config.verify_tls,
            )?,
        ))
    }

    pub fn with_parts(instance_id: String, expander: Expander, affiliate: AffiliateClient) -> Self {
        Self {
            instance_id,
            expander,
            affiliate,
            ledger: Mutex::new(DedupLedger::default()),
        }
    }

    /// Returns `true` if this is the first time the message is seen and it should be handled.
    pub fn first_sighting(&self, key: MessageKey) -> bool {
        self.ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .admit(key)
    }

    /// Text of the placeholder message shown while the request is being worked on.
    pub fn placeholder(&self, request: &Request) -> String {
        let instance_id = encode_text(&self.instance_id);
        match request {
            Request::Affiliate(link) => {
                format!("[{instance_id}] Processing {} link...", link.platform)
            }
            Request::Content(_) => format!("[{instance_id}] Generating QR code..."),
        }
    }

    /// Do all the network work needed for the request and decide on what to reply with.
    pub async fn resolve(&self, request: Request) -> Resolution {
        match request {
            Request::Content(content) => Resolution::Encode(content_reply(content)),
            Request::Affiliate(link) => self.resolve_affiliate(link).await,
        }
    }

    async fn resolve_affiliate(&self, link: MarketplaceLink) -> Resolution {
        let platform = link.platform;

        let expanded = if link.needs_expansion {
            match self.expander.expand(&link.url, platform).await {
                Some(url) => Some(url.to_string()),
                None => {
                    return Resolution::Abort {
                        reason: format!(
                            concat!(
                                "Could not unshorten the {} link!\n\n",
                                "Original link: {}\n\n",
                                "Please try again or check that the link is valid."
                            ),
                            platform,
                            encode_text(&link.url),
                        ),
                    }
                }
            }
        } else {
            None
        };

        let target = expanded.as_deref().unwrap_or(&link.url);

        let Some(short_link) = self.affiliate.shorten(target, platform).await else {
            log::warn!("[{}] Falling back to QR of the {platform} link itself", self.instance_id);
            let shown = encode_text(&preview(target, CONTENT_PREVIEW_LIMIT)).into_owned();
            return Resolution::Encode(Reply {
                payload: target.to_string(),
                caption: format!("QR of the original {platform} link:\n{shown}"),
                notice: Some(format!(
                    "Could not make an affiliate link for this {platform} link. Making a QR code of the original link..."
                )),
                failure_text: format!("Could not make a QR code for the {platform} link:\n{shown}"),
            });
        };

        let (caption, failure_text) = affiliate_captions(platform, expanded.as_deref(), &short_link);

        Resolution::Encode(Reply {
            caption,
            payload: short_link,
            notice: None,
            failure_text,
        })
    }
}

/// Caption and failure text for a freshly made affiliate link.
///
/// Links are cut before escaping, so the caption fits Telegram's limit as Telegram counts it,
/// and the affiliate link always makes it in whole unless it's absurd on its own.
fn affiliate_captions(platform: Platform, expanded: Option<&str>, short_link: &str) -> (String, String) {
    let short = encode_text(&preview(short_link, CONTENT_PREVIEW_LIMIT)).into_owned();

    match expanded {
        Some(expanded) => {
            let room = CAPTION_LIMIT
                .saturating_sub(short_link.chars().count() + AFFILIATE_LABELS_LEN)
                .min(CONTENT_PREVIEW_LIMIT);
            let expanded = encode_text(&preview(expanded, room)).into_owned();
            let both =
                format!("<b>Unshortened link:</b>\n{expanded}\n\n<b>Affiliate link:</b>\n{short}");
            let failure_text = format!("{both}\n\nCould not make a QR code.");
            (both, failure_text)
        }
        None => (
            format!("QR of the {platform} link:\n{short}"),
            format!("{platform} link shortened:\n{short}\n\nCould not make a QR code."),
        ),
    }
}

/// Reply for arbitrary content: a QR code of it, with the content itself as the caption.
fn content_reply(content: String) -> Reply {
    let shown = encode_text(&preview(&content, CONTENT_PREVIEW_LIMIT)).into_owned();

    let (caption, failure_text) = if content.starts_with("http://") || content.starts_with("https://") {
        (
            format!("QR of the link:\n{shown}"),
            format!("Could not make a QR code for the link:\n{shown}"),
        )
    } else {
        (
            format!("QR of the content:\n<code>{shown}</code>"),
            format!("Could not make a QR code for the content:\n<code>{shown}</code>"),
        )
    };

    Reply {
        payload: content,
        caption,
        notice: None,
        failure_text,
    }
}
