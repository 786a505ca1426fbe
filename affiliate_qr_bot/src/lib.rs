//! Telegram bot that turns Shopee and Lazada links into affiliate links, and anything sent to
//! it into QR codes.

/// Shared domain types.
mod types;

/// Configuration from environment variables.
pub mod config;

/// Finding marketplace links in text.
pub mod classifier;

/// Unshortening short links.
pub mod expander;

/// The affiliate link API.
pub mod affiliate;

/// QR code images.
pub mod qr;

/// Remembering which messages were handled already.
pub mod ledger;

/// The state of the bot and the decisions it makes about requests.
pub mod relay;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

pub use types::{MarketplaceLink, MessageKey, Platform};
