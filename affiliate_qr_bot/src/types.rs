use std::fmt::Display;

use teloxide::types::Message;
use url::Url;

/// A marketplace that affiliate links can be made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Shopee,
    Lazada,
}

impl Platform {
    /// Merchant names under which the affiliate API lists this platform's campaign,
    /// in order of preference.
    pub fn merchant_aliases(self) -> &'static [&'static str] {
        match self {
            Platform::Shopee => &["shopee"],
            Platform::Lazada => &["lazadacps", "lazada"],
        }
    }

    /// The domain every product page of this platform lives under.
    pub fn canonical_domain(self) -> &'static str {
        match self {
            Platform::Shopee => "shopee.vn",
            Platform::Lazada => "lazada.vn",
        }
    }

    /// Short link hosts that must be unshortened before the affiliate API accepts them.
    fn expansion_hosts(self) -> &'static [&'static str] {
        match self {
            // shp.ee and vn.shp.ee are accepted by the API as is.
            Platform::Shopee => &["s.shopee.vn"],
            Platform::Lazada => &["lzd.co", "s.lazada.vn"],
        }
    }

    /// Returns `true` if the host is this platform's canonical domain or a subdomain of it.
    pub fn owns_host(self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        let domain = self.canonical_domain();
        host == domain
            || host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.'))
    }

    pub fn host_needs_expansion(self, host: &str) -> bool {
        self.expansion_hosts()
            .iter()
            .any(|x| x.eq_ignore_ascii_case(host))
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Platform::Shopee => "Shopee",
            Platform::Lazada => "Lazada",
        })
    }
}

/// A link to a marketplace found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceLink {
    pub platform: Platform,
    /// The link exactly as it was matched.
    pub url: String,
    /// Whether the link is on a short link host that has to be expanded first.
    pub needs_expansion: bool,
}

impl MarketplaceLink {
    pub fn new(platform: Platform, url: String) -> Self {
        let needs_expansion = Url::parse(&url)
            .ok()
            .as_ref()
            .and_then(Url::host_str)
            .is_some_and(|host| platform.host_needs_expansion(host));

        Self {
            platform,
            url,
            needs_expansion,
        }
    }
}

/// Identifies a single inbound message for deduplication.
///
/// Telegram message IDs are only unique within a chat, hence the chat ID.
/// Ordering is by message ID first, under the assumption that bigger IDs are newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageKey {
    pub id: i32,
    pub chat: i64,
}

impl MessageKey {
    pub fn of(message: &Message) -> Self {
        Self {
            id: message.id.0,
            chat: message.chat.id.0,
        }
    }
}
