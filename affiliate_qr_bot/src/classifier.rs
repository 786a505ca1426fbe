use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::types::{MarketplaceLink, Platform};

static SHOPEE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?i:shopee\.vn|shp\.ee|vn\.shp\.ee|s\.shopee\.vn)/\S+")
        .expect("Regex will always be valid")
});
static LAZADA_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?i:lazada\.vn|www\.lazada\.vn|lzd\.co|m\.lazada\.vn|s\.lazada\.vn)/\S+")
        .expect("Regex will always be valid")
});

/// What to do with a piece of inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Make an affiliate link out of it.
    Affiliate(MarketplaceLink),
    /// Just make a QR code of this content.
    Content(String),
}

/// Find the first marketplace link in the text.
///
/// Shopee links take priority over Lazada ones, no matter where in the text they are.
/// Any further links are ignored.
pub fn find_marketplace_link(text: &str) -> Option<MarketplaceLink> {
    [
        (Platform::Shopee, &*SHOPEE_LINK),
        (Platform::Lazada, &*LAZADA_LINK),
    ]
    .into_iter()
    .find_map(|(platform, regex)| {
        regex
            .find(text)
            .map(|m| MarketplaceLink::new(platform, m.as_str().to_string()))
    })
}

/// Classify a whole message.
pub fn classify(text: &str) -> Request {
    match find_marketplace_link(text) {
        Some(link) => Request::Affiliate(link),
        None => Request::Content(text.to_string()),
    }
}

/// Classify a link given explicitly as a command argument.
///
/// Unlike [`classify`], this tolerates links without a scheme, like `shopee.vn/abc`,
/// and bare marketplace hosts, like `https://shopee.vn`.
pub fn classify_argument(argument: &str) -> Request {
    let argument = argument.trim();

    if let Some(link) = find_marketplace_link(argument) {
        return Request::Affiliate(link);
    }

    let with_scheme = if argument.contains("://") {
        argument.to_string()
    } else {
        format!("https://{argument}")
    };

    if let Some(link) = find_marketplace_link(&with_scheme) {
        return Request::Affiliate(link);
    }

    if let Some(platform) = marketplace_of_host(&with_scheme) {
        return Request::Affiliate(MarketplaceLink::new(platform, with_scheme));
    }

    Request::Content(argument.to_string())
}

/// Which marketplace, if any, the whole link points at, judging by its host alone.
fn marketplace_of_host(link: &str) -> Option<Platform> {
    let url = Url::parse(link).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;

    [Platform::Shopee, Platform::Lazada]
        .into_iter()
        .find(|p| p.owns_host(host) || p.host_needs_expansion(host))
}
