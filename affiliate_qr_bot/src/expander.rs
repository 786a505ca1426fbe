use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder, Error};
use url::Url;

use crate::types::Platform;

/// Shortener hosts serve different redirects to desktop browsers, so pretend to be a phone.
const MOBILE_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 ",
    "(KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1"
);

const MAX_REDIRECTS: usize = 15;

/// Unshortens marketplace short links by following their redirects.
#[derive(Clone, Debug)]
pub struct Expander {
    instance_id: String,
    client: Client,
}

impl Expander {
    /// HTTP client settings used for following short links.
    pub fn client_builder() -> ClientBuilder {
        Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(8))
            // Short link hosts have been seen serving broken certificate chains.
            .danger_accept_invalid_certs(true)
    }

    /// `instance_id` tags this expander's log lines.
    pub fn new(instance_id: String) -> Result<Self, Error> {
        Ok(Self::with_client(instance_id, Self::client_builder().build()?))
    }

    /// Use a client built elsewhere, normally from [`Expander::client_builder`].
    pub fn with_client(instance_id: String, client: Client) -> Self {
        Self {
            instance_id,
            client,
        }
    }

    /// Follow redirects and return wherever they lead.
    pub async fn follow_redirects(&self, url: &str) -> Result<Url, Error> {
        let response = self.client.get(url).send().await?;
        Ok(response.url().clone())
    }

    /// Expand a short link into a full link on the platform's own domain.
    ///
    /// Returns [`None`] if the request failed, timed out, or ended up anywhere other than the
    /// platform.
    pub async fn expand(&self, url: &str, platform: Platform) -> Option<Url> {
        let id = &self.instance_id;
        log::info!("[{id}] Expanding {url}");

        let final_url = match self.follow_redirects(url).await {
            Ok(final_url) => final_url,
            Err(e) if e.is_timeout() => {
                log::warn!("[{id}] Timed out expanding {url}");
                return None;
            }
            Err(e) => {
                log::error!("[{id}] Failed to expand {url}: {e}");
                return None;
            }
        };

        if final_url.host_str().is_some_and(|h| platform.owns_host(h)) {
            log::info!("[{id}] Expanded {url} to {final_url}");
            Some(final_url)
        } else {
            log::warn!("[{id}] {url} led to {final_url}, which is not on {platform}");
            None
        }
    }
}
