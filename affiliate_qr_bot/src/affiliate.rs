use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::Platform;

pub const DEFAULT_API_URL: &str = "https://api.accesstrade.vn/v1/";

#[derive(Debug, thiserror::Error)]
pub enum AffiliateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("API answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("API response is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("API reported failure: {0}")]
    Rejected(String),
    #[error("no approved campaign for {0}")]
    NoCampaign(Platform),
}

/// A campaign ID, which the API hands out either as a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CampaignId {
    Text(String),
    Number(u64),
}

impl From<CampaignId> for String {
    fn from(value: CampaignId) -> Self {
        match value {
            CampaignId::Text(s) => s,
            CampaignId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Campaign {
    id: CampaignId,
    merchant: String,
}

#[derive(Debug, Deserialize)]
struct CampaignList {
    data: Vec<Campaign>,
}

#[derive(Debug, Serialize)]
struct CreateLinkRequest<'a> {
    campaign_id: &'a str,
    urls: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CreateLinkResponse {
    #[serde(default)]
    success: bool,
    data: Option<CreateLinkData>,
}

#[derive(Debug, Deserialize)]
struct CreateLinkData {
    #[serde(default)]
    success_link: Vec<SuccessLink>,
}

#[derive(Debug, Deserialize)]
struct SuccessLink {
    short_link: String,
}

/// Pick the campaign for the platform out of the list of approved ones.
fn select_campaign(campaigns: Vec<Campaign>, platform: Platform) -> Option<String> {
    let aliases = platform.merchant_aliases();
    campaigns
        .into_iter()
        .find(|c| aliases.contains(&c.merchant.as_str()))
        .map(|c| c.id.into())
}

/// Client for the AccessTrade affiliate API.
///
/// Campaign IDs are looked up once per platform and kept for the lifetime of the process.
pub struct AffiliateClient {
    instance_id: String,
    client: Client,
    lookup_client: Client,
    base: Url,
    token: String,
    campaigns: Mutex<HashMap<Platform, String>>,
}

impl AffiliateClient {
    /// `base` is the API root, like `https://api.accesstrade.vn/v1/`.
    /// `instance_id` tags this client's log lines.
    pub fn new(
        instance_id: String,
        base: Url,
        token: String,
        verify_tls: bool,
    ) -> Result<Self, AffiliateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;
        let lookup_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        Ok(Self {
            instance_id,
            client,
            lookup_client,
            base,
            token,
            campaigns: Mutex::new(HashMap::new()),
        })
    }

    fn auth(&self) -> String {
        format!("Token {}", self.token)
    }

    fn cached_campaign_id(&self, platform: Platform) -> Option<String> {
        self.campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&platform)
            .cloned()
    }

    /// Get the campaign ID for the platform, from cache or from the API.
    ///
    /// Failures are not cached; the next call asks the API again.
    pub async fn campaign_id(&self, platform: Platform) -> Result<String, AffiliateError> {
        if let Some(id) = self.cached_campaign_id(platform) {
            log::debug!("[{}] Using cached {platform} campaign ID {id}", self.instance_id);
            return Ok(id);
        }

        let mut url = self.base.join("campaigns")?;
        url.query_pairs_mut().append_pair("approval", "successful");

        let response = self
            .lookup_client
            .get(url)
            .header(AUTHORIZATION, self.auth())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(AffiliateError::Status { status, body });
        }

        let list: CampaignList = serde_json::from_str(&body)?;
        log::debug!(
            "[{}] Approved campaigns: {:?}",
            self.instance_id,
            list.data.iter().map(|c| &c.merchant).collect::<Vec<_>>()
        );

        let id = select_campaign(list.data, platform).ok_or(AffiliateError::NoCampaign(platform))?;

        log::info!("[{}] Found {platform} campaign ID {id}", self.instance_id);
        self.campaigns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(platform, id.clone());

        Ok(id)
    }

    /// Mint an affiliate short link for the URL under the given campaign.
    pub async fn create_link(&self, url: &str, campaign_id: &str) -> Result<String, AffiliateError> {
        let endpoint = self.base.join("product_link/create")?;

        let response = self
            .client
            .post(endpoint)
            .header(AUTHORIZATION, self.auth())
            .json(&CreateLinkRequest {
                campaign_id,
                urls: [url],
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        log::debug!("[{}] Link creation answered {status}: {body}", self.instance_id);

        if status != StatusCode::OK {
            return Err(AffiliateError::Status { status, body });
        }

        let parsed: CreateLinkResponse = serde_json::from_str(&body)?;
        if !parsed.success {
            return Err(AffiliateError::Rejected(body));
        }

        parsed
            .data
            .and_then(|d| d.success_link.into_iter().next())
            .map(|l| l.short_link)
            .ok_or(AffiliateError::Rejected(body))
    }

    /// Try to make an affiliate short link for the URL.
    ///
    /// Any failure is logged and yields [`None`]; the caller is expected to fall back to the
    /// original link.
    pub async fn shorten(&self, url: &str, platform: Platform) -> Option<String> {
        log::info!("[{}] Shortening {platform} link {url}", self.instance_id);

        let result = match self.campaign_id(platform).await {
            Ok(campaign_id) => self.create_link(url, &campaign_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(short_link) => {
                log::info!("[{}] Shortened {url} to {short_link}", self.instance_id);
                Some(short_link)
            }
            Err(e) => {
                log::error!("[{}] Failed to shorten {platform} link {url}: {e}", self.instance_id);
                None
            }
        }
    }
}
