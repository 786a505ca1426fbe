use url::Url;

use crate::affiliate::DEFAULT_API_URL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required! Please set it in the .env file or environment variables.")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {source}")]
    BadUrl {
        name: &'static str,
        source: url::ParseError,
    },
    #[error("{name} should be \"true\" or \"false\", got \"{value}\"")]
    BadFlag { name: &'static str, value: String },
}

/// Everything the bot needs to know from its environment.
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub affiliate_token: String,
    /// Tag that tells running instances of the bot apart in replies and logs.
    pub instance_id: String,
    /// Whether to verify TLS certificates of the affiliate API.
    pub verify_tls: bool,
    pub affiliate_api_url: Url,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"[REDACTED]")
            .field("affiliate_token", &"[REDACTED]")
            .field("instance_id", &self.instance_id)
            .field("verify_tls", &self.verify_tls)
            .field("affiliate_api_url", &self.affiliate_api_url.as_str())
            .finish()
    }
}

fn random_instance_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

impl Config {
    /// Read the configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` beforehand to also pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration with a custom variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let affiliate_token = require("ACCESSTRADE_TOKEN")?;
        let instance_id = get("BOT_INSTANCE_ID").unwrap_or_else(random_instance_id);

        let verify_tls = match get("SSL_VERIFY") {
            None => true,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::BadFlag {
                        name: "SSL_VERIFY",
                        value,
                    })
                }
            },
        };

        let mut api_url = get("ACCESSTRADE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        // Endpoints are joined onto this, which drops the last path segment without a slash.
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let affiliate_api_url = Url::parse(&api_url).map_err(|source| ConfigError::BadUrl {
            name: "ACCESSTRADE_API_URL",
            source,
        })?;

        Ok(Self {
            bot_token,
            affiliate_token,
            instance_id,
            verify_tls,
            affiliate_api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn minimal_config() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ACCESSTRADE_TOKEN", "xyz"),
        ])
        .unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.affiliate_token, "xyz");
        assert_eq!(config.instance_id.len(), 8);
        assert!(config.instance_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(config.verify_tls);
        assert_eq!(config.affiliate_api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn missing_tokens_are_fatal() {
        assert!(matches!(
            config_from(&[("ACCESSTRADE_TOKEN", "xyz")]),
            Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
        ));
        assert!(matches!(
            config_from(&[("TELEGRAM_BOT_TOKEN", "123:abc"), ("ACCESSTRADE_TOKEN", "  ")]),
            Err(ConfigError::Missing("ACCESSTRADE_TOKEN"))
        ));
    }

    #[test]
    fn optional_values() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("ACCESSTRADE_TOKEN", "xyz"),
            ("BOT_INSTANCE_ID", "prod-1"),
            ("SSL_VERIFY", "False"),
            ("ACCESSTRADE_API_URL", "http://localhost:8080/v1"),
        ])
        .unwrap();

        assert_eq!(config.instance_id, "prod-1");
        assert!(!config.verify_tls);
        assert_eq!(
            config.affiliate_api_url.as_str(),
            "http://localhost:8080/v1/"
        );

        assert!(matches!(
            config_from(&[
                ("TELEGRAM_BOT_TOKEN", "123:abc"),
                ("ACCESSTRADE_TOKEN", "xyz"),
                ("SSL_VERIFY", "maybe"),
            ]),
            Err(ConfigError::BadFlag { .. })
        ));
    }

    #[test]
    fn debug_redacts_tokens() {
        let config = config_from(&[
            ("TELEGRAM_BOT_TOKEN", "123:supersecret"),
            ("ACCESSTRADE_TOKEN", "alsosecret"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(!debug.contains("alsosecret"));
    }
}
