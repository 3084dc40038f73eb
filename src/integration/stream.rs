use std::env;

use log::warn;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

#[derive(Clone)]
pub struct Config {
    api_key: String,
    api_secret: String,
    base_url: Url,
}

impl Config {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url,
        }
    }

    pub fn env() -> Option<Self> {
        let api_key = env::var("STREAM_API_KEY").ok();
        let api_secret = env::var("STREAM_API_SECRET").ok();
        let base_url = env::var("STREAM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let base_url = match Url::parse(&base_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid STREAM_BASE_URL '{base_url}': {e}");
                return None;
            }
        };

        if let (Some(api_key), Some(api_secret)) = (api_key, api_secret) {
            Some(Self::new(api_key, api_secret, base_url))
        } else {
            warn!("Stream Chat env is not configured");
            None
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
