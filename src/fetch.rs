use crate::settings::Settings;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::debug;
use reqwest::Client;
use std::error::Error;
use std::num::NonZeroU32;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// A fetched document.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    /// Final URL after any HTTP-level redirects.
    pub url: String,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP session shared by every request of one crawl.
pub struct Fetcher {
    client: Client,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .gzip(true)
            .cookie_store(true)
            .build()?;
        let limiter = NonZeroU32::new(settings.requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self { client, limiter })
    }

    pub async fn get(&self, url: &str) -> Result<Page> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;

        Ok(Page { status, url, body })
    }
}
