use async_trait::async_trait;
use log::debug;

use crate::{weather::WeatherRecord, Result};

/// Delivers a record to the storage API and reports the HTTP status.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, record: &WeatherRecord) -> Result<u16>;
}

pub struct HttpForwarder {
    url: String,
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            client: reqwest::Client::builder().build()?,
        })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, record: &WeatherRecord) -> Result<u16> {
        // `json` sets `Content-Type: application/json`.
        let response = self.client.post(&self.url).json(record).send().await?;
        let status = response.status().as_u16();
        debug!("POST {} -> {status}", self.url);
        Ok(status)
    }
}
