use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SignalConfig;
use super::{SignalReading, SignalSource};

const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m,precipitation";

/// Open-Meteo current conditions for a fixed location
pub struct OpenMeteoSource {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    precipitation: Option<f64>,
}

impl OpenMeteoSource {
    pub fn new(config: &SignalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            url: request_url(config),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn request_url(config: &SignalConfig) -> String {
    format!(
        "{}?latitude={}&longitude={}&current={}",
        config.url, config.latitude, config.longitude, CURRENT_FIELDS
    )
}

/// Parse a forecast response body. A body without a `current` object yields
/// an empty reading.
pub fn parse_current(body: &str) -> Result<SignalReading> {
    let response: ForecastResponse =
        serde_json::from_str(body).context("Malformed weather response")?;

    Ok(match response.current {
        Some(current) => SignalReading {
            temperature_c: current.temperature_2m,
            wind_kph: current.wind_speed_10m,
            precipitation_mm: current.precipitation,
        },
        None => SignalReading::default(),
    })
}

#[async_trait]
impl SignalSource for OpenMeteoSource {
    fn name(&self) -> &str { "open-meteo" }

    async fn fetch(&self) -> Result<SignalReading> {
        let body = self.client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_current(&body)
    }
}
