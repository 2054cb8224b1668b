use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::simulator::{TX_SEQ_MAX, TX_SEQ_MIN};

/// Top-level configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub reorder: ReorderConfig,
    #[serde(default = "default_catalog")]
    pub catalog: Vec<ProductConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_project_title")]
    pub project_title: String,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Fixed RNG seed. Unset means seed from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            project_title: default_project_title(),
            bind: default_bind(),
            log_level: default_log_level(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    #[serde(default = "default_seed_count")]
    pub seed_count: usize,
    #[serde(default = "default_seed_min")]
    pub seed_min: u32,
    #[serde(default = "default_seed_max")]
    pub seed_max: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 80,
            seed_count: 40,
            seed_min: 6,
            seed_max: 28,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnomalyConfig {
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Quantities must be strictly greater than this to be flagged
    #[serde(default = "default_min_quantity")]
    pub min_quantity: u32,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_history: 5,
            min_quantity: 50,
            min_score: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    #[serde(default = "default_surge_probability")]
    pub surge_probability: f64,
    #[serde(default = "default_surge_min")]
    pub surge_min: u32,
    #[serde(default = "default_surge_max")]
    pub surge_max: u32,
    #[serde(default = "default_normal_min")]
    pub normal_min: u32,
    #[serde(default = "default_normal_max")]
    pub normal_max: u32,
    #[serde(default = "default_batch_min")]
    pub batch_min: u32,
    #[serde(default = "default_batch_max")]
    pub batch_max: u32,
    #[serde(default = "default_transaction_feed")]
    pub transaction_feed_capacity: usize,
    #[serde(default = "default_anomaly_feed")]
    pub anomaly_feed_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            surge_probability: 0.18,
            surge_min: 51,
            surge_max: 95,
            normal_min: 3,
            normal_max: 36,
            batch_min: 1,
            batch_max: 3,
            transaction_feed_capacity: 24,
            anomaly_feed_capacity: 12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignalConfig {
    #[serde(default = "default_signal_url")]
    pub url: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub fallback: FallbackReading,
    #[serde(default)]
    pub influence: InfluenceRules,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            url: default_signal_url(),
            location: default_location(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            timeout_secs: default_timeout(),
            fallback: FallbackReading::default(),
            influence: InfluenceRules::default(),
        }
    }
}

/// Values used when the weather endpoint is unreachable or incomplete
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackReading {
    #[serde(default = "default_fallback_temp")]
    pub temperature_c: f64,
    #[serde(default = "default_fallback_wind")]
    pub wind_kph: f64,
    #[serde(default)]
    pub precipitation_mm: f64,
}

impl Default for FallbackReading {
    fn default() -> Self {
        Self { temperature_c: 22.0, wind_kph: 8.0, precipitation_mm: 0.0 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluenceRules {
    #[serde(default = "default_hot_above")]
    pub hot_above_c: f64,
    #[serde(default = "default_hot_bonus")]
    pub hot_bonus: f64,
    #[serde(default = "default_cold_below")]
    pub cold_below_c: f64,
    #[serde(default = "default_cold_bonus")]
    pub cold_bonus: f64,
    #[serde(default = "default_rain_above")]
    pub rain_above_mm: f64,
    #[serde(default = "default_rain_bonus")]
    pub rain_bonus: f64,
    #[serde(default = "default_wind_above")]
    pub wind_above_kph: f64,
    #[serde(default = "default_wind_bonus")]
    pub wind_bonus: f64,
}

impl Default for InfluenceRules {
    fn default() -> Self {
        Self {
            hot_above_c: 30.0,
            hot_bonus: 0.10,
            cold_below_c: 8.0,
            cold_bonus: 0.12,
            rain_above_mm: 2.0,
            rain_bonus: 0.08,
            wind_above_kph: 25.0,
            wind_bonus: 0.05,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_history_days")]
    pub history_days: usize,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,
    #[serde(default = "default_display_days")]
    pub display_days: usize,
    #[serde(default = "default_trend_base")]
    pub trend_base: f64,
    #[serde(default = "default_trend_rise")]
    pub trend_rise: f64,
    #[serde(default = "default_season_amplitude")]
    pub season_amplitude: f64,
    /// Phase reached by the seasonal term at the end of the window, in radians
    #[serde(default = "default_season_phase")]
    pub season_phase: f64,
    #[serde(default = "default_noise")]
    pub noise: f64,
    #[serde(default = "default_history_floor")]
    pub history_floor: u32,
    #[serde(default = "default_forecast_floor")]
    pub forecast_floor: u32,
    /// Projection used when there is no history at all
    #[serde(default = "default_empty_projection")]
    pub empty_projection: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_days: 28,
            horizon_days: 7,
            display_days: 14,
            trend_base: 160.0,
            trend_rise: 85.0,
            season_amplitude: 10.0,
            season_phase: 4.2,
            noise: 8.0,
            history_floor: 90,
            forecast_floor: 50,
            empty_projection: 120.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReorderConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    #[serde(default = "default_anomaly_window")]
    pub anomaly_window: usize,
    #[serde(default = "default_anomaly_boost")]
    pub anomaly_boost: u32,
    #[serde(default = "default_critical_coverage")]
    pub critical_coverage_days: f64,
    #[serde(default = "default_low_coverage")]
    pub low_coverage_days: f64,
    #[serde(default = "default_critical_ratio")]
    pub critical_reorder_ratio: f64,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            safety_factor: 1.25,
            anomaly_window: 6,
            anomaly_boost: 35,
            critical_coverage_days: 3.0,
            low_coverage_days: 6.0,
            critical_reorder_ratio: 0.65,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    pub id: u32,
    pub name: String,
    pub stock: u32,
    pub reorder_point: u32,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(&content)
    }

    /// Load `path` if it exists. A missing file is only an error when the
    /// caller asked for it explicitly.
    pub fn load_or_default(path: &str, explicit: bool) -> Result<Self> {
        if !explicit && !Path::new(path).exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| "Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.is_empty() {
            bail!("catalog must contain at least one product");
        }

        let mut ids = HashSet::new();
        for product in &self.catalog {
            if !ids.insert(product.id) {
                bail!("duplicate product id {} in catalog", product.id);
            }
            if product.reorder_point == 0 {
                bail!("product {} has a zero reorder_point", product.id);
            }
        }

        let sim = &self.simulator;
        if !(0.0..=1.0).contains(&sim.surge_probability) {
            bail!("simulator.surge_probability must be within [0, 1]");
        }
        check_range("simulator.surge", sim.surge_min, sim.surge_max)?;
        check_range("simulator.normal", sim.normal_min, sim.normal_max)?;
        check_range("simulator.batch", sim.batch_min, sim.batch_max)?;
        if sim.normal_min == 0 || sim.surge_min == 0 {
            bail!("simulated quantities must be positive");
        }
        if sim.transaction_feed_capacity == 0 || sim.anomaly_feed_capacity == 0 {
            bail!("feed capacities must be positive");
        }
        let id_space = (TX_SEQ_MAX - TX_SEQ_MIN + 1) as usize;
        if sim.transaction_feed_capacity >= id_space || sim.anomaly_feed_capacity >= id_space {
            bail!("feed capacities must stay below {} transactions", id_space);
        }

        let history = &self.history;
        if history.capacity == 0 {
            bail!("history.capacity must be positive");
        }
        check_range("history.seed", history.seed_min, history.seed_max)?;

        let forecast = &self.forecast;
        if forecast.horizon_days == 0 || forecast.history_days == 0 {
            bail!("forecast windows must be positive");
        }
        if self.reorder.horizon_days == 0 {
            bail!("reorder.horizon_days must be positive");
        }

        Ok(())
    }
}

fn check_range(name: &str, min: u32, max: u32) -> Result<()> {
    if min > max {
        bail!("{}_min ({}) exceeds {}_max ({})", name, min, name, max);
    }
    Ok(())
}

/// Expand ${ENV_VAR} references in config string
fn expand_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string())
}

fn default_catalog() -> Vec<ProductConfig> {
    [
        (1, "Wireless Earbuds", 220, 140),
        (2, "Smart Watches", 160, 110),
        (3, "Gaming Mice", 300, 180),
        (4, "Portable SSDs", 140, 100),
        (5, "Bluetooth Speakers", 190, 130),
    ]
    .into_iter()
    .map(|(id, name, stock, reorder_point)| ProductConfig {
        id,
        name: name.to_string(),
        stock,
        reorder_point,
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            history: HistoryConfig::default(),
            anomaly: AnomalyConfig::default(),
            simulator: SimulatorConfig::default(),
            signal: SignalConfig::default(),
            forecast: ForecastConfig::default(),
            reorder: ReorderConfig::default(),
            catalog: default_catalog(),
        }
    }
}

// Default value functions
fn default_project_title() -> String { "Retail Fusion".to_string() }
fn default_bind() -> String { "127.0.0.1:8080".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_history_capacity() -> usize { 80 }
fn default_seed_count() -> usize { 40 }
fn default_seed_min() -> u32 { 6 }
fn default_seed_max() -> u32 { 28 }
fn default_min_history() -> usize { 5 }
fn default_min_quantity() -> u32 { 50 }
fn default_min_score() -> f64 { 1.0 }
fn default_surge_probability() -> f64 { 0.18 }
fn default_surge_min() -> u32 { 51 }
fn default_surge_max() -> u32 { 95 }
fn default_normal_min() -> u32 { 3 }
fn default_normal_max() -> u32 { 36 }
fn default_batch_min() -> u32 { 1 }
fn default_batch_max() -> u32 { 3 }
fn default_transaction_feed() -> usize { 24 }
fn default_anomaly_feed() -> usize { 12 }
fn default_signal_url() -> String { "https://api.open-meteo.com/v1/forecast".to_string() }
fn default_location() -> String { "New York".to_string() }
fn default_latitude() -> f64 { 40.7128 }
fn default_longitude() -> f64 { -74.0060 }
fn default_timeout() -> u64 { 5 }
fn default_fallback_temp() -> f64 { 22.0 }
fn default_fallback_wind() -> f64 { 8.0 }
fn default_hot_above() -> f64 { 30.0 }
fn default_hot_bonus() -> f64 { 0.10 }
fn default_cold_below() -> f64 { 8.0 }
fn default_cold_bonus() -> f64 { 0.12 }
fn default_rain_above() -> f64 { 2.0 }
fn default_rain_bonus() -> f64 { 0.08 }
fn default_wind_above() -> f64 { 25.0 }
fn default_wind_bonus() -> f64 { 0.05 }
fn default_history_days() -> usize { 28 }
fn default_horizon_days() -> usize { 7 }
fn default_display_days() -> usize { 14 }
fn default_trend_base() -> f64 { 160.0 }
fn default_trend_rise() -> f64 { 85.0 }
fn default_season_amplitude() -> f64 { 10.0 }
fn default_season_phase() -> f64 { 4.2 }
fn default_noise() -> f64 { 8.0 }
fn default_history_floor() -> u32 { 90 }
fn default_forecast_floor() -> u32 { 50 }
fn default_empty_projection() -> f64 { 120.0 }
fn default_safety_factor() -> f64 { 1.25 }
fn default_anomaly_window() -> usize { 6 }
fn default_anomaly_boost() -> u32 { 35 }
fn default_critical_coverage() -> f64 { 3.0 }
fn default_low_coverage() -> f64 { 6.0 }
fn default_critical_ratio() -> f64 { 0.65 }
