pub mod open_meteo;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::config::{FallbackReading, InfluenceRules, SignalConfig};
use crate::types::{round_to, WeatherSignal};

/// Raw current conditions. Fields the source did not report are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalReading {
    pub temperature_c: Option<f64>,
    pub wind_kph: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

/// Trait for external condition sources
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Source name, used in logs
    fn name(&self) -> &str;

    /// Fetch current conditions. Errors are recovered by the adapter.
    async fn fetch(&self) -> Result<SignalReading>;
}

/// Wraps a source with static fallbacks and derives the demand multiplier.
/// Never fails.
pub struct WeatherAdapter {
    source: Box<dyn SignalSource>,
    location: String,
    fallback: FallbackReading,
    rules: InfluenceRules,
}

impl WeatherAdapter {
    pub fn new(config: &SignalConfig, source: Box<dyn SignalSource>) -> Self {
        Self {
            source,
            location: config.location.clone(),
            fallback: config.fallback.clone(),
            rules: config.influence.clone(),
        }
    }

    /// Adapter backed by the Open-Meteo current-weather endpoint
    pub fn open_meteo(config: &SignalConfig) -> Result<Self> {
        let source = open_meteo::OpenMeteoSource::new(config)?;
        Ok(Self::new(config, Box::new(source)))
    }

    pub async fn fetch(&self) -> WeatherSignal {
        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(
                    source = self.source.name(),
                    error = %e,
                    "Weather fetch failed, using fallback values"
                );
                SignalReading::default()
            }
        };

        let temperature = reading.temperature_c.unwrap_or(self.fallback.temperature_c);
        let wind = reading.wind_kph.unwrap_or(self.fallback.wind_kph);
        let rain = reading.precipitation_mm.unwrap_or(self.fallback.precipitation_mm);
        let influence = influence_factor(&self.rules, temperature, wind, rain);

        tracing::debug!(temperature, wind, rain, influence, "Weather signal");

        WeatherSignal {
            location: self.location.clone(),
            temperature_c: round_to(temperature, 1),
            wind_kph: round_to(wind, 1),
            precipitation_mm: round_to(rain, 2),
            influence_factor: round_to(influence, 2),
            last_updated: Utc::now(),
        }
    }
}

/// Demand multiplier: 1.0 plus a bonus for every threshold crossed.
/// Bonuses are independent and stack.
pub fn influence_factor(rules: &InfluenceRules, temperature_c: f64, wind_kph: f64, precipitation_mm: f64) -> f64 {
    let mut influence = 1.0;
    if temperature_c > rules.hot_above_c {
        influence += rules.hot_bonus;
    }
    if temperature_c < rules.cold_below_c {
        influence += rules.cold_bonus;
    }
    if precipitation_mm > rules.rain_above_mm {
        influence += rules.rain_bonus;
    }
    if wind_kph > rules.wind_above_kph {
        influence += rules.wind_bonus;
    }
    influence
}

/// Source that always returns the same reading
pub struct StaticSource {
    reading: SignalReading,
}

impl StaticSource {
    pub fn new(temperature_c: f64, wind_kph: f64, precipitation_mm: f64) -> Self {
        Self {
            reading: SignalReading {
                temperature_c: Some(temperature_c),
                wind_kph: Some(wind_kph),
                precipitation_mm: Some(precipitation_mm),
            },
        }
    }
}

#[async_trait]
impl SignalSource for StaticSource {
    fn name(&self) -> &str { "static" }

    async fn fetch(&self) -> Result<SignalReading> {
        Ok(self.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    #[async_trait]
    impl SignalSource for FailingSource {
        fn name(&self) -> &str { "failing" }

        async fn fetch(&self) -> Result<SignalReading> {
            anyhow::bail!("connection refused")
        }
    }

    struct PartialSource;

    #[async_trait]
    impl SignalSource for PartialSource {
        fn name(&self) -> &str { "partial" }

        async fn fetch(&self) -> Result<SignalReading> {
            Ok(SignalReading { temperature_c: Some(3.04), ..Default::default() })
        }
    }

    fn rules() -> InfluenceRules {
        InfluenceRules::default()
    }

    #[test]
    fn mild_weather_has_no_influence() {
        assert_eq!(influence_factor(&rules(), 22.0, 8.0, 0.0), 1.0);
    }

    #[test]
    fn bonuses_stack() {
        let factor = influence_factor(&rules(), 35.0, 30.0, 3.0);
        assert!((factor - 1.23).abs() < 1e-9);
        let factor = influence_factor(&rules(), 2.0, 30.0, 3.0);
        assert!((factor - 1.25).abs() < 1e-9);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(influence_factor(&rules(), 30.0, 25.0, 2.0), 1.0);
        assert_eq!(influence_factor(&rules(), 8.0, 0.0, 0.0), 1.0);
    }

    #[test]
    fn monotone_past_thresholds() {
        let r = rules();
        let mut last = 0.0;
        for rain in [0.0, 1.0, 2.0, 2.5, 10.0] {
            let f = influence_factor(&r, 22.0, 8.0, rain);
            assert!(f >= last);
            last = f;
        }
        let mut last = 0.0;
        for wind in [0.0, 20.0, 25.0, 26.0, 90.0] {
            let f = influence_factor(&r, 22.0, wind, 0.0);
            assert!(f >= last);
            last = f;
        }
        let mut last = 0.0;
        for temp in [20.0, 30.0, 31.0, 45.0] {
            let f = influence_factor(&r, temp, 8.0, 0.0);
            assert!(f >= last);
            last = f;
        }
        let mut last = 0.0;
        for temp in [20.0, 8.0, 7.9, -20.0] {
            let f = influence_factor(&r, temp, 8.0, 0.0);
            assert!(f >= last);
            last = f;
        }
    }

    #[tokio::test]
    async fn failing_source_falls_back() {
        let adapter = WeatherAdapter::new(&SignalConfig::default(), Box::new(FailingSource));
        let signal = adapter.fetch().await;
        assert_eq!(signal.temperature_c, 22.0);
        assert_eq!(signal.wind_kph, 8.0);
        assert_eq!(signal.precipitation_mm, 0.0);
        assert_eq!(signal.influence_factor, 1.0);
        assert_eq!(signal.location, "New York");
    }

    #[tokio::test]
    async fn missing_fields_fall_back_individually() {
        let adapter = WeatherAdapter::new(&SignalConfig::default(), Box::new(PartialSource));
        let signal = adapter.fetch().await;
        assert_eq!(signal.temperature_c, 3.0);
        assert_eq!(signal.wind_kph, 8.0);
        assert_eq!(signal.influence_factor, 1.12);
    }

    #[tokio::test]
    async fn static_source_drives_influence() {
        let adapter = WeatherAdapter::new(&SignalConfig::default(), Box::new(StaticSource::new(35.0, 30.0, 3.0)));
        let signal = adapter.fetch().await;
        assert_eq!(signal.influence_factor, 1.23);
        assert!(signal.influence_factor >= 1.0);
    }
}
