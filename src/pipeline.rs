use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::analyzer::{DemandForecaster, ReorderPlanner, ZScoreDetector};
use crate::config::Config;
use crate::signal::WeatherAdapter;
use crate::simulator::{MarketState, Simulator};
use crate::types::{ForecastSeries, Recommendation, Transaction, WeatherSignal};

const DASHBOARD_TRANSACTIONS: usize = 12;
const DASHBOARD_ANOMALIES: usize = 8;

/// Everything a dashboard refresh mutates, plus the random source
pub struct Context {
    pub state: MarketState,
    simulator: Simulator,
    forecaster: DemandForecaster,
    planner: ReorderPlanner,
    rng: StdRng,
}

impl Context {
    /// Build and seed the context. A configured seed makes every stage
    /// reproducible.
    pub fn new(config: &Config) -> Self {
        let mut rng = match config.service.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = MarketState::new(config, &mut rng);
        let detector = ZScoreDetector::new(&config.anomaly);

        Self {
            state,
            simulator: Simulator::new(&config.simulator, detector),
            forecaster: DemandForecaster::new(&config.forecast),
            planner: ReorderPlanner::new(&config.reorder),
            rng,
        }
    }

    pub fn simulate_batch(&mut self) -> Vec<Transaction> {
        self.simulator.simulate_batch(&mut self.state, &mut self.rng)
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Forecast demand under `influence` and plan reorders against it
    pub fn plan(&mut self, influence: f64, now: DateTime<Utc>) -> (ForecastSeries, Vec<Recommendation>) {
        let forecast = self.forecaster.forecast(influence, now.date_naive(), &mut self.rng);
        let recommendations = self.planner.recommend(
            &forecast.forecast,
            self.state.ledger.products(),
            &self.state.anomalies,
        );
        (forecast, recommendations)
    }

    /// Anomalies recorded on the same UTC day as `now`
    pub fn anomalies_on(&self, now: DateTime<Utc>) -> usize {
        let today = now.date_naive();
        self.state
            .anomalies
            .iter()
            .filter(|tx| tx.timestamp.date_naive() == today)
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_stock: u64,
    pub active_anomalies: usize,
    pub forecast_7_day: u32,
    pub weather_impact_pct: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub project_title: String,
    pub metrics: DashboardMetrics,
    pub weather: WeatherSignal,
    pub transactions: Vec<Transaction>,
    pub anomalies: Vec<Transaction>,
    pub forecast: ForecastSeries,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub project: String,
}

/// Signed percentage the weather moves demand by, truncated toward zero
fn impact_pct(factor: f64) -> i64 {
    ((factor - 1.0) * 100.0).trunc() as i64
}

/// Shared pipeline entry point for the HTTP shell
pub struct Engine {
    project_title: String,
    context: Mutex<Context>,
    weather: WeatherAdapter,
}

impl Engine {
    pub fn new(config: &Config) -> Result<Self> {
        let weather = WeatherAdapter::open_meteo(&config.signal)?;
        Ok(Self::with_weather(config, weather))
    }

    pub fn with_weather(config: &Config, weather: WeatherAdapter) -> Self {
        Self {
            project_title: config.service.project_title.clone(),
            context: Mutex::new(Context::new(config)),
            weather,
        }
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok",
            project: self.project_title.clone(),
        }
    }

    /// Run the full pipeline: simulate, fetch weather, forecast, recommend.
    pub async fn dashboard(&self) -> Dashboard {
        let simulated = {
            let mut ctx = self.context.lock().await;
            ctx.simulate_batch()
        };

        // Lock is released while the external fetch is in flight
        let weather = self.weather.fetch().await;
        let now = Utc::now();

        let mut ctx = self.context.lock().await;
        let (forecast, recommendations) = ctx.plan(weather.influence_factor, now);

        let metrics = DashboardMetrics {
            total_stock: ctx.state.ledger.total_stock(),
            active_anomalies: ctx.anomalies_on(now),
            forecast_7_day: forecast.forecast_total(),
            weather_impact_pct: impact_pct(weather.influence_factor),
        };

        tracing::debug!(
            simulated = simulated.len(),
            total_stock = metrics.total_stock,
            active_anomalies = metrics.active_anomalies,
            forecast_7_day = metrics.forecast_7_day,
            "Dashboard refreshed"
        );

        Dashboard {
            project_title: self.project_title.clone(),
            metrics,
            weather,
            transactions: ctx.state.transactions.snapshot(DASHBOARD_TRANSACTIONS),
            anomalies: ctx.state.anomalies.snapshot(DASHBOARD_ANOMALIES),
            forecast,
            recommendations,
        }
    }

    /// Direct access to the shared context
    pub async fn with_context<T>(&self, f: impl FnOnce(&mut Context) -> T) -> T {
        let mut ctx = self.context.lock().await;
        f(&mut ctx)
    }
}
