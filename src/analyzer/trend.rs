use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::config::ForecastConfig;
use crate::types::{DemandPoint, ForecastSeries};

const DAY_LABEL: &str = "%m-%d";

/// Ordinary least squares fit with one predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit `ys` against `xs`. Returns None for an empty series. When the
    /// x-values have no spread the slope is zero and the line sits at the
    /// mean of `ys`.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n == 0 {
            return None;
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let n = n as f64;

        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();

        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        let intercept = mean_y - slope * mean_x;

        Some(Self { slope, intercept })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One day of synthetic sales history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub index: usize,
    pub demand: u32,
}

/// Demand forecasting from a synthetic sales history using linear regression.
#[derive(Debug, Clone)]
pub struct DemandForecaster {
    config: ForecastConfig,
}

impl DemandForecaster {
    pub fn new(config: &ForecastConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Rising trend plus a partial seasonal cycle plus uniform noise,
    /// ending on `today`.
    pub fn build_history<R: Rng + ?Sized>(&self, today: NaiveDate, rng: &mut R) -> Vec<HistoryDay> {
        let cfg = &self.config;
        let days = cfg.history_days;
        let span = days.saturating_sub(1).max(1) as f64;
        let start = today - Duration::days(days as i64 - 1);

        (0..days)
            .map(|index| {
                let progress = index as f64 / span;
                let trend = cfg.trend_base + cfg.trend_rise * progress;
                let seasonality = cfg.season_amplitude * (progress * cfg.season_phase).sin();
                let noise = if cfg.noise > 0.0 {
                    rng.gen_range(-cfg.noise..=cfg.noise)
                } else {
                    0.0
                };
                let demand = (trend + seasonality + noise).round().max(cfg.history_floor as f64);
                HistoryDay {
                    date: start + Duration::days(index as i64),
                    index,
                    demand: demand as u32,
                }
            })
            .collect()
    }

    /// Project `horizon_days` points past a history, scaled by `influence`
    /// and floored.
    pub fn project(&self, history: &[HistoryDay], influence: f64) -> Vec<u32> {
        let xs: Vec<f64> = history.iter().map(|d| d.index as f64).collect();
        let ys: Vec<f64> = history.iter().map(|d| d.demand as f64).collect();
        let next = history.last().map_or(0, |d| d.index + 1);
        self.project_series(&xs, &ys, next, influence)
    }

    fn project_series(&self, xs: &[f64], ys: &[f64], first_future: usize, influence: f64) -> Vec<u32> {
        let fit = LinearFit::fit(xs, ys);
        let floor = self.config.forecast_floor as f64;

        (first_future..first_future + self.config.horizon_days)
            .map(|x| {
                let raw = match fit {
                    Some(f) => f.predict(x as f64),
                    None => self.config.empty_projection,
                };
                (raw * influence).round().max(floor) as u32
            })
            .collect()
    }

    pub fn forecast<R: Rng + ?Sized>(&self, influence: f64, today: NaiveDate, rng: &mut R) -> ForecastSeries {
        let history = self.build_history(today, rng);
        let projected = self.project(&history, influence);

        let skip = history.len().saturating_sub(self.config.display_days);
        let historical = history[skip..]
            .iter()
            .map(|d| DemandPoint {
                day: d.date.format(DAY_LABEL).to_string(),
                demand: d.demand,
            })
            .collect();

        let forecast = projected
            .into_iter()
            .enumerate()
            .map(|(i, demand)| DemandPoint {
                day: (today + Duration::days(i as i64 + 1)).format(DAY_LABEL).to_string(),
                demand,
            })
            .collect();

        ForecastSeries { historical, forecast }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn fit_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [3.0, 5.0, 7.0, 9.0];
        let fit = LinearFit::fit(&xs, &ys).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn identical_x_values_fall_back_to_mean() {
        let xs = [4.0; 6];
        let ys = [100.0, 110.0, 90.0, 105.0, 95.0, 100.0];
        let fit = LinearFit::fit(&xs, &ys).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert!((fit.predict(40.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_has_no_fit() {
        assert!(LinearFit::fit(&[], &[]).is_none());
    }

    #[test]
    fn degenerate_projection_is_constant() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let xs = [0.0; 10];
        let ys = [140.0; 10];
        let points = forecaster.project_series(&xs, &ys, 10, 1.0);
        assert_eq!(points, vec![140; 7]);
    }

    #[test]
    fn empty_history_uses_default_projection() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let points = forecaster.project(&[], 1.1);
        assert_eq!(points, vec![132; 7]);
    }

    #[test]
    fn history_shape() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let mut rng = StdRng::seed_from_u64(5);
        let history = forecaster.build_history(today(), &mut rng);
        assert_eq!(history.len(), 28);
        assert_eq!(history.last().unwrap().date, today());
        assert_eq!(history[0].date, today() - Duration::days(27));
        assert!(history.iter().all(|d| d.demand >= 90));
        // trend rises by 85 across the window, noise is at most 8 per point
        assert!(history[27].demand > history[0].demand);
    }

    #[test]
    fn forecast_is_floored_even_for_falling_trends() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let xs: Vec<f64> = (0..28).map(|x| x as f64).collect();
        let ys: Vec<f64> = (0..28).map(|x| 400.0 - 15.0 * x as f64).collect();
        let points = forecaster.project_series(&xs, &ys, 28, 1.0);
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|&d| d >= 50));
        assert_eq!(*points.last().unwrap(), 50);

        for influence in [0.0, 0.1, 1.0, 1.34] {
            let mut rng = StdRng::seed_from_u64(9);
            let series = forecaster.forecast(influence, today(), &mut rng);
            assert!(series.forecast.iter().all(|p| p.demand >= 50));
        }
    }

    #[test]
    fn forecast_labels_and_lengths() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let series = forecaster.forecast(1.0, today(), &mut rng);
        assert_eq!(series.historical.len(), 14);
        assert_eq!(series.forecast.len(), 7);
        assert_eq!(series.historical.last().unwrap().day, "03-10");
        assert_eq!(series.forecast[0].day, "03-11");
        assert_eq!(series.forecast[6].day, "03-17");
    }

    #[test]
    fn influence_scales_projection() {
        let forecaster = DemandForecaster::new(&ForecastConfig::default());
        let mut rng = StdRng::seed_from_u64(21);
        let history = forecaster.build_history(today(), &mut rng);
        let base = forecaster.project(&history, 1.0);
        let boosted = forecaster.project(&history, 1.23);
        assert!(base.iter().zip(&boosted).all(|(b, s)| s >= b));
        assert!(boosted.iter().sum::<u32>() > base.iter().sum::<u32>());
    }
}
