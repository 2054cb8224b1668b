use crate::config::ReorderConfig;
use crate::feed::RecencyFeed;
use crate::types::{DemandPoint, Product, Recommendation, StockStatus, Transaction};

/// Turns a demand forecast and recent anomalies into ranked stock actions.
///
/// Forecast demand is split evenly across the catalog.
#[derive(Debug, Clone)]
pub struct ReorderPlanner {
    config: ReorderConfig,
}

impl ReorderPlanner {
    pub fn new(config: &ReorderConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn recommend(
        &self,
        forecast: &[DemandPoint],
        products: &[Product],
        anomalies: &RecencyFeed<Transaction>,
    ) -> Vec<Recommendation> {
        let cfg = &self.config;
        let horizon = cfg.horizon_days as f64;

        let total: u32 = forecast.iter().map(|p| p.demand).sum();
        let avg_daily = total as f64 / horizon;
        let per_product = avg_daily / products.len().max(1) as f64;

        let recent: Vec<&Transaction> = anomalies.recent(cfg.anomaly_window).collect();

        let mut recs: Vec<Recommendation> = products
            .iter()
            .map(|product| {
                let anomaly_hits = recent.iter().filter(|tx| tx.product_id == product.id).count() as u32;

                let target = (per_product * horizon * cfg.safety_factor).floor() as u32
                    + cfg.anomaly_boost * anomaly_hits;
                let reorder_qty = target.saturating_sub(product.stock);
                let coverage_days = product.stock as f64 / per_product.max(1.0);

                Recommendation {
                    product: product.name.clone(),
                    current_stock: product.stock,
                    reorder_qty,
                    status: self.classify(product, coverage_days),
                    anomaly_hits,
                }
            })
            .collect();

        // Vec::sort_by_key is stable, catalog order survives within a status
        recs.sort_by_key(|r| r.status);
        recs
    }

    fn classify(&self, product: &Product, coverage_days: f64) -> StockStatus {
        let cfg = &self.config;
        let stock = product.stock as f64;
        let reorder_point = product.reorder_point as f64;

        if coverage_days < cfg.critical_coverage_days || stock < reorder_point * cfg.critical_reorder_ratio {
            StockStatus::Critical
        } else if coverage_days < cfg.low_coverage_days || stock < reorder_point {
            StockStatus::Low
        } else {
            StockStatus::Healthy
        }
    }
}
