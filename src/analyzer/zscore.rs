use crate::config::AnomalyConfig;

/// Z-Score based anomaly detection over a product's quantity history.
///
/// A quantity is anomalous only when it is both large in absolute terms and
/// unusual for the product.
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    min_history: usize,
    min_quantity: u32,
    min_score: f64,
}

impl ZScoreDetector {
    pub fn new(config: &AnomalyConfig) -> Self {
        Self {
            min_history: config.min_history,
            min_quantity: config.min_quantity,
            min_score: config.min_score,
        }
    }

    /// Standardized deviation of `quantity` against `history`, using the
    /// population mean and standard deviation. Returns 0.0 when the history
    /// is too short or has no variation.
    pub fn score(&self, quantity: u32, history: &[u32]) -> f64 {
        if history.len() < self.min_history || history.is_empty() {
            return 0.0;
        }

        let n = history.len() as f64;
        let mean = history.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = history
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let stddev = variance.sqrt();

        if stddev == 0.0 {
            return 0.0;
        }

        (quantity as f64 - mean) / stddev
    }

    pub fn is_anomaly(&self, quantity: u32, score: f64) -> bool {
        quantity > self.min_quantity && score >= self.min_score
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(&AnomalyConfig::default())
    }
}
