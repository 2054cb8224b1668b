use chrono::{DateTime, Utc};
use rand::Rng;

use crate::analyzer::ZScoreDetector;
use crate::config::{Config, SimulatorConfig};
use crate::feed::RecencyFeed;
use crate::ledger::Ledger;
use crate::storage::QuantityHistory;
use crate::types::Transaction;

/// Display ids stay within five digits and wrap around
pub const TX_SEQ_MIN: u32 = 10_000;
pub const TX_SEQ_MAX: u32 = 99_999;

/// Process-lifetime market state: stock, quantity history and the two feeds.
#[derive(Debug, Clone)]
pub struct MarketState {
    pub ledger: Ledger,
    pub history: QuantityHistory,
    pub transactions: RecencyFeed<Transaction>,
    pub anomalies: RecencyFeed<Transaction>,
    next_tx_seq: u32,
}

impl MarketState {
    /// Build the state and seed the quantity history once.
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let ledger = Ledger::new(&config.catalog);
        let history = QuantityHistory::seeded(&config.history, ledger.products(), rng);
        Self::from_parts(ledger, history, &config.simulator, rng.gen_range(TX_SEQ_MIN..20_000))
    }

    /// Build the state around an existing history, without seeding.
    pub fn from_parts(ledger: Ledger, history: QuantityHistory, config: &SimulatorConfig, first_tx_seq: u32) -> Self {
        Self {
            ledger,
            history,
            transactions: RecencyFeed::new(config.transaction_feed_capacity),
            anomalies: RecencyFeed::new(config.anomaly_feed_capacity),
            next_tx_seq: first_tx_seq.clamp(TX_SEQ_MIN, TX_SEQ_MAX),
        }
    }

    fn next_tx_id(&mut self) -> String {
        let id = format!("TX-{}", self.next_tx_seq);
        self.next_tx_seq = if self.next_tx_seq >= TX_SEQ_MAX {
            TX_SEQ_MIN
        } else {
            self.next_tx_seq + 1
        };
        id
    }
}

/// Generates synthetic sales against the ledger
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    detector: ZScoreDetector,
}

impl Simulator {
    pub fn new(config: &SimulatorConfig, detector: ZScoreDetector) -> Self {
        Self {
            config: config.clone(),
            detector,
        }
    }

    /// Bimodal draw: mostly ordinary baskets, occasionally a bulk surge
    pub fn draw_quantity<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let cfg = &self.config;
        if rng.gen_bool(cfg.surge_probability) {
            rng.gen_range(cfg.surge_min..=cfg.surge_max)
        } else {
            rng.gen_range(cfg.normal_min..=cfg.normal_max)
        }
    }

    /// Simulate one sale against a uniformly chosen product. None for an
    /// empty catalog.
    pub fn simulate<R: Rng + ?Sized>(&self, state: &mut MarketState, rng: &mut R) -> Option<Transaction> {
        if state.ledger.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..state.ledger.len());
        let quantity = self.draw_quantity(rng);
        self.apply(state, index, quantity, Utc::now())
    }

    /// Simulate between `batch_min` and `batch_max` sales
    pub fn simulate_batch<R: Rng + ?Sized>(&self, state: &mut MarketState, rng: &mut R) -> Vec<Transaction> {
        let count = rng.gen_range(self.config.batch_min..=self.config.batch_max);
        (0..count).filter_map(|_| self.simulate(state, rng)).collect()
    }

    /// Record a sale of `quantity` units of the product at `index`.
    ///
    /// The score is taken against the history as it was before this sale.
    /// Returns None if `index` is outside the catalog.
    pub fn apply(
        &self,
        state: &mut MarketState,
        index: usize,
        quantity: u32,
        at: DateTime<Utc>,
    ) -> Option<Transaction> {
        let product = state.ledger.get(index)?;
        let (product_id, product_name) = (product.id, product.name.clone());

        let z_score = self.detector.score(quantity, &state.history.get(product_id));
        let is_anomaly = self.detector.is_anomaly(quantity, z_score);

        let remaining = state.ledger.withdraw(index, quantity).unwrap_or(0);
        state.history.record(product_id, quantity);

        let tx = Transaction {
            id: state.next_tx_id(),
            product_id,
            product_name,
            quantity,
            z_score,
            is_anomaly,
            timestamp: at,
        };

        state.transactions.push_front(tx.clone());
        if is_anomaly {
            tracing::info!(
                tx = %tx.id,
                product = %tx.product_name,
                quantity,
                z_score,
                "Anomalous transaction"
            );
            state.anomalies.push_front(tx.clone());
        } else {
            tracing::debug!(tx = %tx.id, product = %tx.product_name, quantity, remaining, "Transaction");
        }

        Some(tx)
    }
}
