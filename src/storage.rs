use std::collections::HashMap;

use rand::Rng;

use crate::config::HistoryConfig;
use crate::types::Product;

/// Per-product rolling window of observed transaction quantities
#[derive(Debug, Clone)]
pub struct QuantityHistory {
    buffers: HashMap<u32, RingBuffer>,
    capacity: usize,
}

#[derive(Debug, Clone)]
struct RingBuffer {
    data: Vec<u32>,
    head: usize,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    fn push(&mut self, quantity: u32) {
        if self.data.len() < self.capacity {
            self.data.push(quantity);
        } else {
            self.data[self.head] = quantity;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    /// All values in chronological order
    fn values(&self) -> Vec<u32> {
        if self.data.len() < self.capacity {
            return self.data.clone();
        }
        // Buffer is full, oldest entry sits at head
        let mut result = Vec::with_capacity(self.capacity);
        result.extend_from_slice(&self.data[self.head..]);
        result.extend_from_slice(&self.data[..self.head]);
        result
    }
}

impl QuantityHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            capacity,
        }
    }

    /// Build a store and seed it once for the whole catalog
    pub fn seeded<R: Rng + ?Sized>(config: &HistoryConfig, products: &[Product], rng: &mut R) -> Self {
        let mut history = Self::new(config.capacity);
        history.seed(config, products, rng);
        history
    }

    /// Fill every product with `seed_count` plausible quantities. Does nothing
    /// if the store already holds data.
    pub fn seed<R: Rng + ?Sized>(&mut self, config: &HistoryConfig, products: &[Product], rng: &mut R) {
        if !self.is_empty() {
            return;
        }
        for product in products {
            for _ in 0..config.seed_count {
                let quantity = rng.gen_range(config.seed_min..=config.seed_max);
                self.record(product.id, quantity);
            }
        }
        tracing::debug!(
            products = products.len(),
            per_product = config.seed_count,
            "Seeded quantity history"
        );
    }

    pub fn record(&mut self, product_id: u32, quantity: u32) {
        let capacity = self.capacity;
        self.buffers
            .entry(product_id)
            .or_insert_with(|| RingBuffer::new(capacity))
            .push(quantity);
    }

    /// Current window for `product_id`, oldest first. Empty if unseen.
    pub fn get(&self, product_id: u32) -> Vec<u32> {
        match self.buffers.get(&product_id) {
            Some(buf) => buf.values(),
            None => Vec::new(),
        }
    }

    pub fn len(&self, product_id: u32) -> usize {
        self.buffers.get(&product_id).map_or(0, RingBuffer::len)
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(|b| b.len() == 0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
