use crate::config::ProductConfig;
use crate::types::Product;

/// Product catalog with mutable stock levels. Products are never removed.
#[derive(Debug, Clone)]
pub struct Ledger {
    products: Vec<Product>,
}

impl Ledger {
    pub fn new(catalog: &[ProductConfig]) -> Self {
        let products = catalog
            .iter()
            .map(|p| Product {
                id: p.id,
                name: p.name.clone(),
                stock: p.stock,
                reorder_point: p.reorder_point,
            })
            .collect();
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, index: usize) -> Option<&Product> {
        self.products.get(index)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Remove `quantity` units from the product at `index`, flooring at zero.
    /// Returns the new stock level.
    pub fn withdraw(&mut self, index: usize, quantity: u32) -> Option<u32> {
        let product = self.products.get_mut(index)?;
        product.stock = product.stock.saturating_sub(quantity);
        Some(product.stock)
    }

    pub fn total_stock(&self) -> u64 {
        self.products.iter().map(|p| p.stock as u64).sum()
    }
}
