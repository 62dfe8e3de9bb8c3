//! In-memory stock catalog.

use std::collections::HashMap;
use std::sync::RwLock;

use inkworks_inventory::{ProductId, StockCatalog, StockLevel};

#[derive(Debug, Default)]
pub struct InMemoryStockCatalog {
    levels: RwLock<HashMap<ProductId, i64>>,
}

impl InMemoryStockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(levels: impl IntoIterator<Item = StockLevel>) -> Self {
        let catalog = Self::new();
        for level in levels {
            catalog.set_level(level.product_id, level.stock_quantity);
        }
        catalog
    }

    /// Upsert a product's stock quantity.
    pub fn set_level(&self, product_id: ProductId, stock_quantity: i64) {
        // A poisoned lock only loses this write; readers fall back to zero stock.
        if let Ok(mut levels) = self.levels.write() {
            levels.insert(product_id, stock_quantity);
        }
    }
}

impl StockCatalog for InMemoryStockCatalog {
    fn stock_level(&self, product_id: &ProductId) -> Option<StockLevel> {
        let levels = self.levels.read().ok()?;
        levels.get(product_id).map(|&stock_quantity| StockLevel {
            product_id: product_id.clone(),
            stock_quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_products_have_no_level() {
        let catalog = InMemoryStockCatalog::new();
        assert!(catalog.stock_level(&ProductId::new("vinyl").unwrap()).is_none());
    }

    #[test]
    fn set_level_overwrites() {
        let vinyl = ProductId::new("vinyl").unwrap();
        let catalog = InMemoryStockCatalog::with_levels([StockLevel {
            product_id: vinyl.clone(),
            stock_quantity: 5,
        }]);
        catalog.set_level(vinyl.clone(), 2);
        assert_eq!(catalog.stock_level(&vinyl).unwrap().stock_quantity, 2);
    }
}
