use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use inkworks_core::{DomainError, DomainResult};

/// Catalog product identifier (SKU or catalog key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("ProductId: empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stock on hand for one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub stock_quantity: i64,
}

/// Read-only stock lookup.
pub trait StockCatalog: Send + Sync {
    /// `None` when the product is not in the catalog.
    fn stock_level(&self, product_id: &ProductId) -> Option<StockLevel>;
}

impl<C> StockCatalog for std::sync::Arc<C>
where
    C: StockCatalog + ?Sized,
{
    fn stock_level(&self, product_id: &ProductId) -> Option<StockLevel> {
        (**self).stock_level(product_id)
    }
}

/// Stock levels captured for a set of products at command time.
///
/// Aggregates never call the catalog; the service captures a snapshot and
/// hands it over inside the command. Products missing from the catalog are
/// recorded with zero stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    levels: BTreeMap<ProductId, i64>,
}

impl StockSnapshot {
    pub fn capture<'a, C>(catalog: &C, products: impl IntoIterator<Item = &'a ProductId>) -> Self
    where
        C: StockCatalog + ?Sized,
    {
        let levels = products
            .into_iter()
            .map(|id| {
                let qty = catalog.stock_level(id).map(|l| l.stock_quantity).unwrap_or(0);
                (id.clone(), qty)
            })
            .collect();
        Self { levels }
    }

    pub fn from_levels(levels: impl IntoIterator<Item = StockLevel>) -> Self {
        Self {
            levels: levels
                .into_iter()
                .map(|l| (l.product_id, l.stock_quantity))
                .collect(),
        }
    }

    pub fn available(&self, product_id: &ProductId) -> i64 {
        self.levels.get(product_id).copied().unwrap_or(0)
    }
}

/// Verify every product's summed demand fits within its available stock.
///
/// `demand` yields one `(product, quantity)` pair per line; lines for the same
/// product are summed before comparing. The first short product (in product id
/// order) is reported.
pub fn check_availability<'a>(
    demand: impl IntoIterator<Item = (&'a ProductId, u64)>,
    snapshot: &StockSnapshot,
) -> DomainResult<()> {
    let mut totals: BTreeMap<&ProductId, u64> = BTreeMap::new();
    for (product_id, qty) in demand {
        let entry = totals.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(qty);
    }

    for (product_id, requested) in totals {
        let available = snapshot.available(product_id);
        let enough = available >= 0 && requested <= available as u64;
        if !enough {
            return Err(DomainError::InsufficientStock {
                product_id: product_id.to_string(),
                requested,
                available,
            });
        }
    }

    Ok(())
}
