//! Invoice line pricing.
//!
//! Unit sales are priced per piece. Area sales are priced per square metre of
//! printed surface: `width_m × height_m × quantity × unit_price`.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use inkworks_core::money::{to_amount, to_signed_amount};
use inkworks_core::{Amount, DomainError, DomainResult, SignedAmount, ValueObject};
use inkworks_inventory::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    #[default]
    Unit,
    Area,
}

/// Printed sheet dimensions in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_m: Decimal,
    pub height_m: Decimal,
}

impl ValueObject for Dimensions {}

impl Dimensions {
    pub fn new(width_m: Decimal, height_m: Decimal) -> DomainResult<Self> {
        if width_m <= Decimal::ZERO || height_m <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "area sale needs positive width and height, got {width_m} x {height_m}"
            )));
        }
        Ok(Self { width_m, height_m })
    }

    pub fn area_m2(&self) -> Decimal {
        self.width_m * self.height_m
    }
}

/// An item line as entered, before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    pub description: String,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: u64,
    /// Per piece for unit sales, per m² for area sales.
    pub unit_price: Amount,
    #[serde(default)]
    pub sale_type: SaleType,
    #[serde(default)]
    pub width_m: Option<Decimal>,
    #[serde(default)]
    pub height_m: Option<Decimal>,
    /// Same basis as `unit_price`.
    #[serde(default)]
    pub cost_per_unit: Amount,
}

impl ItemInput {
    pub fn unit(description: impl Into<String>, quantity: u64, unit_price: Amount) -> Self {
        Self {
            description: description.into(),
            product_id: None,
            quantity,
            unit_price,
            sale_type: SaleType::Unit,
            width_m: None,
            height_m: None,
            cost_per_unit: 0,
        }
    }

    pub fn area(
        description: impl Into<String>,
        width_m: Decimal,
        height_m: Decimal,
        quantity: u64,
        unit_price: Amount,
    ) -> Self {
        Self {
            description: description.into(),
            product_id: None,
            quantity,
            unit_price,
            sale_type: SaleType::Area,
            width_m: Some(width_m),
            height_m: Some(height_m),
            cost_per_unit: 0,
        }
    }

    pub fn with_cost(mut self, cost_per_unit: Amount) -> Self {
        self.cost_per_unit = cost_per_unit;
        self
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }
}

/// A priced invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub product_id: Option<ProductId>,
    pub quantity: u64,
    pub unit_price: Amount,
    pub amount: Amount,
    pub sale_type: SaleType,
    pub width_m: Option<Decimal>,
    pub height_m: Option<Decimal>,
    pub area_m2: Option<Decimal>,
    pub cost_per_unit: Amount,
    pub line_cost: Amount,
    pub line_profit: SignedAmount,
}

pub fn price_item(input: &ItemInput) -> DomainResult<InvoiceItem> {
    if input.description.trim().is_empty() {
        return Err(DomainError::validation("item description cannot be empty"));
    }
    if input.quantity == 0 {
        return Err(DomainError::validation("item quantity must be at least 1"));
    }

    let (amount, line_cost, dims) = match input.sale_type {
        SaleType::Unit => {
            let amount = input
                .quantity
                .checked_mul(input.unit_price)
                .ok_or_else(|| DomainError::validation("item amount overflow"))?;
            let line_cost = input
                .quantity
                .checked_mul(input.cost_per_unit)
                .ok_or_else(|| DomainError::validation("item cost overflow"))?;
            (amount, line_cost, None)
        }
        SaleType::Area => {
            let (Some(w), Some(h)) = (input.width_m, input.height_m) else {
                return Err(DomainError::validation(
                    "area sale needs both width_m and height_m",
                ));
            };
            let dims = Dimensions::new(w, h)?;
            let printed_area = dims.area_m2() * Decimal::from(input.quantity);
            let amount = to_amount(printed_area * Decimal::from(input.unit_price), "item amount")?;
            let line_cost = to_amount(
                printed_area * Decimal::from(input.cost_per_unit),
                "item line_cost",
            )?;
            (amount, line_cost, Some(dims))
        }
    };

    let line_profit = to_signed_amount(
        Decimal::from(amount) - Decimal::from(line_cost),
        "item line_profit",
    )?;

    Ok(InvoiceItem {
        description: input.description.trim().to_string(),
        product_id: input.product_id.clone(),
        quantity: input.quantity,
        unit_price: input.unit_price,
        amount,
        sale_type: input.sale_type,
        width_m: dims.map(|d| d.width_m),
        height_m: dims.map(|d| d.height_m),
        area_m2: dims.map(|d| d.area_m2()),
        cost_per_unit: input.cost_per_unit,
        line_cost,
        line_profit,
    })
}

/// Price every line, naming the offending line on failure.
pub fn price_items(inputs: &[ItemInput]) -> DomainResult<Vec<InvoiceItem>> {
    inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            price_item(input).map_err(|err| match err {
                DomainError::Validation(msg) => {
                    DomainError::validation(format!("item {idx}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unit_sale_multiplies_quantity() {
        let item = price_item(&ItemInput::unit("Business cards", 500, 12).with_cost(5)).unwrap();
        assert_eq!(item.amount, 6_000);
        assert_eq!(item.line_cost, 2_500);
        assert_eq!(item.line_profit, 3_500);
        assert_eq!(item.area_m2, None);
    }

    #[test]
    fn area_sale_prices_total_printed_area() {
        let item = price_item(&ItemInput::area("Vinyl banner", dec!(2), dec!(1.5), 3, 10)).unwrap();
        assert_eq!(item.area_m2, Some(dec!(3)));
        assert_eq!(item.amount, 90);
    }

    #[test]
    fn area_cost_covers_every_piece() {
        let item = price_item(
            &ItemInput::area("Mesh", dec!(2), dec!(1.5), 3, 10).with_cost(4),
        )
        .unwrap();
        // 3 m² per piece x 3 pieces x 4
        assert_eq!(item.line_cost, 36);
        assert_eq!(item.line_profit, 54);
    }

    #[test]
    fn area_amount_is_rounded_to_minor_unit() {
        // 0.333 x 1 x 1 x 1000 = 333
        let item = price_item(&ItemInput::area("Strip", dec!(0.3333), dec!(1), 1, 1000)).unwrap();
        assert_eq!(item.amount, 333);
    }

    #[test]
    fn cost_above_price_gives_negative_profit() {
        let item = price_item(&ItemInput::unit("Loss leader", 2, 10).with_cost(15)).unwrap();
        assert_eq!(item.line_profit, -10);
    }

    #[test]
    fn area_sale_requires_positive_dimensions() {
        let err = price_item(&ItemInput::area("Bad", dec!(0), dec!(1), 1, 10)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("positive")));

        let mut missing = ItemInput::area("Bad", dec!(1), dec!(1), 1, 10);
        missing.height_m = None;
        assert!(matches!(price_item(&missing), Err(DomainError::Validation(_))));
    }

    #[test]
    fn zero_quantity_is_rejected_with_line_index() {
        let inputs = vec![
            ItemInput::unit("Flyers", 100, 3),
            ItemInput::unit("Posters", 0, 50),
        ];
        match price_items(&inputs).unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.starts_with("item 1:"), "{msg}"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
