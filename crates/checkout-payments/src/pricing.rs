//! Product Pricing
//!
//! Stand-in for a catalog service: one product at one fixed price. Request
//! input never influences the amount charged.

use checkout_core::Price;

/// Products on sale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Product {
    #[default]
    Widget,
}

impl Product {
    pub fn price(self) -> Price {
        match self {
            Self::Widget => Price::new(2500, "gbp"), // £25.00
        }
    }
}

/// Price of the widget sold at checkout
pub fn product_price() -> Price {
    Product::Widget.price()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_price() {
        let price = product_price();
        assert_eq!(price.amount, 2500);
        assert_eq!(price.currency, "gbp");
    }
}
