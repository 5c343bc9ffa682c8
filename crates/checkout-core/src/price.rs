//! Product Price

use serde::{Deserialize, Serialize};

/// A price in minor currency units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in minor units (pence, cents)
    pub amount: i64,

    /// Lowercase ISO currency code
    pub currency: String,
}

impl Price {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_lowercase(),
        }
    }

    fn symbol(&self) -> Option<&'static str> {
        match self.currency.as_str() {
            "gbp" => Some("£"),
            "usd" => Some("$"),
            "eur" => Some("€"),
            "jpy" => Some("¥"),
            _ => None,
        }
    }

    /// Whether the currency has no minor unit (amount is in whole units)
    fn is_zero_decimal(&self) -> bool {
        matches!(
            self.currency.as_str(),
            "bif" | "clp" | "djf" | "gnf" | "jpy" | "kmf" | "krw" | "mga" | "pyg" | "rwf"
                | "ugx" | "vnd" | "vuv" | "xaf" | "xof" | "xpf"
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let amount = self.amount.unsigned_abs();
        let value = if self.is_zero_decimal() {
            amount.to_string()
        } else {
            format!("{}.{:02}", amount / 100, amount % 100)
        };
        match self.symbol() {
            Some(symbol) => write!(f, "{sign}{symbol}{value}"),
            None => write!(f, "{sign}{value} {}", self.currency.to_uppercase()),
        }
    }
}
