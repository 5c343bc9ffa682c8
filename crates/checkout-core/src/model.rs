//! Customer and Payment Method Model
//!
//! Wire-compatible with the processor's JSON for customers and card
//! payment methods, plus the denormalized [`User`] snapshot the server
//! returns from every customer-facing call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key holding the customer's chosen default payment method.
///
/// The processor has no native notion of a default card for one-off
/// payments, so the id is kept in the customer's free-form metadata.
pub const DEFAULT_PAYMENT_METHOD_KEY: &str = "default_payment_method";

/// Customer metadata
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMetadata {
    /// Id of the default payment method. May reference a payment method
    /// that is no longer attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_payment_method: Option<String>,

    /// Any other metadata the processor holds for this customer
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl CustomerMetadata {
    /// Build from the processor's flat key/value metadata
    pub fn from_map(mut map: HashMap<String, String>) -> Self {
        let default_payment_method = map
            .remove(DEFAULT_PAYMENT_METHOD_KEY)
            .filter(|id| !id.is_empty());
        Self {
            default_payment_method,
            extra: map,
        }
    }

    /// Flatten back into processor metadata
    pub fn into_map(self) -> HashMap<String, String> {
        let mut map = self.extra;
        if let Some(id) = self.default_payment_method {
            map.insert(DEFAULT_PAYMENT_METHOD_KEY.to_string(), id);
        }
        map
    }
}

/// A processor customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub metadata: CustomerMetadata,
}

impl Customer {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            metadata: CustomerMetadata::default(),
        }
    }

    /// The default payment method reference, if one was ever set
    pub fn default_payment_method(&self) -> Option<&str> {
        self.metadata.default_payment_method.as_deref()
    }

    /// Email for display, falling back to the id
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Card details of a card payment method
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub brand: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
}

impl Card {
    /// e.g. `visa / 4242`
    pub fn description(&self) -> String {
        format!("{} / {}", self.brand, self.last4)
    }

    /// e.g. `12 / 2030`
    pub fn expiry(&self) -> String {
        format!("{} / {}", self.exp_month, self.exp_year)
    }
}

/// A processor payment method
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,

    /// Unix timestamp (seconds) at creation
    pub created: i64,

    /// Customer this payment method is attached to, as recorded by the processor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Absent for payment methods in a transient or invalid state
    #[serde(default)]
    pub card: Option<Card>,
}

impl PaymentMethod {
    pub fn new(id: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            created,
            customer: None,
            card: None,
        }
    }

    pub fn with_card(mut self, card: Card) -> Self {
        self.card = Some(card);
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer = Some(customer_id.into());
        self
    }

    /// Creation time, if the timestamp is in range
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Human-readable card summary
    pub fn description(&self) -> String {
        self.card
            .as_ref()
            .map_or_else(|| format!("Payment method {}", self.id), Card::description)
    }
}

/// Denormalized customer view: the customer plus its card payment methods
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub customer: Customer,

    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

impl User {
    pub fn new(customer: Customer, payment_methods: Vec<PaymentMethod>) -> Self {
        Self {
            customer,
            payment_methods,
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer.id
    }

    /// Look up an attached payment method by id
    pub fn payment_method(&self, id: &str) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|pm| pm.id == id)
    }

    /// The default payment method, only if it is still in the list
    pub fn default_payment_method(&self) -> Option<&PaymentMethod> {
        self.customer
            .default_payment_method()
            .and_then(|id| self.payment_method(id))
    }

    /// Whether the default reference points at something no longer attached
    pub fn has_dangling_default(&self) -> bool {
        self.customer.default_payment_method().is_some() && self.default_payment_method().is_none()
    }

    /// Same customer, with one payment method removed
    #[must_use]
    pub fn without_payment_method(&self, id: &str) -> Self {
        Self {
            customer: self.customer.clone(),
            payment_methods: self
                .payment_methods
                .iter()
                .filter(|pm| pm.id != id)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visa(last4: &str) -> Card {
        Card {
            brand: "visa".into(),
            last4: last4.into(),
            exp_month: 12,
            exp_year: 2030,
        }
    }

    #[test]
    fn test_snapshot_wire_format() {
        let json = serde_json::json!({
            "customer": {
                "id": "cus_1",
                "email": "ada@example.com",
                "metadata": { "default_payment_method": "pm_a", "source": "demo" }
            },
            "paymentMethods": [
                { "id": "pm_a", "created": 100, "customer": "cus_1",
                  "card": { "brand": "visa", "last4": "4242", "exp_month": 12, "exp_year": 2030 } }
            ]
        });

        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.customer_id(), "cus_1");
        assert_eq!(user.customer.default_payment_method(), Some("pm_a"));
        assert_eq!(user.customer.metadata.extra.get("source").map(String::as_str), Some("demo"));
        assert_eq!(user.payment_methods[0].card.as_ref().unwrap().last4, "4242");

        let back = serde_json::to_value(&user).unwrap();
        assert!(back.get("paymentMethods").is_some());
        assert_eq!(back["customer"]["metadata"]["default_payment_method"], "pm_a");
    }

    #[test]
    fn test_metadata_map_conversion() {
        let mut map = HashMap::new();
        map.insert(DEFAULT_PAYMENT_METHOD_KEY.to_string(), "pm_1".to_string());
        map.insert("tier".to_string(), "gold".to_string());

        let metadata = CustomerMetadata::from_map(map);
        assert_eq!(metadata.default_payment_method.as_deref(), Some("pm_1"));
        assert_eq!(metadata.extra.len(), 1);

        let map = metadata.into_map();
        assert_eq!(map.get(DEFAULT_PAYMENT_METHOD_KEY).map(String::as_str), Some("pm_1"));
        assert_eq!(map.get("tier").map(String::as_str), Some("gold"));
    }

    #[test]
    fn test_empty_default_is_absent() {
        let mut map = HashMap::new();
        map.insert(DEFAULT_PAYMENT_METHOD_KEY.to_string(), String::new());
        assert!(CustomerMetadata::from_map(map).default_payment_method.is_none());
    }

    #[test]
    fn test_dangling_default() {
        let mut customer = Customer::new("cus_1", "ada@example.com");
        customer.metadata.default_payment_method = Some("pm_gone".into());
        let user = User::new(customer, vec![PaymentMethod::new("pm_a", 100).with_card(visa("4242"))]);

        assert!(user.default_payment_method().is_none());
        assert!(user.has_dangling_default());
    }

    #[test]
    fn test_without_payment_method_keeps_customer() {
        let mut customer = Customer::new("cus_1", "ada@example.com");
        customer.metadata.default_payment_method = Some("pm_a".into());
        let user = User::new(
            customer,
            vec![PaymentMethod::new("pm_a", 100), PaymentMethod::new("pm_b", 200)],
        );

        let updated = user.without_payment_method("pm_a");
        assert_eq!(updated.customer, user.customer);
        assert_eq!(updated.payment_methods.len(), 1);
        assert_eq!(updated.payment_methods[0].id, "pm_b");
    }

    #[test]
    fn test_card_description() {
        let pm = PaymentMethod::new("pm_a", 100).with_card(visa("4242"));
        assert_eq!(pm.description(), "visa / 4242");
        assert_eq!(pm.card.unwrap().expiry(), "12 / 2030");
        assert_eq!(PaymentMethod::new("pm_x", 1).description(), "Payment method pm_x");
    }
}
