//! Payment Processor Integration
//!
//! The capability set the account service needs from a processor. The
//! processor owns customers, payment methods and intents; nothing here
//! persists anything itself.

mod memory;
mod stripe_client;

pub use memory::{MemoryProcessor, Operation};
pub use stripe_client::StripeProcessor;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use checkout_core::{Customer, PaymentMethod};

use crate::error::Result;

/// Parameters for creating a customer
#[derive(Clone, Debug, Default)]
pub struct NewCustomer {
    pub email: String,

    /// Payment method to attach at creation time
    pub payment_method: Option<String>,

    pub metadata: HashMap<String, String>,
}

/// When a saved payment method is expected to be used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentUsage {
    OnSession,
    OffSession,
}

/// Parameters for creating a payment intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntentParams {
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub payment_method_types: Vec<String>,
    pub setup_future_usage: Option<IntentUsage>,

    /// Sent only when set; bound intents send `Some(false)`
    pub off_session: Option<bool>,
}

impl PaymentIntentParams {
    pub fn new(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            customer: None,
            payment_method: None,
            payment_method_types: Vec::new(),
            setup_future_usage: None,
            off_session: None,
        }
    }
}

/// Setup intent as returned to the browser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

/// Payment intent as returned to the browser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
}

/// Payment processor client (Strategy pattern)
///
/// Lookups answer `Ok(None)` for objects the processor does not know;
/// mutations on unknown objects fail with `PaymentError::NotFound`.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>>;

    /// First page of customers, newest first
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    async fn create_customer(&self, params: NewCustomer) -> Result<Customer>;

    /// Merge keys into the customer's metadata
    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Customer>;

    async fn retrieve_payment_method(&self, payment_method_id: &str) -> Result<Option<PaymentMethod>>;

    /// Card payment methods attached to a customer
    async fn list_card_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>>;

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod>;

    /// Detach from whichever customer holds it
    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod>;

    async fn create_setup_intent(&self, usage: IntentUsage) -> Result<SetupIntent>;

    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent>;

    /// Processor name
    fn name(&self) -> &str;
}
