//! In-Memory Processor
//!
//! For tests and offline demos. Behaves like the hosted processor for
//! everything the account service relies on, including metadata merging
//! and global detach. Individual operations can be made to fail or stall
//! to exercise partial-failure and timeout paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use checkout_core::{Card, Customer, CustomerMetadata, PaymentMethod};

use super::{IntentUsage, NewCustomer, PaymentIntent, PaymentIntentParams, PaymentProcessor, SetupIntent};
use crate::error::{PaymentError, Result};

/// Processor operations, for failure injection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    RetrieveCustomer,
    ListCustomers,
    CreateCustomer,
    UpdateCustomer,
    RetrievePaymentMethod,
    ListPaymentMethods,
    AttachPaymentMethod,
    DetachPaymentMethod,
    CreateSetupIntent,
    CreatePaymentIntent,
}

#[derive(Default)]
struct Store {
    /// Creation order
    customers: Vec<Customer>,
    payment_methods: HashMap<String, PaymentMethod>,
    payment_intents: Vec<PaymentIntentParams>,
    setup_intents: Vec<IntentUsage>,
    last_created: i64,

    /// Created customers are not kept, as if deleted right away
    drop_new_customers: bool,
}

impl Store {
    /// Strictly increasing creation timestamps, so recency is unambiguous
    fn next_created(&mut self) -> i64 {
        self.last_created = Utc::now().timestamp().max(self.last_created + 1);
        self.last_created
    }

    fn customer_mut(&mut self, id: &str) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }
}

/// In-memory payment processor
#[derive(Clone, Default)]
pub struct MemoryProcessor {
    store: Arc<RwLock<Store>>,
    failing: Arc<RwLock<HashSet<Operation>>>,
    latency: Option<Duration>,
}

impl MemoryProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, for exercising timeouts
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make an operation fail with an upstream error until cleared
    pub async fn set_failing(&self, operation: Operation, failing: bool) {
        let mut ops = self.failing.write().await;
        if failing {
            ops.insert(operation);
        } else {
            ops.remove(&operation);
        }
    }

    /// Tokenize a card, as the browser would before calling the service.
    /// The payment method starts out unattached.
    pub async fn create_card_payment_method(&self, card: Card) -> PaymentMethod {
        let mut store = self.store.write().await;
        let pm = PaymentMethod {
            id: format!("pm_{}", Uuid::new_v4().simple()),
            created: store.next_created(),
            customer: None,
            card: Some(card),
        };
        store.payment_methods.insert(pm.id.clone(), pm.clone());
        pm
    }

    /// Tokenize a test Visa card ending in `last4`
    pub async fn create_test_card(&self, last4: &str) -> PaymentMethod {
        self.create_card_payment_method(Card {
            brand: "visa".into(),
            last4: last4.into(),
            exp_month: 12,
            exp_year: 2034,
        })
        .await
    }

    /// Make customer creation succeed without keeping the customer
    pub async fn set_drop_new_customers(&self, drop: bool) {
        self.store.write().await.drop_new_customers = drop;
    }

    /// Payment intents created so far, in order
    pub async fn payment_intents(&self) -> Vec<PaymentIntentParams> {
        self.store.read().await.payment_intents.clone()
    }

    /// Usage of each setup intent created so far, in order
    pub async fn setup_intents(&self) -> Vec<IntentUsage> {
        self.store.read().await.setup_intents.clone()
    }

    async fn enter(&self, operation: Operation) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.read().await.contains(&operation) {
            return Err(PaymentError::Upstream(format!("{operation:?} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProcessor for MemoryProcessor {
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>> {
        self.enter(Operation::RetrieveCustomer).await?;
        let store = self.store.read().await;
        Ok(store.customers.iter().find(|c| c.id == customer_id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.enter(Operation::ListCustomers).await?;
        let store = self.store.read().await;
        Ok(store.customers.iter().rev().cloned().collect())
    }

    async fn create_customer(&self, params: NewCustomer) -> Result<Customer> {
        self.enter(Operation::CreateCustomer).await?;
        let mut store = self.store.write().await;

        let customer = Customer {
            id: format!("cus_{}", Uuid::new_v4().simple()),
            email: Some(params.email),
            metadata: CustomerMetadata::from_map(params.metadata),
        };

        if let Some(pm_id) = &params.payment_method {
            let pm = store
                .payment_methods
                .get_mut(pm_id)
                .ok_or_else(|| PaymentError::NotFound(format!("No such payment method: '{pm_id}'")))?;
            if pm.customer.is_some() {
                return Err(PaymentError::InvalidRequest(format!(
                    "Payment method {pm_id} is already attached to a customer"
                )));
            }
            pm.customer = Some(customer.id.clone());
        }

        if store.drop_new_customers {
            tracing::debug!(customer_id = %customer.id, "Dropped new in-memory customer");
        } else {
            store.customers.push(customer.clone());
        }
        Ok(customer)
    }

    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Customer> {
        self.enter(Operation::UpdateCustomer).await?;
        let mut store = self.store.write().await;
        let customer = store
            .customer_mut(customer_id)
            .ok_or_else(|| PaymentError::NotFound(format!("No such customer: '{customer_id}'")))?;

        let mut merged = customer.metadata.clone().into_map();
        merged.extend(metadata);
        customer.metadata = CustomerMetadata::from_map(merged);

        Ok(customer.clone())
    }

    async fn retrieve_payment_method(&self, payment_method_id: &str) -> Result<Option<PaymentMethod>> {
        self.enter(Operation::RetrievePaymentMethod).await?;
        let store = self.store.read().await;
        Ok(store.payment_methods.get(payment_method_id).cloned())
    }

    async fn list_card_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>> {
        self.enter(Operation::ListPaymentMethods).await?;
        let store = self.store.read().await;

        let mut methods: Vec<_> = store
            .payment_methods
            .values()
            .filter(|pm| pm.customer.as_deref() == Some(customer_id) && pm.card.is_some())
            .cloned()
            .collect();
        methods.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));

        Ok(methods)
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod> {
        self.enter(Operation::AttachPaymentMethod).await?;
        let mut store = self.store.write().await;

        if !store.customers.iter().any(|c| c.id == customer_id) {
            return Err(PaymentError::NotFound(format!("No such customer: '{customer_id}'")));
        }

        let pm = store
            .payment_methods
            .get_mut(payment_method_id)
            .ok_or_else(|| PaymentError::NotFound(format!("No such payment method: '{payment_method_id}'")))?;

        match pm.customer.as_deref() {
            Some(owner) if owner != customer_id => Err(PaymentError::InvalidRequest(format!(
                "Payment method {payment_method_id} is already attached to a customer"
            ))),
            _ => {
                pm.customer = Some(customer_id.to_string());
                Ok(pm.clone())
            }
        }
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod> {
        self.enter(Operation::DetachPaymentMethod).await?;
        let mut store = self.store.write().await;

        let pm = store
            .payment_methods
            .get_mut(payment_method_id)
            .ok_or_else(|| PaymentError::NotFound(format!("No such payment method: '{payment_method_id}'")))?;

        if pm.customer.take().is_none() {
            return Err(PaymentError::InvalidRequest(format!(
                "Payment method {payment_method_id} is not attached to a customer"
            )));
        }

        Ok(pm.clone())
    }

    async fn create_setup_intent(&self, usage: IntentUsage) -> Result<SetupIntent> {
        self.enter(Operation::CreateSetupIntent).await?;
        let id = format!("seti_{}", Uuid::new_v4().simple());
        tracing::debug!(setup_intent = %id, ?usage, "Created in-memory setup intent");
        self.store.write().await.setup_intents.push(usage);

        Ok(SetupIntent {
            client_secret: Some(format!("{id}_secret_{}", Uuid::new_v4().simple())),
            id,
            status: "requires_payment_method".into(),
        })
    }

    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent> {
        self.enter(Operation::CreatePaymentIntent).await?;
        let mut store = self.store.write().await;

        if let Some(customer_id) = &params.customer {
            if !store.customers.iter().any(|c| &c.id == customer_id) {
                return Err(PaymentError::NotFound(format!("No such customer: '{customer_id}'")));
            }
        }

        let id = format!("pi_{}", Uuid::new_v4().simple());
        let status = if params.payment_method.is_some() {
            "requires_confirmation"
        } else {
            "requires_payment_method"
        };

        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret_{}", Uuid::new_v4().simple())),
            id,
            amount: params.amount,
            currency: params.currency.to_lowercase(),
            status: status.into(),
            customer: params.customer.clone(),
            payment_method: params.payment_method.clone(),
        };
        store.payment_intents.push(params);

        Ok(intent)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
