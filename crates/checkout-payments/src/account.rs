//! Account Service
//!
//! Customer and payment method operations on top of a [`PaymentProcessor`],
//! plus the one concept the processor lacks: a per-customer default
//! payment method, kept in customer metadata under
//! [`DEFAULT_PAYMENT_METHOD_KEY`].
//!
//! Every call to the processor is awaited in order and bounded by the
//! service timeout. Nothing is retried and nothing is rolled back: if a
//! multi-step mutation fails halfway, the processor keeps whatever the
//! earlier steps did.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use checkout_core::{Customer, DEFAULT_PAYMENT_METHOD_KEY, PaymentMethod, Price, User};

use crate::error::{PaymentError, Result};
use crate::pricing::product_price;
use crate::processor::{
    IntentUsage, NewCustomer, PaymentIntent, PaymentIntentParams, PaymentProcessor, SetupIntent,
};

/// Default bound on a single processor call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Customer/payment method operations with default-method bookkeeping
#[derive(Clone)]
pub struct AccountService {
    processor: Arc<dyn PaymentProcessor>,
    timeout: Duration,
}

impl AccountService {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self {
            processor,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    /// Price of the product sold at checkout
    pub fn price(&self) -> Price {
        product_price()
    }

    /// Create a customer with its first card, which becomes the default
    pub async fn create_customer(&self, email: &str, payment_method_id: &str) -> Result<User> {
        let email = require(email, "email")?;
        let payment_method_id = require(payment_method_id, "paymentMethodId")?;

        let mut metadata = HashMap::new();
        metadata.insert(DEFAULT_PAYMENT_METHOD_KEY.to_string(), payment_method_id.to_string());

        let customer = self
            .call(self.processor.create_customer(NewCustomer {
                email: email.to_string(),
                payment_method: Some(payment_method_id.to_string()),
                metadata,
            }))
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            payment_method_id = %payment_method_id,
            "Created customer"
        );

        self.customer_snapshot(&customer.id).await
    }

    /// The customer together with its card payment methods
    pub async fn customer_snapshot(&self, customer_id: &str) -> Result<User> {
        let customer_id = require(customer_id, "customerId")?;
        let customer = self.find_customer(customer_id).await?;
        let payment_methods = self
            .call(self.processor.list_card_payment_methods(&customer.id))
            .await?;

        let user = User::new(customer, payment_methods);
        tracing::debug!(
            customer_id = %user.customer.id,
            payment_methods = user.payment_methods.len(),
            dangling_default = user.has_dangling_default(),
            "Fetched customer snapshot"
        );

        Ok(user)
    }

    /// Attach a card and make it the default
    pub async fn attach_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<User> {
        let customer_id = require(customer_id, "customerId")?;
        let payment_method_id = require(payment_method_id, "paymentMethodId")?;

        self.call(
            self.processor
                .attach_payment_method(payment_method_id, customer_id),
        )
        .await?;
        self.write_default(customer_id, payment_method_id).await?;

        tracing::info!(
            customer_id = %customer_id,
            payment_method_id = %payment_method_id,
            "Attached payment method as default"
        );

        self.customer_snapshot(customer_id).await
    }

    /// Detach a payment method from whichever customer holds it.
    ///
    /// A default reference to it is left in place; readers treat a default
    /// that is not in the customer's list as absent.
    pub async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod> {
        let payment_method_id = require(payment_method_id, "id")?;

        let detached = self
            .call(self.processor.detach_payment_method(payment_method_id))
            .await?;

        tracing::info!(payment_method_id = %detached.id, "Detached payment method");

        Ok(detached)
    }

    /// Point the customer's default at another payment method.
    ///
    /// Does not check that the payment method belongs to this customer.
    pub async fn set_default_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<User> {
        let customer_id = require(customer_id, "customerId")?;
        let payment_method_id = require(payment_method_id, "paymentMethodId")?;

        let customer = self.find_customer(customer_id).await?;
        if customer.default_payment_method() == Some(payment_method_id) {
            tracing::warn!(
                customer_id = %customer_id,
                payment_method_id = %payment_method_id,
                "Default payment method unchanged"
            );
            return Err(PaymentError::InvalidRequest("Payment method unchanged".into()));
        }

        self.call(self.processor.retrieve_payment_method(payment_method_id))
            .await?
            .ok_or_else(|| {
                PaymentError::NotFound(format!("Payment method {payment_method_id} not found"))
            })?;

        self.write_default(customer_id, payment_method_id).await?;

        tracing::info!(
            customer_id = %customer_id,
            payment_method_id = %payment_method_id,
            "Set default payment method"
        );

        self.customer_snapshot(customer_id).await
    }

    /// Setup intent for saving a card during the session
    pub async fn create_setup_intent(&self) -> Result<SetupIntent> {
        self.call(self.processor.create_setup_intent(IntentUsage::OnSession))
            .await
    }

    /// Payment intent for the widget.
    ///
    /// With both ids, the payment method must already belong to the
    /// customer; the intent is then bound to that card. Otherwise the
    /// intent is left for the browser to complete with a new card.
    pub async fn create_payment_intent(
        &self,
        customer_id: Option<&str>,
        payment_method_id: Option<&str>,
    ) -> Result<PaymentIntent> {
        let price = product_price();
        let mut params = PaymentIntentParams::new(price.amount, price.currency);

        let customer_id = customer_id.filter(|id| !id.is_empty());
        let payment_method_id = payment_method_id.filter(|id| !id.is_empty());

        if let (Some(customer_id), Some(payment_method_id)) = (customer_id, payment_method_id) {
            let payment_method = self
                .call(self.processor.retrieve_payment_method(payment_method_id))
                .await?
                .ok_or_else(|| {
                    PaymentError::NotFound(format!("Payment method {payment_method_id} not found"))
                })?;

            if payment_method.customer.as_deref() != Some(customer_id) {
                tracing::warn!(
                    customer_id = %customer_id,
                    payment_method_id = %payment_method_id,
                    owner = ?payment_method.customer,
                    "Payment method owned by another customer"
                );
                return Err(PaymentError::InvalidRequest(
                    "Unexpected customer associated with payment method".into(),
                ));
            }

            params.customer = Some(customer_id.to_string());
            params.payment_method = Some(payment_method_id.to_string());
            params.payment_method_types = vec!["card".to_string()];
            params.setup_future_usage = Some(IntentUsage::OnSession);
            params.off_session = Some(false);
        }

        let intent = self.call(self.processor.create_payment_intent(params)).await?;

        tracing::info!(
            payment_intent = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            customer_id = ?intent.customer,
            "Created payment intent"
        );

        Ok(intent)
    }

    /// First page of customers; no pagination
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.call(self.processor.list_customers()).await
    }

    /// Card payment methods of a customer, without the customer
    pub async fn list_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>> {
        let customer_id = require(customer_id, "customerId")?;
        self.call(self.processor.list_card_payment_methods(customer_id))
            .await
    }

    async fn find_customer(&self, customer_id: &str) -> Result<Customer> {
        self.call(self.processor.retrieve_customer(customer_id))
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("Customer {customer_id} not found")))
    }

    async fn write_default(&self, customer_id: &str, payment_method_id: &str) -> Result<Customer> {
        let mut metadata = HashMap::new();
        metadata.insert(DEFAULT_PAYMENT_METHOD_KEY.to_string(), payment_method_id.to_string());
        self.call(self.processor.update_customer_metadata(customer_id, metadata))
            .await
    }

    /// Await one processor call under the service timeout
    async fn call<T>(&self, request: impl Future<Output = Result<T>> + Send) -> Result<T> {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if matches!(e, PaymentError::Upstream(_)) {
                    tracing::error!(processor = self.processor.name(), error = %e, "Processor call failed");
                }
                Err(e)
            }
            Err(_) => {
                tracing::error!(
                    processor = self.processor.name(),
                    timeout = ?self.timeout,
                    "Processor call timed out"
                );
                Err(PaymentError::Timeout(self.timeout))
            }
        }
    }
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(PaymentError::InvalidRequest(format!("Expected {field} but received nothing")))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{MemoryProcessor, Operation};
    use checkout_core::select_payment_method;

    fn service(processor: &MemoryProcessor) -> AccountService {
        AccountService::new(Arc::new(processor.clone()))
    }

    async fn new_customer(processor: &MemoryProcessor, accounts: &AccountService) -> User {
        let pm = processor.create_test_card("4242").await;
        accounts.create_customer("ada@example.com", &pm.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_customer_sets_default() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let pm = processor.create_test_card("4242").await;

        let user = accounts.create_customer("ada@example.com", &pm.id).await.unwrap();

        assert_eq!(user.customer.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.customer.default_payment_method(), Some(pm.id.as_str()));
        assert_eq!(user.payment_methods.len(), 1);
        assert_eq!(user.payment_methods[0].id, pm.id);
    }

    #[tokio::test]
    async fn test_create_customer_requires_fields() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);

        let result = accounts.create_customer("", "pm_123").await;
        assert!(matches!(result, Err(PaymentError::InvalidRequest(_))));

        let result = accounts.create_customer("ada@example.com", " ").await;
        assert!(matches!(result, Err(PaymentError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_snapshot_unknown_customer() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);

        let result = accounts.customer_snapshot("cus_missing").await;
        assert!(matches!(result, Err(PaymentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_attach_then_snapshot_shows_new_default() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let second = processor.create_test_card("1881").await;

        accounts
            .attach_payment_method(user.customer_id(), &second.id)
            .await
            .unwrap();
        let snapshot = accounts.customer_snapshot(user.customer_id()).await.unwrap();

        assert!(snapshot.payment_method(&second.id).is_some());
        assert_eq!(snapshot.customer.default_payment_method(), Some(second.id.as_str()));
        assert_eq!(select_payment_method(&snapshot).unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_attach_returns_snapshot() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let second = processor.create_test_card("1881").await;

        let returned = accounts
            .attach_payment_method(user.customer_id(), &second.id)
            .await
            .unwrap();
        let fetched = accounts.customer_snapshot(user.customer_id()).await.unwrap();

        assert_eq!(returned, fetched);
        assert_eq!(returned.payment_methods.len(), 2);
    }

    #[tokio::test]
    async fn test_attach_partial_failure_is_not_rolled_back() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let first = user.payment_methods[0].id.clone();
        let second = processor.create_test_card("1881").await;

        processor.set_failing(Operation::UpdateCustomer, true).await;
        let result = accounts
            .attach_payment_method(user.customer_id(), &second.id)
            .await;
        assert!(matches!(result, Err(PaymentError::Upstream(_))));
        processor.set_failing(Operation::UpdateCustomer, false).await;

        // The card stays attached; the default still points at the first card
        let snapshot = accounts.customer_snapshot(user.customer_id()).await.unwrap();
        assert!(snapshot.payment_method(&second.id).is_some());
        assert_eq!(snapshot.customer.default_payment_method(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_detach_leaves_default_reference() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let a = user.payment_methods[0].id.clone();
        let b = processor.create_test_card("1881").await;
        accounts.attach_payment_method(user.customer_id(), &b.id).await.unwrap();
        accounts
            .set_default_payment_method(user.customer_id(), &a)
            .await
            .unwrap();

        let detached = accounts.detach_payment_method(&a).await.unwrap();
        assert_eq!(detached.id, a);

        let snapshot = accounts.customer_snapshot(user.customer_id()).await.unwrap();
        assert_eq!(snapshot.customer.default_payment_method(), Some(a.as_str()));
        assert!(snapshot.has_dangling_default());
        assert_eq!(select_payment_method(&snapshot).unwrap().id, b.id);
    }

    #[tokio::test]
    async fn test_local_detach_matches_server() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let b = processor.create_test_card("1881").await;
        let c = processor.create_test_card("0005").await;
        accounts.attach_payment_method(user.customer_id(), &b.id).await.unwrap();
        let before = accounts.attach_payment_method(user.customer_id(), &c.id).await.unwrap();

        accounts.detach_payment_method(&b.id).await.unwrap();

        let local = before.without_payment_method(&b.id);
        let server = accounts.customer_snapshot(user.customer_id()).await.unwrap();
        assert_eq!(local, server);
    }

    #[tokio::test]
    async fn test_set_default_unchanged_is_rejected() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let current = user.customer.default_payment_method().unwrap().to_string();

        let result = accounts
            .set_default_payment_method(user.customer_id(), &current)
            .await;
        assert_eq!(
            result,
            Err(PaymentError::InvalidRequest("Payment method unchanged".into()))
        );

        let after = accounts.customer_snapshot(user.customer_id()).await.unwrap();
        assert_eq!(after, user);
    }

    #[tokio::test]
    async fn test_set_default_validation() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;

        let result = accounts.set_default_payment_method("cus_missing", "pm_1").await;
        assert!(matches!(result, Err(PaymentError::NotFound(_))));

        let result = accounts
            .set_default_payment_method(user.customer_id(), "pm_missing")
            .await;
        assert!(matches!(result, Err(PaymentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_default_does_not_check_ownership() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let stray = processor.create_test_card("0000").await;

        let snapshot = accounts
            .set_default_payment_method(user.customer_id(), &stray.id)
            .await
            .unwrap();

        assert_eq!(snapshot.customer.default_payment_method(), Some(stray.id.as_str()));
        assert!(snapshot.has_dangling_default());
    }

    #[tokio::test]
    async fn test_payment_intent_rejects_foreign_payment_method() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let c1 = new_customer(&processor, &accounts).await;
        let c2 = new_customer(&processor, &accounts).await;

        let result = accounts
            .create_payment_intent(Some(c1.customer_id()), Some(&c2.payment_methods[0].id))
            .await;

        assert_eq!(
            result,
            Err(PaymentError::InvalidRequest(
                "Unexpected customer associated with payment method".into()
            ))
        );
        assert!(processor.payment_intents().await.is_empty());
    }

    #[tokio::test]
    async fn test_payment_intent_bound_to_saved_card() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;
        let pm = &user.payment_methods[0].id;

        let intent = accounts
            .create_payment_intent(Some(user.customer_id()), Some(pm))
            .await
            .unwrap();

        assert_eq!(intent.amount, 2500);
        assert_eq!(intent.currency, "gbp");
        assert_eq!(intent.payment_method.as_deref(), Some(pm.as_str()));

        let params = &processor.payment_intents().await[0];
        assert_eq!(params.customer.as_deref(), Some(user.customer_id()));
        assert_eq!(params.payment_method_types, vec!["card".to_string()]);
        assert_eq!(params.setup_future_usage, Some(IntentUsage::OnSession));
        assert_eq!(params.off_session, Some(false));
    }

    #[tokio::test]
    async fn test_payment_intent_without_both_ids_is_unbound() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;

        let intent = accounts
            .create_payment_intent(Some(user.customer_id()), None)
            .await
            .unwrap();

        assert!(intent.customer.is_none());
        assert!(intent.payment_method.is_none());
        assert_eq!(intent.amount, accounts.price().amount);
        assert_eq!(processor.payment_intents().await[0].off_session, None);
    }

    #[tokio::test]
    async fn test_list_customers_and_payment_methods() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        let user = new_customer(&processor, &accounts).await;

        let customers = accounts.list_customers().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, user.customer.id);

        let methods = accounts.list_payment_methods(user.customer_id()).await.unwrap();
        assert_eq!(methods, user.payment_methods);

        assert!(matches!(
            accounts.list_payment_methods("").await,
            Err(PaymentError::InvalidRequest(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_timeout() {
        let processor = MemoryProcessor::new().with_latency(Duration::from_secs(60));
        let accounts = service(&processor).with_timeout(Duration::from_secs(5));

        let result = accounts.list_customers().await;
        assert_eq!(result, Err(PaymentError::Timeout(Duration::from_secs(5))));
    }

    #[tokio::test]
    async fn test_setup_intent() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);

        let intent = accounts.create_setup_intent().await.unwrap();
        assert!(intent.id.starts_with("seti_"));
        assert!(intent.client_secret.is_some());
        assert_eq!(processor.setup_intents().await, vec![IntentUsage::OnSession]);
    }

    #[tokio::test]
    async fn test_create_customer_missing_after_create() {
        let processor = MemoryProcessor::new();
        let accounts = service(&processor);
        processor.set_drop_new_customers(true).await;
        let pm = processor.create_test_card("4242").await;

        let result = accounts.create_customer("ada@example.com", &pm.id).await;
        assert!(matches!(result, Err(PaymentError::NotFound(_))));
    }
}
