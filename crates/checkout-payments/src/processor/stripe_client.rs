//! Stripe Processor
//!
//! `PaymentProcessor` backed by the Stripe API via `async-stripe`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use stripe::{
    AttachPaymentMethod, Client, CreateCustomer, CreatePaymentIntent, Currency,
    Customer as StripeCustomer, CustomerId, ListCustomers, ListPaymentMethods,
    PaymentIntent as StripePaymentIntent, PaymentIntentOffSession, PaymentIntentSetupFutureUsage,
    PaymentMethod as StripePaymentMethod, PaymentMethodId, PaymentMethodTypeFilter,
    SetupIntent as StripeSetupIntent, StripeError, UpdateCustomer,
};

use checkout_core::{Card, Customer, CustomerMetadata, PaymentMethod};

use super::{IntentUsage, NewCustomer, PaymentIntent, PaymentIntentParams, PaymentProcessor, SetupIntent};
use crate::error::{PaymentError, Result};

/// Stripe client wrapper
pub struct StripeProcessor {
    client: Client,
}

impl StripeProcessor {
    /// Create a new Stripe processor
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }
}

/// Form body for `POST /setup_intents`. `CreateSetupIntent` has no `usage` field.
#[derive(Debug, Serialize)]
struct SetupIntentForm {
    usage: IntentUsage,
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>> {
        // An id Stripe could never have issued names no customer
        let Ok(id) = parse_customer_id(customer_id) else {
            return Ok(None);
        };
        match StripeCustomer::retrieve(&self.client, &id, &[]).await {
            Ok(customer) if customer.deleted => Ok(None),
            Ok(customer) => Ok(Some(convert_customer(customer))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(map_error(e)),
        }
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let customers = StripeCustomer::list(&self.client, &ListCustomers::new())
            .await
            .map_err(map_error)?;

        Ok(customers.data.into_iter().map(convert_customer).collect())
    }

    async fn create_customer(&self, params: NewCustomer) -> Result<Customer> {
        let payment_method = params
            .payment_method
            .as_deref()
            .map(parse_payment_method_id)
            .transpose()?;

        let mut create = CreateCustomer::new();
        create.email = Some(&params.email);
        create.payment_method = payment_method;
        create.metadata = Some(params.metadata);

        let customer = StripeCustomer::create(&self.client, create)
            .await
            .map_err(map_error)?;

        Ok(convert_customer(customer))
    }

    async fn update_customer_metadata(
        &self,
        customer_id: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Customer> {
        let id = parse_customer_id(customer_id)?;

        let mut update = UpdateCustomer::new();
        update.metadata = Some(metadata);

        let customer = StripeCustomer::update(&self.client, &id, update)
            .await
            .map_err(map_error)?;

        Ok(convert_customer(customer))
    }

    async fn retrieve_payment_method(&self, payment_method_id: &str) -> Result<Option<PaymentMethod>> {
        let Ok(id) = parse_payment_method_id(payment_method_id) else {
            return Ok(None);
        };
        match StripePaymentMethod::retrieve(&self.client, &id, &[]).await {
            Ok(pm) => Ok(Some(convert_payment_method(pm))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(map_error(e)),
        }
    }

    async fn list_card_payment_methods(&self, customer_id: &str) -> Result<Vec<PaymentMethod>> {
        let mut params = ListPaymentMethods::new();
        params.customer = Some(parse_customer_id(customer_id)?);
        params.type_ = Some(PaymentMethodTypeFilter::Card);

        let methods = StripePaymentMethod::list(&self.client, &params)
            .await
            .map_err(map_error)?;

        Ok(methods.data.into_iter().map(convert_payment_method).collect())
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<PaymentMethod> {
        let id = parse_payment_method_id(payment_method_id)?;
        let params = AttachPaymentMethod {
            customer: parse_customer_id(customer_id)?,
        };

        let pm = StripePaymentMethod::attach(&self.client, &id, params)
            .await
            .map_err(map_error)?;

        Ok(convert_payment_method(pm))
    }

    async fn detach_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethod> {
        let id = parse_payment_method_id(payment_method_id)?;

        let pm = StripePaymentMethod::detach(&self.client, &id)
            .await
            .map_err(map_error)?;

        Ok(convert_payment_method(pm))
    }

    async fn create_setup_intent(&self, usage: IntentUsage) -> Result<SetupIntent> {
        let intent: StripeSetupIntent = self
            .client
            .post_form("/setup_intents", SetupIntentForm { usage })
            .await
            .map_err(map_error)?;

        Ok(SetupIntent {
            id: intent.id.to_string(),
            client_secret: intent.client_secret,
            status: intent.status.to_string(),
        })
    }

    async fn create_payment_intent(&self, params: PaymentIntentParams) -> Result<PaymentIntent> {
        let mut create = CreatePaymentIntent::new(params.amount, parse_currency(&params.currency)?);
        create.customer = params.customer.as_deref().map(parse_customer_id).transpose()?;
        create.payment_method = params
            .payment_method
            .as_deref()
            .map(parse_payment_method_id)
            .transpose()?;
        if !params.payment_method_types.is_empty() {
            create.payment_method_types = Some(params.payment_method_types);
        }
        create.setup_future_usage = params.setup_future_usage.map(|usage| match usage {
            IntentUsage::OnSession => PaymentIntentSetupFutureUsage::OnSession,
            IntentUsage::OffSession => PaymentIntentSetupFutureUsage::OffSession,
        });
        create.off_session = params.off_session.map(PaymentIntentOffSession::Exists);

        let intent = StripePaymentIntent::create(&self.client, create)
            .await
            .map_err(map_error)?;

        Ok(PaymentIntent {
            id: intent.id.to_string(),
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency.to_string(),
            status: intent.status.to_string(),
            customer: intent.customer.as_ref().map(|c| c.id().to_string()),
            payment_method: intent.payment_method.as_ref().map(|pm| pm.id().to_string()),
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

fn parse_customer_id(id: &str) -> Result<CustomerId> {
    id.parse()
        .map_err(|e| PaymentError::InvalidRequest(format!("Invalid customer id '{id}': {e}")))
}

fn parse_payment_method_id(id: &str) -> Result<PaymentMethodId> {
    id.parse()
        .map_err(|e| PaymentError::InvalidRequest(format!("Invalid payment method id '{id}': {e}")))
}

fn parse_currency(code: &str) -> Result<Currency> {
    match code.to_lowercase().as_str() {
        "gbp" => Ok(Currency::GBP),
        "usd" => Ok(Currency::USD),
        "eur" => Ok(Currency::EUR),
        other => Err(PaymentError::Config(format!("Unsupported currency: {other}"))),
    }
}

fn is_missing(err: &StripeError) -> bool {
    matches!(err, StripeError::Stripe(req) if req.http_status == 404)
}

fn map_error(err: StripeError) -> PaymentError {
    match err {
        StripeError::Stripe(req) => {
            let message = req
                .message
                .clone()
                .unwrap_or_else(|| format!("Stripe request failed with status {}", req.http_status));
            match req.http_status {
                404 => PaymentError::NotFound(message),
                400 => PaymentError::InvalidRequest(message),
                _ => PaymentError::Upstream(message),
            }
        }
        other => PaymentError::Upstream(other.to_string()),
    }
}

fn convert_customer(customer: StripeCustomer) -> Customer {
    Customer {
        id: customer.id.to_string(),
        email: customer.email,
        metadata: CustomerMetadata::from_map(customer.metadata.unwrap_or_default()),
    }
}

fn convert_payment_method(pm: StripePaymentMethod) -> PaymentMethod {
    PaymentMethod {
        id: pm.id.to_string(),
        created: pm.created,
        customer: pm.customer.as_ref().map(|c| c.id().to_string()),
        card: pm.card.map(|card| Card {
            brand: card.brand,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::account::AccountService;

    #[test]
    fn test_id_parsing() {
        assert!(parse_customer_id("cus_123").is_ok());
        assert!(matches!(
            parse_customer_id("pm_123"),
            Err(PaymentError::InvalidRequest(_))
        ));
        assert!(parse_payment_method_id("pm_123").is_ok());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!(parse_currency("GBP").unwrap(), Currency::GBP);
        assert!(parse_currency("xyz").is_err());
    }

    #[test]
    fn test_setup_intent_form_carries_usage() {
        let form = SetupIntentForm {
            usage: IntentUsage::OnSession,
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            serde_json::json!({ "usage": "on_session" })
        );
    }

    // Malformed ids are rejected before any request is sent
    #[tokio::test]
    async fn test_malformed_ids_are_missing() {
        let processor = StripeProcessor::new("sk_test_xxx");

        assert!(processor.retrieve_customer("abc").await.unwrap().is_none());
        assert!(processor.retrieve_customer("pm_123").await.unwrap().is_none());
        assert!(processor.retrieve_payment_method("bogus").await.unwrap().is_none());

        let accounts = AccountService::new(Arc::new(processor));
        assert!(matches!(
            accounts.customer_snapshot("abc").await,
            Err(PaymentError::NotFound(_))
        ));
    }

    #[test]
    fn test_processor_name() {
        assert_eq!(StripeProcessor::new("sk_test_xxx").name(), "stripe");
    }
}
