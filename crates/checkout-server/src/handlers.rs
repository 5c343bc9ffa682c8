//! HTTP Handlers
//!
//! Thin adapters from HTTP to the account service. Every customer-facing
//! mutation answers with the full `{customer, paymentMethods}` snapshot,
//! except detach.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use checkout_core::{Customer, PaymentMethod, User};
use checkout_payments::{PaymentError, PaymentIntent, SetupIntent};

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, PaymentError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub processor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    /// Minor units
    pub price: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupIntentResponse {
    pub setup_intent: SetupIntent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub payment_intent: PaymentIntent,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub payment_method_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsResponse {
    pub payment_methods: Vec<PaymentMethod>,
}

/// Detach confirmation: the payment method as it is after detaching
#[derive(Debug, Serialize)]
pub struct DetachResponse {
    pub data: PaymentMethod,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        processor: state
            .accounts
            .as_ref()
            .map(|accounts| accounts.processor_name().to_string()),
    })
}

/// Price of the widget
pub async fn widget_price(State(state): State<AppState>) -> ApiResult<PriceResponse> {
    let price = state.accounts()?.price();
    Ok(Json(PriceResponse {
        price: price.amount,
        currency: price.currency,
    }))
}

pub async fn create_setup_intent(State(state): State<AppState>) -> ApiResult<SetupIntentResponse> {
    let setup_intent = state.accounts()?.create_setup_intent().await?;
    Ok(Json(SetupIntentResponse { setup_intent }))
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<PaymentIntentRequest>,
) -> ApiResult<PaymentIntentResponse> {
    let payment_intent = state
        .accounts()?
        .create_payment_intent(
            payload.customer_id.as_deref(),
            payload.payment_method_id.as_deref(),
        )
        .await?;
    Ok(Json(PaymentIntentResponse { payment_intent }))
}

pub async fn list_customers(State(state): State<AppState>) -> ApiResult<CustomersResponse> {
    let customers = state.accounts()?.list_customers().await?;
    Ok(Json(CustomersResponse { customers }))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<User> {
    let user = state.accounts()?.customer_snapshot(&customer_id).await?;
    Ok(Json(user))
}

/// Create a customer with an associated card
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> ApiResult<User> {
    let user = state
        .accounts()?
        .create_customer(&payload.email, &payload.payment_method_id)
        .await?;
    Ok(Json(user))
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
    Query(query): Query<PaymentMethodsQuery>,
) -> ApiResult<PaymentMethodsResponse> {
    let customer_id = query.customer_id.unwrap_or_default();
    let payment_methods = state.accounts()?.list_payment_methods(&customer_id).await?;
    Ok(Json(PaymentMethodsResponse { payment_methods }))
}

pub async fn detach_payment_method(
    State(state): State<AppState>,
    Path(payment_method_id): Path<String>,
) -> ApiResult<DetachResponse> {
    let data = state
        .accounts()?
        .detach_payment_method(&payment_method_id)
        .await?;
    Ok(Json(DetachResponse { data }))
}

/// Attach a card to a customer; it becomes the default
pub async fn attach_payment_method(
    State(state): State<AppState>,
    Path((customer_id, payment_method_id)): Path<(String, String)>,
) -> ApiResult<User> {
    let user = state
        .accounts()?
        .attach_payment_method(&customer_id, &payment_method_id)
        .await?;
    Ok(Json(user))
}

/// Set the customer's default payment method
pub async fn set_default_payment_method(
    State(state): State<AppState>,
    Path((customer_id, payment_method_id)): Path<(String, String)>,
) -> ApiResult<User> {
    let user = state
        .accounts()?
        .set_default_payment_method(&customer_id, &payment_method_id)
        .await?;
    Ok(Json(user))
}
