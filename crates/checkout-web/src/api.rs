//! API Client

use serde::{Deserialize, de::DeserializeOwned};

use checkout_core::{Customer, PaymentMethod, Price, User};

use crate::config;

/// Setup or payment intent, as much of it as the browser needs
#[derive(Clone, Debug, Deserialize)]
pub struct Intent {
    pub id: String,
    pub client_secret: Option<String>,
}

impl Intent {
    pub fn into_client_secret(self) -> Result<String, String> {
        self.client_secret
            .ok_or_else(|| format!("Intent {} has no client secret", self.id))
    }
}

#[derive(Deserialize)]
struct PriceResponse {
    price: i64,
    currency: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetupIntentResponse {
    setup_intent: Intent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentIntentResponse {
    payment_intent: Intent,
}

#[derive(Deserialize)]
struct CustomersResponse {
    customers: Vec<Customer>,
}

#[derive(Deserialize)]
struct DetachResponse {
    data: PaymentMethod,
}

fn url(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

fn error_message(data: &serde_json::Value) -> String {
    data["error"].as_str().unwrap_or("Request failed").to_string()
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(error_message(&data))
    }
}

fn get(path: &str) -> reqwest::RequestBuilder {
    reqwest::Client::new().get(url(&config::api_url(), path))
}

fn post(path: &str) -> reqwest::RequestBuilder {
    reqwest::Client::new().post(url(&config::api_url(), path))
}

pub async fn widget_price() -> Result<Price, String> {
    let data: PriceResponse = send(get("/widgetprice")).await?;
    Ok(Price::new(data.price, data.currency))
}

pub async fn list_customers() -> Result<Vec<Customer>, String> {
    let data: CustomersResponse = send(get("/customers")).await?;
    Ok(data.customers)
}

pub async fn get_customer(customer_id: &str) -> Result<User, String> {
    send(get(&format!("/customer/{customer_id}"))).await
}

/// Create a customer whose first card is `payment_method_id`
pub async fn create_customer(email: &str, payment_method_id: &str) -> Result<User, String> {
    let body = serde_json::json!({
        "email": email,
        "paymentMethodId": payment_method_id,
    });
    send(post("/customer").json(&body)).await
}

pub async fn create_setup_intent() -> Result<Intent, String> {
    let data: SetupIntentResponse = send(post("/setupintent")).await?;
    Ok(data.setup_intent)
}

/// Payment intent for one widget, bound to the customer and card when given
pub async fn create_payment_intent(
    customer_id: Option<&str>,
    payment_method_id: Option<&str>,
) -> Result<Intent, String> {
    let body = serde_json::json!({
        "customerId": customer_id,
        "paymentMethodId": payment_method_id,
    });
    let data: PaymentIntentResponse = send(post("/paymentintent").json(&body)).await?;
    Ok(data.payment_intent)
}

pub async fn detach_payment_method(payment_method_id: &str) -> Result<PaymentMethod, String> {
    let request = reqwest::Client::new().delete(url(
        &config::api_url(),
        &format!("/paymentmethod/{payment_method_id}"),
    ));
    let data: DetachResponse = send(request).await?;
    Ok(data.data)
}

pub async fn attach_payment_method(
    customer_id: &str,
    payment_method_id: &str,
) -> Result<User, String> {
    send(post(&format!("/paymentmethod/{customer_id}/{payment_method_id}"))).await
}

pub async fn set_default_payment_method(
    customer_id: &str,
    payment_method_id: &str,
) -> Result<User, String> {
    send(post(&format!(
        "/defaultpaymentmethod/{customer_id}/{payment_method_id}"
    )))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(url("http://localhost:3030/", "/customers"), "http://localhost:3030/customers");
        assert_eq!(url("http://localhost:3030", "/customers"), "http://localhost:3030/customers");
    }

    #[test]
    fn test_error_message_from_body() {
        let body = serde_json::json!({ "error": "Payment method unchanged", "code": "INVALID_REQUEST" });
        assert_eq!(error_message(&body), "Payment method unchanged");
        assert_eq!(error_message(&serde_json::Value::Null), "Request failed");
    }

    #[test]
    fn test_intent_without_secret() {
        let intent: Intent = serde_json::from_value(serde_json::json!({ "id": "pi_1", "client_secret": null })).unwrap();
        assert!(intent.into_client_secret().is_err());
    }
}
