//! Router

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{
    attach_payment_method, create_customer, create_payment_intent, create_setup_intent,
    detach_payment_method, get_customer, health_check, list_customers, list_payment_methods,
    set_default_payment_method, widget_price,
};
use crate::state::AppState;

/// API routes, without static files
pub fn api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .route("/widgetprice", get(widget_price))
        .route("/setupintent", post(create_setup_intent))
        .route("/paymentintent", post(create_payment_intent))
        .route("/customers", get(list_customers))
        .route("/customer", post(create_customer))
        .route("/customer/{id}", get(get_customer))
        .route("/paymentmethods", get(list_payment_methods))
        .route("/paymentmethod/{id}", delete(detach_payment_method))
        .route(
            "/paymentmethod/{customer_id}/{payment_method_id}",
            post(attach_payment_method),
        )
        .route(
            "/defaultpaymentmethod/{customer_id}/{payment_method_id}",
            post(set_default_payment_method),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes with the WASM frontend served as the fallback
pub fn app(state: AppState, static_dir: &str) -> Router {
    api_router(state).fallback_service(ServeDir::new(static_dir))
}
