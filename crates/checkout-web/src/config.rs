//! Page Configuration
//!
//! Read from `<meta>` tags in `index.html` so the same bundle works
//! against any API and Stripe account.

fn meta_content(name: &str) -> Option<String> {
    let document = web_sys::window()?.document()?;
    let element = document
        .query_selector(&format!("meta[name=\"{name}\"]"))
        .ok()??;
    element
        .get_attribute("content")
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// API base URL, falling back to the page origin
pub fn api_url() -> String {
    meta_content("api-url")
        .or_else(|| web_sys::window().and_then(|w| w.location().origin().ok()))
        .unwrap_or_else(|| "http://localhost:3030".into())
}

/// Stripe publishable key
pub fn stripe_key() -> Option<String> {
    meta_content("stripe-key")
}
