//! widget-checkout Web Frontend
//!
//! Leptos-based WASM frontend: pick a customer to impersonate, buy the
//! widget with a saved or new card, and manage saved cards.

mod api;
mod app;
mod components;
mod config;
mod pages;
mod session;
mod stripe_js;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
