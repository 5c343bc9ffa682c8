//! Session Handle
//!
//! Reactive wrapper around [`SessionState`]. Created once in `App` and passed
//! to every page as a prop; it is `Copy`, like the signals inside it.

use leptos::prelude::*;

use checkout_core::{SessionState, User};

use crate::api;

#[derive(Clone, Copy)]
pub struct SessionHandle {
    state: RwSignal<SessionState>,

    /// Customer of the latest lookup; older responses are dropped
    requested: RwSignal<Option<String>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            state: RwSignal::new(SessionState::new()),
            requested: RwSignal::new(None),
        }
    }

    /// Read the state, tracking it
    pub fn with<R>(self, f: impl FnOnce(&SessionState) -> R) -> R {
        self.state.with(f)
    }

    pub fn with_untracked<R>(self, f: impl FnOnce(&SessionState) -> R) -> R {
        self.state.with_untracked(f)
    }

    pub fn customer_id(self) -> Option<String> {
        self.with(|state| state.customer_id().map(str::to_owned))
    }

    pub fn is_loading(self) -> bool {
        self.with(SessionState::is_loading)
    }

    pub fn has_error(self) -> bool {
        self.with(SessionState::has_error)
    }

    /// Impersonate `customer_id`: fetch its snapshot and make it the user
    pub fn select_customer(self, customer_id: String) {
        self.requested.set(Some(customer_id.clone()));
        self.state.update(|state| {
            if let Err(e) = state.begin_lookup() {
                leptos::logging::error!("Customer lookup: {e}");
            }
        });

        leptos::task::spawn_local(async move {
            let result = api::get_customer(&customer_id).await;
            if self.requested.get_untracked().as_deref() != Some(customer_id.as_str()) {
                return;
            }

            self.state.update(|state| match result {
                Ok(user) => state.select(user),
                Err(e) => {
                    leptos::logging::error!("Failed to load customer {customer_id}: {e}");
                    if let Err(e) = state.lookup_failed() {
                        leptos::logging::error!("Customer lookup: {e}");
                    }
                }
            });
        });
    }

    /// Stop impersonating
    pub fn clear(self) {
        self.requested.set(None);
        self.state.update(SessionState::clear);
    }

    /// Adopt a snapshot the server returned for the current customer
    pub fn replace(self, user: User) -> Result<(), String> {
        let mut outcome = Ok(());
        self.state.update(|state| {
            outcome = state.replace_snapshot(user).map_err(|e| e.to_string());
        });
        outcome
    }

    /// Drop a card the server has just detached
    pub fn detached(self, payment_method_id: &str) -> Result<(), String> {
        let mut outcome = Ok(());
        self.state.update(|state| {
            outcome = state
                .apply_detached(payment_method_id)
                .map_err(|e| e.to_string());
        });
        outcome
    }
}
