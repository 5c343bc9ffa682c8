//! Application State

use std::sync::Arc;

use checkout_payments::{AccountService, PaymentError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Account service (optional - None if no processor is configured)
    pub accounts: Option<Arc<AccountService>>,
}

impl AppState {
    pub fn new(accounts: Option<AccountService>) -> Self {
        Self {
            accounts: accounts.map(Arc::new),
        }
    }

    /// The account service, or `PAYMENTS_DISABLED` when not configured
    pub fn accounts(&self) -> Result<&AccountService, PaymentError> {
        self.accounts
            .as_deref()
            .ok_or_else(|| PaymentError::Config("Payments not configured".into()))
    }
}
