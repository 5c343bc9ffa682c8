//! # checkout-payments
//!
//! Customer and payment method management for the widget checkout.
//!
//! ## Default Payment Methods
//!
//! The processor stores customers and their attached cards but has no
//! notion of a default card for one-off payments. [`AccountService`] keeps
//! one in customer metadata:
//!
//! ```text
//! create customer ──▶ default = first card
//! attach card     ──▶ default = new card (always)
//! set default     ──▶ default = chosen card (must differ from current)
//! detach card     ──▶ default untouched (may now dangle)
//! ```
//!
//! Readers never trust the reference blindly: the checkout selection rule
//! in `checkout-core` ignores a default that is not in the customer's list.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_payments::{AccountService, StripeProcessor};
//!
//! let accounts = AccountService::new(Arc::new(StripeProcessor::new("sk_test_xxx")));
//!
//! let user = accounts.create_customer("ada@example.com", "pm_xxx").await?;
//! let user = accounts.attach_payment_method(&user.customer.id, "pm_yyy").await?;
//! ```

mod account;
mod config;
mod error;
mod pricing;
pub mod processor;

pub use account::{AccountService, DEFAULT_TIMEOUT};
pub use config::{ProcessorConfig, ProcessorKind};
pub use error::{ErrorKind, ErrorResponse, PaymentError, Result};
pub use pricing::{Product, product_price};
pub use processor::{
    IntentUsage, MemoryProcessor, PaymentIntent, PaymentProcessor, SetupIntent, StripeProcessor,
};
