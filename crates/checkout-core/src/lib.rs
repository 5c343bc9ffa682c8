//! # checkout-core
//!
//! Types and rules shared by the checkout server and the web frontend.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────┐        ┌────────────────────────────┐
//! │     checkout-web (WASM)    │        │   checkout-server (axum)   │
//! │  ┌──────────────────────┐  │  HTTP  │  ┌──────────────────────┐  │
//! │  │     SessionState     │◀─┼────────┼──│    AccountService    │  │
//! │  │  select_payment_...  │  │  User  │  │  (checkout-payments) │  │
//! │  └──────────────────────┘  │        │  └──────────────────────┘  │
//! └────────────────────────────┘        └────────────────────────────┘
//! ```
//!
//! The server always answers a mutation with a full [`User`] snapshot
//! (except detach), and the client replaces its local copy wholesale.
//! Which card is offered at checkout is derived on demand by
//! [`select_payment_method`].

pub mod error;
pub mod model;
pub mod price;
pub mod selection;
pub mod session;
pub mod status;

pub use error::{CoreError, Result};
pub use model::{Card, Customer, CustomerMetadata, PaymentMethod, User, DEFAULT_PAYMENT_METHOD_KEY};
pub use price::Price;
pub use selection::select_payment_method;
pub use session::{CheckoutMode, SessionState};
pub use status::Status;
