//! Page Components

mod checkout;
mod manage;

pub use checkout::CheckoutPage;
pub use manage::ManageCardsPage;
