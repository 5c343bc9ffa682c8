//! Client Session State
//!
//! The "currently impersonated customer" as the frontend sees it. All
//! changes go through the transition methods below so the local copy only
//! ever holds something the server returned, or the one local edit the
//! server does not echo back (detach).

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{PaymentMethod, User};
use crate::selection::select_payment_method;
use crate::status::Status;

/// How checkout should proceed for the current session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutMode<'a> {
    /// No customer selected: take an email and a new card, create a customer
    NewCustomer,

    /// Customer selected but without cards: take a new card and attach it
    NewCard { customer_id: &'a str },

    /// Pay with an existing card
    SavedCard {
        customer_id: &'a str,
        payment_method: &'a PaymentMethod,
    },
}

/// Single-user session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    user: Option<User>,

    /// Status of the customer lookup that follows a selection
    lookup: Status,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.user.as_ref().map(User::customer_id)
    }

    pub const fn lookup_status(&self) -> Status {
        self.lookup
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.lookup, Status::Loading)
    }

    pub const fn has_error(&self) -> bool {
        matches!(self.lookup, Status::Error)
    }

    /// A customer was picked and its snapshot is being fetched
    pub fn begin_lookup(&mut self) -> Result<()> {
        self.lookup = self.lookup.reset().start()?;
        Ok(())
    }

    /// The lookup returned: the snapshot becomes the session user
    pub fn select(&mut self, user: User) {
        tracing::debug!(customer_id = %user.customer.id, "Selected customer");
        self.user = Some(user);
        if self.lookup == Status::Loading {
            self.lookup = Status::Success;
        }
    }

    /// The lookup failed. The previous user, if any, stays in place.
    pub fn lookup_failed(&mut self) -> Result<()> {
        self.lookup = self.lookup.fail()?;
        Ok(())
    }

    /// "No customer" selected
    pub fn clear(&mut self) {
        tracing::debug!("Cleared session customer");
        self.user = None;
        self.lookup = self.lookup.reset();
    }

    /// Replace the user wholesale with a server snapshot.
    ///
    /// Used after create, attach and set-default. A snapshot for a
    /// different customer than the current one is refused.
    pub fn replace_snapshot(&mut self, user: User) -> Result<()> {
        if let Some(current) = &self.user {
            if current.customer.id != user.customer.id {
                return Err(CoreError::CustomerMismatch {
                    expected: current.customer.id.clone(),
                    received: user.customer.id,
                });
            }
        }
        tracing::debug!(
            customer_id = %user.customer.id,
            payment_methods = user.payment_methods.len(),
            "Replaced session snapshot"
        );
        self.user = Some(user);
        Ok(())
    }

    /// Mirror a successful detach locally: same customer, one card fewer.
    ///
    /// The default reference is left untouched, matching the server.
    pub fn apply_detached(&mut self, payment_method_id: &str) -> Result<()> {
        let user = self.user.as_ref().ok_or(CoreError::NoUser)?;
        let updated = user.without_payment_method(payment_method_id);
        tracing::debug!(
            customer_id = %updated.customer.id,
            payment_method_id,
            "Removed detached payment method"
        );
        self.user = Some(updated);
        Ok(())
    }

    /// Card to charge at checkout, derived fresh from the snapshot
    pub fn effective_payment_method(&self) -> Option<&PaymentMethod> {
        self.user.as_ref().and_then(select_payment_method)
    }

    pub fn checkout_mode(&self) -> CheckoutMode<'_> {
        match &self.user {
            None => CheckoutMode::NewCustomer,
            Some(user) => match select_payment_method(user) {
                Some(payment_method) => CheckoutMode::SavedCard {
                    customer_id: user.customer_id(),
                    payment_method,
                },
                None => CheckoutMode::NewCard {
                    customer_id: user.customer_id(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Customer;

    fn snapshot(customer_id: &str, default: Option<&str>, methods: &[(&str, i64)]) -> User {
        let mut customer = Customer::new(customer_id, "ada@example.com");
        customer.metadata.default_payment_method = default.map(String::from);
        User::new(
            customer,
            methods
                .iter()
                .map(|(id, created)| PaymentMethod::new(*id, *created).with_customer(customer_id))
                .collect(),
        )
    }

    #[test]
    fn test_lookup_flow() {
        let mut session = SessionState::new();
        session.begin_lookup().unwrap();
        assert!(session.is_loading());

        session.select(snapshot("cus_1", None, &[("pm_a", 100)]));
        assert_eq!(session.customer_id(), Some("cus_1"));
        assert_eq!(session.lookup_status(), Status::Success);
    }

    #[test]
    fn test_lookup_failure_then_retry() {
        let mut session = SessionState::new();
        session.begin_lookup().unwrap();
        session.lookup_failed().unwrap();
        assert!(session.has_error());
        assert!(session.user().is_none());

        session.begin_lookup().unwrap();
        assert!(session.is_loading());
    }

    #[test]
    fn test_clear_resets_to_new_customer() {
        let mut session = SessionState::new();
        session.select(snapshot("cus_1", None, &[("pm_a", 100)]));
        session.clear();

        assert!(session.user().is_none());
        assert_eq!(session.checkout_mode(), CheckoutMode::NewCustomer);
        assert!(session.effective_payment_method().is_none());
    }

    #[test]
    fn test_replace_snapshot_is_wholesale() {
        let mut session = SessionState::new();
        session.select(snapshot("cus_1", Some("pm_a"), &[("pm_a", 100)]));

        let after_attach = snapshot("cus_1", Some("pm_b"), &[("pm_a", 100), ("pm_b", 200)]);
        session.replace_snapshot(after_attach.clone()).unwrap();

        assert_eq!(session.user(), Some(&after_attach));
        assert_eq!(session.effective_payment_method().unwrap().id, "pm_b");
    }

    #[test]
    fn test_replace_snapshot_rejects_other_customer() {
        let mut session = SessionState::new();
        session.select(snapshot("cus_1", None, &[]));

        let err = session
            .replace_snapshot(snapshot("cus_2", None, &[]))
            .unwrap_err();
        assert!(matches!(err, CoreError::CustomerMismatch { .. }));
        assert_eq!(session.customer_id(), Some("cus_1"));
    }

    #[test]
    fn test_create_customer_sets_user() {
        let mut session = SessionState::new();
        session
            .replace_snapshot(snapshot("cus_new", Some("pm_a"), &[("pm_a", 100)]))
            .unwrap();
        assert_eq!(session.customer_id(), Some("cus_new"));
    }

    #[test]
    fn test_apply_detached_mirrors_server() {
        let mut session = SessionState::new();
        session.select(snapshot("cus_1", Some("pm_a"), &[("pm_a", 100), ("pm_b", 200), ("pm_c", 50)]));

        session.apply_detached("pm_a").unwrap();

        // What the server would now list, with the default left dangling
        let expected = snapshot("cus_1", Some("pm_a"), &[("pm_b", 200), ("pm_c", 50)]);
        assert_eq!(session.user(), Some(&expected));
        assert_eq!(session.effective_payment_method().unwrap().id, "pm_b");
    }

    #[test]
    fn test_apply_detached_without_user() {
        let mut session = SessionState::new();
        assert_eq!(session.apply_detached("pm_a"), Err(CoreError::NoUser));
    }

    #[test]
    fn test_checkout_modes() {
        let mut session = SessionState::new();
        session.select(snapshot("cus_1", None, &[]));
        assert_eq!(
            session.checkout_mode(),
            CheckoutMode::NewCard { customer_id: "cus_1" }
        );

        session
            .replace_snapshot(snapshot("cus_1", None, &[("pm_a", 100)]))
            .unwrap();
        match session.checkout_mode() {
            CheckoutMode::SavedCard { payment_method, .. } => assert_eq!(payment_method.id, "pm_a"),
            other => panic!("unexpected mode: {other:?}"),
        }
    }
}
