//! Effective Payment Method Selection
//!
//! Decides which card is offered at checkout for a customer. Call it on
//! every render; the result depends only on the snapshot passed in.

use crate::model::{PaymentMethod, User};

/// Pick the payment method to charge at checkout.
///
/// 1. No payment methods: `None`.
/// 2. Exactly one: that one, whatever the metadata says.
/// 3. The metadata default, if it is present in the list.
/// 4. Otherwise the most recently created; on equal timestamps the
///    earliest in list order wins.
pub fn select_payment_method(user: &User) -> Option<&PaymentMethod> {
    match user.payment_methods.as_slice() {
        [] => None,
        [only] => Some(only),
        methods => user
            .default_payment_method()
            .or_else(|| most_recent(methods)),
    }
}

fn most_recent(methods: &[PaymentMethod]) -> Option<&PaymentMethod> {
    methods
        .iter()
        .reduce(|latest, pm| if pm.created > latest.created { pm } else { latest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Customer;

    fn user(default: Option<&str>, methods: &[(&str, i64)]) -> User {
        let mut customer = Customer::new("cus_1", "ada@example.com");
        customer.metadata.default_payment_method = default.map(String::from);
        User::new(
            customer,
            methods
                .iter()
                .map(|(id, created)| PaymentMethod::new(*id, *created))
                .collect(),
        )
    }

    fn selected(user: &User) -> Option<&str> {
        select_payment_method(user).map(|pm| pm.id.as_str())
    }

    #[test]
    fn test_no_payment_methods() {
        assert_eq!(selected(&user(Some("pm_a"), &[])), None);
    }

    #[test]
    fn test_single_method_ignores_metadata() {
        assert_eq!(selected(&user(None, &[("pm_a", 100)])), Some("pm_a"));
        assert_eq!(selected(&user(Some("pm_other"), &[("pm_a", 100)])), Some("pm_a"));
    }

    #[test]
    fn test_default_wins_when_present() {
        let u = user(Some("pm_a"), &[("pm_a", 100), ("pm_b", 200)]);
        assert_eq!(selected(&u), Some("pm_a"));
    }

    #[test]
    fn test_most_recent_without_default() {
        let u = user(None, &[("pm_a", 100), ("pm_b", 200)]);
        assert_eq!(selected(&u), Some("pm_b"));

        let u = user(None, &[("pm_b", 200), ("pm_a", 100), ("pm_c", 150)]);
        assert_eq!(selected(&u), Some("pm_b"));
    }

    #[test]
    fn test_dangling_default_falls_back_to_most_recent() {
        let u = user(Some("pm_detached"), &[("pm_a", 300), ("pm_b", 200)]);
        assert_eq!(selected(&u), Some("pm_a"));
    }

    #[test]
    fn test_tie_goes_to_first_in_list() {
        let u = user(None, &[("pm_a", 200), ("pm_b", 200), ("pm_c", 100)]);
        assert_eq!(selected(&u), Some("pm_a"));
    }
}
