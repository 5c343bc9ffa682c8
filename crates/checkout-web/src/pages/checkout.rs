//! Checkout Page

use leptos::prelude::*;
use leptos_router::components::A;

use checkout_core::{CheckoutMode, PaymentMethod, Price, Status};

use crate::api;
use crate::components::{ConfirmPaymentButton, NewCardForm, advance, settle};
use crate::session::SessionHandle;
use crate::stripe_js;

#[component]
pub fn CheckoutPage(session: SessionHandle) -> impl IntoView {
    let price = RwSignal::new(None::<Price>);
    let client_secret = RwSignal::new(None::<String>);
    let status = RwSignal::new(Status::Idle);
    let email = RwSignal::new(String::new());

    leptos::task::spawn_local(async move {
        match api::widget_price().await {
            Ok(widget_price) => price.set(Some(widget_price)),
            Err(e) => leptos::logging::error!("Failed to load price: {e}"),
        }
    });

    // Intents are keyed on who pays and with which card, not on the whole session
    let intent_key = Memo::new(move |_| {
        session.with(|state| {
            (
                state.customer_id().map(str::to_owned),
                state.effective_payment_method().map(|pm| pm.id.clone()),
            )
        })
    });
    // Bumped per request; a response for an older key is dropped
    let intent_request = StoredValue::new(0_u64);

    Effect::new(move |_| {
        let (customer_id, payment_method_id) = intent_key.get();
        client_secret.set(None);
        intent_request.update_value(|n| *n += 1);
        let request = intent_request.get_value();

        leptos::task::spawn_local(async move {
            let intent = api::create_payment_intent(
                customer_id.as_deref(),
                payment_method_id.as_deref(),
            )
            .await
            .and_then(api::Intent::into_client_secret);
            if intent_request.get_value() != request {
                return;
            }
            match intent {
                Ok(secret) => client_secret.set(Some(secret)),
                Err(e) => leptos::logging::error!("Failed to create payment intent: {e}"),
            }
        });
    });

    let saved_card = Memo::new(move |_| {
        session.with(|state| match state.checkout_mode() {
            CheckoutMode::SavedCard { payment_method, .. } => Some(payment_method.clone()),
            CheckoutMode::NewCard { .. } | CheckoutMode::NewCustomer => None,
        })
    });
    let new_customer =
        Memo::new(move |_| session.with(|state| state.checkout_mode() == CheckoutMode::NewCustomer));

    let pay = Callback::new(move |payment_method_id: String| {
        if !advance(status, Status::start) {
            return;
        }
        let secret = client_secret.get_untracked();

        leptos::task::spawn_local(async move {
            let outcome = match secret {
                Some(secret) => {
                    stripe_js::confirm_saved_card_payment(&secret, &payment_method_id).await
                }
                None => Err("Payment is not ready yet".to_string()),
            };
            settle(status, &outcome);
        });
    });

    // New card: charge it, then save it on the current customer or a new one
    let setup_card = Callback::new(move |()| {
        if !advance(status, Status::start) {
            return;
        }
        let secret = client_secret.get_untracked();
        let customer_id = session.with_untracked(|state| state.customer_id().map(str::to_owned));
        let email = email.get_untracked();

        leptos::task::spawn_local(async move {
            let outcome = async {
                let secret = secret.ok_or("Payment is not ready yet")?;
                let payment_method_id = stripe_js::confirm_new_card_payment(&secret, &email).await?;
                let user = match customer_id {
                    Some(customer_id) => {
                        api::attach_payment_method(&customer_id, &payment_method_id).await?
                    }
                    None => api::create_customer(&email, &payment_method_id).await?,
                };
                session.replace(user)
            }
            .await;
            settle(status, &outcome);
        });
    });

    let heading = move || {
        price
            .get()
            .map_or_else(|| "Purchase widget".to_string(), |p| format!("Purchase widget for {p}"))
    };

    let body = move || {
        if session.is_loading() {
            return view! { <h1>"Loading"</h1> }.into_any();
        }
        if session.has_error() {
            return view! { <h1>"Error"</h1> }.into_any();
        }

        match saved_card.get() {
            Some(payment_method) => {
                view! { <CheckoutAsUser payment_method=payment_method status=status on_pay=pay /> }
                    .into_any()
            }
            None if new_customer.get() => {
                view! { <NewCardForm status=status email=email on_submit=setup_card /> }.into_any()
            }
            None => view! { <NewCardForm status=status on_submit=setup_card /> }.into_any(),
        }
    };

    view! {
        <div class="checkout">
            <h2>{heading}</h2>
            {body}
        </div>
    }
}

#[component]
fn CheckoutAsUser(
    payment_method: PaymentMethod,
    #[prop(into)] status: Signal<Status>,
    #[prop(into)] on_pay: Callback<String>,
) -> impl IntoView {
    let payment_method_id = payment_method.id.clone();

    view! {
        <form on:submit=move |ev| {
            ev.prevent_default();
            on_pay.run(payment_method_id.clone());
        }>
            <p class="checkout-description">
                "Pay using " {payment_method.description()} " or "
                <A href="/manage-cards">"change card"</A>
            </p>
            <ConfirmPaymentButton status=status />
        </form>
    }
}
