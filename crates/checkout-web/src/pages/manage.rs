//! Manage Cards Page

use leptos::prelude::*;

use checkout_core::Status;

use crate::api;
use crate::components::{NewCardForm, PaymentMethodList, advance, settle};
use crate::session::SessionHandle;
use crate::stripe_js;

#[component]
pub fn ManageCardsPage(session: SessionHandle) -> impl IntoView {
    let status = RwSignal::new(Status::Idle);
    // Remove and set default share one status; a second click waits for the first
    let action_status = RwSignal::new(Status::Idle);
    let action_error = RwSignal::new(None::<String>);

    let payment_methods = Memo::new(move |_| {
        session.with(|state| {
            state
                .user()
                .map(|user| user.payment_methods.clone())
                .unwrap_or_default()
        })
    });
    let default_id = Memo::new(move |_| {
        session.with(|state| {
            state
                .user()
                .and_then(|user| user.customer.default_payment_method())
                .map(str::to_owned)
        })
    });

    let dangling_default = Memo::new(move |_| {
        session.with(|state| state.user().is_some_and(checkout_core::User::has_dangling_default))
    });

    let remove = Callback::new(move |payment_method_id: String| {
        if !advance(action_status, Status::restart) {
            return;
        }
        action_error.set(None);
        leptos::task::spawn_local(async move {
            let outcome = match api::detach_payment_method(&payment_method_id).await {
                Ok(_) => session.detached(&payment_method_id),
                Err(e) => Err(e),
            };
            action_error.set(outcome.as_ref().err().cloned());
            settle(action_status, &outcome);
        });
    });

    let set_default = Callback::new(move |payment_method_id: String| {
        let Some(customer_id) = session.with_untracked(|state| state.customer_id().map(str::to_owned))
        else {
            return;
        };
        if !advance(action_status, Status::restart) {
            return;
        }
        action_error.set(None);
        leptos::task::spawn_local(async move {
            let outcome = match api::set_default_payment_method(&customer_id, &payment_method_id).await {
                Ok(user) => session.replace(user),
                Err(e) => Err(e),
            };
            action_error.set(outcome.as_ref().err().cloned());
            settle(action_status, &outcome);
        });
    });

    // Save the entered card through a setup intent, then attach it
    let add = Callback::new(move |()| {
        let Some(customer_id) = session.with_untracked(|state| state.customer_id().map(str::to_owned))
        else {
            return;
        };
        if !advance(status, Status::start) {
            return;
        }

        leptos::task::spawn_local(async move {
            let outcome = async {
                let secret = api::create_setup_intent().await?.into_client_secret()?;
                let payment_method_id = stripe_js::confirm_card_setup(&secret).await?;
                let user = api::attach_payment_method(&customer_id, &payment_method_id).await?;
                session.replace(user)
            }
            .await;
            settle(status, &outcome);
        });
    });

    view! {
        <div class="manage-cards">
            <h2>"Manage payment methods"</h2>
            {move || action_error.get().map(|e| view! { <p class="error">{e}</p> })}
            <Show
                when=move || session.customer_id().is_some()
                fallback=|| view! { <p>"Select a customer to manage their cards."</p> }
            >
                <Show when=move || dangling_default.get()>
                    <p class="notice">"The default card was removed. The newest card is used instead."</p>
                </Show>
                <PaymentMethodList
                    payment_methods=payment_methods
                    default_id=default_id
                    on_remove=remove
                    on_set_default=set_default
                    busy=Signal::derive(move || action_status.get() == Status::Loading)
                />
                <div class="add-payment-method">
                    <h5>"Add payment method"</h5>
                    <NewCardForm status=status on_submit=add />
                </div>
            </Show>
        </div>
    }
}
