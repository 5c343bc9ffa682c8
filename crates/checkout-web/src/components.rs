//! UI Components

use leptos::prelude::*;

use checkout_core::{PaymentMethod, Status};

use crate::api;
use crate::session::SessionHandle;
use crate::stripe_js;

/// Apply a status transition; refused transitions leave the status as is
pub fn advance(
    status: RwSignal<Status>,
    next: impl FnOnce(Status) -> checkout_core::Result<Status>,
) -> bool {
    match next(status.get_untracked()) {
        Ok(to) => {
            status.set(to);
            true
        }
        Err(e) => {
            leptos::logging::warn!("{e}");
            false
        }
    }
}

/// End a `Loading` action with its outcome
pub fn settle<T>(status: RwSignal<Status>, outcome: &Result<T, String>) {
    if let Err(e) = outcome {
        leptos::logging::error!("{e}");
    }
    advance(status, |current| current.finish(outcome));
}

/// Submit button whose label follows the action status
#[component]
pub fn ConfirmPaymentButton(#[prop(into)] status: Signal<Status>) -> impl IntoView {
    let label = move || match status.get() {
        Status::Idle => "Confirm",
        Status::Loading => "Processing...",
        Status::Success => "Success",
        Status::Error => "Something Went Wrong",
    };

    view! {
        <button
            type="submit"
            class=move || format!("confirm-payment {}", status.get().as_str())
            disabled=move || !status.get().is_idle()
        >
            {label}
        </button>
    }
}

/// Mount point for the Stripe card Element
#[component]
pub fn CardSection(#[prop(into)] disabled: Signal<bool>) -> impl IntoView {
    let (mount_error, set_mount_error) = signal(None::<String>);
    let token = StoredValue::new(None::<stripe_js::CardToken>);

    // Mount once the element is in the DOM, then follow `disabled`
    Effect::new(move |mounted: Option<bool>| {
        if mounted != Some(true) {
            match stripe_js::mount_card("#card-element") {
                Ok(mounted) => token.set_value(Some(mounted)),
                Err(e) => set_mount_error.set(Some(e)),
            }
        }
        stripe_js::set_card_disabled(disabled.get());
        true
    });

    on_cleanup(move || {
        if let Some(mounted) = token.try_get_value().flatten() {
            stripe_js::unmount_card(mounted);
        }
    });

    view! {
        <label class="card-section">
            <div id="card-element" class="card-element"></div>
            {move || mount_error.get().map(|e| view! { <p class="error">{e}</p> })}
        </label>
    }
}

/// Card entry form, with an email field when a customer is to be created
#[component]
pub fn NewCardForm(
    #[prop(into)] status: Signal<Status>,
    #[prop(optional)] email: Option<RwSignal<String>>,
    #[prop(into)] on_submit: Callback<()>,
) -> impl IntoView {
    let busy = Signal::derive(move || !status.get().is_idle());

    view! {
        <form
            class=move || if busy.get() { "busy" } else { "idle" }
            on:submit=move |ev| {
                ev.prevent_default();
                on_submit.run(());
            }
        >
            {email.map(|email| view! {
                <input
                    class="text-input"
                    type="email"
                    required
                    placeholder="Email"
                    disabled=move || busy.get()
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
            })}
            <CardSection disabled=busy />
            <ConfirmPaymentButton status=status />
        </form>
    }
}

/// Saved cards with remove and set-default actions
#[component]
pub fn PaymentMethodList(
    #[prop(into)] payment_methods: Signal<Vec<PaymentMethod>>,
    #[prop(into)] default_id: Signal<Option<String>>,
    #[prop(into)] on_remove: Callback<String>,
    #[prop(into)] on_set_default: Callback<String>,
    /// Disables every action while one is running
    #[prop(optional, into)]
    busy: Signal<bool>,
) -> impl IntoView {
    view! {
        <div class="paymentmethod-list">
            <For
                each=move || payment_methods.get()
                key=|pm| pm.id.clone()
                children=move |pm| {
                    let id = pm.id.clone();
                    let remove_id = id.clone();
                    let default_pm_id = id.clone();
                    let is_default = move || default_id.get().as_deref() == Some(id.as_str());
                    let expiry = pm.card.as_ref().map(|card| format!("(expiry: {})", card.expiry()));
                    let added = pm
                        .created_at()
                        .map(|at| format!("added {}", at.format("%d %b %Y")));

                    view! {
                        <div class="paymentmethod">
                            <span class="description">
                                {pm.description()}
                                " "
                                <span class="expiry">{expiry}</span>
                                " "
                                <span class="created">{added}</span>
                            </span>
                            <span class="actions">
                                <button
                                    disabled=move || busy.get()
                                    on:click=move |_| on_remove.run(remove_id.clone())
                                >
                                    "Remove"
                                </button>
                                <button
                                    disabled=move || busy.get() || is_default()
                                    on:click=move |_| on_set_default.run(default_pm_id.clone())
                                >
                                    "Set default"
                                </button>
                            </span>
                        </div>
                    }
                }
            />
        </div>
    }
}

/// Customer impersonation selector
#[component]
pub fn CustomerSelect(session: SessionHandle) -> impl IntoView {
    let customers = RwSignal::new(Vec::new());

    // Reload when the session holds a customer the list has not seen,
    // e.g. one created at checkout
    Effect::new(move |_| {
        let current = session.customer_id();
        let known = current.as_ref().is_none_or(|id| {
            customers.with_untracked(|list: &Vec<checkout_core::Customer>| {
                list.iter().any(|customer| &customer.id == id)
            })
        });
        if known && !customers.with_untracked(Vec::is_empty) {
            return;
        }
        leptos::task::spawn_local(async move {
            match api::list_customers().await {
                Ok(list) => customers.set(list),
                Err(e) => leptos::logging::error!("Failed to list customers: {e}"),
            }
        });
    });

    let on_change = move |ev| {
        let value = event_target_value(&ev);
        if value.is_empty() {
            session.clear();
        } else {
            session.select_customer(value);
        }
    };

    view! {
        <select
            prop:value=move || session.customer_id().unwrap_or_default()
            on:change=on_change
        >
            <option value="">"Select a user to impersonate"</option>
            <For
                each=move || customers.get()
                key=|customer| customer.id.clone()
                children=move |customer| {
                    view! { <option value=customer.id.clone()>{customer.label().to_string()}</option> }
                }
            />
        </select>
    }
}
