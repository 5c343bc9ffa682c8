//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::components::CustomerSelect;
use crate::pages::{CheckoutPage, ManageCardsPage};
use crate::session::SessionHandle;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let session = SessionHandle::new();

    view! {
        <Router>
            <nav class="nav">
                <ul>
                    <li><A href="/checkout">"Checkout"</A></li>
                    <li><A href="/manage-cards">"Manage Card"</A></li>
                    <li id="impersonate-user"><CustomerSelect session=session /></li>
                </ul>
            </nav>
            <main class="layout">
                <Routes fallback=move || view! { <CheckoutPage session=session /> }>
                    <Route path=path!("/") view=move || view! { <CheckoutPage session=session /> } />
                    <Route path=path!("/checkout") view=move || view! { <CheckoutPage session=session /> } />
                    <Route
                        path=path!("/manage-cards")
                        view=move || view! { <ManageCardsPage session=session /> }
                    />
                </Routes>
            </main>
        </Router>
    }
}
