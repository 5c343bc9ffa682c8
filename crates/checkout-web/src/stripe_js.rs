//! Stripe.js Bindings
//!
//! Minimal `wasm-bindgen` imports for the parts of Stripe.js the pages use:
//! one card Element and the three confirm calls. Stripe.js itself is loaded
//! by a `<script>` tag in `index.html`.

use std::cell::{Cell, RefCell};

use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config;

#[wasm_bindgen]
extern "C" {
    type StripeJs;

    #[wasm_bindgen(js_name = Stripe, catch)]
    fn init_stripe(publishable_key: &str) -> Result<StripeJs, JsValue>;

    #[wasm_bindgen(method)]
    fn elements(this: &StripeJs) -> Elements;

    #[wasm_bindgen(method, js_name = confirmCardPayment)]
    fn confirm_card_payment(this: &StripeJs, client_secret: &str, data: &JsValue) -> Promise;

    #[wasm_bindgen(method, js_name = confirmCardSetup)]
    fn confirm_card_setup(this: &StripeJs, client_secret: &str, data: &JsValue) -> Promise;

    type Elements;

    #[wasm_bindgen(method)]
    fn create(this: &Elements, kind: &str, options: &JsValue) -> CardElement;

    #[derive(Clone)]
    type CardElement;

    #[wasm_bindgen(method)]
    fn mount(this: &CardElement, selector: &str);

    #[wasm_bindgen(method)]
    fn destroy(this: &CardElement);

    #[wasm_bindgen(method)]
    fn update(this: &CardElement, options: &JsValue);
}

thread_local! {
    static STRIPE: RefCell<Option<StripeJs>> = const { RefCell::new(None) };
    static CARD: RefCell<Option<(u32, CardElement)>> = const { RefCell::new(None) };
    static NEXT_TOKEN: Cell<u32> = const { Cell::new(0) };
}

/// Identifies one mounted card Element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardToken(u32);

fn object(entries: &[(&str, &JsValue)]) -> Result<JsValue, String> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).map_err(js_error)?;
    }
    Ok(object.into())
}

fn js_error(value: JsValue) -> String {
    Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "Stripe.js call failed".into())
}

fn with_stripe<T>(f: impl FnOnce(&StripeJs) -> T) -> Result<T, String> {
    STRIPE.with(|cell| {
        let mut stripe = cell.borrow_mut();
        if stripe.is_none() {
            let key = config::stripe_key().ok_or("Missing Stripe publishable key")?;
            *stripe = Some(init_stripe(&key).map_err(js_error)?);
        }
        stripe.as_ref().map(f).ok_or_else(|| "Stripe.js not loaded".into())
    })
}

fn current_card() -> Result<CardElement, String> {
    CARD.with(|cell| cell.borrow().as_ref().map(|(_, card)| card.clone()))
        .ok_or_else(|| "No card form on this page".into())
}

/// Mount a card Element into `selector`, replacing any previous one
pub fn mount_card(selector: &str) -> Result<CardToken, String> {
    let style = JsValue::from_str("#fff");
    let base = object(&[("color", &style), ("fontSize", &JsValue::from_str("16px"))])?;
    let options = object(&[("style", &object(&[("base", &base)])?)])?;

    let card = with_stripe(|stripe| stripe.elements().create("card", &options))?;
    card.mount(selector);

    let token = NEXT_TOKEN.with(|next| {
        let token = next.get().wrapping_add(1);
        next.set(token);
        token
    });
    CARD.with(|cell| {
        if let Some((_, previous)) = cell.borrow_mut().replace((token, card)) {
            previous.destroy();
        }
    });
    Ok(CardToken(token))
}

/// Destroy the card Element if it is still the one `token` mounted
pub fn unmount_card(token: CardToken) {
    CARD.with(|cell| {
        let mut current = cell.borrow_mut();
        if current.as_ref().is_some_and(|(id, _)| *id == token.0) {
            if let Some((_, card)) = current.take() {
                card.destroy();
            }
        }
    });
}

pub fn set_card_disabled(disabled: bool) {
    if let (Ok(card), Ok(options)) = (
        current_card(),
        object(&[("disabled", &JsValue::from_bool(disabled))]),
    ) {
        card.update(&options);
    }
}

/// Await a confirm promise and pull `field` out of the result
async fn confirm(promise: Promise, field: &str) -> Result<JsValue, String> {
    let result = JsFuture::from(promise).await.map_err(js_error)?;

    let error = Reflect::get(&result, &JsValue::from_str("error")).map_err(js_error)?;
    if !error.is_undefined() && !error.is_null() {
        return Err(js_error(error));
    }
    Reflect::get(&result, &JsValue::from_str(field)).map_err(js_error)
}

fn payment_method_id(intent: &JsValue) -> Result<String, String> {
    Reflect::get(intent, &JsValue::from_str("payment_method"))
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| "Intent has no payment method".into())
}

/// Charge a saved card
pub async fn confirm_saved_card_payment(client_secret: &str, payment_method_id: &str) -> Result<(), String> {
    let data = object(&[("payment_method", &JsValue::from_str(payment_method_id))])?;
    let promise = with_stripe(|stripe| stripe.confirm_card_payment(client_secret, &data))?;
    confirm(promise, "paymentIntent").await.map(|_| ())
}

/// Charge the card in the mounted Element and keep it for later on-session use.
///
/// Returns the id of the payment method Stripe created for the card.
pub async fn confirm_new_card_payment(client_secret: &str, email: &str) -> Result<String, String> {
    let card: JsValue = current_card()?.into();
    let billing_details = object(&[("email", &JsValue::from_str(email))])?;
    let payment_method = object(&[("card", &card), ("billing_details", &billing_details)])?;
    let data = object(&[
        ("payment_method", &payment_method),
        ("setup_future_usage", &JsValue::from_str("on_session")),
    ])?;

    let promise = with_stripe(|stripe| stripe.confirm_card_payment(client_secret, &data))?;
    let intent = confirm(promise, "paymentIntent").await?;
    payment_method_id(&intent)
}

/// Save the card in the mounted Element without charging it
pub async fn confirm_card_setup(client_secret: &str) -> Result<String, String> {
    let card: JsValue = current_card()?.into();
    let data = object(&[("payment_method", &object(&[("card", &card)])?)])?;

    let promise = with_stripe(|stripe| stripe.confirm_card_setup(client_secret, &data))?;
    let intent = confirm(promise, "setupIntent").await?;
    payment_method_id(&intent)
}
