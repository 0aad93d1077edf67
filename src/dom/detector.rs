//! JsRemoteDetector: RemoteDetector backed by host-supplied JS functions
//!
//! Both functions may return a value or a Promise. Payloads may be wrapped in
//! a `{ success, error }` envelope; `success: false` is a failure.

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::annotate::{GrammarReport, RemoteDetector, RewriteMode, RewriteReport};
use crate::error::RemoteError;

pub struct JsRemoteDetector {
    check_grammar: Function,
    rewrite_text: Function,
}

impl JsRemoteDetector {
    pub fn new(check_grammar: Function, rewrite_text: Function) -> Self {
        Self {
            check_grammar,
            rewrite_text,
        }
    }
}

fn describe(err: JsValue) -> RemoteError {
    let message = err
        .as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", err));
    RemoteError::from_message(&message)
}

async fn settle(call: Result<JsValue, JsValue>) -> Result<JsValue, RemoteError> {
    let value = call.map_err(describe)?;
    let value = if value.is_instance_of::<Promise>() {
        JsFuture::from(Promise::from(value)).await.map_err(describe)?
    } else {
        value
    };

    if value.is_object() {
        let success = Reflect::get(&value, &JsValue::from_str("success")).ok().and_then(|s| s.as_bool());
        if success == Some(false) {
            let message = Reflect::get(&value, &JsValue::from_str("error"))
                .ok()
                .and_then(|e| e.as_string())
                .unwrap_or_else(|| "request failed".to_string());
            return Err(RemoteError::from_message(&message));
        }
    }
    Ok(value)
}

impl RemoteDetector for JsRemoteDetector {
    fn check_grammar(&self, text: &str) -> LocalBoxFuture<'static, Result<GrammarReport, RemoteError>> {
        let call = self.check_grammar.call1(&JsValue::NULL, &JsValue::from_str(text));
        async move {
            let value = settle(call).await?;
            serde_wasm_bindgen::from_value(value).map_err(|e| RemoteError::Malformed(e.to_string()))
        }
        .boxed_local()
    }

    fn rewrite_text(&self, text: &str, modes: &[RewriteMode]) -> LocalBoxFuture<'static, Result<RewriteReport, RemoteError>> {
        let call = serde_wasm_bindgen::to_value(modes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
            .and_then(|modes| self.rewrite_text.call2(&JsValue::NULL, &JsValue::from_str(text), &modes));
        async move {
            let value = settle(call).await?;
            serde_wasm_bindgen::from_value(value).map_err(|e| RemoteError::Malformed(e.to_string()))
        }
        .boxed_local()
    }
}
