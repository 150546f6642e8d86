//! The page side of the host/UI message channel.
//!
//! The UI runs in an iframe. Outgoing messages are posted to
//! `window.parent` wrapped as `{ pluginMessage: <message> }`; incoming
//! ones arrive as `message` events carrying the same envelope. Events
//! without a `pluginMessage` (devtools, extensions) are ignored.

use log::{debug, warn};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use framegif_core::{HostMessage, ProtocolError, UiMessage};

/// Errors that can occur while talking to the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BridgeError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    plugin_message: &'a UiMessage,
}

/// Serialize `message` inside a `pluginMessage` envelope.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if serialization fails.
pub fn encode_envelope(message: &UiMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(&Envelope {
        plugin_message: message,
    })?)
}

/// Extract the host message from a `message` event payload.
///
/// Returns `Ok(None)` for payloads that are not plugin envelopes.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the envelope holds something
/// that is not a valid [`HostMessage`].
pub fn decode_envelope(json: &str) -> Result<Option<HostMessage>, ProtocolError> {
    let serde_json::Value::Object(mut data) = serde_json::from_str(json)? else {
        return Ok(None);
    };
    match data.remove("pluginMessage") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(message) => Ok(Some(serde_json::from_value(message)?)),
    }
}

/// Post a message to the host.
///
/// # Errors
///
/// Returns [`BridgeError`] if there is no parent window or posting
/// fails.
pub fn post_to_host(message: &UiMessage) -> Result<(), BridgeError> {
    let window = web_sys::window().ok_or_else(|| BridgeError::JsError("no global window".into()))?;
    let parent = window
        .parent()?
        .ok_or_else(|| BridgeError::JsError("no parent window".into()))?;
    let envelope = js_sys::JSON::parse(&encode_envelope(message)?)?;
    debug!("posting {} to host", message.kind());
    parent.post_message(&envelope, "*")?;
    Ok(())
}

/// A `message` event listener that decodes host messages.
///
/// The listener is removed when this value is dropped.
pub struct HostListener {
    window: web_sys::Window,
    callback: Closure<dyn FnMut(web_sys::MessageEvent)>,
}

impl HostListener {
    /// Start listening; `on_message` runs for every decoded host message.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::JsError`] if the listener cannot be
    /// registered.
    pub fn install<F>(mut on_message: F) -> Result<Self, BridgeError>
    where
        F: FnMut(HostMessage) + 'static,
    {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::JsError("no global window".into()))?;

        // Structured clone keeps `success` payloads as Uint8Array, which
        // JSON.stringify would turn into an index-keyed object.
        let replacer = Closure::<dyn FnMut(JsValue, JsValue) -> JsValue>::new(
            |_key: JsValue, value: JsValue| {
                if value.is_instance_of::<js_sys::Uint8Array>() {
                    js_sys::Array::from(&value).into()
                } else {
                    value
                }
            },
        );

        let callback = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let Ok(json) = js_sys::JSON::stringify_with_replacer(
                    &event.data(),
                    replacer.as_ref().unchecked_ref(),
                ) else {
                    return;
                };
                match decode_envelope(&String::from(json)) {
                    Ok(Some(message)) => on_message(message),
                    Ok(None) => debug!("ignoring non-plugin message event"),
                    Err(e) => warn!("dropping host message: {e}"),
                }
            },
        );
        window.add_event_listener_with_callback("message", callback.as_ref().unchecked_ref())?;

        Ok(Self { window, callback })
    }
}

impl Drop for HostListener {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.callback.as_ref().unchecked_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use framegif_core::{AnimationFormat, ConvertRequest, NodeId};

    use super::*;

    #[test]
    fn outgoing_messages_are_wrapped() {
        let json = encode_envelope(&UiMessage::RefreshFrames).unwrap();
        assert_eq!(json, r#"{"pluginMessage":{"type":"refresh-frames"}}"#);

        let json = encode_envelope(&UiMessage::Convert(ConvertRequest {
            format: AnimationFormat::Gif,
            frame_delay: 200,
            frame_ids: vec![NodeId::new("2:1")],
        }))
        .unwrap();
        assert!(json.starts_with(r#"{"pluginMessage":{"type":"convert""#));
    }

    #[test]
    fn incoming_envelope_is_unwrapped() {
        let message =
            decode_envelope(r#"{"pluginMessage":{"type":"error","message":"boom"}}"#).unwrap();
        assert_eq!(message, Some(HostMessage::error("boom")));
    }

    #[test]
    fn foreign_payloads_are_ignored() {
        for json in [r#""hello""#, "42", r#"{"source":"devtools"}"#, r#"{"pluginMessage":null}"#] {
            assert_eq!(decode_envelope(json).unwrap(), None, "{json}");
        }
    }

    #[test]
    fn unknown_message_type_is_an_error() {
        assert!(decode_envelope(r#"{"pluginMessage":{"type":"process-frames"}}"#).is_err());
    }
}
