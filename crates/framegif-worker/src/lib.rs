//! Web worker entry point for framegif animation encoding.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives PNG frames and an `EncodeRequest` via
//! `postMessage`, calls `framegif_export::run_job`, and posts every
//! event back.
//!
//! Frames and the finished GIF travel as raw `Uint8Array` buffers; the
//! request and the events are small JSON strings.
//!
//! Encoding in a worker keeps the plugin UI responsive while large
//! frames are quantized.

use framegif_export::{EncodeEvent, EncodeRequest};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Message protocol: the main thread sends a JS object with:
/// - `frames`: `Array` of `Uint8Array`, one PNG per frame, in order
/// - `requestJson`: `String` containing a JSON-serialized `EncodeRequest`
/// - `generation`: `f64` job counter (passed through to every response)
///
/// The worker answers with any number of objects carrying:
/// - `generation`: `f64` matching the request
/// - `eventJson`: `String` containing a JSON-serialized `EncodeEvent`
/// - `gif`: `Uint8Array`, only on the `finished` event
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() else {
        web_sys::console::error_1(&"not running in a DedicatedWorkerGlobalScope".into());
        return;
    };

    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&event.data());
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // lives for the worker lifetime
}

fn handle_message(data: &JsValue) {
    let generation = get(data, "generation")
        .and_then(|v| v.as_f64())
        .unwrap_or(-1.0);

    let frames = match read_frames(data) {
        Ok(frames) => frames,
        Err(message) => {
            post_event(generation, &EncodeEvent::Failed { message }, None);
            return;
        }
    };
    let request: EncodeRequest = match get(data, "requestJson")
        .and_then(|v| v.as_string())
        .ok_or_else(|| "missing requestJson".to_owned())
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(e) => {
            let message = format!("failed to parse request: {e}");
            post_event(generation, &EncodeEvent::Failed { message }, None);
            return;
        }
    };

    // Synchronous; blocks this worker thread only.
    let outcome = framegif_export::run_job(&frames, &request, |event| {
        post_event(generation, &event, None);
    });

    match outcome {
        Ok(gif) => post_event(
            generation,
            &EncodeEvent::Finished { size: gif.len() },
            Some(&gif),
        ),
        Err(e) => post_event(
            generation,
            &EncodeEvent::Failed {
                message: e.to_string(),
            },
            None,
        ),
    }
}

fn get(data: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(data, &JsValue::from_str(key)).ok()
}

fn read_frames(data: &JsValue) -> Result<Vec<Vec<u8>>, String> {
    let frames: js_sys::Array = get(data, "frames")
        .and_then(|v| v.dyn_into().ok())
        .ok_or_else(|| "frames is not an array".to_owned())?;
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            frame
                .dyn_into::<js_sys::Uint8Array>()
                .map(|buf| buf.to_vec())
                .map_err(|_| format!("frame {i} is not a Uint8Array"))
        })
        .collect()
}

/// Post one event back to the main thread.
fn post_event(generation: f64, event: &EncodeEvent, gif: Option<&[u8]>) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!(r#"{{"kind":"failed","message":"serialization error: {e}"}}"#));

    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        let _ = js_sys::Reflect::set(&response, &JsValue::from_str(key), val);
    };
    set("generation", &JsValue::from_f64(generation));
    set("eventJson", &JsValue::from_str(&event_json));
    if let Some(gif) = gif {
        set("gif", &js_sys::Uint8Array::from(gif));
    }

    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(&response);
    }
}
