//! Web worker communication for off-main-thread GIF encoding.
//!
//! [`EncoderWorker`] wraps a `web_sys::Worker` running the
//! `framegif-worker` WASM module. It sends the PNG frames as raw
//! `Uint8Array` buffers plus a JSON [`EncodeRequest`], forwards progress
//! events while the worker runs, and resolves with the GIF bytes.
//!
//! The worker is created from embedded JS + WASM blobs, so no extra
//! static files need to be served by the dev server.

use std::cell::RefCell;
use std::rc::Rc;

use framegif_core::EncodeProgress;
use framegif_export::{EncodeEvent, EncodeRequest};
use log::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Errors from running a job in the encoder worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker could not be created or messaged.
    #[error("encoder worker unavailable: {0}")]
    Spawn(String),

    /// The worker crashed or was terminated.
    #[error("encoder worker error: {0}")]
    Worker(String),

    /// The encoder inside the worker failed.
    #[error("{0}")]
    Encode(String),

    /// The worker sent a message we could not understand.
    #[error("malformed worker response: {0}")]
    Protocol(String),
}

type Outcome = Rc<RefCell<Option<Result<Vec<u8>, WorkerError>>>>;

/// A GIF encoder running in a dedicated web worker.
///
/// Create one at app startup and reuse it for all conversions.
///
/// Jobs run one at a time; the UI controller's busy guard keeps a
/// second conversion from starting while one is in flight.
pub struct EncoderWorker {
    inner: web_sys::Worker,
}

impl EncoderWorker {
    /// Create a new encoder worker from the embedded JS glue
    /// (`include_str!`) and WASM binary (`include_bytes!`).
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] if the worker cannot be created
    /// (e.g. in a non-browser environment).
    pub fn new(worker_js: &str, worker_wasm: &[u8]) -> Result<Self, WorkerError> {
        let worker = create_worker(worker_js, worker_wasm)?;
        Ok(Self { inner: worker })
    }

    /// Encode `frames` in the worker.
    ///
    /// `on_progress` is called for every progress event. The
    /// `generation` is echoed back by the worker so responses to an
    /// earlier job are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkerError`] if the job cannot be posted, the worker
    /// fails, or the encoder reports an error.
    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    pub async fn run<F>(
        &self,
        frames: &[Vec<u8>],
        request: &EncodeRequest,
        generation: f64,
        mut on_progress: F,
    ) -> Result<Vec<u8>, WorkerError>
    where
        F: FnMut(EncodeProgress) + 'static,
    {
        let request_json =
            serde_json::to_string(request).map_err(|e| WorkerError::Protocol(e.to_string()))?;

        // { frames: Uint8Array[], requestJson: string, generation: f64 }
        let buffers = js_sys::Array::new();
        for png in frames {
            buffers.push(&js_sys::Uint8Array::from(png.as_slice()));
        }
        let message = js_sys::Object::new();
        set(&message, "frames", &buffers)?;
        set(&message, "requestJson", &JsValue::from_str(&request_json))?;
        set(&message, "generation", &JsValue::from_f64(generation))?;

        let outcome: Outcome = Rc::new(RefCell::new(None));
        let outcome_clone = Rc::clone(&outcome);
        let (promise, resolve, reject) = new_promise()?;

        let onmessage = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let data = event.data();

                let resp_generation = js_sys::Reflect::get(&data, &JsValue::from_str("generation"))
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(-1.0);
                if (resp_generation - generation).abs() > f64::EPSILON {
                    debug!("ignoring stale worker response {resp_generation}");
                    return;
                }

                let finished = match read_event(&data) {
                    Ok(EncodeEvent::Progress { progress }) => {
                        on_progress(progress);
                        return;
                    }
                    Ok(EncodeEvent::Finished { size }) => read_gif(&data, size),
                    Ok(EncodeEvent::Failed { message }) => Err(WorkerError::Encode(message)),
                    Err(e) => Err(e),
                };
                *outcome_clone.borrow_mut() = Some(finished);
                resolve.call0(&JsValue::NULL).ok();
            },
        );

        let onerror =
            Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(move |event: web_sys::ErrorEvent| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&event.message()));
            });

        let worker = &self.inner;
        worker.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        worker.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        worker
            .post_message(&message)
            .map_err(|e| WorkerError::Spawn(format!("failed to postMessage: {e:?}")))?;

        // Keep the handlers alive until the job settles.
        let _onmessage_guard = onmessage;
        let _onerror_guard = onerror;

        let settled = wasm_bindgen_futures::JsFuture::from(promise).await;

        worker.set_onmessage(None);
        worker.set_onerror(None);

        let captured = outcome.borrow_mut().take();
        match settled {
            Ok(_) => captured.unwrap_or_else(|| {
                Err(WorkerError::Protocol(
                    "worker completed but no result captured".into(),
                ))
            }),
            Err(e) => {
                let msg = e
                    .as_string()
                    .unwrap_or_else(|| "unknown worker error".into());
                Err(WorkerError::Worker(msg))
            }
        }
    }
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), WorkerError> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|_| WorkerError::Protocol(format!("failed to set {key}")))
}

fn read_event(data: &JsValue) -> Result<EncodeEvent, WorkerError> {
    let json = js_sys::Reflect::get(data, &JsValue::from_str("eventJson"))
        .ok()
        .and_then(|v| v.as_string())
        .ok_or_else(|| WorkerError::Protocol("missing eventJson".into()))?;
    serde_json::from_str(&json).map_err(|e| WorkerError::Protocol(e.to_string()))
}

fn read_gif(data: &JsValue, size: usize) -> Result<Vec<u8>, WorkerError> {
    let gif: js_sys::Uint8Array = js_sys::Reflect::get(data, &JsValue::from_str("gif"))
        .ok()
        .and_then(|v| v.dyn_into().ok())
        .ok_or_else(|| WorkerError::Protocol("missing gif buffer".into()))?;
    let bytes = gif.to_vec();
    if bytes.len() != size {
        return Err(WorkerError::Protocol(format!(
            "expected {size} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Create a web worker from embedded JS glue and WASM binary.
///
/// 1. Creates a Blob URL for the WASM binary
/// 2. Wraps the JS glue in a self-initializing script that loads the
///    WASM from the Blob URL
/// 3. Creates a Worker from a Blob URL of the wrapper script
fn create_worker(worker_js: &str, worker_wasm: &[u8]) -> Result<web_sys::Worker, WorkerError> {
    let spawn_error = |what: &str, e: JsValue| WorkerError::Spawn(format!("{what}: {e:?}"));

    let wasm_array = js_sys::Uint8Array::from(worker_wasm);
    let wasm_blob_parts = js_sys::Array::new();
    wasm_blob_parts.push(&wasm_array.buffer());
    let wasm_blob_opts = web_sys::BlobPropertyBag::new();
    wasm_blob_opts.set_type("application/wasm");
    let wasm_blob = web_sys::Blob::new_with_buffer_source_sequence_and_options(
        &wasm_blob_parts,
        &wasm_blob_opts,
    )
    .map_err(|e| spawn_error("failed to create WASM Blob", e))?;
    let wasm_url = web_sys::Url::create_object_url_with_blob(&wasm_blob)
        .map_err(|e| spawn_error("failed to create WASM Blob URL", e))?;

    let wrapper_js = format!(
        r#"// Worker wrapper: embedded wasm_bindgen glue plus WASM blob.
{worker_js}

wasm_bindgen("{wasm_url}")
    .catch(function(e) {{ console.error("Worker WASM init failed:", e); }});
"#
    );

    let js_blob_parts = js_sys::Array::new();
    js_blob_parts.push(&JsValue::from_str(&wrapper_js));
    let js_blob_opts = web_sys::BlobPropertyBag::new();
    js_blob_opts.set_type("application/javascript");
    let js_blob = web_sys::Blob::new_with_str_sequence_and_options(&js_blob_parts, &js_blob_opts)
        .map_err(|e| spawn_error("failed to create JS Blob", e))?;
    let js_url = web_sys::Url::create_object_url_with_blob(&js_blob)
        .map_err(|e| spawn_error("failed to create JS Blob URL", e))?;

    let worker =
        web_sys::Worker::new(&js_url).map_err(|e| spawn_error("failed to create Worker", e))?;

    // The WASM URL stays alive: the worker's async init may still be
    // fetching it.
    web_sys::Url::revoke_object_url(&js_url).ok();

    Ok(worker)
}

/// Create a JS Promise along with its resolve and reject functions.
fn new_promise() -> Result<(js_sys::Promise, js_sys::Function, js_sys::Function), WorkerError> {
    let resolve = Rc::new(RefCell::new(None::<js_sys::Function>));
    let reject = Rc::new(RefCell::new(None::<js_sys::Function>));
    let resolve_clone = Rc::clone(&resolve);
    let reject_clone = Rc::clone(&reject);

    let promise = js_sys::Promise::new(&mut move |res, rej| {
        *resolve_clone.borrow_mut() = Some(res);
        *reject_clone.borrow_mut() = Some(rej);
    });

    let resolve_fn = resolve.borrow_mut().take();
    let reject_fn = reject.borrow_mut().take();
    match (resolve_fn, reject_fn) {
        (Some(resolve), Some(reject)) => Ok((promise, resolve, reject)),
        _ => Err(WorkerError::Spawn("promise executor did not run".into())),
    }
}
