use std::rc::Rc;

use dioxus::prelude::*;
use framegif_core::{ConvertError, EncodeJob, GifSettings, UiController, UiEffect, UiPhase};
use framegif_export::{EncodeRequest, GifEncoder};
use framegif_io::{
    ConvertPanel, EncoderWorker, FrameListView, HostListener, PreviewAsset, ResultPreview,
    StatusBar, WorkerError, post_to_host,
};
use log::{error, info, warn};

/// Encoder worker glue and binary, built by build.rs. Empty on native
/// targets.
const WORKER_JS: &str = include_str!(env!("WORKER_JS_PATH"));
const WORKER_WASM: &[u8] = include_bytes!(env!("WORKER_WASM_PATH"));

fn main() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    dioxus::launch(app);
}

/// Handles to the app state that effects run against.
///
/// Every field is a signal, so the shell is `Copy` and can be moved
/// into event handlers, the host listener and spawned tasks alike.
#[derive(Clone, Copy)]
struct Shell {
    controller: Signal<UiController>,
    preview: Signal<Option<Rc<PreviewAsset>>>,
    worker: Signal<Option<Rc<EncoderWorker>>>,
    generation: Signal<u32>,
}

impl Shell {
    /// Carry out what the controller asked for.
    fn apply(self, effects: Vec<UiEffect>) {
        for effect in effects {
            match effect {
                UiEffect::Send(message) => {
                    if let Err(e) = post_to_host(&message) {
                        error!("failed to post {} to host: {e}", message.kind());
                    }
                }
                UiEffect::Encode(job) => self.encode(job),
            }
        }
        self.refresh_preview();
    }

    /// Run `job` off the event handler that produced it.
    fn encode(self, job: EncodeJob) {
        let mut generation = self.generation;
        generation += 1;
        let my_generation = *generation.peek();

        wasm_bindgen_futures::spawn_local(async move {
            let worker = self.worker.peek().clone();
            let effects = match worker {
                Some(worker) => self.encode_in_worker(&worker, job, my_generation).await,
                None => self.encode_inline(job).await,
            };
            self.apply(effects);
        });
    }

    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    async fn encode_in_worker(
        self,
        worker: &EncoderWorker,
        job: EncodeJob,
        generation: u32,
    ) -> Vec<UiEffect> {
        let mut controller = self.controller;
        let request = EncodeRequest {
            delay_ms: job.delay_ms,
            settings: GifSettings::default(),
        };
        let outcome = worker
            .run(&job.frames, &request, f64::from(generation), move |progress| {
                controller.write().on_encode_progress(progress);
            })
            .await;

        match outcome {
            Err(e @ (WorkerError::Spawn(_) | WorkerError::Worker(_))) => {
                warn!("{e}; encoding on the main thread instead");
                self.encode_inline(job).await
            }
            outcome => {
                let result = outcome.map_err(|e| ConvertError::Encode(e.to_string()));
                controller.write().on_encode_finished(job.format, result)
            }
        }
    }

    #[allow(clippy::future_not_send)]
    async fn encode_inline(self, job: EncodeJob) -> Vec<UiEffect> {
        // Let the browser paint "Creating GIF..." before blocking.
        gloo_timers::future::TimeoutFuture::new(0).await;

        let mut controller = self.controller;
        let encoder = GifEncoder::new(&GifSettings::default());
        controller.write().build_animation(job, encoder)
    }

    /// Keep the preview object URL in step with the controller's result.
    fn refresh_preview(self) {
        let mut preview = self.preview;
        let latest = self.controller.peek().result().cloned();
        match latest {
            Some(animation) => {
                let stale = preview
                    .peek()
                    .as_ref()
                    .is_none_or(|asset| asset.animation != animation);
                if !stale {
                    return;
                }
                match PreviewAsset::new(animation) {
                    Ok(asset) => preview.set(Some(Rc::new(asset))),
                    Err(e) => error!("failed to prepare preview: {e}"),
                }
            }
            None => {
                if preview.peek().is_some() {
                    preview.set(None);
                }
            }
        }
    }
}

fn spawn_worker() -> Option<Rc<EncoderWorker>> {
    if WORKER_WASM.is_empty() {
        info!("no encoder worker bundled; encoding on the main thread");
        return None;
    }
    match EncoderWorker::new(WORKER_JS, WORKER_WASM) {
        Ok(worker) => Some(Rc::new(worker)),
        Err(e) => {
            warn!("{e}; encoding on the main thread");
            None
        }
    }
}

/// Root application component.
///
/// Holds the UI controller in a signal, feeds it host messages and user
/// input, and runs the effects it returns.
fn app() -> Element {
    // --- Application state ---
    let mut controller = use_signal(UiController::default);
    let preview = use_signal(|| Option::<Rc<PreviewAsset>>::None);
    let worker = use_signal(spawn_worker);
    let generation = use_signal(|| 0u32);
    let shell = Shell {
        controller,
        preview,
        worker,
        generation,
    };

    // --- Host messages ---
    // The listener is removed when the hook storage drops it.
    let _listener = use_hook(move || {
        let installed = HostListener::install(move |message| {
            let effects = controller.write().dispatch(message);
            shell.apply(effects);
        });
        if let Err(e) = &installed {
            error!("cannot listen for host messages: {e}");
        }
        Rc::new(installed.ok())
    });

    // Ask for the current selection once the UI has rendered.
    use_effect(move || {
        let message = controller.write().connect();
        shell.apply(vec![UiEffect::Send(message)]);
    });

    // --- User input ---
    let on_refresh = move |()| {
        let message = controller.write().refresh();
        shell.apply(vec![UiEffect::Send(message)]);
    };

    let on_convert = move |()| {
        let requested = controller.write().request_conversion();
        match requested {
            Ok(message) => shell.apply(vec![UiEffect::Send(message)]),
            Err(e) => warn!("conversion not started: {e}"),
        }
    };

    // --- Layout ---
    let ui = controller.read();
    let asset = if ui.phase() == UiPhase::Previewing {
        preview()
    } else {
        None
    };

    rsx! {
        style { dangerous_inner_html: include_str!("../assets/style.css") }

        div { class: "container",
            h2 { "Frames" }
            FrameListView {
                frames: ui.frames().frames().to_vec(),
                placeholder: ui.placeholder(),
                drag_source: ui.drag_source(),
                locked: ui.is_busy(),
                on_drag_start: move |index| controller.write().begin_reorder(index),
                on_drop: move |index| {
                    controller.write().commit_reorder(index);
                },
                on_drag_end: move |()| controller.write().cancel_reorder(),
            }

            ConvertPanel {
                format: ui.config().format,
                frame_delay: ui.config().frame_delay_ms,
                can_convert: ui.can_convert(),
                busy: ui.is_busy(),
                on_format_change: move |format| controller.write().set_format(format),
                on_delay_change: move |ms| controller.write().set_frame_delay(ms),
                on_refresh: on_refresh,
                on_convert: on_convert,
            }

            StatusBar {
                status: ui.status().clone(),
                progress: ui.progress(),
            }

            ResultPreview { asset: asset }
        }
    }
}
