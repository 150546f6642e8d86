//! The UI controller: presentation state and the conversion lifecycle.
//!
//! [`UiController`] is a plain state object. Shells feed it user actions
//! and host messages and act on the [`UiEffect`]s it returns: send a
//! message to the host, or run an [`EncodeJob`] through an encoder
//! (inline via [`UiController::build_animation`], or in a worker that
//! reports back through [`UiController::on_encode_progress`] and
//! [`UiController::on_encode_finished`]).
//!
//! Phases:
//!
//! ```text
//! Idle -> AwaitingFrameList -> FramesReady -> Converting -> Previewing
//!                                   ^                    \-> ErrorShown
//!                                   '--- frame-list ---------'
//! ```

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::base64;
use crate::config::{ResultDelivery, UiConfig};
use crate::encode::AnimationEncoder;
use crate::frame_list::FrameList;
use crate::protocol::{ConvertRequest, HostMessage, UiMessage};
use crate::types::{AnimationFormat, ConvertError, EncodedAnimation, FrameDescriptor, UiError};

/// Shown in place of the frame list when it is empty.
pub const EMPTY_LIST_PLACEHOLDER: &str =
    "No frames selected. Select frames in the document first.";

/// Where the UI is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UiPhase {
    #[default]
    Idle,
    AwaitingFrameList,
    FramesReady,
    Converting,
    Previewing,
    ErrorShown,
}

/// The status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    /// Render in the error style.
    pub is_error: bool,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Decoded frames waiting for the encoder, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub frames: Vec<Vec<u8>>,
    pub delay_ms: u32,
    pub format: AnimationFormat,
}

/// Progress reported by an encoder running outside the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum EncodeProgress {
    /// `done` of `total` frames have been added.
    Adding { done: usize, total: usize },
    /// Render progress as a fraction in `0.0..=1.0`.
    Rendering { fraction: f32 },
}

impl EncodeProgress {
    /// Progress bar share of adding frames.
    const ADDING_SPAN: f32 = 50.0;
    /// Progress bar share of rendering, after adding.
    const RENDERING_SPAN: f32 = 40.0;

    /// Overall percentage for the progress bar.
    ///
    /// Adding frames covers 0-50 %, rendering 50-90 %; the last 10 %
    /// are reached when the result is presented.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn percent(self) -> u8 {
        let value = match self {
            Self::Adding { total: 0, .. } => 0.0,
            Self::Adding { done, total } => {
                Self::ADDING_SPAN * (done.min(total) as f32 / total as f32)
            }
            Self::Rendering { fraction } => {
                Self::ADDING_SPAN + Self::RENDERING_SPAN * fraction.clamp(0.0, 1.0)
            }
        };
        value.round() as u8
    }
}

/// What the shell has to do after a controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Post this message to the host.
    Send(UiMessage),
    /// Run this job through an animation encoder.
    Encode(EncodeJob),
}

/// UI-side controller.
#[derive(Debug, Clone, Default)]
pub struct UiController {
    frames: FrameList,
    config: UiConfig,
    phase: UiPhase,
    status: Status,
    progress: u8,
    drag_source: Option<usize>,
    result: Option<EncodedAnimation>,
}

impl UiController {
    #[must_use]
    pub fn new(config: UiConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn phase(&self) -> UiPhase {
        self.phase
    }

    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    /// Progress bar value in percent.
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub const fn frames(&self) -> &FrameList {
        &self.frames
    }

    #[must_use]
    pub const fn config(&self) -> &UiConfig {
        &self.config
    }

    /// The latest finished animation.
    #[must_use]
    pub const fn result(&self) -> Option<&EncodedAnimation> {
        self.result.as_ref()
    }

    /// Index of the row being dragged, if any.
    #[must_use]
    pub const fn drag_source(&self) -> Option<usize> {
        self.drag_source
    }

    /// Placeholder text when there is nothing to list.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        self.frames.is_empty().then_some(EMPTY_LIST_PLACEHOLDER)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase == UiPhase::Converting
    }

    /// Whether the convert action is enabled.
    #[must_use]
    pub fn can_convert(&self) -> bool {
        !self.frames.is_empty() && !self.is_busy()
    }

    /// Set the per-frame delay, clamped to the accepted range.
    ///
    /// Ignored while a conversion is running.
    pub fn set_frame_delay(&mut self, ms: u32) {
        if self.is_busy() {
            debug!("delay change ignored while converting");
            return;
        }
        self.config.frame_delay_ms = UiConfig::clamp_frame_delay(ms);
    }

    /// Ignored while a conversion is running.
    pub fn set_format(&mut self, format: AnimationFormat) {
        if self.is_busy() {
            debug!("format change ignored while converting");
            return;
        }
        self.config.format = format;
    }

    /// The UI has loaded: ask the host for the current selection.
    pub fn connect(&mut self) -> UiMessage {
        self.phase = UiPhase::AwaitingFrameList;
        UiMessage::RefreshFrames
    }

    /// Explicit refresh from the user.
    pub fn refresh(&mut self) -> UiMessage {
        if !self.is_busy() {
            self.phase = UiPhase::AwaitingFrameList;
        }
        UiMessage::RefreshFrames
    }

    /// Replace the list with a fresh host list.
    ///
    /// A conversion in flight keeps running against the ids it was
    /// started with.
    pub fn render_frame_list(&mut self, descriptors: Vec<FrameDescriptor>) {
        let dropped = self.frames.replace(descriptors);
        if dropped > 0 {
            warn!("dropped {dropped} duplicate frame id(s)");
        }
        self.drag_source = None;
        debug!("frame list now has {} entries", self.frames.len());

        if self.is_busy() {
            return;
        }
        self.phase = UiPhase::FramesReady;
        self.status = Status::info(self.frames.summary());
    }

    /// Move a row. Returns `false` if nothing changed, which is always
    /// the case while converting.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if self.is_busy() {
            return false;
        }
        let moved = self.frames.reorder(from, to);
        if moved {
            debug!("moved frame {from} -> {to}");
        }
        moved
    }

    /// A drag started on row `index`.
    pub fn begin_reorder(&mut self, index: usize) {
        self.drag_source = (index < self.frames.len() && !self.is_busy()).then_some(index);
    }

    /// The drag ended on row `target`.
    pub fn commit_reorder(&mut self, target: usize) -> bool {
        self.drag_source
            .take()
            .is_some_and(|from| self.reorder(from, target))
    }

    pub fn cancel_reorder(&mut self) {
        self.drag_source = None;
    }

    /// Start a conversion of the current list, in list order.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::Busy`] while a conversion is in flight and
    /// [`UiError::NoFrames`] when the list is empty.
    pub fn request_conversion(&mut self) -> Result<UiMessage, UiError> {
        if self.is_busy() {
            return Err(UiError::Busy);
        }
        if self.frames.is_empty() {
            return Err(UiError::NoFrames);
        }

        info!(
            "requesting conversion of {} frame(s) at {} ms",
            self.frames.len(),
            self.config.frame_delay_ms
        );
        self.phase = UiPhase::Converting;
        self.drag_source = None;
        self.status = Status::info("Starting conversion...");
        self.progress = 0;
        Ok(UiMessage::Convert(ConvertRequest {
            format: self.config.format,
            frame_delay: self.config.frame_delay_ms,
            frame_ids: self.frames.ids(),
        }))
    }

    /// Handle one host message.
    pub fn dispatch(&mut self, message: HostMessage) -> Vec<UiEffect> {
        debug!("ui received {}", message.kind());
        match message {
            HostMessage::FrameList { frames } => {
                self.render_frame_list(frames);
                Vec::new()
            }
            HostMessage::Error { message } => {
                self.fail(message);
                Vec::new()
            }
            HostMessage::FrameImages {
                images,
                format,
                frame_delay,
            } => self.on_frame_images(&images, format, frame_delay),
            HostMessage::Success { data, format } => {
                if !self.is_busy() {
                    warn!("ignoring unexpected success message");
                    return Vec::new();
                }
                self.present_result(EncodedAnimation::new(format, data))
            }
        }
    }

    fn on_frame_images(
        &mut self,
        images: &[String],
        format: AnimationFormat,
        delay_ms: u32,
    ) -> Vec<UiEffect> {
        if !self.is_busy() {
            warn!("ignoring frame images outside a conversion");
            return Vec::new();
        }
        let frames: Result<Vec<Vec<u8>>, _> = images.iter().map(|i| base64::decode(i)).collect();
        match frames {
            Ok(frames) => {
                info!("received {} frame(s) for encoding", frames.len());
                self.status = Status::info("Creating GIF...");
                self.progress = 0;
                vec![UiEffect::Encode(EncodeJob {
                    frames,
                    delay_ms,
                    format,
                })]
            }
            Err(e) => {
                self.fail(ConvertError::Read(e.to_string()).user_message());
                Vec::new()
            }
        }
    }

    /// Run `job` through `encoder` on the current thread.
    pub fn build_animation<E: AnimationEncoder>(
        &mut self,
        job: EncodeJob,
        mut encoder: E,
    ) -> Vec<UiEffect> {
        let total = job.frames.len();
        for (i, png) in job.frames.iter().enumerate() {
            if let Err(e) = encoder.add_frame(png, job.delay_ms) {
                let failed = Err(ConvertError::Encode(e.to_string()));
                return self.on_encode_finished(job.format, failed);
            }
            self.on_encode_progress(EncodeProgress::Adding { done: i + 1, total });
        }

        self.status = Status::info("Rendering GIF...");
        let mut percent = self.progress;
        let rendered = encoder.render(&mut |fraction: f32| {
            percent = EncodeProgress::Rendering { fraction }.percent();
        });
        self.progress = self.progress.max(percent);
        let result = rendered.map_err(|e| ConvertError::Encode(e.to_string()));
        self.on_encode_finished(job.format, result)
    }

    /// Progress update from an encoder.
    pub fn on_encode_progress(&mut self, progress: EncodeProgress) {
        if !self.is_busy() {
            return;
        }
        if let EncodeProgress::Adding { done, total } = progress {
            self.status = Status::info(format!("Adding frame {done}/{total}"));
        } else {
            self.status = Status::info("Rendering GIF...");
        }
        self.progress = progress.percent();
    }

    /// The encoder finished, successfully or not.
    pub fn on_encode_finished(
        &mut self,
        format: AnimationFormat,
        result: Result<Vec<u8>, ConvertError>,
    ) -> Vec<UiEffect> {
        if !self.is_busy() {
            warn!("ignoring encoder result outside a conversion");
            return Vec::new();
        }
        match result {
            Ok(bytes) if bytes.is_empty() => {
                self.fail(ConvertError::Encode("encoder produced no result".into()).user_message());
                Vec::new()
            }
            Ok(bytes) => self.present_result(EncodedAnimation::new(format, bytes)),
            Err(e) => {
                self.fail(e.user_message());
                Vec::new()
            }
        }
    }

    /// Store the finished animation and offer it for preview and
    /// download.
    pub fn present_result(&mut self, animation: EncodedAnimation) -> Vec<UiEffect> {
        info!("conversion finished: {} bytes", animation.bytes.len());
        let effects = match self.config.delivery {
            ResultDelivery::Preview => Vec::new(),
            ResultDelivery::ForwardToHost => vec![UiEffect::Send(UiMessage::GifData {
                data: base64::encode(&animation.bytes),
            })],
        };
        self.result = Some(animation);
        self.phase = UiPhase::Previewing;
        self.status = Status::info("Conversion completed!");
        self.progress = 100;
        effects
    }

    fn fail(&mut self, message: String) {
        warn!("conversion error: {message}");
        self.phase = UiPhase::ErrorShown;
        self.status = Status::error(message);
        self.progress = 0;
    }
}
