//! An in-process plugin session.
//!
//! Messages cross between the controllers as JSON strings through one
//! FIFO queue, so delivery order matches what the host sandbox and the
//! UI iframe would see over `postMessage`.

use std::collections::VecDeque;

use log::{debug, info};
use web_time::Instant;

use framegif_core::protocol::{self, ProtocolError};
use framegif_core::{
    Document, EncodedAnimation, FrameDescriptor, GifSettings, HostConfig, HostController,
    HostMessage, UiConfig, UiController, UiEffect, UiError, UiMessage, UiPhase,
};
use framegif_export::GifEncoder;

/// Host controller that encodes with [`GifEncoder`].
pub type GifHost<D> = HostController<D, fn(&GifSettings) -> GifEncoder>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The UI ended in its error state; carries the status line.
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Ui(#[from] UiError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `--order` named a frame that is not (or no longer) in the list.
    #[error("unknown or repeated frame in order: {0}")]
    UnknownFrame(String),

    #[error("conversion did not finish")]
    Unfinished,
}

enum Wire {
    ToHost(String),
    ToUi(String),
}

pub struct Session<D> {
    host: GifHost<D>,
    ui: UiController,
    wire: VecDeque<Wire>,
    gif: GifSettings,
}

impl<D: Document> Session<D> {
    #[must_use]
    pub fn new(document: D, host_config: HostConfig, ui_config: UiConfig) -> Self {
        let gif = host_config.gif;
        let factory: fn(&GifSettings) -> GifEncoder = GifEncoder::new;
        Self {
            host: HostController::new(document, factory, host_config),
            ui: UiController::new(ui_config),
            wire: VecDeque::new(),
            gif,
        }
    }

    #[must_use]
    pub const fn host(&self) -> &GifHost<D> {
        &self.host
    }

    #[must_use]
    pub const fn ui(&self) -> &UiController {
        &self.ui
    }

    /// The UI's current frame list, in export order.
    #[must_use]
    pub fn frames(&self) -> &[FrameDescriptor] {
        self.ui.frames().frames()
    }

    /// Open the UI and let the host push the initial frame list.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] if a message fails to cross
    /// the wire.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        self.host.start(Instant::now());
        let hello = self.ui.connect();
        self.send_to_host(&hello)?;
        self.pump()?;

        // Nothing else happens in between, so the scheduled push can be
        // delivered right away instead of waiting for its deadline.
        if let Some(deadline) = self.host.next_deadline()
            && let Some(push) = self.host.poll(deadline)
        {
            self.send_to_ui(&push)?;
        }
        self.pump()
    }

    /// Move the named frames to the front, in the given order.
    ///
    /// Each key matches a frame id or name. Frames not named keep their
    /// relative order after the named ones.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownFrame`] for a key that matches no
    /// frame still to be placed.
    pub fn apply_order(&mut self, order: &[String]) -> Result<(), SessionError> {
        for (target, key) in order.iter().enumerate() {
            let from = self
                .frames()
                .iter()
                .skip(target)
                .position(|f| f.id.as_str() == key || f.name == *key)
                .map(|offset| target + offset)
                .ok_or_else(|| SessionError::UnknownFrame(key.clone()))?;
            self.ui.reorder(from, target);
        }
        Ok(())
    }

    /// Convert the current list and return the animation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Ui`] if the UI refuses to start,
    /// [`SessionError::Failed`] with the UI's error status if the
    /// conversion fails.
    pub fn convert(&mut self) -> Result<EncodedAnimation, SessionError> {
        let request = self.ui.request_conversion()?;
        self.send_to_host(&request)?;
        self.pump()?;

        match self.ui.phase() {
            UiPhase::Previewing => self.ui.result().cloned().ok_or(SessionError::Unfinished),
            UiPhase::ErrorShown => Err(SessionError::Failed(self.ui.status().text.clone())),
            _ => Err(SessionError::Unfinished),
        }
    }

    fn send_to_host(&mut self, message: &UiMessage) -> Result<(), ProtocolError> {
        debug!("ui -> host: {}", message.kind());
        self.wire.push_back(Wire::ToHost(protocol::to_json(message)?));
        Ok(())
    }

    fn send_to_ui(&mut self, message: &HostMessage) -> Result<(), ProtocolError> {
        debug!("host -> ui: {}", message.kind());
        self.wire.push_back(Wire::ToUi(protocol::to_json(message)?));
        Ok(())
    }

    /// Deliver queued messages until both sides are quiet.
    fn pump(&mut self) -> Result<(), SessionError> {
        while let Some(wire) = self.wire.pop_front() {
            match wire {
                Wire::ToHost(json) => {
                    let message: UiMessage = protocol::from_json(&json)?;
                    if let Some(reply) = self.host.handle_message(message) {
                        self.send_to_ui(&reply)?;
                    }
                }
                Wire::ToUi(json) => {
                    let message: HostMessage = protocol::from_json(&json)?;
                    let effects = self.ui.dispatch(message);
                    self.run_effects(effects)?;
                }
            }
        }
        Ok(())
    }

    fn run_effects(&mut self, effects: Vec<UiEffect>) -> Result<(), SessionError> {
        let mut pending = VecDeque::from(effects);
        while let Some(effect) = pending.pop_front() {
            match effect {
                UiEffect::Send(message) => self.send_to_host(&message)?,
                UiEffect::Encode(job) => {
                    info!("encoding {} frame(s)", job.frames.len());
                    let encoder = GifEncoder::new(&self.gif);
                    pending.extend(self.ui.build_animation(job, encoder));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use framegif_core::{MemoryDocument, PipelineVariant, ResultDelivery};
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, Rgba, RgbaImage};

    use super::*;

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba(rgba));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), 3, 2, image::ExtendedColorType::Rgba8)
            .unwrap();
        buf
    }

    fn document() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_frame("1:1", "red", png([255, 0, 0, 255])).unwrap();
        doc.add_frame("1:2", "green", png([0, 255, 0, 255])).unwrap();
        doc.add_frame("1:3", "blue", png([0, 0, 255, 255])).unwrap();
        doc.select_all();
        doc
    }

    fn host_config() -> HostConfig {
        HostConfig {
            export_scale: 1.0,
            ..HostConfig::default()
        }
    }

    fn names(session: &Session<MemoryDocument>) -> Vec<&str> {
        session.frames().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn connect_lists_the_selection() {
        let mut session = Session::new(document(), host_config(), UiConfig::default());
        session.connect().unwrap();
        assert_eq!(names(&session), ["red", "green", "blue"]);
        assert_eq!(session.ui().phase(), UiPhase::FramesReady);
        assert_eq!(session.ui().status().text, "3 frames selected");
    }

    #[test]
    fn order_moves_named_frames_to_the_front() {
        let mut session = Session::new(document(), host_config(), UiConfig::default());
        session.connect().unwrap();
        session.apply_order(&["blue".into(), "1:1".into()]).unwrap();
        assert_eq!(names(&session), ["blue", "red", "green"]);
    }

    #[test]
    fn repeated_order_key_is_rejected() {
        let mut session = Session::new(document(), host_config(), UiConfig::default());
        session.connect().unwrap();
        let err = session
            .apply_order(&["green".into(), "green".into()])
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownFrame(key) if key == "green"));
    }

    #[test]
    fn ui_encode_produces_a_gif() {
        let mut session = Session::new(document(), host_config(), UiConfig::default());
        session.connect().unwrap();
        let animation = session.convert().unwrap();
        assert!(animation.bytes.starts_with(b"GIF89a"));
        assert_eq!(session.ui().status().text, "Conversion completed!");
        assert_eq!(session.ui().progress(), 100);
    }

    #[test]
    fn host_encode_produces_a_gif() {
        let config = HostConfig {
            pipeline: PipelineVariant::HostEncode,
            ..host_config()
        };
        let mut session = Session::new(document(), config, UiConfig::default());
        session.connect().unwrap();
        let animation = session.convert().unwrap();
        assert!(animation.bytes.starts_with(b"GIF89a"));
    }

    #[test]
    fn forwarded_result_reaches_the_host() {
        let ui = UiConfig {
            delivery: ResultDelivery::ForwardToHost,
            ..UiConfig::default()
        };
        let mut session = Session::new(document(), host_config(), ui);
        session.connect().unwrap();
        let animation = session.convert().unwrap();
        assert_eq!(session.host().delivered(), Some(&animation));
    }

    #[test]
    fn empty_selection_cannot_convert() {
        let mut session = Session::new(MemoryDocument::new(), host_config(), UiConfig::default());
        session.connect().unwrap();
        assert!(matches!(
            session.convert(),
            Err(SessionError::Ui(UiError::NoFrames))
        ));
    }
}
