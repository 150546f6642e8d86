//! The host controller: the side with document access.
//!
//! [`HostController`] owns the document handle and answers UI messages.
//! It never sends anything itself; every operation returns the
//! [`HostMessage`] to deliver, which keeps it independent of the actual
//! transport (`postMessage` in a plugin sandbox, a channel in the CLI).
//!
//! Frames are exported one after another in request order, so the
//! raster sequence always matches the id sequence without re-sorting.

use log::{debug, info, warn};
use web_time::Instant;

use crate::base64;
use crate::config::{HostConfig, PartialFailurePolicy, PipelineVariant};
use crate::debounce::Debouncer;
use crate::document::Document;
use crate::encode::{AnimationEncoder, EncoderFactory};
use crate::protocol::{ConvertRequest, HostMessage, UiMessage};
use crate::types::{
    AnimationFormat, ConvertError, DocumentError, EncodedAnimation, FrameDescriptor, NodeId,
    RasterFrame,
};

/// Host-side controller generic over the document and the encoder used
/// for [`PipelineVariant::HostEncode`].
pub struct HostController<D, F> {
    document: D,
    encoders: F,
    config: HostConfig,
    selection_push: Debouncer,
    delivered: Option<EncodedAnimation>,
}

impl<D: Document, F: EncoderFactory> HostController<D, F> {
    #[must_use]
    pub fn new(document: D, encoders: F, config: HostConfig) -> Self {
        let selection_push = Debouncer::new(config.selection_debounce());
        Self {
            document,
            encoders,
            config,
            selection_push,
            delivered: None,
        }
    }

    #[cfg(test)]
    fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// The last animation handed back by the UI via `gif-data`.
    #[must_use]
    pub const fn delivered(&self) -> Option<&EncodedAnimation> {
        self.delivered.as_ref()
    }

    /// Schedule the initial frame-list push once the UI has had time to
    /// load.
    pub fn start(&mut self, now: Instant) {
        self.selection_push
            .trigger_after(now, self.config.initial_push_delay());
    }

    /// Selection-change event from the environment.
    ///
    /// The push is debounced; call [`poll`](Self::poll) to collect it.
    pub fn on_selection_changed(&mut self, now: Instant) {
        debug!("selection changed, push scheduled");
        self.selection_push.trigger(now);
    }

    /// When the next scheduled push is due, if any.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.selection_push.deadline()
    }

    /// Returns the frame-list push once its debounce delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<HostMessage> {
        self.selection_push
            .poll(now)
            .then(|| self.send_frame_list())
    }

    /// Read the live selection as frame descriptors.
    ///
    /// Non-frame nodes are dropped; selection order is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the document cannot report its
    /// selection.
    pub fn enumerate_selection(&self) -> Result<Vec<FrameDescriptor>, DocumentError> {
        let selection = self.document.selection()?;
        debug!("selection has {} node(s)", selection.len());
        Ok(selection
            .iter()
            .filter(|node| node.kind.is_frame())
            .map(FrameDescriptor::from_node)
            .collect())
    }

    /// Build the `frame-list` message for the current selection.
    #[must_use]
    pub fn send_frame_list(&self) -> HostMessage {
        match self.enumerate_selection() {
            Ok(frames) => {
                info!("sending {} frame(s) to UI", frames.len());
                HostMessage::FrameList { frames }
            }
            Err(e) => {
                warn!("failed to read selection: {e}");
                HostMessage::error(format!("Error processing frames: {e}"))
            }
        }
    }

    /// Export one frame as PNG at the configured scale.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Export`] if the id no longer resolves, is
    /// not a frame, or rendering fails.
    pub fn export_frame(&self, id: &NodeId) -> Result<RasterFrame, ConvertError> {
        let export_error = |reason: String| ConvertError::Export {
            id: id.clone(),
            reason,
        };

        let node = self
            .document
            .node(id)
            .ok_or_else(|| export_error("node no longer exists".into()))?;
        if !node.kind.is_frame() {
            return Err(export_error(format!("node {:?} is not a frame", node.name)));
        }

        debug!("exporting frame {:?} ({id})", node.name);
        let png = self
            .document
            .export_png(id, self.config.export_scale)
            .map_err(|e| export_error(e.to_string()))?;
        Ok(RasterFrame {
            id: id.clone(),
            png,
        })
    }

    /// Export `ids` in order, applying the partial-failure policy.
    ///
    /// # Errors
    ///
    /// Returns the first export error under
    /// [`PartialFailurePolicy::AbortBatch`], and
    /// [`ConvertError::NoValidFrames`] when nothing could be exported.
    pub fn export_frames(&self, ids: &[NodeId]) -> Result<Vec<RasterFrame>, ConvertError> {
        let mut frames = Vec::with_capacity(ids.len());
        for id in ids {
            match self.export_frame(id) {
                Ok(frame) => frames.push(frame),
                Err(e) => match self.config.partial_failure {
                    PartialFailurePolicy::AbortBatch => return Err(e),
                    PartialFailurePolicy::SkipInvalid => warn!("skipping frame: {e}"),
                },
            }
        }
        if frames.is_empty() {
            return Err(ConvertError::NoValidFrames);
        }
        Ok(frames)
    }

    /// Turn an empty id list into the frame ids of the live selection.
    fn resolve_targets(&self, ids: &[NodeId]) -> Result<Vec<NodeId>, ConvertError> {
        if !ids.is_empty() {
            return Ok(ids.to_vec());
        }
        let selection = self
            .document
            .selection()
            .map_err(|e| ConvertError::Read(e.to_string()))?;
        if selection.is_empty() {
            return Err(ConvertError::NoSelection);
        }
        let frames: Vec<NodeId> = selection
            .into_iter()
            .filter(|node| node.kind.is_frame())
            .map(|node| node.id)
            .collect();
        if frames.is_empty() {
            return Err(ConvertError::NoFrameTypeSelected);
        }
        Ok(frames)
    }

    /// Run a conversion request and return the single reply message:
    /// `frame-images`, `success`, or `error`.
    #[must_use]
    pub fn handle_convert_request(&self, request: &ConvertRequest) -> HostMessage {
        info!(
            "converting {} frame(s) to {} ({} ms per frame)",
            request.frame_ids.len(),
            request.format,
            request.frame_delay
        );
        match self.convert(request) {
            Ok(message) => message,
            Err(e) => {
                warn!("conversion failed: {e}");
                HostMessage::error(e.user_message())
            }
        }
    }

    fn convert(&self, request: &ConvertRequest) -> Result<HostMessage, ConvertError> {
        let ids = self.resolve_targets(&request.frame_ids)?;
        let frames = self.export_frames(&ids)?;

        match self.config.pipeline {
            PipelineVariant::UiEncode => {
                let images = frames.iter().map(|f| base64::encode(&f.png)).collect();
                info!("sending {} image(s) to UI", frames.len());
                Ok(HostMessage::FrameImages {
                    images,
                    format: request.format,
                    frame_delay: request.frame_delay,
                })
            }
            PipelineVariant::HostEncode => {
                let data = self.encode(&frames, request.frame_delay)?;
                info!("encoded {} bytes of {}", data.len(), request.format);
                Ok(HostMessage::Success {
                    data,
                    format: request.format,
                })
            }
        }
    }

    fn encode(&self, frames: &[RasterFrame], delay_ms: u32) -> Result<Vec<u8>, ConvertError> {
        let mut encoder = self.encoders.create(&self.config.gif);
        for frame in frames {
            encoder
                .add_frame(&frame.png, delay_ms)
                .map_err(|e| ConvertError::Encode(e.to_string()))?;
        }
        encoder
            .render(&mut |fraction: f32| debug!("encoding {:.0}%", fraction * 100.0))
            .map_err(|e| ConvertError::Encode(e.to_string()))
    }

    /// Dispatch one UI message and return the reply, if any.
    pub fn handle_message(&mut self, message: UiMessage) -> Option<HostMessage> {
        debug!("host received {}", message.kind());
        match message {
            UiMessage::RefreshFrames => Some(self.send_frame_list()),
            UiMessage::Convert(request) => Some(self.handle_convert_request(&request)),
            UiMessage::GifData { data } => match base64::decode(&data) {
                Ok(bytes) => {
                    info!("received {} byte animation from UI", bytes.len());
                    self.delivered = Some(EncodedAnimation::new(AnimationFormat::Gif, bytes));
                    None
                }
                Err(e) => {
                    warn!("invalid animation data from UI: {e}");
                    Some(HostMessage::error(ConvertError::Read(e.to_string()).user_message()))
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::document::MemoryDocument;
    use crate::document::tests::solid_png;
    use crate::encode::tests::{FailingEncoder, RecordingEncoder};
    use crate::types::{NodeInfo, NodeKind};

    type TestHost =
        HostController<MemoryDocument, fn(&crate::config::GifSettings) -> RecordingEncoder>;

    /// Document with frames A, B, C (distinct colors), a group G, all
    /// selected in the order A, G, B, C.
    fn document() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_frame("A", "Frame A", solid_png(80, 40, [255, 0, 0, 255])).unwrap();
        doc.add_frame("B", "Frame B", solid_png(80, 40, [0, 255, 0, 255])).unwrap();
        doc.add_frame("C", "Frame C", solid_png(81, 39, [0, 0, 255, 255])).unwrap();
        doc.add_node(NodeInfo {
            id: NodeId::new("G"),
            name: "Group".into(),
            kind: NodeKind::Group,
            width: 10.4,
            height: 10.6,
        });
        doc.select(["A", "G", "B", "C"]);
        doc
    }

    fn host(config: HostConfig) -> TestHost {
        HostController::new(document(), RecordingEncoder::create as _, config)
    }

    fn request(ids: &[&str]) -> ConvertRequest {
        ConvertRequest {
            format: AnimationFormat::Gif,
            frame_delay: 200,
            frame_ids: ids.iter().map(|id| NodeId::new(*id)).collect(),
        }
    }

    fn decoded_images(message: &HostMessage) -> Vec<Vec<u8>> {
        match message {
            HostMessage::FrameImages { images, .. } => {
                images.iter().map(|i| base64::decode(i).unwrap()).collect()
            }
            other => panic!("expected frame-images, got {other:?}"),
        }
    }

    #[test]
    fn enumerate_filters_frames_and_keeps_order() {
        let h = host(HostConfig::default());
        let frames = h.enumerate_selection().unwrap();
        let ids: Vec<&str> = frames.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert_eq!((frames[2].width, frames[2].height), (81, 39));
        // Idempotent for an unchanged selection.
        assert_eq!(h.enumerate_selection().unwrap(), frames);
    }

    #[test]
    fn empty_selection_gives_empty_list() {
        let mut h = host(HostConfig::default());
        h.document_mut().select(Vec::<NodeId>::new());
        assert_eq!(h.send_frame_list(), HostMessage::FrameList { frames: vec![] });
    }

    #[test]
    fn export_frame_renders_at_double_scale() {
        let h = host(HostConfig::default());
        let frame = h.export_frame(&NodeId::new("A")).unwrap();
        let img = image::load_from_memory(&frame.png).unwrap();
        assert_eq!((img.width(), img.height()), (160, 80));
    }

    #[test]
    fn export_frame_rejects_missing_and_non_frame_nodes() {
        let h = host(HostConfig::default());
        assert!(matches!(
            h.export_frame(&NodeId::new("gone")),
            Err(ConvertError::Export { .. })
        ));
        assert!(matches!(
            h.export_frame(&NodeId::new("G")),
            Err(ConvertError::Export { .. })
        ));
    }

    #[test]
    fn images_follow_request_order() {
        let h = host(HostConfig::default());
        let reply = h.handle_convert_request(&request(&["C", "A", "B"]));
        let images = decoded_images(&reply);
        let expected: Vec<Vec<u8>> = ["C", "A", "B"]
            .iter()
            .map(|id| h.export_frame(&NodeId::new(*id)).unwrap().png)
            .collect();
        assert_eq!(images, expected);
        assert!(matches!(
            reply,
            HostMessage::FrameImages {
                frame_delay: 200,
                format: AnimationFormat::Gif,
                ..
            }
        ));
    }

    #[test]
    fn all_invalid_ids_produce_an_error_only() {
        for policy in [PartialFailurePolicy::SkipInvalid, PartialFailurePolicy::AbortBatch] {
            let h = host(HostConfig {
                partial_failure: policy,
                ..HostConfig::default()
            });
            let reply = h.handle_convert_request(&request(&["x", "y", "G"]));
            assert!(
                matches!(reply, HostMessage::Error { .. }),
                "{policy:?} should reply with an error, got {reply:?}"
            );
        }
    }

    #[test]
    fn skip_policy_drops_bad_ids() {
        let h = host(HostConfig::default());
        let reply = h.handle_convert_request(&request(&["B", "gone", "A"]));
        assert_eq!(decoded_images(&reply).len(), 2);
    }

    #[test]
    fn abort_policy_fails_whole_batch() {
        let h = host(HostConfig {
            partial_failure: PartialFailurePolicy::AbortBatch,
            ..HostConfig::default()
        });
        let reply = h.handle_convert_request(&request(&["B", "gone", "A"]));
        let HostMessage::Error { message } = reply else {
            panic!("expected error, got {reply:?}");
        };
        assert!(message.starts_with("Error converting frames: failed to export frame gone"));
    }

    #[test]
    fn no_valid_frames_message() {
        let h = host(HostConfig::default());
        assert_eq!(
            h.handle_convert_request(&request(&["nope"])),
            HostMessage::error("Error converting frames: No valid frames found")
        );
    }

    #[test]
    fn empty_request_falls_back_to_selection() {
        let mut h = host(HostConfig::default());
        assert_eq!(decoded_images(&h.handle_convert_request(&request(&[]))).len(), 3);

        h.document_mut().select(["G"]);
        assert_eq!(
            h.handle_convert_request(&request(&[])),
            HostMessage::error("Please select frames only")
        );

        h.document_mut().select(Vec::<NodeId>::new());
        assert_eq!(
            h.handle_convert_request(&request(&[])),
            HostMessage::error("Please select at least one frame to convert")
        );
    }

    #[test]
    fn host_encode_sends_success() {
        let h = host(HostConfig {
            pipeline: PipelineVariant::HostEncode,
            ..HostConfig::default()
        });
        let reply = h.handle_convert_request(&request(&["B", "A"]));
        assert_eq!(
            reply,
            HostMessage::Success {
                data: b"GIF\x14\x14".to_vec(),
                format: AnimationFormat::Gif,
            }
        );
    }

    #[test]
    fn host_encode_failure_is_reported() {
        let h = HostController::new(
            document(),
            |_: &crate::config::GifSettings| FailingEncoder,
            HostConfig {
                pipeline: PipelineVariant::HostEncode,
                ..HostConfig::default()
            },
        );
        let reply = h.handle_convert_request(&request(&["A"]));
        assert_eq!(
            reply,
            HostMessage::error(
                "Error converting frames: failed to encode animation: encoder produced no result"
            )
        );
    }

    #[test]
    fn selection_push_is_debounced() {
        let mut h = host(HostConfig::default());
        let t0 = Instant::now();
        h.on_selection_changed(t0);
        h.on_selection_changed(t0 + Duration::from_millis(50));
        assert_eq!(h.poll(t0 + Duration::from_millis(120)), None);
        let pushed = h.poll(t0 + Duration::from_millis(150));
        assert!(matches!(pushed, Some(HostMessage::FrameList { ref frames }) if frames.len() == 3));
        assert_eq!(h.poll(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn start_schedules_initial_push() {
        let mut h = host(HostConfig::default());
        let t0 = Instant::now();
        h.start(t0);
        assert_eq!(h.next_deadline(), Some(t0 + Duration::from_millis(500)));
        assert_eq!(h.poll(t0 + Duration::from_millis(100)), None);
        assert!(h.poll(t0 + Duration::from_millis(500)).is_some());
    }

    #[test]
    fn dispatches_refresh_and_convert() {
        let mut h = host(HostConfig::default());
        assert!(matches!(
            h.handle_message(UiMessage::RefreshFrames),
            Some(HostMessage::FrameList { .. })
        ));
        assert!(matches!(
            h.handle_message(UiMessage::Convert(request(&["A"]))),
            Some(HostMessage::FrameImages { .. })
        ));
    }

    #[test]
    fn gif_data_is_stored() {
        let mut h = host(HostConfig::default());
        let reply = h.handle_message(UiMessage::GifData {
            data: base64::encode(b"GIF89a"),
        });
        assert_eq!(reply, None);
        assert_eq!(h.delivered().map(|a| a.bytes.as_slice()), Some(&b"GIF89a"[..]));

        let reply = h.handle_message(UiMessage::GifData {
            data: "not base64!".into(),
        });
        assert!(matches!(reply, Some(HostMessage::Error { .. })));
    }
}
