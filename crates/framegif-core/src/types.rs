//! Shared types for framegif: document nodes, frame descriptors, raster
//! buffers, the encoded result and the error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a document node.
///
/// Unique within one document. The UI never interprets it; it only
/// echoes ids back to the host in the order it wants frames exported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of a document node. Only [`NodeKind::Frame`] is exportable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Frame,
    Group,
    Component,
    Instance,
    Text,
    Rectangle,
    /// Any other node type, carrying the host's type name.
    Other(String),
}

impl NodeKind {
    /// Whether nodes of this kind can be turned into animation frames.
    #[must_use]
    pub const fn is_frame(&self) -> bool {
        matches!(self, Self::Frame)
    }
}

/// Live view of one document node as reported by the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Width in document units (may be fractional).
    pub width: f64,
    /// Height in document units (may be fractional).
    pub height: f64,
}

/// Identifies one exportable frame, as sent from host to UI.
///
/// Immutable once sent. Every selection change replaces the whole list
/// of descriptors; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub id: NodeId,
    /// Display name. Not guaranteed unique.
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl FrameDescriptor {
    /// Build a descriptor from a frame node, rounding its dimensions.
    ///
    /// Dimensions are rounded half away from zero and clamped to at
    /// least one unit so descriptors always carry positive sizes.
    #[must_use]
    pub fn from_node(node: &NodeInfo) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            width: round_dimension(node.width),
            height: round_dimension(node.height),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_dimension(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    // `as` saturates on overflow.
    (value.round() as u32).max(1)
}

/// PNG bytes of one exported frame.
///
/// Transient: held only until the encoder consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub id: NodeId,
    pub png: Vec<u8>,
}

/// Target animation format. GIF is the only supported format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationFormat {
    #[default]
    Gif,
}

impl AnimationFormat {
    /// All supported formats, for populating the format selector.
    pub const ALL: [Self; 1] = [Self::Gif];

    /// MIME type of the encoded file.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
        }
    }

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gif => "GIF",
        }
    }

    /// Parse a wire or CLI value such as `"gif"`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for AnimationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The finished animation of one successful conversion.
///
/// Replaced by the next conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAnimation {
    pub format: AnimationFormat,
    pub bytes: Vec<u8>,
}

impl EncodedAnimation {
    /// Base file name offered for downloads.
    pub const FILE_STEM: &'static str = "animation";

    #[must_use]
    pub const fn new(format: AnimationFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Download file name, e.g. `animation.gif`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", Self::FILE_STEM, self.format.extension())
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Label for the download affordance, e.g. `Download GIF`.
    #[must_use]
    pub fn download_label(&self) -> String {
        format!("Download {}", self.format.label())
    }
}

/// Failure reported by a [`Document`](crate::document::Document)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DocumentError(pub String);

/// Errors that can occur while turning frames into an animation.
///
/// Every variant is caught at the boundary of the operation that
/// produced it and turned into an `error` message; none of them crosses
/// the host/UI boundary as a typed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ConvertError {
    /// Nothing is selected in the document.
    #[error("Please select at least one frame to convert")]
    NoSelection,

    /// The selection contains no frame nodes.
    #[error("Please select frames only")]
    NoFrameTypeSelected,

    /// None of the requested ids resolved to a frame.
    #[error("No valid frames found")]
    NoValidFrames,

    /// One frame could not be resolved or rasterized.
    #[error("failed to export frame {id}: {reason}")]
    Export { id: NodeId, reason: String },

    /// The animation encoder failed or produced no result.
    #[error("failed to encode animation: {0}")]
    Encode(String),

    /// Frame or result bytes could not be materialized.
    #[error("failed to read image data: {0}")]
    Read(String),
}

impl ConvertError {
    /// Text shown to the user in the `error` message.
    ///
    /// Selection problems are reported verbatim; everything else is
    /// prefixed so the user knows the conversion step failed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoSelection | Self::NoFrameTypeSelected => self.to_string(),
            _ => format!("Error converting frames: {self}"),
        }
    }
}

/// Rejections of user actions by the UI controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UiError {
    /// A conversion is already in flight.
    #[error("a conversion is already in progress")]
    Busy,

    /// The frame list is empty.
    #[error("no frames selected")]
    NoFrames,
}
