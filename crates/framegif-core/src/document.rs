//! The design document seam.
//!
//! [`Document`] is everything the host controller needs from the design
//! tool: the live selection, node lookup by id, and PNG export at a
//! render scale. [`MemoryDocument`] is an in-memory implementation
//! backed by PNG sources, used by the command line front end and tests.

use image::ImageEncoder;
use image::imageops::FilterType;

use crate::types::{DocumentError, NodeId, NodeInfo, NodeKind};

/// Access to the host's design document.
pub trait Document {
    /// The currently selected nodes, in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the selection cannot be read.
    fn selection(&self) -> Result<Vec<NodeInfo>, DocumentError>;

    /// Resolve an id to a live node, or `None` if it no longer exists.
    fn node(&self, id: &NodeId) -> Option<NodeInfo>;

    /// Render a node to PNG bytes at `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the node is missing or rendering fails.
    fn export_png(&self, id: &NodeId, scale: f32) -> Result<Vec<u8>, DocumentError>;
}

/// One node of a [`MemoryDocument`].
#[derive(Debug, Clone)]
struct MemoryNode {
    info: NodeInfo,
    /// PNG source at 1x. `None` for nodes that cannot be rendered.
    png: Option<Vec<u8>>,
}

/// An in-memory document whose frames are PNG images.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    nodes: Vec<MemoryNode>,
    selection: Vec<NodeId>,
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame node whose content is the given PNG.
    ///
    /// The frame's size is the PNG's pixel size. An existing node with
    /// the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if `png` cannot be decoded.
    pub fn add_frame(
        &mut self,
        id: impl Into<NodeId>,
        name: impl Into<String>,
        png: Vec<u8>,
    ) -> Result<NodeInfo, DocumentError> {
        let (width, height) = image::load_from_memory(&png)
            .map(|img| (img.width(), img.height()))
            .map_err(|e| DocumentError(format!("failed to decode frame image: {e}")))?;
        let info = NodeInfo {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Frame,
            width: f64::from(width),
            height: f64::from(height),
        };
        self.insert(MemoryNode {
            info: info.clone(),
            png: Some(png),
        });
        Ok(info)
    }

    /// Add a node that has no raster content (e.g. a group or text).
    pub fn add_node(&mut self, info: NodeInfo) {
        self.insert(MemoryNode { info, png: None });
    }

    fn insert(&mut self, node: MemoryNode) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.info.id == node.info.id) {
            *existing = node;
        } else {
            self.nodes.push(node);
        }
    }

    /// Replace the selection. Ids that do not exist are ignored.
    pub fn select<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.selection = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| self.nodes.iter().any(|n| &n.info.id == id))
            .collect();
    }

    /// Select every node, in insertion order.
    pub fn select_all(&mut self) {
        self.selection = self.nodes.iter().map(|n| n.info.id.clone()).collect();
    }

    fn find(&self, id: &NodeId) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| &n.info.id == id)
    }
}

impl Document for MemoryDocument {
    fn selection(&self) -> Result<Vec<NodeInfo>, DocumentError> {
        Ok(self
            .selection
            .iter()
            .filter_map(|id| self.find(id))
            .map(|n| n.info.clone())
            .collect())
    }

    fn node(&self, id: &NodeId) -> Option<NodeInfo> {
        self.find(id).map(|n| n.info.clone())
    }

    fn export_png(&self, id: &NodeId, scale: f32) -> Result<Vec<u8>, DocumentError> {
        let node = self
            .find(id)
            .ok_or_else(|| DocumentError(format!("node {id} not found")))?;
        let png = node
            .png
            .as_ref()
            .ok_or_else(|| DocumentError(format!("node {id} has no raster content")))?;
        render_scaled(png, scale)
    }
}

/// Re-render a PNG at `scale` (1.0 returns the source unchanged).
fn render_scaled(png: &[u8], scale: f32) -> Result<Vec<u8>, DocumentError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(DocumentError(format!("invalid export scale {scale}")));
    }
    if (scale - 1.0).abs() < f32::EPSILON {
        return Ok(png.to_vec());
    }

    let source = image::load_from_memory(png)
        .map_err(|e| DocumentError(format!("failed to decode frame image: {e}")))?
        .to_rgba8();
    let width = scaled_extent(source.width(), scale);
    let height = scaled_extent(source.height(), scale);
    let scaled = image::imageops::resize(&source, width, height, FilterType::Triangle);

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            scaled.as_raw(),
            scaled.width(),
            scaled.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| DocumentError(format!("PNG encoding failed: {e}")))?;
    Ok(out)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_extent(extent: u32, scale: f32) -> u32 {
    ((f64::from(extent) * f64::from(scale)).round() as u32).max(1)
}
