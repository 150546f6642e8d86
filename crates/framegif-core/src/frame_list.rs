//! The UI's ordered working copy of frame descriptors.
//!
//! The order of this list is the order frames get exported and encoded
//! in. It changes only by wholesale replacement from a fresh host list
//! or by moving one entry to a new index.

use std::collections::HashSet;

use crate::types::{FrameDescriptor, NodeId};

/// Ordered list of frame descriptors with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameList {
    frames: Vec<FrameDescriptor>,
}

impl FrameList {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Build a list, dropping later duplicates of an id.
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<FrameDescriptor>) -> Self {
        let mut list = Self::new();
        list.replace(descriptors);
        list
    }

    /// Replace the whole list with a fresh host list.
    ///
    /// Returns the number of duplicate-id entries that were dropped
    /// (first occurrence wins).
    pub fn replace(&mut self, descriptors: Vec<FrameDescriptor>) -> usize {
        let incoming = descriptors.len();
        let mut seen = HashSet::with_capacity(incoming);
        self.frames = descriptors
            .into_iter()
            .filter(|d| seen.insert(d.id.clone()))
            .collect();
        incoming - self.frames.len()
    }

    /// Move the entry at `from` so it ends up at index `to`.
    ///
    /// All other entries keep their relative order. Returns `false`
    /// (and leaves the list untouched) when the indices are equal or
    /// either one is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.frames.len() || to >= self.frames.len() {
            return false;
        }
        let frame = self.frames.remove(from);
        self.frames.insert(to, frame);
        true
    }

    #[must_use]
    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    /// Ids in list order: the ordering signal sent back to the host.
    #[must_use]
    pub fn ids(&self) -> Vec<NodeId> {
        self.frames.iter().map(|f| f.id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Status text such as `2 frames selected`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.frames.len() {
            0 => "No frames selected".to_owned(),
            1 => "1 frame selected".to_owned(),
            n => format!("{n} frames selected"),
        }
    }
}
