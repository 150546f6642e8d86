//! Dioxus UI components for framegif.
//!
//! Provides the reorderable frame list, the conversion controls, the
//! status line with progress bar, and the result preview with download.

mod convert_panel;
mod frame_list;
mod result_preview;
mod status;

pub use convert_panel::ConvertPanel;
pub use frame_list::FrameListView;
pub use result_preview::{PreviewAsset, ResultPreview};
pub use status::StatusBar;
