//! Build a document from PNG files on disk.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use framegif_core::{MemoryDocument, NodeId, NodeInfo, NodeKind};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load every path as a selected frame, in argument order.
///
/// The frame id is the path as given and its name the file stem.
/// Files that are not decodable images stay in the selection as frames
/// without content, so they fail at export time like a deleted node.
///
/// # Errors
///
/// Returns [`SourceError::Read`] if a file cannot be read at all.
pub fn load_document(paths: &[PathBuf]) -> Result<MemoryDocument, SourceError> {
    let mut document = MemoryDocument::new();
    for path in paths {
        let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
            path: path.clone(),
            source,
        })?;
        let id = NodeId::new(path.display().to_string());
        let name = frame_name(path);
        match document.add_frame(id.clone(), name.clone(), bytes) {
            Ok(info) => debug!("loaded {id} ({} x {})", info.width, info.height),
            Err(e) => {
                warn!("{}: {e}", path.display());
                document.add_node(NodeInfo {
                    id,
                    name,
                    kind: NodeKind::Frame,
                    width: 1.0,
                    height: 1.0,
                });
            }
        }
    }
    document.select_all();
    Ok(document)
}

fn frame_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use framegif_core::Document;

    use super::*;

    #[test]
    fn names_are_file_stems() {
        assert_eq!(frame_name(Path::new("shots/intro.png")), "intro");
        assert_eq!(frame_name(Path::new("outro")), "outro");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_document(&[PathBuf::from("/nonexistent/frame.png")]).unwrap_err();
        assert!(err.to_string().starts_with("Error reading /nonexistent/frame.png"));
    }

    #[test]
    fn undecodable_file_stays_selected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let document = load_document(std::slice::from_ref(&path)).unwrap();
        let selection = document.selection().unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].name, "broken");
        assert!(document.export_png(&selection[0].id, 1.0).is_err());
    }
}
