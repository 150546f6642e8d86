//! Blob URL creation for encoded animations.
//!
//! The preview `<img>` and the download link both point at an object
//! URL. [`ObjectUrl`] revokes its URL when dropped, so replacing the
//! current result releases the previous one.

use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors that can occur during Blob URL creation.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for BlobError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Wrap `bytes` in a `Blob` of the given MIME type.
///
/// # Errors
///
/// Returns [`BlobError::JsError`] if Blob creation fails.
pub fn bytes_to_blob(bytes: &[u8], mime_type: &str) -> Result<web_sys::Blob, BlobError> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime_type);
    Ok(web_sys::Blob::new_with_u8_array_sequence_and_options(
        &parts, &opts,
    )?)
}

/// An object URL that is revoked on drop.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    /// Create an object URL for `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::JsError`] if Blob or URL creation fails.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, BlobError> {
        let blob = bytes_to_blob(bytes, mime_type)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;
        Ok(Self { url })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        revoke_blob_url(&self.url);
    }
}

/// Revoke a Blob URL.
///
/// Best-effort: failures are silently ignored since the URL may have
/// already been revoked.
pub fn revoke_blob_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}
