//! Preview of the finished animation with a download button.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdDownload;

use framegif_core::EncodedAnimation;

use crate::blob::{BlobError, ObjectUrl};
use crate::download;

/// An encoded animation together with the object URL the preview shows.
///
/// Dropping the asset revokes the URL.
#[derive(Debug)]
pub struct PreviewAsset {
    pub animation: EncodedAnimation,
    url: ObjectUrl,
}

impl PreviewAsset {
    /// # Errors
    ///
    /// Returns [`BlobError`] if the object URL cannot be created.
    pub fn new(animation: EncodedAnimation) -> Result<Self, BlobError> {
        let url = ObjectUrl::from_bytes(&animation.bytes, animation.mime_type())?;
        Ok(Self { animation, url })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Props for the [`ResultPreview`] component.
#[derive(Props, Clone)]
pub struct ResultPreviewProps {
    /// `None` hides the preview.
    #[props(!optional)]
    asset: Option<Rc<PreviewAsset>>,
}

impl PartialEq for ResultPreviewProps {
    fn eq(&self, other: &Self) -> bool {
        match (&self.asset, &other.asset) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[component]
pub fn ResultPreview(props: ResultPreviewProps) -> Element {
    let mut download_error = use_signal(|| Option::<String>::None);

    let Some(asset) = props.asset else {
        return rsx! {};
    };

    let label = asset.animation.download_label();
    let file_name = asset.animation.file_name();
    let url = asset.url().to_owned();
    let on_download = {
        let asset = Rc::clone(&asset);
        move |_| match download::download_animation(&asset.animation) {
            Ok(()) => download_error.set(None),
            Err(e) => download_error.set(Some(format!("Download failed: {e}"))),
        }
    };

    rsx! {
        div { class: "result",
            img { class: "gif-preview", src: "{url}", alt: "{file_name}" }
            button {
                class: "download-link",
                onclick: on_download,
                Icon { width: 14, height: 14, icon: LdDownload }
                "{label}"
            }
            if let Some(ref err) = download_error() {
                p { class: "status error", "{err}" }
            }
        }
    }
}
