//! Encode jobs run away from the UI thread.
//!
//! A web worker receives the PNG frames as raw buffers plus an
//! [`EncodeRequest`] as JSON, runs [`run_job`], and reports every
//! [`EncodeEvent`] back to the page. Both sides share these types so
//! the JSON stays in sync.

use serde::{Deserialize, Serialize};

use framegif_core::{AnimationEncoder, EncodeProgress, GifSettings};

use crate::gif::{EncodeError, GifEncoder};

/// Everything the encoder needs besides the frames themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    pub delay_ms: u32,
    #[serde(default)]
    pub settings: GifSettings,
}

/// Events reported while a job runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EncodeEvent {
    Progress { progress: EncodeProgress },
    /// The animation is ready; the bytes travel next to the event.
    Finished { size: usize },
    Failed { message: String },
}

/// Encode `frames` in order, reporting progress after every added frame
/// and during rendering.
///
/// # Errors
///
/// Returns the first [`EncodeError`] from decoding or encoding.
pub fn run_job<F>(
    frames: &[Vec<u8>],
    request: &EncodeRequest,
    mut on_event: F,
) -> Result<Vec<u8>, EncodeError>
where
    F: FnMut(EncodeEvent),
{
    let total = frames.len();
    let mut encoder = GifEncoder::new(&request.settings);
    for (i, png) in frames.iter().enumerate() {
        encoder.add_frame(png, request.delay_ms)?;
        on_event(EncodeEvent::Progress {
            progress: EncodeProgress::Adding { done: i + 1, total },
        });
    }
    encoder.render(&mut |fraction: f32| {
        on_event(EncodeEvent::Progress {
            progress: EncodeProgress::Rendering { fraction },
        });
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, Rgba, RgbaImage};

    use super::*;

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba(rgba));
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), 4, 4, image::ExtendedColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn reports_adding_then_rendering() {
        let frames = vec![png([255, 0, 0, 255]), png([0, 0, 255, 255])];
        let request = EncodeRequest {
            delay_ms: 200,
            settings: GifSettings::default(),
        };
        let mut events = Vec::new();
        let gif = run_job(&frames, &request, |e| events.push(e)).unwrap();
        assert!(gif.starts_with(b"GIF89a"));

        let percents: Vec<u8> = events
            .iter()
            .map(|e| match e {
                EncodeEvent::Progress { progress } => progress.percent(),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(percents, [25, 50, 70, 90]);
    }

    #[test]
    fn empty_job_fails() {
        let request = EncodeRequest {
            delay_ms: 100,
            settings: GifSettings::default(),
        };
        assert!(matches!(
            run_job(&[], &request, |_| {}),
            Err(EncodeError::NoFrames)
        ));
    }

    #[test]
    fn request_json_is_camel_case() {
        let request: EncodeRequest = serde_json::from_str(r#"{"delayMs":150}"#).unwrap();
        assert_eq!(request.delay_ms, 150);
        assert_eq!(request.settings, GifSettings::default());
    }

    #[test]
    fn event_json_shape() {
        let json = serde_json::to_string(&EncodeEvent::Finished { size: 12 }).unwrap();
        assert_eq!(json, r#"{"kind":"finished","size":12}"#);
    }
}
