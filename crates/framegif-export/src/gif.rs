//! Animated GIF encoder.
//!
//! Frames arrive as PNG bytes, in playback order. The first frame fixes
//! the canvas size; later frames of a different size are placed at the
//! top-left corner of a transparent canvas and cropped to it.
//!
//! Color quantization runs per frame with the `image` crate's NeuQuant
//! backend; [`GifSettings::quality`] is passed through as the sampling
//! speed (1 = best, 30 = fastest).

use std::time::Duration;

use image::codecs::gif;
use image::{Delay, Frame, RgbaImage, imageops};
use log::debug;

use framegif_core::{AnimationEncoder, GifSettings, Repeat};

/// Errors that can occur while assembling an animation.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// `render` was called before any frame was added.
    #[error("no frames to encode")]
    NoFrames,

    /// A frame's PNG bytes could not be decoded.
    #[error("failed to decode frame {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    /// The GIF writer failed.
    #[error("GIF encoding failed: {0}")]
    Gif(#[source] image::ImageError),
}

/// Streaming GIF encoder over decoded RGBA frames.
#[derive(Debug, Clone)]
pub struct GifEncoder {
    settings: GifSettings,
    frames: Vec<(RgbaImage, Delay)>,
}

impl GifEncoder {
    #[must_use]
    pub const fn new(settings: &GifSettings) -> Self {
        Self {
            settings: *settings,
            frames: Vec::new(),
        }
    }

    #[cfg(test)]
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Canvas size, fixed by the first frame.
    #[must_use]
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|(img, _)| img.dimensions())
    }

    fn speed(&self) -> i32 {
        i32::from(
            self.settings
                .quality
                .clamp(GifSettings::MIN_QUALITY, GifSettings::MAX_QUALITY),
        )
    }

    const fn repeat(&self) -> gif::Repeat {
        match self.settings.repeat {
            Repeat::Infinite => gif::Repeat::Infinite,
            Repeat::Finite(n) => gif::Repeat::Finite(n),
        }
    }
}

impl AnimationEncoder for GifEncoder {
    type Error = EncodeError;

    fn add_frame(&mut self, png: &[u8], delay_ms: u32) -> Result<(), EncodeError> {
        let index = self.frames.len();
        let image = image::load_from_memory(png)
            .map_err(|source| EncodeError::Decode { index, source })?
            .to_rgba8();

        let image = match self.canvas_size() {
            Some((width, height)) if image.dimensions() != (width, height) => {
                debug!(
                    "frame {index} is {}x{}, fitting to {width}x{height} canvas",
                    image.width(),
                    image.height()
                );
                fit_to_canvas(&image, width, height)
            }
            _ => image,
        };

        let delay = Delay::from_saturating_duration(Duration::from_millis(u64::from(delay_ms)));
        self.frames.push((image, delay));
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn render(self, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, EncodeError> {
        if self.frames.is_empty() {
            return Err(EncodeError::NoFrames);
        }
        let total = self.frames.len();
        let speed = self.speed();
        let repeat = self.repeat();

        let mut out = Vec::new();
        {
            // The trailer is written when the writer is dropped.
            let mut writer = gif::GifEncoder::new_with_speed(&mut out, speed);
            writer.set_repeat(repeat).map_err(EncodeError::Gif)?;
            for (i, (image, delay)) in self.frames.into_iter().enumerate() {
                writer
                    .encode_frame(Frame::from_parts(image, 0, 0, delay))
                    .map_err(EncodeError::Gif)?;
                progress((i + 1) as f32 / total as f32);
            }
        }
        debug!("encoded {total} frame(s) into {} bytes", out.len());
        Ok(out)
    }
}

/// Place `image` at the origin of a transparent `width` x `height`
/// canvas, cropping whatever falls outside.
fn fit_to_canvas(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    imageops::replace(&mut canvas, image, 0, 0);
    canvas
}

/// Encode PNG frames into a GIF in one call.
///
/// # Errors
///
/// Returns [`EncodeError::NoFrames`] for an empty input, or the first
/// decode or encode error.
pub fn to_gif<'a, I>(
    frames: I,
    delay_ms: u32,
    settings: &GifSettings,
) -> Result<Vec<u8>, EncodeError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut encoder = GifEncoder::new(settings);
    for png in frames {
        encoder.add_frame(png, delay_ms)?;
    }
    encoder.render(&mut |_| {})
}
