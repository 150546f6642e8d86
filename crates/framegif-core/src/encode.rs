//! The animation encoder seam.
//!
//! The encoder contract mirrors a streaming GIF library: frames are added
//! one by one with a per-frame delay, then `render` produces the file
//! while reporting progress as a fraction in `0.0..=1.0`.
//!
//! `framegif-export` provides the GIF implementation; tests substitute
//! their own.

use std::fmt;

use crate::config::GifSettings;

/// A streaming animation encoder.
pub trait AnimationEncoder {
    /// Error reported by [`add_frame`](Self::add_frame) and
    /// [`render`](Self::render).
    type Error: fmt::Display;

    /// Append one PNG-encoded frame shown for `delay_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Implementation-defined, typically a PNG decode failure.
    fn add_frame(&mut self, png: &[u8], delay_ms: u32) -> Result<(), Self::Error>;

    /// Encode all added frames, reporting progress in `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Implementation-defined, e.g. no frames were added.
    fn render(self, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, Self::Error>;
}

/// Creates a fresh encoder for each conversion.
///
/// Implemented for any `Fn(&GifSettings) -> E`, so constructors such as
/// `GifEncoder::new` can be passed directly.
pub trait EncoderFactory {
    type Encoder: AnimationEncoder;

    fn create(&self, settings: &GifSettings) -> Self::Encoder;
}

impl<E, F> EncoderFactory for F
where
    E: AnimationEncoder,
    F: Fn(&GifSettings) -> E,
{
    type Encoder = E;

    fn create(&self, settings: &GifSettings) -> E {
        self(settings)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    use super::*;

    /// Encoder double that records every frame it is given.
    ///
    /// `render` yields `GIF` followed by one byte per frame holding the
    /// frame's delay divided by 10. The frames themselves are appended
    /// to `log`, which outlives the encoder.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingEncoder {
        pub(crate) frames: Vec<(Vec<u8>, u32)>,
        pub(crate) log: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl RecordingEncoder {
        #[allow(clippy::trivially_copy_pass_by_ref)]
        pub(crate) fn create(_settings: &GifSettings) -> Self {
            Self::default()
        }
    }

    impl AnimationEncoder for RecordingEncoder {
        type Error = Infallible;

        fn add_frame(&mut self, png: &[u8], delay_ms: u32) -> Result<(), Infallible> {
            self.frames.push((png.to_vec(), delay_ms));
            self.log.borrow_mut().push(png.to_vec());
            Ok(())
        }

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        fn render(self, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, Infallible> {
            let mut out = b"GIF".to_vec();
            let total = self.frames.len();
            for (i, (_, delay)) in self.frames.iter().enumerate() {
                out.push((delay / 10) as u8);
                progress((i + 1) as f32 / total as f32);
            }
            Ok(out)
        }
    }

    /// Encoder double whose render always fails.
    #[derive(Debug, Default)]
    pub(crate) struct FailingEncoder;

    impl AnimationEncoder for FailingEncoder {
        type Error = String;

        fn add_frame(&mut self, _png: &[u8], _delay_ms: u32) -> Result<(), String> {
            Ok(())
        }

        fn render(self, _progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>, String> {
            Err("encoder produced no result".into())
        }
    }

    #[test]
    fn factory_closure_creates_encoders() {
        let factory = RecordingEncoder::create;
        let mut encoder = factory.create(&GifSettings::default());
        encoder.add_frame(b"png", 200).ok();
        let mut seen = Vec::new();
        let out = encoder.render(&mut |p| seen.push(p)).ok();
        assert_eq!(out, Some(b"GIF\x14".to_vec()));
        assert_eq!(seen, [1.0]);
    }
}
