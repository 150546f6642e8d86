//! Host and UI configuration.
//!
//! Export scale, debounce delays, the pipeline variant and the
//! partial-failure behavior are all configurable. All structs load from
//! JSON and fall back to the defaults for missing fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::AnimationFormat;

/// Errors from [`HostConfig::validate`] and [`UiConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The JSON could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Where the animation gets assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineVariant {
    /// Host sends base64 PNGs (`frame-images`); the UI runs the encoder.
    #[default]
    UiEncode,
    /// Host runs the encoder itself and sends the finished bytes
    /// (`success`).
    HostEncode,
}

/// What the host does when some requested ids fail to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialFailurePolicy {
    /// Log and skip the frame; fail only when nothing is left.
    #[default]
    SkipInvalid,
    /// The first failing id aborts the whole batch.
    AbortBatch,
}

/// What the UI does with a finished animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultDelivery {
    /// Show a preview and a download affordance.
    #[default]
    Preview,
    /// Additionally hand the bytes to the host as base64 (`gif-data`).
    ForwardToHost,
}

/// Loop behavior of the encoded GIF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repeat {
    #[default]
    Infinite,
    /// Play this many times after the first pass.
    Finite(u16),
}

/// GIF encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GifSettings {
    /// Color quantization quality, 1 (best, slowest) to 30 (fastest).
    pub quality: u8,
    pub repeat: Repeat,
}

impl GifSettings {
    pub const DEFAULT_QUALITY: u8 = 10;
    pub const MIN_QUALITY: u8 = 1;
    pub const MAX_QUALITY: u8 = 30;

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if `quality` is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Self::MIN_QUALITY..=Self::MAX_QUALITY).contains(&self.quality) {
            return Err(ConfigError::InvalidConfig(format!(
                "gif quality must be between {} and {}, got {}",
                Self::MIN_QUALITY,
                Self::MAX_QUALITY,
                self.quality
            )));
        }
        Ok(())
    }
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            quality: Self::DEFAULT_QUALITY,
            repeat: Repeat::default(),
        }
    }
}

/// Host-side configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Render scale passed to the document's PNG export.
    pub export_scale: f32,
    pub pipeline: PipelineVariant,
    pub partial_failure: PartialFailurePolicy,
    /// Settle time after a selection change before the list is pushed.
    pub selection_debounce_ms: u64,
    /// Delay before the very first frame-list push, giving the UI time
    /// to load.
    pub initial_push_delay_ms: u64,
    /// Encoder settings for [`PipelineVariant::HostEncode`].
    pub gif: GifSettings,
}

impl HostConfig {
    pub const DEFAULT_EXPORT_SCALE: f32 = 2.0;
    pub const MAX_EXPORT_SCALE: f32 = 4.0;
    pub const DEFAULT_SELECTION_DEBOUNCE_MS: u64 = 100;
    pub const DEFAULT_INITIAL_PUSH_DELAY_MS: u64 = 500;

    #[must_use]
    pub const fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    #[must_use]
    pub const fn initial_push_delay(&self) -> Duration {
        Duration::from_millis(self.initial_push_delay_ms)
    }

    /// Parse a JSON config, then validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the export scale is not
    /// in `(0, MAX_EXPORT_SCALE]` or the GIF settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.export_scale > 0.0 && self.export_scale <= Self::MAX_EXPORT_SCALE) {
            return Err(ConfigError::InvalidConfig(format!(
                "export scale must be in (0, {}], got {}",
                Self::MAX_EXPORT_SCALE,
                self.export_scale
            )));
        }
        self.gif.validate()
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            export_scale: Self::DEFAULT_EXPORT_SCALE,
            pipeline: PipelineVariant::default(),
            partial_failure: PartialFailurePolicy::default(),
            selection_debounce_ms: Self::DEFAULT_SELECTION_DEBOUNCE_MS,
            initial_push_delay_ms: Self::DEFAULT_INITIAL_PUSH_DELAY_MS,
            gif: GifSettings::default(),
        }
    }
}

/// UI-side configuration: the user's conversion choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub format: AnimationFormat,
    /// Per-frame delay in milliseconds.
    pub frame_delay_ms: u32,
    pub delivery: ResultDelivery,
}

impl UiConfig {
    pub const DEFAULT_FRAME_DELAY_MS: u32 = 200;
    pub const MIN_FRAME_DELAY_MS: u32 = 10;
    pub const MAX_FRAME_DELAY_MS: u32 = 10_000;

    /// Clamp a user-entered delay into the accepted range.
    #[must_use]
    pub fn clamp_frame_delay(ms: u32) -> u32 {
        ms.clamp(Self::MIN_FRAME_DELAY_MS, Self::MAX_FRAME_DELAY_MS)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the frame delay is out
    /// of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Self::clamp_frame_delay(self.frame_delay_ms) != self.frame_delay_ms {
            return Err(ConfigError::InvalidConfig(format!(
                "frame delay must be between {} and {} ms, got {}",
                Self::MIN_FRAME_DELAY_MS,
                Self::MAX_FRAME_DELAY_MS,
                self.frame_delay_ms
            )));
        }
        Ok(())
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            format: AnimationFormat::default(),
            frame_delay_ms: Self::DEFAULT_FRAME_DELAY_MS,
            delivery: ResultDelivery::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_plugin() {
        let host = HostConfig::default();
        assert!((host.export_scale - 2.0).abs() < f32::EPSILON);
        assert_eq!(host.selection_debounce(), Duration::from_millis(100));
        assert_eq!(host.initial_push_delay(), Duration::from_millis(500));
        assert_eq!(host.pipeline, PipelineVariant::UiEncode);
        assert!(host.validate().is_ok());

        let ui = UiConfig::default();
        assert_eq!(ui.frame_delay_ms, 200);
        assert_eq!(ui.format, AnimationFormat::Gif);
        assert!(ui.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            HostConfig::from_json(r#"{"pipeline":"host-encode","partial_failure":"abort-batch"}"#)
                .unwrap();
        assert_eq!(config.pipeline, PipelineVariant::HostEncode);
        assert_eq!(config.partial_failure, PartialFailurePolicy::AbortBatch);
        assert_eq!(config.selection_debounce_ms, 100);
        assert_eq!(config.gif, GifSettings::default());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            HostConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_bad_scale() {
        for scale in [0.0, -1.0, 4.5, f32::NAN] {
            let config = HostConfig {
                export_scale: scale,
                ..HostConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidConfig(_))),
                "scale {scale} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_quality() {
        let gif = GifSettings {
            quality: 0,
            ..GifSettings::default()
        };
        assert!(gif.validate().is_err());
        let gif = GifSettings {
            quality: 31,
            ..GifSettings::default()
        };
        assert!(gif.validate().is_err());
    }

    #[test]
    fn frame_delay_is_clamped() {
        assert_eq!(UiConfig::clamp_frame_delay(0), 10);
        assert_eq!(UiConfig::clamp_frame_delay(200), 200);
        assert_eq!(UiConfig::clamp_frame_delay(60_000), 10_000);
        let ui = UiConfig {
            frame_delay_ms: 5,
            ..UiConfig::default()
        };
        assert!(ui.validate().is_err());
    }

    #[test]
    fn repeat_round_trips_through_json() {
        let json = serde_json::to_string(&Repeat::Finite(3)).unwrap();
        assert_eq!(json, r#"{"finite":3}"#);
        assert_eq!(serde_json::from_str::<Repeat>(&json).unwrap(), Repeat::Finite(3));
    }
}
