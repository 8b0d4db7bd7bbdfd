//! # Effects
//!
//! Calculators that validate declarative effect settings and render them as
//! ffmpeg filter fragments, plus the chain builder that stitches fragments
//! into one filter graph.
//!
//! ## Built-in Effects
//!
//! - **Ken Burns**: linear pan and zoom across a still image
//! - **Transition**: crossfade and fades between scenes
//! - **Subtitle**: timed text drawn at a fixed screen position
//! - **Watermark**: an image overlaid in a corner or the center
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use shorts_compositor::effects::{EffectChain, KenBurnsConfig, KenBurnsEffect, VideoEffect};
//!
//! let params = KenBurnsEffect::new()
//!     .calculate_parameters(&KenBurnsConfig::default(), Duration::from_secs(3))
//!     .unwrap();
//! let graph = EffectChain::new().build_complex_filter(&[VideoEffect::KenBurns(params)], 1080, 1920, 30);
//! assert!(graph.starts_with("[0:v]zoompan="));
//! ```

pub mod chain;
pub mod ken_burns;
pub mod spec;
pub mod subtitle;
pub mod transition;
pub mod watermark;

pub use chain::{EffectChain, VideoEffect};
pub use ken_burns::{KenBurnsConfig, KenBurnsEffect, KenBurnsParams};
pub use spec::{EffectSpec, EffectsFile, KenBurnsSpec, TransitionSpec};
pub use subtitle::{SubtitleConfig, SubtitleOverlay, SubtitleParams, SubtitlePosition};
pub use transition::{TransitionEffect, TransitionParams, TransitionType};
pub use watermark::{WatermarkConfig, WatermarkOverlay, WatermarkParams, WatermarkPosition};

use crate::error::{Result, ValidationError};

/// Reject `value` unless it lies in `[min, max]`; NaN is always rejected
pub(crate) fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        }
        .into())
    }
}
