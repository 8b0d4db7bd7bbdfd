use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result, ValidationError};

/// Kind of transition between scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionType {
    Crossfade,
    #[serde(alias = "fade-in", alias = "fade_in")]
    FadeIn,
    #[serde(alias = "fade-out", alias = "fade_out")]
    FadeOut,
    Wipe,
    Slide,
}

impl TransitionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crossfade => "crossfade",
            Self::FadeIn => "fadein",
            Self::FadeOut => "fadeout",
            Self::Wipe => "wipe",
            Self::Slide => "slide",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionType {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "crossfade" => Ok(Self::Crossfade),
            "fadein" | "fade-in" | "fade_in" => Ok(Self::FadeIn),
            "fadeout" | "fade-out" | "fade_out" => Ok(Self::FadeOut),
            "wipe" => Ok(Self::Wipe),
            "slide" => Ok(Self::Slide),
            _ => Err(ValidationError::UnknownVariant {
                kind: "transition type",
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Validated transition settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionParams {
    pub kind: TransitionType,
    pub duration: Duration,
    /// Time offset from the start of the clip
    pub offset: Duration,
}

/// Scene transition calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEffect;

impl TransitionEffect {
    pub fn new() -> Self {
        Self
    }

    /// Validate a transition; the offset starts at zero
    pub fn calculate_parameters(&self, kind: TransitionType, duration: Duration) -> Result<TransitionParams> {
        if duration.is_zero() {
            return Err(ValidationError::NotPositive {
                field: "transition duration",
                value: 0.0,
            }
            .into());
        }

        Ok(TransitionParams {
            kind,
            duration,
            offset: Duration::ZERO,
        })
    }

    /// Generate the filter fragment for a transition at `fps`
    ///
    /// Wipe and slide have no dedicated fragment and render as a crossfade.
    pub fn generate_filter_expression(&self, params: &TransitionParams, fps: u32) -> String {
        let secs = params.duration.as_secs_f64();
        let offset = params.offset.as_secs_f64();
        let frames = (secs * fps as f64) as i64;

        match params.kind {
            TransitionType::FadeIn => format!("fade=in:0:{}", frames),
            TransitionType::FadeOut => {
                let start_frame = (offset * fps as f64) as i64;
                format!("fade=out:{}:{}", start_frame, frames)
            }
            TransitionType::Crossfade | TransitionType::Wipe | TransitionType::Slide => {
                format!("xfade=transition=fade:duration={:.1}:offset={:.0}", secs, offset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const ALL: [TransitionType; 5] = [
        TransitionType::Crossfade,
        TransitionType::FadeIn,
        TransitionType::FadeOut,
        TransitionType::Wipe,
        TransitionType::Slide,
    ];

    #[test]
    fn test_zero_duration_always_fails() {
        let effect = TransitionEffect::new();
        for kind in ALL {
            let err = effect.calculate_parameters(kind, Duration::ZERO).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_positive_duration_with_known_type_succeeds() {
        let effect = TransitionEffect::new();
        for kind in ALL {
            let params = effect
                .calculate_parameters(kind, Duration::from_millis(1))
                .unwrap();
            assert_eq!(params.kind, kind);
            assert_eq!(params.offset, Duration::ZERO);
        }
    }

    #[test]
    fn test_type_names_parse() {
        for kind in ALL {
            assert_eq!(kind.as_str().parse::<TransitionType>().unwrap(), kind);
        }
        assert_eq!("fade-in".parse::<TransitionType>().unwrap(), TransitionType::FadeIn);
        assert_eq!("FadeOut".parse::<TransitionType>().unwrap(), TransitionType::FadeOut);

        let err = "dissolve".parse::<TransitionType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("dissolve"));
    }

    #[test]
    fn test_filter_fragments() {
        let effect = TransitionEffect::new();
        let crossfade = TransitionParams {
            kind: TransitionType::Crossfade,
            duration: Duration::from_millis(500),
            offset: Duration::ZERO,
        };
        assert_eq!(
            effect.generate_filter_expression(&crossfade, 30),
            "xfade=transition=fade:duration=0.5:offset=0"
        );

        let fade_in = TransitionParams {
            kind: TransitionType::FadeIn,
            duration: Duration::from_secs(1),
            offset: Duration::ZERO,
        };
        assert_eq!(effect.generate_filter_expression(&fade_in, 30), "fade=in:0:30");

        let fade_out = TransitionParams {
            kind: TransitionType::FadeOut,
            duration: Duration::from_secs(1),
            offset: Duration::from_secs(2),
        };
        assert_eq!(effect.generate_filter_expression(&fade_out, 30), "fade=out:60:30");

        let wipe = TransitionParams {
            kind: TransitionType::Wipe,
            ..crossfade
        };
        assert_eq!(
            effect.generate_filter_expression(&wipe, 30),
            effect.generate_filter_expression(&crossfade, 30)
        );
    }
}
