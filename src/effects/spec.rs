use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    KenBurnsConfig, KenBurnsEffect, SubtitleConfig, SubtitleOverlay, TransitionEffect,
    TransitionType, VideoEffect, WatermarkConfig, WatermarkOverlay,
};
use crate::error::{CompositorError, Result, ValidationError};
use crate::video::types::serde_secs;

/// Declarative form of a single effect, as written in TOML
///
/// `type` selects the effect and the matching table carries its settings:
///
/// ```toml
/// [[effects]]
/// type = "subtitle"
/// subtitle = { text = "Once upon a time", font_size = 48, duration = 3.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ken_burns: Option<KenBurnsSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<SubtitleConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkConfig>,
}

/// Ken Burns settings plus the length of the shot they animate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KenBurnsSpec {
    #[serde(flatten)]
    pub config: KenBurnsConfig,

    #[serde(with = "serde_secs")]
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(rename = "type")]
    pub kind: TransitionType,

    #[serde(with = "serde_secs")]
    pub duration: Duration,

    #[serde(default, with = "serde_secs")]
    pub offset: Duration,
}

/// A file holding an ordered list of effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectsFile {
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

impl EffectsFile {
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl TryFrom<&EffectSpec> for VideoEffect {
    type Error = CompositorError;

    fn try_from(spec: &EffectSpec) -> Result<Self> {
        match spec.kind.as_str() {
            "kenburns" | "ken_burns" | "ken-burns" => {
                let kb = spec
                    .ken_burns
                    .as_ref()
                    .ok_or(ValidationError::MissingEffectParameters { effect: "Ken Burns" })?;
                let params = KenBurnsEffect::new().calculate_parameters(&kb.config, kb.duration)?;
                Ok(Self::KenBurns(params))
            }
            "transition" => {
                let transition = spec
                    .transition
                    .as_ref()
                    .ok_or(ValidationError::MissingEffectParameters { effect: "transition" })?;
                let mut params =
                    TransitionEffect::new().calculate_parameters(transition.kind, transition.duration)?;
                params.offset = transition.offset;
                Ok(Self::Transition(params))
            }
            "subtitle" => {
                let subtitle = spec
                    .subtitle
                    .as_ref()
                    .ok_or(ValidationError::MissingEffectParameters { effect: "subtitle" })?;
                Ok(Self::Subtitle(SubtitleOverlay::new().calculate_parameters(subtitle)?))
            }
            "watermark" => {
                let watermark = spec
                    .watermark
                    .as_ref()
                    .ok_or(ValidationError::MissingEffectParameters { effect: "watermark" })?;
                Ok(Self::Watermark(WatermarkOverlay::new().calculate_parameters(watermark)?))
            }
            other => Err(ValidationError::UnknownEffect {
                tag: other.to_string(),
            }
            .into()),
        }
    }
}

impl TryFrom<EffectSpec> for VideoEffect {
    type Error = CompositorError;

    fn try_from(spec: EffectSpec) -> Result<Self> {
        VideoEffect::try_from(&spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{SubtitlePosition, WatermarkPosition};
    use crate::error::ErrorKind;

    const EFFECTS: &str = r#"
        [[effects]]
        type = "kenburns"
        ken_burns = { start_zoom = 1.0, end_zoom = 1.2, start_x = 0.5, start_y = 0.5, end_x = 0.4, end_y = 0.4, duration = 3 }

        [[effects]]
        type = "transition"
        transition = { type = "fade-out", duration = 1.0, offset = 2.0 }

        [[effects]]
        type = "subtitle"
        subtitle = { text = "Hello", font_size = 36, duration = 2.0 }

        [[effects]]
        type = "watermark"
        watermark = { image_path = "logo.png", scale = 0.1, opacity = 0.5 }
    "#;

    #[test]
    fn test_effects_file_converts_in_order() {
        let file = EffectsFile::from_toml(EFFECTS).unwrap();
        assert_eq!(file.effects.len(), 4);

        let effects: Vec<VideoEffect> = file
            .effects
            .iter()
            .map(VideoEffect::try_from)
            .collect::<Result<_>>()
            .unwrap();

        let names: Vec<&str> = effects.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["kenburns", "transition", "subtitle", "watermark"]);

        match &effects[1] {
            VideoEffect::Transition(params) => {
                assert_eq!(params.kind, TransitionType::FadeOut);
                assert_eq!(params.offset, Duration::from_secs(2));
            }
            other => panic!("expected a transition, got {other:?}"),
        }
        match &effects[2] {
            VideoEffect::Subtitle(params) => {
                let (x, y) = SubtitlePosition::Bottom.coordinates();
                assert_eq!((params.x.clone(), params.y.clone()), (x, y));
                assert_eq!(params.font_color, "#FFFFFF");
            }
            other => panic!("expected a subtitle, got {other:?}"),
        }
        match &effects[3] {
            VideoEffect::Watermark(params) => {
                let (x, y) = WatermarkPosition::BottomRight.coordinates();
                assert_eq!((params.x.as_str(), params.y.as_str()), (x, y));
            }
            other => panic!("expected a watermark, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let spec = EffectSpec {
            kind: "sparkle".to_string(),
            ken_burns: None,
            transition: None,
            subtitle: None,
            watermark: None,
        };

        let err = VideoEffect::try_from(&spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("sparkle"));
    }

    #[test]
    fn test_unknown_position_fails_to_parse() {
        let result = EffectsFile::from_toml(
            r#"
            [[effects]]
            type = "subtitle"
            subtitle = { text = "Hi", font_size = 20, duration = 1.0, position = "middle" }
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_calculator_errors_propagate() {
        let mut file = EffectsFile::from_toml(EFFECTS).unwrap();
        if let Some(kb) = file.effects[0].ken_burns.as_mut() {
            kb.config.end_zoom = 4.0;
        }

        let err = VideoEffect::try_from(&file.effects[0]).unwrap_err();
        assert!(err.to_string().contains("end_zoom"));
    }
}
