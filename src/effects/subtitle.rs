use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result, ValidationError};
use crate::video::types::serde_secs;

/// Padding from the frame edge, in pixels
const EDGE_PADDING: &str = "50";

/// Where subtitles are drawn on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtitlePosition {
    #[default]
    Bottom,
    Top,
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SubtitlePosition {
    pub const ALL: [SubtitlePosition; 7] = [
        Self::Bottom,
        Self::Top,
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// drawtext x/y expressions for this position
    pub fn coordinates(&self) -> (String, String) {
        let centered_x = "(w-text_w)/2".to_string();
        let right_x = format!("w-text_w-{}", EDGE_PADDING);
        let bottom_y = format!("h-text_h-{}", EDGE_PADDING);
        let edge = EDGE_PADDING.to_string();

        match self {
            Self::Bottom => (centered_x, bottom_y),
            Self::Top => (centered_x, edge),
            Self::Center => (centered_x, "(h-text_h)/2".to_string()),
            Self::TopLeft => (edge.clone(), edge),
            Self::TopRight => (right_x, edge),
            Self::BottomLeft => (edge, bottom_y),
            Self::BottomRight => (right_x, bottom_y),
        }
    }
}

impl FromStr for SubtitlePosition {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bottom" => Ok(Self::Bottom),
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            _ => Err(ValidationError::UnknownVariant {
                kind: "subtitle position",
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Subtitle overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleConfig {
    pub text: String,

    #[serde(default)]
    pub position: SubtitlePosition,

    pub font_size: u32,

    /// Font color (e.g. "#FFFFFF")
    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Box color behind the text; empty for no box
    #[serde(default)]
    pub bg_color: String,

    #[serde(with = "serde_secs")]
    pub duration: Duration,

    #[serde(default, with = "serde_secs")]
    pub start_time: Duration,
}

fn default_font_color() -> String {
    "#FFFFFF".to_string()
}

/// Validated subtitle settings with resolved coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleParams {
    pub text: String,
    pub x: String,
    pub y: String,
    pub font_size: u32,
    pub font_color: String,
    pub bg_color: String,
    pub duration: Duration,
    pub start_time: Duration,
}

/// Subtitle overlay calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtitleOverlay;

impl SubtitleOverlay {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_parameters(&self, config: &SubtitleConfig) -> Result<SubtitleParams> {
        if config.text.is_empty() {
            return Err(ValidationError::Required { field: "subtitle text" }.into());
        }
        if config.font_size == 0 {
            return Err(ValidationError::NotPositive {
                field: "font_size",
                value: 0.0,
            }
            .into());
        }

        let (x, y) = config.position.coordinates();

        Ok(SubtitleParams {
            text: config.text.clone(),
            x,
            y,
            font_size: config.font_size,
            font_color: config.font_color.clone(),
            bg_color: config.bg_color.clone(),
            duration: config.duration,
            start_time: config.start_time,
        })
    }

    /// Generate a drawtext fragment gated to the subtitle's time window
    pub fn generate_filter_expression(&self, params: &SubtitleParams) -> String {
        let mut filter = format!(
            "drawtext=text='{}':fontsize={}:fontcolor={}",
            escape_drawtext(&params.text),
            params.font_size,
            params.font_color
        );

        if !params.bg_color.is_empty() {
            filter.push_str(&format!(":box=1:boxcolor={}", params.bg_color));
        }

        filter.push_str(&format!(":x={}:y={}", params.x, params.y));

        let start = params.start_time.as_secs_f64();
        let end = start + params.duration.as_secs_f64();
        filter.push_str(&format!(":enable='between(t,{:.1},{:.1})'", start, end));

        filter
    }
}

/// Escape characters that would end the quoted drawtext value
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '\'' | ':' | '%') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config(text: &str, position: SubtitlePosition, bg: &str) -> SubtitleConfig {
        SubtitleConfig {
            text: text.to_string(),
            position,
            font_size: 48,
            font_color: "#FFFFFF".to_string(),
            bg_color: bg.to_string(),
            duration: Duration::from_secs(3),
            start_time: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_position_table() {
        let expected = [
            (SubtitlePosition::Bottom, "(w-text_w)/2", "h-text_h-50"),
            (SubtitlePosition::Top, "(w-text_w)/2", "50"),
            (SubtitlePosition::Center, "(w-text_w)/2", "(h-text_h)/2"),
            (SubtitlePosition::TopLeft, "50", "50"),
            (SubtitlePosition::TopRight, "w-text_w-50", "50"),
            (SubtitlePosition::BottomLeft, "50", "h-text_h-50"),
            (SubtitlePosition::BottomRight, "w-text_w-50", "h-text_h-50"),
        ];
        assert_eq!(expected.len(), SubtitlePosition::ALL.len());

        for (position, x, y) in expected {
            assert_eq!(position.coordinates(), (x.to_string(), y.to_string()));
        }
    }

    #[test]
    fn test_position_names_round_trip() {
        for position in SubtitlePosition::ALL {
            let name = toml::Value::try_from(position).unwrap();
            let parsed: SubtitlePosition = name.as_str().unwrap().parse().unwrap();
            assert_eq!(parsed, position);
        }
        assert!("middle".parse::<SubtitlePosition>().is_err());
    }

    #[test]
    fn test_rejects_empty_text_and_zero_font() {
        let overlay = SubtitleOverlay::new();

        let err = overlay
            .calculate_parameters(&config("", SubtitlePosition::Bottom, ""))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut cfg = config("hello", SubtitlePosition::Bottom, "");
        cfg.font_size = 0;
        assert!(overlay.calculate_parameters(&cfg).is_err());
    }

    #[test]
    fn test_filter_with_background_box() {
        let overlay = SubtitleOverlay::new();
        let params = overlay
            .calculate_parameters(&config("Test subtitle", SubtitlePosition::Bottom, "#000000"))
            .unwrap();

        assert_eq!(
            overlay.generate_filter_expression(&params),
            "drawtext=text='Test subtitle':fontsize=48:fontcolor=#FFFFFF:box=1:boxcolor=#000000:x=(w-text_w)/2:y=h-text_h-50:enable='between(t,1.0,4.0)'"
        );
    }

    #[test]
    fn test_filter_without_background() {
        let overlay = SubtitleOverlay::new();
        let mut cfg = config("Simple text", SubtitlePosition::TopLeft, "");
        cfg.font_size = 36;
        cfg.font_color = "#FFFF00".to_string();
        cfg.start_time = Duration::ZERO;
        cfg.duration = Duration::from_secs(2);
        let params = overlay.calculate_parameters(&cfg).unwrap();

        assert_eq!(
            overlay.generate_filter_expression(&params),
            "drawtext=text='Simple text':fontsize=36:fontcolor=#FFFF00:x=50:y=50:enable='between(t,0.0,2.0)'"
        );
    }

    #[test]
    fn test_special_characters_are_escaped() {
        assert_eq!(escape_drawtext("It's 5:00"), "It\\'s 5\\:00");
        assert_eq!(escape_drawtext("100%"), "100\\%");
    }
}
