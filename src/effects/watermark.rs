use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CompositorError, Result, ValidationError};

/// Where the watermark sits on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl WatermarkPosition {
    pub const ALL: [WatermarkPosition; 5] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Center,
    ];

    /// overlay x/y expressions for this position, 20px from the edges
    pub fn coordinates(&self) -> (&'static str, &'static str) {
        match self {
            Self::TopLeft => ("20", "20"),
            Self::TopRight => ("main_w-overlay_w-20", "20"),
            Self::BottomLeft => ("20", "main_h-overlay_h-20"),
            Self::BottomRight => ("main_w-overlay_w-20", "main_h-overlay_h-20"),
            Self::Center => ("(main_w-overlay_w)/2", "(main_h-overlay_h)/2"),
        }
    }
}

impl FromStr for WatermarkPosition {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            "center" => Ok(Self::Center),
            _ => Err(ValidationError::UnknownVariant {
                kind: "watermark position",
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Watermark overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    pub image_path: PathBuf,

    #[serde(default)]
    pub position: WatermarkPosition,

    /// Scale factor (0.1 = 10% of original size)
    pub scale: f64,

    /// Opacity (1.0 = fully opaque)
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkParams {
    pub image_path: PathBuf,
    pub x: String,
    pub y: String,
    pub scale: f64,
    pub opacity: f64,
}

/// Watermark overlay calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkOverlay;

impl WatermarkOverlay {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_parameters(&self, config: &WatermarkConfig) -> Result<WatermarkParams> {
        if config.image_path.as_os_str().is_empty() {
            return Err(ValidationError::Required {
                field: "watermark image path",
            }
            .into());
        }

        // scale is half-open: (0.0, 1.0]
        if !(config.scale > 0.0 && config.scale <= 1.0) {
            return Err(ValidationError::OutOfRange {
                field: "scale",
                value: config.scale,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }

        crate::effects::check_range("opacity", config.opacity, 0.0, 1.0)?;

        let (x, y) = config.position.coordinates();

        Ok(WatermarkParams {
            image_path: config.image_path.clone(),
            x: x.to_string(),
            y: y.to_string(),
            scale: config.scale,
            opacity: config.opacity,
        })
    }

    /// Generate the overlay fragment; it names its own two inputs
    pub fn generate_filter_expression(&self, params: &WatermarkParams) -> String {
        format!("[0:v][1:v]overlay={}:{}:format=auto:alpha=1", params.x, params.y)
    }
}
