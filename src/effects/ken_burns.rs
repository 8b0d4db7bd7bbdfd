use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::effects::check_range;
use crate::error::Result;

/// Frame rate the zoompan frame count is computed at
const ZOOMPAN_FPS: f64 = 30.0;

/// Pan/zoom settings for a still image
///
/// Zoom is a magnification factor (1.0 = no zoom, up to 3.0) and positions are
/// relative to the frame (0.5 = center).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KenBurnsConfig {
    pub start_zoom: f64,
    pub end_zoom: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl Default for KenBurnsConfig {
    fn default() -> Self {
        Self {
            start_zoom: 1.0,
            end_zoom: 1.0,
            start_x: 0.5,
            start_y: 0.5,
            end_x: 0.5,
            end_y: 0.5,
        }
    }
}

/// Validated Ken Burns settings plus the derived motion deltas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KenBurnsParams {
    pub start_zoom: f64,
    pub end_zoom: f64,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub zoom_delta: f64,
    pub x_delta: f64,
    pub y_delta: f64,
    pub duration: Duration,
}

/// Ken Burns (pan and zoom) effect calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct KenBurnsEffect;

impl KenBurnsEffect {
    pub const MIN_ZOOM: f64 = 1.0;
    pub const MAX_ZOOM: f64 = 3.0;

    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration and derive the motion deltas
    pub fn calculate_parameters(
        &self,
        config: &KenBurnsConfig,
        duration: Duration,
    ) -> Result<KenBurnsParams> {
        check_range("start_zoom", config.start_zoom, Self::MIN_ZOOM, Self::MAX_ZOOM)?;
        check_range("end_zoom", config.end_zoom, Self::MIN_ZOOM, Self::MAX_ZOOM)?;
        check_range("start_x", config.start_x, 0.0, 1.0)?;
        check_range("start_y", config.start_y, 0.0, 1.0)?;
        check_range("end_x", config.end_x, 0.0, 1.0)?;
        check_range("end_y", config.end_y, 0.0, 1.0)?;

        Ok(KenBurnsParams {
            start_zoom: config.start_zoom,
            end_zoom: config.end_zoom,
            start_x: config.start_x,
            start_y: config.start_y,
            end_x: config.end_x,
            end_y: config.end_y,
            zoom_delta: config.end_zoom - config.start_zoom,
            x_delta: config.end_x - config.start_x,
            y_delta: config.end_y - config.start_y,
            duration,
        })
    }

    /// Generate the zoompan filter for a frame of `width` x `height`
    ///
    /// Each of z/x/y is a linear ramp from its start value, evaluated per
    /// output frame (`on`).
    pub fn generate_filter_expression(&self, params: &KenBurnsParams, width: u32, height: u32) -> String {
        let start_px_x = params.start_x * width as f64;
        let start_px_y = params.start_y * height as f64;
        let delta_px_x = params.end_x * width as f64 - start_px_x;
        let delta_px_y = params.end_y * height as f64 - start_px_y;

        let secs = params.duration.as_secs_f64();
        let frames = (secs * ZOOMPAN_FPS) as u64;

        let zoom = format!(
            "if(lte(on,0),{start:.1},{start:.1}+({end:.1}-{start:.1})*on/{secs:.1})",
            start = params.start_zoom,
            end = params.end_zoom,
            secs = secs,
        );
        let x = ramp(start_px_x, delta_px_x, secs);
        let y = ramp(start_px_y, delta_px_y, secs);

        format!(
            "zoompan=z='{}':x='{}':y='{}':d={}:s={}x{}",
            zoom, x, y, frames, width, height
        )
    }
}

fn ramp(start: f64, delta: f64, secs: f64) -> String {
    format!(
        "if(lte(on,0),{start:.1},{start:.1}+({delta:.1})*on/{secs:.1})",
        start = start,
        delta = delta,
        secs = secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompositorError, ErrorKind, ValidationError};

    fn config(start_zoom: f64, end_zoom: f64, start: (f64, f64), end: (f64, f64)) -> KenBurnsConfig {
        KenBurnsConfig {
            start_zoom,
            end_zoom,
            start_x: start.0,
            start_y: start.1,
            end_x: end.0,
            end_y: end.1,
        }
    }

    #[test]
    fn test_deltas_hold_across_valid_range() {
        let effect = KenBurnsEffect::new();
        let zooms = [1.0, 1.05, 1.5, 2.25, 3.0];
        let positions = [0.0, 0.1, 0.5, 0.99, 1.0];

        for &start_zoom in &zooms {
            for &end_zoom in &zooms {
                for &p in &positions {
                    let cfg = config(start_zoom, end_zoom, (p, 1.0 - p), (1.0 - p, p));
                    let params = effect
                        .calculate_parameters(&cfg, Duration::from_secs(3))
                        .unwrap();
                    assert!((params.zoom_delta - (end_zoom - start_zoom)).abs() < 1e-9);
                    assert!((params.x_delta - (1.0 - 2.0 * p)).abs() < 1e-9);
                    assert!((params.y_delta - (2.0 * p - 1.0)).abs() < 1e-9);
                    assert_eq!(params.duration, Duration::from_secs(3));
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_values_name_the_field() {
        let effect = KenBurnsEffect::new();
        let cases = [
            (config(0.9, 1.2, (0.5, 0.5), (0.5, 0.5)), "start_zoom"),
            (config(1.0, 3.1, (0.5, 0.5), (0.5, 0.5)), "end_zoom"),
            (config(1.0, 1.2, (-0.1, 0.5), (0.5, 0.5)), "start_x"),
            (config(1.0, 1.2, (0.5, 1.5), (0.5, 0.5)), "start_y"),
            (config(1.0, 1.2, (0.5, 0.5), (1.01, 0.5)), "end_x"),
            (config(1.0, 1.2, (0.5, 0.5), (0.5, f64::NAN)), "end_y"),
        ];

        for (cfg, expected_field) in cases {
            let err = effect
                .calculate_parameters(&cfg, Duration::from_secs(1))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            match err {
                CompositorError::Validation(ValidationError::OutOfRange { field, .. }) => {
                    assert_eq!(field, expected_field)
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_filter_expression_golden_zoom_in() {
        let effect = KenBurnsEffect::new();
        let params = effect
            .calculate_parameters(
                &config(1.0, 1.2, (0.5, 0.5), (0.4, 0.4)),
                Duration::from_secs(3),
            )
            .unwrap();

        assert_eq!(
            effect.generate_filter_expression(&params, 1080, 1920),
            "zoompan=z='if(lte(on,0),1.0,1.0+(1.2-1.0)*on/3.0)':x='if(lte(on,0),540.0,540.0+(-108.0)*on/3.0)':y='if(lte(on,0),960.0,960.0+(-192.0)*on/3.0)':d=90:s=1080x1920"
        );
    }

    #[test]
    fn test_filter_expression_golden_zoom_out() {
        let effect = KenBurnsEffect::new();
        let params = effect
            .calculate_parameters(
                &config(1.3, 1.0, (0.3, 0.3), (0.7, 0.7)),
                Duration::from_secs(2),
            )
            .unwrap();

        assert_eq!(
            effect.generate_filter_expression(&params, 1080, 1920),
            "zoompan=z='if(lte(on,0),1.3,1.3+(1.0-1.3)*on/2.0)':x='if(lte(on,0),324.0,324.0+(432.0)*on/2.0)':y='if(lte(on,0),576.0,576.0+(768.0)*on/2.0)':d=60:s=1080x1920"
        );
    }

    #[test]
    fn test_filter_expression_is_deterministic() {
        let effect = KenBurnsEffect::new();
        let params = effect
            .calculate_parameters(
                &config(1.07, 1.15, (0.33, 0.61), (0.52, 0.48)),
                Duration::from_millis(2750),
            )
            .unwrap();

        let first = effect.generate_filter_expression(&params, 720, 1280);
        let second = effect.generate_filter_expression(&params, 720, 1280);
        assert_eq!(first, second);
        assert!(first.ends_with(":d=82:s=720x1280"));
    }
}
