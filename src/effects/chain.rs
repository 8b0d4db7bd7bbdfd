use tracing::debug;

use super::{
    EffectSpec, KenBurnsEffect, KenBurnsParams, SubtitleOverlay, SubtitleParams, TransitionEffect,
    TransitionParams, WatermarkOverlay, WatermarkParams,
};
use crate::error::Result;

/// A validated effect, ready to be rendered into the filter graph
#[derive(Debug, Clone, PartialEq)]
pub enum VideoEffect {
    KenBurns(KenBurnsParams),
    Transition(TransitionParams),
    Subtitle(SubtitleParams),
    Watermark(WatermarkParams),
}

impl VideoEffect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::KenBurns(_) => "kenburns",
            Self::Transition(_) => "transition",
            Self::Subtitle(_) => "subtitle",
            Self::Watermark(_) => "watermark",
        }
    }
}

/// Builds a single `-filter_complex` graph from an ordered list of effects
#[derive(Debug, Clone, Default)]
pub struct EffectChain {
    ken_burns: KenBurnsEffect,
    transition: TransitionEffect,
    subtitle: SubtitleOverlay,
    watermark: WatermarkOverlay,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain `effects` in order, starting from `[0:v]` and ending at `[out]`
    ///
    /// Intermediate outputs are labelled `[kbN]` where N is the stage index.
    /// An empty list passes the input through unchanged.
    pub fn build_complex_filter(&self, effects: &[VideoEffect], width: u32, height: u32, fps: u32) -> String {
        if effects.is_empty() {
            return "[0:v]copy[out]".to_string();
        }

        let mut parts = Vec::with_capacity(effects.len());
        let mut input = "[0:v]".to_string();

        for (i, effect) in effects.iter().enumerate() {
            let output = if i == effects.len() - 1 {
                "[out]".to_string()
            } else {
                format!("[kb{}]", i)
            };

            let part = match effect {
                VideoEffect::KenBurns(params) => {
                    let filter = self.ken_burns.generate_filter_expression(params, width, height);
                    format!("{}{}{}", input, filter, output)
                }
                VideoEffect::Transition(params) => {
                    // transitions blend the running stream with the second input
                    let filter = self.transition.generate_filter_expression(params, fps);
                    format!("{}[1:v]{}{}", input, filter, output)
                }
                VideoEffect::Subtitle(params) => {
                    let filter = self.subtitle.generate_filter_expression(params);
                    format!("{}{}{}", input, filter, output)
                }
                VideoEffect::Watermark(params) => {
                    let filter = self.watermark.generate_filter_expression(params);
                    format!("{}{}", filter, output)
                }
            };

            debug!("Filter stage {} ({}): {}", i, effect.name(), part);
            parts.push(part);
            input = output;
        }

        parts.join(";")
    }

    /// Convert declarative specs and chain them
    ///
    /// Fails on the first spec that does not validate, before any graph text
    /// is produced.
    pub fn build_from_specs(&self, specs: &[EffectSpec], width: u32, height: u32, fps: u32) -> Result<String> {
        let effects = specs
            .iter()
            .map(VideoEffect::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(self.build_complex_filter(&effects, width, height, fps))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::effects::{
        KenBurnsConfig, SubtitleConfig, SubtitlePosition, TransitionType, WatermarkConfig,
        WatermarkPosition,
    };
    use crate::error::{CompositorError, ErrorKind, ValidationError};

    fn ken_burns() -> VideoEffect {
        let config = KenBurnsConfig {
            start_zoom: 1.0,
            end_zoom: 1.2,
            start_x: 0.5,
            start_y: 0.5,
            end_x: 0.4,
            end_y: 0.4,
        };
        let params = KenBurnsEffect::new()
            .calculate_parameters(&config, Duration::from_secs(3))
            .unwrap();
        VideoEffect::KenBurns(params)
    }

    fn subtitle() -> VideoEffect {
        let config = SubtitleConfig {
            text: "Test subtitle".to_string(),
            position: SubtitlePosition::Bottom,
            font_size: 48,
            font_color: "#FFFFFF".to_string(),
            bg_color: "#000000".to_string(),
            duration: Duration::from_secs(3),
            start_time: Duration::from_secs(1),
        };
        VideoEffect::Subtitle(SubtitleOverlay::new().calculate_parameters(&config).unwrap())
    }

    #[test]
    fn test_empty_chain_copies_input() {
        let chain = EffectChain::new();
        assert_eq!(chain.build_complex_filter(&[], 1080, 1920, 30), "[0:v]copy[out]");
        assert_eq!(chain.build_from_specs(&[], 1080, 1920, 30).unwrap(), "[0:v]copy[out]");
    }

    #[test]
    fn test_ken_burns_then_subtitle() {
        let chain = EffectChain::new();
        let graph = chain.build_complex_filter(&[ken_burns(), subtitle()], 1080, 1920, 30);

        let zoompan = "zoompan=z='if(lte(on,0),1.0,1.0+(1.2-1.0)*on/3.0)':x='if(lte(on,0),540.0,540.0+(-108.0)*on/3.0)':y='if(lte(on,0),960.0,960.0+(-192.0)*on/3.0)':d=90:s=1080x1920";
        let drawtext = "drawtext=text='Test subtitle':fontsize=48:fontcolor=#FFFFFF:box=1:boxcolor=#000000:x=(w-text_w)/2:y=h-text_h-50:enable='between(t,1.0,4.0)'";
        assert_eq!(graph, format!("[0:v]{}[kb0];[kb0]{}[out]", zoompan, drawtext));
    }

    #[test]
    fn test_transition_takes_second_input() {
        let chain = EffectChain::new();
        let params = TransitionEffect::new()
            .calculate_parameters(TransitionType::Crossfade, Duration::from_millis(500))
            .unwrap();

        assert_eq!(
            chain.build_complex_filter(&[VideoEffect::Transition(params)], 1080, 1920, 30),
            "[0:v][1:v]xfade=transition=fade:duration=0.5:offset=0[out]"
        );
    }

    #[test]
    fn test_watermark_stage_has_no_input_label() {
        let chain = EffectChain::new();
        let params = WatermarkOverlay::new()
            .calculate_parameters(&WatermarkConfig {
                image_path: PathBuf::from("logo.png"),
                position: WatermarkPosition::TopLeft,
                scale: 0.1,
                opacity: 0.8,
            })
            .unwrap();

        let graph = chain.build_complex_filter(&[subtitle(), VideoEffect::Watermark(params)], 1080, 1920, 30);
        assert!(graph.starts_with("[0:v]drawtext="));
        assert!(graph.ends_with("[kb0];[0:v][1:v]overlay=20:20:format=auto:alpha=1[out]"));
    }

    #[test]
    fn test_labels_advance_per_stage() {
        let chain = EffectChain::new();
        let graph = chain.build_complex_filter(&[ken_burns(), ken_burns(), subtitle()], 720, 1280, 30);
        let stages: Vec<&str> = graph.split(";").collect();

        assert_eq!(stages.len(), 3);
        assert!(stages[0].starts_with("[0:v]") && stages[0].ends_with("[kb0]"));
        assert!(stages[1].starts_with("[kb0]") && stages[1].ends_with("[kb1]"));
        assert!(stages[2].starts_with("[kb1]") && stages[2].ends_with("[out]"));
    }

    #[test]
    fn test_invalid_spec_fails_whole_chain() {
        let chain = EffectChain::new();
        let specs = vec![
            EffectSpec {
                kind: "subtitle".to_string(),
                ken_burns: None,
                transition: None,
                subtitle: None,
                watermark: None,
            },
        ];

        let err = chain.build_from_specs(&specs, 1080, 1920, 30).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            CompositorError::Validation(ValidationError::MissingEffectParameters { effect: "subtitle" })
        ));
    }
}
