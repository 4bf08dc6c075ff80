use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsQuality {
    Low,
    Medium,
    #[default]
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowMode {
    Off,
    /// Single comparison tap.
    Hard,
    /// 3x3 percentage-closer filtering.
    Soft,
}

/// Pixel density and shadow bundle derived from the graphics tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderQuality {
    pub pixel_ratio: f32,
    pub shadows: ShadowMode,
}

/// Settings pushed by the host menu. Field names match the host's JSON.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub shadows: bool,
    pub fov: f32,
    pub volume: f32,
    pub graphics: GraphicsQuality,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            shadows: true,
            fov: 75.0,
            volume: 50.0,
            graphics: GraphicsQuality::High,
        }
    }
}

impl GameSettings {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn render_quality(&self, device_pixel_ratio: f32) -> RenderQuality {
        let mut quality = match self.graphics {
            GraphicsQuality::Low => RenderQuality {
                pixel_ratio: 0.8,
                shadows: ShadowMode::Off,
            },
            GraphicsQuality::Medium => RenderQuality {
                pixel_ratio: 1.0,
                shadows: ShadowMode::Hard,
            },
            GraphicsQuality::High => RenderQuality {
                pixel_ratio: device_pixel_ratio.min(2.0),
                shadows: ShadowMode::Soft,
            },
        };
        if !self.shadows {
            quality.shadows = ShadowMode::Off;
        }
        quality
    }

    /// Output gain in [0, 1].
    pub fn gain(&self) -> f32 {
        (self.volume / 100.0).clamp(0.0, 1.0)
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov.clamp(30.0, 120.0).to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_tier_drops_density_and_shadows() {
        let settings = GameSettings {
            graphics: GraphicsQuality::Low,
            ..Default::default()
        };
        assert_eq!(
            settings.render_quality(3.0),
            RenderQuality {
                pixel_ratio: 0.8,
                shadows: ShadowMode::Off
            }
        );
    }

    #[test]
    fn switching_back_to_high_restores_soft_shadows() {
        let mut settings = GameSettings {
            graphics: GraphicsQuality::Low,
            ..Default::default()
        };
        settings.render_quality(2.0);
        settings.graphics = GraphicsQuality::High;
        let quality = settings.render_quality(3.0);
        assert_eq!(quality.pixel_ratio, 2.0);
        assert_eq!(quality.shadows, ShadowMode::Soft);
        assert_eq!(settings.render_quality(1.25).pixel_ratio, 1.25);
    }

    #[test]
    fn high_tier_never_upscales_low_density_displays() {
        let settings = GameSettings::default();
        assert_eq!(settings.render_quality(0.75).pixel_ratio, 0.75);
        assert_eq!(settings.render_quality(1.0).pixel_ratio, 1.0);
        assert_eq!(settings.render_quality(4.0).pixel_ratio, 2.0);
    }

    #[test]
    fn medium_uses_hard_shadows_unless_disabled() {
        let mut settings = GameSettings {
            graphics: GraphicsQuality::Medium,
            ..Default::default()
        };
        assert_eq!(settings.render_quality(2.0).shadows, ShadowMode::Hard);
        assert_eq!(settings.render_quality(2.0).pixel_ratio, 1.0);
        settings.shadows = false;
        assert_eq!(settings.render_quality(2.0).shadows, ShadowMode::Off);
    }

    #[test]
    fn parses_host_payload() {
        let settings =
            GameSettings::from_json(r#"{"shadows":true,"fov":90,"volume":20,"graphics":"medium"}"#)
                .unwrap();
        assert_eq!(settings.graphics, GraphicsQuality::Medium);
        assert_eq!(settings.fov, 90.0);
        assert!((settings.gain() - 0.2).abs() < 1e-6);
        assert!(GameSettings::from_json(r#"{"graphics":"ultra"}"#).is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings = GameSettings::from_json(r#"{"fov":60}"#).unwrap();
        assert_eq!(settings.graphics, GraphicsQuality::High);
        assert!(settings.shadows);
        assert_eq!(settings.volume, 50.0);
    }
}
