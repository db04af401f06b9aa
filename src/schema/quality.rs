/// Quality tiers — fixed render-fidelity bundles applied at composition.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("unknown quality tier: {0}")]
    UnknownTier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl FromStr for QualityTier {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(QualityTier::Low),
            "medium" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            "ultra" => Ok(QualityTier::Ultra),
            other => Err(QualityError::UnknownTier(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureQuality {
    Low,
    Medium,
    High,
    Ultra,
}

/// The flat knob bundle for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub shadows: bool,
    pub ambient_occlusion: bool,
    pub bloom: bool,
    pub anti_aliasing: bool,
    pub texture_quality: TextureQuality,
    pub draw_distance: f32,
    pub shadow_map_size: u32,
    pub ray_tracing: bool,
}

impl QualitySettings {
    /// The fixed preset table; every tier is defined, so this is total.
    pub fn preset(tier: QualityTier) -> QualitySettings {
        match tier {
            QualityTier::Low => QualitySettings {
                shadows: false,
                ambient_occlusion: false,
                bloom: false,
                anti_aliasing: false,
                texture_quality: TextureQuality::Low,
                draw_distance: 100.0,
                shadow_map_size: 512,
                ray_tracing: false,
            },
            QualityTier::Medium => QualitySettings {
                shadows: true,
                ambient_occlusion: false,
                bloom: true,
                anti_aliasing: true,
                texture_quality: TextureQuality::Medium,
                draw_distance: 200.0,
                shadow_map_size: 1024,
                ray_tracing: false,
            },
            QualityTier::High => QualitySettings {
                shadows: true,
                ambient_occlusion: true,
                bloom: true,
                anti_aliasing: true,
                texture_quality: TextureQuality::High,
                draw_distance: 500.0,
                shadow_map_size: 2048,
                ray_tracing: false,
            },
            QualityTier::Ultra => QualitySettings {
                shadows: true,
                ambient_occlusion: true,
                bloom: true,
                anti_aliasing: true,
                texture_quality: TextureQuality::Ultra,
                draw_distance: 1000.0,
                shadow_map_size: 4096,
                ray_tracing: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parse_known() {
        assert_eq!("low".parse::<QualityTier>().unwrap(), QualityTier::Low);
        assert_eq!("ultra".parse::<QualityTier>().unwrap(), QualityTier::Ultra);
    }

    #[test]
    fn tier_parse_unknown_is_error() {
        let err = "cinematic".parse::<QualityTier>().unwrap_err();
        assert!(matches!(err, QualityError::UnknownTier(ref s) if s == "cinematic"));
    }

    #[test]
    fn low_tier_disables_heavy_features() {
        let settings = QualitySettings::preset(QualityTier::Low);
        assert!(!settings.shadows);
        assert!(!settings.ambient_occlusion);
        assert!(!settings.bloom);
        assert!(!settings.ray_tracing);
    }

    #[test]
    fn only_ultra_enables_ray_tracing() {
        for tier in [QualityTier::Low, QualityTier::Medium, QualityTier::High] {
            assert!(!QualitySettings::preset(tier).ray_tracing);
        }
        assert!(QualitySettings::preset(QualityTier::Ultra).ray_tracing);
    }

    #[test]
    fn draw_distance_scales_with_tier() {
        let low = QualitySettings::preset(QualityTier::Low).draw_distance;
        let ultra = QualitySettings::preset(QualityTier::Ultra).draw_distance;
        assert!(low < ultra);
    }
}
