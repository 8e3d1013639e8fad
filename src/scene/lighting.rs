//! Lights, reflective ground, and contact shadow.

use glam::Vec3;
use serde::Serialize;

use super::quality::{QualitySettings, ReflectorSettings};
use crate::config::EnvironmentPreset;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Ambient {
        intensity: f32,
    },
    Directional {
        position: Vec3,
        intensity: f32,
        /// Shadow map edge length when this light casts shadows
        shadow_map_size: Option<u32>,
    },
    Point {
        position: Vec3,
        color: [f32; 4],
        intensity: f32,
    },
}

impl Light {
    pub fn casts_shadow(&self) -> bool {
        matches!(
            self,
            Light::Directional {
                shadow_map_size: Some(_),
                ..
            }
        )
    }
}

/// One ambient, one key light, two accent point lights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightingRig {
    pub lights: Vec<Light>,
    pub environment: EnvironmentPreset,
}

impl LightingRig {
    /// The key light casts shadows only when the tier enables them.
    pub fn for_quality(settings: &QualitySettings) -> Self {
        Self {
            lights: vec![
                Light::Ambient { intensity: 0.6 },
                Light::Directional {
                    position: Vec3::new(10.0, 10.0, 5.0),
                    intensity: 1.2,
                    shadow_map_size: settings.shadow_map_size,
                },
                Light::Point {
                    position: Vec3::new(-10.0, -10.0, -5.0),
                    color: sensei3d_fx::rgb_hex(0x8b5cf6),
                    intensity: 0.6,
                },
                Light::Point {
                    position: Vec3::new(10.0, -5.0, -5.0),
                    color: sensei3d_fx::rgb_hex(0xfbbf24),
                    intensity: 0.4,
                },
            ],
            environment: settings.environment,
        }
    }

    pub fn shadow_casters(&self) -> usize {
        self.lights.iter().filter(|l| l.casts_shadow()).count()
    }
}

/// Blurred mirror floor under the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundPlane {
    pub height: f32,
    pub size: f32,
    pub color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub mirror: f32,
    pub reflector: ReflectorSettings,
}

impl GroundPlane {
    pub fn new(height: f32, settings: &QualitySettings) -> Self {
        Self {
            height,
            size: 20.0,
            color: sensei3d_fx::rgb_hex(0x1e1b4b),
            roughness: 1.0,
            metalness: 0.5,
            mirror: 0.5,
            reflector: settings.reflector,
        }
    }
}

/// Soft blob shadow just above the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactShadow {
    pub position: Vec3,
    pub scale: f32,
    pub opacity: f32,
    pub blur: f32,
    pub far: f32,
    pub resolution: u32,
}

impl ContactShadow {
    pub fn new(ground_height: f32, settings: &QualitySettings) -> Self {
        Self {
            position: Vec3::new(0.0, ground_height + 0.01, 0.0),
            scale: 10.0,
            opacity: 0.4,
            blur: 2.0,
            far: 4.0,
            resolution: settings.contact_shadow_resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QualityConfig;
    use crate::scene::quality::QualityTier;

    fn settings(tier: QualityTier) -> QualitySettings {
        QualitySettings::for_tier(tier, &QualityConfig::default())
    }

    #[test]
    fn test_light_inventory() {
        let rig = LightingRig::for_quality(&settings(QualityTier::Desktop));
        let ambient = rig
            .lights
            .iter()
            .filter(|l| matches!(l, Light::Ambient { .. }))
            .count();
        let points = rig
            .lights
            .iter()
            .filter(|l| matches!(l, Light::Point { .. }))
            .count();
        assert_eq!(ambient, 1);
        assert_eq!(points, 2);
        assert_eq!(rig.shadow_casters(), 1);
    }

    #[test]
    fn test_mobile_has_no_shadow_caster() {
        let rig = LightingRig::for_quality(&settings(QualityTier::Mobile));
        assert_eq!(rig.shadow_casters(), 0);
        assert_eq!(rig.environment, EnvironmentPreset::Apartment);
    }

    #[test]
    fn test_ground_follows_tier() {
        let mobile = GroundPlane::new(-1.0, &settings(QualityTier::Mobile));
        let desktop = GroundPlane::new(-1.0, &settings(QualityTier::Desktop));
        assert!(mobile.reflector.resolution < desktop.reflector.resolution);
        assert!(mobile.reflector.mix_strength < desktop.reflector.mix_strength);

        let shadow = ContactShadow::new(-1.0, &settings(QualityTier::Mobile));
        assert!(shadow.position.y > mobile.height);
    }
}
