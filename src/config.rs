//! Configuration parsing and management for Sensei3D

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Sensei3dError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub motion: MotionConfig,
    pub behavior: BehaviorConfig,
    pub quality: QualityConfig,
    pub camera: CameraConfig,
    pub effects: EffectsConfig,
    pub render: RenderConfig,
    /// Fixed RNG seed; random when absent
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Sensei3dError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Sensei3dError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, Sensei3dError> {
        let paths = [
            PathBuf::from("sensei3d.toml"),
            PathBuf::from("config/sensei3d.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Sensei3dError> {
        self.motion.validate()?;
        self.behavior.validate()?;
        self.quality.validate()?;
        self.camera.validate()?;
        self.effects.validate()?;
        Ok(())
    }
}

/// Procedural motion tuning. Frequencies are in rad/s, angles in radians.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Vertical bob amplitude (world units)
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    /// Continuous Y spin while not hovered
    pub idle_spin_speed: f32,
    /// Fraction of the remaining angle closed per reference frame while hovered
    pub hover_ease: f32,
    /// Y angle the figure turns to face while hovered
    pub hover_target_angle: f32,
    /// Frame rate `hover_ease` is expressed against
    pub reference_fps: f32,
    /// Lateral body sway (Z rotation)
    pub sway_amplitude: f32,
    pub sway_frequency: f32,
    /// Head roll
    pub head_tilt_amplitude: f32,
    pub head_tilt_frequency: f32,
    pub head_tilt_phase: f32,
    /// Head pitch
    pub head_nod_amplitude: f32,
    pub head_nod_frequency: f32,
    pub head_nod_phase: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            bob_amplitude: 0.08,
            bob_frequency: 0.5,
            idle_spin_speed: 0.1,
            hover_ease: 0.05,
            hover_target_angle: 0.0,
            reference_fps: 60.0,
            sway_amplitude: 0.03,
            sway_frequency: 0.35,
            head_tilt_amplitude: 0.06,
            head_tilt_frequency: 0.9,
            head_tilt_phase: 1.3,
            head_nod_amplitude: 0.03,
            head_nod_frequency: 1.3,
            head_nod_phase: 0.4,
        }
    }
}

impl MotionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bob_amplitude < 0.0 {
            return Err(ConfigError::invalid(
                "motion.bob_amplitude",
                "Amplitude must not be negative",
            ));
        }
        if !(self.hover_ease > 0.0 && self.hover_ease <= 1.0) {
            return Err(ConfigError::invalid(
                "motion.hover_ease",
                "Ease factor must be in (0.0, 1.0]",
            ));
        }
        if self.reference_fps <= 0.0 {
            return Err(ConfigError::invalid(
                "motion.reference_fps",
                "Reference frame rate must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Blink and wave overlay timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Lower bound (inclusive) of the blink interval
    pub blink_interval_min_ms: u64,
    /// Upper bound (exclusive) of the blink interval
    pub blink_interval_max_ms: u64,
    /// How long the eyes stay closed
    pub blink_hold_ms: u64,
    /// Eye openness while closed
    pub blink_openness: f32,
    pub wave_duration_ms: u64,
    /// Peak arm rotation during a wave (radians)
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
    /// Exponential envelope decay (1/s)
    pub wave_decay: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            blink_interval_min_ms: 3000,
            blink_interval_max_ms: 5000,
            blink_hold_ms: 150,
            blink_openness: 0.1,
            wave_duration_ms: 1000,
            wave_amplitude: 0.5,
            wave_frequency: 10.0,
            wave_decay: 1.5,
        }
    }
}

impl BehaviorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.blink_interval_min_ms >= self.blink_interval_max_ms {
            return Err(ConfigError::invalid(
                "behavior.blink_interval_min_ms",
                "Minimum blink interval must be below the maximum",
            ));
        }
        if self.blink_hold_ms >= self.blink_interval_min_ms {
            return Err(ConfigError::invalid(
                "behavior.blink_hold_ms",
                "Blink hold must be shorter than the minimum blink interval",
            ));
        }
        if !(0.0..=1.0).contains(&self.blink_openness) {
            return Err(ConfigError::invalid(
                "behavior.blink_openness",
                "Openness must be between 0.0 and 1.0",
            ));
        }
        if self.wave_duration_ms == 0 {
            return Err(ConfigError::invalid(
                "behavior.wave_duration_ms",
                "Wave duration must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Image-based lighting preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    /// Bright HDR city backdrop
    City,
    /// Low-resolution indoor backdrop
    Apartment,
    Studio,
}

/// Cost parameters bundled by one quality tier.
///
/// A profile table in TOML must be complete; partial tables would silently
/// inherit the other tier's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProfile {
    pub sphere_segments: u32,
    pub cylinder_segments: u32,
    /// Shadow map edge length; 0 disables shadows
    pub shadow_map_size: u32,
    pub ambient_particles: usize,
    pub burst_particles: usize,
    pub environment: EnvironmentPreset,
    pub reflector_resolution: u32,
    pub reflector_blur: [f32; 2],
    pub reflector_mix_strength: f32,
    pub contact_shadow_resolution: u32,
    pub max_pixel_ratio: f32,
}

impl TierProfile {
    pub fn mobile() -> Self {
        Self {
            sphere_segments: 16,
            cylinder_segments: 8,
            shadow_map_size: 0,
            ambient_particles: 30,
            burst_particles: 20,
            environment: EnvironmentPreset::Apartment,
            reflector_resolution: 256,
            reflector_blur: [100.0, 40.0],
            reflector_mix_strength: 15.0,
            contact_shadow_resolution: 256,
            max_pixel_ratio: 1.5,
        }
    }

    pub fn desktop() -> Self {
        Self {
            sphere_segments: 32,
            cylinder_segments: 16,
            shadow_map_size: 1024,
            ambient_particles: 60,
            burst_particles: 40,
            environment: EnvironmentPreset::City,
            reflector_resolution: 1024,
            reflector_blur: [300.0, 100.0],
            reflector_mix_strength: 40.0,
            contact_shadow_resolution: 512,
            max_pixel_ratio: 2.0,
        }
    }
}

/// Device-adaptive quality configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Page-level viewport width (px) below which the mobile tier is used
    pub page_breakpoint: u32,
    /// Container width below which the scene uses its compact layout
    pub scene_breakpoint: u32,
    /// Quiet period before a resize burst is acted on
    pub resize_debounce_ms: u64,
    pub mobile: TierProfile,
    pub desktop: TierProfile,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            page_breakpoint: 1024,
            scene_breakpoint: 448,
            resize_debounce_ms: 150,
            mobile: TierProfile::mobile(),
            desktop: TierProfile::desktop(),
        }
    }
}

impl QualityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_breakpoint == 0 {
            return Err(ConfigError::invalid(
                "quality.page_breakpoint",
                "Breakpoint must be greater than 0",
            ));
        }
        if self.scene_breakpoint == 0 {
            return Err(ConfigError::invalid(
                "quality.scene_breakpoint",
                "Breakpoint must be greater than 0",
            ));
        }
        for (name, profile) in [("mobile", &self.mobile), ("desktop", &self.desktop)] {
            if profile.ambient_particles == 0 {
                return Err(ConfigError::invalid(
                    &format!("quality.{name}.ambient_particles"),
                    "Ambient particle count must be greater than 0",
                ));
            }
            if profile.sphere_segments < 3 || profile.cylinder_segments < 3 {
                return Err(ConfigError::invalid(
                    &format!("quality.{name}.sphere_segments"),
                    "Tessellation needs at least 3 segments",
                ));
            }
        }
        if self.mobile.ambient_particles >= self.desktop.ambient_particles {
            return Err(ConfigError::invalid(
                "quality.mobile.ambient_particles",
                "Mobile tier must use fewer ambient particles than desktop",
            ));
        }
        Ok(())
    }
}

/// Orbit camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Orbit target (center of the avatar)
    pub target: [f32; 3],
    /// Initial orbit distance
    pub distance: f32,
    pub fov_degrees: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle measured from +Y
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// One revolution per `60 / speed` seconds
    pub auto_rotate_speed: f32,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: [0.0, 0.6, 0.0],
            distance: 5.0,
            fov_degrees: 45.0,
            min_distance: 3.0,
            max_distance: 8.0,
            min_polar_angle: PI / 3.0,
            max_polar_angle: PI / 1.5,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            enable_zoom: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distance <= 0.0 || self.min_distance > self.max_distance {
            return Err(ConfigError::invalid(
                "camera.min_distance",
                "Distance range must be positive and ordered",
            ));
        }
        if self.min_polar_angle < 0.0
            || self.max_polar_angle > PI
            || self.min_polar_angle > self.max_polar_angle
        {
            return Err(ConfigError::invalid(
                "camera.min_polar_angle",
                "Polar range must be ordered and within [0, PI]",
            ));
        }
        if !(1.0..179.0).contains(&self.fov_degrees) {
            return Err(ConfigError::invalid(
                "camera.fov_degrees",
                "Field of view must be between 1 and 179 degrees",
            ));
        }
        Ok(())
    }
}

/// Particle and label look
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub ambient_color: String,
    pub ambient_scale: f32,
    pub ambient_size: f32,
    pub ambient_speed: f32,
    pub ambient_opacity: f32,
    pub burst_color: String,
    pub burst_scale: f32,
    pub burst_size: f32,
    pub burst_speed: f32,
    pub burst_opacity: f32,
    pub burst_fade_in: f32,
    /// Subject glyphs for the floating labels
    pub labels: Vec<String>,
    pub label_radius: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            ambient_color: "#a78bfa".to_string(),
            ambient_scale: 4.0,
            ambient_size: 3.0,
            ambient_speed: 0.3,
            ambient_opacity: 0.4,
            burst_color: "#f472b6".to_string(),
            burst_scale: 2.5,
            burst_size: 4.0,
            burst_speed: 1.2,
            burst_opacity: 0.8,
            burst_fade_in: 0.25,
            labels: vec!["π".to_string(), "∑".to_string(), "</>".to_string()],
            label_radius: 1.1,
        }
    }
}

impl EffectsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        parse_hex_color(&self.ambient_color).ok_or_else(|| {
            ConfigError::invalid("effects.ambient_color", "Expected a #rrggbb color")
        })?;
        parse_hex_color(&self.burst_color).ok_or_else(|| {
            ConfigError::invalid("effects.burst_color", "Expected a #rrggbb color")
        })?;
        for (field, v) in [
            ("effects.ambient_opacity", self.ambient_opacity),
            ("effects.burst_opacity", self.burst_opacity),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::invalid(field, "Opacity must be between 0.0 and 1.0"));
            }
        }
        for (field, v) in [
            ("effects.ambient_scale", self.ambient_scale),
            ("effects.ambient_size", self.ambient_size),
            ("effects.ambient_speed", self.ambient_speed),
            ("effects.burst_scale", self.burst_scale),
            ("effects.burst_size", self.burst_size),
            ("effects.burst_speed", self.burst_speed),
            ("effects.burst_fade_in", self.burst_fade_in),
            ("effects.label_radius", self.label_radius),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::invalid(field, "Must be a finite, non-negative number"));
            }
        }
        Ok(())
    }
}

/// What to draw when no graphics context is available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    #[default]
    Wireframe,
    Gradient,
}

/// Scene composition options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub placeholder: PlaceholderKind,
    /// Text in the speech bubble shown while hovered
    pub speech_bubble: String,
    /// Height of the reflective ground plane
    pub ground_height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderKind::Wireframe,
            speech_bubble: "Ready to learn?".to_string(),
            ground_height: -1.0,
        }
    }
}

/// Parse `#rrggbb` (leading `#` optional) into RGBA.
pub fn parse_hex_color(s: &str) -> Option<[f32; 4]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(sensei3d_fx::rgb_hex)
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("sensei3d");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/sensei3d");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/sensei3d");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("sensei3d");
        }
    }

    PathBuf::from(".")
}
