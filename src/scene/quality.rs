//! Device-adaptive quality selection
//!
//! The tier is classified once at mount and again only after a resize burst
//! has gone quiet; nothing on the frame path recomputes it.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::avatar::timers::{FiredTimer, TimerHandle, TimerKind, TimerQueue};
use crate::config::{EnvironmentPreset, QualityConfig, TierProfile};

/// Rendering cost level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Mobile,
    Desktop,
}

impl QualityTier {
    /// `width < breakpoint` is mobile, everything else desktop.
    pub fn classify(width: u32, breakpoint: u32) -> Self {
        if width < breakpoint {
            QualityTier::Mobile
        } else {
            QualityTier::Desktop
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Mobile => write!(f, "mobile"),
            QualityTier::Desktop => write!(f, "desktop"),
        }
    }
}

/// Figure framing chosen from the container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneLayout {
    Compact,
    Regular,
}

impl SceneLayout {
    pub fn classify(container_width: u32, breakpoint: u32) -> Self {
        if container_width < breakpoint {
            SceneLayout::Compact
        } else {
            SceneLayout::Regular
        }
    }

    /// Whole-figure scale at the rig root.
    pub fn figure_scale(self) -> f32 {
        match self {
            SceneLayout::Compact => 1.2,
            SceneLayout::Regular => 1.5,
        }
    }

    /// Floating labels shown on hover.
    pub fn label_count(self) -> usize {
        match self {
            SceneLayout::Compact => 2,
            SceneLayout::Regular => 3,
        }
    }
}

/// Reflective ground parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReflectorSettings {
    pub resolution: u32,
    pub blur: [f32; 2],
    pub mix_strength: f32,
}

/// Everything a tier decides, resolved against the configured profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySettings {
    pub tier: QualityTier,
    pub sphere_segments: u32,
    pub cylinder_segments: u32,
    /// `None` when shadows are disabled
    pub shadow_map_size: Option<u32>,
    pub ambient_particles: usize,
    pub burst_particles: usize,
    pub environment: EnvironmentPreset,
    pub reflector: ReflectorSettings,
    pub contact_shadow_resolution: u32,
    pub max_pixel_ratio: f32,
}

impl QualitySettings {
    pub fn for_tier(tier: QualityTier, config: &QualityConfig) -> Self {
        let profile: &TierProfile = match tier {
            QualityTier::Mobile => &config.mobile,
            QualityTier::Desktop => &config.desktop,
        };
        Self {
            tier,
            sphere_segments: profile.sphere_segments,
            cylinder_segments: profile.cylinder_segments,
            shadow_map_size: (profile.shadow_map_size > 0).then_some(profile.shadow_map_size),
            ambient_particles: profile.ambient_particles,
            burst_particles: profile.burst_particles,
            environment: profile.environment,
            reflector: ReflectorSettings {
                resolution: profile.reflector_resolution,
                blur: profile.reflector_blur,
                mix_strength: profile.reflector_mix_strength,
            },
            contact_shadow_resolution: profile.contact_shadow_resolution,
            max_pixel_ratio: profile.max_pixel_ratio,
        }
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadow_map_size.is_some()
    }
}

/// What a settled resize changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityChange {
    pub tier: Option<QualityTier>,
    pub layout: Option<SceneLayout>,
}

impl QualityChange {
    pub fn is_empty(&self) -> bool {
        self.tier.is_none() && self.layout.is_none()
    }
}

/// Sole writer of the tier and layout for one avatar.
#[derive(Debug)]
pub struct QualityController {
    config: QualityConfig,
    settings: QualitySettings,
    layout: SceneLayout,
    /// Latest (viewport, container) widths seen during a resize burst
    pending: Option<(u32, u32)>,
    debounce: Option<TimerHandle>,
    classifications: usize,
}

impl QualityController {
    /// Classify once for the mount.
    pub fn new(config: QualityConfig, viewport_width: u32, container_width: u32) -> Self {
        let tier = QualityTier::classify(viewport_width, config.page_breakpoint);
        let layout = SceneLayout::classify(container_width, config.scene_breakpoint);
        let settings = QualitySettings::for_tier(tier, &config);
        info!(
            "Quality tier {} (viewport {}px), layout {:?}",
            tier, viewport_width, layout
        );
        Self {
            config,
            settings,
            layout,
            pending: None,
            debounce: None,
            classifications: 1,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.settings.tier
    }

    pub fn layout(&self) -> SceneLayout {
        self.layout
    }

    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    /// Number of times the tier has been classified, including mount.
    pub fn classifications(&self) -> usize {
        self.classifications
    }

    pub fn is_settling(&self) -> bool {
        self.debounce.is_some()
    }

    /// Record a resize and restart the quiet period. Never reclassifies.
    pub fn on_resize(
        &mut self,
        now: Duration,
        viewport_width: u32,
        container_width: u32,
        timers: &mut TimerQueue<TimerKind>,
    ) {
        if let Some(handle) = self.debounce.take() {
            timers.cancel(handle);
        }
        self.pending = Some((viewport_width, container_width));
        let deadline = now + Duration::from_millis(self.config.resize_debounce_ms);
        self.debounce = Some(timers.schedule(deadline, TimerKind::ResizeSettled));
    }

    /// Handle the debounce timer. Returns `None` for timers it does not own.
    pub fn on_timer(&mut self, fired: FiredTimer<TimerKind>) -> Option<QualityChange> {
        if fired.kind != TimerKind::ResizeSettled || self.debounce != Some(fired.handle) {
            return None;
        }
        self.debounce = None;
        let (viewport, container) = self.pending.take()?;
        Some(self.reclassify(viewport, container))
    }

    fn reclassify(&mut self, viewport_width: u32, container_width: u32) -> QualityChange {
        self.classifications += 1;
        let tier = QualityTier::classify(viewport_width, self.config.page_breakpoint);
        let layout = SceneLayout::classify(container_width, self.config.scene_breakpoint);

        let mut change = QualityChange::default();
        if tier != self.settings.tier {
            info!("Quality tier {} -> {}", self.settings.tier, tier);
            self.settings = QualitySettings::for_tier(tier, &self.config);
            change.tier = Some(tier);
        }
        if layout != self.layout {
            debug!("Scene layout {:?} -> {:?}", self.layout, layout);
            self.layout = layout;
            change.layout = Some(layout);
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(
        controller: &mut QualityController,
        timers: &mut TimerQueue<TimerKind>,
        now: Duration,
    ) -> Vec<QualityChange> {
        let mut changes = Vec::new();
        while let Some(t) = timers.pop_due(now) {
            if let Some(c) = controller.on_timer(t) {
                changes.push(c);
            }
        }
        changes
    }

    #[test]
    fn test_classify_step_function() {
        assert_eq!(QualityTier::classify(0, 1024), QualityTier::Mobile);
        assert_eq!(QualityTier::classify(1023, 1024), QualityTier::Mobile);
        assert_eq!(QualityTier::classify(1024, 1024), QualityTier::Desktop);
        assert_eq!(QualityTier::classify(u32::MAX, 1024), QualityTier::Desktop);

        // Monotonic: once desktop, always desktop for wider viewports.
        let mut seen_desktop = false;
        for w in (0..3000).step_by(7) {
            let desktop = QualityTier::classify(w, 1024) == QualityTier::Desktop;
            assert!(!(seen_desktop && !desktop));
            seen_desktop |= desktop;
        }
    }

    #[test]
    fn test_layout_classify() {
        assert_eq!(SceneLayout::classify(447, 448), SceneLayout::Compact);
        assert_eq!(SceneLayout::classify(448, 448), SceneLayout::Regular);
        assert!(SceneLayout::Compact.figure_scale() < SceneLayout::Regular.figure_scale());
        assert_eq!(SceneLayout::Regular.label_count(), 3);
    }

    #[test]
    fn test_mobile_settings() {
        let s = QualitySettings::for_tier(QualityTier::Mobile, &QualityConfig::default());
        assert!(!s.shadows_enabled());
        assert_eq!(s.ambient_particles, 30);
        assert_eq!(s.sphere_segments, 16);
        assert_eq!(s.environment, EnvironmentPreset::Apartment);
    }

    #[test]
    fn test_desktop_settings() {
        let s = QualitySettings::for_tier(QualityTier::Desktop, &QualityConfig::default());
        assert_eq!(s.shadow_map_size, Some(1024));
        assert_eq!(s.ambient_particles, 60);
        assert_eq!(s.sphere_segments, 32);
        assert!(
            s.reflector.mix_strength
                > QualitySettings::for_tier(QualityTier::Mobile, &QualityConfig::default())
                    .reflector
                    .mix_strength
        );
    }

    #[test]
    fn test_resize_burst_debounced() {
        let mut timers = TimerQueue::new();
        let mut q = QualityController::new(QualityConfig::default(), 1200, 600);
        assert_eq!(q.tier(), QualityTier::Desktop);

        // A burst every 20ms; no reclassification while it continues.
        for i in 0..20u64 {
            let width = if i % 2 == 0 { 500 } else { 1300 };
            q.on_resize(ms(i * 20), width, 600, &mut timers);
            assert!(drain(&mut q, &mut timers, ms(i * 20)).is_empty());
        }
        assert_eq!(q.classifications(), 1);
        assert_eq!(timers.len(), 1);

        // Last event was 1300px at 380ms; settles at 530ms with no change.
        let changes = drain(&mut q, &mut timers, ms(530));
        assert_eq!(changes, vec![QualityChange::default()]);
        assert_eq!(q.classifications(), 2);
        assert_eq!(q.tier(), QualityTier::Desktop);
    }

    #[test]
    fn test_resize_crossing_breakpoint() {
        let mut timers = TimerQueue::new();
        let mut q = QualityController::new(QualityConfig::default(), 1200, 600);
        q.on_resize(ms(0), 500, 400, &mut timers);
        assert_eq!(q.tier(), QualityTier::Desktop);
        assert!(q.is_settling());

        let changes = drain(&mut q, &mut timers, ms(150));
        assert_eq!(
            changes,
            vec![QualityChange {
                tier: Some(QualityTier::Mobile),
                layout: Some(SceneLayout::Compact),
            }]
        );
        assert_eq!(q.settings().ambient_particles, 30);
        assert!(!q.is_settling());
    }
}
