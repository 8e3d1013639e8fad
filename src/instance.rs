//! One mounted avatar.
//!
//! [`AvatarInstance`] owns every piece of per-mount state: rig, behavior,
//! timers, quality, camera, effects, and the surface it draws into. The host
//! talks to it through an [`AvatarHandle`]; queued events are applied at the
//! start of the next [`AvatarInstance::tick`].

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::avatar::motion::{apply_pose, MotionGenerator, MotionInput, Pose};
use crate::avatar::rig::Rig;
use crate::avatar::state::{BehaviorMachine, BehaviorState};
use crate::avatar::timers::{TimerKind, TimerQueue};
use crate::config::{parse_hex_color, Config};
use crate::error::SurfaceError;
use crate::interaction::{HitRegion, HoverChange, PointerEvent, PointerTracker};
use crate::scene::camera::{CameraGesture, OrbitCamera};
use crate::scene::compose::{compose_frame, FrameDescription, FrameInputs, Stage};
use crate::scene::quality::{QualityChange, QualityController, QualitySettings, QualityTier, SceneLayout};
use crate::scene::surface::{GraphicsBackend, Placeholder, RenderSurface};
use sensei3d_fx::{BatchParams, EffectEmitter, HoverEffectParams};

/// Input from the host page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Pointer(PointerEvent),
    Camera(CameraGesture),
    /// Viewport and container changed size
    Resize {
        viewport_width: u32,
        width: u32,
        height: u32,
    },
}

/// Mount-time geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Container width in pixels
    pub width: u32,
    /// Container height in pixels
    pub height: u32,
    /// Page viewport width in pixels
    pub viewport_width: u32,
}

/// Host-side sender. Cheap to clone; sends fail quietly after unmount.
#[derive(Debug, Clone)]
pub struct AvatarHandle {
    tx: Sender<HostEvent>,
}

impl AvatarHandle {
    /// Queue an event. Returns false if the avatar is gone.
    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn pointer_enter(&self) -> bool {
        self.send(HostEvent::Pointer(PointerEvent::Enter))
    }

    pub fn pointer_leave(&self) -> bool {
        self.send(HostEvent::Pointer(PointerEvent::Leave))
    }

    pub fn pointer_move(&self, x: f32, y: f32) -> bool {
        self.send(HostEvent::Pointer(PointerEvent::Move { x, y }))
    }

    pub fn gesture(&self, gesture: CameraGesture) -> bool {
        self.send(HostEvent::Camera(gesture))
    }

    pub fn resize(&self, viewport_width: u32, width: u32, height: u32) -> bool {
        self.send(HostEvent::Resize {
            viewport_width,
            width,
            height,
        })
    }
}

enum Presentation {
    Live(Box<dyn RenderSurface>),
    Fallback(Placeholder),
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub frame: u64,
    pub state: BehaviorState,
    pub events_applied: usize,
    pub timers_fired: usize,
    pub drawn: bool,
}

/// What unmount cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub frames: u64,
    pub timers_cancelled: usize,
    pub fallback: bool,
}

pub struct AvatarInstance {
    config: Config,
    clock: Duration,
    frame: u64,
    rng: StdRng,
    timers: TimerQueue<TimerKind>,
    behavior: BehaviorMachine,
    motion: MotionGenerator,
    pose: Pose,
    rig: Rig,
    quality: QualityController,
    camera: OrbitCamera,
    stage: Stage,
    effects: EffectEmitter,
    pointer: PointerTracker,
    presentation: Presentation,
    size: (u32, u32),
    pending_size: Option<(u32, u32)>,
    events: Receiver<HostEvent>,
}

fn ambient_params(config: &Config, settings: &QualitySettings) -> BatchParams {
    let fx = &config.effects;
    BatchParams {
        count: settings.ambient_particles,
        scale: fx.ambient_scale,
        size: fx.ambient_size,
        speed: fx.ambient_speed,
        color: parse_hex_color(&fx.ambient_color).unwrap_or(BatchParams::default().color),
        opacity: fx.ambient_opacity,
        fade_in: 0.0,
    }
}

fn hover_params(config: &Config, settings: &QualitySettings, layout: SceneLayout) -> HoverEffectParams {
    let fx = &config.effects;
    HoverEffectParams {
        burst: BatchParams {
            count: settings.burst_particles,
            scale: fx.burst_scale,
            size: fx.burst_size,
            speed: fx.burst_speed,
            color: parse_hex_color(&fx.burst_color).unwrap_or(sensei3d_fx::rgb_hex(0xf472b6)),
            opacity: fx.burst_opacity,
            fade_in: fx.burst_fade_in,
        },
        label_texts: fx.labels.clone(),
        label_count: layout.label_count(),
        label_radius: fx.label_radius,
    }
}

impl AvatarInstance {
    /// Mount an avatar. Never fails: if the backend cannot produce a surface
    /// the avatar shows its placeholder instead.
    pub fn mount(
        config: Config,
        spec: MountSpec,
        backend: &dyn GraphicsBackend,
    ) -> (AvatarInstance, AvatarHandle) {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut timers = TimerQueue::new();

        let quality = QualityController::new(config.quality.clone(), spec.viewport_width, spec.width);
        let layout = quality.layout();

        let mut camera = OrbitCamera::new(config.camera.clone());
        camera.set_viewport_height(spec.height);

        let stage = Stage::new(quality.settings(), &config.render);
        let effects = EffectEmitter::new(
            ambient_params(&config, quality.settings()),
            config.camera.target,
            &mut rng,
        );

        let mut behavior = BehaviorMachine::new(config.behavior.clone());
        behavior.start(Duration::ZERO, &mut timers, &mut rng);

        let motion = MotionGenerator::new(config.motion.clone(), config.behavior.clone());
        let pose = motion.pose(MotionInput {
            hovered: false,
            wave_elapsed: None,
            eye_openness: behavior.eye_openness(),
        });
        let mut rig = Rig::teacher(layout.figure_scale());
        apply_pose(&mut rig, &pose);

        let presentation = match backend.create_surface(spec.width, spec.height) {
            Ok(surface) => Presentation::Live(surface),
            Err(e) => {
                warn!("{} backend unavailable, showing placeholder: {}", backend.name(), e);
                Presentation::Fallback(Placeholder::new(
                    config.render.placeholder,
                    spec.width,
                    spec.height,
                    &e,
                ))
            }
        };

        info!(
            "Avatar mounted at {}x{} (tier {}, layout {:?})",
            spec.width,
            spec.height,
            quality.tier(),
            layout
        );

        let (tx, rx) = crossbeam_channel::unbounded();
        let instance = AvatarInstance {
            config,
            clock: Duration::ZERO,
            frame: 0,
            rng,
            timers,
            behavior,
            motion,
            pose,
            rig,
            quality,
            camera,
            stage,
            effects,
            pointer: PointerTracker::new(),
            presentation,
            size: (spec.width, spec.height),
            pending_size: None,
            events: rx,
        };
        (instance, AvatarHandle { tx })
    }

    /// One frame: apply queued events, advance the clock, fire due timers,
    /// update motion and effects, then draw.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut events_applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event);
            events_applied += 1;
        }

        self.clock += dt;
        let timers_fired = self.fire_timers();
        let dt_secs = dt.as_secs_f32();

        // The placeholder is static: behavior keeps running, nothing moves.
        let drawn = if self.is_fallback() {
            false
        } else {
            self.camera.update(dt_secs);
            self.pose = self.motion.step(dt_secs, self.motion_input());
            apply_pose(&mut self.rig, &self.pose);
            self.effects.update(dt_secs);
            // A collapsed container keeps its surface but has nothing to show.
            !self.is_collapsed() && self.draw()
        };

        self.frame += 1;
        trace!("Frame {} at {:?}", self.frame, self.clock);

        TickReport {
            frame: self.frame,
            state: self.behavior.state(),
            events_applied,
            timers_fired,
            drawn,
        }
    }

    fn motion_input(&self) -> MotionInput {
        MotionInput {
            hovered: self.behavior.is_hovered(),
            wave_elapsed: self.behavior.wave_elapsed(self.clock),
            eye_openness: self.behavior.eye_openness(),
        }
    }

    fn fire_timers(&mut self) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(self.clock) {
            fired += 1;
            if self.behavior.on_timer(timer, &mut self.timers, &mut self.rng) {
                continue;
            }
            if let Some(change) = self.quality.on_timer(timer) {
                self.on_resize_settled(change);
            }
        }
        fired
    }

    fn apply_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Pointer(pointer) => {
                if self.is_fallback() && matches!(pointer, PointerEvent::Move { .. }) {
                    return;
                }
                let region = self.hit_region();
                let (view, projection) = self.view_projection();
                if let Some(change) = self.pointer.handle(pointer, &region, view, projection) {
                    self.on_hover_change(change);
                }
            }
            HostEvent::Camera(gesture) => {
                if !self.is_fallback() {
                    self.camera.apply(gesture);
                }
            }
            HostEvent::Resize {
                viewport_width,
                width,
                height,
            } => {
                self.pending_size = Some((width, height));
                self.quality
                    .on_resize(self.clock, viewport_width, width, &mut self.timers);
            }
        }
    }

    fn on_hover_change(&mut self, change: HoverChange) {
        match change {
            HoverChange::Entered => {
                if self.behavior.pointer_enter(self.clock, &mut self.timers) {
                    debug!("Hover entered at {:?}", self.clock);
                    if !self.is_fallback() {
                        let params =
                            hover_params(&self.config, self.quality.settings(), self.quality.layout());
                        self.effects.on_hover_enter(&params, &mut self.rng);
                    }
                }
            }
            HoverChange::Left => {
                if self.behavior.pointer_leave() {
                    debug!("Hover left at {:?}", self.clock);
                    self.effects.on_hover_exit();
                }
            }
        }
    }

    fn on_resize_settled(&mut self, change: QualityChange) {
        if let Some(tier) = change.tier {
            self.stage = Stage::new(self.quality.settings(), &self.config.render);
            let params = ambient_params(&self.config, self.quality.settings());
            self.effects.set_ambient(params, &mut self.rng);
            debug!("Stage rebuilt for {} tier", tier);
        }
        if let Some(layout) = change.layout {
            self.rig.set_scale(layout.figure_scale());
        }

        let Some((width, height)) = self.pending_size.take() else {
            return;
        };
        self.size = (width, height);
        self.camera.set_viewport_height(height);
        if self.is_collapsed() {
            info!("Container collapsed to {}x{}, pausing draws", width, height);
            return;
        }
        let result = match &mut self.presentation {
            Presentation::Live(surface) => surface.resize(width, height),
            Presentation::Fallback(placeholder) => {
                placeholder.resized(width, height);
                Ok(())
            }
        };
        if let Err(e) = result {
            self.fall_back(e);
        }
        info!("Resize settled at {}x{}", width, height);
    }

    fn is_collapsed(&self) -> bool {
        self.size.0 == 0 || self.size.1 == 0
    }

    fn draw(&mut self) -> bool {
        let frame = self.compose();
        let Presentation::Live(surface) = &mut self.presentation else {
            return false;
        };
        match surface.draw(&frame) {
            Ok(()) => true,
            Err(e) => {
                self.fall_back(e);
                false
            }
        }
    }

    fn fall_back(&mut self, error: SurfaceError) {
        warn!("Render surface failed, showing placeholder: {}", error);
        let (width, height) = self.size;
        // Dropping the live surface releases it.
        self.presentation = Presentation::Fallback(Placeholder::new(
            self.config.render.placeholder,
            width,
            height,
            &error,
        ));
        self.effects.on_hover_exit();
    }

    fn view_projection(&self) -> (glam::Mat4, glam::Mat4) {
        let aspect = self.size.0.max(1) as f32 / self.size.1.max(1) as f32;
        (
            self.camera.view_matrix(),
            self.camera.projection_matrix(aspect),
        )
    }

    /// World-space box the pointer is tested against.
    pub fn hit_region(&self) -> HitRegion {
        let world = self.rig.world_transforms();
        let (min, max) = self.rig.world_bounds(&world);
        HitRegion::new(min, max)
    }

    /// Describe the current frame without drawing it.
    pub fn compose(&self) -> FrameDescription {
        compose_frame(&FrameInputs {
            frame: self.frame,
            time: self.motion.elapsed() as f32,
            state: self.behavior.state(),
            rig: &self.rig,
            quality: self.quality.settings(),
            layout: self.quality.layout(),
            camera: &self.camera,
            stage: &self.stage,
            effects: &self.effects,
            speech_bubble: &self.config.render.speech_bubble,
            width: self.size.0,
            height: self.size.1,
        })
    }

    /// Cancel every pending timer and release the surface.
    pub fn unmount(mut self) -> TeardownReport {
        let timers_cancelled = self.timers.cancel_all();
        let report = TeardownReport {
            frames: self.frame,
            timers_cancelled,
            fallback: self.is_fallback(),
        };
        info!(
            "Avatar unmounted after {} frames ({} timers cancelled)",
            report.frames, report.timers_cancelled
        );
        report
    }

    pub fn state(&self) -> BehaviorState {
        self.behavior.state()
    }

    pub fn behavior(&self) -> &BehaviorMachine {
        &self.behavior
    }

    pub fn tier(&self) -> QualityTier {
        self.quality.tier()
    }

    pub fn layout(&self) -> SceneLayout {
        self.quality.layout()
    }

    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn effects(&self) -> &EffectEmitter {
        &self.effects
    }

    /// Time since mount.
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.presentation, Presentation::Fallback(_))
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.presentation {
            Presentation::Fallback(p) => Some(p),
            Presentation::Live(_) => None,
        }
    }
}

impl std::fmt::Debug for AvatarInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarInstance")
            .field("frame", &self.frame)
            .field("clock", &self.clock)
            .field("state", &self.behavior.state())
            .field("tier", &self.quality.tier())
            .field("fallback", &self.is_fallback())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::rig::Segment;
    use crate::scene::surface::{HeadlessBackend, UnavailableBackend};

    const FRAME: Duration = Duration::from_micros(16_667);

    fn config() -> Config {
        Config {
            seed: Some(42),
            ..Default::default()
        }
    }

    fn spec(viewport_width: u32) -> MountSpec {
        MountSpec {
            width: 600,
            height: 600,
            viewport_width,
        }
    }

    fn run_for(instance: &mut AvatarInstance, duration: Duration) {
        let end = instance.elapsed() + duration;
        while instance.elapsed() < end {
            instance.tick(FRAME);
        }
    }

    #[test]
    fn test_scenario_mobile() {
        let backend = HeadlessBackend::new();
        let (mut avatar, _handle) = AvatarInstance::mount(config(), spec(500), &backend);
        assert_eq!(avatar.tier(), QualityTier::Mobile);
        assert!(!avatar.quality().settings().shadows_enabled());
        assert_eq!(avatar.stage().lighting.shadow_casters(), 0);
        assert_eq!(avatar.effects().ambient().len(), 30);

        avatar.tick(FRAME);
        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.particles.len(), 30);
        assert!(frame.items.iter().all(|i| !i.cast_shadow));
    }

    #[test]
    fn test_scenario_desktop() {
        let backend = HeadlessBackend::new();
        let (mut avatar, _handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        assert_eq!(avatar.tier(), QualityTier::Desktop);
        assert_eq!(avatar.quality().settings().shadow_map_size, Some(1024));
        assert_eq!(avatar.effects().ambient().len(), 60);

        avatar.tick(FRAME);
        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.particles.len(), 60);
        assert_eq!(frame.stage.lighting.shadow_casters(), 1);
    }

    #[test]
    fn test_scenario_wave_clears_itself() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);

        assert!(handle.pointer_enter());
        avatar.tick(Duration::ZERO);
        assert!(avatar.behavior().is_waving());
        assert_eq!(avatar.state(), BehaviorState::Waving);

        run_for(&mut avatar, Duration::from_millis(980));
        assert!(avatar.behavior().is_waving());

        run_for(&mut avatar, Duration::from_millis(20));
        assert!(!avatar.behavior().is_waving());
        assert!(avatar.behavior().is_hovered());
    }

    #[test]
    fn test_scenario_no_graphics_context() {
        let backend = UnavailableBackend::new("no adapter");
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        assert!(avatar.is_fallback());
        let placeholder = avatar.placeholder().unwrap();
        assert_eq!((placeholder.width, placeholder.height), (600, 600));

        // Behavior still runs logically; nothing is drawn.
        handle.pointer_enter();
        let report = avatar.tick(FRAME);
        assert!(!report.drawn);
        assert!(avatar.behavior().is_hovered());
        assert!(!avatar.effects().is_hover_active());

        let teardown = avatar.unmount();
        assert!(teardown.fallback);
        assert!(!handle.pointer_leave());
    }

    #[test]
    fn test_hover_effects_created_and_destroyed() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);

        handle.pointer_enter();
        avatar.tick(FRAME);
        assert!(avatar.effects().is_hover_active());
        assert_eq!(avatar.effects().label_instances().len(), 3);
        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.speech_bubble.as_deref(), Some("Ready to learn?"));

        handle.pointer_leave();
        avatar.tick(FRAME);
        assert!(!avatar.effects().is_hover_active());
        assert_eq!(avatar.effects().particle_count(), 60);
        assert_eq!(backend.last_frame().unwrap().speech_bubble, None);
    }

    #[test]
    fn test_compact_layout_uses_two_labels() {
        let backend = HeadlessBackend::new();
        let spec = MountSpec {
            width: 400,
            height: 400,
            viewport_width: 1200,
        };
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec, &backend);
        assert_eq!(avatar.layout(), SceneLayout::Compact);
        handle.pointer_enter();
        avatar.tick(FRAME);
        assert_eq!(avatar.effects().label_instances().len(), 2);
    }

    #[test]
    fn test_blink_restores_within_hold() {
        let backend = HeadlessBackend::new();
        let (mut avatar, _handle) = AvatarInstance::mount(config(), spec(1200), &backend);

        let mut closed_at = None;
        while avatar.elapsed() < Duration::from_secs(6) {
            avatar.tick(FRAME);
            let openness = avatar.rig().eye_openness();
            match closed_at {
                None if openness < 1.0 => {
                    assert!((openness - 0.1).abs() < 1e-6);
                    closed_at = Some(avatar.elapsed());
                }
                Some(at) if openness == 1.0 => {
                    let held = avatar.elapsed() - at;
                    assert!(held <= Duration::from_millis(150) + FRAME, "{:?}", held);
                    return;
                }
                _ => {}
            }
        }
        panic!("no complete blink within 6s");
    }

    #[test]
    fn test_hover_round_trip_is_continuous() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        run_for(&mut avatar, Duration::from_secs(2));

        let mut prev = avatar.pose().rotation_y;
        let mut prev_y = avatar.pose().bob_y;
        for frame in 0..300 {
            if frame == 50 {
                handle.pointer_enter();
            }
            if frame == 200 {
                handle.pointer_leave();
            }
            avatar.tick(FRAME);
            let pose = *avatar.pose();
            assert!((pose.rotation_y - prev).abs() < 0.05, "rotation jump at {frame}");
            assert!((pose.bob_y - prev_y).abs() < 0.01, "bob jump at {frame}");
            prev = pose.rotation_y;
            prev_y = pose.bob_y;
        }
        // Spin resumed after leaving.
        let before = avatar.pose().rotation_y;
        avatar.tick(FRAME);
        assert!(avatar.pose().rotation_y > before);
    }

    #[test]
    fn test_resize_debounced_and_applied() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        assert_eq!(avatar.tier(), QualityTier::Desktop);

        for i in 0..10 {
            handle.resize(if i % 2 == 0 { 500 } else { 800 }, 500, 500);
            avatar.tick(FRAME);
        }
        assert_eq!(avatar.tier(), QualityTier::Desktop);
        assert_eq!(avatar.quality().classifications(), 1);

        run_for(&mut avatar, Duration::from_millis(200));
        assert_eq!(avatar.tier(), QualityTier::Mobile);
        assert_eq!(avatar.quality().classifications(), 2);
        assert_eq!(avatar.effects().ambient().len(), 30);
        assert_eq!(backend.resizes(), vec![(500, 500)]);
    }

    #[test]
    fn test_unmount_cancels_timers_and_releases_surface() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        handle.pointer_enter();
        handle.resize(1200, 700, 700);
        avatar.tick(FRAME);
        // Blink, wave end, resize debounce.
        assert_eq!(avatar.pending_timers(), 3);
        assert_eq!(backend.live_surfaces(), 1);

        let report = avatar.unmount();
        assert_eq!(report.timers_cancelled, 3);
        assert!(!report.fallback);
        assert_eq!(backend.live_surfaces(), 0);
        assert!(!handle.pointer_enter());
    }

    #[test]
    fn test_collapsed_container_resumes_drawing() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        assert!(avatar.tick(FRAME).drawn);

        handle.resize(1200, 0, 0);
        for _ in 0..20 {
            avatar.tick(FRAME);
        }
        assert!(!avatar.is_fallback());
        assert!(!avatar.tick(FRAME).drawn);
        let drawn_while_collapsed = backend.frames_drawn();
        avatar.tick(FRAME);
        assert_eq!(backend.frames_drawn(), drawn_while_collapsed);
        assert_eq!(backend.live_surfaces(), 1);

        handle.resize(1200, 600, 600);
        for _ in 0..20 {
            avatar.tick(FRAME);
        }
        assert!(!avatar.is_fallback());
        assert!(avatar.tick(FRAME).drawn);
        assert!(backend.frames_drawn() > drawn_while_collapsed);
        assert_eq!(backend.resizes(), vec![(600, 600)]);
    }

    #[test]
    fn test_mount_survives_unvalidated_config() {
        let mut config = Config::from_str("seed = 1\n[effects]\nambient_scale = -2.0\n").unwrap();
        config.effects.burst_scale = f32::NAN;
        config.behavior.blink_interval_min_ms = 5000;
        config.behavior.blink_interval_max_ms = 3000;
        config.camera.min_distance = 9.0;
        assert!(config.validate().is_err());

        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config, spec(1200), &backend);
        assert_eq!(avatar.effects().ambient().len(), 60);
        handle.pointer_enter();
        run_for(&mut avatar, Duration::from_millis(200));
        assert!(avatar.effects().is_hover_active());
        assert!(!avatar.is_fallback());
        assert!(avatar.tick(FRAME).drawn);
    }

    #[test]
    fn test_context_loss_falls_back() {
        let backend = HeadlessBackend::new();
        let (mut avatar, _handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        assert!(avatar.tick(FRAME).drawn);

        backend.lose_context();
        let report = avatar.tick(FRAME);
        assert!(!report.drawn);
        assert!(avatar.is_fallback());
        assert_eq!(backend.live_surfaces(), 0);
        assert!(!avatar.tick(FRAME).drawn);
    }

    #[test]
    fn test_pointer_move_hit_testing() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        avatar.tick(FRAME);

        handle.pointer_move(0.95, 0.95);
        avatar.tick(FRAME);
        assert!(!avatar.behavior().is_hovered());

        handle.pointer_move(0.0, 0.0);
        avatar.tick(FRAME);
        assert!(avatar.behavior().is_hovered());

        handle.send(HostEvent::Pointer(PointerEvent::Out));
        avatar.tick(FRAME);
        assert!(!avatar.behavior().is_hovered());
    }

    #[test]
    fn test_speech_bubble_segment_follows_hover() {
        let backend = HeadlessBackend::new();
        let (mut avatar, handle) = AvatarInstance::mount(config(), spec(1200), &backend);
        handle.pointer_enter();
        avatar.tick(FRAME);
        assert!(avatar.rig().node(Segment::SpeechBubble).visible);
    }
}
