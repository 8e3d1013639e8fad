//! Pointer hover detection.
//!
//! Hosts either report enter/leave for the avatar's screen region directly,
//! or send raw pointer positions in normalized device coordinates. Positions
//! are ray-cast against the rig's world bounds and turned into the same
//! enter/leave transitions.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Pointer input from the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Enter,
    Leave,
    /// Position in NDC, both axes in `[-1, 1]`, +Y up
    Move { x: f32, y: f32 },
    /// Pointer left the surface entirely
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverChange {
    Entered,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Unproject an NDC point through the camera. Depth runs 0 (near) to 1 (far).
    pub fn from_ndc(ndc: Vec2, view: Mat4, projection: Mat4) -> Option<Self> {
        let inverse = (projection * view).inverse();
        if !inverse.is_finite() {
            return None;
        }
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        Some(Self {
            origin: near,
            direction,
        })
    }
}

/// World-space axis-aligned box the pointer is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub min: Vec3,
    pub max: Vec3,
}

impl HitRegion {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Distance along the ray to the box, if it is hit in front of the origin.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();
        if t_near > t_far || t_far < 0.0 {
            None
        } else {
            Some(t_near.max(0.0))
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Turns a stream of hit/miss samples into enter/leave edges.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    inside: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Record whether the pointer is over the avatar. Returns the edge, if any.
    pub fn update(&mut self, inside: bool) -> Option<HoverChange> {
        if inside == self.inside {
            return None;
        }
        self.inside = inside;
        Some(if inside {
            HoverChange::Entered
        } else {
            HoverChange::Left
        })
    }

    /// Resolve a pointer event against the current hit region.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        region: &HitRegion,
        view: Mat4,
        projection: Mat4,
    ) -> Option<HoverChange> {
        match event {
            PointerEvent::Enter => self.update(true),
            PointerEvent::Leave | PointerEvent::Out => self.update(false),
            PointerEvent::Move { x, y } => {
                let hit = Ray::from_ndc(Vec2::new(x, y), view, projection)
                    .and_then(|ray| region.intersect(&ray))
                    .is_some();
                self.update(hit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> (Mat4, Mat4) {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.6, 5.0), Vec3::new(0.0, 0.6, 0.0), Vec3::Y);
        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 100.0);
        (view, proj)
    }

    fn figure() -> HitRegion {
        HitRegion::new(Vec3::new(-0.6, -1.0, -0.3), Vec3::new(0.6, 2.4, 0.3))
    }

    #[test]
    fn test_center_ray_hits() {
        let (view, proj) = camera();
        let ray = Ray::from_ndc(Vec2::ZERO, view, proj).unwrap();
        assert!(ray.direction.z < -0.99);
        let t = figure().intersect(&ray).unwrap();
        assert!(t > 4.0 && t < 5.0);
    }

    #[test]
    fn test_corner_ray_misses() {
        let (view, proj) = camera();
        let ray = Ray::from_ndc(Vec2::new(0.95, 0.0), view, proj).unwrap();
        assert!(figure().intersect(&ray).is_none());
    }

    #[test]
    fn test_box_behind_ray() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, -5.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
        };
        assert!(figure().intersect(&ray).is_none());
    }

    #[test]
    fn test_tracker_edges() {
        let (view, proj) = camera();
        let region = figure();
        let mut tracker = PointerTracker::new();

        assert_eq!(
            tracker.handle(PointerEvent::Move { x: 0.0, y: 0.0 }, &region, view, proj),
            Some(HoverChange::Entered)
        );
        // Moving within the region is not a new edge.
        assert_eq!(
            tracker.handle(PointerEvent::Move { x: 0.05, y: 0.1 }, &region, view, proj),
            None
        );
        assert_eq!(
            tracker.handle(PointerEvent::Move { x: 0.95, y: 0.9 }, &region, view, proj),
            Some(HoverChange::Left)
        );
        assert_eq!(
            tracker.handle(PointerEvent::Out, &region, view, proj),
            None
        );
        assert_eq!(
            tracker.handle(PointerEvent::Enter, &region, view, proj),
            Some(HoverChange::Entered)
        );
    }

    #[test]
    fn test_contains() {
        assert!(figure().contains(Vec3::new(0.0, 1.0, 0.0)));
        assert!(!figure().contains(Vec3::new(2.0, 1.0, 0.0)));
    }
}
