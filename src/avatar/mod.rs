//! Avatar module
//!
//! The hand-authored rig, its procedural motion, and the behavior state
//! machine with the timers that drive blink and wave overlays.

pub mod motion;
pub mod rig;
pub mod state;
pub mod timers;

pub use motion::{apply_pose, MotionGenerator, MotionInput, Pose};
pub use rig::{Material, Rig, RigNode, Segment, SegmentRole, Shape, Transform};
pub use state::{BehaviorMachine, BehaviorState};
pub use timers::{FiredTimer, TimerHandle, TimerKind, TimerQueue};
