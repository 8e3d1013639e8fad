//! Sensei3D - Interactive animated teacher avatar
//!
//! A hand-authored 3D figure that:
//! - Bobs, sways, and slowly spins from pure functions of elapsed time
//! - Blinks on its own and waves when the pointer arrives
//! - Scales geometry, shadows, and particles to the device
//! - Falls back to a static placeholder when no graphics context exists

pub mod avatar;
pub mod config;
pub mod error;
pub mod instance;
pub mod interaction;
pub mod scene;
pub mod scheduler;

pub use config::Config;
pub use error::{Result, Sensei3dError};
pub use instance::{AvatarHandle, AvatarInstance, HostEvent, MountSpec, TeardownReport, TickReport};
pub use scene::{FrameDescription, GraphicsBackend, HeadlessBackend, QualityTier, UnavailableBackend};
pub use scheduler::{FrameLoop, FrameScheduler, LoopExit, SubscriptionId};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
