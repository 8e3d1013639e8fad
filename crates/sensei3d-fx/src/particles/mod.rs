mod system;

pub use system::{
    BatchParams, ParticleBatch, ParticleGpuData, MAX_PARTICLES, SHAPE_CIRCLE, SHAPE_STAR,
};
