//! Photon transport: emission from the solar disc and the march through
//! the refractive atmosphere.

pub mod emitter;
pub mod tracer;

pub use emitter::PhotonEmitter;
pub use tracer::{AtmosphereTracer, TraceOutcome};

use crate::physics::Vec2;

/// A single photon sample. All transport is two-dimensional in the plane
/// containing star center, planet center and the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    /// Position in meters, planet-centered.
    pub position: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Wavelength in nm.
    pub wavelength: u32,
    /// Remaining intensity, starts at 1.0 and only decreases.
    pub intensity: f64,
}
