//! Physical constants and fixed discretization steps.
//!
//! All constants are in SI units unless otherwise specified.

// Re-export std PI
pub use std::f64::consts::PI;

// Fundamental constants
pub const IDEAL_UNIVERSAL_GAS_CONSTANT: f64 = 8.31447; // J/(mol*K)
pub const KING_CORRECTION_FACTOR: f64 = 1.05; // depolarization correction

// Discretization
pub const LUT_ALTITUDE_STEP: f64 = 1.0; // m, table resolution
pub const GRADIENT_DELTA: f64 = 10.0; // m, refractivity finite difference
pub const TRACE_STEP: f64 = 1000.0; // m, photon march arclength

// Shadow plane proportions
pub const SHADOW_HEIGHT_TO_RADIUS_FACTOR: f64 = 4.0;
pub const SHADOW_LENGTH_FACTOR: f64 = 8.0;

// Rasterization
pub const DEPOSIT_SCALE: f64 = 100.0; // intensity units per deposited count
