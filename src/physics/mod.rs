//! Physics root module: atmospheric model, lookup-table precalculation and
//! Rayleigh scattering. All physics uses f64 and SI units internally;
//! wavelengths are integer nanometers except where a formula demands
//! another unit (noted at the use site).

pub mod atmosphere;
pub mod constants;
pub mod lut;
pub mod scattering;

// Re-export commonly accessed symbols for ergonomic downstream use.
pub use atmosphere::Atmosphere;
pub use lut::AtmosphereLut;
pub use scattering::Rayleigh;

// Type aliases (optional convenience)
pub type Vec2 = nalgebra::Vector2<f64>;
