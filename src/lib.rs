//! Spectral eclipse shadow maps via photon mapping.
//!
//! Light from a finite-radius star is sampled into photons, marched through
//! a planet's refractive atmosphere under continuous bending and Rayleigh
//! extinction, and deposited into a non-uniform shadow-plane texture whose
//! rows are altitudes above the limb and whose columns stretch downwind of
//! the eclipse. A downstream renderer samples the resulting texture to
//! shade an eclipsed body.
//!
//! ```no_run
//! use eclipse_shadowmap::{
//!     build_shadow_map, AtmosphereConfig, PlanetConfig, SamplingConfig, SunConfig,
//! };
//!
//! let map = build_shadow_map(
//!     PlanetConfig::default(),
//!     AtmosphereConfig::default(),
//!     SunConfig::default(),
//!     SamplingConfig { num_photons: 1_000_000, ..Default::default() },
//! )?;
//! println!("dropped photons: {}", map.summary().dropped());
//! # Ok::<(), eclipse_shadowmap::MapperError>(())
//! ```

pub mod config;
pub mod error;
pub mod mapper;
pub mod physics;
pub mod raster;
pub mod transport;

// Re-export the public surface at the crate root.
pub use config::{
    AtmosphereConfig, PlanetConfig, SamplingConfig, SellmeierTerm, SimulationConfig, SunConfig,
};
pub use error::{ConfigError, MapperError, MapperResult};
pub use mapper::{build_shadow_map, CpuKernel, EclipseShadowMapper, PhotonKernel};
pub use raster::{ShadowGrid, ShadowMap, TraceSummary};
pub use transport::{AtmosphereTracer, Photon, PhotonEmitter, TraceOutcome};
