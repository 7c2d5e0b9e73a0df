//! Error types for shadow map construction.
//!
//! Fatal errors abort a build before any photon work begins. Per-photon
//! conditions (missed atmosphere, planet impact, step cap) are counters on
//! [`crate::mapper::TraceSummary`], never errors.

/// Fatal errors raised while building a shadow map.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("resource allocation failed: {0}")]
    Resource(String),
}

/// Validation failures of the planet / atmosphere / sun / sampling setup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("planet radius must be positive, got {0} m")]
    PlanetRadius(f64),
    #[error("atmospheric height must be positive, got {0} m")]
    AtmosphericHeight(f64),
    #[error("sea-level molecular number density must be non-negative, got {0} cm^-3")]
    NumberDensity(f64),
    #[error("sun radius ({sun_radius} m) must exceed planet radius ({planet_radius} m)")]
    SunRadius { sun_radius: f64, planet_radius: f64 },
    #[error("sun distance must be positive, got {0} m")]
    SunDistance(f64),
    #[error("wavelength range [{min}, {max}) nm is empty")]
    WavelengthRange { min: u32, max: u32 },
    #[error("texture size {width}x{height} is too small")]
    TextureSize { width: u32, height: u32 },
    #[error("atmospheric layer constants produce non-finite values at altitude {0} m")]
    NonFinite(f64),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MapperResult<T> = Result<T, MapperError>;
