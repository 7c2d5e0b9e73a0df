//! Configuration of the planet, atmosphere, star and sampling run.
//!
//! Defaults describe Earth eclipsed by the Sun. All configs are plain data
//! with serde support; a whole run can be described by one JSON file loaded
//! through [`SimulationConfig::from_file`].

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ConfigError;

/// The eclipsing body and its atmosphere extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    /// Planet radius in meters.
    pub radius_m: f64,
    /// Height of the modeled atmosphere above the surface in meters.
    pub atmospheric_height_m: f64,
    /// Molecular number density at sea level in cm^-3.
    pub sea_level_molecular_number_density_cm3: f64,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius_m: 6.371e6,
            atmospheric_height_m: 42_000.0,
            sea_level_molecular_number_density_cm3: 2.504e19,
        }
    }
}

impl PlanetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius_m <= 0.0 || !self.radius_m.is_finite() {
            return Err(ConfigError::PlanetRadius(self.radius_m));
        }
        if self.atmospheric_height_m <= 0.0 || !self.atmospheric_height_m.is_finite() {
            return Err(ConfigError::AtmosphericHeight(self.atmospheric_height_m));
        }
        if self.sea_level_molecular_number_density_cm3 < 0.0 {
            return Err(ConfigError::NumberDensity(
                self.sea_level_molecular_number_density_cm3,
            ));
        }
        Ok(())
    }

    /// Radius of the sphere bounding the atmosphere.
    #[inline]
    pub fn atmosphere_radius(&self) -> f64 {
        self.radius_m + self.atmospheric_height_m
    }
}

/// One term of the Sellmeier dispersion sum A / (B - lambda^-2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SellmeierTerm {
    pub a: f64,
    pub b: f64,
}

/// Physical properties of the atmosphere beyond its extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// Gravitational acceleration in m/s^2.
    pub gravity_mps2: f64,
    /// Molar mass of air in kg/mol.
    pub molar_mass_kgpmol: f64,
    /// Constant offset of the Sellmeier dispersion formula.
    pub sellmeier_a: f64,
    /// Sellmeier term pairs; wavelength enters in micrometers.
    pub sellmeier_terms: Vec<SellmeierTerm>,
    /// Scalar absorption placeholder added to the Rayleigh coefficient.
    pub absorption: f64,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            gravity_mps2: 9.81,
            molar_mass_kgpmol: 0.0289644,
            sellmeier_a: 8.06051e-5,
            sellmeier_terms: vec![
                SellmeierTerm { a: 2.480990e-2, b: 132.274 },
                SellmeierTerm { a: 1.74557e-4, b: 39.32957 },
            ],
            absorption: 0.0,
        }
    }
}

/// The occluded star.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    /// Star radius in meters.
    pub radius_m: f64,
    /// Distance from star center to planet center in meters.
    pub distance_m: f64,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self { radius_m: 6.9551e8, distance_m: 1.496e11 }
    }
}

impl SunConfig {
    pub fn validate(&self, planet: &PlanetConfig) -> Result<(), ConfigError> {
        if self.distance_m <= 0.0 || !self.distance_m.is_finite() {
            return Err(ConfigError::SunDistance(self.distance_m));
        }
        if self.radius_m <= planet.radius_m {
            return Err(ConfigError::SunRadius {
                sun_radius: self.radius_m,
                planet_radius: planet.radius_m,
            });
        }
        Ok(())
    }
}

/// Photon count, spectral range, texture size and reproducibility seed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub num_photons: u64,
    pub tex_width: u32,
    pub tex_height: u32,
    /// Inclusive lower bound of the sampled spectrum in nm.
    pub min_wavelength_nm: u32,
    /// Exclusive upper bound of the sampled spectrum in nm.
    pub max_wavelength_nm: u32,
    pub seed: u64,
    /// Photons generated and processed per pass; bounds peak photon memory.
    pub pass_size: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            num_photons: 10_000_000,
            tex_width: 1024,
            tex_height: 1024,
            min_wavelength_nm: 380,
            max_wavelength_nm: 740,
            seed: 1,
            pass_size: 1 << 20,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_wavelength_nm <= self.min_wavelength_nm {
            return Err(ConfigError::WavelengthRange {
                min: self.min_wavelength_nm,
                max: self.max_wavelength_nm,
            });
        }
        // tex_width = 1 degenerates the power-law column spacing (ln 1 = 0).
        if self.tex_width < 2 || self.tex_height < 1 {
            return Err(ConfigError::TextureSize {
                width: self.tex_width,
                height: self.tex_height,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn num_wavelengths(&self) -> u32 {
        self.max_wavelength_nm - self.min_wavelength_nm
    }
}

/// A whole run in one loadable unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub planet: PlanetConfig,
    pub atmosphere: AtmosphereConfig,
    pub sun: SunConfig,
    pub sampling: SamplingConfig,
}

impl SimulationConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: SimulationConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.planet.validate()?;
        self.sun.validate(&self.planet)?;
        self.sampling.validate()?;
        Ok(())
    }
}
