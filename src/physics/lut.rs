//! Precalculated density and refractive-index lookup tables.
//!
//! Both tables are materialized once per planet configuration at 1 m
//! altitude resolution and stay immutable while photons are traced. The
//! refractive-index table is stored flat with the wavelength index fastest.

use crate::config::{AtmosphereConfig, PlanetConfig, SamplingConfig};
use crate::error::{ConfigError, MapperError, MapperResult};
use crate::physics::atmosphere::Atmosphere;
use crate::physics::constants::LUT_ALTITUDE_STEP;

#[derive(Debug, Clone)]
pub struct AtmosphereLut {
    height_steps: usize,
    min_wavelength: u32,
    num_wavelengths: usize,
    /// rho[i], kg/m^3 at altitude i meters.
    densities: Vec<f64>,
    /// n[i * num_wavelengths + j] for altitude i meters, wavelength min + j nm.
    refractive_indices: Vec<f64>,
}

impl AtmosphereLut {
    /// Materialize both tables. Pure function of the configuration.
    pub fn precalculate(
        planet: &PlanetConfig,
        atmosphere: &AtmosphereConfig,
        sampling: &SamplingConfig,
    ) -> MapperResult<Self> {
        planet.validate()?;
        sampling.validate()?;

        let height_steps = (planet.atmospheric_height_m / LUT_ALTITUDE_STEP) as usize;
        if height_steps == 0 {
            return Err(ConfigError::AtmosphericHeight(planet.atmospheric_height_m).into());
        }
        let num_wavelengths = sampling.num_wavelengths() as usize;
        let min_wavelength = sampling.min_wavelength_nm;
        let model = Atmosphere::new(atmosphere);

        let mut densities = Vec::new();
        densities
            .try_reserve_exact(height_steps)
            .map_err(|e| MapperError::Resource(format!("density table: {e}")))?;
        let mut refractive_indices = Vec::new();
        refractive_indices
            .try_reserve_exact(height_steps * num_wavelengths)
            .map_err(|e| MapperError::Resource(format!("refractive index table: {e}")))?;

        // Sea-level indices are shared by every altitude row.
        let sea_level: Vec<f64> = (0..num_wavelengths)
            .map(|j| model.refractive_index_at_sea_level(min_wavelength + j as u32))
            .collect();
        let sea_level_density = model.density_at(0.0);

        for i in 0..height_steps {
            let altitude = i as f64 * LUT_ALTITUDE_STEP;
            let density = model.density_at(altitude);
            if !density.is_finite() {
                return Err(ConfigError::NonFinite(altitude).into());
            }
            densities.push(density);

            let ratio = density / sea_level_density;
            for n0 in &sea_level {
                let n = 1.0 + (n0 - 1.0) * ratio;
                if !n.is_finite() {
                    return Err(ConfigError::NonFinite(altitude).into());
                }
                refractive_indices.push(n);
            }
        }

        Ok(Self {
            height_steps,
            min_wavelength,
            num_wavelengths,
            densities,
            refractive_indices,
        })
    }

    /// Build from raw tables. Intended for synthetic atmospheres in tests.
    pub fn from_tables(
        densities: Vec<f64>,
        refractive_indices: Vec<f64>,
        min_wavelength: u32,
        num_wavelengths: usize,
    ) -> Self {
        assert_eq!(refractive_indices.len(), densities.len() * num_wavelengths);
        Self {
            height_steps: densities.len(),
            min_wavelength,
            num_wavelengths,
            densities,
            refractive_indices,
        }
    }

    #[inline]
    pub fn height_steps(&self) -> usize {
        self.height_steps
    }

    #[inline]
    pub fn num_wavelengths(&self) -> usize {
        self.num_wavelengths
    }

    #[inline]
    pub fn min_wavelength(&self) -> u32 {
        self.min_wavelength
    }

    /// Air density at a fractional altitude; vacuum above the table.
    #[inline]
    pub fn density_at(&self, altitude: f64) -> f64 {
        let index = altitude as usize;
        if index < self.height_steps {
            self.densities[index]
        } else {
            0.0
        }
    }

    /// Refractive index at a fractional altitude; unity above the table.
    #[inline]
    pub fn refractive_index_at(&self, altitude: f64, wavelength_nm: u32) -> f64 {
        let index = altitude as usize;
        if index < self.height_steps {
            let j = (wavelength_nm - self.min_wavelength) as usize;
            self.refractive_indices[index * self.num_wavelengths + j]
        } else {
            1.0
        }
    }

    #[inline]
    pub fn sea_level_refractive_index(&self, wavelength_nm: u32) -> f64 {
        self.refractive_index_at(0.0, wavelength_nm)
    }

    #[inline]
    pub fn sea_level_density(&self) -> f64 {
        self.densities[0]
    }
}
