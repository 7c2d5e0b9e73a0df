//! Rayleigh scattering cross-sections and volume coefficients.
//!
//! The per-wavelength cross-section is precomputed once per build; the
//! volume coefficient then only scales it with the local molecular number
//! density. The cross-section formula takes the wavelength in centimeters
//! and the number density in cm^-3.

use crate::physics::constants::{KING_CORRECTION_FACTOR, PI};
use crate::physics::lut::AtmosphereLut;

#[derive(Debug, Clone)]
pub struct Rayleigh {
    min_wavelength: u32,
    /// sigma(lambda) per nm bucket.
    cross_sections: Vec<f64>,
    /// N(0) in cm^-3.
    sea_level_number_density: f64,
}

impl Rayleigh {
    pub fn new(lut: &AtmosphereLut, sea_level_number_density: f64) -> Self {
        let min_wavelength = lut.min_wavelength();
        let cross_sections = (0..lut.num_wavelengths())
            .map(|j| {
                let wavelength_nm = min_wavelength + j as u32;
                cross_section(
                    lut.sea_level_refractive_index(wavelength_nm),
                    wavelength_nm,
                    sea_level_number_density,
                )
            })
            .collect();
        Self {
            min_wavelength,
            cross_sections,
            sea_level_number_density,
        }
    }

    #[inline]
    pub fn cross_section(&self, wavelength_nm: u32) -> f64 {
        self.cross_sections[(wavelength_nm - self.min_wavelength) as usize]
    }

    /// Molecular number density at altitude, scaled off the sea-level value
    /// by the mass-density ratio. Zero for airless configurations.
    #[inline]
    pub fn number_density_at(&self, lut: &AtmosphereLut, altitude: f64) -> f64 {
        let sea_level = lut.sea_level_density();
        if self.sea_level_number_density <= 0.0 || sea_level <= 0.0 {
            return 0.0;
        }
        self.sea_level_number_density * lut.density_at(altitude) / sea_level
    }

    /// Volume scattering coefficient beta(h, lambda) = N(h) * sigma(lambda).
    #[inline]
    pub fn volume_coefficient(&self, lut: &AtmosphereLut, altitude: f64, wavelength_nm: u32) -> f64 {
        self.number_density_at(lut, altitude) * self.cross_section(wavelength_nm)
    }
}

/// Rayleigh cross-section with the King correction for anisotropic
/// molecules. Degenerate inputs (vacuum) yield zero.
fn cross_section(refractive_index: f64, wavelength_nm: u32, number_density: f64) -> f64 {
    if number_density <= 0.0 {
        return 0.0;
    }

    let wavelength_cm = f64::from(wavelength_nm) * 1.0e-7;
    let wavelength_cm4 = wavelength_cm.powi(4);
    let n2 = refractive_index * refractive_index;

    let dividend = 24.0 * PI.powi(3) * (n2 - 1.0).powi(2);
    let divisor = wavelength_cm4 * number_density * number_density * (n2 + 2.0).powi(2);

    dividend / divisor * KING_CORRECTION_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AtmosphereConfig, PlanetConfig, SamplingConfig};

    fn earth_lut() -> AtmosphereLut {
        AtmosphereLut::precalculate(
            &PlanetConfig::default(),
            &AtmosphereConfig::default(),
            &SamplingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_cross_section_falls_with_wavelength() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        // sigma ~ lambda^-4: a 700/400 ratio shrinks sigma by ~(7/4)^4 ~ 9.4,
        // slightly offset by dispersion of n.
        let blue = rayleigh.cross_section(400);
        let red = rayleigh.cross_section(700);
        let ratio = blue / red;
        assert!(ratio > 8.0 && ratio < 11.0, "ratio = {ratio}");
    }

    #[test]
    fn test_volume_coefficient_falls_with_altitude() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let surface = rayleigh.volume_coefficient(&lut, 0.0, 550);
        let aloft = rayleigh.volume_coefficient(&lut, 30_000.0, 550);
        assert!(surface > 0.0);
        assert!(aloft < surface * 0.05);
    }

    #[test]
    fn test_vacuum_has_no_scattering() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 0.0);
        assert_eq!(rayleigh.volume_coefficient(&lut, 0.0, 550), 0.0);
    }
}
