//! Layered barometric atmosphere with Sellmeier dispersion.
//!
//! Pressure and temperature follow the U.S. standard atmosphere: piecewise
//! layers, each with a base temperature, a lapse rate, a static pressure and
//! a base altitude. Density follows from the ideal gas law. The refractive
//! index at sea level comes from a Sellmeier-style dispersion sum and scales
//! linearly with density at altitude.

use crate::config::{AtmosphereConfig, SellmeierTerm};
use crate::physics::constants::IDEAL_UNIVERSAL_GAS_CONSTANT;

/// One layer of the standard atmosphere.
#[derive(Debug, Clone, Copy)]
pub struct AtmosphericLayer {
    pub base_temperature: f64,      // K
    pub temperature_lapse_rate: f64, // K/m
    pub static_pressure: f64,       // Pa
    pub base_height: f64,           // m
}

/// U.S. standard atmosphere layers up to the mesosphere.
const LAYERS: [AtmosphericLayer; 4] = [
    AtmosphericLayer {
        base_temperature: 288.15,
        temperature_lapse_rate: -0.0065,
        static_pressure: 101_325.0,
        base_height: 0.0,
    },
    AtmosphericLayer {
        base_temperature: 216.65,
        temperature_lapse_rate: 0.0,
        static_pressure: 22_632.10,
        base_height: 11_000.0,
    },
    AtmosphericLayer {
        base_temperature: 216.65,
        temperature_lapse_rate: 0.001,
        static_pressure: 5474.89,
        base_height: 20_000.0,
    },
    AtmosphericLayer {
        base_temperature: 228.65,
        temperature_lapse_rate: 0.0028,
        static_pressure: 868.02,
        base_height: 32_000.0,
    },
];

/// Evaluable atmosphere model; pure functions of altitude and wavelength.
#[derive(Debug, Clone)]
pub struct Atmosphere {
    gravity: f64,    // m/s^2
    molar_mass: f64, // kg/mol
    sellmeier_a: f64,
    sellmeier_terms: Vec<SellmeierTerm>,
}

impl Atmosphere {
    pub fn new(config: &AtmosphereConfig) -> Self {
        Self {
            gravity: config.gravity_mps2,
            molar_mass: config.molar_mass_kgpmol,
            sellmeier_a: config.sellmeier_a,
            sellmeier_terms: config.sellmeier_terms.clone(),
        }
    }

    fn layer_at(altitude: f64) -> &'static AtmosphericLayer {
        if altitude < 11_000.0 {
            &LAYERS[0]
        } else if altitude < 20_000.0 {
            &LAYERS[1]
        } else if altitude < 32_000.0 {
            &LAYERS[2]
        } else {
            &LAYERS[3]
        }
    }

    /// Temperature at altitude in K.
    #[inline]
    pub fn temperature_at(&self, altitude: f64) -> f64 {
        let layer = Self::layer_at(altitude);
        layer.base_temperature + layer.temperature_lapse_rate * (altitude - layer.base_height)
    }

    /// Pressure at altitude in Pa. Lapse-rate layers use the power-law
    /// barometric formula, isothermal layers the exponential one.
    pub fn pressure_at(&self, altitude: f64) -> f64 {
        let layer = Self::layer_at(altitude);
        let gm = self.gravity * self.molar_mass;

        if layer.temperature_lapse_rate != 0.0 {
            let divisor = layer.base_temperature
                + layer.temperature_lapse_rate * (altitude - layer.base_height);
            let exponent =
                gm / (IDEAL_UNIVERSAL_GAS_CONSTANT * layer.temperature_lapse_rate);
            layer.static_pressure * (layer.base_temperature / divisor).powf(exponent)
        } else {
            layer.static_pressure
                * (-gm * (altitude - layer.base_height)
                    / (IDEAL_UNIVERSAL_GAS_CONSTANT * layer.base_temperature))
                    .exp()
        }
    }

    /// Air density at altitude in kg/m^3.
    #[inline]
    pub fn density_at(&self, altitude: f64) -> f64 {
        self.pressure_at(altitude) * self.molar_mass
            / (IDEAL_UNIVERSAL_GAS_CONSTANT * self.temperature_at(altitude))
    }

    /// Refractive index of air at sea level for the given wavelength.
    /// The Sellmeier sum takes the wavelength in micrometers.
    pub fn refractive_index_at_sea_level(&self, wavelength_nm: u32) -> f64 {
        let wavelength_um_en2 = (f64::from(wavelength_nm) * 1.0e-3).powi(-2);

        let sum: f64 = self
            .sellmeier_terms
            .iter()
            .map(|term| term.a / (term.b - wavelength_um_en2))
            .sum();

        1.0 + self.sellmeier_a + sum
    }

    /// Refractive index at altitude: refractivity scales with density.
    pub fn refractive_index_at(&self, altitude: f64, wavelength_nm: u32) -> f64 {
        let n0 = self.refractive_index_at_sea_level(wavelength_nm);
        1.0 + (n0 - 1.0) * self.density_at(altitude) / self.density_at(0.0)
    }
}
