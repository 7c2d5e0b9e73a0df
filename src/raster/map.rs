//! The finished shadow map and its build summary.

use std::fmt;
use std::io::{self, Write};

/// Per-build photon bookkeeping. Soft per-photon drops are counted here and
/// reported alongside the map; they are never errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceSummary {
    /// Photons drawn from the emitter.
    pub emitted: u64,
    /// Photons that deposited into at least one cell.
    pub rasterized: u64,
    /// Photons that grazed past without entering the atmosphere.
    pub missed: u64,
    /// Photons that struck the planet.
    pub impacted: u64,
    /// Photons discarded by the per-photon step cap.
    pub step_cap_hit: u64,
    /// Atmosphere-exit rays that left the shadow grid before depositing.
    pub out_of_grid: u64,
    /// Whether any pixel bin saturated during the build.
    pub saturated: bool,
}

impl TraceSummary {
    pub fn merge(self, other: Self) -> Self {
        Self {
            emitted: self.emitted + other.emitted,
            rasterized: self.rasterized + other.rasterized,
            missed: self.missed + other.missed,
            impacted: self.impacted + other.impacted,
            step_cap_hit: self.step_cap_hit + other.step_cap_hit,
            out_of_grid: self.out_of_grid + other.out_of_grid,
            saturated: self.saturated || other.saturated,
        }
    }

    /// Total photons that never reached the texture.
    pub fn dropped(&self) -> u64 {
        self.missed + self.impacted + self.step_cap_hit + self.out_of_grid
    }
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emitted {}, rasterized {}, missed {}, impacted {}, step cap {}, out of grid {}",
            self.emitted,
            self.rasterized,
            self.missed,
            self.impacted,
            self.step_cap_hit,
            self.out_of_grid
        )
    }
}

/// Spectrally resolved shadow texture. Rows are altitudes above the limb,
/// columns are distances downwind of the eclipse, each pixel holds one
/// accumulator per nm bucket. Layout: wavelength fastest, x middle,
/// y slowest.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    width: u32,
    height: u32,
    min_wavelength: u32,
    num_wavelengths: u32,
    shadow_length_m: f64,
    shadow_height_m: f64,
    data: Vec<u32>,
    summary: TraceSummary,
}

impl ShadowMap {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        width: u32,
        height: u32,
        min_wavelength: u32,
        num_wavelengths: u32,
        shadow_length_m: f64,
        shadow_height_m: f64,
        data: Vec<u32>,
        summary: TraceSummary,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * num_wavelengths as usize
        );
        Self {
            width,
            height,
            min_wavelength,
            num_wavelengths,
            shadow_length_m,
            shadow_height_m,
            data,
            summary,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn min_wavelength(&self) -> u32 {
        self.min_wavelength
    }

    #[inline]
    pub fn num_wavelengths(&self) -> u32 {
        self.num_wavelengths
    }

    #[inline]
    pub fn shadow_length_m(&self) -> f64 {
        self.shadow_length_m
    }

    #[inline]
    pub fn shadow_height_m(&self) -> f64 {
        self.shadow_height_m
    }

    #[inline]
    pub fn summary(&self) -> &TraceSummary {
        &self.summary
    }

    /// Dense accumulator array, wavelength fastest, x middle, y slowest.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Accumulated intensity for one pixel and wavelength (nm).
    pub fn intensity_at(&self, x: u32, y: u32, wavelength_nm: u32) -> u32 {
        let pixel = y as usize * self.width as usize + x as usize;
        let bucket = (wavelength_nm - self.min_wavelength) as usize;
        self.data[pixel * self.num_wavelengths as usize + bucket]
    }

    /// Broadband sum over all wavelength buckets of one pixel.
    pub fn luminance(&self, x: u32, y: u32) -> u64 {
        let pixel = y as usize * self.width as usize + x as usize;
        let start = pixel * self.num_wavelengths as usize;
        self.data[start..start + self.num_wavelengths as usize]
            .iter()
            .map(|&value| u64::from(value))
            .sum()
    }

    /// Reference serialization: raw little-endian u32 in memory order.
    pub fn write_raw<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }
}
