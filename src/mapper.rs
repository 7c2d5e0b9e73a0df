//! Shadow map construction pipeline.
//!
//! Wires the precalculated tables, the emitter, the atmosphere tracer and
//! the texture tracer together: photons are generated in passes, traced
//! through the atmosphere and deposited into the shared pixel buffer. The
//! per-photon work is handed to a [`PhotonKernel`] so the rayon thread-pool
//! backend shipped here can be swapped for an accelerator without touching
//! the surrounding pipeline.

use std::sync::atomic::AtomicU32;

use rayon::prelude::*;

use crate::config::{AtmosphereConfig, PlanetConfig, SamplingConfig, SunConfig};
use crate::error::{MapperError, MapperResult};
use crate::physics::lut::AtmosphereLut;
use crate::physics::scattering::Rayleigh;
use crate::raster::grid::ShadowGrid;
use crate::raster::map::{ShadowMap, TraceSummary};
use crate::raster::texture::TextureRasterizer;
use crate::transport::emitter::PhotonEmitter;
use crate::transport::tracer::{AtmosphereTracer, TraceOutcome};
use crate::transport::Photon;

/// Backend capability: consume one batch of photons, tracing each through
/// the atmosphere and depositing survivors into the texture.
pub trait PhotonKernel {
    fn process(&self, photons: &mut [Photon]) -> TraceSummary;
}

/// CPU thread-pool backend. Photons are partitioned disjointly across
/// rayon workers; pixel writes go through atomic adds, so the final sums
/// are independent of the partitioning.
pub struct CpuKernel<'a> {
    tracer: AtmosphereTracer<'a>,
    rasterizer: &'a TextureRasterizer<'a>,
}

impl<'a> CpuKernel<'a> {
    pub fn new(tracer: AtmosphereTracer<'a>, rasterizer: &'a TextureRasterizer<'a>) -> Self {
        Self { tracer, rasterizer }
    }
}

impl PhotonKernel for CpuKernel<'_> {
    fn process(&self, photons: &mut [Photon]) -> TraceSummary {
        photons
            .par_iter_mut()
            .map(|photon| {
                let mut summary = TraceSummary { emitted: 1, ..Default::default() };
                match self.tracer.trace(photon) {
                    TraceOutcome::Exited => {
                        if self.rasterizer.deposit(photon) {
                            summary.rasterized = 1;
                        } else {
                            summary.out_of_grid = 1;
                        }
                    }
                    TraceOutcome::PlanetImpact => summary.impacted = 1,
                    TraceOutcome::NeverEntered => summary.missed = 1,
                    TraceOutcome::StepCapExceeded => summary.step_cap_hit = 1,
                }
                summary
            })
            .reduce(TraceSummary::default, TraceSummary::merge)
    }
}

/// Owns every piece of per-build state, including the seeded emitter.
pub struct EclipseShadowMapper {
    planet: PlanetConfig,
    sampling: SamplingConfig,
    absorption: f64,
    emitter: PhotonEmitter,
    lut: AtmosphereLut,
    rayleigh: Rayleigh,
    grid: ShadowGrid,
}

impl EclipseShadowMapper {
    pub fn new(
        planet: PlanetConfig,
        atmosphere: AtmosphereConfig,
        sun: SunConfig,
        sampling: SamplingConfig,
    ) -> MapperResult<Self> {
        planet.validate()?;
        sun.validate(&planet)?;
        sampling.validate()?;

        let lut = AtmosphereLut::precalculate(&planet, &atmosphere, &sampling)?;
        let rayleigh = Rayleigh::new(&lut, planet.sea_level_molecular_number_density_cm3);
        let grid = ShadowGrid::new(&planet, &sun, &sampling);
        let emitter = PhotonEmitter::new(&planet, &sun, &sampling);

        Ok(Self {
            planet,
            sampling,
            absorption: atmosphere.absorption,
            emitter,
            lut,
            rayleigh,
            grid,
        })
    }

    /// Run the whole pipeline and hand back the finished map.
    pub fn build(mut self) -> MapperResult<ShadowMap> {
        let width = self.sampling.tex_width;
        let height = self.sampling.tex_height;
        let num_wavelengths = self.sampling.num_wavelengths();
        let pixel_count = width as usize * height as usize * num_wavelengths as usize;

        let mut pixels: Vec<AtomicU32> = Vec::new();
        pixels
            .try_reserve_exact(pixel_count)
            .map_err(|e| MapperError::Resource(format!("pixel buffer: {e}")))?;
        pixels.resize_with(pixel_count, || AtomicU32::new(0));

        let tracer = AtmosphereTracer::new(
            &self.lut,
            &self.rayleigh,
            self.planet.radius_m,
            self.planet.atmospheric_height_m,
            self.absorption,
        );
        let rasterizer =
            TextureRasterizer::new(&self.grid, &pixels, self.sampling.min_wavelength_nm);
        let kernel = CpuKernel::new(tracer, &rasterizer);

        log::info!(
            "building {width}x{height}x{num_wavelengths} shadow map from {} photons",
            self.sampling.num_photons
        );

        // Photons are generated and consumed in passes to bound the live
        // photon array independently of the total count.
        let mut summary = TraceSummary::default();
        let mut remaining = self.sampling.num_photons;
        let pass_size = self.sampling.pass_size.max(1);
        while remaining > 0 {
            let batch = remaining.min(pass_size) as usize;
            let mut photons = self.emitter.emit_batch(batch);
            summary = summary.merge(kernel.process(&mut photons));
            remaining -= batch as u64;
        }
        summary.saturated = rasterizer.saturated();

        log::info!("finished tracing photons: {summary}");

        let data = pixels.into_iter().map(AtomicU32::into_inner).collect();
        Ok(ShadowMap::new(
            width,
            height,
            self.sampling.min_wavelength_nm,
            num_wavelengths,
            self.grid.shadow_length(),
            self.grid.shadow_height(),
            data,
            summary,
        ))
    }
}

/// Build a shadow map in one call. The entry point of the crate.
pub fn build_shadow_map(
    planet: PlanetConfig,
    atmosphere: AtmosphereConfig,
    sun: SunConfig,
    sampling: SamplingConfig,
) -> MapperResult<ShadowMap> {
    EclipseShadowMapper::new(planet, atmosphere, sun, sampling)?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn small_sampling() -> SamplingConfig {
        SamplingConfig {
            num_photons: 10_000,
            tex_width: 64,
            tex_height: 64,
            min_wavelength_nm: 550,
            max_wavelength_nm: 551,
            seed: 1,
            pass_size: 4096,
        }
    }

    /// Atmosphere with unit refractive index and no scatterers: photons
    /// pass through unchanged.
    fn vacuum_planet() -> (PlanetConfig, AtmosphereConfig) {
        let planet = PlanetConfig {
            sea_level_molecular_number_density_cm3: 0.0,
            ..Default::default()
        };
        let atmosphere = AtmosphereConfig {
            sellmeier_a: 0.0,
            sellmeier_terms: Vec::new(),
            ..Default::default()
        };
        (planet, atmosphere)
    }

    #[test]
    fn test_rejects_bad_config_before_tracing() {
        let planet = PlanetConfig { radius_m: -1.0, ..Default::default() };
        let result = EclipseShadowMapper::new(
            planet,
            AtmosphereConfig::default(),
            SunConfig::default(),
            small_sampling(),
        );
        assert!(matches!(
            result,
            Err(MapperError::Config(ConfigError::PlanetRadius(_)))
        ));
    }

    #[test]
    fn test_same_seed_reproduces_pixel_buffer() {
        let build = || {
            build_shadow_map(
                PlanetConfig::default(),
                AtmosphereConfig::default(),
                SunConfig::default(),
                small_sampling(),
            )
            .unwrap()
        };
        let a = build();
        let b = build();
        assert_eq!(a.data(), b.data());
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_summary_counters_account_for_every_photon() {
        let map = build_shadow_map(
            PlanetConfig::default(),
            AtmosphereConfig::default(),
            SunConfig::default(),
            small_sampling(),
        )
        .unwrap();

        let summary = map.summary();
        assert_eq!(summary.emitted, 10_000);
        assert_eq!(summary.emitted, summary.rasterized + summary.dropped());
        // An Earth-like setup rasterizes a healthy share of the batch.
        assert!(summary.rasterized > 0);
    }

    #[test]
    fn test_monochromatic_run_fills_only_its_bucket() {
        let map = build_shadow_map(
            PlanetConfig::default(),
            AtmosphereConfig::default(),
            SunConfig::default(),
            small_sampling(),
        )
        .unwrap();

        assert_eq!(map.num_wavelengths(), 1);
        let total: u64 = map.data().iter().map(|&v| u64::from(v)).sum();
        assert!(total > 0);
    }

    #[test]
    fn test_vacuum_keeps_sharp_umbra() {
        let (planet, atmosphere) = vacuum_planet();
        let radius = planet.radius_m;
        let map = build_shadow_map(planet, atmosphere, SunConfig::default(), small_sampling())
            .unwrap();

        // Straight rays graze the limb, so in the near field everything
        // well below the limb stays dark: the steepest exit slope cannot
        // dip a ray below 0.9 radii within the first dozen columns.
        let rect_height = map.shadow_height_m() / f64::from(map.height());
        let dark_rows = ((radius * 0.9) / rect_height) as u32;
        for y in 0..dark_rows {
            for x in 0..11 {
                assert_eq!(
                    map.luminance(x, y),
                    0,
                    "unexpected light below the limb at ({x}, {y})"
                );
            }
        }

        // Further out every surviving ray sweeps through, so the column is lit.
        let lit: u64 = (0..map.height()).map(|y| map.luminance(20, y)).sum();
        assert!(lit > 0);
    }

    #[test]
    fn test_forced_sign_runs_agree_at_the_limb() {
        use std::sync::atomic::Ordering;

        // The sign-forced emission scenario: one run samples only the upper
        // solar hemisphere, one only the lower. Paired draws aim at the
        // same annulus target, so near the eclipse both runs deposit into
        // the rows bracketing y = radius and agree up to the handful of
        // draws that split across a column edge or the planet surface. A
        // vacuum atmosphere keeps the tracing straight so the comparison is
        // purely geometric.
        let (planet, atmosphere) = vacuum_planet();
        let sun = SunConfig::default();
        let sampling = SamplingConfig { num_photons: 500, ..small_sampling() };
        let lut = AtmosphereLut::precalculate(&planet, &atmosphere, &sampling).unwrap();
        let rayleigh = Rayleigh::new(&lut, planet.sea_level_molecular_number_density_cm3);
        let grid = ShadowGrid::new(&planet, &sun, &sampling);
        let tracer = AtmosphereTracer::new(
            &lut,
            &rayleigh,
            planet.radius_m,
            planet.atmospheric_height_m,
            0.0,
        );

        let run = |sign: f64| -> Vec<u64> {
            let len = (grid.tex_width() * grid.tex_height()) as usize;
            let pixels: Vec<AtomicU32> = (0..len).map(|_| AtomicU32::new(0)).collect();
            let rasterizer =
                TextureRasterizer::new(&grid, &pixels, sampling.min_wavelength_nm);
            let mut emitter =
                PhotonEmitter::with_forced_sign(&planet, &sun, &sampling, sign);
            for mut photon in emitter.emit_batch(sampling.num_photons as usize) {
                if tracer.trace(&mut photon) == TraceOutcome::Exited {
                    rasterizer.deposit(&photon);
                }
            }
            pixels.iter().map(|bin| u64::from(bin.load(Ordering::Relaxed))).collect()
        };

        let upper = run(1.0);
        let lower = run(-1.0);

        let limb_row = grid.row_at(planet.radius_m);
        let cell = |buffer: &[u64], column: u32, row: u32| -> u64 {
            buffer[(row * grid.tex_width() + column) as usize]
        };
        for column in 4..12u32 {
            let upper_total: u64 =
                (0..grid.tex_height()).map(|row| cell(&upper, column, row)).sum();
            let lower_total: u64 =
                (0..grid.tex_height()).map(|row| cell(&lower, column, row)).sum();

            // Everything this close to the eclipse sits in the two rows
            // around y = radius, for both hemispheres.
            let upper_limb = cell(&upper, column, limb_row - 1) + cell(&upper, column, limb_row);
            let lower_limb = cell(&lower, column, limb_row - 1) + cell(&lower, column, limb_row);
            assert_eq!(upper_total, upper_limb, "column {column}");
            assert_eq!(lower_total, lower_limb, "column {column}");

            let difference = upper_total.abs_diff(lower_total);
            assert!(
                difference <= upper_total / 20 + 300,
                "column {column}: {upper_total} vs {lower_total}"
            );
        }
    }

    #[test]
    fn test_zero_offset_beam_is_symmetric_under_axis_fold() {
        use std::sync::atomic::Ordering;

        use crate::physics::Vec2;
        use crate::transport::emitter::ray_sphere_entry_distance;

        // Zero sun offset, one target altitude: the beam aimed at the
        // upper annulus and its mirror aimed at the lower one trace mirror
        // trajectories, and folding the lower exit ray back above the axis
        // reproduces the deposition bit for bit. The rasterized field is
        // symmetric about the axis.
        let (planet, atmosphere) = vacuum_planet();
        let sun = SunConfig::default();
        let sampling = small_sampling();
        let lut = AtmosphereLut::precalculate(&planet, &atmosphere, &sampling).unwrap();
        let rayleigh = Rayleigh::new(&lut, planet.sea_level_molecular_number_density_cm3);
        let grid = ShadowGrid::new(&planet, &sun, &sampling);
        let tracer = AtmosphereTracer::new(
            &lut,
            &rayleigh,
            planet.radius_m,
            planet.atmospheric_height_m,
            0.0,
        );

        let start = Vec2::new(-sun.distance_m, 0.0);
        let aim = |target: Vec2| -> Photon {
            let direction = (target - start).normalize();
            let entry = ray_sphere_entry_distance(
                start,
                direction,
                Vec2::zeros(),
                planet.atmosphere_radius(),
            )
            .unwrap();
            Photon {
                position: start + direction * entry,
                direction,
                wavelength: 550,
                intensity: 1.0,
            }
        };

        let run = |mut photon: Photon, fold: bool| -> Vec<u64> {
            let len = (grid.tex_width() * grid.tex_height()) as usize;
            let pixels: Vec<AtomicU32> = (0..len).map(|_| AtomicU32::new(0)).collect();
            let rasterizer =
                TextureRasterizer::new(&grid, &pixels, sampling.min_wavelength_nm);
            assert_eq!(tracer.trace(&mut photon), TraceOutcome::Exited);
            if fold {
                photon.position.y = -photon.position.y;
                photon.direction.y = -photon.direction.y;
            }
            assert!(rasterizer.deposit(&photon));
            pixels.iter().map(|bin| u64::from(bin.load(Ordering::Relaxed))).collect()
        };

        let altitude = 20_000.0;
        let upper = run(aim(Vec2::new(0.0, planet.radius_m + altitude)), false);
        let lower = run(aim(Vec2::new(0.0, -(planet.radius_m + altitude))), true);

        assert!(upper.iter().any(|&value| value > 0));
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_vacuum_leaves_intensity_quantum_intact() {
        // With no extinction every deposit is exactly 100 units.
        let (planet, atmosphere) = vacuum_planet();
        let sampling = SamplingConfig { num_photons: 2000, ..small_sampling() };
        let map =
            build_shadow_map(planet, atmosphere, SunConfig::default(), sampling).unwrap();
        let total: u64 = map.data().iter().map(|&v| u64::from(v)).sum();
        assert!(total > 0);
        assert_eq!(total % 100, 0);
    }
}
