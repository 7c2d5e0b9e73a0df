//! Stepwise curved-ray integration through the refractive atmosphere.
//!
//! Photons march with a fixed arclength step. Inside the atmosphere the
//! direction is bent by the local refractivity gradient and the intensity
//! decays by Rayleigh extinction; outside, steps are pure translation.
//! Every photon ends in exactly one [`TraceOutcome`].

use crate::physics::constants::{GRADIENT_DELTA, TRACE_STEP};
use crate::physics::lut::AtmosphereLut;
use crate::physics::scattering::Rayleigh;
use crate::physics::Vec2;
use crate::transport::Photon;

/// Terminal state of a traced photon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// Entered and left the atmosphere; the photon feeds the rasterizer.
    Exited,
    /// Fell below the planet surface.
    PlanetImpact,
    /// Receding from the atmosphere without ever having entered it.
    NeverEntered,
    /// Ran into the per-photon step cap.
    StepCapExceeded,
}

pub struct AtmosphereTracer<'a> {
    lut: &'a AtmosphereLut,
    rayleigh: &'a Rayleigh,
    planet_radius: f64,
    atmosphere_height: f64,
    absorption: f64,
    max_steps: usize,
}

impl<'a> AtmosphereTracer<'a> {
    pub fn new(
        lut: &'a AtmosphereLut,
        rayleigh: &'a Rayleigh,
        planet_radius: f64,
        atmosphere_height: f64,
        absorption: f64,
    ) -> Self {
        // Twice the atmosphere diameter in steps bounds any physical path;
        // photons that outlast it are discarded, never looped forever.
        let max_steps =
            (2.0 * (planet_radius + atmosphere_height) / TRACE_STEP).ceil() as usize;
        Self {
            lut,
            rayleigh,
            planet_radius,
            atmosphere_height,
            absorption,
            max_steps,
        }
    }

    /// March the photon until it exits the atmosphere, strikes the planet,
    /// provably misses, or exhausts the step cap.
    pub fn trace(&self, photon: &mut Photon) -> TraceOutcome {
        let atmosphere_radius = self.planet_radius + self.atmosphere_height;

        let mut entered = false;
        let mut steps = 0usize;

        while photon.position.norm() > self.planet_radius {
            if steps >= self.max_steps {
                return TraceOutcome::StepCapExceeded;
            }
            self.step(photon);
            steps += 1;

            let r = photon.position.norm();
            if !entered {
                if r < atmosphere_radius {
                    entered = true;
                } else if photon.position.dot(&photon.direction) > 0.0 {
                    // Outside and receding; a straight ray cannot come back.
                    return TraceOutcome::NeverEntered;
                }
            } else if r > atmosphere_radius {
                return TraceOutcome::Exited;
            }
        }

        TraceOutcome::PlanetImpact
    }

    /// One arclength step: refract, translate, attenuate. Extinction is
    /// evaluated at the altitude the step started from.
    fn step(&self, photon: &mut Photon) {
        let altitude = photon.position.norm() - self.planet_radius;

        // Bend only while both finite-difference samples fall inside the
        // table; the topmost sliver of the atmosphere is traversed straight.
        if altitude + GRADIENT_DELTA < self.atmosphere_height {
            let n1 = self.lut.refractive_index_at(altitude, photon.wavelength);
            let dn = (self.lut.refractive_index_at(altitude + GRADIENT_DELTA, photon.wavelength)
                - n1)
                / GRADIENT_DELTA;

            // Discrete Eikonal update: the refractivity gradient pulls the
            // direction by dn * step per component, renormalized. Stable for
            // |dn| << 1 since the divisor stays near n1 >= 1.
            let pull = dn * TRACE_STEP;
            let bent = Vec2::new(
                n1 * photon.direction.x + pull,
                n1 * photon.direction.y + pull,
            ) / (n1 + dn);
            photon.direction = bent.normalize();
        }

        photon.position += photon.direction * TRACE_STEP;

        let beta = self
            .rayleigh
            .volume_coefficient(self.lut, altitude, photon.wavelength);
        photon.intensity *= (-(self.absorption + beta) * TRACE_STEP).exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AtmosphereConfig, PlanetConfig, SamplingConfig, SunConfig};
    use crate::transport::emitter::PhotonEmitter;

    const RADIUS: f64 = 6.371e6;
    const HEIGHT: f64 = 42_000.0;

    fn vacuum_lut() -> AtmosphereLut {
        let steps = HEIGHT as usize;
        AtmosphereLut::from_tables(vec![0.0; steps], vec![1.0; steps], 550, 1)
    }

    fn earth_lut() -> AtmosphereLut {
        AtmosphereLut::precalculate(
            &PlanetConfig::default(),
            &AtmosphereConfig::default(),
            &SamplingConfig::default(),
        )
        .unwrap()
    }

    fn grazing_photon_in(height: f64, altitude: f64) -> Photon {
        // Starts at the atmosphere sphere on the sunward side, travelling +x
        // along a horizontal chord at the given periapsis altitude.
        let y = RADIUS + altitude;
        let x = -((RADIUS + height).powi(2) - y * y).sqrt();
        Photon {
            position: Vec2::new(x, y),
            direction: Vec2::new(1.0, 0.0),
            wavelength: 550,
            intensity: 1.0,
        }
    }

    fn grazing_photon(altitude: f64) -> Photon {
        grazing_photon_in(HEIGHT, altitude)
    }

    #[test]
    fn test_vacuum_leaves_photon_untouched() {
        let lut = vacuum_lut();
        let rayleigh = Rayleigh::new(&lut, 0.0);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        let mut photon = grazing_photon(20_000.0);
        let direction_in = photon.direction;
        let outcome = tracer.trace(&mut photon);

        assert_eq!(outcome, TraceOutcome::Exited);
        assert_eq!(photon.direction, direction_in);
        assert_eq!(photon.intensity, 1.0);
        assert!(photon.position.norm() >= RADIUS + HEIGHT);
    }

    #[test]
    fn test_intensity_never_increases() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        let sampling = SamplingConfig { seed: 11, ..Default::default() };
        let mut emitter =
            PhotonEmitter::new(&PlanetConfig::default(), &SunConfig::default(), &sampling);
        for mut photon in emitter.emit_batch(50) {
            let before = photon.intensity;
            tracer.trace(&mut photon);
            assert!(photon.intensity <= before);
            assert!(photon.intensity >= 0.0);
        }
    }

    #[test]
    fn test_downward_photon_impacts_planet() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        let mut photon = Photon {
            position: Vec2::new(0.0, RADIUS + HEIGHT),
            direction: Vec2::new(0.0, -1.0),
            wavelength: 550,
            intensity: 1.0,
        };
        assert_eq!(tracer.trace(&mut photon), TraceOutcome::PlanetImpact);
    }

    #[test]
    fn test_receding_photon_never_enters() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        let mut photon = Photon {
            position: Vec2::new(0.0, RADIUS + HEIGHT + 1.0),
            direction: Vec2::new(0.0, 1.0),
            wavelength: 550,
            intensity: 1.0,
        };
        assert_eq!(tracer.trace(&mut photon), TraceOutcome::NeverEntered);
    }

    #[test]
    fn test_extinction_matches_surface_coefficient_on_low_chord() {
        // A shallow atmosphere keeps the whole chord near the surface, where
        // the optical depth per meter approximates the sea-level coefficient.
        let shallow = 2000.0;
        let planet = PlanetConfig { atmospheric_height_m: shallow, ..Default::default() };
        let lut = AtmosphereLut::precalculate(
            &planet,
            &AtmosphereConfig::default(),
            &SamplingConfig::default(),
        )
        .unwrap();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, shallow, 0.0);

        // Periapsis high enough that refraction does not bend the chord
        // into the surface.
        let mut photon = grazing_photon_in(shallow, 1000.0);
        let start = photon.position;
        let outcome = tracer.trace(&mut photon);
        assert_eq!(outcome, TraceOutcome::Exited);
        assert!(photon.intensity < 1.0);

        let chord = (photon.position - start).norm();
        let measured = -(photon.intensity).ln() / chord;
        let expected = rayleigh.volume_coefficient(&lut, 0.0, 550);
        let relative = (measured - expected).abs() / expected;
        assert!(relative < 0.2, "relative deviation {relative}");
    }

    #[test]
    fn test_refraction_bends_toward_planet() {
        let lut = earth_lut();
        let rayleigh = Rayleigh::new(&lut, 2.504e19);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        let mut photon = grazing_photon(10_000.0);
        let outcome = tracer.trace(&mut photon);
        assert_eq!(outcome, TraceOutcome::Exited);
        // The index gradient is negative with altitude, so a horizontal ray
        // picks up a downward component.
        assert!(photon.direction.y < 0.0);
        assert!(photon.direction.x > 0.0);
    }

    #[test]
    fn test_tangent_ray_is_discarded_not_looped() {
        let lut = vacuum_lut();
        let rayleigh = Rayleigh::new(&lut, 0.0);
        let tracer = AtmosphereTracer::new(&lut, &rayleigh, RADIUS, HEIGHT, 0.0);

        // Tangential ray pinned to the atmosphere shell never enters; the
        // recede check or the step cap must end the march in finite time.
        let mut photon = Photon {
            position: Vec2::new(-(RADIUS + HEIGHT), 0.0),
            direction: Vec2::new(0.0, 1.0),
            wavelength: 550,
            intensity: 1.0,
        };
        let outcome = tracer.trace(&mut photon);
        assert!(
            outcome == TraceOutcome::StepCapExceeded || outcome == TraceOutcome::NeverEntered
        );
    }
}
