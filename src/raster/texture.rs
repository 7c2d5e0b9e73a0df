//! Edge-walking texture tracer.
//!
//! Each post-atmosphere ray is walked cell by cell across the shadow grid,
//! depositing its quantized intensity into the per-wavelength bin of every
//! cell it crosses. Rays dipping below the symmetry axis are mirrored back
//! up; the axisymmetry of the problem makes the reflected ray stand in for
//! its counterpart from the opposite hemisphere.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::physics::constants::DEPOSIT_SCALE;
use crate::physics::Vec2;
use crate::raster::grid::{CellRect, ShadowGrid};
use crate::transport::Photon;

/// Shadow-plane ray, mutated in place when mirrored.
#[derive(Debug, Clone, Copy)]
struct Ray {
    origin: Vec2,
    direction: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitEdge {
    Top,
    Bottom,
    Right,
}

pub struct TextureRasterizer<'a> {
    grid: &'a ShadowGrid,
    pixels: &'a [AtomicU32],
    min_wavelength: u32,
    num_wavelengths: usize,
    saturated: AtomicBool,
}

impl<'a> TextureRasterizer<'a> {
    pub fn new(grid: &'a ShadowGrid, pixels: &'a [AtomicU32], min_wavelength: u32) -> Self {
        let num_wavelengths =
            pixels.len() / (grid.tex_width() as usize * grid.tex_height() as usize);
        Self {
            grid,
            pixels,
            min_wavelength,
            num_wavelengths,
            saturated: AtomicBool::new(false),
        }
    }

    /// Whether any bin saturated during this build.
    pub fn saturated(&self) -> bool {
        self.saturated.load(Ordering::Relaxed)
    }

    /// Walk one ray through the grid. Returns false when the ray never
    /// deposits: it starts outside the grid, or violates the forward-travel
    /// invariant (exit rays move with positive x in this orientation).
    pub fn deposit(&self, photon: &Photon) -> bool {
        if photon.direction.x <= 0.0 {
            debug_assert!(false, "rasterizer fed a non-forward ray");
            return false;
        }
        let Some((mut cx, mut cy)) = self.grid.cell_at(photon.position) else {
            return false;
        };

        let mut ray = Ray { origin: photon.position, direction: photon.direction };
        let amount = (photon.intensity * DEPOSIT_SCALE) as u32;

        while cx < self.grid.tex_width() && cy < self.grid.tex_height() {
            self.add(cx, cy, photon.wavelength, amount);

            match exit_edge(&ray, self.grid.cell_rect(cx, cy)) {
                ExitEdge::Top => cy += 1,
                ExitEdge::Right => cx += 1,
                ExitEdge::Bottom => {
                    if cy == 0 {
                        // Below the axis: fold the ray back onto the upper
                        // half-plane and keep walking in row 0.
                        mirror_about_x_axis(&mut ray);
                    } else {
                        cy -= 1;
                    }
                }
            }
        }
        true
    }

    /// Saturating atomic add into one wavelength bin. The first saturation
    /// of a build is logged once.
    fn add(&self, cx: u32, cy: u32, wavelength: u32, amount: u32) {
        let width = self.grid.tex_width() as usize;
        let pixel = cy as usize * width + cx as usize;
        let index = pixel * self.num_wavelengths + (wavelength - self.min_wavelength) as usize;

        let bin = &self.pixels[index];
        if let Ok(previous) =
            bin.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| {
                Some(value.saturating_add(amount))
            })
        {
            if previous.checked_add(amount).is_none()
                && !self.saturated.swap(true, Ordering::Relaxed)
            {
                log::warn!(
                    "pixel accumulator saturated at ({cx}, {cy}); bins clamp at {}",
                    u32::MAX
                );
            }
        }
    }
}

/// Height of the ray over the given x.
#[inline]
fn ray_y_at(ray: &Ray, x: f64) -> f64 {
    let slope = ray.direction.y / ray.direction.x;
    slope * (x - ray.origin.x) + ray.origin.y
}

/// Which edge the ray leaves the cell through, judged at the right edge.
fn exit_edge(ray: &Ray, rect: CellRect) -> ExitEdge {
    let intersect_height = ray_y_at(ray, rect.x + rect.w);
    if intersect_height < rect.y {
        ExitEdge::Bottom
    } else if intersect_height > rect.y + rect.h {
        ExitEdge::Top
    } else {
        ExitEdge::Right
    }
}

fn mirror_about_x_axis(ray: &mut Ray) {
    ray.origin.y = -ray.origin.y;
    ray.direction.y = -ray.direction.y;
}
