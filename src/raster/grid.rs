//! Non-uniform rectangular partition of the shadow plane.
//!
//! Rows are evenly spaced in altitude. Columns follow a power law in x so
//! the umbra right behind the planet gets fine resolution while the long
//! penumbra tail stays coarse: column i spans [i^alpha, (i+1)^alpha) with
//! alpha chosen so the last edge lands exactly on the shadow length.

use crate::config::{PlanetConfig, SamplingConfig, SunConfig};
use crate::physics::constants::{SHADOW_HEIGHT_TO_RADIUS_FACTOR, SHADOW_LENGTH_FACTOR};
use crate::physics::Vec2;

/// Horizontal extent of one grid column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpan {
    pub start: f64,
    pub width: f64,
}

/// Axis-aligned cell rectangle in shadow-plane meters.
#[derive(Debug, Clone, Copy)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone)]
pub struct ShadowGrid {
    tex_width: u32,
    tex_height: u32,
    shadow_length: f64,
    shadow_height: f64,
    rect_height: f64,
    columns: Vec<ColumnSpan>,
}

impl ShadowGrid {
    pub fn new(planet: &PlanetConfig, sun: &SunConfig, sampling: &SamplingConfig) -> Self {
        let tex_width = sampling.tex_width;
        let tex_height = sampling.tex_height;

        let shadow_length = SHADOW_LENGTH_FACTOR * sun.distance_m * planet.radius_m
            / (sun.radius_m - planet.radius_m);
        let shadow_height = planet.radius_m * SHADOW_HEIGHT_TO_RADIUS_FACTOR;
        let rect_height = shadow_height / f64::from(tex_height);

        let alpha = shadow_length.ln() / f64::from(tex_width).ln();

        let mut columns = Vec::with_capacity(tex_width as usize);
        let mut x0 = 0.0;
        for i in 0..tex_width {
            let x1 = f64::from(i + 1).powf(alpha);
            columns.push(ColumnSpan { start: x0, width: x1 - x0 });
            x0 = x1;
        }

        Self {
            tex_width,
            tex_height,
            shadow_length,
            shadow_height,
            rect_height,
            columns,
        }
    }

    #[inline]
    pub fn tex_width(&self) -> u32 {
        self.tex_width
    }

    #[inline]
    pub fn tex_height(&self) -> u32 {
        self.tex_height
    }

    #[inline]
    pub fn shadow_length(&self) -> f64 {
        self.shadow_length
    }

    #[inline]
    pub fn shadow_height(&self) -> f64 {
        self.shadow_height
    }

    #[inline]
    pub fn rect_height(&self) -> f64 {
        self.rect_height
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnSpan] {
        &self.columns
    }

    /// Column containing x, or the sentinel `tex_width` outside
    /// [0, shadow_length). O(log W) by binary search over the starts.
    pub fn column_at(&self, x: f64) -> u32 {
        if x < 0.0 || x >= self.shadow_length {
            return self.tex_width;
        }
        let index = self.columns.partition_point(|span| span.start <= x) - 1;
        index as u32
    }

    /// Row containing y, or the sentinel `tex_height` outside
    /// [0, shadow_height).
    pub fn row_at(&self, y: f64) -> u32 {
        if y < 0.0 || y >= self.shadow_height {
            return self.tex_height;
        }
        ((y / self.rect_height) as u32).min(self.tex_height - 1)
    }

    /// Cell indices under the given point, if it lies inside the grid.
    pub fn cell_at(&self, location: Vec2) -> Option<(u32, u32)> {
        let cx = self.column_at(location.x);
        let cy = self.row_at(location.y);
        if cx < self.tex_width && cy < self.tex_height {
            Some((cx, cy))
        } else {
            None
        }
    }

    /// Rectangle of the cell at the given indices.
    #[inline]
    pub fn cell_rect(&self, cx: u32, cy: u32) -> CellRect {
        let span = self.columns[cx as usize];
        CellRect {
            x: span.start,
            y: self.rect_height * f64::from(cy),
            w: span.width,
            h: self.rect_height,
        }
    }
}
