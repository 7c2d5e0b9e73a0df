//! Shadow-plane rasterization: the non-uniform accumulation grid, the
//! edge-walking texture tracer and the finished shadow map.

pub mod grid;
pub mod map;
pub mod texture;

pub use grid::ShadowGrid;
pub use map::{ShadowMap, TraceSummary};
pub use texture::TextureRasterizer;
