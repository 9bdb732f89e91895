//! Renderer agnostic 2D path tessellation.
//!
//! Turns vector paths (lines, cubic and quadratic curves, arcs, rectangles, ellipses)
//! into vertices that a GPU backend can draw directly.
//!
//! Main features:
//!  - Path building with nanovg-like helpers
//!  - Adaptive flattening of curves in device space
//!  - Stroke expansion with miter, bevel and round joins, butt, square and round caps
//!  - Fill expansion with antialiasing fringe and stencil cover quad
//!  - Vertices layout ready to be uploaded to vertex buffers as is
//!
//! Typical flow: build a [`Path`], [`PathCache::flatten`] it with the current transform,
//! expand it with [`PathCache::expand_fill`] or [`PathCache::expand_stroke`], and hand the
//! result over to a [`Renderer`].
#![deny(warnings)]

mod cache;
mod color;
mod config;
mod curve;
mod error;
mod fill;
mod geometry;
mod path;
mod renderer;
mod stroke;
mod utils;
mod vertex;

pub use cache::{CacheState, Expansion, PathCache, PathPoint, PointFlags, Subpath};
pub use color::{Color, ColorError};
pub use config::{FILL_MITER_LIMIT, TessellationConfig};
pub use curve::{Cubic, CubicFlattenIter, MAX_FLATTEN_DEPTH};
pub use error::Error;
pub use geometry::{BBox, EPSILON, PI, Point, Scalar, Transform, scalar_fmt};
pub use path::{
    Command, FillRule, KAPPA90, LineCap, LineJoin, Path, PathBuilder, StrokeStyle, Winding,
};
pub use renderer::{
    BlendFactor, CompositeOperation, FillPath, ImageId, Paint, Renderer, Scissor, StrokePath,
    render_triangles,
};
pub use utils::curve_divisions;
pub use vertex::Vertex;
