use crate::{Point, Scalar};
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Vertex handed over to the renderer
///
/// Layout is four packed `f32` values `[x, y, u, v]` (16 bytes), so slices of vertices
/// can be uploaded into GPU vertex buffers with [`bytemuck::cast_slice`] as is.
///
/// `u` runs across the stroke (`0` on the left edge, `1` on the right edge, `0.5` when
/// antialiasing is disabled), `v` is the fringe falloff factor (`1` on the body and `0`
/// on the outer edge of a cap fringe).
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { x, y, u, v }
    }

    #[inline]
    pub fn at(point: Point, u: Scalar, v: Scalar) -> Self {
        Self::new(point.x(), point.y(), u, v)
    }

    /// Position of the vertex
    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vertex {:?} uv={}/{}", self.position(), self.u, self.v)
    }
}
