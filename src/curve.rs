//! Cubic bezier curves and their flattening into polylines

use crate::{Point, PointFlags, Scalar, Transform};
use std::fmt;

/// Maximum subdivision depth used while flattening.
///
/// Pieces produced at this depth are emitted even if they are not flat enough, which
/// bounds the amount of work for degenerate control points.
pub const MAX_FLATTEN_DEPTH: usize = 10;

/// Cubic bezier curve
///
/// Polynimial form:
/// `(1 - t) ^ 3 * p0 + 3 * (1 - t) ^ 2 * t * p1 + 3 * (1 - t) * t ^ 2 * p2 + t ^ 3 * p3`
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    /// Degree elevation of the quadratic curve `p0, p1, p2`
    pub fn from_quad(p0: Point, p1: Point, p2: Point) -> Self {
        Self([
            p0,
            p0 + (2.0 / 3.0) * (p1 - p0),
            p2 + (2.0 / 3.0) * (p1 - p2),
            p2,
        ])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// Point at which curve starts
    pub fn start(&self) -> Point {
        self.0[0]
    }

    /// Point at which curve ends
    pub fn end(&self) -> Point {
        self.0[3]
    }

    /// Apply affine transformation to the curve
    pub fn transform(&self, tr: Transform) -> Self {
        let Cubic([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    /// Evaluate curve at parameter value `t` in (0.0..=1.0)
    pub fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    /// Split the curve in halves with de Casteljau construction
    pub fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let p01 = 0.5 * (p0 + p1);
        let p12 = 0.5 * (p1 + p2);
        let p23 = 0.5 * (p2 + p3);
        let p012 = 0.5 * (p01 + p12);
        let p123 = 0.5 * (p12 + p23);
        let mid = 0.5 * (p012 + p123);
        (Self([p0, p01, p012, mid]), Self([mid, p123, p23, p3]))
    }

    /// Deviation estimate of the control points from the chord
    ///
    /// Returns `(d, chord)` where `d = |cross(p1 - p3, chord)| + |cross(p2 - p3, chord)|`
    /// and `chord = p3 - p0`, so `d / |chord|` is the sum of distances of the inner
    /// control points from the chord line.
    pub fn deviation(&self) -> (Scalar, Point) {
        let Self([p0, p1, p2, p3]) = *self;
        let chord = p3 - p0;
        let d1 = (p1 - p3).cross(chord).abs();
        let d2 = (p2 - p3).cross(chord).abs();
        (d1 + d2, chord)
    }

    /// Check if the curve is flat enough to be replaced by its chord
    ///
    /// Flat means `d^2 < tolerance^2 * |chord|^2`. Curve never deviates from its chord
    /// line by more than `3/4` of the control points distance, so the error stays below
    /// `tolerance`.
    pub fn is_flat(&self, tolerance: Scalar) -> bool {
        let (d, chord) = self.deviation();
        d * d < tolerance * tolerance * chord.length_squared()
    }

    /// Convert curve to an iterator over points of the polyline approximating it.
    ///
    /// Start point is not produced, last produced point is always the end of the curve
    /// and it is the only one tagged as a corner.
    pub fn flatten(&self, tolerance: Scalar) -> CubicFlattenIter {
        CubicFlattenIter::new(*self, tolerance)
    }
}

/// Iterator over flattened points of the cubic curve
///
/// Equivalent to recursive bisection, explicit stack keeps the pieces that still need
/// to be processed together with their depth.
pub struct CubicFlattenIter {
    tolerance: Scalar,
    stack: Vec<(Cubic, usize)>,
}

impl CubicFlattenIter {
    pub fn new(cubic: Cubic, tolerance: Scalar) -> Self {
        let mut stack = Vec::with_capacity(MAX_FLATTEN_DEPTH + 1);
        stack.push((cubic, 0));
        Self { tolerance, stack }
    }
}

impl Iterator for CubicFlattenIter {
    type Item = (Point, PointFlags);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (cubic, level) = self.stack.pop()?;
            if level >= MAX_FLATTEN_DEPTH || cubic.is_flat(self.tolerance) {
                let flags = if self.stack.is_empty() {
                    PointFlags::CORNER
                } else {
                    PointFlags::empty()
                };
                return Some((cubic.end(), flags));
            }
            let (c0, c1) = cubic.split();
            self.stack.push((c1, level + 1));
            self.stack.push((c0, level + 1));
        }
    }
}
