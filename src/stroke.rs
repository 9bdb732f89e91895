//! Stroke expansion into triangle strips
//!
//! Every point of a flattened sub-path is extruded by half of the stroke width along
//! its miter normal. Sharp corners are replaced by bevel or round joins, open ends get
//! caps. Antialiasing is encoded in vertex `u` (across the stroke) and `v` (fringe of
//! the caps) coordinates, the renderer turns them into coverage.
use crate::{
    CacheState, Error, Expansion, LineCap, LineJoin, PI, PathCache, PathPoint, Point, PointFlags,
    Scalar, StrokeStyle, TessellationConfig, Vertex, cache::point_pairs, utils::curve_divisions,
};

impl PathCache {
    /// Generate stroke geometry for all sub-paths
    ///
    /// `fringe` is the width of the antialiasing fringe, zero disables antialiasing.
    /// Result is stored as one triangle strip per sub-path, see [`crate::Subpath::stroke`].
    pub fn expand_stroke(
        &mut self,
        width: Scalar,
        fringe: Scalar,
        cap: LineCap,
        join: LineJoin,
        miter_limit: Scalar,
        tess_tol: Scalar,
    ) -> Result<(), Error> {
        self.ensure_state(
            &[
                CacheState::Flattened,
                CacheState::Expanded(Expansion::Fill),
                CacheState::Expanded(Expansion::Stroke),
            ],
            CacheState::Flattened,
        )?;
        let _span = tracing::debug_span!("[expand_stroke]", width, subpaths = self.len).entered();

        let aa = fringe;
        let (u0, u1) = if aa == 0.0 { (0.5, 0.5) } else { (0.0, 1.0) };
        let half_width = width * 0.5;
        let ncap = curve_divisions(half_width, PI, tess_tol);
        let w = half_width + aa * 0.5;
        let uv = StripUv { u0, u1 };

        self.calculate_joins(w, join, miter_limit);
        self.cover = [Vertex::default(); 4];

        for subpath in self.subpaths_mut() {
            subpath.fill.clear();
            subpath.stroke.clear();

            let point_count = subpath.points.len();
            let mut vertex_count = match join {
                LineJoin::Round => (point_count + subpath.bevel_count * (ncap + 2) + 1) * 2,
                _ => (point_count + subpath.bevel_count * 5 + 1) * 2,
            };
            if !subpath.closed || point_count == 1 {
                vertex_count += match cap {
                    LineCap::Round => (ncap * 2 + 2) * 2,
                    _ => (3 + 3) * 2,
                };
            }
            subpath.stroke.try_reserve(vertex_count)?;

            let points = &subpath.points;
            let verts = &mut subpath.stroke;

            // single point is drawn as a dot
            if let [point] = points.as_slice() {
                let dir = Point::new(1.0, 0.0);
                match cap {
                    LineCap::Butt => {}
                    LineCap::Square => {
                        butt_cap_start(verts, point.pos, dir, w, w - aa, aa, uv);
                        butt_cap_end(verts, point.pos, dir, w, w - aa, aa, uv);
                    }
                    LineCap::Round => {
                        round_cap_start(verts, point.pos, dir, w, ncap, uv);
                        round_cap_end(verts, point.pos, dir, w, ncap, uv);
                    }
                }
                continue;
            }

            if subpath.closed {
                for (p0, p1) in point_pairs(points) {
                    stroke_join(verts, p0, p1, w, join, ncap, uv);
                }
                // loop it
                if verts.len() >= 2 {
                    let (v0, v1) = (verts[0].position(), verts[1].position());
                    verts.push(Vertex::at(v0, u0, 1.0));
                    verts.push(Vertex::at(v1, u1, 1.0));
                }
                continue;
            }

            let first = &points[0];
            match cap {
                LineCap::Butt => butt_cap_start(verts, first.pos, first.dir, w, -aa * 0.5, aa, uv),
                LineCap::Square => butt_cap_start(verts, first.pos, first.dir, w, w - aa, aa, uv),
                LineCap::Round => round_cap_start(verts, first.pos, first.dir, w, ncap, uv),
            }

            for pair in points.windows(2).take(point_count - 2) {
                stroke_join(verts, &pair[0], &pair[1], w, join, ncap, uv);
            }

            let last = &points[point_count - 1];
            let dir = points[point_count - 2].dir;
            match cap {
                LineCap::Butt => butt_cap_end(verts, last.pos, dir, w, -aa * 0.5, aa, uv),
                LineCap::Square => butt_cap_end(verts, last.pos, dir, w, w - aa, aa, uv),
                LineCap::Round => round_cap_end(verts, last.pos, dir, w, ncap, uv),
            }
        }

        tracing::debug!(
            "[expand_stroke:vertices] {}",
            self.subpaths().iter().map(|s| s.stroke.len()).sum::<usize>()
        );
        self.set_state(CacheState::Expanded(Expansion::Stroke));
        Ok(())
    }

    /// Generate stroke geometry with the parameters from `style` and `config`
    pub fn expand_stroke_style(
        &mut self,
        style: &StrokeStyle,
        config: &TessellationConfig,
    ) -> Result<(), Error> {
        self.expand_stroke(
            style.width,
            config.fringe_width,
            style.line_cap,
            style.line_join,
            style.miter_limit,
            config.tess_tol,
        )
    }
}

/// `u` coordinates of the left and the right sides of the strip
#[derive(Debug, Clone, Copy)]
struct StripUv {
    u0: Scalar,
    u1: Scalar,
}

/// Emit vertices of the point in the middle of the stroke
fn stroke_join(
    verts: &mut Vec<Vertex>,
    p0: &PathPoint,
    p1: &PathPoint,
    w: Scalar,
    join: LineJoin,
    ncap: usize,
    uv: StripUv,
) {
    let StripUv { u0, u1 } = uv;
    if p1
        .flags
        .intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL)
    {
        if join == LineJoin::Round {
            round_join(verts, p0, p1, w, w, u0, u1, ncap);
        } else {
            bevel_join(verts, p0, p1, w, w, u0, u1);
        }
    } else {
        verts.push(Vertex::at(p1.pos + p1.normal * w, u0, 1.0));
        verts.push(Vertex::at(p1.pos - p1.normal * w, u1, 1.0));
    }
}

/// Butt or square cap at the start, `offset` moves the cap backwards
fn butt_cap_start(
    verts: &mut Vec<Vertex>,
    point: Point,
    dir: Point,
    w: Scalar,
    offset: Scalar,
    aa: Scalar,
    uv: StripUv,
) {
    let StripUv { u0, u1 } = uv;
    let p = point - dir * offset;
    let dl = dir.normal();
    verts.push(Vertex::at(p + dl * w - dir * aa, u0, 0.0));
    verts.push(Vertex::at(p - dl * w - dir * aa, u1, 0.0));
    verts.push(Vertex::at(p + dl * w, u0, 1.0));
    verts.push(Vertex::at(p - dl * w, u1, 1.0));
}

/// Butt or square cap at the end, `offset` moves the cap forward
fn butt_cap_end(
    verts: &mut Vec<Vertex>,
    point: Point,
    dir: Point,
    w: Scalar,
    offset: Scalar,
    aa: Scalar,
    uv: StripUv,
) {
    let StripUv { u0, u1 } = uv;
    let p = point + dir * offset;
    let dl = dir.normal();
    verts.push(Vertex::at(p + dl * w, u0, 1.0));
    verts.push(Vertex::at(p - dl * w, u1, 1.0));
    verts.push(Vertex::at(p + dl * w + dir * aa, u0, 0.0));
    verts.push(Vertex::at(p - dl * w + dir * aa, u1, 0.0));
}

fn round_cap_start(
    verts: &mut Vec<Vertex>,
    point: Point,
    dir: Point,
    w: Scalar,
    ncap: usize,
    uv: StripUv,
) {
    let StripUv { u0, u1 } = uv;
    let dl = dir.normal();
    for i in 0..ncap {
        let a = i as Scalar / (ncap - 1) as Scalar * PI;
        let (sin, cos) = a.sin_cos();
        verts.push(Vertex::at(point - dl * (cos * w) - dir * (sin * w), u0, 1.0));
        verts.push(Vertex::at(point, 0.5, 1.0));
    }
    verts.push(Vertex::at(point + dl * w, u0, 1.0));
    verts.push(Vertex::at(point - dl * w, u1, 1.0));
}

fn round_cap_end(
    verts: &mut Vec<Vertex>,
    point: Point,
    dir: Point,
    w: Scalar,
    ncap: usize,
    uv: StripUv,
) {
    let StripUv { u0, u1 } = uv;
    let dl = dir.normal();
    verts.push(Vertex::at(point + dl * w, u0, 1.0));
    verts.push(Vertex::at(point - dl * w, u1, 1.0));
    for i in 0..ncap {
        let a = i as Scalar / (ncap - 1) as Scalar * PI;
        let (sin, cos) = a.sin_cos();
        verts.push(Vertex::at(point, 0.5, 1.0));
        verts.push(Vertex::at(point - dl * (cos * w) + dir * (sin * w), u0, 1.0));
    }
}

/// Pair of points on the inner side of the join: either bevel or the miter point
fn choose_bevel(bevel: bool, p0: &PathPoint, p1: &PathPoint, w: Scalar) -> (Point, Point) {
    if bevel {
        (
            p1.pos + p0.dir.normal() * w,
            p1.pos + p1.dir.normal() * w,
        )
    } else {
        let miter = p1.pos + p1.normal * w;
        (miter, miter)
    }
}

#[allow(clippy::too_many_arguments)]
fn round_join(
    verts: &mut Vec<Vertex>,
    p0: &PathPoint,
    p1: &PathPoint,
    lw: Scalar,
    rw: Scalar,
    lu: Scalar,
    ru: Scalar,
    ncap: usize,
) {
    let dl0 = p0.dir.normal();
    let dl1 = p1.dir.normal();
    let inner_bevel = p1.flags.contains(PointFlags::INNER_BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(inner_bevel, p0, p1, lw);
        let a0 = (-dl0.y()).atan2(-dl0.x());
        let mut a1 = (-dl1.y()).atan2(-dl1.x());
        if a1 > a0 {
            a1 -= PI * 2.0;
        }

        verts.push(Vertex::at(l0, lu, 1.0));
        verts.push(Vertex::at(p1.pos - dl0 * rw, ru, 1.0));

        let n = (((a0 - a1) / PI * ncap as Scalar).ceil() as usize).clamp(2, ncap);
        for i in 0..n {
            let u = i as Scalar / (n - 1) as Scalar;
            let (sin, cos) = (a0 + u * (a1 - a0)).sin_cos();
            verts.push(Vertex::at(p1.pos, 0.5, 1.0));
            verts.push(Vertex::at(p1.pos + Point::new(cos, sin) * rw, ru, 1.0));
        }

        verts.push(Vertex::at(l1, lu, 1.0));
        verts.push(Vertex::at(p1.pos - dl1 * rw, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(inner_bevel, p0, p1, -rw);
        let a0 = dl0.y().atan2(dl0.x());
        let mut a1 = dl1.y().atan2(dl1.x());
        if a1 < a0 {
            a1 += PI * 2.0;
        }

        verts.push(Vertex::at(p1.pos + dl0 * lw, lu, 1.0));
        verts.push(Vertex::at(r0, ru, 1.0));

        let n = (((a1 - a0) / PI * ncap as Scalar).ceil() as usize).clamp(2, ncap);
        for i in 0..n {
            let u = i as Scalar / (n - 1) as Scalar;
            let (sin, cos) = (a0 + u * (a1 - a0)).sin_cos();
            verts.push(Vertex::at(p1.pos + Point::new(cos, sin) * lw, lu, 1.0));
            verts.push(Vertex::at(p1.pos, 0.5, 1.0));
        }

        verts.push(Vertex::at(p1.pos + dl1 * lw, lu, 1.0));
        verts.push(Vertex::at(r1, ru, 1.0));
    }
}

/// Bevel join, also used to resolve inner bevels of miter joins
///
/// `lw` and `rw` are the extrusion widths of the left (positive normal) and the right
/// sides, `lu` and `ru` their `u` coordinates.
pub(crate) fn bevel_join(
    verts: &mut Vec<Vertex>,
    p0: &PathPoint,
    p1: &PathPoint,
    lw: Scalar,
    rw: Scalar,
    lu: Scalar,
    ru: Scalar,
) {
    let dl0 = p0.dir.normal();
    let dl1 = p1.dir.normal();
    let inner_bevel = p1.flags.contains(PointFlags::INNER_BEVEL);
    let bevel = p1.flags.contains(PointFlags::BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(inner_bevel, p0, p1, lw);

        verts.push(Vertex::at(l0, lu, 1.0));
        verts.push(Vertex::at(p1.pos - dl0 * rw, ru, 1.0));

        if bevel {
            verts.push(Vertex::at(l0, lu, 1.0));
            verts.push(Vertex::at(p1.pos - dl0 * rw, ru, 1.0));

            verts.push(Vertex::at(l1, lu, 1.0));
            verts.push(Vertex::at(p1.pos - dl1 * rw, ru, 1.0));
        } else {
            let r0 = p1.pos - p1.normal * rw;

            verts.push(Vertex::at(p1.pos, 0.5, 1.0));
            verts.push(Vertex::at(p1.pos - dl0 * rw, ru, 1.0));

            verts.push(Vertex::at(r0, ru, 1.0));
            verts.push(Vertex::at(r0, ru, 1.0));

            verts.push(Vertex::at(p1.pos, 0.5, 1.0));
            verts.push(Vertex::at(p1.pos - dl1 * rw, ru, 1.0));
        }

        verts.push(Vertex::at(l1, lu, 1.0));
        verts.push(Vertex::at(p1.pos - dl1 * rw, ru, 1.0));
    } else {
        let (r0, r1) = choose_bevel(inner_bevel, p0, p1, -rw);

        verts.push(Vertex::at(p1.pos + dl0 * lw, lu, 1.0));
        verts.push(Vertex::at(r0, ru, 1.0));

        if bevel {
            verts.push(Vertex::at(p1.pos + dl0 * lw, lu, 1.0));
            verts.push(Vertex::at(r0, ru, 1.0));

            verts.push(Vertex::at(p1.pos + dl1 * lw, lu, 1.0));
            verts.push(Vertex::at(r1, ru, 1.0));
        } else {
            let l0 = p1.pos + p1.normal * lw;

            verts.push(Vertex::at(p1.pos + dl0 * lw, lu, 1.0));
            verts.push(Vertex::at(p1.pos, 0.5, 1.0));

            verts.push(Vertex::at(l0, lu, 1.0));
            verts.push(Vertex::at(l0, lu, 1.0));

            verts.push(Vertex::at(p1.pos + dl1 * lw, lu, 1.0));
            verts.push(Vertex::at(p1.pos, 0.5, 1.0));
        }

        verts.push(Vertex::at(p1.pos + dl1 * lw, lu, 1.0));
        verts.push(Vertex::at(r1, ru, 1.0));
    }
}
