//! Fill expansion
//!
//! Convex paths are drawn as a triangle fan with a half fringe around it. Everything
//! else is resolved by the renderer with the stencil buffer: fans of all sub-paths
//! accumulate winding numbers, the covering quad paints covered pixels and the full
//! fringe antialiases the edges.
use crate::{
    CacheState, Error, Expansion, FILL_MITER_LIMIT, LineJoin, PathCache, PathPoint, PointFlags,
    Scalar, Subpath, TessellationConfig, Vertex, Winding, cache::point_pairs, stroke::bevel_join,
};

impl PathCache {
    /// Generate fill geometry for all sub-paths, returns whether the path is convex
    ///
    /// With non zero `fringe` points are moved inside by half of the fringe and an
    /// antialiasing strip is generated around every sub-path.
    pub fn expand_fill(
        &mut self,
        fringe: Scalar,
        join: LineJoin,
        miter_limit: Scalar,
    ) -> Result<bool, Error> {
        self.ensure_state(
            &[
                CacheState::Flattened,
                CacheState::Expanded(Expansion::Fill),
                CacheState::Expanded(Expansion::Stroke),
            ],
            CacheState::Flattened,
        )?;
        let _span = tracing::debug_span!("[expand_fill]", fringe, subpaths = self.len).entered();

        let aa = fringe;
        let has_fringe = aa > 0.0;
        let convex = self.convex;

        self.calculate_joins(aa, join, miter_limit);

        for subpath in self.subpaths_mut() {
            subpath.fill.clear();
            subpath.stroke.clear();

            // less than three points do not cover any area
            let point_count = subpath.points.len();
            if point_count < 3 {
                continue;
            }

            subpath
                .fill
                .try_reserve(point_count + subpath.bevel_count + 1)?;
            if has_fringe {
                subpath
                    .stroke
                    .try_reserve((point_count + subpath.bevel_count * 5 + 1) * 2)?;
            }

            let side = subpath.inward_side(convex);
            let woff = side * 0.5 * aa;
            let points = &subpath.points;

            let fill = &mut subpath.fill;
            if has_fringe {
                for (p0, p1) in point_pairs(points) {
                    let p1 = inset_point(p1, side);
                    if p1.flags.contains(PointFlags::BEVEL) {
                        if p1.flags.contains(PointFlags::LEFT) {
                            fill.push(Vertex::at(p1.pos + p1.normal * woff, 0.5, 1.0));
                        } else {
                            fill.push(Vertex::at(p1.pos + p0.dir.normal() * woff, 0.5, 1.0));
                            fill.push(Vertex::at(p1.pos + p1.dir.normal() * woff, 0.5, 1.0));
                        }
                    } else {
                        fill.push(Vertex::at(p1.pos + p1.normal * woff, 0.5, 1.0));
                    }
                }
            } else {
                fill.extend(points.iter().map(|p| Vertex::at(p.pos, 0.5, 1.0)));
            }

            if !has_fringe {
                continue;
            }
            let mut lw = side * (aa + 0.5 * aa);
            let rw = side * (aa - 0.5 * aa);
            let mut lu = 0.0;
            let ru = 1.0;
            // half of the fringe is enough when stencil is not used
            if convex {
                lw = woff;
                lu = 0.5;
            }

            let verts = &mut subpath.stroke;
            for (p0, p1) in point_pairs(points) {
                let p1 = inset_point(p1, side);
                if p1
                    .flags
                    .intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL)
                {
                    bevel_join(verts, p0, &p1, lw, rw, lu, ru);
                } else {
                    verts.push(Vertex::at(p1.pos + p1.normal * lw, lu, 1.0));
                    verts.push(Vertex::at(p1.pos - p1.normal * rw, ru, 1.0));
                }
            }
            // loop it
            if verts.len() >= 2 {
                let (v0, v1) = (verts[0].position(), verts[1].position());
                verts.push(Vertex::at(v0, lu, 1.0));
                verts.push(Vertex::at(v1, ru, 1.0));
            }
        }

        self.cover = match self.bounds {
            Some(bounds) if !convex => {
                let (min, max) = (bounds.min(), bounds.max());
                [
                    Vertex::new(max.x(), max.y(), 0.5, 1.0),
                    Vertex::new(max.x(), min.y(), 0.5, 1.0),
                    Vertex::new(min.x(), max.y(), 0.5, 1.0),
                    Vertex::new(min.x(), min.y(), 0.5, 1.0),
                ]
            }
            _ => [Vertex::default(); 4],
        };

        tracing::debug!(
            "[expand_fill:vertices] fill={} fringe={} convex={}",
            self.subpaths().iter().map(|s| s.fill.len()).sum::<usize>(),
            self.subpaths().iter().map(|s| s.stroke.len()).sum::<usize>(),
            convex
        );
        self.set_state(CacheState::Expanded(Expansion::Fill));
        Ok(convex)
    }

    /// Generate fill geometry with the parameters from `config`
    pub fn expand_fill_config(&mut self, config: &TessellationConfig) -> Result<bool, Error> {
        self.expand_fill(config.fringe_width, LineJoin::Miter, FILL_MITER_LIMIT)
    }
}

impl Subpath {
    /// Sign of the offset along the normal which moves points towards the filled area
    ///
    /// Normals point inside of clockwise sub-paths, the sign is flipped for counter
    /// clockwise sub-paths and for sub-paths marked as holes. Convex fills are drawn
    /// without stencil, so the hole hint does not apply to them.
    fn inward_side(&self, convex: bool) -> Scalar {
        let solid = convex || self.hint.unwrap_or(Winding::CCW) == Winding::CCW;
        if (self.winding == Winding::CW) == solid {
            1.0
        } else {
            -1.0
        }
    }
}

/// Point with `LEFT` marking turns towards the filled side
///
/// Offsets with negative `side` mirror the geometry, so the turn direction is mirrored too.
fn inset_point(point: &PathPoint, side: Scalar) -> PathPoint {
    let mut point = *point;
    if side < 0.0 {
        point.flags.toggle(PointFlags::LEFT);
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BBox, FillRule, PI, Path, Point, Transform, assert_approx_eq};

    fn flatten(path: &Path) -> PathCache {
        let mut cache = PathCache::new();
        cache
            .flatten(path, Transform::identity(), &TessellationConfig::default())
            .unwrap();
        cache
    }

    fn rectangle() -> Path {
        Path::builder()
            .move_to((0.0, 0.0))
            .line_to((100.0, 0.0))
            .line_to((100.0, 50.0))
            .line_to((0.0, 50.0))
            .close()
            .build()
    }

    #[test]
    fn test_rectangle_fill() {
        let mut cache = flatten(&rectangle());
        assert!(cache.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT).unwrap());
        assert_eq!(cache.state(), CacheState::Expanded(Expansion::Fill));

        let subpath = &cache.subpaths()[0];
        let fill = subpath.fill();
        assert_eq!(fill.len(), 4);
        // fill is moved inside by half of the fringe
        assert_eq!(fill[0].position(), Point::new(0.5, 0.5));
        assert_eq!(fill[2].position(), Point::new(99.5, 49.5));
        assert!(fill.iter().all(|v| v.u == 0.5 && v.v == 1.0));

        // half fringe from the fill edge (opaque) to the outside (transparent)
        let fringe = subpath.stroke();
        assert_eq!(fringe.len(), 10);
        assert_eq!(fringe[0].position(), Point::new(0.5, 0.5));
        assert_eq!(fringe[0].u, 0.5);
        assert_eq!(fringe[1].position(), Point::new(-0.5, -0.5));
        assert_eq!(fringe[1].u, 1.0);
        assert_eq!(fringe[8].position(), fringe[0].position());
        assert_eq!(fringe[9].position(), fringe[1].position());

        // convex fill does not need the covering quad
        assert_eq!(cache.cover(), &[Vertex::default(); 4]);
    }

    #[test]
    fn test_orientation_independent() {
        let mut ccw = flatten(&rectangle());
        ccw.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        let mut cw = flatten(&Path::builder().rect(0.0, 0.0, 100.0, 50.0).build());
        cw.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        assert_eq!(cw.subpaths()[0].winding(), Winding::CW);

        let bbox = |verts: &[Vertex]| {
            verts
                .iter()
                .fold(BBox::point(verts[0].position()), |bbox, v| {
                    bbox.extend(v.position())
                })
        };
        for cache in [&ccw, &cw] {
            let subpath = &cache.subpaths()[0];
            assert_eq!(
                format!("{:?}", bbox(subpath.fill())),
                "BBox x=0.5, y=0.5, w=99, h=49"
            );
            assert_eq!(
                format!("{:?}", bbox(subpath.stroke())),
                "BBox x=-0.5, y=-0.5, w=101, h=51"
            );
        }
    }

    #[test]
    fn test_no_antialiasing() {
        let mut cache = flatten(&rectangle());
        assert!(cache.expand_fill(0.0, LineJoin::Miter, FILL_MITER_LIMIT).unwrap());
        let subpath = &cache.subpaths()[0];
        let positions: Vec<_> = subpath.fill().iter().map(|v| v.position()).collect();
        assert_eq!(
            positions,
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
            ]
        );
        assert!(subpath.stroke().is_empty());
    }

    #[test]
    fn test_overlapping_circles() {
        let path = Path::builder()
            .arc((50.0, 50.0), 40.0, 0.0, 2.0 * PI, Winding::CCW)
            .close()
            .move_to((130.0, 50.0))
            .arc((90.0, 50.0), 40.0, 0.0, 2.0 * PI, Winding::CW)
            .close()
            .build();
        let mut cache = flatten(&path);
        let convex = cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        assert!(!convex);

        let subpaths = cache.subpaths();
        assert_eq!(subpaths.len(), 2);
        assert_eq!(subpaths[0].winding(), Winding::CCW);
        assert_eq!(subpaths[1].winding(), Winding::CW);
        for subpath in subpaths {
            assert!(subpath.fill().len() >= subpath.points().len());
            // full fringe for the stencil fill
            assert!(subpath.stroke().iter().any(|v| v.u == 0.0));
            assert!(subpath.stroke().iter().any(|v| v.u == 1.0));
        }

        let cover = cache.cover();
        assert_approx_eq!(cover[0].x, 130.0, 1e-3);
        assert_approx_eq!(cover[0].y, 90.0, 1e-3);
        assert_approx_eq!(cover[1].x, 130.0, 1e-3);
        assert_approx_eq!(cover[1].y, 10.0, 1e-3);
        assert_approx_eq!(cover[2].x, 10.0, 1e-3);
        assert_approx_eq!(cover[2].y, 90.0, 1e-3);
        assert_approx_eq!(cover[3].x, 10.0, 1e-3);
        assert_approx_eq!(cover[3].y, 10.0, 1e-3);
        assert!(cover.iter().all(|v| v.u == 0.5 && v.v == 1.0));
    }

    #[test]
    fn test_hole_hint() {
        let path = Path::builder()
            .move_to((0.0, 0.0))
            .line_to((100.0, 0.0))
            .line_to((100.0, 100.0))
            .line_to((0.0, 100.0))
            .close()
            .move_to((25.0, 25.0))
            .line_to((75.0, 25.0))
            .line_to((75.0, 75.0))
            .line_to((25.0, 75.0))
            .close()
            .winding(Winding::CW)
            .build();
        let mut cache = flatten(&path);
        assert!(!cache.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT).unwrap());
        let subpaths = cache.subpaths();
        // both edges move towards the filled ring
        assert_eq!(subpaths[0].fill()[0].position(), Point::new(0.5, 0.5));
        assert_eq!(subpaths[1].fill()[0].position(), Point::new(24.5, 24.5));
    }

    #[test]
    fn test_degenerate_subpath() {
        let path = Path::builder()
            .move_to((0.0, 0.0))
            .line_to((10.0, 10.0))
            .build();
        let mut cache = flatten(&path);
        assert!(!cache.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT).unwrap());
        assert!(cache.subpaths()[0].fill().is_empty());
        assert!(cache.subpaths()[0].stroke().is_empty());
    }

    /// Builds closed polygon from the points either in the given or in reversed order
    fn polygon(points: &[(Scalar, Scalar)], reversed: bool) -> Path {
        let mut points = points.to_vec();
        if reversed {
            points.reverse();
        }
        let mut builder = Path::builder();
        builder.move_to(points[0]);
        for point in &points[1..] {
            builder.line_to(*point);
        }
        builder.close().build()
    }

    /// Expands fill and checks that the fill is inside of the shape and the fringe
    /// does not leave the shape bounds by more than `margin`
    fn check_fill(path: &Path, margin: Scalar) -> (usize, BBox, BBox) {
        let mut cache = flatten(path);
        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        let bounds = cache.bounds().unwrap();
        let subpath = &cache.subpaths()[0];
        for vertex in subpath.fill() {
            assert!(
                cache.contains_point(vertex.position(), FillRule::NonZero),
                "fill vertex outside of the shape: {:?}",
                vertex
            );
        }
        let fringe = subpath.stroke();
        for vertex in fringe {
            let pos = vertex.position();
            assert!(
                pos.x() >= bounds.min().x() - margin
                    && pos.x() <= bounds.max().x() + margin
                    && pos.y() >= bounds.min().y() - margin
                    && pos.y() <= bounds.max().y() + margin,
                "fringe vertex is too far from the shape: {:?}",
                vertex
            );
        }
        let bbox = |verts: &[Vertex]| {
            verts
                .iter()
                .fold(BBox::point(verts[0].position()), |bbox, v| {
                    bbox.extend(v.position())
                })
        };
        (subpath.fill().len(), bbox(subpath.fill()), bbox(fringe))
    }

    fn assert_bbox_eq(left: BBox, right: BBox) {
        assert_approx_eq!(left.min().x(), right.min().x(), 1e-3);
        assert_approx_eq!(left.min().y(), right.min().y(), 1e-3);
        assert_approx_eq!(left.max().x(), right.max().x(), 1e-3);
        assert_approx_eq!(left.max().y(), right.max().y(), 1e-3);
    }

    #[test]
    fn test_sharp_corner_bevel() {
        let triangle = [(0.0, 0.0), (100.0, 10.0), (0.0, 20.0)];
        // bevel at the tip can not go further than the miter limit allows
        let margin = 0.5 * FILL_MITER_LIMIT;
        let (ccw_len, ccw_fill, ccw_fringe) = check_fill(&polygon(&triangle, false), margin);
        let (cw_len, cw_fill, cw_fringe) = check_fill(&polygon(&triangle, true), margin);

        let mut cache = flatten(&polygon(&triangle, false));
        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        let subpath = &cache.subpaths()[0];
        assert_eq!(subpath.winding(), Winding::CCW);
        assert!(subpath.points()[1].flags.contains(PointFlags::BEVEL));

        // convex bevelled corner is inset with a single vertex
        assert_eq!(ccw_len, 3);
        assert_eq!(cw_len, 3);
        assert_bbox_eq(ccw_fill, cw_fill);
        assert_bbox_eq(ccw_fringe, cw_fringe);
        assert!(ccw_fringe.max().x() < 100.1);
    }

    #[test]
    fn test_concave_arrow() {
        let arrow = [
            (0.0, 40.0),
            (60.0, 40.0),
            (60.0, 20.0),
            (100.0, 50.0),
            (60.0, 80.0),
            (60.0, 60.0),
            (0.0, 60.0),
        ];
        let margin = 1.5 * FILL_MITER_LIMIT;
        let (ccw_len, ccw_fill, ccw_fringe) = check_fill(&polygon(&arrow, false), margin);
        let (cw_len, cw_fill, cw_fringe) = check_fill(&polygon(&arrow, true), margin);
        assert_eq!(ccw_len, arrow.len());
        assert_eq!(cw_len, arrow.len());
        assert_bbox_eq(ccw_fill, cw_fill);
        assert_bbox_eq(ccw_fringe, cw_fringe);
        // reflex corner is moved into the arrow head
        assert_approx_eq!(ccw_fill.min().x(), 0.5, 1e-3);
        assert_approx_eq!(ccw_fill.max().x(), 100.0 - 5.0 / 6.0, 1e-3);
    }

    #[test]
    fn test_convex_hole_hint() {
        let path = Path::builder()
            .move_to((0.0, 0.0))
            .line_to((100.0, 0.0))
            .line_to((100.0, 50.0))
            .line_to((0.0, 50.0))
            .close()
            .winding(Winding::CW)
            .build();
        let mut cache = flatten(&path);
        assert!(cache.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT).unwrap());
        // drawn without stencil, so the fill is still moved inside
        let subpath = &cache.subpaths()[0];
        assert_eq!(subpath.fill()[0].position(), Point::new(0.5, 0.5));
        assert_eq!(subpath.stroke()[1].position(), Point::new(-0.5, -0.5));
    }

    #[test]
    fn test_idempotent() {
        let path = Path::builder()
            .circle((50.0, 50.0), 40.0)
            .rounded_rect(20.0, 20.0, 100.0, 60.0, 12.0)
            .build();
        let mut cache = flatten(&path);
        cache.expand_fill_config(&TessellationConfig::default()).unwrap();
        let fill: Vec<Vec<Vertex>> = cache.subpaths().iter().map(|s| s.fill().to_vec()).collect();
        let fringe: Vec<Vec<Vertex>> =
            cache.subpaths().iter().map(|s| s.stroke().to_vec()).collect();
        let cover = *cache.cover();

        cache.expand_fill_config(&TessellationConfig::default()).unwrap();
        for (index, subpath) in cache.subpaths().iter().enumerate() {
            assert_eq!(subpath.fill(), fill[index].as_slice());
            assert_eq!(subpath.stroke(), fringe[index].as_slice());
        }
        assert_eq!(cache.cover(), &cover);
    }

    #[test]
    fn test_invalid_state() {
        let mut cache = PathCache::new();
        assert_eq!(
            cache.expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT),
            Err(Error::InvalidState {
                expected: CacheState::Flattened,
                found: CacheState::Empty,
            })
        );
    }
}
