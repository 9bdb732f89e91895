//! Flattened representation of paths, shared by fill and stroke expansion
use crate::{
    BBox, Command, Cubic, EPSILON, Error, FillRule, LineJoin, Path, Point, Scalar,
    TessellationConfig, Transform, Vertex, Winding,
};
use bitflags::bitflags;

bitflags! {
    /// Classification of a flattened point
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointFlags: u8 {
        /// Point comes from a command end point (not an interior curve point)
        const CORNER = 0x01;
        /// Outline turns towards the positive normal side at this point
        const LEFT = 0x02;
        /// Outer side of the join is bevelled
        const BEVEL = 0x04;
        /// Inner side of the join is too short for a miter and is bevelled
        const INNER_BEVEL = 0x08;
    }
}

/// Flattened point annotated with the data needed by the expanders
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathPoint {
    /// Position in device coordinates
    pub pos: Point,
    /// Unit direction towards the next point
    pub dir: Point,
    /// Distance to the next point
    pub len: Scalar,
    /// Miter extrusion vector, offset `normal * w` keeps distance `w` from both edges
    pub normal: Point,
    pub flags: PointFlags,
}

impl PathPoint {
    pub fn new(pos: Point, flags: PointFlags) -> Self {
        Self {
            pos,
            flags,
            ..Default::default()
        }
    }
}

/// Single flattened sub-path together with its generated geometry
#[derive(Debug, Clone, Default)]
pub struct Subpath {
    pub(crate) points: Vec<PathPoint>,
    pub(crate) closed: bool,
    pub(crate) winding: Winding,
    pub(crate) hint: Option<Winding>,
    pub(crate) convex: bool,
    pub(crate) area: Scalar,
    pub(crate) bevel_count: usize,
    pub(crate) bounds: BBox,
    pub(crate) fill: Vec<Vertex>,
    pub(crate) stroke: Vec<Vertex>,
}

impl Subpath {
    /// Reset sub-path keeping allocated memory
    fn reset(&mut self) {
        self.points.clear();
        self.closed = false;
        self.winding = Winding::CCW;
        self.hint = None;
        self.convex = false;
        self.area = 0.0;
        self.bevel_count = 0;
        self.bounds = BBox::default();
        self.fill.clear();
        self.stroke.clear();
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Winding derived from the signed area of the points
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Fill rule hint recorded with `Command::Winding`
    pub fn hint(&self) -> Option<Winding> {
        self.hint
    }

    pub fn is_convex(&self) -> bool {
        self.convex
    }

    /// Signed area (positive for counter clockwise sub-paths)
    pub fn area(&self) -> Scalar {
        self.area
    }

    /// Number of points with either `BEVEL` or `INNER_BEVEL` flags
    pub fn bevel_count(&self) -> usize {
        self.bevel_count
    }

    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    /// Fill vertices (triangle fan)
    pub fn fill(&self) -> &[Vertex] {
        &self.fill
    }

    /// Stroke or fill fringe vertices (triangle strip)
    pub fn stroke(&self) -> &[Vertex] {
        &self.stroke
    }

    /// Compute directions, area, bounds and convexity of the points
    fn analyze(&mut self, dist_tol: Scalar) {
        // duplicated first point closes the sub-path
        if self.points.len() > 1 {
            if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
                if first.pos.is_within(last.pos, dist_tol) {
                    self.points.pop();
                    self.closed = true;
                }
            }
        }

        let count = self.points.len();
        for index in 0..count {
            let next = self.points[(index + 1) % count].pos;
            let point = &mut self.points[index];
            let delta = next - point.pos;
            point.len = delta.length();
            point.dir = delta.normalize().unwrap_or(Point::new(0.0, 1.0));
        }

        self.area = polygon_area(&self.points);
        self.winding = Winding::from_area(self.area);
        self.bounds = self
            .points
            .iter()
            .fold(BBox::point(self.points[0].pos), |bbox, point| {
                bbox.extend(point.pos)
            });
        self.convex = self.is_convex_polygon();
    }

    /// Closed polygon which turns in one direction and goes around once
    fn is_convex_polygon(&self) -> bool {
        let count = self.points.len();
        if !self.closed || count < 3 || self.area.abs() <= EPSILON {
            return false;
        }
        let sign = self.area.signum();
        let mut prev = self.points[count - 1].dir;
        for point in self.points.iter() {
            if prev.cross(point.dir) * sign < -EPSILON {
                return false;
            }
            prev = point.dir;
        }
        // star polygons turn consistently but wrap around more than once
        sign_flips(self.points.iter().map(|p| p.dir.x())) <= 2
            && sign_flips(self.points.iter().map(|p| p.dir.y())) <= 2
    }

    fn has_finite_points(&self) -> bool {
        self.points.iter().all(|point| point.pos.is_finite())
    }

    /// Append point merging it with the last one if they are too close
    fn add_point(&mut self, pos: Point, flags: PointFlags, dist_tol: Scalar) -> Result<(), Error> {
        if let Some(last) = self.points.last_mut() {
            if last.pos.is_within(pos, dist_tol) {
                last.flags |= flags;
                return Ok(());
            }
        }
        self.points.try_reserve(1)?;
        self.points.push(PathPoint::new(pos, flags));
        Ok(())
    }

    fn calculate_joins(&mut self, half_width: Scalar, join: LineJoin, miter_limit: Scalar) {
        let inv_width = if half_width > 0.0 {
            1.0 / half_width
        } else {
            0.0
        };
        let count = self.points.len();
        let mut bevel_count = 0;
        for index in 0..count {
            let p0 = self.points[(index + count - 1) % count];
            let p1 = &mut self.points[index];

            let dl0 = p0.dir.normal();
            let dl1 = p1.dir.normal();
            let mut normal = 0.5 * (dl0 + dl1);
            let dmr2 = normal.length_squared();
            if dmr2 > 1e-6 {
                normal = normal * (1.0 / dmr2).min(600.0);
            }
            p1.normal = normal;

            p1.flags &= PointFlags::CORNER;
            if p1.dir.cross(p0.dir) > 0.0 {
                p1.flags |= PointFlags::LEFT;
            }

            let limit = (p0.len.min(p1.len) * inv_width).max(1.01);
            if dmr2 * limit * limit < 1.0 {
                p1.flags |= PointFlags::INNER_BEVEL;
            }

            if p1.flags.contains(PointFlags::CORNER)
                && (dmr2 * miter_limit * miter_limit < 1.0
                    || matches!(join, LineJoin::Bevel | LineJoin::Round))
            {
                p1.flags |= PointFlags::BEVEL;
            }

            if p1
                .flags
                .intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL)
            {
                bevel_count += 1;
            }
        }
        self.bevel_count = bevel_count;
    }

    /// Signed winding number contribution of the sub-path at the point
    fn winding_number(&self, point: Point) -> i32 {
        let mut winding = 0;
        for (p0, p1) in point_pairs(&self.points) {
            let (a, b) = (p0.pos, p1.pos);
            let side = (b - a).cross(point - a);
            if a.y() <= point.y() {
                if b.y() > point.y() && side > 0.0 {
                    winding += 1;
                }
            } else if b.y() <= point.y() && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }
}

/// Consecutive pairs of points `(prev, current)` of a closed loop, starting with `(last, first)`
pub(crate) fn point_pairs(points: &[PathPoint]) -> impl Iterator<Item = (&PathPoint, &PathPoint)> {
    let last = points.last().into_iter();
    last.chain(points.iter()).zip(points.iter())
}

/// Signed area of the polygon (shoelace formula)
fn polygon_area(points: &[PathPoint]) -> Scalar {
    let Some(origin) = points.first().map(|p| p.pos) else {
        return 0.0;
    };
    let mut area = 0.0;
    for window in points.windows(2) {
        area += (window[0].pos - origin).cross(window[1].pos - origin);
    }
    area * 0.5
}

/// Number of sign changes in the cyclic sequence, zeros are skipped
fn sign_flips(values: impl Iterator<Item = Scalar>) -> usize {
    let mut first = None;
    let mut prev = None;
    let mut flips = 0;
    for value in values {
        if value.abs() <= EPSILON {
            continue;
        }
        let positive = value > 0.0;
        match prev {
            None => first = Some(positive),
            Some(prev) if prev != positive => flips += 1,
            _ => {}
        }
        prev = Some(positive);
    }
    if let (Some(first), Some(last)) = (first, prev) {
        if first != last {
            flips += 1;
        }
    }
    flips
}

/// Life cycle of the path cache
///
/// `Empty -> Building -> Flattened -> Expanded -> Consumed -> Empty`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheState {
    /// Nothing is stored
    #[default]
    Empty,
    /// Path is being replayed
    Building,
    /// Points are flattened and analyzed
    Flattened,
    /// Fill or stroke geometry is generated
    Expanded(Expansion),
    /// Geometry was handed over to the renderer
    Consumed,
}

/// Kind of geometry produced by the last expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expansion {
    /// Fill fans, fill fringe and the covering quad
    Fill,
    /// Stroke triangle strips
    Stroke,
}

/// Arena of flattened sub-paths
///
/// Memory of the sub-paths, points and vertices is kept between shapes, so a single
/// cache can be reused to tessellate many paths without allocations.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    pub(crate) subpaths: Vec<Subpath>,
    /// Number of active sub-paths, slots past it only keep memory
    pub(crate) len: usize,
    pub(crate) bounds: Option<BBox>,
    pub(crate) cover: [Vertex; 4],
    pub(crate) convex: bool,
    pub(crate) state: CacheState,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Active sub-paths
    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths[..self.len]
    }

    pub(crate) fn subpaths_mut(&mut self) -> &mut [Subpath] {
        &mut self.subpaths[..self.len]
    }

    /// Bounding box of all sub-paths, `None` if there are no sub-paths
    pub fn bounds(&self) -> Option<BBox> {
        self.bounds
    }

    /// Whether the cache holds a single convex sub-path
    pub fn is_convex(&self) -> bool {
        self.convex
    }

    /// Covering quad used to resolve stencil fill (triangle strip)
    pub fn cover(&self) -> &[Vertex; 4] {
        &self.cover
    }

    /// Forget stored path, allocated memory is kept for reuse
    pub fn clear(&mut self) {
        for subpath in self.subpaths_mut() {
            subpath.reset();
        }
        self.len = 0;
        self.bounds = None;
        self.cover = [Vertex::default(); 4];
        self.convex = false;
        self.set_state(CacheState::Empty);
    }

    pub(crate) fn set_state(&mut self, state: CacheState) {
        if self.state != state {
            tracing::trace!("[cache:state] {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Fail unless the cache is in one of the `allowed` states
    pub(crate) fn ensure_state(
        &self,
        allowed: &[CacheState],
        expected: CacheState,
    ) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected,
                found: self.state,
            })
        }
    }

    /// Replay path commands producing flattened sub-paths
    ///
    /// All points are transformed with `tr` before tessellation, so tolerances from the
    /// `config` are in device units. Can be called in any state, previous content is
    /// discarded.
    pub fn flatten(
        &mut self,
        path: &Path,
        tr: Transform,
        config: &TessellationConfig,
    ) -> Result<(), Error> {
        let _span = tracing::debug_span!("[flatten]", commands = path.commands().len()).entered();
        self.clear();
        self.set_state(CacheState::Building);

        let tess_tol = config.tess_tol;
        let dist_tol = config.dist_tol;
        for cmd in path {
            match cmd.transform(tr) {
                Command::MoveTo(p) => {
                    self.add_subpath()?
                        .add_point(p, PointFlags::CORNER, dist_tol)?;
                }
                Command::LineTo(p) => {
                    if let Some(subpath) = self.current() {
                        subpath.add_point(p, PointFlags::CORNER, dist_tol)?;
                    }
                }
                Command::BezierTo(c1, c2, p) => {
                    if let Some(subpath) = self.current() {
                        let Some(p0) = subpath.points.last().map(|p| p.pos) else {
                            continue;
                        };
                        for (point, flags) in Cubic([p0, c1, c2, p]).flatten(tess_tol) {
                            subpath.add_point(point, flags, dist_tol)?;
                        }
                    }
                }
                Command::Close => {
                    if let Some(subpath) = self.current() {
                        subpath.closed = true;
                    }
                }
                Command::Winding(winding) => {
                    if let Some(subpath) = self.current() {
                        subpath.hint = Some(winding);
                    }
                }
            }
        }

        // drop degenerate sub-paths, moving valid ones to the front of the arena
        let mut kept = 0;
        for index in 0..self.len {
            let subpath = &self.subpaths[index];
            if subpath.points.is_empty() || !subpath.has_finite_points() {
                tracing::debug!(
                    "[flatten:drop] subpath={} points={}",
                    index,
                    subpath.points.len()
                );
                self.subpaths[index].reset();
                continue;
            }
            self.subpaths.swap(kept, index);
            kept += 1;
        }
        self.len = kept;

        let mut bounds: Option<BBox> = None;
        for subpath in self.subpaths_mut() {
            subpath.analyze(dist_tol);
            bounds = Some(subpath.bounds.union_opt(bounds));
        }
        self.bounds = bounds;
        self.convex = self.len == 1 && self.subpaths[0].convex;
        tracing::debug!(
            "[flatten:done] subpaths={} convex={} bounds={:?}",
            self.len,
            self.convex,
            self.bounds
        );

        self.set_state(CacheState::Flattened);
        Ok(())
    }

    /// Last active sub-path
    fn current(&mut self) -> Option<&mut Subpath> {
        let index = self.len.checked_sub(1)?;
        self.subpaths.get_mut(index)
    }

    /// Activate next sub-path slot of the arena
    fn add_subpath(&mut self) -> Result<&mut Subpath, Error> {
        if self.len == self.subpaths.len() {
            self.subpaths.try_reserve(1)?;
            self.subpaths.push(Subpath::default());
        }
        let subpath = &mut self.subpaths[self.len];
        subpath.reset();
        self.len += 1;
        Ok(subpath)
    }

    /// Compute normals and join classification of all points
    ///
    /// Resets `LEFT`, `BEVEL` and `INNER_BEVEL` flags on every call, so the result only
    /// depends on the arguments.
    pub fn calculate_joins(&mut self, half_width: Scalar, join: LineJoin, miter_limit: Scalar) {
        for subpath in self.subpaths_mut() {
            subpath.calculate_joins(half_width, join, miter_limit);
        }
    }

    /// Check if flattened path contains the point
    pub fn contains_point(&self, point: Point, fill_rule: FillRule) -> bool {
        match self.bounds {
            Some(bounds) if bounds.contains(point) => {}
            _ => return false,
        }
        let winding: i32 = self
            .subpaths()
            .iter()
            .filter(|subpath| subpath.points.len() > 2 && subpath.bounds.contains(point))
            .map(|subpath| subpath.winding_number(point))
            .sum();
        match fill_rule {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}
