use crate::{Cubic, EPSILON, PI, Point, Scalar, Transform, utils::clamp};
use std::fmt;

/// Magic constant used to approximate quarter of a circle with a cubic bezier curve
///
/// (4/3)*tan(pi/8) = 4*(sqrt(2)-1)/3
pub const KAPPA90: Scalar = 0.552_284_8;

/// Distance under which builder treats two points as the same one
const BUILDER_DIST_TOL: Scalar = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrokeStyle {
    pub width: Scalar,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    /// Miter joins longer than `miter_limit * width / 2` are replaced with bevels
    pub miter_limit: Scalar,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            line_join: LineJoin::default(),
            line_cap: LineCap::default(),
            miter_limit: 10.0,
        }
    }
}

/// Direction of the sub-path traversal
///
/// Uses mathematical orientation: `CCW` sub-paths have positive signed area
/// (shoelace formula), `CW` sub-paths have negative one. When recorded in a path
/// with [`PathBuilder::winding`] `CCW` marks a solid shape and `CW` marks a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Winding {
    #[default]
    CCW,
    CW,
}

impl Winding {
    /// Winding corresponding to the sign of the signed area
    pub fn from_area(area: Scalar) -> Self {
        if area > 0.0 { Self::CCW } else { Self::CW }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::CCW => Self::CW,
            Self::CW => Self::CCW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Single path instruction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Start new sub-path at the point
    MoveTo(Point),
    /// Line from the current position to the point
    LineTo(Point),
    /// Cubic bezier curve from the current position with two control points and the end point
    BezierTo(Point, Point, Point),
    /// Close current sub-path
    Close,
    /// Fill rule hint for the current sub-path
    Winding(Winding),
}

impl Command {
    /// Apply transformation to all points of the command
    pub fn transform(&self, tr: Transform) -> Self {
        match *self {
            Command::MoveTo(p) => Command::MoveTo(tr.apply(p)),
            Command::LineTo(p) => Command::LineTo(tr.apply(p)),
            Command::BezierTo(c1, c2, p) => {
                Command::BezierTo(tr.apply(c1), tr.apply(c2), tr.apply(p))
            }
            cmd => cmd,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::MoveTo(p) => write!(f, "M{:?}", p),
            Command::LineTo(p) => write!(f, "L{:?}", p),
            Command::BezierTo(c1, c2, p) => write!(f, "C{:?} {:?} {:?}", c1, c2, p),
            Command::Close => write!(f, "Z"),
            Command::Winding(Winding::CCW) => write!(f, "[solid]"),
            Command::Winding(Winding::CW) => write!(f, "[hole]"),
        }
    }
}

/// Recorded sequence of path commands
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Path {
    commands: Vec<Command>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commands.is_empty() {
            return write!(f, "Empty");
        }
        for (index, cmd) in self.commands.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", cmd)?;
        }
        Ok(())
    }
}

impl Path {
    /// Create path from the list of commands
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Convenience method to create `PathBuilder`
    pub fn builder() -> PathBuilder {
        PathBuilder::new()
    }

    pub fn into_builder(self) -> PathBuilder {
        PathBuilder::from_path(self)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply transformation to the path in place
    pub fn transform(&mut self, tr: Transform) {
        for cmd in self.commands.iter_mut() {
            *cmd = cmd.transform(tr);
        }
    }

    /// Number of `MoveTo` commands, upper bound on the number of sub-paths
    pub fn subpaths_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::MoveTo(_)))
            .count()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl FromIterator<Command> for Path {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Command> for Path {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.commands.extend(iter)
    }
}

/// Path builder similar to Canvas interface.
///
/// All the shapes are expressed with `MoveTo`, `LineTo`, `BezierTo` and `Close` commands.
#[derive(Clone, Default)]
pub struct PathBuilder {
    commands: Vec<Command>,
    /// Current position, `None` until the first `move_to`
    position: Option<Point>,
    /// Start of the current sub-path
    start: Point,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: Path) -> Self {
        let mut builder = Self::new();
        for cmd in path.commands {
            builder.push(cmd);
        }
        builder
    }

    /// Build path
    pub fn build(&mut self) -> Path {
        let PathBuilder { commands, .. } = std::mem::take(self);
        Path::new(commands)
    }

    /// Current possition of the builder
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Append raw command, keeping track of the current position
    pub fn push(&mut self, cmd: Command) -> &mut Self {
        match cmd {
            Command::MoveTo(p) => {
                self.start = p;
                self.position = Some(p);
            }
            Command::LineTo(p) | Command::BezierTo(_, _, p) => {
                if self.position.is_some() {
                    self.position = Some(p);
                }
            }
            Command::Close => {
                if self.position.is_some() {
                    self.position = Some(self.start);
                }
            }
            Command::Winding(_) => {}
        }
        self.commands.push(cmd);
        self
    }

    /// Move current position, starting new sub-path
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.push(Command::MoveTo(p.into()))
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        self.push(Command::LineTo(p.into()))
    }

    /// Add cubic beizer curve
    pub fn bezier_to(
        &mut self,
        c1: impl Into<Point>,
        c2: impl Into<Point>,
        p: impl Into<Point>,
    ) -> &mut Self {
        self.push(Command::BezierTo(c1.into(), c2.into(), p.into()))
    }

    /// Add quadratic bezier curve, stored as an equivalent cubic one
    pub fn quad_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) -> &mut Self {
        let c = c.into();
        let p = p.into();
        match self.position {
            None => self.line_to(p),
            Some(p0) => {
                let Cubic([_, c1, c2, p3]) = Cubic::from_quad(p0, c, p);
                self.bezier_to(c1, c2, p3)
            }
        }
    }

    /// Close current sub-path
    pub fn close(&mut self) -> &mut Self {
        self.push(Command::Close)
    }

    /// Set fill rule hint for the current sub-path (`CCW` solid, `CW` hole)
    pub fn winding(&mut self, winding: Winding) -> &mut Self {
        self.push(Command::Winding(winding))
    }

    /// Add circular arc centered at `center`, from angle `a0` to angle `a1`
    ///
    /// Angles are in radians. `Winding::CCW` sweeps with increasing angle, `Winding::CW`
    /// with decreasing one. Arc is connected with a line to the current position if there
    /// is one, otherwise it starts a new sub-path.
    pub fn arc(
        &mut self,
        center: impl Into<Point>,
        radius: Scalar,
        a0: Scalar,
        a1: Scalar,
        dir: Winding,
    ) -> &mut Self {
        let center = center.into();
        let mut da = a1 - a0;
        match dir {
            Winding::CCW => {
                if da.abs() >= 2.0 * PI {
                    da = 2.0 * PI;
                } else {
                    while da < 0.0 {
                        da += 2.0 * PI;
                    }
                }
            }
            Winding::CW => {
                if da.abs() >= 2.0 * PI {
                    da = -2.0 * PI;
                } else {
                    while da > 0.0 {
                        da -= 2.0 * PI;
                    }
                }
            }
        }

        // split into at most 5 segments, each no longer than quarter of a circle
        let ndivs = clamp((da.abs() / (PI * 0.5) + 0.5) as usize, 1, 5);
        let hda = (da / ndivs as Scalar) / 2.0;
        let mut kappa = (4.0 / 3.0 * (1.0 - hda.cos()) / hda.sin()).abs();
        if dir == Winding::CW {
            kappa = -kappa;
        }

        let mut prev: Option<(Point, Point)> = None;
        for i in 0..=ndivs {
            let a = a0 + da * (i as Scalar / ndivs as Scalar);
            let (sin, cos) = a.sin_cos();
            let p = center + radius * Point::new(cos, sin);
            let tangent = radius * kappa * Point::new(-sin, cos);
            match prev {
                None if self.position.is_some() => {
                    self.line_to(p);
                }
                None => {
                    self.move_to(p);
                }
                Some((prev, prev_tangent)) => {
                    self.bezier_to(prev + prev_tangent, p - tangent, p);
                }
            }
            prev = Some((p, tangent));
        }
        self
    }

    /// Add circular arc tangent to the lines `position -> p1` and `p1 -> p2`
    pub fn arc_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>, radius: Scalar) -> &mut Self {
        let p1 = p1.into();
        let p2 = p2.into();
        let p0 = match self.position {
            None => return self,
            Some(p0) => p0,
        };

        // degenerate cases collapse into a straight line
        if p0.is_within(p1, BUILDER_DIST_TOL)
            || p1.is_within(p2, BUILDER_DIST_TOL)
            || segment_dist_squared(p1, p0, p2) < BUILDER_DIST_TOL * BUILDER_DIST_TOL
            || radius < BUILDER_DIST_TOL
        {
            return self.line_to(p1);
        }

        let (d0, d1) = match ((p0 - p1).normalize(), (p2 - p1).normalize()) {
            (Some(d0), Some(d1)) => (d0, d1),
            _ => return self.line_to(p1),
        };
        let a = d0.dot(d1).clamp(-1.0, 1.0).acos();
        let d = radius / (a / 2.0).tan();
        if d > 10000.0 {
            return self.line_to(p1);
        }

        let Point([dx0, dy0]) = d0;
        let Point([dx1, dy1]) = d1;
        if d0.cross(d1) < 0.0 {
            let center = p1 + d * d0 + radius * Point::new(dy0, -dx0);
            let a0 = dx0.atan2(-dy0);
            let a1 = (-dx1).atan2(dy1);
            self.arc(center, radius, a0, a1, Winding::CCW)
        } else {
            let center = p1 + d * d0 + radius * Point::new(-dy0, dx0);
            let a0 = (-dx0).atan2(dy0);
            let a1 = dx1.atan2(-dy1);
            self.arc(center, radius, a0, a1, Winding::CW)
        }
    }

    /// Add closed rectangle sub-path
    pub fn rect(&mut self, x: Scalar, y: Scalar, w: Scalar, h: Scalar) -> &mut Self {
        self.move_to((x, y))
            .line_to((x, y + h))
            .line_to((x + w, y + h))
            .line_to((x + w, y))
            .close()
    }

    /// Add closed rectangle with all corners rounded by the same radius
    pub fn rounded_rect(&mut self, x: Scalar, y: Scalar, w: Scalar, h: Scalar, r: Scalar) -> &mut Self {
        self.rounded_rect_varying(x, y, w, h, r, r, r, r)
    }

    /// Add closed rectangle with individually rounded corners
    ///
    /// Radii are given for top-left, top-right, bottom-right and bottom-left corners
    /// (y axis pointing down) and are clamped to the half of the rectangle size.
    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect_varying(
        &mut self,
        x: Scalar,
        y: Scalar,
        w: Scalar,
        h: Scalar,
        rad_tl: Scalar,
        rad_tr: Scalar,
        rad_br: Scalar,
        rad_bl: Scalar,
    ) -> &mut Self {
        if rad_tl < 0.1 && rad_tr < 0.1 && rad_br < 0.1 && rad_bl < 0.1 {
            return self.rect(x, y, w, h);
        }
        let halfw = w.abs() * 0.5;
        let halfh = h.abs() * 0.5;
        let sw = sign(w);
        let sh = sign(h);
        let (rx_bl, ry_bl) = (rad_bl.min(halfw) * sw, rad_bl.min(halfh) * sh);
        let (rx_br, ry_br) = (rad_br.min(halfw) * sw, rad_br.min(halfh) * sh);
        let (rx_tr, ry_tr) = (rad_tr.min(halfw) * sw, rad_tr.min(halfh) * sh);
        let (rx_tl, ry_tl) = (rad_tl.min(halfw) * sw, rad_tl.min(halfh) * sh);
        let k = 1.0 - KAPPA90;

        self.move_to((x, y + ry_tl))
            .line_to((x, y + h - ry_bl))
            .bezier_to(
                (x, y + h - ry_bl * k),
                (x + rx_bl * k, y + h),
                (x + rx_bl, y + h),
            )
            .line_to((x + w - rx_br, y + h))
            .bezier_to(
                (x + w - rx_br * k, y + h),
                (x + w, y + h - ry_br * k),
                (x + w, y + h - ry_br),
            )
            .line_to((x + w, y + ry_tr))
            .bezier_to(
                (x + w, y + ry_tr * k),
                (x + w - rx_tr * k, y),
                (x + w - rx_tr, y),
            )
            .line_to((x + rx_tl, y))
            .bezier_to((x + rx_tl * k, y), (x, y + ry_tl * k), (x, y + ry_tl))
            .close()
    }

    /// Add closed ellipse sub-path
    pub fn ellipse(&mut self, center: impl Into<Point>, rx: Scalar, ry: Scalar) -> &mut Self {
        let Point([cx, cy]) = center.into();
        let kx = rx * KAPPA90;
        let ky = ry * KAPPA90;
        self.move_to((cx - rx, cy))
            .bezier_to((cx - rx, cy + ky), (cx - kx, cy + ry), (cx, cy + ry))
            .bezier_to((cx + kx, cy + ry), (cx + rx, cy + ky), (cx + rx, cy))
            .bezier_to((cx + rx, cy - ky), (cx + kx, cy - ry), (cx, cy - ry))
            .bezier_to((cx - kx, cy - ry), (cx - rx, cy - ky), (cx - rx, cy))
            .close()
    }

    /// Add closed circle sub-path
    pub fn circle(&mut self, center: impl Into<Point>, radius: Scalar) -> &mut Self {
        self.ellipse(center, radius, radius)
    }
}

fn sign(value: Scalar) -> Scalar {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Squared distance from the point `p` to the segment `a -> b`
fn segment_dist_squared(p: Point, a: Point, b: Point) -> Scalar {
    let ab = b - a;
    let d = ab.length_squared();
    let mut t = (p - a).dot(ab);
    if d > EPSILON {
        t /= d;
    }
    let t = t.clamp(0.0, 1.0);
    (a + t * ab - p).length_squared()
}
