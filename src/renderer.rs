//! Interface between the tessellator and a rendering backend
use crate::{
    BBox, CacheState, Color, Error, Expansion, PathCache, Point, Scalar, Subpath, Transform,
    Vertex, Winding,
};

/// Handle of an image owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageId(pub usize);

/// Blend factor of the `src * src_factor + dst * dst_factor` blending equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Porter-Duff composite operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    Atop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
}

impl CompositeOperation {
    /// Source and destination blend factors for premultiplied colors
    pub fn blend_factors(self) -> (BlendFactor, BlendFactor) {
        use BlendFactor::*;
        match self {
            Self::SourceOver => (One, OneMinusSrcAlpha),
            Self::SourceIn => (DstAlpha, Zero),
            Self::SourceOut => (OneMinusDstAlpha, Zero),
            Self::Atop => (DstAlpha, OneMinusSrcAlpha),
            Self::DestinationOver => (OneMinusDstAlpha, One),
            Self::DestinationIn => (Zero, SrcAlpha),
            Self::DestinationOut => (Zero, OneMinusSrcAlpha),
            Self::DestinationAtop => (OneMinusDstAlpha, SrcAlpha),
            Self::Lighter => (One, One),
            Self::Copy => (One, Zero),
            Self::Xor => (OneMinusDstAlpha, OneMinusSrcAlpha),
        }
    }
}

/// Paint description passed to the renderer
///
/// Solid colors, gradients and image patterns share the same representation: a rounded
/// box of `extent` half-size and corner `radius` in the coordinate system of `transform`,
/// blurred by `feather`. Color goes from `inner_color` inside of the box to `outer_color`
/// outside of it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paint {
    pub transform: Transform,
    pub extent: [Scalar; 2],
    pub radius: Scalar,
    pub feather: Scalar,
    pub inner_color: Color,
    pub outer_color: Color,
    pub image: Option<ImageId>,
}

impl Default for Paint {
    fn default() -> Self {
        Self::color(Color::BLACK)
    }
}

impl Paint {
    /// Solid color paint
    pub fn color(color: Color) -> Self {
        Self {
            transform: Transform::identity(),
            extent: [0.0, 0.0],
            radius: 0.0,
            feather: 1.0,
            inner_color: color,
            outer_color: color,
            image: None,
        }
    }

    /// Linear gradient from `start` (`inner` color) to `end` (`outer` color)
    pub fn linear_gradient(
        start: impl Into<Point>,
        end: impl Into<Point>,
        inner: Color,
        outer: Color,
    ) -> Self {
        const LARGE: Scalar = 1e5;
        let start = start.into();
        let delta = end.into() - start;
        let length = delta.length();
        let Point([dx, dy]) = if length > 1e-4 {
            delta / length
        } else {
            Point::new(0.0, 1.0)
        };
        Self {
            transform: Transform::new(dy, dx, start.x() - dx * LARGE, -dx, dy, start.y() - dy * LARGE),
            extent: [LARGE, LARGE + length * 0.5],
            radius: 0.0,
            feather: length.max(1.0),
            inner_color: inner,
            outer_color: outer,
            image: None,
        }
    }

    /// Radial gradient between circles with `inner_radius` and `outer_radius`
    pub fn radial_gradient(
        center: impl Into<Point>,
        inner_radius: Scalar,
        outer_radius: Scalar,
        inner: Color,
        outer: Color,
    ) -> Self {
        let Point([cx, cy]) = center.into();
        let radius = (inner_radius + outer_radius) * 0.5;
        let feather = outer_radius - inner_radius;
        Self {
            transform: Transform::identity().translate(cx, cy),
            extent: [radius, radius],
            radius,
            feather: feather.max(1.0),
            inner_color: inner,
            outer_color: outer,
            image: None,
        }
    }

    /// Feathered rounded rectangle, useful for shadows
    #[allow(clippy::too_many_arguments)]
    pub fn box_gradient(
        x: Scalar,
        y: Scalar,
        width: Scalar,
        height: Scalar,
        radius: Scalar,
        feather: Scalar,
        inner: Color,
        outer: Color,
    ) -> Self {
        Self {
            transform: Transform::identity().translate(x + width * 0.5, y + height * 0.5),
            extent: [width * 0.5, height * 0.5],
            radius,
            feather: feather.max(1.0),
            inner_color: inner,
            outer_color: outer,
            image: None,
        }
    }

    /// Image pattern with the top-left corner at `origin`, rotated by `angle` around it
    pub fn image_pattern(
        origin: impl Into<Point>,
        size: [Scalar; 2],
        angle: Scalar,
        image: ImageId,
        alpha: Scalar,
    ) -> Self {
        let Point([ox, oy]) = origin.into();
        let color = Color::rgba(1.0, 1.0, 1.0, alpha);
        Self {
            transform: Transform::identity().translate(ox, oy).rotate(angle),
            extent: size,
            radius: 0.0,
            feather: 0.0,
            inner_color: color,
            outer_color: color,
            image: Some(image),
        }
    }
}

/// Scissor rectangle, `extent` is the half-size of the rectangle centered at the
/// origin of `transform`. Negative extent disables scissoring.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scissor {
    pub transform: Transform,
    pub extent: [Scalar; 2],
}

impl Default for Scissor {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            extent: [-1.0, -1.0],
        }
    }
}

impl Scissor {
    /// Scissor for the axis aligned rectangle
    pub fn new(x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Self {
        Self {
            transform: Transform::identity().translate(x + width * 0.5, y + height * 0.5),
            extent: [width.max(0.0) * 0.5, height.max(0.0) * 0.5],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.extent[0] >= 0.0 && self.extent[1] >= 0.0
    }
}

/// Fill geometry of a single sub-path
#[derive(Debug, Clone, Copy)]
pub struct FillPath<'a> {
    /// Triangle fan
    pub fill: &'a [Vertex],
    /// Antialiasing fringe (triangle strip)
    pub stroke: &'a [Vertex],
    /// Winding derived from the geometry
    pub winding: Winding,
    /// Fill rule hint, `CCW` solid and `CW` hole
    pub hint: Option<Winding>,
}

impl<'a> From<&'a Subpath> for FillPath<'a> {
    fn from(subpath: &'a Subpath) -> Self {
        Self {
            fill: subpath.fill(),
            stroke: subpath.stroke(),
            winding: subpath.winding(),
            hint: subpath.hint(),
        }
    }
}

/// Stroke geometry of a single sub-path (triangle strip)
#[derive(Debug, Clone, Copy)]
pub struct StrokePath<'a> {
    pub stroke: &'a [Vertex],
}

impl<'a> From<&'a Subpath> for StrokePath<'a> {
    fn from(subpath: &'a Subpath) -> Self {
        Self {
            stroke: subpath.stroke(),
        }
    }
}

/// Rendering backend
///
/// Vertices are in device coordinates. Fill of non convex paths expects the stencil
/// algorithm: draw `fill` fans of all paths into the stencil buffer accumulating winding
/// numbers, draw antialiasing `stroke` strips where stencil is zero, and finally draw
/// `cover` quad where stencil is not zero clearing it. Convex paths are drawn directly
/// with an empty `cover`.
pub trait Renderer {
    #[allow(clippy::too_many_arguments)]
    fn fill(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
        bounds: BBox,
        paths: &[FillPath<'_>],
        cover: &[Vertex],
        convex: bool,
    );

    fn stroke(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
        stroke_width: Scalar,
        paths: &[StrokePath<'_>],
    );

    /// Draw list of triangles as is
    fn triangles(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        vertices: &[Vertex],
        fringe: Scalar,
    );
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn fill(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
        bounds: BBox,
        paths: &[FillPath<'_>],
        cover: &[Vertex],
        convex: bool,
    ) {
        (**self).fill(paint, composite, scissor, fringe, bounds, paths, cover, convex)
    }

    fn stroke(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
        stroke_width: Scalar,
        paths: &[StrokePath<'_>],
    ) {
        (**self).stroke(paint, composite, scissor, fringe, stroke_width, paths)
    }

    fn triangles(
        &mut self,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        vertices: &[Vertex],
        fringe: Scalar,
    ) {
        (**self).triangles(paint, composite, scissor, vertices, fringe)
    }
}

impl PathCache {
    /// Hand over expanded fill geometry to the renderer
    pub fn render_fill<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
    ) -> Result<(), Error> {
        let expanded = CacheState::Expanded(Expansion::Fill);
        self.ensure_state(&[expanded], expanded)?;
        if let Some(bounds) = self.bounds {
            let paths: Vec<FillPath<'_>> = self.subpaths().iter().map(FillPath::from).collect();
            let cover: &[Vertex] = if self.convex { &[] } else { &self.cover };
            renderer.fill(
                paint,
                composite,
                scissor,
                fringe,
                bounds,
                &paths,
                cover,
                self.convex,
            );
        }
        self.set_state(CacheState::Consumed);
        Ok(())
    }

    /// Hand over expanded stroke geometry to the renderer
    pub fn render_stroke<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        paint: &Paint,
        composite: CompositeOperation,
        scissor: &Scissor,
        fringe: Scalar,
        stroke_width: Scalar,
    ) -> Result<(), Error> {
        let expanded = CacheState::Expanded(Expansion::Stroke);
        self.ensure_state(&[expanded], expanded)?;
        if self.len > 0 {
            let paths: Vec<StrokePath<'_>> =
                self.subpaths().iter().map(StrokePath::from).collect();
            renderer.stroke(paint, composite, scissor, fringe, stroke_width, &paths);
        }
        self.set_state(CacheState::Consumed);
        Ok(())
    }
}

/// Pass triangles (for example glyph quads) to the renderer without tessellation
pub fn render_triangles<R: Renderer + ?Sized>(
    renderer: &mut R,
    paint: &Paint,
    composite: CompositeOperation,
    scissor: &Scissor,
    vertices: &[Vertex],
    fringe: Scalar,
) {
    if vertices.is_empty() {
        return;
    }
    renderer.triangles(paint, composite, scissor, vertices, fringe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FILL_MITER_LIMIT, LineCap, LineJoin, Path, TessellationConfig, assert_approx_eq};

    #[derive(Debug, Default)]
    struct Recorder {
        fills: Vec<(usize, usize, bool)>,
        strokes: Vec<(usize, Scalar)>,
        triangles: usize,
    }

    impl Renderer for Recorder {
        fn fill(
            &mut self,
            _paint: &Paint,
            _composite: CompositeOperation,
            _scissor: &Scissor,
            _fringe: Scalar,
            _bounds: BBox,
            paths: &[FillPath<'_>],
            cover: &[Vertex],
            convex: bool,
        ) {
            self.fills.push((paths.len(), cover.len(), convex));
        }

        fn stroke(
            &mut self,
            _paint: &Paint,
            _composite: CompositeOperation,
            _scissor: &Scissor,
            _fringe: Scalar,
            stroke_width: Scalar,
            paths: &[StrokePath<'_>],
        ) {
            self.strokes.push((paths.len(), stroke_width));
        }

        fn triangles(
            &mut self,
            _paint: &Paint,
            _composite: CompositeOperation,
            _scissor: &Scissor,
            vertices: &[Vertex],
            _fringe: Scalar,
        ) {
            self.triangles += vertices.len();
        }
    }

    fn flatten(path: &Path) -> PathCache {
        let mut cache = PathCache::new();
        cache
            .flatten(path, Transform::identity(), &TessellationConfig::default())
            .unwrap();
        cache
    }

    #[test]
    fn test_render_fill() {
        let mut recorder = Recorder::default();
        let paint = Paint::color(Color::rgb(1.0, 0.0, 0.0));
        let scissor = Scissor::default();

        let mut cache = flatten(&Path::builder().rect(0.0, 0.0, 100.0, 50.0).build());
        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        cache
            .render_fill(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0)
            .unwrap();
        assert_eq!(cache.state(), CacheState::Consumed);

        let path = Path::builder()
            .circle((50.0, 50.0), 40.0)
            .circle((90.0, 50.0), 40.0)
            .build();
        cache
            .flatten(&path, Transform::identity(), &TessellationConfig::default())
            .unwrap();
        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        cache
            .render_fill(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0)
            .unwrap();

        assert_eq!(recorder.fills, vec![(1, 0, true), (2, 4, false)]);
    }

    #[test]
    fn test_render_stroke() {
        let mut recorder = Recorder::default();
        let mut cache = flatten(
            &Path::builder()
                .move_to((0.0, 0.0))
                .line_to((10.0, 10.0))
                .move_to((20.0, 0.0))
                .line_to((30.0, 10.0))
                .build(),
        );
        let paint = Paint::default();
        let scissor = Scissor::default();

        // geometry has to be expanded first
        assert_eq!(
            cache.render_stroke(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0, 2.0),
            Err(Error::InvalidState {
                expected: CacheState::Expanded(Expansion::Stroke),
                found: CacheState::Flattened,
            })
        );

        cache
            .expand_stroke(2.0, 1.0, LineCap::Butt, LineJoin::Miter, 10.0, 0.25)
            .unwrap();
        cache
            .render_stroke(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0, 2.0)
            .unwrap();
        assert_eq!(recorder.strokes, vec![(2, 2.0)]);

        // consumed geometry can not be rendered twice
        assert!(
            cache
                .render_stroke(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0, 2.0)
                .is_err()
        );
        // nor expanded again without flattening
        assert!(
            cache
                .expand_stroke(2.0, 1.0, LineCap::Butt, LineJoin::Miter, 10.0, 0.25)
                .is_err()
        );
    }

    #[test]
    fn test_render_expansion_mismatch() {
        let mut recorder = Recorder::default();
        let paint = Paint::default();
        let scissor = Scissor::default();
        let path = Path::builder()
            .circle((50.0, 50.0), 40.0)
            .circle((90.0, 50.0), 40.0)
            .build();
        let mut cache = flatten(&path);
        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        assert_eq!(cache.cover().len(), 4);
        assert_ne!(cache.cover(), &[Vertex::default(); 4]);

        // stroke geometry replaces fill geometry together with the covering quad
        cache
            .expand_stroke(2.0, 1.0, LineCap::Butt, LineJoin::Miter, 10.0, 0.25)
            .unwrap();
        assert_eq!(cache.state(), CacheState::Expanded(Expansion::Stroke));
        assert_eq!(cache.cover(), &[Vertex::default(); 4]);
        assert_eq!(
            cache.render_fill(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0),
            Err(Error::InvalidState {
                expected: CacheState::Expanded(Expansion::Fill),
                found: CacheState::Expanded(Expansion::Stroke),
            })
        );
        assert!(recorder.fills.is_empty());

        cache
            .expand_fill(1.0, LineJoin::Miter, FILL_MITER_LIMIT)
            .unwrap();
        assert_eq!(
            cache.render_stroke(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0, 2.0),
            Err(Error::InvalidState {
                expected: CacheState::Expanded(Expansion::Stroke),
                found: CacheState::Expanded(Expansion::Fill),
            })
        );
        assert!(recorder.strokes.is_empty());

        // failed hand over keeps the geometry
        cache
            .render_fill(&mut recorder, &paint, CompositeOperation::default(), &scissor, 1.0)
            .unwrap();
        assert_eq!(recorder.fills, vec![(2, 4, false)]);
    }

    #[test]
    fn test_render_triangles() {
        let mut recorder = Recorder::default();
        let vertices = [
            Vertex::new(0.0, 0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 1.0, 0.0),
            Vertex::new(0.0, 1.0, 0.0, 1.0),
        ];
        let renderer: &mut dyn Renderer = &mut recorder;
        render_triangles(
            &mut *renderer,
            &Paint::default(),
            CompositeOperation::Copy,
            &Scissor::default(),
            &vertices,
            1.0,
        );
        render_triangles(
            renderer,
            &Paint::default(),
            CompositeOperation::Copy,
            &Scissor::default(),
            &[],
            1.0,
        );
        assert_eq!(recorder.triangles, 3);
    }

    #[test]
    fn test_paint() {
        let paint = Paint::linear_gradient((0.0, 0.0), (100.0, 0.0), Color::BLACK, Color::WHITE);
        assert_eq!(paint.feather, 100.0);
        assert_eq!(paint.extent, [1e5, 1e5 + 50.0]);
        // gradient axis is mapped onto the y axis of the paint space
        let start = paint.transform.invert().unwrap().apply(Point::new(0.0, 0.0));
        assert_approx_eq!(start.x(), 0.0, 1e-3);

        let paint = Paint::radial_gradient((10.0, 20.0), 5.0, 15.0, Color::BLACK, Color::WHITE);
        assert_eq!(paint.radius, 10.0);
        assert_eq!(paint.feather, 10.0);
        assert_eq!(paint.transform.apply(Point::new(0.0, 0.0)), Point::new(10.0, 20.0));

        let paint = Paint::box_gradient(0.0, 0.0, 100.0, 50.0, 5.0, 0.0, Color::BLACK, Color::WHITE);
        assert_eq!(paint.extent, [50.0, 25.0]);
        assert_eq!(paint.feather, 1.0);

        let paint = Paint::image_pattern((10.0, 10.0), [64.0, 32.0], 0.0, ImageId(3), 0.5);
        assert_eq!(paint.image, Some(ImageId(3)));
        assert_eq!(paint.inner_color.a, 0.5);
        assert_eq!(paint.transform.apply(Point::new(0.0, 0.0)), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_scissor_and_composite() {
        assert!(!Scissor::default().is_enabled());
        let scissor = Scissor::new(10.0, 10.0, 20.0, 40.0);
        assert!(scissor.is_enabled());
        assert_eq!(scissor.extent, [10.0, 20.0]);
        assert_eq!(
            CompositeOperation::default().blend_factors(),
            (BlendFactor::One, BlendFactor::OneMinusSrcAlpha)
        );
        assert_eq!(
            CompositeOperation::Copy.blend_factors(),
            (BlendFactor::One, BlendFactor::Zero)
        );
    }
}
