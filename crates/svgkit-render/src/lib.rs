//! # svgkit Render
//!
//! Rendering abstraction layer for the svgkit drawing pipeline.
//!
//! Decouples what to draw (paths, images, transforms, clips) from how it is
//! painted. The document model walks its node tree and, for each node, pushes
//! a boundable context, applies transforms and clips, then issues draw calls
//! against whichever [`SvgRenderer`] it was handed.
//!
//! ## Architecture
//!
//! ```text
//! Document model
//!      │  transform / clip / boundable / draw calls
//!      ▼
//! SvgRenderer (capability trait)
//!      ├── CanvasRenderer   real output onto a Canvas surface
//!      └── NullRenderer     bookkeeping only, for measurement passes
//! ```
//!
//! Both implementations share one [`ClipRegion`] composition model: shapes
//! accumulate in insertion order and the backend clip is re-derived from
//! scratch on every mutation, so there is no observable half-applied state.

use svgkit_canvas::{
    Brush, Canvas, CanvasError, CompositingQuality, GraphicsUnit, ImageData, Pen,
    PixelOffsetMode, SmoothingMode, Surface, TextRenderingHint, TextureBrush, MAX_SURFACE_DIM,
};
use svgkit_geometry::{MatrixOrder, Path, Point, Rect, Region, Transform};
use thiserror::Error;
use tracing::{debug, trace};

/// Fixed vertical resolution reported by the null renderer.
pub const NULL_DPI: f32 = 72.0;

// ==================== Errors ====================

/// Errors that can occur in the rendering layer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Pattern surface allocation failed: {0}")]
    PatternSurface(#[from] CanvasError),
}

// ==================== Boundable ====================

/// Something with a bounding rectangle.
///
/// The document model pushes boundables to mark what is currently being
/// measured or drawn; percentage lengths resolve against the top of the
/// stack.
pub trait Boundable {
    fn bounds(&self) -> Rect;

    fn location(&self) -> Point {
        self.bounds().location()
    }
}

impl Boundable for Rect {
    fn bounds(&self) -> Rect {
        *self
    }
}

impl Boundable for ImageData {
    fn bounds(&self) -> Rect {
        ImageData::bounds(self)
    }
}

// ==================== Clip Region ====================

/// An ordered collection of clip shapes composing by intersection.
///
/// The effective clip is the intersection of all normal-sense shapes minus
/// the union of all reversed-sense shapes, evaluated in insertion order. An
/// empty region means no clipping at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipRegion {
    paths: Vec<Path>,
}

impl ClipRegion {
    /// Create an empty (unbounded) clip region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all shapes; the region becomes unbounded.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Append a path in normal sense, narrowing the region.
    pub fn intersect(&mut self, path: &Path) {
        self.paths.push(path.clone());
    }

    /// Append an axis-aligned rectangle in normal sense.
    pub fn intersect_rect(&mut self, rectangle: Rect) {
        self.paths.push(Path::from_rect(rectangle));
    }

    /// Append a reversed-winding copy of `path`, carving its interior out
    /// of the region. The original path is left untouched.
    pub fn exclude(&mut self, path: &Path) {
        let mut cloned = path.clone();
        cloned.reverse();
        self.paths.push(cloned);
    }

    /// The shapes composing this region, in insertion order.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Derive the backend clip region.
    ///
    /// `None` means unbounded. Otherwise the region is built from the first
    /// shape and each subsequent shape is intersected in, in insertion
    /// order; the order matters once reversed-sense excludes are present.
    /// Every renderer implementation uses this one derivation.
    pub fn to_region(&self) -> Option<Region> {
        let (first, rest) = self.paths.split_first()?;
        let mut region = Region::from_path(first);
        for path in rest {
            region.intersect(path);
        }
        Some(region)
    }
}

// ==================== Renderer Contract ====================

/// The capability contract every renderer implementation satisfies.
///
/// Callers are written against this trait so the canvas-backed and null
/// implementations are substitutable without conditional logic.
///
/// Transform mutators take a [`MatrixOrder`]; `Append` (the default order)
/// composes in local space, `Prepend` in parent space. The clip mutators
/// named `set_clip_*` intersect into the current region (they narrow, never
/// widen), while `replace_clip*` discard it and install a fresh one.
pub trait SvgRenderer {
    /// Vertical dots-per-inch of the render target.
    fn dpi_y(&self) -> f32;

    fn smoothing_mode(&self) -> SmoothingMode;
    fn set_smoothing_mode(&mut self, mode: SmoothingMode);

    /// Get the current transform matrix.
    fn transform(&self) -> Transform;

    /// Replace the transform matrix wholesale.
    fn set_transform(&mut self, transform: Transform);

    fn rotate_transform(&mut self, degrees: f32, order: MatrixOrder);
    fn scale_transform(&mut self, sx: f32, sy: f32, order: MatrixOrder);
    fn translate_transform(&mut self, dx: f32, dy: f32, order: MatrixOrder);

    /// Intersect a path into the current clip.
    fn set_clip_path(&mut self, path: &Path);

    /// Intersect a rectangle into the current clip.
    fn set_clip_rect(&mut self, rectangle: Rect);

    /// Discard the current clip and install `region`.
    fn replace_clip(&mut self, region: ClipRegion);

    /// Discard the current clip and install a rectangular one.
    fn replace_clip_rect(&mut self, rectangle: Rect);

    /// A defensive copy of the current clip region. Mutating the returned
    /// value never affects the renderer's live clip.
    fn get_clip(&self) -> ClipRegion;

    /// Push a boundable context.
    fn set_boundable(&mut self, boundable: Box<dyn Boundable>);

    /// Peek the innermost boundable.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty; pushes and pops must be balanced.
    fn get_boundable(&self) -> &dyn Boundable;

    /// Pop and return the innermost boundable.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty; pushes and pops must be balanced.
    fn pop_boundable(&mut self) -> Box<dyn Boundable>;

    /// Stroke a path with the current transform and clip in force.
    fn draw_path(&mut self, pen: &Pen, path: &Path);

    /// Fill a path with the current transform and clip in force.
    fn fill_path(&mut self, brush: &Brush, path: &Path);

    /// Draw a source rectangle of an image into a destination rectangle.
    fn draw_image(&mut self, image: &ImageData, dest: Rect, src: Rect, unit: GraphicsUnit);

    /// Draw an image at its natural size.
    fn draw_image_unscaled(&mut self, image: &ImageData, location: Point);

    /// Open a pattern-rendering session.
    ///
    /// Allocates an off-screen surface of the given pixel dimensions and
    /// returns a new, independent renderer bound to it; the caller draws the
    /// pattern tile into that renderer and then calls
    /// [`end_pattern_render`](Self::end_pattern_render) on this one.
    ///
    /// # Panics
    ///
    /// Panics if a session is already open.
    fn begin_pattern_render(
        &mut self,
        width: f32,
        height: f32,
    ) -> Result<Box<dyn SvgRenderer>, RenderError>;

    /// Close the pattern-rendering session, wrapping the completed tile
    /// into a tileable brush with `pattern_matrix` as its placement
    /// transform. The brush takes the surface's pixels and the draw
    /// commands recorded into the tile; the renderer keeps no reference.
    ///
    /// # Panics
    ///
    /// Panics if no session is open.
    fn end_pattern_render(&mut self, pattern_matrix: Transform) -> Brush;
}

// ==================== Canvas Renderer ====================

/// Renderer painting onto a [`Canvas`] surface.
///
/// The abstract [`ClipRegion`] is the source of truth for clipping; every
/// clip mutation immediately re-derives the canvas clip from it, so the
/// surface never observes a stale clip. The owned surface is released when
/// the renderer drops.
pub struct CanvasRenderer {
    canvas: Canvas,
    clip_region: ClipRegion,
    boundables: Vec<Box<dyn Boundable>>,
    pattern_surface: Option<Surface>,
}

impl CanvasRenderer {
    /// Create a renderer over a freshly configured canvas bound to
    /// `surface`, with the quality defaults every output surface gets:
    /// anti-aliased text, half-pixel offset, high-quality compositing, and
    /// text contrast 1.
    pub fn from_image(surface: Surface) -> Self {
        let mut canvas = Canvas::from_surface(surface);
        canvas.set_text_rendering_hint(TextRenderingHint::AntiAlias);
        canvas.set_pixel_offset_mode(PixelOffsetMode::Half);
        canvas.set_compositing_quality(CompositingQuality::HighQuality);
        canvas.set_text_contrast(1);
        Self::from_canvas(canvas)
    }

    /// Create a renderer over an existing canvas, leaving its quality
    /// settings as they are.
    pub fn from_canvas(canvas: Canvas) -> Self {
        Self {
            canvas,
            clip_region: ClipRegion::new(),
            boundables: Vec::new(),
            pattern_surface: None,
        }
    }

    /// Create a renderer over a minimal 1x1 surface, for measurement flows
    /// that still need a real backend.
    pub fn from_null() -> Self {
        let surface = Surface::new(1, 1).expect("1x1 surface is always within limits");
        Self::from_image(surface)
    }

    /// The canvas this renderer paints onto.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Consume the renderer, handing back its canvas.
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Rebind the canvas clip from the abstract clip region.
    fn apply_clip(&mut self) {
        self.canvas.set_clip(self.clip_region.to_region());
    }
}

impl SvgRenderer for CanvasRenderer {
    fn dpi_y(&self) -> f32 {
        self.canvas.dpi_y()
    }

    fn smoothing_mode(&self) -> SmoothingMode {
        self.canvas.smoothing_mode()
    }

    fn set_smoothing_mode(&mut self, mode: SmoothingMode) {
        self.canvas.set_smoothing_mode(mode);
    }

    fn transform(&self) -> Transform {
        self.canvas.transform()
    }

    fn set_transform(&mut self, transform: Transform) {
        self.canvas.set_transform(transform);
    }

    fn rotate_transform(&mut self, degrees: f32, order: MatrixOrder) {
        self.canvas.rotate(degrees, order);
    }

    fn scale_transform(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.canvas.scale(sx, sy, order);
    }

    fn translate_transform(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        self.canvas.translate(dx, dy, order);
    }

    fn set_clip_path(&mut self, path: &Path) {
        self.clip_region.intersect(path);
        self.apply_clip();
    }

    fn set_clip_rect(&mut self, rectangle: Rect) {
        self.clip_region.intersect_rect(rectangle);
        self.apply_clip();
    }

    fn replace_clip(&mut self, region: ClipRegion) {
        self.clip_region = region;
        self.apply_clip();
    }

    fn replace_clip_rect(&mut self, rectangle: Rect) {
        self.clip_region.clear();
        self.clip_region.intersect_rect(rectangle);
        self.apply_clip();
    }

    fn get_clip(&self) -> ClipRegion {
        self.clip_region.clone()
    }

    fn set_boundable(&mut self, boundable: Box<dyn Boundable>) {
        self.boundables.push(boundable);
    }

    fn get_boundable(&self) -> &dyn Boundable {
        self.boundables
            .last()
            .expect("boundable stack is empty")
            .as_ref()
    }

    fn pop_boundable(&mut self) -> Box<dyn Boundable> {
        self.boundables.pop().expect("boundable stack is empty")
    }

    fn draw_path(&mut self, pen: &Pen, path: &Path) {
        self.canvas.stroke_path(pen, path);
    }

    fn fill_path(&mut self, brush: &Brush, path: &Path) {
        self.canvas.fill_path(brush, path);
    }

    fn draw_image(&mut self, image: &ImageData, dest: Rect, src: Rect, unit: GraphicsUnit) {
        self.canvas.draw_image(image, dest, src, unit);
    }

    fn draw_image_unscaled(&mut self, image: &ImageData, location: Point) {
        self.canvas.draw_image_unscaled(image, location);
    }

    fn begin_pattern_render(
        &mut self,
        width: f32,
        height: f32,
    ) -> Result<Box<dyn SvgRenderer>, RenderError> {
        assert!(
            self.pattern_surface.is_none(),
            "begin_pattern_render: a pattern session is already open"
        );

        let surface = Surface::new(width as u32, height as u32)?;
        debug!(width, height, "pattern render session opened");
        self.pattern_surface = Some(surface.clone());
        Ok(Box::new(CanvasRenderer::from_image(surface)))
    }

    fn end_pattern_render(&mut self, pattern_matrix: Transform) -> Brush {
        let surface = self
            .pattern_surface
            .take()
            .expect("end_pattern_render called with no open pattern session");
        let (image, scene) = surface.into_contents();
        debug!(commands = scene.len(), "pattern render session closed");
        Brush::Texture(TextureBrush::new(image, scene, pattern_matrix))
    }
}

// ==================== Null Renderer ====================

/// Renderer that paints nothing but tracks the full abstract state.
///
/// Used for measurement and introspection passes: draw calls clone the path
/// and push it through the current transform, clip mutators run the same
/// region derivation as the canvas-backed renderer, and the results are
/// discarded. Holds no resources, so dropping it is a no-op.
pub struct NullRenderer {
    transform: Transform,
    clip_region: ClipRegion,
    boundables: Vec<Box<dyn Boundable>>,
    pattern_session: Option<(u32, u32)>,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self {
            transform: Transform::identity(),
            clip_region: ClipRegion::new(),
            boundables: Vec::new(),
            pattern_session: None,
        }
    }

    /// Run the shared clip derivation and throw the result away.
    fn derive_clip(&self) {
        if let Some(region) = self.clip_region.to_region() {
            trace!(shapes = region.shapes().len(), "derived clip region");
        }
    }

    /// Exercise the transform math on a clone of `path`.
    fn probe_path(&self, path: &Path) {
        let mut probe = path.clone();
        probe.transform(&self.transform);
        trace!(bounds = ?probe.bounds(), "transformed path probe");
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgRenderer for NullRenderer {
    fn dpi_y(&self) -> f32 {
        NULL_DPI
    }

    fn smoothing_mode(&self) -> SmoothingMode {
        SmoothingMode::Default
    }

    fn set_smoothing_mode(&mut self, _mode: SmoothingMode) {}

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn rotate_transform(&mut self, degrees: f32, order: MatrixOrder) {
        self.transform.rotate(degrees, order);
    }

    fn scale_transform(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.transform.scale(sx, sy, order);
    }

    fn translate_transform(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        self.transform.translate(dx, dy, order);
    }

    fn set_clip_path(&mut self, path: &Path) {
        self.clip_region.intersect(path);
        self.derive_clip();
    }

    fn set_clip_rect(&mut self, rectangle: Rect) {
        self.clip_region.intersect_rect(rectangle);
        self.derive_clip();
    }

    fn replace_clip(&mut self, region: ClipRegion) {
        self.clip_region = region;
        self.derive_clip();
    }

    fn replace_clip_rect(&mut self, rectangle: Rect) {
        self.clip_region.clear();
        self.clip_region.intersect_rect(rectangle);
        self.derive_clip();
    }

    fn get_clip(&self) -> ClipRegion {
        self.clip_region.clone()
    }

    fn set_boundable(&mut self, boundable: Box<dyn Boundable>) {
        self.boundables.push(boundable);
    }

    fn get_boundable(&self) -> &dyn Boundable {
        self.boundables
            .last()
            .expect("boundable stack is empty")
            .as_ref()
    }

    fn pop_boundable(&mut self) -> Box<dyn Boundable> {
        self.boundables.pop().expect("boundable stack is empty")
    }

    fn draw_path(&mut self, _pen: &Pen, path: &Path) {
        self.probe_path(path);
    }

    fn fill_path(&mut self, _brush: &Brush, path: &Path) {
        self.probe_path(path);
    }

    fn draw_image(&mut self, _image: &ImageData, _dest: Rect, _src: Rect, _unit: GraphicsUnit) {}

    fn draw_image_unscaled(&mut self, _image: &ImageData, _location: Point) {}

    fn begin_pattern_render(
        &mut self,
        width: f32,
        height: f32,
    ) -> Result<Box<dyn SvgRenderer>, RenderError> {
        assert!(
            self.pattern_session.is_none(),
            "begin_pattern_render: a pattern session is already open"
        );

        // Mirror the canvas-backed allocation limits without allocating.
        let (w, h) = (width as u32, height as u32);
        if w == 0 || h == 0 || w > MAX_SURFACE_DIM || h > MAX_SURFACE_DIM {
            return Err(CanvasError::InvalidSurfaceSize {
                width: w,
                height: h,
            }
            .into());
        }

        self.pattern_session = Some((w, h));
        Ok(Box::new(NullRenderer::new()))
    }

    fn end_pattern_render(&mut self, pattern_matrix: Transform) -> Brush {
        let (width, height) = self
            .pattern_session
            .take()
            .expect("end_pattern_render called with no open pattern session");
        // Transparent tile of the recorded dimensions, with an empty scene:
        // nothing was painted, but the brush geometry matches the canvas-
        // backed renderer's.
        Brush::Texture(TextureBrush::new(
            ImageData::new(width, height),
            Vec::new(),
            pattern_matrix,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svgkit_canvas::{Color, DrawCommand};

    fn rect_path(x: f32, y: f32, w: f32, h: f32) -> Path {
        Path::from_rect(Rect::new(x, y, w, h))
    }

    // ==================== ClipRegion ====================

    #[test]
    fn test_clip_region_starts_unbounded() {
        let region = ClipRegion::new();
        assert!(region.is_empty());
        assert!(region.to_region().is_none());
    }

    #[test]
    fn test_clip_region_clear_resets_to_unbounded() {
        let mut region = ClipRegion::new();
        region.intersect_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        region.clear();
        assert!(region.to_region().is_none());
    }

    #[test]
    fn test_clip_region_exclude_copies_defensively() {
        let original = rect_path(0.0, 0.0, 10.0, 10.0);
        let mut region = ClipRegion::new();
        region.exclude(&original);

        assert!(!original.is_reversed());
        assert!(region.paths()[0].is_reversed());
    }

    #[test]
    fn test_clip_region_clone_is_independent() {
        let mut region = ClipRegion::new();
        region.intersect_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut cloned = region.clone();
        cloned.intersect_rect(Rect::new(5.0, 5.0, 10.0, 10.0));
        cloned.clear();

        assert_eq!(region.paths().len(), 1);
    }

    #[test]
    fn test_clip_region_composition_law() {
        let mut region = ClipRegion::new();
        region.intersect_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        region.exclude(&rect_path(25.0, 25.0, 50.0, 50.0));

        let derived = region.to_region().unwrap();
        assert!(derived.contains(10.0, 10.0));
        assert!(!derived.contains(50.0, 50.0));
        assert!(!derived.contains(200.0, 200.0));
    }

    // ==================== Canvas renderer ====================

    #[test]
    fn test_from_image_quality_defaults() {
        let renderer = CanvasRenderer::from_image(Surface::new(10, 10).unwrap());
        let canvas = renderer.canvas();
        assert_eq!(canvas.text_rendering_hint(), TextRenderingHint::AntiAlias);
        assert_eq!(canvas.pixel_offset_mode(), PixelOffsetMode::Half);
        assert_eq!(canvas.compositing_quality(), CompositingQuality::HighQuality);
        assert_eq!(canvas.text_contrast(), 1);
    }

    #[test]
    fn test_from_null_is_minimal_surface() {
        let renderer = CanvasRenderer::from_null();
        assert_eq!(renderer.canvas().surface().width(), 1);
        assert_eq!(renderer.canvas().surface().height(), 1);
    }

    #[test]
    fn test_set_clip_narrows() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.set_clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        renderer.set_clip_rect(Rect::new(50.0, 50.0, 100.0, 100.0));

        let bound = renderer.canvas().clip().unwrap();
        assert!(bound.contains(75.0, 75.0));
        assert!(!bound.contains(25.0, 25.0));
    }

    #[test]
    fn test_clip_applied_immediately() {
        let mut renderer = CanvasRenderer::from_null();
        assert!(renderer.canvas().clip().is_none());

        renderer.set_clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(renderer.canvas().clip().is_some());

        renderer.replace_clip(ClipRegion::new());
        assert!(renderer.canvas().clip().is_none());
    }

    #[test]
    fn test_get_clip_is_defensive_copy() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.set_clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut copy = renderer.get_clip();
        copy.clear();

        assert_eq!(renderer.get_clip().paths().len(), 1);
    }

    #[test]
    fn test_replace_clip_round_trip() {
        let mut region = ClipRegion::new();
        region.intersect_rect(Rect::new(0.0, 0.0, 40.0, 40.0));
        region.exclude(&rect_path(10.0, 10.0, 5.0, 5.0));

        let mut renderer = CanvasRenderer::from_null();
        renderer.replace_clip(region.clone());

        assert_eq!(renderer.get_clip(), region);
    }

    #[test]
    fn test_draw_records_onto_canvas() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.translate_transform(5.0, 5.0, MatrixOrder::Append);
        renderer.draw_path(&Pen::default(), &rect_path(0.0, 0.0, 10.0, 10.0));
        renderer.fill_path(&Brush::default(), &rect_path(0.0, 0.0, 10.0, 10.0));

        assert_eq!(renderer.canvas().commands().len(), 2);
    }

    #[test]
    fn test_boundable_lifo() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.set_boundable(Box::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        renderer.set_boundable(Box::new(Rect::new(0.0, 0.0, 20.0, 20.0)));

        assert_eq!(renderer.get_boundable().bounds().width, 20.0);
        assert_eq!(renderer.pop_boundable().bounds().width, 20.0);
        assert_eq!(renderer.pop_boundable().bounds().width, 10.0);
    }

    #[test]
    #[should_panic(expected = "boundable stack is empty")]
    fn test_pop_boundable_empty_panics() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.pop_boundable();
    }

    #[test]
    #[should_panic(expected = "boundable stack is empty")]
    fn test_get_boundable_empty_panics() {
        let renderer = CanvasRenderer::from_null();
        renderer.get_boundable();
    }

    // ==================== Pattern protocol ====================

    #[test]
    fn test_pattern_render_produces_texture_brush() {
        let mut renderer = CanvasRenderer::from_null();
        let mut tile = renderer.begin_pattern_render(16.0, 8.0).unwrap();
        tile.fill_path(&Brush::default(), &rect_path(0.0, 0.0, 4.0, 4.0));
        drop(tile);

        let matrix = Transform::translation(3.0, 4.0);
        match renderer.end_pattern_render(matrix) {
            Brush::Texture(brush) => {
                assert_eq!(brush.image.width, 16);
                assert_eq!(brush.image.height, 8);
                assert_eq!(brush.transform, matrix);
            }
            other => panic!("unexpected brush: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_brush_carries_tile_scene() {
        let mut renderer = CanvasRenderer::from_null();
        let mut tile = renderer.begin_pattern_render(8.0, 8.0).unwrap();
        let red = Brush::Solid(Color::from_rgb(255, 0, 0));
        tile.fill_path(&red, &rect_path(0.0, 0.0, 8.0, 8.0));
        drop(tile);

        // What was drawn into the tile must come back out in the brush.
        match renderer.end_pattern_render(Transform::identity()) {
            Brush::Texture(brush) => {
                assert_eq!(brush.scene.len(), 1);
                match &brush.scene[0] {
                    DrawCommand::FillPath { brush: fill, .. } => {
                        assert_eq!(fill.as_color(), Some(Color::from_rgb(255, 0, 0)));
                    }
                    other => panic!("unexpected command: {other:?}"),
                }
            }
            other => panic!("unexpected brush: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_render_reusable_after_end() {
        let mut renderer = CanvasRenderer::from_null();
        let _ = renderer.begin_pattern_render(4.0, 4.0).unwrap();
        let _ = renderer.end_pattern_render(Transform::identity());
        // Session closed; a new one may open.
        assert!(renderer.begin_pattern_render(4.0, 4.0).is_ok());
    }

    #[test]
    #[should_panic(expected = "pattern session is already open")]
    fn test_pattern_double_begin_panics() {
        let mut renderer = CanvasRenderer::from_null();
        let _first = renderer.begin_pattern_render(4.0, 4.0).unwrap();
        let _second = renderer.begin_pattern_render(4.0, 4.0);
    }

    #[test]
    #[should_panic(expected = "no open pattern session")]
    fn test_pattern_end_without_begin_panics() {
        let mut renderer = CanvasRenderer::from_null();
        renderer.end_pattern_render(Transform::identity());
    }

    #[test]
    fn test_pattern_invalid_size_is_error() {
        let mut renderer = CanvasRenderer::from_null();
        assert!(renderer.begin_pattern_render(0.0, 10.0).is_err());
        // A failed begin leaves no session open.
        assert!(renderer.begin_pattern_render(4.0, 4.0).is_ok());
    }

    // ==================== Null renderer ====================

    #[test]
    fn test_null_renderer_fixed_dpi() {
        assert_eq!(NullRenderer::new().dpi_y(), 72.0);
    }

    #[test]
    fn test_null_renderer_ignores_smoothing() {
        let mut renderer = NullRenderer::new();
        renderer.set_smoothing_mode(SmoothingMode::AntiAlias);
        assert_eq!(renderer.smoothing_mode(), SmoothingMode::Default);
    }

    #[test]
    fn test_null_renderer_transform_bookkeeping() {
        let mut renderer = NullRenderer::new();
        renderer.translate_transform(10.0, 0.0, MatrixOrder::Append);
        renderer.rotate_transform(90.0, MatrixOrder::Append);

        let (x, y) = renderer.transform().apply(0.0, 0.0);
        assert!((x - 10.0).abs() < 1e-4);
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn test_null_renderer_draw_is_side_effect_free() {
        let mut renderer = NullRenderer::new();
        let path = rect_path(0.0, 0.0, 10.0, 10.0);
        renderer.draw_path(&Pen::default(), &path);
        renderer.fill_path(&Brush::default(), &path);
        assert!(!path.is_reversed());
        assert_eq!(path.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    #[should_panic(expected = "pattern session is already open")]
    fn test_null_renderer_pattern_exclusivity() {
        let mut renderer = NullRenderer::new();
        let _first = renderer.begin_pattern_render(4.0, 4.0).unwrap();
        let _second = renderer.begin_pattern_render(4.0, 4.0);
    }

    #[test]
    fn test_null_renderer_pattern_brush_has_session_dimensions() {
        let mut renderer = NullRenderer::new();
        let _tile = renderer.begin_pattern_render(16.0, 8.0).unwrap();

        match renderer.end_pattern_render(Transform::identity()) {
            Brush::Texture(brush) => {
                assert_eq!(brush.image.width, 16);
                assert_eq!(brush.image.height, 8);
                assert!(brush.scene.is_empty());
            }
            other => panic!("unexpected brush: {other:?}"),
        }
    }

    #[test]
    fn test_null_renderer_pattern_size_limits_match_canvas() {
        let mut null = NullRenderer::new();
        let mut canvas = CanvasRenderer::from_null();
        assert!(null.begin_pattern_render(-1.0, 4.0).is_err());
        assert!(canvas.begin_pattern_render(-1.0, 4.0).is_err());
    }

    // ==================== Cross-implementation ====================

    #[test]
    fn test_clip_derivation_structurally_equal_across_renderers() {
        let mut canvas = CanvasRenderer::from_null();
        let mut null = NullRenderer::new();

        for renderer in [&mut canvas as &mut dyn SvgRenderer, &mut null] {
            renderer.set_clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
            let mut exclude = rect_path(25.0, 25.0, 50.0, 50.0);
            exclude.reverse();
            renderer.set_clip_path(&exclude);
        }

        assert_eq!(canvas.get_clip(), null.get_clip());
        assert_eq!(
            canvas.get_clip().to_region(),
            null.get_clip().to_region()
        );
    }
}
