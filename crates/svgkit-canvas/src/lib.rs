//! # svgkit Canvas
//!
//! Command-recording 2D drawing surface for the svgkit rendering pipeline.
//!
//! ## Features
//!
//! - **Canvas**: drawing surface with transform, clip, and quality state
//! - **Styles**: pens for strokes, solid and texture brushes for fills
//! - **Surfaces**: shared off-screen pixel buffers
//! - **Recording**: draw calls become commands, not pixels
//!
//! ## Architecture
//!
//! ```text
//! Canvas
//!    ├── Surface (RGBA pixel buffer + DrawCommand log)
//!    ├── Transform
//!    ├── Clip (Region)
//!    └── Quality state (smoothing, pixel offset, ...)
//! ```
//!
//! Rasterization is out of scope here: every draw call snapshots the state
//! in force and appends a [`DrawCommand`] to the surface, which a downstream
//! engine turns into pixels. The log lives on the [`Surface`], so anyone
//! holding a handle to it can reclaim what was drawn, even after the canvas
//! that did the drawing is gone.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use svgkit_geometry::{MatrixOrder, Path, Point, Rect, Region, Transform};
use thiserror::Error;
use tracing::trace;

/// Largest surface edge the canvas will allocate, in pixels.
pub const MAX_SURFACE_DIM: u32 = 16_384;

// ==================== Errors ====================

/// Errors that can occur in canvas operations.
#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },
}

// ==================== Color ====================

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };

    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

// ==================== Styles ====================

/// Stroke style.
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: f32,
}

impl Pen {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

/// A tileable brush painting an image, with its own placement transform.
///
/// The transform maps brush tile space into the coordinate space of the
/// consuming draw call. `scene` holds the draw commands recorded while the
/// tile was produced, so a downstream engine can rasterize the tile at any
/// resolution instead of sampling `image`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBrush {
    pub image: ImageData,
    pub scene: Vec<DrawCommand>,
    pub transform: Transform,
}

impl TextureBrush {
    pub fn new(image: ImageData, scene: Vec<DrawCommand>, transform: Transform) -> Self {
        Self {
            image,
            scene,
            transform,
        }
    }
}

/// Fill style.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    /// Solid color.
    Solid(Color),
    /// Tiled image.
    Texture(TextureBrush),
}

impl Default for Brush {
    fn default() -> Self {
        Brush::Solid(Color::BLACK)
    }
}

impl Brush {
    /// Get solid color if applicable.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Brush::Solid(c) => Some(*c),
            _ => None,
        }
    }
}

// ==================== Units & Quality ====================

/// Unit of measure for image rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphicsUnit {
    #[default]
    Pixel,
    Point,
    Inch,
    Millimeter,
    Document,
}

/// Smoothing (anti-aliasing) mode for shape edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingMode {
    #[default]
    Default,
    HighSpeed,
    HighQuality,
    None,
    AntiAlias,
}

/// Text rendering quality hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderingHint {
    #[default]
    SystemDefault,
    AntiAlias,
    ClearType,
}

/// Pixel offset mode for coordinate snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelOffsetMode {
    #[default]
    Default,
    None,
    Half,
}

/// Compositing quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositingQuality {
    #[default]
    Default,
    HighSpeed,
    HighQuality,
}

// ==================== Image Data ====================

/// Raw pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGBA format
}

impl ImageData {
    /// Create new image data with all pixels transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height * 4) as usize;
        Self {
            width,
            height,
            data: vec![0; size],
        }
    }

    /// Get pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        Some(Color {
            r: self.data[idx],
            g: self.data[idx + 1],
            b: self.data[idx + 2],
            a: self.data[idx + 3] as f32 / 255.0,
        })
    }

    /// Set pixel at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        self.data[idx] = color.r;
        self.data[idx + 1] = color.g;
        self.data[idx + 2] = color.b;
        self.data[idx + 3] = (color.a * 255.0) as u8;
    }

    /// Bounding rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

// ==================== Surface ====================

/// Backing store of a surface: the pixels plus everything drawn onto them.
#[derive(Debug)]
struct SurfaceData {
    image: ImageData,
    commands: Vec<DrawCommand>,
}

/// A shared handle over an off-screen buffer.
///
/// The buffer holds the RGBA pixels and the [`DrawCommand`] log of every
/// canvas that has drawn into it. Cloning the handle shares the buffer; it
/// is freed when the last handle drops.
#[derive(Debug, Clone)]
pub struct Surface {
    data: Rc<RefCell<SurfaceData>>,
}

impl Surface {
    /// Allocate a new surface of the given pixel dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 || width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
            return Err(CanvasError::InvalidSurfaceSize { width, height });
        }
        Ok(Self {
            data: Rc::new(RefCell::new(SurfaceData {
                image: ImageData::new(width, height),
                commands: Vec::new(),
            })),
        })
    }

    pub fn width(&self) -> u32 {
        self.data.borrow().image.width
    }

    pub fn height(&self) -> u32 {
        self.data.borrow().image.height
    }

    /// Run a closure against the backing pixels.
    pub fn with_image<R>(&self, f: impl FnOnce(&ImageData) -> R) -> R {
        f(&self.data.borrow().image)
    }

    /// Take the backing pixels out of the surface, discarding the log.
    ///
    /// If this is the last handle the buffer moves out without copying;
    /// otherwise the pixels are value-copied so no aliasing remains.
    pub fn into_image(self) -> ImageData {
        self.into_contents().0
    }

    /// Take the backing pixels and the recorded draw commands out of the
    /// surface.
    ///
    /// If this is the last handle both move out without copying; otherwise
    /// they are value-copied so no aliasing remains.
    pub fn into_contents(self) -> (ImageData, Vec<DrawCommand>) {
        match Rc::try_unwrap(self.data) {
            Ok(cell) => {
                let data = cell.into_inner();
                (data.image, data.commands)
            }
            Err(shared) => {
                let data = shared.borrow();
                (data.image.clone(), data.commands.clone())
            }
        }
    }
}

// ==================== Draw Command ====================

/// A recorded drawing operation, snapshotting the state in force.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Stroke a path.
    StrokePath {
        path: Path,
        pen: Pen,
        transform: Transform,
        clip: Option<Region>,
    },
    /// Fill a path.
    FillPath {
        path: Path,
        brush: Brush,
        transform: Transform,
        clip: Option<Region>,
    },
    /// Draw a source rectangle of an image into a destination rectangle.
    DrawImage {
        image: ImageData,
        dest: Rect,
        src: Rect,
        unit: GraphicsUnit,
        transform: Transform,
        clip: Option<Region>,
    },
    /// Draw an image at its natural size.
    DrawImageUnscaled {
        image: ImageData,
        location: Point,
        transform: Transform,
        clip: Option<Region>,
    },
}

// ==================== Canvas ====================

/// A drawing surface with transform, clip, and quality state.
///
/// The canvas holds its [`Surface`] for its lifetime and records draw
/// commands into it; the buffer is released when the last handle drops.
#[derive(Debug)]
pub struct Canvas {
    surface: Surface,
    transform: Transform,
    clip: Option<Region>,
    smoothing: SmoothingMode,
    text_rendering: TextRenderingHint,
    pixel_offset: PixelOffsetMode,
    compositing: CompositingQuality,
    text_contrast: u32,
    dpi_y: f32,
}

/// Default vertical resolution of a canvas surface.
pub const DEFAULT_DPI: f32 = 96.0;

impl Canvas {
    /// Allocate a fresh surface and wrap it in a canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        Ok(Self::from_surface(Surface::new(width, height)?))
    }

    /// Create a canvas over an existing surface.
    pub fn from_surface(surface: Surface) -> Self {
        Self {
            surface,
            transform: Transform::identity(),
            clip: None,
            smoothing: SmoothingMode::Default,
            text_rendering: TextRenderingHint::SystemDefault,
            pixel_offset: PixelOffsetMode::Default,
            compositing: CompositingQuality::Default,
            text_contrast: 4,
            dpi_y: DEFAULT_DPI,
        }
    }

    /// The surface this canvas draws into.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Vertical resolution in dots per inch.
    pub fn dpi_y(&self) -> f32 {
        self.dpi_y
    }

    pub fn set_dpi_y(&mut self, dpi: f32) {
        self.dpi_y = dpi;
    }

    // ==================== Transform ====================

    /// Get the current transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Replace the transform wholesale.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Rotate the transform by degrees with the given combine order.
    pub fn rotate(&mut self, degrees: f32, order: MatrixOrder) {
        self.transform.rotate(degrees, order);
    }

    /// Scale the transform with the given combine order.
    pub fn scale(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.transform.scale(sx, sy, order);
    }

    /// Translate the transform with the given combine order.
    pub fn translate(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        self.transform.translate(dx, dy, order);
    }

    // ==================== Clip ====================

    /// The clip currently bound to the surface, if any.
    pub fn clip(&self) -> Option<&Region> {
        self.clip.as_ref()
    }

    /// Bind a clip region to the surface; `None` means unbounded.
    pub fn set_clip(&mut self, clip: Option<Region>) {
        trace!(bounded = clip.is_some(), "canvas clip rebound");
        self.clip = clip;
    }

    /// Reset the clip to unbounded.
    pub fn reset_clip(&mut self) {
        self.clip = None;
    }

    // ==================== Quality ====================

    pub fn smoothing_mode(&self) -> SmoothingMode {
        self.smoothing
    }

    pub fn set_smoothing_mode(&mut self, mode: SmoothingMode) {
        self.smoothing = mode;
    }

    pub fn text_rendering_hint(&self) -> TextRenderingHint {
        self.text_rendering
    }

    pub fn set_text_rendering_hint(&mut self, hint: TextRenderingHint) {
        self.text_rendering = hint;
    }

    pub fn pixel_offset_mode(&self) -> PixelOffsetMode {
        self.pixel_offset
    }

    pub fn set_pixel_offset_mode(&mut self, mode: PixelOffsetMode) {
        self.pixel_offset = mode;
    }

    pub fn compositing_quality(&self) -> CompositingQuality {
        self.compositing
    }

    pub fn set_compositing_quality(&mut self, quality: CompositingQuality) {
        self.compositing = quality;
    }

    pub fn text_contrast(&self) -> u32 {
        self.text_contrast
    }

    pub fn set_text_contrast(&mut self, contrast: u32) {
        self.text_contrast = contrast;
    }

    // ==================== Drawing ====================

    fn record(&mut self, command: DrawCommand) {
        self.surface.data.borrow_mut().commands.push(command);
    }

    /// Stroke a path with a pen.
    pub fn stroke_path(&mut self, pen: &Pen, path: &Path) {
        self.record(DrawCommand::StrokePath {
            path: path.clone(),
            pen: pen.clone(),
            transform: self.transform,
            clip: self.clip.clone(),
        });
    }

    /// Fill a path with a brush.
    pub fn fill_path(&mut self, brush: &Brush, path: &Path) {
        self.record(DrawCommand::FillPath {
            path: path.clone(),
            brush: brush.clone(),
            transform: self.transform,
            clip: self.clip.clone(),
        });
    }

    /// Draw a source rectangle of an image into a destination rectangle.
    pub fn draw_image(&mut self, image: &ImageData, dest: Rect, src: Rect, unit: GraphicsUnit) {
        self.record(DrawCommand::DrawImage {
            image: image.clone(),
            dest,
            src,
            unit,
            transform: self.transform,
            clip: self.clip.clone(),
        });
    }

    /// Draw an image at its natural size.
    pub fn draw_image_unscaled(&mut self, image: &ImageData, location: Point) {
        self.record(DrawCommand::DrawImageUnscaled {
            image: image.clone(),
            location,
            transform: self.transform,
            clip: self.clip.clone(),
        });
    }

    // ==================== Output ====================

    /// Borrow the commands recorded onto the surface, without clearing.
    pub fn commands(&self) -> Ref<'_, [DrawCommand]> {
        Ref::map(self.surface.data.borrow(), |data| data.commands.as_slice())
    }

    /// Take the recorded commands, leaving the surface log empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.surface.data.borrow_mut().commands)
    }
}
