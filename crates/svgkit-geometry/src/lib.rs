//! # svgkit Geometry
//!
//! 2D geometry primitives for the svgkit rendering pipeline.
//!
//! ## Features
//!
//! - **Transform**: 2D affine matrix with explicit combine order
//! - **Path**: command-based paths with winding-sense reversal
//! - **Region**: clip regions composed from paths by intersection
//! - **Containment**: nonzero-winding point queries
//!
//! ## Architecture
//!
//! ```text
//! Path (MoveTo / LineTo / QuadTo / CurveTo / Close)
//!    ├── transform(&Transform)      map every coordinate
//!    ├── reverse()                  flip winding sense
//!    └── contains(x, y)             nonzero winding query
//!           │
//!           ▼
//! Region (ordered paths, intersect-in-place)
//! ```

// ==================== Point & Rect ====================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2D rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

// ==================== Transform ====================

/// Combine order for transform mutations.
///
/// `Append` applies the new operation in the current local coordinate
/// space (the new matrix is post-multiplied); `Prepend` applies it in the
/// parent/world space (pre-multiplied). Nested coordinate systems use
/// `Append`, which is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixOrder {
    #[default]
    Append,
    Prepend,
}

/// 2D affine transformation matrix.
/// Represents: [a c e]
///             [b d f]
///             [0 0 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create identity transform.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Create a rotation matrix (radians).
    pub fn rotation(angle: f32) -> Self {
        let cos = angle.cos();
        let sin = angle.sin();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Multiply two transforms (`self` applied after `other`).
    pub fn multiply(&self, other: &Transform) -> Self {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Get inverse transform.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Transform {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            e: (self.c * self.f - self.d * self.e) * inv_det,
            f: (self.b * self.e - self.a * self.f) * inv_det,
        })
    }

    /// Combine another matrix into this one with the given order.
    pub fn combine(&mut self, other: &Transform, order: MatrixOrder) {
        *self = match order {
            MatrixOrder::Append => self.multiply(other),
            MatrixOrder::Prepend => other.multiply(self),
        };
    }

    /// Rotate by an angle in degrees.
    pub fn rotate(&mut self, degrees: f32, order: MatrixOrder) {
        self.combine(&Transform::rotation(degrees.to_radians()), order);
    }

    /// Scale by the given factors.
    pub fn scale(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.combine(&Transform::scaling(sx, sy), order);
    }

    /// Translate by the given offsets.
    pub fn translate(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        self.combine(&Transform::translation(dx, dy), order);
    }
}

// ==================== Path ====================

/// Path command.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
    Close,
}

/// Winding sense of a path.
///
/// Reversing a path flips its sense: a `Reversed` path contributes its
/// complement when composed into a [`Region`], which is how exclusion
/// (subtractive) clips are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindingSense {
    #[default]
    Normal,
    Reversed,
}

/// A 2D path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    sense: WindingSense,
}

impl Path {
    /// Create a new empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a closed rectangular path.
    pub fn from_rect(rect: Rect) -> Self {
        let mut path = Path::new();
        path.rect(rect.x, rect.y, rect.width, rect.height);
        path
    }

    /// Move to a point, starting a new contour.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::MoveTo(x, y));
    }

    /// Draw a line to a point.
    pub fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(PathCommand::LineTo(x, y));
    }

    /// Draw a quadratic bezier curve.
    pub fn quad_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::QuadTo(cpx, cpy, x, y));
    }

    /// Draw a cubic bezier curve.
    pub fn curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        self.commands.push(PathCommand::CurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    /// Add a closed rectangular contour.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close();
    }

    /// Close the current contour.
    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    /// Get the commands.
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if path is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Winding sense of the path.
    pub fn sense(&self) -> WindingSense {
        self.sense
    }

    /// Whether the path has been reversed.
    pub fn is_reversed(&self) -> bool {
        self.sense == WindingSense::Reversed
    }

    /// Reverse the path.
    ///
    /// Flips the winding sense and retraces every contour in the opposite
    /// direction, swapping bezier control points as needed. The outline is
    /// geometrically unchanged.
    pub fn reverse(&mut self) {
        self.sense = match self.sense {
            WindingSense::Normal => WindingSense::Reversed,
            WindingSense::Reversed => WindingSense::Normal,
        };

        let contours = split_contours(&self.commands);
        let mut commands = Vec::with_capacity(self.commands.len());
        for contour in &contours {
            emit_reversed(contour, &mut commands);
        }
        self.commands = commands;
    }

    /// Apply a transform to every coordinate in place.
    pub fn transform(&mut self, m: &Transform) {
        for cmd in &mut self.commands {
            match cmd {
                PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => {
                    let (tx, ty) = m.apply(*x, *y);
                    *x = tx;
                    *y = ty;
                }
                PathCommand::QuadTo(cx, cy, x, y) => {
                    let (tcx, tcy) = m.apply(*cx, *cy);
                    let (tx, ty) = m.apply(*x, *y);
                    *cx = tcx;
                    *cy = tcy;
                    *x = tx;
                    *y = ty;
                }
                PathCommand::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                    let (t1x, t1y) = m.apply(*c1x, *c1y);
                    let (t2x, t2y) = m.apply(*c2x, *c2y);
                    let (tx, ty) = m.apply(*x, *y);
                    *c1x = t1x;
                    *c1y = t1y;
                    *c2x = t2x;
                    *c2y = t2y;
                    *x = tx;
                    *y = ty;
                }
                PathCommand::Close => {}
            }
        }
    }

    /// Flatten to polyline contours.
    pub fn to_segments(&self) -> Vec<Vec<(f32, f32)>> {
        let mut segments = Vec::new();
        let mut current_segment: Vec<(f32, f32)> = Vec::new();
        let mut current = (0.0_f32, 0.0_f32);
        let mut start = (0.0_f32, 0.0_f32);

        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(x, y) => {
                    if !current_segment.is_empty() {
                        segments.push(std::mem::take(&mut current_segment));
                    }
                    current = (*x, *y);
                    start = current;
                    current_segment.push(current);
                }
                PathCommand::LineTo(x, y) => {
                    current = (*x, *y);
                    current_segment.push(current);
                }
                PathCommand::QuadTo(cpx, cpy, x, y) => {
                    let points = quadratic_bezier_points(current, (*cpx, *cpy), (*x, *y), 20);
                    current_segment.extend(points);
                    current = (*x, *y);
                }
                PathCommand::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                    let points = cubic_bezier_points(
                        current,
                        (*c1x, *c1y),
                        (*c2x, *c2y),
                        (*x, *y),
                        20,
                    );
                    current_segment.extend(points);
                    current = (*x, *y);
                }
                PathCommand::Close => {
                    if !current_segment.is_empty() {
                        current_segment.push(start);
                        segments.push(std::mem::take(&mut current_segment));
                    }
                    current = start;
                }
            }
        }

        if !current_segment.is_empty() {
            segments.push(current_segment);
        }

        segments
    }

    /// Nonzero-winding containment query on the path geometry.
    ///
    /// The winding sense is not consulted here; [`Region`] applies it when
    /// composing shapes.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        point_in_segments(&self.to_segments(), x, y)
    }

    /// Bounding box of the flattened outline.
    pub fn bounds(&self) -> Rect {
        let segments = self.to_segments();
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        let mut any = false;

        for segment in &segments {
            for &(px, py) in segment {
                min_x = min_x.min(px);
                min_y = min_y.min(py);
                max_x = max_x.max(px);
                max_y = max_y.max(py);
                any = true;
            }
        }

        if !any {
            return Rect::zero();
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

// ==================== Region ====================

/// A clip region composed from paths.
///
/// Shapes are combined by intersection in insertion order. A shape with a
/// reversed winding sense contributes its complement, carving its interior
/// out of the region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    shapes: Vec<Path>,
}

impl Region {
    /// Create a region covering the interior of a path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            shapes: vec![path.clone()],
        }
    }

    /// Create a rectangular region.
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_path(&Path::from_rect(rect))
    }

    /// Intersect a path into the region in place.
    pub fn intersect(&mut self, path: &Path) {
        self.shapes.push(path.clone());
    }

    /// Intersect a rectangle into the region in place.
    pub fn intersect_rect(&mut self, rect: Rect) {
        self.intersect(&Path::from_rect(rect));
    }

    /// The shapes composing this region, in insertion order.
    pub fn shapes(&self) -> &[Path] {
        &self.shapes
    }

    /// Whether the point lies inside the composed region.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.shapes.iter().all(|shape| match shape.sense() {
            WindingSense::Normal => shape.contains(x, y),
            WindingSense::Reversed => !shape.contains(x, y),
        })
    }
}

// ==================== Contour Helpers ====================

/// One segment of a contour; the endpoint is always last.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Line(f32, f32),
    Quad(f32, f32, f32, f32),
    Cubic(f32, f32, f32, f32, f32, f32),
}

impl Segment {
    fn end(&self) -> (f32, f32) {
        match *self {
            Segment::Line(x, y) => (x, y),
            Segment::Quad(_, _, x, y) => (x, y),
            Segment::Cubic(_, _, _, _, x, y) => (x, y),
        }
    }
}

#[derive(Debug, Clone)]
struct Contour {
    start: (f32, f32),
    segments: Vec<Segment>,
    closed: bool,
}

fn split_contours(commands: &[PathCommand]) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut current: Option<Contour> = None;

    for cmd in commands {
        match cmd {
            PathCommand::MoveTo(x, y) => {
                if let Some(contour) = current.take() {
                    contours.push(contour);
                }
                current = Some(Contour {
                    start: (*x, *y),
                    segments: Vec::new(),
                    closed: false,
                });
            }
            PathCommand::LineTo(x, y) => {
                if let Some(contour) = current.as_mut() {
                    contour.segments.push(Segment::Line(*x, *y));
                }
            }
            PathCommand::QuadTo(cx, cy, x, y) => {
                if let Some(contour) = current.as_mut() {
                    contour.segments.push(Segment::Quad(*cx, *cy, *x, *y));
                }
            }
            PathCommand::CurveTo(c1x, c1y, c2x, c2y, x, y) => {
                if let Some(contour) = current.as_mut() {
                    contour
                        .segments
                        .push(Segment::Cubic(*c1x, *c1y, *c2x, *c2y, *x, *y));
                }
            }
            PathCommand::Close => {
                if let Some(mut contour) = current.take() {
                    contour.closed = true;
                    contours.push(contour);
                }
            }
        }
    }

    if let Some(contour) = current.take() {
        contours.push(contour);
    }

    contours
}

/// Emit a contour retraced in the opposite direction.
fn emit_reversed(contour: &Contour, out: &mut Vec<PathCommand>) {
    // Endpoint of segment i-1 (or the start point for i == 0) becomes the
    // target of reversed segment i.
    let mut points = Vec::with_capacity(contour.segments.len() + 1);
    points.push(contour.start);
    for segment in &contour.segments {
        points.push(segment.end());
    }

    let last = *points.last().unwrap_or(&contour.start);
    out.push(PathCommand::MoveTo(last.0, last.1));

    for (i, segment) in contour.segments.iter().enumerate().rev() {
        let (tx, ty) = points[i];
        match *segment {
            Segment::Line(_, _) => out.push(PathCommand::LineTo(tx, ty)),
            Segment::Quad(cx, cy, _, _) => out.push(PathCommand::QuadTo(cx, cy, tx, ty)),
            Segment::Cubic(c1x, c1y, c2x, c2y, _, _) => {
                out.push(PathCommand::CurveTo(c2x, c2y, c1x, c1y, tx, ty))
            }
        }
    }

    if contour.closed {
        out.push(PathCommand::Close);
    }
}

// ==================== Flattening Helpers ====================

/// Generate points along a quadratic bezier curve.
fn quadratic_bezier_points(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    segments: usize,
) -> Vec<(f32, f32)> {
    let mut points = Vec::with_capacity(segments);

    for i in 1..=segments {
        let t = i as f32 / segments as f32;
        let mt = 1.0 - t;

        let x = mt * mt * p0.0 + 2.0 * mt * t * p1.0 + t * t * p2.0;
        let y = mt * mt * p0.1 + 2.0 * mt * t * p1.1 + t * t * p2.1;

        points.push((x, y));
    }

    points
}

/// Generate points along a cubic bezier curve.
fn cubic_bezier_points(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    segments: usize,
) -> Vec<(f32, f32)> {
    let mut points = Vec::with_capacity(segments);

    for i in 1..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.0 + 3.0 * mt2 * t * p1.0 + 3.0 * mt * t2 * p2.0 + t3 * p3.0;
        let y = mt3 * p0.1 + 3.0 * mt2 * t * p1.1 + 3.0 * mt * t2 * p2.1 + t3 * p3.1;

        points.push((x, y));
    }

    points
}

/// Check if point is inside flattened contours using the winding number.
fn point_in_segments(segments: &[Vec<(f32, f32)>], x: f32, y: f32) -> bool {
    let mut winding = 0;

    for segment in segments {
        if segment.len() < 2 {
            continue;
        }

        for i in 0..segment.len() - 1 {
            let (x1, y1) = segment[i];
            let (x2, y2) = segment[i + 1];

            if y1 <= y {
                if y2 > y {
                    let vt = (y - y1) / (y2 - y1);
                    if x < x1 + vt * (x2 - x1) {
                        winding += 1;
                    }
                }
            } else if y2 <= y {
                let vt = (y - y1) / (y2 - y1);
                if x < x1 + vt * (x2 - x1) {
                    winding -= 1;
                }
            }
        }
    }

    winding != 0
}
