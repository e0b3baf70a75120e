use crate::flat::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

///
/// A point in 2D space
///
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32
}

///
/// A rectangle described by its left, top, right and bottom edges
///
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32
}

///
/// A rectangle with elliptical corners
///
/// The radii are stored upper-left, upper-right, lower-right, lower-left, as x/y pairs
///
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct RRect {
    pub rect:   Rect,
    pub radii:  [Point; 4]
}

///
/// A 3x3 transformation matrix, stored row-major as scale x, skew x, translate x, skew y, scale y, translate y, persp 0, persp 1, persp 2
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Matrix(pub [f32; 9]);

///
/// A 4x4 transformation matrix, stored column-major
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct M44(pub [f32; 16]);

///
/// A 3-component vector (used for shadow light positions)
///
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32
}

///
/// A 32-bit ARGB color, not premultiplied
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Color(pub u32);

///
/// A color with floating point components, not premultiplied
///
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Color4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32
}

///
/// How a clip shape combines with the existing clip region
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ClipOp {
    Difference,
    Intersect
}

impl Point {
    #[inline] pub fn new(x: f32, y: f32) -> Point { Point { x, y } }
}

impl Rect {
    #[inline]
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect { left, top, right, bottom }
    }

    ///
    /// Creates a rectangle from an origin and a size
    ///
    #[inline]
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect { left: x, top: y, right: x + width, bottom: y + height }
    }

    #[inline] pub fn width(&self) -> f32 { self.right - self.left }
    #[inline] pub fn height(&self) -> f32 { self.bottom - self.top }

    ///
    /// True if all of the coordinates are finite numbers
    ///
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite()
    }

    ///
    /// True if left <= right and top <= bottom
    ///
    pub fn is_sorted(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }
}

impl RRect {
    ///
    /// Creates a round rect where every corner has the same radii
    ///
    pub fn new(rect: Rect, rx: f32, ry: f32) -> RRect {
        RRect { rect: rect, radii: [Point::new(rx, ry); 4] }
    }

    ///
    /// Creates a round rect with square corners
    ///
    pub fn from_rect(rect: Rect) -> RRect {
        RRect::new(rect, 0.0, 0.0)
    }

    ///
    /// True if the bounds have no area
    ///
    pub fn is_empty(&self) -> bool {
        !(self.rect.width() > 0.0) || !(self.rect.height() > 0.0)
    }

    ///
    /// True if every corner is square
    ///
    pub fn is_rect(&self) -> bool {
        self.radii.iter().all(|radius| radius.x == 0.0 || radius.y == 0.0)
    }

    ///
    /// True if the corners meet in the middle of each edge, making this an ellipse
    ///
    pub fn is_oval(&self) -> bool {
        let half_w = self.rect.width() / 2.0;
        let half_h = self.rect.height() / 2.0;

        !self.is_empty() && self.radii.iter().all(|radius| radius.x >= half_w && radius.y >= half_h)
    }

    ///
    /// True if this has finite, sorted bounds and non-negative radii that fit inside it
    ///
    pub fn is_valid(&self) -> bool {
        if !self.rect.is_finite() || !self.rect.is_sorted() {
            return false;
        }

        let width   = self.rect.width();
        let height  = self.rect.height();

        self.radii.iter().all(|radius| radius.x.is_finite() && radius.y.is_finite() && radius.x >= 0.0 && radius.y >= 0.0)
            && self.radii[0].x + self.radii[1].x <= width
            && self.radii[3].x + self.radii[2].x <= width
            && self.radii[0].y + self.radii[3].y <= height
            && self.radii[1].y + self.radii[2].y <= height
    }
}

impl Default for Matrix {
    fn default() -> Matrix { Matrix::identity() }
}

impl Matrix {
    #[inline]
    pub fn identity() -> Matrix {
        Matrix([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    #[inline]
    pub fn translate(dx: f32, dy: f32) -> Matrix {
        Matrix([1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0])
    }

    #[inline]
    pub fn scale(sx: f32, sy: f32) -> Matrix {
        Matrix([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    ///
    /// True if this matrix makes no change to the coordinates it's applied to
    ///
    pub fn is_identity(&self) -> bool {
        *self == Matrix::identity()
    }
}

impl Default for M44 {
    fn default() -> M44 {
        M44([1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, 0.0, 0.0, 1.0])
    }
}

impl M44 {
    ///
    /// Drops the z row and column to produce a 3x3 matrix
    ///
    pub fn to_matrix(&self) -> Matrix {
        let m = &self.0;
        Matrix([m[0], m[4], m[12], m[1], m[5], m[13], m[3], m[7], m[15]])
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color(0x00000000);
    pub const BLACK: Color = Color(0xff000000);
    pub const WHITE: Color = Color(0xffffffff);
    pub const RED: Color = Color(0xffff0000);
    pub const GREEN: Color = Color(0xff00ff00);
    pub const BLUE: Color = Color(0xff0000ff);

    #[inline]
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Color {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    #[inline] pub fn alpha(&self) -> u8 { (self.0 >> 24) as u8 }
    #[inline] pub fn red(&self) -> u8 { (self.0 >> 16) as u8 }
    #[inline] pub fn green(&self) -> u8 { (self.0 >> 8) as u8 }
    #[inline] pub fn blue(&self) -> u8 { self.0 as u8 }
}

impl From<Color> for Color4f {
    fn from(color: Color) -> Color4f {
        Color4f {
            r: (color.red() as f32) / 255.0,
            g: (color.green() as f32) / 255.0,
            b: (color.blue() as f32) / 255.0,
            a: (color.alpha() as f32) / 255.0,
        }
    }
}

impl Color4f {
    ///
    /// Converts to a 32-bit color, clamping each component to the range 0-1
    ///
    pub fn to_color(&self) -> Color {
        let component = |val: f32| (val.max(0.0).min(1.0) * 255.0 + 0.5) as u8;

        Color::from_argb(component(self.a), component(self.r), component(self.g), component(self.b))
    }
}

impl ClipOp {
    ///
    /// Decodes the clip op from a packed clip word (only the low nibble is significant)
    ///
    pub fn from_packed(packed: u32) -> ClipOp {
        if packed & 0xf == 0 {
            ClipOp::Difference
        } else {
            ClipOp::Intersect
        }
    }

    pub fn to_packed(self) -> u32 {
        match self {
            ClipOp::Difference  => 0,
            ClipOp::Intersect   => 1
        }
    }
}

impl FlatEncoding for Point {
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_point(*self); }
}

impl FlatEncoding for Rect {
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_rect(*self); }
}

impl FlatEncoding for Color {
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_color(*self); }
}

impl FlatEncoding for Color4f {
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_color4f(*self); }
}

impl FlatEncoding for Point3 {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        (self.x, self.y, self.z).write_flat(buffer);
    }
}

impl FlatEncoding for RRect {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        buffer.write_rect(self.rect);
        for radius in self.radii.iter() {
            buffer.write_point(*radius);
        }
    }
}

impl FlatEncoding for Matrix {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.iter().for_each(|val| buffer.write_f32(*val));
    }
}

impl FlatEncoding for M44 {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.iter().for_each(|val| buffer.write_f32(*val));
    }
}

impl FlatDecoding for Point {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Point> {
        let point = buffer.read_point();
        if buffer.is_valid() { Some(point) } else { None }
    }
}

impl FlatDecoding for Rect {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Rect> {
        let rect = buffer.read_rect();
        if buffer.is_valid() { Some(rect) } else { None }
    }
}

impl FlatDecoding for Point3 {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Point3> {
        let x = buffer.read_f32();
        let y = buffer.read_f32();
        let z = buffer.read_f32();

        if buffer.is_valid() { Some(Point3 { x, y, z }) } else { None }
    }
}

impl FlatDecoding for RRect {
    fn read_flat(buffer: &mut ReadCursor) -> Option<RRect> {
        let rect        = buffer.read_rect();
        let mut radii   = [Point::default(); 4];
        for radius in radii.iter_mut() {
            *radius = buffer.read_point();
        }

        let rrect = RRect { rect, radii };
        if buffer.validate(rrect.is_valid()) { Some(rrect) } else { None }
    }
}

impl FlatDecoding for Matrix {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Matrix> {
        let mut values = [0.0; 9];
        for val in values.iter_mut() {
            *val = buffer.read_f32();
        }

        if buffer.is_valid() { Some(Matrix(values)) } else { None }
    }
}

impl FlatDecoding for M44 {
    fn read_flat(buffer: &mut ReadCursor) -> Option<M44> {
        let mut values = [0.0; 16];
        for val in values.iter_mut() {
            *val = buffer.read_f32();
        }

        if buffer.is_valid() { Some(M44(values)) } else { None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clip_op_uses_low_nibble() {
        assert!(ClipOp::from_packed(0x10) == ClipOp::Difference);
        assert!(ClipOp::from_packed(0x01) == ClipOp::Intersect);
        assert!(ClipOp::from_packed(0x02) == ClipOp::Intersect);
    }

    #[test]
    fn rrect_with_oversized_radii_is_invalid() {
        let rrect = RRect::new(Rect::new(0.0, 0.0, 10.0, 10.0), 6.0, 2.0);
        assert!(!rrect.is_valid());

        let rrect = RRect::new(Rect::new(0.0, 0.0, 10.0, 10.0), 5.0, 2.0);
        assert!(rrect.is_valid());
    }

    #[test]
    fn rrect_rejected_when_unsorted() {
        let mut buffer = WriteCursor::new();
        RRect::from_rect(Rect::new(10.0, 0.0, 0.0, 10.0)).write_flat(&mut buffer);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);
        assert!(RRect::read_flat(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn matrix_layout() {
        let mut buffer = WriteCursor::new();
        Matrix::translate(3.0, 4.0).write_flat(&mut buffer);

        let bytes = buffer.into_bytes();
        assert!(bytes.len() == 36);
        assert!(bytes[8..12] == 3.0f32.to_le_bytes());
        assert!(bytes[20..24] == 4.0f32.to_le_bytes());

        let mut rc = ReadCursor::new(&bytes);
        assert!(Matrix::read_flat(&mut rc) == Some(Matrix::translate(3.0, 4.0)));
    }

    #[test]
    fn m44_to_matrix_keeps_translation() {
        let mut m44 = M44::default();
        m44.0[12]   = 5.0;
        m44.0[13]   = 6.0;

        assert!(m44.to_matrix() == Matrix::translate(5.0, 6.0));
    }

    #[test]
    fn rrect_shapes() {
        let rect = Rect::new(0.0, 0.0, 10.0, 20.0);

        assert!(RRect::from_rect(rect).is_rect());
        assert!(RRect::new(rect, 5.0, 10.0).is_oval());
        assert!(!RRect::new(rect, 2.0, 2.0).is_oval());
        assert!(RRect::from_rect(Rect::new(0.0, 0.0, 0.0, 10.0)).is_empty());
    }

    #[test]
    fn color_components() {
        let color = Color::from_argb(0x80, 1, 2, 3);
        assert!(color.0 == 0x80010203);
        assert!(Color4f::from(Color::RED).to_color() == Color::RED);
    }
}
