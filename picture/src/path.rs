use crate::flat::*;
use crate::geometry::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use itertools::*;

// Packed path header layout
const TYPE_SHIFT: u32           = 28;
const DIRECTION_SHIFT: u32      = 26;
const FILL_TYPE_SHIFT: u32      = 8;
const VERSION_MASK: u32         = 0xff;

const VERBS_REVERSED_VERSION: u32   = 4;
const VERBS_FORWARD_VERSION: u32    = 5;

const GENERAL_PATH: u32         = 0;
const RRECT_PATH: u32           = 1;

/// Weight of the conics used to make a quarter circle
const QUARTER_CIRCLE_WEIGHT: f32 = std::f32::consts::FRAC_1_SQRT_2;

const VERB_MOVE: u8     = 0;
const VERB_LINE: u8     = 1;
const VERB_QUAD: u8     = 2;
const VERB_CONIC: u8    = 3;
const VERB_CUBIC: u8    = 4;
const VERB_CLOSE: u8    = 5;

///
/// Operations that define paths
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum PathOp {
    /// Begins a new subpath at a point
    Move(Point),

    /// Line to point
    Line(Point),

    /// Quadratic curve (control point, end point)
    Quad(Point, Point),

    /// Conic section (control point, end point, weight)
    Conic(Point, Point, f32),

    /// Cubic bezier curve (control point 1, control point 2, end point)
    Cubic(Point, Point, Point),

    /// Closes the current subpath
    Close,
}

///
/// How the inside of a path is determined
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FillType {
    Winding,
    EvenOdd,
    InverseWinding,
    InverseEvenOdd
}

///
/// The direction that closed shapes are added to a path in
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PathDirection {
    Clockwise,
    CounterClockwise
}

///
/// A path made up of a sequence of subpaths
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Path {
    pub fill_type:  FillType,
    pub ops:        Vec<PathOp>,
}

impl Default for FillType {
    fn default() -> FillType { FillType::Winding }
}

impl FillType {
    fn from_bits(bits: u32) -> FillType {
        match bits & 3 {
            0   => FillType::Winding,
            1   => FillType::EvenOdd,
            2   => FillType::InverseWinding,
            _   => FillType::InverseEvenOdd
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            FillType::Winding           => 0,
            FillType::EvenOdd           => 1,
            FillType::InverseWinding    => 2,
            FillType::InverseEvenOdd    => 3
        }
    }
}

impl Default for Path {
    fn default() -> Path { Path::new() }
}

///
/// Iterates around the corners of a rectangle, starting from a particular corner
///
struct CornerIterator {
    points: [Point; 4],
    index:  usize,
    step:   usize
}

impl CornerIterator {
    fn new(rect: Rect, direction: PathDirection, start: usize) -> CornerIterator {
        CornerIterator {
            points: [Point::new(rect.left, rect.top), Point::new(rect.right, rect.top), Point::new(rect.right, rect.bottom), Point::new(rect.left, rect.bottom)],
            index:  start % 4,
            step:   if direction == PathDirection::Clockwise { 1 } else { 3 }
        }
    }

    fn current(&self) -> Point { self.points[self.index] }

    fn next(&mut self) -> Point {
        self.index = (self.index + self.step) % 4;
        self.current()
    }
}

///
/// Iterates around the points where the edges of an oval meet its bounding box, starting at the top
///
struct OvalIterator {
    points: [Point; 4],
    index:  usize,
    step:   usize
}

impl OvalIterator {
    fn new(rect: Rect, direction: PathDirection, start: usize) -> OvalIterator {
        let cx = (rect.left + rect.right) / 2.0;
        let cy = (rect.top + rect.bottom) / 2.0;

        OvalIterator {
            points: [Point::new(cx, rect.top), Point::new(rect.right, cy), Point::new(cx, rect.bottom), Point::new(rect.left, cy)],
            index:  start % 4,
            step:   if direction == PathDirection::Clockwise { 1 } else { 3 }
        }
    }

    fn current(&self) -> Point { self.points[self.index] }

    fn next(&mut self) -> Point {
        self.index = (self.index + self.step) % 4;
        self.current()
    }
}

///
/// Iterates around the 8 points where the corners of a round rect meet its edges, starting at the top-left
///
struct RRectIterator {
    points: [Point; 8],
    index:  usize,
    step:   usize
}

impl RRectIterator {
    fn new(rrect: &RRect, direction: PathDirection, start: usize) -> RRectIterator {
        let Rect { left, top, right, bottom } = rrect.rect;
        let [ul, ur, lr, ll] = rrect.radii;

        RRectIterator {
            points: [
                Point::new(left + ul.x, top),
                Point::new(right - ur.x, top),
                Point::new(right, top + ur.y),
                Point::new(right, bottom - lr.y),
                Point::new(right - lr.x, bottom),
                Point::new(left + ll.x, bottom),
                Point::new(left, bottom - ll.y),
                Point::new(left, top + ul.y),
            ],
            index:  start % 8,
            step:   if direction == PathDirection::Clockwise { 1 } else { 7 }
        }
    }

    fn current(&self) -> Point { self.points[self.index] }

    fn next(&mut self) -> Point {
        self.index = (self.index + self.step) % 8;
        self.current()
    }
}

impl Path {
    ///
    /// Creates a new empty path
    ///
    pub fn new() -> Path {
        Path {
            fill_type:  FillType::Winding,
            ops:        vec![]
        }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    pub fn with_fill_type(mut self, fill_type: FillType) -> Path {
        self.fill_type = fill_type;
        self
    }

    pub fn move_to(&mut self, x: f32, y: f32) { self.ops.push(PathOp::Move(Point::new(x, y))); }
    pub fn line_to(&mut self, x: f32, y: f32) { self.ops.push(PathOp::Line(Point::new(x, y))); }
    pub fn quad_to(&mut self, cp: Point, end: Point) { self.ops.push(PathOp::Quad(cp, end)); }
    pub fn conic_to(&mut self, cp: Point, end: Point, weight: f32) { self.ops.push(PathOp::Conic(cp, end, weight)); }
    pub fn cubic_to(&mut self, cp1: Point, cp2: Point, end: Point) { self.ops.push(PathOp::Cubic(cp1, cp2, end)); }
    pub fn close(&mut self) { self.ops.push(PathOp::Close); }

    ///
    /// Adds a rectangle as a closed subpath, starting at the specified corner (0 = top-left, going clockwise)
    ///
    pub fn add_rect(&mut self, rect: Rect, direction: PathDirection, start: usize) {
        let mut corners = CornerIterator::new(rect, direction, start);

        self.ops.push(PathOp::Move(corners.current()));
        for _ in 0..3 {
            self.ops.push(PathOp::Line(corners.next()));
        }
        self.close();
    }

    ///
    /// Adds an oval as four conic sections, starting at the specified point (0 = top, going clockwise)
    ///
    pub fn add_oval(&mut self, rect: Rect, direction: PathDirection, start: usize) {
        let corner_start    = start + if direction == PathDirection::Clockwise { 0 } else { 1 };
        let mut points      = OvalIterator::new(rect, direction, start);
        let mut corners     = CornerIterator::new(rect, direction, corner_start);

        self.ops.push(PathOp::Move(points.current()));
        for _ in 0..4 {
            let cp  = corners.next();
            let end = points.next();
            self.conic_to(cp, end, QUARTER_CIRCLE_WEIGHT);
        }
        self.close();
    }

    ///
    /// Adds a round rect as a closed subpath
    ///
    /// The start index (0..7) picks one of the 8 points where the corner curves meet the edges, starting with
    /// the end of the upper-left corner on the top edge.
    ///
    pub fn add_rrect(&mut self, rrect: &RRect, direction: PathDirection, start: usize) {
        if rrect.is_rect() || rrect.is_empty() {
            self.add_rect(rrect.rect, direction, (start + 1) / 2);
        } else if rrect.is_oval() {
            self.add_oval(rrect.rect, direction, start / 2);
        } else {
            let starts_with_conic   = ((start & 1) == 1) == (direction == PathDirection::Clockwise);
            let corner_start        = start / 2 + if direction == PathDirection::Clockwise { 0 } else { 1 };

            let mut points          = RRectIterator::new(rrect, direction, start);
            let mut corners         = CornerIterator::new(rrect.rect, direction, corner_start);

            self.ops.push(PathOp::Move(points.current()));

            if starts_with_conic {
                for _ in 0..3 {
                    let cp  = corners.next();
                    let end = points.next();
                    self.conic_to(cp, end, QUARTER_CIRCLE_WEIGHT);
                    self.ops.push(PathOp::Line(points.next()));
                }

                let cp  = corners.next();
                let end = points.next();
                self.conic_to(cp, end, QUARTER_CIRCLE_WEIGHT);
            } else {
                for _ in 0..4 {
                    self.ops.push(PathOp::Line(points.next()));

                    let cp  = corners.next();
                    let end = points.next();
                    self.conic_to(cp, end, QUARTER_CIRCLE_WEIGHT);
                }
            }

            self.close();
        }
    }

    ///
    /// Splits this path into the verb, point and weight arrays used by the serialized form
    ///
    fn to_arrays(&self) -> (Vec<u8>, Vec<Point>, Vec<f32>) {
        let mut verbs   = vec![];
        let mut points  = vec![];
        let mut weights = vec![];

        for op in self.ops.iter() {
            match op {
                PathOp::Move(p)             => { verbs.push(VERB_MOVE); points.push(*p); }
                PathOp::Line(p)             => { verbs.push(VERB_LINE); points.push(*p); }
                PathOp::Quad(cp, p)         => { verbs.push(VERB_QUAD); points.extend([*cp, *p]); }
                PathOp::Conic(cp, p, w)     => { verbs.push(VERB_CONIC); points.extend([*cp, *p]); weights.push(*w); }
                PathOp::Cubic(cp1, cp2, p)  => { verbs.push(VERB_CUBIC); points.extend([*cp1, *cp2, *p]); }
                PathOp::Close               => { verbs.push(VERB_CLOSE); }
            }
        }

        (verbs, points, weights)
    }

    ///
    /// Rebuilds the path operations from the serialized arrays, returning None if the arrays don't match the verbs
    ///
    fn from_arrays(verbs: &[u8], points: &[Point], weights: &[f32]) -> Option<Vec<PathOp>> {
        let mut ops         = Vec::with_capacity(verbs.len());
        let mut points      = points.iter().copied();
        let mut weights     = weights.iter().copied();

        for verb in verbs.iter() {
            let op = match *verb {
                VERB_MOVE   => PathOp::Move(points.next()?),
                VERB_LINE   => PathOp::Line(points.next()?),
                VERB_QUAD   => PathOp::Quad(points.next()?, points.next()?),
                VERB_CONIC  => PathOp::Conic(points.next()?, points.next()?, weights.next()?),
                VERB_CUBIC  => PathOp::Cubic(points.next()?, points.next()?, points.next()?),
                VERB_CLOSE  => PathOp::Close,
                _           => { return None; }
            };

            ops.push(op);
        }

        // Every point and weight must be used
        if points.next().is_some() || weights.next().is_some() {
            return None;
        }

        Some(ops)
    }

    ///
    /// Reads the remainder of a path serialized as a round rect
    ///
    fn read_rrect_path(buffer: &mut ReadCursor, packed: u32) -> Option<Path> {
        let direction = match (packed >> DIRECTION_SHIFT) & 3 {
            0   => PathDirection::Clockwise,
            1   => PathDirection::CounterClockwise,
            _   => { buffer.invalidate(); return None; }
        };

        let rrect = RRect::read_flat(buffer)?;
        let start = buffer.read_i32();

        if !buffer.validate(start >= 0 && start <= 7) {
            return None;
        }

        let mut path = Path::new().with_fill_type(FillType::from_bits(packed >> FILL_TYPE_SHIFT));
        path.add_rrect(&rrect, direction, start as usize);

        if buffer.skip_to_align4() { Some(path) } else { None }
    }
}

impl FlatEncoding for Path {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        let (verbs, points, weights) = self.to_arrays();

        let packed = (self.fill_type.to_bits() << FILL_TYPE_SHIFT) | (GENERAL_PATH << TYPE_SHIFT) | VERBS_FORWARD_VERSION;

        buffer.write_u32(packed);
        buffer.write_i32(points.len() as i32);
        buffer.write_i32(weights.len() as i32);
        buffer.write_i32(verbs.len() as i32);

        points.iter().for_each(|point| buffer.write_point(*point));
        weights.iter().for_each(|weight| buffer.write_f32(*weight));
        buffer.write_pad(&verbs);
    }
}

impl FlatDecoding for Path {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Path> {
        let packed = buffer.read_u32();
        if !buffer.is_valid() {
            return None;
        }

        let version = packed & VERSION_MASK;
        if !buffer.validate(version == VERBS_FORWARD_VERSION || version == VERBS_REVERSED_VERSION) {
            return None;
        }

        match (packed >> TYPE_SHIFT) & 0xf {
            GENERAL_PATH    => { }
            RRECT_PATH      => { return Path::read_rrect_path(buffer, packed); }
            _               => { buffer.invalidate(); return None; }
        }

        let num_points  = buffer.read_i32();
        let num_weights = buffer.read_i32();
        let num_verbs   = buffer.read_i32();

        if !buffer.validate(num_points >= 0 && num_weights >= 0 && num_verbs >= 0) {
            return None;
        }

        let fill_type = FillType::from_bits(packed >> FILL_TYPE_SHIFT);

        if num_verbs == 0 {
            return if buffer.validate(num_points == 0 && num_weights == 0) {
                Some(Path::new().with_fill_type(fill_type))
            } else {
                None
            };
        }

        if !buffer.validate_can_read(num_points as usize, 8) {
            return None;
        }

        let points      = buffer.read_f32s(num_points as usize * 2)
            .into_iter()
            .tuples()
            .map(|(x, y)| Point::new(x, y))
            .collect::<Vec<_>>();
        let weights     = buffer.read_f32s(num_weights as usize);
        let mut verbs   = buffer.read_bytes(num_verbs as usize).to_vec();

        if !buffer.is_valid() {
            return None;
        }

        if version == VERBS_REVERSED_VERSION {
            verbs.reverse();
        }

        match Path::from_arrays(&verbs, &points, &weights) {
            Some(ops)   => Some(Path { fill_type, ops }),
            None        => { buffer.invalidate(); None }
        }
    }
}
