use crate::error::*;
use crate::tables::*;
use crate::options::*;
use crate::version::*;
use crate::typeface::*;
use crate::geometry::*;
use crate::effects::*;

use log::*;

use std::sync::*;

/// How deeply flattenables can be nested inside each other (eg, composed color filters)
pub const MAX_EFFECT_DEPTH: u32 = 64;

///
/// Rounds a size up to the next multiple of 4
///
#[inline]
pub fn align4(size: usize) -> usize {
    (size + 3) & !3
}

///
/// A bounds-checked reader for 4-byte aligned picture data
///
/// Errors are 'sticky': once a read fails (or a caller reports a failed validation), the cursor moves to the end
/// of its data and every later read returns a default value. Callers check `is_valid()` at the points where
/// they need to know whether or not the data they read so far is trustworthy.
///
#[derive(Clone)]
pub struct ReadCursor<'a> {
    /// The data being read
    data: &'a [u8],

    /// The offset of the next byte to read
    pos: usize,

    /// The picture format version of the data
    version: u32,

    /// The first error encountered by this cursor
    error: Option<PictureError>,

    /// The factory names that flattenables refer to
    factories: Option<&'a FactoryTable>,

    /// The typefaces that fonts refer to
    typefaces: Option<&'a TypefaceTable>,

    /// Decoders for flattenables
    registry: &'a FlattenableRegistry,

    /// Options for this decoding pass
    options: DecodeOptions,

    /// How many more levels of nested picture are allowed
    depth: i32,

    /// How many more levels of flattenables can be nested inside each other
    effect_depth: u32,
}

impl<'a> ReadCursor<'a> {
    ///
    /// Creates a cursor that reads the specified data using the default options and flattenable registry
    ///
    pub fn new(data: &'a [u8]) -> ReadCursor<'a> {
        let options = DecodeOptions::default();

        ReadCursor {
            data:          data,
            pos:           0,
            version:       0,
            error:         None,
            factories:     None,
            typefaces:     None,
            registry:      default_registry(),
            options:       options,
            depth:         options.recursion_limit,
            effect_depth:  MAX_EFFECT_DEPTH,
        }
    }

    /// Sets the format version of the data
    pub fn with_version(mut self, version: u32) -> Self { self.version = version; self }

    /// Sets the table that factory indexes are resolved against
    pub fn with_factories(mut self, factories: &'a FactoryTable) -> Self { self.factories = Some(factories); self }

    /// Sets the table that typeface indexes are resolved against
    pub fn with_typefaces(mut self, typefaces: &'a TypefaceTable) -> Self { self.typefaces = Some(typefaces); self }

    /// Sets the registry used to decode flattenables
    pub fn with_registry(mut self, registry: &'a FlattenableRegistry) -> Self { self.registry = registry; self }

    /// Sets how many levels of nested pictures can be read
    pub fn with_depth(mut self, depth: i32) -> Self { self.depth = depth; self }

    ///
    /// Sets the decoding options (this resets the recursion depth to the limit in the options)
    ///
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options    = options;
        self.depth      = options.recursion_limit;
        self
    }

    ///
    /// Creates a cursor over a different set of data that shares the tables, version and options of this one
    ///
    pub fn with_data<'b>(&self, data: &'b [u8]) -> ReadCursor<'b>
    where 'a: 'b {
        ReadCursor {
            data:          data,
            pos:           0,
            version:       self.version,
            error:         None,
            factories:     self.factories,
            typefaces:     self.typefaces,
            registry:      self.registry,
            options:       self.options,
            depth:         self.depth,
            effect_depth:  self.effect_depth,
        }
    }

    /// Changes the format version while reading (used when stepping into a nested picture)
    #[inline] pub fn set_version(&mut self, version: u32) { self.version = version; }

    /// Changes the remaining recursion depth
    #[inline] pub fn set_depth(&mut self, depth: i32) { self.depth = depth; }

    #[inline] pub fn version(&self) -> u32 { self.version }
    #[inline] pub fn options(&self) -> &DecodeOptions { &self.options }
    #[inline] pub fn registry(&self) -> &'a FlattenableRegistry { self.registry }
    #[inline] pub fn depth(&self) -> i32 { self.depth }
    #[inline] pub fn offset(&self) -> usize { self.pos }
    #[inline] pub fn len(&self) -> usize { self.data.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.data.is_empty() }
    #[inline] pub fn available(&self) -> usize { self.data.len() - self.pos }
    #[inline] pub fn is_at_end(&self) -> bool { self.pos >= self.data.len() }
    #[inline] pub fn is_valid(&self) -> bool { self.error.is_none() }

    ///
    /// The first error that this cursor encountered, if any
    ///
    #[inline]
    pub fn error(&self) -> Option<&PictureError> {
        self.error.as_ref()
    }

    ///
    /// True if the data was written by a version of the format older than the one that introduced the specified feature
    ///
    #[inline]
    pub fn is_version_lt(&self, feature: Version) -> bool {
        feature.is_newer_than(self.version)
    }

    ///
    /// Marks this cursor as invalid
    ///
    #[inline]
    pub fn invalidate(&mut self) {
        self.invalidate_with(PictureError::Invalid)
    }

    ///
    /// Marks this cursor as invalid, recording a reason if this is the first failure
    ///
    pub fn invalidate_with(&mut self, error: PictureError) {
        if self.error.is_none() {
            trace!("Picture data invalidated at offset {}: {}", self.pos, error);

            self.error  = Some(error);
            self.pos    = self.data.len();
        }
    }

    ///
    /// Checks a structural condition, invalidating the cursor if it doesn't hold. Returns true if the cursor is still valid.
    ///
    #[inline]
    pub fn validate(&mut self, condition: bool) -> bool {
        if !condition { self.invalidate(); }
        self.is_valid()
    }

    ///
    /// As for `validate()`, but with a specific error
    ///
    #[inline]
    pub fn validate_with(&mut self, condition: bool, error: PictureError) -> bool {
        if !condition { self.invalidate_with(error); }
        self.is_valid()
    }

    ///
    /// True if the specified number of bytes can be read from the current position
    ///
    #[inline]
    pub fn is_available(&self, num_bytes: usize) -> bool {
        self.pos.checked_add(num_bytes).map(|end| end <= self.data.len()).unwrap_or(false)
    }

    ///
    /// Checks that `count` elements of `element_size` bytes could be read, invalidating the cursor if not
    ///
    pub fn validate_can_read(&mut self, count: usize, element_size: usize) -> bool {
        let fits = count.checked_mul(element_size).map(|size| self.is_available(size)).unwrap_or(false);
        self.validate_with(fits, PictureError::TruncatedOrOverrun)
    }

    ///
    /// Skips over `num_bytes` (rounded up to a multiple of 4), returning the unpadded bytes that were skipped
    ///
    pub fn skip(&mut self, num_bytes: usize) -> Option<&'a [u8]> {
        if !self.is_valid() {
            return None;
        }

        if num_bytes > usize::MAX - 3 || !self.is_available(align4(num_bytes)) {
            self.invalidate_with(PictureError::TruncatedOrOverrun);
            return None;
        }

        let start   = self.pos;
        self.pos    += align4(num_bytes);

        Some(&self.data[start..(start + num_bytes)])
    }

    ///
    /// Moves the cursor up to the next 4-byte boundary
    ///
    pub fn skip_to_align4(&mut self) -> bool {
        let padding = align4(self.pos) - self.pos;

        if self.is_valid() && padding <= self.available() {
            self.pos += padding;
        } else {
            self.invalidate_with(PictureError::TruncatedOrOverrun);
        }

        self.is_valid()
    }

    ///
    /// Reads 4 bytes without any alignment padding
    ///
    #[inline]
    fn read_word(&mut self) -> [u8; 4] {
        if !self.is_valid() {
            return [0; 4];
        }

        if !self.is_available(4) {
            self.invalidate_with(PictureError::TruncatedOrOverrun);
            return [0; 4];
        }

        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[self.pos..(self.pos+4)]);
        self.pos += 4;

        word
    }

    #[inline] pub fn read_u32(&mut self) -> u32 { u32::from_le_bytes(self.read_word()) }
    #[inline] pub fn read_i32(&mut self) -> i32 { i32::from_le_bytes(self.read_word()) }
    #[inline] pub fn read_f32(&mut self) -> f32 { f32::from_le_bytes(self.read_word()) }

    ///
    /// Reads a boolean stored as a 32-bit value, which must be 0 or 1
    ///
    pub fn read_bool(&mut self) -> bool {
        let value = self.read_u32();
        self.validate(value & !1 == 0);

        value != 0
    }

    #[inline] pub fn read_color(&mut self) -> Color { Color(self.read_u32()) }
    #[inline] pub fn read_point(&mut self) -> Point { Point { x: self.read_f32(), y: self.read_f32() } }

    pub fn read_color4f(&mut self) -> Color4f {
        let r = self.read_f32();
        let g = self.read_f32();
        let b = self.read_f32();
        let a = self.read_f32();

        Color4f { r, g, b, a }
    }

    pub fn read_rect(&mut self) -> Rect {
        let left    = self.read_f32();
        let top     = self.read_f32();
        let right   = self.read_f32();
        let bottom  = self.read_f32();

        Rect { left, top, right, bottom }
    }

    ///
    /// Returns the next u32 without moving the cursor (used for array counts)
    ///
    pub fn peek_u32(&mut self) -> u32 {
        if !self.validate_with(self.is_available(4), PictureError::TruncatedOrOverrun) {
            return 0;
        }

        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[self.pos..(self.pos+4)]);
        u32::from_le_bytes(word)
    }

    ///
    /// Reads a block of bytes (which is followed by padding up to a 4-byte boundary)
    ///
    pub fn read_bytes(&mut self, num_bytes: usize) -> &'a [u8] {
        self.skip(num_bytes).unwrap_or(&[])
    }

    ///
    /// Reads a byte array: a u32 length followed by the padded bytes
    ///
    pub fn read_byte_array(&mut self) -> &'a [u8] {
        let len = self.read_u32() as usize;
        self.read_bytes(len)
    }

    ///
    /// Reads a string: a u32 length, the characters, and a terminating 0, padded to a 4-byte boundary
    ///
    pub fn read_string(&mut self) -> String {
        let len = self.read_u32() as usize;
        if len == 0 {
            return String::new();
        }

        let bytes = match self.skip(len.saturating_add(1)) {
            Some(bytes) => bytes,
            None        => { return String::new(); }
        };

        if !self.validate(bytes[len] == 0) {
            return String::new();
        }

        match std::str::from_utf8(&bytes[0..len]) {
            Ok(string)  => string.to_string(),
            Err(_)      => { self.invalidate(); String::new() }
        }
    }

    ///
    /// Reads a list of floats with a u32 count
    ///
    pub fn read_f32_array(&mut self) -> Vec<f32> {
        let count = self.read_u32() as usize;
        self.read_f32s(count)
    }

    ///
    /// Reads `count` floats with no count prefix
    ///
    pub fn read_f32s(&mut self, count: usize) -> Vec<f32> {
        if !self.validate_can_read(count, 4) {
            return vec![];
        }

        (0..count).map(|_| self.read_f32()).collect()
    }

    ///
    /// Reads a 'count' that must match an expected number of elements
    ///
    pub fn read_array_count(&mut self, expected: usize) -> bool {
        let count = self.read_u32() as usize;
        self.validate(count == expected)
    }

    ///
    /// Splits off the next `num_bytes` of this cursor into a new cursor with the same context
    ///
    /// The parent cursor moves past the bytes (and their padding) straight away.
    ///
    pub fn sub_cursor(&mut self, num_bytes: usize) -> ReadCursor<'a> {
        let bytes       = self.skip(num_bytes);
        let mut result  = self.with_data(bytes.unwrap_or(&[]));

        if bytes.is_none() {
            result.invalidate_with(PictureError::TruncatedOrOverrun);
        }

        result
    }

    ///
    /// Looks up the name of a factory from its 1-based index
    ///
    pub fn factory_name(&self, index: u32) -> Option<&'a str> {
        self.factories.and_then(|factories| factories.name(index))
    }

    ///
    /// Looks up a typeface from its 1-based index
    ///
    pub fn typeface(&self, index: u32) -> Option<Arc<Typeface>> {
        self.typefaces.and_then(|typefaces| typefaces.get(index)).cloned()
    }

    ///
    /// Steps into the payload of a flattenable, returning false and invalidating this cursor if flattenables
    /// are nested too deeply
    ///
    pub fn nested_effect(&mut self) -> bool {
        if self.effect_depth == 0 {
            self.invalidate_with(PictureError::RecursionLimitExceeded);
            false
        } else {
            self.effect_depth -= 1;
            true
        }
    }

    ///
    /// Returns the depth to use while reading a picture nested one level deeper than this one
    ///
    /// Reading too many levels deep invalidates this cursor.
    ///
    pub fn nested(&mut self) -> Option<i32> {
        if self.depth <= 1 {
            self.invalidate_with(PictureError::RecursionLimitExceeded);
            None
        } else {
            Some(self.depth - 1)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_little_endian_words() {
        let data    = [1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff, 0, 0, 0x80, 0x3f];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_u32() == 1);
        assert!(rc.read_i32() == -2);
        assert!(rc.read_f32() == 1.0);
        assert!(rc.is_at_end());
        assert!(rc.is_valid());
    }

    #[test]
    fn overrun_is_sticky() {
        let data    = [1, 0, 0, 0, 2, 0];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_u32() == 1);
        assert!(rc.read_u32() == 0);
        assert!(!rc.is_valid());
        assert!(rc.error() == Some(&PictureError::TruncatedOrOverrun));
        assert!(rc.offset() == data.len());

        // Reads that would have worked on a fresh cursor still return defaults
        assert!(rc.read_u32() == 0);
        assert!(rc.read_f32() == 0.0);
        assert!(!rc.read_bool());
        assert!(rc.read_bytes(0).is_empty());
        assert!(!rc.is_valid());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let data    = [0u8; 16];
        let mut rc  = ReadCursor::new(&data);

        rc.read_u32();
        rc.invalidate_with(PictureError::MalformedHeader);
        rc.invalidate();

        assert!(rc.error() == Some(&PictureError::MalformedHeader));
        assert!(rc.offset() == 16);
        assert!(rc.read_u32() == 0);
    }

    #[test]
    fn validate_folds_into_sticky_flag() {
        let data    = [3, 0, 0, 0, 4, 0, 0, 0];
        let mut rc  = ReadCursor::new(&data);

        let count = rc.read_u32();
        assert!(!rc.validate(count < 2));
        assert!(rc.read_u32() == 0);
    }

    #[test]
    fn bool_must_be_zero_or_one() {
        let data    = [2, 0, 0, 0];
        let mut rc  = ReadCursor::new(&data);

        rc.read_bool();
        assert!(!rc.is_valid());
    }

    #[test]
    fn skip_is_padded() {
        let data    = [1, 2, 3, 0, 9, 0, 0, 0];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_bytes(3) == &[1, 2, 3]);
        assert!(rc.offset() == 4);
        assert!(rc.read_u32() == 9);
    }

    #[test]
    fn read_string_with_terminator() {
        let data    = [2, 0, 0, 0, b'h', b'i', 0, 0];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_string() == "hi");
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
    }

    #[test]
    fn read_string_missing_terminator() {
        let data    = [3, 0, 0, 0, b'a', b'b', b'c', b'd'];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_string() == "");
        assert!(!rc.is_valid());
    }

    #[test]
    fn sub_cursor_is_bounded() {
        let data    = [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0];
        let mut rc  = ReadCursor::new(&data);

        let mut sub = rc.sub_cursor(4);
        assert!(sub.read_u32() == 1);
        assert!(sub.read_u32() == 0);
        assert!(!sub.is_valid());

        // Parent is unaffected by the failure in the sub-cursor
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 2);
    }

    #[test]
    fn skip_to_align4_at_end() {
        let data    = [0u8; 4];
        let mut rc  = ReadCursor::new(&data);

        rc.read_u32();
        assert!(rc.skip_to_align4());
        assert!(rc.is_valid());
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let data    = [0xff, 0xff, 0xff, 0xff];
        let mut rc  = ReadCursor::new(&data);

        assert!(rc.read_f32_array().is_empty());
        assert!(!rc.is_valid());
    }

    #[test]
    fn version_check() {
        let data    = [0u8; 0];
        let rc      = ReadCursor::new(&data).with_version(86);

        assert!(rc.is_version_lt(Version::BlenderInPaint));
        assert!(!rc.is_version_lt(Version::VerticesRemoveCustomData));
    }
}
