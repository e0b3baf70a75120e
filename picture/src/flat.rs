use crate::read_cursor::*;
use crate::write_cursor::*;

///
/// Trait implemented by values that can be written to the 4-byte aligned picture data format
///
pub trait FlatEncoding {
    ///
    /// Appends this value to a buffer
    ///
    fn write_flat(&self, buffer: &mut WriteCursor);
}

///
/// Trait implemented by values that can be read back from the picture data format
///
/// Returns `None` if the value can't be read: if the data is malformed the cursor will also be invalidated,
/// but some values (effects that can't be replayed, for instance) can decode to `None` while leaving the
/// cursor valid.
///
pub trait FlatDecoding : Sized {
    ///
    /// Reads a value from a buffer
    ///
    fn read_flat(buffer: &mut ReadCursor) -> Option<Self>;
}

impl FlatEncoding for u32 {
    #[inline]
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_u32(*self) }
}

impl FlatEncoding for i32 {
    #[inline]
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_i32(*self) }
}

impl FlatEncoding for f32 {
    #[inline]
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_f32(*self) }
}

impl FlatEncoding for bool {
    #[inline]
    fn write_flat(&self, buffer: &mut WriteCursor) { buffer.write_bool(*self) }
}

//
// Some convenience encodings for writing several values at once
//

impl<A: FlatEncoding, B: FlatEncoding> FlatEncoding for (A, B) {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.write_flat(buffer);
        self.1.write_flat(buffer);
    }
}

impl<A: FlatEncoding, B: FlatEncoding, C: FlatEncoding> FlatEncoding for (A, B, C) {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.write_flat(buffer);
        self.1.write_flat(buffer);
        self.2.write_flat(buffer);
    }
}

impl<A: FlatEncoding, B: FlatEncoding, C: FlatEncoding, D: FlatEncoding> FlatEncoding for (A, B, C, D) {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.write_flat(buffer);
        self.1.write_flat(buffer);
        self.2.write_flat(buffer);
        self.3.write_flat(buffer);
    }
}

impl<A: FlatEncoding, B: FlatEncoding, C: FlatEncoding, D: FlatEncoding, E: FlatEncoding> FlatEncoding for (A, B, C, D, E) {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        self.0.write_flat(buffer);
        self.1.write_flat(buffer);
        self.2.write_flat(buffer);
        self.3.write_flat(buffer);
        self.4.write_flat(buffer);
    }
}

impl<T: FlatEncoding> FlatEncoding for &T {
    #[inline]
    fn write_flat(&self, buffer: &mut WriteCursor) {
        (*self).write_flat(buffer)
    }
}
