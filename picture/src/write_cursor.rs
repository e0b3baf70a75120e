use crate::tables::*;
use crate::geometry::*;
use crate::read_cursor::*;

///
/// An append-only buffer that picture data is written into
///
/// Every value is written as a whole number of 32-bit little-endian words. Variable-length data is padded
/// with zeros so the next value starts on a 4-byte boundary. Flattenables and fonts intern their factory
/// names and typefaces into the tables carried alongside the data.
///
#[derive(Clone, Debug, Default)]
pub struct WriteCursor {
    /// The bytes written so far
    data: Vec<u8>,

    /// Factory names used by flattenables written to this buffer
    factories: FactoryTable,

    /// Typefaces used by fonts written to this buffer
    typefaces: TypefaceTable,
}

impl WriteCursor {
    ///
    /// Creates a new, empty buffer
    ///
    pub fn new() -> WriteCursor {
        WriteCursor::default()
    }

    ///
    /// Creates a new, empty buffer that shares factory and typeface tables with another encoding pass
    ///
    pub fn with_tables(factories: FactoryTable, typefaces: TypefaceTable) -> WriteCursor {
        WriteCursor {
            data:       vec![],
            factories:  factories,
            typefaces:  typefaces
        }
    }

    #[inline] pub fn write_u32(&mut self, value: u32) { self.data.extend_from_slice(&value.to_le_bytes()); }
    #[inline] pub fn write_i32(&mut self, value: i32) { self.data.extend_from_slice(&value.to_le_bytes()); }
    #[inline] pub fn write_f32(&mut self, value: f32) { self.data.extend_from_slice(&value.to_le_bytes()); }
    #[inline] pub fn write_bool(&mut self, value: bool) { self.write_u32(if value { 1 } else { 0 }); }
    #[inline] pub fn write_color(&mut self, color: Color) { self.write_u32(color.0); }

    #[inline]
    pub fn write_point(&mut self, point: Point) {
        self.write_f32(point.x);
        self.write_f32(point.y);
    }

    pub fn write_color4f(&mut self, color: Color4f) {
        self.write_f32(color.r);
        self.write_f32(color.g);
        self.write_f32(color.b);
        self.write_f32(color.a);
    }

    pub fn write_rect(&mut self, rect: Rect) {
        self.write_f32(rect.left);
        self.write_f32(rect.top);
        self.write_f32(rect.right);
        self.write_f32(rect.bottom);
    }

    ///
    /// Writes some bytes followed by enough zeros to reach a 4-byte boundary
    ///
    pub fn write_pad(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.data.resize(align4(self.data.len()), 0);
    }

    ///
    /// Writes a u32 length then the padded bytes
    ///
    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_pad(bytes);
    }

    ///
    /// Writes a string as a u32 length, the characters, a 0 terminator and padding
    ///
    pub fn write_string(&mut self, string: &str) {
        self.write_u32(string.len() as u32);
        if !string.is_empty() {
            self.data.extend_from_slice(string.as_bytes());
            self.write_pad(&[0]);
        }
    }

    ///
    /// Writes a u32 count followed by the floats
    ///
    pub fn write_f32_array(&mut self, values: &[f32]) {
        self.write_u32(values.len() as u32);
        values.iter().for_each(|val| self.write_f32(*val));
    }

    ///
    /// Writes a placeholder u32, returning its offset so it can be filled in with `patch_u32()` later on
    ///
    pub fn reserve_u32(&mut self) -> usize {
        let offset = self.data.len();
        self.write_u32(0);
        offset
    }

    ///
    /// Overwrites a u32 that was written earlier
    ///
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..(offset+4)].copy_from_slice(&value.to_le_bytes());
    }

    ///
    /// Reads back a u32 that was written earlier
    ///
    pub fn read_u32_at(&self, offset: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[offset..(offset+4)]);
        u32::from_le_bytes(word)
    }

    #[inline] pub fn bytes_written(&self) -> usize { self.data.len() }
    #[inline] pub fn bytes(&self) -> &[u8] { &self.data }

    #[inline] pub fn factories(&self) -> &FactoryTable { &self.factories }
    #[inline] pub fn factories_mut(&mut self) -> &mut FactoryTable { &mut self.factories }
    #[inline] pub fn typefaces(&self) -> &TypefaceTable { &self.typefaces }
    #[inline] pub fn typefaces_mut(&mut self) -> &mut TypefaceTable { &mut self.typefaces }

    ///
    /// Takes the bytes that have been written, discarding the tables
    ///
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    ///
    /// Splits this buffer into its bytes and the tables that they refer to
    ///
    pub fn into_parts(self) -> (Vec<u8>, FactoryTable, TypefaceTable) {
        (self.data, self.factories, self.typefaces)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strings_are_terminated_and_padded() {
        let mut buffer = WriteCursor::new();
        buffer.write_string("abcd");
        buffer.write_string("");

        let bytes = buffer.into_bytes();
        assert!(bytes == vec![4, 0, 0, 0, b'a', b'b', b'c', b'd', 0, 0, 0, 0, 0, 0, 0, 0]);

        let mut rc = ReadCursor::new(&bytes);
        assert!(rc.read_string() == "abcd");
        assert!(rc.read_string() == "");
        assert!(rc.is_at_end());
    }

    #[test]
    fn reserve_then_patch() {
        let mut buffer = WriteCursor::new();

        buffer.write_u32(7);
        let slot = buffer.reserve_u32();
        buffer.write_byte_array(&[1, 2, 3, 4, 5]);
        let size = buffer.bytes_written() - slot - 4;
        buffer.patch_u32(slot, size as u32);

        assert!(buffer.read_u32_at(slot) == 12);
        assert!(buffer.bytes_written() == 20);
    }

    #[test]
    fn byte_array_is_padded() {
        let mut buffer = WriteCursor::new();
        buffer.write_byte_array(&[9]);
        buffer.write_u32(1);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(rc.read_byte_array() == &[9]);
        assert!(rc.read_u32() == 1);
        assert!(rc.is_valid());
    }
}
