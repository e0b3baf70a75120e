use crate::error::*;
use crate::geometry::*;

use std::result::Result;

///
/// Returns the number of bytes needed to write a value as a packed uint
///
pub fn packed_uint_size(value: usize) -> usize {
    if value <= 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else {
        5
    }
}

///
/// Reads the outer picture stream
///
/// Unlike the data read by a `ReadCursor`, values in the outer stream are not aligned to 4-byte boundaries.
/// Reads return an error instead of using a sticky flag, as nothing at this level can continue after a
/// failure.
///
#[derive(Clone, Debug)]
pub struct StreamReader<'a> {
    data:   &'a [u8],
    pos:    usize
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> StreamReader<'a> {
        StreamReader { data: data, pos: 0 }
    }

    #[inline] pub fn position(&self) -> usize { self.pos }
    #[inline] pub fn is_at_end(&self) -> bool { self.pos >= self.data.len() }

    ///
    /// Reads a block of bytes from the stream
    ///
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], PictureError> {
        let end = self.pos.checked_add(len).ok_or(PictureError::TruncatedOrOverrun)?;
        if end > self.data.len() {
            return Err(PictureError::TruncatedOrOverrun);
        }

        let bytes   = &self.data[self.pos..end];
        self.pos    = end;

        Ok(bytes)
    }

    ///
    /// Reads a fixed-size block of bytes
    ///
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PictureError> {
        let mut result = [0u8; N];
        result.copy_from_slice(self.read_bytes(N)?);
        Ok(result)
    }

    #[inline] pub fn read_u8(&mut self) -> Result<u8, PictureError> { Ok(self.read_array::<1>()?[0]) }
    #[inline] pub fn read_u16(&mut self) -> Result<u16, PictureError> { Ok(u16::from_le_bytes(self.read_array()?)) }
    #[inline] pub fn read_u32(&mut self) -> Result<u32, PictureError> { Ok(u32::from_le_bytes(self.read_array()?)) }
    #[inline] pub fn read_f32(&mut self) -> Result<f32, PictureError> { Ok(f32::from_le_bytes(self.read_array()?)) }

    pub fn read_rect(&mut self) -> Result<Rect, PictureError> {
        let left    = self.read_f32()?;
        let top     = self.read_f32()?;
        let right   = self.read_f32()?;
        let bottom  = self.read_f32()?;

        Ok(Rect { left, top, right, bottom })
    }

    ///
    /// Reads a packed uint (one byte for small values, otherwise a marker byte followed by a u16 or u32)
    ///
    pub fn read_packed_uint(&mut self) -> Result<usize, PictureError> {
        match self.read_u8()? {
            0xfe    => Ok(self.read_u16()? as usize),
            0xff    => Ok(self.read_u32()? as usize),
            byte    => Ok(byte as usize)
        }
    }

    ///
    /// Reads a packed-length UTF-8 string
    ///
    pub fn read_packed_string(&mut self) -> Result<String, PictureError> {
        let len     = self.read_packed_uint()?;
        let bytes   = self.read_bytes(len)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| PictureError::Invalid)
    }
}

///
/// Writes the outer picture stream
///
#[derive(Clone, Debug, Default)]
pub struct StreamWriter {
    data: Vec<u8>
}

impl StreamWriter {
    pub fn new() -> StreamWriter {
        StreamWriter::default()
    }

    #[inline] pub fn write_bytes(&mut self, bytes: &[u8]) { self.data.extend_from_slice(bytes); }
    #[inline] pub fn write_u8(&mut self, value: u8) { self.data.push(value); }
    #[inline] pub fn write_u16(&mut self, value: u16) { self.write_bytes(&value.to_le_bytes()); }
    #[inline] pub fn write_u32(&mut self, value: u32) { self.write_bytes(&value.to_le_bytes()); }
    #[inline] pub fn write_f32(&mut self, value: f32) { self.write_bytes(&value.to_le_bytes()); }

    pub fn write_rect(&mut self, rect: Rect) {
        self.write_f32(rect.left);
        self.write_f32(rect.top);
        self.write_f32(rect.right);
        self.write_f32(rect.bottom);
    }

    pub fn write_packed_uint(&mut self, value: usize) {
        if value <= 0xfd {
            self.write_u8(value as u8);
        } else if value <= 0xffff {
            self.write_u8(0xfe);
            self.write_u16(value as u16);
        } else {
            self.write_u8(0xff);
            self.write_u32(value as u32);
        }
    }

    pub fn write_packed_string(&mut self, string: &str) {
        self.write_packed_uint(string.len());
        self.write_bytes(string.as_bytes());
    }

    #[inline] pub fn bytes_written(&self) -> usize { self.data.len() }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
