use crate::flat::*;
use crate::version::*;
use crate::geometry::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use std::sync::*;

const IMAGE_HAS_SUBSET: u32     = 1 << 8;
const IMAGE_HAS_MIPMAP: u32     = 1 << 9;
const IMAGE_UNPREMUL: u32       = 1 << 10;

///
/// How the edges of an image or gradient are extended
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TileMode {
    Clamp,
    Repeat,
    Mirror,
    Decal
}

///
/// How pixels are sampled from an image
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FilterMode {
    Nearest,
    Linear
}

///
/// How mipmap levels are chosen when sampling an image
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MipmapMode {
    None,
    Nearest,
    Linear
}

///
/// The sampling settings to use when drawing an image
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub filter: FilterMode,
    pub mipmap: MipmapMode
}

///
/// An image, kept in its encoded form
///
/// Pictures don't decode image data: the encoded bytes are passed on to whatever surface replays the picture.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Image {
    /// The encoded image data (PNG, JPEG, etc)
    pub encoded: Arc<Vec<u8>>,

    /// The part of the encoded image that's used, if it's not the whole thing
    pub subset: Option<Rect>,

    /// Encoded mipmap levels, if the image was stored with them
    pub mipmap: Option<Arc<Vec<u8>>>,

    /// True if the image is not premultiplied
    pub unpremul: bool,
}

impl Default for TileMode {
    fn default() -> TileMode { TileMode::Clamp }
}

impl TileMode {
    pub fn from_u32(value: u32) -> Option<TileMode> {
        match value {
            0 => Some(TileMode::Clamp),
            1 => Some(TileMode::Repeat),
            2 => Some(TileMode::Mirror),
            3 => Some(TileMode::Decal),
            _ => None
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            TileMode::Clamp     => 0,
            TileMode::Repeat    => 1,
            TileMode::Mirror    => 2,
            TileMode::Decal     => 3
        }
    }

    ///
    /// Reads a tile mode, invalidating the buffer if it's out of range
    ///
    pub fn read(buffer: &mut ReadCursor) -> Option<TileMode> {
        let mode = TileMode::from_u32(buffer.read_u32());
        buffer.validate(mode.is_some());
        mode
    }
}

impl Default for SamplingOptions {
    fn default() -> SamplingOptions {
        SamplingOptions { filter: FilterMode::Nearest, mipmap: MipmapMode::None }
    }
}

impl SamplingOptions {
    pub fn new(filter: FilterMode, mipmap: MipmapMode) -> SamplingOptions {
        SamplingOptions { filter, mipmap }
    }
}

impl FlatEncoding for SamplingOptions {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        // No anisotropy, no cubic resampler
        buffer.write_i32(0);
        buffer.write_bool(false);

        buffer.write_u32(match self.filter {
            FilterMode::Nearest => 0,
            FilterMode::Linear  => 1
        });
        buffer.write_u32(match self.mipmap {
            MipmapMode::None    => 0,
            MipmapMode::Nearest => 1,
            MipmapMode::Linear  => 2
        });
    }
}

impl FlatDecoding for SamplingOptions {
    fn read_flat(buffer: &mut ReadCursor) -> Option<SamplingOptions> {
        if !buffer.is_version_lt(Version::AnisotropicFilter) {
            let max_aniso = buffer.read_i32();
            if max_aniso != 0 {
                return if buffer.is_valid() { Some(SamplingOptions::default()) } else { None };
            }
        }

        if buffer.read_bool() {
            // Cubic resampling (B, C)
            buffer.read_f32();
            buffer.read_f32();
            return if buffer.is_valid() { Some(SamplingOptions::default()) } else { None };
        }

        let filter = match buffer.read_u32() {
            0 => FilterMode::Nearest,
            1 => FilterMode::Linear,
            _ => { buffer.invalidate(); return None; }
        };
        let mipmap = match buffer.read_u32() {
            0 => MipmapMode::None,
            1 => MipmapMode::Nearest,
            2 => MipmapMode::Linear,
            _ => { buffer.invalidate(); return None; }
        };

        if buffer.is_valid() { Some(SamplingOptions { filter, mipmap }) } else { None }
    }
}

impl Image {
    ///
    /// Creates an image from its encoded bytes
    ///
    pub fn from_encoded(encoded: Vec<u8>) -> Image {
        Image {
            encoded:    Arc::new(encoded),
            subset:     None,
            mipmap:     None,
            unpremul:   false
        }
    }

    pub fn with_subset(mut self, subset: Rect) -> Image {
        self.subset = Some(subset);
        self
    }
}

impl FlatEncoding for Image {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        let mut flags = 0;
        if self.subset.is_some() { flags |= IMAGE_HAS_SUBSET; }
        if self.mipmap.is_some() { flags |= IMAGE_HAS_MIPMAP; }
        if self.unpremul { flags |= IMAGE_UNPREMUL; }

        buffer.write_u32(flags);
        buffer.write_byte_array(&self.encoded);

        if let Some(subset) = self.subset {
            buffer.write_rect(subset);
        }
        if let Some(mipmap) = &self.mipmap {
            buffer.write_byte_array(mipmap);
        }
    }
}

impl FlatDecoding for Image {
    ///
    /// Reads an image. An image with no data reads as `None` without invalidating the buffer.
    ///
    fn read_flat(buffer: &mut ReadCursor) -> Option<Image> {
        let flags   = buffer.read_u32();
        let encoded = buffer.read_byte_array();
        let subset  = if flags & IMAGE_HAS_SUBSET != 0 { Some(buffer.read_rect()) } else { None };
        let mipmap  = if flags & IMAGE_HAS_MIPMAP != 0 { Some(Arc::new(buffer.read_byte_array().to_vec())) } else { None };

        if !buffer.is_valid() || encoded.is_empty() {
            return None;
        }

        Some(Image {
            encoded:    Arc::new(encoded.to_vec()),
            subset:     subset,
            mipmap:     mipmap,
            unpremul:   flags & IMAGE_UNPREMUL != 0
        })
    }
}
