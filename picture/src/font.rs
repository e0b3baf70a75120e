use crate::flat::*;
use crate::typeface::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use std::sync::*;

const SIZE_IS_BYTE: u32     = 1 << 31;
const HAS_SCALE_X: u32      = 1 << 30;
const HAS_SKEW_X: u32       = 1 << 29;
const HAS_TYPEFACE: u32     = 1 << 28;

const SHIFT_FOR_SIZE: u32   = 16;
const MASK_FOR_SIZE: u32    = 0xff;
const SHIFT_FOR_FLAGS: u32  = 4;
const MASK_FOR_FLAGS: u32   = 0xfff;
const SHIFT_FOR_EDGING: u32 = 2;
const SHIFT_FOR_HINTING: u32= 0;

/// Glyph baselines are snapped to whole pixels
pub const FONT_FLAG_BASELINE_SNAP: u32 = 1 << 5;

///
/// How glyph edges are rendered
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FontEdging {
    Alias,
    AntiAlias,
    SubpixelAntiAlias
}

///
/// How much glyph outlines are adjusted to fit the pixel grid
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FontHinting {
    None,
    Slight,
    Normal,
    Full
}

///
/// A typeface at a particular size, with the settings used to render its glyphs
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Font {
    pub size:       f32,
    pub scale_x:    f32,
    pub skew_x:     f32,
    pub typeface:   Option<Arc<Typeface>>,
    pub edging:     FontEdging,
    pub hinting:    FontHinting,

    /// Rendering flags (embolden, subpixel positioning, etc)
    pub flags:      u32,
}

impl FontEdging {
    fn from_bits(bits: u32) -> FontEdging {
        match bits {
            1 => FontEdging::AntiAlias,
            2 => FontEdging::SubpixelAntiAlias,
            _ => FontEdging::Alias
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            FontEdging::Alias               => 0,
            FontEdging::AntiAlias           => 1,
            FontEdging::SubpixelAntiAlias   => 2
        }
    }
}

impl FontHinting {
    fn from_bits(bits: u32) -> FontHinting {
        match bits {
            1 => FontHinting::Slight,
            2 => FontHinting::Normal,
            3 => FontHinting::Full,
            _ => FontHinting::None
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            FontHinting::None   => 0,
            FontHinting::Slight => 1,
            FontHinting::Normal => 2,
            FontHinting::Full   => 3
        }
    }
}

impl Default for Font {
    fn default() -> Font {
        Font {
            size:       12.0,
            scale_x:    1.0,
            skew_x:     0.0,
            typeface:   None,
            edging:     FontEdging::AntiAlias,
            hinting:    FontHinting::Normal,
            flags:      FONT_FLAG_BASELINE_SNAP
        }
    }
}

impl Font {
    ///
    /// Creates a font using a typeface at a particular size
    ///
    pub fn new(typeface: Option<Arc<Typeface>>, size: f32) -> Font {
        Font { typeface, size, ..Font::default() }
    }
}

///
/// True if a font size can be stored in the byte reserved for it in the packed word
///
fn size_is_byte(size: f32) -> bool {
    size >= 0.0 && size <= MASK_FOR_SIZE as f32 && size.fract() == 0.0
}

///
/// Writes a reference to a typeface, adding it to the typeface table
///
fn write_typeface(buffer: &mut WriteCursor, typeface: &Arc<Typeface>) {
    let index = buffer.typefaces_mut().intern(Arc::clone(typeface));
    buffer.write_i32(index as i32);
}

///
/// Reads a typeface reference: 0 for none, a positive index into the typeface table, or the negated length of
/// some embedded font data
///
fn read_typeface(buffer: &mut ReadCursor) -> Option<Arc<Typeface>> {
    let index = buffer.read_i32();

    if index == 0 {
        None
    } else if index > 0 {
        let typeface = buffer.typeface(index as u32);
        buffer.validate(typeface.is_some());
        typeface
    } else {
        if !buffer.validate(buffer.options().allow_custom_typefaces) {
            return None;
        }

        let len     = index.unsigned_abs() as usize;
        let data    = buffer.skip(len)?;

        Some(Arc::new(Typeface::new(FontDescriptor::default(), data.to_vec())))
    }
}

impl FlatEncoding for Font {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        let mut packed = ((self.flags & MASK_FOR_FLAGS) << SHIFT_FOR_FLAGS)
            | (self.edging.to_bits() << SHIFT_FOR_EDGING)
            | (self.hinting.to_bits() << SHIFT_FOR_HINTING);

        if size_is_byte(self.size) {
            packed |= SIZE_IS_BYTE;
            packed |= (self.size as u32) << SHIFT_FOR_SIZE;
        }
        if self.scale_x != 1.0      { packed |= HAS_SCALE_X; }
        if self.skew_x != 0.0       { packed |= HAS_SKEW_X; }
        if self.typeface.is_some()  { packed |= HAS_TYPEFACE; }

        buffer.write_u32(packed);

        if packed & SIZE_IS_BYTE == 0   { buffer.write_f32(self.size); }
        if packed & HAS_SCALE_X != 0    { buffer.write_f32(self.scale_x); }
        if packed & HAS_SKEW_X != 0     { buffer.write_f32(self.skew_x); }

        if let Some(typeface) = &self.typeface {
            write_typeface(buffer, typeface);
        }
    }
}

impl FlatDecoding for Font {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Font> {
        let packed      = buffer.read_u32();
        let mut font    = Font::default();

        font.size = if packed & SIZE_IS_BYTE != 0 {
            ((packed >> SHIFT_FOR_SIZE) & MASK_FOR_SIZE) as f32
        } else {
            buffer.read_f32()
        };

        if packed & HAS_SCALE_X != 0    { font.scale_x = buffer.read_f32(); }
        if packed & HAS_SKEW_X != 0     { font.skew_x = buffer.read_f32(); }
        if packed & HAS_TYPEFACE != 0   { font.typeface = read_typeface(buffer); }

        font.flags      = (packed >> SHIFT_FOR_FLAGS) & MASK_FOR_FLAGS;
        font.edging     = FontEdging::from_bits((packed >> SHIFT_FOR_EDGING) & 3);
        font.hinting    = FontHinting::from_bits((packed >> SHIFT_FOR_HINTING) & 3);

        if buffer.is_valid() { Some(font) } else { None }
    }
}
