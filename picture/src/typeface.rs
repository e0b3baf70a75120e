use crate::error::*;
use crate::stream::*;

use std::sync::*;
use std::result::Result;

// Descriptor field ids
const FAMILY_NAME: usize        = 0x01;
const FULL_NAME: usize          = 0x04;
const POSTSCRIPT_NAME: usize    = 0x06;
const WEIGHT: usize             = 0x10;
const WIDTH: usize              = 0x11;
const SLANT: usize              = 0x12;
const ITALIC: usize             = 0x13;
const PALETTE_INDEX: usize      = 0xf8;
const PALETTE_OVERRIDES: usize  = 0xf9;
const VARIATIONS: usize         = 0xfa;
const FACTORY_ID: usize         = 0xfc;
const FONT_INDEX: usize         = 0xfd;
const SENTINEL: usize           = 0xff;

/// Width percentages for each of the width classes
const WIDTH_FOR_CLASS: [f32; 16] = [50.0, 50.0, 62.5, 75.0, 87.5, 100.0, 112.5, 125.0, 150.0, 200.0, 200.0, 200.0, 200.0, 200.0, 200.0, 200.0];

///
/// The slant of a font
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FontSlant {
    Upright,
    Italic,
    Oblique
}

///
/// The weight, width and slant of a font
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FontStyle {
    /// Weight, 1-1000 (400 is normal)
    pub weight: u32,

    /// Width class, 1-9 (5 is normal)
    pub width: u32,

    pub slant: FontSlant,
}

///
/// Describes a typeface so a font manager on the replaying side can find a matching font
///
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family_name:        String,
    pub full_name:          String,
    pub postscript_name:    String,
    pub style:              FontStyle,

    /// Index of the face within a font collection file
    pub collection_index:   u32,

    /// Variation axis settings, as (axis tag, value) pairs
    pub variation:          Vec<(u32, f32)>,

    pub factory_id:         u32,

    /// Colour palette selected for color fonts
    pub palette_index:      u32,

    /// Palette entries replaced for color fonts, as (index, color) pairs
    pub palette_overrides:  Vec<(u32, u32)>,
}

///
/// A typeface: the font descriptor along with the (undecoded) font data it was created from
///
/// The font data is passed through as bytes: turning it into glyphs is up to the surface that replays the picture.
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Typeface {
    pub descriptor: FontDescriptor,
    pub data:       Arc<Vec<u8>>,
}

impl Default for FontSlant {
    fn default() -> FontSlant { FontSlant::Upright }
}

impl Default for FontStyle {
    fn default() -> FontStyle {
        FontStyle::normal()
    }
}

impl FontSlant {
    fn to_bits(self) -> u32 {
        match self {
            FontSlant::Upright  => 0,
            FontSlant::Italic   => 1,
            FontSlant::Oblique  => 2
        }
    }
}

impl FontStyle {
    ///
    /// The normal font style (weight 400, normal width, upright)
    ///
    pub fn normal() -> FontStyle {
        FontStyle { weight: 400, width: 5, slant: FontSlant::Upright }
    }

    ///
    /// Packs this style into the style bits written at the start of a font descriptor
    ///
    pub fn to_bits(&self) -> u32 {
        (self.weight << 16) | ((self.width & 0xff) << 8) | self.slant.to_bits()
    }

    ///
    /// The width of this style as a percentage of the normal width
    ///
    pub fn width_percent(&self) -> f32 {
        WIDTH_FOR_CLASS[(self.width & 0xf) as usize]
    }

    ///
    /// Finds the width class closest to a width percentage
    ///
    pub fn width_from_percent(percent: f32) -> u32 {
        (1..=9u32)
            .min_by(|a, b| {
                let dist_a = (WIDTH_FOR_CLASS[*a as usize] - percent).abs();
                let dist_b = (WIDTH_FOR_CLASS[*b as usize] - percent).abs();

                dist_a.partial_cmp(&dist_b).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(5)
    }
}

impl FontDescriptor {
    ///
    /// Creates a descriptor for a font family with the normal style
    ///
    pub fn with_family(family_name: &str) -> FontDescriptor {
        FontDescriptor {
            family_name: family_name.to_string(),
            ..FontDescriptor::default()
        }
    }

    ///
    /// Writes this descriptor in the tagged format used by the typeface table
    ///
    pub fn serialize(&self, stream: &mut StreamWriter) {
        let style = &self.style;

        stream.write_packed_uint(style.to_bits() as usize);

        for (id, string) in [(FAMILY_NAME, &self.family_name), (FULL_NAME, &self.full_name), (POSTSCRIPT_NAME, &self.postscript_name)] {
            if !string.is_empty() {
                stream.write_packed_uint(id);
                stream.write_packed_string(string);
            }
        }

        let slant   = if style.slant == FontSlant::Upright { 0.0 } else { 14.0 };
        let italic  = if style.slant == FontSlant::Italic { 1.0 } else { 0.0 };

        for (id, scalar) in [(WEIGHT, style.weight as f32), (WIDTH, style.width_percent()), (SLANT, slant), (ITALIC, italic)] {
            stream.write_packed_uint(id);
            stream.write_f32(scalar);
        }

        if self.collection_index > 0 {
            stream.write_packed_uint(FONT_INDEX);
            stream.write_packed_uint(self.collection_index as usize);
        }

        if self.palette_index > 0 {
            stream.write_packed_uint(PALETTE_INDEX);
            stream.write_packed_uint(self.palette_index as usize);
        }

        if !self.palette_overrides.is_empty() {
            stream.write_packed_uint(PALETTE_OVERRIDES);
            stream.write_packed_uint(self.palette_overrides.len());
            for (index, color) in self.palette_overrides.iter() {
                stream.write_packed_uint(*index as usize);
                stream.write_u32(*color);
            }
        }

        if !self.variation.is_empty() {
            stream.write_packed_uint(VARIATIONS);
            stream.write_packed_uint(self.variation.len());
            for (axis, value) in self.variation.iter() {
                stream.write_u32(*axis);
                stream.write_f32(*value);
            }
        }

        stream.write_packed_uint(FACTORY_ID);
        stream.write_packed_uint(self.factory_id as usize);

        stream.write_packed_uint(SENTINEL);
    }

    ///
    /// Reads a descriptor written by `serialize()`
    ///
    /// The style is rebuilt from the scalar fields where they're present, falling back to the packed style bits.
    ///
    pub fn deserialize(stream: &mut StreamReader) -> Result<FontDescriptor, PictureError> {
        let mut desc    = FontDescriptor::default();

        let style_bits  = stream.read_packed_uint()?;
        let mut weight  = ((style_bits >> 16) & 0xffff) as f32;
        let mut width   = WIDTH_FOR_CLASS[(style_bits >> 8) & 0xf];
        let mut slant   = if (style_bits & 0xf) != 0 { 14.0 } else { 0.0 };
        let mut italic  = if (style_bits & 0xf) == 1 { 1.0 } else { 0.0 };

        loop {
            match stream.read_packed_uint()? {
                SENTINEL            => break,

                FAMILY_NAME         => { desc.family_name = stream.read_packed_string()?; }
                FULL_NAME           => { desc.full_name = stream.read_packed_string()?; }
                POSTSCRIPT_NAME     => { desc.postscript_name = stream.read_packed_string()?; }
                WEIGHT              => { weight = stream.read_f32()?; }
                WIDTH               => { width = stream.read_f32()?; }
                SLANT               => { slant = stream.read_f32()?; }
                ITALIC              => { italic = stream.read_f32()?; }
                FONT_INDEX          => { desc.collection_index = stream.read_packed_uint()? as u32; }
                PALETTE_INDEX       => { desc.palette_index = stream.read_packed_uint()? as u32; }
                FACTORY_ID          => { desc.factory_id = stream.read_packed_uint()? as u32; }

                PALETTE_OVERRIDES   => {
                    let count = stream.read_packed_uint()?;
                    for _ in 0..count {
                        let index = stream.read_packed_uint()? as u32;
                        let color = stream.read_u32()?;
                        desc.palette_overrides.push((index, color));
                    }
                }

                VARIATIONS          => {
                    let count = stream.read_packed_uint()?;
                    for _ in 0..count {
                        let axis    = stream.read_u32()?;
                        let value   = stream.read_f32()?;
                        desc.variation.push((axis, value));
                    }
                }

                _                   => { return Err(PictureError::Invalid); }
            }
        }

        let slant = if italic > 0.0 {
            FontSlant::Italic
        } else if slant != 0.0 {
            FontSlant::Oblique
        } else {
            FontSlant::Upright
        };

        desc.style = FontStyle {
            weight: weight.round().max(0.0).min(1000.0) as u32,
            width:  FontStyle::width_from_percent(width),
            slant:  slant
        };

        Ok(desc)
    }
}

impl Typeface {
    ///
    /// Creates a typeface from a descriptor and its font data
    ///
    pub fn new(descriptor: FontDescriptor, data: Vec<u8>) -> Typeface {
        Typeface {
            descriptor: descriptor,
            data:       Arc::new(data)
        }
    }

    ///
    /// Writes an entry in the typeface table: the descriptor followed by the font data
    ///
    pub fn serialize(&self, stream: &mut StreamWriter) {
        self.descriptor.serialize(stream);
        stream.write_packed_uint(self.data.len());
        stream.write_bytes(&self.data);
    }

    ///
    /// Reads an entry from the typeface table
    ///
    pub fn deserialize(stream: &mut StreamReader) -> Result<Typeface, PictureError> {
        let descriptor  = FontDescriptor::deserialize(stream)?;
        let len         = stream.read_packed_uint()?;
        let data        = stream.read_bytes(len)?;

        Ok(Typeface::new(descriptor, data.to_vec()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptor_round_trip() {
        let desc = FontDescriptor {
            family_name:        "Lato".to_string(),
            postscript_name:    "Lato-BoldItalic".to_string(),
            style:              FontStyle { weight: 700, width: 7, slant: FontSlant::Italic },
            collection_index:   2,
            variation:          vec![(0x77676874, 650.0)],
            factory_id:         0x66726565,
            ..FontDescriptor::default()
        };

        let mut writer = StreamWriter::new();
        desc.serialize(&mut writer);

        let bytes       = writer.into_bytes();
        let mut reader  = StreamReader::new(&bytes);

        assert!(FontDescriptor::deserialize(&mut reader) == Ok(desc));
        assert!(reader.is_at_end());
    }

    #[test]
    fn empty_strings_are_not_written() {
        let mut writer = StreamWriter::new();
        FontDescriptor::default().serialize(&mut writer);

        // style bits (5 bytes) + 4 scalars (5 bytes each) + factory id (2 bytes) + sentinel
        assert!(writer.bytes_written() == 5 + 20 + 2 + 1);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let bytes       = [0, 0x42];
        let mut reader  = StreamReader::new(&bytes);

        assert!(FontDescriptor::deserialize(&mut reader) == Err(PictureError::Invalid));
    }

    #[test]
    fn style_bits_used_without_scalars() {
        let bits        = FontStyle { weight: 300, width: 3, slant: FontSlant::Oblique }.to_bits();

        let mut writer  = StreamWriter::new();
        writer.write_packed_uint(bits as usize);
        writer.write_packed_uint(SENTINEL);

        let bytes       = writer.into_bytes();
        let mut reader  = StreamReader::new(&bytes);
        let desc        = FontDescriptor::deserialize(&mut reader).unwrap();

        assert!(desc.style == FontStyle { weight: 300, width: 3, slant: FontSlant::Oblique });
    }

    #[test]
    fn closest_width_class() {
        assert!(FontStyle::width_from_percent(100.0) == 5);
        assert!(FontStyle::width_from_percent(110.0) == 6);
        assert!(FontStyle::width_from_percent(400.0) == 9);
        assert!(FontStyle::width_from_percent(10.0) == 1);
    }

    #[test]
    fn typeface_entry_round_trip() {
        let face        = Typeface::new(FontDescriptor::with_family("Inter"), vec![0, 1, 0, 0]);

        let mut writer  = StreamWriter::new();
        face.serialize(&mut writer);

        let bytes       = writer.into_bytes();
        let mut reader  = StreamReader::new(&bytes);

        assert!(Typeface::deserialize(&mut reader) == Ok(face));
    }
}
