use crate::flat::*;
use crate::effects::*;
use crate::version::*;
use crate::geometry::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

const FLAT_HAS_TYPEFACE: u32    = 1;
const FLAT_HAS_EFFECTS: u32     = 2;

/// Marks a blend mode that's supplied by a blender flattenable instead of the packed word
const CUSTOM_BLEND: u32         = 0xff;

///
/// How the ends of stroked lines are drawn
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Cap {
    Butt,
    Round,
    Square
}

///
/// How the corners of stroked lines are drawn
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Join {
    Miter,
    Round,
    Bevel
}

///
/// Whether a shape is filled, stroked or both
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Style {
    Fill,
    Stroke,
    StrokeAndFill
}

///
/// How drawing combines with what's already on the surface
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcATop,
    DstATop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Multiply,
    Hue,
    Saturation,
    Color,
    Luminosity
}

///
/// Describes how a drawing operation is rendered
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Paint {
    pub anti_alias:     bool,
    pub color:          Color4f,
    pub stroke_width:   f32,
    pub stroke_miter:   f32,
    pub cap:            Cap,
    pub join:           Join,
    pub style:          Style,
    pub blend_mode:     BlendMode,

    pub path_effect:    Option<PathEffect>,
    pub shader:         Option<Shader>,
    pub mask_filter:    Option<MaskFilter>,
    pub color_filter:   Option<ColorFilter>,
    pub image_filter:   Option<ImageFilter>,
}

impl Cap {
    #[inline]
    fn from_bits(bits: u32) -> Cap {
        match bits {
            1 => Cap::Round,
            2 => Cap::Square,
            _ => Cap::Butt
        }
    }

    #[inline]
    fn to_bits(self) -> u32 {
        match self {
            Cap::Butt   => 0,
            Cap::Round  => 1,
            Cap::Square => 2
        }
    }
}

impl Join {
    #[inline]
    fn from_bits(bits: u32) -> Join {
        match bits {
            1 => Join::Round,
            2 => Join::Bevel,
            _ => Join::Miter
        }
    }

    #[inline]
    fn to_bits(self) -> u32 {
        match self {
            Join::Miter => 0,
            Join::Round => 1,
            Join::Bevel => 2
        }
    }
}

impl Style {
    #[inline]
    fn from_bits(bits: u32) -> Style {
        match bits {
            1 => Style::Stroke,
            2 => Style::StrokeAndFill,
            _ => Style::Fill
        }
    }

    #[inline]
    fn to_bits(self) -> u32 {
        match self {
            Style::Fill             => 0,
            Style::Stroke           => 1,
            Style::StrokeAndFill    => 2
        }
    }
}

impl BlendMode {
    /// Every blend mode, in the order of their serialized values
    pub const ALL: [BlendMode; 29] = [
        BlendMode::Clear, BlendMode::Src, BlendMode::Dst, BlendMode::SrcOver, BlendMode::DstOver,
        BlendMode::SrcIn, BlendMode::DstIn, BlendMode::SrcOut, BlendMode::DstOut, BlendMode::SrcATop,
        BlendMode::DstATop, BlendMode::Xor, BlendMode::Plus, BlendMode::Modulate, BlendMode::Screen,
        BlendMode::Overlay, BlendMode::Darken, BlendMode::Lighten, BlendMode::ColorDodge, BlendMode::ColorBurn,
        BlendMode::HardLight, BlendMode::SoftLight, BlendMode::Difference, BlendMode::Exclusion, BlendMode::Multiply,
        BlendMode::Hue, BlendMode::Saturation, BlendMode::Color, BlendMode::Luminosity
    ];

    /// The last (highest-numbered) blend mode
    pub const LAST: BlendMode = BlendMode::Luminosity;

    ///
    /// Converts a serialized blend mode, returning None if it's out of range
    ///
    pub fn from_u32(value: u32) -> Option<BlendMode> {
        BlendMode::ALL.get(value as usize).copied()
    }

    ///
    /// Converts a serialized blend mode, clamping values that are out of range to the last mode
    ///
    pub fn from_u32_clamped(value: u32) -> BlendMode {
        BlendMode::from_u32(value).unwrap_or(BlendMode::LAST)
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

impl Default for Paint {
    fn default() -> Paint {
        Paint {
            anti_alias:     false,
            color:          Color4f { r: 0.0, g: 0.0, b: 0.0, a: 1.0 },
            stroke_width:   0.0,
            stroke_miter:   4.0,
            cap:            Cap::Butt,
            join:           Join::Miter,
            style:          Style::Fill,
            blend_mode:     BlendMode::SrcOver,

            path_effect:    None,
            shader:         None,
            mask_filter:    None,
            color_filter:   None,
            image_filter:   None,
        }
    }
}

impl Paint {
    ///
    /// Creates a paint that fills with a solid color
    ///
    pub fn with_color(color: Color) -> Paint {
        Paint { color: Color4f::from(color), ..Paint::default() }
    }

    pub fn with_style(mut self, style: Style) -> Paint {
        self.style = style;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Paint {
        self.stroke_width = width;
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Paint {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_shader(mut self, shader: Shader) -> Paint {
        self.shader = Some(shader);
        self
    }

    pub fn with_image_filter(mut self, filter: ImageFilter) -> Paint {
        self.image_filter = Some(filter);
        self
    }

    ///
    /// True if this paint needs the effects block to be written
    ///
    fn has_effects(&self) -> bool {
        self.path_effect.is_some()
            || self.shader.is_some()
            || self.mask_filter.is_some()
            || self.color_filter.is_some()
            || self.image_filter.is_some()
            || self.blend_mode != BlendMode::SrcOver
    }
}

impl FlatEncoding for Paint {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        let has_effects = self.has_effects();
        let flat_flags  = if has_effects { FLAT_HAS_EFFECTS } else { 0 };

        let packed      = (if self.anti_alias { 1 } else { 0 })
            | (self.blend_mode.to_u32() << 8)
            | (self.cap.to_bits() << 16)
            | (self.join.to_bits() << 18)
            | (self.style.to_bits() << 20)
            | (flat_flags << 24);

        buffer.write_f32(self.stroke_width);
        buffer.write_f32(self.stroke_miter);
        buffer.write_color4f(self.color);
        buffer.write_u32(packed);

        if has_effects {
            write_flattenable(buffer, self.path_effect.as_ref());
            write_flattenable(buffer, self.shader.as_ref());
            write_flattenable(buffer, self.mask_filter.as_ref());
            write_flattenable(buffer, self.color_filter.as_ref());
            write_flattenable(buffer, self.image_filter.as_ref());

            if self.blend_mode != BlendMode::SrcOver {
                write_flattenable(buffer, Some(&Blender::Mode(self.blend_mode)));
            } else {
                write_flattenable::<Blender>(buffer, None);
            }
        }
    }
}

impl FlatDecoding for Paint {
    fn read_flat(buffer: &mut ReadCursor) -> Option<Paint> {
        let mut paint       = Paint::default();

        paint.stroke_width  = buffer.read_f32();
        paint.stroke_miter  = buffer.read_f32();
        paint.color         = buffer.read_color4f();

        let packed          = buffer.read_u32();
        let blend           = (packed >> 8) & 0xff;
        let flat_flags      = packed >> 24;

        paint.anti_alias    = packed & 1 != 0;
        paint.cap           = Cap::from_bits((packed >> 16) & 3);
        paint.join          = Join::from_bits((packed >> 18) & 3);
        paint.style         = Style::from_bits((packed >> 20) & 3);

        if blend != CUSTOM_BLEND {
            paint.blend_mode = BlendMode::from_u32_clamped(blend);
        }

        // Typefaces are stored in fonts, and haven't been part of a paint for a long time
        if !buffer.validate(flat_flags & FLAT_HAS_TYPEFACE == 0) {
            return None;
        }

        if flat_flags & FLAT_HAS_EFFECTS != 0 {
            paint.path_effect   = read_path_effect(buffer);
            paint.shader        = read_shader(buffer);
            paint.mask_filter   = read_mask_filter(buffer);
            paint.color_filter  = read_color_filter(buffer);

            if buffer.is_version_lt(Version::BlenderInPaint) {
                // Formerly the draw looper
                buffer.read_u32();
            }

            paint.image_filter  = read_image_filter(buffer);

            if !buffer.is_version_lt(Version::BlenderInPaint) {
                if let Some(Blender::Mode(mode)) = read_blender(buffer) {
                    paint.blend_mode = mode;
                }
            }
        }

        if buffer.is_valid() { Some(paint) } else { None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(paint: &Paint) -> Option<Paint> {
        let mut buffer = WriteCursor::new();
        paint.write_flat(&mut buffer);

        let (bytes, factories, typefaces) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories).with_typefaces(&typefaces);

        let result = Paint::read_flat(&mut rc);
        assert!(rc.is_at_end());
        result
    }

    #[test]
    fn default_paint_is_small() {
        let mut buffer = WriteCursor::new();
        Paint::default().write_flat(&mut buffer);

        assert!(buffer.bytes_written() == 28);
        assert!(buffer.factories().is_empty());
    }

    #[test]
    fn every_cap_join_style() {
        for cap in [Cap::Butt, Cap::Round, Cap::Square].iter() {
            for join in [Join::Miter, Join::Round, Join::Bevel].iter() {
                for style in [Style::Fill, Style::Stroke, Style::StrokeAndFill].iter() {
                    let paint = Paint { cap: *cap, join: *join, style: *style, anti_alias: true, stroke_width: 2.5, ..Paint::default() };
                    assert!(round_trip(&paint) == Some(paint));
                }
            }
        }
    }

    #[test]
    fn every_blend_mode() {
        for mode in BlendMode::ALL.iter() {
            let paint = Paint::with_color(Color::BLUE).with_blend_mode(*mode);
            assert!(round_trip(&paint) == Some(paint));
        }
    }

    #[test]
    fn blend_mode_uses_blender_flattenable() {
        let mut buffer = WriteCursor::new();
        Paint::default().with_blend_mode(BlendMode::Multiply).write_flat(&mut buffer);

        assert!(buffer.factories().name(1) == Some("SkBlendModeBlender"));
    }

    #[test]
    fn out_of_range_blend_clamps() {
        let mut buffer = WriteCursor::new();
        buffer.write_f32(0.0);
        buffer.write_f32(4.0);
        buffer.write_color4f(Color4f::default());
        buffer.write_u32(40 << 8);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(Paint::read_flat(&mut rc).map(|paint| paint.blend_mode) == Some(BlendMode::Luminosity));
    }

    #[test]
    fn legacy_typeface_flag_is_rejected() {
        let mut buffer = WriteCursor::new();
        buffer.write_f32(0.0);
        buffer.write_f32(4.0);
        buffer.write_color4f(Color4f::default());
        buffer.write_u32((3 << 8) | (FLAT_HAS_TYPEFACE << 24));

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(Paint::read_flat(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn old_paint_has_looper_word() {
        let mut buffer = WriteCursor::new();
        buffer.write_f32(1.0);
        buffer.write_f32(4.0);
        buffer.write_color4f(Color4f::from(Color::RED));
        buffer.write_u32((12 << 8) | (FLAT_HAS_EFFECTS << 24));
        buffer.write_i32(0);
        buffer.write_i32(0);
        buffer.write_i32(0);
        buffer.write_i32(0);
        buffer.write_u32(0);
        buffer.write_i32(0);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_version(86);
        let paint   = Paint::read_flat(&mut rc);

        assert!(rc.is_at_end());
        assert!(paint.map(|paint| paint.blend_mode) == Some(BlendMode::Plus));
    }

    #[test]
    fn paint_with_effects() {
        let paint = Paint {
            path_effect:    Some(PathEffect::Dash { intervals: vec![4.0, 2.0], phase: 1.0 }),
            mask_filter:    Some(MaskFilter::Blur { sigma: 2.0, style: BlurStyle::Outer, respect_ctm: true }),
            ..Paint::with_color(Color::GREEN)
        };

        assert!(round_trip(&paint) == Some(paint));
    }
}
