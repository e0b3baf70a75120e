use super::*;
use crate::paint::*;
use crate::version::*;
use crate::geometry::*;

/// Converts a 16.16 fixed point value to a float
const FIXED_TO_FLOAT: f32 = 1.52587890625e-5;

/// The sRGB gamut as stored in a serialized color space
const SRGB_GAMUT: [f32; 9] = [
    0x6FA2 as f32 * FIXED_TO_FLOAT, 0x6299 as f32 * FIXED_TO_FLOAT, 0x24A0 as f32 * FIXED_TO_FLOAT,
    0x38F5 as f32 * FIXED_TO_FLOAT, 0xB785 as f32 * FIXED_TO_FLOAT, 0x0F84 as f32 * FIXED_TO_FLOAT,
    0x0390 as f32 * FIXED_TO_FLOAT, 0x18DA as f32 * FIXED_TO_FLOAT, 0xB6CF as f32 * FIXED_TO_FLOAT,
];

const TRANSFER_LINEAR: [f32; 7] = [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];

const TRANSFER_SRGB: [f32; 7] = [2.4, (1.0 / 1.055) as f32, (0.055 / 1.055) as f32, (1.0 / 12.92) as f32, 0.04045, 0.0, 0.0];

/// Version header, transfer function and gamut
const SERIALIZED_COLOR_SPACE_LEN: usize = 4 + 7*4 + 9*4;

///
/// Transforms the colors produced by a paint
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum ColorFilter {
    /// A 4x5 color matrix, stored row-major
    Matrix { matrix: [f32; 20], rgba_domain: bool, clamp: bool },

    /// Applies `inner` then `outer`
    Compose { outer: Box<ColorFilter>, inner: Box<ColorFilter> },

    /// Blends a constant color with the paint color
    Blend { color: Color4f, mode: BlendMode },

    LinearToSrgbGamma,
    SrgbToLinearGamma,
}

impl Flattenable for ColorFilter {
    fn factory_name(&self) -> &'static str {
        match self {
            ColorFilter::Matrix { .. }          => "SkMatrixColorFilter",
            ColorFilter::Compose { .. }         => "SkComposeColorFilter",
            ColorFilter::Blend { .. }           => "SkBlendModeColorFilter",
            ColorFilter::LinearToSrgbGamma      => "SkSRGBGammaColorFilter",
            ColorFilter::SrgbToLinearGamma      => "SkSRGBGammaColorFilter"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            ColorFilter::Matrix { matrix, rgba_domain, clamp } => {
                buffer.write_f32_array(matrix);
                buffer.write_bool(*rgba_domain);
                buffer.write_bool(*clamp);
            }

            ColorFilter::Compose { outer, inner } => {
                write_flattenable(buffer, Some(&**outer));
                write_flattenable(buffer, Some(&**inner));
            }

            ColorFilter::Blend { color, mode } => {
                buffer.write_color4f(*color);
                buffer.write_u32(mode.to_u32());
            }

            ColorFilter::LinearToSrgbGamma  => buffer.write_u32(0),
            ColorFilter::SrgbToLinearGamma  => buffer.write_u32(1)
        }
    }
}

fn read_matrix(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if !buffer.read_array_count(20) {
        return None;
    }

    let mut matrix = [0.0; 20];
    for val in matrix.iter_mut() {
        *val = buffer.read_f32();
    }

    let rgba_domain = buffer.read_bool();
    let clamp       = if buffer.is_version_lt(Version::UnclampedMatrixColorFilter) { true } else { buffer.read_bool() };

    if buffer.is_valid() {
        Some(Effect::ColorFilter(ColorFilter::Matrix { matrix, rgba_domain, clamp }))
    } else {
        None
    }
}

fn read_compose(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let outer = read_color_filter(buffer);
    let inner = read_color_filter(buffer);

    let filter = match (outer, inner) {
        (Some(outer), Some(inner))  => Some(ColorFilter::Compose { outer: Box::new(outer), inner: Box::new(inner) }),
        (Some(outer), None)         => Some(outer),
        (None, inner)               => inner
    };

    filter.map(Effect::ColorFilter)
}

fn read_blend_mode(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let color = if buffer.is_version_lt(Version::Blend4fColorFilter) {
        Color4f::from(buffer.read_color())
    } else {
        buffer.read_color4f()
    };

    let mode = match BlendMode::from_u32(buffer.read_u32()) {
        Some(mode)  => mode,
        None        => { buffer.invalidate(); return None; }
    };

    if buffer.is_valid() {
        Some(Effect::ColorFilter(ColorFilter::Blend { color, mode }))
    } else {
        None
    }
}

///
/// Reads the transfer function and gamut from a serialized color space
///
fn read_color_space(buffer: &mut ReadCursor) -> Option<([f32; 7], [f32; 9])> {
    let data = buffer.read_byte_array();
    if !buffer.validate(data.len() >= SERIALIZED_COLOR_SPACE_LEN) {
        return None;
    }

    // Only version 1 is understood
    if data[0] != 1 {
        return None;
    }

    let mut values = data[4..SERIALIZED_COLOR_SPACE_LEN].chunks_exact(4)
        .map(|val| f32::from_le_bytes([val[0], val[1], val[2], val[3]]));

    let mut transfer    = [0.0; 7];
    let mut gamut       = [0.0; 9];
    transfer.iter_mut().chain(gamut.iter_mut())
        .for_each(|val| *val = values.next().unwrap_or(0.0));

    Some((transfer, gamut))
}

fn read_color_space_xform(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let src = read_color_space(buffer);
    let dst = read_color_space(buffer);

    let filter = match (src, dst) {
        (Some((src_transfer, src_gamut)), Some((dst_transfer, dst_gamut))) if src_gamut == SRGB_GAMUT && dst_gamut == SRGB_GAMUT => {
            if src_transfer == TRANSFER_LINEAR && dst_transfer == TRANSFER_SRGB {
                Some(ColorFilter::LinearToSrgbGamma)
            } else if src_transfer == TRANSFER_SRGB && dst_transfer == TRANSFER_LINEAR {
                Some(ColorFilter::SrgbToLinearGamma)
            } else {
                None
            }
        }

        _ => None
    };

    match filter {
        Some(filter)                    => Some(Effect::ColorFilter(filter)),
        None if buffer.is_valid()       => skipped(name),
        None                            => None
    }
}

fn read_legacy_gamma(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    match buffer.read_u32() {
        0 => Some(Effect::ColorFilter(ColorFilter::LinearToSrgbGamma)),
        1 => Some(Effect::ColorFilter(ColorFilter::SrgbToLinearGamma)),
        _ => { buffer.invalidate(); None }
    }
}

fn skip_working_format(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_color_filter(buffer);

    let use_dst_transfer    = buffer.read_bool();
    let use_dst_gamut       = buffer.read_bool();
    let use_dst_alpha       = buffer.read_bool();

    if !use_dst_transfer {
        buffer.read_array_count(7);
        buffer.read_f32s(7);
    }
    if !use_dst_gamut {
        buffer.read_array_count(9);
        buffer.read_f32s(9);
    }
    if !use_dst_alpha {
        buffer.read_u32();
    }

    skipped(name)
}

fn skip_table(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    // Four 256-entry tables
    buffer.skip(4 * 256);
    skipped(name)
}

pub (super) fn register_color_filters(registry: &mut FlattenableRegistry) {
    registry.register(Category::ColorFilter, "SkMatrixColorFilter", read_matrix);
    registry.register(Category::ColorFilter, "SkComposeColorFilter", read_compose);
    registry.register(Category::ColorFilter, "SkBlendModeColorFilter", read_blend_mode);
    registry.register(Category::ColorFilter, "SkColorSpaceXformColorFilter", read_color_space_xform);
    registry.register(Category::ColorFilter, "SkSRGBGammaColorFilter", read_legacy_gamma);

    registry.register(Category::ColorFilter, "SkWorkingFormatColorFilter", skip_working_format);
    registry.register(Category::ColorFilter, "SkTableColorFilter", skip_table);

    registry.register(Category::ColorFilter, "SkRuntimeColorFilter", unskippable);

    registry.alias(Category::ColorFilter, "SkColorFilter_Matrix", "SkMatrixColorFilter");
    registry.alias(Category::ColorFilter, "SkModeColorFilter", "SkBlendModeColorFilter");
    registry.alias(Category::ColorFilter, "ColorSpaceXformColorFilter", "SkColorSpaceXformColorFilter");
    registry.alias(Category::ColorFilter, "SkTable_ColorFilter", "SkTableColorFilter");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::*;

    fn round_trip(filter: &ColorFilter) -> Option<ColorFilter> {
        let mut buffer = WriteCursor::new();
        write_flattenable(&mut buffer, Some(filter));

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        let result = read_color_filter(&mut rc);
        assert!(rc.is_at_end());
        result
    }

    fn serialized_color_space(transfer: &[f32; 7]) -> Vec<u8> {
        let mut data = vec![1, 0, 0, 0];
        transfer.iter().chain(SRGB_GAMUT.iter()).for_each(|val| data.extend_from_slice(&val.to_le_bytes()));
        data
    }

    fn xform_payload(src: &[f32; 7], dst: &[f32; 7]) -> (Vec<u8>, FactoryTable) {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkColorSpaceXformColorFilter");

        let mut payload = WriteCursor::new();
        payload.write_byte_array(&serialized_color_space(src));
        payload.write_byte_array(&serialized_color_space(dst));
        let payload = payload.into_bytes();

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(payload.len() as u32);
        buffer.write_pad(&payload);

        (buffer.into_bytes(), factories)
    }

    #[test]
    fn matrix_round_trip() {
        let mut matrix = [0.0; 20];
        matrix[0]  = 1.0;
        matrix[6]  = 0.5;
        matrix[12] = 1.0;
        matrix[18] = 1.0;

        let filter = ColorFilter::Matrix { matrix, rgba_domain: true, clamp: false };
        assert!(round_trip(&filter) == Some(filter));
    }

    #[test]
    fn old_matrix_has_no_clamp_flag() {
        let mut buffer = WriteCursor::new();
        buffer.write_f32_array(&[0.0; 20]);
        buffer.write_bool(false);
        buffer.write_u32(5);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_version(104);

        assert!(read_matrix("SkColorFilter_Matrix", &mut rc).is_some());
        assert!(rc.read_u32() == 5);
    }

    #[test]
    fn compose_and_blend() {
        let filter = ColorFilter::Compose {
            outer: Box::new(ColorFilter::Blend { color: Color4f::from(Color::RED), mode: BlendMode::Multiply }),
            inner: Box::new(ColorFilter::SrgbToLinearGamma)
        };

        assert!(round_trip(&filter) == Some(filter));
        assert!(round_trip(&ColorFilter::LinearToSrgbGamma) == Some(ColorFilter::LinearToSrgbGamma));
    }

    #[test]
    fn compose_with_missing_outer_is_inner() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkComposeColorFilter");

        let mut inner = WriteCursor::with_tables(factories, TypefaceTable::new());
        write_flattenable(&mut inner, Some(&ColorFilter::SrgbToLinearGamma));
        let (inner_bytes, factories, _) = inner.into_parts();

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(4 + inner_bytes.len() as u32);
        buffer.write_i32(0);
        buffer.write_pad(&inner_bytes);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_color_filter(&mut rc) == Some(ColorFilter::SrgbToLinearGamma));
    }

    #[test]
    fn color_space_xform_to_gamma() {
        let (bytes, factories) = xform_payload(&TRANSFER_LINEAR, &TRANSFER_SRGB);
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);
        assert!(read_color_filter(&mut rc) == Some(ColorFilter::LinearToSrgbGamma));

        let (bytes, factories) = xform_payload(&TRANSFER_SRGB, &TRANSFER_LINEAR);
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);
        assert!(read_color_filter(&mut rc) == Some(ColorFilter::SrgbToLinearGamma));
    }

    #[test]
    fn other_transfer_functions_are_skipped() {
        let (bytes, factories) = xform_payload(&TRANSFER_SRGB, &TRANSFER_SRGB);
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_color_filter(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
    }

    #[test]
    fn bad_blend_mode() {
        let mut buffer = WriteCursor::new();
        buffer.write_color4f(Color4f::default());
        buffer.write_u32(29);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(read_blend_mode("SkBlendModeColorFilter", &mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn table_is_skipped() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkTable_ColorFilter");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(1024);
        buffer.write_pad(&[7; 1024]);
        buffer.write_u32(11);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_color_filter(&mut rc).is_none());
        assert!(rc.read_u32() == 11);
    }
}
