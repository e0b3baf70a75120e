use super::*;
use crate::flat::*;
use crate::image::*;
use crate::paint::*;
use crate::version::*;
use crate::geometry::*;
use crate::picture::*;

/// Crop rect flags meaning that every edge is set
const CROP_ALL_EDGES: u32 = 0xF;

/// Blend image filter mode meaning that a blender flattenable follows
const CUSTOM_BLEND_MODE: u32 = 0xFF;

/// Blend image filter mode meaning that arithmetic coefficients follow
const ARITHMETIC_BLEND_MODE: u32 = CUSTOM_BLEND_MODE + 1;

///
/// The ways the morphology filter can change the shapes in an image
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum MorphologyKind {
    Erode,
    Dilate
}

///
/// Whether a drop shadow draws the input as well as its shadow
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DropShadowMode {
    ShadowAndForeground,
    ShadowOnly
}

///
/// Transforms the image produced by a layer or a draw
///
/// Filters that take an input apply themselves to the result of that input (or to the source image if the
/// input is `None`).
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum ImageFilter {
    Blur { sigma_x: f32, sigma_y: f32, tile_mode: TileMode, input: Option<Box<ImageFilter>> },
    ColorFilter { filter: ColorFilter, input: Option<Box<ImageFilter>> },

    /// Applies `inner` then `outer`
    Compose { outer: Box<ImageFilter>, inner: Box<ImageFilter> },

    MatrixTransform { matrix: Matrix, sampling: SamplingOptions, input: Option<Box<ImageFilter>> },
    Offset { offset: Point, input: Option<Box<ImageFilter>> },
    Morphology { kind: MorphologyKind, radius_x: f32, radius_y: f32, input: Option<Box<ImageFilter>> },

    /// Evaluates a filter with an extra transform applied to its parameters
    LocalMatrix { matrix: Matrix, filter: Box<ImageFilter> },

    DropShadow { dx: f32, dy: f32, sigma_x: f32, sigma_y: f32, color: Color, mode: DropShadowMode, input: Option<Box<ImageFilter>> },
}

impl MorphologyKind {
    fn to_i32(self) -> i32 {
        match self {
            MorphologyKind::Erode   => 0,
            MorphologyKind::Dilate  => 1
        }
    }
}

impl DropShadowMode {
    fn to_u32(self) -> u32 {
        match self {
            DropShadowMode::ShadowAndForeground => 0,
            DropShadowMode::ShadowOnly          => 1
        }
    }
}

///
/// Writes the inputs section that starts every image filter
///
fn write_inputs(buffer: &mut WriteCursor, inputs: &[Option<&ImageFilter>]) {
    buffer.write_i32(inputs.len() as i32);

    for input in inputs.iter() {
        buffer.write_bool(input.is_some());
        if let Some(input) = input {
            write_flattenable(buffer, Some(*input));
        }
    }
}

///
/// Reads the inputs section that starts every image filter (`expected_inputs` is negative if any number is allowed)
///
/// Pictures from before crop rects were removed also have one here: it's read and dropped.
///
fn read_inputs(buffer: &mut ReadCursor, expected_inputs: i32) -> Option<Vec<Option<ImageFilter>>> {
    let count = buffer.read_i32();
    if !buffer.validate(count >= 0 && (expected_inputs < 0 || count == expected_inputs)) {
        return None;
    }

    let mut inputs = vec![];
    for _ in 0..count {
        if buffer.read_bool() {
            inputs.push(read_image_filter(buffer));
        } else {
            inputs.push(None);
        }

        if !buffer.is_valid() {
            return None;
        }
    }

    if buffer.is_version_lt(Version::RemoveDeprecatedCropRect) {
        buffer.read_rect();

        let flags = buffer.read_u32();
        if !buffer.validate(flags == 0 || flags == CROP_ALL_EDGES) {
            return None;
        }
    }

    if buffer.is_valid() { Some(inputs) } else { None }
}

///
/// Reads the inputs for a filter that has exactly one, returning it
///
fn read_single_input(buffer: &mut ReadCursor) -> Option<Option<Box<ImageFilter>>> {
    read_inputs(buffer, 1)
        .map(|inputs| inputs.into_iter().next().flatten().map(Box::new))
}

impl Flattenable for ImageFilter {
    fn factory_name(&self) -> &'static str {
        match self {
            ImageFilter::Blur { .. }            => "SkBlurImageFilter",
            ImageFilter::ColorFilter { .. }     => "SkColorFilterImageFilter",
            ImageFilter::Compose { .. }         => "SkComposeImageFilter",
            ImageFilter::MatrixTransform { .. } => "SkMatrixTransformImageFilter",
            ImageFilter::Offset { .. }          => "SkOffsetImageFilter",
            ImageFilter::Morphology { .. }      => "SkMorphologyImageFilter",
            ImageFilter::LocalMatrix { .. }     => "SkLocalMatrixImageFilter",
            ImageFilter::DropShadow { .. }      => "SkDropShadowImageFilter"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            ImageFilter::Blur { sigma_x, sigma_y, tile_mode, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                (sigma_x, sigma_y, tile_mode.to_u32()).write_flat(buffer);
            }

            ImageFilter::ColorFilter { filter, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                write_flattenable(buffer, Some(filter));
            }

            ImageFilter::Compose { outer, inner } => {
                write_inputs(buffer, &[Some(&**outer), Some(&**inner)]);
            }

            ImageFilter::MatrixTransform { matrix, sampling, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                (matrix, sampling).write_flat(buffer);
            }

            ImageFilter::Offset { offset, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                buffer.write_point(*offset);
            }

            ImageFilter::Morphology { kind, radius_x, radius_y, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                (radius_x, radius_y, kind.to_i32()).write_flat(buffer);
            }

            ImageFilter::LocalMatrix { matrix, filter } => {
                write_inputs(buffer, &[Some(&**filter)]);
                matrix.write_flat(buffer);
            }

            ImageFilter::DropShadow { dx, dy, sigma_x, sigma_y, color, mode, input } => {
                write_inputs(buffer, &[input.as_deref()]);
                (dx, dy, sigma_x, sigma_y).write_flat(buffer);
                buffer.write_color(*color);
                buffer.write_u32(mode.to_u32());
            }
        }
    }
}

fn read_blur(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input       = read_single_input(buffer)?;
    let sigma_x     = buffer.read_f32();
    let sigma_y     = buffer.read_f32();
    let tile_mode   = TileMode::read(buffer)?;

    if buffer.is_valid() { Some(ImageFilter::Blur { sigma_x, sigma_y, tile_mode, input }) } else { None }
}

fn read_color_filter_image_filter(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input   = read_single_input(buffer)?;
    let filter  = read_color_filter(buffer)?;

    Some(ImageFilter::ColorFilter { filter, input })
}

fn read_compose(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let mut inputs  = read_inputs(buffer, 2)?.into_iter();
    let outer       = inputs.next().flatten();
    let inner       = inputs.next().flatten();

    match (outer, inner) {
        (Some(outer), Some(inner))  => Some(ImageFilter::Compose { outer: Box::new(outer), inner: Box::new(inner) }),
        (Some(outer), None)         => Some(outer),
        (None, inner)               => inner
    }
}

fn read_matrix_transform(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input   = read_single_input(buffer)?;
    let matrix  = Matrix::read_flat(buffer)?;

    let sampling = if buffer.is_version_lt(Version::MatrixImageFilterSampling) {
        // Legacy filter quality
        match buffer.read_i32() {
            0 => SamplingOptions::new(FilterMode::Nearest, MipmapMode::None),
            1 => SamplingOptions::new(FilterMode::Linear, MipmapMode::None),
            2 => SamplingOptions::new(FilterMode::Linear, MipmapMode::Nearest),
            _ => SamplingOptions::new(FilterMode::Linear, MipmapMode::Linear)
        }
    } else {
        SamplingOptions::read_flat(buffer)?
    };

    if buffer.is_valid() { Some(ImageFilter::MatrixTransform { matrix, sampling, input }) } else { None }
}

fn read_offset(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input   = read_single_input(buffer)?;
    let offset  = buffer.read_point();

    if buffer.is_valid() { Some(ImageFilter::Offset { offset, input }) } else { None }
}

fn read_morphology(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input       = read_single_input(buffer)?;
    let radius_x    = buffer.read_f32();
    let radius_y    = buffer.read_f32();

    let kind = match buffer.read_i32() {
        0 => MorphologyKind::Erode,
        1 => MorphologyKind::Dilate,
        _ => { buffer.invalidate(); return None; }
    };

    if buffer.is_valid() { Some(ImageFilter::Morphology { kind, radius_x, radius_y, input }) } else { None }
}

fn read_local_matrix(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input   = read_single_input(buffer)?;
    let matrix  = Matrix::read_flat(buffer)?;

    // A local matrix does nothing without a filter to apply it to
    input.map(|filter| ImageFilter::LocalMatrix { matrix, filter })
}

fn read_drop_shadow(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    let input   = read_single_input(buffer)?;
    let dx      = buffer.read_f32();
    let dy      = buffer.read_f32();
    let sigma_x = buffer.read_f32();
    let sigma_y = buffer.read_f32();
    let color   = buffer.read_color();

    let mode = match buffer.read_u32() {
        0 => DropShadowMode::ShadowAndForeground,
        1 => DropShadowMode::ShadowOnly,
        _ => { buffer.invalidate(); return None; }
    };

    if buffer.is_valid() { Some(ImageFilter::DropShadow { dx, dy, sigma_x, sigma_y, color, mode, input }) } else { None }
}

fn skip_blend(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 2)?;

    match buffer.read_u32() {
        ARITHMETIC_BLEND_MODE => {
            if buffer.validate(!buffer.is_version_lt(Version::CombineBlendArithmeticFilters)) {
                buffer.read_f32s(4);
                buffer.read_bool();
            }
        }

        CUSTOM_BLEND_MODE => { read_blender(buffer); }

        _ => { }
    }

    skipped(name)
}

fn skip_legacy_arithmetic(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if !buffer.validate(buffer.is_version_lt(Version::CombineBlendArithmeticFilters)) {
        return None;
    }

    read_inputs(buffer, 2)?;
    buffer.read_f32s(4);
    buffer.read_bool();

    skipped(name)
}

fn skip_crop(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 1)?;
    buffer.read_rect();

    if !buffer.is_version_lt(Version::CropImageFilterSupportsTiling) {
        buffer.read_u32();
    }

    skipped(name)
}

fn skip_legacy_tile(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 1)?;
    buffer.read_rect();     // Source
    buffer.read_rect();     // Destination

    skipped(name)
}

fn skip_displacement_map(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 2)?;
    buffer.read_u32();      // X channel
    buffer.read_u32();      // Y channel
    buffer.read_f32();      // Scale

    skipped(name)
}

fn skip_image(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if buffer.is_version_lt(Version::ImageFilterImageSampling) {
        buffer.read_u32();
    } else {
        SamplingOptions::read_flat(buffer);
    }

    buffer.read_rect();
    buffer.read_rect();
    Image::read_flat(buffer);

    skipped(name)
}

fn skip_lighting(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 1)?;

    buffer.read_u32();      // Light type
    buffer.read_color();
    buffer.read_f32s(3);    // Position
    buffer.read_f32s(3);    // Direction
    buffer.read_f32();      // Falloff exponent
    buffer.read_f32();      // Cosine of the cutoff angle

    buffer.read_u32();      // Material type
    buffer.read_f32();      // Surface depth
    buffer.read_f32();      // K
    buffer.read_f32();      // Shininess

    skipped(name)
}

fn skip_legacy_lighting(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 1)?;

    let light_type = buffer.read_u32();
    buffer.read_f32s(3);    // Color

    match light_type {
        0 | 1   => { buffer.read_f32s(3); }
        2       => { buffer.read_f32s(3 + 3 + 2 + 5); }
        _       => { }
    }

    buffer.read_f32s(3);    // Surface scale, ks and shininess

    skipped(name)
}

fn skip_magnifier(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if !buffer.is_version_lt(Version::RevampMagnifierFilter) {
        read_inputs(buffer, 1)?;
        buffer.read_rect();     // Lens
        buffer.read_f32();      // Zoom
        buffer.read_f32();      // Inset
        SamplingOptions::read_flat(buffer);
    }

    skipped(name)
}

fn skip_matrix_convolution(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 1)?;

    let width   = buffer.read_i32() as i64;
    let height  = buffer.read_i32() as i64;
    let count   = buffer.read_i32();

    if !buffer.validate(count >= 0 && width * height == count as i64) {
        return None;
    }

    buffer.read_f32s(count as usize);
    buffer.read_f32();      // Gain
    buffer.read_f32();      // Bias
    buffer.read_i32();      // Kernel offset
    buffer.read_i32();

    if buffer.is_version_lt(Version::ConvolutionImageFilterTilingUpdate) {
        buffer.read_i32();
    }

    buffer.read_bool();     // Convolve alpha

    skipped(name)
}

fn skip_picture(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if buffer.read_bool() {
        skip_picture_in_buffer(buffer);
    }

    buffer.read_rect();

    skipped(name)
}

fn skip_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_inputs(buffer, 0)?;

    if buffer.is_version_lt(Version::ShaderImageFilterSerializeShader) {
        Paint::read_flat(buffer);
    } else {
        read_shader(buffer);
        buffer.read_bool();     // Dither
    }

    skipped(name)
}

pub (super) fn register_image_filters(registry: &mut FlattenableRegistry) {
    registry.register(Category::ImageFilter, "SkBlurImageFilter", |_, buffer| read_blur(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkColorFilterImageFilter", |_, buffer| read_color_filter_image_filter(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkComposeImageFilter", |_, buffer| read_compose(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkMatrixTransformImageFilter", |_, buffer| read_matrix_transform(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkOffsetImageFilter", |_, buffer| read_offset(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkMorphologyImageFilter", |_, buffer| read_morphology(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkLocalMatrixImageFilter", |_, buffer| read_local_matrix(buffer).map(Effect::ImageFilter));
    registry.register(Category::ImageFilter, "SkDropShadowImageFilter", |_, buffer| read_drop_shadow(buffer).map(Effect::ImageFilter));

    registry.register(Category::ImageFilter, "SkBlendImageFilter", skip_blend);
    registry.register(Category::ImageFilter, "SkArithmeticImageFilter", skip_legacy_arithmetic);
    registry.register(Category::ImageFilter, "SkCropImageFilter", skip_crop);
    registry.register(Category::ImageFilter, "SkTileImageFilter", skip_legacy_tile);
    registry.register(Category::ImageFilter, "SkDisplacementMapImageFilter", skip_displacement_map);
    registry.register(Category::ImageFilter, "SkImageImageFilter", skip_image);
    registry.register(Category::ImageFilter, "SkLightingImageFilter", skip_lighting);
    registry.register(Category::ImageFilter, "SkDiffuseLightingImageFilter", skip_legacy_lighting);
    registry.register(Category::ImageFilter, "SkMagnifierImageFilter", skip_magnifier);
    registry.register(Category::ImageFilter, "SkMatrixConvolutionImageFilter", skip_matrix_convolution);
    registry.register(Category::ImageFilter, "SkMergeImageFilter", |name, buffer| { read_inputs(buffer, -1)?; skipped(name) });
    registry.register(Category::ImageFilter, "SkPictureImageFilter", skip_picture);
    registry.register(Category::ImageFilter, "SkShaderImageFilter", skip_shader);

    registry.register(Category::ImageFilter, "SkRuntimeImageFilter", unskippable);

    let aliases = [
        ("SkBlurImageFilterImpl", "SkBlurImageFilter"),
        ("SkColorFilterImageFilterImpl", "SkColorFilterImageFilter"),
        ("SkComposeImageFilterImpl", "SkComposeImageFilter"),
        ("SkMatrixImageFilter", "SkMatrixTransformImageFilter"),
        ("SkOffsetImageFilterImpl", "SkOffsetImageFilter"),
        ("SkMorphologyImageFilterImpl", "SkMorphologyImageFilter"),
        ("SkDropShadowImageFilterImpl", "SkDropShadowImageFilter"),
        ("SkXfermodeImageFilter_Base", "SkBlendImageFilter"),
        ("SkXfermodeImageFilterImpl", "SkBlendImageFilter"),
        ("ArithmeticImageFilterImpl", "SkArithmeticImageFilter"),
        ("SkTileImageFilterImpl", "SkTileImageFilter"),
        ("SkDisplacementMapEffect", "SkDisplacementMapImageFilter"),
        ("SkDisplacementMapEffectImpl", "SkDisplacementMapImageFilter"),
        ("SkImageSourceImpl", "SkImageImageFilter"),
        ("SkSpecularLightingImageFilter", "SkDiffuseLightingImageFilter"),
        ("SkMatrixConvolutionImageFilterImpl", "SkMatrixConvolutionImageFilter"),
        ("SkMergeImageFilterImpl", "SkMergeImageFilter"),
        ("SkPictureImageFilterImpl", "SkPictureImageFilter"),
        ("SkPaintImageFilter", "SkShaderImageFilter"),
        ("SkPaintImageFilterImpl", "SkShaderImageFilter"),
    ];

    for (alias, name) in aliases.iter() {
        registry.alias(Category::ImageFilter, alias, name);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::*;

    fn round_trip(filter: &ImageFilter) -> Option<ImageFilter> {
        let mut buffer = WriteCursor::new();
        write_flattenable(&mut buffer, Some(filter));

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        let result = read_image_filter(&mut rc);
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
        result
    }

    fn wrap(name: &str, payload: &[u8]) -> (Vec<u8>, FactoryTable) {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name(name);

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(payload.len() as u32);
        buffer.write_pad(payload);
        buffer.write_u32(0x600d);

        (buffer.into_bytes(), factories)
    }

    fn offset(x: f32, y: f32) -> ImageFilter {
        ImageFilter::Offset { offset: Point::new(x, y), input: None }
    }

    #[test]
    fn blur_with_input() {
        let filter = ImageFilter::Blur { sigma_x: 2.0, sigma_y: 3.0, tile_mode: TileMode::Decal, input: Some(Box::new(offset(1.0, 2.0))) };
        assert!(round_trip(&filter) == Some(filter));
    }

    #[test]
    fn filters_round_trip() {
        let filters = vec![
            ImageFilter::ColorFilter { filter: ColorFilter::LinearToSrgbGamma, input: None },
            ImageFilter::Compose { outer: Box::new(offset(1.0, 1.0)), inner: Box::new(offset(2.0, 2.0)) },
            ImageFilter::MatrixTransform { matrix: Matrix::scale(2.0, 2.0), sampling: SamplingOptions::new(FilterMode::Linear, MipmapMode::Nearest), input: None },
            ImageFilter::Morphology { kind: MorphologyKind::Dilate, radius_x: 1.0, radius_y: 4.0, input: None },
            ImageFilter::LocalMatrix { matrix: Matrix::translate(5.0, 6.0), filter: Box::new(offset(1.0, 0.0)) },
            ImageFilter::DropShadow { dx: 3.0, dy: 3.0, sigma_x: 1.0, sigma_y: 1.0, color: Color::BLACK, mode: DropShadowMode::ShadowOnly, input: None },
        ];

        for filter in filters.iter() {
            assert!(round_trip(filter).as_ref() == Some(filter));
        }
    }

    #[test]
    fn local_matrix_needs_an_input() {
        let mut payload = WriteCursor::new();
        write_inputs(&mut payload, &[None]);
        Matrix::identity().write_flat(&mut payload);

        let (bytes, factories)  = wrap("SkLocalMatrixImageFilter", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 0x600d);
    }

    #[test]
    fn compose_with_one_input_is_that_input() {
        let mut payload = WriteCursor::new();
        write_inputs(&mut payload, &[None, Some(&offset(4.0, 5.0))]);
        let (payload, payload_factories, _) = payload.into_parts();

        let mut factories   = payload_factories.clone();
        let index           = factories.intern_name("SkComposeImageFilterImpl");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(payload.len() as u32);
        buffer.write_pad(&payload);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc) == Some(offset(4.0, 5.0)));
    }

    #[test]
    fn legacy_crop_rect() {
        let mut payload = WriteCursor::new();
        payload.write_i32(1);
        payload.write_bool(false);
        payload.write_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        payload.write_u32(CROP_ALL_EDGES);
        (1.0f32, 1.0f32, 0u32).write_flat(&mut payload);

        let (bytes, factories)  = wrap("SkBlurImageFilterImpl", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories).with_version(102);

        assert!(read_image_filter(&mut rc) == Some(ImageFilter::Blur { sigma_x: 1.0, sigma_y: 1.0, tile_mode: TileMode::Clamp, input: None }));
        assert!(rc.read_u32() == 0x600d);
    }

    #[test]
    fn bad_crop_flags() {
        let mut payload = WriteCursor::new();
        payload.write_i32(1);
        payload.write_bool(false);
        payload.write_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        payload.write_u32(3);
        (1.0f32, 1.0f32, 0u32).write_flat(&mut payload);

        let (bytes, factories)  = wrap("SkBlurImageFilter", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories).with_version(100);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn wrong_input_count() {
        let mut payload = WriteCursor::new();
        write_inputs(&mut payload, &[None, None]);
        (1.0f32, 1.0f32, 0u32).write_flat(&mut payload);

        let (bytes, factories)  = wrap("SkBlurImageFilter", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn merge_is_skipped() {
        let mut payload = WriteCursor::new();
        write_inputs(&mut payload, &[Some(&offset(1.0, 1.0)), None, Some(&offset(2.0, 2.0))]);
        let (payload, payload_factories, _) = payload.into_parts();

        let mut factories   = payload_factories.clone();
        let index           = factories.intern_name("SkMergeImageFilter");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(payload.len() as u32);
        buffer.write_pad(&payload);
        buffer.write_u32(0x600d);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 0x600d);
    }

    #[test]
    fn matrix_convolution_is_skipped() {
        let mut payload = WriteCursor::new();
        write_inputs(&mut payload, &[None]);
        payload.write_i32(2);
        payload.write_i32(2);
        payload.write_i32(4);
        payload.write_pad(&[0; 16]);
        (1.0f32, 0.0f32, 0i32, 0i32, true).write_flat(&mut payload);

        let (bytes, factories)  = wrap("SkMatrixConvolutionImageFilterImpl", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 0x600d);
    }

    #[test]
    fn arithmetic_blend_needs_a_new_picture() {
        let mut payload = WriteCursor::new();
        payload.write_i32(2);
        payload.write_bool(false);
        payload.write_bool(false);
        payload.write_rect(Rect::new(0.0, 0.0, 0.0, 0.0));
        payload.write_u32(0);
        payload.write_u32(ARITHMETIC_BLEND_MODE);
        (0.0f32, 0.0f32, 0.0f32, 0.0f32).write_flat(&mut payload);
        payload.write_bool(true);

        let (bytes, factories)  = wrap("SkXfermodeImageFilterImpl", &payload.into_bytes());
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories).with_version(97);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn runtime_filter_invalidates() {
        let (bytes, factories)  = wrap("SkRuntimeImageFilter", &[0; 8]);
        let mut rc              = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_image_filter(&mut rc).is_none());
        assert!(!rc.is_valid());
    }
}
