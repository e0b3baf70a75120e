use super::*;
use crate::flat::*;
use crate::image::*;
use crate::version::*;
use crate::picture::*;
use crate::geometry::*;

const GRADIENT_HAS_POSITIONS: u32       = 0x80000000;
const GRADIENT_HAS_LEGACY_MATRIX: u32   = 0x40000000;
const GRADIENT_HAS_COLOR_SPACE: u32     = 0x20000000;
const GRADIENT_TILE_SHIFT: u32          = 8;
const GRADIENT_TILE_MASK: u32           = 0xf;
const GRADIENT_PREMUL: u32              = 0x1;

/// Blend mode value meaning that a blender flattenable follows
const CUSTOM_BLEND_MODE: u32            = 0xff;

///
/// The colors and stops shared by all the gradient shaders
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gradient {
    pub colors:         Vec<Color4f>,

    /// The position of each color, or None for evenly spaced colors
    pub positions:      Option<Vec<f32>>,

    pub tile_mode:      TileMode,

    /// True if the colors are interpolated after premultiplying
    pub premul:         bool,

    /// The serialized color space of the colors, if they're not sRGB
    pub color_space:    Option<Vec<u8>>,
}

///
/// Generates the colors used to fill a shape
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Shader {
    LinearGradient { gradient: Gradient, start: Point, end: Point },
    RadialGradient { gradient: Gradient, center: Point, radius: f32 },
    ConicalGradient { gradient: Gradient, start: Point, end: Point, start_radius: f32, end_radius: f32 },
    SweepGradient { gradient: Gradient, center: Point, t_bias: f32, t_scale: f32 },

    /// Fills using an image
    Image { image: Image, tile_x: TileMode, tile_y: TileMode, sampling: SamplingOptions, raw: bool },

    /// Applies a transform to another shader
    LocalMatrix { matrix: Matrix, shader: Box<Shader> },

    /// Fills with a single color
    Color(Color4f),
}

impl Gradient {
    ///
    /// Creates a clamped gradient with evenly spaced colors
    ///
    pub fn new(colors: Vec<Color4f>) -> Gradient {
        Gradient {
            colors:         colors,
            positions:      None,
            tile_mode:      TileMode::Clamp,
            premul:         false,
            color_space:    None
        }
    }

    pub fn with_positions(mut self, positions: Vec<f32>) -> Gradient {
        self.positions = Some(positions);
        self
    }

    fn write(&self, buffer: &mut WriteCursor) {
        let mut flags = (self.tile_mode.to_u32() & GRADIENT_TILE_MASK) << GRADIENT_TILE_SHIFT;
        if self.positions.is_some()     { flags |= GRADIENT_HAS_POSITIONS; }
        if self.color_space.is_some()   { flags |= GRADIENT_HAS_COLOR_SPACE; }
        if self.premul                  { flags |= GRADIENT_PREMUL; }

        buffer.write_u32(flags);

        buffer.write_u32(self.colors.len() as u32);
        self.colors.iter().for_each(|color| buffer.write_color4f(*color));

        if let Some(color_space) = &self.color_space {
            buffer.write_byte_array(color_space);
        }
        if let Some(positions) = &self.positions {
            buffer.write_f32_array(positions);
        }
    }

    ///
    /// Reads the gradient information, along with the local matrix that older pictures stored with it
    ///
    fn read(buffer: &mut ReadCursor) -> Option<(Gradient, Option<Matrix>)> {
        let flags       = buffer.read_u32();
        let tile_mode   = match TileMode::from_u32((flags >> GRADIENT_TILE_SHIFT) & GRADIENT_TILE_MASK) {
            Some(tile_mode) => tile_mode,
            None            => { buffer.invalidate(); return None; }
        };

        let color_count = buffer.read_u32() as usize;
        if !buffer.validate_can_read(color_count, 16) {
            return None;
        }
        let colors = (0..color_count).map(|_| buffer.read_color4f()).collect::<Vec<_>>();

        let color_space = if flags & GRADIENT_HAS_COLOR_SPACE != 0 {
            Some(buffer.read_byte_array().to_vec())
        } else {
            None
        };

        let positions = if flags & GRADIENT_HAS_POSITIONS != 0 {
            if !buffer.read_array_count(color_count) {
                return None;
            }
            Some(buffer.read_f32s(color_count))
        } else {
            None
        };

        let local_matrix = if flags & GRADIENT_HAS_LEGACY_MATRIX != 0 {
            if !buffer.validate(buffer.is_version_lt(Version::NoShaderLocalMatrix)) {
                return None;
            }
            Some(Matrix::read_flat(buffer)?)
        } else {
            None
        };

        if !buffer.is_valid() {
            return None;
        }

        let gradient = Gradient {
            colors:         colors,
            positions:      positions,
            tile_mode:      tile_mode,
            premul:         flags & GRADIENT_PREMUL != 0,
            color_space:    color_space
        };

        Some((gradient, local_matrix))
    }
}

impl Shader {
    ///
    /// Wraps this shader in a local matrix if one was stored with it
    ///
    fn with_local_matrix(self, matrix: Option<Matrix>) -> Shader {
        match matrix {
            Some(matrix) if !matrix.is_identity()   => Shader::LocalMatrix { matrix: matrix, shader: Box::new(self) },
            _                                       => self
        }
    }
}

impl Flattenable for Shader {
    fn factory_name(&self) -> &'static str {
        match self {
            Shader::LinearGradient { .. }   => "SkLinearGradient",
            Shader::RadialGradient { .. }   => "SkRadialGradient",
            Shader::ConicalGradient { .. }  => "SkConicalGradient",
            Shader::SweepGradient { .. }    => "SkSweepGradient",
            Shader::Image { .. }            => "SkImageShader",
            Shader::LocalMatrix { .. }      => "SkLocalMatrixShader",
            Shader::Color(_)                => "SkColorShader"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            Shader::LinearGradient { gradient, start, end } => {
                gradient.write(buffer);
                (start, end).write_flat(buffer);
            }

            Shader::RadialGradient { gradient, center, radius } => {
                gradient.write(buffer);
                (center, radius).write_flat(buffer);
            }

            Shader::ConicalGradient { gradient, start, end, start_radius, end_radius } => {
                gradient.write(buffer);
                (start, end, start_radius, end_radius).write_flat(buffer);
            }

            Shader::SweepGradient { gradient, center, t_bias, t_scale } => {
                gradient.write(buffer);
                (center, t_bias, t_scale).write_flat(buffer);
            }

            Shader::Image { image, tile_x, tile_y, sampling, raw } => {
                buffer.write_u32(tile_x.to_u32());
                buffer.write_u32(tile_y.to_u32());
                sampling.write_flat(buffer);
                image.write_flat(buffer);
                buffer.write_bool(*raw);
            }

            Shader::LocalMatrix { matrix, shader } => {
                matrix.write_flat(buffer);
                write_flattenable(buffer, Some(&**shader));
            }

            Shader::Color(color) => {
                buffer.write_color4f(*color);
            }
        }
    }
}

fn read_linear_gradient(buffer: &mut ReadCursor) -> Option<Shader> {
    let (gradient, matrix)  = Gradient::read(buffer)?;
    let start               = buffer.read_point();
    let end                 = buffer.read_point();

    if !buffer.is_valid() { return None; }
    Some(Shader::LinearGradient { gradient, start, end }.with_local_matrix(matrix))
}

fn read_radial_gradient(buffer: &mut ReadCursor) -> Option<Shader> {
    let (gradient, matrix)  = Gradient::read(buffer)?;
    let center              = buffer.read_point();
    let radius              = buffer.read_f32();

    if !buffer.is_valid() { return None; }
    Some(Shader::RadialGradient { gradient, center, radius }.with_local_matrix(matrix))
}

fn read_conical_gradient(buffer: &mut ReadCursor) -> Option<Shader> {
    let (gradient, matrix)  = Gradient::read(buffer)?;
    let start               = buffer.read_point();
    let end                 = buffer.read_point();
    let start_radius        = buffer.read_f32();
    let end_radius          = buffer.read_f32();

    if !buffer.is_valid() { return None; }
    Some(Shader::ConicalGradient { gradient, start, end, start_radius, end_radius }.with_local_matrix(matrix))
}

fn read_sweep_gradient(buffer: &mut ReadCursor) -> Option<Shader> {
    let (gradient, matrix)  = Gradient::read(buffer)?;
    let center              = buffer.read_point();
    let t_bias              = buffer.read_f32();
    let t_scale             = buffer.read_f32();

    if !buffer.is_valid() { return None; }
    Some(Shader::SweepGradient { gradient, center, t_bias, t_scale }.with_local_matrix(matrix))
}

fn read_image_shader(buffer: &mut ReadCursor) -> Option<Shader> {
    let tile_x = TileMode::read(buffer)?;
    let tile_y = TileMode::read(buffer)?;

    // Older pictures could leave out the sampling options
    let has_sampling = !buffer.is_version_lt(Version::NoFilterQualityShaders) || buffer.read_bool();
    let sampling = if has_sampling {
        SamplingOptions::read_flat(buffer)?
    } else {
        SamplingOptions::default()
    };

    let matrix = if buffer.is_version_lt(Version::NoShaderLocalMatrix) {
        Some(Matrix::read_flat(buffer)?)
    } else {
        None
    };

    let image   = Image::read_flat(buffer)?;
    let raw     = if buffer.is_version_lt(Version::RawImageShaders) { false } else { buffer.read_bool() };

    if !buffer.is_valid() { return None; }
    Some(Shader::Image { image, tile_x, tile_y, sampling, raw }.with_local_matrix(matrix))
}

fn read_local_matrix_shader(buffer: &mut ReadCursor) -> Option<Shader> {
    let matrix = Matrix::read_flat(buffer)?;
    let shader = read_shader(buffer)?;

    Some(Shader::LocalMatrix { matrix: matrix, shader: Box::new(shader) })
}

fn read_color_shader(buffer: &mut ReadCursor) -> Option<Shader> {
    let color = if buffer.is_version_lt(Version::CombineColorShaders) {
        Color4f::from(buffer.read_color())
    } else {
        buffer.read_color4f()
    };

    if buffer.is_valid() { Some(Shader::Color(color)) } else { None }
}

fn read_color4f_shader(buffer: &mut ReadCursor) -> Option<Shader> {
    let color = buffer.read_color4f();

    // Color space
    if buffer.read_bool() {
        buffer.read_byte_array();
    }

    if buffer.is_valid() { Some(Shader::Color(color)) } else { None }
}

fn skip_blend_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_shader(buffer);
    read_shader(buffer);

    if buffer.read_u32() == CUSTOM_BLEND_MODE {
        read_blender(buffer);
    }

    skipped(name)
}

fn skip_color_filter_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_shader(buffer);
    read_color_filter(buffer);

    skipped(name)
}

fn skip_coord_clamp_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_shader(buffer);
    buffer.read_rect();

    skipped(name)
}

fn skip_picture_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    if buffer.is_version_lt(Version::NoShaderLocalMatrix) {
        Matrix::read_flat(buffer);
    }

    // Tile modes
    buffer.read_u32();
    buffer.read_u32();

    if buffer.is_version_lt(Version::NoFilterQualityShaders) {
        if buffer.is_version_lt(Version::PictureShaderFilterParam) {
            if buffer.read_bool() {
                skip_picture_in_buffer(buffer);
            }
        } else {
            buffer.read_u32();
            skip_picture_in_buffer(buffer);
        }
    } else {
        buffer.read_u32();
        skip_picture_in_buffer(buffer);
    }

    skipped(name)
}

fn skip_perlin_noise_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    buffer.read_u32();      // Type
    buffer.read_f32();      // Base frequency
    buffer.read_f32();
    buffer.read_u32();      // Octaves
    buffer.read_f32();      // Seed
    buffer.read_i32();      // Stitch tile size
    buffer.read_i32();

    skipped(name)
}

fn skip_working_color_space_shader(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    read_shader(buffer);

    let legacy = buffer.is_version_lt(Version::WorkingColorSpaceOutput);
    if !legacy {
        // Work in unpremul
        buffer.read_bool();
    }

    // Input color space
    if legacy || buffer.read_bool() {
        buffer.read_byte_array();
    }

    // Output color space
    if !legacy && buffer.read_bool() {
        buffer.read_byte_array();
    }

    skipped(name)
}

pub (super) fn register_shaders(registry: &mut FlattenableRegistry) {
    registry.register(Category::Shader, "SkLinearGradient", |_, buffer| read_linear_gradient(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkRadialGradient", |_, buffer| read_radial_gradient(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkConicalGradient", |_, buffer| read_conical_gradient(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkSweepGradient", |_, buffer| read_sweep_gradient(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkImageShader", |_, buffer| read_image_shader(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkLocalMatrixShader", |_, buffer| read_local_matrix_shader(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkColorShader", |_, buffer| read_color_shader(buffer).map(Effect::Shader));
    registry.register(Category::Shader, "SkColor4Shader", |_, buffer| read_color4f_shader(buffer).map(Effect::Shader));

    registry.register(Category::Shader, "SkBlendShader", skip_blend_shader);
    registry.register(Category::Shader, "SkColorFilterShader", skip_color_filter_shader);
    registry.register(Category::Shader, "SkCoordClampShader", skip_coord_clamp_shader);
    registry.register(Category::Shader, "SkEmptyShader", |name, _| skipped(name));
    registry.register(Category::Shader, "SkPictureShader", skip_picture_shader);
    registry.register(Category::Shader, "SkPerlinNoiseShader", skip_perlin_noise_shader);
    registry.register(Category::Shader, "SkWorkingColorSpaceShader", skip_working_color_space_shader);

    registry.register(Category::Shader, "SkRuntimeShader", unskippable);

    registry.alias(Category::Shader, "SkTwoPointConicalGradient", "SkConicalGradient");
    registry.alias(Category::Shader, "SkColor4fShader", "SkColor4Shader");
    registry.alias(Category::Shader, "SkShader_Blend", "SkBlendShader");
    registry.alias(Category::Shader, "SkShader_CoordClamp", "SkCoordClampShader");
    registry.alias(Category::Shader, "SkPerlinNoiseShaderImpl", "SkPerlinNoiseShader");
    registry.alias(Category::Shader, "SkRTShader", "SkRuntimeShader");
}
