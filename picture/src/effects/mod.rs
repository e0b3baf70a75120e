//!
//! Effects are the polymorphic parts of a paint: shaders, filters and so on. In the picture format each one is
//! written as a 'flattenable': the index of its type name in the factory table, the size of its payload and then
//! the payload itself. Decoding looks the type name up in a registry to find the routine that reads the payload.
//!

mod shader;
mod path_effect;
mod mask_filter;
mod color_filter;
mod image_filter;
mod blender;

pub use self::shader::*;
pub use self::path_effect::*;
pub use self::mask_filter::*;
pub use self::color_filter::*;
pub use self::image_filter::*;
pub use self::blender::*;

use crate::error::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use log::*;
use once_cell::sync::Lazy;

use std::collections::HashMap;

///
/// The kinds of flattenable that can appear in a picture
///
/// Each category has its own set of names: the same name can't be used to read a shader where a color filter
/// is expected.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    PathEffect,
    Shader,
    MaskFilter,
    ColorFilter,
    ImageFilter,
    Blender
}

///
/// A decoded flattenable
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Effect {
    PathEffect(PathEffect),
    Shader(Shader),
    MaskFilter(MaskFilter),
    ColorFilter(ColorFilter),
    ImageFilter(ImageFilter),
    Blender(Blender)
}

///
/// Trait implemented by effects that can be written as flattenables
///
pub trait Flattenable {
    ///
    /// The name that identifies the routine used to read this effect back again
    ///
    fn factory_name(&self) -> &'static str;

    ///
    /// Writes the payload for this effect
    ///
    fn flatten(&self, buffer: &mut WriteCursor);
}

///
/// A routine that reads the payload of a flattenable (the name is passed in as several names can share a routine)
///
/// The cursor passed in covers just the payload.
///
pub type DecodeFn = fn(&str, &mut ReadCursor) -> Option<Effect>;

///
/// Maps flattenable names to the routines that decode them
///
#[derive(Clone, Default)]
pub struct FlattenableRegistry {
    decoders: HashMap<Category, HashMap<String, DecodeFn>>
}

impl FlattenableRegistry {
    ///
    /// Creates an empty registry
    ///
    pub fn new() -> FlattenableRegistry {
        FlattenableRegistry::default()
    }

    ///
    /// Creates a registry that can decode every effect that this crate knows about
    ///
    pub fn with_defaults() -> FlattenableRegistry {
        let mut registry = FlattenableRegistry::new();

        register_path_effects(&mut registry);
        register_shaders(&mut registry);
        register_mask_filters(&mut registry);
        register_color_filters(&mut registry);
        register_image_filters(&mut registry);
        register_blenders(&mut registry);

        registry
    }

    ///
    /// Sets the routine used to decode a flattenable in a particular category
    ///
    pub fn register(&mut self, category: Category, name: &str, decode: DecodeFn) {
        self.decoders.entry(category)
            .or_insert_with(HashMap::new)
            .insert(name.to_string(), decode);
    }

    ///
    /// Makes `alias` decode using the same routine as `name`. Returns false if `name` isn't registered.
    ///
    pub fn alias(&mut self, category: Category, alias: &str, name: &str) -> bool {
        if let Some(decode) = self.lookup(category, name) {
            self.register(category, alias, decode);
            true
        } else {
            false
        }
    }

    ///
    /// Finds the routine for decoding a flattenable
    ///
    pub fn lookup(&self, category: Category, name: &str) -> Option<DecodeFn> {
        self.decoders.get(&category)
            .and_then(|decoders| decoders.get(name))
            .copied()
    }
}

static DEFAULT_REGISTRY: Lazy<FlattenableRegistry> = Lazy::new(FlattenableRegistry::with_defaults);

///
/// The registry that's used when decoding pictures unless another one is supplied
///
pub fn default_registry() -> &'static FlattenableRegistry {
    &DEFAULT_REGISTRY
}

///
/// Writes an optional flattenable (a `None` value is written as a single 0 word)
///
pub fn write_flattenable<T: Flattenable>(buffer: &mut WriteCursor, flattenable: Option<&T>) {
    let flattenable = match flattenable {
        Some(flattenable)   => flattenable,
        None                => { buffer.write_i32(0); return; }
    };

    let index = buffer.factories_mut().intern_name(flattenable.factory_name());
    buffer.write_u32(index);

    let size_offset = buffer.reserve_u32();
    flattenable.flatten(buffer);

    let size = buffer.bytes_written() - size_offset - 4;
    buffer.patch_u32(size_offset, size as u32);
}

///
/// Reads a flattenable from a particular category
///
/// Returns `None` for null flattenables, for ones that have no decoder and for ones that were skipped because they
/// can't be replayed: the buffer stays valid in all of these cases. Errors in the payload invalidate the buffer.
///
pub fn read_flattenable(buffer: &mut ReadCursor, category: Category) -> Option<Effect> {
    let index = buffer.read_i32();
    if index == 0 || !buffer.is_valid() {
        return None;
    }

    let name = match buffer.factory_name(index as u32) {
        Some(name)  => name,
        None        => { buffer.invalidate(); return None; }
    };

    let size        = buffer.read_u32() as usize;
    let mut payload = buffer.sub_cursor(size);
    if !buffer.is_valid() {
        return None;
    }

    let decode = match buffer.registry().lookup(category, name) {
        Some(decode)    => decode,
        None            => {
            warn!("{}", PictureError::UnknownFactoryName(name.to_string()));
            return None;
        }
    };

    if !payload.nested_effect() {
        warn!("`{}` is nested too deeply to decode", name);
        buffer.invalidate_with(PictureError::RecursionLimitExceeded);
        return None;
    }

    let effect = decode(name, &mut payload);

    if let Some(error) = payload.error() {
        buffer.invalidate_with(error.clone());
        None
    } else {
        effect
    }
}

///
/// Logs that a flattenable was understood but is being dropped, and returns the result of decoding it
///
pub (crate) fn skipped(name: &str) -> Option<Effect> {
    warn!("{}", PictureError::UnsupportedButSkippable(name.to_string()));
    None
}

///
/// Invalidates a buffer for a flattenable that can't be read without knowing how to compile its contents
///
pub (crate) fn unskippable(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    warn!("{}", PictureError::UnsupportedAndUnskippable(name.to_string()));
    buffer.invalidate_with(PictureError::UnsupportedAndUnskippable(name.to_string()));
    None
}

pub fn read_path_effect(buffer: &mut ReadCursor) -> Option<PathEffect> {
    match read_flattenable(buffer, Category::PathEffect) {
        Some(Effect::PathEffect(effect))    => Some(effect),
        _                                   => None
    }
}

pub fn read_shader(buffer: &mut ReadCursor) -> Option<Shader> {
    match read_flattenable(buffer, Category::Shader) {
        Some(Effect::Shader(shader))    => Some(shader),
        _                               => None
    }
}

pub fn read_mask_filter(buffer: &mut ReadCursor) -> Option<MaskFilter> {
    match read_flattenable(buffer, Category::MaskFilter) {
        Some(Effect::MaskFilter(filter))    => Some(filter),
        _                                   => None
    }
}

pub fn read_color_filter(buffer: &mut ReadCursor) -> Option<ColorFilter> {
    match read_flattenable(buffer, Category::ColorFilter) {
        Some(Effect::ColorFilter(filter))   => Some(filter),
        _                                   => None
    }
}

pub fn read_image_filter(buffer: &mut ReadCursor) -> Option<ImageFilter> {
    match read_flattenable(buffer, Category::ImageFilter) {
        Some(Effect::ImageFilter(filter))   => Some(filter),
        _                                   => None
    }
}

pub fn read_blender(buffer: &mut ReadCursor) -> Option<Blender> {
    match read_flattenable(buffer, Category::Blender) {
        Some(Effect::Blender(blender))  => Some(blender),
        _                               => None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::*;

    #[test]
    fn null_flattenable_is_one_word() {
        let mut buffer = WriteCursor::new();
        write_flattenable::<Shader>(&mut buffer, None);

        let bytes = buffer.into_bytes();
        assert!(bytes == vec![0, 0, 0, 0]);

        let mut rc = ReadCursor::new(&bytes);
        assert!(read_shader(&mut rc).is_none());
        assert!(rc.is_valid());
    }

    #[test]
    fn unknown_name_is_skipped() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkSomethingFromTheFuture");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(8);
        buffer.write_u32(1);
        buffer.write_u32(2);
        buffer.write_u32(77);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_shader(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 77);
    }

    ///
    /// Writes `depth` compose color filters, each with another compose filter as its outer filter
    ///
    fn nested_compose_filters(compose_index: u32, depth: usize) -> Vec<u8> {
        let mut buffer = WriteCursor::new();

        // Each level is an index, a size, the level inside it and a null inner filter
        for level in 0..depth {
            buffer.write_u32(compose_index);
            buffer.write_u32((12 * (depth - level - 1) + 8) as u32);
        }

        buffer.write_i32(0);
        for _ in 0..depth {
            buffer.write_i32(0);
        }

        buffer.into_bytes()
    }

    #[test]
    fn shallow_nesting_decodes() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkComposeColorFilter");
        let bytes           = nested_compose_filters(index, 8);
        let mut rc          = ReadCursor::new(&bytes).with_factories(&factories);

        // Compose filters with no inner filter collapse to the outer one, and the innermost is null
        assert!(read_color_filter(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkComposeColorFilter");
        let bytes           = nested_compose_filters(index, 20_000);
        let mut rc          = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_color_filter(&mut rc).is_none());
        assert!(rc.error() == Some(&PictureError::RecursionLimitExceeded));
    }

    #[test]
    fn factory_index_out_of_range() {
        let factories = FactoryTable::new();

        let mut buffer = WriteCursor::new();
        buffer.write_u32(3);
        buffer.write_u32(0);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_shader(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn names_are_per_category() {
        let mut buffer = WriteCursor::new();
        write_flattenable(&mut buffer, Some(&Blender::Mode(crate::paint::BlendMode::Screen)));

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        // Reading the blender where a shader is expected skips it
        assert!(read_shader(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
    }

    #[test]
    fn runtime_effects_invalidate() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkRuntimeShader");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(4);
        buffer.write_u32(0);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_shader(&mut rc).is_none());
        assert!(rc.error() == Some(&PictureError::UnsupportedAndUnskippable("SkRuntimeShader".to_string())));
    }

    #[test]
    fn custom_registry() {
        let mut registry = FlattenableRegistry::new();
        registry.register(Category::Shader, "MyShader", |_, buffer| Some(Effect::Shader(Shader::Color(buffer.read_color4f()))));
        assert!(registry.alias(Category::Shader, "MyOldShader", "MyShader"));
        assert!(!registry.alias(Category::Shader, "Other", "NotRegistered"));

        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("MyOldShader");

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(16);
        buffer.write_color4f(crate::geometry::Color4f { r: 1.0, g: 0.5, b: 0.0, a: 1.0 });

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories).with_registry(&registry);

        assert!(read_shader(&mut rc) == Some(Shader::Color(crate::geometry::Color4f { r: 1.0, g: 0.5, b: 0.0, a: 1.0 })));
    }

    #[test]
    fn every_category_has_defaults() {
        let registry = default_registry();

        assert!(registry.lookup(Category::PathEffect, "SkDashImpl").is_some());
        assert!(registry.lookup(Category::Shader, "SkLinearGradient").is_some());
        assert!(registry.lookup(Category::MaskFilter, "SkBlurMaskFilterImpl").is_some());
        assert!(registry.lookup(Category::ColorFilter, "SkComposeColorFilter").is_some());
        assert!(registry.lookup(Category::ImageFilter, "SkBlurImageFilter").is_some());
        assert!(registry.lookup(Category::Blender, "SkBlendModeBlender").is_some());
        assert!(registry.lookup(Category::Shader, "SkBlurImageFilter").is_none());
    }
}
