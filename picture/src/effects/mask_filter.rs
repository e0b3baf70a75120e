use super::*;

/// Set in the flags word when the blur ignores the canvas transform
const BLUR_IGNORE_TRANSFORM: u32 = 1;

///
/// How a blur mask is combined with the shape it's applied to
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BlurStyle {
    /// Blur inside and outside the shape
    Normal,

    /// Solid inside, blurred outside
    Solid,

    /// Nothing inside, blurred outside
    Outer,

    /// Blurred inside, nothing outside
    Inner
}

///
/// Modifies the coverage mask of a shape before it's drawn
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum MaskFilter {
    Blur { sigma: f32, style: BlurStyle, respect_ctm: bool }
}

impl BlurStyle {
    fn from_u32(value: u32) -> Option<BlurStyle> {
        match value {
            0 => Some(BlurStyle::Normal),
            1 => Some(BlurStyle::Solid),
            2 => Some(BlurStyle::Outer),
            3 => Some(BlurStyle::Inner),
            _ => None
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            BlurStyle::Normal   => 0,
            BlurStyle::Solid    => 1,
            BlurStyle::Outer    => 2,
            BlurStyle::Inner    => 3
        }
    }
}

impl Flattenable for MaskFilter {
    fn factory_name(&self) -> &'static str {
        match self {
            MaskFilter::Blur { .. } => "SkBlurMaskFilterImpl"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            MaskFilter::Blur { sigma, style, respect_ctm } => {
                buffer.write_f32(*sigma);
                buffer.write_u32(style.to_u32());
                buffer.write_u32(if *respect_ctm { 0 } else { BLUR_IGNORE_TRANSFORM });
            }
        }
    }
}

fn read_blur(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let sigma = buffer.read_f32();
    let style = BlurStyle::from_u32(buffer.read_u32());
    let flags = buffer.read_u32();

    let style = match style {
        Some(style) => style,
        None        => { buffer.invalidate(); return None; }
    };

    if !buffer.is_valid() {
        return None;
    }

    Some(Effect::MaskFilter(MaskFilter::Blur { sigma, style, respect_ctm: flags & BLUR_IGNORE_TRANSFORM == 0 }))
}

pub (super) fn register_mask_filters(registry: &mut FlattenableRegistry) {
    registry.register(Category::MaskFilter, "SkBlurMaskFilterImpl", read_blur);
    registry.alias(Category::MaskFilter, "SkBlurMaskFilter", "SkBlurMaskFilterImpl");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blur_round_trip() {
        for style in [BlurStyle::Normal, BlurStyle::Solid, BlurStyle::Outer, BlurStyle::Inner].iter() {
            let filter      = MaskFilter::Blur { sigma: 1.5, style: *style, respect_ctm: *style != BlurStyle::Solid };
            let mut buffer  = WriteCursor::new();
            write_flattenable(&mut buffer, Some(&filter));

            let (bytes, factories, _) = buffer.into_parts();
            let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

            assert!(read_mask_filter(&mut rc) == Some(filter));
        }
    }

    #[test]
    fn bad_blur_style() {
        let mut payload = WriteCursor::new();
        payload.write_f32(1.0);
        payload.write_u32(4);
        payload.write_u32(0);

        let bytes   = payload.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(read_blur("SkBlurMaskFilterImpl", &mut rc).is_none());
        assert!(!rc.is_valid());
    }
}
