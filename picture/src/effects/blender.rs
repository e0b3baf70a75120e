use super::*;
use crate::paint::*;

///
/// Combines the source and destination colors of a draw
///
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum Blender {
    Mode(BlendMode)
}

impl Flattenable for Blender {
    fn factory_name(&self) -> &'static str {
        match self {
            Blender::Mode(_) => "SkBlendModeBlender"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            Blender::Mode(mode) => buffer.write_u32(mode.to_u32())
        }
    }
}

fn read_blend_mode_blender(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    match BlendMode::from_u32(buffer.read_u32()) {
        Some(mode) if buffer.is_valid() => Some(Effect::Blender(Blender::Mode(mode))),
        Some(_)                         => None,
        None                            => { buffer.invalidate(); None }
    }
}

pub (super) fn register_blenders(registry: &mut FlattenableRegistry) {
    registry.register(Category::Blender, "SkBlendModeBlender", read_blend_mode_blender);
    registry.register(Category::Blender, "SkRuntimeBlender", unskippable);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_mode_round_trips() {
        for mode in BlendMode::ALL.iter() {
            let mut buffer = WriteCursor::new();
            write_flattenable(&mut buffer, Some(&Blender::Mode(*mode)));

            let (bytes, factories, _) = buffer.into_parts();
            let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

            assert!(read_blender(&mut rc) == Some(Blender::Mode(*mode)));
        }
    }

    #[test]
    fn mode_out_of_range() {
        let bytes   = 29u32.to_le_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(read_blend_mode_blender("SkBlendModeBlender", &mut rc).is_none());
        assert!(!rc.is_valid());
    }
}
