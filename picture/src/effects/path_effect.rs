use super::*;
use crate::flat::*;
use crate::path::*;
use crate::geometry::*;

///
/// Modifies the geometry of a path before it's drawn
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum PathEffect {
    /// Breaks the path into dashes: the intervals alternate between 'on' and 'off' lengths
    Dash { intervals: Vec<f32>, phase: f32 },

    /// Chops the path into segments and randomly displaces them
    Discrete { segment_length: f32, deviation: f32, seed: u32 },
}

impl Flattenable for PathEffect {
    fn factory_name(&self) -> &'static str {
        match self {
            PathEffect::Dash { .. }     => "SkDashImpl",
            PathEffect::Discrete { .. } => "SkDiscretePathEffect"
        }
    }

    fn flatten(&self, buffer: &mut WriteCursor) {
        match self {
            PathEffect::Dash { intervals, phase } => {
                buffer.write_f32(*phase);
                buffer.write_f32_array(intervals);
            }

            PathEffect::Discrete { segment_length, deviation, seed } => {
                (segment_length, deviation, seed).write_flat(buffer);
            }
        }
    }
}

fn read_dash(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let phase       = buffer.read_f32();
    let intervals   = buffer.read_f32_array();

    if !buffer.is_valid() {
        return None;
    }

    // Dashes need on/off pairs of non-negative lengths
    if intervals.len() < 2 || intervals.len() % 2 != 0 || intervals.iter().any(|interval| !(*interval >= 0.0)) {
        return skipped(name);
    }

    Some(Effect::PathEffect(PathEffect::Dash { intervals, phase }))
}

fn read_discrete(_name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    let segment_length  = buffer.read_f32();
    let deviation       = buffer.read_f32();
    let seed            = buffer.read_u32();

    if buffer.is_valid() {
        Some(Effect::PathEffect(PathEffect::Discrete { segment_length, deviation, seed }))
    } else {
        None
    }
}

fn skip_corner(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    buffer.read_f32();
    skipped(name)
}

fn skip_line_2d(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    Matrix::read_flat(buffer);
    buffer.read_f32();
    skipped(name)
}

fn skip_path_2d(name: &str, buffer: &mut ReadCursor) -> Option<Effect> {
    Matrix::read_flat(buffer);
    Path::read_flat(buffer);
    skipped(name)
}

pub (super) fn register_path_effects(registry: &mut FlattenableRegistry) {
    registry.register(Category::PathEffect, "SkDashImpl", read_dash);
    registry.register(Category::PathEffect, "SkDiscretePathEffect", read_discrete);

    registry.register(Category::PathEffect, "SkCornerPathEffect", skip_corner);
    registry.register(Category::PathEffect, "SkLine2DPathEffectImpl", skip_line_2d);
    registry.register(Category::PathEffect, "SkPath2DPathEffectImpl", skip_path_2d);

    // Anything left in these payloads is skipped along with the rest of the record
    registry.register(Category::PathEffect, "SkPath1DPathEffectImpl", |name, _| skipped(name));
    registry.register(Category::PathEffect, "SkComposePathEffect", |name, _| skipped(name));
    registry.register(Category::PathEffect, "SkSumPathEffect", |name, _| skipped(name));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::*;

    #[test]
    fn dash_round_trip() {
        let effect      = PathEffect::Dash { intervals: vec![10.0, 5.0, 2.0, 5.0], phase: 3.0 };
        let mut buffer  = WriteCursor::new();
        write_flattenable(&mut buffer, Some(&effect));

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_path_effect(&mut rc) == Some(effect));
        assert!(rc.is_at_end());
    }

    #[test]
    fn discrete_round_trip() {
        let effect      = PathEffect::Discrete { segment_length: 4.0, deviation: 1.5, seed: 1234 };
        let mut buffer  = WriteCursor::new();
        write_flattenable(&mut buffer, Some(&effect));

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_path_effect(&mut rc) == Some(effect));
    }

    #[test]
    fn odd_dash_is_dropped() {
        let effect      = PathEffect::Dash { intervals: vec![10.0, 5.0, 2.0], phase: 0.0 };
        let mut buffer  = WriteCursor::new();
        write_flattenable(&mut buffer, Some(&effect));
        buffer.write_u32(9);

        let (bytes, factories, _) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_path_effect(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.read_u32() == 9);
    }

    #[test]
    fn path_2d_is_skipped() {
        let mut factories   = FactoryTable::new();
        let index           = factories.intern_name("SkPath2DPathEffectImpl");

        let mut payload = WriteCursor::new();
        Matrix::identity().write_flat(&mut payload);
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(1.0, 1.0);
        path.write_flat(&mut payload);
        let payload = payload.into_bytes();

        let mut buffer = WriteCursor::new();
        buffer.write_u32(index);
        buffer.write_u32(payload.len() as u32);
        buffer.write_pad(&payload);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes).with_factories(&factories);

        assert!(read_path_effect(&mut rc).is_none());
        assert!(rc.is_valid());
        assert!(rc.is_at_end());
    }
}
