use crate::flat::*;
use crate::error::*;
use crate::font::*;
use crate::geometry::*;
use crate::read_cursor::*;
use crate::write_cursor::*;

use log::*;

use std::iter;

///
/// How the glyphs in a text run are positioned
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GlyphPositioning {
    /// Glyphs are placed using their default advances
    Default,

    /// One x coordinate per glyph
    Horizontal,

    /// An (x, y) point per glyph
    Full,

    /// A rotation/scale transform (scos, ssin, tx, ty) per glyph
    RSXform
}

///
/// A run of glyphs that share a font
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TextRun {
    pub font:           Font,
    pub offset:         Point,
    pub positioning:    GlyphPositioning,
    pub glyphs:         Vec<u16>,

    /// The glyph positions, `positioning.scalars_per_glyph()` values for each glyph
    pub positions:      Vec<f32>,
}

///
/// A block of positioned glyphs, made up of one or more runs
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TextBlob {
    pub bounds: Rect,
    pub runs:   Vec<TextRun>,
}

impl GlyphPositioning {
    fn from_u8(value: u8) -> Option<GlyphPositioning> {
        match value {
            0 => Some(GlyphPositioning::Default),
            1 => Some(GlyphPositioning::Horizontal),
            2 => Some(GlyphPositioning::Full),
            3 => Some(GlyphPositioning::RSXform),
            _ => None
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            GlyphPositioning::Default       => 0,
            GlyphPositioning::Horizontal    => 1,
            GlyphPositioning::Full          => 2,
            GlyphPositioning::RSXform       => 3
        }
    }

    ///
    /// The number of position values stored for each glyph
    ///
    pub fn scalars_per_glyph(self) -> usize {
        match self {
            GlyphPositioning::Default       => 0,
            GlyphPositioning::Horizontal    => 1,
            GlyphPositioning::Full          => 2,
            GlyphPositioning::RSXform       => 4
        }
    }
}

impl TextRun {
    ///
    /// Creates a run where each glyph has an (x, y) position
    ///
    pub fn with_points(font: Font, glyphs: Vec<u16>, points: &[Point]) -> TextRun {
        TextRun {
            font:           font,
            offset:         Point::default(),
            positioning:    GlyphPositioning::Full,
            glyphs:         glyphs,
            positions:      points.iter().flat_map(|point| vec![point.x, point.y]).collect()
        }
    }
}

impl TextBlob {
    pub fn new(bounds: Rect, runs: Vec<TextRun>) -> TextBlob {
        TextBlob { bounds, runs }
    }

    ///
    /// True if there are no glyphs in this blob
    ///
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.glyphs.is_empty())
    }
}

impl FlatEncoding for TextBlob {
    fn write_flat(&self, buffer: &mut WriteCursor) {
        buffer.write_rect(self.bounds);

        for run in self.runs.iter().filter(|run| !run.glyphs.is_empty()) {
            buffer.write_i32(run.glyphs.len() as i32);
            buffer.write_u32(run.positioning.to_u32());
            buffer.write_point(run.offset);
            run.font.write_flat(buffer);

            // Readers expect exactly one set of positions per glyph: missing positions are written as 0
            let num_positions = run.glyphs.len() * run.positioning.scalars_per_glyph();
            if run.positions.len() != num_positions {
                warn!("Text run has {} glyph positions (expected {})", run.positions.len(), num_positions);
            }

            let positions   = run.positions.iter().cloned().chain(iter::repeat(0.0)).take(num_positions);
            let glyph_bytes = run.glyphs.iter().flat_map(|glyph| glyph.to_le_bytes().to_vec()).collect::<Vec<_>>();
            let pos_bytes   = positions.flat_map(|pos| pos.to_le_bytes().to_vec()).collect::<Vec<_>>();

            buffer.write_byte_array(&glyph_bytes);
            buffer.write_byte_array(&pos_bytes);
        }

        buffer.write_i32(0);
    }
}

///
/// Reads a byte array whose length must be exactly `expected_len`
///
fn read_exact_byte_array<'a>(buffer: &mut ReadCursor<'a>, expected_len: usize) -> Option<&'a [u8]> {
    let len = buffer.read_u32() as usize;
    if !buffer.validate(len == expected_len) {
        return None;
    }

    buffer.skip(len)
}

impl FlatDecoding for TextBlob {
    fn read_flat(buffer: &mut ReadCursor) -> Option<TextBlob> {
        let bounds      = buffer.read_rect();
        let mut runs    = vec![];

        loop {
            let glyph_count = buffer.read_i32();
            if glyph_count == 0 || !buffer.is_valid() {
                break;
            }

            // Low byte is the positioning, the next byte is set if the run has clusters and text
            let pos_word    = buffer.read_u32();
            let positioning = GlyphPositioning::from_u8((pos_word & 0xff) as u8);
            let extended    = (pos_word >> 8) & 0xff != 0;

            let positioning = match positioning {
                Some(positioning) if glyph_count > 0    => positioning,
                _                                       => { buffer.invalidate(); return None; }
            };

            let text_size = if extended { buffer.read_i32() } else { 0 };
            if !buffer.validate(text_size >= 0) {
                return None;
            }

            let offset  = buffer.read_point();
            let font    = Font::read_flat(buffer)?;

            let glyph_count     = glyph_count as usize;
            let glyph_size      = glyph_count * 2;
            let pos_size        = glyph_count * 4 * positioning.scalars_per_glyph();
            let cluster_size    = if extended { glyph_count * 4 } else { 0 };
            let total_size      = glyph_size + pos_size + cluster_size + text_size as usize;

            if !buffer.validate_with(total_size <= buffer.available(), PictureError::TruncatedOrOverrun) {
                return None;
            }

            let glyphs      = read_exact_byte_array(buffer, glyph_size)?;
            let positions   = read_exact_byte_array(buffer, pos_size)?;

            if extended {
                buffer.skip(cluster_size);
                buffer.skip(text_size as usize);
            }

            runs.push(TextRun {
                font:           font,
                offset:         offset,
                positioning:    positioning,
                glyphs:         glyphs.chunks_exact(2).map(|glyph| u16::from_le_bytes([glyph[0], glyph[1]])).collect(),
                positions:      positions.chunks_exact(4).map(|pos| f32::from_le_bytes([pos[0], pos[1], pos[2], pos[3]])).collect()
            });
        }

        if buffer.is_valid() { Some(TextBlob { bounds, runs }) } else { None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(blob: &TextBlob) -> Option<TextBlob> {
        let mut buffer = WriteCursor::new();
        blob.write_flat(&mut buffer);

        let (bytes, factories, typefaces) = buffer.into_parts();
        let mut rc = ReadCursor::new(&bytes).with_factories(&factories).with_typefaces(&typefaces);

        let result = TextBlob::read_flat(&mut rc);
        assert!(rc.is_at_end());
        result
    }

    fn simple_run(glyphs: Vec<u16>) -> TextRun {
        let points = (0..glyphs.len()).map(|idx| Point::new(idx as f32 * 8.0, 10.0)).collect::<Vec<_>>();
        TextRun::with_points(Font::default(), glyphs, &points)
    }

    #[test]
    fn no_runs() {
        let blob = TextBlob::new(Rect::new(0.0, 0.0, 10.0, 10.0), vec![]);
        assert!(round_trip(&blob) == Some(blob));
    }

    #[test]
    fn one_run() {
        let blob = TextBlob::new(Rect::new(0.0, 0.0, 30.0, 12.0), vec![simple_run(vec![36, 37, 38])]);
        assert!(round_trip(&blob) == Some(blob));
    }

    #[test]
    fn several_runs_with_different_positioning() {
        let horizontal = TextRun {
            font:           Font { size: 9.5, ..Font::default() },
            offset:         Point::new(2.0, 3.0),
            positioning:    GlyphPositioning::Horizontal,
            glyphs:         vec![1, 2],
            positions:      vec![0.0, 5.0]
        };
        let default = TextRun {
            font:           Font::default(),
            offset:         Point::new(0.0, 20.0),
            positioning:    GlyphPositioning::Default,
            glyphs:         vec![7],
            positions:      vec![]
        };

        let blob = TextBlob::new(Rect::new(0.0, 0.0, 40.0, 40.0), vec![simple_run(vec![4, 5, 6]), horizontal, default]);
        assert!(round_trip(&blob) == Some(blob));
    }

    #[test]
    fn missing_positions_are_padded() {
        let run     = TextRun::with_points(Font::default(), vec![1, 2, 3], &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
        let blob    = TextBlob::new(Rect::new(0.0, 0.0, 10.0, 10.0), vec![run]);
        let decoded = round_trip(&blob).unwrap();

        assert!(decoded.runs.len() == 1);
        assert!(decoded.runs[0].glyphs == vec![1, 2, 3]);
        assert!(decoded.runs[0].positions == vec![1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn extra_positions_are_dropped() {
        let run = TextRun {
            font:           Font::default(),
            offset:         Point::default(),
            positioning:    GlyphPositioning::Horizontal,
            glyphs:         vec![9],
            positions:      vec![4.0, 5.0, 6.0]
        };
        let blob    = TextBlob::new(Rect::new(0.0, 0.0, 10.0, 10.0), vec![run]);
        let decoded = round_trip(&blob).unwrap();

        assert!(decoded.runs[0].positions == vec![4.0]);
    }

    #[test]
    fn extended_runs_skip_clusters_and_text() {
        let mut buffer = WriteCursor::new();
        buffer.write_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        buffer.write_i32(1);
        buffer.write_u32(0x100);
        buffer.write_i32(3);
        buffer.write_point(Point::default());
        Font::default().write_flat(&mut buffer);
        buffer.write_byte_array(&[9, 0]);
        buffer.write_byte_array(&[]);
        buffer.write_u32(0);
        buffer.write_pad(b"abc");
        buffer.write_i32(0);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);
        let blob    = TextBlob::read_flat(&mut rc);

        assert!(rc.is_at_end());
        assert!(blob.map(|blob| blob.runs[0].glyphs.clone()) == Some(vec![9]));
    }

    #[test]
    fn bad_positioning_is_invalid() {
        let mut buffer = WriteCursor::new();
        buffer.write_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        buffer.write_i32(1);
        buffer.write_u32(4);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(TextBlob::read_flat(&mut rc).is_none());
        assert!(!rc.is_valid());
    }

    #[test]
    fn glyph_array_size_must_match() {
        let mut buffer = WriteCursor::new();
        buffer.write_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        buffer.write_i32(2);
        buffer.write_u32(0);
        buffer.write_point(Point::default());
        Font::default().write_flat(&mut buffer);
        buffer.write_byte_array(&[1, 0]);
        buffer.write_byte_array(&[]);
        buffer.write_i32(0);

        let bytes   = buffer.into_bytes();
        let mut rc  = ReadCursor::new(&bytes);

        assert!(TextBlob::read_flat(&mut rc).is_none());
    }
}
