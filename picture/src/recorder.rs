use crate::path::*;
use crate::flat::*;
use crate::image::*;
use crate::paint::*;
use crate::effects::*;
use crate::surface::*;
use crate::picture::*;
use crate::version::*;
use crate::geometry::*;
use crate::draw_type::*;
use crate::text_blob::*;
use crate::write_cursor::*;

use log::*;
use smallvec::*;

use std::sync::*;

///
/// Records the calls made against it as a picture
///
/// Heavyweight values (paints, paths, images and text blobs) are stored once each in the side tables, and the op stream
/// refers to them by index. Each save level keeps a list of the clip ops it contains: when the level is restored, their
/// restore offsets are filled in with the location of the restore op.
///
pub struct Recorder {
    /// The op stream recorded so far
    ops: WriteCursor,

    /// The values referred to by the op stream
    tables: SideTables,

    /// For each open save, the offsets of the restore placeholders written since the save
    restore_offsets: SmallVec<[SmallVec<[usize; 4]>; 8]>,
}

impl Default for Recorder {
    fn default() -> Recorder {
        Recorder::new()
    }
}

impl Recorder {
    ///
    /// Creates a new recorder with an empty op stream
    ///
    pub fn new() -> Recorder {
        Recorder {
            ops:                WriteCursor::new(),
            tables:             SideTables::default(),
            restore_offsets:    smallvec![],
        }
    }

    ///
    /// The number of saves that haven't been restored yet
    ///
    #[inline]
    pub fn save_count(&self) -> usize {
        self.restore_offsets.len()
    }

    ///
    /// Closes any open saves and turns the recording into a picture
    ///
    pub fn finish_recording(self, cull_rect: Rect) -> Arc<Picture> {
        Arc::new(self.finish_picture(cull_rect))
    }

    ///
    /// As for `finish_recording`, but returns the picture without sharing it
    ///
    pub (crate) fn finish_picture(mut self, cull_rect: Rect) -> Picture {
        while !self.restore_offsets.is_empty() {
            self.restore();
        }

        Picture::from_recording(cull_rect, CURRENT_VERSION, self.ops.into_bytes(), self.tables)
    }

    ///
    /// Appends an op to the stream, returning the offset where its payload begins
    ///
    fn record_op<WriteFn: FnOnce(&mut WriteCursor)>(&mut self, draw_type: DrawType, write_payload: WriteFn) -> usize {
        let mut payload = WriteCursor::new();
        write_payload(&mut payload);

        let size = payload.bytes_written() + 4;

        if size >= EXTENDED_OP_SIZE as usize {
            // Extended sizes count the extra size word as a single byte
            self.ops.write_u32(pack_op(draw_type, EXTENDED_OP_SIZE));
            self.ops.write_u32((size + 1) as u32);
        } else {
            self.ops.write_u32(pack_op(draw_type, size as u32));
        }

        let payload_offset = self.ops.bytes_written();
        self.ops.write_pad(payload.bytes());

        trace!("Recorded {:?} ({} bytes)", draw_type, size);

        payload_offset
    }

    ///
    /// Records a clip op: its payload is followed by a restore offset that's filled in when the enclosing save is restored
    ///
    fn record_clip<WriteFn: FnOnce(&mut WriteCursor)>(&mut self, draw_type: DrawType, write_payload: WriteFn) {
        let payload_offset      = self.record_op(draw_type, |buffer| {
            write_payload(buffer);
            buffer.write_i32(0);
        });
        let placeholder_offset  = self.ops.bytes_written() - 4;

        if let Some(level) = self.restore_offsets.last_mut() {
            level.push(placeholder_offset);
        }

        debug_assert!(placeholder_offset >= payload_offset);
    }

    #[inline] fn paint_index(&mut self, paint: Paint) -> u32 { self.tables.paints.intern(paint) }
    #[inline] fn path_index(&mut self, path: Path) -> u32 { self.tables.paths.intern(path) }
    #[inline] fn image_index(&mut self, image: Image) -> u32 { self.tables.images.intern(image) }

    #[inline]
    fn optional_paint_index(&mut self, paint: Option<Paint>) -> u32 {
        paint.map(|paint| self.paint_index(paint)).unwrap_or(0)
    }

    ///
    /// Image filters in a save layer are stored as paints that carry the filter
    ///
    #[inline]
    fn filter_paint_index(&mut self, filter: ImageFilter) -> u32 {
        self.paint_index(Paint::default().with_image_filter(filter))
    }
}

impl Surface for Recorder {
    fn save(&mut self) {
        self.restore_offsets.push(smallvec![]);
        self.record_op(DrawType::Save, |_| { });
    }

    fn save_layer(&mut self, layer: SaveLayerRec) {
        let SaveLayerRec { bounds, paint, backdrop, flags, backdrop_scale, mut filters, backdrop_tile_mode } = layer;

        if filters.len() > MAX_FILTERS_PER_LAYER as usize {
            warn!("Layer has {} filters: only the first {} are recorded", filters.len(), MAX_FILTERS_PER_LAYER);
            filters.truncate(MAX_FILTERS_PER_LAYER as usize);
        }

        // Side table references are resolved before the op is written
        let paint_index     = paint.map(|paint| self.paint_index(paint));
        let backdrop_index  = backdrop.map(|backdrop| self.filter_paint_index(backdrop));
        let filter_indexes  = filters.into_iter().map(|filter| self.filter_paint_index(filter)).collect::<SmallVec<[u32; 4]>>();

        let mut flat_flags = 0;
        if bounds.is_some()                     { flat_flags |= SAVELAYERREC_HAS_BOUNDS; }
        if paint_index.is_some()                { flat_flags |= SAVELAYERREC_HAS_PAINT; }
        if backdrop_index.is_some()             { flat_flags |= SAVELAYERREC_HAS_BACKDROP; }
        if flags != 0                           { flat_flags |= SAVELAYERREC_HAS_FLAGS; }
        if backdrop_scale != 1.0                { flat_flags |= SAVELAYERREC_HAS_BACKDROP_SCALE; }
        if !filter_indexes.is_empty()           { flat_flags |= SAVELAYERREC_HAS_MULTIPLE_FILTERS; }
        if backdrop_tile_mode != TileMode::Clamp { flat_flags |= SAVELAYERREC_HAS_BACKDROP_TILE_MODE; }

        self.restore_offsets.push(smallvec![]);
        self.record_op(DrawType::SaveLayerSaveLayerRec, |buffer| {
            buffer.write_u32(flat_flags);

            if let Some(bounds) = bounds                { buffer.write_rect(bounds); }
            if let Some(paint_index) = paint_index      { buffer.write_u32(paint_index); }
            if let Some(backdrop) = backdrop_index      { buffer.write_u32(backdrop); }
            if flags != 0                               { buffer.write_u32(flags); }
            if backdrop_scale != 1.0                    { buffer.write_f32(backdrop_scale); }

            if !filter_indexes.is_empty() {
                buffer.write_u32(filter_indexes.len() as u32);
                filter_indexes.iter().for_each(|index| buffer.write_u32(*index));
            }

            if backdrop_tile_mode != TileMode::Clamp    { buffer.write_u32(backdrop_tile_mode.to_u32()); }
        });
    }

    fn restore(&mut self) {
        let placeholders = match self.restore_offsets.pop() {
            Some(placeholders)  => placeholders,
            None                => { warn!("Restore with no matching save was not recorded"); return; }
        };

        let restore_offset = self.ops.bytes_written() as u32;
        for placeholder in placeholders {
            self.ops.patch_u32(placeholder, restore_offset);
        }

        self.record_op(DrawType::Restore, |_| { });
    }

    fn translate(&mut self, dx: f32, dy: f32)   { self.record_op(DrawType::Translate, |buffer| (dx, dy).write_flat(buffer)); }
    fn scale(&mut self, sx: f32, sy: f32)       { self.record_op(DrawType::Scale, |buffer| (sx, sy).write_flat(buffer)); }
    fn rotate(&mut self, degrees: f32)          { self.record_op(DrawType::Rotate, |buffer| buffer.write_f32(degrees)); }
    fn skew(&mut self, sx: f32, sy: f32)        { self.record_op(DrawType::Skew, |buffer| (sx, sy).write_flat(buffer)); }
    fn concat(&mut self, matrix: Matrix)        { self.record_op(DrawType::Concat, |buffer| matrix.write_flat(buffer)); }
    fn concat44(&mut self, matrix: M44)         { self.record_op(DrawType::Concat44, |buffer| matrix.write_flat(buffer)); }
    fn set_matrix(&mut self, matrix: Matrix)    { self.record_op(DrawType::SetMatrix, |buffer| matrix.write_flat(buffer)); }
    fn set_m44(&mut self, matrix: M44)          { self.record_op(DrawType::SetM44, |buffer| matrix.write_flat(buffer)); }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool) {
        let packed = clip_packed(op, anti_alias);
        self.record_clip(DrawType::ClipRect, |buffer| (rect, packed).write_flat(buffer));
    }

    fn clip_rrect(&mut self, rrect: RRect, op: ClipOp, anti_alias: bool) {
        let packed = clip_packed(op, anti_alias);
        self.record_clip(DrawType::ClipRRect, |buffer| (rrect, packed).write_flat(buffer));
    }

    fn clip_path(&mut self, path: Path, op: ClipOp, anti_alias: bool) {
        let packed      = clip_packed(op, anti_alias);
        let path_index  = self.path_index(path);
        self.record_clip(DrawType::ClipPath, |buffer| (path_index, packed).write_flat(buffer));
    }

    fn clear(&mut self, color: Color) {
        self.record_op(DrawType::DrawClear, |buffer| buffer.write_color(color));
    }

    fn draw_paint(&mut self, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawPaint, |buffer| buffer.write_u32(paint));
    }

    fn draw_rect(&mut self, rect: Rect, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawRect, |buffer| (paint, rect).write_flat(buffer));
    }

    fn draw_rrect(&mut self, rrect: RRect, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawRRect, |buffer| (paint, rrect).write_flat(buffer));
    }

    fn draw_drrect(&mut self, outer: RRect, inner: RRect, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawDRRect, |buffer| (paint, outer, inner).write_flat(buffer));
    }

    fn draw_oval(&mut self, oval: Rect, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawOval, |buffer| (paint, oval).write_flat(buffer));
    }

    fn draw_arc(&mut self, oval: Rect, start_angle: f32, sweep_angle: f32, use_center: bool, paint: Paint) {
        let paint = self.paint_index(paint);
        self.record_op(DrawType::DrawArc, |buffer| (paint, oval, start_angle, sweep_angle, use_center).write_flat(buffer));
    }

    fn draw_path(&mut self, path: Path, paint: Paint) {
        let paint   = self.paint_index(paint);
        let path    = self.path_index(path);
        self.record_op(DrawType::DrawPath, |buffer| (paint, path).write_flat(buffer));
    }

    fn draw_image(&mut self, image: Image, x: f32, y: f32, sampling: SamplingOptions, paint: Option<Paint>) {
        let paint = self.optional_paint_index(paint);
        let image = self.image_index(image);
        self.record_op(DrawType::DrawImage2, |buffer| (paint, image, Point::new(x, y), sampling).write_flat(buffer));
    }

    fn draw_image_rect(&mut self, image: Image, src: Option<Rect>, dst: Rect, sampling: SamplingOptions, paint: Option<Paint>, constraint: SrcRectConstraint) {
        let paint = self.optional_paint_index(paint);
        let image = self.image_index(image);

        match src {
            Some(src)   => {
                self.record_op(DrawType::DrawImageRect2, |buffer| {
                    (paint, image, src, dst).write_flat(buffer);
                    (sampling, constraint.to_u32()).write_flat(buffer);
                });
            }

            None        => {
                self.record_op(DrawType::DrawImageRect, |buffer| {
                    (paint, image, false, dst).write_flat(buffer);
                    (constraint.to_u32(), sampling).write_flat(buffer);
                });
            }
        }
    }

    fn draw_text_blob(&mut self, blob: TextBlob, x: f32, y: f32, paint: Paint) {
        if blob.is_empty() {
            debug!("Empty text blob was not recorded");
            return;
        }

        let paint   = self.paint_index(paint);
        let blob    = self.tables.text_blobs.intern(blob);
        self.record_op(DrawType::DrawTextBlob, |buffer| (paint, blob, x, y).write_flat(buffer));
    }

    fn draw_annotation(&mut self, rect: Rect, key: String, value: Vec<u8>) {
        self.record_op(DrawType::DrawAnnotation, |buffer| {
            buffer.write_rect(rect);
            buffer.write_string(&key);
            buffer.write_byte_array(&value);
        });
    }
}

///
/// The packed word written after the shape of a clip op
///
#[inline]
fn clip_packed(op: ClipOp, anti_alias: bool) -> u32 {
    op.to_packed() | if anti_alias { CLIP_ANTI_ALIAS } else { 0 }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read_cursor::*;

    fn red() -> Paint {
        Paint::with_color(Color::RED)
    }

    #[test]
    fn paints_are_shared() {
        let mut recorder = Recorder::new();

        recorder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), red());
        recorder.draw_oval(Rect::new(0.0, 0.0, 10.0, 10.0), red());
        recorder.draw_paint(Paint::with_color(Color::BLUE));

        assert!(recorder.tables.paints.len() == 2);
    }

    #[test]
    fn op_header_includes_its_own_size() {
        let mut recorder = Recorder::new();
        recorder.translate(1.0, 2.0);

        let mut rc = ReadCursor::new(recorder.ops.bytes());
        assert!(unpack_op(rc.read_u32()) == (DrawType::Translate.to_u32(), 12));
        assert!(rc.read_f32() == 1.0);
        assert!(rc.read_f32() == 2.0);
        assert!(rc.is_at_end());
    }

    #[test]
    fn clip_offsets_point_at_restore() {
        let mut recorder = Recorder::new();

        recorder.save();
        recorder.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), ClipOp::Intersect, true);
        let clip_end = recorder.ops.bytes_written();
        recorder.restore();

        // The restore op starts where the clip ends
        assert!(recorder.ops.read_u32_at(clip_end - 4) == clip_end as u32);
        assert!(recorder.ops.read_u32_at(clip_end - 8) == 1 | CLIP_ANTI_ALIAS);
    }

    #[test]
    fn clip_outside_save_has_no_offset() {
        let mut recorder = Recorder::new();

        recorder.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), ClipOp::Difference, false);
        let end = recorder.ops.bytes_written();

        assert!(recorder.ops.read_u32_at(end - 4) == 0);
        assert!(recorder.ops.read_u32_at(end - 8) == 0);
    }

    #[test]
    fn unmatched_restore_is_ignored() {
        let mut recorder = Recorder::new();

        recorder.restore();
        assert!(recorder.ops.bytes_written() == 0);
    }

    #[test]
    fn finish_closes_open_saves() {
        let mut recorder = Recorder::new();

        recorder.save();
        recorder.save();
        assert!(recorder.save_count() == 2);

        let picture = recorder.finish_recording(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(picture.op_count() == 4);
    }

    #[test]
    fn empty_text_blob_is_not_recorded() {
        let mut recorder = Recorder::new();

        recorder.draw_text_blob(TextBlob::new(Rect::default(), vec![]), 0.0, 0.0, red());
        assert!(recorder.ops.bytes_written() == 0);
        assert!(recorder.tables.paints.is_empty());
    }
}
