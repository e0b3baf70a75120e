use crate::path::*;
use crate::flat::*;
use crate::image::*;
use crate::paint::*;
use crate::error::*;
use crate::options::*;
use crate::surface::*;
use crate::picture::*;
use crate::version::*;
use crate::geometry::*;
use crate::draw_type::*;
use crate::text_blob::*;
use crate::read_cursor::*;

use log::*;

///
/// Interprets an op stream against a surface
///
/// Side table references are resolved as ops are read. Playback stops at the first op that can't be read: calls
/// that were already made against the surface stay made, but any saves that are still open are restored before
/// returning.
///
pub (crate) struct Playback<'a, 'b> {
    /// The op stream
    buffer: ReadCursor<'a>,

    /// The values that the op stream refers to
    tables: &'a SideTables,

    /// Where the calls are sent
    surface: &'b mut dyn Surface,

    /// The number of saves made against the surface that haven't been restored
    open_saves: usize,

    /// The most ops to play back
    max_op_count: Option<usize>,
}

impl<'a, 'b> Playback<'a, 'b> {
    ///
    /// Prepares to play back some op data
    ///
    pub fn new(op_data: &'a [u8], version: u32, tables: &'a SideTables, options: &DecodeOptions, surface: &'b mut dyn Surface) -> Playback<'a, 'b> {
        Playback {
            buffer:         ReadCursor::new(op_data).with_options(*options).with_version(version),
            tables:         tables,
            surface:        surface,
            open_saves:     0,
            max_op_count:   options.max_op_count,
        }
    }

    ///
    /// Plays back every op, returning the reason playback stopped early if there was one
    ///
    pub fn run(mut self) -> Result<(), PictureError> {
        let mut op_count = 0;

        while !self.buffer.is_at_end() && self.buffer.is_valid() {
            if let Some(max_op_count) = self.max_op_count {
                if op_count >= max_op_count {
                    warn!("Playback stopped after {} ops", op_count);
                    break;
                }
            }

            let start           = self.buffer.offset();
            let (code, size)    = unpack_op(self.buffer.read_u32());
            let op_len          = if size == EXTENDED_OP_SIZE {
                // Extended sizes count the extra size word as a single byte
                (self.buffer.read_u32() as usize).saturating_add(3)
            } else {
                size as usize
            };

            if !self.buffer.validate(size > 0) {
                break;
            }

            let draw_type = match DrawType::from_u32(code) {
                Some(draw_type) => draw_type,
                None            => {
                    warn!("{}", PictureError::UnsupportedOp(code));
                    self.buffer.invalidate_with(PictureError::UnsupportedOp(code));
                    break;
                }
            };

            let end = start.saturating_add(op_len);
            if !self.buffer.validate_with(end >= self.buffer.offset() && end <= self.buffer.len(), PictureError::TruncatedOrOverrun) {
                break;
            }

            trace!("Op {:?} at {} ({} bytes)", draw_type, start, op_len);
            self.handle_op(draw_type, end);

            if self.buffer.is_valid() {
                self.buffer.validate(self.buffer.offset() == end);
            }

            op_count += 1;
        }

        // Leave the surface with the same save depth as it started with
        while self.open_saves > 0 {
            self.open_saves -= 1;
            self.surface.restore();
        }

        match self.buffer.error() {
            Some(error) => Err(error.clone()),
            None        => Ok(())
        }
    }

    ///
    /// Reads an optional paint index (0 meaning 'no paint')
    ///
    fn optional_paint(&mut self) -> Option<&'a Paint> {
        let index = self.buffer.read_i32();
        if index == 0 {
            return None;
        }

        let paint = if index > 0 { self.tables.paints.get(index as u32) } else { None };
        self.buffer.validate(paint.is_some());
        paint
    }

    fn required_paint(&mut self) -> Option<&'a Paint> {
        let paint = self.optional_paint();
        self.buffer.validate(paint.is_some());
        paint
    }

    fn path(&mut self) -> Option<&'a Path> {
        let index   = self.buffer.read_i32();
        let path    = if index > 0 { self.tables.paths.get(index as u32) } else { None };
        self.buffer.validate(path.is_some());
        path
    }

    fn image(&mut self) -> Option<&'a Image> {
        let index   = self.buffer.read_i32();
        let image   = if index > 0 { self.tables.images.get(index as u32) } else { None };
        self.buffer.validate(image.is_some());
        image
    }

    fn text_blob(&mut self) -> Option<&'a TextBlob> {
        let index   = self.buffer.read_i32();
        let blob    = if index > 0 { self.tables.text_blobs.get(index as u32) } else { None };
        self.buffer.validate(blob.is_some());
        blob
    }

    ///
    /// Reads the packed clip op and restore offset that follow the shape of a clip op
    ///
    fn clip_op(&mut self) -> Option<(ClipOp, bool)> {
        let packed  = self.buffer.read_u32();
        let offset  = self.buffer.read_i32();

        if offset != 0 {
            let current_offset = self.buffer.offset();
            self.buffer.validate(offset > 0 && offset % 4 == 0 && offset as usize >= current_offset);
        }

        if self.buffer.is_valid() {
            Some((ClipOp::from_packed(packed), packed & CLIP_ANTI_ALIAS != 0))
        } else {
            None
        }
    }

    ///
    /// Rejects an op that can't be replayed
    ///
    fn reject(&mut self, draw_type: DrawType) {
        warn!("{}", PictureError::UnsupportedOp(draw_type.to_u32()));
        self.buffer.invalidate_with(PictureError::UnsupportedOp(draw_type.to_u32()));
    }

    fn save(&mut self) {
        self.open_saves += 1;
        self.surface.save();
    }

    fn restore(&mut self) {
        if self.open_saves > 0 {
            self.open_saves -= 1;
            self.surface.restore();
        } else {
            debug!("Restore with no matching save was skipped");
        }
    }

    ///
    /// Reads the payload of an op and makes the corresponding call against the surface
    ///
    fn handle_op(&mut self, draw_type: DrawType, end: usize) {
        use self::DrawType::*;

        match draw_type {
            Noop                        => { self.buffer.skip(end - self.buffer.offset()); }
            Flush                       => { }
            ResetClip                   => { }
            PushCull                    => { }
            PopCull                     => { }

            ClipPath                    => {
                let path    = self.path();
                let clip    = self.clip_op();

                if let (Some(path), Some((op, anti_alias))) = (path, clip) {
                    self.surface.clip_path(path.clone(), op, anti_alias);
                }
            }

            ClipRect                    => {
                let rect = Rect::read_flat(&mut self.buffer);
                let clip = self.clip_op();

                if let (Some(rect), Some((op, anti_alias))) = (rect, clip) {
                    self.surface.clip_rect(rect, op, anti_alias);
                }
            }

            ClipRRect                   => {
                let rrect   = RRect::read_flat(&mut self.buffer);
                let clip    = self.clip_op();

                if let (Some(rrect), Some((op, anti_alias))) = (rrect, clip) {
                    self.surface.clip_rrect(rrect, op, anti_alias);
                }
            }

            ClipShaderInPaint           => {
                // Shader clips are read but not replayed
                self.required_paint();
                self.buffer.read_i32();
            }

            Concat                      => { if let Some(matrix) = Matrix::read_flat(&mut self.buffer) { self.surface.concat(matrix); } }
            SetMatrix                   => { if let Some(matrix) = Matrix::read_flat(&mut self.buffer) { self.surface.set_matrix(matrix); } }
            Concat44                    => { if let Some(matrix) = M44::read_flat(&mut self.buffer) { self.surface.concat44(matrix); } }
            SetM44                      => { if let Some(matrix) = M44::read_flat(&mut self.buffer) { self.surface.set_m44(matrix); } }

            Translate                   => {
                let dx = self.buffer.read_f32();
                let dy = self.buffer.read_f32();
                if self.buffer.is_valid() { self.surface.translate(dx, dy); }
            }

            Scale                       => {
                let sx = self.buffer.read_f32();
                let sy = self.buffer.read_f32();
                if self.buffer.is_valid() { self.surface.scale(sx, sy); }
            }

            Skew                        => {
                let sx = self.buffer.read_f32();
                let sy = self.buffer.read_f32();
                if self.buffer.is_valid() { self.surface.skew(sx, sy); }
            }

            Rotate                      => {
                let degrees = self.buffer.read_f32();
                if self.buffer.is_valid() { self.surface.rotate(degrees); }
            }

            Save                        => { self.save(); }
            Restore                     => { self.restore(); }

            SaveBehind                  => {
                let flags = self.buffer.read_u32();
                if flags & SAVEBEHIND_HAS_SUBSET != 0 {
                    self.buffer.read_rect();
                }

                if self.buffer.is_valid() { self.save(); }
            }

            SaveLayerSaveLayerRec       => {
                if let Some(layer) = self.read_save_layer() {
                    self.open_saves += 1;
                    self.surface.save_layer(layer);
                }
            }

            DrawAnnotation              => {
                let rect    = self.buffer.read_rect();
                let key     = self.buffer.read_string();
                let value   = self.buffer.read_byte_array();

                if self.buffer.is_valid() { self.surface.draw_annotation(rect, key, value.to_vec()); }
            }

            DrawArc                     => {
                let paint       = self.required_paint();
                let oval        = self.buffer.read_rect();
                let start_angle = self.buffer.read_f32();
                let sweep_angle = self.buffer.read_f32();
                let use_center  = self.buffer.read_bool();

                if let (Some(paint), true) = (paint, self.buffer.is_valid()) {
                    self.surface.draw_arc(oval, start_angle, sweep_angle, use_center, paint.clone());
                }
            }

            DrawAtlas                   => { self.skip_atlas(); }

            DrawClear                   => {
                let color = self.buffer.read_color();
                if self.buffer.is_valid() { self.surface.clear(color); }
            }

            DrawData                    => {
                let len = self.buffer.read_u32() as usize;
                self.buffer.skip(len);
            }

            DrawDRRect                  => {
                let paint = self.required_paint();
                let outer = RRect::read_flat(&mut self.buffer);
                let inner = RRect::read_flat(&mut self.buffer);

                if let (Some(paint), Some(outer), Some(inner)) = (paint, outer, inner) {
                    self.surface.draw_drrect(outer, inner, paint.clone());
                }
            }

            DrawImage | DrawImage2      => {
                let paint       = self.optional_paint();
                let image       = self.image();
                let point       = self.buffer.read_point();
                let sampling    = SamplingOptions::read_flat(&mut self.buffer);

                if let (Some(image), Some(sampling)) = (image, sampling) {
                    self.surface.draw_image(image.clone(), point.x, point.y, sampling, paint.cloned());
                }
            }

            DrawImageNine               => {
                let paint   = self.optional_paint();
                let image   = self.image();
                let _center = self.buffer.read_rect();
                let dst     = self.buffer.read_rect();

                // Drawn stretched over the destination
                if let (Some(image), true) = (image, self.buffer.is_valid()) {
                    self.surface.draw_image_rect(image.clone(), None, dst, SamplingOptions::default(), paint.cloned(), SrcRectConstraint::Fast);
                }
            }

            DrawImageRect               => {
                let paint       = self.optional_paint();
                let image       = self.image();
                let src         = if self.buffer.read_bool() { Some(self.buffer.read_rect()) } else { None };
                let dst         = self.buffer.read_rect();
                let constraint  = self.read_constraint();
                let sampling    = SamplingOptions::read_flat(&mut self.buffer);

                if let (Some(image), Some(constraint), Some(sampling)) = (image, constraint, sampling) {
                    self.surface.draw_image_rect(image.clone(), src, dst, sampling, paint.cloned(), constraint);
                }
            }

            DrawImageRect2              => {
                let paint       = self.optional_paint();
                let image       = self.image();
                let src         = self.buffer.read_rect();
                let dst         = self.buffer.read_rect();
                let sampling    = SamplingOptions::read_flat(&mut self.buffer);
                let constraint  = self.read_constraint();

                if let (Some(image), Some(sampling), Some(constraint)) = (image, sampling, constraint) {
                    self.surface.draw_image_rect(image.clone(), Some(src), dst, sampling, paint.cloned(), constraint);
                }
            }

            DrawOval                    => {
                let paint   = self.required_paint();
                let oval    = self.buffer.read_rect();

                if let (Some(paint), true) = (paint, self.buffer.is_valid()) {
                    self.surface.draw_oval(oval, paint.clone());
                }
            }

            DrawPaint | DrawBehindPaint => {
                if let Some(paint) = self.required_paint() {
                    self.surface.draw_paint(paint.clone());
                }
            }

            DrawPath                    => {
                let paint   = self.required_paint();
                let path    = self.path();

                if let (Some(paint), Some(path)) = (paint, path) {
                    self.surface.draw_path(path.clone(), paint.clone());
                }
            }

            DrawPoints                  => {
                // Points are read but not replayed
                self.required_paint();
                self.buffer.read_u32();

                let count = self.buffer.read_u32() as usize;
                if self.buffer.validate_can_read(count, 8) {
                    self.buffer.skip(count * 8);
                }
            }

            DrawRect                    => {
                let paint   = self.required_paint();
                let rect    = self.buffer.read_rect();

                if let (Some(paint), true) = (paint, self.buffer.is_valid()) {
                    self.surface.draw_rect(rect, paint.clone());
                }
            }

            DrawRRect                   => {
                let paint   = self.required_paint();
                let rrect   = RRect::read_flat(&mut self.buffer);

                if let (Some(paint), Some(rrect)) = (paint, rrect) {
                    self.surface.draw_rrect(rrect, paint.clone());
                }
            }

            DrawShadowRec               => {
                // Shadows are read but not replayed
                self.path();
                Point3::read_flat(&mut self.buffer);
                Point3::read_flat(&mut self.buffer);
                self.buffer.read_f32();
                self.buffer.read_color();
                self.buffer.read_color();
                self.buffer.read_u32();
            }

            DrawTextBlob                => {
                let paint   = self.required_paint();
                let blob    = self.text_blob();
                let x       = self.buffer.read_f32();
                let y       = self.buffer.read_f32();

                if let (Some(paint), Some(blob), true) = (paint, blob, self.buffer.is_valid()) {
                    self.surface.draw_text_blob(blob.clone(), x, y, paint.clone());
                }
            }

            ClipRegion              |
            DrawRegion              |
            DrawDrawable            |
            DrawDrawableMatrix      |
            DrawPatch               |
            DrawPicture             |
            DrawPictureMatrixPaint  |
            DrawSlug                |
            DrawVerticesObject      |
            DrawImageLattice        |
            DrawImageLattice2       |
            DrawEdgeAAQuad          |
            DrawEdgeAAImageSet      |
            DrawEdgeAAImageSet2         => { self.reject(draw_type); }
        }
    }

    fn read_constraint(&mut self) -> Option<SrcRectConstraint> {
        let constraint = SrcRectConstraint::from_u32(self.buffer.read_u32());
        self.buffer.validate(constraint.is_some());
        constraint
    }

    ///
    /// Reads the payload of a save layer op
    ///
    fn read_save_layer(&mut self) -> Option<SaveLayerRec> {
        let flat_flags  = self.buffer.read_u32();
        let mut layer   = SaveLayerRec::default();

        if flat_flags & SAVELAYERREC_HAS_BOUNDS != 0 {
            layer.bounds = Some(self.buffer.read_rect());
        }

        if flat_flags & SAVELAYERREC_HAS_PAINT != 0 {
            layer.paint = self.required_paint().cloned();
        }

        if flat_flags & SAVELAYERREC_HAS_BACKDROP != 0 {
            layer.backdrop = self.required_paint().and_then(|paint| paint.image_filter.clone());
        }

        if flat_flags & SAVELAYERREC_HAS_FLAGS != 0 {
            layer.flags = self.buffer.read_u32();
        }

        if flat_flags & SAVELAYERREC_HAS_CLIPMASK != 0 {
            self.image();
        }

        if flat_flags & SAVELAYERREC_HAS_CLIPMATRIX != 0 {
            Matrix::read_flat(&mut self.buffer);
        }

        if flat_flags & SAVELAYERREC_HAS_BACKDROP_SCALE != 0 && !self.buffer.is_version_lt(Version::BackdropScaleFactor) {
            layer.backdrop_scale = self.buffer.read_f32();
        }

        if flat_flags & SAVELAYERREC_HAS_MULTIPLE_FILTERS != 0 && !self.buffer.is_version_lt(Version::MultipleFiltersOnSaveLayer) {
            let count = self.buffer.read_u32();
            if !self.buffer.validate(count > 0 && count <= MAX_FILTERS_PER_LAYER) {
                return None;
            }

            for _ in 0..count {
                if let Some(filter) = self.required_paint().and_then(|paint| paint.image_filter.clone()) {
                    layer.filters.push(filter);
                }
            }
        }

        if flat_flags & SAVELAYERREC_HAS_BACKDROP_TILE_MODE != 0 && !self.buffer.is_version_lt(Version::SaveLayerBackdropTileMode) {
            layer.backdrop_tile_mode = TileMode::read(&mut self.buffer).unwrap_or_default();
        }

        if self.buffer.is_valid() {
            Some(layer)
        } else {
            None
        }
    }

    ///
    /// Reads past an atlas op
    ///
    fn skip_atlas(&mut self) {
        self.optional_paint();
        self.image();

        let flags = self.buffer.read_u32();
        let count = self.buffer.read_u32() as usize;

        // Transforms and texture rects are 16 bytes each
        if !self.buffer.validate_can_read(count, 32) {
            return;
        }
        self.buffer.skip(count * 32);

        if flags & DRAW_ATLAS_HAS_COLORS != 0 {
            if !self.buffer.validate_can_read(count, 4) {
                return;
            }

            self.buffer.skip(count * 4);
            self.buffer.read_u32();
        }

        if flags & DRAW_ATLAS_HAS_CULL != 0 {
            self.buffer.read_rect();
        }

        if flags & DRAW_ATLAS_HAS_SAMPLING != 0 {
            SamplingOptions::read_flat(&mut self.buffer);
        }
    }
}

///
/// Counts the ops in a stream without interpreting them (stopping at the first malformed header)
///
pub (crate) fn count_ops(op_data: &[u8]) -> usize {
    let mut buffer  = ReadCursor::new(op_data);
    let mut count   = 0;

    while !buffer.is_at_end() {
        let start           = buffer.offset();
        let (code, size)    = unpack_op(buffer.read_u32());
        let op_len          = if size == EXTENDED_OP_SIZE { (buffer.read_u32() as usize).saturating_add(3) } else { size as usize };

        if !buffer.is_valid() || code == 0 || start.saturating_add(op_len) < buffer.offset() || start.saturating_add(op_len) > buffer.len() {
            break;
        }

        buffer.skip(start + op_len - buffer.offset());
        count += 1;
    }

    count
}
