use crate::path::*;
use crate::image::*;
use crate::paint::*;
use crate::effects::*;
use crate::geometry::*;
use crate::text_blob::*;

///
/// How strictly an image-rect draw keeps its sampling inside the source rectangle
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SrcRectConstraint {
    /// Sample only from inside the source rectangle
    Strict,

    /// Sampling may read outside of the source rectangle if that's faster
    Fast
}

impl SrcRectConstraint {
    pub fn from_u32(value: u32) -> Option<SrcRectConstraint> {
        match value {
            0 => Some(SrcRectConstraint::Strict),
            1 => Some(SrcRectConstraint::Fast),
            _ => None
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            SrcRectConstraint::Strict   => 0,
            SrcRectConstraint::Fast     => 1
        }
    }
}

impl Default for SrcRectConstraint {
    fn default() -> SrcRectConstraint { SrcRectConstraint::Fast }
}

///
/// Describes a layer created by `save_layer`
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SaveLayerRec {
    /// Limits the size of the layer, or None to use the clip bounds
    pub bounds: Option<Rect>,

    /// The paint used to draw the layer back when it's restored
    pub paint: Option<Paint>,

    /// Filter applied to what's already drawn beneath the layer, to provide its initial contents
    pub backdrop: Option<ImageFilter>,

    /// Layer creation flags
    pub flags: u32,

    /// Scale factor applied to the backdrop
    pub backdrop_scale: f32,

    /// Filters applied to the layer contents when it's restored, in addition to the paint's filter
    pub filters: Vec<ImageFilter>,

    /// How the backdrop is tiled when it is sampled outside its bounds
    pub backdrop_tile_mode: TileMode,
}

impl Default for SaveLayerRec {
    fn default() -> SaveLayerRec {
        SaveLayerRec {
            bounds:             None,
            paint:              None,
            backdrop:           None,
            flags:              0,
            backdrop_scale:     1.0,
            filters:            vec![],
            backdrop_tile_mode: TileMode::Clamp,
        }
    }
}

impl SaveLayerRec {
    ///
    /// A layer with the specified bounds and paint
    ///
    pub fn new(bounds: Option<Rect>, paint: Option<Paint>) -> SaveLayerRec {
        SaveLayerRec {
            bounds,
            paint,
            ..SaveLayerRec::default()
        }
    }
}

///
/// The calls that can be made against a surface, as data
///
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum SurfaceCall {
    Save,
    SaveLayer(SaveLayerRec),
    Restore,

    Translate(f32, f32),
    Scale(f32, f32),
    Rotate(f32),
    Skew(f32, f32),
    Concat(Matrix),
    Concat44(M44),
    SetMatrix(Matrix),
    SetM44(M44),

    ClipRect(Rect, ClipOp, bool),
    ClipRRect(RRect, ClipOp, bool),
    ClipPath(Path, ClipOp, bool),

    Clear(Color),
    DrawPaint(Paint),
    DrawRect(Rect, Paint),
    DrawRRect(RRect, Paint),
    DrawDRRect(RRect, RRect, Paint),
    DrawOval(Rect, Paint),
    DrawArc { oval: Rect, start_angle: f32, sweep_angle: f32, use_center: bool, paint: Paint },
    DrawPath(Path, Paint),
    DrawImage { image: Image, x: f32, y: f32, sampling: SamplingOptions, paint: Option<Paint> },
    DrawImageRect { image: Image, src: Option<Rect>, dst: Rect, sampling: SamplingOptions, paint: Option<Paint>, constraint: SrcRectConstraint },
    DrawTextBlob(TextBlob, f32, f32, Paint),
    DrawAnnotation(Rect, String, Vec<u8>),
}

///
/// A surface is the target that a picture is replayed against
///
/// Clip calls take the way the clip combines with the existing clip and whether or not it's anti-aliased.
/// An image-rect with no source rectangle draws the whole image.
///
pub trait Surface {
    fn save(&mut self);
    fn save_layer(&mut self, layer: SaveLayerRec);
    fn restore(&mut self);

    fn translate(&mut self, dx: f32, dy: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn rotate(&mut self, degrees: f32);
    fn skew(&mut self, sx: f32, sy: f32);
    fn concat(&mut self, matrix: Matrix);
    fn concat44(&mut self, matrix: M44);
    fn set_matrix(&mut self, matrix: Matrix);
    fn set_m44(&mut self, matrix: M44);

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, anti_alias: bool);
    fn clip_rrect(&mut self, rrect: RRect, op: ClipOp, anti_alias: bool);
    fn clip_path(&mut self, path: Path, op: ClipOp, anti_alias: bool);

    fn clear(&mut self, color: Color);
    fn draw_paint(&mut self, paint: Paint);
    fn draw_rect(&mut self, rect: Rect, paint: Paint);
    fn draw_rrect(&mut self, rrect: RRect, paint: Paint);
    fn draw_drrect(&mut self, outer: RRect, inner: RRect, paint: Paint);
    fn draw_oval(&mut self, oval: Rect, paint: Paint);
    fn draw_arc(&mut self, oval: Rect, start_angle: f32, sweep_angle: f32, use_center: bool, paint: Paint);
    fn draw_path(&mut self, path: Path, paint: Paint);
    fn draw_image(&mut self, image: Image, x: f32, y: f32, sampling: SamplingOptions, paint: Option<Paint>);
    fn draw_image_rect(&mut self, image: Image, src: Option<Rect>, dst: Rect, sampling: SamplingOptions, paint: Option<Paint>, constraint: SrcRectConstraint);
    fn draw_text_blob(&mut self, blob: TextBlob, x: f32, y: f32, paint: Paint);
    fn draw_annotation(&mut self, rect: Rect, key: String, value: Vec<u8>);

    fn draw(&mut self, call: SurfaceCall) {
        use self::SurfaceCall::*;

        match call {
            Save                                                                    => self.save(),
            SaveLayer(layer)                                                        => self.save_layer(layer),
            Restore                                                                 => self.restore(),

            Translate(dx, dy)                                                       => self.translate(dx, dy),
            Scale(sx, sy)                                                           => self.scale(sx, sy),
            Rotate(degrees)                                                         => self.rotate(degrees),
            Skew(sx, sy)                                                            => self.skew(sx, sy),
            Concat(matrix)                                                          => self.concat(matrix),
            Concat44(matrix)                                                        => self.concat44(matrix),
            SetMatrix(matrix)                                                       => self.set_matrix(matrix),
            SetM44(matrix)                                                          => self.set_m44(matrix),

            ClipRect(rect, op, anti_alias)                                          => self.clip_rect(rect, op, anti_alias),
            ClipRRect(rrect, op, anti_alias)                                        => self.clip_rrect(rrect, op, anti_alias),
            ClipPath(path, op, anti_alias)                                          => self.clip_path(path, op, anti_alias),

            Clear(color)                                                            => self.clear(color),
            DrawPaint(paint)                                                        => self.draw_paint(paint),
            DrawRect(rect, paint)                                                   => self.draw_rect(rect, paint),
            DrawRRect(rrect, paint)                                                 => self.draw_rrect(rrect, paint),
            DrawDRRect(outer, inner, paint)                                         => self.draw_drrect(outer, inner, paint),
            DrawOval(oval, paint)                                                   => self.draw_oval(oval, paint),
            DrawArc { oval, start_angle, sweep_angle, use_center, paint }           => self.draw_arc(oval, start_angle, sweep_angle, use_center, paint),
            DrawPath(path, paint)                                                   => self.draw_path(path, paint),
            DrawImage { image, x, y, sampling, paint }                              => self.draw_image(image, x, y, sampling, paint),
            DrawImageRect { image, src, dst, sampling, paint, constraint }          => self.draw_image_rect(image, src, dst, sampling, paint, constraint),
            DrawTextBlob(blob, x, y, paint)                                         => self.draw_text_blob(blob, x, y, paint),
            DrawAnnotation(rect, key, value)                                        => self.draw_annotation(rect, key, value)
        }
    }
}

///
/// A Vec<SurfaceCall> can be used as a surface (it just records the calls made against it)
///
impl Surface for Vec<SurfaceCall> {
    #[inline] fn save(&mut self)                                                    { self.push(SurfaceCall::Save); }
    #[inline] fn save_layer(&mut self, layer: SaveLayerRec)                         { self.push(SurfaceCall::SaveLayer(layer)); }
    #[inline] fn restore(&mut self)                                                 { self.push(SurfaceCall::Restore); }

    #[inline] fn translate(&mut self, dx: f32, dy: f32)                             { self.push(SurfaceCall::Translate(dx, dy)); }
    #[inline] fn scale(&mut self, sx: f32, sy: f32)                                 { self.push(SurfaceCall::Scale(sx, sy)); }
    #[inline] fn rotate(&mut self, degrees: f32)                                    { self.push(SurfaceCall::Rotate(degrees)); }
    #[inline] fn skew(&mut self, sx: f32, sy: f32)                                  { self.push(SurfaceCall::Skew(sx, sy)); }
    #[inline] fn concat(&mut self, matrix: Matrix)                                  { self.push(SurfaceCall::Concat(matrix)); }
    #[inline] fn concat44(&mut self, matrix: M44)                                   { self.push(SurfaceCall::Concat44(matrix)); }
    #[inline] fn set_matrix(&mut self, matrix: Matrix)                              { self.push(SurfaceCall::SetMatrix(matrix)); }
    #[inline] fn set_m44(&mut self, matrix: M44)                                    { self.push(SurfaceCall::SetM44(matrix)); }

    #[inline] fn clip_rect(&mut self, rect: Rect, op: ClipOp, aa: bool)             { self.push(SurfaceCall::ClipRect(rect, op, aa)); }
    #[inline] fn clip_rrect(&mut self, rrect: RRect, op: ClipOp, aa: bool)          { self.push(SurfaceCall::ClipRRect(rrect, op, aa)); }
    #[inline] fn clip_path(&mut self, path: Path, op: ClipOp, aa: bool)             { self.push(SurfaceCall::ClipPath(path, op, aa)); }

    #[inline] fn clear(&mut self, color: Color)                                     { self.push(SurfaceCall::Clear(color)); }
    #[inline] fn draw_paint(&mut self, paint: Paint)                                { self.push(SurfaceCall::DrawPaint(paint)); }
    #[inline] fn draw_rect(&mut self, rect: Rect, paint: Paint)                     { self.push(SurfaceCall::DrawRect(rect, paint)); }
    #[inline] fn draw_rrect(&mut self, rrect: RRect, paint: Paint)                  { self.push(SurfaceCall::DrawRRect(rrect, paint)); }
    #[inline] fn draw_drrect(&mut self, outer: RRect, inner: RRect, paint: Paint)   { self.push(SurfaceCall::DrawDRRect(outer, inner, paint)); }
    #[inline] fn draw_oval(&mut self, oval: Rect, paint: Paint)                     { self.push(SurfaceCall::DrawOval(oval, paint)); }
    #[inline] fn draw_path(&mut self, path: Path, paint: Paint)                     { self.push(SurfaceCall::DrawPath(path, paint)); }

    #[inline] fn draw_arc(&mut self, oval: Rect, start_angle: f32, sweep_angle: f32, use_center: bool, paint: Paint) {
        self.push(SurfaceCall::DrawArc { oval, start_angle, sweep_angle, use_center, paint });
    }

    #[inline] fn draw_image(&mut self, image: Image, x: f32, y: f32, sampling: SamplingOptions, paint: Option<Paint>) {
        self.push(SurfaceCall::DrawImage { image, x, y, sampling, paint });
    }

    #[inline] fn draw_image_rect(&mut self, image: Image, src: Option<Rect>, dst: Rect, sampling: SamplingOptions, paint: Option<Paint>, constraint: SrcRectConstraint) {
        self.push(SurfaceCall::DrawImageRect { image, src, dst, sampling, paint, constraint });
    }

    #[inline] fn draw_text_blob(&mut self, blob: TextBlob, x: f32, y: f32, paint: Paint)       { self.push(SurfaceCall::DrawTextBlob(blob, x, y, paint)); }
    #[inline] fn draw_annotation(&mut self, rect: Rect, key: String, value: Vec<u8>)          { self.push(SurfaceCall::DrawAnnotation(rect, key, value)); }

    #[inline]
    fn draw(&mut self, call: SurfaceCall) {
        self.push(call);
    }
}
