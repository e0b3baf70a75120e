///
/// The operations that can appear in a picture's op stream
///
/// Codes that have been retired from the format have no variant here: pictures that use them are rejected.
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DrawType {
    ClipPath                = 1,
    ClipRegion              = 2,
    ClipRect                = 3,
    ClipRRect               = 4,
    Concat                  = 5,
    DrawClear               = 10,
    DrawData                = 11,
    DrawOval                = 12,
    DrawPaint               = 13,
    DrawPath                = 14,
    DrawPicture             = 15,
    DrawPoints              = 16,
    DrawRect                = 21,
    DrawRRect               = 22,
    Restore                 = 28,
    Rotate                  = 29,
    Save                    = 30,
    Scale                   = 32,
    SetMatrix               = 33,
    Skew                    = 34,
    Translate               = 35,
    Noop                    = 36,
    DrawDRRect              = 40,
    PushCull                = 41,
    PopCull                 = 42,
    DrawPatch               = 43,
    DrawPictureMatrixPaint  = 44,
    DrawTextBlob            = 45,
    DrawImage               = 46,
    DrawAtlas               = 48,
    DrawImageNine           = 49,
    DrawImageRect           = 50,
    SaveLayerSaveLayerRec   = 52,
    DrawAnnotation          = 53,
    DrawDrawable            = 54,
    DrawDrawableMatrix      = 55,
    DrawShadowRec           = 58,
    DrawImageLattice        = 59,
    DrawArc                 = 60,
    DrawRegion              = 61,
    DrawVerticesObject      = 62,
    Flush                   = 63,
    DrawEdgeAAImageSet      = 64,
    SaveBehind              = 65,
    DrawEdgeAAQuad          = 66,
    DrawBehindPaint         = 67,
    Concat44                = 68,
    ClipShaderInPaint       = 69,
    SetM44                  = 71,
    DrawImage2              = 72,
    DrawImageRect2          = 73,
    DrawImageLattice2       = 74,
    DrawEdgeAAImageSet2     = 75,
    ResetClip               = 76,
    DrawSlug                = 77,
}

/// Every op code that's still part of the format
const ALL_DRAW_TYPES: [DrawType; 55] = [
    DrawType::ClipPath, DrawType::ClipRegion, DrawType::ClipRect, DrawType::ClipRRect, DrawType::Concat,
    DrawType::DrawClear, DrawType::DrawData, DrawType::DrawOval, DrawType::DrawPaint, DrawType::DrawPath,
    DrawType::DrawPicture, DrawType::DrawPoints, DrawType::DrawRect, DrawType::DrawRRect, DrawType::Restore,
    DrawType::Rotate, DrawType::Save, DrawType::Scale, DrawType::SetMatrix, DrawType::Skew,
    DrawType::Translate, DrawType::Noop, DrawType::DrawDRRect, DrawType::PushCull, DrawType::PopCull,
    DrawType::DrawPatch, DrawType::DrawPictureMatrixPaint, DrawType::DrawTextBlob, DrawType::DrawImage, DrawType::DrawAtlas,
    DrawType::DrawImageNine, DrawType::DrawImageRect, DrawType::SaveLayerSaveLayerRec, DrawType::DrawAnnotation, DrawType::DrawDrawable,
    DrawType::DrawDrawableMatrix, DrawType::DrawShadowRec, DrawType::DrawImageLattice, DrawType::DrawArc, DrawType::DrawRegion,
    DrawType::DrawVerticesObject, DrawType::Flush, DrawType::DrawEdgeAAImageSet, DrawType::SaveBehind, DrawType::DrawEdgeAAQuad,
    DrawType::DrawBehindPaint, DrawType::Concat44, DrawType::ClipShaderInPaint, DrawType::SetM44, DrawType::DrawImage2,
    DrawType::DrawImageRect2, DrawType::DrawImageLattice2, DrawType::DrawEdgeAAImageSet2, DrawType::ResetClip, DrawType::DrawSlug,
];

/// The highest op code in the format
pub const LAST_DRAW_TYPE: u32 = DrawType::DrawSlug as u32;

/// Size value in an op header that means the real size follows in the next word
pub const EXTENDED_OP_SIZE: u32 = 0x00ff_ffff;

// Flags for SaveLayerSaveLayerRec
pub const SAVELAYERREC_HAS_BOUNDS: u32              = 1 << 0;
pub const SAVELAYERREC_HAS_PAINT: u32               = 1 << 1;
pub const SAVELAYERREC_HAS_BACKDROP: u32            = 1 << 2;
pub const SAVELAYERREC_HAS_FLAGS: u32               = 1 << 3;
pub const SAVELAYERREC_HAS_CLIPMASK: u32            = 1 << 4;
pub const SAVELAYERREC_HAS_CLIPMATRIX: u32          = 1 << 5;
pub const SAVELAYERREC_HAS_BACKDROP_SCALE: u32      = 1 << 6;
pub const SAVELAYERREC_HAS_MULTIPLE_FILTERS: u32    = 1 << 7;
pub const SAVELAYERREC_HAS_BACKDROP_TILE_MODE: u32  = 1 << 8;

/// The most image filters a single layer can have
pub const MAX_FILTERS_PER_LAYER: u32 = 16;

// Flags for SaveBehind
pub const SAVEBEHIND_HAS_SUBSET: u32 = 1 << 0;

// Flags for DrawAtlas
pub const DRAW_ATLAS_HAS_COLORS: u32    = 1 << 0;
pub const DRAW_ATLAS_HAS_CULL: u32      = 1 << 1;
pub const DRAW_ATLAS_HAS_SAMPLING: u32  = 1 << 2;

/// Set in a packed clip word when the clip is anti-aliased
pub const CLIP_ANTI_ALIAS: u32 = 0x10;

impl DrawType {
    ///
    /// Returns the op for a code read from a picture, or None if the code is unused or retired
    ///
    pub fn from_u32(code: u32) -> Option<DrawType> {
        ALL_DRAW_TYPES.iter()
            .find(|draw_type| draw_type.to_u32() == code)
            .copied()
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

///
/// Packs an op code and a size (which includes the header) into the first word of an op
///
#[inline]
pub fn pack_op(draw_type: DrawType, size: u32) -> u32 {
    (draw_type.to_u32() << 24) | (size & EXTENDED_OP_SIZE)
}

///
/// Splits the first word of an op into its code and size
///
#[inline]
pub fn unpack_op(word: u32) -> (u32, u32) {
    (word >> 24, word & EXTENDED_OP_SIZE)
}
