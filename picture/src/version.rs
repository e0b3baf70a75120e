//!
//! Picture format versions, and the features that each version introduced
//!

///
/// Every format version that changed how something is serialized. Readers check the version of the stream
/// against these to decide which fields are present.
///
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Version {
    PictureShaderFilterParam            = 82,
    MatrixImageFilterSampling           = 83,
    ImageFilterImageSampling            = 84,
    NoFilterQualityShaders              = 85,
    VerticesRemoveCustomData            = 86,
    BlenderInPaint                      = 87,
    BlenderInEffects                    = 88,
    NoExpandingClipOps                  = 89,
    BackdropScaleFactor                 = 90,
    RawImageShaders                     = 91,
    AnisotropicFilter                   = 92,
    Blend4fColorFilter                  = 93,
    NoShaderLocalMatrix                 = 94,
    ShaderImageFilterSerializeShader    = 95,
    RevampMagnifierFilter               = 96,
    RuntimeImageFilterSampleRadius      = 97,
    CombineBlendArithmeticFilters       = 98,
    RemoveLegacyMagnifierFilter         = 99,
    DropShadowImageFilterComposition    = 100,
    CropImageFilterSupportsTiling       = 101,
    ConvolutionImageFilterTilingUpdate  = 102,
    RemoveDeprecatedCropRect            = 103,
    MultipleFiltersOnSaveLayer          = 104,
    UnclampedMatrixColorFilter          = 105,
    SaveLayerBackdropTileMode           = 106,
    CombineColorShaders                 = 107,
    SerializeStableKeys                 = 108,
    WorkingColorSpaceOutput             = 109,
}

/// The oldest version that can be read
pub const MIN_VERSION: u32 = Version::PictureShaderFilterParam as u32;

/// The version written by the encoder
pub const CURRENT_VERSION: u32 = Version::WorkingColorSpaceOutput as u32;

impl Version {
    ///
    /// The version number as it appears in the picture header
    ///
    #[inline]
    pub fn number(self) -> u32 {
        self as u32
    }

    ///
    /// True if a picture with the specified version number can be read
    ///
    #[inline]
    pub fn is_supported(version: u32) -> bool {
        version >= MIN_VERSION && version <= CURRENT_VERSION
    }

    ///
    /// Returns true if a stream declaring `stream_version` predates this feature
    ///
    /// A version of 0 means 'unknown/current', which is never considered older than any feature.
    ///
    #[inline]
    pub fn is_newer_than(self, stream_version: u32) -> bool {
        stream_version > 0 && stream_version < self.number()
    }
}
