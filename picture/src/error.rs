use thiserror::Error;

///
/// Reasons that a picture (or part of a picture) could not be decoded
///
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PictureError {
    /// The magic number was wrong or the version is outside of the supported range
    #[error("malformed picture header")]
    MalformedHeader,

    /// A read would have gone past the end of the available data
    #[error("picture data is truncated or a read overran its buffer")]
    TruncatedOrOverrun,

    /// A flattenable referred to a factory name that has no registered decoder
    #[error("no decoder is registered for factory `{0}`")]
    UnknownFactoryName(String),

    /// A flattenable was recognised but cannot be replayed, and was skipped
    #[error("`{0}` is not supported and was skipped")]
    UnsupportedButSkippable(String),

    /// A flattenable or operation was recognised but can't be skipped without knowledge we don't have
    #[error("`{0}` is not supported and cannot be skipped")]
    UnsupportedAndUnskippable(String),

    /// Nested pictures went deeper than the recursion limit
    #[error("nested pictures exceed the recursion limit")]
    RecursionLimitExceeded,

    /// The byte following the picture header is not one we can read
    #[error("unsupported trailing byte {0} after the picture header")]
    UnsupportedTrailingByte(u8),

    /// A chunk tag that we don't know how to read
    #[error("unknown chunk tag {0:#010x}")]
    UnknownTag(u32),

    /// A chunk tag that we know about but refuse to read
    #[error("chunk tag {0:#010x} is not supported")]
    RejectedTag(u32),

    /// An operation code that is unknown, retired or unsupported
    #[error("drawing operation {0} is not supported")]
    UnsupportedOp(u32),

    /// A structural check on the data failed
    #[error("picture data failed validation")]
    Invalid,
}
