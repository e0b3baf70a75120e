///
/// Settings that control how pictures are decoded
///
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// How many levels of nested picture can be read before decoding fails
    pub recursion_limit: i32,

    /// Whether or not typefaces embedded directly into a font (rather than via the typeface table) are accepted
    pub allow_custom_typefaces: bool,

    /// The maximum number of drawing operations that will be played back from a single picture
    pub max_op_count: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            recursion_limit:        100,
            allow_custom_typefaces: true,
            max_op_count:           None
        }
    }
}

impl DecodeOptions {
    pub fn with_recursion_limit(mut self, recursion_limit: i32) -> DecodeOptions {
        self.recursion_limit = recursion_limit;
        self
    }

    pub fn with_custom_typefaces(mut self, allow: bool) -> DecodeOptions {
        self.allow_custom_typefaces = allow;
        self
    }

    pub fn with_max_op_count(mut self, max_op_count: Option<usize>) -> DecodeOptions {
        self.max_op_count = max_op_count;
        self
    }
}
