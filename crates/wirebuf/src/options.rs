/// Limits and policies for a [`WireReader`](crate::WireReader).
///
/// # Examples
///
/// ```rust
/// use wirebuf::{ReaderOptions, WireReader};
///
/// let options = ReaderOptions {
///     recursion_limit: 16,
///     strict_utf8: true,
///     ..Default::default()
/// };
/// let mut reader = WireReader::from_slice_with_options(&[0x08, 0x96, 0x01], options);
/// assert_eq!(reader.next_field().unwrap(), Some(1));
/// assert_eq!(reader.read_int32().unwrap(), 150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// How many nested messages and groups may be open at once.
    ///
    /// Entering one more fails with `RecursionLimitExceeded` before any of its
    /// payload is read.
    ///
    /// # Default
    ///
    /// `100`
    pub recursion_limit: usize,

    /// How many bytes a stream-backed reader may consume between calls to
    /// [`WireReader::reset_size_counter`](crate::WireReader::reset_size_counter).
    ///
    /// Slice-backed readers already hold all of their input and ignore this.
    ///
    /// # Default
    ///
    /// `i32::MAX`
    pub size_limit: usize,

    /// Whether `read_string_list` rejects ill-formed UTF-8 instead of
    /// replacing it with U+FFFD. Single-string reads take the flag as an
    /// argument.
    ///
    /// # Default
    ///
    /// `false`
    pub strict_utf8: bool,

    /// Size of the read buffer of a stream-backed reader, and of the chunks
    /// large byte fields are read in.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_size: usize,

    /// Whether byte fields read from shared input that the caller declared
    /// immutable may point into that input instead of being copied.
    ///
    /// # Default
    ///
    /// `true`
    pub alias_immutable: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            recursion_limit: 100,
            size_limit: i32::MAX as usize,
            strict_utf8: false,
            buffer_size: 4096,
            alias_immutable: true,
        }
    }
}
