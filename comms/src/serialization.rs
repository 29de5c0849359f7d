use std::io;

/// Writes a value into a frame body.
pub trait Serialize<'a> {
    /// Serializes `self` into `buf`.
    ///
    /// Implementors may append a header to `buf` and hand back a borrowed slice
    /// that is written right after it, avoiding a copy of large payloads.
    ///
    /// # Arguments
    /// * `buf` - The body buffer, the length prefix is written separately.
    ///
    /// # Returns
    /// The trailing zero-copy bytes, if any.
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]>;
}

/// Reads a value out of a frame body.
pub trait Deserialize<'a>: Sized {
    /// Deserializes a value borrowing from `buf`.
    ///
    /// # Arguments
    /// * `buf` - The frame body, without the length prefix.
    ///
    /// # Returns
    /// The value or an `io::Error` if the bytes are malformed.
    fn deserialize(buf: &'a mut [u8]) -> io::Result<Self>;
}
