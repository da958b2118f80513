//! 4-byte alignment rules.
//!
//! OSC has two padding contracts that must not be mixed up:
//! strings always need room for a NUL terminator, blobs never do.

/// Padded wire length of a NUL-terminated string with `n` content bytes.
///
/// Smallest multiple of 4 strictly greater than `n`.
pub const fn padded_string_len(n: usize) -> usize {
    (n + 4) & !3
}

/// Padded wire length of `n` bytes of blob data.
///
/// Smallest multiple of 4 greater than or equal to `n`.
pub const fn padded_blob_len(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_padding_always_leaves_a_terminator() {
        assert_eq!(padded_string_len(0), 4);
        assert_eq!(padded_string_len(1), 4);
        assert_eq!(padded_string_len(3), 4);
        assert_eq!(padded_string_len(4), 8);
        assert_eq!(padded_string_len(7), 8);
        assert_eq!(padded_string_len(8), 12);
    }

    #[test]
    fn test_blob_padding_keeps_aligned_lengths() {
        assert_eq!(padded_blob_len(0), 0);
        assert_eq!(padded_blob_len(1), 4);
        assert_eq!(padded_blob_len(4), 4);
        assert_eq!(padded_blob_len(5), 8);
        assert_eq!(padded_blob_len(8), 8);
    }
}
