//! UTF-8-safe string slicing utilities
//!
//! Host limits are expressed in characters, so every split here works on
//! character boundaries and never panics on multi-byte input.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// # Examples
/// ```
/// # use sn2n::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("🎉🎊🎈", 2), "🎉🎊");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Split a string into consecutive slices of at most `max_chars` characters.
///
/// Produces `ceil(chars / max_chars)` slices; an empty input yields no slices.
///
/// # Examples
/// ```
/// # use sn2n::utils::string_utils::chunk_by_chars;
/// assert_eq!(chunk_by_chars("abcdefg", 3), vec!["abc", "def", "g"]);
/// assert!(chunk_by_chars("", 3).is_empty());
/// ```
pub fn chunk_by_chars(s: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = s;

    while !rest.is_empty() {
        let head = safe_truncate_chars(rest, max_chars);
        chunks.push(head);
        rest = &rest[head.len()..];
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_multibyte_boundaries() {
        let text = "é".repeat(5);
        let chunks = chunk_by_chars(&text, 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }
}
