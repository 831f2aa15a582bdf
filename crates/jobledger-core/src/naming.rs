//! Names that end up inside SQL text.

/// Whether `s` is a plain SQL identifier: an ASCII letter or `_`, then ASCII
/// letters, digits or `_`.
///
/// Table names and prefixes are interpolated into statements, so anything
/// else is refused before it reaches the database.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
