//! Id-format validation and typed-reference parsing.
//!
//! No `regex` dependency: every format here is simple enough to check with
//! character predicates, in keeping with the rest of the crate.

/// True if `s` is `^\d+$` — the id shape for regular (numeric) types.
pub fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// True if `s` is `^\d{4}-\d{2}-\d{2}$` — the id shape for `dailies`.
pub fn is_date_id(s: &str) -> bool {
    is_date(s)
}

/// True if `s` is `^\d{4}-\d{2}-\d{2}-\d{2}\.\d{2}\.\d{2}\.\d{3}$` — the id
/// shape for `sessions`.
pub fn is_session_id(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 23 {
        return false;
    }
    let digits: &[usize] = &[0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18, 20, 21, 22];
    for &i in digits {
        if !bytes[i].is_ascii_digit() {
            return false;
        }
    }
    bytes[4] == b'-' && bytes[7] == b'-' && bytes[10] == b'-' && bytes[13] == b'.' && bytes[16] == b'.' && bytes[19] == b'.'
}

/// True if `s` is `^\d{4}-\d{2}-\d{2}$`.
pub fn is_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(|b| b.is_ascii_digit())
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(|b| b.is_ascii_digit())
}

/// True if `name` matches the type-name shape `^[a-z0-9_]+$`.
pub fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Parses a typed reference string `type-id` into its parts.
///
/// The type portion is the longest valid `[a-z0-9_]+` prefix terminated by a
/// `-`; the remainder (which may itself contain `-`, as session and daily
/// ids do) is the id. Returns `None` if no such split exists.
pub fn parse_reference(reference: &str) -> Option<(&str, &str)> {
    let dash = reference.find('-')?;
    let (type_name, rest) = reference.split_at(dash);
    let id = &rest[1..];
    if type_name.is_empty() || id.is_empty() || !is_valid_type_name(type_name) {
        return None;
    }
    Some((type_name, id))
}
