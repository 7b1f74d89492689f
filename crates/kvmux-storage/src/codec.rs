//! Table-name prefix codec.
//!
//! A logical table named `name` owns every physical key that starts with
//! `encode_prefix(name)`. The prefix is the name with each [`ESCAPE`] and
//! [`SEPARATOR`] byte preceded by [`ESCAPE`], terminated by a single
//! unescaped [`SEPARATOR`]:
//!
//! | Name | Prefix |
//! |------|--------|
//! | `fruit` | `fruit_` |
//! | `a_b` | `a\_b_` |
//! | `a\` | `a\\_` |
//! | *(empty)* | `_` |
//!
//! An unescaped separator only ever appears as the terminator, so reading a
//! physical key from the start identifies exactly one table. Two properties
//! follow and keep tables apart:
//!
//! - **Injective**: distinct names give distinct prefixes.
//! - **Prefix-free**: no prefix is a leading substring of another.
//!
//! The logical key that follows the prefix is never re-parsed, so it may
//! contain any bytes.

/// Escape byte: marks the following byte as part of the name.
pub const ESCAPE: u8 = b'\\';

/// Separator byte: terminates the encoded name when unescaped.
pub const SEPARATOR: u8 = b'_';

fn is_reserved(byte: u8) -> bool {
    byte == ESCAPE || byte == SEPARATOR
}

/// Encode a table name into its key prefix.
///
/// Total over all byte strings; the empty name encodes to a lone
/// [`SEPARATOR`].
#[must_use]
pub fn encode_prefix(name: &[u8]) -> Vec<u8> {
    let reserved = name.iter().filter(|&&b| is_reserved(b)).count();
    let mut prefix = Vec::with_capacity(name.len().saturating_add(reserved).saturating_add(1));
    for &byte in name {
        if is_reserved(byte) {
            prefix.push(ESCAPE);
        }
        prefix.push(byte);
    }
    prefix.push(SEPARATOR);
    prefix
}

/// Build the physical key `prefix ++ key`.
#[must_use]
pub fn physical_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut physical = Vec::with_capacity(prefix.len().saturating_add(key.len()));
    physical.extend_from_slice(prefix);
    physical.extend_from_slice(key);
    physical
}

/// Return the logical key if `physical` belongs to the table with `prefix`.
#[must_use]
pub fn strip_prefix<'a>(physical: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    physical.strip_prefix(prefix)
}

#[derive(Clone, Copy)]
enum Scan {
    Literal,
    Escaped,
}

/// Split a physical key into its table name and logical key.
///
/// Returns `None` if `physical` was not produced by [`encode_prefix`]: no
/// terminating separator, or an escape followed by an ordinary byte.
#[must_use]
pub fn decode_table_name(physical: &[u8]) -> Option<(Vec<u8>, &[u8])> {
    let mut name = Vec::new();
    let mut state = Scan::Literal;
    let mut rest = physical;

    while let Some((&byte, tail)) = rest.split_first() {
        rest = tail;
        state = match (state, byte) {
            (Scan::Literal, SEPARATOR) => return Some((name, rest)),
            (Scan::Literal, ESCAPE) => Scan::Escaped,
            (Scan::Escaped, b) if !is_reserved(b) => return None,
            (_, b) => {
                name.push(b);
                Scan::Literal
            },
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_name() {
        assert_eq!(encode_prefix(b"fruit"), b"fruit_".to_vec());
    }

    #[test]
    fn test_encode_empty_name() {
        assert_eq!(encode_prefix(b""), vec![SEPARATOR]);
    }

    #[test]
    fn test_encode_escapes_reserved_bytes() {
        assert_eq!(encode_prefix(b"a_b"), b"a\\_b_".to_vec());
        assert_eq!(encode_prefix(b"a\\"), b"a\\\\_".to_vec());
        assert_eq!(encode_prefix(b"_"), b"\\__".to_vec());
        assert_eq!(encode_prefix(b"\\_"), b"\\\\\\__".to_vec());
    }

    #[test]
    fn test_encode_passes_non_utf8_through() {
        assert_eq!(encode_prefix(&[0xff, 0x00]), vec![0xff, 0x00, SEPARATOR]);
    }

    #[test]
    fn test_names_that_look_alike_stay_apart() {
        // "a" + key "_b" must not meet table "a_" + key "b".
        let a = encode_prefix(b"a");
        let a_sep = encode_prefix(b"a_");
        assert_ne!(physical_key(&a, b"_b"), physical_key(&a_sep, b"b"));
        assert!(!a_sep.starts_with(&a));
        assert!(!a.starts_with(&a_sep));
    }

    #[test]
    fn test_empty_name_is_not_a_prefix_of_separator_name() {
        let empty = encode_prefix(b"");
        let sep = encode_prefix(b"_");
        assert!(!sep.starts_with(&empty));
        assert!(!empty.starts_with(&sep));
    }

    #[test]
    fn test_strip_prefix() {
        let prefix = encode_prefix(b"fruit");
        let physical = physical_key(&prefix, b"apple");
        assert_eq!(strip_prefix(&physical, &prefix), Some(&b"apple"[..]));
        assert_eq!(strip_prefix(b"fruits_apple", &prefix), None);
        assert_eq!(strip_prefix(&prefix, &prefix), Some(&b""[..]));
    }

    #[test]
    fn test_decode_recovers_name_and_key() {
        let names: [&[u8]; 6] = [b"", b"fruit", b"a_b", b"\\", b"__\\\\", &[0xfe, b'_']];
        for name in names {
            let physical = physical_key(&encode_prefix(name), b"k_\\ey");
            let (decoded, key) = decode_table_name(&physical).unwrap();
            assert_eq!(decoded, name);
            assert_eq!(key, b"k_\\ey");
        }
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        assert!(decode_table_name(b"").is_none());
        assert!(decode_table_name(b"no-terminator").is_none());
        assert!(decode_table_name(b"dangling\\").is_none());
        assert!(decode_table_name(b"bad\\xescape_key").is_none());
    }
}
