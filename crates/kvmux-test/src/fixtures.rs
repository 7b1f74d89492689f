//! Test fixtures for common scenarios.

use kvmux_storage::codec::{ESCAPE, SEPARATOR};
use kvmux_storage::{StorageResult, Table};

/// Keys and values of the `fruit` table in the fruit/animals scenario.
pub const FRUIT: &[(&str, &str)] = &[
    ("apple", "red or green"),
    ("banana", "yellow"),
    ("dog", "dogs aren't fruit!"),
];

/// Keys and values of the `animals` table in the fruit/animals scenario.
pub const ANIMALS: &[(&str, &str)] = &[("dog", "WOOF!"), ("apple", "not really an animal")];

/// Store `entries` in `table`.
///
/// # Errors
///
/// Returns the first error the table reports.
pub fn fill(table: &dyn Table, entries: &[(&str, &str)]) -> StorageResult<()> {
    for (key, value) in entries {
        table.store(key.as_bytes(), Some(value.as_bytes()))?;
    }
    Ok(())
}

/// Assert that `table` holds exactly the values in `entries`.
///
/// # Panics
///
/// Panics if a lookup fails or returns a different value.
pub fn assert_entries(table: &dyn Table, entries: &[(&str, &str)]) {
    for (key, expected) in entries {
        let value = table
            .get(key.as_bytes())
            .unwrap_or_else(|e| panic!("get {key:?} failed: {e}"));
        assert_eq!(
            value.as_deref(),
            Some(expected.as_bytes()),
            "incorrect value for {key:?}"
        );
    }
}

/// Table names that stress the prefix codec: empty, made only of reserved
/// bytes, or differing only by escaping.
#[must_use]
pub fn reserved_table_names() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        vec![SEPARATOR],
        vec![ESCAPE],
        vec![ESCAPE, SEPARATOR],
        vec![SEPARATOR, SEPARATOR],
        b"a".to_vec(),
        b"a_".to_vec(),
        b"a__".to_vec(),
        b"a\\".to_vec(),
        b"a\\_".to_vec(),
        b"_a".to_vec(),
        b"a_b".to_vec(),
        b"a\\_b".to_vec(),
        vec![0xff, SEPARATOR, 0x00],
    ]
}
