//! Behavioural properties of the multiplexing adapter.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use kvmux_storage::codec::{ESCAPE, SEPARATOR, encode_prefix};
use kvmux_storage::{Database, MemoryTable, MultiplexedDatabase, StorageError, Table};
use kvmux_test::{
    ANIMALS, CountingTable, FAILING_TABLE_MESSAGE, FRUIT, FailingTable, UnlistableTable,
    assert_entries, fill, reserved_table_names, setup_test_logging_default,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn memory_db() -> MultiplexedDatabase<MemoryTable> {
    MultiplexedDatabase::from_table(MemoryTable::new())
}

fn key_set(keys: Vec<Vec<u8>>) -> BTreeSet<Vec<u8>> {
    keys.into_iter().collect()
}

/// A random name drawn mostly from the reserved bytes.
fn random_name(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(0..=6);
    (0..len)
        .map(|_| match rng.gen_range(0..4) {
            0 => ESCAPE,
            1 => SEPARATOR,
            2 => b'a',
            _ => rng.gen_range(0..=255u8),
        })
        .collect()
}

#[test]
fn fruit_and_animals_scenario() {
    setup_test_logging_default();
    let db = memory_db();
    let fruit = db.open_table("fruit");
    let animals = db.open_table("animals");

    fill(&fruit, FRUIT).unwrap();
    fill(&animals, ANIMALS).unwrap();

    assert_entries(&fruit, FRUIT);
    assert_entries(&animals, ANIMALS);
    assert_eq!(
        fruit.get(b"apple").unwrap().as_deref(),
        Some(&b"red or green"[..])
    );
    assert_eq!(
        animals.get(b"apple").unwrap().as_deref(),
        Some(&b"not really an animal"[..])
    );
}

#[test]
fn round_trip_through_fresh_handles() {
    let db = memory_db();
    for name in reserved_table_names() {
        db.open_table(&name)
            .store(b"key", Some(name.as_slice()))
            .unwrap();
    }
    for name in reserved_table_names() {
        assert_eq!(db.open_table(&name).get(b"key").unwrap(), Some(name));
    }
}

#[test]
fn isolation_across_reserved_names() {
    let db = memory_db();
    let names = reserved_table_names();
    for (i, name) in names.iter().enumerate() {
        let value = i.to_string();
        db.open_table(name)
            .store(b"shared", Some(value.as_bytes()))
            .unwrap();
    }
    for (i, name) in names.iter().enumerate() {
        let table = db.open_table(name);
        assert_eq!(
            table.get(b"shared").unwrap(),
            Some(i.to_string().into_bytes()),
            "table {name:?}"
        );
        assert_eq!(table.list().unwrap(), vec![b"shared".to_vec()], "table {name:?}");
    }
}

#[test]
fn keys_containing_reserved_bytes_do_not_leak() {
    let db = memory_db();
    let a = db.open_table("a");
    let a_sep = db.open_table("a_");
    let empty = db.open_table("");

    // Physical "a_" + "_x" vs "a\__" + "x" vs "_" + "a__x".
    a.store(b"_x", Some(b"from a")).unwrap();
    a_sep.store(b"x", Some(b"from a_")).unwrap();
    empty.store(b"a__x", Some(b"from empty")).unwrap();

    assert_eq!(a.get(b"_x").unwrap(), Some(b"from a".to_vec()));
    assert_eq!(a_sep.get(b"x").unwrap(), Some(b"from a_".to_vec()));
    assert_eq!(empty.get(b"a__x").unwrap(), Some(b"from empty".to_vec()));
    assert!(a.get(b"x").unwrap().is_none());
    assert!(a_sep.get(b"_x").unwrap().is_none());
    assert_eq!(a.list().unwrap(), vec![b"_x".to_vec()]);
    assert_eq!(empty.list().unwrap(), vec![b"a__x".to_vec()]);
}

#[test]
fn delete_is_absence() {
    let db = memory_db();
    let t = db.open_table("t");
    t.store(b"k", Some(b"v")).unwrap();
    t.store(b"keep", Some(b"")).unwrap();
    t.store(b"k", None).unwrap();

    assert!(t.get(b"k").unwrap().is_none());
    assert_eq!(t.get(b"keep").unwrap(), Some(Vec::new()));
    assert_eq!(t.list().unwrap(), vec![b"keep".to_vec()]);
}

#[test]
fn list_matches_model_across_many_tables() {
    let db = memory_db();
    let names = reserved_table_names();
    let mut model: HashMap<Vec<u8>, BTreeSet<Vec<u8>>> = HashMap::new();
    let mut rng = StdRng::seed_from_u64(0x6b76_6d75);

    for _ in 0..2_000 {
        let name = &names[rng.gen_range(0..names.len())];
        let key = random_name(&mut rng);
        let table = db.open_table(name);
        let keys = model.entry(name.clone()).or_default();
        if rng.gen_bool(0.7) {
            table.store(&key, Some(b"v")).unwrap();
            keys.insert(key);
        } else {
            table.store(&key, None).unwrap();
            keys.remove(&key);
        }
    }

    for name in &names {
        let expected = model.get(name).cloned().unwrap_or_default();
        assert_eq!(
            key_set(db.open_table(name).list().unwrap()),
            expected,
            "table {name:?}"
        );
    }
}

#[test]
fn prefix_freedom_over_random_pairs() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut checked = 0;
    while checked < 1_000 {
        let a = random_name(&mut rng);
        let b = random_name(&mut rng);
        if a == b {
            continue;
        }
        let (pa, pb) = (encode_prefix(&a), encode_prefix(&b));
        assert!(!pb.starts_with(&pa), "{a:?} prefixes {b:?}");
        assert!(!pa.starts_with(&pb), "{b:?} prefixes {a:?}");
        checked += 1;
    }
}

#[test]
fn unsupported_enumeration_is_an_error_not_empty() {
    let db = MultiplexedDatabase::from_table(UnlistableTable::new());
    let t = db.open_table("t");
    t.store(b"k", Some(b"v")).unwrap();
    assert_eq!(t.get(b"k").unwrap(), Some(b"v".to_vec()));

    assert!(matches!(
        t.list(),
        Err(StorageError::Unsupported { operation: "list" })
    ));
    assert!(matches!(
        db.remove_table("t"),
        Err(StorageError::Unsupported { operation: "remove" })
    ));
    assert!(db.tables().unwrap_err().is_unsupported());

    // Nothing was deleted by the failed remove.
    assert_eq!(t.get(b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn backend_errors_pass_through_unchanged() {
    let db = MultiplexedDatabase::from_table(FailingTable);
    let t = db.open_table("t");

    for err in [
        t.get(b"k").unwrap_err(),
        t.store(b"k", Some(b"v")).unwrap_err(),
        t.list().unwrap_err(),
        db.remove_table("t").unwrap_err(),
        Database::close(&db).unwrap_err(),
    ] {
        let StorageError::Backend(source) = &err else {
            panic!("expected backend error, got {err:?}");
        };
        let io = source
            .downcast_ref::<std::io::Error>()
            .expect("io error source");
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
        assert_eq!(io.to_string(), FAILING_TABLE_MESSAGE);
    }
}

#[test]
fn close_closes_flat_table_exactly_once() {
    let flat = Arc::new(CountingTable::new());
    let db = MultiplexedDatabase::new(Arc::clone(&flat));
    let a = db.open_table("a");
    let b = db.open_table("b");
    a.store(b"k", Some(b"v")).unwrap();

    a.close().unwrap();
    a.close().unwrap();
    assert_eq!(flat.closes(), 0);

    Database::close(&db).unwrap();
    Database::close(&db).unwrap();
    assert_eq!(flat.closes(), 1);
    assert!(db.is_closed());
    drop(b);
}

#[test]
fn remove_deletes_only_the_named_table() {
    let db = memory_db();
    let names = reserved_table_names();
    for name in &names {
        let t = db.open_table(name);
        t.store(b"1", Some(b"x")).unwrap();
        t.store(b"_2", Some(b"y")).unwrap();
    }

    let (victim, survivors) = names.split_first().unwrap();
    assert_eq!(db.remove_table(victim).unwrap(), 2);
    assert!(db.open_table(victim).list().unwrap().is_empty());
    for name in survivors {
        assert_eq!(db.open_table(name).list().unwrap().len(), 2, "table {name:?}");
    }
    assert_eq!(db.tables().unwrap().len(), survivors.len());
}

#[test]
fn operations_go_straight_to_the_flat_table() {
    let flat = Arc::new(CountingTable::new());
    let db = MultiplexedDatabase::new(Arc::clone(&flat));
    let t = db.open_table("t");

    t.store(b"k", Some(b"v")).unwrap();
    t.get(b"k").unwrap();
    t.list().unwrap();

    assert_eq!((flat.stores(), flat.gets(), flat.lists()), (1, 1, 1));
}
