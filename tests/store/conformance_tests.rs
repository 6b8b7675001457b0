//! Store conformance checks

use crate::test_helpers::{derived, primitive};
use param_catalog::{Catalog, CatalogError, DependencyEdge, MemoryStore, Parameter, ParameterStore};
use std::collections::BTreeSet;

fn row(name: &str, is_derived: bool, value: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        group: "SI".to_string(),
        symbol: "s".to_string(),
        units: "m".to_string(),
        is_derived,
        value: value.to_string(),
    }
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn check_records<S: ParameterStore>(store: &mut S) {
    assert!(store.read_parameter("A").unwrap_err().is_not_found());
    assert!(matches!(
        store.read_expression("A"),
        Err(CatalogError::ExpressionNotFound { .. })
    ));
    assert!(store.read_dependencies("A").unwrap().is_empty());

    store.write_parameter(&row("A", false, "1")).unwrap();
    store.write_parameter(&row("A", false, "2")).unwrap();
    store.write_parameter(&row("B", true, "4")).unwrap();
    store.write_expression("B", "\"A\" * 2").unwrap();
    store.write_expression("B", "\"A\" + \"A\"").unwrap();
    store.write_dependencies("B", &set(&["A"])).unwrap();

    assert_eq!(store.read_parameter("A").unwrap(), row("A", false, "2"));
    assert!(store.contains_parameter("B").unwrap());
    assert_eq!(store.read_expression("B").unwrap(), "\"A\" + \"A\"");
    assert_eq!(store.read_dependencies("B").unwrap(), set(&["A"]));
    assert_eq!(
        store.read_all_dependency_edges().unwrap(),
        vec![DependencyEdge::new("B", "A")]
    );
    assert_eq!(store.list_parameters("", true).unwrap(), vec!["A"]);

    store.erase_dependencies("B").unwrap();
    store.erase_expression("B").unwrap();
    store.erase_parameter("B").unwrap();
    assert!(!store.contains_parameter("B").unwrap());
    assert!(store.read_all_dependency_edges().unwrap().is_empty());

    // Erasing absent records is not an error
    store.erase_parameter("B").unwrap();
    store.erase_expression("B").unwrap();
    store.erase_dependencies("B").unwrap();
}

fn check_rename_all<S: ParameterStore>(store: &mut S) {
    store.write_parameter(&row("A", false, "1")).unwrap();
    store.write_parameter(&row("B", true, "2")).unwrap();
    store.write_parameter(&row("C", true, "3")).unwrap();
    store.write_expression("B", "\"A\" * 2").unwrap();
    store.write_expression("C", "\"B\" + 1").unwrap();
    store.write_dependencies("B", &set(&["A"])).unwrap();
    store.write_dependencies("C", &set(&["B"])).unwrap();

    store.rename_all("B", "B2").unwrap();

    assert_eq!(store.read_parameter("B2").unwrap().name, "B2");
    assert!(!store.contains_parameter("B").unwrap());
    assert_eq!(store.read_expression("B2").unwrap(), "\"A\" * 2");
    assert_eq!(store.read_dependencies("B2").unwrap(), set(&["A"]));
    assert_eq!(store.read_dependencies("C").unwrap(), set(&["B2"]));
    // Expression texts are rewritten by the catalogue, not the store
    assert_eq!(store.read_expression("C").unwrap(), "\"B\" + 1");
}

fn check_transactions<S: ParameterStore>(store: &mut S) {
    store.begin().unwrap();
    store.write_parameter(&row("A", false, "1")).unwrap();
    store.commit().unwrap();

    store.begin().unwrap();
    store.write_parameter(&row("A", false, "9")).unwrap();
    store.write_expression("A", "oops").unwrap();
    store.write_dependencies("A", &set(&["Z"])).unwrap();
    store.rollback().unwrap();

    assert_eq!(store.read_parameter("A").unwrap().value, "1");
    assert!(store.read_expression("A").is_err());
    assert!(store.read_all_dependency_edges().unwrap().is_empty());

    assert!(matches!(
        store.commit(),
        Err(CatalogError::StoreFailure(_))
    ));
}

fn check_catalog<S: ParameterStore>(store: S) {
    let mut catalog = Catalog::new(store);
    catalog.write("SI_a", primitive("2")).unwrap();
    catalog.write("SI_b", derived("\"SI_a\" * 3 + 1")).unwrap();
    catalog.write("SI_a", primitive("5")).unwrap();
    assert_eq!(catalog.read("SI_b").unwrap().value, "16");

    assert!(catalog.write("SI_a", primitive("abc")).is_err());
    assert_eq!(catalog.read("SI_a").unwrap().value, "5");

    catalog.rename("SI_a", "SI_c").unwrap();
    assert_eq!(catalog.read_expression("SI_b").unwrap(), "\"SI_c\" * 3 + 1");
    assert!(catalog.erase("SI_c").is_err());
    catalog.erase("SI_b").unwrap();
    catalog.erase("SI_c").unwrap();
    assert!(catalog.list("SI", false).unwrap().is_empty());
}

#[test]
fn test_memory_store() {
    check_records(&mut MemoryStore::new());
    check_rename_all(&mut MemoryStore::new());
    check_transactions(&mut MemoryStore::new());
    check_catalog(MemoryStore::new());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_store() {
    use param_catalog::SqliteStore;

    check_records(&mut SqliteStore::open_in_memory().unwrap());
    check_rename_all(&mut SqliteStore::open_in_memory().unwrap());
    check_transactions(&mut SqliteStore::open_in_memory().unwrap());
    check_catalog(SqliteStore::open_in_memory().unwrap());
}

#[cfg(feature = "sqlite")]
#[test]
fn test_sqlite_catalog_persists() {
    use param_catalog::SqliteStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parameters.db");

    {
        let mut catalog = Catalog::new(SqliteStore::open_path(&path).unwrap());
        catalog.write("BO_a", primitive("1.5")).unwrap();
        catalog.write("BO_b", derived("\"BO_a\" * 2")).unwrap();
    }

    let mut catalog = Catalog::new(SqliteStore::open_path(&path).unwrap());
    assert_eq!(catalog.read("BO_b").unwrap().value, "3");
    catalog.write("BO_a", primitive("2")).unwrap();
    assert_eq!(catalog.read("BO_b").unwrap().value, "4");
}

#[test]
fn test_memory_store_json_file() {
    let file = tempfile::NamedTempFile::new().unwrap();

    let mut catalog = Catalog::new(MemoryStore::new());
    catalog.write("TS_a", primitive("1")).unwrap();
    catalog.write("TS_b", derived("\"TS_a\" + 1")).unwrap();
    catalog.store().save_json(file.path()).unwrap();

    let mut catalog = Catalog::new(MemoryStore::load_json(file.path()).unwrap());
    assert_eq!(catalog.read_dependencies("TS_b").unwrap(), vec!["TS_a"]);
    catalog.write("TS_a", primitive("41")).unwrap();
    assert_eq!(catalog.read("TS_b").unwrap().value, "42");
}
