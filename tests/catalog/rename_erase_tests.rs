//! Tests for renaming and erasing parameters

use crate::test_helpers::{derived, memory_catalog, primitive};
use param_catalog::{CatalogError, ParameterStore};

#[test]
fn test_rename_consistency() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" * 3 + \"A\"")).unwrap();
    let before = catalog.read("A").unwrap();

    catalog.rename("A", "A2").unwrap();

    assert!(catalog.read("A").unwrap_err().is_not_found());
    let after = catalog.read("A2").unwrap();
    assert_eq!(after.name, "A2");
    assert_eq!(after.value, before.value);
    assert_eq!(after.symbol, before.symbol);

    assert_eq!(catalog.read_expression("B").unwrap(), "\"A2\" * 3 + \"A2\"");
    assert_eq!(catalog.read_dependencies("B").unwrap(), vec!["A2"]);
    assert_eq!(catalog.read_dependents("A2").unwrap(), vec!["B"]);
    assert!(catalog.read_dependents("A").unwrap().is_empty());

    // The renamed graph still propagates
    catalog.write("A2", primitive("5")).unwrap();
    assert_eq!(catalog.read("B").unwrap().value, "20");
}

#[test]
fn test_rename_is_token_safe() {
    let mut catalog = memory_catalog();
    catalog.write("E", primitive("2")).unwrap();
    catalog.write("E_total", primitive("10")).unwrap();
    catalog
        .write("R", derived("\"E_total\" / \"E\" + exp(0)"))
        .unwrap();

    catalog.rename("E", "Energy").unwrap();

    assert_eq!(
        catalog.read_expression("R").unwrap(),
        "\"E_total\" / \"Energy\" + exp(0)"
    );
    assert_eq!(catalog.read_dependencies("R").unwrap(), vec!["E_total", "Energy"]);
}

#[test]
fn test_rename_derived() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" + 1")).unwrap();
    catalog.write("C", derived("\"B\" * 2")).unwrap();

    catalog.rename("B", "B2").unwrap();

    assert_eq!(catalog.read_expression("B2").unwrap(), "\"A\" + 1");
    assert_eq!(catalog.read_dependencies("B2").unwrap(), vec!["A"]);
    assert_eq!(catalog.read_expression("C").unwrap(), "\"B2\" * 2");
    assert!(catalog.store().read_expression("B").is_err());
}

#[test]
fn test_rename_guards() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("1")).unwrap();
    catalog.write("B", primitive("2")).unwrap();
    let before = catalog.store().to_json().unwrap();

    assert!(matches!(
        catalog.rename("missing", "C"),
        Err(CatalogError::ParameterNotFound { .. })
    ));
    assert!(matches!(
        catalog.rename("A", "B"),
        Err(CatalogError::ParameterExists { .. })
    ));
    assert!(matches!(
        catalog.rename("A", ""),
        Err(CatalogError::InvalidName { .. })
    ));
    assert!(matches!(
        catalog.rename("A", "x\"y"),
        Err(CatalogError::InvalidName { .. })
    ));
    catalog.rename("A", "A").unwrap();

    assert_eq!(catalog.store().to_json().unwrap(), before);
}

#[test]
fn test_erase_guard() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" * 3 + 1")).unwrap();
    catalog.write("C", derived("\"B\" - 1")).unwrap();

    match catalog.erase("A") {
        Err(CatalogError::DependentsExist { name, dependents }) => {
            assert_eq!(name, "A");
            assert_eq!(dependents, vec!["B", "C"]);
        }
        other => panic!("Expected DependentsExist error, got {:?}", other),
    }
    assert!(matches!(
        catalog.erase("B"),
        Err(CatalogError::DependentsExist { .. })
    ));

    catalog.erase("C").unwrap();
    catalog.erase("B").unwrap();
    catalog.erase("A").unwrap();

    assert!(catalog.read("A").unwrap_err().is_not_found());
    assert!(catalog.store().read_all_dependency_edges().unwrap().is_empty());
    assert!(catalog.store().list_parameters("", false).unwrap().is_empty());
}

#[test]
fn test_erase_removes_all_records() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" * 2")).unwrap();

    catalog.erase("B").unwrap();

    assert!(catalog.store().read_expression("B").is_err());
    assert!(catalog.read_dependencies("B").unwrap().is_empty());
    assert!(catalog.read_dependents("A").unwrap().is_empty());
}

#[test]
fn test_erase_missing() {
    let mut catalog = memory_catalog();
    assert!(matches!(
        catalog.erase("missing"),
        Err(CatalogError::ParameterNotFound { .. })
    ));
}
