//! Tests for reading and writing single parameters

use crate::test_helpers::{derived, memory_catalog, primitive, value_of};
use param_catalog::{
    Catalog, CatalogConfig, CatalogError, CheckOutcome, MemoryStore, Parameter, ParameterFields,
};

#[test]
fn test_round_trip() {
    let mut catalog = memory_catalog();
    let fields = ParameterFields::new()
        .with_group("Storage Ring")
        .with_symbol("<math>E_0</math>")
        .with_units("GeV")
        .with_is_derived(false)
        .with_value("3.5");
    catalog.write("SI_energy", fields).unwrap();

    assert_eq!(
        catalog.read("SI_energy").unwrap(),
        Parameter {
            name: "SI_energy".to_string(),
            group: "Storage Ring".to_string(),
            symbol: "<math>E_0</math>".to_string(),
            units: "GeV".to_string(),
            is_derived: false,
            value: "3.5".to_string(),
        }
    );

    // Stored bare
    assert_eq!(catalog.store().to_json().unwrap().matches("<math>").count(), 0);
}

#[test]
fn test_evaluation_correctness() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" * 3 + 1")).unwrap();

    let b = catalog.read("B").unwrap();
    assert!(b.is_derived);
    assert_eq!(b.value, "7");
    assert_eq!(catalog.read_dependencies("B").unwrap(), vec!["A"]);
    assert_eq!(catalog.read_expression("B").unwrap(), "\"A\" * 3 + 1");
}

#[test]
fn test_functions_and_constants() {
    let mut catalog = memory_catalog();
    catalog.write("SI_energy", primitive("3")).unwrap();
    catalog.write("SI_gamma", derived("gamma(\"SI_energy\")")).unwrap();
    catalog
        .write("SI_beta", derived("sqrt(1 - 1 / pow(\"SI_gamma\", 2))"))
        .unwrap();
    catalog
        .write("SI_velocity", derived("\"SI_beta\" * $light_speed"))
        .unwrap();

    let gamma = value_of(&catalog, "SI_gamma");
    approx::assert_relative_eq!(gamma, 5870.853, max_relative = 1e-6);
    let velocity = value_of(&catalog, "SI_velocity");
    approx::assert_relative_eq!(velocity, 299_792_458.0, max_relative = 1e-7);
    assert_eq!(
        catalog.read_dependencies("SI_velocity").unwrap(),
        vec!["SI_beta"]
    );
}

#[test]
fn test_missing_fields_leave_store_untouched() {
    let mut catalog = memory_catalog();
    let before = catalog.store().to_json().unwrap();

    let fields = ParameterFields::new().with_group("SI").with_value("1");
    match catalog.write("A", fields) {
        Err(CatalogError::MissingFields { fields }) => {
            assert_eq!(fields, vec!["symbol", "units", "is_derived"])
        }
        other => panic!("Expected MissingFields error, got {:?}", other),
    }

    assert_eq!(catalog.store().to_json().unwrap(), before);
}

#[test]
fn test_empty_strings_are_values() {
    let mut catalog = memory_catalog();
    let fields = ParameterFields::new()
        .with_group("")
        .with_symbol("")
        .with_units("")
        .with_is_derived(false)
        .with_value("");
    catalog.write("A", fields).unwrap();
    assert_eq!(catalog.read("A").unwrap().value, "");
}

#[test]
fn test_invalid_name() {
    let mut catalog = memory_catalog();
    assert!(matches!(
        catalog.write("", primitive("1")),
        Err(CatalogError::InvalidName { .. })
    ));
    assert!(matches!(
        catalog.write("A\"B", primitive("1")),
        Err(CatalogError::InvalidName { .. })
    ));
}

#[test]
fn test_malformed_quoting() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();

    match catalog.write("B", derived("\"A * 2")) {
        Err(CatalogError::MalformedExpression { expression }) => {
            assert_eq!(expression, "\"A * 2")
        }
        other => panic!("Expected MalformedExpression error, got {:?}", other),
    }
    assert!(catalog.read("B").unwrap_err().is_not_found());
}

#[test]
fn test_sandbox_rejection() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();

    for expression in [
        "system(\"A\")",
        "__import__(\"A\")",
        "\"A\" ** 2",
        "open",
        "\"A\"; 1",
    ] {
        match catalog.write("B", derived(expression)) {
            Err(CatalogError::InvalidExpression { name, .. }) => assert_eq!(name, "B"),
            other => panic!("Expected InvalidExpression for {}, got {:?}", expression, other),
        }
    }
    assert!(catalog.read("B").unwrap_err().is_not_found());
}

#[test]
fn test_cycle_guard() {
    let mut catalog = memory_catalog();
    catalog.write("Y", primitive("1")).unwrap();
    catalog.write("X", derived("\"Y\"")).unwrap();

    match catalog.write("Y", derived("\"X\"")) {
        Err(CatalogError::CyclicOrTooDeepDependency { name, max_depth }) => {
            assert_eq!(name, "Y");
            assert_eq!(max_depth, 1000);
        }
        other => panic!("Expected CyclicOrTooDeepDependency error, got {:?}", other),
    }
    assert!(matches!(
        catalog.write("Z", derived("\"Z\" + 1")),
        Err(CatalogError::CyclicOrTooDeepDependency { .. })
    ));

    // Nothing changed
    assert!(!catalog.read("Y").unwrap().is_derived);
    assert_eq!(catalog.read_dependents("Y").unwrap(), vec!["X"]);
}

#[test]
fn test_depth_ceiling() {
    let config = CatalogConfig::new().with_max_depth(3);
    let mut catalog = Catalog::with_config(MemoryStore::new(), config);

    catalog.write("A0", primitive("0")).unwrap();
    for i in 1..=3 {
        catalog
            .write(&format!("A{}", i), derived(&format!("\"A{}\" + 1", i - 1)))
            .unwrap();
    }
    assert_eq!(catalog.read("A3").unwrap().value, "3");

    assert!(matches!(
        catalog.write("A4", derived("\"A3\" + 1")),
        Err(CatalogError::CyclicOrTooDeepDependency { .. })
    ));
}

#[test]
fn test_missing_dependency() {
    let mut catalog = memory_catalog();
    match catalog.write("B", derived("\"nowhere\" + 1")) {
        Err(CatalogError::ParameterNotFound { name }) => assert_eq!(name, "nowhere"),
        other => panic!("Expected ParameterNotFound error, got {:?}", other),
    }
}

#[test]
fn test_idempotent_write() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" / 4")).unwrap();
    catalog.write("C", derived("\"B\" * \"A\"")).unwrap();
    let before = catalog.store().to_json().unwrap();

    catalog.write("A", primitive("2")).unwrap();
    catalog.write("B", derived("\"A\" / 4")).unwrap();

    assert_eq!(catalog.store().to_json().unwrap(), before);
}

#[test]
fn test_check_preview() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    let before = catalog.store().to_json().unwrap();

    match catalog.check("B", derived("\"A\" * 3 + 1")).unwrap() {
        CheckOutcome::Derived {
            value,
            dependencies,
        } => {
            approx::assert_relative_eq!(value, 7.0);
            assert_eq!(dependencies, vec!["A"]);
        }
        other => panic!("Expected derived outcome, got {:?}", other),
    }
    assert!(matches!(
        catalog.check("B", derived("\"A")),
        Err(CatalogError::MalformedExpression { .. })
    ));
    assert_eq!(catalog.store().to_json().unwrap(), before);
}

#[test]
fn test_list() {
    let mut catalog = memory_catalog();
    catalog.write("SI_b", primitive("1")).unwrap();
    catalog.write("SI_a", derived("\"SI_b\" * 2")).unwrap();
    catalog.write("BO_a", primitive("1")).unwrap();

    assert_eq!(catalog.list("SI", false).unwrap(), vec!["SI_a", "SI_b"]);
    assert_eq!(catalog.list("SI", true).unwrap(), vec!["SI_b"]);
    assert_eq!(catalog.list("BO", false).unwrap(), vec!["BO_a"]);
    assert!(catalog.list("TS", false).unwrap().is_empty());

    match catalog.list("XX", false) {
        Err(CatalogError::UnknownSubsystem { subsystem }) => assert_eq!(subsystem, "XX"),
        other => panic!("Expected UnknownSubsystem error, got {:?}", other),
    }
}

#[test]
fn test_read_expression_of_primitive() {
    let mut catalog = memory_catalog();
    catalog.write("A", primitive("2")).unwrap();
    assert!(matches!(
        catalog.read_expression("A"),
        Err(CatalogError::ExpressionNotFound { .. })
    ));
    assert!(matches!(
        catalog.read_expression("missing"),
        Err(CatalogError::ParameterNotFound { .. })
    ));
}

#[test]
fn test_deeply_nested_expression() {
    let mut catalog = memory_catalog();
    let nested = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));

    assert!(matches!(
        catalog.write("N", derived(&nested)),
        Err(CatalogError::InvalidExpression { .. })
    ));
    assert!(catalog.read("N").unwrap_err().is_not_found());

    catalog.write("N", derived("((((1 + 1))))")).unwrap();
    assert_eq!(catalog.read("N").unwrap().value, "2");
}
