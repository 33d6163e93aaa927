use std::cell::Cell;
use std::rc::Rc;

use super::{PropertyRef, PropertyRegistry, RegistryError};

#[test]
fn get_or_create_is_idempotent() {
    let reg = PropertyRegistry::new();
    let a = reg.get_or_create_node("aero/qbar-psf");
    let b = reg.get_or_create_node("aero/qbar-psf");
    assert_eq!(a, b);
    assert!(reg.has_node("aero"));
    assert!(reg.has_node("aero/qbar-psf"));
    assert!(!reg.has_node("aero/alpha-rad"));
}

#[test]
fn write_then_read_round_trips() {
    let reg = PropertyRegistry::new();
    let n = reg.get_or_create_node("fcs/elevator-pos-rad");
    reg.write(n, 0.25).unwrap();
    assert_eq!(reg.read(n), 0.25);
}

#[test]
fn tie_delegates_read_to_supplier() {
    let reg = PropertyRegistry::new();
    let calls = Rc::new(Cell::new(0));
    let calls_clone = calls.clone();
    reg.tie("sensors/altitude-ft", move || {
        calls_clone.set(calls_clone.get() + 1);
        1234.5
    })
    .unwrap();

    let n = reg.lookup_node("sensors/altitude-ft").unwrap();
    assert_eq!(reg.read(n), 1234.5);
    assert_eq!(reg.read(n), 1234.5);
    assert_eq!(calls.get(), 2);
}

#[test]
fn tie_twice_fails() {
    let reg = PropertyRegistry::new();
    reg.tie("aero/qbar-psf", || 0.0).unwrap();
    let err = reg.tie("aero/qbar-psf", || 1.0).unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyTied { .. }));
}

#[test]
fn write_to_tied_node_fails() {
    let reg = PropertyRegistry::new();
    reg.tie("aero/qbar-psf", || 42.0).unwrap();
    let n = reg.lookup_node("aero/qbar-psf").unwrap();
    let err = reg.write(n, 1.0).unwrap_err();
    assert!(matches!(err, RegistryError::NotWritable { .. }));
}

#[test]
fn untie_preserves_last_observed_value() {
    let reg = PropertyRegistry::new();
    reg.tie("aero/qbar-psf", || 7.5).unwrap();
    reg.untie("aero/qbar-psf").unwrap();
    let n = reg.lookup_node("aero/qbar-psf").unwrap();
    assert_eq!(reg.read(n), 7.5);
    reg.write(n, 9.0).unwrap();
    assert_eq!(reg.read(n), 9.0);
}

#[test]
fn readonly_node_is_constant() {
    let reg = PropertyRegistry::new();
    let n = reg.get_or_create_node("aero/wing-area-sqft");
    assert!(!reg.is_constant(n));
    reg.set_readonly(n);
    assert!(reg.is_constant(n));
    assert!(reg.write(n, 1.0).is_err());
}

#[test]
fn late_binding_resolves_on_first_evaluate() {
    let reg = PropertyRegistry::new();
    let pref = PropertyRef::new("aero/qbar-psf");

    // Not present yet: resolving fails.
    assert!(matches!(
        pref.read(&reg),
        Err(RegistryError::UnresolvedProperty { .. })
    ));

    reg.tie("aero/qbar-psf", || 100.0).unwrap();
    assert_eq!(pref.read(&reg).unwrap(), 100.0);
}

#[test]
fn sign_reference_negates_value() {
    let reg = PropertyRegistry::new();
    let n = reg.get_or_create_node("fcs/roll-trim-sum");
    reg.write(n, 0.7).unwrap();

    let pref = PropertyRef::new("-fcs/roll-trim-sum");
    assert_eq!(pref.sign(), -1.0);
    assert!((pref.read(&reg).unwrap() - -0.7).abs() < 1e-12);
}

#[test]
fn placeholder_expansion_replaces_hash() {
    let (path, sign) = PropertyRegistry::normalize_path("propulsion/engine[#]/thrust-lbs", Some("2"));
    assert_eq!(path, "propulsion/engine[2]/thrust-lbs");
    assert_eq!(sign, 1.0);
}

#[test]
fn begin_frame_advances_monotonically() {
    let reg = PropertyRegistry::new();
    let f0 = reg.current_frame();
    let f1 = reg.begin_frame();
    let f2 = reg.begin_frame();
    assert!(f1 > f0);
    assert!(f2 > f1);
}
