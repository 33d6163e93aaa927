use std::rc::Rc;

use fdm_core::document::parse;
use fdm_core::PropertyRegistry;

use super::load_script;
use crate::error::ScriptError;

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{a} !~= {b}");
}

#[test]
fn load_fails_when_a_referenced_property_does_not_exist() {
    let registry = Rc::new(PropertyRegistry::new());
    let xml = r#"
        <script>
          <when>
            <condition property="missing/path" comparator="ge" value="1.0"/>
            <action type="step" target="target" value="1.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let err = load_script(&registry, &root).unwrap_err();
    assert!(matches!(err, ScriptError::UnresolvedProperty { path } if path == "missing/path"));
}

#[test]
fn tick_advances_sim_time_and_fires_on_rising_edge() {
    let registry = Rc::new(PropertyRegistry::new());
    let trigger = registry.get_or_create_node("trigger");
    let target = registry.get_or_create_node("target");
    registry.write(trigger, 0.0).unwrap();
    registry.write(target, 0.0).unwrap();

    let xml = r#"
        <script>
          <run end-time="5.0"/>
          <when>
            <condition property="trigger" comparator="ge" value="1.0"/>
            <action type="step" target="target" value="9.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let mut engine = load_script(&registry, &root).unwrap();

    let report = engine.run_one_tick(1.0).unwrap();
    approx(report.sim_time, 1.0);
    assert!(report.fired.is_empty());

    registry.write(trigger, 1.0).unwrap();
    let report = engine.run_one_tick(1.0).unwrap();
    approx(report.sim_time, 2.0);
    assert_eq!(report.fired, vec![0]);
    approx(registry.read(target), 9.0);

    // guard still true, not persistent: no second fire.
    let report = engine.run_one_tick(1.0).unwrap();
    assert!(report.fired.is_empty());
}

#[test]
fn run_reports_done_at_configured_end_time() {
    let registry = Rc::new(PropertyRegistry::new());
    registry.get_or_create_node("trigger");
    registry.get_or_create_node("target");

    let xml = r#"
        <script>
          <run end-time="2.0"/>
          <when>
            <condition property="trigger" comparator="ge" value="100.0"/>
            <action type="step" target="target" value="1.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let mut engine = load_script(&registry, &root).unwrap();

    assert!(!engine.run_one_tick(1.0).unwrap().done);
    assert!(engine.run_one_tick(1.0).unwrap().done);
}
