use fdm_core::document::parse;

use super::build_script;
use crate::error::ScriptError;
use crate::model::ActionKind;

#[test]
fn builds_end_time_and_when_blocks() {
    let xml = r#"
        <script>
          <run end-time="10.0"/>
          <when persistent="true">
            <condition property="trigger" comparator="ge" value="1.0"/>
            <action type="step" target="target" value="42.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let script = build_script(&root).unwrap();
    assert_eq!(script.end_time, Some(10.0));
    assert_eq!(script.when_blocks.len(), 1);
    assert!(script.when_blocks[0].persistent);
    assert_eq!(script.when_blocks[0].actions[0].kind, ActionKind::Step);
}

#[test]
fn property_vs_property_condition() {
    let xml = r#"
        <script>
          <when>
            <condition property="a" comparator="lt" property2="b"/>
            <action type="step" target="target" value="1.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let script = build_script(&root).unwrap();
    assert!(matches!(
        script.when_blocks[0].conditions[0].rhs,
        crate::model::Operand::Property(_)
    ));
}

#[test]
fn ramp_requires_time_constant() {
    let xml = r#"
        <script>
          <when>
            <condition property="a" comparator="lt" value="1.0"/>
            <action type="ramp" target="target" value="1.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let err = build_script(&root).unwrap_err();
    assert!(matches!(err, ScriptError::MalformedScript { .. }));
}

#[test]
fn when_block_requires_a_condition() {
    let xml = r#"
        <script>
          <when>
            <action type="step" target="target" value="1.0"/>
          </when>
        </script>
    "#;
    let root = parse(xml).unwrap();
    let err = build_script(&root).unwrap_err();
    assert!(matches!(err, ScriptError::MalformedScript { .. }));
}

#[test]
fn rejects_non_script_root() {
    let xml = r#"<notascript/>"#;
    let root = parse(xml).unwrap();
    let err = build_script(&root).unwrap_err();
    assert!(matches!(err, ScriptError::MalformedScript { .. }));
}
