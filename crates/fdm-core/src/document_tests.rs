use super::parse;

#[test]
fn parses_nested_elements_and_attributes() {
    let xml = r#"<function name="aero/cl"><product><value>2.0</value><property>velocities/mach</property></product></function>"#;
    let root = parse(xml).unwrap();

    assert_eq!(root.tag, "function");
    assert_eq!(root.attr("name"), Some("aero/cl"));
    assert_eq!(root.children.len(), 1);

    let product = &root.children[0];
    assert_eq!(product.tag, "product");
    assert_eq!(product.children.len(), 2);
    assert_eq!(product.children[0].tag, "value");
    assert_eq!(product.children[0].text_as_f64(), Some(2.0));
    assert_eq!(product.children[1].tag, "property");
    assert_eq!(product.children[1].text.trim(), "velocities/mach");
}

#[test]
fn self_closing_elements_parse_as_childless() {
    let xml = r#"<root><leaf attr="1"/></root>"#;
    let root = parse(xml).unwrap();
    let leaf = root.child_named("leaf").unwrap();
    assert!(leaf.children.is_empty());
    assert_eq!(leaf.attr("attr"), Some("1"));
}

#[test]
fn text_as_f64_list_splits_on_whitespace_and_newlines() {
    let xml = "<tableData>\n  0.0  1.0\n  2.0 3.0 \n</tableData>";
    let root = parse(xml).unwrap();
    assert_eq!(root.text_as_f64_list(), vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn children_named_filters_by_tag() {
    let xml = r#"<sum><value>1</value><value>2</value><property>a/b</property></sum>"#;
    let root = parse(xml).unwrap();
    let values: Vec<_> = root.children_named("value").collect();
    assert_eq!(values.len(), 2);
}

#[test]
fn empty_input_is_an_error() {
    assert!(parse("").is_err());
}
