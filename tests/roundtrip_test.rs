//! Round-trip tests: parse then serialize reproduces the input byte for byte.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;

use deftree::util::testing;
use deftree::{Document, Kind};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

#[rstest]
#[case("main.collection")]
#[case("landscape.display_profiles")]
#[case("hero.atlas")]
#[case("nested.go")]
fn given_resource_file_when_parse_and_serialize_then_output_equals_input(#[case] name: &str) {
    let path = resource(name);
    let original = fs::read_to_string(&path).unwrap();

    let document = deftree::parse(&path).unwrap();
    let text = document.serialize().unwrap();

    assert_eq!(text, original, "round trip of {name}");
    assert!(deftree::validate(&text, &path.to_string_lossy()).unwrap());
}

#[rstest]
#[case("mask: 18446744073709551615\n")]
#[case("group: -9223372036854775809\n")]
#[case("id: 9223372036854775807\n")]
fn given_integer_beyond_i64_when_round_tripped_then_stays_unquoted(#[case] text: &str) {
    let document = deftree::from_string(text).unwrap();
    let tree = document.tree();
    let attribute = tree.child(document.root(), 0).unwrap();

    assert_eq!(tree.value(attribute).unwrap().kind(), Kind::Int);
    assert_eq!(document.serialize().unwrap(), text);
}

#[test]
fn given_profiles_text_when_parsed_then_tree_has_expected_shape() {
    let text = "profiles {\n  name: \"Landscape\"\n  qualifiers {\n    width: 1280\n    height: 720\n  }\n}\n";
    let document = deftree::from_string(text).unwrap();
    let tree = document.tree();
    let root = document.root();

    assert_eq!(tree.len(root).unwrap(), 1);
    let profiles = tree.get_element(root, "profiles").unwrap();

    let name = tree.get_attribute(profiles, "name", None).unwrap();
    assert_eq!(tree.value(name).unwrap().kind(), Kind::String);
    assert_eq!(tree.value(name).unwrap().as_str(), Some("Landscape"));

    let qualifiers = tree.get_element(profiles, "qualifiers").unwrap();
    let width = tree.get_attribute(qualifiers, "width", None).unwrap();
    let height = tree.get_attribute(qualifiers, "height", None).unwrap();
    assert_eq!(tree.value(width).unwrap().as_i64(), Some(1280));
    assert_eq!(tree.value(height).unwrap().as_i64(), Some(720));

    assert_eq!(document.serialize().unwrap(), text);
}

#[test]
fn given_embedded_collection_when_parsed_then_data_becomes_element_chain() {
    let document = deftree::parse(resource("main.collection")).unwrap();
    let tree = document.tree();
    let root = document.root();

    let instance = tree.get_element(root, "embedded_instances").unwrap();
    let data = tree.get_element(instance, "data").unwrap();
    let component = tree.get_element(data, "embedded_components").unwrap();
    let sprite = tree.get_element(component, "data").unwrap();

    let blend = tree.get_attribute(sprite, "blend_mode", None).unwrap();
    assert_eq!(tree.value(blend).unwrap().kind(), Kind::Enum);
    let atlas = tree.get_attribute(sprite, "tile_set", None).unwrap();
    assert_eq!(tree.value(atlas).unwrap().as_str(), Some("/main/hero.atlas"));

    let position = tree.get_element(instance, "position").unwrap();
    let y = tree.get_attribute(position, "y", None).unwrap();
    assert_eq!(tree.value(y).unwrap().to_string(), "4.6049512E-4");
}

#[test]
fn given_three_levels_of_data_when_parsed_then_innermost_text_is_decoded() {
    let document = deftree::parse(resource("nested.go")).unwrap();
    let tree = document.tree();

    let texts: Vec<_> = tree
        .iter_attributes(document.root(), Some("text"))
        .collect();
    assert_eq!(texts.len(), 1);

    let chain: Vec<&str> = tree
        .ancestors(texts[0])
        .map(|id| tree.name(id).unwrap())
        .collect();
    assert_eq!(
        chain,
        vec!["data", "inner", "data", "components", "data", "instances", "root"]
    );
    assert_eq!(
        tree.value(texts[0]).unwrap().as_str(),
        Some("a \\\"quoted\\\" \\\\ é")
    );
}

#[test]
fn given_modified_embedded_attribute_when_serialized_then_reparse_sees_change() {
    let mut document = deftree::parse(resource("main.collection")).unwrap();
    let root = document.root();
    let animation = document
        .tree()
        .iter_attributes(root, Some("default_animation"))
        .next()
        .unwrap();
    document.tree_mut().set_value(animation, "run").unwrap();

    let text = document.serialize().unwrap();
    assert!(text.contains("default_animation: \\\\\\\"run\\\\\\\"\\\\n"));

    let reparsed = Document::from_string(&text).unwrap();
    let animation = reparsed
        .tree()
        .iter_attributes(reparsed.root(), Some("default_animation"))
        .next()
        .unwrap();
    assert_eq!(reparsed.tree().value(animation).unwrap().as_str(), Some("run"));
    assert_eq!(reparsed.serialize().unwrap(), text);
}

#[test]
fn given_built_tree_when_serialized_then_parses_back_identically() {
    let mut document = Document::new();
    let root = document.root();
    let tree = document.tree_mut();
    let instance = tree.add_element(root, "embedded_instances").unwrap();
    tree.add_attribute(instance, "id", "\"go\"").unwrap();
    let data = tree.add_element(instance, "data").unwrap();
    let component = tree.add_element(data, "components").unwrap();
    tree.add_attribute(component, "id", "script").unwrap();
    tree.add_attribute(component, "speed", 2.5).unwrap();
    tree.add_attribute(component, "visible", true).unwrap();

    let text = document.serialize().unwrap();
    assert_eq!(
        text,
        concat!(
            "embedded_instances {\n",
            "  id: \"go\"\n",
            "  data: \"components {\\n\"\n",
            "  \"  id: \\\"script\\\"\\n\"\n",
            "  \"  speed: 2.5\\n\"\n",
            "  \"  visible: true\\n\"\n",
            "  \"}\\n\"\n",
            "  \"\"\n",
            "}\n",
        )
    );
    assert_eq!(Document::from_string(&text).unwrap().serialize().unwrap(), text);
}
