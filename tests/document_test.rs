//! Tests for document file I/O and validation.

use std::fs;
use std::io;

use tempfile::TempDir;

use deftree::util::testing;
use deftree::{ApplicationError, Document};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const GAME_OBJECT: &str = "components {\n  id: \"script\"\n  component: \"/main/main.script\"\n}\n";

#[test]
fn given_parsed_file_when_write_without_path_then_rewrites_origin() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.go");
    fs::write(&path, GAME_OBJECT).unwrap();

    let mut document = deftree::parse(&path).unwrap();
    let root = document.root();
    let components = document.tree().get_element(root, "components").unwrap();
    document
        .tree_mut()
        .set_attribute(components, "id", "logic")
        .unwrap();
    document.write(None).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "components {\n  id: \"logic\"\n  component: \"/main/main.script\"\n}\n"
    );
}

#[test]
fn given_explicit_path_when_write_then_origin_is_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.go");
    let copy = dir.path().join("copy.go");
    fs::write(&path, GAME_OBJECT).unwrap();

    let document = deftree::parse(&path).unwrap();
    document.write(Some(&copy)).unwrap();

    assert_eq!(fs::read_to_string(&copy).unwrap(), GAME_OBJECT);
    assert!(deftree::validate(GAME_OBJECT, &copy.to_string_lossy()).unwrap());
}

#[test]
fn given_missing_directory_when_write_then_not_found() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("missing").join("main.go");

    let document = deftree::from_string(GAME_OBJECT).unwrap();
    let err = document.write(Some(&target)).unwrap_err();

    match err {
        ApplicationError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn given_document_without_path_when_write_then_missing_path() {
    let document = Document::from_string(GAME_OBJECT).unwrap();
    assert!(matches!(document.write(None), Err(ApplicationError::MissingPath)));
}

#[test]
fn given_unreadable_path_when_parse_then_io_error() {
    let dir = TempDir::new().unwrap();
    let err = deftree::parse(dir.path().join("nope.go")).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Io { ref source, .. } if source.kind() == io::ErrorKind::NotFound
    ));
}

#[test]
fn given_text_and_file_when_validate_then_compares_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("main.go");
    fs::write(&path, GAME_OBJECT).unwrap();
    let path = path.to_string_lossy();

    assert!(deftree::validate(GAME_OBJECT, &path).unwrap());
    assert!(!deftree::validate("components {\n}\n", &path).unwrap());

    // not a file: compared as text
    assert!(deftree::validate("a: 1\n", "a: 1\n").unwrap());
    assert!(!deftree::validate("a: 1\n", "a: 2\n").unwrap());
}
