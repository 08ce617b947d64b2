use std::fs;

use marksort_core::BookmarkNode;
use marksort_engine::{load_tree, save_tree, write_atomic, PersistError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn sample_tree() -> BookmarkNode {
    BookmarkNode::folder(
        "0",
        "",
        vec![
            BookmarkNode::folder(
                "1",
                "Bookmarks Bar",
                vec![BookmarkNode::bookmark("10", "Rust", "https://rust-lang.org")],
            ),
            BookmarkNode::folder("2", "Other Bookmarks", vec![]),
        ],
    )
}

#[test]
fn save_then_load_keeps_tree() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bookmarks.json");

    save_tree(&path, &sample_tree()).unwrap();
    assert_eq!(load_tree(&path).unwrap(), sample_tree());
}

#[test]
fn exported_array_uses_first_root() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("export.json");
    fs::write(
        &path,
        r#"[{"id":"0","title":"","children":[
            {"id":"1","title":"Bookmarks bar","children":[
                {"id":"5","title":"Docs","url":"https://docs.rs","dateAdded":1700000000000}
            ]}
        ]}]"#,
    )
    .unwrap();

    let root = load_tree(&path).unwrap();
    assert_eq!(root.children[0].title, "Bookmarks bar");
    assert_eq!(root.children[0].children[0].url.as_deref(), Some("https://docs.rs"));
}

#[test]
fn malformed_json_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(load_tree(&path), Err(PersistError::Json(_))));
    assert!(matches!(
        load_tree(&temp.path().join("missing.json")),
        Err(PersistError::Io(_))
    ));
}

#[test]
fn atomic_write_creates_parent_and_replaces() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("settings.ron");

    write_atomic(&path, "first").unwrap();
    write_atomic(&path, "second").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "second");

    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path() != path)
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn file_as_parent_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let result = write_atomic(&blocker.join("tree.json"), "{}");
    assert!(matches!(result, Err(PersistError::ParentDir(_))));
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
