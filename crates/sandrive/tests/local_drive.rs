//! End-to-end drive behaviour on a real directory.

use std::fs;
use std::io::Cursor;

use sandrive::{
    Drive, DriveBuilder, DriveError, EntryKind, FsEntry, ListOptions, NameMatcher,
    OperationConfig, ReadOnly,
};
use tempfile::TempDir;

/// Root with folders `sub`, `test.folder` and files `a.txt`, `b.txt`, `c.jpg`,
/// plus a file next to the root that must stay unreachable.
fn setup() -> (Drive, TempDir) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::create_dir_all(root.join("test.folder")).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join("b.txt"), "bb").unwrap();
    fs::write(root.join("c.jpg"), "ccc").unwrap();
    fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    fs::create_dir_all(dir.path().join("rootless")).unwrap();

    let drive = DriveBuilder::new(&root).build().unwrap();
    (drive, dir)
}

fn names(entries: &[FsEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn test_list_root_sorted() {
    let (drive, _dir) = setup();
    let entries = drive.list("/").unwrap();
    assert_eq!(
        names(&entries),
        vec!["sub", "test.folder", "a.txt", "b.txt", "c.jpg"]
    );
    assert_eq!(entries[1].kind, EntryKind::Folder);
    assert_eq!(entries[3].size, 2);
    assert_eq!(entries[4].kind, EntryKind::Image);
    assert!(entries[4].modified_at > 0);
}

#[test]
fn test_write_twice_without_clobbering() {
    let (drive, dir) = setup();
    let drive = drive.with_operation_config(OperationConfig::no_clobber());
    assert_eq!(drive.write("/sub/deep/copy.doc", b"X").unwrap(), "/sub/deep/copy.doc");
    assert_eq!(
        drive.write("/sub/deep/copy.doc", b"X").unwrap(),
        "/sub/deep/copy.doc.new"
    );
    assert!(dir.path().join("root/sub/deep/copy.doc.new").is_file());
    assert_eq!(drive.info("/sub/deep/copy.doc").unwrap().kind, EntryKind::Document);
}

#[test]
fn test_mkdir_without_clobbering() {
    let (drive, _dir) = setup();
    assert_eq!(drive.mkdir("/sub/deep").unwrap(), "/sub/deep");
    let drive = drive.with_operation_config(OperationConfig::no_clobber());
    assert_eq!(drive.mkdir("/sub/deep").unwrap(), "/sub/deep.new");
    assert!(drive.info("/sub/deep.new").unwrap().kind.is_folder());
}

#[test]
fn test_copy_folder_into_itself_writes_nothing() {
    let (drive, dir) = setup();
    drive.write("/sub/x.txt", b"x").unwrap();
    let err = drive.copy("/sub", "/sub/").unwrap_err();
    assert!(matches!(err, DriveError::Conflict(_)));
    let children: Vec<_> = fs::read_dir(dir.path().join("root/sub"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(children, vec!["x.txt"]);
}

#[test]
fn test_copy_folder_onto_file_conflicts() {
    let (drive, dir) = setup();
    let err = drive.copy("/sub", "/a.txt").unwrap_err();
    assert!(matches!(err, DriveError::Conflict(_)));
    assert_eq!(fs::read_to_string(dir.path().join("root/a.txt")).unwrap(), "a");
    assert!(dir.path().join("root/sub").is_dir());
}

#[test]
fn test_move_folder_into_itself_moves_nothing() {
    let (drive, dir) = setup();
    drive.write("/sub/x.txt", b"x").unwrap();
    for target in ["/sub/", "/sub/inner"] {
        let err = drive.move_to("/sub", target).unwrap_err();
        assert!(err.is_conflict(), "{target}");
    }
    let children: Vec<_> = fs::read_dir(dir.path().join("root/sub"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(children, vec!["x.txt"]);
}

#[test]
fn test_copy_and_move_trees() {
    let (drive, dir) = setup();
    drive.write("/sub/inner/y.txt", b"y").unwrap();

    assert_eq!(drive.copy("/sub", "/test.folder").unwrap(), "/test.folder/sub");
    assert_eq!(drive.read("/test.folder/sub/inner/y.txt").unwrap(), b"y");

    assert_eq!(drive.move_to("/sub", "/moved").unwrap(), "/moved");
    assert!(!dir.path().join("root/sub").exists());
    assert_eq!(drive.read("/moved/inner/y.txt").unwrap(), b"y");
}

#[test]
fn test_escapes_are_denied_and_untouched() {
    let (drive, dir) = setup();
    for id in ["../secret.txt", "/../secret.txt", "/sub/../../secret.txt", "/../rootless"] {
        assert!(drive.read(id).unwrap_err().is_access_denied(), "{id}");
        assert!(drive.write(id, b"pwned").unwrap_err().is_access_denied(), "{id}");
        assert!(drive.remove(id).unwrap_err().is_access_denied(), "{id}");
        assert!(drive.copy("/a.txt", id).unwrap_err().is_access_denied(), "{id}");
    }
    assert_eq!(fs::read_to_string(dir.path().join("secret.txt")).unwrap(), "secret");
    assert!(dir.path().join("rootless").is_dir());
}

#[test]
fn test_recursive_listing_modes_agree() {
    let (drive, _dir) = setup();
    drive.write("/sub/inner/y.txt", b"y").unwrap();
    drive.write("/test.folder/z.md", b"z").unwrap();

    let flat = drive
        .list_with("/", &ListOptions::new().recurse(true))
        .unwrap();
    let nested = drive.list_with("/", &ListOptions::tree()).unwrap();
    let nested_count: usize = nested.iter().map(FsEntry::count).sum();
    assert_eq!(flat.len(), nested_count);
    assert_eq!(flat.len(), 8);

    let sub = nested.iter().find(|e| e.id == "/sub").unwrap();
    assert_eq!(sub.children[0].id, "/sub/inner");
    assert_eq!(sub.children[0].children[0].id, "/sub/inner/y.txt");
}

#[test]
fn test_filtered_tree_keeps_path_to_matches() {
    let (drive, _dir) = setup();
    drive.write("/sub/inner/y.md", b"y").unwrap();
    let options = ListOptions::tree().include(NameMatcher::glob("*.md").unwrap());
    let nested = drive.list_with("/", &options).unwrap();
    assert_eq!(names(&nested), vec!["sub", "test.folder"]);
    assert_eq!(nested[0].children[0].children[0].name, "y.md");
}

#[test]
fn test_exclude_patterns_skip_files_not_folders() {
    let (drive, _dir) = setup();
    drive.mkdir("/.git").unwrap();
    drive.write("/.env", b"KEY=1").unwrap();
    let options = ListOptions::new().exclude(NameMatcher::glob(".*").unwrap());
    let entries = drive.list_with("/", &options).unwrap();
    assert_eq!(
        names(&entries),
        vec![".git", "sub", "test.folder", "a.txt", "b.txt", "c.jpg"]
    );
}

#[test]
fn test_streaming_write() {
    let (drive, _dir) = setup();
    let mut source = Cursor::new(vec![1u8; 10_000]);
    let (id, written) = drive.write_from("/blob.bin", &mut source).unwrap();
    assert_eq!(id, "/blob.bin");
    assert_eq!(written, 10_000);
    assert_eq!(drive.info(&id).unwrap().size, 10_000);
}

#[test]
fn test_read_only_drive() {
    let (_, dir) = setup();
    let drive = DriveBuilder::new(dir.path().join("root"))
        .policy(ReadOnly)
        .build()
        .unwrap();
    assert_eq!(drive.read("/a.txt").unwrap(), b"a");
    assert!(drive.write("/a.txt", b"x").unwrap_err().is_access_denied());
    assert!(drive.mkdir("/new").unwrap_err().is_access_denied());
    assert!(drive.move_to("/a.txt", "/b").unwrap_err().is_access_denied());
    assert_eq!(fs::read_to_string(dir.path().join("root/a.txt")).unwrap(), "a");
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_is_resolved() {
    let (_, dir) = setup();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(dir.path().join("root"), &link).unwrap();
    let drive = DriveBuilder::new(&link).build().unwrap();
    assert_eq!(drive.root(), dunce::canonicalize(dir.path().join("root")).unwrap());
    assert_eq!(drive.read("/a.txt").unwrap(), b"a");
}
