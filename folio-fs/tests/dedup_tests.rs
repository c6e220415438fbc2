use folio_fs::{deduplicated_path, CoordinatedFs};
use tempfile::TempDir;

// ── Sibling naming ───────────────────────────────────────────────

#[test]
fn first_free_sibling_starts_at_two() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("doc.ext");
    fs.write(b"original", &original).unwrap();

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert_eq!(sibling, temp.path().join("doc 2.ext"));
}

#[test]
fn occupied_siblings_are_skipped() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("doc.ext");
    fs.write(b"original", &original).unwrap();
    for index in 2..=5 {
        fs.write(b"taken", &temp.path().join(format!("doc {index}.ext")))
            .unwrap();
    }

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert_eq!(sibling, temp.path().join("doc 6.ext"));
}

#[test]
fn gaps_are_reused() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("doc.ext");
    fs.write(b"original", &original).unwrap();
    fs.write(b"taken", &temp.path().join("doc 2.ext")).unwrap();
    fs.write(b"taken", &temp.path().join("doc 4.ext")).unwrap();

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert_eq!(sibling, temp.path().join("doc 3.ext"));
}

#[test]
fn extensionless_files_get_plain_numbered_siblings() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("notes");
    fs.write(b"original", &original).unwrap();

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert_eq!(sibling, temp.path().join("notes 2"));
}

#[test]
fn generated_sibling_does_not_exist_yet() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("doc.ext");
    fs.write(b"original", &original).unwrap();

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert!(!fs.exists(&sibling).exists);
}

#[test]
fn stem_with_spaces_is_preserved() {
    let temp = TempDir::new().unwrap();
    let fs = CoordinatedFs::new();
    let original = temp.path().join("meeting notes.ext");
    fs.write(b"original", &original).unwrap();

    let sibling = deduplicated_path(&fs, &original).unwrap();
    assert_eq!(sibling, temp.path().join("meeting notes 2.ext"));
}
