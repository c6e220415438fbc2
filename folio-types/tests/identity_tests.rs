use folio_types::FileIdentity;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

// ── Canonicalization ─────────────────────────────────────────────

#[test]
fn plain_paths_compare_equal() {
    let a = FileIdentity::new("/data/notes/today.note");
    let b = FileIdentity::new("/data/notes/today.note");
    assert_eq!(a, b);
}

#[test]
fn dot_segment_in_existing_parent_is_purged() {
    let temp = TempDir::new().unwrap();
    let direct = FileIdentity::new(temp.path().join("file.note"));
    let dotted = FileIdentity::new(temp.path().join(".").join("file.note"));
    assert_eq!(direct, dotted);
}

#[test]
fn parent_segments_resolve_through_existing_directories() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("sub")).unwrap();

    let direct = FileIdentity::new(temp.path().join("file.note"));
    let indirect = FileIdentity::new(temp.path().join("sub").join("..").join("file.note"));
    assert_eq!(direct, indirect);
}

#[test]
fn missing_file_in_existing_directory_still_normalizes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("never-created.note");
    assert!(!path.exists());

    let direct = FileIdentity::new(&path);
    let dotted = FileIdentity::new(temp.path().join(".").join("never-created.note"));
    assert_eq!(direct, dotted);
}

#[test]
fn nonexistent_parent_normalizes_lexically() {
    let a = FileIdentity::new("/no/such/dir/./x/../doc.note");
    let b = FileIdentity::new("/no/such/dir/doc.note");
    assert_eq!(a, b);
}

#[cfg(unix)]
#[test]
fn symlinked_parent_resolves_to_target() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real");
    std::fs::create_dir(&real).unwrap();
    let link = temp.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let through_real = FileIdentity::new(real.join("doc.note"));
    let through_link = FileIdentity::new(link.join("doc.note"));
    assert_eq!(through_real, through_link);
}

#[test]
fn file_name_is_untouched_by_normalization() {
    let identity = FileIdentity::new("/no/such/dir/Weird Name 2.note");
    assert_eq!(identity.file_name(), Some("Weird Name 2.note"));
}

// ── Accessors and conversions ────────────────────────────────────

#[test]
fn as_path_and_into_path_buf_agree() {
    let identity = FileIdentity::new("/data/a.note");
    let path = identity.as_path().to_path_buf();
    assert_eq!(identity.into_path_buf(), path);
}

#[test]
fn from_path_matches_new() {
    let path = Path::new("/data/a.note");
    assert_eq!(FileIdentity::from(path), FileIdentity::new(path));
}

#[test]
fn display_shows_the_path() {
    let identity = FileIdentity::new("/data/a.note");
    assert_eq!(identity.to_string(), "/data/a.note");
}

// ── Hash / set semantics ─────────────────────────────────────────

#[test]
fn one_entry_per_identity_in_a_set() {
    let temp = TempDir::new().unwrap();
    let mut set = HashSet::new();
    set.insert(FileIdentity::new(temp.path().join("a.note")));
    set.insert(FileIdentity::new(temp.path().join(".").join("a.note")));
    set.insert(FileIdentity::new(temp.path().join("b.note")));
    assert_eq!(set.len(), 2);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn identity_serde_roundtrip() {
    let identity = FileIdentity::new("/data/a.note");
    let json = serde_json::to_string(&identity).unwrap();
    let parsed: FileIdentity = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, identity);
}
